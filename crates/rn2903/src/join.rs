//! Network join sequencing.
//!
//! A join runs as a small state machine over the session:
//!
//! ```text
//! Idle -> Precheck -> Submitted -> AwaitingGrant -> Done(status)
//!            |            |               |
//!            +------------+---------------+--> Done(status)  (early exits)
//! ```
//!
//! `Precheck` refreshes the MAC status and refuses to join when the device is
//! already joined, silenced, paused or mid-cycle. `Submitted` sends
//! `mac join <type>` and inspects the immediate answer. `AwaitingGrant` waits
//! for the second response line carrying the network's verdict.

use std::fmt;
use std::str::FromStr;

use rn2903_text_io::contains_phrase;
use tracing::{debug, info, warn};

use crate::commands;
use crate::session::Rn2903;
use crate::status::MacState;

/// Immediate answer when no channel is currently free for the join request.
pub const PHRASE_NO_FREE_CHANNEL: &str = "no_free_ch";
/// Immediate answer when the keys for the requested join type are not set.
pub const PHRASE_KEYS_NOT_INIT: &str = "keys_not_init";
/// Second answer when the network refused the join.
pub const PHRASE_DENIED: &str = "denied";
/// Second answer when the join succeeded.
pub const PHRASE_ACCEPTED: &str = "accepted";

/// How the device joins the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    /// Over-the-air activation (device EUI, application EUI, application key).
    Otaa,
    /// Activation by personalization (device address, session keys).
    Abp,
}

impl JoinType {
    /// The keyword used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            JoinType::Otaa => "otaa",
            JoinType::Abp => "abp",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a recognized join type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseJoinTypeError(String);

impl fmt::Display for ParseJoinTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown join type {:?} (expected otaa or abp)", self.0)
    }
}

impl std::error::Error for ParseJoinTypeError {}

impl FromStr for JoinType {
    type Err = ParseJoinTypeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "otaa" => Ok(JoinType::Otaa),
            "abp" => Ok(JoinType::Abp),
            _ => Err(ParseJoinTypeError(s.to_string())),
        }
    }
}

/// Outcome of a join attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinStatus {
    /// The network accepted the join.
    Accepted,
    /// The network denied the join.
    Denied,
    /// The keys for the requested join type are not initialized.
    BadKeys,
    /// No channel was free to send the join request.
    NoChannel,
    /// The device has been silenced by the network.
    Silent,
    /// The MAC is busy with a transmit or receive cycle.
    Busy,
    /// The MAC is paused.
    MacPaused,
    /// The device is already joined; nothing was sent.
    AlreadyJoined,
    /// A command failed or the modem answered unexpectedly.
    Failed,
}

impl JoinStatus {
    pub fn is_accepted(self) -> bool {
        self == JoinStatus::Accepted
    }
}

impl fmt::Display for JoinStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JoinStatus::Accepted => "accepted",
            JoinStatus::Denied => "denied",
            JoinStatus::BadKeys => "keys not initialized",
            JoinStatus::NoChannel => "no free channel",
            JoinStatus::Silent => "silenced",
            JoinStatus::Busy => "MAC busy",
            JoinStatus::MacPaused => "MAC paused",
            JoinStatus::AlreadyJoined => "already joined",
            JoinStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Position of a [`JoinSequencer`] in the join flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinState {
    Idle,
    Precheck,
    Submitted,
    AwaitingGrant,
    Done(JoinStatus),
}

/// Drives one join attempt against a session.
///
/// Each [`step`](Self::step) performs the work of the current state and
/// moves to the next; [`run`](Self::run) steps until a terminal state.
pub struct JoinSequencer<'a> {
    session: &'a mut Rn2903,
    join_type: JoinType,
    state: JoinState,
}

impl<'a> JoinSequencer<'a> {
    pub fn new(session: &'a mut Rn2903, join_type: JoinType) -> Self {
        JoinSequencer {
            session,
            join_type,
            state: JoinState::Idle,
        }
    }

    pub fn state(&self) -> JoinState {
        self.state
    }

    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    /// Perform the current state's work and advance. A `Done` state is
    /// returned unchanged.
    pub async fn step(&mut self) -> JoinState {
        let next = match self.state {
            JoinState::Idle => JoinState::Precheck,
            JoinState::Precheck => self.precheck().await,
            JoinState::Submitted => self.submit().await,
            JoinState::AwaitingGrant => self.await_grant().await,
            done @ JoinState::Done(_) => return done,
        };
        debug!(from = ?self.state, to = ?next, join_type = %self.join_type, "join state");
        self.state = next;
        next
    }

    /// Step until the join reaches a terminal state.
    pub async fn run(mut self) -> JoinStatus {
        loop {
            if let JoinState::Done(status) = self.step().await {
                info!(join_type = %self.join_type, %status, "join finished");
                return status;
            }
        }
    }

    async fn precheck(&mut self) -> JoinState {
        if let Err(e) = self.session.update_mac_status().await {
            warn!(error = %e, "could not read MAC status before join");
            return JoinState::Done(JoinStatus::Failed);
        }

        let status = self.session.mac_status();
        let refusal = if status.is_joined() {
            Some(JoinStatus::AlreadyJoined)
        } else if status.is_silent() {
            Some(JoinStatus::Silent)
        } else if status.is_paused() {
            Some(JoinStatus::MacPaused)
        } else if status.state() != MacState::Idle {
            Some(JoinStatus::Busy)
        } else {
            None
        };

        match refusal {
            Some(outcome) => JoinState::Done(outcome),
            None => JoinState::Submitted,
        }
    }

    async fn submit(&mut self) -> JoinState {
        let command = commands::cmd_mac_join(self.join_type);
        let status = self.session.command(&command).await;
        if !status.is_ok() {
            warn!(command = %command, %status, "join request rejected");
            return JoinState::Done(JoinStatus::Failed);
        }

        let response = self.session.response_bytes();
        if contains_phrase(response, PHRASE_NO_FREE_CHANNEL) {
            JoinState::Done(JoinStatus::NoChannel)
        } else if contains_phrase(response, PHRASE_KEYS_NOT_INIT) {
            JoinState::Done(JoinStatus::BadKeys)
        } else {
            JoinState::AwaitingGrant
        }
    }

    async fn await_grant(&mut self) -> JoinState {
        let deadline = self.session.join_grant_timeout();
        let status = self.session.wait_for_response(deadline).await;
        if !status.is_ok() {
            warn!(%status, "no verdict on join request");
            return JoinState::Done(JoinStatus::Failed);
        }

        let response = self.session.response_bytes();
        if contains_phrase(response, PHRASE_DENIED) {
            JoinState::Done(JoinStatus::Denied)
        } else if contains_phrase(response, PHRASE_ACCEPTED) {
            JoinState::Done(JoinStatus::Accepted)
        } else {
            warn!(response = %self.session.response(), "unexpected join verdict");
            JoinState::Done(JoinStatus::Failed)
        }
    }
}
