//! MAC status word decoding.
//!
//! `mac get status` answers with four hex digits. The two decoded bytes form
//! a little-endian 16-bit word: single-bit flags for the LoRaWAN MAC state,
//! plus a 3-bit sub-status field at bits 1..=3 that tracks where the MAC is
//! in its transmit / receive-window cycle.
//!
//! ```text
//!  15  14  13  12  11  10   9   8   7   6   5   4   3   2   1   0
//! TXT RX2 PRE NBR PWR CHN LNK RFU PAU SIL ADR ARP [ sub-status ] JND
//! ```

use std::fmt;

use bitflags::bitflags;
use rn2903_core::codec;
use rn2903_core::{Error, Result};

bitflags! {
    /// Single-bit flags of the MAC status word.
    ///
    /// The sub-status field (bits 1..=3) is not a flag; read it through
    /// [`MacStatus::state`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MacStatusFlags: u16 {
        /// The device has joined a network.
        const JOINED = 0x0001;
        /// Automatic reply to downlinks is enabled.
        const AUTO_REPLY = 0x0010;
        /// Adaptive data rate is enabled.
        const ADR = 0x0020;
        /// The network server silenced the device.
        const SILENT = 0x0040;
        /// The MAC is paused (`mac pause`).
        const PAUSED = 0x0080;
        /// Reserved for future use.
        const RFU = 0x0100;
        /// Link check is enabled.
        const LINK_CHECK = 0x0200;
        /// Channel configuration was updated by the network.
        const CHANNELS_UPDATED = 0x0400;
        /// Output power was updated by the network.
        const OUTPUT_POWER_UPDATED = 0x0800;
        /// Repetition count (NbRep) was updated by the network.
        const NB_REP_UPDATED = 0x1000;
        /// Duty-cycle prescaler was updated by the network.
        const PRESCALER_UPDATED = 0x2000;
        /// Second receive window parameters were updated by the network.
        const SECOND_RX_WINDOW_UPDATED = 0x4000;
        /// TX timing setup was updated by the network.
        const TX_TIMING_UPDATED = 0x8000;
    }
}

/// Bit offset of the sub-status field.
pub const MAC_STATE_SHIFT: u16 = 1;

/// Mask of the sub-status field after shifting.
pub const MAC_STATE_MASK: u16 = 0b111;

/// Length of a `mac get status` response in hex digits.
pub const MAC_STATUS_HEX_LEN: usize = 4;

/// Sub-status of the LoRaWAN MAC (bits 1..=3 of the status word).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MacState {
    /// Ready to transmit.
    #[default]
    Idle,
    /// A transmission is in progress.
    TxInProgress,
    /// Transmission done, waiting for the first receive window.
    BeforeRxWindow1,
    /// First receive window open.
    RxWindow1Open,
    /// Between the first and second receive windows.
    BetweenRxWindows,
    /// Second receive window open.
    RxWindow2Open,
    /// Retransmission pending after an ACK timeout.
    AckTimeout,
    /// Field value 7, not assigned by the firmware.
    Reserved,
}

impl MacState {
    /// Map the 3-bit field value to a state. Only the low three bits are
    /// considered.
    pub fn from_field(value: u8) -> Self {
        match value & MAC_STATE_MASK as u8 {
            0 => MacState::Idle,
            1 => MacState::TxInProgress,
            2 => MacState::BeforeRxWindow1,
            3 => MacState::RxWindow1Open,
            4 => MacState::BetweenRxWindows,
            5 => MacState::RxWindow2Open,
            6 => MacState::AckTimeout,
            _ => MacState::Reserved,
        }
    }

    /// The 3-bit field value for this state.
    pub fn field(self) -> u8 {
        match self {
            MacState::Idle => 0,
            MacState::TxInProgress => 1,
            MacState::BeforeRxWindow1 => 2,
            MacState::RxWindow1Open => 3,
            MacState::BetweenRxWindows => 4,
            MacState::RxWindow2Open => 5,
            MacState::AckTimeout => 6,
            MacState::Reserved => 7,
        }
    }
}

impl fmt::Display for MacState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MacState::Idle => "idle",
            MacState::TxInProgress => "tx in progress",
            MacState::BeforeRxWindow1 => "before rx window 1",
            MacState::RxWindow1Open => "rx window 1 open",
            MacState::BetweenRxWindows => "between rx windows",
            MacState::RxWindow2Open => "rx window 2 open",
            MacState::AckTimeout => "ack timeout",
            MacState::Reserved => "reserved",
        };
        write!(f, "{s}")
    }
}

/// A decoded MAC status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacStatus {
    word: u16,
}

impl MacStatus {
    pub fn from_word(word: u16) -> Self {
        MacStatus { word }
    }

    /// The raw 16-bit status word.
    pub fn word(&self) -> u16 {
        self.word
    }

    /// The single-bit flags; sub-status bits are dropped.
    pub fn flags(&self) -> MacStatusFlags {
        MacStatusFlags::from_bits_truncate(self.word)
    }

    /// The sub-status field: `(word >> 1) & 0b111`.
    pub fn state(&self) -> MacState {
        MacState::from_field(((self.word >> MAC_STATE_SHIFT) & MAC_STATE_MASK) as u8)
    }

    pub fn is_joined(&self) -> bool {
        self.flags().contains(MacStatusFlags::JOINED)
    }

    pub fn is_silent(&self) -> bool {
        self.flags().contains(MacStatusFlags::SILENT)
    }

    pub fn is_paused(&self) -> bool {
        self.flags().contains(MacStatusFlags::PAUSED)
    }

    pub fn auto_reply(&self) -> bool {
        self.flags().contains(MacStatusFlags::AUTO_REPLY)
    }

    pub fn adr_enabled(&self) -> bool {
        self.flags().contains(MacStatusFlags::ADR)
    }
}

impl fmt::Display for MacStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X} ({}, {:?})", self.word, self.state(), self.flags())
    }
}

/// Parse a `mac get status` response.
///
/// The response must be exactly four hex digits. The decoded bytes are read
/// little-endian: `"0100"` decodes to bytes `[0x01, 0x00]` and word `0x0001`.
pub fn parse_mac_status(response: &str) -> Result<MacStatus> {
    if response.len() != MAC_STATUS_HEX_LEN {
        return Err(Error::Validation(format!(
            "MAC status must be {} hex digits, got {:?}",
            MAC_STATUS_HEX_LEN, response
        )));
    }
    let bytes = codec::from_hex(response)?;
    let word = u16::from_le_bytes([bytes[0], bytes[1]]);
    Ok(MacStatus::from_word(word))
}
