//! Async driver for the Microchip RN2903 LoRa modem.
//!
//! The RN2903 speaks a line-oriented ASCII command set over a serial port:
//! every command and every response line ends with `\r\n`. This crate layers
//! the LoRaWAN-facing operations on top of the shared text engine in
//! `rn2903-text-io`:
//!
//! - **Session** ([`session`]) -- [`Rn2903`], owning the transport and the
//!   last response line; device bring-up, raw commands, key setup.
//! - **Command builders** ([`commands`]) -- command text for the operations
//!   the driver issues, with hex and length validation for EUIs and keys.
//! - **Status decoding** ([`status`]) -- the `mac get status` word as flags
//!   and a MAC sub-state.
//! - **Join** ([`join`]) -- the OTAA/ABP join state machine and its outcomes.
//! - **Builder** ([`builder`]) -- fluent construction of a session over a
//!   serial port or any [`Transport`](rn2903_core::Transport).
//!
//! # Example
//!
//! ```
//! use rn2903::status::{MacState, parse_mac_status};
//! use rn2903::{JoinType, commands};
//!
//! assert_eq!(commands::cmd_mac_join(JoinType::Otaa), "mac join otaa");
//!
//! // "0100" is the byte pair [0x01, 0x00]: joined, MAC idle.
//! let status = parse_mac_status("0100").unwrap();
//! assert!(status.is_joined());
//! assert_eq!(status.state(), MacState::Idle);
//! ```

pub mod builder;
pub mod commands;
pub mod join;
pub mod session;
pub mod status;

pub use builder::Rn2903Builder;
pub use join::{JoinSequencer, JoinState, JoinStatus, JoinType};
pub use rn2903_core::codec::{from_hex, from_hex_str, to_hex};
pub use rn2903_text_io::contains_phrase;
pub use session::Rn2903;
pub use status::{MacState, MacStatus, MacStatusFlags};
