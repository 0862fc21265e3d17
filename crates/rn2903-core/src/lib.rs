//! rn2903-core: Core traits, types, and error definitions for the RN2903
//! LoRa modem driver.
//!
//! This crate defines the pieces every other crate in the workspace shares:
//! the byte-level transport abstraction, the error type, the per-exchange
//! response classification, and the hex codec used to carry binary data
//! through the modem's text command set.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level communication channel
//! - [`ResponseStatus`] -- outcome of one command/response exchange
//! - [`codec`] -- hex encode/decode
//! - [`Error`] / [`Result`] -- error handling

pub mod codec;
pub mod error;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use rn2903_core::*`.
pub use codec::{from_hex, from_hex_str, to_hex, validate_hex};
pub use error::{Error, Result};
pub use transport::Transport;
pub use types::{FlowControl, ParseFlowControlError, ResponseStatus};
