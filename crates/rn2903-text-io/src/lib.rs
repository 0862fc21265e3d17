//! Command/response engine for the RN2903's CR/LF-terminated text protocol.
//!
//! This crate owns the byte-level half of the driver: draining stale input,
//! writing a command and its terminator, accumulating one response line
//! against a deadline, and classifying the result as a
//! [`ResponseStatus`](rn2903_core::ResponseStatus).
//!
//! # Architecture
//!
//! - [`protocol`] -- wire constants, the bounded response buffer, classification
//! - [`io`] -- drain, response reader, and command execution over a transport

pub mod io;
pub mod protocol;

pub use io::{await_response, drain, execute_command};
pub use protocol::{ResponseBuffer, contains_phrase};
