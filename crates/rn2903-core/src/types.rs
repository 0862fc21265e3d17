//! Core types shared by the transport, the command engine and the driver.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Serial flow control mode.
///
/// The modem runs without flow control after power-up; hardware (RTS/CTS)
/// and software (XON/XOFF) modes are available on boards that wire them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlowControl {
    /// No flow control.
    #[default]
    None,
    /// RTS/CTS hardware handshaking.
    Hardware,
    /// XON/XOFF software handshaking.
    Software,
}

impl fmt::Display for FlowControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlowControl::None => "none",
            FlowControl::Hardware => "hardware",
            FlowControl::Software => "software",
        };
        write!(f, "{s}")
    }
}

/// Error returned when a string cannot be parsed into a [`FlowControl`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFlowControlError(String);

impl fmt::Display for ParseFlowControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown flow control: {}", self.0)
    }
}

impl std::error::Error for ParseFlowControlError {}

impl FromStr for FlowControl {
    type Err = ParseFlowControlError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(FlowControl::None),
            "hardware" | "hard" | "rtscts" => Ok(FlowControl::Hardware),
            "software" | "soft" | "xonxoff" => Ok(FlowControl::Software),
            _ => Err(ParseFlowControlError(s.to_string())),
        }
    }
}

/// Classified outcome of a single command/response exchange.
///
/// Evaluated once the response line is complete (delimiter seen or buffer
/// full) or the deadline passed. A transport failure bypasses the
/// text-based classification entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseStatus {
    /// A complete line arrived: `ok`, data, or an empty acknowledgement.
    Ok,
    /// The line contained `invalid_param`.
    InvalidParam,
    /// No line delimiter arrived before the deadline.
    Timeout,
    /// The transport failed to read or write.
    TransportError(String),
}

impl ResponseStatus {
    /// Returns `true` for [`ResponseStatus::Ok`].
    pub fn is_ok(&self) -> bool {
        matches!(self, ResponseStatus::Ok)
    }

    /// Convert into a [`Result`], naming `command` in the error when the
    /// modem rejected it.
    pub fn into_result(self, command: &str) -> Result<()> {
        match self {
            ResponseStatus::Ok => Ok(()),
            ResponseStatus::InvalidParam => Err(Error::InvalidParameter(command.to_string())),
            ResponseStatus::Timeout => Err(Error::Timeout),
            ResponseStatus::TransportError(msg) => Err(Error::Transport(msg)),
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseStatus::Ok => write!(f, "ok"),
            ResponseStatus::InvalidParam => write!(f, "invalid parameter"),
            ResponseStatus::Timeout => write!(f, "timeout"),
            ResponseStatus::TransportError(msg) => write!(f, "transport error: {msg}"),
        }
    }
}
