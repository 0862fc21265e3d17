//! Error types for the RN2903 driver.
//!
//! All fallible operations across the workspace return [`Result<T>`], which
//! uses [`Error`] as the error type. Per-exchange outcomes (timeout,
//! `invalid_param`, transport failure) are reported as
//! [`ResponseStatus`](crate::types::ResponseStatus) first and only become an
//! [`Error`] when a caller needs `?` propagation.

/// The error type for all RN2903 driver operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (serial port open, read or write failure).
    #[error("transport error: {0}")]
    Transport(String),

    /// The modem answered with something the driver could not interpret.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for a response line from the modem.
    ///
    /// This typically indicates the modem is powered off, the baud rate is
    /// wrong, or the command was never terminated with CR/LF.
    #[error("timeout waiting for response")]
    Timeout,

    /// The modem rejected a command with `invalid_param`.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Caller-supplied or device-supplied data failed validation
    /// (malformed hex, wrong payload length).
    #[error("validation error: {0}")]
    Validation(String),

    /// The requested operation is not supported by this transport.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// No connection to the modem has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the modem was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
