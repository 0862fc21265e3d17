//! Transport trait for modem communication.
//!
//! The [`Transport`] trait abstracts over the serial link to the modem. The
//! workspace ships a `tokio-serial` implementation in `rn2903-transport` and
//! a scripted `MockTransport` in `rn2903-test-harness`.
//!
//! The shape follows what the command engine needs from a UART: a
//! non-blocking "is anything buffered" check, a read that returns whatever
//! is buffered, and a write that reports how many bytes went out.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::FlowControl;

/// Asynchronous byte-level transport to a modem.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Write raw bytes to the modem, returning the number of bytes written.
    ///
    /// Implementations should not return until the bytes have been handed
    /// to the underlying device (and flushed, where that applies).
    async fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Read currently buffered bytes into `buf`, returning the count.
    ///
    /// Callers check [`data_available`](Transport::data_available) first;
    /// a read with nothing buffered may block.
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Report whether at least one byte can be read, waiting up to `timeout`.
    ///
    /// A zero timeout performs a single non-blocking check.
    async fn data_available(&mut self, timeout: Duration) -> bool;

    /// Change the line rate of an open transport.
    async fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        let _ = baud_rate;
        Err(Error::Unsupported("baud rate change".into()))
    }

    /// Change the flow control mode of an open transport.
    async fn set_flow_control(&mut self, flow_control: FlowControl) -> Result<()> {
        let _ = flow_control;
        Err(Error::Unsupported("flow control change".into()))
    }

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent reads and writes should return
    /// [`Error::NotConnected`].
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
