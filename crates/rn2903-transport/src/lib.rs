//! Transport implementations for the RN2903 driver.
//!
//! This crate provides [`SerialTransport`], a concrete implementation of the
//! [`Transport`](rn2903_core::Transport) trait from `rn2903-core` over
//! `tokio-serial`. The modem is reached through a USB-UART bridge or an
//! on-board UART.
//!
//! # Example
//!
//! ```no_run
//! use rn2903_transport::SerialTransport;
//! use rn2903_core::transport::Transport;
//!
//! # async fn example() -> rn2903_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 57_600).await?;
//! transport.write(b"sys get hweui\r\n").await?;
//! # Ok(())
//! # }
//! ```

pub mod serial;

pub use serial::{DataBits, Parity, SerialConfig, SerialTransport, StopBits};
