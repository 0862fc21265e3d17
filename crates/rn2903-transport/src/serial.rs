//! Serial port transport for modem communication.
//!
//! This module provides [`SerialTransport`], which implements the
//! [`Transport`] trait for USB-UART bridges and on-board UARTs wired to the
//! modem. The RN2903 powers up at 57600 baud, 8N1, without flow control.
//!
//! # Example
//!
//! ```no_run
//! use rn2903_transport::SerialTransport;
//! use rn2903_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> rn2903_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 57_600).await?;
//!
//! transport.write(b"sys get ver\r\n").await?;
//!
//! if transport.data_available(Duration::from_millis(250)).await {
//!     let mut buf = [0u8; 64];
//!     let n = transport.read(&mut buf).await?;
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use rn2903_core::error::{Error, Result};
use rn2903_core::transport::Transport;
use rn2903_core::types::FlowControl;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};

/// Interval between readiness checks while [`SerialTransport::data_available`]
/// waits for a non-zero timeout.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Serial port configuration.
///
/// Defaults match the modem's power-up settings:
/// - 57600 baud
/// - 8 data bits
/// - 1 stop bit
/// - No parity
/// - No flow control
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Baud rate (the modem's auto-baud supports rates up to 115200).
    pub baud_rate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Number of stop bits (typically 1)
    pub stop_bits: StopBits,
    /// Parity checking (typically None)
    pub parity: Parity,
    /// Flow control (None unless the board wires RTS/CTS)
    pub flow_control: FlowControl,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 57_600,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            flow_control: FlowControl::None,
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl From<DataBits> for tokio_serial::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => tokio_serial::DataBits::Five,
            DataBits::Six => tokio_serial::DataBits::Six,
            DataBits::Seven => tokio_serial::DataBits::Seven,
            DataBits::Eight => tokio_serial::DataBits::Eight,
        }
    }
}

/// Number of stop bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for tokio_serial::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => tokio_serial::StopBits::One,
            StopBits::Two => tokio_serial::StopBits::Two,
        }
    }
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for tokio_serial::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => tokio_serial::Parity::None,
            Parity::Odd => tokio_serial::Parity::Odd,
            Parity::Even => tokio_serial::Parity::Even,
        }
    }
}

fn serial_flow_control(flow: FlowControl) -> tokio_serial::FlowControl {
    match flow {
        FlowControl::None => tokio_serial::FlowControl::None,
        FlowControl::Software => tokio_serial::FlowControl::Software,
        FlowControl::Hardware => tokio_serial::FlowControl::Hardware,
    }
}

fn map_io_error(e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::BrokenPipe || e.kind() == std::io::ErrorKind::NotConnected
    {
        Error::ConnectionLost
    } else {
        Error::Io(e)
    }
}

/// Serial port transport for modem communication.
pub struct SerialTransport {
    /// The underlying serial port stream
    port: Option<SerialStream>,
    /// Port name for logging/debugging
    port_name: String,
}

impl SerialTransport {
    /// Open a serial port with the given baud rate and default settings
    /// (8N1, no flow control).
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g., "/dev/ttyUSB0" on Linux, "COM3" on Windows)
    /// * `baud_rate` - Baud rate (the modem defaults to 57600)
    pub async fn open(port: &str, baud_rate: u32) -> Result<Self> {
        let config = SerialConfig {
            baud_rate,
            ..Default::default()
        };
        Self::open_with_config(port, config).await
    }

    /// Open a serial port with full configuration control.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use rn2903_transport::{SerialTransport, SerialConfig, DataBits, StopBits, Parity};
    /// # use rn2903_core::FlowControl;
    /// # async fn example() -> rn2903_core::Result<()> {
    /// let config = SerialConfig {
    ///     baud_rate: 57_600,
    ///     data_bits: DataBits::Eight,
    ///     stop_bits: StopBits::One,
    ///     parity: Parity::None,
    ///     flow_control: FlowControl::Hardware,
    /// };
    /// let transport = SerialTransport::open_with_config("/dev/ttyUSB0", config).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn open_with_config(port: &str, config: SerialConfig) -> Result<Self> {
        tracing::debug!(
            port = %port,
            baud_rate = config.baud_rate,
            data_bits = ?config.data_bits,
            stop_bits = ?config.stop_bits,
            parity = ?config.parity,
            flow_control = %config.flow_control,
            "Opening serial port"
        );

        let serial_stream = tokio_serial::new(port, config.baud_rate)
            .data_bits(config.data_bits.into())
            .stop_bits(config.stop_bits.into())
            .parity(config.parity.into())
            .flow_control(serial_flow_control(config.flow_control))
            .open_native_async()
            .map_err(|e| {
                tracing::error!(port = %port, error = %e, "Failed to open serial port");
                Error::Transport(format!("Failed to open serial port {}: {}", port, e))
            })?;

        tracing::info!(port = %port, baud_rate = config.baud_rate, "Serial port opened successfully");

        Ok(Self {
            port: Some(serial_stream),
            port_name: port.to_string(),
        })
    }

    /// Get the name of the serial port.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn write(&mut self, data: &[u8]) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(
            port = %self.port_name,
            bytes = data.len(),
            data = ?data,
            "Sending data"
        );

        port.write_all(data).await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Failed to send data");
            map_io_error(e)
        })?;

        port.flush().await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Failed to flush serial port");
            Error::Io(e)
        })?;

        Ok(data.len())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        match port.read(buf).await {
            Ok(n) => {
                tracing::trace!(
                    port = %self.port_name,
                    bytes = n,
                    data = ?&buf[..n],
                    "Received data"
                );
                Ok(n)
            }
            Err(e) => {
                tracing::error!(port = %self.port_name, error = %e, "Failed to receive data");
                Err(map_io_error(e))
            }
        }
    }

    async fn data_available(&mut self, timeout: Duration) -> bool {
        let Some(port) = self.port.as_ref() else {
            return false;
        };

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match port.bytes_to_read() {
                Ok(n) if n > 0 => return true,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(port = %self.port_name, error = %e, "Failed to query input queue");
                    return false;
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        port.set_baud_rate(baud_rate).map_err(|e| {
            tracing::error!(port = %self.port_name, baud_rate, error = %e, "Failed to set baud rate");
            Error::Transport(format!("Failed to set baud rate {}: {}", baud_rate, e))
        })?;
        tracing::debug!(port = %self.port_name, baud_rate, "Baud rate changed");
        Ok(())
    }

    async fn set_flow_control(&mut self, flow_control: FlowControl) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        port.set_flow_control(serial_flow_control(flow_control))
            .map_err(|e| {
                tracing::error!(
                    port = %self.port_name,
                    flow_control = %flow_control,
                    error = %e,
                    "Failed to set flow control"
                );
                Error::Transport(format!("Failed to set flow control {}: {}", flow_control, e))
            })?;
        tracing::debug!(port = %self.port_name, flow_control = %flow_control, "Flow control changed");
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            tracing::debug!(port = %self.port_name, "Closing serial port");

            if let Err(e) = port.flush().await {
                tracing::warn!(
                    port = %self.port_name,
                    error = %e,
                    "Failed to flush before closing (continuing anyway)"
                );
            }

            tracing::info!(port = %self.port_name, "Serial port closed");
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        if self.port.is_some() {
            tracing::debug!(port = %self.port_name, "SerialTransport dropped, closing port");
        }
    }
}
