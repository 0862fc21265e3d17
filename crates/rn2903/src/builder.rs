//! Rn2903Builder -- fluent builder for constructing [`Rn2903`] sessions.
//!
//! Separates configuration from construction so that callers can set up
//! serial line parameters and timeouts before the port is opened and the
//! modem brought up.
//!
//! # Example
//!
//! ```no_run
//! use rn2903::builder::Rn2903Builder;
//! use std::time::Duration;
//!
//! # async fn example() -> rn2903_core::Result<()> {
//! let modem = Rn2903Builder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .response_wait(Duration::from_millis(500))
//!     .build()
//!     .await?;
//! println!("hardware EUI {}", modem.hardware_eui());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use rn2903_core::error::{Error, Result};
use rn2903_core::transport::Transport;
use rn2903_core::types::FlowControl;
use rn2903_transport::{SerialConfig, SerialTransport};

use crate::session::{DEFAULT_JOIN_GRANT_TIMEOUT, DEFAULT_RESPONSE_WAIT, Rn2903};

/// The modem's factory default line speed.
pub const DEFAULT_BAUD_RATE: u32 = 57_600;

/// Fluent builder for [`Rn2903`].
///
/// ```ignore
/// let modem = Rn2903Builder::new()
///     .serial_port("/dev/ttyUSB0")
///     .build()
///     .await?;
/// ```
pub struct Rn2903Builder {
    serial_port: Option<String>,
    baud_rate: u32,
    flow_control: FlowControl,
    response_wait: Duration,
    join_grant_timeout: Duration,
    debug: bool,
    initialize: bool,
}

impl Rn2903Builder {
    pub fn new() -> Self {
        Rn2903Builder {
            serial_port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            flow_control: FlowControl::None,
            response_wait: DEFAULT_RESPONSE_WAIT,
            join_grant_timeout: DEFAULT_JOIN_GRANT_TIMEOUT,
            debug: false,
            initialize: true,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the line speed (default: 57600).
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = baud;
        self
    }

    pub fn flow_control(mut self, flow_control: FlowControl) -> Self {
        self.flow_control = flow_control;
        self
    }

    /// Set how long to wait for each response line (default: 250ms).
    pub fn response_wait(mut self, wait: Duration) -> Self {
        self.response_wait = wait;
        self
    }

    /// Set how long a join waits for the network's verdict (default: 60s).
    pub fn join_grant_timeout(mut self, timeout: Duration) -> Self {
        self.join_grant_timeout = timeout;
        self
    }

    /// Echo every command and response at `info` level.
    pub fn debug(mut self, enable: bool) -> Self {
        self.debug = enable;
        self
    }

    /// Run [`Rn2903::initialize`] before returning the session
    /// (default: on).
    pub fn initialize(mut self, enable: bool) -> Self {
        self.initialize = enable;
        self
    }

    /// Build an [`Rn2903`] over a caller-provided transport.
    ///
    /// This is the entry point for testing (pass a `MockTransport` from
    /// `rn2903-test-harness`). The transport's line settings are left as
    /// they are.
    pub async fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<Rn2903> {
        if self.response_wait.is_zero() {
            return Err(Error::InvalidParameter(
                "response_wait must be greater than zero".into(),
            ));
        }
        if self.join_grant_timeout.is_zero() {
            return Err(Error::InvalidParameter(
                "join_grant_timeout must be greater than zero".into(),
            ));
        }

        let mut modem = Rn2903::new(transport);
        modem.set_response_wait_time(self.response_wait);
        modem.set_join_grant_timeout(self.join_grant_timeout);
        modem.set_debug(self.debug);

        if self.initialize {
            modem.initialize().await?;
        }
        Ok(modem)
    }

    /// Build an [`Rn2903`] over a serial port.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    pub async fn build(self) -> Result<Rn2903> {
        let port = self
            .serial_port
            .as_ref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;
        let config = SerialConfig {
            baud_rate: self.baud_rate,
            flow_control: self.flow_control,
            ..SerialConfig::default()
        };

        let transport = SerialTransport::open_with_config(port, config).await?;
        self.build_with_transport(Box::new(transport)).await
    }
}

impl Default for Rn2903Builder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rn2903_test_harness::MockTransport;

    fn expect_bring_up(mock: &MockTransport) {
        mock.expect(b"sys get ver", b"invalid_param\r\n");
        mock.expect(b"sys reset", b"RN2903 1.0.3 Aug  8 2017 15:11:09\r\n");
        mock.expect(b"sys get hweui", b"0004A30B001A2B3C\r\n");
    }

    #[tokio::test]
    async fn builder_defaults() {
        let mock = MockTransport::new();
        expect_bring_up(&mock);
        let modem = Rn2903Builder::new()
            .build_with_transport(Box::new(mock.clone()))
            .await
            .unwrap();

        assert_eq!(modem.response_wait_time(), DEFAULT_RESPONSE_WAIT);
        assert_eq!(modem.join_grant_timeout(), DEFAULT_JOIN_GRANT_TIMEOUT);
        assert!(!modem.debug());
        assert_eq!(modem.hardware_eui(), "0004A30B001A2B3C");
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn builder_custom_settings() {
        let mock = MockTransport::new();
        let modem = Rn2903Builder::new()
            .serial_port("/dev/ttyUSB0")
            .baud_rate(115_200)
            .flow_control(FlowControl::Hardware)
            .response_wait(Duration::from_millis(500))
            .join_grant_timeout(Duration::from_secs(10))
            .debug(true)
            .initialize(false)
            .build_with_transport(Box::new(mock.clone()))
            .await
            .unwrap();

        assert_eq!(modem.response_wait_time(), Duration::from_millis(500));
        assert_eq!(modem.join_grant_timeout(), Duration::from_secs(10));
        assert!(modem.debug());
        assert_eq!(modem.hardware_eui(), "");
        assert!(mock.sent_data().is_empty());
    }

    #[tokio::test]
    async fn builder_propagates_bring_up_failure() {
        let mock = MockTransport::new();
        mock.expect(b"sys get ver", b"invalid_param\r\n");
        mock.expect(b"sys reset", b"invalid_param\r\n");
        let result = Rn2903Builder::new()
            .response_wait(Duration::from_millis(50))
            .build_with_transport(Box::new(mock))
            .await;

        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn builder_rejects_zero_timeouts() {
        let result = Rn2903Builder::new()
            .initialize(false)
            .response_wait(Duration::ZERO)
            .build_with_transport(Box::new(MockTransport::new()))
            .await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        let result = Rn2903Builder::new()
            .initialize(false)
            .join_grant_timeout(Duration::ZERO)
            .build_with_transport(Box::new(MockTransport::new()))
            .await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn builder_serial_port_required_for_build() {
        let result = Rn2903Builder::new().build().await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }
}
