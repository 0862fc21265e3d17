//! Rn2903 -- a session with one RN2903 modem.
//!
//! The session owns the transport and the last response line. Every command
//! goes through the shared text engine ([`rn2903_text_io::execute_command`]),
//! which drains stale input, writes the command and its `\r\n`, and reads a
//! single response line into the session's buffer. The buffer is overwritten
//! by the next exchange; read it through [`Rn2903::response`] before issuing
//! another command.
//!
//! All operations take `&mut self`: a session is driven by one task at a time.

use std::borrow::Cow;
use std::time::Duration;

use tracing::{debug, info, warn};

use rn2903_core::error::Result;
use rn2903_core::transport::Transport;
use rn2903_core::types::{FlowControl, ResponseStatus};
use rn2903_text_io::{ResponseBuffer, await_response, drain, execute_command};

use crate::commands;
use crate::join::{JoinSequencer, JoinStatus, JoinType};
use crate::status::{self, MacState, MacStatus};

/// Default time to wait for a response line.
pub const DEFAULT_RESPONSE_WAIT: Duration = Duration::from_millis(250);

/// Default time to wait for the network's verdict on a join request.
pub const DEFAULT_JOIN_GRANT_TIMEOUT: Duration = Duration::from_secs(60);

/// A connected RN2903 modem.
///
/// Usually constructed via [`Rn2903Builder`](crate::builder::Rn2903Builder),
/// which also runs [`initialize`](Self::initialize).
pub struct Rn2903 {
    transport: Box<dyn Transport>,
    response: ResponseBuffer,
    response_wait: Duration,
    join_grant_timeout: Duration,
    /// Log every command and response at `info` level.
    debug: bool,
    /// Set by `initialize`.
    hardware_eui: String,
    /// Last decoded `mac get status`; zero until the first refresh.
    mac_status: MacStatus,
}

impl Rn2903 {
    /// Create a session over `transport` with default settings. No I/O is
    /// performed.
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Rn2903 {
            transport,
            response: ResponseBuffer::new(),
            response_wait: DEFAULT_RESPONSE_WAIT,
            join_grant_timeout: DEFAULT_JOIN_GRANT_TIMEOUT,
            debug: false,
            hardware_eui: String::new(),
            mac_status: MacStatus::default(),
        }
    }

    /// Bring the modem into a known state.
    ///
    /// The first command after power-up is answered with `invalid_param`, so
    /// `sys get ver` is sent once and its outcome ignored. The modem is then
    /// reset and the hardware EUI read and cached.
    pub async fn initialize(&mut self) -> Result<()> {
        let status = self.command(commands::CMD_SYS_GET_VER).await;
        debug!(%status, "wake-up command");

        self.reset().await?;
        self.command_ok(commands::CMD_SYS_GET_HWEUI).await?;
        self.hardware_eui = commands::parse_hardware_eui(&self.response.text());

        info!(hweui = %self.hardware_eui, "RN2903 initialized");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Command engine
    // -----------------------------------------------------------------------

    /// Send `command` and read one response line using the session's
    /// response wait.
    pub async fn command(&mut self, command: &str) -> ResponseStatus {
        execute_command(
            self.transport.as_mut(),
            &mut self.response,
            command,
            self.response_wait,
            self.debug,
        )
        .await
    }

    /// Send `command` and map a non-Ok outcome to an error.
    async fn command_ok(&mut self, command: &str) -> Result<()> {
        let status = self.command(command).await;
        if !status.is_ok() {
            warn!(command, %status, "command failed");
        }
        status.into_result(command)
    }

    /// Read one more response line without sending anything, waiting at
    /// most `deadline`. Used for commands that answer twice.
    pub async fn wait_for_response(&mut self, deadline: Duration) -> ResponseStatus {
        await_response(
            self.transport.as_mut(),
            &mut self.response,
            deadline,
            self.debug,
        )
        .await
    }

    /// The last response line as text (invalid UTF-8 replaced).
    pub fn response(&self) -> Cow<'_, str> {
        self.response.text()
    }

    pub fn response_bytes(&self) -> &[u8] {
        self.response.as_bytes()
    }

    pub fn response_len(&self) -> usize {
        self.response.len()
    }

    /// The hardware EUI cached by [`initialize`](Self::initialize); empty
    /// before that.
    pub fn hardware_eui(&self) -> &str {
        &self.hardware_eui
    }

    // -----------------------------------------------------------------------
    // Settings
    // -----------------------------------------------------------------------

    pub fn set_response_wait_time(&mut self, wait: Duration) {
        self.response_wait = wait;
    }

    pub fn response_wait_time(&self) -> Duration {
        self.response_wait
    }

    pub fn set_join_grant_timeout(&mut self, timeout: Duration) {
        self.join_grant_timeout = timeout;
    }

    pub fn join_grant_timeout(&self) -> Duration {
        self.join_grant_timeout
    }

    /// Enable or disable command/response echo at `info` level.
    pub fn set_debug(&mut self, enable: bool) {
        self.debug = enable;
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Change the serial line speed. Fails with
    /// [`Error::Unsupported`](rn2903_core::Error::Unsupported) when the
    /// transport has no line settings.
    pub async fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        self.transport.set_baud_rate(baud_rate).await
    }

    pub async fn set_flow_control(&mut self, flow_control: FlowControl) -> Result<()> {
        self.transport.set_flow_control(flow_control).await
    }

    // -----------------------------------------------------------------------
    // Raw transport access
    // -----------------------------------------------------------------------

    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.transport.read(buf).await
    }

    pub async fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.transport.write(data).await
    }

    pub async fn data_available(&mut self, timeout: Duration) -> bool {
        self.transport.data_available(timeout).await
    }

    /// Discard any buffered input. Returns the number of bytes dropped.
    pub async fn drain(&mut self) -> usize {
        drain(self.transport.as_mut()).await
    }

    // -----------------------------------------------------------------------
    // Device operations
    // -----------------------------------------------------------------------

    /// Reboot the modem (`sys reset`).
    pub async fn reset(&mut self) -> Result<()> {
        self.command_ok(commands::CMD_SYS_RESET).await
    }

    /// Read the firmware version string (`sys get ver`).
    pub async fn version(&mut self) -> Result<String> {
        self.command_ok(commands::CMD_SYS_GET_VER).await?;
        Ok(self.response().into_owned())
    }

    /// Refresh the cached MAC status with `mac get status`.
    ///
    /// On failure the previous status is kept.
    pub async fn update_mac_status(&mut self) -> Result<()> {
        self.command_ok(commands::CMD_MAC_GET_STATUS).await?;
        let parsed = status::parse_mac_status(&self.response.text())?;
        debug!(status = %parsed, "MAC status updated");
        self.mac_status = parsed;
        Ok(())
    }

    /// The status decoded by the last successful
    /// [`update_mac_status`](Self::update_mac_status).
    pub fn mac_status(&self) -> MacStatus {
        self.mac_status
    }

    pub fn mac_status_word(&self) -> u16 {
        self.mac_status.word()
    }

    pub fn mac_state(&self) -> MacState {
        self.mac_status.state()
    }

    /// Join the network.
    ///
    /// Refuses to submit when the MAC is already joined, silenced, paused or
    /// busy; otherwise sends `mac join` and waits up to the join-grant
    /// timeout for the verdict.
    pub async fn join(&mut self, join_type: JoinType) -> JoinStatus {
        JoinSequencer::new(self, join_type).run().await
    }

    // -----------------------------------------------------------------------
    // LoRaWAN identity and keys
    // -----------------------------------------------------------------------

    pub async fn set_device_eui(&mut self, eui: &str) -> Result<()> {
        let cmd = commands::cmd_set_device_eui(eui)?;
        self.command_ok(&cmd).await
    }

    pub async fn set_application_eui(&mut self, eui: &str) -> Result<()> {
        let cmd = commands::cmd_set_application_eui(eui)?;
        self.command_ok(&cmd).await
    }

    pub async fn set_application_key(&mut self, key: &str) -> Result<()> {
        let cmd = commands::cmd_set_application_key(key)?;
        self.command_ok(&cmd).await
    }

    pub async fn set_device_addr(&mut self, addr: &str) -> Result<()> {
        let cmd = commands::cmd_set_device_addr(addr)?;
        self.command_ok(&cmd).await
    }

    pub async fn set_network_session_key(&mut self, key: &str) -> Result<()> {
        let cmd = commands::cmd_set_network_session_key(key)?;
        self.command_ok(&cmd).await
    }

    pub async fn set_application_session_key(&mut self, key: &str) -> Result<()> {
        let cmd = commands::cmd_set_application_session_key(key)?;
        self.command_ok(&cmd).await
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Close the underlying transport.
    pub async fn close(&mut self) -> Result<()> {
        info!("closing RN2903 session");
        self.transport.close().await
    }

    /// Consume the session and hand back its transport.
    pub fn into_transport(self) -> Box<dyn Transport> {
        self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rn2903_core::Error;
    use rn2903_test_harness::MockTransport;

    fn session(mock: &MockTransport) -> Rn2903 {
        let mut modem = Rn2903::new(Box::new(mock.clone()));
        modem.set_response_wait_time(Duration::from_millis(50));
        modem
    }

    // -----------------------------------------------------------------------
    // Defaults and settings
    // -----------------------------------------------------------------------

    #[test]
    fn new_session_defaults() {
        let modem = Rn2903::new(Box::new(MockTransport::new()));
        assert_eq!(modem.response_wait_time(), Duration::from_millis(250));
        assert_eq!(modem.join_grant_timeout(), Duration::from_secs(60));
        assert!(!modem.debug());
        assert_eq!(modem.hardware_eui(), "");
        assert_eq!(modem.mac_status_word(), 0);
        assert_eq!(modem.mac_state(), MacState::Idle);
        assert_eq!(modem.response_len(), 0);
    }

    #[test]
    fn settings_are_mutable() {
        let mut modem = Rn2903::new(Box::new(MockTransport::new()));
        modem.set_response_wait_time(Duration::from_millis(400));
        modem.set_join_grant_timeout(Duration::from_secs(5));
        modem.set_debug(true);
        assert_eq!(modem.response_wait_time(), Duration::from_millis(400));
        assert_eq!(modem.join_grant_timeout(), Duration::from_secs(5));
        assert!(modem.debug());
    }

    #[tokio::test]
    async fn line_settings_reach_transport() {
        let mock = MockTransport::new();
        let mut modem = session(&mock);
        modem.set_baud_rate(115_200).await.unwrap();
        modem.set_flow_control(FlowControl::Hardware).await.unwrap();
        assert_eq!(mock.baud_rate(), Some(115_200));
        assert_eq!(mock.flow_control(), Some(FlowControl::Hardware));
    }

    // -----------------------------------------------------------------------
    // Initialization
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn initialize_caches_hardware_eui() {
        let mock = MockTransport::new();
        mock.expect(b"sys get ver", b"invalid_param\r\n");
        mock.expect(b"sys reset", b"RN2903 1.0.3 Aug  8 2017 15:11:09\r\n");
        mock.expect(b"sys get hweui", b"0004A30B001A2B3C\r\n");
        let mut modem = session(&mock);

        modem.initialize().await.unwrap();
        assert_eq!(modem.hardware_eui(), "0004A30B001A2B3C");
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn initialize_tolerates_silent_wake_up() {
        let mock = MockTransport::new();
        mock.expect(b"sys get ver", b"");
        mock.expect(b"sys reset", b"RN2903 1.0.3\r\n");
        mock.expect(b"sys get hweui", b"0004A30B001A2B3C\r\n");
        let mut modem = session(&mock);

        modem.initialize().await.unwrap();
        assert_eq!(modem.hardware_eui(), "0004A30B001A2B3C");
    }

    #[tokio::test]
    async fn initialize_fails_when_reset_rejected() {
        let mock = MockTransport::new();
        mock.expect(b"sys get ver", b"invalid_param\r\n");
        mock.expect(b"sys reset", b"invalid_param\r\n");
        let mut modem = session(&mock);

        let err = modem.initialize().await.unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(ref c) if c == "sys reset"));
        assert_eq!(modem.hardware_eui(), "");
    }

    #[tokio::test]
    async fn initialize_fails_when_hweui_times_out() {
        let mock = MockTransport::new();
        mock.expect(b"sys get ver", b"ok\r\n");
        mock.expect(b"sys reset", b"ok\r\n");
        mock.expect(b"sys get hweui", b"");
        let mut modem = session(&mock);

        assert!(matches!(modem.initialize().await, Err(Error::Timeout)));
    }

    // -----------------------------------------------------------------------
    // Commands and responses
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn command_exposes_response() {
        let mock = MockTransport::new();
        mock.expect(b"sys get vdd", b"3312\r\n");
        let mut modem = session(&mock);

        assert_eq!(modem.command("sys get vdd").await, ResponseStatus::Ok);
        assert_eq!(modem.response(), "3312");
        assert_eq!(modem.response_bytes(), b"3312");
        assert_eq!(modem.response_len(), 4);
    }

    #[tokio::test]
    async fn response_overwritten_by_next_command() {
        let mock = MockTransport::new();
        mock.expect(b"sys get ver", b"RN2903 1.0.3\r\n");
        mock.expect(b"sys get vdd", b"3312\r\n");
        let mut modem = session(&mock);

        modem.command("sys get ver").await;
        modem.command("sys get vdd").await;
        assert_eq!(modem.response(), "3312");
    }

    #[tokio::test]
    async fn wait_for_second_line() {
        let mock = MockTransport::new();
        mock.expect(b"mac tx uncnf 1 AB", b"ok\r\nmac_tx_ok\r\n");
        let mut modem = session(&mock);

        assert_eq!(modem.command("mac tx uncnf 1 AB").await, ResponseStatus::Ok);
        assert_eq!(modem.response(), "ok");
        let status = modem.wait_for_response(Duration::from_millis(50)).await;
        assert_eq!(status, ResponseStatus::Ok);
        assert_eq!(modem.response(), "mac_tx_ok");
    }

    #[tokio::test]
    async fn version_returns_text() {
        let mock = MockTransport::new();
        mock.expect(b"sys get ver", b"RN2903 1.0.3 Aug  8 2017 15:11:09\r\n");
        let mut modem = session(&mock);

        assert_eq!(
            modem.version().await.unwrap(),
            "RN2903 1.0.3 Aug  8 2017 15:11:09"
        );
    }

    #[tokio::test]
    async fn reset_rejected() {
        let mock = MockTransport::new();
        mock.expect(b"sys reset", b"invalid_param\r\n");
        let mut modem = session(&mock);

        assert!(matches!(
            modem.reset().await,
            Err(Error::InvalidParameter(_))
        ));
    }

    #[tokio::test]
    async fn write_failure_surfaces_as_transport_error() {
        let mock = MockTransport::new();
        mock.set_write_failure(true);
        let mut modem = session(&mock);

        assert!(matches!(modem.version().await, Err(Error::Transport(_))));
    }

    // -----------------------------------------------------------------------
    // MAC status
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn update_mac_status_decodes_word() {
        let mock = MockTransport::new();
        mock.expect(b"mac get status", b"0100\r\n");
        let mut modem = session(&mock);

        modem.update_mac_status().await.unwrap();
        assert_eq!(modem.mac_status_word(), 0x0001);
        assert_eq!(modem.mac_state(), MacState::Idle);
        assert!(modem.mac_status().is_joined());
    }

    #[tokio::test]
    async fn update_mac_status_keeps_previous_on_failure() {
        let mock = MockTransport::new();
        mock.expect(b"mac get status", b"0100\r\n");
        mock.expect(b"mac get status", b"01\r\n");
        let mut modem = session(&mock);

        modem.update_mac_status().await.unwrap();
        let err = modem.update_mac_status().await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(modem.mac_status_word(), 0x0001);
    }

    #[tokio::test]
    async fn update_mac_status_timeout() {
        let mock = MockTransport::new();
        mock.expect(b"mac get status", b"");
        let mut modem = session(&mock);

        assert!(matches!(
            modem.update_mac_status().await,
            Err(Error::Timeout)
        ));
    }

    // -----------------------------------------------------------------------
    // Keys
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn otaa_credentials() {
        let mock = MockTransport::new();
        mock.expect(b"mac set deveui 0011223344556677", b"ok\r\n");
        mock.expect(b"mac set appeui 70B3D57ED0000000", b"ok\r\n");
        mock.expect(
            b"mac set appkey 000102030405060708090A0B0C0D0E0F",
            b"ok\r\n",
        );
        let mut modem = session(&mock);

        modem.set_device_eui("0011223344556677").await.unwrap();
        modem.set_application_eui("70B3D57ED0000000").await.unwrap();
        modem
            .set_application_key("000102030405060708090A0B0C0D0E0F")
            .await
            .unwrap();
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn abp_credentials() {
        let mock = MockTransport::new();
        mock.expect(b"mac set devaddr 26011BDA", b"ok\r\n");
        mock.expect(
            b"mac set nwkskey 000102030405060708090A0B0C0D0E0F",
            b"ok\r\n",
        );
        mock.expect(
            b"mac set appskey 0F0E0D0C0B0A09080706050403020100",
            b"ok\r\n",
        );
        let mut modem = session(&mock);

        modem.set_device_addr("26011BDA").await.unwrap();
        modem
            .set_network_session_key("000102030405060708090A0B0C0D0E0F")
            .await
            .unwrap();
        modem
            .set_application_session_key("0F0E0D0C0B0A09080706050403020100")
            .await
            .unwrap();
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn malformed_key_never_sent() {
        let mock = MockTransport::new();
        let mut modem = session(&mock);

        let err = modem.set_device_addr("26011BD").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(mock.sent_data().is_empty());
    }

    #[tokio::test]
    async fn key_rejected_by_modem() {
        let mock = MockTransport::new();
        mock.expect(b"mac set devaddr 26011BDA", b"invalid_param\r\n");
        let mut modem = session(&mock);

        assert!(matches!(
            modem.set_device_addr("26011BDA").await,
            Err(Error::InvalidParameter(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Raw access and teardown
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn raw_pass_through() {
        let mock = MockTransport::new();
        mock.inject(b"mac_rx 1 AB\r\n");
        let mut modem = session(&mock);

        assert!(modem.data_available(Duration::ZERO).await);
        let mut buf = [0u8; 6];
        assert_eq!(modem.read(&mut buf).await.unwrap(), 6);
        assert_eq!(&buf, b"mac_rx");
        assert_eq!(modem.drain().await, 7);
        assert!(!modem.data_available(Duration::ZERO).await);

        mock.expect(b"sys get ver", b"");
        assert_eq!(modem.write(b"sys get ver\r\n").await.unwrap(), 13);
        assert_eq!(mock.sent_lines(), vec!["sys get ver".to_string()]);
    }

    #[tokio::test]
    async fn close_disconnects_transport() {
        let mock = MockTransport::new();
        let mut modem = session(&mock);

        modem.close().await.unwrap();
        assert!(!mock.is_connected());
        assert!(!modem.into_transport().is_connected());
    }
}
