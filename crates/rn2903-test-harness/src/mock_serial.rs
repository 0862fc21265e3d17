//! Mock transport for deterministic testing of the command engine.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/response pairs. Outbound bytes are collected until a `\r\n`
//! terminator completes a command line; the line is matched against the next
//! expectation and the scripted response bytes become readable.
//!
//! Clones share state, so a test can keep a clone as a probe after moving
//! the original into a session.
//!
//! # Example
//!
//! ```
//! use rn2903_test_harness::MockTransport;
//!
//! let mock = MockTransport::new();
//! // When the driver sends "sys get ver\r\n", answer with a version line.
//! mock.expect(b"sys get ver", b"RN2903 1.0.3 Aug  8 2017 15:11:09\r\n");
//! // Bytes left over from an earlier exchange, readable right away.
//! mock.inject(b"ok\r\n");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rn2903_core::error::{Error, Result};
use rn2903_core::transport::Transport;
use rn2903_core::types::FlowControl;

const LINE_TERMINATOR: &[u8] = b"\r\n";

/// A pre-loaded request/response pair for the mock transport.
#[derive(Debug, Clone)]
struct Expectation {
    /// The command line we expect, without the `\r\n` terminator.
    request: Vec<u8>,
    /// The bytes that become readable once the request line is complete.
    response: Vec<u8>,
}

#[derive(Debug)]
struct MockState {
    /// Ordered queue of expected request/response pairs.
    expectations: VecDeque<Expectation>,
    /// Bytes waiting to be read.
    rx: VecDeque<u8>,
    /// Outbound bytes that have not yet formed a complete line.
    line_buf: Vec<u8>,
    /// Whether the transport is "connected".
    connected: bool,
    /// Log of all bytes written, one element per `write()` call.
    sent_log: Vec<Vec<u8>>,
    /// Complete command lines written, terminators stripped.
    sent_lines: Vec<Vec<u8>>,
    fail_reads: bool,
    fail_writes: bool,
    /// Writes that may still succeed before every later one fails.
    writes_before_failure: Option<usize>,
    baud_rate: Option<u32>,
    flow_control: Option<FlowControl>,
}

/// A mock [`Transport`] for testing the driver without hardware.
///
/// Expectations are consumed in order. If a completed line does not match
/// the next expectation, or the queue is exhausted, `write()` returns
/// [`Error::Protocol`].
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            state: Arc::new(Mutex::new(MockState {
                expectations: VecDeque::new(),
                rx: VecDeque::new(),
                line_buf: Vec::new(),
                connected: true,
                sent_log: Vec::new(),
                sent_lines: Vec::new(),
                fail_reads: false,
                fail_writes: false,
                writes_before_failure: None,
                baud_rate: None,
                flow_control: None,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panic in one test thread must not hide the log from the others.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add an expected request/response pair.
    ///
    /// `request` is the command line without its `\r\n`. When the driver
    /// completes that line, `response` becomes readable. An empty response
    /// scripts a modem that never answers.
    pub fn expect(&self, request: &[u8], response: &[u8]) {
        self.state().expectations.push_back(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// Make `bytes` readable immediately, independent of any command.
    pub fn inject(&self, bytes: &[u8]) {
        self.state().rx.extend(bytes.iter().copied());
    }

    /// Return all data written through this transport, one element per
    /// `write()` call.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        self.state().sent_log.clone()
    }

    /// Return the complete command lines written so far, as text.
    pub fn sent_lines(&self) -> Vec<String> {
        self.state()
            .sent_lines
            .iter()
            .map(|l| String::from_utf8_lossy(l).into_owned())
            .collect()
    }

    /// Return the number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.state().expectations.len()
    }

    /// Return the number of bytes still waiting to be read.
    pub fn pending_bytes(&self) -> usize {
        self.state().rx.len()
    }

    /// Set the connected state of the mock transport.
    ///
    /// When set to `false`, subsequent reads and writes return
    /// [`Error::NotConnected`] and no data is reported available.
    pub fn set_connected(&self, connected: bool) {
        self.state().connected = connected;
    }

    /// Make every subsequent `read()` fail with [`Error::Transport`].
    pub fn set_read_failure(&self, fail: bool) {
        self.state().fail_reads = fail;
    }

    /// Make every subsequent `write()` fail with [`Error::Transport`].
    pub fn set_write_failure(&self, fail: bool) {
        self.state().fail_writes = fail;
    }

    /// Let the next `count` writes succeed and fail every write after
    /// them with [`Error::Transport`].
    pub fn set_write_failure_after(&self, count: usize) {
        self.state().writes_before_failure = Some(count);
    }

    /// The last baud rate applied through [`Transport::set_baud_rate`].
    pub fn baud_rate(&self) -> Option<u32> {
        self.state().baud_rate
    }

    /// The last flow control mode applied through
    /// [`Transport::set_flow_control`].
    pub fn flow_control(&self) -> Option<FlowControl> {
        self.state().flow_control
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockState {
    /// Split complete lines off the outbound buffer and answer them.
    fn process_lines(&mut self) -> Result<()> {
        while let Some(pos) = self
            .line_buf
            .windows(LINE_TERMINATOR.len())
            .position(|w| w == LINE_TERMINATOR)
        {
            let line: Vec<u8> = self.line_buf.drain(..pos + LINE_TERMINATOR.len()).collect();
            let line = line[..pos].to_vec();
            self.sent_lines.push(line.clone());

            let Some(expectation) = self.expectations.pop_front() else {
                return Err(Error::Protocol(
                    "no more expectations in mock transport".into(),
                ));
            };
            if line != expectation.request {
                return Err(Error::Protocol(format!(
                    "unexpected command: expected {:?}, got {:?}",
                    String::from_utf8_lossy(&expectation.request),
                    String::from_utf8_lossy(&line)
                )));
            }
            self.rx.extend(expectation.response);
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn write(&mut self, data: &[u8]) -> Result<usize> {
        let mut state = self.state();
        if !state.connected {
            return Err(Error::NotConnected);
        }
        if state.fail_writes {
            return Err(Error::Transport("injected write failure".into()));
        }
        match state.writes_before_failure {
            Some(0) => return Err(Error::Transport("injected write failure".into())),
            Some(n) => state.writes_before_failure = Some(n - 1),
            None => {}
        }

        state.sent_log.push(data.to_vec());
        state.line_buf.extend_from_slice(data);
        state.process_lines()?;
        Ok(data.len())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut state = self.state();
        if !state.connected {
            return Err(Error::NotConnected);
        }
        if state.fail_reads {
            return Err(Error::Transport("injected read failure".into()));
        }

        let n = state.rx.len().min(buf.len());
        for (slot, byte) in buf.iter_mut().zip(state.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    async fn data_available(&mut self, _timeout: Duration) -> bool {
        let state = self.state();
        state.connected && !state.rx.is_empty()
    }

    async fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        let mut state = self.state();
        if !state.connected {
            return Err(Error::NotConnected);
        }
        state.baud_rate = Some(baud_rate);
        Ok(())
    }

    async fn set_flow_control(&mut self, flow_control: FlowControl) -> Result<()> {
        let mut state = self.state();
        if !state.connected {
            return Err(Error::NotConnected);
        }
        state.flow_control = Some(flow_control);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.state();
        state.connected = false;
        state.rx.clear();
        state.line_buf.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state().connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_transport_basic_exchange() {
        let mut mock = MockTransport::new();
        mock.expect(b"sys get ver", b"RN2903 1.0.3\r\n");

        mock.write(b"sys get ver").await.unwrap();
        assert!(!mock.data_available(Duration::ZERO).await);

        mock.write(b"\r\n").await.unwrap();
        assert!(mock.data_available(Duration::ZERO).await);

        let mut buf = [0u8; 64];
        let n = mock.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"RN2903 1.0.3\r\n");
        assert!(!mock.data_available(Duration::ZERO).await);
    }

    #[tokio::test]
    async fn mock_transport_tracks_sent_data() {
        let mut mock = MockTransport::new();
        mock.expect(b"sys reset", b"");

        mock.write(b"sys reset").await.unwrap();
        mock.write(b"\r\n").await.unwrap();

        assert_eq!(mock.sent_data(), vec![b"sys reset".to_vec(), b"\r\n".to_vec()]);
        assert_eq!(mock.sent_lines(), vec!["sys reset".to_string()]);
    }

    #[tokio::test]
    async fn mock_transport_wrong_command_errors() {
        let mut mock = MockTransport::new();
        mock.expect(b"sys get ver", b"ok\r\n");

        let result = mock.write(b"sys get hweui\r\n").await;
        assert!(matches!(result.unwrap_err(), Error::Protocol(_)));
    }

    #[tokio::test]
    async fn mock_transport_no_expectations_errors() {
        let mut mock = MockTransport::new();
        let result = mock.write(b"mac pause\r\n").await;
        assert!(matches!(result.unwrap_err(), Error::Protocol(_)));
    }

    #[tokio::test]
    async fn mock_transport_partial_reads() {
        let mut mock = MockTransport::new();
        mock.inject(b"AABBCCDD");

        let mut buf = [0u8; 3];
        assert_eq!(mock.read(&mut buf).await.unwrap(), 3);
        assert_eq!(&buf, b"AAB");
        assert_eq!(mock.pending_bytes(), 5);
    }

    #[tokio::test]
    async fn mock_transport_clones_share_state() {
        let mock = MockTransport::new();
        let probe = mock.clone();
        let mut boxed: Box<dyn Transport> = Box::new(mock);

        probe.expect(b"mac get status", b"0000\r\n");
        boxed.write(b"mac get status\r\n").await.unwrap();

        assert_eq!(probe.sent_lines(), vec!["mac get status".to_string()]);
        assert_eq!(probe.remaining_expectations(), 0);
        assert_eq!(probe.pending_bytes(), 6);
    }

    #[tokio::test]
    async fn mock_transport_injected_failures() {
        let mut mock = MockTransport::new();
        mock.inject(b"x");
        mock.set_read_failure(true);
        mock.set_write_failure(true);

        let mut buf = [0u8; 4];
        assert!(matches!(mock.read(&mut buf).await, Err(Error::Transport(_))));
        assert!(matches!(mock.write(b"x").await, Err(Error::Transport(_))));
        assert!(mock.data_available(Duration::ZERO).await);
    }

    #[tokio::test]
    async fn mock_transport_fails_after_n_writes() {
        let mut mock = MockTransport::new();
        mock.set_write_failure_after(1);

        assert_eq!(mock.write(b"sys get ver").await.unwrap(), 11);
        assert!(matches!(mock.write(b"\r\n").await, Err(Error::Transport(_))));
        assert!(matches!(mock.write(b"\r\n").await, Err(Error::Transport(_))));
        assert_eq!(mock.sent_data(), vec![b"sys get ver".to_vec()]);
    }

    #[tokio::test]
    async fn mock_transport_disconnect() {
        let mut mock = MockTransport::new();
        mock.inject(b"ok\r\n");
        assert!(mock.is_connected());

        mock.close().await.unwrap();
        assert!(!mock.is_connected());
        assert!(!mock.data_available(Duration::ZERO).await);

        let result = mock.write(b"sys get ver\r\n").await;
        assert!(matches!(result.unwrap_err(), Error::NotConnected));
    }

    #[tokio::test]
    async fn mock_transport_records_line_settings() {
        let mut mock = MockTransport::new();
        mock.set_baud_rate(115_200).await.unwrap();
        mock.set_flow_control(FlowControl::Hardware).await.unwrap();
        assert_eq!(mock.baud_rate(), Some(115_200));
        assert_eq!(mock.flow_control(), Some(FlowControl::Hardware));
    }
}
