//! Response reader and command engine for CR/LF line protocols.
//!
//! One exchange is: drain whatever the modem left in the input queue, write
//! the command, write `\r\n`, then accumulate a single response line byte by
//! byte until `\n` arrives or the deadline passes.
//!
//! Waiting is a polling loop: the transport is asked for readiness with a
//! zero timeout and the elapsed time is checked after every iteration that
//! did not end the line. A response can therefore time out after some of
//! its bytes arrived; those bytes stay in the buffer for diagnostics.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use rn2903_core::transport::Transport;
use rn2903_core::types::ResponseStatus;

use crate::protocol::{
    self, CARRIAGE_RETURN, COMMAND_TERMINATOR, LINE_TERMINATOR, MAX_RESPONSE, ResponseBuffer,
};

// ---------------------------------------------------------------------------
// Drain
// ---------------------------------------------------------------------------

/// Read and discard everything currently buffered by the transport.
///
/// Returns the number of bytes discarded. A read failure stops the drain;
/// it is logged but not reported, the following write will surface a dead
/// transport.
pub async fn drain(transport: &mut dyn Transport) -> usize {
    let mut scratch = [0u8; MAX_RESPONSE];
    let mut discarded = 0;

    while transport.data_available(Duration::ZERO).await {
        match transport.read(&mut scratch).await {
            Ok(0) => break,
            Ok(n) => discarded += n,
            Err(e) => {
                warn!(error = %e, "read failed while draining input");
                break;
            }
        }
    }

    if discarded > 0 {
        debug!(bytes = discarded, "discarded stale input");
    }
    discarded
}

// ---------------------------------------------------------------------------
// Response reader
// ---------------------------------------------------------------------------

/// Accumulate one response line into `buffer`, waiting at most `deadline`.
///
/// The buffer is cleared first. `\r` is discarded, `\n` ends the line and
/// is not stored, and a full buffer ends the line early with its content
/// truncated. A read error returns [`ResponseStatus::TransportError`]
/// without classifying the text.
///
/// When `echo` is set the response is logged at `info` level.
pub async fn await_response(
    transport: &mut dyn Transport,
    buffer: &mut ResponseBuffer,
    deadline: Duration,
    echo: bool,
) -> ResponseStatus {
    buffer.clear();

    let start = Instant::now();
    let mut byte = [0u8; 1];

    let timed_out = loop {
        if transport.data_available(Duration::ZERO).await {
            match transport.read(&mut byte).await {
                Ok(0) => {}
                Ok(_) => match byte[0] {
                    CARRIAGE_RETURN => {}
                    LINE_TERMINATOR => break false,
                    _ if buffer.is_full() => {
                        debug!(len = buffer.len(), "response buffer full, truncating");
                        break false;
                    }
                    b => {
                        buffer.push(b);
                    }
                },
                Err(e) => {
                    warn!(error = %e, "read failed while awaiting response");
                    return ResponseStatus::TransportError(e.to_string());
                }
            }
        }

        if start.elapsed() >= deadline {
            break true;
        }
    };

    if echo {
        info!(len = buffer.len(), response = %buffer.text(), "RESP");
    } else {
        trace!(len = buffer.len(), response = %buffer.text(), "response");
    }

    let status = protocol::classify(buffer.as_bytes(), timed_out);
    if status == ResponseStatus::Timeout {
        debug!(
            deadline_ms = deadline.as_millis() as u64,
            partial = buffer.len(),
            "timed out waiting for response"
        );
    }
    status
}

// ---------------------------------------------------------------------------
// Command engine
// ---------------------------------------------------------------------------

/// Run one command/response exchange.
///
/// Drains stale input, writes `command` and then [`COMMAND_TERMINATOR`] as
/// two separate writes, and reads the response into `buffer` with
/// [`await_response`]. Either write failing yields
/// [`ResponseStatus::TransportError`] and no response is read.
pub async fn execute_command(
    transport: &mut dyn Transport,
    buffer: &mut ResponseBuffer,
    command: &str,
    wait: Duration,
    echo: bool,
) -> ResponseStatus {
    drain(transport).await;

    if echo {
        info!(command, "CMD");
    } else {
        trace!(command, "command");
    }

    if let Err(e) = transport.write(command.as_bytes()).await {
        warn!(command, error = %e, "failed to write command");
        buffer.clear();
        return ResponseStatus::TransportError(e.to_string());
    }

    if let Err(e) = transport.write(COMMAND_TERMINATOR).await {
        warn!(command, error = %e, "failed to write command terminator");
        buffer.clear();
        return ResponseStatus::TransportError(e.to_string());
    }

    await_response(transport, buffer, wait, echo).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
