//! rn2903-test-harness: Test utilities and mock transports for the RN2903
//! driver.
//!
//! This crate provides [`MockTransport`] for deterministic unit testing of
//! the command engine, status decoder and join sequencer without a modem.

pub mod mock_serial;

pub use mock_serial::MockTransport;
