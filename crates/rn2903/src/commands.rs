//! RN2903 command builders and response parsers.
//!
//! All functions are pure -- they produce command text or consume response
//! text without performing any I/O. The command engine appends the `\r\n`
//! terminator when it writes a command.
//!
//! Identity and key setters validate their argument before building the
//! command, so a malformed EUI or key never reaches the modem.

use rn2903_core::codec;
use rn2903_core::{Error, Result};

use crate::join::JoinType;

/// Read the firmware version string.
pub const CMD_SYS_GET_VER: &str = "sys get ver";
/// Reboot the modem.
pub const CMD_SYS_RESET: &str = "sys reset";
/// Read the preprogrammed hardware EUI.
pub const CMD_SYS_GET_HWEUI: &str = "sys get hweui";
/// Read the MAC status word.
pub const CMD_MAC_GET_STATUS: &str = "mac get status";

/// Length of a hex-encoded 64-bit EUI.
pub const EUI64_HEX_LEN: usize = 16;
/// Length of a hex-encoded 128-bit AES key.
pub const KEY128_HEX_LEN: usize = 32;
/// Length of a hex-encoded 32-bit device address.
pub const DEVADDR_HEX_LEN: usize = 8;

/// Build a join command (`mac join otaa` / `mac join abp`).
pub fn cmd_mac_join(join_type: JoinType) -> String {
    format!("mac join {}", join_type.as_str())
}

/// Build a `mac set <param> <value>` command after checking that `value`
/// is exactly `len` hex digits.
fn cmd_mac_set_hex(param: &str, value: &str, len: usize) -> Result<String> {
    if value.len() != len {
        return Err(Error::Validation(format!(
            "{param} must be {len} hex digits (got {})",
            value.len()
        )));
    }
    codec::validate_hex(value)?;
    Ok(format!("mac set {param} {value}"))
}

/// Build `mac set deveui <eui>` (16 hex digits).
pub fn cmd_set_device_eui(eui: &str) -> Result<String> {
    cmd_mac_set_hex("deveui", eui, EUI64_HEX_LEN)
}

/// Build `mac set appeui <eui>` (16 hex digits).
pub fn cmd_set_application_eui(eui: &str) -> Result<String> {
    cmd_mac_set_hex("appeui", eui, EUI64_HEX_LEN)
}

/// Build `mac set appkey <key>` (32 hex digits), used by OTAA joins.
pub fn cmd_set_application_key(key: &str) -> Result<String> {
    cmd_mac_set_hex("appkey", key, KEY128_HEX_LEN)
}

/// Build `mac set devaddr <addr>` (8 hex digits), used by ABP joins.
pub fn cmd_set_device_addr(addr: &str) -> Result<String> {
    cmd_mac_set_hex("devaddr", addr, DEVADDR_HEX_LEN)
}

/// Build `mac set nwkskey <key>` (32 hex digits), used by ABP joins.
pub fn cmd_set_network_session_key(key: &str) -> Result<String> {
    cmd_mac_set_hex("nwkskey", key, KEY128_HEX_LEN)
}

/// Build `mac set appskey <key>` (32 hex digits), used by ABP joins.
pub fn cmd_set_application_session_key(key: &str) -> Result<String> {
    cmd_mac_set_hex("appskey", key, KEY128_HEX_LEN)
}

/// Extract the hardware EUI from a `sys get hweui` response.
///
/// At most [`EUI64_HEX_LEN`] characters are kept.
pub fn parse_hardware_eui(response: &str) -> String {
    response.chars().take(EUI64_HEX_LEN).collect()
}
