//! TCP control-channel framing: greeting, setup, session request/accept,
//! start/stop. All fields big-endian. See `twamp_rs::control` for the state
//! machine that drives these frames over a socket.

use crate::error::{require, Result};
use std::net::IpAddr;

pub const SERVER_GREETING_LEN: usize = 64;
pub const SETUP_RESPONSE_LEN: usize = 164;
pub const SERVER_START_LEN: usize = 48;
pub const REQUEST_SESSION_LEN: usize = 112;
pub const ACCEPT_SESSION_LEN: usize = 48;
pub const START_SESSIONS_LEN: usize = 32;
pub const START_ACK_LEN: usize = 32;
pub const STOP_SESSIONS_LEN: usize = 32;

/// Bit 0 of a Server-Greeting's modes field: unauthenticated mode supported.
pub const MODE_UNAUTHENTICATED: u32 = 1;

/// Decode a 64-byte Server-Greeting, returning the advertised modes bitmask.
/// Only the modes word at bytes [12..16) is interpreted; the Challenge/Salt
/// region RFC 5357 assigns to authenticated modes is left unparsed since
/// this crate never negotiates those modes.
pub fn decode_server_greeting(buf: &[u8]) -> Result<u32> {
    require(buf, SERVER_GREETING_LEN)?;
    Ok(u32::from_be_bytes(buf[12..16].try_into().unwrap()))
}

/// Build the 164-byte Setup-Response: mode=1 (unauthenticated) followed by
/// 160 zero bytes.
pub fn encode_setup_response() -> [u8; SETUP_RESPONSE_LEN] {
    let mut buf = [0u8; SETUP_RESPONSE_LEN];
    buf[0..4].copy_from_slice(&1u32.to_be_bytes());
    buf
}

/// Decode a 48-byte Server-Start, returning the accept code at byte 15.
pub fn decode_server_start(buf: &[u8]) -> Result<u8> {
    require(buf, SERVER_START_LEN)?;
    Ok(buf[15])
}

/// Build a 112-byte Request-TW-Session frame.
pub fn encode_request_session(
    sender_addr: Option<IpAddr>,
    sender_port: u16,
    receiver_addr: Option<IpAddr>,
    receiver_port: u16,
    padding_length: u32,
    start_time_ntp: u64,
    timeout_secs: u32,
    dscp: u8,
) -> [u8; REQUEST_SESSION_LEN] {
    let ipvn: u8 = match (sender_addr, receiver_addr) {
        (Some(IpAddr::V6(_)), _) | (_, Some(IpAddr::V6(_))) => 6,
        _ => 4,
    };

    let mut buf = [0u8; REQUEST_SESSION_LEN];
    buf[0] = 5; // command: Request-TW-Session
    buf[1] = ipvn;
    // buf[2..4] reserved, left zero.
    buf[4..6].copy_from_slice(&sender_port.to_be_bytes());
    buf[6..8].copy_from_slice(&receiver_port.to_be_bytes());

    if let Some(addr) = sender_addr {
        write_padded_address(&mut buf[8..24], addr);
    }
    if let Some(addr) = receiver_addr {
        write_padded_address(&mut buf[24..40], addr);
    }

    buf[40..44].copy_from_slice(&padding_length.to_be_bytes());
    buf[44..52].copy_from_slice(&start_time_ntp.to_be_bytes());
    buf[52..56].copy_from_slice(&timeout_secs.to_be_bytes());

    let type_p = (dscp as u32) << 24;
    buf[56..60].copy_from_slice(&type_p.to_be_bytes());
    // buf[60..112] trailing reserved fields, left zero.

    buf
}

fn write_padded_address(dst: &mut [u8], addr: IpAddr) {
    match addr {
        IpAddr::V4(v4) => dst[0..4].copy_from_slice(&v4.octets()),
        IpAddr::V6(v6) => dst.copy_from_slice(&v6.octets()),
    }
}

/// Decode a 48-byte Accept-Session, returning the accept code at byte 0.
pub fn decode_accept_session(buf: &[u8]) -> Result<u8> {
    require(buf, ACCEPT_SESSION_LEN)?;
    Ok(buf[0])
}

/// Build the 32-byte Start-Sessions frame: command=2, rest zero.
pub fn encode_start_sessions() -> [u8; START_SESSIONS_LEN] {
    let mut buf = [0u8; START_SESSIONS_LEN];
    buf[0] = 2;
    buf
}

/// Build the 32-byte Stop-Sessions frame.
pub fn encode_stop_sessions(number_of_sessions: u32) -> [u8; STOP_SESSIONS_LEN] {
    let mut buf = [0u8; STOP_SESSIONS_LEN];
    buf[0] = 3; // command
    buf[1] = 0; // accept
    // buf[2..4] reserved, left zero.
    buf[4..8].copy_from_slice(&number_of_sessions.to_be_bytes());
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn greeting_reads_modes_word() {
        let mut buf = [0u8; SERVER_GREETING_LEN];
        buf[12..16].copy_from_slice(&1u32.to_be_bytes());
        assert_eq!(decode_server_greeting(&buf).unwrap(), 1);
    }

    #[test]
    fn setup_response_has_mode_one() {
        let buf = encode_setup_response();
        assert_eq!(&buf[0..4], &1u32.to_be_bytes());
        assert!(buf[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn server_start_accept_code_at_byte_15() {
        let mut buf = [0u8; SERVER_START_LEN];
        buf[15] = 1;
        assert_eq!(decode_server_start(&buf).unwrap(), 1);
    }

    #[test]
    fn request_session_wildcard_leaves_addresses_zero() {
        let buf = encode_request_session(None, 20000, None, 20001, 0, 0, 3, 0);
        assert_eq!(buf.len(), REQUEST_SESSION_LEN);
        assert_eq!(buf[0], 5);
        assert_eq!(&buf[4..6], &20000u16.to_be_bytes());
        assert_eq!(&buf[6..8], &20001u16.to_be_bytes());
        assert!(buf[8..40].iter().all(|&b| b == 0));
    }

    #[test]
    fn request_session_writes_v4_addresses() {
        let sender = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let receiver = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));
        let buf = encode_request_session(Some(sender), 1, Some(receiver), 2, 0, 0, 3, 46);
        assert_eq!(buf[1], 4);
        assert_eq!(&buf[8..12], &[10, 0, 0, 1]);
        assert_eq!(&buf[24..28], &[10, 0, 0, 2]);
        assert_eq!(&buf[56..60], &(46u32 << 24).to_be_bytes());
    }

    #[test]
    fn stop_sessions_carries_count() {
        let buf = encode_stop_sessions(2);
        assert_eq!(buf[0], 3);
        assert_eq!(&buf[4..8], &2u32.to_be_bytes());
    }
}
