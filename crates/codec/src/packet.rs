//! Sender-to-Reflector and Reflector-to-Sender unauthenticated test packet
//! framing. All multi-byte integers and NTP timestamps are big-endian.

use crate::{
    error::{require, Result},
    timestamp::{decode_ntp, encode_ntp},
};

/// Sender writes this into every request's `error_estimate` field — the core
/// treats the value as opaque, it is never interpreted.
pub const SENDER_ERROR_ESTIMATE: u16 = 0x3FFF;

/// Reflector writes this into every reply's `receiver_error_estimate` field.
pub const REFLECTOR_ERROR_ESTIMATE: u16 = 0x0001;

/// Fixed header length of a Sender->Reflector request, before padding.
pub const REQUEST_HEADER_LEN: usize = 14;

/// Fixed header length of a Reflector->Sender reply, before padding.
pub const REPLY_HEADER_LEN: usize = 38;

/// Minimum reply length the sender loop requires before it will decode a
/// datagram — covers every field up to and including the echoed send
/// timestamp (T1), but not the trailing echoed error estimate.
pub const REPLY_MIN_LEN_FOR_SENDER: usize = 36;

/// Encode a Sender->Reflector request: `sender_seq`, `send_timestamp` (T1),
/// `error_estimate`, then `pad_len` zero bytes.
pub fn encode_request(sender_seq: u32, send_time: f64, pad_len: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(REQUEST_HEADER_LEN + pad_len);
    buf.extend_from_slice(&sender_seq.to_be_bytes());
    buf.extend_from_slice(&encode_ntp(send_time));
    buf.extend_from_slice(&SENDER_ERROR_ESTIMATE.to_be_bytes());
    buf.resize(REQUEST_HEADER_LEN + pad_len, 0);
    buf
}

/// The fields the reflector needs out of an inbound request.
pub struct RequestView {
    pub sender_seq: u32,
    pub send_timestamp: f64,
}

/// Decode the fixed 14-byte header of a Sender->Reflector request. Padding
/// bytes beyond the header are never parsed.
pub fn decode_request(buf: &[u8]) -> Result<RequestView> {
    require(buf, REQUEST_HEADER_LEN)?;

    Ok(RequestView {
        sender_seq: u32::from_be_bytes(buf[0..4].try_into().unwrap()),
        send_timestamp: decode_ntp(&buf[4..12])?,
    })
}

/// Build a Reflector->Sender reply. `request` must be at least
/// [`REQUEST_HEADER_LEN`] bytes; its first 14 bytes are copied verbatim into
/// the echo region per RFC 5357 (this is also what makes Property 2 hold).
pub fn encode_reply(
    receiver_seq: u32,
    receive_time: f64,
    send_time: f64,
    request: &[u8],
    pad_len: usize,
) -> Result<Vec<u8>> {
    require(request, REQUEST_HEADER_LEN)?;

    let mut buf = Vec::with_capacity(REPLY_HEADER_LEN + pad_len);
    buf.extend_from_slice(&receiver_seq.to_be_bytes());
    buf.extend_from_slice(&encode_ntp(receive_time));
    buf.extend_from_slice(&REFLECTOR_ERROR_ESTIMATE.to_be_bytes());
    buf.extend_from_slice(&0u16.to_be_bytes()); // mbz
    buf.extend_from_slice(&encode_ntp(send_time));
    buf.extend_from_slice(&request[0..REQUEST_HEADER_LEN]);
    buf.resize(REPLY_HEADER_LEN + pad_len, 0);
    Ok(buf)
}

/// The fields the sender loop needs out of an inbound reply.
pub struct ReplyView {
    pub receiver_seq: u32,
    pub receiver_timestamp: f64,
    pub send_timestamp: f64,
    pub sender_seq_echoed: u32,
    pub send_timestamp_echoed: f64,
}

/// Decode a Reflector->Sender reply. Requires at least
/// [`REPLY_MIN_LEN_FOR_SENDER`] bytes.
pub fn decode_reply(buf: &[u8]) -> Result<ReplyView> {
    require(buf, REPLY_MIN_LEN_FOR_SENDER)?;

    Ok(ReplyView {
        receiver_seq: u32::from_be_bytes(buf[0..4].try_into().unwrap()),
        receiver_timestamp: decode_ntp(&buf[4..12])?,
        send_timestamp: decode_ntp(&buf[16..24])?,
        sender_seq_echoed: u32::from_be_bytes(buf[24..28].try_into().unwrap()),
        send_timestamp_echoed: decode_ntp(&buf[28..36])?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trips_header_fields() {
        let req = encode_request(42, 1_700_000_000.5, 18);
        assert_eq!(req.len(), REQUEST_HEADER_LEN + 18);

        let view = decode_request(&req).unwrap();
        assert_eq!(view.sender_seq, 42);
        assert!((view.send_timestamp - 1_700_000_000.5).abs() < 1e-6);
    }

    #[test]
    fn reply_echoes_request_header_verbatim() {
        let req = encode_request(7, 1_700_000_000.25, 0);
        let reply = encode_reply(3, 1_700_000_001.0, 1_700_000_001.0, &req, 0).unwrap();

        // Echo integrity: the reply's echo region equals the request's
        // 14-byte header verbatim (see DESIGN.md for the exact byte range).
        assert_eq!(&reply[24..38], &req[0..14]);

        let view = decode_reply(&reply).unwrap();
        assert_eq!(view.receiver_seq, 3);
        assert_eq!(view.sender_seq_echoed, 7);
        assert!((view.send_timestamp_echoed - 1_700_000_000.25).abs() < 1e-6);
    }

    #[test]
    fn decode_rejects_too_short() {
        assert!(decode_request(&[0u8; 13]).is_err());
        assert!(decode_reply(&[0u8; 35]).is_err());
    }
}
