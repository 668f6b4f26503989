use crate::error::{require, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch
/// (1970-01-01), per [RFC 1305].
const NTP_EPOCH_OFFSET: f64 = 2_208_988_800.0;

/// Host wall-clock time, in fractional seconds since the Unix epoch.
pub fn now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Encode a host time as an 8-byte big-endian NTP timestamp: 32-bit seconds
/// since 1900, 32-bit binary fraction scaled so `u32::MAX` is one whole
/// second.
pub fn encode_ntp(host_time: f64) -> [u8; 8] {
    let ntp_time = host_time + NTP_EPOCH_OFFSET;
    let seconds = ntp_time.trunc() as u32;
    let fraction = (ntp_time.fract() * u32::MAX as f64) as u32;

    let mut buf = [0u8; 8];
    buf[0..4].copy_from_slice(&seconds.to_be_bytes());
    buf[4..8].copy_from_slice(&fraction.to_be_bytes());
    buf
}

/// Decode an 8-byte big-endian NTP timestamp into host time.
pub fn decode_ntp(buf: &[u8]) -> Result<f64> {
    require(buf, 8)?;

    let seconds = u32::from_be_bytes(buf[0..4].try_into().unwrap());
    let fraction = u32::from_be_bytes(buf[4..8].try_into().unwrap());

    Ok(seconds as f64 - NTP_EPOCH_OFFSET + fraction as f64 / u32::MAX as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_near_now() {
        let t = now();
        let decoded = decode_ntp(&encode_ntp(t)).unwrap();
        assert!((decoded - t).abs() < 1e-9);
    }

    #[test]
    fn round_trip_epoch_boundaries() {
        // 1970-01-01 and a date close to the NTP 32-bit rollover (2036-02-07).
        for t in [0.0_f64, 2_085_978_496.0] {
            let decoded = decode_ntp(&encode_ntp(t)).unwrap();
            assert!((decoded - t).abs() < 1e-6, "t={t} decoded={decoded}");
        }
    }

    #[test]
    fn decode_rejects_short_buffer() {
        assert!(decode_ntp(&[0u8; 4]).is_err());
    }
}
