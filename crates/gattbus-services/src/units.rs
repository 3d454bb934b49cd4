//! Decoding of GATT environmental sensing values.
//!
//! Readings are signed little-endian integers scaled as `c · m · 10^d · 2^b`.

use crate::error::{Result, ServiceError};

/// Scale a raw reading: `c · m · 10^d · 2^b`.
pub fn compute_r(c: f64, m: i32, d: i32, b: i32) -> Result<f64> {
    if !(-10..=10).contains(&m) {
        return Err(ServiceError::InvalidMultiplier(m));
    }
    Ok(c * f64::from(m) * 10f64.powi(d) * 2f64.powi(b))
}

/// Sign-extend a 1 to 8 byte little-endian integer.
pub fn decode_signed_le(data: &[u8]) -> Result<i64> {
    let (last, _) = data.split_last().ok_or(ServiceError::InvalidValue {
        what: "integer",
        len: 0,
    })?;
    if data.len() > 8 {
        return Err(ServiceError::InvalidValue {
            what: "integer",
            len: data.len(),
        });
    }
    let fill = if last & 0x80 != 0 { 0xFF } else { 0x00 };
    let mut buf = [fill; 8];
    buf[..data.len()].copy_from_slice(data);
    Ok(i64::from_le_bytes(buf))
}

/// Relative humidity in percent (`d = -2`).
pub fn decode_humidity(data: &[u8]) -> Result<f64> {
    compute_r(decode_signed_le(data)? as f64, 1, -2, 0)
}

/// Temperature in degrees Celsius (`d = -2`).
pub fn decode_temperature(data: &[u8]) -> Result<f64> {
    compute_r(decode_signed_le(data)? as f64, 1, -2, 0)
}

/// Pressure in pascals (`d = -1`).
pub fn decode_pressure(data: &[u8]) -> Result<f64> {
    compute_r(decode_signed_le(data)? as f64, 1, -1, 0)
}

/// A little-endian IEEE 754 single.
pub fn decode_f32(data: &[u8]) -> Result<f32> {
    let bytes: [u8; 4] = data.try_into().map_err(|_| ServiceError::InvalidValue {
        what: "f32",
        len: data.len(),
    })?;
    Ok(f32::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn compute_r_scales() {
        assert!(approx(compute_r(2150.0, 1, -2, 0).unwrap(), 21.5));
        assert!(approx(compute_r(3.0, 2, 1, 2).unwrap(), 240.0));
        assert!(approx(compute_r(5.0, -10, 0, -1).unwrap(), -25.0));
    }

    #[test]
    fn compute_r_rejects_large_multiplier() {
        assert!(matches!(
            compute_r(1.0, 11, 0, 0),
            Err(ServiceError::InvalidMultiplier(11))
        ));
        assert!(compute_r(1.0, -11, 0, 0).is_err());
    }

    #[test]
    fn signed_le_sign_extends() {
        assert_eq!(decode_signed_le(&[0xFF]).unwrap(), -1);
        assert_eq!(decode_signed_le(&[0x66, 0x08]).unwrap(), 2150);
        assert_eq!(decode_signed_le(&[0x00, 0x80]).unwrap(), -32768);
        assert_eq!(decode_signed_le(&[0x10, 0xA0, 0x0F, 0x00]).unwrap(), 1_024_016);
        assert!(decode_signed_le(&[]).is_err());
        assert!(decode_signed_le(&[0; 9]).is_err());
    }

    #[test]
    fn sensor_values() {
        // 21.50 C, 45.27 %, 102401.6 Pa
        assert!(approx(decode_temperature(&[0x66, 0x08]).unwrap(), 21.5));
        assert!(approx(decode_humidity(&[0xAF, 0x11]).unwrap(), 45.27));
        assert!(approx(
            decode_pressure(&[0x10, 0xA0, 0x0F, 0x00]).unwrap(),
            102_401.6
        ));
        assert!(approx(decode_temperature(&[0x06, 0xFF]).unwrap(), -2.5));
    }

    #[test]
    fn f32_needs_four_bytes() {
        assert_eq!(decode_f32(&1.5f32.to_le_bytes()).unwrap(), 1.5);
        assert!(matches!(
            decode_f32(&[0, 0, 0]),
            Err(ServiceError::InvalidValue { what: "f32", len: 3 })
        ));
    }
}
