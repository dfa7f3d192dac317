// Variable-length quantity codec for delta times.
//
// Big-endian base-128: each byte carries seven value bits, and every byte but
// the last has its high bit set. Four bytes cover the 28-bit range that SMF
// delta times are allowed to use.

use crate::error::SmfError;

/// Largest value a four-byte quantity can hold.
pub const MAX_VLQ: u32 = 0x0FFF_FFFF;

/// Append the encoding of `value` to `buf`.
pub fn write_vlq(buf: &mut Vec<u8>, value: u32) -> Result<(), SmfError> {
    if value > MAX_VLQ {
        return Err(SmfError::DeltaTooLarge(u64::from(value)));
    }
    let mut groups = [0u8; 4];
    let mut len = 0;
    let mut rest = value;
    loop {
        groups[len] = (rest & 0x7F) as u8;
        len += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    // Groups were collected least-significant first.
    for (i, group) in groups[..len].iter().enumerate().rev() {
        let continuation = if i > 0 { 0x80 } else { 0x00 };
        buf.push(group | continuation);
    }
    Ok(())
}

/// Encode `value` into a fresh buffer.
pub fn encode_vlq(value: u32) -> Result<Vec<u8>, SmfError> {
    let mut buf = Vec::with_capacity(4);
    write_vlq(&mut buf, value)?;
    Ok(buf)
}

/// Decode one quantity from the front of `bytes`.
///
/// Returns the value and the number of bytes consumed.
pub fn decode_vlq(bytes: &[u8]) -> Result<(u32, usize), SmfError> {
    let mut value: u32 = 0;
    for (i, &byte) in bytes.iter().take(4).enumerate() {
        value = (value << 7) | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(SmfError::TruncatedQuantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn known_encodings() {
        // Reference values from the Standard MIDI File specification.
        let cases: &[(u32, &[u8])] = &[
            (0x00, &[0x00]),
            (0x40, &[0x40]),
            (0x7F, &[0x7F]),
            (0x80, &[0x81, 0x00]),
            (0x2000, &[0xC0, 0x00]),
            (0x3FFF, &[0xFF, 0x7F]),
            (0x4000, &[0x81, 0x80, 0x00]),
            (0x1F_FFFF, &[0xFF, 0xFF, 0x7F]),
            (0x20_0000, &[0x81, 0x80, 0x80, 0x00]),
            (0x0FFF_FFFF, &[0xFF, 0xFF, 0xFF, 0x7F]),
        ];
        for &(value, expected) in cases {
            assert_eq!(encode_vlq(value).unwrap(), expected.to_vec(), "value {value:#x}");
        }
    }

    #[test]
    fn decode_inverts_encode_across_range() {
        // Every byte-length boundary plus a stride through the full range.
        let mut values = vec![0, 1, 127, 128, 16_383, 16_384, 2_097_151, 2_097_152, MAX_VLQ];
        values.extend((0..MAX_VLQ).step_by(65_521));
        for value in values {
            let bytes = encode_vlq(value).unwrap();
            let (decoded, used) = decode_vlq(&bytes).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(used, bytes.len());
        }
    }

    #[test]
    fn decode_stops_at_final_byte() {
        let (value, used) = decode_vlq(&[0x81, 0x00, 0x90, 0x3C]).unwrap();
        assert_eq!(value, 128);
        assert_eq!(used, 2);
    }

    #[test]
    fn oversized_value_rejected() {
        assert!(matches!(
            encode_vlq(MAX_VLQ + 1),
            Err(SmfError::DeltaTooLarge(_))
        ));
    }

    #[test]
    fn truncated_input_rejected() {
        assert!(matches!(decode_vlq(&[0x81, 0x80]), Err(SmfError::TruncatedQuantity)));
        assert!(matches!(decode_vlq(&[]), Err(SmfError::TruncatedQuantity)));
    }
}
