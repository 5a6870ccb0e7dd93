use crate::error::MappingError;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const CONTINUATION: u64 = 0b10_0000;
const DATA_MASK: u64 = 0b1_1111;

fn digit_value(byte: u8) -> Option<u64> {
    match byte {
        b'A'..=b'Z' => Some((byte - b'A') as u64),
        b'a'..=b'z' => Some((byte - b'a') as u64 + 26),
        b'0'..=b'9' => Some((byte - b'0') as u64 + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

/// Append `value` as signed VLQ: sign in the low bit, 5 data bits per digit.
pub fn encode(value: i64, out: &mut String) {
    let mut rest = if value < 0 {
        (value.unsigned_abs() << 1) | 1
    } else {
        (value as u64) << 1
    };
    loop {
        let mut digit = rest & DATA_MASK;
        rest >>= 5;
        if rest > 0 {
            digit |= CONTINUATION;
        }
        out.push(ALPHABET[digit as usize] as char);
        if rest == 0 {
            break;
        }
    }
}

/// Streaming reader over a VLQ string.
pub struct Decoder<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn read(&mut self) -> Result<i64, MappingError> {
        let mut raw = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = *self.bytes.get(self.pos).ok_or(MappingError::Truncated)?;
            self.pos += 1;
            let digit = digit_value(byte).ok_or(MappingError::InvalidDigit(byte as char))?;
            if shift > 60 {
                return Err(MappingError::Overflow);
            }
            raw |= (digit & DATA_MASK) << shift;
            shift += 5;
            if digit & CONTINUATION == 0 {
                break;
            }
        }
        let magnitude = (raw >> 1) as i64;
        Ok(if raw & 1 == 1 { -magnitude } else { magnitude })
    }
}
