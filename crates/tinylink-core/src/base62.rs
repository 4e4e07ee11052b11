//! Base62 encoding of allocation counters.
//!
//! Digits are positional, so the alphabet order is part of the short code
//! format and must never change once codes have been handed out.

const ALPHABET: &[u8; 62] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

const BASE: u64 = ALPHABET.len() as u64;

/// 62^11 > 2^64, so no `u64` needs more than 11 digits.
const MAX_DIGITS: usize = 11;

/// Encodes `value` as a base62 string, most significant digit first.
///
/// Zero has no digits under this scheme and falls back to `"a"`. Allocation
/// starts at 1, so the fallback is never part of a stored code.
///
/// # Examples
///
/// ```
/// use tinylink_core::base62;
///
/// assert_eq!(base62::encode(1), "b");
/// assert_eq!(base62::encode(62), "ba");
/// ```
pub fn encode(mut value: u64) -> String {
    let mut buf = [0u8; MAX_DIGITS];
    let mut start = buf.len();

    while value > 0 {
        start -= 1;
        buf[start] = ALPHABET[(value % BASE) as usize];
        value /= BASE;
    }

    if start == buf.len() {
        return char::from(ALPHABET[0]).to_string();
    }

    buf[start..].iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn alphabet_has_62_distinct_characters() {
        let unique: HashSet<_> = ALPHABET.iter().collect();
        assert_eq!(unique.len(), 62);
        assert!(ALPHABET.iter().all(u8::is_ascii_alphanumeric));
    }

    #[test]
    fn encodes_known_vectors() {
        assert_eq!(encode(1), "b");
        assert_eq!(encode(2), "c");
        assert_eq!(encode(25), "z");
        assert_eq!(encode(26), "A");
        assert_eq!(encode(61), "9");
        assert_eq!(encode(62), "ba");
        assert_eq!(encode(63), "bb");
        assert_eq!(encode(3843), "99");
        assert_eq!(encode(3844), "baa");
    }

    #[test]
    fn zero_falls_back_to_single_character() {
        assert_eq!(encode(0), "a");
    }

    #[test]
    fn max_value_fits_in_buffer() {
        let encoded = encode(u64::MAX);
        assert_eq!(encoded.len(), MAX_DIGITS);
        assert_eq!(encoded, "v8QrKbgkrIp");
    }

    #[test]
    fn injective_over_allocated_range() {
        let codes: HashSet<String> = (1..=20_000).map(encode).collect();
        assert_eq!(codes.len(), 20_000);
    }
}
