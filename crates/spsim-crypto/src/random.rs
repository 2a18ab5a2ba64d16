//! Random identifier generation.
//!
//! SAML message IDs here follow the `_<timestamp36><random36>` shape: a
//! leading underscore (xsd:ID cannot start with a digit), the current epoch
//! milliseconds in base 36, and a random base-36 suffix.

use rand::Rng;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random suffix in generated message IDs.
pub const ID_SUFFIX_LEN: usize = 11;

/// Encodes an integer in lowercase base 36.
#[must_use]
pub fn base36_encode(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Generates a random lowercase base-36 string.
#[must_use]
pub fn random_base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..36)] as char)
        .collect()
}

/// Generates a SAML message ID from the given timestamp in milliseconds.
#[must_use]
pub fn message_id(timestamp_millis: u128) -> String {
    format!(
        "_{}{}",
        base36_encode(timestamp_millis),
        random_base36(ID_SUFFIX_LEN)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn base36_known_values() {
        assert_eq!(base36_encode(0), "0");
        assert_eq!(base36_encode(35), "z");
        assert_eq!(base36_encode(36), "10");
        assert_eq!(base36_encode(1_700_000_000_000), "loyw3v28");
    }

    #[test]
    fn random_base36_alphabet_and_length() {
        let s = random_base36(64);
        assert_eq!(s.len(), 64);
        assert!(s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn message_ids_start_with_underscore_and_are_unique() {
        let ids: HashSet<String> = (0..100).map(|_| message_id(1_700_000_000_000)).collect();
        assert_eq!(ids.len(), 100);
        assert!(ids.iter().all(|id| id.starts_with('_')));
    }
}
