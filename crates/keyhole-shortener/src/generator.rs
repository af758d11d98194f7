use rand::Rng;

/// Alphabet for generated short codes.
pub const ALPHABET: &[u8; 62] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of generated short codes.
pub const CODE_LENGTH: usize = 8;

/// Draws `length` independent, uniformly random symbols from [`ALPHABET`].
///
/// `rand::rng()` is a reseeded ChaCha-based CSPRNG, so codes cannot be
/// predicted or enumerated. No uniqueness guarantee is made here;
/// uniqueness is a property the backend enforces (or not) at
/// persistence time.
pub fn random_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_has_requested_length() {
        assert_eq!(random_code(CODE_LENGTH).len(), 8);
        assert_eq!(random_code(16).len(), 16);
        assert_eq!(random_code(0).len(), 0);
    }

    #[test]
    fn code_only_uses_alphabet_symbols() {
        let code = random_code(256);
        assert!(code.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn consecutive_codes_differ() {
        // 62^8 possibilities; a repeat here means the generator is broken
        let first = random_code(CODE_LENGTH);
        let second = random_code(CODE_LENGTH);
        assert_ne!(first, second);
    }
}
