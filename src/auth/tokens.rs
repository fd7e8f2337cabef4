use rand::{rngs::OsRng, RngCore};

/// Bytes of entropy in a verification or reset token (256 bits).
const TOKEN_BYTES: usize = 32;

/// Fresh single-use token from the OS CSPRNG, hex-encoded.
pub fn generate_token() -> String {
    let mut buf = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_64_hex_chars() {
        let t = generate_token();
        assert_eq!(t.len(), TOKEN_BYTES * 2);
        assert!(t.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tokens_do_not_repeat() {
        let set: std::collections::HashSet<_> = (0..64).map(|_| generate_token()).collect();
        assert_eq!(set.len(), 64);
    }
}
