//! Digest Module
//!
//! Maps arbitrary bytes to a fixed-length lowercase hex identifier used in store keys.

use sha1::{Digest as _, Sha1};

/// Bytes hashed ahead of every input. Plain SHA-1, not an HMAC.
const DIGEST_PREFIX: &[u8] = b"memo";

/// Length in characters of every identifier returned by [`digest`].
pub const DIGEST_LEN: usize = 40;

/// Returns `SHA-1("memo" || bytes)` as lowercase hex.
///
/// Same input, same output, across calls and process restarts.
pub fn digest(bytes: &[u8]) -> String {
    let hash = Sha1::new()
        .chain_update(DIGEST_PREFIX)
        .chain_update(bytes)
        .finalize();
    hex::encode(hash)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use sha1::Digest;

    #[test]
    fn test_digest_is_deterministic() {
        assert_eq!(digest(b"hello"), digest(b"hello"));
    }

    #[test]
    fn test_digest_shape() {
        let id = digest(b"anything");
        assert_eq!(id.len(), DIGEST_LEN);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_digest_distinguishes_inputs() {
        assert_ne!(digest(b"1"), digest(b"\"1\""));
        assert_ne!(digest(b""), digest(b"0:"));
    }

    #[test]
    fn test_digest_of_empty_input_is_stable() {
        assert_eq!(digest(b""), digest(&[]));
        assert_eq!(digest(b"").len(), DIGEST_LEN);
    }

    #[test]
    fn test_digest_is_prefixed_sha1() {
        let expected = hex::encode(Sha1::digest(b"memohello"));
        assert_eq!(digest(b"hello"), expected);
    }
}
