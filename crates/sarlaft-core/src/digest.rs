//! # Content Digests
//!
//! SHA-256 digests over canonical bytes. Each audit ledger event carries the
//! digest of its predecessor, forming a hash chain; tampering with any stored
//! event breaks verification of every later link.
//!
//! ## Invariant
//!
//! [`sha256_digest()`] accepts only [`CanonicalBytes`], never raw `&[u8]`,
//! so every digest in the system is computed over the same canonical form.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;

/// A SHA-256 content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(pub [u8; 32]);

impl ContentDigest {
    /// Render as a lowercase hex string (64 chars).
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

/// Compute the SHA-256 digest of canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let hash = Sha256::digest(data.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest(bytes)
}

/// Convenience wrapper returning the digest as a hex string.
pub fn sha256_hex(data: &CanonicalBytes) -> String {
    sha256_digest(data).to_hex()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_deterministic() {
        let cb = CanonicalBytes::new(&serde_json::json!({"a": 1})).unwrap();
        assert_eq!(sha256_digest(&cb), sha256_digest(&cb));
    }

    #[test]
    fn test_different_inputs_different_digests() {
        let a = CanonicalBytes::new(&serde_json::json!({"a": 1})).unwrap();
        let b = CanonicalBytes::new(&serde_json::json!({"a": 2})).unwrap();
        assert_ne!(sha256_digest(&a), sha256_digest(&b));
    }

    #[test]
    fn test_known_vector_empty_object() {
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        assert_eq!(
            sha256_hex(&cb),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn test_display_format() {
        let cb = CanonicalBytes::new(&serde_json::json!({"k": "v"})).unwrap();
        let d = sha256_digest(&cb);
        let s = d.to_string();
        assert!(s.starts_with("sha256:"));
        assert_eq!(s.len(), 7 + 64);
    }

    #[test]
    fn test_serde_roundtrip() {
        let cb = CanonicalBytes::new(&serde_json::json!({"k": "v"})).unwrap();
        let d = sha256_digest(&cb);
        let json = serde_json::to_string(&d).unwrap();
        let back: ContentDigest = serde_json::from_str(&json).unwrap();
        assert_eq!(d, back);
    }
}
