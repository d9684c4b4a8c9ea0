//! HMAC-SHA256 webhook signatures.

use std::fmt::Write;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use soulseed_shared::{Result, SoulseedError};

type HmacSha256 = Hmac<Sha256>;

/// Lowercase hex HMAC-SHA256 of `body` keyed with `secret`.
pub fn sign(secret: &str, body: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| SoulseedError::config(format!("invalid webhook secret: {e}")))?;
    mac.update(body);

    let bytes = mac.finalize().into_bytes();
    let mut hex = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(hex, "{byte:02x}");
    }
    Ok(hex)
}

/// Check `signature` (hex, optionally `sha256=`-prefixed) against `body`.
pub fn verify(secret: &str, body: &[u8], signature: &str) -> bool {
    let provided = signature.trim();
    let provided = provided.strip_prefix("sha256=").unwrap_or(provided);
    match sign(secret, body) {
        Ok(expected) => {
            constant_time_eq(expected.as_bytes(), provided.to_ascii_lowercase().as_bytes())
        }
        Err(_) => false,
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        // RFC 4231 test case 2.
        assert_eq!(
            sign("Jefe", b"what do ya want for nothing?").unwrap(),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn verify_accepts_prefix_and_uppercase() {
        let sig = sign("s3cret", b"{\"url\":\"x\"}").unwrap();
        assert!(verify("s3cret", b"{\"url\":\"x\"}", &sig));
        assert!(verify("s3cret", b"{\"url\":\"x\"}", &format!("sha256={}", sig.to_uppercase())));
        assert!(!verify("s3cret", b"{\"url\":\"y\"}", &sig));
        assert!(!verify("other", b"{\"url\":\"x\"}", &sig));
        assert!(!verify("s3cret", b"{\"url\":\"x\"}", "abc"));
    }

    #[test]
    fn any_secret_length_signs() {
        assert_eq!(sign("", b"x").unwrap().len(), 64);
        assert_eq!(sign(&"k".repeat(200), b"x").unwrap().len(), 64);
    }
}
