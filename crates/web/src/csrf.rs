#![forbid(unsafe_code)]

//! Stateless form tokens: `<issued_at_ms>.<hex hmac-sha256(secret, issued_at_ms)>`.

use sha2::{Digest as _, Sha256};
use std::fmt::Write as _;

pub(crate) const TOKEN_TTL_MS: i64 = 3_600 * 1_000;
const BLOCK_LEN: usize = 64;

#[derive(Clone)]
pub(crate) struct CsrfSigner {
    key_block: [u8; BLOCK_LEN],
}

impl std::fmt::Debug for CsrfSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CsrfSigner(<redacted>)")
    }
}

impl CsrfSigner {
    pub(crate) fn new(secret: &str) -> Self {
        let mut key_block = [0u8; BLOCK_LEN];
        let secret = secret.as_bytes();
        if secret.len() > BLOCK_LEN {
            let digest = Sha256::digest(secret);
            key_block[..digest.len()].copy_from_slice(&digest);
        } else {
            key_block[..secret.len()].copy_from_slice(secret);
        }
        Self { key_block }
    }

    pub(crate) fn issue(&self, now_ms: i64) -> String {
        format!("{now_ms}.{}", self.sign(now_ms))
    }

    pub(crate) fn verify(&self, token: Option<&str>, now_ms: i64) -> bool {
        let Some(token) = token else {
            return false;
        };
        let Some((issued_raw, signature)) = token.trim().split_once('.') else {
            return false;
        };
        let Ok(issued_ms) = issued_raw.parse::<i64>() else {
            return false;
        };
        let age_ms = now_ms.saturating_sub(issued_ms);
        if !(0..=TOKEN_TTL_MS).contains(&age_ms) {
            return false;
        }
        constant_time_eq(signature.as_bytes(), self.sign(issued_ms).as_bytes())
    }

    fn sign(&self, issued_ms: i64) -> String {
        let mut inner = Sha256::new();
        inner.update(self.key_block.map(|b| b ^ 0x36));
        inner.update(issued_ms.to_string().as_bytes());
        let inner = inner.finalize();

        let mut outer = Sha256::new();
        outer.update(self.key_block.map(|b| b ^ 0x5c));
        outer.update(inner);
        let digest = outer.finalize();

        let mut out = String::with_capacity(64);
        for b in digest {
            let _ = write!(&mut out, "{:02x}", b);
        }
        out
    }
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_rfc4231_hmac_sha256_vector() {
        // RFC 4231 test case 2: key "Jefe", data "what do ya want for nothing?".
        let signer = CsrfSigner::new("Jefe");
        let mut inner = Sha256::new();
        inner.update(signer.key_block.map(|b| b ^ 0x36));
        inner.update(b"what do ya want for nothing?");
        let inner = inner.finalize();
        let mut outer = Sha256::new();
        outer.update(signer.key_block.map(|b| b ^ 0x5c));
        outer.update(inner);
        let mut hex = String::new();
        for b in outer.finalize() {
            let _ = write!(&mut hex, "{:02x}", b);
        }
        assert_eq!(
            hex,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn issued_token_verifies_within_ttl() {
        let signer = CsrfSigner::new("s3cret");
        let token = signer.issue(1_000);
        assert!(signer.verify(Some(&token), 1_000));
        assert!(signer.verify(Some(&token), 1_000 + TOKEN_TTL_MS));
        assert!(!signer.verify(Some(&token), 1_001 + TOKEN_TTL_MS));
        assert!(!signer.verify(Some(&token), 999));
    }

    #[test]
    fn rejects_missing_malformed_and_foreign_tokens() {
        let signer = CsrfSigner::new("s3cret");
        let other = CsrfSigner::new("other");
        assert!(!signer.verify(None, 5));
        assert!(!signer.verify(Some(""), 5));
        assert!(!signer.verify(Some("5"), 5));
        assert!(!signer.verify(Some("abc.def"), 5));
        assert!(!signer.verify(Some(&other.issue(5)), 5));

        let token = signer.issue(5);
        let (_, signature) = token.split_once('.').expect("token has a dot");
        let replayed = format!("6.{signature}");
        assert!(!signer.verify(Some(&replayed), 6));
    }

    #[test]
    fn long_secrets_are_hashed_into_the_key_block() {
        let long = "k".repeat(200);
        let signer = CsrfSigner::new(&long);
        let token = signer.issue(42);
        assert!(signer.verify(Some(&token), 42));
        assert_eq!(format!("{signer:?}"), "CsrfSigner(<redacted>)");
    }
}
