use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};

/// PKCE verifier and its S256 challenge for one authorization request.
#[derive(Debug, Clone)]
pub struct PkcePair {
    /// Secret kept by the server until the code exchange.
    pub verifier: String,
    /// `BASE64URL(SHA256(verifier))`, sent with the authorization request.
    pub challenge: String,
}

impl PkcePair {
    /// Generates a fresh verifier/challenge pair.
    #[must_use]
    pub fn generate() -> Self {
        let verifier = generate_code_verifier();
        let challenge = generate_code_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

fn random_token<const N: usize>() -> String {
    let random_bytes: [u8; N] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Generates a cryptographically random code verifier for PKCE.
///
/// Returns a 64-character URL-safe string (RFC 7636 compliant, 43-128 chars).
#[must_use]
pub fn generate_code_verifier() -> String {
    random_token::<48>()
}

/// Computes the S256 code challenge from a code verifier.
#[must_use]
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generates the per-flow CSRF `state` value.
///
/// Returns a 22-character URL-safe string (16 random bytes → base64url).
#[must_use]
pub fn generate_state() -> String {
    random_token::<16>()
}

/// Generates an opaque session handle (32 random bytes → 43 chars).
#[must_use]
pub fn generate_session_id() -> String {
    random_token::<32>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_url_safe(s: &str) -> bool {
        s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    #[test]
    fn test_code_verifier_shape() {
        let verifier = generate_code_verifier();
        assert_eq!(verifier.len(), 64);
        assert!(is_url_safe(&verifier), "verifier should be URL-safe: {verifier}");
    }

    #[test]
    fn test_pkce_pair_challenge_matches_verifier() {
        let pair = PkcePair::generate();
        assert_eq!(pair.challenge, generate_code_challenge(&pair.verifier));
        assert_ne!(pair.challenge, pair.verifier);
    }

    #[test]
    fn test_code_challenge_known_vector() {
        // RFC 7636 appendix B
        let challenge = generate_code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
        assert_eq!(challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn test_state_length_and_uniqueness() {
        let s1 = generate_state();
        let s2 = generate_state();
        assert_eq!(s1.len(), 22);
        assert!(is_url_safe(&s1));
        assert_ne!(s1, s2, "states should never repeat");
    }

    #[test]
    fn test_session_id_shape() {
        let id = generate_session_id();
        assert_eq!(id.len(), 43);
        assert!(is_url_safe(&id));
        assert_ne!(id, generate_session_id());
    }
}
