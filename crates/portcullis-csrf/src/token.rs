use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use subtle::ConstantTimeEq;

/// Length in bytes of both the secret and the per-render salt.
pub const SECRET_LEN: usize = 32;

/// Generates a fresh random per-session Anti-CSRF secret (spec.md
/// §4.7). This is the value held server-side (typically in the
/// session); it is never sent to the client directly.
pub fn generate_secret() -> [u8; SECRET_LEN] {
    let mut secret = [0u8; SECRET_LEN];
    rand::thread_rng().fill_bytes(&mut secret);
    secret
}

/// Masks `secret` with a fresh random salt and returns
/// `base64url(salt || salt XOR secret)` -- the value actually embedded
/// in a hidden form field or response header. A new call with the same
/// secret produces a different token every time, so a network observer
/// who sees one rendered token (e.g. via a BREACH-style compression
/// oracle) cannot reuse it against compressed response bodies.
pub fn mask(secret: &[u8; SECRET_LEN]) -> String {
    let mut salt = [0u8; SECRET_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut masked = [0u8; SECRET_LEN];
    for i in 0..SECRET_LEN {
        masked[i] = salt[i] ^ secret[i];
    }

    let mut framed = Vec::with_capacity(SECRET_LEN * 2);
    framed.extend_from_slice(&salt);
    framed.extend_from_slice(&masked);
    URL_SAFE_NO_PAD.encode(framed)
}

/// Unmasks `token` and compares the recovered secret against `secret`
/// in constant time.
pub fn verify(secret: &[u8; SECRET_LEN], token: &str) -> bool {
    let Ok(framed) = URL_SAFE_NO_PAD.decode(token) else {
        return false;
    };
    if framed.len() != SECRET_LEN * 2 {
        return false;
    }
    let (salt, masked) = framed.split_at(SECRET_LEN);
    let mut recovered = [0u8; SECRET_LEN];
    for i in 0..SECRET_LEN {
        recovered[i] = salt[i] ^ masked[i];
    }
    bool::from(recovered.ct_eq(secret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masked_token_verifies_against_its_secret() {
        let secret = generate_secret();
        let token = mask(&secret);
        assert!(verify(&secret, &token));
    }

    #[test]
    fn two_masks_of_the_same_secret_differ() {
        let secret = generate_secret();
        assert_ne!(mask(&secret), mask(&secret));
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let secret = generate_secret();
        let other = generate_secret();
        let token = mask(&secret);
        assert!(!verify(&other, &token));
    }

    #[test]
    fn malformed_token_fails_verification() {
        let secret = generate_secret();
        assert!(!verify(&secret, "not-valid-base64!!"));
        assert!(!verify(&secret, &URL_SAFE_NO_PAD.encode(b"too-short")));
    }
}
