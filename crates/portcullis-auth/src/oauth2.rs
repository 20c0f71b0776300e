use crate::error::AuthError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Binds an OAuth2 authorization request to the browser session that
/// initiated it, so the callback can't be replayed or forged (spec.md
/// §4.6). The `state` query parameter sent to the provider is
/// `base64url(nonce|issued_at|hmac)`; the callback handler re-derives
/// the HMAC over the returned nonce and timestamp and rejects anything
/// that doesn't match or has aged past `ttl`.
#[derive(Debug, Clone)]
pub struct Oauth2StateBinder {
    secret: Vec<u8>,
    ttl: Duration,
}

impl Oauth2StateBinder {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    /// Produces the `state` value to send as part of the authorization
    /// redirect.
    pub fn issue(&self) -> String {
        let mut nonce = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut nonce);
        let nonce_b64 = URL_SAFE_NO_PAD.encode(nonce);
        let issued_at = now_unix();
        let message = format!("{nonce_b64}|{issued_at}");
        let mac = self.sign(message.as_bytes());
        let mac_b64 = URL_SAFE_NO_PAD.encode(mac);
        URL_SAFE_NO_PAD.encode(format!("{message}|{mac_b64}"))
    }

    /// Verifies a `state` value returned by the provider's callback.
    pub fn verify(&self, state: &str) -> Result<(), AuthError> {
        let joined_bytes = URL_SAFE_NO_PAD
            .decode(state)
            .map_err(|_| AuthError::Oauth2InvalidState)?;
        let joined = String::from_utf8(joined_bytes).map_err(|_| AuthError::Oauth2InvalidState)?;

        let mut parts = joined.splitn(3, '|');
        let nonce_b64 = parts.next().ok_or(AuthError::Oauth2InvalidState)?;
        let issued_at_str = parts.next().ok_or(AuthError::Oauth2InvalidState)?;
        let mac_b64 = parts.next().ok_or(AuthError::Oauth2InvalidState)?;

        let message = format!("{nonce_b64}|{issued_at_str}");
        let mac = URL_SAFE_NO_PAD
            .decode(mac_b64)
            .map_err(|_| AuthError::Oauth2InvalidState)?;
        let expected = self.sign(message.as_bytes());
        if !bool::from(expected.ct_eq(&mac)) {
            return Err(AuthError::Oauth2InvalidState);
        }

        let issued_at: i64 = issued_at_str.parse().map_err(|_| AuthError::Oauth2InvalidState)?;
        let age = now_unix() - issued_at;
        if age < 0 || age as u64 > self.ttl.as_secs() {
            return Err(AuthError::Oauth2InvalidState);
        }

        Ok(())
    }

    fn sign(&self, message: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(message);
        mac.finalize().into_bytes().to_vec()
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is after 1970")
        .as_secs() as i64
}

/// Confirms that an OAuth2 callback carried both `state` and `code`
/// (spec.md §4.6); providers omit one or the other on user-denied or
/// malformed requests.
pub fn require_callback_params(state: Option<&str>, code: Option<&str>) -> Result<(String, String), AuthError> {
    match (state, code) {
        (Some(s), Some(c)) => Ok((s.to_string(), c.to_string())),
        _ => Err(AuthError::Oauth2MissingStateOrCode),
    }
}
