use crate::error::CookieError;
use crate::keyring::KeyRing;
use aes::Aes256;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ctr::cipher::{KeyIvInit, StreamCipher};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

type Aes256Ctr = ctr::Ctr64BE<Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// Size cap on the fully-encoded cookie value (spec.md §4.4); a
/// typical browser caps an individual cookie at 4096 bytes.
const MAX_COOKIE_SIZE: usize = 4096;
const IV_LEN: usize = 16;

/// Encodes and decodes signed, optionally-encrypted cookie values of
/// the form `base64url(name|unix-seconds|base64url(payload)|mac)`
/// (spec.md §4.4).
#[derive(Debug, Clone)]
pub struct CookieCodec {
    signing_keys: KeyRing,
    encryption_keys: Option<KeyRing>,
    max_age: Option<Duration>,
    max_size: usize,
}

impl CookieCodec {
    pub fn new(signing_keys: KeyRing) -> Self {
        Self {
            signing_keys,
            encryption_keys: None,
            max_age: None,
            max_size: MAX_COOKIE_SIZE,
        }
    }

    pub fn with_encryption(mut self, encryption_keys: KeyRing) -> Self {
        self.encryption_keys = Some(encryption_keys);
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Signs (and, if configured, encrypts) `payload` under `name`.
    pub fn encode(&self, name: &str, payload: &[u8]) -> Result<String, CookieError> {
        let timestamp = now_unix();
        let payload_b64 = match &self.encryption_keys {
            Some(keys) => {
                let mut iv = [0u8; IV_LEN];
                rand::thread_rng().fill_bytes(&mut iv);
                let mut buf = payload.to_vec();
                let mut cipher = Aes256Ctr::new_from_slices(keys.current(), &iv)
                    .map_err(|_| CookieError::DecryptionFailed)?;
                cipher.apply_keystream(&mut buf);
                let mut framed = iv.to_vec();
                framed.extend_from_slice(&buf);
                URL_SAFE_NO_PAD.encode(framed)
            }
            None => URL_SAFE_NO_PAD.encode(payload),
        };

        let message = format!("{name}|{timestamp}|{payload_b64}");
        let mac = self.sign(self.signing_keys.current(), message.as_bytes());
        let mac_b64 = URL_SAFE_NO_PAD.encode(mac);
        let joined = format!("{message}|{mac_b64}");
        let encoded = URL_SAFE_NO_PAD.encode(joined);

        if encoded.len() > self.max_size {
            return Err(CookieError::TooLarge(self.max_size));
        }
        Ok(encoded)
    }

    /// Verifies and decodes a cookie value previously produced by
    /// [`Self::encode`] for the same `name`.
    pub fn decode(&self, name: &str, token: &str) -> Result<Vec<u8>, CookieError> {
        if token.len() > self.max_size {
            return Err(CookieError::TooLarge(self.max_size));
        }

        let joined_bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| CookieError::InvalidFormat(e.to_string()))?;
        let joined = String::from_utf8(joined_bytes)
            .map_err(|_| CookieError::InvalidFormat("cookie body is not valid UTF-8".into()))?;

        let mut parts = joined.splitn(4, '|');
        let found_name = parts.next().ok_or_else(|| CookieError::InvalidFormat("missing name field".into()))?;
        let timestamp_str = parts.next().ok_or_else(|| CookieError::InvalidFormat("missing timestamp field".into()))?;
        let payload_b64 = parts.next().ok_or_else(|| CookieError::InvalidFormat("missing payload field".into()))?;
        let mac_b64 = parts.next().ok_or_else(|| CookieError::InvalidFormat("missing signature field".into()))?;

        if found_name != name {
            return Err(CookieError::InvalidFormat(format!(
                "cookie name {found_name:?} does not match expected {name:?}"
            )));
        }

        let message = format!("{found_name}|{timestamp_str}|{payload_b64}");
        let mac = URL_SAFE_NO_PAD
            .decode(mac_b64)
            .map_err(|e| CookieError::InvalidFormat(e.to_string()))?;
        let key_slot = self.verify(message.as_bytes(), &mac)?;

        let timestamp: i64 = timestamp_str
            .parse()
            .map_err(|_| CookieError::TimestampInvalid)?;
        let now = now_unix();
        if timestamp > now {
            return Err(CookieError::TimestampInFuture);
        }
        if let Some(max_age) = self.max_age {
            let age = now - timestamp;
            if age > max_age.as_secs() as i64 {
                return Err(CookieError::Expired(age - max_age.as_secs() as i64));
            }
        }

        let raw = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|e| CookieError::InvalidFormat(e.to_string()))?;

        match &self.encryption_keys {
            Some(keys) => self.decrypt(keys, key_slot, &raw),
            None => Ok(raw),
        }
    }

    fn sign(&self, key: &[u8], message: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
        mac.update(message);
        mac.finalize().into_bytes().to_vec()
    }

    /// Tries every signing key (current, then previous) in constant
    /// time per comparison, so a key rotation doesn't invalidate
    /// cookies signed moments before the rotation. Returns the index
    /// of the matching key (0 = current, 1 = previous) so the caller
    /// can decrypt with the encryption key from the same rotation slot.
    fn verify(&self, message: &[u8], mac: &[u8]) -> Result<usize, CookieError> {
        for (slot, key) in self.signing_keys.candidates().enumerate() {
            let expected = self.sign(key, message);
            if bool::from(expected.ct_eq(mac)) {
                return Ok(slot);
            }
        }
        Err(CookieError::MacMismatch)
    }

    /// Decrypts with the encryption key at `key_slot` (the slot whose
    /// signing key counterpart verified the MAC), not always `current`,
    /// so a cookie minted under the previous `(signing, encryption)`
    /// key pair still decodes during a rotation.
    fn decrypt(&self, keys: &KeyRing, key_slot: usize, framed: &[u8]) -> Result<Vec<u8>, CookieError> {
        if framed.len() < IV_LEN {
            return Err(CookieError::DecryptionFailed);
        }
        let key = keys.candidates().nth(key_slot).ok_or(CookieError::DecryptionFailed)?;
        let (iv, ciphertext) = framed.split_at(IV_LEN);
        let mut buf = ciphertext.to_vec();
        let mut cipher = Aes256Ctr::new_from_slices(key, iv).map_err(|_| CookieError::DecryptionFailed)?;
        cipher.apply_keystream(&mut buf);
        Ok(buf)
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is after 1970")
        .as_secs() as i64
}
