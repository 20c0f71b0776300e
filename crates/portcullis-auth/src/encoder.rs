use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand::rngs::OsRng;
use std::collections::HashMap;
use std::fmt;

/// A password hashing scheme, identified by the `$scheme$...` prefix
/// of the hash strings it produces (spec.md §4.6). Every encoder
/// produces and consumes the PHC string format (`$scheme$params$salt$hash`),
/// so hashes from different encoders can coexist in the same user
/// table during a migration between algorithms.
pub trait PasswordEncoder: fmt::Debug + Send + Sync {
    /// The PHC identifier this encoder recognizes, e.g. `bcrypt`.
    fn scheme(&self) -> &'static str;
    fn hash(&self, password: &str) -> Result<String, EncoderError>;
    fn verify(&self, password: &str, hash: &str) -> Result<bool, EncoderError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum EncoderError {
    #[error("password hash string is not well-formed: {0}")]
    Malformed(String),
    #[error("no password encoder is registered for scheme {0:?}")]
    UnknownScheme(String),
    #[error("password hashing backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, Default)]
pub struct BcryptEncoder {
    cost: Option<u32>,
}

impl BcryptEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cost(mut self, cost: u32) -> Self {
        self.cost = Some(cost);
        self
    }
}

impl PasswordEncoder for BcryptEncoder {
    fn scheme(&self) -> &'static str {
        "bcrypt"
    }

    fn hash(&self, password: &str) -> Result<String, EncoderError> {
        let cost = self.cost.unwrap_or(bcrypt::DEFAULT_COST);
        bcrypt::hash(password, cost).map_err(|e| EncoderError::Backend(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, EncoderError> {
        bcrypt::verify(password, hash).map_err(|e| EncoderError::Backend(e.to_string()))
    }
}

#[derive(Debug, Default)]
pub struct ScryptEncoder;

impl ScryptEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordEncoder for ScryptEncoder {
    fn scheme(&self) -> &'static str {
        "scrypt"
    }

    fn hash(&self, password: &str) -> Result<String, EncoderError> {
        let salt = SaltString::generate(&mut OsRng);
        scrypt::Scrypt
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| EncoderError::Backend(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, EncoderError> {
        let parsed = PasswordHash::new(hash).map_err(|e| EncoderError::Malformed(e.to_string()))?;
        Ok(scrypt::Scrypt
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

#[derive(Debug, Default)]
pub struct Pbkdf2Encoder;

impl Pbkdf2Encoder {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordEncoder for Pbkdf2Encoder {
    fn scheme(&self) -> &'static str {
        "pbkdf2"
    }

    fn hash(&self, password: &str) -> Result<String, EncoderError> {
        let salt = SaltString::generate(&mut OsRng);
        pbkdf2::Pbkdf2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| EncoderError::Backend(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, EncoderError> {
        let parsed = PasswordHash::new(hash).map_err(|e| EncoderError::Malformed(e.to_string()))?;
        Ok(pbkdf2::Pbkdf2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

/// Dispatches to the right [`PasswordEncoder`] by reading the
/// `$scheme$` prefix off a stored hash, so a user table can carry
/// hashes produced by more than one algorithm at once during a
/// migration (spec.md §4.6).
#[derive(Debug, Default)]
pub struct PasswordEncoderRegistry {
    encoders: HashMap<&'static str, Box<dyn PasswordEncoder>>,
    default_scheme: Option<&'static str>,
}

impl PasswordEncoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, encoder: Box<dyn PasswordEncoder>) -> Self {
        let scheme = encoder.scheme();
        if self.default_scheme.is_none() {
            self.default_scheme = Some(scheme);
        }
        self.encoders.insert(scheme, encoder);
        self
    }

    /// Hashes `password` with the first-registered (default) encoder.
    pub fn hash(&self, password: &str) -> Result<String, EncoderError> {
        let scheme = self
            .default_scheme
            .ok_or_else(|| EncoderError::UnknownScheme("<none registered>".into()))?;
        self.encoders[scheme].hash(password)
    }

    /// Verifies `password` against `hash`, dispatching on the scheme
    /// named by the hash's `$scheme$` prefix.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, EncoderError> {
        let scheme = scheme_of(hash)?;
        let encoder = self
            .encoders
            .get(scheme)
            .ok_or_else(|| EncoderError::UnknownScheme(scheme.to_string()))?;
        encoder.verify(password, hash)
    }
}

fn scheme_of(hash: &str) -> Result<&str, EncoderError> {
    if let Some(rest) = hash.strip_prefix('$') {
        if let Some(end) = rest.find('$') {
            return Ok(&rest[..end]);
        }
    }
    if hash.starts_with("$2a$") || hash.starts_with("$2b$") || hash.starts_with("$2y$") {
        return Ok("bcrypt");
    }
    Err(EncoderError::Malformed(hash.to_string()))
}
