use portcullis_http::ErrorKind;

/// Why a cookie failed to encode or decode (spec.md §4.4). Kept
/// distinct per failure mode so callers can log the right thing
/// without leaking signing material, and so tests can assert on the
/// exact failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CookieError {
    #[error("encoded cookie value exceeds the {0}-byte size cap")]
    TooLarge(usize),

    #[error("cookie value is not validly formed: {0}")]
    InvalidFormat(String),

    #[error("cookie timestamp field could not be parsed")]
    TimestampInvalid,

    #[error("cookie timestamp is in the future")]
    TimestampInFuture,

    #[error("cookie signature did not match any configured signing key")]
    MacMismatch,

    #[error("cookie expired {0}s ago")]
    Expired(i64),

    #[error("cookie payload could not be decrypted")]
    DecryptionFailed,
}

impl CookieError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CookieError::TooLarge(_) => ErrorKind::CookieOversized,
            CookieError::InvalidFormat(_) => ErrorKind::CookieMalformed,
            CookieError::TimestampInvalid => ErrorKind::CookieTimestampInvalid,
            CookieError::TimestampInFuture => ErrorKind::CookieTimestampInFuture,
            CookieError::MacMismatch => ErrorKind::CookieSignatureMismatch,
            CookieError::Expired(_) => ErrorKind::CookieTimestampExpired,
            CookieError::DecryptionFailed => ErrorKind::CookieDecryptFailed,
        }
    }
}
