use portcullis_http::ErrorKind;

#[derive(Debug, Clone, thiserror::Error)]
pub enum CsrfError {
    #[error("request carried no Referer/Origin header to check against the trusted origin list")]
    NoReferer,

    #[error("request's Referer/Origin {0:?} is not a trusted origin")]
    BadReferer(String),

    #[error("no Anti-CSRF cookie was present on the request")]
    NoCookie,

    #[error("submitted Anti-CSRF token did not match the session secret")]
    TokenMismatch,
}

impl CsrfError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CsrfError::NoReferer => ErrorKind::AntiCsrfNoReferer,
            CsrfError::BadReferer(_) => ErrorKind::AntiCsrfBadReferer,
            CsrfError::NoCookie => ErrorKind::AntiCsrfNoCookie,
            CsrfError::TokenMismatch => ErrorKind::AntiCsrfTokenMismatch,
        }
    }
}
