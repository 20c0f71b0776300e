use portcullis_http::ErrorKind;

#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("no subject exists for the supplied credentials")]
    SubjectNotExists,

    #[error("no authenticator is configured for scheme {0:?}")]
    AuthenticatorNil(String),

    #[error("no authorizer is configured")]
    AuthorizerNil,

    #[error("authorization denied")]
    AuthorizationDenied,

    #[error("OAuth2 callback is missing state or code")]
    Oauth2MissingStateOrCode,

    #[error("OAuth2 state parameter failed verification")]
    Oauth2InvalidState,

    #[error("OAuth2 code exchange failed: {0}")]
    Oauth2ExchangeFailed(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::AuthenticationFailed => ErrorKind::AuthenticationFailed,
            AuthError::SubjectNotExists => ErrorKind::SubjectNotExists,
            AuthError::AuthenticatorNil(_) => ErrorKind::AuthenticatorNil,
            AuthError::AuthorizerNil => ErrorKind::AuthorizerNil,
            AuthError::AuthorizationDenied => ErrorKind::AuthorizationDenied,
            AuthError::Oauth2MissingStateOrCode => ErrorKind::Oauth2MissingStateOrCode,
            AuthError::Oauth2InvalidState => ErrorKind::Oauth2InvalidState,
            AuthError::Oauth2ExchangeFailed(_) => ErrorKind::Oauth2ExchangeFailed,
        }
    }
}
