use crate::Status;

/// The stable set of error discriminants produced anywhere in the
/// core (spec.md §7). Every fallible component returns one of these
/// (usually wrapped in a component-specific `thiserror` enum that
/// exposes `kind()`), so the dispatcher can map errors to HTTP
/// statuses with a single `match` rather than per-component
/// special-casing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    NotFound,
    MethodNotAllowed,
    RouteConstraintFailed,
    CorsOriginInvalid,
    CorsMethodNotAllowed,
    CorsHeaderNotAllowed,
    CorsContentTypeNotAllowed,
    CookieOversized,
    CookieMalformed,
    CookieTimestampInvalid,
    CookieTimestampInFuture,
    CookieTimestampExpired,
    CookieSignatureMismatch,
    CookieDecryptFailed,
    AuthenticationFailed,
    SubjectNotExists,
    AuthenticatorNil,
    AuthorizerNil,
    AuthorizationDenied,
    Oauth2MissingStateOrCode,
    Oauth2InvalidState,
    Oauth2ExchangeFailed,
    Oauth2TokenStillValid,
    AntiCsrfNoReferer,
    AntiCsrfBadReferer,
    AntiCsrfNoCookie,
    AntiCsrfTokenMismatch,
    Base64Decode,
    UnableToDecrypt,
    InternalServerError,
    ServiceUnavailable,
}

impl ErrorKind {
    /// Implements the status-mapping table of spec.md §6. A 405 is
    /// only ever produced by the router itself (which attaches the
    /// `Allow` header before this mapping is consulted); this method
    /// still returns `MethodNotAllowed -> 405` for callers that map
    /// a bare `ErrorKind` without that context.
    pub fn status(self) -> Status {
        use ErrorKind::*;
        match self {
            NotFound => Status::NotFound,
            MethodNotAllowed => Status::MethodNotAllowed,
            RouteConstraintFailed => Status::BadRequest,
            CorsOriginInvalid | CorsMethodNotAllowed | CorsHeaderNotAllowed
            | CorsContentTypeNotAllowed => Status::Forbidden,
            CookieOversized | CookieMalformed | CookieTimestampInvalid
            | CookieTimestampInFuture | CookieTimestampExpired | CookieSignatureMismatch
            | CookieDecryptFailed | Base64Decode | UnableToDecrypt => Status::BadRequest,
            AuthenticationFailed | SubjectNotExists => Status::Unauthorized,
            AuthorizationDenied => Status::Forbidden,
            AuthenticatorNil | AuthorizerNil | InternalServerError => {
                Status::InternalServerError
            }
            Oauth2MissingStateOrCode | Oauth2InvalidState | Oauth2ExchangeFailed => {
                Status::BadRequest
            }
            Oauth2TokenStillValid => Status::Ok,
            AntiCsrfNoReferer | AntiCsrfBadReferer | AntiCsrfNoCookie | AntiCsrfTokenMismatch => {
                Status::Forbidden
            }
            ServiceUnavailable => Status::ServiceUnavailable,
        }
    }
}
