use portcullis_auth::AuthError;
use portcullis_cookies::CookieError;
use portcullis_csrf::CsrfError;
use portcullis_http::{ErrorKind, Method, Status};
use portcullis_router::RouterError;
use portcullis_sessions::SessionError;

/// The facade's unified error type: every component boundary's error
/// composed behind `From`, so request-handling code can use `?`
/// across crate boundaries and still recover the right HTTP status at
/// the end (spec.md §7).
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Router(#[from] RouterError),
    #[error(transparent)]
    Cookie(#[from] CookieError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Csrf(#[from] CsrfError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("route not found")]
    NotFound,
    /// The domain matched and at least one tree registered `path`, but
    /// not for the effective method. Carries the allowed methods so
    /// the dispatcher can populate the `Allow` header (spec.md §8's
    /// boundary case: 405 only when the domain enables it).
    #[error("method not allowed")]
    MethodNotAllowed(Vec<Method>),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Router(e) => e.kind(),
            Error::Cookie(e) => e.kind(),
            Error::Session(e) => match e {
                SessionError::Cookie(e) => e.kind(),
                SessionError::Store(_) => ErrorKind::InternalServerError,
                SessionError::MissingStore => ErrorKind::InternalServerError,
            },
            Error::Csrf(e) => e.kind(),
            Error::Auth(e) => e.kind(),
            Error::NotFound => ErrorKind::NotFound,
            Error::MethodNotAllowed(_) => ErrorKind::MethodNotAllowed,
        }
    }

    /// Implements the status-mapping table of spec.md §6 end to end,
    /// from any component error down to the HTTP status the client sees.
    pub fn status(&self) -> Status {
        self.kind().status()
    }

    /// The methods to advertise in the `Allow` header, if this error
    /// carries any (only [`Error::MethodNotAllowed`] does).
    pub fn allowed_methods(&self) -> &[Method] {
        match self {
            Error::MethodNotAllowed(methods) => methods,
            _ => &[],
        }
    }
}
