use crate::error::AuthError;
use crate::scheme::Credentials;
use portcullis_router::Principal;

/// Turns [`Credentials`] extracted off a request into an authenticated
/// principal (spec.md §4.6). Implemented by the host application,
/// since only it knows where user records live.
pub trait Authenticator: std::fmt::Debug + Send + Sync {
    fn authenticate(&self, credentials: &Credentials) -> Result<Box<dyn Principal>, AuthError>;
}

/// Re-derives a principal's roles/permissions, e.g. after a long-lived
/// session is resumed and the underlying user record may have changed
/// since the principal was first authenticated.
pub trait Authorizer: std::fmt::Debug + Send + Sync {
    fn roles_for(&self, subject_id: &str) -> Result<Vec<String>, AuthError>;
    fn permissions_for(&self, subject_id: &str) -> Result<Vec<String>, AuthError>;
}
