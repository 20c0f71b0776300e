#![forbid(unsafe_code)]
#![deny(missing_debug_implementations, nonstandard_style)]

/*!
# portcullis-auth

Pluggable authentication schemes, the password encoder registry, and
OAuth2 state-nonce CSRF binding (spec.md §4.6). The [`Authenticator`]
and [`Authorizer`] traits are the seam between this crate and the host
application's user store.
*/

mod encoder;
mod error;
mod oauth2;
mod scheme;
mod traits;

pub use encoder::{
    BcryptEncoder, EncoderError, PasswordEncoder, PasswordEncoderRegistry, Pbkdf2Encoder, ScryptEncoder,
};
pub use error::AuthError;
pub use oauth2::{require_callback_params, Oauth2StateBinder};
pub use scheme::{AuthScheme, Credentials, SchemeBase};
pub use traits::{Authenticator, Authorizer};
