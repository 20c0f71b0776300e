#![forbid(unsafe_code)]
#![deny(missing_debug_implementations, nonstandard_style)]

/*!
# portcullis

The facade crate: wires the multi-domain radix router, cookie codec,
session manager, Anti-CSRF guard, pluggable authentication schemes, and
content negotiation into the fixed per-request security pipeline
(spec.md §1, §2, §5).

A host HTTP server owns the socket, the request line, and the response
body; it hands this crate a [`Request`] and a [`Pipeline`] and gets
back either a [`Dispatch`] to act on or an [`Error`] to translate into
a status code via [`Error::status`].
*/

mod error;
mod pipeline;

pub use error::Error;
pub use pipeline::{Dispatch, Outcome, Pipeline};

pub use portcullis_auth::{
    require_callback_params, AuthError, AuthScheme, Authenticator, Authorizer, BcryptEncoder, Credentials,
    EncoderError, Oauth2StateBinder, PasswordEncoder, PasswordEncoderRegistry, Pbkdf2Encoder, SchemeBase,
    ScryptEncoder,
};
pub use portcullis_config::{
    AuthSchemeConfig, Config, ConfigError, CookieKeysConfig, CsrfConfig, DomainConfig, Profile, RouteConfig,
    RoutingConfig, SecurityConfig, SessionConfig,
};
pub use portcullis_cookies::{CookieCodec, CookieError, KeyRing};
pub use portcullis_core::{Request, ResponseWriter};
pub use portcullis_csrf::{AntiCsrfGuard, CsrfError};
pub use portcullis_http::{ErrorKind, Headers, Method, Status};
pub use portcullis_method_override::MethodOverride;
pub use portcullis_negotiation::{negotiate, parse_quality_list, resolve_content_type, QualifiedValue};
pub use portcullis_router::{
    evaluate_preflight, validate_content_type, AuthorizationPredicate, CorsOverride, DomainRegistry, Matched,
    Permission, PreflightHeaders, Principal, Resolution, Route, StaticFiles, Tree,
};
pub use portcullis_sessions::{
    FilesystemStore, MemoryStore, Session, SessionError, SessionManager, SessionMode, Store, StoreError,
};
