use portcullis_http::{ErrorKind, Method};

/// Errors raised while building or walking a [`crate::Tree`] or
/// [`crate::Domain`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum RouterError {
    /// `Add` was called twice with the exact same template.
    #[error("a route is already registered for path {0:?}")]
    NodeExists(String),

    /// Two templates disagree on the name of a parameter at the same
    /// position, e.g. `/a/:id` then `/a/:slug`.
    #[error("parameter name conflict at {path:?}: expected {expected:?}, found {found:?}")]
    ParamConflict {
        path: String,
        expected: String,
        found: String,
    },

    /// A parameter segment contained a second `:` or `*` token.
    #[error("parameter segment {0:?} may not contain a nested parameter or wildcard token")]
    NestedParam(String),

    /// A wildcard token did not occupy the final segment of the template.
    #[error("wildcard token in {0:?} must be terminal")]
    WildcardNotTerminal(String),

    /// A path template did not begin with `/`.
    #[error("route path {0:?} must begin with '/'")]
    PathMustBeAbsolute(String),

    /// A captured parameter failed its configured `name -> regex` rule.
    #[error("path parameter {name:?} value {value:?} failed constraint /{pattern}/")]
    ConstraintFailed {
        name: String,
        value: String,
        pattern: String,
    },

    /// No route named `0` is registered, so a reverse lookup has
    /// nothing to expand.
    #[error("no route is registered under the name {0:?}")]
    UnknownRouteName(String),

    /// A reverse lookup's `params` didn't supply a value for every
    /// `:name` segment the route template requires.
    #[error("reverse lookup for route {route:?} is missing a value for parameter {param:?}")]
    MissingReverseParam { route: String, param: String },

    /// A preflight's `Origin` header is absent or not in the policy's
    /// `allow_origins` list.
    #[error("origin {0:?} is not allowed by this route's CORS policy")]
    CorsOriginInvalid(String),

    /// `Access-Control-Request-Method` named a method outside the
    /// policy's `allow_methods` list.
    #[error("method {0} is not allowed by this route's CORS policy")]
    CorsMethodNotAllowed(Method),

    /// `Access-Control-Request-Headers` named a header outside the
    /// policy's `allow_headers` list.
    #[error("header {0:?} is not allowed by this route's CORS policy")]
    CorsHeaderNotAllowed(String),

    /// A non-preflight cross-origin request's `Content-Type` is
    /// outside the policy's `allow_content_types` list.
    #[error("content type {0:?} is not allowed by this route's CORS policy")]
    CorsContentTypeNotAllowed(String),
}

impl RouterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RouterError::ConstraintFailed { .. } => ErrorKind::RouteConstraintFailed,
            RouterError::CorsOriginInvalid(_) => ErrorKind::CorsOriginInvalid,
            RouterError::CorsMethodNotAllowed(_) => ErrorKind::CorsMethodNotAllowed,
            RouterError::CorsHeaderNotAllowed(_) => ErrorKind::CorsHeaderNotAllowed,
            RouterError::CorsContentTypeNotAllowed(_) => ErrorKind::CorsContentTypeNotAllowed,
            _ => ErrorKind::InternalServerError,
        }
    }
}
