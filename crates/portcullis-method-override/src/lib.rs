#![forbid(unsafe_code)]
#![deny(missing_debug_implementations, nonstandard_style)]

/*!
# portcullis-method-override

Lets HTTP clients that cannot issue methods other than `GET`/`POST`
request that a `POST` be dispatched as `PUT`, `PATCH`, or `DELETE`
instead, via the `X-HTTP-Method-Override` request header (spec.md
§4.2). This differs from the querystring-parameter convention some
frameworks use: a header is invisible to caching proxies and doesn't
require mangling the URL.

Also resolves the *effective* method for a CORS preflight `OPTIONS`
request from its `Access-Control-Request-Method` header, since the
domain registry's route-matching must be evaluated against the method
the browser actually intends to send, not `OPTIONS` itself.
*/

use portcullis_http::{Headers, Method};
use std::collections::HashSet;

const OVERRIDE_HEADER: &str = "x-http-method-override";
const CORS_PREFLIGHT_HEADER: &str = "access-control-request-method";

/// Resolves the effective method for a request, applying method
/// override and CORS-preflight-aware resolution (spec.md §4.2).
#[derive(Debug, Clone)]
pub struct MethodOverride {
    allowed: HashSet<Method>,
}

impl Default for MethodOverride {
    fn default() -> Self {
        Self {
            allowed: [Method::Put, Method::Patch, Method::Delete].into_iter().collect(),
        }
    }
}

impl MethodOverride {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the set of methods a `POST` is allowed to be overridden
    /// to. Default: `PUT`, `PATCH`, `DELETE`.
    pub fn with_allowed_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.allowed = methods.into_iter().collect();
        self
    }

    /// Returns the method that routing should use for this request:
    ///
    /// - An `OPTIONS` request carrying `Access-Control-Request-Method`
    ///   resolves to that header's method, so preflight can be matched
    ///   against the route the real request would hit.
    /// - A `POST` carrying a recognized `X-HTTP-Method-Override` header
    ///   whose value is in the allowed set resolves to that method.
    /// - Otherwise, the request's own method is returned unchanged.
    pub fn effective_method(&self, method: Method, headers: &Headers) -> Method {
        if method == Method::Options {
            if let Some(requested) = headers
                .get(CORS_PREFLIGHT_HEADER)
                .and_then(|v| v.parse::<Method>().ok())
            {
                return requested;
            }
            return method;
        }

        if method == Method::Post {
            if let Some(overridden) = headers
                .get(OVERRIDE_HEADER)
                .and_then(|v| v.parse::<Method>().ok())
            {
                if self.allowed.contains(&overridden) {
                    return overridden;
                }
                log::debug!(
                    "ignoring method override to {overridden} via {OVERRIDE_HEADER}: not in the allowed set"
                );
            }
        }

        method
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(name: &str, value: &str) -> Headers {
        let mut h = Headers::new();
        h.insert(name, value);
        h
    }

    #[test]
    fn post_without_override_header_is_unchanged() {
        let mo = MethodOverride::new();
        let effective = mo.effective_method(Method::Post, &Headers::new());
        assert_eq!(effective, Method::Post);
    }

    #[test]
    fn post_with_allowed_override_is_rewritten() {
        let mo = MethodOverride::new();
        let headers = headers_with("X-HTTP-Method-Override", "DELETE");
        assert_eq!(mo.effective_method(Method::Post, &headers), Method::Delete);
    }

    #[test]
    fn post_with_disallowed_override_is_ignored() {
        let mo = MethodOverride::new().with_allowed_methods([Method::Put]);
        let headers = headers_with("X-HTTP-Method-Override", "DELETE");
        assert_eq!(mo.effective_method(Method::Post, &headers), Method::Post);
    }

    #[test]
    fn get_is_never_overridden() {
        let mo = MethodOverride::new();
        let headers = headers_with("X-HTTP-Method-Override", "DELETE");
        assert_eq!(mo.effective_method(Method::Get, &headers), Method::Get);
    }

    #[test]
    fn options_resolves_to_cors_preflight_method() {
        let mo = MethodOverride::new();
        let headers = headers_with("Access-Control-Request-Method", "PUT");
        assert_eq!(mo.effective_method(Method::Options, &headers), Method::Put);
    }

    #[test]
    fn options_without_preflight_header_stays_options() {
        let mo = MethodOverride::new();
        assert_eq!(
            mo.effective_method(Method::Options, &Headers::new()),
            Method::Options
        );
    }
}
