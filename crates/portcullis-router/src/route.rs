use crate::error::RouterError;
use crate::predicate::AuthorizationPredicate;
use portcullis_http::Method;
use regex::Regex;
use std::collections::HashMap;

/// Static-file-serving configuration for a [`Route`] (spec.md §4.1).
#[derive(Debug, Clone)]
pub struct StaticFiles {
    pub dir: String,
    pub file: Option<String>,
    pub list_directory: bool,
}

/// Per-request CORS override for a single route, layered on top of
/// whatever global CORS policy the host applies (spec.md §4.2, §6).
/// An empty `allow_origins` rejects every preflight; `allow_methods`,
/// `allow_headers`, and `allow_content_types` empty mean "accept
/// whatever the browser asks for" rather than "reject everything" —
/// mirroring the routing configuration's `cors { … }` table, where
/// omitting a list means it isn't restricted.
#[derive(Debug, Clone, Default)]
pub struct CorsOverride {
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<Method>,
    pub allow_headers: Vec<String>,
    pub expose_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age: Option<u64>,
    /// Restricts the `Content-Type` of non-preflight cross-origin
    /// requests. Empty means unrestricted.
    pub allow_content_types: Vec<String>,
}

/// A single registered route (spec.md §4.1): a path template bound to
/// one or more methods, plus the metadata the security pipeline
/// consults before dispatching to the route's action.
///
/// Built with the `with_*` builder methods, mirroring the way the
/// teacher's handler stack is composed one layer at a time.
#[derive(Debug, Clone)]
pub struct Route {
    name: String,
    path: String,
    methods: Vec<Method>,
    action: String,
    parent: Option<String>,
    auth_scheme: Option<String>,
    max_body_size: Option<u64>,
    anti_csrf_check: bool,
    cors: Option<CorsOverride>,
    constraints: HashMap<String, Regex>,
    static_files: Option<StaticFiles>,
    authorization: Option<AuthorizationPredicate>,
}

impl Route {
    pub fn new(name: impl Into<String>, path: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            methods: vec![Method::Get],
            action: action.into(),
            parent: None,
            auth_scheme: None,
            max_body_size: None,
            anti_csrf_check: true,
            cors: None,
            constraints: HashMap::new(),
            static_files: None,
            authorization: None,
        }
    }

    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_auth_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.auth_scheme = Some(scheme.into());
        self
    }

    pub fn with_max_body_size(mut self, bytes: u64) -> Self {
        self.max_body_size = Some(bytes);
        self
    }

    /// Disables the Anti-CSRF check for this route. Enabled by default;
    /// routes that only ever receive safe methods should generally
    /// leave this on since the guard itself is a no-op for GET/HEAD/OPTIONS
    /// (spec.md §4.7).
    pub fn without_anti_csrf_check(mut self) -> Self {
        self.anti_csrf_check = false;
        self
    }

    pub fn with_cors(mut self, cors: CorsOverride) -> Self {
        self.cors = Some(cors);
        self
    }

    pub fn with_constraint(mut self, param: impl Into<String>, pattern: Regex) -> Self {
        self.constraints.insert(param.into(), pattern);
        self
    }

    pub fn with_static_files(mut self, static_files: StaticFiles) -> Self {
        self.static_files = Some(static_files);
        self
    }

    pub fn with_authorization(mut self, predicate: AuthorizationPredicate) -> Self {
        self.authorization = Some(predicate);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn auth_scheme(&self) -> Option<&str> {
        self.auth_scheme.as_deref()
    }

    pub fn max_body_size(&self) -> Option<u64> {
        self.max_body_size
    }

    pub fn anti_csrf_check_enabled(&self) -> bool {
        self.anti_csrf_check
    }

    pub fn cors(&self) -> Option<&CorsOverride> {
        self.cors.as_ref()
    }

    pub fn static_files(&self) -> Option<&StaticFiles> {
        self.static_files.as_ref()
    }

    pub fn authorization(&self) -> Option<&AuthorizationPredicate> {
        self.authorization.as_ref()
    }

    /// Checks every captured path parameter against its configured
    /// `name -> regex` constraint, if one was registered for it.
    pub fn check_constraints(&self, params: &[(String, String)]) -> Result<(), RouterError> {
        for (name, value) in params {
            if let Some(pattern) = self.constraints.get(name) {
                if !pattern.is_match(value) {
                    return Err(RouterError::ConstraintFailed {
                        name: name.clone(),
                        value: value.clone(),
                        pattern: pattern.as_str().to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let route = Route::new("home", "/", "index");
        assert_eq!(route.methods(), &[Method::Get]);
        assert!(route.anti_csrf_check_enabled());
        assert!(route.authorization().is_none());
    }

    #[test]
    fn constraint_pass_and_fail() {
        let route = Route::new("show_user", "/users/:id", "users#show")
            .with_constraint("id", Regex::new(r"^\d+$").unwrap());
        assert!(route
            .check_constraints(&[("id".to_string(), "42".to_string())])
            .is_ok());
        assert!(route
            .check_constraints(&[("id".to_string(), "abc".to_string())])
            .is_err());
    }

    #[test]
    fn unconstrained_param_always_passes() {
        let route = Route::new("show", "/things/:slug", "things#show");
        assert!(route
            .check_constraints(&[("slug".to_string(), "anything-goes".to_string())])
            .is_ok());
    }
}
