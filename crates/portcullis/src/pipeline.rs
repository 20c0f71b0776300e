use crate::error::Error;
use portcullis_auth::{AuthScheme, Authenticator, Authorizer, AuthError, Credentials};
use portcullis_core::Request;
use portcullis_csrf::{AntiCsrfGuard, SECRET_LEN};
use portcullis_http::Method;
use portcullis_router::{
    evaluate_preflight, validate_content_type, AuthorizationPredicate, CorsOverride, DomainRegistry, PreflightHeaders,
    Principal, Resolution, Route,
};
use portcullis_sessions::{Session, SessionManager};
use std::collections::HashMap;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

const CSRF_SECRET_SESSION_KEY: &str = "__anti_csrf_secret";

#[derive(Debug)]
struct SchemeEntry {
    scheme: AuthScheme,
    authenticator: Arc<dyn Authenticator>,
}

/// A fully dispatched request: the matched route, its captured and
/// constraint-checked path parameters, the authenticated principal (if
/// the route carries an `auth_scheme`), the loaded session, and a
/// freshly-rendered Anti-CSRF token ready to embed in the response
/// (spec.md §2, §5).
#[derive(Debug)]
pub struct Dispatch<'a> {
    pub route: &'a Route,
    pub params: Vec<(String, String)>,
    pub principal: Option<Box<dyn Principal>>,
    pub session: Session,
    pub csrf_token: Option<String>,
}

/// The result of running the pipeline up through routing.
#[derive(Debug)]
pub enum Outcome<'a> {
    Dispatch(Dispatch<'a>),
    /// The path matched a different trailing-slash variant of itself;
    /// the caller should issue a redirect to that variant.
    Redirect,
    /// A CORS preflight `OPTIONS` request was validated; the caller
    /// should answer 200 with these headers and skip the rest of the
    /// pipeline entirely (spec.md §4.2, §6).
    Preflight(PreflightHeaders),
}

/// The fixed per-request security pipeline (spec.md §2, §5): resolve a
/// route, load the session, enforce Anti-CSRF on unsafe methods,
/// authenticate and authorize, and hand back everything a handler
/// needs. Built once at startup from a [`DomainRegistry`] and
/// [`SessionManager`]; immutable thereafter, mirroring the registry's
/// own build-once-then-swap lifecycle.
#[derive(Debug)]
pub struct Pipeline {
    domain_registry: DomainRegistry,
    session_manager: SessionManager,
    csrf_guard: AntiCsrfGuard,
    schemes: HashMap<String, SchemeEntry>,
    authorizer: Option<Arc<dyn Authorizer>>,
    trailing_slash_redirect: bool,
    method_not_allowed_enabled: bool,
}

impl Pipeline {
    pub fn new(domain_registry: DomainRegistry, session_manager: SessionManager) -> Self {
        Self {
            domain_registry,
            session_manager,
            csrf_guard: AntiCsrfGuard::new(),
            schemes: HashMap::new(),
            authorizer: None,
            trailing_slash_redirect: true,
            method_not_allowed_enabled: false,
        }
    }

    pub fn with_csrf_guard(mut self, guard: AntiCsrfGuard) -> Self {
        self.csrf_guard = guard;
        self
    }

    pub fn with_trailing_slash_redirect(mut self, enabled: bool) -> Self {
        self.trailing_slash_redirect = enabled;
        self
    }

    /// Controls the boundary case named in spec.md §9: a domain that
    /// has this enabled reports 405 with `Allow` for a registered path
    /// hit with an unregistered method; otherwise it reports a plain
    /// 404, matching the later of the two disagreeing source revisions.
    pub fn with_method_not_allowed(mut self, enabled: bool) -> Self {
        self.method_not_allowed_enabled = enabled;
        self
    }

    /// Registers the [`AuthScheme`] and [`Authenticator`] that back a
    /// route's `auth_scheme` name (see `Route::with_auth_scheme`).
    pub fn register_scheme(
        mut self,
        name: impl Into<String>,
        scheme: AuthScheme,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        self.schemes.insert(name.into(), SchemeEntry { scheme, authenticator });
        self
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    /// Runs the full pipeline for one request: route resolution, path
    /// constraint checks, session load, Anti-CSRF enforcement,
    /// authentication, and authorization, in that order (spec.md §2).
    pub fn dispatch(
        &self,
        request: &Request,
        form_fields: &[(String, String)],
    ) -> Result<Outcome<'_>, Error> {
        let host = request.host();
        let path = request.path();
        let method = request.method();
        let headers = request.headers();

        let resolution = self
            .domain_registry
            .resolve(&host, path, method, headers, self.trailing_slash_redirect);

        let (route, params) = match resolution {
            Resolution::Route { route, params } => (route, params),
            Resolution::Redirect => return Ok(Outcome::Redirect),
            Resolution::NoMatchingDomain => return Err(Error::NotFound),
            Resolution::NotFound => {
                let allowed = self.domain_registry.allowed_methods(&host, path);
                if self.method_not_allowed_enabled && !allowed.is_empty() {
                    return Err(Error::MethodNotAllowed(allowed));
                }
                return Err(Error::NotFound);
            }
        };

        if method == Method::Options && self.domain_registry.cors_enabled(&host) {
            let default_policy = CorsOverride::default();
            let policy = route.cors().unwrap_or(&default_policy);
            let origin = request.header("origin");
            let requested_method = request.header("access-control-request-method").and_then(|v| v.parse().ok());
            let requested_headers = request.header("access-control-request-headers");
            let preflight = evaluate_preflight(policy, origin, requested_method, requested_headers)?;
            return Ok(Outcome::Preflight(preflight));
        }

        route.check_constraints(&params)?;

        if self.domain_registry.cors_enabled(&host) && request.header("origin").is_some() {
            let default_policy = CorsOverride::default();
            let policy = route.cors().unwrap_or(&default_policy);
            validate_content_type(policy, request.header("content-type"))?;
        }

        let cookie_value = parse_cookie_header(request.header("cookie"), self.session_manager.cookie_name());
        let mut session = self.session_manager.load(cookie_value.as_deref())?;

        if route.anti_csrf_check_enabled() {
            let secret = self.csrf_secret(&mut session);
            self.csrf_guard
                .guard(method, headers, form_fields, request.scheme(), &host, &secret)?;
        }

        let principal = match route.auth_scheme() {
            Some(scheme_name) => Some(self.authenticate(scheme_name, request, form_fields)?),
            None => None,
        };

        if let Some(predicate) = route.authorization() {
            self.authorize(predicate, principal.as_deref())?;
        }

        let csrf_token = route
            .anti_csrf_check_enabled()
            .then(|| self.csrf_guard.reissue(&self.csrf_secret(&mut session)));

        Ok(Outcome::Dispatch(Dispatch {
            route,
            params,
            principal,
            session,
            csrf_token,
        }))
    }

    /// Persists a session after the handler has run (flushing unread
    /// flash entries), returning the cookie value to send back, if any
    /// (spec.md §4.5's `unmodified_empty_session_saves_nothing` rule).
    pub fn finish(&self, session: Session) -> Result<Option<String>, Error> {
        Ok(self.session_manager.save(session)?)
    }

    fn authenticate(
        &self,
        scheme_name: &str,
        request: &Request,
        form_fields: &[(String, String)],
    ) -> Result<Box<dyn Principal>, Error> {
        let entry = self
            .schemes
            .get(scheme_name)
            .ok_or_else(|| AuthError::AuthenticatorNil(scheme_name.to_string()))?;
        let credentials = self.extract_credentials(&entry.scheme, request, form_fields)?;
        Ok(entry.authenticator.authenticate(&credentials)?)
    }

    fn extract_credentials(
        &self,
        scheme: &AuthScheme,
        request: &Request,
        form_fields: &[(String, String)],
    ) -> Result<Credentials, Error> {
        match scheme {
            AuthScheme::Form {
                username_field,
                password_field,
                ..
            } => {
                let username = field(form_fields, username_field).ok_or(AuthError::AuthenticationFailed)?;
                let password = field(form_fields, password_field).ok_or(AuthError::AuthenticationFailed)?;
                Ok(Credentials::Form {
                    username: username.to_string(),
                    password: password.to_string(),
                })
            }
            AuthScheme::Basic { .. } => {
                let header = request.header("authorization").ok_or(AuthError::AuthenticationFailed)?;
                Ok(AuthScheme::decode_basic_header(header)?)
            }
            AuthScheme::ApiBearer { header_name, .. } => {
                let value = request.header(header_name).ok_or(AuthError::AuthenticationFailed)?;
                if header_name.eq_ignore_ascii_case("authorization") {
                    Ok(AuthScheme::decode_bearer_header(value)?)
                } else {
                    Ok(Credentials::Bearer { token: value.to_string() })
                }
            }
            AuthScheme::Oauth2 { state_binder, .. } => {
                let query = parse_query_pairs(request.query());
                let state = query.iter().find(|(k, _)| k == "state").map(|(_, v)| v.as_str());
                let code = query.iter().find(|(k, _)| k == "code").map(|(_, v)| v.as_str());
                let (state, code) = portcullis_auth::require_callback_params(state, code)?;
                state_binder.verify(&state)?;
                Ok(Credentials::Oauth2Callback { state, code })
            }
        }
    }

    fn authorize(&self, predicate: &AuthorizationPredicate, principal: Option<&dyn Principal>) -> Result<(), Error> {
        match principal {
            Some(principal) if predicate.is_satisfied(principal) => Ok(()),
            Some(principal) => {
                if let Err(reason) = predicate.explain(principal) {
                    log::debug!("{reason}");
                }
                Err(Error::Auth(AuthError::AuthorizationDenied))
            }
            None => Err(Error::Auth(AuthError::AuthorizationDenied)),
        }
    }

    /// Reads the per-session Anti-CSRF secret, minting and storing one
    /// on first use (spec.md §4.7). Stored base64-encoded since
    /// [`Session`] values are JSON.
    fn csrf_secret(&self, session: &mut Session) -> [u8; SECRET_LEN] {
        if let Some(encoded) = session.get(CSRF_SECRET_SESSION_KEY).and_then(|v| v.as_str()) {
            if let Ok(bytes) = BASE64.decode(encoded) {
                if let Ok(secret) = <[u8; SECRET_LEN]>::try_from(bytes.as_slice()) {
                    return secret;
                }
            }
        }
        let (secret, _) = self.csrf_guard.issue();
        session.insert(CSRF_SECRET_SESSION_KEY, BASE64.encode(secret));
        secret
    }
}

fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
    fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
}

/// Parses `a=1; b=2` request-cookie-header syntax and returns the
/// value for `name`, if present.
fn parse_cookie_header(header: Option<&str>, name: &str) -> Option<String> {
    let header = header?;
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Parses a `key=value&key=value` query string without percent-decoding
/// (this core never terminates TLS or parses bodies; the host server
/// owns full URL decoding).
fn parse_query_pairs(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use portcullis_auth::{BcryptEncoder, PasswordEncoderRegistry, SchemeBase};
    use portcullis_cookies::{CookieCodec, KeyRing};
    use portcullis_http::{Headers, Method};
    use portcullis_router::{Permission, Route, RouterError};

    #[derive(Debug)]
    struct StubPrincipal {
        roles: Vec<String>,
        permissions: Vec<Permission>,
    }

    impl Principal for StubPrincipal {
        fn roles(&self) -> &[String] {
            &self.roles
        }
        fn permissions(&self) -> &[Permission] {
            &self.permissions
        }
    }

    #[derive(Debug)]
    struct StubAuthenticator {
        encoders: Arc<PasswordEncoderRegistry>,
        stored_hash: String,
    }

    impl Authenticator for StubAuthenticator {
        fn authenticate(&self, credentials: &Credentials) -> Result<Box<dyn Principal>, AuthError> {
            match credentials {
                Credentials::Form { username, password } if username == "alice" => {
                    if self
                        .encoders
                        .verify(password, &self.stored_hash)
                        .map_err(|_| AuthError::AuthenticationFailed)?
                    {
                        Ok(Box::new(StubPrincipal {
                            roles: vec!["admin".to_string()],
                            permissions: vec![],
                        }))
                    } else {
                        Err(AuthError::AuthenticationFailed)
                    }
                }
                _ => Err(AuthError::AuthenticationFailed),
            }
        }
    }

    fn pipeline() -> Pipeline {
        let mut registry = DomainRegistry::new();
        registry
            .add_route(
                "example.com",
                true,
                Route::new("home", "/", "home#index").without_anti_csrf_check(),
            )
            .unwrap();
        registry
            .add_route(
                "example.com",
                true,
                Route::new("login", "/login", "sessions#create")
                    .with_methods([Method::Post])
                    .with_auth_scheme("web")
                    .without_anti_csrf_check(),
            )
            .unwrap();
        registry.build();

        let codec = CookieCodec::new(KeyRing::new(vec![4u8; 32]));
        let session_manager = SessionManager::cookie_store(codec);

        let encoders = Arc::new(PasswordEncoderRegistry::new().register(Box::new(BcryptEncoder::new().with_cost(4))));
        let stored_hash = encoders.hash("welcome123").unwrap();

        Pipeline::new(registry, session_manager).register_scheme(
            "web",
            AuthScheme::Form {
                base: SchemeBase::new("web"),
                username_field: "username".to_string(),
                password_field: "password".to_string(),
                encoders: encoders.clone(),
            },
            Arc::new(StubAuthenticator { encoders, stored_hash }),
        )
    }

    fn request(method: Method, path: &str) -> Request {
        let mut headers = Headers::new();
        headers.insert("host", "example.com");
        Request::new(method, path, headers)
    }

    #[test]
    fn dispatches_home_route_with_a_fresh_session() {
        let pipeline = pipeline();
        let outcome = pipeline.dispatch(&request(Method::Get, "/"), &[]).unwrap();
        match outcome {
            Outcome::Dispatch(dispatch) => {
                assert_eq!(dispatch.route.name(), "home");
                assert!(dispatch.principal.is_none());
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn unknown_path_is_not_found() {
        let pipeline = pipeline();
        let err = pipeline.dispatch(&request(Method::Get, "/nope"), &[]).unwrap_err();
        assert!(matches!(err, Error::NotFound));
    }

    #[test]
    fn form_login_with_correct_password_authenticates() {
        let pipeline = pipeline();
        let fields = vec![
            ("username".to_string(), "alice".to_string()),
            ("password".to_string(), "welcome123".to_string()),
        ];
        let outcome = pipeline.dispatch(&request(Method::Post, "/login"), &fields).unwrap();
        match outcome {
            Outcome::Dispatch(dispatch) => {
                let principal = dispatch.principal.expect("authenticated");
                assert!(principal.has_role("admin"));
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn form_login_with_wrong_password_fails_authentication() {
        let pipeline = pipeline();
        let fields = vec![
            ("username".to_string(), "alice".to_string()),
            ("password".to_string(), "welcome@123".to_string()),
        ];
        let err = pipeline
            .dispatch(&request(Method::Post, "/login"), &fields)
            .unwrap_err();
        assert!(matches!(err, Error::Auth(AuthError::AuthenticationFailed)));
    }

    #[test]
    fn session_round_trips_across_dispatch_and_finish() {
        let pipeline = pipeline();
        let outcome = pipeline.dispatch(&request(Method::Get, "/"), &[]).unwrap();
        let Outcome::Dispatch(mut dispatch) = outcome else { panic!() };
        dispatch.session.insert("visits", 1);
        let cookie = pipeline.finish(dispatch.session).unwrap().unwrap();

        let mut headers = Headers::new();
        headers.insert("host", "example.com");
        headers.insert("cookie", format!("{}={cookie}", pipeline.session_manager.cookie_name()));
        let req = Request::new(Method::Get, "/", headers);

        let outcome = pipeline.dispatch(&req, &[]).unwrap();
        let Outcome::Dispatch(dispatch) = outcome else { panic!() };
        assert_eq!(dispatch.session.get("visits").unwrap(), 1);
    }

    #[test]
    fn parses_named_cookie_out_of_the_cookie_header() {
        let header = "a=1; portcullis.session=abc123; b=2";
        assert_eq!(
            parse_cookie_header(Some(header), "portcullis.session"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn options_preflight_on_a_cors_enabled_domain_short_circuits_the_pipeline() {
        let mut registry = DomainRegistry::new();
        registry
            .add_route(
                "example.com",
                true,
                Route::new("widgets", "/widgets", "widgets#index")
                    .with_methods([Method::Get, Method::Options])
                    .with_cors(CorsOverride {
                        allow_origins: vec!["https://app.example.com".to_string()],
                        allow_methods: vec![Method::Get],
                        ..Default::default()
                    })
                    .without_anti_csrf_check(),
            )
            .unwrap();
        registry.enable_cors("example.com", true);
        registry.build();

        let codec = CookieCodec::new(KeyRing::new(vec![4u8; 32]));
        let pipeline = Pipeline::new(registry, SessionManager::cookie_store(codec));

        let mut headers = Headers::new();
        headers.insert("host", "example.com");
        headers.insert("origin", "https://app.example.com");
        headers.insert("access-control-request-method", "GET");
        let request = Request::new(Method::Options, "/widgets", headers);

        let outcome = pipeline.dispatch(&request, &[]).unwrap();
        match outcome {
            Outcome::Preflight(preflight) => {
                assert_eq!(preflight.allow_origin, "https://app.example.com");
                assert_eq!(preflight.allow_methods, vec![Method::Get]);
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn options_preflight_from_a_disallowed_origin_is_rejected() {
        let mut registry = DomainRegistry::new();
        registry
            .add_route(
                "example.com",
                true,
                Route::new("widgets", "/widgets", "widgets#index")
                    .with_methods([Method::Get, Method::Options])
                    .with_cors(CorsOverride {
                        allow_origins: vec!["https://app.example.com".to_string()],
                        allow_methods: vec![Method::Get],
                        ..Default::default()
                    })
                    .without_anti_csrf_check(),
            )
            .unwrap();
        registry.enable_cors("example.com", true);
        registry.build();

        let codec = CookieCodec::new(KeyRing::new(vec![4u8; 32]));
        let pipeline = Pipeline::new(registry, SessionManager::cookie_store(codec));

        let mut headers = Headers::new();
        headers.insert("host", "example.com");
        headers.insert("origin", "https://evil.example");
        let request = Request::new(Method::Options, "/widgets", headers);

        let err = pipeline.dispatch(&request, &[]).unwrap_err();
        assert!(matches!(err, Error::Router(RouterError::CorsOriginInvalid(_))));
    }

    #[test]
    fn parses_query_pairs() {
        let pairs = parse_query_pairs("state=xyz&code=abc");
        assert_eq!(pairs, vec![("state".to_string(), "xyz".to_string()), ("code".to_string(), "abc".to_string())]);
    }
}
