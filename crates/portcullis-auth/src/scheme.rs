use crate::encoder::PasswordEncoderRegistry;
use crate::error::AuthError;
use crate::oauth2::Oauth2StateBinder;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::sync::Arc;

/// Fields every [`AuthScheme`] variant carries (spec.md §4.6): a name
/// used to bind a route to this scheme (see `Route::with_auth_scheme`)
/// and an optional realm surfaced in a `WWW-Authenticate` challenge.
#[derive(Debug, Clone)]
pub struct SchemeBase {
    pub name: String,
    pub realm: Option<String>,
}

impl SchemeBase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            realm: None,
        }
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }
}

/// Credentials as extracted from a request, before verification.
#[derive(Debug, Clone)]
pub enum Credentials {
    Form { username: String, password: String },
    Basic { username: String, password: String },
    Bearer { token: String },
    Oauth2Callback { state: String, code: String },
}

/// A pluggable authentication scheme (spec.md §4.6): HTML form login,
/// HTTP Basic, API bearer tokens, or OAuth2 authorization-code. Each
/// variant shares [`SchemeBase`] but extracts credentials from the
/// request differently.
#[derive(Debug, Clone)]
pub enum AuthScheme {
    Form {
        base: SchemeBase,
        username_field: String,
        password_field: String,
        encoders: Arc<PasswordEncoderRegistry>,
    },
    Basic {
        base: SchemeBase,
        encoders: Arc<PasswordEncoderRegistry>,
    },
    ApiBearer {
        base: SchemeBase,
        header_name: String,
    },
    Oauth2 {
        base: SchemeBase,
        authorize_url: String,
        token_url: String,
        client_id: String,
        redirect_uri: String,
        state_binder: Oauth2StateBinder,
    },
}

impl AuthScheme {
    pub fn base(&self) -> &SchemeBase {
        match self {
            AuthScheme::Form { base, .. }
            | AuthScheme::Basic { base, .. }
            | AuthScheme::ApiBearer { base, .. }
            | AuthScheme::Oauth2 { base, .. } => base,
        }
    }

    pub fn name(&self) -> &str {
        &self.base().name
    }

    /// The `WWW-Authenticate` challenge value for schemes that use one.
    pub fn challenge(&self) -> Option<String> {
        match self {
            AuthScheme::Basic { base, .. } => Some(match &base.realm {
                Some(realm) => format!("Basic realm=\"{}\"", realm.replace('"', "\\\"")),
                None => "Basic".to_string(),
            }),
            _ => None,
        }
    }

    /// Decodes an `Authorization: Basic base64(user:pass)` header value.
    pub fn decode_basic_header(header_value: &str) -> Result<Credentials, AuthError> {
        let encoded = header_value
            .strip_prefix("Basic ")
            .ok_or(AuthError::AuthenticationFailed)?;
        let decoded = BASE64
            .decode(encoded)
            .map_err(|_| AuthError::AuthenticationFailed)?;
        let text = String::from_utf8(decoded).map_err(|_| AuthError::AuthenticationFailed)?;
        let (username, password) = text.split_once(':').ok_or(AuthError::AuthenticationFailed)?;
        Ok(Credentials::Basic {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Decodes an `Authorization: Bearer <token>` header value.
    pub fn decode_bearer_header(header_value: &str) -> Result<Credentials, AuthError> {
        header_value
            .strip_prefix("Bearer ")
            .map(|token| Credentials::Bearer { token: token.to_string() })
            .ok_or(AuthError::AuthenticationFailed)
    }

    /// Verifies a password-based credential (`Form`/`Basic`) against a
    /// stored PHC hash string, using this scheme's encoder registry.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> Result<bool, AuthError> {
        let encoders = match self {
            AuthScheme::Form { encoders, .. } | AuthScheme::Basic { encoders, .. } => encoders,
            _ => return Err(AuthError::AuthenticatorNil(self.name().to_string())),
        };
        encoders
            .verify(password, stored_hash)
            .map_err(|_| AuthError::AuthenticationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::BcryptEncoder;

    fn form_scheme() -> AuthScheme {
        AuthScheme::Form {
            base: SchemeBase::new("web"),
            username_field: "username".to_string(),
            password_field: "password".to_string(),
            encoders: Arc::new(PasswordEncoderRegistry::new().register(Box::new(BcryptEncoder::new().with_cost(4)))),
        }
    }

    #[test]
    fn basic_challenge_includes_realm() {
        let scheme = AuthScheme::Basic {
            base: SchemeBase::new("api").with_realm("rust"),
            encoders: Arc::new(PasswordEncoderRegistry::new()),
        };
        assert_eq!(scheme.challenge().as_deref(), Some("Basic realm=\"rust\""));
    }

    #[test]
    fn decodes_basic_header() {
        let header = format!("Basic {}", BASE64.encode("alice:secret"));
        let creds = AuthScheme::decode_basic_header(&header).unwrap();
        match creds {
            Credentials::Basic { username, password } => {
                assert_eq!(username, "alice");
                assert_eq!(password, "secret");
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn decodes_bearer_header() {
        let creds = AuthScheme::decode_bearer_header("Bearer abc123").unwrap();
        match creds {
            Credentials::Bearer { token } => assert_eq!(token, "abc123"),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn verify_password_round_trips_through_encoder_registry() {
        let scheme = form_scheme();
        let encoders = PasswordEncoderRegistry::new().register(Box::new(BcryptEncoder::new().with_cost(4)));
        let hash = encoders.hash("hunter2").unwrap();
        assert!(scheme.verify_password("hunter2", &hash).unwrap());
        assert!(!scheme.verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn bearer_scheme_cannot_verify_passwords() {
        let scheme = AuthScheme::ApiBearer {
            base: SchemeBase::new("api"),
            header_name: "authorization".to_string(),
        };
        assert!(scheme.verify_password("x", "$bcrypt$...").is_err());
    }
}
