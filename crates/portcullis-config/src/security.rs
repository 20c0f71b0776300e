use serde::Deserialize;
use std::collections::HashMap;

/// `[security.session]` (spec.md §6 / §4.5).
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_mode")]
    pub mode: String,
    #[serde(default = "default_session_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_session_ttl_secs")]
    pub ttl_secs: u64,
    pub store_dir: Option<String>,
}

fn default_session_mode() -> String {
    "server".to_string()
}

fn default_session_cookie_name() -> String {
    "portcullis.session".to_string()
}

fn default_session_ttl_secs() -> u64 {
    24 * 60 * 60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: default_session_mode(),
            cookie_name: default_session_cookie_name(),
            ttl_secs: default_session_ttl_secs(),
            store_dir: None,
        }
    }
}

/// One `[security.auth_schemes.<name>]` table (spec.md §6 / §4.6).
/// Tagged by `type` so form/basic/api_bearer/oauth2 can each carry
/// their own fields in the same table namespace.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthSchemeConfig {
    Form {
        username_field: Option<String>,
        password_field: Option<String>,
        encoder: Option<String>,
    },
    Basic {
        realm: Option<String>,
        encoder: Option<String>,
    },
    ApiBearer {
        header_name: Option<String>,
    },
    Oauth2 {
        authorize_url: String,
        token_url: String,
        client_id: String,
        redirect_uri: String,
        state_ttl_secs: Option<u64>,
    },
}

/// `[security.csrf]` (spec.md §6 / §4.7).
#[derive(Debug, Clone, Deserialize)]
pub struct CsrfConfig {
    #[serde(default = "default_csrf_header")]
    pub header_name: String,
    #[serde(default = "default_csrf_field")]
    pub field_name: String,
    #[serde(default)]
    pub trusted_origins: Vec<String>,
}

fn default_csrf_header() -> String {
    "X-Anti-CSRF-Token".to_string()
}

fn default_csrf_field() -> String {
    "_csrf_token".to_string()
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            header_name: default_csrf_header(),
            field_name: default_csrf_field(),
            trusted_origins: Vec::new(),
        }
    }
}

/// `[security.cookies]`: signing/encryption key material (spec.md §6 /
/// §4.4). Keys are base64-encoded in the document; the facade decodes
/// them when building a `CookieCodec`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CookieKeysConfig {
    pub signing_key_base64: String,
    pub previous_signing_key_base64: Option<String>,
    pub encryption_key_base64: Option<String>,
    pub previous_encryption_key_base64: Option<String>,
}

/// The top-level `[security]` table (spec.md §6).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SecurityConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub auth_schemes: HashMap<String, AuthSchemeConfig>,
    #[serde(default)]
    pub csrf: CsrfConfig,
    pub cookies: CookieKeysConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_form_and_oauth2_schemes() {
        let doc = r#"
            [cookies]
            signing_key_base64 = "c2VjcmV0"

            [auth_schemes.web]
            type = "form"

            [auth_schemes.sso]
            type = "oauth2"
            authorize_url = "https://provider.example/authorize"
            token_url = "https://provider.example/token"
            client_id = "abc123"
            redirect_uri = "https://app.example/callback"
        "#;
        let parsed: SecurityConfig = toml::from_str(doc).unwrap();
        assert_eq!(parsed.cookies.signing_key_base64, "c2VjcmV0");
        assert!(matches!(parsed.auth_schemes["web"], AuthSchemeConfig::Form { .. }));
        assert!(matches!(parsed.auth_schemes["sso"], AuthSchemeConfig::Oauth2 { .. }));
    }

    #[test]
    fn session_defaults_are_server_mode_one_day_ttl() {
        let session = SessionConfig::default();
        assert_eq!(session.mode, "server");
        assert_eq!(session.ttl_secs, 24 * 60 * 60);
    }
}
