use crate::error::CsrfError;
use crate::token::{self, SECRET_LEN};
use portcullis_http::{Headers, Method};
use url::Url;

/// Verifies state-changing requests against a per-session Anti-CSRF
/// secret, using the salted-token scheme in [`crate::token`] plus a
/// same-origin/referer check (spec.md §4.7).
///
/// Safe methods ([`Method::is_safe`]) are never checked: they must not
/// mutate state, so there is nothing for a forged request to achieve.
#[derive(Debug, Clone)]
pub struct AntiCsrfGuard {
    header_name: String,
    field_name: String,
    trusted_origins: Vec<String>,
    require_referer: bool,
}

impl Default for AntiCsrfGuard {
    fn default() -> Self {
        Self {
            header_name: "x-anti-csrf-token".to_string(),
            field_name: "_csrf_token".to_string(),
            trusted_origins: Vec::new(),
            require_referer: true,
        }
    }
}

impl AntiCsrfGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    pub fn with_field_name(mut self, name: impl Into<String>) -> Self {
        self.field_name = name.into();
        self
    }

    /// Registers `origin` (e.g. `https://app.example.com`) as a
    /// trusted source for state-changing requests, in addition to the
    /// request's own host (same-origin requests always pass).
    pub fn trust_origin(mut self, origin: impl Into<String>) -> Self {
        self.trusted_origins.push(origin.into());
        self
    }

    /// Disables the same-origin/referer check, leaving only token
    /// verification. Not recommended outside of API clients that
    /// never send a `Referer` header by design.
    pub fn without_referer_check(mut self) -> Self {
        self.require_referer = false;
        self
    }

    /// Pulls the candidate token out of the header first, then the
    /// named form field.
    pub fn extract_token<'a>(&self, headers: &'a Headers, form_fields: &'a [(String, String)]) -> Option<&'a str> {
        if let Some(value) = headers.get(&self.header_name) {
            return Some(value);
        }
        form_fields
            .iter()
            .find(|(k, _)| k == &self.field_name)
            .map(|(_, v)| v.as_str())
    }

    fn check_same_origin(&self, headers: &Headers, request_scheme: &str, request_host: &str) -> Result<(), CsrfError> {
        let raw = headers
            .get("origin")
            .or_else(|| headers.get("referer"))
            .ok_or(CsrfError::NoReferer)?;

        let parsed = Url::parse(raw).map_err(|_| CsrfError::BadReferer(raw.to_string()))?;
        let origin_host = parsed.host_str().unwrap_or_default();
        let same_origin = parsed.scheme() == request_scheme && origin_host == request_host;
        if same_origin {
            return Ok(());
        }

        let origin = format!("{}://{}", parsed.scheme(), origin_host);
        if self.trusted_origins.iter().any(|t| t == &origin || t == raw) {
            return Ok(());
        }

        Err(CsrfError::BadReferer(raw.to_string()))
    }

    /// Runs the full guard: a no-op for safe methods, otherwise a
    /// same-origin check (unless disabled) followed by token
    /// verification against `secret`.
    pub fn guard(
        &self,
        method: Method,
        headers: &Headers,
        form_fields: &[(String, String)],
        request_scheme: &str,
        request_host: &str,
        secret: &[u8; SECRET_LEN],
    ) -> Result<(), CsrfError> {
        if method.is_safe() {
            return Ok(());
        }

        if self.require_referer {
            self.check_same_origin(headers, request_scheme, request_host)?;
        }

        let candidate = self.extract_token(headers, form_fields).ok_or(CsrfError::NoCookie)?;
        if token::verify(secret, candidate) {
            Ok(())
        } else {
            Err(CsrfError::TokenMismatch)
        }
    }

    /// Generates a fresh per-session secret (store it, e.g., in the
    /// session) and a freshly-masked token for embedding in the next
    /// response.
    pub fn issue(&self) -> ([u8; SECRET_LEN], String) {
        let secret = token::generate_secret();
        let rendered = token::mask(&secret);
        (secret, rendered)
    }

    /// Re-masks an existing secret for a new response, without
    /// rotating the secret itself (used on every page render so each
    /// response's hidden field/header differs even within one session).
    pub fn reissue(&self, secret: &[u8; SECRET_LEN]) -> String {
        token::mask(secret)
    }
}
