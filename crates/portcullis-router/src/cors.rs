use crate::error::RouterError;
use crate::route::CorsOverride;
use portcullis_http::Method;

/// The preflight response headers computed from a [`CorsOverride`]
/// against one `OPTIONS` request (spec.md §4.2, §6): "OPTIONS with
/// CORS enabled → 200 with preflight headers."
#[derive(Debug, Clone)]
pub struct PreflightHeaders {
    pub allow_origin: String,
    pub allow_methods: Vec<Method>,
    pub allow_headers: Vec<String>,
    pub expose_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age: Option<u64>,
}

fn origin_allowed(policy: &CorsOverride, origin: &str) -> bool {
    policy
        .allow_origins
        .iter()
        .any(|allowed| allowed == "*" || allowed.eq_ignore_ascii_case(origin))
}

/// Validates a CORS preflight `OPTIONS` request's `Origin`,
/// `Access-Control-Request-Method`, and `Access-Control-Request-Headers`
/// against `policy`, returning the headers to answer it with.
pub fn evaluate_preflight(
    policy: &CorsOverride,
    origin: Option<&str>,
    requested_method: Option<Method>,
    requested_headers: Option<&str>,
) -> Result<PreflightHeaders, RouterError> {
    let origin = origin.ok_or_else(|| RouterError::CorsOriginInvalid(String::new()))?;
    if !origin_allowed(policy, origin) {
        return Err(RouterError::CorsOriginInvalid(origin.to_string()));
    }

    if let Some(method) = requested_method {
        if !policy.allow_methods.is_empty() && !policy.allow_methods.contains(&method) {
            return Err(RouterError::CorsMethodNotAllowed(method));
        }
    }

    let requested: Vec<String> = requested_headers
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect();

    if !policy.allow_headers.is_empty() {
        for header in &requested {
            if !policy.allow_headers.iter().any(|h| h.eq_ignore_ascii_case(header)) {
                return Err(RouterError::CorsHeaderNotAllowed(header.clone()));
            }
        }
    }

    Ok(PreflightHeaders {
        allow_origin: origin.to_string(),
        allow_methods: if policy.allow_methods.is_empty() {
            requested_method.into_iter().collect()
        } else {
            policy.allow_methods.clone()
        },
        allow_headers: if policy.allow_headers.is_empty() {
            requested
        } else {
            policy.allow_headers.clone()
        },
        expose_headers: policy.expose_headers.clone(),
        allow_credentials: policy.allow_credentials,
        max_age: policy.max_age,
    })
}

/// Validates a non-preflight cross-origin request's `Content-Type`
/// against `policy`'s `allow_content_types`, if one is configured. An
/// empty allowlist, or no `Content-Type` at all, is unrestricted.
pub fn validate_content_type(policy: &CorsOverride, content_type: Option<&str>) -> Result<(), RouterError> {
    if policy.allow_content_types.is_empty() {
        return Ok(());
    }
    let Some(content_type) = content_type else {
        return Ok(());
    };
    let essence = content_type.split(';').next().unwrap_or(content_type).trim();
    if policy
        .allow_content_types
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(essence))
    {
        Ok(())
    } else {
        Err(RouterError::CorsContentTypeNotAllowed(essence.to_string()))
    }
}
