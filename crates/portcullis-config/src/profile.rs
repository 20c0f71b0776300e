use serde::Deserialize;

/// Selects environment-appropriate defaults (spec.md §6's "typed
/// key-value tree with profiles") -- e.g. `Prod` forces the `secure`
/// flag on session/Anti-CSRF cookies regardless of what's written in
/// the document, since a misconfigured production deployment is worse
/// than an inflexible one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    Dev,
    Stage,
    Prod,
}

impl Profile {
    pub fn cookies_require_secure(self) -> bool {
        matches!(self, Profile::Stage | Profile::Prod)
    }

    pub fn default_log_level(self) -> &'static str {
        match self {
            Profile::Dev => "debug",
            Profile::Stage => "info",
            Profile::Prod => "warn",
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Profile::Dev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_stage_and_prod_require_secure_cookies() {
        assert!(!Profile::Dev.cookies_require_secure());
        assert!(Profile::Stage.cookies_require_secure());
        assert!(Profile::Prod.cookies_require_secure());
    }
}
