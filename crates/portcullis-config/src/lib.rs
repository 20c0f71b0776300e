#![forbid(unsafe_code)]
#![deny(missing_debug_implementations, nonstandard_style)]

/*!
# portcullis-config

A typed TOML configuration tree for the routing and security sections
(spec.md §6). This is the concrete implementation of the "typed
key-value tree with profiles" the core's design leaves abstract --
nothing downstream of [`Config::load`] depends on TOML specifically.
*/

mod profile;
mod routing;
mod security;

pub use profile::Profile;
pub use routing::{DomainConfig, RouteConfig, RoutingConfig};
pub use security::{AuthSchemeConfig, CookieKeysConfig, CsrfConfig, SecurityConfig, SessionConfig};

use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {0:?}: {1}")]
    Read(String, String),
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// The full parsed configuration document: `profile`, `[domains]`, and
/// `[security]` (spec.md §6).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub routing: RoutingConfig,
    pub security: SecurityConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.display().to_string(), e.to_string()))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
