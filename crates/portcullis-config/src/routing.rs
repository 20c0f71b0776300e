use serde::Deserialize;
use std::collections::HashMap;

/// A single `[domains.<name>.routes.<route_name>]` table (spec.md §6).
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    pub path: String,
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
    pub action: String,
    pub auth_scheme: Option<String>,
    pub max_body_size: Option<u64>,
    #[serde(default = "default_true")]
    pub anti_csrf: bool,
    #[serde(default)]
    pub constraints: HashMap<String, String>,
}

fn default_methods() -> Vec<String> {
    vec!["GET".to_string()]
}

fn default_true() -> bool {
    true
}

/// A `[domains.<name>.global]` + `[domains.<name>.routes.*]` document
/// fragment: one virtual host's routing table.
#[derive(Debug, Clone, Deserialize)]
pub struct DomainConfig {
    #[serde(default)]
    pub wildcard: bool,
    #[serde(default)]
    pub root: bool,
    #[serde(default)]
    pub routes: HashMap<String, RouteConfig>,
}

/// The top-level `[domains]` table (spec.md §6): one [`DomainConfig`]
/// per registered host pattern.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RoutingConfig {
    #[serde(default)]
    pub domains: HashMap<String, DomainConfig>,
}
