use crate::error::RouterError;
use crate::route::Route;
use crate::tree::{Matched, Tree};
use portcullis_http::{Headers, Method};
use portcullis_method_override::MethodOverride;
use std::collections::HashMap;

/// One virtual host's set of route trees, one per method (spec.md §4.1).
#[derive(Debug)]
struct Domain {
    /// Lowercased `host[:port]`, or a `*.base` wildcard pattern.
    pattern: String,
    is_wildcard: bool,
    is_root: bool,
    cors_enabled: bool,
    trees: HashMap<Method, Tree<Route>>,
    /// name -> Route, for reverse URL construction (spec.md §3).
    by_name: HashMap<String, Route>,
    built: bool,
}

impl Domain {
    fn new(pattern: &str, is_root: bool) -> Self {
        let lowered = pattern.to_ascii_lowercase();
        let is_wildcard = lowered.starts_with("*.");
        Self {
            pattern: lowered,
            is_wildcard,
            is_root,
            cors_enabled: false,
            trees: HashMap::new(),
            by_name: HashMap::new(),
            built: false,
        }
    }

    fn matches_host(&self, host: &str) -> bool {
        if self.is_wildcard {
            let base = &self.pattern[1..]; // keep the leading '.'
            host.ends_with(base) && host.len() > base.len()
        } else {
            self.pattern == host
        }
    }

    fn add(&mut self, route: Route) -> Result<(), RouterError> {
        for method in route.methods() {
            let tree = self.trees.entry(*method).or_insert_with(Tree::new);
            tree.add(route.path(), route.clone())?;
        }
        self.by_name.insert(route.name().to_string(), route);
        self.built = false;
        Ok(())
    }

    fn build(&mut self) {
        for tree in self.trees.values_mut() {
            tree.build();
        }
        self.built = true;
    }

    fn route_by_name(&self, name: &str) -> Option<&Route> {
        self.by_name.get(name)
    }
}

/// The result of resolving a request against the [`DomainRegistry`].
#[derive(Debug)]
pub enum Resolution<'a> {
    Route {
        route: &'a Route,
        params: Vec<(String, String)>,
    },
    /// The tree has this path registered under a different trailing slash.
    Redirect,
    /// The domain matched but no tree held the path for the effective method.
    NotFound,
    /// No [`Domain`] matched the request's host at all.
    NoMatchingDomain,
}

/// Holds every registered [`Domain`], keyed by lowercased host[:port],
/// and resolves an incoming request to a route (spec.md §4.1/§4.2).
///
/// Registries are built once at startup and never mutated afterward;
/// a configuration reload builds a fresh registry and atomically swaps
/// it in, rather than mutating routes in place under a lock.
#[derive(Debug, Default)]
pub struct DomainRegistry {
    domains: Vec<Domain>,
    root_domain: Option<usize>,
    method_override: MethodOverride,
}

impl DomainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `route` under `host_pattern` (a literal `host[:port]` or
    /// a `*.base` wildcard). The first domain registered with
    /// `is_root = true` becomes the fallback used when no host header
    /// is present or no pattern matches (spec.md §4.1).
    pub fn add_route(
        &mut self,
        host_pattern: &str,
        is_root: bool,
        route: Route,
    ) -> Result<(), RouterError> {
        let idx = self.domain_index(host_pattern, is_root);
        self.domains[idx].add(route)
    }

    fn domain_index(&mut self, host_pattern: &str, is_root: bool) -> usize {
        match self
            .domains
            .iter()
            .position(|d| d.pattern == host_pattern.to_ascii_lowercase())
        {
            Some(idx) => idx,
            None => {
                self.domains.push(Domain::new(host_pattern, is_root));
                let idx = self.domains.len() - 1;
                if is_root {
                    self.root_domain = Some(idx);
                }
                idx
            }
        }
    }

    /// Enables CORS preflight handling for `host_pattern`'s domain
    /// (spec.md §3's per-domain CORS-enablement boolean), creating the
    /// domain if it hasn't been registered yet.
    pub fn enable_cors(&mut self, host_pattern: &str, is_root: bool) {
        let idx = self.domain_index(host_pattern, is_root);
        self.domains[idx].cors_enabled = true;
    }

    /// Whether `host`'s domain has CORS preflight handling enabled.
    pub fn cors_enabled(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.select_domain(&host).is_some_and(|d| d.cors_enabled)
    }

    /// Must be called once after every route has been added.
    pub fn build(&mut self) {
        for domain in &mut self.domains {
            domain.build();
        }
    }

    /// Reconstructs the path for the route named `name` on `host`'s
    /// domain, substituting `params` into its `:name`/`*name`
    /// segments (spec.md §2 and §3's "reverse URL construction").
    pub fn url_for(&self, host: &str, name: &str, params: &[(&str, &str)]) -> Result<String, RouterError> {
        let host = host.to_ascii_lowercase();
        let domain = self
            .select_domain(&host)
            .ok_or_else(|| RouterError::UnknownRouteName(name.to_string()))?;
        let route = domain
            .route_by_name(name)
            .ok_or_else(|| RouterError::UnknownRouteName(name.to_string()))?;
        reverse_path(route.path(), name, params)
    }

    fn select_domain(&self, host: &str) -> Option<&Domain> {
        if self.domains.len() == 1 {
            // spec.md §4.1: a registry with exactly one domain matches
            // unconditionally, regardless of the request's Host header.
            return self.domains.first();
        }
        self.domains
            .iter()
            .find(|d| !d.is_wildcard && d.matches_host(host))
            .or_else(|| self.domains.iter().find(|d| d.is_wildcard && d.matches_host(host)))
            .or_else(|| self.root_domain.map(|i| &self.domains[i]))
    }

    /// Resolves `host`/`path`/`method` to a route, applying method
    /// override and trailing-slash redirect detection.
    pub fn resolve<'a>(
        &'a self,
        host: &str,
        path: &str,
        method: Method,
        headers: &Headers,
        trailing_slash_redirect: bool,
    ) -> Resolution<'a> {
        let host = host.to_ascii_lowercase();
        let domain = match self.select_domain(&host) {
            Some(d) => d,
            None => return Resolution::NoMatchingDomain,
        };

        let effective_method = self.method_override.effective_method(method, headers);
        let tree = match domain.trees.get(&effective_method) {
            Some(t) => t,
            None => return Resolution::NotFound,
        };

        match tree.lookup(path, trailing_slash_redirect) {
            Matched::Route { value, params } => Resolution::Route { route: value, params },
            Matched::Redirect => Resolution::Redirect,
            Matched::NotFound => Resolution::NotFound,
        }
    }

    /// Enumerates the methods allowed for `path` on `host`, across all
    /// of that domain's trees — used to populate the `Allow` header on
    /// a 405 response and to answer CORS preflight (spec.md §4.2).
    pub fn allowed_methods(&self, host: &str, path: &str) -> Vec<Method> {
        let host = host.to_ascii_lowercase();
        let Some(domain) = self.select_domain(&host) else {
            return Vec::new();
        };
        let mut methods: Vec<Method> = domain
            .trees
            .iter()
            .filter(|(_, tree)| matches!(tree.lookup(path, false), Matched::Route { .. }))
            .map(|(method, _)| *method)
            .collect();
        methods.sort();
        methods
    }
}

/// Substitutes `params` into `template`'s `:name`/`*name` segments, in
/// path order, leaving static segments untouched.
fn reverse_path(template: &str, route_name: &str, params: &[(&str, &str)]) -> Result<String, RouterError> {
    let mut out = String::new();
    for segment in template.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        match segment.strip_prefix(':').or_else(|| segment.strip_prefix('*')) {
            Some(param_name) => {
                let value = params
                    .iter()
                    .find(|(k, _)| *k == param_name)
                    .map(|(_, v)| *v)
                    .ok_or_else(|| RouterError::MissingReverseParam {
                        route: route_name.to_string(),
                        param: param_name.to_string(),
                    })?;
                out.push_str(value);
            }
            None => out.push_str(segment),
        }
    }
    if out.is_empty() {
        out.push('/');
    }
    Ok(out)
}
