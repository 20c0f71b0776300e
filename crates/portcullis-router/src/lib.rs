#![forbid(unsafe_code)]
#![deny(missing_debug_implementations, nonstandard_style)]

/*!
# portcullis-router

The multi-domain radix route tree, domain registry, and authorization
predicate (spec.md §3, §4.1, §4.2, §4.3): the part of the pipeline that
decides *which* route a request hits and whether the authenticated
principal is allowed to reach it.

Registries are immutable once [`DomainRegistry::build`] has run; a
configuration reload builds a fresh [`DomainRegistry`] and the host
swaps it in behind an `Arc`, rather than mutating routes under a lock
while requests are in flight.
*/

mod cors;
mod domain;
mod error;
mod permission;
mod predicate;
mod route;
mod tree;

pub use cors::{evaluate_preflight, validate_content_type, PreflightHeaders};
pub use domain::{DomainRegistry, Resolution};
pub use error::RouterError;
pub use permission::Permission;
pub use predicate::{AuthorizationPredicate, Principal};
pub use route::{CorsOverride, Route, StaticFiles};
pub use tree::{Matched, Tree};
