use crate::permission::Permission;
use std::fmt;

/// The subject an [`AuthorizationPredicate`] is evaluated against.
/// Implemented by whatever the authentication layer produces for an
/// authenticated request (spec.md §4.6 hands this back to §4.3).
pub trait Principal {
    fn roles(&self) -> &[String];
    fn permissions(&self) -> &[Permission];

    fn has_role(&self, role: &str) -> bool {
        self.roles().iter().any(|r| r == role)
    }

    fn is_permitted(&self, required: &Permission) -> bool {
        self.permissions().iter().any(|held| held.implies(required))
    }
}

/// A boolean expression over an authenticated principal's roles and
/// permissions (spec.md §4.3): `hasRole`/`hasAnyRole`/`hasAllRoles`,
/// `isPermitted`/`isPermittedAll`, and the `either`/`both` combinators.
#[derive(Debug, Clone)]
pub enum AuthorizationPredicate {
    HasRole(String),
    HasAnyRole(Vec<String>),
    HasAllRoles(Vec<String>),
    IsPermitted(Permission),
    IsPermittedAll(Vec<Permission>),
    Either(Box<AuthorizationPredicate>, Box<AuthorizationPredicate>),
    Both(Box<AuthorizationPredicate>, Box<AuthorizationPredicate>),
}

impl AuthorizationPredicate {
    pub fn either(a: AuthorizationPredicate, b: AuthorizationPredicate) -> Self {
        Self::Either(Box::new(a), Box::new(b))
    }

    pub fn both(a: AuthorizationPredicate, b: AuthorizationPredicate) -> Self {
        Self::Both(Box::new(a), Box::new(b))
    }

    pub fn is_satisfied(&self, principal: &dyn Principal) -> bool {
        match self {
            Self::HasRole(role) => principal.has_role(role),
            Self::HasAnyRole(roles) => roles.iter().any(|r| principal.has_role(r)),
            Self::HasAllRoles(roles) => roles.iter().all(|r| principal.has_role(r)),
            Self::IsPermitted(perm) => principal.is_permitted(perm),
            Self::IsPermittedAll(perms) => perms.iter().all(|p| principal.is_permitted(p)),
            Self::Either(a, b) => a.is_satisfied(principal) || b.is_satisfied(principal),
            Self::Both(a, b) => a.is_satisfied(principal) && b.is_satisfied(principal),
        }
    }

    /// Evaluates the predicate and, on denial, returns a human-readable
    /// reason naming the unmet clause — used for debug logging, never
    /// sent to the client (spec.md §4.3).
    pub fn explain(&self, principal: &dyn Principal) -> Result<(), String> {
        if self.is_satisfied(principal) {
            Ok(())
        } else {
            Err(format!("denied: principal did not satisfy `{self}`"))
        }
    }
}

impl fmt::Display for AuthorizationPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HasRole(r) => write!(f, "hasRole({r})"),
            Self::HasAnyRole(rs) => write!(f, "hasAnyRole({})", rs.join(", ")),
            Self::HasAllRoles(rs) => write!(f, "hasAllRoles({})", rs.join(", ")),
            Self::IsPermitted(p) => write!(f, "isPermitted({p})"),
            Self::IsPermittedAll(ps) => {
                let joined = ps.iter().map(Permission::to_string).collect::<Vec<_>>().join(", ");
                write!(f, "isPermittedAll({joined})")
            }
            Self::Either(a, b) => write!(f, "({a} || {b})"),
            Self::Both(a, b) => write!(f, "({a} && {b})"),
        }
    }
}
