use std::fmt;

/// A hierarchical permission string such as `printer:print,query:epsoncolor`
/// (spec.md §4.3). Colons separate levels of specificity; commas within a
/// level list alternative sub-parts, any one of which satisfies that level.
/// `*` at a level matches anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    raw: String,
    parts: Vec<Vec<String>>,
}

const WILDCARD: &str = "*";

impl Permission {
    pub fn parse(raw: &str) -> Self {
        let parts = raw
            .split(':')
            .map(|level| level.split(',').map(str::to_string).collect())
            .collect();
        Self {
            raw: raw.to_string(),
            parts,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// `self` implies `required` if, for every level of `required`,
    /// `self`'s corresponding level is a wildcard or is a superset of
    /// `required`'s sub-parts at that level (a missing trailing level
    /// in `self` is treated as `*`).
    pub fn implies(&self, required: &Permission) -> bool {
        for (i, required_level) in required.parts.iter().enumerate() {
            match self.parts.get(i) {
                None => continue, // self ran out of levels: treat as wildcard
                Some(self_level) => {
                    if self_level.iter().any(|p| p == WILDCARD) {
                        continue;
                    }
                    let covers = required_level.iter().all(|r| self_level.contains(r));
                    if !covers {
                        return false;
                    }
                }
            }
        }
        true
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
