use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// The data carried by a single session (spec.md §4.5). Flash entries
/// are read-once: [`Session::take_flash`] removes the entry as it
/// returns it, so a value set on one request is visible only on the
/// very next request that reads it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Session {
    id: String,
    values: HashMap<String, Value>,
    flash: HashMap<String, Value>,
    expiry_unix_secs: i64,
    #[serde(skip)]
    dirty: bool,
}

impl Session {
    pub fn new(id: impl Into<String>, ttl: Option<Duration>) -> Self {
        Self {
            id: id.into(),
            values: HashMap::new(),
            flash: HashMap::new(),
            expiry_unix_secs: unix_secs_from_now(ttl.unwrap_or(Duration::from_secs(24 * 60 * 60))),
            dirty: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_expired(&self) -> bool {
        unix_secs_from_now(Duration::ZERO) > self.expiry_unix_secs
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.flash.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
        self.dirty = true;
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.values.remove(key);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    /// Stores a flash value, visible on the next request only.
    pub fn flash(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.flash.insert(key.into(), value.into());
        self.dirty = true;
    }

    /// Reads and clears a flash value in one step.
    pub fn take_flash(&mut self, key: &str) -> Option<Value> {
        let value = self.flash.remove(key);
        if value.is_some() {
            self.dirty = true;
        }
        value
    }

    pub fn renew_expiry(&mut self, ttl: Duration) {
        self.expiry_unix_secs = unix_secs_from_now(ttl);
        self.dirty = true;
    }

    /// The surviving flash keys are cleared once they've been carried
    /// across a single request/response cycle, per the pop-on-read
    /// flash semantics -- this is called by the manager right before
    /// persisting, for any flash entry the handler never read.
    pub(crate) fn expire_unread_flash(&mut self) {
        if !self.flash.is_empty() {
            self.flash.clear();
            self.dirty = true;
        }
    }
}

fn unix_secs_from_now(offset: Duration) -> i64 {
    (SystemTime::now() + offset)
        .duration_since(UNIX_EPOCH)
        .expect("system clock is after 1970")
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_is_readable_once() {
        let mut session = Session::new("abc", None);
        session.flash("notice", "saved");
        assert_eq!(session.take_flash("notice"), Some(Value::from("saved")));
        assert_eq!(session.take_flash("notice"), None);
    }

    #[test]
    fn insert_marks_dirty() {
        let mut session = Session::new("abc", None);
        assert!(!session.is_dirty());
        session.insert("user_id", 42);
        assert!(session.is_dirty());
    }

    #[test]
    fn unread_flash_expires_on_next_cycle() {
        let mut session = Session::new("abc", None);
        session.flash("notice", "saved");
        session.expire_unread_flash();
        assert_eq!(session.take_flash("notice"), None);
    }
}
