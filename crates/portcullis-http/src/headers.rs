use std::collections::HashMap;

/// A case-insensitive, order-preserving multimap of HTTP headers.
///
/// Header names are normalized to lowercase for lookup, matching the
/// usual HTTP semantics, but the originally-supplied casing of the
/// name is retained on first insertion for display purposes.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: HashMap<String, (String, Vec<String>)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(name: &str) -> String {
        name.to_ascii_lowercase()
    }

    /// Appends a value, preserving any existing values for the name.
    pub fn append(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        let name = name.as_ref();
        let key = Self::key(name);
        self.entries
            .entry(key)
            .or_insert_with(|| (name.to_owned(), Vec::new()))
            .1
            .push(value.into());
    }

    /// Replaces any existing values for the name with a single value.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        let name = name.as_ref();
        self.entries
            .insert(Self::key(name), (name.to_owned(), vec![value.into()]));
    }

    /// Returns the first value for the name, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&Self::key(name))
            .and_then(|(_, v)| v.first())
            .map(String::as_str)
    }

    /// Returns all values for the name in insertion order.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .get(&Self::key(name))
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&Self::key(name))
    }

    pub fn remove(&mut self, name: &str) {
        self.entries.remove(&Self::key(name));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.as_str(), v.as_str())))
    }
}
