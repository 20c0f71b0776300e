/// A signing or encryption key plus an optional previous key, so that
/// keys can be rotated without invalidating every cookie already
/// issued under the old key (spec.md §4.4). On decode, every
/// candidate key is tried in order (current first); on encode, only
/// `current` is ever used.
#[derive(Clone)]
pub struct KeyRing {
    current: Vec<u8>,
    previous: Option<Vec<u8>>,
}

impl std::fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRing")
            .field("current", &"<redacted>")
            .field("previous", &self.previous.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl KeyRing {
    pub fn new(current: impl Into<Vec<u8>>) -> Self {
        Self {
            current: current.into(),
            previous: None,
        }
    }

    pub fn with_previous(mut self, previous: impl Into<Vec<u8>>) -> Self {
        self.previous = Some(previous.into());
        self
    }

    pub fn current(&self) -> &[u8] {
        &self.current
    }

    pub fn candidates(&self) -> impl Iterator<Item = &[u8]> {
        std::iter::once(self.current.as_slice()).chain(self.previous.as_deref())
    }
}
