use crate::session::Session;
use crate::store::{Store, StoreError};
use portcullis_cookies::{CookieCodec, CookieError};
use rand::RngCore;
use std::sync::Arc;
use std::time::Duration;

/// Where session data actually lives (spec.md §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// The entire serialized [`Session`] is signed and stored in the
    /// cookie itself; no server-side state at all.
    CookieStore,
    /// Only a session id is signed and stored in the cookie; the
    /// [`Session`] data lives in a [`Store`].
    ServerStore,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Cookie(#[from] CookieError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("server-store mode requires a configured Store")]
    MissingStore,
}

/// Loads and saves a request's [`Session`], in either cookie-store or
/// server-store mode, through the same signed-cookie codec the rest
/// of the pipeline uses (spec.md §4.5).
#[derive(Debug, Clone)]
pub struct SessionManager {
    mode: SessionMode,
    cookie_name: String,
    codec: CookieCodec,
    store: Option<Arc<dyn Store>>,
    ttl: Duration,
}

impl SessionManager {
    pub fn cookie_store(codec: CookieCodec) -> Self {
        Self {
            mode: SessionMode::CookieStore,
            cookie_name: "portcullis.session".to_string(),
            codec,
            store: None,
            ttl: Duration::from_secs(24 * 60 * 60),
        }
    }

    pub fn server_store(codec: CookieCodec, store: Arc<dyn Store>) -> Self {
        Self {
            mode: SessionMode::ServerStore,
            cookie_name: "portcullis.session".to_string(),
            codec,
            store: Some(store),
            ttl: Duration::from_secs(24 * 60 * 60),
        }
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Loads the session for an incoming request, given the raw value
    /// of this manager's cookie (if the client sent one). Never fails
    /// on a missing/invalid cookie -- that's just a fresh session --
    /// but does propagate a genuine store I/O error.
    pub fn load(&self, cookie_value: Option<&str>) -> Result<Session, SessionError> {
        let Some(raw) = cookie_value else {
            return Ok(self.new_session());
        };

        match self.mode {
            SessionMode::CookieStore => match self.codec.decode(&self.cookie_name, raw) {
                Ok(bytes) => match serde_json::from_slice::<Session>(&bytes) {
                    Ok(session) if !session.is_expired() => Ok(session),
                    _ => Ok(self.new_session()),
                },
                Err(_) => Ok(self.new_session()),
            },
            SessionMode::ServerStore => {
                let store = self.store.as_ref().ok_or(SessionError::MissingStore)?;
                let id = match self.codec.decode(&self.cookie_name, raw) {
                    Ok(bytes) => String::from_utf8(bytes).ok(),
                    Err(_) => None,
                };
                match id.and_then(|id| store.read(&id).ok().flatten()) {
                    Some(session) => Ok(session),
                    None => Ok(self.new_session()),
                }
            }
        }
    }

    /// Persists `session` (clearing any unread flash entries first)
    /// and returns the new cookie value to send back, if the session
    /// should continue to exist. Returns `None` when the session is
    /// both unchanged and empty, so callers can skip setting a cookie
    /// at all on a no-op request.
    pub fn save(&self, mut session: Session) -> Result<Option<String>, SessionError> {
        session.expire_unread_flash();

        if !session.is_dirty() && session.is_empty() {
            return Ok(None);
        }

        match self.mode {
            SessionMode::CookieStore => {
                let bytes = serde_json::to_vec(&session)
                    .map_err(|e| SessionError::Store(StoreError::Corrupt(e.to_string())))?;
                let token = self.codec.encode(&self.cookie_name, &bytes)?;
                Ok(Some(token))
            }
            SessionMode::ServerStore => {
                let store = self.store.as_ref().ok_or(SessionError::MissingStore)?;
                store.save(&session)?;
                let token = self.codec.encode(&self.cookie_name, session.id().as_bytes())?;
                Ok(Some(token))
            }
        }
    }

    /// Deletes a session by its signed cookie value, from the server
    /// store if this manager uses one; a no-op in cookie-store mode
    /// beyond instructing the caller to clear the cookie.
    pub fn destroy(&self, cookie_value: &str) -> Result<(), SessionError> {
        if let SessionMode::ServerStore = self.mode {
            if let Some(store) = &self.store {
                if let Ok(bytes) = self.codec.decode(&self.cookie_name, cookie_value) {
                    if let Ok(id) = String::from_utf8(bytes) {
                        store.delete(&id)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn new_session(&self) -> Session {
        Session::new(generate_session_id(), Some(self.ttl))
    }
}

fn generate_session_id() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}
