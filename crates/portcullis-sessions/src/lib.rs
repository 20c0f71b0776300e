#![forbid(unsafe_code)]
#![deny(missing_debug_implementations, nonstandard_style)]

/*!
# portcullis-sessions

Session management in either cookie-store or server-store mode, with
pop-on-read flash values (spec.md §4.5). A [`FilesystemStore`] is
provided as the reference server-side backend; production deployments
with multiple instances will want to supply their own [`Store`].
*/

mod manager;
mod session;
mod store;

pub use manager::{SessionError, SessionManager, SessionMode};
pub use session::Session;
pub use store::{FilesystemStore, MemoryStore, Store, StoreError};
