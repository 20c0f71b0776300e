#![forbid(unsafe_code)]
#![deny(missing_debug_implementations, nonstandard_style)]

/*!
# portcullis-cookies

A signed, optionally AES-CTR-encrypted cookie codec with current/
previous key rotation (spec.md §4.4). Unlike a bare `Set-Cookie` jar,
every value round-tripped through [`CookieCodec`] carries its own
issuance timestamp and HMAC-SHA256 signature, so tampering and replay
past an optional max-age are both caught before the payload ever
reaches application code.
*/

mod codec;
mod error;
mod keyring;

pub use codec::CookieCodec;
pub use error::CookieError;
pub use keyring::KeyRing;
