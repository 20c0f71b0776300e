#![forbid(unsafe_code)]
#![deny(missing_debug_implementations, nonstandard_style)]

/*!
# portcullis-csrf

The Anti-CSRF guard (spec.md §4.7): a salted XOR-masked token scheme
(`salt || salt XOR secret`) plus a same-origin/referer check, verified
in constant time so a timing side channel can't leak the secret one
byte at a time.
*/

mod error;
mod guard;
mod token;

pub use error::CsrfError;
pub use guard::AntiCsrfGuard;
pub use token::{generate_secret, mask, verify, SECRET_LEN};
