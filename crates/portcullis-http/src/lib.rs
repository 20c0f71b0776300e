#![forbid(unsafe_code)]
#![deny(missing_debug_implementations, nonstandard_style)]

/*!
# portcullis-http

Shared HTTP vocabulary for the portcullis dispatch core: [`Method`],
[`Status`], [`Headers`], and the stable [`ErrorKind`] discriminants
that every other `portcullis-*` crate's errors carry.

This crate deliberately does not parse HTTP off the wire — that is the
job of the host server, an external collaborator to this core (see
the crate-level docs of `portcullis`).
*/

mod error;
mod headers;
mod method;
mod status;

pub use error::ErrorKind;
pub use headers::Headers;
pub use method::{Method, UnknownMethod};
pub use status::Status;
