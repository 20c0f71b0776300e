#![forbid(unsafe_code)]
#![deny(missing_debug_implementations, nonstandard_style)]

/*!
# portcullis-core

The Request/Response Facade (spec.md §4.9): a transport-agnostic
[`Request`] plus a [`ResponseWriter`] that defers the status line
until the first byte is written, the way `trillium::Conn` wraps its
platform writer.

This crate intentionally knows nothing about sockets, async runtimes,
or TLS handshakes — the host HTTP server owns all of that and hands
this core a [`Request`] once headers are parsed.
*/

mod request;
mod response;

pub use request::Request;
pub use response::ResponseWriter;

pub use portcullis_http::{Headers, Method, Status};
