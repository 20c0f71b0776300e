use portcullis_http::{Headers, Status};

/// Wraps the platform response writer so that the security pipeline
/// can set headers and a status before any bytes are committed, and
/// so handlers further downstream can still override the status up
/// until the first byte of the body is written (spec.md §4.9).
#[derive(Debug)]
pub struct ResponseWriter {
    status: Option<Status>,
    headers: Headers,
    bytes_written: u64,
    started: bool,
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self {
            status: None,
            headers: Headers::new(),
            bytes_written: 0,
            started: false,
        }
    }
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    pub fn status(&self) -> Option<Status> {
        self.status
    }

    /// Sets the deferred status. Calling this again with a different
    /// value after the response has already started writing bytes is
    /// logged as a warning and otherwise ignored, since the status
    /// line is already committed to the underlying writer by then.
    pub fn set_status(&mut self, status: Status) {
        if self.started {
            if self.status != Some(status) {
                log::warn!(
                    "attempted to change response status to {status} after the body had \
                     already started writing; the original status stands"
                );
            }
            return;
        }
        self.status = Some(status);
    }

    /// Records `len` bytes as written and marks the response as
    /// started, locking in the current status. Returns the number of
    /// bytes the caller should actually forward to the underlying
    /// writer (always `len` — this type counts, it does not buffer).
    pub fn write(&mut self, len: usize) -> usize {
        self.started = true;
        self.bytes_written += len as u64;
        len
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn has_started(&self) -> bool {
        self.started
    }
}
