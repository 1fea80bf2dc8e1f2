use std::io;
use std::sync::Arc;

use http::StatusCode;
use serde_json::Value;
use smallvec::SmallVec;

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Response header storage.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Destination of the final response flush.
pub trait ResponseWriter {
    fn write(&mut self, response: &Response) -> io::Result<()>;
}

/// Records every flushed response; used by tests and the CLI.
impl ResponseWriter for Vec<Response> {
    fn write(&mut self, response: &Response) -> io::Result<()> {
        self.push(response.clone());
        Ok(())
    }
}

/// The single response of a request, mutated in place by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderVec,
    pub body: String,
    written: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderVec::new(),
            body: String::new(),
            written: false,
        }
    }

    /// Get a header by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value.into()));
    }

    /// Store a handler result: strings go out as plain text, anything else as JSON.
    pub fn set_body_value(&mut self, value: Value) {
        match value {
            Value::String(s) => {
                self.set_header("content-type", "text/plain");
                self.body = s;
            }
            other => {
                self.set_header("content-type", "application/json");
                self.body = other.to_string();
            }
        }
    }

    /// Whether the response has already been flushed.
    pub fn is_written(&self) -> bool {
        self.written
    }

    /// Flush through `out` unless that already happened. Returns `Ok(false)` on a repeat call.
    pub fn write(&mut self, out: &mut dyn ResponseWriter) -> io::Result<bool> {
        if self.written {
            return Ok(false);
        }
        self.written = true;
        out.write(self)?;
        Ok(true)
    }

    /// Convert into an `http::Response` for hand-off to a server.
    pub fn to_http(&self) -> Result<http::Response<String>, http::Error> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(&**name, value.as_str());
        }
        builder.body(self.body.clone())
    }
}
