use http::header::CONTENT_LENGTH;
use http::StatusCode;
use std::io::{self, Write};

use super::{Request, Response};
use crate::dispatcher::conformance::is_content_allowed;

/// Canonical reason phrase for a status code.
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
}

/// Transport boundary: emits a finished response for a request.
///
/// One writer serves one connection, so it is driven through `&mut self`.
pub trait ResponseWriter {
    fn write(&mut self, request: &Request, response: &Response) -> io::Result<()>;
}

/// Writes HTTP/1.1 responses to any byte sink.
///
/// `Content-Length` is added when the status allows content and the response
/// does not already carry one.
pub struct Http1Writer<W: Write> {
    inner: W,
}

impl<W: Write> Http1Writer<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> ResponseWriter for Http1Writer<W> {
    fn write(&mut self, _request: &Request, response: &Response) -> io::Result<()> {
        let status = response.status();
        let body = response.wire_body();
        let mut head = format!("HTTP/1.1 {} {}\r\n", status, status_reason(status));
        for (name, value) in response.headers() {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        let content_allowed = is_content_allowed(status);
        if content_allowed && !response.has_header(CONTENT_LENGTH.as_str()) {
            head.push_str(&format!("Content-Length: {}\r\n", body.len()));
        }
        head.push_str("\r\n");

        self.inner.write_all(head.as_bytes())?;
        if content_allowed {
            self.inner.write_all(&body)?;
        }
        self.inner.flush()
    }
}

/// A response captured by [`BufferedWriter`].
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl WrittenResponse {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body as text; invalid UTF-8 is replaced.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_slice(&self.body)
    }
}

/// Keeps every written response in memory. Used when embedding the pipeline
/// behind another transport and in tests.
#[derive(Debug, Default)]
pub struct BufferedWriter {
    written: Vec<WrittenResponse>,
    fail_writes: bool,
}

impl BufferedWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A writer whose every write fails with `BrokenPipe`.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            written: Vec::new(),
            fail_writes: true,
        }
    }

    #[must_use]
    pub fn responses(&self) -> &[WrittenResponse] {
        &self.written
    }

    #[must_use]
    pub fn last(&self) -> Option<&WrittenResponse> {
        self.written.last()
    }

    pub fn take(&mut self) -> Vec<WrittenResponse> {
        std::mem::take(&mut self.written)
    }
}

impl ResponseWriter for BufferedWriter {
    fn write(&mut self, _request: &Request, response: &Response) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "connection closed"));
        }
        self.written.push(WrittenResponse {
            status: response.status(),
            headers: response
                .headers()
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            body: response.wire_body().into_owned(),
        });
        Ok(())
    }
}
