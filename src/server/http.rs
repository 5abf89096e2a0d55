//! Just enough HTTP/1.1 for the dashboard: one request per connection,
//! bodies ignored, `Connection: close` on every response.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Upper bound on header lines read before giving up.
const MAX_HEADER_LINES: usize = 100;

/// Upper bound on the length of the request line or any header line.
const MAX_LINE_BYTES: u64 = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Other,
}

impl Method {
    fn parse(raw: &str) -> Self {
        match raw {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            _ => Method::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    /// Path without the query string.
    pub path: String,
}

/// Read the request line and headers from `reader`.
pub async fn read_request<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Request> {
    let mut line = String::new();
    let n = read_line_capped(reader, &mut line)
        .await
        .context("failed to read request line")?;
    if n == 0 {
        bail!("connection closed before request line");
    }

    let mut parts = line.split_whitespace();
    let (Some(method), Some(target), Some(version)) = (parts.next(), parts.next(), parts.next())
    else {
        bail!("malformed request line: {:?}", line.trim_end());
    };
    if !version.starts_with("HTTP/") {
        bail!("unsupported protocol: {}", version);
    }

    let path = target.split(['?', '#']).next().unwrap_or("/").to_string();
    let request = Request {
        method: Method::parse(method),
        path,
    };

    // Drain headers; nothing in them changes routing.
    for _ in 0..MAX_HEADER_LINES {
        let mut header = String::new();
        let n = read_line_capped(reader, &mut header).await?;
        if n == 0 || header.trim_end().is_empty() {
            return Ok(request);
        }
    }
    bail!("too many header lines")
}

/// `read_line` that stops after `MAX_LINE_BYTES`.
async fn read_line_capped<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    line: &mut String,
) -> Result<usize> {
    let n = (&mut *reader).take(MAX_LINE_BYTES).read_line(line).await?;
    if n as u64 >= MAX_LINE_BYTES && !line.ends_with('\n') {
        bail!("line longer than {} bytes", MAX_LINE_BYTES);
    }
    Ok(n)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl Response {
    pub fn json_text(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "application/json; charset=utf-8",
            headers: Vec::new(),
            body: body.into_bytes(),
        }
    }

    /// Serialize `value` as pretty JSON; serialization failure becomes a 500.
    pub fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(body) => Self::json_text(200, body),
            Err(e) => Self::error(500, &format!("failed to serialize response: {}", e)),
        }
    }

    pub fn html(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            headers: Vec::new(),
            body: body.into_bytes(),
        }
    }

    /// `{"error": message}` with the given status.
    pub fn error(status: u16, message: &str) -> Self {
        let body = serde_json::to_string(&ErrorBody { error: message })
            .unwrap_or_else(|_| String::from("{\"error\":\"internal error\"}"));
        Self::json_text(status, body)
    }

    pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Drop the body but keep `Content-Length`, as HEAD requires.
    pub fn into_head(self) -> Vec<u8> {
        self.head_bytes(self.body.len())
    }

    fn head_bytes(&self, length: usize) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n",
            self.status,
            reason(self.status),
            self.content_type,
            length
        );
        for (name, value) in &self.headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        head.push_str("\r\n");
        head.into_bytes()
    }

    /// Full wire form: status line, headers, body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.head_bytes(self.body.len());
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        500 => "Internal Server Error",
        _ => "",
    }
}
