//! HTTP responses.
//!
//! Handlers produce a [`Reply`] asynchronously; sending it on the blocking
//! `tiny_http` request happens separately.

use anyhow::Result;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::utils::html::escape;

pub mod mime {
    pub const HTML: &str = "text/html; charset=utf-8";
    pub const JAVASCRIPT: &str = "text/javascript; charset=utf-8";
    pub const CSS: &str = "text/css; charset=utf-8";
    pub const PLAIN: &str = "text/plain; charset=utf-8";
}

/// A response waiting to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    pub fn html(body: String) -> Self {
        Self::new(200, mime::HTML, body)
    }

    pub fn javascript(body: String) -> Self {
        Self::new(200, mime::JAVASCRIPT, body)
    }

    pub fn css(body: String) -> Self {
        Self::new(200, mime::CSS, body)
    }

    pub fn not_found() -> Self {
        Self::new(404, mime::PLAIN, "404 Not Found")
    }

    pub fn method_not_allowed() -> Self {
        Self::new(405, mime::PLAIN, "405 Method Not Allowed")
    }

    /// Server shutting down.
    pub fn unavailable() -> Self {
        Self::new(503, mime::PLAIN, "503 Service Unavailable")
    }

    /// Render failure page (500), error text escaped.
    pub fn render_error(error: &dyn std::fmt::Display) -> Self {
        let error_str = error.to_string();
        let msg = escape(&error_str);
        let body = format!(
            "<!doctype html><html><head><title>Render Error</title></head>\
             <body><h1>Render Error</h1><pre>{msg}</pre></body></html>",
        );
        Self::new(500, mime::HTML, body)
    }
}

/// Send `reply`; HEAD requests get headers only.
pub fn send(request: Request, reply: Reply) -> Result<()> {
    let content_type = make_header("Content-Type", reply.content_type);
    let cache = make_header("Cache-Control", "no-store");

    if is_head_request(&request) {
        let response = Response::empty(StatusCode(reply.status))
            .with_header(content_type)
            .with_header(cache);
        request.respond(response)?;
        return Ok(());
    }

    let response = Response::from_data(reply.body)
        .with_status_code(StatusCode(reply.status))
        .with_header(content_type)
        .with_header(cache);
    request.respond(response)?;
    Ok(())
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}
