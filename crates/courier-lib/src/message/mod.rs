//! Request and response shapes the codec reads from and writes into.
//!
//! `RequestTemplate` is an outgoing request under construction; anything that
//! implements [`BodySink`] can receive an encoded body. `Response` is a fully
//! received response with an optional body.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};

/// Target the encoder writes the finished payload into.
///
/// Called at most once per encode, with the complete body.
pub trait BodySink {
    fn set_body(&mut self, body: Bytes);
}

impl BodySink for Vec<u8> {
    fn set_body(&mut self, body: Bytes) {
        self.clear();
        self.extend_from_slice(&body);
    }
}

impl BodySink for reqwest::Request {
    fn set_body(&mut self, body: Bytes) {
        *self.body_mut() = Some(reqwest::Body::from(body));
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestTemplate {
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl RequestTemplate {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Body as text, if present and valid UTF-8.
    pub fn body_str(&self) -> Option<&str> {
        self.body().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Build a `reqwest::Request` for `client` from this template.
    pub fn into_request(self, client: &reqwest::Client) -> reqwest::Result<reqwest::Request> {
        let mut builder = client.request(self.method, &self.url).headers(self.headers);
        if let Some(body) = self.body {
            builder = builder.body(body);
        }
        builder.build()
    }
}

impl BodySink for RequestTemplate {
    fn set_body(&mut self, body: Bytes) {
        self.body = Some(body);
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Response {
    /// A response with no headers and no body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Collect status, headers and the full body of a `reqwest::Response`.
    pub async fn from_reqwest(response: reqwest::Response) -> reqwest::Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(Self {
            status,
            headers,
            body: Some(body),
        })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn reason(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// `false` when the body is absent or zero length.
    pub fn has_body(&self) -> bool {
        self.body.as_ref().is_some_and(|b| !b.is_empty())
    }

    /// Body decoded as UTF-8, replacing invalid sequences. Empty when absent.
    pub fn body_text_lossy(&self) -> String {
        self.body()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }
}
