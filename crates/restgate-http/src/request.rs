//! The inbound request as seen by the dispatcher.
//!
//! The surrounding transport has already split the HTTP request into method,
//! path, query, body and a couple of negotiation headers. [`InboundRequest`]
//! carries exactly that, plus any identity an earlier session established.

use std::fmt;

use bytes::Bytes;
use restgate_core::Identity;
use serde::Serialize;

/// The four verbs a resource can implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl Verb {
    /// Parse a method name case-insensitively. Returns `None` for anything
    /// other than the four resource verbs.
    #[must_use]
    pub fn parse(method: &str) -> Option<Self> {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    /// The canonical upper-case method name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// The verb downstream processing should see. PUT and DELETE travel as
    /// POST because the framework only decodes form bodies for POST.
    #[must_use]
    pub fn effective(&self) -> Self {
        match self {
            Self::Put | Self::Delete => Self::Post,
            other => *other,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower-cased request path split into segments.
///
/// The first segment names the resource; empty segments produced by a
/// leading or trailing slash are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegments(Vec<String>);

impl PathSegments {
    /// Normalize and split a request path.
    ///
    /// # Examples
    ///
    /// ```
    /// use restgate_http::request::PathSegments;
    ///
    /// let path = PathSegments::parse("/Locales/en-CA/");
    /// assert_eq!(path.resource(), Some("locales"));
    /// assert_eq!(path.args(), ["en-ca"]);
    /// ```
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let lower = path.to_lowercase();
        let mut segments: Vec<String> = lower.split('/').map(ToOwned::to_owned).collect();
        if segments.first().is_some_and(String::is_empty) {
            segments.remove(0);
        }
        while segments.last().is_some_and(String::is_empty) {
            segments.pop();
        }
        Self(segments)
    }

    /// The resource segment, if any.
    #[must_use]
    pub fn resource(&self) -> Option<&str> {
        self.0.first().map(String::as_str).filter(|s| !s.is_empty())
    }

    /// Segments following the resource name.
    #[must_use]
    pub fn args(&self) -> &[String] {
        self.0.get(1..).unwrap_or_default()
    }

    /// Segment at `index`, counting the resource as `0`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// All segments, resource first.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// A parsed HTTP request handed to the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    /// HTTP method as received.
    pub method: String,
    /// Request path, without query string.
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub query: String,
    /// Raw request body.
    pub body: Bytes,
    /// `Content-Type` header, if any.
    pub content_type: Option<String>,
    /// `Accept` header, if any.
    pub accept: Option<String>,
    /// Identity established by an existing session, if any.
    pub identity: Option<Identity>,
}

impl InboundRequest {
    /// Create a request with the given method and path-and-query.
    ///
    /// ```
    /// use restgate_http::InboundRequest;
    ///
    /// let req = InboundRequest::new("GET", "/locales/en?username=alice");
    /// assert_eq!(req.path, "/locales/en");
    /// assert_eq!(req.query, "username=alice");
    /// ```
    #[must_use]
    pub fn new(method: impl Into<String>, path_and_query: &str) -> Self {
        let (path, query) = path_and_query
            .split_once('?')
            .unwrap_or((path_and_query, ""));
        Self {
            method: method.into(),
            path: path.to_owned(),
            query: query.to_owned(),
            ..Self::default()
        }
    }

    /// Build a request from `http` request parts and a collected body.
    #[must_use]
    pub fn from_parts(parts: &http::request::Parts, body: Bytes) -> Self {
        let header = |name: http::header::HeaderName| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned)
        };
        Self {
            method: parts.method.as_str().to_owned(),
            path: parts.uri.path().to_owned(),
            query: parts.uri.query().unwrap_or("").to_owned(),
            body,
            content_type: header(http::header::CONTENT_TYPE),
            accept: header(http::header::ACCEPT),
            identity: parts.extensions.get::<Identity>().cloned(),
        }
    }

    /// Attach a body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Attach a `Content-Type`.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Attach an `Accept` header.
    #[must_use]
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Attach an identity from an existing session.
    #[must_use]
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }
}
