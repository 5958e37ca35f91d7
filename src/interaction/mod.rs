//! Request, response and recorded interaction types

mod body;
mod headers;

pub use body::{Body, TEXT_ENCODING};
pub use headers::Headers;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::placeholder::{Direction, Placeholder};

/// An outbound HTTP request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// HTTP method (e.g., "GET", "POST")
    pub method: String,
    /// Full request URI
    pub uri: String,
    /// Request headers
    #[serde(default)]
    pub headers: Headers,
    /// Request body
    #[serde(default)]
    pub body: Body,
}

impl Request {
    /// Create a request with no headers and an empty body
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            headers: Headers::new(),
            body: Body::empty(),
        }
    }

    /// Shorthand for a GET request
    pub fn get(uri: impl Into<String>) -> Self {
        Self::new("GET", uri)
    }

    /// Shorthand for a POST request with a body
    pub fn post(uri: impl Into<String>, body: impl Into<Body>) -> Self {
        Self::new("POST", uri).with_body(body)
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replace the body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    pub(crate) fn substitute(&self, placeholders: &[Placeholder], direction: Direction) -> Self {
        Self {
            method: self.method.clone(),
            uri: self.uri.clone(),
            headers: self.headers.substitute(placeholders, direction),
            body: self.body.substitute(placeholders, direction),
        }
    }

    pub(crate) fn for_storage(&self, exact: bool) -> Self {
        Self {
            body: self.body.for_storage(exact),
            ..self.clone()
        }
    }
}

/// HTTP status line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Status code
    pub code: u16,
    /// Reason phrase
    #[serde(default)]
    pub message: String,
}

impl Status {
    /// Status with the canonical reason phrase for `code`
    #[must_use]
    pub fn new(code: u16) -> Self {
        let message = hyper::StatusCode::from_u16(code)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self { code, message }
    }
}

/// An HTTP response, live or replayed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Status line
    pub status: Status,
    /// Response headers
    #[serde(default)]
    pub headers: Headers,
    /// Response body
    #[serde(default)]
    pub body: Body,
    /// URL the response was served from
    #[serde(default)]
    pub url: String,
}

impl Response {
    /// Create a response with the given status code
    #[must_use]
    pub fn new(code: u16) -> Self {
        Self {
            status: Status::new(code),
            headers: Headers::new(),
            body: Body::empty(),
            url: String::new(),
        }
    }

    /// Status code
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.code
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replace the body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the URL the response was served from
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    fn substitute(&self, placeholders: &[Placeholder], direction: Direction) -> Self {
        Self {
            status: self.status.clone(),
            headers: self.headers.substitute(placeholders, direction),
            body: self.body.substitute(placeholders, direction),
            url: self.url.clone(),
        }
    }

    fn for_storage(&self, exact: bool) -> Self {
        Self {
            body: self.body.for_storage(exact),
            ..self.clone()
        }
    }
}

/// One recorded request/response pair
///
/// Fields are private: once built, an interaction is never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    request: Request,
    response: Response,
    recorded_at: DateTime<Utc>,
}

impl Interaction {
    /// Build an interaction from already-stored request/response values
    #[must_use]
    pub fn new(request: Request, response: Response, recorded_at: DateTime<Utc>) -> Self {
        Self {
            request,
            response,
            recorded_at,
        }
    }

    /// Capture a live exchange for storage
    ///
    /// Bodies are converted to their persisted representation and every
    /// placeholder literal is replaced with its token.
    pub(crate) fn capture(
        request: &Request,
        response: &Response,
        preserve_exact_body_bytes: bool,
        placeholders: &[Placeholder],
    ) -> Self {
        let request = request
            .for_storage(preserve_exact_body_bytes)
            .substitute(placeholders, Direction::ToCassette);
        let response = response
            .for_storage(preserve_exact_body_bytes)
            .substitute(placeholders, Direction::ToCassette);

        Self::new(request, response, Utc::now())
    }

    /// Recorded request, as persisted
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Recorded response, as persisted
    #[must_use]
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// When the interaction was recorded
    #[must_use]
    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Response handed back to live code, with placeholders expanded
    #[must_use]
    pub fn as_response(&self, placeholders: &[Placeholder]) -> Response {
        self.response
            .substitute(placeholders, Direction::FromCassette)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason_phrase() {
        assert_eq!(Status::new(200).message, "OK");
        assert_eq!(Status::new(404).message, "Not Found");
        assert_eq!(Status::new(799).message, "");
    }

    #[test]
    fn test_capture_redacts_headers_and_bodies() {
        let placeholders = vec![Placeholder::new("<TOKEN>", "hunter2")];
        let request = Request::post("https://api.example.test/login", "password=hunter2")
            .with_header("Authorization", "Bearer hunter2");
        let response = Response::new(200).with_body("welcome hunter2");

        let interaction = Interaction::capture(&request, &response, false, &placeholders);

        assert_eq!(interaction.request().body.text(), "password=<TOKEN>");
        assert_eq!(
            interaction.request().headers.get("authorization"),
            Some("Bearer <TOKEN>")
        );
        assert_eq!(interaction.response().body.text(), "welcome <TOKEN>");

        let replayed = interaction.as_response(&placeholders);
        assert_eq!(replayed.body.text(), "welcome hunter2");
    }

    #[test]
    fn test_capture_keeps_exact_bytes() {
        let response = Response::new(200).with_body(vec![0u8, 159, 146, 150]);
        let interaction = Interaction::capture(&Request::get("http://x/"), &response, true, &[]);

        assert_eq!(interaction.response().body, Body::Bytes(vec![0, 159, 146, 150]));
    }

    #[test]
    fn test_interaction_json_shape() {
        let recorded_at = DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let interaction = Interaction::new(
            Request::get("https://example.test/"),
            Response::new(204).with_url("https://example.test/"),
            recorded_at,
        );

        let value = serde_json::to_value(&interaction).unwrap();
        assert_eq!(value["request"]["method"], "GET");
        assert_eq!(value["request"]["body"]["string"], "");
        assert_eq!(value["response"]["status"]["code"], 204);
        assert_eq!(value["response"]["status"]["message"], "No Content");
        assert_eq!(value["recorded_at"], "2024-01-02T03:04:05Z");
    }
}
