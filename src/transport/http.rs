//! Real HTTP transport for recording against live servers

use std::fmt;
use std::time::Duration;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, warn};

use super::{Transport, REQUEST_TIMEOUT_SECS};
use crate::interaction::{Body, Headers, Request, Response, Status};
use crate::{Result, TapedeckError};

/// Blocking HTTP/1 client over plain `http://`
///
/// Each call drives a private single-threaded runtime to completion, so it
/// must not be called from inside another async runtime.
pub struct HttpTransport {
    runtime: Runtime,
    client: Client<HttpConnector, Full<Bytes>>,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport with the default timeout
    ///
    /// # Errors
    ///
    /// Returns error if the runtime cannot be started
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Create a transport with a custom per-request timeout
    ///
    /// # Errors
    ///
    /// Returns error if the runtime cannot be started
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()?;

        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(10)
            .build_http();

        Ok(Self {
            runtime,
            client,
            timeout,
        })
    }

    /// Per-request timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn exchange(&self, request: hyper::Request<Full<Bytes>>, url: String) -> Result<Response> {
        let response = self.client.request(request).await.map_err(|e| {
            warn!("Request to {url} failed: {e}");
            TapedeckError::Transport(format!("Request failed: {e}"))
        })?;

        let status = Status::new(response.status().as_u16());
        let headers: Headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| TapedeckError::Transport(format!("Failed to read response body: {e}")))?
            .to_bytes();

        Ok(Response {
            status,
            headers,
            body: Body::from(body.to_vec()),
            url,
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request) -> Result<Response> {
        let url = request.uri.trim().to_string();
        let http_request = build_request(request, &url)?;

        debug!("Sending {} {url}", request.method);

        self.runtime.block_on(async {
            tokio::time::timeout(self.timeout, self.exchange(http_request, url.clone()))
                .await
                .map_err(|_| {
                    TapedeckError::Transport(format!(
                        "Request to {url} timed out after {:?}",
                        self.timeout
                    ))
                })?
        })
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Convert a request into a hyper request
fn build_request(request: &Request, url: &str) -> Result<hyper::Request<Full<Bytes>>> {
    let uri = url
        .parse::<Uri>()
        .map_err(|e| TapedeckError::Transport(format!("Invalid URI '{url}': {e}")))?;

    if uri.scheme_str() != Some("http") {
        return Err(TapedeckError::Transport(format!(
            "Only http:// URLs are supported, got '{url}'"
        )));
    }

    let method = Method::from_bytes(request.method.to_uppercase().as_bytes()).map_err(|e| {
        TapedeckError::Transport(format!("Invalid HTTP method '{}': {e}", request.method))
    })?;

    let mut builder = hyper::Request::builder().method(method).uri(uri);
    for (name, value) in request.headers.iter() {
        builder = builder.header(name, value);
    }

    builder
        .body(Full::new(Bytes::copy_from_slice(request.body.as_bytes())))
        .map_err(|e| TapedeckError::Transport(format!("Failed to build request: {e}")))
}
