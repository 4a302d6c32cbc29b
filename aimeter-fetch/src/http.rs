//! HTTP client with tracing and cancellation.
//!
//! Every request races the caller's [`CancellationToken`] and the client's
//! per-request timeout. The body is read in full so callers can decode it or
//! put a truncated copy in an error.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::body::debug_body;
use crate::error::{ApiStatusError, FetchError};

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("aimeter/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Response
// ============================================================================

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code.
    pub status: StatusCode,
    /// Body text.
    pub body: String,
}

impl HttpResponse {
    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Turns a non-2xx response into [`FetchError::Status`].
    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiStatusError::new(self.status.as_u16(), &self.body).into())
        }
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper shared by all vendors.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    /// Creates a client with the default timeout.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a client with a custom per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let inner = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { inner })
    }

    /// Builds the headers for a bearer-authenticated JSON API call.
    pub fn bearer_headers(token: &str) -> Result<HeaderMap, FetchError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| FetchError::InvalidHeader("authorization".to_string()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Inserts a header from runtime strings.
    pub fn insert_header(
        headers: &mut HeaderMap,
        name: &'static str,
        value: &str,
    ) -> Result<(), FetchError> {
        let value =
            HeaderValue::from_str(value).map_err(|_| FetchError::InvalidHeader(name.to_string()))?;
        headers.insert(HeaderName::from_static(name), value);
        Ok(())
    }

    /// Performs a GET request.
    #[instrument(skip(self, headers, cancel), fields(url = %url))]
    pub async fn get(
        &self,
        url: &str,
        headers: HeaderMap,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, FetchError> {
        debug!("GET request");
        self.send(self.inner.get(url).headers(headers), cancel).await
    }

    /// Performs a POST request with a JSON body.
    #[instrument(skip(self, headers, body, cancel), fields(url = %url))]
    pub async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &T,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, FetchError> {
        debug!("POST request with JSON");
        self.send(self.inner.post(url).headers(headers).json(body), cancel)
            .await
    }

    /// Performs a POST request with form data.
    #[instrument(skip(self, headers, form, cancel), fields(url = %url))]
    pub async fn post_form<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        headers: HeaderMap,
        form: &T,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, FetchError> {
        debug!("POST request with form data");
        self.send(self.inner.post(url).headers(headers).form(form), cancel)
            .await
    }

    async fn send(
        &self,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, FetchError>(HttpResponse { status, body })
        };

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(FetchError::Cancelled),
            result = exchange => result?,
        };

        debug!(status = %response.status, body = %debug_body(&response.body), "Response received");
        Ok(response)
    }

    /// Returns the inner reqwest client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent() {
        assert!(USER_AGENT.starts_with("aimeter/"));
    }

    #[test]
    fn test_bearer_headers() {
        let headers = HttpClient::bearer_headers("abc").unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer abc");
        assert_eq!(headers[ACCEPT], "application/json");
    }

    #[test]
    fn test_bearer_headers_rejects_newlines() {
        let err = HttpClient::bearer_headers("abc\ndef").unwrap_err();
        assert!(matches!(err, FetchError::InvalidHeader(_)));
    }

    #[test]
    fn test_insert_header() {
        let mut headers = HeaderMap::new();
        HttpClient::insert_header(&mut headers, "anthropic-beta", "oauth-2025-04-20").unwrap();
        assert_eq!(headers["anthropic-beta"], "oauth-2025-04-20");
    }

    #[test]
    fn test_error_for_status() {
        let ok = HttpResponse {
            status: StatusCode::OK,
            body: "{}".to_string(),
        };
        assert!(ok.error_for_status().is_ok());

        let denied = HttpResponse {
            status: StatusCode::UNAUTHORIZED,
            body: "nope".to_string(),
        };
        let err = denied.error_for_status().unwrap_err();
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn test_cancelled_before_send() {
        let client = HttpClient::new().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = client
            .get("http://127.0.0.1:9/never", HeaderMap::new(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Cancelled));
    }
}
