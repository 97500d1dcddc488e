//! Transport seam for issuing HTTP calls
//!
//! The pipeline never talks HTTP directly; it hands a [`TransportRequest`]
//! to a [`Transport`] implementation and gets back either a completed
//! [`TransportResponse`] (whatever the status code) or a
//! [`TransportFailure`] when the call itself could not be made. This keeps
//! the core testable with a mock and lets hosts swap the HTTP stack.

use async_trait::async_trait;
use log::debug;
use std::fmt;

/// Header carrying the bearer-style token expected by GitLab v4.
pub const PRIVATE_TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// HTTP method of an outbound request.
///
/// Mutating calls default to `PUT`, the generic update method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    #[default]
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound request handed to the transport collaborator.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    /// Fully resolved absolute URL.
    pub url: String,
    /// Form-encoded body fields, if any. Read calls carry none.
    pub form: Option<Vec<(String, String)>>,
    /// Token placed in the `PRIVATE-TOKEN` header.
    pub token: String,
}

/// A completed response, regardless of HTTP status.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Indicator that the call itself could not be completed.
///
/// This is connectivity-level failure, distinct from a well-formed error
/// payload returned by the service.
#[derive(Debug, Clone, Default)]
pub struct TransportFailure {
    /// Low-level diagnostic from the HTTP stack, if known.
    pub detail: Option<String>,
}

/// Transport collaborator contract.
///
/// Implementations must be `Send + Sync` so clients can be shared across
/// async tasks.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &TransportRequest)
        -> Result<TransportResponse, TransportFailure>;
}

/// Default transport backed by [`reqwest`].
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &TransportRequest,
    ) -> Result<TransportResponse, TransportFailure> {
        debug!("{} {}", request.method, request.url);

        let mut builder = self
            .http
            .request(request.method.to_reqwest(), &request.url)
            .header(PRIVATE_TOKEN_HEADER, &request.token);
        if let Some(form) = &request.form {
            builder = builder.form(form);
        }

        let response = builder.send().await.map_err(|error| TransportFailure {
            detail: Some(error.to_string()),
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await.map_err(|error| TransportFailure {
            detail: Some(error.to_string()),
        })?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_strings() {
        assert_eq!(Method::Get.as_str(), "GET");
        assert_eq!(Method::Put.to_string(), "PUT");
        assert_eq!(Method::Delete.as_str(), "DELETE");
    }

    #[test]
    fn test_mutations_default_to_put() {
        assert_eq!(Method::default(), Method::Put);
    }
}
