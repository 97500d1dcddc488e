//! Request/response pipeline for the GitLab REST API (v4)
//!
//! [`GitLabClient`] drives every call through the same stages: validate the
//! token once per client instance, derive a cache fingerprint, serve read
//! hits from the cache, otherwise dispatch through the [`Transport`] seam,
//! decode and map the JSON body into [`ApiValue`] trees, classify error
//! payloads, record telemetry, and (read path only) populate the cache.

use crate::cache::{fingerprint, ResponseCache};
use crate::error::{ApiError, GitLabError};
use crate::record::ApiValue;
use crate::telemetry::{CallLog, CallOutcome, CallRecord};
use crate::token::TokenProvider;
use crate::transport::{HttpTransport, Method, Transport, TransportRequest};
use chrono::Utc;
use log::{debug, info};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default public endpoint.
pub const DEFAULT_BASE_URL: &str = "https://gitlab.com/api/v4/";

/// Always-allowed endpoint used to validate tokens without recursing.
pub const PROBE_ENDPOINT: &str = "projects";

/// How long read responses stay cached unless the caller overrides it.
pub const DEFAULT_READ_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// How long the validation probe response stays cached.
pub const VALIDATION_TTL: Duration = Duration::from_secs(60 * 60);

/// Response shape that marks a token as rejected.
const UNAUTHORIZED_MESSAGE: &str = "401 Unauthorized";

/// Request parameters as ordered key/value pairs.
pub type Params = [(String, String)];

type ProbeFuture<'a> = Pin<Box<dyn Future<Output = Result<bool, GitLabError>> + Send + 'a>>;

/// Client for the GitLab v4 REST API.
///
/// Generic over the [`Transport`] so tests and hosts can substitute the
/// HTTP stack; defaults to the reqwest-backed [`HttpTransport`].
///
/// # Example
///
/// ```rust,no_run
/// use gitlab_client::GitLabClient;
///
/// # async fn example() -> Result<(), gitlab_client::GitLabError> {
/// let client = GitLabClient::new("glpat-...");
/// let projects = client.read("projects", None).await?;
/// # Ok(())
/// # }
/// ```
pub struct GitLabClient<T: Transport = HttpTransport> {
    token: String,
    base_url: String,
    transport: T,
    cache: Option<Arc<dyn ResponseCache>>,
    recorder: Arc<CallLog>,
    /// Set once validation has succeeded; read on every call.
    validated: AtomicBool,
}

impl GitLabClient<HttpTransport> {
    /// Create a client against the public endpoint with the default
    /// transport.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_transport(token, HttpTransport::new())
    }
}

impl<T: Transport> GitLabClient<T> {
    /// Create a client with a custom transport collaborator.
    pub fn with_transport(token: impl Into<String>, transport: T) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            transport,
            cache: None,
            recorder: Arc::new(CallLog::new()),
            validated: AtomicBool::new(false),
        }
    }

    /// Prefer the session token from the host's identity system, when one
    /// is present, over the configured token.
    pub fn apply_token_provider(&mut self, provider: &dyn TokenProvider) {
        if let Some(token) = provider.current_token() {
            self.token = token;
        }
    }

    /// Override the API endpoint. Normalized to exactly one trailing `/`.
    pub fn set_base_url(&mut self, base_url: &str) {
        self.base_url = format!("{}/", base_url.trim_end_matches('/'));
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Attach a cache collaborator. Only the read path uses it.
    pub fn set_cache(&mut self, cache: Arc<dyn ResponseCache>) {
        self.cache = Some(cache);
    }

    /// Replace the call recorder, e.g. with one shared process-wide.
    pub fn set_recorder(&mut self, recorder: Arc<CallLog>) {
        self.recorder = recorder;
    }

    /// Handle to the call log for external reporting.
    pub fn recorder(&self) -> Arc<CallLog> {
        Arc::clone(&self.recorder)
    }

    /// Issue a `GET` and return the mapped response.
    ///
    /// Results are cached for [`DEFAULT_READ_TTL`] when a cache
    /// collaborator is configured. `params` identify the request for cache
    /// and telemetry purposes; they are not appended to the URL.
    pub async fn read(&self, url: &str, params: Option<&Params>) -> Result<ApiValue, GitLabError> {
        self.read_with(url, params, DEFAULT_READ_TTL, None).await
    }

    /// [`read`](Self::read) with an explicit cache TTL and optional
    /// per-call token override.
    pub async fn read_with(
        &self,
        url: &str,
        params: Option<&Params>,
        ttl: Duration,
        token: Option<&str>,
    ) -> Result<ApiValue, GitLabError> {
        let token = token.unwrap_or(&self.token).to_string();
        let started = Instant::now();
        self.ensure_validated(url, &token).await?;

        debug!("GET {} (data: {:?})", url, params);

        let key = fingerprint(url, params, &token);
        if let Some(cache) = &self.cache {
            if let Some(body) = cache.load(&key) {
                if let Ok(raw) = serde_json::from_str::<serde_json::Value>(&body) {
                    debug!("cache hit for {url}");
                    let mapped = ApiValue::build(&raw, true);
                    self.record(
                        url,
                        Method::Get,
                        started.elapsed(),
                        true,
                        params,
                        CallOutcome::Body(raw),
                    );
                    return Ok(mapped);
                }
                // Unreadable entry: fall through to a fresh call.
            }
        }

        let request = TransportRequest {
            method: Method::Get,
            url: self.resolve_url(url),
            form: None,
            token,
        };
        let mapped = self.dispatch(url, &request, params, started).await?;

        self.record(
            url,
            Method::Get,
            started.elapsed(),
            false,
            params,
            CallOutcome::Body(mapped.to_json()),
        );
        if let Some(cache) = &self.cache {
            cache.save(&key, &mapped.to_json().to_string(), ttl);
        }
        Ok(mapped)
    }

    /// Issue a mutating request, `PUT` by default. Never cached: every
    /// mutate call reaches the transport.
    pub async fn mutate(
        &self,
        url: &str,
        params: Option<&Params>,
    ) -> Result<ApiValue, GitLabError> {
        self.mutate_with(url, params, Method::default(), None).await
    }

    /// [`mutate`](Self::mutate) with an explicit method and optional
    /// per-call token override. `params`, when present, become the
    /// form-encoded request body.
    pub async fn mutate_with(
        &self,
        url: &str,
        params: Option<&Params>,
        method: Method,
        token: Option<&str>,
    ) -> Result<ApiValue, GitLabError> {
        let token = token.unwrap_or(&self.token).to_string();
        let started = Instant::now();
        self.ensure_validated(url, &token).await?;

        debug!("{} {} (data: {:?})", method, url, params);

        let request = TransportRequest {
            method,
            url: self.resolve_url(url),
            form: params.map(|pairs| pairs.to_vec()),
            token,
        };
        let mapped = self.dispatch(url, &request, params, started).await?;

        self.record(
            url,
            method,
            started.elapsed(),
            false,
            params,
            CallOutcome::Body(mapped.to_json()),
        );
        Ok(mapped)
    }

    /// Check whether `token` is accepted by the probe endpoint.
    ///
    /// Invalid iff the response is a single record whose `message` equals
    /// the unauthorized sentinel; any other decodable response counts as
    /// valid. The probe response is cached briefly ([`VALIDATION_TTL`]).
    pub async fn validate_token(&self, token: &str) -> Result<bool, GitLabError> {
        let response = self
            .read_with(PROBE_ENDPOINT, None, VALIDATION_TTL, Some(token))
            .await?;
        let unauthorized = matches!(
            &response,
            ApiValue::Record(record)
                if record.get_str("message") == Some(UNAUTHORIZED_MESSAGE)
        );
        Ok(!unauthorized)
    }

    /// Validate the token at most once per client instance.
    ///
    /// Calls targeting the probe endpoint never trigger validation and
    /// never touch the flag; the flag is set only after a success, so a
    /// failed probe does not suppress validation of later calls.
    fn ensure_validated<'a>(
        &'a self,
        url: &'a str,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<(), GitLabError>> + Send + 'a>> {
        Box::pin(async move {
            if self.validated.load(Ordering::Acquire) || url == PROBE_ENDPOINT {
                return Ok(());
            }
            // validate_token re-enters the read pipeline; box the future to
            // keep the recursive type finite.
            let probe: ProbeFuture<'_> = Box::pin(self.validate_token(token));
            if !probe.await? {
                return Err(GitLabError::InvalidToken {
                    token: token.to_string(),
                });
            }
            info!("token accepted by {}", self.base_url);
            self.validated.store(true, Ordering::Release);
            Ok(())
        })
    }

    /// Transport call plus decode, map, and error-payload classification.
    /// Failed attempts are recorded before the error propagates.
    async fn dispatch(
        &self,
        url: &str,
        request: &TransportRequest,
        params: Option<&Params>,
        started: Instant,
    ) -> Result<ApiValue, GitLabError> {
        let result = match self.transport.send(request).await {
            Ok(response) => self.interpret(url, &response.body),
            Err(failure) => Err(GitLabError::Transport {
                url: url.to_string(),
                detail: failure.detail,
            }),
        };
        if let Err(error) = &result {
            self.record(
                url,
                request.method,
                started.elapsed(),
                false,
                params,
                CallOutcome::Failed(error.to_string()),
            );
        }
        result
    }

    /// Decode the body as JSON, map it recursively, and reject error
    /// payloads.
    fn interpret(&self, url: &str, body: &str) -> Result<ApiValue, GitLabError> {
        let raw: serde_json::Value =
            serde_json::from_str(body).map_err(|error| GitLabError::MalformedResponse {
                url: url.to_string(),
                detail: error.to_string(),
            })?;
        let mapped = ApiValue::build(&raw, true);
        Self::check_error_payload(&mapped)?;
        Ok(mapped)
    }

    /// Error-payload rule, applied uniformly to reads and mutations: a
    /// top-level record (never a list) containing a field literally named
    /// `error`. Its fields are rendered as `key: value` lines and
    /// classified through [`ApiError::from_lines`].
    fn check_error_payload(mapped: &ApiValue) -> Result<(), GitLabError> {
        let Some(record) = mapped.as_record() else {
            return Ok(());
        };
        if !record.has("error") {
            return Ok(());
        }
        let lines: Vec<String> = record
            .iter()
            .map(|(key, value)| format!("{}: {}", key.to_string().trim(), value.to_json()))
            .collect();
        Err(GitLabError::Api(ApiError::from_lines(&lines)?))
    }

    /// Join the base URL and a relative path with exactly one separator.
    fn resolve_url(&self, url: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }

    fn record(
        &self,
        url: &str,
        method: Method,
        duration: Duration,
        is_cache: bool,
        params: Option<&Params>,
        outcome: CallOutcome,
    ) {
        self.recorder.append(CallRecord {
            base_url: self.base_url.clone(),
            url: url.to_string(),
            method: method.to_string(),
            duration,
            is_cache,
            data: params.map(|pairs| pairs.to_vec()),
            outcome,
            at: Utc::now(),
        });
    }
}
