//! GitLab REST API (v4) client with response caching and call telemetry
//!
//! This crate drives every API call through one pipeline: validate the
//! token once per client, fingerprint the request, serve read hits from a
//! pluggable cache, otherwise dispatch through a swappable transport,
//! map the JSON body into dynamic records, and classify error payloads
//! into typed failures. Every attempt lands in an append-only call log.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 GitLabClient<T: Transport>           │
//! │   read() / read_with()        mutate() / mutate_with()│
//! │        │                              │              │
//! │   fingerprint ──► ResponseCache   (never cached)      │
//! │        │                              │              │
//! │        └────────► Transport ◄─────────┘              │
//! │                      │                               │
//! │            decode ──► ApiValue / ApiRecord           │
//! │                      │                               │
//! │            error payload ──► ApiError                │
//! │                      │                               │
//! │                   CallLog (telemetry)                │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use gitlab_client::{GitLabClient, ApiCache};
//! use std::sync::{Arc, Mutex};
//!
//! # async fn example() -> Result<(), gitlab_client::GitLabError> {
//! let mut client = GitLabClient::new("glpat-...");
//! client.set_cache(Arc::new(Mutex::new(ApiCache::new())));
//!
//! let projects = client.read("projects", None).await?;
//! for item in projects.as_list().unwrap_or_default() {
//!     if let Some(project) = item.as_record() {
//!         println!("{:?}", project.get_str("name"));
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod error;
pub mod record;
pub mod telemetry;
pub mod token;
pub mod transport;

pub use cache::{fingerprint, ResponseCache};
pub use client::{
    GitLabClient, Params, DEFAULT_BASE_URL, DEFAULT_READ_TTL, PROBE_ENDPOINT, VALIDATION_TTL,
};
pub use error::{ApiError, GitLabError, DEFAULT_ERROR_KIND, INVALID_TOKEN_KIND};
pub use record::{ApiRecord, ApiValue, RecordKey};
pub use telemetry::{CallLog, CallOutcome, CallRecord, CallStats};
pub use token::TokenProvider;
pub use transport::{
    HttpTransport, Method, Transport, TransportFailure, TransportRequest, TransportResponse,
    PRIVATE_TOKEN_HEADER,
};

// Re-export the cache store so consumers don't need to depend on it directly.
pub use gitlab_api_cache::{ApiCache, CacheStats, CachedResponse};
