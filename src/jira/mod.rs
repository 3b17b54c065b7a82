//! Access to the Jira Agile REST API.

pub mod api_types;
pub mod cache;
pub mod client;
pub mod error;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::CacheKey;
pub use client::{JiraClient, DEFAULT_CLOSED_SPRINT_LIMIT};
pub use error::{ErrorCategory, JiraError};
pub use transport::{Credentials, RawResponse, ReqwestTransport, Transport};
pub use types::{Board, BoardContext, BoardKind, Issue, Sprint, SprintState};
