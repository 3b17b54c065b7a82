//! HTTP seam between the Jira client and the network.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use std::time::Duration;
use url::Url;

use super::error::JiraError;

/// Per-call timeout for every request to Jira.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const AGILE_API_PATH: &str = "/rest/agile/1.0";

/// Raw answer from the remote API, before status interpretation.
#[derive(Debug, Clone)]
pub struct RawResponse {
  pub status: u16,
  pub body: String,
}

impl RawResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// Issues a single GET against the Jira Agile API.
///
/// `path` is relative to the Agile API root (e.g. `/board/1/sprint`).
/// Implementations return any HTTP status as a `RawResponse`; only failures
/// to obtain a response at all are errors.
#[async_trait]
pub trait Transport: Send + Sync {
  async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<RawResponse, JiraError>;
}

/// Basic auth pair for Jira Cloud: account email + API token.
#[derive(Clone)]
pub struct Credentials {
  pub email: String,
  pub token: String,
}

impl std::fmt::Debug for Credentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Credentials")
      .field("email", &self.email)
      .field("token", &"<redacted>")
      .finish()
  }
}

/// reqwest-backed transport talking HTTPS to `https://{domain}`.
#[derive(Clone)]
pub struct ReqwestTransport {
  client: reqwest::Client,
  base_url: Url,
  credentials: Credentials,
}

impl ReqwestTransport {
  pub fn new(domain: &str, credentials: Credentials) -> Result<Self, JiraError> {
    let base_url = Url::parse(&format!("https://{}{}", domain.trim_end_matches('/'), AGILE_API_PATH))
      .map_err(|e| JiraError::Transport(format!("invalid Jira domain {:?}: {}", domain, e)))?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let client = reqwest::Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .default_headers(headers)
      .build()
      .map_err(|e| JiraError::Transport(format!("failed to build HTTP client: {}", e)))?;

    Ok(Self {
      client,
      base_url,
      credentials,
    })
  }

  fn url_for(&self, path: &str, query: &[(&str, String)]) -> Url {
    let mut url = self.base_url.clone();
    url.set_path(&format!("{}{}", self.base_url.path(), path));
    if !query.is_empty() {
      url
        .query_pairs_mut()
        .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
    }
    url
  }
}

#[async_trait]
impl Transport for ReqwestTransport {
  async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<RawResponse, JiraError> {
    let url = self.url_for(path, query);

    let response = self
      .client
      .get(url)
      .basic_auth(&self.credentials.email, Some(&self.credentials.token))
      .send()
      .await
      .map_err(classify_reqwest_error)?;

    let status = response.status().as_u16();
    let body = response.text().await.map_err(classify_reqwest_error)?;

    Ok(RawResponse { status, body })
  }
}

fn classify_reqwest_error(err: reqwest::Error) -> JiraError {
  if err.is_timeout() {
    JiraError::Timeout(err.to_string())
  } else if err.is_connect() {
    JiraError::Unreachable(err.to_string())
  } else {
    JiraError::Transport(err.to_string())
  }
}
