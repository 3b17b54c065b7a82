//! Error taxonomy for remote Jira access.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JiraError {
  /// 401 or 403 from the remote API.
  #[error("authentication failed ({status}): {message}")]
  Authentication { status: u16, message: String },

  /// 429 that was still returned after every retry.
  #[error("rate limit exceeded: {message}")]
  RateLimited { message: String },

  /// DNS failure or connection refused.
  #[error("Jira unreachable: {0}")]
  Unreachable(String),

  #[error("request to Jira timed out: {0}")]
  Timeout(String),

  /// Any other non-2xx response.
  #[error("Jira returned {status}: {message}")]
  Remote { status: u16, message: String },

  #[error("failed to decode {context}: {source}")]
  Decode {
    context: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("HTTP transport error: {0}")]
  Transport(String),
}

impl JiraError {
  /// Classify a non-2xx status. 429 only lands here once retries are exhausted.
  pub fn from_status(status: u16, message: String) -> Self {
    match status {
      401 | 403 => Self::Authentication { status, message },
      429 => Self::RateLimited { message },
      _ => Self::Remote { status, message },
    }
  }

  /// HTTP status returned by the remote side, when there was one.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Authentication { status, .. } | Self::Remote { status, .. } => Some(*status),
      Self::RateLimited { .. } => Some(429),
      _ => None,
    }
  }

  /// Network unreachable, timeout or a 5xx answer.
  pub fn is_unavailable(&self) -> bool {
    match self {
      Self::Unreachable(_) | Self::Timeout(_) => true,
      Self::Remote { status, .. } => *status >= 500,
      _ => false,
    }
  }
}

/// Caller-facing classification of a propagated failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
  AuthFailure,
  Timeout,
  Unavailable,
  RateLimited,
  Generic,
}

impl ErrorCategory {
  /// HTTP status a route layer should answer with.
  pub fn http_status(self) -> u16 {
    match self {
      Self::AuthFailure => 401,
      Self::Timeout => 504,
      Self::Unavailable => 503,
      Self::RateLimited => 429,
      Self::Generic => 500,
    }
  }

  /// Message safe to show to end users.
  pub fn user_message(self) -> &'static str {
    match self {
      Self::AuthFailure => "Authentication failed: invalid Jira credentials or access denied",
      Self::Timeout => "Request to Jira API timed out",
      Self::Unavailable => "Jira API is currently unavailable",
      Self::RateLimited => "Rate limit exceeded, please try again later",
      Self::Generic => "An unexpected error occurred",
    }
  }
}

impl From<&JiraError> for ErrorCategory {
  fn from(err: &JiraError) -> Self {
    match err {
      JiraError::Authentication { .. } => Self::AuthFailure,
      JiraError::Timeout(_) => Self::Timeout,
      JiraError::RateLimited { .. } => Self::RateLimited,
      e if e.is_unavailable() => Self::Unavailable,
      _ => Self::Generic,
    }
  }
}
