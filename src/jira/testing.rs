//! Scripted transport for driving the client without a network.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::error::JiraError;
use super::transport::{RawResponse, Transport};

/// Query parameters of one recorded request.
pub type Query = HashMap<String, String>;

type Handler = Box<dyn Fn(&str, &Query) -> Result<RawResponse, JiraError> + Send + Sync>;

/// Answers every request through a handler closure and records the calls.
pub struct ScriptedTransport {
  handler: Handler,
  calls: Mutex<Vec<(String, Query)>>,
}

impl ScriptedTransport {
  pub fn new<F>(handler: F) -> Self
  where
    F: Fn(&str, &Query) -> Result<RawResponse, JiraError> + Send + Sync + 'static,
  {
    Self {
      handler: Box::new(handler),
      calls: Mutex::new(Vec::new()),
    }
  }

  pub fn calls(&self) -> Vec<(String, Query)> {
    self.calls.lock().unwrap().clone()
  }

  /// Number of requests whose path is exactly `path`.
  pub fn count(&self, path: &str) -> usize {
    self
      .calls
      .lock()
      .unwrap()
      .iter()
      .filter(|(p, _)| p == path)
      .count()
  }
}

#[async_trait]
impl Transport for ScriptedTransport {
  async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<RawResponse, JiraError> {
    let query: Query = query
      .iter()
      .map(|(k, v)| (k.to_string(), v.clone()))
      .collect();
    self
      .calls
      .lock()
      .unwrap()
      .push((path.to_string(), query.clone()));
    (self.handler)(path, &query)
  }
}

pub fn json_ok(body: serde_json::Value) -> Result<RawResponse, JiraError> {
  Ok(RawResponse {
    status: 200,
    body: body.to_string(),
  })
}

pub fn status(code: u16) -> Result<RawResponse, JiraError> {
  Ok(RawResponse {
    status: code,
    body: format!(r#"{{"errorMessages":["status {}"]}}"#, code),
  })
}

/// Parse a numeric query parameter, defaulting to 0.
pub fn param(query: &Query, name: &str) -> u64 {
  query.get(name).and_then(|v| v.parse().ok()).unwrap_or(0)
}

/// Slice `items` the way Jira pages a `values` endpoint.
pub fn values_page(items: &[serde_json::Value], query: &Query) -> Result<RawResponse, JiraError> {
  let start = param(query, "startAt") as usize;
  let max = match param(query, "maxResults") as usize {
    0 => 50,
    n => n,
  };
  let end = (start + max).min(items.len());
  let page: Vec<_> = items.get(start..end).unwrap_or_default().to_vec();
  json_ok(serde_json::json!({
    "startAt": start,
    "maxResults": max,
    "total": items.len(),
    "isLast": end >= items.len(),
    "values": page,
  }))
}

/// Slice `issues` the way Jira pages an issue endpoint.
pub fn issues_page(issues: &[serde_json::Value], query: &Query) -> Result<RawResponse, JiraError> {
  let start = param(query, "startAt") as usize;
  let max = match param(query, "maxResults") as usize {
    0 => 50,
    n => n,
  };
  let end = (start + max).min(issues.len());
  let page: Vec<_> = issues.get(start..end).unwrap_or_default().to_vec();
  json_ok(serde_json::json!({
    "startAt": start,
    "maxResults": max,
    "total": issues.len(),
    "issues": page,
  }))
}

pub fn board(id: u64, name: &str, kind: &str) -> serde_json::Value {
  serde_json::json!({ "id": id, "name": name, "type": kind })
}

pub fn sprint(id: u64, name: &str, state: &str, start: Option<&str>) -> serde_json::Value {
  serde_json::json!({
    "id": id,
    "name": name,
    "state": state,
    "startDate": start,
  })
}

pub fn issue(key: &str, status: &str, points: f64) -> serde_json::Value {
  serde_json::json!({
    "id": key,
    "key": key,
    "fields": {
      "summary": format!("Work on {}", key),
      "status": { "name": status },
      "priority": { "name": "Medium" },
      "issuetype": { "name": "Story" },
      "created": "2024-01-02T10:00:00.000+0000",
      "customfield_10016": points,
    }
  })
}
