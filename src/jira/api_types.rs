//! Serde-deserializable types matching Jira Agile API responses.
//!
//! These types are separate from domain types to allow lenient deserialization
//! while keeping domain types focused on what the dashboard needs.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Deserializer};

use super::types::{Board, BoardKind, Issue, Sprint, SprintState};
use crate::normalize::resolve_story_points;

// ============================================================================
// Pagination envelopes
// ============================================================================

/// `values` page used by the board and sprint endpoints.
#[derive(Debug, Deserialize)]
pub struct ApiValuesPage<T> {
  #[serde(default = "Vec::new")]
  pub values: Vec<T>,
  #[serde(rename = "startAt", default)]
  pub start_at: u64,
  #[serde(rename = "maxResults", default)]
  pub max_results: u64,
  #[serde(default)]
  pub total: Option<u64>,
  #[serde(rename = "isLast", default)]
  pub is_last: bool,
}

/// `issues` page used by the board and sprint issue endpoints.
#[derive(Debug, Deserialize)]
pub struct ApiIssuesPage {
  #[serde(default)]
  pub issues: Vec<ApiIssue>,
  #[serde(rename = "startAt", default)]
  pub start_at: u64,
  #[serde(rename = "maxResults", default)]
  pub max_results: u64,
  #[serde(default)]
  pub total: u64,
}

/// Error body Jira sends alongside non-2xx answers.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
  #[serde(rename = "errorMessages", default)]
  pub error_messages: Vec<String>,
  #[serde(default)]
  pub message: Option<String>,
}

impl ApiErrorBody {
  /// First human-readable message in an error body, if any.
  pub fn first_message(body: &str) -> Option<String> {
    let parsed: ApiErrorBody = serde_json::from_str(body).ok()?;
    parsed
      .error_messages
      .into_iter()
      .next()
      .or(parsed.message)
      .filter(|m| !m.trim().is_empty())
  }
}

// ============================================================================
// Boards and sprints
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiBoard {
  pub id: u64,
  #[serde(default)]
  pub name: String,
  #[serde(rename = "type")]
  pub kind: BoardKind,
}

#[derive(Debug, Deserialize)]
pub struct ApiSprint {
  pub id: u64,
  #[serde(default)]
  pub name: String,
  pub state: SprintState,
  #[serde(rename = "startDate")]
  pub start_date: Option<String>,
  #[serde(rename = "endDate")]
  pub end_date: Option<String>,
  pub goal: Option<String>,
}

// ============================================================================
// Issues
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiNamed {
  #[serde(default)]
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiUser {
  #[serde(rename = "displayName")]
  pub display_name: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ApiIssueFields {
  #[serde(default)]
  pub summary: String,
  pub status: Option<ApiNamed>,
  pub priority: Option<ApiNamed>,
  pub assignee: Option<ApiUser>,
  #[serde(rename = "issuetype")]
  pub issue_type: Option<ApiNamed>,
  #[serde(default)]
  pub created: String,
  #[serde(rename = "resolutiondate")]
  pub resolution_date: Option<String>,
  #[serde(default, deserialize_with = "deserialize_flag")]
  pub flagged: bool,
  // Story points live in different fields depending on the Jira instance
  #[serde(default, deserialize_with = "deserialize_points")]
  pub story_points: Option<f64>,
  #[serde(default, deserialize_with = "deserialize_points")]
  pub customfield_10028: Option<f64>,
  #[serde(default, deserialize_with = "deserialize_points")]
  pub customfield_10016: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ApiIssue {
  #[serde(default)]
  pub id: String,
  pub key: String,
  #[serde(default)]
  pub fields: ApiIssueFields,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl From<ApiBoard> for Board {
  fn from(board: ApiBoard) -> Self {
    Board {
      id: board.id,
      name: board.name,
      kind: board.kind,
    }
  }
}

impl From<ApiSprint> for Sprint {
  fn from(sprint: ApiSprint) -> Self {
    Sprint {
      id: sprint.id,
      name: sprint.name,
      state: sprint.state,
      start_date: sprint.start_date.as_deref().and_then(parse_jira_timestamp),
      end_date: sprint.end_date.as_deref().and_then(parse_jira_timestamp),
      goal: sprint.goal.filter(|g| !g.trim().is_empty()),
    }
  }
}

impl From<ApiIssue> for Issue {
  fn from(issue: ApiIssue) -> Self {
    let f = issue.fields;
    let story_points = resolve_story_points(&f);
    Issue {
      id: issue.id,
      key: issue.key,
      summary: f.summary,
      status: f.status.map(|s| s.name).unwrap_or_default(),
      priority: f.priority.map(|p| p.name),
      assignee: f.assignee.map(|u| u.display_name),
      issue_type: f.issue_type.map(|t| t.name).unwrap_or_default(),
      created: parse_jira_timestamp(&f.created),
      resolved: f.resolution_date.as_deref().and_then(parse_jira_timestamp),
      flagged: f.flagged,
      story_points,
    }
  }
}

// ============================================================================
// Helpers
// ============================================================================

/// Parse the timestamp shapes Jira emits.
///
/// - `2024-01-05T10:00:00.000+0000` (issue fields)
/// - `2024-01-05T10:00:00.000Z` (sprint dates, RFC 3339)
/// - `2024-01-05` (treated as midnight UTC)
pub fn parse_jira_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
  let raw = raw.trim();
  if raw.is_empty() {
    return None;
  }

  DateTime::parse_from_rfc3339(raw)
    .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
    .ok()
    .or_else(|| {
      NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().fixed_offset())
    })
}

/// Accept numbers and numeric strings; anything else counts as absent.
fn deserialize_points<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<serde_json::Value>::deserialize(deserializer)?;
  Ok(match value {
    Some(serde_json::Value::Number(n)) => n.as_f64(),
    Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
    _ => None,
  })
}

/// `flagged` is a boolean on some instances and a list of flag objects
/// (e.g. `[{"value": "Impediment"}]`) on others.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<serde_json::Value>::deserialize(deserializer)?;
  Ok(match value {
    Some(serde_json::Value::Bool(b)) => b,
    Some(serde_json::Value::Array(items)) => !items.is_empty(),
    _ => false,
  })
}
