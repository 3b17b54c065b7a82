use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// Board kind as reported by Jira. Boards of any other kind ("simple")
/// have no sprints and are treated like kanban boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardKind {
  Scrum,
  #[serde(other)]
  Kanban,
}

/// Board summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
  pub id: u64,
  pub name: String,
  pub kind: BoardKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SprintState {
  Active,
  Closed,
  Future,
}

/// Sprint as fetched from a board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
  pub id: u64,
  pub name: String,
  pub state: SprintState,
  pub start_date: Option<DateTime<FixedOffset>>,
  pub end_date: Option<DateTime<FixedOffset>>,
  pub goal: Option<String>,
}

impl Sprint {
  pub fn start_day(&self) -> Option<NaiveDate> {
    self.start_date.map(|d| d.date_naive())
  }

  pub fn end_day(&self) -> Option<NaiveDate> {
    self.end_date.map(|d| d.date_naive())
  }
}

/// Issue with its story points already resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
  pub id: String,
  pub key: String,
  pub summary: String,
  pub status: String,
  pub priority: Option<String>,
  pub assignee: Option<String>,
  pub issue_type: String,
  pub created: Option<DateTime<FixedOffset>>,
  pub resolved: Option<DateTime<FixedOffset>>,
  pub flagged: bool,
  pub story_points: f64,
}

/// A board and its active sprint, if it has one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardContext {
  pub board: Board,
  pub sprint: Option<Sprint>,
}
