//! Cache keys for aggregated Jira data.

use std::fmt;
use std::time::Duration;

/// TTL for board configurations (board list + active sprints).
pub const BOARDS_CONFIG_TTL: Duration = Duration::from_secs(120);
/// TTL for the de-duplicated sprint collection.
pub const SPRINT_COLLECTION_TTL: Duration = Duration::from_secs(1800);
/// TTL for per-board assignee / issue type vocabularies.
pub const BOARD_METADATA_TTL: Duration = Duration::from_secs(1800);

/// Everything the aggregator memoizes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheKey {
  /// Complete dashboard snapshot, per project filter
  Dashboard { projects: Option<Vec<String>> },
  /// Boards with their active sprints, per project filter
  BoardsConfig { projects: Option<Vec<String>> },
  /// Unique sprints across all boards
  SprintCollection,
  /// Assignees and issue types seen in one board's history
  BoardMetadata { board_id: u64 },
}

impl CacheKey {
  pub fn dashboard(projects: Option<&[String]>) -> Self {
    Self::Dashboard {
      projects: normalize_filter(projects),
    }
  }

  pub fn boards_config(projects: Option<&[String]>) -> Self {
    Self::BoardsConfig {
      projects: normalize_filter(projects),
    }
  }

  pub fn description(&self) -> String {
    match self {
      Self::Dashboard { projects } => match projects {
        Some(p) => format!("dashboard for projects {}", p.join(", ")),
        None => "dashboard".to_string(),
      },
      Self::BoardsConfig { projects } => match projects {
        Some(p) => format!("boards for projects {}", p.join(", ")),
        None => "all boards".to_string(),
      },
      Self::SprintCollection => "all sprints".to_string(),
      Self::BoardMetadata { board_id } => format!("board {} history metadata", board_id),
    }
  }
}

/// An empty filter means "no filter".
fn normalize_filter(projects: Option<&[String]>) -> Option<Vec<String>> {
  projects.filter(|p| !p.is_empty()).map(<[String]>::to_vec)
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Dashboard { projects: None } => write!(f, "dashboard-data"),
      Self::Dashboard { projects: Some(p) } => write!(f, "dashboard-data-{}", p.join(",")),
      Self::BoardsConfig { projects: None } => write!(f, "all-boards-config"),
      Self::BoardsConfig { projects: Some(p) } => write!(f, "all-boards-config-{}", p.join(",")),
      Self::SprintCollection => write!(f, "all-sprints-collection"),
      Self::BoardMetadata { board_id } => write!(f, "board-history-metadata-{}", board_id),
    }
  }
}
