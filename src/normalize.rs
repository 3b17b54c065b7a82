//! Mapping of raw Jira vocabulary onto the dashboard's fixed taxonomy.
//!
//! Boards in the wild mix English and Portuguese workflow names, custom
//! priority schemes and several story point fields. Everything here is a pure
//! function so the aggregator can call it from any number of tasks.

use serde::{Deserialize, Serialize};

use crate::jira::api_types::ApiIssueFields;

/// Canonical workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
  #[serde(rename = "Done")]
  Done,
  #[serde(rename = "In Progress")]
  InProgress,
  #[serde(rename = "In Review")]
  InReview,
  #[serde(rename = "To Do")]
  ToDo,
}

impl Status {
  pub fn is_done(self) -> bool {
    self == Status::Done
  }

  /// In Progress and In Review both count as work being carried.
  pub fn is_active(self) -> bool {
    matches!(self, Status::InProgress | Status::InReview)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Status::Done => "Done",
      Status::InProgress => "In Progress",
      Status::InReview => "In Review",
      Status::ToDo => "To Do",
    }
  }
}

/// Canonical priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
  High,
  Medium,
  Low,
}

impl Priority {
  pub fn as_str(self) -> &'static str {
    match self {
      Priority::High => "High",
      Priority::Medium => "Medium",
      Priority::Low => "Low",
    }
  }
}

/// Traffic-light squad health
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
  Green,
  Yellow,
  Red,
}

// ============================================================================
// Story points
// ============================================================================

type PointsField = fn(&ApiIssueFields) -> Option<f64>;

/// Candidate story point fields, highest precedence first.
const STORY_POINT_FIELDS: [PointsField; 3] = [
  |f| f.story_points,
  |f| f.customfield_10028, // "Story point estimate" (team-managed projects)
  |f| f.customfield_10016, // "Story Points" (company-managed projects)
];

/// First non-empty story point value, or 0.
///
/// Zero counts as empty so an explicit 0 in a higher-precedence field does not
/// hide a real estimate further down the list.
pub fn resolve_story_points(fields: &ApiIssueFields) -> f64 {
  STORY_POINT_FIELDS
    .iter()
    .filter_map(|field| field(fields))
    .find(|points| points.is_finite() && *points != 0.0)
    .unwrap_or(0.0)
}

// ============================================================================
// Status
// ============================================================================

const DONE_KEYWORDS: &[&str] = &[
  "done",
  "closed",
  "resolved",
  "concluído",
  "concluida",
  "finalizado",
  "completo",
];

const IN_PROGRESS_KEYWORDS: &[&str] = &[
  "em andamento",
  "em desenvolvimento",
  "fazendo",
  "doing",
  "working",
  "desenvolvimento",
  "coding",
];

/// Progress keywords that do not apply when the status is also "pendente"
/// (e.g. "Dev pendente" is still waiting, not in progress).
const GUARDED_PROGRESS_KEYWORDS: &[&str] = &["progress", "dev"];
const PROGRESS_EXCLUSIONS: &[&str] = &["pendente"];

const IN_REVIEW_KEYWORDS: &[&str] = &[
  "review",
  "revisão",
  "revisao",
  "qa",
  "test",
  "homologação",
  "homologacao",
];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
  needles.iter().any(|n| haystack.contains(n))
}

/// Map a raw status name onto the four canonical statuses.
///
/// Checked in order Done, In Progress, In Review; anything else is To Do.
pub fn normalize_status(name: &str) -> Status {
  let lower = name.to_lowercase();

  if contains_any(&lower, DONE_KEYWORDS) {
    return Status::Done;
  }

  let guarded_progress = contains_any(&lower, GUARDED_PROGRESS_KEYWORDS)
    && !contains_any(&lower, PROGRESS_EXCLUSIONS);
  if contains_any(&lower, IN_PROGRESS_KEYWORDS) || guarded_progress {
    return Status::InProgress;
  }

  if contains_any(&lower, IN_REVIEW_KEYWORDS) {
    return Status::InReview;
  }

  Status::ToDo
}

// ============================================================================
// Priority
// ============================================================================

const BLOCKER_KEYWORDS: &[&str] = &["blocker", "bloqueador"];
const HIGH_KEYWORDS: &[&str] = &["high", "critical", "alta", "crítica", "critica"];
const LOW_KEYWORDS: &[&str] = &["low", "trivial", "baixa"];

/// Map a raw priority name; absent or unknown priorities are Medium.
pub fn normalize_priority(name: Option<&str>) -> Priority {
  let lower = name.unwrap_or_default().to_lowercase();

  if contains_any(&lower, BLOCKER_KEYWORDS) || contains_any(&lower, HIGH_KEYWORDS) {
    return Priority::High;
  }
  if contains_any(&lower, LOW_KEYWORDS) {
    return Priority::Low;
  }
  Priority::Medium
}

/// Whether a raw priority name marks a blocker.
pub fn is_blocker_priority(name: Option<&str>) -> bool {
  let lower = name.unwrap_or_default().to_lowercase();
  contains_any(&lower, BLOCKER_KEYWORDS)
}

// ============================================================================
// Issue types and board names
// ============================================================================

/// Issue types are kept verbatim, only trimmed. Blank becomes "Unknown".
pub fn normalize_issue_type(name: &str) -> String {
  let trimmed = name.trim();
  if trimmed.is_empty() {
    "Unknown".to_string()
  } else {
    trimmed.to_string()
  }
}

const BOARD_QUALIFIERS: &[&str] = &["quadro", "board", "squad"];

const BOARD_ABBREVIATIONS: &[(&str, &str)] = &[
  ("CONT", "Squad de Content"),
  ("GWT", "Squad de Growth"),
  ("CHN", "Squad de Channel"),
  ("SCC", "Squad CW Cast/CW Class"),
  ("EM", "Equipe de Marketing"),
  ("CDM", "Campanhas de Marketing"),
  ("GH", "Growth Hacking"),
  ("IM", "Inbound Marketing"),
  ("CRON", "Cronograma do Marketing"),
  ("FDP", "Feedback de Produto"),
  ("FDI", "Forno de Ideias"),
  ("LDC", "Lideranças do CEO"),
  ("DEV", "Time de Produto da CW"),
  ("AO", "Agile Onboarding"),
  ("AC", "Atividades Comerciais"),
  ("BLOG", "Blog"),
  ("CHAP", "Chapters"),
  ("CRI", "Criação"),
];

const TEAM_WORDS: &[&str] = &["Squad", "Equipe", "Time"];

/// Turn a board name into the squad name shown on the dashboard.
///
/// - `"quadro GH"` -> `"Growth Hacking"`
/// - `"SCC board"` -> `"Squad CW Cast/CW Class"`
/// - `"Squad de Content"` -> unchanged
/// - `"XYZ"` -> `"Squad XYZ"`
pub fn format_board_name(name: &str) -> String {
  let trimmed = name.trim();
  if trimmed.is_empty() {
    return "Unknown Squad".to_string();
  }

  let cleaned = strip_qualifiers(trimmed);

  let upper = cleaned.to_uppercase();
  if let Some((_, full)) = BOARD_ABBREVIATIONS.iter().find(|(code, _)| *code == upper) {
    return full.to_string();
  }

  if looks_like_team_phrase(trimmed) {
    return trimmed.to_string();
  }

  if is_short_code(cleaned) {
    return format!("Squad {}", cleaned);
  }

  if cleaned.is_empty() {
    trimmed.to_string()
  } else {
    cleaned.to_string()
  }
}

/// Drop one leading and one trailing qualifier word, when separated by whitespace.
fn strip_qualifiers(name: &str) -> &str {
  let mut s = name;

  for q in BOARD_QUALIFIERS {
    if let Some(head) = s.get(..q.len()) {
      let rest = &s[q.len()..];
      if head.eq_ignore_ascii_case(q) && rest.starts_with(char::is_whitespace) {
        s = rest.trim_start();
        break;
      }
    }
  }

  for q in BOARD_QUALIFIERS {
    if s.len() > q.len() {
      let split = s.len() - q.len();
      if let (Some(head), Some(tail)) = (s.get(..split), s.get(split..)) {
        if tail.eq_ignore_ascii_case(q) && head.ends_with(char::is_whitespace) {
          s = head.trim_end();
          break;
        }
      }
    }
  }

  s.trim()
}

/// "Squad de Content", "Equipe de Marketing", "Time de Produto": a team word,
/// a lowercase connective, then a capitalized name.
fn looks_like_team_phrase(name: &str) -> bool {
  let Some(rest) = TEAM_WORDS.iter().find_map(|w| name.strip_prefix(w)) else {
    return false;
  };
  if !rest.starts_with(char::is_whitespace) {
    return false;
  }

  let rest = rest.trim_start();
  let connective_len = rest
    .find(|c: char| !c.is_ascii_lowercase())
    .unwrap_or(rest.len());
  if connective_len == 0 {
    return false;
  }

  let rest = &rest[connective_len..];
  if !rest.starts_with(char::is_whitespace) {
    return false;
  }
  rest
    .trim_start()
    .chars()
    .next()
    .is_some_and(|c| c.is_ascii_uppercase())
}

fn is_short_code(s: &str) -> bool {
  (2..=5).contains(&s.len()) && s.chars().all(|c| c.is_ascii_uppercase())
}

// ============================================================================
// Health
// ============================================================================

/// Classify squad health.
///
/// The rules overlap, so the order below is significant: the three-blocker
/// rule must win over any completion threshold.
pub fn determine_health(completion_pct: f64, blockers: u32, has_issues: bool) -> Health {
  if !has_issues {
    return Health::Yellow;
  }
  if blockers >= 3 {
    return Health::Red;
  }
  if completion_pct >= 70.0 && blockers == 0 {
    return Health::Green;
  }
  if completion_pct < 40.0 || blockers >= 2 {
    return Health::Red;
  }
  Health::Yellow
}

#[cfg(test)]
mod tests {
  use super::*;

  fn fields(story_points: Option<f64>, f28: Option<f64>, f16: Option<f64>) -> ApiIssueFields {
    ApiIssueFields {
      story_points,
      customfield_10028: f28,
      customfield_10016: f16,
      ..Default::default()
    }
  }

  #[test]
  fn test_story_points_precedence() {
    assert_eq!(resolve_story_points(&fields(Some(5.0), Some(3.0), Some(1.0))), 5.0);
    assert_eq!(resolve_story_points(&fields(None, Some(3.0), Some(1.0))), 3.0);
    assert_eq!(resolve_story_points(&fields(None, None, Some(8.0))), 8.0);
    assert_eq!(resolve_story_points(&fields(None, None, None)), 0.0);
  }

  #[test]
  fn test_story_points_zero_falls_through() {
    assert_eq!(resolve_story_points(&fields(Some(0.0), None, Some(2.0))), 2.0);
  }

  #[test]
  fn test_status_done_variants() {
    for name in ["Done", "DONE", "closed", "Resolved", "Concluído", "Finalizado"] {
      assert_eq!(normalize_status(name), Status::Done, "{}", name);
    }
  }

  #[test]
  fn test_status_in_progress_variants() {
    for name in ["In Progress", "Em andamento", "Fazendo", "Doing", "Dev", "Coding"] {
      assert_eq!(normalize_status(name), Status::InProgress, "{}", name);
    }
  }

  #[test]
  fn test_status_pending_excludes_progress_keywords() {
    assert_eq!(normalize_status("Dev pendente"), Status::ToDo);
    assert_eq!(normalize_status("Progress pendente"), Status::ToDo);
    // Unguarded progress keywords still win
    assert_eq!(normalize_status("Desenvolvimento pendente"), Status::InProgress);
  }

  #[test]
  fn test_status_review_variants() {
    for name in ["Code Review", "Em revisão", "QA", "Testing", "Homologação"] {
      assert_eq!(normalize_status(name), Status::InReview, "{}", name);
    }
  }

  #[test]
  fn test_status_is_total() {
    for name in ["", "Backlog", "Tarefas pendentes", "A Fazer", "???"] {
      assert_eq!(normalize_status(name), Status::ToDo, "{}", name);
    }
  }

  #[test]
  fn test_priority() {
    assert_eq!(normalize_priority(None), Priority::Medium);
    assert_eq!(normalize_priority(Some("")), Priority::Medium);
    assert_eq!(normalize_priority(Some("Blocker")), Priority::High);
    assert_eq!(normalize_priority(Some("not a BLOCKER really")), Priority::High);
    assert_eq!(normalize_priority(Some("Highest")), Priority::High);
    assert_eq!(normalize_priority(Some("Critical")), Priority::High);
    assert_eq!(normalize_priority(Some("Lowest")), Priority::Low);
    assert_eq!(normalize_priority(Some("Trivial")), Priority::Low);
    assert_eq!(normalize_priority(Some("Baixa")), Priority::Low);
    assert_eq!(normalize_priority(Some("Normal")), Priority::Medium);
  }

  #[test]
  fn test_blocker_priority() {
    assert!(is_blocker_priority(Some("Blocker")));
    assert!(!is_blocker_priority(Some("High")));
    assert!(!is_blocker_priority(None));
  }

  #[test]
  fn test_issue_type() {
    assert_eq!(normalize_issue_type("  Story "), "Story");
    assert_eq!(normalize_issue_type("   "), "Unknown");
    assert_eq!(normalize_issue_type(""), "Unknown");
    assert_eq!(normalize_issue_type("Sub-task"), "Sub-task");
  }

  #[test]
  fn test_board_names() {
    assert_eq!(format_board_name("quadro GH"), "Growth Hacking");
    assert_eq!(format_board_name("quadro LDC"), "Lideranças do CEO");
    assert_eq!(format_board_name("SCC board"), "Squad CW Cast/CW Class");
    assert_eq!(format_board_name("CONT"), "Squad de Content");
    assert_eq!(format_board_name("gwt"), "Squad de Growth");
    assert_eq!(format_board_name("Squad de Content"), "Squad de Content");
    assert_eq!(format_board_name(""), "Unknown Squad");
    assert_eq!(format_board_name("XYZ"), "Squad XYZ");
    assert_eq!(format_board_name("Platform board"), "Platform");
    assert_eq!(format_board_name("board"), "board");
  }

  #[test]
  fn test_health_examples() {
    assert_eq!(determine_health(80.0, 0, true), Health::Green);
    assert_eq!(determine_health(30.0, 0, true), Health::Red);
    assert_eq!(determine_health(70.0, 3, true), Health::Red);
    assert_eq!(determine_health(60.0, 0, true), Health::Yellow);
    assert_eq!(determine_health(80.0, 1, true), Health::Yellow);
    assert_eq!(determine_health(50.0, 2, true), Health::Red);
    assert_eq!(determine_health(100.0, 0, false), Health::Yellow);
  }

  #[test]
  fn test_health_three_blockers_always_red() {
    for pct in 0..=100 {
      for blockers in 3..10 {
        assert_eq!(
          determine_health(pct as f64, blockers, true),
          Health::Red,
          "pct={} blockers={}",
          pct,
          blockers
        );
      }
    }
  }
}
