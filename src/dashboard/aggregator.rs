//! Dashboard aggregation.
//!
//! Boards are discovered once, then every per-board call (active sprint,
//! sprint issues, sprint list, history) fans out with bounded concurrency.
//! A board that fails is logged and left out; only board discovery can fail
//! the whole request. Results are memoized in the shared [`TtlCache`] at
//! several granularities, see [`CacheKey`].

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::charts::{cycle_time_by_type, priority_evolution, DayBuckets, PriorityTotals};
use super::squad::{fold_squad, UNASSIGNED};
use super::types::{DashboardSnapshot, SprintInfo};
use crate::cache::{TtlCache, DEFAULT_TTL};
use crate::jira::cache::{BOARDS_CONFIG_TTL, BOARD_METADATA_TTL, SPRINT_COLLECTION_TTL};
use crate::jira::{Board, BoardContext, CacheKey, ErrorCategory, JiraClient, JiraError, Sprint};
use crate::normalize::{format_board_name, normalize_issue_type};

/// Only the first boards are scanned for filter vocabularies.
const HISTORY_ENRICHMENT_BOARDS: usize = 3;

#[derive(Debug, Error)]
pub enum DashboardError {
  #[error(transparent)]
  Jira(#[from] JiraError),

  #[error("no boards found")]
  NoBoards,
}

impl DashboardError {
  pub fn category(&self) -> ErrorCategory {
    match self {
      Self::Jira(e) => e.into(),
      Self::NoBoards => ErrorCategory::Unavailable,
    }
  }
}

#[derive(Debug, Clone)]
pub struct AggregatorSettings {
  /// How long a complete snapshot is served from cache
  pub snapshot_ttl: Duration,
  /// Upper bound on in-flight per-board requests
  pub max_concurrent_boards: usize,
}

impl Default for AggregatorSettings {
  fn default() -> Self {
    Self {
      snapshot_ttl: DEFAULT_TTL,
      max_concurrent_boards: 8,
    }
  }
}

/// Assignees and issue types seen in one board's full history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct BoardMetadata {
  assignees: Vec<String>,
  types: Vec<String>,
}

pub struct DashboardAggregator {
  client: JiraClient,
  cache: TtlCache,
  settings: AggregatorSettings,
  clock: fn() -> DateTime<Utc>,
}

impl DashboardAggregator {
  pub fn new(client: JiraClient, cache: TtlCache) -> Self {
    Self::with_settings(client, cache, AggregatorSettings::default())
  }

  pub fn with_settings(client: JiraClient, cache: TtlCache, settings: AggregatorSettings) -> Self {
    Self {
      client,
      cache,
      settings,
      clock: Utc::now,
    }
  }

  /// Replace the wall clock used for day buckets, ages and fallback dates.
  pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
    self.clock = clock;
    self
  }

  fn concurrency(&self) -> usize {
    self.settings.max_concurrent_boards.max(1)
  }

  /// Store a value, logging instead of failing when it cannot be encoded.
  fn remember<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T, ttl: Duration) {
    if let Err(e) = self.cache.set_with_ttl(&key.to_string(), value, ttl) {
      warn!(key = %key, error = %e, "failed to cache {}", key.description());
    }
  }

  /// The dashboard snapshot for an optional project filter, from cache when fresh.
  pub async fn dashboard_snapshot(
    &self,
    project_keys: Option<&[String]>,
  ) -> Result<DashboardSnapshot, DashboardError> {
    let key = CacheKey::dashboard(project_keys);
    if let Some(snapshot) = self.cache.get::<DashboardSnapshot>(&key.to_string()) {
      info!(key = %key, "serving cached dashboard");
      return Ok(snapshot);
    }

    let contexts = self.fetch_all_boards_data(project_keys).await?;
    let snapshot = self.aggregate_squads_data(&contexts).await;
    self.remember(&key, &snapshot, self.settings.snapshot_ttl);

    Ok(snapshot)
  }

  /// Boards paired with their active sprint.
  ///
  /// A board whose sprint lookup fails is kept with no sprint.
  pub async fn fetch_all_boards_data(
    &self,
    project_keys: Option<&[String]>,
  ) -> Result<Vec<BoardContext>, DashboardError> {
    let key = CacheKey::boards_config(project_keys);
    if let Some(contexts) = self.cache.get::<Vec<BoardContext>>(&key.to_string()) {
      info!(key = %key, count = contexts.len(), "using cached board configuration");
      return Ok(contexts);
    }

    let boards = self.client.list_boards(project_keys).await?;
    if boards.is_empty() {
      return Err(DashboardError::NoBoards);
    }

    let client = &self.client;
    let contexts: Vec<BoardContext> = stream::iter(boards)
      .map(|board| async move {
        let sprint = match client.get_active_sprint(board.id).await {
          Ok(sprint) => sprint,
          Err(e) => {
            warn!(board_id = board.id, error = %e, "active sprint lookup failed");
            None
          }
        };
        BoardContext { board, sprint }
      })
      .buffered(self.concurrency())
      .collect()
      .await;

    let active = contexts.iter().filter(|c| c.sprint.is_some()).count();
    info!(boards = contexts.len(), active_sprints = active, "board configuration loaded");

    self.remember(&key, &contexts, BOARDS_CONFIG_TTL);
    Ok(contexts)
  }

  /// Every sprint across the given boards, newest first, de-duplicated by id.
  pub async fn collect_all_sprints(&self, contexts: &[BoardContext]) -> Vec<SprintInfo> {
    let key = CacheKey::SprintCollection;
    if let Some(sprints) = self.cache.get::<Vec<SprintInfo>>(&key.to_string()) {
      debug!(count = sprints.len(), "using cached sprint collection");
      return sprints;
    }

    let client = &self.client;
    let per_board: Vec<Vec<Sprint>> = stream::iter(contexts)
      .map(|ctx| async move {
        match client.get_all_sprints(ctx.board.id).await {
          Ok(sprints) => {
            debug!(board_id = ctx.board.id, count = sprints.len(), "sprints fetched");
            sprints
          }
          Err(e) => {
            warn!(board_id = ctx.board.id, error = %e, "failed to fetch sprints");
            Vec::new()
          }
        }
      })
      .buffered(self.concurrency())
      .collect()
      .await;

    let mut seen = HashSet::new();
    let mut sprints: Vec<SprintInfo> = per_board
      .into_iter()
      .flatten()
      .filter(|s| seen.insert(s.id))
      .map(|s| sprint_listing(&s))
      .collect();

    // Sprints that never started sort after everything else
    sprints.sort_by(|a, b| match (a.start_date.is_empty(), b.start_date.is_empty()) {
      (true, true) => Ordering::Equal,
      (true, false) => Ordering::Greater,
      (false, true) => Ordering::Less,
      (false, false) => b.start_date.cmp(&a.start_date),
    });

    info!(count = sprints.len(), "collected unique sprints");
    self.remember(&key, &sprints, SPRINT_COLLECTION_TTL);
    sprints
  }

  /// Fold every board's active sprint into one snapshot.
  pub async fn aggregate_squads_data(&self, contexts: &[BoardContext]) -> DashboardSnapshot {
    let now = (self.clock)();
    let today = now.date_naive().format("%Y-%m-%d").to_string();

    let mut sprint = headline_sprint(contexts, &today);

    let client = &self.client;
    let outcomes: Vec<_> = stream::iter(contexts)
      .map(|ctx| async move {
        let outcome = match &ctx.sprint {
          None => Ok(None),
          Some(sprint) => client
            .get_sprint_issues(ctx.board.id, sprint.id)
            .await
            .map(|issues| Some(fold_squad(&ctx.board, sprint, &issues, now))),
        };
        (&ctx.board, outcome)
      })
      .buffered(self.concurrency())
      .collect()
      .await;

    let mut squads = Vec::new();
    let mut alerts = Vec::new();
    let mut tasks = Vec::new();
    let mut work_item_age = Vec::new();
    let mut person_distribution = BTreeMap::new();
    let mut day_buckets = DayBuckets::new(now.date_naive());
    let mut priorities = PriorityTotals::default();

    for (board, outcome) in outcomes {
      let contribution = match outcome {
        Ok(Some(c)) => c,
        Ok(None) => {
          debug!(board_id = board.id, "no active sprint, skipping board");
          continue;
        }
        Err(e) => {
          warn!(board_id = board.id, name = %board.name, error = %e, "board failed, leaving it out");
          continue;
        }
      };

      info!(
        board_id = board.id,
        tasks = contribution.tasks.len(),
        blockers = contribution.squad.blockers,
        completion = contribution.squad.completion_percentage,
        "board processed"
      );

      sprint.total_story_points += contribution.squad.story_points.total;
      sprint.completed_story_points += contribution.squad.story_points.completed;
      day_buckets.merge(&contribution.day_buckets);
      priorities.merge(&contribution.priorities);
      person_distribution.insert(contribution.squad.id.clone(), contribution.people);
      alerts.extend(contribution.alert);
      tasks.extend(contribution.tasks);
      work_item_age.extend(contribution.work_item_age);
      squads.push(contribution.squad);
    }

    info!(squads = squads.len(), tasks = tasks.len(), "aggregation complete");

    let available_sprints = self.collect_all_sprints(contexts).await;

    let mut assignees: BTreeSet<String> = tasks.iter().map(|t| t.assignee.clone()).collect();
    let mut issue_types: BTreeSet<String> = tasks.iter().map(|t| t.issue_type.clone()).collect();
    for metadata in self.enrich_from_history(contexts).await {
      assignees.extend(metadata.assignees);
      issue_types.extend(metadata.types);
    }
    info!(
      assignees = assignees.len(),
      issue_types = issue_types.len(),
      "filter vocabularies collected"
    );

    DashboardSnapshot {
      sprint,
      squads,
      alerts,
      created_vs_completed: day_buckets.into_points(),
      cumulative_flow: Vec::new(),
      cycle_time_by_type: cycle_time_by_type(&tasks),
      time_in_status: Vec::new(),
      priority_evolution: priority_evolution(priorities),
      person_distribution,
      tasks,
      work_item_age,
      available_sprints,
      available_assignees: assignees.into_iter().collect(),
      available_issue_types: issue_types.into_iter().collect(),
    }
  }

  /// Vocabularies from the history of the first few boards. Failures yield nothing.
  async fn enrich_from_history(&self, contexts: &[BoardContext]) -> Vec<BoardMetadata> {
    stream::iter(contexts.iter().take(HISTORY_ENRICHMENT_BOARDS))
      .map(|ctx| async move {
        match self.board_metadata(&ctx.board).await {
          Ok(metadata) => metadata,
          Err(e) => {
            warn!(board_id = ctx.board.id, error = %e, "board history unavailable");
            BoardMetadata::default()
          }
        }
      })
      .buffered(self.concurrency())
      .collect()
      .await
  }

  async fn board_metadata(&self, board: &Board) -> Result<BoardMetadata, JiraError> {
    let key = CacheKey::BoardMetadata { board_id: board.id };
    if let Some(metadata) = self.cache.get::<BoardMetadata>(&key.to_string()) {
      return Ok(metadata);
    }

    let issues = self.client.get_board_history(board.id).await?;
    let assignees: BTreeSet<String> = issues
      .iter()
      .map(|i| i.assignee.clone().unwrap_or_else(|| UNASSIGNED.to_string()))
      .collect();
    let types: BTreeSet<String> = issues
      .iter()
      .map(|i| normalize_issue_type(&i.issue_type))
      .collect();

    let metadata = BoardMetadata {
      assignees: assignees.into_iter().collect(),
      types: types.into_iter().collect(),
    };
    self.remember(&key, &metadata, BOARD_METADATA_TTL);
    Ok(metadata)
  }

  /// Drop cached entries.
  pub fn invalidate(&self, keys: &[CacheKey]) {
    for key in keys {
      self.cache.invalidate(&key.to_string());
      info!(key = %key, "invalidated {}", key.description());
    }
  }

  /// Drop the snapshot and board configuration cached for a project filter.
  pub fn invalidate_dashboard(&self, project_keys: Option<&[String]>) {
    self.invalidate(&[
      CacheKey::dashboard(project_keys),
      CacheKey::boards_config(project_keys),
    ]);
  }
}

fn format_day(date: Option<DateTime<chrono::FixedOffset>>) -> Option<String> {
  date.map(|d| d.date_naive().format("%Y-%m-%d").to_string())
}

fn sprint_listing(sprint: &Sprint) -> SprintInfo {
  SprintInfo {
    id: sprint.id.to_string(),
    name: sprint.name.clone(),
    number: sprint.id,
    start_date: format_day(sprint.start_date).unwrap_or_default(),
    end_date: format_day(sprint.end_date).unwrap_or_default(),
    total_story_points: 0.0,
    completed_story_points: 0.0,
    goal: sprint.goal.clone().unwrap_or_default(),
  }
}

/// Summary of the first active sprint in board order, with every squad's goal.
fn headline_sprint(contexts: &[BoardContext], today: &str) -> SprintInfo {
  let mut goals: Vec<String> = Vec::new();
  for ctx in contexts {
    let Some(goal) = ctx.sprint.as_ref().and_then(|s| s.goal.as_deref()) else {
      continue;
    };
    let entry = format!("[{}] {}", format_board_name(&ctx.board.name), goal);
    if !goals.contains(&entry) {
      goals.push(entry);
    }
  }
  let goal = goals.join(" • ");

  match contexts.iter().find_map(|c| c.sprint.as_ref()) {
    Some(sprint) => SprintInfo {
      id: sprint.id.to_string(),
      name: sprint.name.clone(),
      number: sprint.id,
      start_date: format_day(sprint.start_date).unwrap_or_else(|| today.to_string()),
      end_date: format_day(sprint.end_date).unwrap_or_else(|| today.to_string()),
      total_story_points: 0.0,
      completed_story_points: 0.0,
      goal,
    },
    None => SprintInfo {
      id: "no-active-sprint".to_string(),
      name: "No Active Sprint".to_string(),
      number: 0,
      start_date: today.to_string(),
      end_date: today.to_string(),
      total_story_points: 0.0,
      completed_story_points: 0.0,
      goal,
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dashboard::types::AlertKind;
  use crate::jira::testing::{
    board, issue, issues_page, sprint, status, values_page, Query, ScriptedTransport,
  };
  use crate::jira::types::{BoardKind, SprintState};
  use crate::jira::RawResponse;
  use chrono::TimeZone;
  use serde_json::{json, Value};
  use std::sync::Arc;

  fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
  }

  fn aggregator(transport: &Arc<ScriptedTransport>) -> DashboardAggregator {
    DashboardAggregator::new(JiraClient::with_transport(transport.clone()), TtlCache::new())
      .with_clock(fixed_now)
  }

  fn is_active_query(q: &Query) -> bool {
    q.get("state").map(String::as_str) == Some("active")
  }

  fn growth_sprint() -> Value {
    let mut s = sprint(10, "GH Sprint 1", "active", Some("2024-01-08T09:00:00.000Z"));
    s["goal"] = json!("Ship onboarding");
    s
  }

  /// Board 1 has an active sprint with 13 SP, board 2 is a kanban board.
  fn two_boards(path: &str, q: &Query) -> Result<RawResponse, JiraError> {
    match path {
      "/board" => values_page(&[board(1, "quadro GH", "scrum"), board(2, "CONT", "kanban")], q),
      "/board/1/sprint" if is_active_query(q) => values_page(&[growth_sprint()], q),
      "/board/1/sprint" => values_page(
        &[
          growth_sprint(),
          sprint(9, "GH Sprint 0", "closed", Some("2023-12-25T09:00:00.000Z")),
        ],
        q,
      ),
      "/board/1/sprint/10/issue" => issues_page(
        &[
          issue("GH-1", "Done", 5.0),
          issue("GH-2", "Done", 5.0),
          issue("GH-3", "In Progress", 3.0),
        ],
        q,
      ),
      "/board/1/issue" => {
        let mut old = issue("GH-0", "Done", 1.0);
        old["fields"]["assignee"] = json!({ "displayName": "Bruna" });
        old["fields"]["issuetype"] = json!({ "name": "Bug" });
        issues_page(&[old], q)
      }
      "/board/2/sprint" => status(400),
      "/board/2/issue" => issues_page(&[], q),
      _ => status(404),
    }
  }

  #[tokio::test]
  async fn test_snapshot_skips_boards_without_sprint() {
    let transport = Arc::new(ScriptedTransport::new(two_boards));

    let snapshot = aggregator(&transport).dashboard_snapshot(None).await.unwrap();

    assert_eq!(snapshot.squads.len(), 1);
    let squad = &snapshot.squads[0];
    assert_eq!(squad.id, "board-1");
    assert_eq!(squad.name, "Growth Hacking");
    assert_eq!(squad.completion_percentage, 77);
    assert!(snapshot.alerts.is_empty());

    assert_eq!(snapshot.sprint.id, "10");
    assert_eq!(snapshot.sprint.number, 10);
    assert_eq!(snapshot.sprint.start_date, "2024-01-08");
    assert_eq!(snapshot.sprint.end_date, "2024-01-15");
    assert_eq!(snapshot.sprint.goal, "[Growth Hacking] Ship onboarding");
    assert_eq!(snapshot.sprint.total_story_points, 13.0);
    assert_eq!(snapshot.sprint.completed_story_points, 10.0);

    assert_eq!(snapshot.tasks.len(), 3);
    assert_eq!(snapshot.work_item_age.len(), 1);
    assert_eq!(snapshot.work_item_age[0].age, 13);
    assert!(snapshot.person_distribution.contains_key("board-1"));
    assert_eq!(snapshot.created_vs_completed.len(), 15);
    let jan2 = snapshot
      .created_vs_completed
      .iter()
      .find(|p| p.date == "Jan 2")
      .unwrap();
    assert_eq!(jan2.created, 13.0);
    assert_eq!(snapshot.cycle_time_by_type.len(), 1);
    assert_eq!(snapshot.priority_evolution[10].medium, 13.0);
    assert!(snapshot.cumulative_flow.is_empty());
    assert!(snapshot.time_in_status.is_empty());

    let sprint_ids: Vec<&str> = snapshot
      .available_sprints
      .iter()
      .map(|s| s.id.as_str())
      .collect();
    assert_eq!(sprint_ids, vec!["10", "9"]);
    assert_eq!(snapshot.available_assignees, vec!["Bruna", "Unassigned"]);
    assert_eq!(snapshot.available_issue_types, vec!["Bug", "Story"]);
  }

  #[tokio::test]
  async fn test_snapshot_is_served_from_cache() {
    let transport = Arc::new(ScriptedTransport::new(two_boards));
    let aggregator = aggregator(&transport);

    let first = aggregator.dashboard_snapshot(None).await.unwrap();
    let calls = transport.calls().len();
    let second = aggregator.dashboard_snapshot(None).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(transport.calls().len(), calls);
  }

  #[tokio::test(start_paused = true)]
  async fn test_snapshot_expires() {
    let transport = Arc::new(ScriptedTransport::new(two_boards));
    let aggregator = aggregator(&transport);

    aggregator.dashboard_snapshot(None).await.unwrap();
    tokio::time::advance(Duration::from_secs(121)).await;
    aggregator.dashboard_snapshot(None).await.unwrap();

    assert_eq!(transport.count("/board"), 2);
    assert_eq!(transport.count("/board/1/sprint/10/issue"), 2);
    // Sprint collection and history metadata live longer
    assert_eq!(transport.count("/board/1/issue"), 1);
  }

  #[tokio::test]
  async fn test_invalidate_dashboard_forces_refetch() {
    let transport = Arc::new(ScriptedTransport::new(two_boards));
    let aggregator = aggregator(&transport);

    aggregator.dashboard_snapshot(None).await.unwrap();
    aggregator.invalidate_dashboard(None);
    aggregator.dashboard_snapshot(None).await.unwrap();

    assert_eq!(transport.count("/board"), 2);
  }

  #[tokio::test]
  async fn test_filtered_snapshot_uses_its_own_cache_entry() {
    let transport = Arc::new(ScriptedTransport::new(two_boards));
    let aggregator = aggregator(&transport);
    let keys = vec!["GH".to_string()];

    aggregator.dashboard_snapshot(None).await.unwrap();
    aggregator.dashboard_snapshot(Some(&keys)).await.unwrap();
    aggregator.invalidate_dashboard(None);
    aggregator.dashboard_snapshot(Some(&keys)).await.unwrap();

    assert_eq!(transport.count("/board"), 2);
    let filtered = transport
      .calls()
      .into_iter()
      .filter(|(p, q)| p == "/board" && q.get("projectKeyOrId").map(String::as_str) == Some("GH"))
      .count();
    assert_eq!(filtered, 1);
  }

  #[tokio::test]
  async fn test_failing_board_is_left_out() {
    let transport = Arc::new(ScriptedTransport::new(|path, q| match path {
      "/board" => values_page(&[board(1, "Alpha", "scrum"), board(3, "Beta", "scrum")], q),
      "/board/1/sprint" => values_page(&[sprint(11, "Alpha 1", "active", None)], q),
      "/board/3/sprint" => values_page(&[sprint(31, "Beta 1", "active", None)], q),
      "/board/1/sprint/11/issue" => status(500),
      "/board/3/sprint/31/issue" => issues_page(&[issue("B-1", "To Do", 2.0)], q),
      _ => issues_page(&[], q),
    }));

    let snapshot = aggregator(&transport).dashboard_snapshot(None).await.unwrap();

    let ids: Vec<&str> = snapshot.squads.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["board-3"]);
    // The headline sprint is the first active one, even if its board failed
    assert_eq!(snapshot.sprint.id, "11");
    assert_eq!(snapshot.sprint.total_story_points, 2.0);
  }

  #[tokio::test]
  async fn test_blockers_produce_alert() {
    let transport = Arc::new(ScriptedTransport::new(|path, q| match path {
      "/board" => values_page(&[board(5, "SQUAD X", "scrum")], q),
      "/board/5/sprint" => values_page(&[sprint(50, "X 1", "active", None)], q),
      "/board/5/sprint/50/issue" => {
        let mut flagged = issue("X-1", "In Progress", 3.0);
        flagged["fields"]["flagged"] = json!(true);
        let mut blocker = issue("X-2", "To Do", 0.0);
        blocker["fields"]["priority"] = json!({ "name": "Blocker" });
        issues_page(&[flagged, blocker, issue("X-3", "Done", 8.0)], q)
      }
      _ => issues_page(&[], q),
    }));

    let snapshot = aggregator(&transport).dashboard_snapshot(None).await.unwrap();

    assert_eq!(snapshot.alerts.len(), 1);
    let alert = &snapshot.alerts[0];
    assert_eq!(alert.kind, AlertKind::Warning);
    assert_eq!(alert.story_points_affected, 3.0);
    assert_eq!(snapshot.squads[0].blockers, 2);
  }

  #[tokio::test]
  async fn test_zero_boards_is_an_error() {
    let transport = Arc::new(ScriptedTransport::new(|_, q| values_page(&[], q)));

    let err = aggregator(&transport).dashboard_snapshot(None).await.unwrap_err();

    assert!(matches!(err, DashboardError::NoBoards));
    assert_eq!(err.category(), ErrorCategory::Unavailable);
  }

  #[tokio::test]
  async fn test_board_discovery_failure_propagates() {
    let transport = Arc::new(ScriptedTransport::new(|_, _| status(401)));

    let err = aggregator(&transport).dashboard_snapshot(None).await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::AuthFailure);
    assert_eq!(transport.calls().len(), 1);
  }

  #[tokio::test]
  async fn test_filtered_discovery_reports_bad_credentials() {
    let transport = Arc::new(ScriptedTransport::new(|_, _| status(401)));
    let keys = vec!["GH".to_string(), "CONT".to_string()];

    let err = aggregator(&transport)
      .dashboard_snapshot(Some(&keys))
      .await
      .unwrap_err();

    assert!(matches!(err, DashboardError::Jira(JiraError::Authentication { .. })));
    assert_eq!(err.category(), ErrorCategory::AuthFailure);
  }

  #[tokio::test]
  async fn test_sprint_lookup_failure_keeps_board() {
    let transport = Arc::new(ScriptedTransport::new(|path, q| match path {
      "/board" => values_page(&[board(1, "A", "scrum"), board(2, "B", "scrum")], q),
      "/board/1/sprint" => status(503),
      "/board/2/sprint" => values_page(&[sprint(20, "B 1", "active", None)], q),
      _ => status(404),
    }));

    let contexts = aggregator(&transport).fetch_all_boards_data(None).await.unwrap();

    assert_eq!(contexts.len(), 2);
    assert_eq!(contexts[0].board.id, 1);
    assert!(contexts[0].sprint.is_none());
    assert_eq!(contexts[1].sprint.as_ref().map(|s| s.id), Some(20));
  }

  #[tokio::test]
  async fn test_no_active_sprint_anywhere() {
    let transport = Arc::new(ScriptedTransport::new(|path, q| match path {
      "/board" => values_page(
        &(1..=5).map(|id| board(id, "Team", "kanban")).collect::<Vec<_>>(),
        q,
      ),
      p if p.ends_with("/sprint") => values_page(&[], q),
      _ => issues_page(&[], q),
    }));

    let snapshot = aggregator(&transport).dashboard_snapshot(None).await.unwrap();

    assert!(snapshot.squads.is_empty());
    assert_eq!(snapshot.sprint.id, "no-active-sprint");
    assert_eq!(snapshot.sprint.number, 0);
    assert_eq!(snapshot.sprint.start_date, "2024-01-15");
    assert_eq!(snapshot.sprint.goal, "");
    for id in 1..=3 {
      assert_eq!(transport.count(&format!("/board/{}/issue", id)), 1);
    }
    assert_eq!(transport.count("/board/4/issue"), 0);
    assert_eq!(transport.count("/board/5/issue"), 0);
  }

  fn context(id: u64) -> BoardContext {
    BoardContext {
      board: Board {
        id,
        name: format!("Board {}", id),
        kind: BoardKind::Scrum,
      },
      sprint: None,
    }
  }

  #[tokio::test]
  async fn test_collect_all_sprints_dedupes_and_sorts() {
    let transport = Arc::new(ScriptedTransport::new(|path, q| match path {
      "/board/1/sprint" => values_page(
        &[
          sprint(1, "One", "closed", Some("2024-01-01T09:00:00.000Z")),
          sprint(2, "Two", "future", None),
        ],
        q,
      ),
      "/board/2/sprint" => values_page(
        &[
          sprint(1, "One again", "closed", Some("2024-01-01T09:00:00.000Z")),
          sprint(3, "Three", "active", Some("2024-02-01T09:00:00.000Z")),
        ],
        q,
      ),
      _ => status(500),
    }));
    let aggregator = aggregator(&transport);
    let contexts = vec![context(1), context(2), context(3)];

    let sprints = aggregator.collect_all_sprints(&contexts).await;

    let ids: Vec<&str> = sprints.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["3", "1", "2"]);
    assert_eq!(sprints[1].name, "One");
    assert_eq!(sprints[0].start_date, "2024-02-01");
    assert_eq!(sprints[2].start_date, "");

    let calls = transport.calls().len();
    aggregator.collect_all_sprints(&contexts).await;
    assert_eq!(transport.calls().len(), calls);
  }

  #[test]
  fn test_headline_goal_dedupes_in_board_order() {
    let goal_sprint = |id: u64, goal: &str| Sprint {
      id,
      name: format!("Sprint {}", id),
      state: SprintState::Active,
      start_date: None,
      end_date: None,
      goal: Some(goal.to_string()),
    };
    let mut a = context(1);
    a.board.name = "GH".to_string();
    a.sprint = Some(goal_sprint(7, "Launch"));
    let mut b = context(2);
    b.board.name = "CONT".to_string();
    b.sprint = Some(goal_sprint(8, "Audit"));
    let mut c = context(3);
    c.board.name = "GH".to_string();
    c.sprint = Some(goal_sprint(9, "Launch"));

    let info = headline_sprint(&[context(4), a, b, c], "2024-01-15");

    assert_eq!(info.id, "7");
    assert_eq!(info.start_date, "2024-01-15");
    assert_eq!(info.goal, "[Growth Hacking] Launch • [Squad de Content] Audit");
  }
}
