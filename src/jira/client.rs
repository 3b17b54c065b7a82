use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::jira::api_types::{ApiBoard, ApiErrorBody, ApiIssuesPage, ApiSprint, ApiValuesPage};
use crate::jira::error::JiraError;
use crate::jira::transport::{Credentials, ReqwestTransport, Transport};
use crate::jira::types::{Board, Issue, Sprint, SprintState};

const BOARD_PAGE_SIZE: u64 = 50;
const SPRINT_PAGE_SIZE: u64 = 50;
const ISSUE_PAGE_SIZE: u64 = 100;

/// Closed sprints returned by `get_closed_sprints` when the caller has no preference.
pub const DEFAULT_CLOSED_SPRINT_LIMIT: u64 = 5;

/// 429 answers are retried this many times, waiting 1s, 2s, 4s.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Jira Agile API client.
///
/// Owns pagination and rate-limit retries so callers only ever see complete
/// result lists. Cloning is cheap and clones share the underlying transport.
#[derive(Clone)]
pub struct JiraClient {
  transport: Arc<dyn Transport>,
}

impl JiraClient {
  pub fn new(domain: &str, credentials: Credentials) -> Result<Self, JiraError> {
    let transport = ReqwestTransport::new(domain, credentials)?;
    Ok(Self::with_transport(Arc::new(transport)))
  }

  pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
    Self { transport }
  }

  /// GET and decode one JSON document, retrying rate-limited calls.
  async fn get_json<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<T, JiraError> {
    let mut attempt = 0;

    loop {
      let response = self.transport.get(path, query).await?;

      if response.is_success() {
        return serde_json::from_str(&response.body).map_err(|source| JiraError::Decode {
          context: path.to_string(),
          source,
        });
      }

      if response.status == 429 && attempt < MAX_RATE_LIMIT_RETRIES {
        let delay = Duration::from_secs(1 << attempt);
        attempt += 1;
        warn!(
          path,
          attempt,
          delay_secs = delay.as_secs(),
          "rate limited by Jira, backing off"
        );
        tokio::time::sleep(delay).await;
        continue;
      }

      let message = ApiErrorBody::first_message(&response.body)
        .unwrap_or_else(|| format!("HTTP {}", response.status));
      return Err(JiraError::from_status(response.status, message));
    }
  }

  /// List boards, optionally restricted to a set of project keys.
  ///
  /// With a filter, each project is listed separately and a project that
  /// fails is logged and skipped, except for authentication and rate-limit
  /// failures which abort the listing. Without a filter, any failure propagates.
  pub async fn list_boards(&self, project_keys: Option<&[String]>) -> Result<Vec<Board>, JiraError> {
    let mut boards = Vec::new();
    let mut seen = HashSet::new();

    match project_keys.filter(|keys| !keys.is_empty()) {
      Some(keys) => {
        info!(projects = %keys.join(","), "listing boards for projects");
        for key in keys {
          match self
            .collect_board_pages(Some(key), &mut boards, &mut seen)
            .await
          {
            Ok(()) => {}
            // Credential and quota failures are not about one project
            Err(e @ (JiraError::Authentication { .. } | JiraError::RateLimited { .. })) => {
              return Err(e)
            }
            Err(e) => {
              warn!(project = %key, error = %e, "failed to list boards for project, skipping");
            }
          }
        }
      }
      None => {
        self
          .collect_board_pages(None, &mut boards, &mut seen)
          .await?;
      }
    }

    info!(count = boards.len(), "discovered boards");
    for board in &boards {
      debug!(board_id = board.id, name = %board.name, kind = ?board.kind, "board");
    }

    Ok(boards)
  }

  /// Page through `/board`, appending boards whose id has not been seen yet.
  async fn collect_board_pages(
    &self,
    project: Option<&str>,
    boards: &mut Vec<Board>,
    seen: &mut HashSet<u64>,
  ) -> Result<(), JiraError> {
    let mut start_at = 0u64;

    loop {
      let mut query = vec![
        ("startAt", start_at.to_string()),
        ("maxResults", BOARD_PAGE_SIZE.to_string()),
      ];
      if let Some(p) = project {
        query.push(("projectKeyOrId", p.to_string()));
      }

      let page: ApiValuesPage<ApiBoard> = self.get_json("/board", &query).await?;
      let fetched = page.values.len() as u64;
      let is_last = page.is_last || fetched == 0;

      for board in page.values {
        if seen.insert(board.id) {
          boards.push(board.into());
        }
      }

      if is_last {
        break;
      }
      start_at += fetched;
    }

    Ok(())
  }

  /// The board's active sprint. If Jira reports several, the first wins.
  pub async fn get_active_sprint(&self, board_id: u64) -> Result<Option<Sprint>, JiraError> {
    let endpoint = format!("/board/{}/sprint", board_id);
    let page: ApiValuesPage<ApiSprint> = self
      .get_json(&endpoint, &[("state", "active".to_string())])
      .await?;

    Ok(page.values.into_iter().next().map(Sprint::from))
  }

  /// Every sprint of a board in any state.
  ///
  /// Boards without sprint support answer 400; that is an empty result.
  pub async fn get_all_sprints(&self, board_id: u64) -> Result<Vec<Sprint>, JiraError> {
    let endpoint = format!("/board/{}/sprint", board_id);
    let mut sprints = Vec::new();
    let mut start_at = 0u64;

    loop {
      let query = [
        ("startAt", start_at.to_string()),
        ("maxResults", SPRINT_PAGE_SIZE.to_string()),
      ];

      let page: ApiValuesPage<ApiSprint> = match self.get_json(&endpoint, &query).await {
        Ok(page) => page,
        Err(JiraError::Remote { status: 400, .. }) => {
          info!(board_id, "board does not support sprints, skipping");
          return Ok(Vec::new());
        }
        Err(e) => return Err(e),
      };

      let fetched = page.values.len() as u64;
      sprints.extend(page.values.into_iter().map(Sprint::from));
      start_at += fetched;

      let exhausted = page.total.is_some_and(|total| start_at >= total);
      if page.is_last || fetched == 0 || exhausted {
        break;
      }
    }

    debug!(
      board_id,
      total = sprints.len(),
      active = sprints.iter().filter(|s| s.state == SprintState::Active).count(),
      closed = sprints.iter().filter(|s| s.state == SprintState::Closed).count(),
      future = sprints.iter().filter(|s| s.state == SprintState::Future).count(),
      "fetched sprints"
    );

    Ok(sprints)
  }

  /// Issues in one sprint of a board.
  pub async fn get_sprint_issues(&self, board_id: u64, sprint_id: u64) -> Result<Vec<Issue>, JiraError> {
    let endpoint = format!("/board/{}/sprint/{}/issue", board_id, sprint_id);
    self.collect_issue_pages(&endpoint).await
  }

  /// The most recent closed sprints, from a single page of at most `limit`.
  pub async fn get_closed_sprints(&self, board_id: u64, limit: u64) -> Result<Vec<Sprint>, JiraError> {
    let endpoint = format!("/board/{}/sprint", board_id);
    let query = [
      ("state", "closed".to_string()),
      ("maxResults", limit.to_string()),
    ];

    let page: ApiValuesPage<ApiSprint> = self.get_json(&endpoint, &query).await?;
    Ok(page.values.into_iter().map(Sprint::from).collect())
  }

  /// Every issue on a board, across sprints and backlog.
  pub async fn get_board_history(&self, board_id: u64) -> Result<Vec<Issue>, JiraError> {
    let endpoint = format!("/board/{}/issue", board_id);
    self.collect_issue_pages(&endpoint).await
  }

  /// Page through an issue endpoint until the fetched count reaches `total`.
  async fn collect_issue_pages(&self, endpoint: &str) -> Result<Vec<Issue>, JiraError> {
    let mut issues = Vec::new();
    let mut start_at = 0u64;

    loop {
      let query = [
        ("startAt", start_at.to_string()),
        ("maxResults", ISSUE_PAGE_SIZE.to_string()),
      ];

      let page: ApiIssuesPage = self.get_json(endpoint, &query).await?;
      let fetched = page.issues.len() as u64;
      issues.extend(page.issues.into_iter().map(Issue::from));
      start_at += fetched;

      debug!(endpoint, fetched = start_at, total = page.total, "fetched issue page");

      if fetched == 0 || start_at >= page.total {
        break;
      }
    }

    Ok(issues)
  }
}
