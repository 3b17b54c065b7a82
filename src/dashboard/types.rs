//! Dashboard snapshot model, serialized with the field names the dashboard
//! frontend reads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::normalize::{Health, Priority, Status};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintInfo {
  pub id: String,
  pub name: String,
  pub number: u64,
  /// `YYYY-MM-DD`, empty when unknown
  pub start_date: String,
  pub end_date: String,
  pub total_story_points: f64,
  pub completed_story_points: f64,
  pub goal: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoryPoints {
  pub completed: f64,
  pub total: f64,
}

/// Work split by canonical status. Issues without estimates weigh 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDistribution {
  pub done: f64,
  pub in_progress: f64,
  pub todo: f64,
}

impl TaskDistribution {
  pub fn add(&mut self, status: Status, weight: f64) {
    if status.is_done() {
      self.done += weight;
    } else if status.is_active() {
      self.in_progress += weight;
    } else {
      self.todo += weight;
    }
  }

  pub fn total(&self) -> f64 {
    self.done + self.in_progress + self.todo
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurndownPoint {
  pub day: u32,
  pub ideal: f64,
  pub actual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityHistoryItem {
  pub sprint: String,
  pub points: f64,
}

/// One board's contribution to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SquadMetrics {
  pub id: String,
  pub name: String,
  pub health: Health,
  pub story_points: StoryPoints,
  pub completion_percentage: u32,
  pub velocity: f64,
  pub avg_velocity: f64,
  pub burndown: Vec<BurndownPoint>,
  pub task_distribution: TaskDistribution,
  pub blockers: u32,
  pub predictability: u32,
  pub velocity_history: Vec<VelocityHistoryItem>,
  pub capacity: f64,
  pub cycle_time: f64,
  pub goal: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
  Critical,
  Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
  pub id: String,
  #[serde(rename = "type")]
  pub kind: AlertKind,
  pub squad: String,
  pub message: String,
  pub story_points_affected: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedVsCompletedPoint {
  pub date: String,
  pub created: f64,
  pub completed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleTimeByTypeItem {
  #[serde(rename = "type")]
  pub issue_type: String,
  pub avg_days: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityEvolutionPoint {
  pub day: u32,
  pub high: f64,
  pub medium: f64,
  pub low: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDistributionItem {
  pub name: String,
  pub done: f64,
  pub in_progress: f64,
  pub todo: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskItem {
  pub id: String,
  pub key: String,
  pub summary: String,
  pub squad: String,
  pub assignee: String,
  pub status: Status,
  pub priority: Priority,
  pub story_points: f64,
  #[serde(rename = "type")]
  pub issue_type: String,
  pub sprint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemAgeItem {
  pub key: String,
  pub summary: String,
  pub age: i64,
  pub story_points: f64,
  pub status: Status,
  pub assignee: String,
}

/// The complete aggregated result of one dashboard request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
  pub sprint: SprintInfo,
  pub squads: Vec<SquadMetrics>,
  pub alerts: Vec<Alert>,
  pub created_vs_completed: Vec<CreatedVsCompletedPoint>,
  /// Not available without status transition history; always empty.
  pub cumulative_flow: Vec<serde_json::Value>,
  pub cycle_time_by_type: Vec<CycleTimeByTypeItem>,
  /// Not available without status transition history; always empty.
  pub time_in_status: Vec<serde_json::Value>,
  pub priority_evolution: Vec<PriorityEvolutionPoint>,
  /// Keyed by squad id
  pub person_distribution: BTreeMap<String, Vec<PersonDistributionItem>>,
  pub tasks: Vec<TaskItem>,
  pub work_item_age: Vec<WorkItemAgeItem>,
  pub available_sprints: Vec<SprintInfo>,
  pub available_assignees: Vec<String>,
  pub available_issue_types: Vec<String>,
}
