//! Folding one board's sprint issues into squad metrics.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::debug;

use super::charts::{burndown, DayBuckets, PriorityTotals};
use super::types::{
  Alert, AlertKind, PersonDistributionItem, SquadMetrics, StoryPoints, TaskDistribution, TaskItem,
  VelocityHistoryItem, WorkItemAgeItem,
};
use crate::jira::types::{Board, Issue, Sprint};
use crate::normalize::{
  determine_health, format_board_name, is_blocker_priority, normalize_issue_type,
  normalize_priority, normalize_status, Status,
};

pub const UNASSIGNED: &str = "Unassigned";

/// Placeholder until closed-sprint history feeds a real estimate.
const DEFAULT_PREDICTABILITY: u32 = 85;
const CAPACITY_FACTOR: f64 = 1.1;
/// Critical alerts start at this many blockers.
const CRITICAL_BLOCKERS: u32 = 3;

/// Everything one board adds to the dashboard snapshot.
#[derive(Debug, Clone)]
pub struct SquadContribution {
  pub squad: SquadMetrics,
  pub alert: Option<Alert>,
  pub tasks: Vec<TaskItem>,
  pub work_item_age: Vec<WorkItemAgeItem>,
  pub people: Vec<PersonDistributionItem>,
  pub day_buckets: DayBuckets,
  pub priorities: PriorityTotals,
}

/// Running totals while walking a sprint's issues.
struct SquadAccumulator {
  squad_name: String,
  sprint_name: String,
  now: DateTime<Utc>,
  total_points: f64,
  completed_points: f64,
  distribution: TaskDistribution,
  blockers: u32,
  people: Vec<PersonDistributionItem>,
  tasks: Vec<TaskItem>,
  work_item_age: Vec<WorkItemAgeItem>,
  day_buckets: DayBuckets,
  priorities: PriorityTotals,
}

impl SquadAccumulator {
  fn new(squad_name: String, sprint_name: String, now: DateTime<Utc>) -> Self {
    Self {
      squad_name,
      sprint_name,
      now,
      total_points: 0.0,
      completed_points: 0.0,
      distribution: TaskDistribution::default(),
      blockers: 0,
      people: Vec::new(),
      tasks: Vec::new(),
      work_item_age: Vec::new(),
      day_buckets: DayBuckets::new(now.date_naive()),
      priorities: PriorityTotals::default(),
    }
  }

  fn add(&mut self, issue: &Issue) {
    let points = issue.story_points;
    let status = normalize_status(&issue.status);
    let priority = normalize_priority(issue.priority.as_deref());
    let assignee = issue
      .assignee
      .clone()
      .unwrap_or_else(|| UNASSIGNED.to_string());

    // Unestimated issues still show up in distributions, never in point totals
    let weight = if points > 0.0 { points } else { 1.0 };

    self.total_points += points;
    if status.is_done() {
      self.completed_points += points;
    }
    self.distribution.add(status, weight);

    if (is_blocker_priority(issue.priority.as_deref()) || issue.flagged) && !status.is_done() {
      self.blockers += 1;
      debug!(
        key = %issue.key,
        priority = issue.priority.as_deref().unwrap_or_default(),
        flagged = issue.flagged,
        "blocker found"
      );
    }

    self.add_person(&assignee, status, weight);
    self.priorities.add(priority, points);

    if let Some(created) = issue.created {
      self.day_buckets.record_created(created.date_naive(), points);
    }
    if let Some(resolved) = issue.resolved {
      self.day_buckets.record_completed(resolved.date_naive(), points);
    }

    if status.is_active() {
      let age = issue
        .created
        .map(|c| (self.now - c.with_timezone(&Utc)).num_days().max(0))
        .unwrap_or(0);
      self.work_item_age.push(WorkItemAgeItem {
        key: issue.key.clone(),
        summary: issue.summary.clone(),
        age,
        story_points: points,
        status,
        assignee: assignee.clone(),
      });
    }

    self.tasks.push(TaskItem {
      id: issue.id.clone(),
      key: issue.key.clone(),
      summary: issue.summary.clone(),
      squad: self.squad_name.clone(),
      assignee,
      status,
      priority,
      story_points: points,
      issue_type: normalize_issue_type(&issue.issue_type),
      sprint: self.sprint_name.clone(),
    });
  }

  fn add_person(&mut self, name: &str, status: Status, weight: f64) {
    let index = match self.people.iter().position(|p| p.name == name) {
      Some(i) => i,
      None => {
        self.people.push(PersonDistributionItem {
          name: name.to_string(),
          done: 0.0,
          in_progress: 0.0,
          todo: 0.0,
        });
        self.people.len() - 1
      }
    };

    let person = &mut self.people[index];
    if status.is_done() {
      person.done += weight;
    } else if status.is_active() {
      person.in_progress += weight;
    } else {
      person.todo += weight;
    }
  }

  /// Completion by story points when any exist, otherwise by task count.
  fn completion_percentage(&self) -> u32 {
    if self.total_points > 0.0 {
      (self.completed_points / self.total_points * 100.0).round() as u32
    } else if self.distribution.total() > 0.0 {
      (self.distribution.done / self.distribution.total() * 100.0).round() as u32
    } else {
      0
    }
  }
}

/// Fold a board's active sprint issues into its dashboard contribution.
pub fn fold_squad(board: &Board, sprint: &Sprint, issues: &[Issue], now: DateTime<Utc>) -> SquadContribution {
  let squad_id = format!("board-{}", board.id);
  let squad_name = format_board_name(&board.name);

  let mut acc = SquadAccumulator::new(squad_name.clone(), sprint.name.clone(), now);
  for issue in issues {
    acc.add(issue);
  }

  let statuses: BTreeSet<&str> = issues.iter().map(|i| i.status.as_str()).collect();
  debug!(board_id = board.id, statuses = ?statuses, "raw statuses in sprint");

  let completion = acc.completion_percentage();
  let health = determine_health(completion as f64, acc.blockers, !issues.is_empty());
  let total = acc.total_points;
  let completed = acc.completed_points;

  let alert = (acc.blockers > 0).then(|| {
    let affected = total - completed;
    Alert {
      id: format!("alert-{}", squad_id),
      kind: if acc.blockers >= CRITICAL_BLOCKERS {
        AlertKind::Critical
      } else {
        AlertKind::Warning
      },
      squad: squad_name.clone(),
      message: format!("{} blocker(s) affecting {} SP", acc.blockers, affected),
      story_points_affected: affected,
    }
  });

  let completion_rate = if total > 0.0 { completed / total } else { 0.5 };

  let squad = SquadMetrics {
    id: squad_id,
    name: squad_name,
    health,
    story_points: StoryPoints { completed, total },
    completion_percentage: completion,
    velocity: total,
    avg_velocity: total,
    burndown: burndown(total, completion_rate),
    task_distribution: acc.distribution,
    blockers: acc.blockers,
    predictability: DEFAULT_PREDICTABILITY,
    velocity_history: vec![VelocityHistoryItem {
      sprint: "Last 3 Sprints".to_string(),
      points: total.round(),
    }],
    capacity: (total * CAPACITY_FACTOR).round(),
    cycle_time: 0.0,
    goal: sprint.goal.clone().unwrap_or_default(),
  };

  SquadContribution {
    squad,
    alert,
    tasks: acc.tasks,
    work_item_age: acc.work_item_age,
    people: acc.people,
    day_buckets: acc.day_buckets,
    priorities: acc.priorities,
  }
}
