//! Chart series derived from a single snapshot of sprint issues.
//!
//! Jira's board endpoints carry no transition history, so burndown, cycle
//! time and priority evolution here are projections from current totals.

use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

use super::types::{
  BurndownPoint, CreatedVsCompletedPoint, CycleTimeByTypeItem, PriorityEvolutionPoint, TaskItem,
};
use crate::normalize::Priority;

pub const BURNDOWN_DAYS: u32 = 10;

/// Expected daily overshoot of the burn rate, as a fraction of the total.
const BURNDOWN_DRIFT: f64 = 0.016;

/// Ideal vs projected remaining points over a ten-day sprint.
pub fn burndown(total: f64, completion_rate: f64) -> Vec<BurndownPoint> {
  let ideal_per_day = total / BURNDOWN_DAYS as f64;
  let mut remaining = total;

  (0..=BURNDOWN_DAYS)
    .map(|day| {
      if day > 0 {
        remaining = (remaining - (ideal_per_day * completion_rate + BURNDOWN_DRIFT * total)).max(0.0);
      }
      BurndownPoint {
        day,
        ideal: (total - ideal_per_day * day as f64).round(),
        actual: remaining.round(),
      }
    })
    .collect()
}

// ============================================================================
// Created vs completed
// ============================================================================

/// Days covered before today.
pub const CREATED_VS_COMPLETED_WINDOW: i64 = 14;

/// Story points created / resolved per calendar day over a fixed window.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBuckets {
  days: BTreeMap<NaiveDate, (f64, f64)>,
}

impl DayBuckets {
  /// Buckets for `today` and the 14 days before it.
  pub fn new(today: NaiveDate) -> Self {
    let days = (0..=CREATED_VS_COMPLETED_WINDOW)
      .map(|back| (today - Duration::days(back), (0.0, 0.0)))
      .collect();
    Self { days }
  }

  /// Dates outside the window are ignored.
  pub fn record_created(&mut self, date: NaiveDate, points: f64) {
    if let Some((created, _)) = self.days.get_mut(&date) {
      *created += points;
    }
  }

  pub fn record_completed(&mut self, date: NaiveDate, points: f64) {
    if let Some((_, completed)) = self.days.get_mut(&date) {
      *completed += points;
    }
  }

  pub fn merge(&mut self, other: &DayBuckets) {
    for (date, (created, completed)) in &other.days {
      if let Some((c, r)) = self.days.get_mut(date) {
        *c += created;
        *r += completed;
      }
    }
  }

  /// Oldest first, labelled like "Jan 5".
  pub fn into_points(self) -> Vec<CreatedVsCompletedPoint> {
    self
      .days
      .into_iter()
      .map(|(date, (created, completed))| CreatedVsCompletedPoint {
        date: date.format("%b %-d").to_string(),
        created,
        completed,
      })
      .collect()
  }
}

// ============================================================================
// Cycle time
// ============================================================================

/// Average cycle time per issue type over Done tasks.
///
/// Approximated as half a day per story point, at least one day.
pub fn cycle_time_by_type(tasks: &[TaskItem]) -> Vec<CycleTimeByTypeItem> {
  let mut groups: Vec<(&str, Vec<f64>)> = Vec::new();

  for task in tasks.iter().filter(|t| t.status.is_done()) {
    let days = (task.story_points * 0.5).max(1.0);
    match groups.iter_mut().find(|(t, _)| *t == task.issue_type) {
      Some((_, times)) => times.push(days),
      None => groups.push((task.issue_type.as_str(), vec![days])),
    }
  }

  groups
    .into_iter()
    .map(|(issue_type, times)| {
      let avg = times.iter().sum::<f64>() / times.len() as f64;
      CycleTimeByTypeItem {
        issue_type: issue_type.to_string(),
        avg_days: (avg * 10.0).round() / 10.0,
      }
    })
    .collect()
}

// ============================================================================
// Priority evolution
// ============================================================================

/// Story points per canonical priority.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriorityTotals {
  pub high: f64,
  pub medium: f64,
  pub low: f64,
}

impl PriorityTotals {
  pub fn add(&mut self, priority: Priority, points: f64) {
    match priority {
      Priority::High => self.high += points,
      Priority::Medium => self.medium += points,
      Priority::Low => self.low += points,
    }
  }

  pub fn merge(&mut self, other: &PriorityTotals) {
    self.high += other.high;
    self.medium += other.medium;
    self.low += other.low;
  }
}

pub const PRIORITY_EVOLUTION_DAYS: u32 = 10;

// Per-day growth applied when projecting backward in time
const HIGH_DECAY: f64 = 1.1;
const MEDIUM_DECAY: f64 = 1.05;
const LOW_DECAY: f64 = 1.02;

/// Backward projection of current priority totals; the last point is today.
pub fn priority_evolution(current: PriorityTotals) -> Vec<PriorityEvolutionPoint> {
  let mut totals = current;
  let mut points = Vec::with_capacity(PRIORITY_EVOLUTION_DAYS as usize + 1);

  for _ in 0..=PRIORITY_EVOLUTION_DAYS {
    points.push(totals);
    totals = PriorityTotals {
      high: (totals.high * HIGH_DECAY).round(),
      medium: (totals.medium * MEDIUM_DECAY).round(),
      low: (totals.low * LOW_DECAY).round(),
    };
  }

  points
    .into_iter()
    .rev()
    .zip(0..)
    .map(|(t, day)| PriorityEvolutionPoint {
      day,
      high: t.high,
      medium: t.medium,
      low: t.low,
    })
    .collect()
}
