//! Project progress estimation.
//!
//! Progress blends two signals: the share of finished work (action items and
//! milestones) and the share of the planned window that has elapsed. Work
//! completion dominates. A project only ever reports 100 once its status is
//! explicitly COMPLETED; every other project is capped at 99.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ActionItemStatus, ProjectStatus};

pub const TASK_WEIGHT: f64 = 0.7;
pub const TIME_WEIGHT: f64 = 0.3;

/// Assumed project length when only a due date is known
pub const DEFAULT_PROJECT_DAYS: i64 = 30;

pub const MAX_OPEN_PROGRESS: u8 = 99;
pub const COMPLETE_PROGRESS: u8 = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneState {
    pub completed_at: Option<DateTime<Utc>>,
}

/// Everything the estimator needs about one project, assembled per request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressSource {
    pub action_items: Vec<ActionItemStatus>,
    pub milestones: Vec<MilestoneState>,
    pub status: Option<ProjectStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    /// Previously stored percentage, only consulted when there is nothing to count
    pub progress: Option<i32>,
}

/// Compute project completion in `[0, 100]` as of `now`
pub fn compute_progress(source: &ProgressSource, now: DateTime<Utc>) -> u8 {
    if source.status.is_some_and(|s| s.is_terminal_complete()) {
        return COMPLETE_PROGRESS;
    }

    let weighted = task_ratio(source) * TASK_WEIGHT
        + time_ratio(source.start_date, source.due_date, now) * TIME_WEIGHT;

    let percent = (weighted * 100.0).round().max(0.0);
    percent.min(MAX_OPEN_PROGRESS as f64) as u8
}

pub fn compute_progress_now(source: &ProgressSource) -> u8 {
    compute_progress(source, Utc::now())
}

fn task_ratio(source: &ProgressSource) -> f64 {
    let total = source.action_items.len() + source.milestones.len();
    if total == 0 {
        return source.progress.map(|p| p as f64 / 100.0).unwrap_or(0.0);
    }

    let done_items = source.action_items.iter().filter(|s| s.is_completed()).count();
    let done_milestones = source
        .milestones
        .iter()
        .filter(|m| m.completed_at.is_some())
        .count();

    (done_items + done_milestones) as f64 / total as f64
}

fn time_ratio(
    start_date: Option<DateTime<Utc>>,
    due_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    let Some(due) = due_date else {
        return 0.0;
    };
    let start = start_date.unwrap_or(due - Duration::days(DEFAULT_PROJECT_DAYS));

    if now <= start {
        return 0.0;
    }

    let total_ms = (due - start).num_milliseconds();
    if total_ms <= 0 {
        return 1.0;
    }

    let elapsed_ms = (now - start).num_milliseconds().min(total_ms);
    elapsed_ms as f64 / total_ms as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn items(done: usize, open: usize) -> Vec<ActionItemStatus> {
        let mut v = vec![ActionItemStatus::Completed; done];
        v.extend(vec![ActionItemStatus::Open; open]);
        v
    }

    #[test]
    fn test_completed_status_short_circuits() {
        let source = ProgressSource {
            action_items: items(0, 5),
            status: Some(ProjectStatus::Completed),
            due_date: Some(at(2030, 1, 1)),
            ..Default::default()
        };
        assert_eq!(compute_progress(&source, at(2020, 1, 1)), 100);
    }

    #[test]
    fn test_empty_project_is_zero() {
        assert_eq!(compute_progress(&ProgressSource::default(), at(2024, 5, 1)), 0);
    }

    #[test]
    fn test_same_day_window_counts_as_fully_elapsed() {
        let day = at(2024, 3, 10);
        let source = ProgressSource {
            action_items: items(6, 4),
            start_date: Some(day),
            due_date: Some(day),
            ..Default::default()
        };
        assert_eq!(compute_progress(&source, at(2024, 3, 11)), 72);
    }

    #[test]
    fn test_stored_progress_used_only_without_segments() {
        let source = ProgressSource {
            progress: Some(50),
            ..Default::default()
        };
        assert_eq!(compute_progress(&source, at(2024, 1, 1)), 35);

        let counted = ProgressSource {
            action_items: items(0, 2),
            progress: Some(50),
            ..Default::default()
        };
        assert_eq!(compute_progress(&counted, at(2024, 1, 1)), 0);
    }

    #[test]
    fn test_milestones_count_when_completed_at_set() {
        let source = ProgressSource {
            milestones: vec![
                MilestoneState { completed_at: Some(at(2024, 1, 2)) },
                MilestoneState { completed_at: None },
            ],
            action_items: items(1, 1),
            ..Default::default()
        };
        // 2 of 4 done, no due date
        assert_eq!(compute_progress(&source, at(2024, 1, 3)), 35);
    }

    #[test]
    fn test_missing_start_assumes_thirty_day_window() {
        let due = at(2024, 1, 31);
        let source = ProgressSource {
            due_date: Some(due),
            ..Default::default()
        };
        // halfway through the synthetic window
        let now = due - Duration::days(15);
        assert_eq!(compute_progress(&source, now), 15);
    }

    #[test]
    fn test_before_start_has_no_time_pressure() {
        let source = ProgressSource {
            action_items: items(1, 1),
            start_date: Some(at(2024, 6, 1)),
            due_date: Some(at(2024, 7, 1)),
            ..Default::default()
        };
        assert_eq!(compute_progress(&source, at(2024, 5, 1)), 35);
        assert_eq!(compute_progress(&source, at(2024, 6, 1)), 35);
    }

    #[test]
    fn test_overdue_time_ratio_is_clamped() {
        let source = ProgressSource {
            start_date: Some(at(2024, 1, 1)),
            due_date: Some(at(2024, 2, 1)),
            ..Default::default()
        };
        assert_eq!(compute_progress(&source, at(2025, 1, 1)), 30);
    }

    #[test]
    fn test_all_done_and_overdue_caps_at_99() {
        let source = ProgressSource {
            action_items: items(3, 0),
            start_date: Some(at(2024, 1, 1)),
            due_date: Some(at(2024, 2, 1)),
            status: Some(ProjectStatus::Active),
            ..Default::default()
        };
        assert_eq!(compute_progress(&source, at(2024, 3, 1)), 99);
    }

    #[test]
    fn test_out_of_range_stored_progress_is_clamped() {
        let high = ProgressSource {
            progress: Some(250),
            ..Default::default()
        };
        assert_eq!(compute_progress(&high, at(2024, 1, 1)), 99);

        let low = ProgressSource {
            progress: Some(-80),
            ..Default::default()
        };
        assert_eq!(compute_progress(&low, at(2024, 1, 1)), 0);
    }
}
