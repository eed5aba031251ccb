use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::model::{Project, ProjectStatus};

/// Figures shown above the board, derived from the visible projects
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoardStats {
    pub total: usize,
    /// Talks, in progress or review
    pub active: usize,
    /// Deadline within `[now, now + window]` and not completed
    pub due_soon: usize,
    /// Mean hourly rate over non-completed projects that have one; 0 when none do
    pub average_rate: f64,
}

pub const DUE_SOON_DAYS: u32 = 7;

/// Deadline falls inside `[now, now + window]` and the project is not completed.
/// A window reaching past the last representable instant has no upper bound.
pub fn is_due_soon(project: &Project, now: DateTime<Utc>, window: Duration) -> bool {
    let end = now.checked_add_signed(window);
    project.status != ProjectStatus::Completed
        && project
            .deadline
            .is_some_and(|d| d >= now && end.is_none_or(|end| d <= end))
}

pub fn compute_stats(projects: &[&Project], now: DateTime<Utc>, window: Duration) -> BoardStats {
    let active = projects.iter().filter(|p| p.status.is_active()).count();
    let due_soon = projects
        .iter()
        .filter(|p| is_due_soon(p, now, window))
        .count();

    let rates: Vec<f64> = projects
        .iter()
        .filter(|p| p.status != ProjectStatus::Completed)
        .filter_map(|p| p.hourly_rate)
        .filter(|r| r.is_finite())
        .collect();
    let average_rate = if rates.is_empty() {
        0.0
    } else {
        rates.iter().sum::<f64>() / rates.len() as f64
    };

    BoardStats {
        total: projects.len(),
        active,
        due_soon,
        average_rate,
    }
}
