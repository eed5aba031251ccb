//! Framework-free view model for the kanban board.
//!
//! Everything here is derived from the cache, the filter and a clock; the
//! markup layer only formats it.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;

use crate::model::{Project, ProjectStatus};
use crate::ops::filter::{FilterState, apply_filters};
use crate::ops::stats::{BoardStats, compute_stats};
use crate::ops::store::EntityCache;

/// One project as it appears on the board
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub id: String,
    pub title: String,
    /// Empty when the project's client no longer exists
    pub client_name: String,
    pub description: Option<String>,
    /// `$75/hr`, or `—` without a rate
    pub rate_label: String,
    /// Local calendar date of the deadline
    pub deadline_label: Option<String>,
    pub overdue: bool,
    /// Statuses this card can move to (every other column)
    pub transitions: Vec<ProjectStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub status: ProjectStatus,
    pub cards: Vec<Card>,
}

impl Column {
    pub fn label(&self) -> &'static str {
        self.status.label()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board {
    pub stats: BoardStats,
    /// Always five columns, in status order
    pub columns: Vec<Column>,
}

impl Board {
    pub fn column(&self, status: ProjectStatus) -> Option<&Column> {
        self.columns.iter().find(|c| c.status == status)
    }
}

/// `$75/hr` / `$62.5/hr` / `—`
pub fn rate_label(rate: Option<f64>) -> String {
    match rate {
        Some(r) if r.is_finite() && r > 0.0 => format!("${}/hr", r),
        _ => "\u{2014}".to_string(),
    }
}

pub fn deadline_label<Tz: TimeZone>(deadline: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    deadline.with_timezone(tz).format("%Y-%m-%d").to_string()
}

fn card<Tz: TimeZone>(project: &Project, cache: &EntityCache, now: DateTime<Utc>, tz: &Tz) -> Card
where
    Tz::Offset: std::fmt::Display,
{
    Card {
        id: project.id.clone(),
        title: project.title.clone(),
        client_name: cache.client_name(&project.client_id).to_string(),
        description: project.description.clone().filter(|d| !d.is_empty()),
        rate_label: rate_label(project.hourly_rate),
        deadline_label: project.deadline.map(|d| deadline_label(d, tz)),
        overdue: project.is_overdue(now),
        transitions: ProjectStatus::ALL
            .into_iter()
            .filter(|s| *s != project.status)
            .collect(),
    }
}

/// Group already-filtered projects into the five status columns.
pub fn group_board<Tz: TimeZone>(
    visible: &[&Project],
    cache: &EntityCache,
    now: DateTime<Utc>,
    due_soon_window: Duration,
    tz: &Tz,
) -> Board
where
    Tz::Offset: std::fmt::Display,
{
    let columns = ProjectStatus::ALL
        .into_iter()
        .map(|status| Column {
            status,
            cards: visible
                .iter()
                .filter(|p| p.status == status)
                .map(|p| card(p, cache, now, tz))
                .collect(),
        })
        .collect();

    Board {
        stats: compute_stats(visible, now, due_soon_window),
        columns,
    }
}

/// Filter the cached projects and lay them out as a board.
pub fn build_board<Tz: TimeZone>(
    cache: &EntityCache,
    filter: &FilterState,
    now: DateTime<Utc>,
    due_soon_window: Duration,
    tz: &Tz,
) -> Board
where
    Tz::Offset: std::fmt::Display,
{
    let visible = apply_filters(cache.projects(), cache, filter);
    group_board(&visible, cache, now, due_soon_window, tz)
}
