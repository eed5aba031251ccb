use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

/// Pipeline stage of a project. Board columns follow this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    Idea,
    Talks,
    InProgress,
    Review,
    Completed,
}

impl ProjectStatus {
    /// All statuses in board column order
    pub const ALL: [ProjectStatus; 5] = [
        ProjectStatus::Idea,
        ProjectStatus::Talks,
        ProjectStatus::InProgress,
        ProjectStatus::Review,
        ProjectStatus::Completed,
    ];

    /// Wire value (`in-progress`, ...)
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Idea => "idea",
            ProjectStatus::Talks => "talks",
            ProjectStatus::InProgress => "in-progress",
            ProjectStatus::Review => "review",
            ProjectStatus::Completed => "completed",
        }
    }

    /// Human-readable column heading
    pub fn label(self) -> &'static str {
        match self {
            ProjectStatus::Idea => "Idea",
            ProjectStatus::Talks => "Talks",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::Review => "Review",
            ProjectStatus::Completed => "Completed",
        }
    }

    /// Talks, in progress and review count as active work
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ProjectStatus::Talks | ProjectStatus::InProgress | ProjectStatus::Review
        )
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown status '{}' (expected: idea, talks, in-progress, review, completed)",
                    s
                )
            })
    }
}

/// A project record as returned by `GET /projects`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    /// Owning client; may dangle if the client was deleted
    pub client_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: ProjectStatus,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Project {
    pub fn new(
        id: impl Into<String>,
        client_id: impl Into<String>,
        title: impl Into<String>,
        status: ProjectStatus,
    ) -> Self {
        Project {
            id: id.into(),
            client_id: client_id.into(),
            title: title.into(),
            description: None,
            status,
            hourly_rate: None,
            deadline: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Past its deadline and not yet completed
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != ProjectStatus::Completed && self.deadline.is_some_and(|d| d < now)
    }
}

/// Body for `POST /projects` and `PUT /projects/{id}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectPayload {
    pub client_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub hourly_rate: Option<f64>,
    pub deadline: Option<DateTime<Utc>>,
}

/// Body for `PATCH /projects/{id}/status`
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusUpdate {
    pub status: ProjectStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_wire_names() {
        let json = serde_json::to_string(&ProjectStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let parsed: ProjectStatus = serde_json::from_str("\"review\"").unwrap();
        assert_eq!(parsed, ProjectStatus::Review);
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(serde_json::from_str::<ProjectStatus>("\"archived\"").is_err());
        assert!("archived".parse::<ProjectStatus>().is_err());
        assert_eq!("talks".parse::<ProjectStatus>(), Ok(ProjectStatus::Talks));
    }

    #[test]
    fn active_statuses() {
        let active: Vec<_> = ProjectStatus::ALL
            .into_iter()
            .filter(|s| s.is_active())
            .collect();
        assert_eq!(
            active,
            vec![
                ProjectStatus::Talks,
                ProjectStatus::InProgress,
                ProjectStatus::Review
            ]
        );
    }

    #[test]
    fn deserialize_minimal_project() {
        let p: Project = serde_json::from_str(
            r#"{"id":"1","client_id":"c1","title":"A","status":"idea"}"#,
        )
        .unwrap();
        assert_eq!(p.status, ProjectStatus::Idea);
        assert!(p.deadline.is_none());
        assert!(p.hourly_rate.is_none());
    }

    #[test]
    fn overdue_ignores_completed() {
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();
        let mut p = Project::new("1", "c1", "A", ProjectStatus::Review);
        p.deadline = Some(now - chrono::Duration::hours(1));
        assert!(p.is_overdue(now));
        p.status = ProjectStatus::Completed;
        assert!(!p.is_overdue(now));
        p.status = ProjectStatus::Idea;
        p.deadline = Some(now);
        assert!(!p.is_overdue(now));
    }
}
