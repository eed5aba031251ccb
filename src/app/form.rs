//! Create/edit modal state and payload construction.
//!
//! Fields are held as raw strings, exactly as an input element would hold
//! them; conversion to typed payloads happens only on submit.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};

use crate::model::{Client, ClientPayload, Project, ProjectPayload, ProjectStatus};

/// `datetime-local` input format
pub const DEADLINE_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModalState {
    #[default]
    Closed,
    CreateOpen,
    /// Editing the entity with this id
    EditOpen(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("the form is not open")]
    NotOpen,
    #[error("{0} is required")]
    Required(&'static str),
    #[error("hourly rate must be a number, got '{0}'")]
    InvalidRate(String),
    #[error("invalid status: {0}")]
    InvalidStatus(String),
    #[error("deadline must look like 2025-06-01T09:30, got '{0}'")]
    InvalidDeadline(String),
}

/// What a valid submit hands to the dispatcher. `id` present means update.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission<P> {
    pub id: Option<String>,
    pub payload: P,
}

impl<P> Submission<P> {
    pub fn is_edit(&self) -> bool {
        self.id.is_some()
    }
}

/// A modal dialog wrapping a set of form fields
#[derive(Debug, Clone, Default)]
pub struct Modal<F> {
    state: ModalState,
    pub fields: F,
}

impl<F: Default> Modal<F> {
    pub fn state(&self) -> &ModalState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != ModalState::Closed
    }

    /// Entity id when editing
    pub fn editing_id(&self) -> Option<&str> {
        match &self.state {
            ModalState::EditOpen(id) => Some(id),
            _ => None,
        }
    }

    /// Open blank for a new entity.
    pub fn open_create(&mut self) {
        self.fields = F::default();
        self.state = ModalState::CreateOpen;
    }

    /// Close and discard whatever was typed.
    pub fn close(&mut self) {
        self.fields = F::default();
        self.state = ModalState::Closed;
    }

    fn begin_edit(&mut self, id: &str) {
        self.fields = F::default();
        self.state = ModalState::EditOpen(id.to_string());
    }

    fn submission<P>(&self, payload: P) -> Submission<P> {
        Submission {
            id: self.editing_id().map(str::to_string),
            payload,
        }
    }
}

/// Trimmed value, or `None` when blank
fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn required(value: &str, name: &'static str) -> Result<String, FormError> {
    optional(value).ok_or(FormError::Required(name))
}

// ---------------------------------------------------------------------------
// Client form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientFields {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub notes: String,
}

pub type ClientForm = Modal<ClientFields>;

impl Modal<ClientFields> {
    /// Open pre-filled from a client snapshot.
    pub fn open_edit(&mut self, client: &Client) {
        self.begin_edit(&client.id);
        self.fields = ClientFields {
            name: client.name.clone(),
            email: client.email.clone().unwrap_or_default(),
            phone: client.phone.clone().unwrap_or_default(),
            company: client.company.clone().unwrap_or_default(),
            notes: client.notes.clone().unwrap_or_default(),
        };
    }

    pub fn submit(&self) -> Result<Submission<ClientPayload>, FormError> {
        if !self.is_open() {
            return Err(FormError::NotOpen);
        }
        let f = &self.fields;
        let payload = ClientPayload {
            name: required(&f.name, "name")?,
            email: optional(&f.email),
            phone: optional(&f.phone),
            company: optional(&f.company),
            notes: optional(&f.notes),
        };
        Ok(self.submission(payload))
    }
}

// ---------------------------------------------------------------------------
// Project form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFields {
    pub client_id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub hourly_rate: String,
    /// Local wall-clock time in [`DEADLINE_INPUT_FORMAT`]
    pub deadline: String,
}

impl Default for ProjectFields {
    fn default() -> Self {
        ProjectFields {
            client_id: String::new(),
            title: String::new(),
            description: String::new(),
            status: ProjectStatus::Idea.as_str().to_string(),
            hourly_rate: String::new(),
            deadline: String::new(),
        }
    }
}

pub type ProjectForm = Modal<ProjectFields>;

/// Render a stored UTC deadline as a `datetime-local` value in `tz`.
pub fn deadline_to_input<Tz: TimeZone>(deadline: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    deadline
        .with_timezone(tz)
        .format(DEADLINE_INPUT_FORMAT)
        .to_string()
}

/// Interpret a `datetime-local` value as wall-clock time in `tz`.
///
/// An ambiguous local time (DST fall-back) resolves to the earlier instant;
/// a skipped one (spring-forward gap) is rejected.
pub fn deadline_from_input<Tz: TimeZone>(input: &str, tz: &Tz) -> Result<DateTime<Utc>, FormError> {
    let trimmed = input.trim();
    let naive = NaiveDateTime::parse_from_str(trimmed, DEADLINE_INPUT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| FormError::InvalidDeadline(trimmed.to_string()))?;
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Ok(dt.with_timezone(&Utc)),
        LocalResult::None => Err(FormError::InvalidDeadline(trimmed.to_string())),
    }
}

fn format_rate(rate: f64) -> String {
    format!("{}", rate)
}

impl Modal<ProjectFields> {
    /// Open pre-filled from a project snapshot, showing the deadline in `tz`.
    pub fn open_edit<Tz: TimeZone>(&mut self, project: &Project, tz: &Tz)
    where
        Tz::Offset: std::fmt::Display,
    {
        self.begin_edit(&project.id);
        self.fields = ProjectFields {
            client_id: project.client_id.clone(),
            title: project.title.clone(),
            description: project.description.clone().unwrap_or_default(),
            status: project.status.as_str().to_string(),
            hourly_rate: project.hourly_rate.map(format_rate).unwrap_or_default(),
            deadline: project
                .deadline
                .map(|d| deadline_to_input(d, tz))
                .unwrap_or_default(),
        };
    }

    /// Validate and convert, reading the deadline as wall-clock time in `tz`.
    pub fn submit<Tz: TimeZone>(&self, tz: &Tz) -> Result<Submission<ProjectPayload>, FormError> {
        if !self.is_open() {
            return Err(FormError::NotOpen);
        }
        let f = &self.fields;
        let client_id = required(&f.client_id, "client")?;
        let title = required(&f.title, "title")?;

        let status = match optional(&f.status) {
            None => ProjectStatus::Idea,
            Some(s) => s.parse().map_err(FormError::InvalidStatus)?,
        };

        let hourly_rate = match optional(&f.hourly_rate) {
            None => None,
            Some(raw) => {
                let rate: f64 = raw
                    .parse()
                    .map_err(|_| FormError::InvalidRate(raw.clone()))?;
                if !rate.is_finite() {
                    return Err(FormError::InvalidRate(raw));
                }
                Some(rate)
            }
        };

        let deadline = match optional(&f.deadline) {
            None => None,
            Some(raw) => Some(deadline_from_input(&raw, tz)?),
        };

        Ok(self.submission(ProjectPayload {
            client_id,
            title,
            description: optional(&f.description),
            status,
            hourly_rate,
            deadline,
        }))
    }
}
