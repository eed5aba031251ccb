use chrono::TimeZone;
use serde::Serialize;

use crate::app::toast::{Toast, ToastKind};
use crate::model::{Client, Project};
use crate::render::board::{Board, Card, deadline_label, rate_label};
use crate::util::unicode::{display_width, fit_to_width, truncate_to_width};

/// Widest a table cell may grow before it is truncated
const MAX_CELL: usize = 28;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ProjectJson<'a> {
    #[serde(flatten)]
    pub project: &'a Project,
    pub client_name: &'a str,
}

#[derive(Serialize)]
pub struct MessageJson<'a> {
    pub kind: ToastKind,
    pub message: &'a str,
}

pub fn toast_to_json(toast: &Toast) -> MessageJson<'_> {
    MessageJson {
        kind: toast.kind,
        message: &toast.message,
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

/// Client list as an aligned table, one line per client
pub fn format_client_table(clients: &[Client]) -> Vec<String> {
    if clients.is_empty() {
        return vec!["No clients found.".to_string()];
    }

    let header = ["NAME", "COMPANY", "EMAIL", "PHONE", "ID"];
    let rows: Vec<[&str; 5]> = clients
        .iter()
        .map(|c| {
            [
                c.name.as_str(),
                or_dash(c.company.as_deref()),
                or_dash(c.email.as_deref()),
                or_dash(c.phone.as_deref()),
                c.id.as_str(),
            ]
        })
        .collect();

    let mut widths = header.map(display_width);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(display_width(cell).min(MAX_CELL));
        }
    }

    std::iter::once(header)
        .chain(rows)
        .map(|row| {
            let last = row.len() - 1;
            let mut line = String::new();
            for (i, cell) in row.iter().enumerate() {
                if i == last {
                    line.push_str(cell);
                } else {
                    line.push_str(&fit_to_width(cell, widths[i]));
                    line.push_str("  ");
                }
            }
            line.trim_end().to_string()
        })
        .collect()
}

pub fn format_client_detail(client: &Client) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", client.name, client.id)];
    let fields = [
        ("company", &client.company),
        ("email", &client.email),
        ("phone", &client.phone),
    ];
    for (label, value) in fields {
        if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
            lines.push(format!("{}: {}", label, v));
        }
    }
    if let Some(notes) = client.notes.as_deref().filter(|n| !n.is_empty()) {
        lines.push("notes:".to_string());
        for line in notes.lines() {
            lines.push(format!("  {}", line));
        }
    }
    lines
}

/// One board card as a single line
pub fn format_card_line(card: &Card) -> String {
    let mut parts = vec![truncate_to_width(&card.title, 48)];
    if !card.client_name.is_empty() {
        parts.push(card.client_name.clone());
    }
    parts.push(card.rate_label.clone());
    if let Some(due) = &card.deadline_label {
        parts.push(format!("Due: {}", due));
    }
    let mut line = format!("[{}] {}", card.id, parts.join(" | "));
    if card.overdue {
        line.push_str(" (overdue)");
    }
    line
}

/// Stats line followed by one section per status column
pub fn format_board(board: &Board) -> Vec<String> {
    let s = &board.stats;
    let mut lines = vec![format!(
        "{} projects, {} active, {} due soon, avg ${:.0}/hr",
        s.total, s.active, s.due_soon, s.average_rate
    )];
    for column in &board.columns {
        lines.push(String::new());
        lines.push(format!("== {} ({}) ==", column.label(), column.cards.len()));
        if column.is_empty() {
            lines.push("  No projects".to_string());
        }
        for card in &column.cards {
            lines.push(format!("  {}", format_card_line(card)));
        }
    }
    lines
}

pub fn format_project_detail<Tz: TimeZone>(
    project: &Project,
    client_name: &str,
    tz: &Tz,
) -> Vec<String>
where
    Tz::Offset: std::fmt::Display,
{
    let mut lines = vec![
        format!("{} ({})", project.title, project.id),
        format!("status: {}", project.status.label()),
        format!("client: {} ({})", or_dash(Some(client_name)), project.client_id),
        format!("rate: {}", rate_label(project.hourly_rate)),
    ];
    if let Some(deadline) = project.deadline {
        lines.push(format!("Due: {}", deadline_label(deadline, tz)));
    }
    if let Some(desc) = project.description.as_deref().filter(|d| !d.is_empty()) {
        lines.push("description:".to_string());
        for line in desc.lines() {
            lines.push(format!("  {}", line));
        }
    }
    lines
}

pub fn format_toast(toast: &Toast) -> String {
    match toast.kind {
        ToastKind::Success => toast.message.clone(),
        ToastKind::Error => format!("error: {}", toast.message),
    }
}
