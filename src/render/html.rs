//! HTML markup for the client table, the client picker and the kanban board.
//!
//! Every user-supplied string passes through [`escape_html`] before it is
//! interpolated, including attribute values.

use std::fmt::Write;

use crate::model::{Client, ProjectStatus};
use crate::ops::filter::FilterState;
use crate::ops::stats::BoardStats;

use super::board::{Board, Card, Column};

pub const NO_CLIENTS: &str = "No clients found. Click \"Add Client\" to get started.";
pub const CLIENTS_LOAD_FAILED: &str = "Failed to load clients. Please try again.";
pub const PROJECTS_LOAD_FAILED: &str = "Failed to load projects. Please try again.";
pub const CLIENT_PLACEHOLDER: &str = "Select a client...";

/// Escape text for element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn or_dash(value: Option<&str>) -> String {
    match value.filter(|v| !v.is_empty()) {
        Some(v) => escape_html(v),
        None => "\u{2014}".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Client table
// ---------------------------------------------------------------------------

/// `<tr>` rows for the client table body
pub fn client_rows(clients: &[Client]) -> String {
    if clients.is_empty() {
        return format!(
            "<tr><td colspan=\"5\" class=\"empty\">{}</td></tr>",
            escape_html(NO_CLIENTS)
        );
    }
    let mut out = String::new();
    for client in clients {
        let id = escape_html(&client.id);
        let _ = write!(
            out,
            "<tr data-client-id=\"{id}\">\
             <td class=\"name\">{}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td class=\"actions\">\
             <button data-action=\"edit-client\" data-id=\"{id}\">Edit</button>\
             <button data-action=\"delete-client\" data-id=\"{id}\">Delete</button>\
             </td></tr>\n",
            escape_html(&client.name),
            or_dash(client.email.as_deref()),
            or_dash(client.phone.as_deref()),
            or_dash(client.company.as_deref()),
        );
    }
    out
}

/// Inline retry row shown in place of the table body after a failed fetch
pub fn client_rows_failed() -> String {
    format!(
        "<tr><td colspan=\"5\" class=\"error\">{} \
         <button data-action=\"retry-clients\">Retry</button></td></tr>",
        escape_html(CLIENTS_LOAD_FAILED)
    )
}

/// `<option>` list for the project form's client picker. The selection is
/// kept only if that client is still present.
pub fn client_options(clients: &[Client], selected: &str) -> String {
    let mut out = format!("<option value=\"\">{}</option>", CLIENT_PLACEHOLDER);
    for client in clients {
        let marker = if !selected.is_empty() && client.id == selected {
            " selected"
        } else {
            ""
        };
        let _ = write!(
            out,
            "<option value=\"{}\"{}>{}</option>",
            escape_html(&client.id),
            marker,
            escape_html(&client.name)
        );
    }
    out
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

pub fn stats_bar(stats: &BoardStats) -> String {
    format!(
        "<div class=\"stats\">\
         <span data-stat=\"total\">{}</span>\
         <span data-stat=\"active\">{}</span>\
         <span data-stat=\"due-soon\">{}</span>\
         <span data-stat=\"average-rate\">${:.0}/hr</span>\
         </div>",
        stats.total, stats.active, stats.due_soon, stats.average_rate
    )
}

/// Toggle chips for the status filter
pub fn status_chips(filter: &FilterState) -> String {
    let mut out = String::from("<div class=\"status-chips\">");
    for status in ProjectStatus::ALL {
        let class = if filter.has_status(status) {
            "chip active"
        } else {
            "chip"
        };
        let _ = write!(
            out,
            "<button class=\"{}\" data-action=\"toggle-status\" data-status=\"{}\">{}</button>",
            class,
            status,
            status.label()
        );
    }
    out.push_str("</div>");
    out
}

pub fn card(card: &Card) -> String {
    let id = escape_html(&card.id);
    let mut out = String::new();
    let class = if card.overdue { "card overdue" } else { "card" };
    let _ = write!(out, "<div class=\"{}\" data-project-id=\"{}\">", class, id);
    let _ = write!(
        out,
        "<h4>{}</h4><button data-action=\"delete-project\" data-id=\"{}\">\u{2715}</button>",
        escape_html(&card.title),
        id
    );
    if !card.client_name.is_empty() {
        let _ = write!(out, "<p class=\"client\">{}</p>", escape_html(&card.client_name));
    }
    if let Some(desc) = &card.description {
        let _ = write!(out, "<p class=\"description\">{}</p>", escape_html(desc));
    }
    let _ = write!(out, "<div class=\"meta\"><span>{}</span>", card.rate_label);
    if let Some(due) = &card.deadline_label {
        let _ = write!(out, "<span class=\"due\">Due: {}</span>", due);
    }
    out.push_str("</div><div class=\"transitions\">");
    for target in &card.transitions {
        let _ = write!(
            out,
            "<button data-action=\"move\" data-id=\"{}\" data-status=\"{}\">\u{2192} {}</button>",
            id,
            target,
            target.label()
        );
    }
    let _ = write!(
        out,
        "</div><button data-action=\"edit-project\" data-id=\"{}\">Edit</button></div>",
        id
    );
    out
}

pub fn column(column: &Column) -> String {
    let mut out = format!(
        "<section class=\"column\" id=\"column-{}\"><h3>{} <span class=\"count\">{}</span></h3>",
        column.status,
        column.label(),
        column.cards.len()
    );
    if column.is_empty() {
        out.push_str("<p class=\"empty\">No projects</p>");
    } else {
        for c in &column.cards {
            out.push_str(&card(c));
        }
    }
    out.push_str("</section>");
    out
}

/// Stats bar plus the five columns. `loading` adds the overlay class.
pub fn board(board: &Board, loading: bool) -> String {
    let class = if loading { "board loading" } else { "board" };
    let mut out = format!("<div class=\"{}\">", class);
    out.push_str(&stats_bar(&board.stats));
    out.push_str("<div class=\"columns\">");
    for col in &board.columns {
        out.push_str(&column(col));
    }
    out.push_str("</div></div>");
    out
}

pub fn board_failed() -> String {
    format!(
        "<div class=\"board error\">{} <button data-action=\"retry-projects\">Retry</button></div>",
        escape_html(PROJECTS_LOAD_FAILED)
    )
}
