//! Wires user actions to API calls, cache refreshes and notifications.
//!
//! The dispatcher is the single owner of the entity cache, the filter state
//! and the forms. Every mutation happens synchronously inside one `&mut self`
//! call, after the awaited request has resolved. List fetches can also be
//! driven as separate begin and finish steps, which keeps the board's loading
//! state observable while the request is outstanding.

use std::pin::Pin;
use std::time::Instant;

use chrono::{DateTime, TimeZone, Utc};

use crate::api::{ApiClient, ApiError};
use crate::model::{
    Client, ClientPayload, Project, ProjectPayload, ProjectStatus, UiConfig, User,
};
use crate::ops::filter::FilterState;
use crate::ops::store::{EntityCache, FetchTicket};
use crate::render::board::{Board, build_board};
use crate::render::html;

use super::confirm::Confirm;
use super::debounce::Debouncer;
use super::form::{ClientForm, ProjectForm, Submission};
use super::toast::Toasts;

/// How an action ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// The user declined a confirmation prompt; nothing was sent.
    Cancelled,
    /// Reported to the user (notification or inline error).
    Failed,
    /// The session was rejected and the sign-in redirect issued.
    SessionExpired,
}

type Pending<T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send>>;

/// A list request that has been issued but not yet applied.
///
/// It owns its own handle on the API client, so the dispatcher stays free
/// while the request is outstanding. Hand the [`Fetched`] result back to the
/// matching `finish_*` method.
#[must_use = "a fetch does nothing until it is sent and finished"]
pub struct Fetch<T> {
    ticket: FetchTicket,
    request: Pending<T>,
}

impl<T> Fetch<T> {
    pub async fn send(self) -> Fetched<T> {
        Fetched {
            ticket: self.ticket,
            result: self.request.await,
        }
    }
}

/// Response to a [`Fetch`], tagged with the ticket it was issued under.
pub struct Fetched<T> {
    ticket: FetchTicket,
    result: Result<T, ApiError>,
}

pub struct Dispatcher<C> {
    api: ApiClient,
    confirm: C,
    cache: EntityCache,
    filter: FilterState,
    /// Server-side search term for the client table
    client_search: String,
    client_search_input: Debouncer<String>,
    board_search_input: Debouncer<String>,
    toasts: Toasts,
    pub client_form: ClientForm,
    pub project_form: ProjectForm,
    /// Newest project fetch not yet finished; the board shows its loading
    /// overlay while this is set.
    projects_pending: Option<FetchTicket>,
    clients_failed: bool,
    projects_failed: bool,
    ui: UiConfig,
}

impl<C: Confirm> Dispatcher<C> {
    pub fn new(api: ApiClient, confirm: C, ui: UiConfig) -> Self {
        Dispatcher {
            api,
            confirm,
            cache: EntityCache::new(),
            filter: FilterState::default(),
            client_search: String::new(),
            client_search_input: Debouncer::new(ui.search_debounce()),
            board_search_input: Debouncer::new(ui.search_debounce()),
            toasts: Toasts::new(ui.toast_ttl()),
            client_form: ClientForm::default(),
            project_form: ProjectForm::default(),
            projects_pending: None,
            clients_failed: false,
            projects_failed: false,
            ui,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut FilterState {
        &mut self.filter
    }

    pub fn client_search(&self) -> &str {
        &self.client_search
    }

    pub fn toasts(&mut self) -> &mut Toasts {
        &mut self.toasts
    }

    pub fn board_loading(&self) -> bool {
        self.projects_pending.is_some()
    }

    pub fn clients_failed(&self) -> bool {
        self.clients_failed
    }

    pub fn projects_failed(&self) -> bool {
        self.projects_failed
    }

    /// Turn an API failure into a notification. Session expiry stays silent.
    fn report(&mut self, err: ApiError, action: &str) -> Outcome {
        match err.user_message(action) {
            None => Outcome::SessionExpired,
            Some(message) => {
                tracing::debug!(error = %err, action, "action failed");
                self.toasts.error(message, Instant::now());
                Outcome::Failed
            }
        }
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Initial page load: clients, then projects.
    pub async fn load(&mut self) -> Outcome {
        match self.refresh_clients().await {
            Outcome::SessionExpired => Outcome::SessionExpired,
            _ => self.refresh_projects().await,
        }
    }

    /// Re-fetch the client list with the current search term. On failure the
    /// previous list stays and the table shows a retry row.
    pub async fn refresh_clients(&mut self) -> Outcome {
        let fetch = self.begin_clients_fetch();
        let fetched = fetch.send().await;
        self.finish_clients_fetch(fetched)
    }

    pub async fn refresh_projects(&mut self) -> Outcome {
        let fetch = self.begin_projects_fetch();
        let fetched = fetch.send().await;
        self.finish_projects_fetch(fetched)
    }

    /// Issue a client list request for the current search term. Any earlier
    /// client fetch still outstanding goes stale.
    pub fn begin_clients_fetch(&mut self) -> Fetch<Vec<Client>> {
        let ticket = self.cache.begin_clients_fetch();
        let api = self.api.clone();
        let search = self.client_search.clone();
        Fetch {
            ticket,
            request: Box::pin(async move { api.list_clients(Some(&search)).await }),
        }
    }

    /// Apply a client list response. A stale response changes nothing.
    pub fn finish_clients_fetch(&mut self, fetched: Fetched<Vec<Client>>) -> Outcome {
        let Fetched { ticket, result } = fetched;
        match result {
            Ok(clients) => {
                if self.cache.apply_clients(ticket, clients) {
                    self.clients_failed = false;
                }
                Outcome::Done
            }
            Err(ApiError::AuthExpired) => Outcome::SessionExpired,
            Err(err) if !self.cache.is_current_clients(ticket) => {
                tracing::debug!(error = %err, ?ticket, "ignoring failure of a stale client fetch");
                Outcome::Failed
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to fetch clients");
                self.clients_failed = true;
                Outcome::Failed
            }
        }
    }

    /// Issue a project list request and raise the board's loading overlay.
    /// The overlay stays up until the newest project fetch is finished.
    pub fn begin_projects_fetch(&mut self) -> Fetch<Vec<Project>> {
        let ticket = self.cache.begin_projects_fetch();
        self.projects_pending = Some(ticket);
        let api = self.api.clone();
        Fetch {
            ticket,
            request: Box::pin(async move { api.list_projects().await }),
        }
    }

    /// Apply a project list response and lower the loading overlay if this was
    /// the newest fetch. A stale response changes nothing.
    pub fn finish_projects_fetch(&mut self, fetched: Fetched<Vec<Project>>) -> Outcome {
        let Fetched { ticket, result } = fetched;
        if self.projects_pending == Some(ticket) {
            self.projects_pending = None;
        }
        match result {
            Ok(projects) => {
                if self.cache.apply_projects(ticket, projects) {
                    self.projects_failed = false;
                }
                Outcome::Done
            }
            Err(ApiError::AuthExpired) => Outcome::SessionExpired,
            Err(err) if !self.cache.is_current_projects(ticket) => {
                tracing::debug!(error = %err, ?ticket, "ignoring failure of a stale project fetch");
                Outcome::Failed
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to fetch projects");
                self.projects_failed = true;
                Outcome::Failed
            }
        }
    }

    // -----------------------------------------------------------------------
    // Clients
    // -----------------------------------------------------------------------

    /// Open the client modal for editing a cached client. False if unknown.
    pub fn edit_client(&mut self, id: &str) -> bool {
        match self.cache.client_by_id(id) {
            Some(client) => {
                self.client_form.open_edit(client);
                true
            }
            None => false,
        }
    }

    /// Validate the client modal and save it.
    pub async fn submit_client_form(&mut self) -> Outcome {
        match self.client_form.submit() {
            Ok(submission) => self.save_client(submission).await,
            Err(err) => {
                self.toasts.error(err.to_string(), Instant::now());
                Outcome::Failed
            }
        }
    }

    pub async fn save_client(&mut self, submission: Submission<ClientPayload>) -> Outcome {
        let result = match &submission.id {
            Some(id) => self.api.update_client(id, &submission.payload).await,
            None => self.api.create_client(&submission.payload).await,
        };
        match result {
            Ok(saved) => {
                tracing::info!(id = %saved.id, "client saved");
                self.client_form.close();
                if self.refresh_clients().await == Outcome::SessionExpired {
                    return Outcome::SessionExpired;
                }
                let message = if submission.is_edit() {
                    "Client updated"
                } else {
                    "Client created"
                };
                self.toasts.success(message, Instant::now());
                Outcome::Done
            }
            Err(err) => self.report(err, "save client"),
        }
    }

    /// Delete after an explicit confirmation. Declining sends nothing.
    pub async fn delete_client(&mut self, id: &str) -> Outcome {
        if !self
            .confirm
            .confirm("Are you sure you want to delete this client?")
        {
            return Outcome::Cancelled;
        }
        match self.api.delete_client(id).await {
            Ok(()) => {
                tracing::info!(id, "client deleted");
                if self.refresh_clients().await == Outcome::SessionExpired {
                    return Outcome::SessionExpired;
                }
                self.toasts.success("Client deleted", Instant::now());
                Outcome::Done
            }
            Err(err) => self.report(err, "delete client"),
        }
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    pub fn edit_project<Tz: TimeZone>(&mut self, id: &str, tz: &Tz) -> bool
    where
        Tz::Offset: std::fmt::Display,
    {
        match self.cache.project_by_id(id) {
            Some(project) => {
                self.project_form.open_edit(project, tz);
                true
            }
            None => false,
        }
    }

    pub async fn submit_project_form<Tz: TimeZone>(&mut self, tz: &Tz) -> Outcome {
        match self.project_form.submit(tz) {
            Ok(submission) => self.save_project(submission).await,
            Err(err) => {
                self.toasts.error(err.to_string(), Instant::now());
                Outcome::Failed
            }
        }
    }

    pub async fn save_project(&mut self, submission: Submission<ProjectPayload>) -> Outcome {
        let result = match &submission.id {
            Some(id) => self.api.update_project(id, &submission.payload).await,
            None => self.api.create_project(&submission.payload).await,
        };
        match result {
            Ok(saved) => {
                tracing::info!(id = %saved.id, "project saved");
                self.project_form.close();
                self.after_project_change(if submission.is_edit() {
                    "Project updated"
                } else {
                    "Project created"
                })
                .await
            }
            Err(err) => self.report(err, "save project"),
        }
    }

    /// Move a project to another kanban column.
    pub async fn change_project_status(&mut self, id: &str, status: ProjectStatus) -> Outcome {
        match self.api.update_project_status(id, status).await {
            Ok(_) => {
                tracing::info!(id, %status, "project moved");
                self.after_project_change(&format!("Moved to {}", status.label()))
                    .await
            }
            Err(err) => self.report(err, "update project status"),
        }
    }

    pub async fn delete_project(&mut self, id: &str) -> Outcome {
        if !self
            .confirm
            .confirm("Are you sure you want to delete this project?")
        {
            return Outcome::Cancelled;
        }
        match self.api.delete_project(id).await {
            Ok(()) => {
                tracing::info!(id, "project deleted");
                self.after_project_change("Project deleted").await
            }
            Err(err) => self.report(err, "delete project"),
        }
    }

    async fn after_project_change(&mut self, message: &str) -> Outcome {
        if self.refresh_projects().await == Outcome::SessionExpired {
            return Outcome::SessionExpired;
        }
        self.toasts.success(message, Instant::now());
        Outcome::Done
    }

    // -----------------------------------------------------------------------
    // Filters and search
    // -----------------------------------------------------------------------

    /// Keystroke in the client search box. Nothing is fetched until [`tick`](Self::tick)
    /// sees the input settle.
    pub fn on_client_search_input(&mut self, text: &str, now: Instant) {
        self.client_search_input.trigger(text.to_string(), now);
    }

    /// Keystroke in the board search box.
    pub fn on_board_search_input(&mut self, text: &str, now: Instant) {
        self.board_search_input.trigger(text.to_string(), now);
    }

    /// Search clients right away, dropping any keystrokes still settling.
    pub async fn search_clients(&mut self, text: &str) -> Outcome {
        self.client_search_input.cancel();
        self.client_search = text.trim().to_string();
        self.refresh_clients().await
    }

    /// Earliest instant at which [`tick`](Self::tick) has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        match (
            self.client_search_input.deadline(),
            self.board_search_input.deadline(),
        ) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fire any search input that has settled.
    ///
    /// Returns `None` when nothing was due. A settled board search yields
    /// `Done`; a settled client search yields the outcome of its refetch, so
    /// the caller sees `SessionExpired` when the session has lapsed.
    pub async fn tick(&mut self, now: Instant) -> Option<Outcome> {
        let mut outcome = None;
        if let Some(text) = self.board_search_input.poll(now) {
            self.filter.search = text.trim().to_string();
            outcome = Some(Outcome::Done);
        }
        if let Some(text) = self.client_search_input.poll(now) {
            self.client_search = text.trim().to_string();
            outcome = Some(self.refresh_clients().await);
        }
        outcome
    }

    /// Flip a status chip; the last selected status cannot be turned off.
    pub fn toggle_status(&mut self, status: ProjectStatus) -> bool {
        self.filter.toggle_status(status)
    }

    /// Restrict the board to one client; empty shows all.
    pub fn set_client_filter(&mut self, client_id: &str) {
        self.filter.client_id = client_id.to_string();
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    pub async fn login(&mut self, email: &str, password: &str) -> Result<User, Outcome> {
        match self.api.login(email.trim(), password).await {
            Ok(auth) => {
                tracing::info!(email = %auth.user.email, "signed in");
                self.toasts
                    .success(format!("Signed in as {}", auth.user.email), Instant::now());
                Ok(auth.user)
            }
            Err(err) => Err(self.report(err, "sign in")),
        }
    }

    pub async fn register(
        &mut self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<User, Outcome> {
        let full_name = full_name.map(str::trim).filter(|n| !n.is_empty());
        match self.api.register(email.trim(), password, full_name).await {
            Ok(user) => {
                self.toasts
                    .success("Account created! Please sign in.", Instant::now());
                Ok(user)
            }
            Err(err) => Err(self.report(err, "register")),
        }
    }

    pub async fn logout(&mut self) -> Outcome {
        match self.api.logout().await {
            Ok(()) => {
                self.cache = EntityCache::new();
                self.toasts.success("Signed out", Instant::now());
                Outcome::Done
            }
            Err(err) => self.report(err, "sign out"),
        }
    }

    pub async fn current_user(&mut self) -> Result<User, Outcome> {
        match self.api.current_user().await {
            Ok(user) => Ok(user),
            Err(err) => Err(self.report(err, "load account")),
        }
    }

    // -----------------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------------

    pub fn board<Tz: TimeZone>(&self, now: DateTime<Utc>, tz: &Tz) -> Board
    where
        Tz::Offset: std::fmt::Display,
    {
        build_board(
            &self.cache,
            &self.filter,
            now,
            self.ui.due_soon_window(),
            tz,
        )
    }

    /// Chips and board markup. After a failed fetch a retry banner sits above
    /// the last successfully loaded board.
    pub fn board_html<Tz: TimeZone>(&self, now: DateTime<Utc>, tz: &Tz) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        let mut out = if self.projects_failed {
            html::board_failed()
        } else {
            String::new()
        };
        out.push_str(&html::status_chips(&self.filter));
        out.push_str(&html::board(&self.board(now, tz), self.board_loading()));
        out
    }

    /// Client table rows; a retry row leads the stale rows after a failed fetch.
    pub fn client_table_html(&self) -> String {
        if !self.clients_failed {
            return html::client_rows(self.cache.clients());
        }
        let mut out = html::client_rows_failed();
        if !self.cache.clients().is_empty() {
            out.push('\n');
            out.push_str(&html::client_rows(self.cache.clients()));
        }
        out
    }

    pub fn client_options_html(&self) -> String {
        html::client_options(self.cache.clients(), &self.project_form.fields.client_id)
    }
}
