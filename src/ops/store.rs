use crate::model::{Client, Project};

/// Ticket handed out when a list fetch starts. A response is applied only if
/// its ticket is still the newest one for that list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// Monotonic request-generation counter for one list
#[derive(Debug, Clone, Default)]
struct Generation {
    issued: u64,
}

impl Generation {
    fn next(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket(self.issued)
    }

    fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.issued
    }
}

/// In-memory copy of the last successful list reads.
///
/// Lists are replaced wholesale; there is no per-entity patching and no
/// conflict detection. A failed fetch never touches the cache.
#[derive(Debug, Clone, Default)]
pub struct EntityCache {
    clients: Vec<Client>,
    projects: Vec<Project>,
    client_gen: Generation,
    project_gen: Generation,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn set_clients(&mut self, clients: Vec<Client>) {
        self.clients = clients;
    }

    pub fn set_projects(&mut self, projects: Vec<Project>) {
        self.projects = projects;
    }

    pub fn client_by_id(&self, id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }

    pub fn project_by_id(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Display name of a project's client; empty for a dangling reference.
    pub fn client_name(&self, client_id: &str) -> &str {
        self.client_by_id(client_id)
            .map(|c| c.name.as_str())
            .unwrap_or("")
    }

    /// Start a client list fetch. Any earlier outstanding ticket goes stale.
    pub fn begin_clients_fetch(&mut self) -> FetchTicket {
        self.client_gen.next()
    }

    pub fn begin_projects_fetch(&mut self) -> FetchTicket {
        self.project_gen.next()
    }

    pub fn is_current_clients(&self, ticket: FetchTicket) -> bool {
        self.client_gen.is_current(ticket)
    }

    pub fn is_current_projects(&self, ticket: FetchTicket) -> bool {
        self.project_gen.is_current(ticket)
    }

    /// Apply a client list if `ticket` is still current. Returns whether it was applied.
    pub fn apply_clients(&mut self, ticket: FetchTicket, clients: Vec<Client>) -> bool {
        if !self.client_gen.is_current(ticket) {
            tracing::warn!(?ticket, "discarding out-of-order client list response");
            return false;
        }
        self.set_clients(clients);
        true
    }

    pub fn apply_projects(&mut self, ticket: FetchTicket, projects: Vec<Project>) -> bool {
        if !self.project_gen.is_current(ticket) {
            tracing::warn!(?ticket, "discarding out-of-order project list response");
            return false;
        }
        self.set_projects(projects);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProjectStatus;

    #[test]
    fn lookups_and_dangling_client_name() {
        let mut cache = EntityCache::new();
        cache.set_clients(vec![Client::new("c1", "Acme")]);
        cache.set_projects(vec![Project::new("p1", "c9", "Orphan", ProjectStatus::Idea)]);

        assert_eq!(cache.client_by_id("c1").map(|c| c.name.as_str()), Some("Acme"));
        assert!(cache.client_by_id("c2").is_none());
        assert_eq!(cache.client_name("c1"), "Acme");
        assert_eq!(cache.client_name("c9"), "");
        assert_eq!(cache.project_by_id("p1").map(|p| p.title.as_str()), Some("Orphan"));
    }

    #[test]
    fn set_replaces_wholesale() {
        let mut cache = EntityCache::new();
        cache.set_clients(vec![Client::new("c1", "Acme"), Client::new("c2", "Globex")]);
        cache.set_clients(vec![Client::new("c3", "Initech")]);
        let ids: Vec<_> = cache.clients().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c3"]);
    }

    #[test]
    fn stale_ticket_is_discarded() {
        let mut cache = EntityCache::new();
        let older = cache.begin_clients_fetch();
        let newer = cache.begin_clients_fetch();

        assert!(cache.apply_clients(newer, vec![Client::new("c2", "Newer")]));
        assert!(!cache.apply_clients(older, vec![Client::new("c1", "Older")]));
        assert_eq!(cache.clients()[0].name, "Newer");
    }

    #[test]
    fn generations_are_per_list() {
        let mut cache = EntityCache::new();
        let clients = cache.begin_clients_fetch();
        let projects = cache.begin_projects_fetch();
        assert!(cache.apply_projects(projects, vec![]));
        assert!(cache.apply_clients(clients, vec![]));
    }
}
