use std::collections::BTreeSet;

use crate::model::{Project, ProjectStatus};
use crate::ops::store::EntityCache;

/// Client-side criteria narrowing which cached projects are shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    /// Case-insensitive substring over title, description and client name
    pub search: String,
    /// Empty means all clients
    pub client_id: String,
    statuses: BTreeSet<ProjectStatus>,
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState {
            search: String::new(),
            client_id: String::new(),
            statuses: ProjectStatus::ALL.into_iter().collect(),
        }
    }
}

impl FilterState {
    /// Build a filter with an explicit status set. An empty set means all statuses.
    pub fn with_statuses(statuses: impl IntoIterator<Item = ProjectStatus>) -> Self {
        let statuses: BTreeSet<_> = statuses.into_iter().collect();
        if statuses.is_empty() {
            return Self::default();
        }
        FilterState {
            statuses,
            ..Self::default()
        }
    }

    /// Selected statuses, never empty
    pub fn statuses(&self) -> &BTreeSet<ProjectStatus> {
        &self.statuses
    }

    pub fn has_status(&self, status: ProjectStatus) -> bool {
        self.statuses.contains(&status)
    }

    /// Flip a status chip. Deselecting the last selected status is a no-op.
    /// Returns whether the set changed.
    pub fn toggle_status(&mut self, status: ProjectStatus) -> bool {
        if self.statuses.contains(&status) {
            if self.statuses.len() == 1 {
                return false;
            }
            self.statuses.remove(&status);
        } else {
            self.statuses.insert(status);
        }
        true
    }

    fn matches(&self, project: &Project, client_name: &str, needle: &str) -> bool {
        if !self.statuses.contains(&project.status) {
            return false;
        }
        if !self.client_id.is_empty() && project.client_id != self.client_id {
            return false;
        }
        if needle.is_empty() {
            return true;
        }
        contains_ci(&project.title, needle)
            || project
                .description
                .as_deref()
                .is_some_and(|d| contains_ci(d, needle))
            || contains_ci(client_name, needle)
    }
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Visible subset of `projects`, in input order. The input is not modified.
pub fn apply_filters<'a>(
    projects: &'a [Project],
    cache: &EntityCache,
    filter: &FilterState,
) -> Vec<&'a Project> {
    let needle = filter.search.trim().to_lowercase();
    projects
        .iter()
        .filter(|p| filter.matches(p, cache.client_name(&p.client_id), &needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Client;
    use pretty_assertions::assert_eq;

    fn fixture() -> EntityCache {
        let mut cache = EntityCache::new();
        cache.set_clients(vec![Client::new("c1", "Acme Corp"), Client::new("c2", "Globex")]);
        let mut site = Project::new("p1", "c1", "Website redesign", ProjectStatus::Idea);
        site.description = Some("New landing page".into());
        cache.set_projects(vec![
            site,
            Project::new("p2", "c2", "Mobile app", ProjectStatus::InProgress),
            Project::new("p3", "c1", "Audit", ProjectStatus::Completed),
            Project::new("p4", "gone", "Orphaned", ProjectStatus::Talks),
        ]);
        cache
    }

    fn ids(projects: &[&Project]) -> Vec<String> {
        projects.iter().map(|p| p.id.clone()).collect()
    }

    #[test]
    fn default_filter_keeps_everything_in_order() {
        let cache = fixture();
        let out = apply_filters(cache.projects(), &cache, &FilterState::default());
        assert_eq!(ids(&out), vec!["p1", "p2", "p3", "p4"]);
    }

    #[test]
    fn search_matches_title_description_and_client_name() {
        let cache = fixture();
        let mut filter = FilterState::default();

        filter.search = "MOBILE".into();
        assert_eq!(ids(&apply_filters(cache.projects(), &cache, &filter)), vec!["p2"]);

        filter.search = "landing".into();
        assert_eq!(ids(&apply_filters(cache.projects(), &cache, &filter)), vec!["p1"]);

        filter.search = "acme".into();
        assert_eq!(
            ids(&apply_filters(cache.projects(), &cache, &filter)),
            vec!["p1", "p3"]
        );
    }

    #[test]
    fn client_and_status_criteria_combine() {
        let cache = fixture();
        let mut filter = FilterState::with_statuses([ProjectStatus::Idea, ProjectStatus::Completed]);
        filter.client_id = "c1".into();
        assert_eq!(
            ids(&apply_filters(cache.projects(), &cache, &filter)),
            vec!["p1", "p3"]
        );
        filter.client_id = "c2".into();
        assert!(apply_filters(cache.projects(), &cache, &filter).is_empty());
    }

    #[test]
    fn dangling_client_does_not_break_search() {
        let cache = fixture();
        let mut filter = FilterState::default();
        filter.search = "orphan".into();
        assert_eq!(ids(&apply_filters(cache.projects(), &cache, &filter)), vec!["p4"]);
    }

    #[test]
    fn output_is_an_ordered_subset_for_every_status_set() {
        let cache = fixture();
        // every non-empty subset of the five statuses
        for mask in 1u8..32 {
            let statuses = ProjectStatus::ALL
                .into_iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, s)| s);
            let filter = FilterState::with_statuses(statuses);
            let out = apply_filters(cache.projects(), &cache, &filter);

            let mut positions = out.iter().map(|p| {
                cache
                    .projects()
                    .iter()
                    .position(|q| q.id == p.id)
                    .unwrap()
            });
            let mut last = None;
            for pos in positions.by_ref() {
                assert!(last.is_none_or(|l| pos > l));
                last = Some(pos);
            }
            assert!(out.iter().all(|p| filter.has_status(p.status)));
        }
    }

    #[test]
    fn toggling_sole_status_is_noop() {
        let mut filter = FilterState::with_statuses([ProjectStatus::Review]);
        assert!(!filter.toggle_status(ProjectStatus::Review));
        assert_eq!(filter.statuses().len(), 1);
        assert!(filter.has_status(ProjectStatus::Review));

        assert!(filter.toggle_status(ProjectStatus::Idea));
        assert!(filter.toggle_status(ProjectStatus::Review));
        assert_eq!(
            filter.statuses().iter().copied().collect::<Vec<_>>(),
            vec![ProjectStatus::Idea]
        );
    }

    #[test]
    fn toggling_every_status_never_empties_the_set() {
        let mut filter = FilterState::default();
        for status in ProjectStatus::ALL {
            filter.toggle_status(status);
            assert!(!filter.statuses().is_empty());
        }
        assert_eq!(
            filter.statuses().iter().copied().collect::<Vec<_>>(),
            vec![ProjectStatus::Completed]
        );
    }

    #[test]
    fn empty_status_list_means_all() {
        let filter = FilterState::with_statuses([]);
        assert_eq!(filter.statuses().len(), 5);
    }
}
