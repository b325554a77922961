//! Locally cached view of the service's jobs plus the current selection.

use std::collections::HashSet;

use forge_logging::{forge_debug, forge_warn};

use crate::{Job, JobStatus, Ticket};

/// Result of offering a detail response to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailOutcome {
    Applied,
    /// The selection moved to another job (or was cleared) while the request was in flight.
    NotSelected,
    /// The response carried an older status than the cached copy.
    Regressed,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobStore {
    jobs: Vec<Job>,
    selected: Option<Job>,
    last_list_ticket: Option<Ticket>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Server-ordered snapshot from the last applied list refresh.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn selected(&self) -> Option<&Job> {
        self.selected.as_ref()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_ref().map(|job| job.id.as_str())
    }

    /// Selection key used to invalidate dependent views.
    pub fn selection_key(&self) -> Option<(&str, JobStatus)> {
        self.selected.as_ref().map(|job| (job.id.as_str(), job.status))
    }

    pub fn find(&self, id: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id == id)
    }

    /// Replaces the whole list with `jobs`. The selection is left alone.
    ///
    /// Responses to requests issued before the last applied one are ignored, so an
    /// old snapshot arriving late cannot overwrite a newer one. Returns whether the
    /// snapshot was applied.
    pub fn replace_list(&mut self, ticket: Ticket, jobs: Vec<Job>) -> bool {
        if self.last_list_ticket.is_some_and(|last| ticket < last) {
            forge_debug!(
                target: "forge::store",
                "dropping list response {} older than {:?}",
                ticket,
                self.last_list_ticket
            );
            return false;
        }
        self.last_list_ticket = Some(ticket);

        let mut seen = HashSet::with_capacity(jobs.len());
        let mut snapshot = Vec::with_capacity(jobs.len());
        for job in jobs {
            if seen.insert(job.id.clone()) {
                snapshot.push(job);
            } else {
                forge_warn!(target: "forge::store", "duplicate job id {} in list response", job.id);
            }
        }
        self.jobs = snapshot;
        true
    }

    /// Sets the selection verbatim, without re-fetching.
    pub fn select(&mut self, job: Job) {
        self.selected = Some(job);
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Applies detail fetched for `requested_id` if that job is still the selection.
    pub fn apply_detail(&mut self, requested_id: &str, job: Job) -> DetailOutcome {
        let Some(current) = self.selected.as_mut() else {
            return DetailOutcome::NotSelected;
        };
        if current.id != requested_id || job.id != requested_id {
            return DetailOutcome::NotSelected;
        }
        if !current.status.may_become(job.status) {
            forge_warn!(
                target: "forge::store",
                "ignoring status regression for job {}: {} -> {}",
                job.id,
                current.status,
                job.status
            );
            return DetailOutcome::Regressed;
        }
        *current = job;
        DetailOutcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str, status: JobStatus) -> Job {
        Job {
            id: id.to_string(),
            project_name: format!("p-{id}"),
            status,
            ..Job::default()
        }
    }

    #[test]
    fn replace_list_drops_duplicates_keeping_first() {
        let mut store = JobStore::new();
        assert!(store.replace_list(
            1,
            vec![
                job("a", JobStatus::Queued),
                job("b", JobStatus::Queued),
                job("a", JobStatus::Running),
            ],
        ));
        let ids: Vec<_> = store.jobs().iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(store.jobs()[0].status, JobStatus::Queued);
    }

    #[test]
    fn older_list_ticket_is_ignored() {
        let mut store = JobStore::new();
        assert!(store.replace_list(5, vec![job("new", JobStatus::Running)]));
        assert!(!store.replace_list(4, vec![job("old", JobStatus::Queued)]));
        assert_eq!(store.jobs()[0].id, "new");
    }

    #[test]
    fn detail_for_other_job_is_discarded() {
        let mut store = JobStore::new();
        store.select(job("b", JobStatus::Queued));
        let outcome = store.apply_detail("a", job("a", JobStatus::Succeeded));
        assert_eq!(outcome, DetailOutcome::NotSelected);
        assert_eq!(store.selected_id(), Some("b"));
        assert_eq!(store.selected().map(|j| j.status), Some(JobStatus::Queued));
    }

    #[test]
    fn detail_without_selection_is_discarded() {
        let mut store = JobStore::new();
        let outcome = store.apply_detail("a", job("a", JobStatus::Running));
        assert_eq!(outcome, DetailOutcome::NotSelected);
        assert!(store.selected().is_none());
    }

    #[test]
    fn terminal_selection_is_not_overwritten() {
        let mut store = JobStore::new();
        store.select(job("a", JobStatus::Succeeded));
        let outcome = store.apply_detail("a", job("a", JobStatus::Running));
        assert_eq!(outcome, DetailOutcome::Regressed);
        assert_eq!(store.selected().map(|j| j.status), Some(JobStatus::Succeeded));
    }
}
