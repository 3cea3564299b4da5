use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::domain::{ApplicationId, ApplicationRecord, ApplicationStatus};
use crate::workflows::marketplace::{CandidateId, CompanyId, JobId};

/// Storage abstraction so the service can be exercised in isolation.
pub trait ApplicationStore: Send + Sync {
    /// Fails when the id is taken or the (job, candidate) pair already applied.
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, StoreError>;
    fn update(&self, record: ApplicationRecord) -> Result<(), StoreError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, StoreError>;
    fn list(&self, query: &ApplicationQuery) -> Result<Vec<ApplicationRecord>, StoreError>;

    fn stats(&self, query: &ApplicationQuery) -> Result<ApplicationStats, StoreError> {
        Ok(ApplicationStats::tally(&self.list(query)?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("candidate `{candidate_id}` already applied to job `{job_id}`")]
    DuplicateApplication {
        job_id: JobId,
        candidate_id: CandidateId,
    },
    #[error("application `{0}` already exists")]
    Conflict(ApplicationId),
    #[error("application `{0}` not found")]
    NotFound(ApplicationId),
    #[error("application store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationSort {
    #[default]
    AppliedAtDesc,
    Status,
    CompanyName,
}

impl ApplicationSort {
    fn compare(self, a: &ApplicationRecord, b: &ApplicationRecord) -> Ordering {
        let primary = match self {
            ApplicationSort::AppliedAtDesc => b.applied_at.cmp(&a.applied_at),
            ApplicationSort::Status => a.status.label().cmp(b.status.label()),
            ApplicationSort::CompanyName => a
                .job
                .company_name
                .to_lowercase()
                .cmp(&b.job.company_name.to_lowercase()),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

/// Dashboard filters. Every populated field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationQuery {
    pub candidate_id: Option<CandidateId>,
    pub company_id: Option<CompanyId>,
    pub status: Option<ApplicationStatus>,
    pub search: Option<String>,
    pub sort: ApplicationSort,
}

impl ApplicationQuery {
    pub fn for_candidate(candidate_id: CandidateId) -> Self {
        Self {
            candidate_id: Some(candidate_id),
            ..Self::default()
        }
    }

    pub fn for_company(company_id: CompanyId) -> Self {
        Self {
            company_id: Some(company_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &ApplicationRecord) -> bool {
        if let Some(candidate_id) = &self.candidate_id {
            if &record.candidate_id != candidate_id {
                return false;
            }
        }
        if let Some(company_id) = &self.company_id {
            if &record.job.company_id != company_id {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                [
                    &record.job.title,
                    &record.job.company_name,
                    &record.candidate_name,
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&term))
            }
            _ => true,
        }
    }

    /// Filtered and sorted copies of `records`.
    pub fn project<'a, I>(&self, records: I) -> Vec<ApplicationRecord>
    where
        I: IntoIterator<Item = &'a ApplicationRecord>,
    {
        let mut selected: Vec<ApplicationRecord> = records
            .into_iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect();
        selected.sort_by(|a, b| self.sort.compare(a, b));
        selected
    }
}

/// Per-status counts shown on the dashboards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplicationStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub pending_for_proof: usize,
    pub verified: usize,
    pub rejected: usize,
}

impl ApplicationStats {
    pub fn tally(records: &[ApplicationRecord]) -> Self {
        records.iter().fold(Self::default(), |mut stats, record| {
            stats.total += 1;
            match record.status {
                ApplicationStatus::Pending => stats.pending += 1,
                ApplicationStatus::Approved => stats.approved += 1,
                ApplicationStatus::PendingForProof => stats.pending_for_proof += 1,
                ApplicationStatus::Verified => stats.verified += 1,
                ApplicationStatus::Rejected => stats.rejected += 1,
            }
            stats
        })
    }

    pub fn count(&self, status: ApplicationStatus) -> usize {
        match status {
            ApplicationStatus::Pending => self.pending,
            ApplicationStatus::Approved => self.approved,
            ApplicationStatus::PendingForProof => self.pending_for_proof,
            ApplicationStatus::Verified => self.verified,
            ApplicationStatus::Rejected => self.rejected,
        }
    }
}

#[derive(Default, Clone)]
pub struct InMemoryApplicationStore {
    records: Arc<Mutex<BTreeMap<ApplicationId, ApplicationRecord>>>,
}

impl InMemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ApplicationStore for InMemoryApplicationStore {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(StoreError::Conflict(record.id));
        }
        if guard.values().any(|existing| {
            existing.job.job_id == record.job.job_id && existing.candidate_id == record.candidate_id
        }) {
            return Err(StoreError::DuplicateApplication {
                job_id: record.job.job_id,
                candidate_id: record.candidate_id,
            });
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: ApplicationRecord) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        match guard.get_mut(&record.id) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(StoreError::NotFound(record.id)),
        }
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self, query: &ApplicationQuery) -> Result<Vec<ApplicationRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(query.project(guard.values()))
    }
}
