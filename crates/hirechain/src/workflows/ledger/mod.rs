//! Boundary to the marketplace contract that holds canonical jobs, profiles, and applications.
//!
//! The contract exchanges loosely typed tuples: enums travel as small integers, salary ranges and
//! profiles as string arrays. [`Ledger`] speaks that raw shape; [`LedgerGateway`] is the only
//! place raw records are decoded into (or encoded from) the typed marketplace model, and it
//! rejects anything that does not validate.

pub mod codec;
mod memory;
mod records;

use chrono::SecondsFormat;
use tracing::debug;

pub use codec::LedgerApplicationEntry;
pub use memory::InMemoryLedger;
pub use records::{LedgerApplication, LedgerCandidate, LedgerCompany, LedgerJob};

use crate::workflows::applications::{ApplicationId, ApplicationRecord, ApplicationStatus};
use crate::workflows::marketplace::{Candidate, CandidateId, Company, CompanyId, Job, JobId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("ledger record field `{field}` is invalid: {reason}")]
    Decode { field: &'static str, reason: String },
    #[error("{kind} `{id}` not found on ledger")]
    NotFound { kind: &'static str, id: String },
    #[error("{kind} `{id}` already exists on ledger")]
    AlreadyExists { kind: &'static str, id: String },
}

impl LedgerError {
    pub fn decode(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Decode {
            field,
            reason: reason.into(),
        }
    }
}

/// Raw contract surface. Implementations talk to the chain (or stand in for it).
pub trait Ledger: Send + Sync {
    fn get_job(&self, job_id: &str) -> Result<Option<LedgerJob>, LedgerError>;
    fn get_candidate(&self, candidate_id: &str) -> Result<Option<LedgerCandidate>, LedgerError>;
    fn get_company(&self, company_id: &str) -> Result<Option<LedgerCompany>, LedgerError>;
    fn get_all_jobs(&self) -> Result<Vec<LedgerJob>, LedgerError>;
    fn get_all_applications(&self) -> Result<Vec<LedgerApplication>, LedgerError>;

    fn post_job(&self, job: LedgerJob) -> Result<(), LedgerError>;
    fn register_candidate(&self, candidate: LedgerCandidate) -> Result<(), LedgerError>;
    fn register_company(&self, company: LedgerCompany) -> Result<(), LedgerError>;
    fn submit_application(&self, application: LedgerApplication) -> Result<(), LedgerError>;
    fn update_application_status(&self, application_id: &str, status: u8)
        -> Result<(), LedgerError>;
}

/// Typed, validating facade over a [`Ledger`].
pub struct LedgerGateway<L> {
    ledger: L,
}

impl<L: Ledger> LedgerGateway<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    pub fn inner(&self) -> &L {
        &self.ledger
    }

    pub fn job(&self, id: &JobId) -> Result<Job, LedgerError> {
        let raw = self.ledger.get_job(id.as_str())?.ok_or_else(|| LedgerError::NotFound {
            kind: "job",
            id: id.to_string(),
        })?;
        Job::try_from(raw)
    }

    pub fn candidate(&self, id: &CandidateId) -> Result<Candidate, LedgerError> {
        let raw = self
            .ledger
            .get_candidate(id.as_str())?
            .ok_or_else(|| LedgerError::NotFound {
                kind: "candidate",
                id: id.to_string(),
            })?;
        Candidate::try_from(raw)
    }

    pub fn company(&self, id: &CompanyId) -> Result<Company, LedgerError> {
        let raw = self
            .ledger
            .get_company(id.as_str())?
            .ok_or_else(|| LedgerError::NotFound {
                kind: "company",
                id: id.to_string(),
            })?;
        Company::try_from(raw)
    }

    /// Every job on the ledger. A single malformed entry fails the whole read.
    pub fn jobs(&self) -> Result<Vec<Job>, LedgerError> {
        self.ledger
            .get_all_jobs()?
            .into_iter()
            .map(Job::try_from)
            .collect()
    }

    pub fn applications(&self) -> Result<Vec<LedgerApplicationEntry>, LedgerError> {
        self.ledger
            .get_all_applications()?
            .into_iter()
            .map(LedgerApplicationEntry::try_from)
            .collect()
    }

    pub fn post_job(&self, job: &Job) -> Result<(), LedgerError> {
        self.ledger.post_job(LedgerJob::from(job))
    }

    pub fn register_candidate(&self, candidate: &Candidate) -> Result<(), LedgerError> {
        self.ledger
            .register_candidate(LedgerCandidate::from(candidate))
    }

    pub fn register_company(&self, company: &Company) -> Result<(), LedgerError> {
        self.ledger.register_company(LedgerCompany::from(company))
    }

    pub fn submit_application(&self, record: &ApplicationRecord) -> Result<(), LedgerError> {
        debug!(application_id = %record.id, "submitting application to ledger");
        self.ledger.submit_application(LedgerApplication {
            application_id: record.id.to_string(),
            job_id: record.job.job_id.to_string(),
            candidate_id: record.candidate_id.to_string(),
            application_date: record
                .applied_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            status: codec::encode_application_status(record.status),
        })
    }

    pub fn update_application_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), LedgerError> {
        debug!(application_id = %id, status = status.label(), "updating ledger status");
        self.ledger
            .update_application_status(id.as_str(), codec::encode_application_status(status))
    }
}
