use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::records::{LedgerApplication, LedgerCandidate, LedgerCompany, LedgerJob};
use super::{Ledger, LedgerError};

#[derive(Default)]
struct Tables {
    jobs: BTreeMap<String, LedgerJob>,
    candidates: BTreeMap<String, LedgerCandidate>,
    companies: BTreeMap<String, LedgerCompany>,
    applications: BTreeMap<String, LedgerApplication>,
}

/// Process-local stand-in for the marketplace contract, used by the demo, the dev server, and
/// tests. It enforces the same uniqueness rules the contract does.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    tables: Arc<Mutex<Tables>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the chain RPC being unreachable; every call fails while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Release);
    }

    fn tables(&self) -> Result<std::sync::MutexGuard<'_, Tables>, LedgerError> {
        if self.offline.load(Ordering::Acquire) {
            return Err(LedgerError::UpstreamUnavailable(
                "ledger rpc offline".to_string(),
            ));
        }
        Ok(self.tables.lock().expect("ledger mutex poisoned"))
    }

    pub fn application(&self, application_id: &str) -> Option<LedgerApplication> {
        self.tables
            .lock()
            .expect("ledger mutex poisoned")
            .applications
            .get(application_id)
            .cloned()
    }
}

fn insert_unique<T>(
    table: &mut BTreeMap<String, T>,
    kind: &'static str,
    id: String,
    value: T,
) -> Result<(), LedgerError> {
    if table.contains_key(&id) {
        return Err(LedgerError::AlreadyExists { kind, id });
    }
    table.insert(id, value);
    Ok(())
}

impl Ledger for InMemoryLedger {
    fn get_job(&self, job_id: &str) -> Result<Option<LedgerJob>, LedgerError> {
        Ok(self.tables()?.jobs.get(job_id).cloned())
    }

    fn get_candidate(&self, candidate_id: &str) -> Result<Option<LedgerCandidate>, LedgerError> {
        Ok(self.tables()?.candidates.get(candidate_id).cloned())
    }

    fn get_company(&self, company_id: &str) -> Result<Option<LedgerCompany>, LedgerError> {
        Ok(self.tables()?.companies.get(company_id).cloned())
    }

    fn get_all_jobs(&self) -> Result<Vec<LedgerJob>, LedgerError> {
        Ok(self.tables()?.jobs.values().cloned().collect())
    }

    fn get_all_applications(&self) -> Result<Vec<LedgerApplication>, LedgerError> {
        Ok(self.tables()?.applications.values().cloned().collect())
    }

    fn post_job(&self, job: LedgerJob) -> Result<(), LedgerError> {
        let mut tables = self.tables()?;
        if !tables.companies.contains_key(&job.company_id) {
            return Err(LedgerError::NotFound {
                kind: "company",
                id: job.company_id,
            });
        }
        insert_unique(&mut tables.jobs, "job", job.job_id.clone(), job)
    }

    fn register_candidate(&self, candidate: LedgerCandidate) -> Result<(), LedgerError> {
        let mut tables = self.tables()?;
        insert_unique(
            &mut tables.candidates,
            "candidate",
            candidate.candidate_id.clone(),
            candidate,
        )
    }

    fn register_company(&self, company: LedgerCompany) -> Result<(), LedgerError> {
        let mut tables = self.tables()?;
        insert_unique(
            &mut tables.companies,
            "company",
            company.company_id.clone(),
            company,
        )
    }

    fn submit_application(&self, application: LedgerApplication) -> Result<(), LedgerError> {
        let mut tables = self.tables()?;
        if !tables.jobs.contains_key(&application.job_id) {
            return Err(LedgerError::NotFound {
                kind: "job",
                id: application.job_id,
            });
        }
        insert_unique(
            &mut tables.applications,
            "application",
            application.application_id.clone(),
            application,
        )
    }

    fn update_application_status(
        &self,
        application_id: &str,
        status: u8,
    ) -> Result<(), LedgerError> {
        let mut tables = self.tables()?;
        match tables.applications.get_mut(application_id) {
            Some(application) => {
                application.status = status;
                Ok(())
            }
            None => Err(LedgerError::NotFound {
                kind: "application",
                id: application_id.to_string(),
            }),
        }
    }
}
