use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::domain::{
    Actor, ActorRole, ApplicationId, ApplicationRecord, ApplicationStatus, JobSnapshot,
    ProofUpload,
};
use super::lifecycle::{Lifecycle, LifecycleError, LifecycleEvent, ProofPolicy};
use super::locks::KeyedLocks;
use super::store::{ApplicationQuery, ApplicationStats, ApplicationStore, StoreError};
use crate::workflows::ledger::{Ledger, LedgerError, LedgerGateway};
use crate::workflows::marketplace::{CandidateId, JobId};
use crate::workflows::matching::{
    compatibility_score, recommend, MatchPreferences, MatchingError, ScoredJob,
};

/// Single authority for application mutation: composes the store, the lifecycle, the scorer
/// and the ledger.
pub struct ApplicationService<S, L> {
    store: Arc<S>,
    ledger: Arc<LedgerGateway<L>>,
    lifecycle: Lifecycle,
    sequence: AtomicU64,
    transitions: KeyedLocks<ApplicationId>,
    submissions: KeyedLocks<(JobId, CandidateId)>,
}

impl<S, L> ApplicationService<S, L>
where
    S: ApplicationStore + 'static,
    L: Ledger + 'static,
{
    pub fn new(store: Arc<S>, ledger: Arc<LedgerGateway<L>>, policy: ProofPolicy) -> Self {
        Self {
            store,
            ledger,
            lifecycle: Lifecycle::new(policy),
            sequence: AtomicU64::new(1),
            transitions: KeyedLocks::new(),
            submissions: KeyedLocks::new(),
        }
    }

    pub fn ledger(&self) -> &LedgerGateway<L> {
        &self.ledger
    }

    fn next_application_id(&self) -> ApplicationId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        ApplicationId(format!("app-{id:06}"))
    }

    /// Submit an application for `job_id` on behalf of the candidate `actor`.
    pub fn submit(
        &self,
        actor: &Actor,
        job_id: &JobId,
        ai_applied: bool,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        require_role(actor, ActorRole::Candidate, "submit")?;
        let candidate_id = CandidateId::new(actor.id.clone());

        self.submissions
            .with_lock(&(job_id.clone(), candidate_id.clone()), || -> Result<_, ApplicationServiceError> {
                let existing = self
                    .store
                    .list(&ApplicationQuery::for_candidate(candidate_id.clone()))?;
                if existing.iter().any(|record| &record.job.job_id == job_id) {
                    return Err(StoreError::DuplicateApplication {
                        job_id: job_id.clone(),
                        candidate_id: candidate_id.clone(),
                    }
                    .into());
                }

                let job = self.ledger.job(job_id)?;
                if !job.is_active() {
                    return Err(ApplicationServiceError::JobClosed(job.id));
                }
                let candidate = self.ledger.candidate(&candidate_id)?;
                let company = self.ledger.company(&job.company_id)?;

                let record = ApplicationRecord {
                    id: self.next_application_id(),
                    job: JobSnapshot {
                        job_id: job.id.clone(),
                        company_id: company.id,
                        company_name: company.name,
                        title: job.title.clone(),
                    },
                    candidate_id: candidate.id,
                    candidate_name: candidate.name,
                    status: ApplicationStatus::Pending,
                    applied_at: Utc::now(),
                    compatibility_score: compatibility_score(&job.skills, &candidate.skills).ok(),
                    ai_applied,
                    company_action: None,
                    verified_at: None,
                };

                self.ledger.submit_application(&record)?;
                let stored = self.store.insert(record)?;
                info!(
                    application_id = %stored.id,
                    job_id = %stored.job.job_id,
                    candidate_id = %stored.candidate_id,
                    ai_applied,
                    "application submitted"
                );
                Ok(stored)
            })
    }

    /// Fetch an application for API responses.
    pub fn get(
        &self,
        application_id: &ApplicationId,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let record = self
            .store
            .fetch(application_id)?
            .ok_or_else(|| StoreError::NotFound(application_id.clone()))?;
        Ok(record)
    }

    pub fn list(
        &self,
        query: &ApplicationQuery,
    ) -> Result<Vec<ApplicationRecord>, ApplicationServiceError> {
        Ok(self.store.list(query)?)
    }

    pub fn stats(
        &self,
        query: &ApplicationQuery,
    ) -> Result<ApplicationStats, ApplicationServiceError> {
        Ok(self.store.stats(query)?)
    }

    pub fn approve(
        &self,
        application_id: &ApplicationId,
        actor: &Actor,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        self.transition(application_id, actor, LifecycleEvent::Approve)
    }

    pub fn reject(
        &self,
        application_id: &ApplicationId,
        actor: &Actor,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        self.transition(application_id, actor, LifecycleEvent::Reject)
    }

    pub fn upload_proof(
        &self,
        application_id: &ApplicationId,
        actor: &Actor,
        proof: ProofUpload,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        self.transition(application_id, actor, LifecycleEvent::UploadProof(proof))
    }

    pub fn verify(
        &self,
        application_id: &ApplicationId,
        actor: &Actor,
        attestation: String,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        self.transition(
            application_id,
            actor,
            LifecycleEvent::Verify { attestation },
        )
    }

    /// Fetch, evaluate, mirror to the ledger, and persist, all under the application's lock.
    /// The store only changes once the ledger accepted the new status.
    pub fn transition(
        &self,
        application_id: &ApplicationId,
        actor: &Actor,
        event: LifecycleEvent,
    ) -> Result<ApplicationRecord, ApplicationServiceError> {
        let transition = event.kind();
        self.transitions.with_lock(application_id, || -> Result<_, ApplicationServiceError> {
            let record = self.get(application_id)?;
            let next = self
                .lifecycle
                .apply(&record, event, actor, Utc::now())
                .inspect_err(|error| {
                    debug!(%application_id, %transition, %error, "transition refused");
                })?;

            self.ledger
                .update_application_status(&next.id, next.status)
                .inspect_err(|error| {
                    warn!(%application_id, %error, "ledger rejected status update");
                })?;
            self.store.update(next.clone())?;

            info!(
                %application_id,
                from = record.status.label(),
                to = next.status.label(),
                actor = %actor.role,
                "application transitioned"
            );
            Ok(next)
        })
    }

    /// Active jobs the candidate has not applied to, scored and filtered by `preferences`.
    pub fn recommendations(
        &self,
        candidate_id: &CandidateId,
        preferences: &MatchPreferences,
    ) -> Result<Vec<ScoredJob>, ApplicationServiceError> {
        let candidate = self.ledger.candidate(candidate_id)?;
        let jobs = self.ledger.jobs()?;
        let applied: HashSet<JobId> = self
            .store
            .list(&ApplicationQuery::for_candidate(candidate_id.clone()))?
            .into_iter()
            .map(|record| record.job.job_id)
            .collect();

        Ok(recommend(&jobs, &candidate, &applied, preferences))
    }

    /// Applies on the candidate's behalf to the best recommendations, at most `limit` of them.
    pub fn auto_apply(
        &self,
        actor: &Actor,
        preferences: &MatchPreferences,
        limit: usize,
    ) -> Result<Vec<ApplicationRecord>, ApplicationServiceError> {
        require_role(actor, ActorRole::Candidate, "auto-apply")?;
        let candidate_id = CandidateId::new(actor.id.clone());

        let picks = self.recommendations(&candidate_id, preferences)?;
        let mut submitted = Vec::new();
        for scored in picks.into_iter().take(limit) {
            match self.submit(actor, &scored.job.id, true) {
                Ok(record) => submitted.push(record),
                Err(ApplicationServiceError::Store(StoreError::DuplicateApplication { .. })) => {
                    debug!(job_id = %scored.job.id, "skipping job applied to concurrently");
                }
                Err(other) => return Err(other),
            }
        }

        info!(
            candidate_id = %candidate_id,
            count = submitted.len(),
            "agent applied on candidate's behalf"
        );
        Ok(submitted)
    }

    /// Imports ledger applications the store has not seen yet. Returns how many were added.
    pub fn sync_from_ledger(&self) -> Result<usize, ApplicationServiceError> {
        let mut imported = 0;
        for entry in self.ledger.applications()? {
            self.bump_sequence_past(&entry.application_id);
            if self.store.fetch(&entry.application_id)?.is_some() {
                continue;
            }

            let job = self.ledger.job(&entry.job_id)?;
            let company = self.ledger.company(&job.company_id)?;
            let candidate = self.ledger.candidate(&entry.candidate_id)?;

            let record = ApplicationRecord {
                id: entry.application_id,
                job: JobSnapshot {
                    job_id: job.id.clone(),
                    company_id: company.id,
                    company_name: company.name,
                    title: job.title.clone(),
                },
                candidate_id: candidate.id,
                candidate_name: candidate.name,
                status: entry.status,
                applied_at: entry.applied_at,
                compatibility_score: compatibility_score(&job.skills, &candidate.skills).ok(),
                ai_applied: false,
                company_action: None,
                verified_at: None,
            };

            match self.store.insert(record) {
                Ok(_) => imported += 1,
                Err(StoreError::DuplicateApplication {
                    job_id,
                    candidate_id,
                }) => {
                    warn!(%job_id, %candidate_id, "ledger holds a second application for the same pair");
                }
                Err(other) => return Err(other.into()),
            }
        }

        if imported > 0 {
            info!(imported, "applications imported from ledger");
        }
        Ok(imported)
    }

    fn bump_sequence_past(&self, id: &ApplicationId) {
        if let Some(number) = id
            .as_str()
            .strip_prefix("app-")
            .and_then(|digits| digits.parse::<u64>().ok())
        {
            self.sequence.fetch_max(number + 1, Ordering::Relaxed);
        }
    }
}

fn require_role(
    actor: &Actor,
    required: ActorRole,
    action: &'static str,
) -> Result<(), ApplicationServiceError> {
    if actor.role == required {
        Ok(())
    } else {
        Err(ApplicationServiceError::RoleRequired { action, required })
    }
}

/// Error raised by the application service.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Matching(#[from] MatchingError),
    #[error("only a {required} may {action}")]
    RoleRequired {
        action: &'static str,
        required: ActorRole,
    },
    #[error("job `{0}` is not accepting applications")]
    JobClosed(JobId),
}
