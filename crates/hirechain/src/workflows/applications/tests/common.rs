use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::applications::{
    application_router, Actor, ApplicationId, ApplicationRecord, ApplicationService,
    ApplicationStatus, ApplicationStore, InMemoryApplicationStore, JobSnapshot, ProofPolicy,
    ProofUpload, StoreError,
};
use crate::workflows::applications::store::ApplicationQuery;
use crate::workflows::ledger::{InMemoryLedger, LedgerGateway};
use crate::workflows::marketplace::{
    Candidate, CandidateId, Company, CompanyId, Job, JobId, JobStatus, JobType, LocationType,
    SalaryRange,
};

pub(super) type MemoryService = ApplicationService<InMemoryApplicationStore, InMemoryLedger>;

pub(super) const ACME: &str = "acme";
pub(super) const GLOBEX: &str = "globex";
pub(super) const DANA: &str = "dana@example.com";
pub(super) const OMAR: &str = "omar@example.com";

pub(super) fn company(id: &str, name: &str) -> Company {
    Company {
        id: CompanyId::new(id),
        name: name.to_string(),
        image: String::new(),
        contacts: vec![format!("jobs@{id}.test")],
        description: format!("{name} is hiring"),
        misc: Vec::new(),
        company_score: None,
    }
}

pub(super) fn candidate(id: &str, name: &str, skills: &[&str]) -> Candidate {
    Candidate {
        id: CandidateId::new(id),
        name: name.to_string(),
        description: vec!["Engineer".to_string()],
        skills: skills.iter().map(|skill| skill.to_string()).collect(),
        contacts: vec![id.to_string()],
        education: Vec::new(),
        resume_refs: Vec::new(),
        profile_score: Some(4.5),
    }
}

pub(super) fn job(id: &str, company_id: &str, title: &str, skills: &[&str]) -> Job {
    Job {
        id: JobId::new(id),
        company_id: CompanyId::new(company_id),
        title: title.to_string(),
        description: format!("{title} role"),
        requirements: vec!["2+ years".to_string()],
        skills: skills.iter().map(|skill| skill.to_string()).collect(),
        location: LocationType::Remote,
        job_type: JobType::FullTime,
        salary: SalaryRange {
            min: 90_000,
            max: 120_000,
            currency: "USD".to_string(),
        },
        status: JobStatus::Active,
    }
}

/// Two companies, two candidates, three jobs (one inactive).
pub(super) fn seeded_ledger() -> InMemoryLedger {
    let ledger = InMemoryLedger::new();
    let gateway = LedgerGateway::new(ledger.clone());

    gateway
        .register_company(&company(ACME, "Acme Corp"))
        .expect("register acme");
    gateway
        .register_company(&company(GLOBEX, "Globex"))
        .expect("register globex");
    gateway
        .register_candidate(&candidate(DANA, "Dana Dev", &["React", "TypeScript", "Node"]))
        .expect("register dana");
    gateway
        .register_candidate(&candidate(OMAR, "Omar Ops", &["Python"]))
        .expect("register omar");

    gateway
        .post_job(&job(
            "job-1",
            ACME,
            "Frontend Engineer",
            &["React", "TypeScript", "JavaScript"],
        ))
        .expect("post job-1");
    let mut data = job("job-2", GLOBEX, "Data Scientist", &["Python", "TensorFlow"]);
    data.location = LocationType::Onsite;
    gateway.post_job(&data).expect("post job-2");
    let mut closed = job("job-3", ACME, "Legacy Maintainer", &["React"]);
    closed.status = JobStatus::Inactive;
    gateway.post_job(&closed).expect("post job-3");

    ledger
}

pub(super) fn build_service() -> (Arc<MemoryService>, InMemoryApplicationStore, InMemoryLedger) {
    let store = InMemoryApplicationStore::new();
    let ledger = seeded_ledger();
    let service = ApplicationService::new(
        Arc::new(store.clone()),
        Arc::new(LedgerGateway::new(ledger.clone())),
        ProofPolicy::default(),
    );
    (Arc::new(service), store, ledger)
}

pub(super) fn application_router_with_service(service: Arc<MemoryService>) -> axum::Router {
    application_router(service)
}

pub(super) fn dana() -> Actor {
    Actor::candidate(&CandidateId::new(DANA))
}

pub(super) fn omar() -> Actor {
    Actor::candidate(&CandidateId::new(OMAR))
}

pub(super) fn acme() -> Actor {
    Actor::company(&CompanyId::new(ACME))
}

pub(super) fn globex() -> Actor {
    Actor::company(&CompanyId::new(GLOBEX))
}

pub(super) fn pdf_proof() -> ProofUpload {
    ProofUpload {
        name: "offer-letter.pdf".to_string(),
        storage_key: "proofs/offer-letter.pdf".to_string(),
        media_type: "application/pdf".to_string(),
    }
}

pub(super) fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Standalone record for lifecycle and store tests, owned by `acme` and applied for by `dana`.
pub(super) fn record(id: &str, status: ApplicationStatus) -> ApplicationRecord {
    ApplicationRecord {
        id: ApplicationId(id.to_string()),
        job: JobSnapshot {
            job_id: JobId::new(format!("job-{id}")),
            company_id: CompanyId::new(ACME),
            company_name: "Acme Corp".to_string(),
            title: "Frontend Engineer".to_string(),
        },
        candidate_id: CandidateId::new(DANA),
        candidate_name: "Dana Dev".to_string(),
        status,
        applied_at: at(9),
        compatibility_score: Some(67),
        ai_applied: false,
        company_action: None,
        verified_at: None,
    }
}

/// Store whose backend is down.
pub(super) struct UnavailableStore;

impl ApplicationStore for UnavailableStore {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: ApplicationRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _query: &ApplicationQuery) -> Result<Vec<ApplicationRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
