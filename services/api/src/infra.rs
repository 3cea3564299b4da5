use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use hirechain::config::AppEnvironment;
use hirechain::workflows::applications::ProofUpload;
use hirechain::workflows::ledger::{InMemoryLedger, LedgerError, LedgerGateway};
use hirechain::workflows::marketplace::{
    Candidate, CandidateId, Company, CompanyId, Job, JobId, JobStatus, JobType, LocationType,
    SalaryRange,
};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) const DEMO_COMPANY: &str = "northwind";
pub(crate) const DEMO_CANDIDATE: &str = "ada@example.com";
pub(crate) const DEMO_AGENT_CANDIDATE: &str = "grace@example.com";

fn company(id: &str, name: &str, description: &str) -> Company {
    Company {
        id: CompanyId::new(id),
        name: name.to_string(),
        image: format!("https://assets.example.com/{id}.png"),
        contacts: vec![format!("talent@{id}.example.com")],
        description: description.to_string(),
        misc: Vec::new(),
        company_score: Some(4.4),
    }
}

fn candidate(id: &str, name: &str, skills: &[&str]) -> Candidate {
    Candidate {
        id: CandidateId::new(id),
        name: name.to_string(),
        description: vec![format!("{name} builds reliable systems")],
        skills: skills.iter().map(|skill| skill.to_string()).collect(),
        contacts: vec![id.to_string()],
        education: vec!["BSc Computer Science".to_string()],
        resume_refs: vec![format!("resumes/{id}.pdf")],
        profile_score: None,
    }
}

fn job(id: &str, company_id: &str, title: &str, skills: &[&str], salary: (u64, u64)) -> Job {
    Job {
        id: JobId::new(id),
        company_id: CompanyId::new(company_id),
        title: title.to_string(),
        description: format!("{title} on a small product team"),
        requirements: vec!["Production experience".to_string()],
        skills: skills.iter().map(|skill| skill.to_string()).collect(),
        location: LocationType::Remote,
        job_type: JobType::FullTime,
        salary: SalaryRange {
            min: salary.0,
            max: salary.1,
            currency: "USD".to_string(),
        },
        status: JobStatus::Active,
    }
}

/// Only non-production servers start with the demo marketplace.
pub(crate) fn seeds_demo_marketplace(environment: AppEnvironment) -> bool {
    matches!(
        environment,
        AppEnvironment::Development | AppEnvironment::Test
    )
}

/// Registers a small marketplace so the dev server and the demo have something to work with.
pub(crate) fn seed_demo_marketplace(ledger: &LedgerGateway<InMemoryLedger>) -> Result<(), LedgerError> {
    ledger.register_company(&company(
        DEMO_COMPANY,
        "Northwind Labs",
        "Logistics software for regional carriers",
    ))?;
    ledger.register_company(&company(
        "contoso",
        "Contoso Analytics",
        "Forecasting for retail",
    ))?;

    ledger.register_candidate(&candidate(
        DEMO_CANDIDATE,
        "Ada Byron",
        &["Rust", "PostgreSQL", "Kubernetes", "gRPC"],
    ))?;
    ledger.register_candidate(&candidate(
        DEMO_AGENT_CANDIDATE,
        "Grace Hopper",
        &["Python", "SQL", "Airflow", "Spark"],
    ))?;

    ledger.post_job(&job(
        "job-platform",
        DEMO_COMPANY,
        "Platform Engineer",
        &["Rust", "Kubernetes", "Terraform"],
        (140_000, 175_000),
    ))?;

    let mut data = job(
        "job-data",
        "contoso",
        "Data Engineer",
        &["Python", "SQL", "Spark"],
        (120_000, 150_000),
    );
    data.location = LocationType::Hybrid;
    ledger.post_job(&data)?;

    let mut intern = job(
        "job-analytics-intern",
        "contoso",
        "Analytics Intern",
        &["SQL", "Excel"],
        (30_000, 40_000),
    );
    intern.location = LocationType::Onsite;
    intern.job_type = JobType::Internship;
    ledger.post_job(&intern)?;

    let mut archived = job(
        "job-archived",
        DEMO_COMPANY,
        "Firmware Engineer",
        &["C", "RTOS"],
        (90_000, 110_000),
    );
    archived.job_type = JobType::Contract;
    archived.status = JobStatus::Inactive;
    ledger.post_job(&archived)?;

    Ok(())
}

/// Builds a proof upload for `path`, guessing the media type from its extension.
pub(crate) fn proof_upload_from_path(path: &Path) -> ProofUpload {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let media_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    ProofUpload {
        name,
        storage_key: format!("proofs/{}", path.display()),
        media_type,
    }
}

pub(crate) fn parse_threshold(raw: &str) -> Result<f32, String> {
    let value = raw
        .trim()
        .parse::<f32>()
        .map_err(|err| format!("failed to parse '{raw}' as a number ({err})"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("threshold {value} must be between 0 and 1"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn proof_media_type_is_guessed_from_extension() {
        let pdf = proof_upload_from_path(&PathBuf::from("offers/ada-offer.pdf"));
        assert_eq!(pdf.name, "ada-offer.pdf");
        assert_eq!(pdf.media_type, "application/pdf");

        let unknown = proof_upload_from_path(&PathBuf::from("offer.zzqx"));
        assert_eq!(unknown.media_type, "application/octet-stream");
    }

    #[test]
    fn threshold_parser_enforces_unit_interval() {
        assert_eq!(parse_threshold("0.7"), Ok(0.7));
        assert!(parse_threshold("1.5").is_err());
        assert!(parse_threshold("high").is_err());
    }

    #[test]
    fn production_starts_without_demo_data() {
        assert!(seeds_demo_marketplace(AppEnvironment::Development));
        assert!(seeds_demo_marketplace(AppEnvironment::Test));
        assert!(!seeds_demo_marketplace(AppEnvironment::Production));
    }

    #[test]
    fn demo_marketplace_decodes_through_the_gateway() {
        let gateway = LedgerGateway::new(InMemoryLedger::new());
        seed_demo_marketplace(&gateway).expect("seed succeeds");

        let jobs = gateway.jobs().expect("jobs decode");
        assert_eq!(jobs.len(), 4);
        assert!(gateway.candidate(&CandidateId::new(DEMO_CANDIDATE)).is_ok());
    }
}
