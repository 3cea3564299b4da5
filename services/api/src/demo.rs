use crate::infra::{
    parse_threshold, proof_upload_from_path, seed_demo_marketplace, DEMO_AGENT_CANDIDATE,
    DEMO_CANDIDATE, DEMO_COMPANY,
};
use clap::Args;
use hirechain::config::AppConfig;
use hirechain::error::AppError;
use hirechain::telemetry;
use hirechain::workflows::applications::{
    Actor, ApplicationQuery, ApplicationRecord, ApplicationService, ApplicationStats,
    InMemoryApplicationStore, ProofUpload,
};
use hirechain::workflows::ledger::{InMemoryLedger, LedgerGateway};
use hirechain::workflows::marketplace::{CandidateId, CompanyId, JobId, LocationType};
use hirechain::workflows::matching::{compatibility_score, MatchPreferences};
use hirechain::workflows::search::{
    HttpSearchTransport, JobSearchStream, RunOutcome, SearchError, SearchEvent, SearchRequest,
    SearchSession,
};
use std::path::PathBuf;
use std::sync::Arc;

type DemoService = ApplicationService<InMemoryApplicationStore, InMemoryLedger>;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Offer letter to attach as proof. A placeholder PDF reference is used when omitted.
    #[arg(long)]
    pub(crate) proof: Option<PathBuf>,
    /// Reject the application instead of walking it through to verification.
    #[arg(long)]
    pub(crate) reject: bool,
    /// Skip the AI agent portion of the demo.
    #[arg(long)]
    pub(crate) skip_agent: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Skill the job lists (repeatable)
    #[arg(long = "job-skill", required = true)]
    pub(crate) job_skills: Vec<String>,
    /// Skill the candidate lists (repeatable)
    #[arg(long = "candidate-skill")]
    pub(crate) candidate_skills: Vec<String>,
}

#[derive(Args, Debug)]
pub(crate) struct SearchArgs {
    /// Candidate to search on behalf of
    #[arg(long)]
    pub(crate) candidate_id: String,
    /// Minimum match threshold between 0 and 1. Defaults to the configured value.
    #[arg(long, value_parser = parse_threshold)]
    pub(crate) threshold: Option<f32>,
    /// Override the configured job search service URL
    #[arg(long)]
    pub(crate) base_url: Option<String>,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    match compatibility_score(&args.job_skills, &args.candidate_skills) {
        Ok(score) => println!("Compatibility score: {score}/100"),
        Err(err) => println!("Compatibility unavailable: {err}"),
    }
    Ok(())
}

pub(crate) async fn run_search(args: SearchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let base_url = args.base_url.unwrap_or(config.search.base_url);
    let threshold = args.threshold.unwrap_or(config.search.default_threshold);
    let request = SearchRequest::new(args.candidate_id, threshold)?;

    let transport = HttpSearchTransport::new(&base_url)?;
    let session = SearchSession::new(JobSearchStream::new(
        transport,
        config.search.completion_grace,
    ));

    println!(
        "Searching jobs for {} (threshold {:.2}) via {}",
        request.candidate_id(),
        request.threshold(),
        base_url
    );
    let cancel = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    let run = session.start_until(&request, print_event, cancel).await?;

    match run.outcome {
        RunOutcome::Completed { matched_count } => {
            match matched_count {
                Some(count) => println!("Search finished with {count} matching jobs"),
                None => println!("Search finished"),
            }
            Ok(())
        }
        RunOutcome::Cancelled => {
            println!("Search cancelled after {} events", run.log.len());
            Ok(())
        }
        RunOutcome::Failed { message } => Err(AppError::Search(SearchError::Stream(message))),
    }
}

fn print_event(event: &SearchEvent) {
    match event.matched_count {
        Some(count) => println!("  [{:?}] {} ({count} matched)", event.step, event.message),
        None => println!("  [{:?}] {}", event.step, event.message),
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let gateway = LedgerGateway::new(InMemoryLedger::new());
    if let Err(err) = seed_demo_marketplace(&gateway) {
        println!("Demo marketplace unavailable: {err}");
        return Ok(());
    }
    let service = Arc::new(ApplicationService::new(
        Arc::new(InMemoryApplicationStore::new()),
        Arc::new(gateway),
        AppConfig::load()
            .map(|config| config.proof)
            .unwrap_or_default(),
    ));

    println!("HireChain demo");
    println!("==============");
    run_lifecycle_demo(&service, &args)?;
    if !args.skip_agent {
        run_agent_demo(&service)?;
    }

    let stats = service.stats(&ApplicationQuery::for_company(CompanyId::new(DEMO_COMPANY)))?;
    println!();
    render_stats("Northwind Labs pipeline", &stats);
    Ok(())
}

fn run_lifecycle_demo(service: &DemoService, args: &DemoArgs) -> Result<(), AppError> {
    let candidate = Actor::candidate(&CandidateId::new(DEMO_CANDIDATE));
    let company = Actor::company(&CompanyId::new(DEMO_COMPANY));

    println!("\nApplication lifecycle");
    let record = service.submit(&candidate, &JobId::new("job-platform"), false)?;
    render_record("Submitted", &record);

    let closed = service.submit(&candidate, &JobId::new("job-archived"), false);
    if let Err(err) = closed {
        println!("- Closed job refused: {err}");
    }

    if args.reject {
        let rejected = service.reject(&record.id, &company)?;
        render_record("Rejected", &rejected);
        if let Err(err) = service.approve(&rejected.id, &company) {
            println!("- Reopening refused: {err}");
        }
        return Ok(());
    }

    let approved = service.approve(&record.id, &company)?;
    render_record("Approved", &approved);

    let proof = match &args.proof {
        Some(path) => proof_upload_from_path(path),
        None => ProofUpload {
            name: "offer-letter.pdf".to_string(),
            storage_key: "proofs/demo/offer-letter.pdf".to_string(),
            media_type: "application/pdf".to_string(),
        },
    };
    let with_proof = match service.upload_proof(&approved.id, &company, proof) {
        Ok(record) => record,
        Err(err) => {
            println!("- Proof refused: {err}");
            return Ok(());
        }
    };
    render_record("Proof uploaded", &with_proof);

    let verified = service.verify(
        &with_proof.id,
        &candidate,
        format!("signed:{DEMO_CANDIDATE}"),
    )?;
    render_record("Verified", &verified);

    match serde_json::to_string_pretty(&verified) {
        Ok(json) => println!("  Final record:\n{json}"),
        Err(err) => println!("  Final record unavailable: {err}"),
    }
    Ok(())
}

fn run_agent_demo(service: &DemoService) -> Result<(), AppError> {
    let candidate_id = CandidateId::new(DEMO_AGENT_CANDIDATE);
    let preferences = MatchPreferences {
        minimum_score: 50,
        locations: vec![LocationType::Remote, LocationType::Hybrid],
        ..MatchPreferences::default()
    };

    println!("\nAI agent for {candidate_id}");
    let picks = service.recommendations(&candidate_id, &preferences)?;
    if picks.is_empty() {
        println!("- No jobs clear the {}% bar", preferences.minimum_score);
    }
    for scored in &picks {
        println!(
            "- Recommended {} ({}) score {}",
            scored.job.title, scored.job.id, scored.score
        );
    }

    let applied = service.auto_apply(&Actor::candidate(&candidate_id), &preferences, 3)?;
    for record in &applied {
        render_record("Agent applied", record);
    }
    Ok(())
}

fn render_record(label: &str, record: &ApplicationRecord) {
    let score = record
        .compatibility_score
        .map(|score| score.to_string())
        .unwrap_or_else(|| "n/a".to_string());
    println!(
        "- {label}: {} for {} at {} -> {} (score {score}{})",
        record.id,
        record.job.title,
        record.job.company_name,
        record.status,
        if record.ai_applied { ", via agent" } else { "" }
    );
}

fn render_stats(title: &str, stats: &ApplicationStats) {
    println!("{title}");
    println!("  Total: {}", stats.total);
    println!("  Pending: {}", stats.pending);
    println!("  Approved: {}", stats.approved);
    println!("  Awaiting verification: {}", stats.pending_for_proof);
    println!("  Verified: {}", stats.verified);
    println!("  Rejected: {}", stats.rejected);
}
