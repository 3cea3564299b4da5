use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::marketplace::{CandidateId, CompanyId, JobId};

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an application sits in the hiring workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    PendingForProof,
    Verified,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Approved,
        ApplicationStatus::PendingForProof,
        ApplicationStatus::Verified,
        ApplicationStatus::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::PendingForProof => "pending_for_proof",
            ApplicationStatus::Verified => "verified",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Verified | ApplicationStatus::Rejected)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Company,
    Candidate,
}

impl ActorRole {
    pub const fn label(self) -> &'static str {
        match self {
            ActorRole::Company => "company",
            ActorRole::Candidate => "candidate",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "company" => Some(ActorRole::Company),
            "candidate" => Some(ActorRole::Candidate),
            _ => None,
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Who is performing an operation. Passed explicitly to every mutating call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub role: ActorRole,
    pub id: String,
}

impl Actor {
    pub fn company(id: &CompanyId) -> Self {
        Self {
            role: ActorRole::Company,
            id: id.to_string(),
        }
    }

    pub fn candidate(id: &CandidateId) -> Self {
        Self {
            role: ActorRole::Candidate,
            id: id.to_string(),
        }
    }
}

/// Job details captured when the application is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub company_id: CompanyId,
    pub company_name: String,
    pub title: String,
}

/// Proof document as submitted by the company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofUpload {
    pub name: String,
    pub storage_key: String,
    pub media_type: String,
}

/// Proof document attached to an application. The content behind `storage_key` is opaque here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofDocument {
    pub name: String,
    pub storage_key: String,
    pub media_type: String,
    pub uploaded_at: DateTime<Utc>,
}

/// The two decisions a company can take on a pending application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyDecision {
    Approved,
    Rejected,
}

/// The company's decision on an application. A later proof upload attaches to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyAction {
    pub status: CompanyDecision,
    pub action_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_document: Option<ProofDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub job: JobSnapshot,
    pub candidate_id: CandidateId,
    pub candidate_name: String,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub compatibility_score: Option<u8>,
    pub ai_applied: bool,
    pub company_action: Option<CompanyAction>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl ApplicationRecord {
    pub fn proof_document(&self) -> Option<&ProofDocument> {
        self.company_action
            .as_ref()
            .and_then(|action| action.proof_document.as_ref())
    }

    /// Whether `actor` is one of the two parties to this application.
    pub fn involves(&self, actor: &Actor) -> bool {
        match actor.role {
            ActorRole::Company => self.job.company_id.as_str() == actor.id,
            ActorRole::Candidate => self.candidate_id.as_str() == actor.id,
        }
    }
}
