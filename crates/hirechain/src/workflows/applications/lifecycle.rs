//! Application status state machine.
//!
//! ```text
//! pending --approve(company)--> approved --upload proof(company)--> pending_for_proof
//!    |                                                                      |
//!    +--reject(company)--> rejected                 verify(candidate)--> verified
//! ```
//!
//! Evaluation is pure. The service owns atomicity per application id.

use std::fmt;

use chrono::{DateTime, Utc};
use mime::Mime;
use serde::{Deserialize, Serialize};

use super::domain::{
    Actor, ActorRole, ApplicationRecord, ApplicationStatus, CompanyAction, CompanyDecision,
    ProofDocument, ProofUpload,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Approve,
    Reject,
    UploadProof,
    Verify,
}

impl TransitionKind {
    pub const fn label(self) -> &'static str {
        match self {
            TransitionKind::Approve => "approve",
            TransitionKind::Reject => "reject",
            TransitionKind::UploadProof => "upload_proof",
            TransitionKind::Verify => "verify",
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Every permitted (from, transition, role) triple and the status it leads to.
pub const TRANSITIONS: [(ApplicationStatus, TransitionKind, ActorRole, ApplicationStatus); 4] = [
    (
        ApplicationStatus::Pending,
        TransitionKind::Approve,
        ActorRole::Company,
        ApplicationStatus::Approved,
    ),
    (
        ApplicationStatus::Pending,
        TransitionKind::Reject,
        ActorRole::Company,
        ApplicationStatus::Rejected,
    ),
    (
        ApplicationStatus::Approved,
        TransitionKind::UploadProof,
        ActorRole::Company,
        ApplicationStatus::PendingForProof,
    ),
    (
        ApplicationStatus::PendingForProof,
        TransitionKind::Verify,
        ActorRole::Candidate,
        ApplicationStatus::Verified,
    ),
];

pub fn next_status(
    from: ApplicationStatus,
    transition: TransitionKind,
    role: ActorRole,
) -> Option<ApplicationStatus> {
    TRANSITIONS
        .iter()
        .find(|(f, t, r, _)| *f == from && *t == transition && *r == role)
        .map(|(_, _, _, to)| *to)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Approve,
    Reject,
    UploadProof(ProofUpload),
    Verify { attestation: String },
}

impl LifecycleEvent {
    pub fn kind(&self) -> TransitionKind {
        match self {
            LifecycleEvent::Approve => TransitionKind::Approve,
            LifecycleEvent::Reject => TransitionKind::Reject,
            LifecycleEvent::UploadProof(_) => TransitionKind::UploadProof,
            LifecycleEvent::Verify { .. } => TransitionKind::Verify,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("cannot {transition} an application that is {from} as a {role}")]
    InvalidTransition {
        from: ApplicationStatus,
        transition: TransitionKind,
        role: ActorRole,
    },
    #[error("{role} `{actor_id}` is not a party to this application")]
    NotParty { role: ActorRole, actor_id: String },
    #[error("proof document rejected: {0}")]
    InvalidProof(String),
    #[error("verification requires a non-empty attestation")]
    MissingAttestation,
}

/// Media types a proof document may carry.
#[derive(Debug, Clone, PartialEq)]
pub struct ProofPolicy {
    accepted: Vec<Mime>,
}

impl Default for ProofPolicy {
    fn default() -> Self {
        Self {
            accepted: vec![mime::APPLICATION_PDF],
        }
    }
}

impl ProofPolicy {
    /// Parses a comma separated list. On failure the offending entry is returned.
    pub fn from_list(raw: &str) -> Result<Self, String> {
        let accepted = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| entry.parse::<Mime>().map_err(|_| entry.to_string()))
            .collect::<Result<Vec<_>, _>>()?;

        if accepted.is_empty() {
            return Err(raw.to_string());
        }
        Ok(Self { accepted })
    }

    pub fn accepted(&self) -> &[Mime] {
        &self.accepted
    }

    /// Parameters such as `charset` are ignored when matching.
    pub fn allows(&self, media_type: &str) -> bool {
        match media_type.trim().parse::<Mime>() {
            Ok(candidate) => self
                .accepted
                .iter()
                .any(|accepted| {
                    accepted
                        .essence_str()
                        .eq_ignore_ascii_case(candidate.essence_str())
                }),
            Err(_) => false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    policy: ProofPolicy,
}

impl Lifecycle {
    pub fn new(policy: ProofPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ProofPolicy {
        &self.policy
    }

    /// Returns the record as it stands after `event`, or why the event is refused.
    ///
    /// Checks run in a fixed order: the transition table, then party membership, then the
    /// event payload.
    pub fn apply(
        &self,
        record: &ApplicationRecord,
        event: LifecycleEvent,
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, LifecycleError> {
        let transition = event.kind();
        let to = next_status(record.status, transition, actor.role).ok_or(
            LifecycleError::InvalidTransition {
                from: record.status,
                transition,
                role: actor.role,
            },
        )?;

        if !record.involves(actor) {
            return Err(LifecycleError::NotParty {
                role: actor.role,
                actor_id: actor.id.clone(),
            });
        }

        let mut next = record.clone();
        next.status = to;

        match event {
            LifecycleEvent::Approve | LifecycleEvent::Reject => {
                let decision = if to == ApplicationStatus::Approved {
                    CompanyDecision::Approved
                } else {
                    CompanyDecision::Rejected
                };
                next.company_action = Some(CompanyAction {
                    status: decision,
                    action_date: at,
                    proof_document: None,
                });
            }
            LifecycleEvent::UploadProof(upload) => {
                let document = self.check_proof(upload, at)?;
                // Records imported from the ledger carry no action; the approval is implied.
                let mut action = next.company_action.take().unwrap_or(CompanyAction {
                    status: CompanyDecision::Approved,
                    action_date: at,
                    proof_document: None,
                });
                action.proof_document = Some(document);
                next.company_action = Some(action);
            }
            LifecycleEvent::Verify { attestation } => {
                if attestation.trim().is_empty() {
                    return Err(LifecycleError::MissingAttestation);
                }
                next.verified_at = Some(at);
            }
        }

        Ok(next)
    }

    fn check_proof(
        &self,
        upload: ProofUpload,
        at: DateTime<Utc>,
    ) -> Result<ProofDocument, LifecycleError> {
        if upload.name.trim().is_empty() {
            return Err(LifecycleError::InvalidProof(
                "document name is empty".to_string(),
            ));
        }
        if upload.storage_key.trim().is_empty() {
            return Err(LifecycleError::InvalidProof(
                "document has no storage reference".to_string(),
            ));
        }
        if !self.policy.allows(&upload.media_type) {
            return Err(LifecycleError::InvalidProof(format!(
                "media type '{}' is not accepted",
                upload.media_type
            )));
        }

        Ok(ProofDocument {
            name: upload.name,
            storage_key: upload.storage_key,
            media_type: upload.media_type,
            uploaded_at: at,
        })
    }
}
