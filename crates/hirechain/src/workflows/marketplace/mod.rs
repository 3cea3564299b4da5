//! Read-only marketplace model: candidates, companies, and posted jobs.
//!
//! These records are created on the ledger by registration and job posting flows. The core only
//! reads them, after `workflows::ledger` has decoded and validated the ledger representation.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

identifier!(
    /// Ledger identifier of a candidate (a candidate's e-mail address).
    CandidateId
);
identifier!(
    /// Ledger identifier of a hiring company.
    CompanyId
);
identifier!(
    /// Ledger identifier of a job posting.
    JobId
);

/// Registered candidate profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub description: Vec<String>,
    pub skills: Vec<String>,
    pub contacts: Vec<String>,
    pub education: Vec<String>,
    pub resume_refs: Vec<String>,
    pub profile_score: Option<f32>,
}

/// Registered hiring company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub image: String,
    pub contacts: Vec<String>,
    pub description: String,
    pub misc: Vec<String>,
    pub company_score: Option<f32>,
}

/// Posted job. Only `status` may change after posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub company_id: CompanyId,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub skills: Vec<String>,
    pub location: LocationType,
    pub job_type: JobType,
    pub salary: SalaryRange,
    pub status: JobStatus,
}

impl Job {
    pub fn is_active(&self) -> bool {
        self.status == JobStatus::Active
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: u64,
    pub max: u64,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Remote,
    Onsite,
    Hybrid,
}

impl LocationType {
    pub const fn label(self) -> &'static str {
        match self {
            LocationType::Remote => "remote",
            LocationType::Onsite => "onsite",
            LocationType::Hybrid => "hybrid",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "remote" => Some(LocationType::Remote),
            "onsite" | "on-site" => Some(LocationType::Onsite),
            "hybrid" => Some(LocationType::Hybrid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Freelance,
}

impl JobType {
    pub const fn label(self) -> &'static str {
        match self {
            JobType::FullTime => "full-time",
            JobType::PartTime => "part-time",
            JobType::Contract => "contract",
            JobType::Internship => "internship",
            JobType::Freelance => "freelance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Active,
    Inactive,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Inactive => "inactive",
        }
    }
}
