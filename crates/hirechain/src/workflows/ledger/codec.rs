//! Bidirectional mapping between ledger enum indices / string arrays and the typed model.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::records::{LedgerApplication, LedgerCandidate, LedgerCompany, LedgerJob};
use super::LedgerError;
use crate::workflows::applications::{ApplicationId, ApplicationStatus};
use crate::workflows::marketplace::{
    Candidate, CandidateId, Company, CompanyId, Job, JobId, JobStatus, JobType, LocationType,
    SalaryRange,
};

pub const LOCATION_CODES: [(u8, LocationType); 3] = [
    (0, LocationType::Remote),
    (1, LocationType::Onsite),
    (2, LocationType::Hybrid),
];

pub const JOB_TYPE_CODES: [(u8, JobType); 5] = [
    (0, JobType::FullTime),
    (1, JobType::PartTime),
    (2, JobType::Contract),
    (3, JobType::Internship),
    (4, JobType::Freelance),
];

pub const JOB_STATUS_CODES: [(u8, JobStatus); 2] = [(0, JobStatus::Active), (1, JobStatus::Inactive)];

/// Canonical encoding of each lifecycle status.
///
/// The deployed contract's status enum stops at `3` (rejected). Codes `4` (pending_for_proof) and
/// `5` (verified) extend it, so the proof and verification transitions need a contract revision
/// that adds those two variants; against an older deployment their status updates revert.
pub const APPLICATION_STATUS_CODES: [(u8, ApplicationStatus); 5] = [
    (0, ApplicationStatus::Pending),
    (2, ApplicationStatus::Approved),
    (3, ApplicationStatus::Rejected),
    (4, ApplicationStatus::PendingForProof),
    (5, ApplicationStatus::Verified),
];

/// Older contract deployments wrote `1` ("reviewed") before any company decision.
const LEGACY_REVIEWED_CODE: u8 = 1;

const DEFAULT_CURRENCY: &str = "USD";

pub fn decode_index<T: Copy>(
    table: &[(u8, T)],
    field: &'static str,
    code: u8,
) -> Result<T, LedgerError> {
    table
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|(_, value)| *value)
        .ok_or_else(|| LedgerError::decode(field, format!("unknown index {code}")))
}

pub fn encode_index<T: Copy + PartialEq>(table: &[(u8, T)], value: T) -> u8 {
    table
        .iter()
        .find(|(_, candidate)| *candidate == value)
        .map(|(code, _)| *code)
        .unwrap_or_else(|| unreachable!("every variant has a ledger index"))
}

pub fn decode_application_status(code: u8) -> Result<ApplicationStatus, LedgerError> {
    if code == LEGACY_REVIEWED_CODE {
        return Ok(ApplicationStatus::Pending);
    }
    decode_index(&APPLICATION_STATUS_CODES, "status", code)
}

pub fn encode_application_status(status: ApplicationStatus) -> u8 {
    encode_index(&APPLICATION_STATUS_CODES, status)
}

fn required(field: &'static str, value: String) -> Result<String, LedgerError> {
    if value.trim().is_empty() {
        Err(LedgerError::decode(field, "must not be empty"))
    } else {
        Ok(value)
    }
}

fn optional_score(field: &'static str, raw: &str) -> Result<Option<f32>, LedgerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
        .map(Some)
        .ok_or_else(|| LedgerError::decode(field, format!("'{raw}' is not numeric")))
}

fn dedup_skills(skills: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    skills
        .into_iter()
        .map(|skill| skill.trim().to_string())
        .filter(|skill| !skill.is_empty())
        .filter(|skill| seen.insert(skill.to_lowercase()))
        .collect()
}

pub fn decode_salary(range: &[String]) -> Result<SalaryRange, LedgerError> {
    let parse = |raw: &String| {
        raw.trim()
            .parse::<u64>()
            .map_err(|_| LedgerError::decode("salaryRange", format!("'{raw}' is not a whole amount")))
    };

    let (min, max, currency) = match range {
        [min, max] => (parse(min)?, parse(max)?, DEFAULT_CURRENCY.to_string()),
        [min, max, currency] if !currency.trim().is_empty() => {
            (parse(min)?, parse(max)?, currency.trim().to_ascii_uppercase())
        }
        _ => {
            return Err(LedgerError::decode(
                "salaryRange",
                format!("expected [min, max] or [min, max, currency], found {} values", range.len()),
            ))
        }
    };

    if min > max {
        return Err(LedgerError::decode(
            "salaryRange",
            format!("minimum {min} exceeds maximum {max}"),
        ));
    }

    Ok(SalaryRange { min, max, currency })
}

pub fn encode_salary(salary: &SalaryRange) -> Vec<String> {
    vec![
        salary.min.to_string(),
        salary.max.to_string(),
        salary.currency.clone(),
    ]
}

impl TryFrom<LedgerJob> for Job {
    type Error = LedgerError;

    fn try_from(raw: LedgerJob) -> Result<Self, Self::Error> {
        Ok(Job {
            id: JobId(required("jobId", raw.job_id)?),
            company_id: CompanyId(required("companyId", raw.company_id)?),
            title: required("title", raw.title)?,
            description: raw.description,
            requirements: raw.requirements,
            skills: raw
                .skills
                .into_iter()
                .map(|skill| skill.trim().to_string())
                .filter(|skill| !skill.is_empty())
                .collect(),
            location: decode_index(&LOCATION_CODES, "location", raw.location)?,
            job_type: decode_index(&JOB_TYPE_CODES, "jobType", raw.job_type)?,
            salary: decode_salary(&raw.salary_range)?,
            status: decode_index(&JOB_STATUS_CODES, "status", raw.status)?,
        })
    }
}

impl From<&Job> for LedgerJob {
    fn from(job: &Job) -> Self {
        LedgerJob {
            job_id: job.id.0.clone(),
            company_id: job.company_id.0.clone(),
            title: job.title.clone(),
            description: job.description.clone(),
            requirements: job.requirements.clone(),
            skills: job.skills.clone(),
            location: encode_index(&LOCATION_CODES, job.location),
            salary_range: encode_salary(&job.salary),
            job_type: encode_index(&JOB_TYPE_CODES, job.job_type),
            status: encode_index(&JOB_STATUS_CODES, job.status),
        }
    }
}

impl TryFrom<LedgerCandidate> for Candidate {
    type Error = LedgerError;

    fn try_from(raw: LedgerCandidate) -> Result<Self, Self::Error> {
        Ok(Candidate {
            id: CandidateId(required("candidateId", raw.candidate_id)?),
            name: required("name", raw.name)?,
            description: raw.description,
            skills: dedup_skills(raw.skills),
            contacts: raw.contacts,
            education: raw.education,
            resume_refs: raw.resume_path,
            profile_score: optional_score("profileScore", &raw.profile_score)?,
        })
    }
}

impl From<&Candidate> for LedgerCandidate {
    fn from(candidate: &Candidate) -> Self {
        LedgerCandidate {
            candidate_id: candidate.id.0.clone(),
            name: candidate.name.clone(),
            description: candidate.description.clone(),
            contacts: candidate.contacts.clone(),
            education: candidate.education.clone(),
            skills: candidate.skills.clone(),
            resume_path: candidate.resume_refs.clone(),
            profile_score: candidate
                .profile_score
                .map(|score| score.to_string())
                .unwrap_or_default(),
        }
    }
}

impl TryFrom<LedgerCompany> for Company {
    type Error = LedgerError;

    fn try_from(raw: LedgerCompany) -> Result<Self, Self::Error> {
        Ok(Company {
            id: CompanyId(required("companyId", raw.company_id)?),
            name: required("name", raw.name)?,
            image: raw.image,
            contacts: raw.contacts,
            description: raw.description,
            misc: raw.misc,
            company_score: optional_score("companyScore", &raw.company_score)?,
        })
    }
}

impl From<&Company> for LedgerCompany {
    fn from(company: &Company) -> Self {
        LedgerCompany {
            company_id: company.id.0.clone(),
            image: company.image.clone(),
            name: company.name.clone(),
            contacts: company.contacts.clone(),
            description: company.description.clone(),
            misc: company.misc.clone(),
            company_score: company
                .company_score
                .map(|score| score.to_string())
                .unwrap_or_default(),
        }
    }
}

/// Typed view of an application entry on the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerApplicationEntry {
    pub application_id: ApplicationId,
    pub job_id: JobId,
    pub candidate_id: CandidateId,
    pub applied_at: DateTime<Utc>,
    pub status: ApplicationStatus,
}

impl TryFrom<LedgerApplication> for LedgerApplicationEntry {
    type Error = LedgerError;

    fn try_from(raw: LedgerApplication) -> Result<Self, Self::Error> {
        let applied_at = DateTime::parse_from_rfc3339(raw.application_date.trim())
            .map_err(|err| LedgerError::decode("applicationDate", err.to_string()))?
            .with_timezone(&Utc);

        Ok(LedgerApplicationEntry {
            application_id: ApplicationId(required("applicationId", raw.application_id)?),
            job_id: JobId(required("jobId", raw.job_id)?),
            candidate_id: CandidateId(required("candidateId", raw.candidate_id)?),
            applied_at,
            status: decode_application_status(raw.status)?,
        })
    }
}
