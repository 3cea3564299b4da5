use serde::{Deserialize, Serialize};

/// Job tuple as stored by the marketplace contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerJob {
    pub job_id: String,
    pub company_id: String,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub skills: Vec<String>,
    pub location: u8,
    pub salary_range: Vec<String>,
    pub job_type: u8,
    pub status: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerCandidate {
    pub candidate_id: String,
    pub name: String,
    pub description: Vec<String>,
    pub contacts: Vec<String>,
    pub education: Vec<String>,
    pub skills: Vec<String>,
    pub resume_path: Vec<String>,
    pub profile_score: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerCompany {
    pub company_id: String,
    pub image: String,
    pub name: String,
    pub contacts: Vec<String>,
    pub description: String,
    pub misc: Vec<String>,
    pub company_score: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerApplication {
    pub application_id: String,
    pub job_id: String,
    pub candidate_id: String,
    pub application_date: String,
    pub status: u8,
}
