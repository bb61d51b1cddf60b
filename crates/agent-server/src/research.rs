//! Job Search and Due Diligence Handlers

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use agent_core::{Delivery, mail::is_plausible_email};
use research_agents::{JobSearchResult, ResearchError, ResearchReport};

use crate::handlers::{ApiError, agent_error, api_error};
use crate::state::AppState;

fn default_location() -> String {
    "spain".into()
}

fn default_position() -> String {
    "software engineer".into()
}

#[derive(Debug, Deserialize)]
pub struct JobSearchRequest {
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_position")]
    pub position: String,
}

#[derive(Debug, Deserialize)]
pub struct ResearchRequest {
    pub company: String,
    pub website: String,
    /// Mail the finished report here
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResearchResponse {
    pub report: ResearchReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<Delivery>,
}

pub fn research_error(e: ResearchError) -> ApiError {
    match e {
        ResearchError::InvalidInput(_) => api_error(StatusCode::BAD_REQUEST, "INVALID_INPUT", e.to_string()),
        ResearchError::InvalidRecipient(_) => api_error(StatusCode::BAD_REQUEST, "INVALID_RECIPIENT", e.to_string()),
        ResearchError::Agent(inner) => agent_error(&inner),
    }
}

pub async fn search_jobs(
    State(state): State<AppState>,
    Json(payload): Json<JobSearchRequest>,
) -> Result<Json<JobSearchResult>, ApiError> {
    let result = state
        .jobs
        .search(&payload.location, &payload.position)
        .await
        .map_err(research_error)?;
    Ok(Json(result))
}

/// Research a company, optionally mailing the report
pub async fn run_research(
    State(state): State<AppState>,
    Json(payload): Json<ResearchRequest>,
) -> Result<Json<ResearchResponse>, ApiError> {
    let email = payload.email.as_deref().map(str::trim).filter(|e| !e.is_empty());

    // Reject a bad address before the long research run
    if let Some(to) = email.filter(|to| !is_plausible_email(to)) {
        return Err(research_error(ResearchError::InvalidRecipient(to.to_string())));
    }

    let report = state
        .diligence
        .run(&payload.company, &payload.website)
        .await
        .map_err(research_error)?;

    let delivery = match email {
        Some(to) => Some(state.reports.send(to, &report).await.map_err(research_error)?),
        None => None,
    };

    Ok(Json(ResearchResponse { report, delivery }))
}
