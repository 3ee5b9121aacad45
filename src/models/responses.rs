use serde::{Deserialize, Serialize};
use crate::models::domain::{Recommendation, RecommendationOutcome};

/// Recommendation endpoint response.
///
/// `recommendation` is `null` when nothing could be recommended, and
/// `message` then says why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendation: Option<Recommendation>,
    pub message: Option<String>,
}

impl From<RecommendationOutcome> for RecommendationResponse {
    fn from(outcome: RecommendationOutcome) -> Self {
        match outcome {
            RecommendationOutcome::Recommended(rec) => Self {
                recommendation: Some(rec),
                message: None,
            },
            RecommendationOutcome::NoRecommendation(reason) => Self {
                recommendation: None,
                message: Some(reason.message().to_string()),
            },
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub cache: String,
    pub cached_entries: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}
