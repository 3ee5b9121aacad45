use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::Validate;
use crate::models::domain::RawLocationRecord;

/// Largest record batch accepted by the compute endpoint
pub const MAX_RECORDS_PER_REQUEST: u64 = 10_000;

/// Request to compute a recommendation from caller-supplied records
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ComputeRecommendationRequest {
    #[validate(length(max = MAX_RECORDS_PER_REQUEST))]
    #[serde(default, deserialize_with = "lenient_records")]
    pub records: Vec<RawLocationRecord>,
}

/// Malformed entries become records without a location instead of failing
/// the whole batch
fn lenient_records<'de, D>(deserializer: D) -> Result<Vec<RawLocationRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .map(RawLocationRecord::from_value)
        .collect())
}
