use geo::Point;
use crate::core::{
    dbscan::Dbscan,
    error::ClusteringError,
    extract::extract_tagged_records,
    neighbors::build_neighbor_finder,
    summary::summarize,
};
use crate::models::{ClusteringParams, RawLocationRecord, RecommendationOutcome};

/// Location recommendation pipeline
///
/// # Pipeline Stages
/// 1. Extract and validate positions
/// 2. Density clustering
/// 3. Dominant cluster summary (centroid + top tags)
///
/// Each call owns all of its intermediate state, so one `Recommender` can be
/// shared by any number of concurrent requests.
#[derive(Debug, Clone)]
pub struct Recommender {
    dbscan: Dbscan,
    params: ClusteringParams,
}

impl Recommender {
    pub fn new(params: ClusteringParams) -> Result<Self, ClusteringError> {
        if params.top_tags == 0 {
            return Err(ClusteringError::InvalidParameter {
                name: "top_tags",
                message: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            dbscan: Dbscan::new(params.epsilon, params.min_points)?,
            params,
        })
    }

    pub fn with_default_params() -> Self {
        Self {
            dbscan: Dbscan::default(),
            params: ClusteringParams::default(),
        }
    }

    pub fn params(&self) -> &ClusteringParams {
        &self.params
    }

    /// Compute the recommendation for one user's image records.
    ///
    /// # Returns
    /// Either a recommendation or the reason there is none. An `Err` means an
    /// internal invariant broke and must be reported as a failure.
    pub fn compute_recommendation(
        &self,
        records: &[RawLocationRecord],
    ) -> Result<RecommendationOutcome, ClusteringError> {
        let valid = match extract_tagged_records(records) {
            Ok(valid) => valid,
            Err(reason) => {
                tracing::debug!("No recommendation for {} records: {}", records.len(), reason.reason());
                return Ok(RecommendationOutcome::NoRecommendation(reason));
            }
        };

        let points: Vec<Point<f64>> = valid.iter().map(|r| r.position.to_point()).collect();
        let finder = build_neighbor_finder(self.params.neighbor_index, points, self.dbscan.epsilon());
        let clusters = self.dbscan.cluster(finder.as_ref());

        tracing::debug!(
            "Clustered {} valid of {} records into {} clusters (epsilon: {}, min_points: {})",
            valid.len(),
            records.len(),
            clusters.len(),
            self.dbscan.epsilon(),
            self.dbscan.min_points()
        );

        summarize(&clusters, &valid, self.params.top_tags)
    }
}

impl Default for Recommender {
    fn default() -> Self {
        Self::with_default_params()
    }
}
