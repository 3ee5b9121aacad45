// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    GeoPoint, RawLocationRecord, RawLocation, RawPosition, TaggedRecord, Cluster, Recommendation,
    RecommendationOutcome, NoRecommendationReason, ClusteringParams, NeighborIndexKind,
    DEFAULT_EPSILON_DEGREES, DEFAULT_MIN_POINTS, DEFAULT_TOP_TAGS,
};
pub use requests::{ComputeRecommendationRequest, MAX_RECORDS_PER_REQUEST};
pub use responses::{RecommendationResponse, HealthResponse, ErrorResponse};
