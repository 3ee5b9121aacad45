//! Photomap API - location recommendations for the Photomap photo-sharing app
//!
//! This library provides the recommendation engine behind the "popular
//! locations" feature: a user's geotagged photos are clustered by density and
//! the dominant cluster is summarized as a centroid plus its top content tags.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{ClusteringError, Recommender};
pub use models::{
    ClusteringParams, GeoPoint, RawLocationRecord, Recommendation, RecommendationOutcome,
    RecommendationResponse, NoRecommendationReason,
};
