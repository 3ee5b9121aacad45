use std::collections::HashMap;
use geo::{BoundingRect, Centroid, MultiPoint, Point};
use crate::core::error::ClusteringError;
use crate::models::{
    Cluster, GeoPoint, NoRecommendationReason, Recommendation, RecommendationOutcome, TaggedRecord,
};

/// Pick the cluster with the most members; ties go to the lowest id
pub fn dominant_cluster(clusters: &[Cluster]) -> Option<&Cluster> {
    clusters
        .iter()
        .min_by(|a, b| b.len().cmp(&a.len()).then(a.id.cmp(&b.id)))
}

/// Summarize the dominant cluster into a recommendation.
///
/// This is the final stage of the pipeline. Only the single largest cluster
/// is reported; the others are dropped.
pub fn summarize(
    clusters: &[Cluster],
    records: &[TaggedRecord],
    top_k: usize,
) -> Result<RecommendationOutcome, ClusteringError> {
    let Some(dominant) = dominant_cluster(clusters) else {
        return Ok(RecommendationOutcome::NoRecommendation(
            NoRecommendationReason::NoValidLocations,
        ));
    };

    check_members(dominant, records)?;

    Ok(RecommendationOutcome::Recommended(Recommendation {
        position: centroid(dominant, records)?,
        tags: top_tags(dominant, records, top_k),
    }))
}

/// Fail fast on a cluster that doesn't describe the validated record set
fn check_members(cluster: &Cluster, records: &[TaggedRecord]) -> Result<(), ClusteringError> {
    if cluster.is_empty() {
        return Err(ClusteringError::InvariantViolation(format!(
            "cluster {} has no members",
            cluster.id
        )));
    }

    if let Some(&idx) = cluster.members.iter().find(|&&idx| idx >= records.len()) {
        return Err(ClusteringError::InvariantViolation(format!(
            "cluster {} references record {} of {}",
            cluster.id,
            idx,
            records.len()
        )));
    }

    Ok(())
}

/// Arithmetic mean of the member positions.
///
/// The mean is clamped into the members' bounding rectangle so rounding can
/// never push it outside; identical members yield exactly their position.
pub fn centroid(cluster: &Cluster, records: &[TaggedRecord]) -> Result<GeoPoint, ClusteringError> {
    check_members(cluster, records)?;

    let points: MultiPoint<f64> = cluster
        .members
        .iter()
        .map(|&idx| records[idx].position.to_point())
        .collect::<Vec<Point<f64>>>()
        .into();

    let (Some(mean), Some(bounds)) = (points.centroid(), points.bounding_rect()) else {
        return Err(ClusteringError::InvariantViolation(format!(
            "cluster {} has no centroid",
            cluster.id
        )));
    };

    let lng = mean.x().clamp(bounds.min().x, bounds.max().x);
    let lat = mean.y().clamp(bounds.min().y, bounds.max().y);

    GeoPoint::new(lat, lng).ok_or_else(|| {
        ClusteringError::InvariantViolation(format!(
            "centroid ({}, {}) of cluster {} is out of range",
            lat, lng, cluster.id
        ))
    })
}

/// Most frequent tags among the cluster's members.
///
/// Sorted by count descending; equal counts keep the order in which the tags
/// were first seen scanning members in input order.
pub fn top_tags(cluster: &Cluster, records: &[TaggedRecord], k: usize) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for tag in cluster.tags(records) {
        match slots.get(tag) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                slots.insert(tag, counts.len());
                counts.push((tag, 1));
            }
        }
    }

    // Stable sort, so first-seen order survives for ties
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    counts
        .into_iter()
        .take(k)
        .map(|(tag, _)| tag.to_string())
        .collect()
}
