use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::models::{
    ComputeRecommendationRequest, ErrorResponse, HealthResponse, RecommendationOutcome,
    RecommendationResponse,
};
use crate::services::{CacheError, CacheKey, CacheManager, DocumentStoreClient};
use crate::core::{ClusteringError, Recommender};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DocumentStoreClient>,
    pub cache: Arc<CacheManager>,
    pub recommender: Recommender,
}

/// Configure all recommendation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/users/{user_id}/recommendation", web::get().to(get_user_recommendation))
        .route("/users/{user_id}/recommendation", web::delete().to(invalidate_user_recommendation))
        .route("/recommendations", web::post().to(compute_recommendation));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let stats = state.cache.stats();

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache: stats.backend,
        cached_entries: stats.l1_size,
        timestamp: chrono::Utc::now(),
    })
}

fn error_response(status: u16, error: &str, message: String) -> ErrorResponse {
    ErrorResponse {
        error: error.to_string(),
        message,
        status_code: status,
        request_id: Some(uuid::Uuid::new_v4().to_string()),
    }
}

/// Map a pipeline failure to a 500; the detail only goes to the log
fn clustering_failure(err: &ClusteringError, record_count: usize) -> HttpResponse {
    let body = error_response(500, "Failed to compute recommendation", "Internal error".to_string());
    tracing::error!(
        "Recommendation failed for {} records (request {:?}): {}",
        record_count,
        body.request_id,
        err
    );
    HttpResponse::InternalServerError().json(body)
}

/// Run the pipeline, mapping an internal failure to a 500 response
fn run_recommender(
    recommender: &Recommender,
    records: &[crate::models::RawLocationRecord],
) -> Result<RecommendationOutcome, HttpResponse> {
    recommender
        .compute_recommendation(records)
        .map_err(|e| clustering_failure(&e, records.len()))
}

/// Recommend a popular location from the user's own photos
///
/// GET /api/v1/users/{userId}/recommendation
///
/// Response body:
/// ```json
/// {
///   "recommendation": { "position": { "lat": 49.19, "lng": -122.69 }, "tags": ["beach"] },
///   "message": null
/// }
/// ```
async fn get_user_recommendation(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let user_id = path.into_inner();
    if user_id.trim().is_empty() {
        return HttpResponse::BadRequest().json(error_response(
            400,
            "Validation failed",
            "userId must not be empty".to_string(),
        ));
    }

    let cache_key = CacheKey::recommendation(&user_id);
    match state.cache.get::<RecommendationOutcome>(&cache_key).await {
        Ok(outcome) => {
            tracing::debug!("Serving cached recommendation for user {}", user_id);
            return HttpResponse::Ok().json(RecommendationResponse::from(outcome));
        }
        Err(CacheError::CacheMiss(_)) => {}
        Err(e) => tracing::warn!("Cache lookup failed for {}, recomputing: {}", user_id, e),
    }

    let records = match state.store.list_image_records(&user_id).await {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("Failed to fetch image records for {}: {}", user_id, e);
            return HttpResponse::InternalServerError().json(error_response(
                500,
                "Failed to fetch image records",
                e.to_string(),
            ));
        }
    };

    let outcome = match run_recommender(&state.recommender, &records) {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };

    if let Err(e) = state.cache.set(&cache_key, &outcome).await {
        tracing::warn!("Failed to cache recommendation for {}: {}", user_id, e);
    }

    tracing::info!(
        "Computed recommendation for user {} from {} records (recommended: {})",
        user_id,
        records.len(),
        outcome.recommendation().is_some()
    );

    HttpResponse::Ok().json(RecommendationResponse::from(outcome))
}

/// Drop the cached recommendation of a user
///
/// DELETE /api/v1/users/{userId}/recommendation
///
/// Called by the upload pipeline once a new photo has been stored.
async fn invalidate_user_recommendation(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let user_id = path.into_inner();

    match state.cache.delete(&CacheKey::recommendation(&user_id)).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => {
            tracing::error!("Failed to invalidate recommendation for {}: {}", user_id, e);
            HttpResponse::InternalServerError().json(error_response(
                500,
                "Failed to invalidate recommendation",
                e.to_string(),
            ))
        }
    }
}

/// Compute a recommendation from records supplied in the request
///
/// POST /api/v1/recommendations
///
/// Request body:
/// ```json
/// {
///   "records": [
///     { "location": { "position": { "lat": 49.19, "lng": -122.69 } }, "tags": ["beach"] }
///   ]
/// }
/// ```
async fn compute_recommendation(
    state: web::Data<AppState>,
    req: web::Json<ComputeRecommendationRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for compute_recommendation request: {:?}", errors);
        return HttpResponse::BadRequest().json(error_response(
            400,
            "Validation failed",
            errors.to_string(),
        ));
    }

    match run_recommender(&state.recommender, &req.records) {
        Ok(outcome) => HttpResponse::Ok().json(RecommendationResponse::from(outcome)),
        Err(response) => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use serde_json::Value;

    #[test]
    fn test_error_response_has_request_id() {
        let response = error_response(500, "boom", "details".to_string());
        assert_eq!(response.status_code, 500);
        assert!(response.request_id.is_some());
    }

    #[actix_web::test]
    async fn test_invariant_violation_maps_to_generic_500() {
        let err = ClusteringError::InvariantViolation("member index 7 out of range".to_string());
        let resp = clustering_failure(&err, 3);
        assert_eq!(resp.status(), 500);

        let bytes = to_bytes(resp.into_body()).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status_code"], 500);
        assert_eq!(body["message"], "Internal error");
        assert!(body["request_id"].is_string());
        assert!(!body.to_string().contains("out of range"));
    }

    #[test]
    fn test_run_recommender_passes_outcome_through() {
        match run_recommender(&Recommender::default(), &[]) {
            Ok(outcome) => assert!(outcome.recommendation().is_none()),
            Err(resp) => panic!("unexpected error response: {}", resp.status()),
        }
    }
}
