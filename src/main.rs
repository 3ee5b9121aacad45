use actix_cors::Cors;
use actix_web::{web, App, HttpServer, middleware};
use photomap_api::config::{LoggingSettings, Settings};
use photomap_api::core::Recommender;
use photomap_api::models::ClusteringParams;
use photomap_api::routes::{self, recommendations::AppState};
use photomap_api::services::{CacheManager, DocumentStoreClient};
use std::sync::Arc;
use tracing::{info, warn, error};
use tracing_subscriber::EnvFilter;

const DEFAULT_MAX_PAYLOAD_BYTES: usize = 4 * 1024 * 1024;

/// Initialize logging; RUST_LOG takes precedence over the configured level
fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            init_logging(&LoggingSettings::default());
            error!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings.logging);

    info!("Starting Photomap recommendation service...");

    let params = ClusteringParams::from(&settings.clustering);
    let recommender = Recommender::new(params).map_err(|e| {
        error!("Invalid clustering configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    info!("Recommender initialized with parameters: {:?}", recommender.params());

    let store = DocumentStoreClient::from_settings(&settings.store).map_err(|e| {
        error!("Failed to create document store client: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    info!("Document store client initialized ({})", settings.store.endpoint);

    // Redis is optional - the service falls back to the in-process cache
    let cache_ttl = settings.cache.ttl_secs.unwrap_or(300);
    let l1_cache_size = settings.cache.l1_cache_size.unwrap_or(1000);
    let connect_timeout = settings.cache.connection_timeout_secs.unwrap_or(5);

    let cache = match settings.cache.redis_url.as_deref() {
        Some(url) => match CacheManager::connect(url, l1_cache_size, cache_ttl, connect_timeout).await {
            Ok(cache) => cache,
            Err(e) => {
                warn!("Failed to connect to Redis ({}), running with in-memory cache only", e);
                CacheManager::in_memory(l1_cache_size, cache_ttl)
            }
        },
        None => CacheManager::in_memory(l1_cache_size, cache_ttl),
    };

    info!(
        "Cache manager initialized (backend: {}, L1: {} entries, TTL: {}s)",
        cache.backend(),
        l1_cache_size,
        cache_ttl
    );

    let app_state = AppState {
        store: Arc::new(store),
        cache: Arc::new(cache),
        recommender,
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);
    let max_payload = settings.server.max_payload_bytes.unwrap_or(DEFAULT_MAX_PAYLOAD_BYTES);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(routes::json_config(max_payload))
            .app_data(routes::query_config())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
