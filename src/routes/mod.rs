// Route exports
pub mod errors;
pub mod recommendations;

use actix_web::web;

pub use errors::{handle_json_payload_error, handle_query_payload_error, json_config, query_config};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(recommendations::configure),
    );
}
