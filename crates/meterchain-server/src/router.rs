use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all meterchain endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route(
            "/v1/records",
            get(handler::list_handler).post(handler::mine_handler),
        )
        .route(
            "/v1/records/:position",
            get(handler::get_handler).put(handler::amend_handler),
        )
        .route("/v1/validate", get(handler::validate_handler))
        .route("/v1/meters/:source_id/readings", get(handler::readings_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
