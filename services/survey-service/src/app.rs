use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{not_found, ping, submit_survey};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Only the /v1 family is open cross-origin; the survey page may be served
    // from any origin, including file://.
    let v1 = Router::new()
        .route("/survey", post(submit_survey))
        .layer(survey_cors());

    Router::new()
        .route("/ping", get(ping))
        .nest("/v1", v1)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn survey_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::any())
}
