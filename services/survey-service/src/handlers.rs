use std::net::SocketAddr;

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::Value;

use crate::models::PingResponse;
use crate::record::{format_utc, RequestContext};
use crate::service::{self, ServiceError};
use crate::state::AppState;

pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok",
        message: "API is alive",
        utc_time: format_utc(Utc::now()),
    })
}

pub async fn submit_survey(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> impl IntoResponse {
    // A literal `null` body carries no submission, same as a missing one.
    let payload = match payload {
        Ok(Json(Value::Null)) => return ServiceError::invalid_json().into_response(),
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            tracing::debug!(reason = %rejection.body_text(), "survey body rejected");
            return ServiceError::invalid_json().into_response();
        }
    };

    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    let context = RequestContext::capture(&headers, peer);

    match service::submit_survey(&state, &payload, context).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn not_found() -> ServiceError {
    ServiceError::not_found()
}
