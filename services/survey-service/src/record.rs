use std::net::SocketAddr;

use axum::http::{header::USER_AGENT, HeaderMap, HeaderValue};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::{StoredSurveyRecord, SurveySubmission};
use crate::privacy::digest_hex;

pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Server-side facts captured when a request is processed.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub received_at: DateTime<Utc>,
    pub ip: String,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn capture(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        Self {
            received_at: Utc::now(),
            ip: resolve_client_ip(headers, peer),
            user_agent: headers.get(USER_AGENT).map(decode_header),
        }
    }
}

/// Header bytes as text; non-UTF-8 sequences become U+FFFD instead of
/// dropping the whole value.
fn decode_header(value: &HeaderValue) -> String {
    String::from_utf8_lossy(value.as_bytes()).into_owned()
}

/// Canonical UTC text form: RFC 3339, six fractional digits, `+00:00` offset.
/// The same string is stored as `received_at` and fed into `submission_id`.
pub fn format_utc(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// First `X-Forwarded-For` value as-is, else the peer IP, else empty.
pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get(FORWARDED_FOR)
        .map(decode_header)
        .filter(|value| !value.trim().is_empty());

    match (forwarded, peer) {
        (Some(forwarded), _) => forwarded,
        (None, Some(peer)) => peer.ip().to_string(),
        (None, None) => String::new(),
    }
}

pub fn submission_id(email: &str, received_at: &str) -> String {
    digest_hex(format!("{email}{received_at}").as_bytes())
}

/// Must run while `email` is still plaintext.
pub fn build_record(submission: SurveySubmission, context: RequestContext) -> StoredSurveyRecord {
    let received_at = format_utc(context.received_at);
    let submission_id = submission_id(&submission.email, &received_at);
    StoredSurveyRecord {
        submission,
        received_at,
        ip: context.ip,
        user_agent: context.user_agent,
        submission_id,
    }
}
