use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveySource {
    Web,
    Mobile,
    #[default]
    Other,
}

impl SurveySource {
    pub const ALLOWED: [&'static str; 3] = ["web", "mobile", "other"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "web" => Some(SurveySource::Web),
            "mobile" => Some(SurveySource::Mobile),
            "other" => Some(SurveySource::Other),
            _ => None,
        }
    }
}

/// A submission that passed schema validation. Only ever built by
/// `validation::validate_submission`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveySubmission {
    pub name: String,
    pub email: String,
    pub age: u8,
    pub consent: bool,
    pub rating: u8,
    pub comments: Option<String>,
    pub source: SurveySource,
}

/// Server-enriched record. `email` and `age` are still plaintext here; the
/// privacy transform runs on the field map produced by [`to_fields`].
///
/// [`to_fields`]: StoredSurveyRecord::to_fields
#[derive(Debug, Clone, Serialize)]
pub struct StoredSurveyRecord {
    #[serde(flatten)]
    pub submission: SurveySubmission,
    pub received_at: String,
    pub ip: String,
    pub user_agent: Option<String>,
    pub submission_id: String,
}

impl StoredSurveyRecord {
    pub fn to_fields(&self) -> serde_json::Result<Map<String, Value>> {
        serde_json::from_value(serde_json::to_value(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    pub loc: Vec<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

impl FieldViolation {
    pub fn new(field: &str, kind: &'static str, msg: impl Into<String>) -> Self {
        Self {
            loc: vec![field.to_string()],
            kind,
            msg: msg.into(),
            input: None,
        }
    }

    pub fn with_input(mut self, input: Option<&Value>) -> Self {
        self.input = input.cloned();
        self
    }
}

#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub utc_time: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub detail: ErrorDetail,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(&'static str),
    Violations(Vec<FieldViolation>),
}
