use std::ops::RangeInclusive;

use serde_json::{Map, Value};

use crate::models::{FieldViolation, SurveySource, SurveySubmission};

const NAME_MAX_CHARS: usize = 100;
const EMAIL_MAX_CHARS: usize = 254;
const COMMENTS_MAX_CHARS: usize = 1000;
const AGE_RANGE: RangeInclusive<u8> = 13..=120;
const RATING_RANGE: RangeInclusive<u8> = 1..=5;

/// Checks an untrusted JSON value against the survey schema, collecting every
/// violation instead of stopping at the first.
pub fn validate_submission(payload: &Value) -> Result<SurveySubmission, Vec<FieldViolation>> {
    // The body itself is not echoed: it may carry an email or age in any shape.
    let Some(fields) = payload.as_object() else {
        return Err(vec![FieldViolation::new(
            "body",
            "type_error.object",
            "submission must be a JSON object",
        )]);
    };

    let mut checker = Checker::new(fields);

    let name = checker.string("name", true).and_then(|raw| {
        let name = raw.trim();
        if name.is_empty() {
            checker.reject_with_input(
                "name",
                "value_error.any_str.min_length",
                "name must not be blank",
            );
            None
        } else if name.chars().count() > NAME_MAX_CHARS {
            checker.reject_with_input(
                "name",
                "value_error.any_str.max_length",
                format!("name must be at most {NAME_MAX_CHARS} characters"),
            );
            None
        } else {
            Some(name.to_string())
        }
    });

    // Email and age are sensitive, so their values are never echoed back.
    let email = checker.string("email", false).and_then(|email| {
        if email.chars().count() > EMAIL_MAX_CHARS {
            checker.reject(
                "email",
                "value_error.any_str.max_length",
                format!("email must be at most {EMAIL_MAX_CHARS} characters"),
            );
            None
        } else if !is_email_shaped(email) {
            checker.reject(
                "email",
                "value_error.email",
                "value is not a valid email address",
            );
            None
        } else {
            Some(email.to_string())
        }
    });

    let age = checker.integer_in("age", AGE_RANGE, false);

    let consent = checker.boolean("consent").and_then(|consent| {
        if consent {
            Some(true)
        } else {
            checker.reject_with_input("consent", "value_error.const", "consent must be given");
            None
        }
    });

    let rating = checker.integer_in("rating", RATING_RANGE, true);

    let comments = checker
        .optional_string("comments")
        .and_then(|comments| match comments {
            Some(text) if text.chars().count() > COMMENTS_MAX_CHARS => {
                checker.reject(
                    "comments",
                    "value_error.any_str.max_length",
                    format!("comments must be at most {COMMENTS_MAX_CHARS} characters"),
                );
                None
            }
            other => Some(other.map(str::to_string)),
        });

    let source = match fields.get("source") {
        None => Some(SurveySource::default()),
        Some(_) => checker.string("source", true).and_then(|raw| {
            let parsed = SurveySource::parse(raw);
            if parsed.is_none() {
                checker.reject_with_input(
                    "source",
                    "value_error.const",
                    format!("source must be one of {}", SurveySource::ALLOWED.join(", ")),
                );
            }
            parsed
        }),
    };

    if !checker.violations.is_empty() {
        return Err(checker.violations);
    }

    match (name, email, age, consent, rating, comments, source) {
        (
            Some(name),
            Some(email),
            Some(age),
            Some(consent),
            Some(rating),
            Some(comments),
            Some(source),
        ) => Ok(SurveySubmission {
            name,
            email,
            age,
            consent,
            rating,
            comments,
            source,
        }),
        _ => Err(checker.violations),
    }
}

/// Loose `local@domain.tld` shape check; deliverability is not our concern.
pub fn is_email_shaped(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    });
    let tld_ok = labels
        .last()
        .map(|tld| tld.chars().count() >= 2 && tld.chars().all(char::is_alphabetic))
        .unwrap_or(false);
    labels_ok && tld_ok
}

struct Checker<'a> {
    fields: &'a Map<String, Value>,
    violations: Vec<FieldViolation>,
}

impl<'a> Checker<'a> {
    fn new(fields: &'a Map<String, Value>) -> Self {
        Self {
            fields,
            violations: Vec::new(),
        }
    }

    fn reject(&mut self, field: &str, kind: &'static str, msg: impl Into<String>) {
        self.violations.push(FieldViolation::new(field, kind, msg));
    }

    fn reject_with_input(&mut self, field: &str, kind: &'static str, msg: impl Into<String>) {
        let input = self.fields.get(field);
        self.violations
            .push(FieldViolation::new(field, kind, msg).with_input(input));
    }

    fn reject_type(&mut self, field: &str, kind: &'static str, msg: &str, echo: bool) {
        if echo {
            self.reject_with_input(field, kind, msg);
        } else {
            self.reject(field, kind, msg);
        }
    }

    fn required(&mut self, field: &str) -> Option<&'a Value> {
        let value = self.fields.get(field);
        if value.is_none() {
            self.reject(field, "missing", "field required");
        }
        value
    }

    fn string(&mut self, field: &str, echo: bool) -> Option<&'a str> {
        let value = self.required(field)?;
        match value.as_str() {
            Some(text) => Some(text),
            None => {
                self.reject_type(field, "type_error.str", "value is not a valid string", echo);
                None
            }
        }
    }

    /// `Some(None)` for an absent or null field, `None` after a violation.
    fn optional_string(&mut self, field: &str) -> Option<Option<&'a str>> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(text)) => Some(Some(text.as_str())),
            Some(_) => {
                self.reject_with_input(field, "type_error.str", "value is not a valid string");
                None
            }
        }
    }

    fn integer_in(&mut self, field: &str, range: RangeInclusive<u8>, echo: bool) -> Option<u8> {
        let value = self.required(field)?;
        let Some(number) = value.as_i64() else {
            self.reject_type(field, "type_error.integer", "value is not a valid integer", echo);
            return None;
        };
        let in_range = u8::try_from(number).ok().filter(|n| range.contains(n));
        let Some(number) = in_range else {
            let msg = format!(
                "value must be between {} and {}",
                range.start(),
                range.end()
            );
            self.reject_type(field, "value_error.range", &msg, echo);
            return None;
        };
        Some(number)
    }

    fn boolean(&mut self, field: &str) -> Option<bool> {
        let value = self.required(field)?;
        match value.as_bool() {
            Some(flag) => Some(flag),
            None => {
                self.reject_with_input(field, "type_error.bool", "value is not a valid boolean");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_payload() -> Value {
        json!({
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "age": 36,
            "consent": true,
            "rating": 5,
            "comments": "Great course",
            "source": "web",
        })
    }

    fn locs(violations: &[FieldViolation]) -> Vec<String> {
        violations.iter().map(|v| v.loc.join(".")).collect()
    }

    #[test]
    fn accepts_valid_submission() {
        let submission = validate_submission(&valid_payload()).expect("valid");
        assert_eq!(submission.name, "Ada Lovelace");
        assert_eq!(submission.email, "ada@example.com");
        assert_eq!(submission.age, 36);
        assert_eq!(submission.rating, 5);
        assert_eq!(submission.comments.as_deref(), Some("Great course"));
        assert_eq!(submission.source, SurveySource::Web);
    }

    #[test]
    fn optional_fields_default() {
        let mut payload = valid_payload();
        let fields = payload.as_object_mut().expect("object");
        fields.remove("comments");
        fields.remove("source");
        fields.insert("unknown".to_string(), json!("ignored"));

        let submission = validate_submission(&payload).expect("valid");
        assert_eq!(submission.comments, None);
        assert_eq!(submission.source, SurveySource::Other);
    }

    #[test]
    fn reports_every_violation() {
        let payload = json!({
            "email": "not-an-email",
            "age": 7,
            "consent": false,
            "rating": "five",
        });
        let violations = validate_submission(&payload).expect_err("invalid");
        assert_eq!(
            locs(&violations),
            vec!["name", "email", "age", "consent", "rating"]
        );
        assert_eq!(violations[0].kind, "missing");
        assert_eq!(violations[1].kind, "value_error.email");
        assert_eq!(violations[2].kind, "value_error.range");
        assert_eq!(violations[3].kind, "value_error.const");
        assert_eq!(violations[4].kind, "type_error.integer");
    }

    #[test]
    fn sensitive_values_are_not_echoed() {
        let payload = json!({
            "name": "",
            "email": "bad@",
            "age": 500,
            "consent": true,
            "rating": 9,
        });
        let violations = validate_submission(&payload).expect_err("invalid");
        let by_field = |field: &str| {
            violations
                .iter()
                .find(|v| v.loc == vec![field.to_string()])
                .expect("violation present")
        };
        assert!(by_field("email").input.is_none());
        assert!(by_field("age").input.is_none());
        assert_eq!(by_field("rating").input, Some(json!(9)));
        assert_eq!(by_field("name").input, Some(json!("")));
    }

    #[test]
    fn types_are_strict() {
        let payload = json!({
            "name": "Ada",
            "email": "ada@example.com",
            "age": "36",
            "consent": 1,
            "rating": 4.0,
            "comments": 12,
            "source": "fax",
        });
        let violations = validate_submission(&payload).expect_err("invalid");
        let kinds: Vec<&str> = violations.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                "type_error.integer",
                "type_error.bool",
                "type_error.integer",
                "type_error.str",
                "value_error.const",
            ]
        );
    }

    #[test]
    fn length_limits_apply() {
        let mut payload = valid_payload();
        let fields = payload.as_object_mut().expect("object");
        fields.insert("name".to_string(), json!("x".repeat(NAME_MAX_CHARS + 1)));
        fields.insert("comments".to_string(), json!("y".repeat(COMMENTS_MAX_CHARS + 1)));

        let violations = validate_submission(&payload).expect_err("invalid");
        assert_eq!(locs(&violations), vec!["name", "comments"]);
        assert!(violations
            .iter()
            .all(|v| v.kind == "value_error.any_str.max_length"));
    }

    #[test]
    fn non_object_body_is_a_single_violation() {
        let violations =
            validate_submission(&json!(["a@example.com", 30])).expect_err("invalid");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].loc, vec!["body".to_string()]);
        assert_eq!(violations[0].kind, "type_error.object");
        assert!(violations[0].input.is_none());
    }

    #[test]
    fn email_shape() {
        assert!(is_email_shaped("a@example.com"));
        assert!(is_email_shaped("first.last+tag@sub.example.org"));
        assert!(!is_email_shaped(""));
        assert!(!is_email_shaped("a@example"));
        assert!(!is_email_shaped("@example.com"));
        assert!(!is_email_shaped("a@@example.com"));
        assert!(!is_email_shaped("a b@example.com"));
        assert!(!is_email_shaped("a@-example.com"));
        assert!(!is_email_shaped("a@example..com"));
        assert!(!is_email_shaped("a@example.c0m"));
    }
}
