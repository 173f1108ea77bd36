//! # Validation
//!
//! Rules are built once from field names (`required("entry[title]")`) and checked against
//! every submitted payload. [`validate_payload`] runs them in front of a handler:
//!
//! - Pass: the decoded [`Payload`] goes into the request extensions and the handler runs
//! - Reject: the first failing rule's message is flashed and the user is sent back
//!
//! Absent fields fail closed, including for length checks.
use std::sync::Arc;

use axum::{
    body::to_bytes,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::debug;

use crate::{
    error::{AppError, ValidationError},
    field::FieldPath,
    flash,
    utils::get_payload_from_body,
};

pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Decoded request body, available to handlers behind [`validate_payload`].
#[derive(Debug, Clone)]
pub struct Payload(pub Value);

#[derive(Debug, Clone)]
pub enum Rule {
    Required(FieldPath),
    LengthAbove(FieldPath, usize),
}

pub fn required(field: &str) -> Rule {
    Rule::Required(FieldPath::parse(field))
}

pub fn length_above(field: &str, len: usize) -> Rule {
    Rule::LengthAbove(FieldPath::parse(field), len)
}

impl Rule {
    pub fn check(&self, payload: &Value) -> Result<(), ValidationError> {
        match self {
            Rule::Required(path) => match path.resolve(payload) {
                Some(value) if is_truthy(value) => Ok(()),
                _ => Err(is_required(path)),
            },
            Rule::LengthAbove(path, len) => match path.resolve(payload).and_then(length) {
                Some(length) if length > *len => Ok(()),
                Some(_) => Err(ValidationError {
                    message: format!("{path} must have more than {len} characters"),
                }),
                None => Err(is_required(path)),
            },
        }
    }
}

fn is_required(path: &FieldPath) -> ValidationError {
    ValidationError {
        message: format!("{path} is required"),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn length(value: &Value) -> Option<usize> {
    match value {
        Value::String(text) => Some(text.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// Ordered rule set, the first failure decides the message.
#[derive(Debug, Clone, Default)]
pub struct Rules(Vec<Rule>);

impl Rules {
    pub fn new(rules: impl IntoIterator<Item = Rule>) -> Self {
        Self(rules.into_iter().collect())
    }

    pub fn check(&self, payload: &Value) -> Result<(), ValidationError> {
        self.0.iter().try_for_each(|rule| rule.check(payload))
    }
}

pub async fn validate_payload(
    State(rules): State<Arc<Rules>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    // Reading only fails past the limit or when the client goes away mid-body.
    let Ok(bytes) = to_bytes(body, MAX_BODY_BYTES).await else {
        return AppError::PayloadTooLarge.into_response();
    };

    let payload = match get_payload_from_body(&parts.headers, &bytes) {
        Ok(payload) => payload,
        Err(e) => return e.into_response(),
    };

    if let Err(error) = rules.check(&payload) {
        debug!("Rejected {}: {error}", parts.uri);

        return flash::reject(&parts.headers, &error);
    }

    parts.extensions.insert(Payload(payload));

    next.run(Request::from_parts(parts, bytes.into())).await
}
