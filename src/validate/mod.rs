//! Input validation pipeline.
//!
//! # Responsibilities
//! - Parse raw request bodies into structured JSON, failing generically when
//!   the payload cannot be parsed at all
//! - Apply an opaque schema and normalize its failures into the uniform
//!   `{field, message}` shape
//!
//! # Design Decisions
//! - Hard gate: handlers never see unvalidated data for parameters they
//!   rely on
//! - Error bodies carry field paths and human messages only; raw input and
//!   PII values are never echoed back

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::http::response::{FieldIssue, GatewayError};

/// Opaque validation schema: `parse(input) -> data | issues`.
///
/// Business entities (jobs, applications, ratings, ...) implement this for
/// their own field sets; the gateway treats every schema uniformly.
pub trait InputSchema {
    type Output;

    fn parse(&self, input: &Value) -> Result<Self::Output, Vec<FieldIssue>>;
}

/// Validate raw body bytes against a schema.
///
/// Unparseable payloads yield the generic invalid-body error; schema
/// failures yield field-level detail.
pub fn validate_body<S: InputSchema>(bytes: &[u8], schema: &S) -> Result<S::Output, GatewayError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|_| GatewayError::InvalidBody)?;
    validate_value(&value, schema)
}

/// Validate an already-parsed JSON value against a schema.
pub fn validate_value<S: InputSchema>(value: &Value, schema: &S) -> Result<S::Output, GatewayError> {
    schema
        .parse(value)
        .map_err(|details| GatewayError::Validation { details })
}

/// Schema adapter for plain serde DTOs.
///
/// Deserialization failures collapse into a single body-level issue; schemas
/// needing per-field reporting implement [`InputSchema`] directly.
pub struct SerdeSchema<T> {
    _marker: PhantomData<T>,
}

impl<T> SerdeSchema<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for SerdeSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> InputSchema for SerdeSchema<T> {
    type Output = T;

    fn parse(&self, input: &Value) -> Result<T, Vec<FieldIssue>> {
        serde_json::from_value(input.clone()).map_err(|e| {
            vec![FieldIssue {
                field: "body".to_string(),
                message: e.to_string(),
            }]
        })
    }
}
