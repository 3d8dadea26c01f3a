use jsonschema::Validator;
use serde_json::Value;

use crate::error::{Result, SchemaError};

/// Maximum number of individual violations joined into one error message.
const MAX_REPORTED_ERRORS: usize = 4;

pub(crate) fn validate_envelope(
    envelope_type: &str,
    envelope: &Value,
    validator: &Validator,
) -> Result<()> {
    let message = validator
        .iter_errors(envelope)
        .take(MAX_REPORTED_ERRORS)
        .map(|err| err.to_string())
        .collect::<Vec<_>>()
        .join("; ");

    if message.is_empty() {
        return Ok(());
    }
    Err(SchemaError::ValidationFailed {
        envelope_type: envelope_type.to_string(),
        message,
    })
}
