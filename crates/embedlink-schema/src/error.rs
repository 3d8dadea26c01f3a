/// Errors that can occur during envelope validation.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A schema file could not be loaded.
    #[error("failed to load schema: {0}")]
    LoadFailed(String),

    /// A schema could not be compiled.
    #[error("failed to compile schema for {envelope_type}: {message}")]
    CompileFailed {
        envelope_type: String,
        message: String,
    },

    /// The envelope failed validation.
    #[error("{envelope_type} envelope failed validation: {message}")]
    ValidationFailed {
        envelope_type: String,
        message: String,
    },

    /// Input is not valid JSON.
    #[error("not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The envelope has no string `type` field.
    #[error("envelope has no string 'type' field")]
    MissingType,

    /// No schema is registered for the envelope type.
    #[error("no schema registered for envelope type {0}")]
    NoSchema(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
