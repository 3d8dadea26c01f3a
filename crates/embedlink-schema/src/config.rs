/// Controls envelope validation behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// When true, object schemas reject properties they do not list.
    pub strict_mode: bool,
    /// When true, envelope types without a schema fail with
    /// `SchemaError::NoSchema` instead of passing.
    pub fail_on_missing_schema: bool,
    /// Maximum number of schemas loaded from a directory.
    pub max_schemas_from_directory: usize,
    /// Maximum bytes per schema file loaded from a directory.
    pub max_schema_file_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            fail_on_missing_schema: false,
            max_schemas_from_directory: 64,
            max_schema_file_size: 64 * 1024,
        }
    }
}
