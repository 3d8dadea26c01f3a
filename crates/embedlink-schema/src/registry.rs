use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use jsonschema::Validator;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::RegistryConfig;
use crate::error::{Result, SchemaError};
use crate::validator::validate_envelope;

const SCHEMA_SUFFIX: &str = ".schema.json";

/// Envelope-type-keyed registry of compiled JSON Schema validators.
pub struct EnvelopeRegistry {
    validators: BTreeMap<String, Validator>,
    config: RegistryConfig,
}

impl EnvelopeRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            validators: BTreeMap::new(),
            config,
        }
    }

    /// Register a schema for an envelope type from a JSON string.
    pub fn register(&mut self, envelope_type: &str, schema_json: &str) -> Result<()> {
        let schema: Value = serde_json::from_str(schema_json)?;
        self.register_value(envelope_type, &schema)
    }

    /// Register a schema for an envelope type from a JSON value.
    pub fn register_value(&mut self, envelope_type: &str, schema: &Value) -> Result<()> {
        let mut schema = schema.clone();
        if self.config.strict_mode {
            close_object_schemas(&mut schema);
        }

        let compiled =
            jsonschema::validator_for(&schema).map_err(|err| SchemaError::CompileFailed {
                envelope_type: envelope_type.to_string(),
                message: err.to_string(),
            })?;

        self.validators.insert(envelope_type.to_string(), compiled);
        Ok(())
    }

    /// Load from embedded `(type, schema)` pairs, e.g. [`crate::builtin::V1`].
    pub fn from_embedded(schemas: &[(&str, &str)]) -> Result<Self> {
        Self::from_embedded_with_config(schemas, RegistryConfig::default())
    }

    /// Load from embedded pairs with explicit config.
    pub fn from_embedded_with_config(
        schemas: &[(&str, &str)],
        config: RegistryConfig,
    ) -> Result<Self> {
        let mut registry = Self::with_config(config);
        for (envelope_type, schema) in schemas {
            registry.register(envelope_type, schema)?;
        }
        Ok(registry)
    }

    /// Load `<type>.schema.json` files from a directory.
    ///
    /// `store_path_changed.schema.json` registers `STORE_PATH_CHANGED`. Other
    /// files are ignored; symlinked or oversized schema files are refused.
    pub fn from_directory(path: &Path) -> Result<Self> {
        Self::from_directory_with_config(path, RegistryConfig::default())
    }

    /// Load schemas from a directory with explicit config.
    pub fn from_directory_with_config(path: &Path, config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::with_config(config);
        let mut loaded = 0usize;

        let entries = std::fs::read_dir(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;

        for entry in entries {
            let entry = entry.map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !file_name.ends_with(SCHEMA_SUFFIX) {
                continue;
            }

            let entry_path = entry.path();
            let metadata = std::fs::symlink_metadata(&entry_path)
                .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            if metadata.file_type().is_symlink() {
                return Err(SchemaError::LoadFailed(format!(
                    "refusing to load schema symlink: {file_name}"
                )));
            }
            if !metadata.is_file() {
                continue;
            }

            let envelope_type = type_from_file_name(&file_name).ok_or_else(|| {
                SchemaError::LoadFailed(format!("unrecognized schema filename: {file_name}"))
            })?;

            loaded = loaded.saturating_add(1);
            if loaded > registry.config.max_schemas_from_directory {
                return Err(SchemaError::LoadFailed(format!(
                    "schema count exceeds configured max ({})",
                    registry.config.max_schemas_from_directory
                )));
            }

            let content = read_limited(&entry_path, registry.config.max_schema_file_size)?;
            registry.register(&envelope_type, &content)?;
            debug!(%envelope_type, path = %entry_path.display(), "loaded envelope schema");
        }

        Ok(registry)
    }

    /// Validate an envelope against the schema for its `type`.
    pub fn validate(&self, envelope: &Value) -> Result<()> {
        let envelope_type = envelope_type(envelope).ok_or(SchemaError::MissingType)?;
        match self.validators.get(envelope_type) {
            Some(validator) => validate_envelope(envelope_type, envelope, validator),
            None if self.config.fail_on_missing_schema => {
                Err(SchemaError::NoSchema(envelope_type.to_string()))
            }
            None => Ok(()),
        }
    }

    /// Parse and validate a raw JSON envelope.
    pub fn validate_slice(&self, envelope: &[u8]) -> Result<Value> {
        let value: Value = serde_json::from_slice(envelope)?;
        self.validate(&value)?;
        Ok(value)
    }

    pub fn has_schema(&self, envelope_type: &str) -> bool {
        self.validators.contains_key(envelope_type)
    }

    /// Registered envelope types, sorted.
    pub fn envelope_types(&self) -> Vec<&str> {
        self.validators.keys().map(String::as_str).collect()
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}

impl Default for EnvelopeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EnvelopeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeRegistry")
            .field("envelope_types", &self.envelope_types())
            .field("config", &self.config)
            .finish()
    }
}

/// The string `type` discriminator of an envelope, if any.
pub fn envelope_type(envelope: &Value) -> Option<&str> {
    envelope.get("type").and_then(Value::as_str)
}

fn type_from_file_name(file_name: &str) -> Option<String> {
    let stem = file_name.strip_suffix(SCHEMA_SUFFIX)?;
    let valid = !stem.is_empty()
        && stem
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_');
    valid.then(|| stem.to_ascii_uppercase())
}

fn read_limited(path: &Path, max_bytes: usize) -> Result<String> {
    let file = std::fs::File::open(path).map_err(|err| {
        SchemaError::LoadFailed(format!("failed opening schema {}: {err}", path.display()))
    })?;

    let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
    let mut content = String::new();
    file.take(read_limit)
        .read_to_string(&mut content)
        .map_err(|err| {
            SchemaError::LoadFailed(format!("failed reading schema {}: {err}", path.display()))
        })?;

    if content.len() > max_bytes {
        return Err(SchemaError::LoadFailed(format!(
            "schema file too large (limit {max_bytes} bytes): {}",
            path.display()
        )));
    }
    Ok(content)
}

/// Keywords whose value is a map of subschemas.
const SCHEMA_MAPS: [&str; 5] = [
    "properties",
    "patternProperties",
    "dependentSchemas",
    "$defs",
    "definitions",
];

/// Keywords whose value is a single subschema.
const SCHEMA_SINGLES: [&str; 11] = [
    "propertyNames",
    "additionalProperties",
    "unevaluatedProperties",
    "items",
    "contains",
    "additionalItems",
    "unevaluatedItems",
    "not",
    "if",
    "then",
    "else",
];

/// Keywords whose value is an array of subschemas.
const SCHEMA_LISTS: [&str; 4] = ["prefixItems", "allOf", "anyOf", "oneOf"];

/// Keywords that imply an object schema when `type` is absent.
const OBJECT_KEYWORDS: [&str; 8] = [
    "properties",
    "patternProperties",
    "additionalProperties",
    "unevaluatedProperties",
    "required",
    "dependentRequired",
    "dependentSchemas",
    "propertyNames",
];

/// Add `additionalProperties: false` to every object schema that does not
/// set it, recursively.
fn close_object_schemas(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if describes_object(map) && !map.contains_key("additionalProperties") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
            }
            for key in SCHEMA_MAPS {
                if let Some(Value::Object(children)) = map.get_mut(key) {
                    children.values_mut().for_each(close_object_schemas);
                }
            }
            for key in SCHEMA_SINGLES.iter().chain(SCHEMA_LISTS.iter()) {
                if let Some(child) = map.get_mut(*key) {
                    close_object_schemas(child);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(close_object_schemas),
        _ => {}
    }
}

fn describes_object(map: &Map<String, Value>) -> bool {
    match map.get("type") {
        Some(Value::String(kind)) => kind == "object",
        Some(Value::Array(kinds)) => kinds.iter().any(|kind| kind == "object"),
        _ => OBJECT_KEYWORDS.iter().any(|keyword| map.contains_key(*keyword)),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::json;

    use super::*;
    use crate::builtin;

    const PING_SCHEMA: &str = r#"{
        "type": "object",
        "properties": {
            "type": { "const": "PING" },
            "seq": { "type": "integer" }
        },
        "required": ["type", "seq"]
    }"#;

    #[test]
    fn register_and_validate() {
        let mut registry = EnvelopeRegistry::new();
        registry.register("PING", PING_SCHEMA).unwrap();

        assert!(registry.validate(&json!({"type": "PING", "seq": 1})).is_ok());
        assert!(matches!(
            registry.validate(&json!({"type": "PING", "seq": "one"})),
            Err(SchemaError::ValidationFailed { envelope_type, .. }) if envelope_type == "PING"
        ));
    }

    #[test]
    fn builtin_v1_accepts_well_formed_envelopes() {
        let registry = EnvelopeRegistry::from_embedded(builtin::V1).unwrap();

        for envelope in [
            json!({"type": "STORE_PATH_CHANGED", "path": "/listings"}),
            json!({"type": "CALLBACK", "actionIdentifier": "sync", "payload": {"n": 1}}),
            json!({"type": "CALLBACK", "actionIdentifier": "sync"}),
            json!({"type": "SET_INSTALLED", "listingId": "l-1", "installed": true}),
            json!({"type": "UNSAFE_PARAMS_CHANGE", "params": {"a": 1}}),
            json!({"type": "SESSION_RELOAD"}),
        ] {
            assert!(registry.validate(&envelope).is_ok(), "{envelope}");
        }
    }

    #[test]
    fn builtin_v1_rejects_malformed_bodies() {
        let registry = EnvelopeRegistry::from_embedded(builtin::V1).unwrap();

        for envelope in [
            json!({"type": "STORE_PATH_CHANGED"}),
            json!({"type": "CALLBACK", "action": "sync"}),
            json!({"type": "SET_INSTALLED", "listingId": "l-1", "installed": "yes"}),
            json!({"type": "UNSAFE_PARAMS_CHANGE", "params": {"token": "x"}}),
        ] {
            assert!(registry.validate(&envelope).is_err(), "{envelope}");
        }
    }

    #[test]
    fn builtin_legacy_uses_legacy_field_names() {
        let registry = EnvelopeRegistry::from_embedded(builtin::LEGACY).unwrap();

        assert!(registry
            .validate(&json!({"type": "CALLBACK", "action": "sync"}))
            .is_ok());
        assert!(registry
            .validate(&json!({"type": "STORE_PATH_CHANGE", "path": "/"}))
            .is_ok());
        assert!(!registry.has_schema("STORE_PATH_CHANGED"));
    }

    #[test]
    fn missing_type_is_reported() {
        let registry = EnvelopeRegistry::new();
        assert!(matches!(
            registry.validate(&json!({"path": "/"})),
            Err(SchemaError::MissingType)
        ));
        assert!(matches!(
            registry.validate(&json!({"type": 7})),
            Err(SchemaError::MissingType)
        ));
    }

    #[test]
    fn missing_schema_permissive_passes() {
        let registry = EnvelopeRegistry::new();
        assert!(registry.validate(&json!({"type": "ANYTHING"})).is_ok());
    }

    #[test]
    fn missing_schema_strict_fails() {
        let registry = EnvelopeRegistry::with_config(RegistryConfig {
            fail_on_missing_schema: true,
            ..RegistryConfig::default()
        });

        assert!(matches!(
            registry.validate(&json!({"type": "ANYTHING"})),
            Err(SchemaError::NoSchema(t)) if t == "ANYTHING"
        ));
    }

    #[test]
    fn strict_mode_rejects_additional_properties() {
        let strict_config = RegistryConfig {
            strict_mode: true,
            ..RegistryConfig::default()
        };
        let permissive = EnvelopeRegistry::from_embedded(builtin::V1).unwrap();
        let strict = EnvelopeRegistry::from_embedded_with_config(builtin::V1, strict_config)
            .unwrap();

        let envelope = json!({"type": "STORE_PATH_CHANGED", "path": "/", "extra": true});
        assert!(permissive.validate(&envelope).is_ok());
        assert!(matches!(
            strict.validate(&envelope),
            Err(SchemaError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn strict_mode_applies_nested_and_untyped_objects() {
        let schema = r#"{
            "properties": {
                "type": { "const": "NESTED" },
                "inner": {
                    "type": "object",
                    "properties": { "v": { "type": "integer" } }
                }
            }
        }"#;
        let mut strict = EnvelopeRegistry::with_config(RegistryConfig {
            strict_mode: true,
            ..RegistryConfig::default()
        });
        strict.register("NESTED", schema).unwrap();

        assert!(strict
            .validate(&json!({"type": "NESTED", "inner": {"v": 1}}))
            .is_ok());
        assert!(strict
            .validate(&json!({"type": "NESTED", "inner": {"v": 1, "w": 2}}))
            .is_err());
        assert!(strict.validate(&json!({"type": "NESTED", "w": 2})).is_err());
    }

    #[test]
    fn invalid_json_fails() {
        let registry = EnvelopeRegistry::new();
        assert!(matches!(
            registry.validate_slice(b"not-json"),
            Err(SchemaError::InvalidJson(_))
        ));
    }

    #[test]
    fn invalid_schema_fails_compile() {
        let mut registry = EnvelopeRegistry::new();
        assert!(matches!(
            registry.register("PING", r#"{"type":"definitely-not-a-type"}"#),
            Err(SchemaError::CompileFailed { .. })
        ));
    }

    #[test]
    fn from_directory_maps_file_names_to_types() {
        let dir = make_temp_schema_dir("from-directory");
        write_schema(&dir, "ping.schema.json", PING_SCHEMA);
        write_schema(&dir, "notes.json", PING_SCHEMA);

        let registry = EnvelopeRegistry::from_directory(&dir).unwrap();
        assert_eq!(registry.envelope_types(), vec!["PING"]);
        assert!(registry
            .validate_slice(br#"{"type":"PING","seq":3}"#)
            .is_ok());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unrecognized_schema_file_name_errors() {
        let dir = make_temp_schema_dir("bad-name");
        write_schema(&dir, "Ping-Event.schema.json", PING_SCHEMA);

        assert!(matches!(
            EnvelopeRegistry::from_directory(&dir),
            Err(SchemaError::LoadFailed(_))
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn directory_limits_are_enforced() {
        let dir = make_temp_schema_dir("limits");
        write_schema(&dir, "ping.schema.json", PING_SCHEMA);
        write_schema(&dir, "pong.schema.json", PING_SCHEMA);

        let too_many = EnvelopeRegistry::from_directory_with_config(
            &dir,
            RegistryConfig {
                max_schemas_from_directory: 1,
                ..RegistryConfig::default()
            },
        );
        assert!(matches!(too_many, Err(SchemaError::LoadFailed(_))));

        let too_big = EnvelopeRegistry::from_directory_with_config(
            &dir,
            RegistryConfig {
                max_schema_file_size: 8,
                ..RegistryConfig::default()
            },
        );
        assert!(matches!(too_big, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_schema_is_rejected() {
        let dir = make_temp_schema_dir("symlink");
        let target = dir.join("target.json");
        std::fs::write(&target, PING_SCHEMA).unwrap();
        std::os::unix::fs::symlink(&target, dir.join("ping.schema.json")).unwrap();

        assert!(matches!(
            EnvelopeRegistry::from_directory(&dir),
            Err(SchemaError::LoadFailed(_))
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_name_parser() {
        assert_eq!(
            type_from_file_name("store_path_changed.schema.json").as_deref(),
            Some("STORE_PATH_CHANGED")
        );
        assert_eq!(type_from_file_name(".schema.json"), None);
        assert_eq!(type_from_file_name("Callback.schema.json"), None);
        assert_eq!(type_from_file_name("callback.json"), None);
    }

    fn make_temp_schema_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "embedlink-schema-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_schema(dir: &Path, file_name: &str, contents: &str) {
        std::fs::write(dir.join(file_name), contents.as_bytes()).unwrap();
    }
}
