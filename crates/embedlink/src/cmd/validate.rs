use embedlink_bridge::ProtocolVersion;
use embedlink_schema::{builtin, envelope_type, EnvelopeRegistry, RegistryConfig};
use serde::Serialize;

use crate::cmd::{read_json, ValidateArgs, SCHEMA_BASE};
use crate::exit::{schema_error, CliResult, SUCCESS};
use crate::output::{emit, OutputFormat};

#[derive(Serialize)]
struct ValidateOutput {
    schema_id: String,
    envelope_type: String,
    protocol: &'static str,
    valid: bool,
}

pub fn run(args: ValidateArgs, format: OutputFormat) -> CliResult<i32> {
    let envelope = read_json(args.json.as_deref(), args.file.as_ref())?;
    let config = RegistryConfig {
        strict_mode: args.strict,
        fail_on_missing_schema: true,
        ..RegistryConfig::default()
    };

    let registry = match &args.schema_dir {
        Some(dir) => EnvelopeRegistry::from_directory_with_config(dir, config),
        None => EnvelopeRegistry::from_embedded_with_config(bundled(args.protocol), config),
    }
    .map_err(|err| schema_error("schema load failed", err))?;

    registry
        .validate(&envelope)
        .map_err(|err| schema_error("envelope rejected", err))?;

    let output = ValidateOutput {
        schema_id: format!("{SCHEMA_BASE}/envelope-validation.schema.json"),
        envelope_type: envelope_type(&envelope).unwrap_or_default().to_string(),
        protocol: args.protocol.as_str(),
        valid: true,
    };
    let rows = [
        ("type", output.envelope_type.clone()),
        ("protocol", output.protocol.to_string()),
        ("valid", "true".to_string()),
    ];
    emit(&output, &rows, "valid", format)?;
    Ok(SUCCESS)
}

fn bundled(protocol: ProtocolVersion) -> &'static [(&'static str, &'static str)] {
    match protocol {
        ProtocolVersion::V1 => builtin::V1,
        ProtocolVersion::Legacy => builtin::LEGACY,
    }
}
