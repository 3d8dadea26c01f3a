use embedlink_token::{CodecConfig, Payload, TokenCodec};
use serde::Serialize;

use crate::cmd::{parse_duration, parse_nonzero_duration, VerifyArgs, SCHEMA_BASE};
use crate::exit::{token_error, CliResult, SUCCESS};
use crate::output::{emit, value_preview, OutputFormat};

#[derive(Serialize)]
struct VerifyOutput {
    schema_id: String,
    valid: bool,
    issued_at: u64,
    expires_at: u64,
    payload: Payload,
}

pub fn run(args: VerifyArgs, format: OutputFormat) -> CliResult<i32> {
    let validity = parse_nonzero_duration(&args.secret.validity)?;
    let clock_tolerance = parse_duration(&args.tolerance)?;

    let codec = TokenCodec::new(args.secret.secret).with_config(CodecConfig {
        validity,
        clock_tolerance,
        token_param: args.secret.token_param,
    });

    let token = codec
        .extract_token(&args.input)
        .map_err(|err| token_error("verify failed", err))?;
    let verified = codec.verify_claims(&token).map_err(|err| {
        tracing::debug!(kind = ?err.kind(), "magic link rejected");
        token_error("verify failed", err)
    })?;

    let output = VerifyOutput {
        schema_id: format!("{SCHEMA_BASE}/verified-token.schema.json"),
        valid: true,
        issued_at: verified.issued_at,
        expires_at: verified.expires_at,
        payload: verified.payload,
    };

    let mut rows = vec![
        ("issued_at", output.issued_at.to_string()),
        ("expires_at", output.expires_at.to_string()),
    ];
    rows.extend(
        output
            .payload
            .iter()
            .map(|(key, value)| (key.as_str(), value_preview(value))),
    );
    let raw = serde_json::to_string(&output.payload).unwrap_or_else(|_| "{}".to_string());
    emit(&output, &rows, &raw, format)?;
    Ok(SUCCESS)
}
