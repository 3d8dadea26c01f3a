use embedlink_token::{Clock, CodecConfig, FixedClock, Payload, SigningContext, SystemClock, TokenCodec};
use serde::Serialize;

use crate::cmd::{merge_pairs, parse_nonzero_duration, parse_object, MintArgs, SCHEMA_BASE};
use crate::exit::{token_error, CliResult, SUCCESS};
use crate::output::{emit, OutputFormat};

#[derive(Serialize)]
struct MintOutput {
    schema_id: String,
    link: String,
    issued_at: u64,
    expires_at: u64,
}

pub fn run(args: MintArgs, format: OutputFormat) -> CliResult<i32> {
    let validity = parse_nonzero_duration(&args.secret.validity)?;
    let payload = resolve_payload(&args)?;

    // Minting and the read-back below share one instant.
    let now = FixedClock(SystemClock.now());
    let codec = TokenCodec::new(args.secret.secret)
        .with_clock(now)
        .with_config(CodecConfig {
            validity,
            token_param: args.secret.token_param,
            ..CodecConfig::default()
        });

    // The CLI is a backend process by definition.
    let link = codec
        .create_link(&args.base_url, &payload, &SigningContext::server())
        .map_err(|err| token_error("mint failed", err))?;
    let token = codec
        .extract_token(&link)
        .map_err(|err| token_error("mint failed", err))?;
    let minted = codec
        .verify_claims(&token)
        .map_err(|err| token_error("minted token did not verify", err))?;

    tracing::debug!(
        keys = payload.len(),
        expires_at = minted.expires_at,
        "minted magic link"
    );

    let output = MintOutput {
        schema_id: format!("{SCHEMA_BASE}/magic-link.schema.json"),
        link,
        issued_at: minted.issued_at,
        expires_at: minted.expires_at,
    };
    let rows = [
        ("link", output.link.clone()),
        ("issued_at", output.issued_at.to_string()),
        ("expires_at", output.expires_at.to_string()),
    ];
    emit(&output, &rows, &output.link, format)?;
    Ok(SUCCESS)
}

fn resolve_payload(args: &MintArgs) -> CliResult<Payload> {
    let mut payload = match &args.payload {
        Some(json) => parse_object("payload", json)?,
        None => Payload::new(),
    };
    merge_pairs("claim", &args.claims, &mut payload)?;
    Ok(payload)
}
