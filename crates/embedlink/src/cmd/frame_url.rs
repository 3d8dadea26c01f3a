use embedlink_bridge::{build_frame_url, BridgeConfig, UnsafeParams};
use serde::Serialize;

use crate::cmd::{merge_pairs, parse_object, FrameUrlArgs, SCHEMA_BASE};
use crate::exit::{bridge_error, CliResult, SUCCESS};
use crate::output::{emit, OutputFormat};

#[derive(Serialize)]
struct FrameUrlOutput {
    schema_id: String,
    url: String,
    origin: String,
    protocol: &'static str,
}

pub fn run(args: FrameUrlArgs, format: OutputFormat) -> CliResult<i32> {
    let config = build_config(args)?;
    let url = build_frame_url(&config).map_err(|err| bridge_error("frame url failed", err))?;

    let output = FrameUrlOutput {
        schema_id: format!("{SCHEMA_BASE}/frame-url.schema.json"),
        origin: url.origin().ascii_serialization(),
        url: url.into(),
        protocol: config.protocol.as_str(),
    };
    let rows = [
        ("url", output.url.clone()),
        ("origin", output.origin.clone()),
        ("protocol", output.protocol.to_string()),
    ];
    emit(&output, &rows, &output.url, format)?;
    Ok(SUCCESS)
}

fn build_config(args: FrameUrlArgs) -> CliResult<BridgeConfig> {
    let mut params: UnsafeParams = match &args.params {
        Some(json) => parse_object("params", json)?,
        None => UnsafeParams::new(),
    };
    merge_pairs("param", &args.param, &mut params)?;

    let mut config = BridgeConfig::new(args.target_url)
        .with_unsafe_params(params)
        .with_protocol(args.protocol);
    if let Some(origin) = args.parent_origin {
        config = config.with_parent_origin(origin);
    }
    if let Some(token) = args.token {
        config = config.with_token(token);
    }
    if let Some(session_id) = args.session_id {
        config = config.with_session_id(session_id);
    }
    if let Some(page) = args.page {
        config = config.with_page(page);
    }
    if let Some(listing_id) = args.listing_id {
        config = config.with_listing_id(listing_id);
    }
    Ok(config)
}
