use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use embedlink_bridge::ProtocolVersion;
use embedlink_session::DEFAULT_API_URL;
use embedlink_token::{Payload, DEFAULT_EMBED_URL, DEFAULT_TOKEN_PARAM};
use serde_json::Value;

use crate::exit::{io_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod envinfo;
pub mod frame_url;
pub mod mint;
pub mod session;
pub mod validate;
pub mod verify;
pub mod version;

pub const SCHEMA_BASE: &str = "https://schemas.integrations-captain.com/embedlink/cli/v1";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign a payload and print a magic link.
    Mint(MintArgs),
    /// Verify a magic link or bare token and print its payload.
    Verify(VerifyArgs),
    /// Build the initial iframe URL for an embedded store.
    FrameUrl(FrameUrlArgs),
    /// Validate a store envelope against the bundled schemas.
    Validate(ValidateArgs),
    /// Create, update or revoke a store session.
    #[command(subcommand)]
    Session(SessionCommand),
    /// Show version information.
    Version(VersionArgs),
    /// Print build and environment diagnostics.
    Envinfo(EnvinfoArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Mint(args) => mint::run(args, format),
        Command::Verify(args) => verify::run(args, format),
        Command::FrameUrl(args) => frame_url::run(args, format),
        Command::Validate(args) => validate::run(args, format),
        Command::Session(command) => session::run(command, format),
        Command::Version(args) => version::run(args),
        Command::Envinfo(args) => envinfo::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct SecretArgs {
    /// HMAC signing secret.
    #[arg(long, env = "EMBEDLINK_SECRET", hide_env_values = true)]
    pub secret: String,
    /// Query parameter carrying the token.
    #[arg(long, default_value = DEFAULT_TOKEN_PARAM)]
    pub token_param: String,
    /// Token validity window (e.g. 1h, 15m, 90s).
    #[arg(long, default_value = "1h")]
    pub validity: String,
}

#[derive(Args, Debug)]
pub struct MintArgs {
    #[command(flatten)]
    pub secret: SecretArgs,
    /// Store embed page the token is appended to.
    #[arg(long, env = "STORE_EMBED_LINK", default_value = DEFAULT_EMBED_URL)]
    pub base_url: String,
    /// Payload as a JSON object.
    #[arg(long, conflicts_with = "claims")]
    pub payload: Option<String>,
    /// Payload entry as KEY=VALUE; VALUE is parsed as JSON when it can be.
    #[arg(long = "claim", value_name = "KEY=VALUE")]
    pub claims: Vec<String>,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub secret: SecretArgs,
    /// Magic link URL or bare token.
    pub input: String,
    /// Allowed clock skew (e.g. 30s).
    #[arg(long, default_value = "0s")]
    pub tolerance: String,
}

#[derive(Args, Debug)]
pub struct FrameUrlArgs {
    /// Store URL the iframe loads.
    pub target_url: String,
    /// Origin of the embedding page, sent as `parentDomain`.
    #[arg(long)]
    pub parent_origin: Option<String>,
    /// Magic link token.
    #[arg(long)]
    pub token: Option<String>,
    /// Existing store session id.
    #[arg(long)]
    pub session_id: Option<String>,
    /// Store page to open.
    #[arg(long)]
    pub page: Option<String>,
    /// Listing to open.
    #[arg(long)]
    pub listing_id: Option<String>,
    /// Unsafe params as a JSON object.
    #[arg(long)]
    pub params: Option<String>,
    /// Unsafe param as KEY=VALUE; VALUE is parsed as JSON when it can be.
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub param: Vec<String>,
    /// Protocol version the store speaks (v1 or legacy).
    #[arg(long, default_value = "v1")]
    pub protocol: ProtocolVersion,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Envelope JSON.
    #[arg(long, conflicts_with = "file")]
    pub json: Option<String>,
    /// Read the envelope from a file.
    #[arg(long, conflicts_with = "json")]
    pub file: Option<PathBuf>,
    /// Protocol version whose bundled schemas apply (v1 or legacy).
    #[arg(long, default_value = "v1")]
    pub protocol: ProtocolVersion,
    /// Load `<type>.schema.json` files from this directory instead.
    #[arg(long, value_name = "DIR", env = "EMBEDLINK_SCHEMA_DIR")]
    pub schema_dir: Option<PathBuf>,
    /// Reject undeclared envelope fields.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Create a session.
    Create(SessionCreateArgs),
    /// Replace a session's data.
    Update(SessionUpdateArgs),
    /// Revoke a session.
    Revoke(SessionRevokeArgs),
}

#[derive(Args, Debug)]
pub struct SessionApiArgs {
    /// Session API key.
    #[arg(long, env = "EMBEDLINK_API_KEY", hide_env_values = true)]
    pub api_key: String,
    /// Session API root.
    #[arg(long, env = "EMBEDLINK_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
    /// Session resource path below the API root.
    #[arg(long, default_value = "")]
    pub resource_path: String,
    /// Send the key in this header instead of `Authorization: Bearer`.
    #[arg(long, value_name = "NAME")]
    pub auth_header: Option<String>,
    /// Request timeout (e.g. 10s, 500ms).
    #[arg(long, default_value = "10s")]
    pub timeout: String,
    /// Print the planned request without sending it.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct SessionCreateArgs {
    #[command(flatten)]
    pub api: SessionApiArgs,
    #[arg(long)]
    pub store_id: Option<String>,
    #[arg(long)]
    pub domain: Option<String>,
    /// Session data as a JSON object (userId, account, purchases, ...).
    #[arg(long, default_value = "{}")]
    pub data: String,
}

#[derive(Args, Debug)]
pub struct SessionUpdateArgs {
    #[command(flatten)]
    pub api: SessionApiArgs,
    pub session_id: String,
    /// Session data as a JSON object.
    #[arg(long, default_value = "{}")]
    pub data: String,
    /// Use PUT instead of PATCH.
    #[arg(long)]
    pub put: bool,
}

#[derive(Args, Debug)]
pub struct SessionRevokeArgs {
    #[command(flatten)]
    pub api: SessionApiArgs,
    pub session_id: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct EnvinfoArgs {}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, scale_ms) = if let Some(num) = input.strip_suffix("ms") {
        (num, 1)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, 1_000)
    } else if let Some(num) = input.strip_suffix('m') {
        (num, 60_000)
    } else if let Some(num) = input.strip_suffix('h') {
        (num, 3_600_000)
    } else {
        (input, 1_000)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    value
        .checked_mul(scale_ms)
        .map(Duration::from_millis)
        .ok_or_else(|| CliError::new(USAGE, format!("duration out of range: {input}")))
}

/// Like [`parse_duration`], but zero is rejected.
pub fn parse_nonzero_duration(input: &str) -> CliResult<Duration> {
    let duration = parse_duration(input)?;
    if duration.is_zero() {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }
    Ok(duration)
}

/// Parse `--flag '{...}'` as a JSON object.
pub fn parse_object(flag: &str, input: &str) -> CliResult<Payload> {
    match serde_json::from_str::<Value>(input) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CliError::new(USAGE, format!("--{flag} must be a JSON object"))),
        Err(err) => Err(CliError::new(
            USAGE,
            format!("--{flag} is not valid JSON: {err}"),
        )),
    }
}

/// Fold `KEY=VALUE` pairs into `map`. Later pairs win.
pub fn merge_pairs(flag: &str, pairs: &[String], map: &mut Payload) -> CliResult<()> {
    for pair in pairs {
        let (key, raw) = pair.split_once('=').ok_or_else(|| {
            CliError::new(USAGE, format!("--{flag} expects KEY=VALUE, got '{pair}'"))
        })?;
        if key.is_empty() {
            return Err(CliError::new(USAGE, format!("--{flag} key must not be empty")));
        }
        let value =
            serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        map.insert(key.to_string(), value);
    }
    Ok(())
}

/// Read a JSON document from `--json` or `--file`.
pub fn read_json(json: Option<&str>, file: Option<&PathBuf>) -> CliResult<Value> {
    let text = match (json, file) {
        (Some(json), _) => json.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?,
        (None, None) => return Err(CliError::new(USAGE, "one of --json or --file is required")),
    };
    serde_json::from_str(&text)
        .map_err(|err| CliError::new(USAGE, format!("input is not valid JSON: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
        assert_eq!(parse_duration("0s").unwrap(), Duration::ZERO);
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_nonzero_duration("0s").is_err());
    }

    #[test]
    fn pairs_parse_json_values_and_fall_back_to_strings() {
        let mut map = Payload::new();
        merge_pairs(
            "claim",
            &["userId=17".into(), "name=Ada".into(), "tags=[\"a\"]".into()],
            &mut map,
        )
        .unwrap();
        assert_eq!(Value::Object(map), json!({"userId": 17, "name": "Ada", "tags": ["a"]}));
    }

    #[test]
    fn pairs_without_equals_are_usage_errors() {
        let err = merge_pairs("claim", &["nope".into()], &mut Payload::new()).unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn object_flag_rejects_non_objects() {
        assert!(parse_object("payload", "[1]").is_err());
        assert!(parse_object("payload", "{").is_err());
        assert_eq!(parse_object("payload", r#"{"a":1}"#).unwrap().len(), 1);
    }
}
