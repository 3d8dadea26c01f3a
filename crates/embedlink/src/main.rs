mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "embedlink", version, about = "Magic links and embedded store tooling")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr). `RUST_LOG` overrides it.
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::SessionCommand;

    #[test]
    fn parses_mint_subcommand() {
        let cli = Cli::try_parse_from([
            "embedlink",
            "mint",
            "--secret",
            "hunter2",
            "--claim",
            "userId=17",
            "--base-url",
            "https://demo.integrations.store",
        ])
        .expect("mint args should parse");

        assert!(matches!(cli.command, Command::Mint(_)));
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "embedlink",
            "mint",
            "--secret",
            "s",
            "--payload",
            "{\"x\":1}",
            "--claim",
            "x=1",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_protocol_version() {
        let cli = Cli::try_parse_from([
            "embedlink",
            "frame-url",
            "https://store.example/",
            "--protocol",
            "legacy",
        ])
        .expect("frame-url args should parse");
        match cli.command {
            Command::FrameUrl(args) => {
                assert_eq!(args.protocol, embedlink_bridge::ProtocolVersion::Legacy)
            }
            other => panic!("unexpected command {other:?}"),
        }

        let err = Cli::try_parse_from([
            "embedlink",
            "frame-url",
            "https://store.example/",
            "--protocol",
            "v2",
        ])
        .expect_err("unknown protocol should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_nested_session_subcommand() {
        let cli = Cli::try_parse_from([
            "embedlink",
            "session",
            "revoke",
            "sess-1",
            "--api-key",
            "k",
            "--dry-run",
        ])
        .expect("session args should parse");
        assert!(matches!(
            cli.command,
            Command::Session(SessionCommand::Revoke(ref args)) if args.session_id == "sess-1" && args.api.dry_run
        ));
    }
}
