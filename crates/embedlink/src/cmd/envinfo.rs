use std::collections::BTreeMap;

use serde::Serialize;

use crate::cmd::{EnvinfoArgs, SCHEMA_BASE};
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

/// Variables the CLI reads. Secrets are reported as set or unset only.
const ENV_VARS: [(&str, bool); 6] = [
    ("EMBEDLINK_SECRET", true),
    ("EMBEDLINK_API_KEY", true),
    ("EMBEDLINK_API_URL", false),
    ("EMBEDLINK_SCHEMA_DIR", false),
    ("STORE_EMBED_LINK", false),
    ("RUST_LOG", false),
];

#[derive(Serialize)]
struct PlatformInfo {
    os: String,
    arch: String,
}

#[derive(Serialize)]
struct EnvInfoOutput {
    schema_id: String,
    version: String,
    target: String,
    rust_version: String,
    git_hash: String,
    platform: PlatformInfo,
    features: Vec<String>,
    dependencies: BTreeMap<String, String>,
    environment: BTreeMap<String, Option<String>>,
}

pub fn run(_args: EnvinfoArgs, format: OutputFormat) -> CliResult<i32> {
    let mut deps = BTreeMap::new();
    deps.insert("clap".to_string(), "4.5".to_string());
    deps.insert("hmac".to_string(), "0.12".to_string());
    deps.insert("jsonschema".to_string(), "0.41".to_string());
    deps.insert("reqwest".to_string(), "0.12".to_string());

    let output = EnvInfoOutput {
        schema_id: format!("{SCHEMA_BASE}/envinfo.schema.json"),
        version: env!("CARGO_PKG_VERSION").to_string(),
        target: target_triple(),
        rust_version: option_env!("RUSTC_VERSION")
            .unwrap_or("unknown")
            .to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        platform: PlatformInfo {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        },
        features: active_features(),
        dependencies: deps,
        environment: environment(|name| std::env::var(name).ok()),
    };

    print_envinfo(&output, format);
    Ok(SUCCESS)
}

fn environment(lookup: impl Fn(&str) -> Option<String>) -> BTreeMap<String, Option<String>> {
    ENV_VARS
        .iter()
        .map(|(name, secret)| {
            let value = lookup(name).map(|value| {
                if *secret {
                    format!("<redacted:{} bytes>", value.len())
                } else {
                    value
                }
            });
            (name.to_string(), value)
        })
        .collect()
}

fn target_triple() -> String {
    if let Some(target) = option_env!("EMBEDLINK_BUILD_TARGET") {
        return target.to_string();
    }

    match (std::env::consts::ARCH, std::env::consts::OS) {
        ("aarch64", "macos") => "aarch64-apple-darwin".to_string(),
        ("x86_64", "macos") => "x86_64-apple-darwin".to_string(),
        ("aarch64", "linux") => "aarch64-unknown-linux-gnu".to_string(),
        ("x86_64", "linux") => "x86_64-unknown-linux-gnu".to_string(),
        ("x86_64", "windows") => "x86_64-pc-windows-msvc".to_string(),
        (arch, os) => format!("{arch}-unknown-{os}"),
    }
}

fn print_envinfo(output: &EnvInfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("embedlink environment\n");
            println!("  Version:    {}", output.version);
            println!("  Target:     {}", output.target);
            println!("  Rust:       {}", output.rust_version);
            println!("  Git hash:   {}", output.git_hash);
            println!(
                "  Platform:   {} ({})",
                output.platform.os, output.platform.arch
            );
            println!("  Features:   {}", output.features.join(", "));
            println!("\n  Dependencies:");
            for (k, v) in &output.dependencies {
                println!("    {:<12} {}", k, v);
            }
            println!("\n  Environment:");
            for (k, v) in &output.environment {
                println!("    {:<22} {}", k, v.as_deref().unwrap_or("(not set)"));
            }
        }
        OutputFormat::Raw => println!("{}", output.version),
    }
}

fn active_features() -> Vec<String> {
    let mut features = Vec::new();
    if cfg!(feature = "schema") {
        features.push("schema".to_string());
    }
    if cfg!(feature = "session") {
        features.push("session".to_string());
    }
    if cfg!(feature = "cli") {
        features.push("cli".to_string());
    }
    features
}
