use std::io::{self, IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;

use crate::exit::{io_error, CliResult};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

/// Two-column table of `(field, value)` rows.
pub fn print_fields(rows: &[(&str, String)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["FIELD", "VALUE"]);
    for (field, value) in rows {
        table.add_row(vec![field.to_string(), value.clone()]);
    }
    println!("{table}");
}

/// `field=value` pairs on one line.
pub fn print_pretty(rows: &[(&str, String)]) {
    let line: Vec<String> = rows
        .iter()
        .map(|(field, value)| format!("{field}={value}"))
        .collect();
    println!("{}", line.join(" "));
}

pub fn print_raw(text: &str) -> io::Result<()> {
    write_raw(&mut io::stdout().lock(), text)
}

fn write_raw<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    out.write_all(b"\n")?;
    out.flush()
}

/// Compact display form of a JSON value: strings unquoted, the rest as JSON.
pub fn value_preview(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Print one record in `format`. `raw` is the single value `--format raw`
/// writes. A failed raw write (closed stdout) is an error, not a silent
/// success.
pub fn emit<T: Serialize>(
    value: &T,
    rows: &[(&str, String)],
    raw: &str,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => print_fields(rows),
        OutputFormat::Pretty => print_pretty(rows),
        OutputFormat::Raw => print_raw(raw).map_err(|err| io_error("failed to write output", err))?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_preview_unquotes_strings() {
        assert_eq!(value_preview(&json!("abc")), "abc");
        assert_eq!(value_preview(&json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(value_preview(&Value::Null), "");
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn raw_write_appends_newline() {
        let mut out = Vec::new();
        write_raw(&mut out, "https://store.example/?token=t").unwrap();
        assert_eq!(out, b"https://store.example/?token=t\n");
    }

    #[test]
    fn raw_write_reports_closed_stdout() {
        let err = write_raw(&mut ClosedPipe, "link").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

        let cli = io_error("failed to write output", err);
        assert_eq!(cli.code, crate::exit::INTERNAL);
    }
}
