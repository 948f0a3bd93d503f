//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders records in the format selected by `--output`. Records are
//! schemaless, so tables are built column by column from the entity's
//! configured columns. Structured formats use serde, plain emits one id
//! per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

use deskly_core::{Notice, NoticeLevel, Pagination, Record};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

const MAX_CELL_WIDTH: usize = 48;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a page of records.
///
/// `table` shows `columns`; the structured formats carry every field.
pub fn render_records(
    format: OutputFormat,
    records: &[&Record],
    columns: &[String],
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(render_table(records, columns)),
        OutputFormat::Json => render_json(&records, false),
        OutputFormat::JsonCompact => render_json(&records, true),
        OutputFormat::Yaml => render_yaml(&records),
        OutputFormat::Plain => Ok(records
            .iter()
            .map(|r| r.id().to_string())
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Render a single record. Table mode shows a two-column field listing.
pub fn render_record(format: OutputFormat, record: &Record) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(render_detail(record)),
        OutputFormat::Json => render_json(record, false),
        OutputFormat::JsonCompact => render_json(record, true),
        OutputFormat::Yaml => render_yaml(record),
        OutputFormat::Plain => Ok(record.id().to_string()),
    }
}

/// Render any serializable value; table mode falls back to pretty JSON.
pub fn render_value<T: serde::Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table | OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(String::new()),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Page indicator for table output, written to stderr.
pub fn print_pagination(pagination: &Pagination, quiet: bool) {
    if quiet {
        return;
    }
    eprintln!("{}", pagination_footer(pagination));
}

fn pagination_footer(pagination: &Pagination) -> String {
    if pagination.total == 0 {
        return "No results".into();
    }
    format!(
        "Page {}/{} · {} total",
        pagination.page, pagination.total_pages, pagination.total
    )
}

/// Print controller notices to stderr. Errors are left to the returned
/// `CliError`, so only successes are shown here.
pub fn print_notices(notices: &[Notice], quiet: bool, color: bool) {
    if quiet {
        return;
    }
    for notice in notices.iter().filter(|n| n.level == NoticeLevel::Success) {
        if color {
            eprintln!("{} {}", "✓".green(), notice.message);
        } else {
            eprintln!("{}", notice.message);
        }
    }
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table(records: &[&Record], columns: &[String]) -> String {
    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| header(c)));
    for record in records {
        builder.push_record(columns.iter().map(|c| cell(record, c)));
    }
    builder.build().with(Style::rounded()).to_string()
}

fn render_detail(record: &Record) -> String {
    let mut builder = Builder::default();
    builder.push_record(["id".to_owned(), record.id().to_string()]);
    for (key, value) in record.fields() {
        builder.push_record([key.clone(), format_value(value, usize::MAX)]);
    }
    builder.build().with(Style::rounded()).to_string()
}

/// `createdAt` → `Created At`.
fn header(column: &str) -> String {
    let leaf = column.rsplit('.').next().unwrap_or(column);
    let mut out = String::with_capacity(leaf.len() + 4);
    for (i, ch) in leaf.chars().enumerate() {
        if i == 0 {
            out.extend(ch.to_uppercase());
        } else if ch.is_uppercase() {
            out.push(' ');
            out.push(ch);
        } else if ch == '_' {
            out.push(' ');
        } else {
            out.push(ch);
        }
    }
    out
}

fn cell(record: &Record, column: &str) -> String {
    if column == "id" {
        return record.id().to_string();
    }
    let mut path = column.split('.');
    let first = path.next().and_then(|key| record.get(key));
    path.fold(first, |value, segment| value.and_then(|v| v.get(segment)))
        .map_or_else(|| "-".to_owned(), |v| format_value(v, MAX_CELL_WIDTH))
}

fn format_value(value: &Value, width: usize) -> String {
    let text = match value {
        Value::Null => return "-".to_owned(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    };
    truncate(&text, width)
}

fn truncate(text: &str, width: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= width {
        return single_line;
    }
    let mut out: String = single_line.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    Ok(if compact {
        serde_json::to_string(data)?
    } else {
        serde_json::to_string_pretty(data)?
    })
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_yaml::to_string(data)?)
}
