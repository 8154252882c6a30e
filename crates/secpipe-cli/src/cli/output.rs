//! Output formatting: a human table by default, or `--output json`.

use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Render one row (e.g. `companies get`) in the chosen format.
pub fn print_row<T: Serialize>(format: OutputFormat, headers: &[&str], row: Vec<String>, value: &T) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => print_table(headers, vec![row]),
    }
}

/// Render a collection of rows (e.g. `companies list`) in the chosen format.
pub fn print_rows<T: Serialize>(format: OutputFormat, headers: &[&str], rows: Vec<Vec<String>>, values: &[T]) {
    match format {
        OutputFormat::Json => print_json(values),
        OutputFormat::Table => print_table(headers, rows),
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("failed to serialize output: {e}"),
    }
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED).set_content_arrangement(ContentArrangement::Dynamic).set_header(headers);
    for row in rows {
        table.add_row(row);
    }
    println!("{table}");
}
