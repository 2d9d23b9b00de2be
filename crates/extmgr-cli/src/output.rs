//! Rendering of extension lists, check reports and load statuses.

use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Print table rows, or `empty` when there are none.
pub fn print_rows<T: Serialize + Tabled>(rows: &[T], format: OutputFormat, empty: &str) {
    match format {
        OutputFormat::Table if rows.is_empty() => println!("{empty}"),
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Json => print_json(rows, "[]"),
    }
}

/// Print loader records.
///
/// JSON output serializes the records themselves so scripts see every field.
/// Table output goes through `row`, which picks the columns worth a glance.
pub fn print_records<R, T, F>(records: &[R], format: OutputFormat, empty: &str, row: F)
where
    R: Serialize,
    T: Tabled,
    F: Fn(&R) -> T,
{
    match format {
        OutputFormat::Table if records.is_empty() => println!("{empty}"),
        OutputFormat::Table => println!("{}", Table::new(records.iter().map(row))),
        OutputFormat::Json => print_json(records, "[]"),
    }
}

/// Print a single serializable item in the selected format
pub fn print_item<T: Serialize + std::fmt::Debug>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => println!("{item:#?}"),
        OutputFormat::Json => print_json(item, "{}"),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T, fallback: &str) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|_| fallback.to_string());
    println!("{json}");
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {msg}");
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {msg}");
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {}", format!("{key}:"), value);
}

/// "1 extension", "3 extensions"
pub fn extension_count(count: usize) -> String {
    match count {
        1 => "1 extension".to_string(),
        n => format!("{n} extensions"),
    }
}

/// Render an optional value for a table cell
pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

/// Render a name list for a table cell
pub fn joined_or_dash(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(Some("sample")), "sample");
        assert_eq!(or_dash(None), "-");
    }

    #[test]
    fn test_joined_or_dash() {
        assert_eq!(joined_or_dash(&[]), "-");
        assert_eq!(
            joined_or_dash(&["dict_base".to_string(), "util".to_string()]),
            "dict_base, util"
        );
    }

    #[test]
    fn test_extension_count_pluralizes() {
        assert_eq!(extension_count(0), "0 extensions");
        assert_eq!(extension_count(1), "1 extension");
        assert_eq!(extension_count(4), "4 extensions");
    }

    #[test]
    fn test_default_format_is_table() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }
}
