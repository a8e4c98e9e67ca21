//
//  quayctl
//  output/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Output Module
//!
//! Rendering of command results for the terminal or for scripts:
//!
//! - **Table format**: human-readable output, coloured when the terminal allows
//! - **JSON format**: pretty-printed `serde_json`, selected with `--json`
//!
//! Status messages (success, warnings, errors) always go through the same
//! [`OutputWriter`], so scripts reading stdout only ever see data.
//!
//! ## Example
//!
//! ```rust,no_run
//! use quayctl::api::ChangeOutcome;
//! use quayctl::output::{OutputFormat, OutputWriter};
//!
//! let writer = OutputWriter::new(OutputFormat::Json);
//! writer.write_outcome("organization acme", &ChangeOutcome::unchanged(), &[])?;
//! # Ok::<(), anyhow::Error>(())
//! ```

mod table;

pub use table::*;

use serde::Serialize;
use serde_json::{json, Value};

use crate::api::common::ChangeOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Writes data to stdout and status messages to stderr in one format.
///
/// Colour is detected from the terminal and disabled when output is piped
/// or `NO_COLOR` is set.
pub struct OutputWriter {
    format: OutputFormat,
    color: bool,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            color: console::colors_enabled(),
        }
    }

    pub fn json() -> Self {
        Self::new(OutputFormat::Json)
    }

    pub fn table() -> Self {
        Self::new(OutputFormat::Table)
    }

    pub fn color_enabled(&self) -> bool {
        self.color
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Prints any serializable value as pretty JSON.
    pub fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Reports the result of a reconciliation.
    ///
    /// JSON output is `{"changed": .., "data": .., "warnings": [..]}`; table
    /// output is one status line plus the returned data, if any.
    pub fn write_outcome(
        &self,
        subject: &str,
        outcome: &ChangeOutcome,
        warnings: &[String],
    ) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => {
                let mut report = serde_json::to_value(outcome)?;
                if let Value::Object(map) = &mut report {
                    map.insert("warnings".into(), json!(warnings));
                }
                self.write_json(&report)
            }
            OutputFormat::Table => {
                for warning in warnings {
                    self.write_warning(warning);
                }
                println!("{}: {}", subject, format_changed(outcome.changed, self.color));
                if let Some(data) = &outcome.data {
                    println!("{}", serde_json::to_string_pretty(data)?);
                }
                Ok(())
            }
        }
    }

    /// Prints a list of JSON objects, as a table of `columns` or as a JSON array.
    pub fn write_rows(&self, columns: &[&str], rows: &[Value]) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => self.write_json(rows),
            OutputFormat::Table => {
                if rows.is_empty() {
                    self.write_info("No results");
                    return Ok(());
                }
                TableBuilder::new()
                    .color(self.color)
                    .headers(columns.iter().copied())
                    .rows(
                        rows.iter()
                            .map(|row| columns.iter().map(move |c| cell_text(row.get(*c)))),
                    )
                    .print();
                Ok(())
            }
        }
    }

    /// Prints a single JSON value, pretty in both formats.
    pub fn write_value(&self, value: &Value) -> anyhow::Result<()> {
        match (self.format, value) {
            (OutputFormat::Table, Value::String(s)) => {
                println!("{s}");
                Ok(())
            }
            _ => self.write_json(value),
        }
    }

    pub fn write_warning(&self, msg: &str) {
        use console::style;
        if self.color {
            eprintln!("{} {}", style("warning:").yellow().bold(), msg);
        } else {
            eprintln!("warning: {}", msg);
        }
    }

    pub fn write_info(&self, msg: &str) {
        println!("{}", msg);
    }

    pub fn write_success(&self, msg: &str) {
        use console::style;
        if self.color {
            println!("{} {}", style("✓").green().bold(), msg);
        } else {
            println!("✓ {}", msg);
        }
    }
}

/// Prints `key: value`, with the key dimmed when colour is enabled.
pub fn print_field(key: &str, value: &str, color: bool) {
    use console::style;
    if color {
        println!("{}: {}", style(key).dim(), value);
    } else {
        println!("{}: {}", key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format_is_table() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
        assert_eq!(OutputWriter::json().format(), OutputFormat::Json);
    }

    #[test]
    fn test_outcome_report_in_both_formats() {
        let outcome = ChangeOutcome::changed(Some(json!({"name": "acme"})));
        let warnings = vec!["check the password".to_string()];
        OutputWriter::json()
            .write_outcome("organization acme", &outcome, &warnings)
            .unwrap();
        OutputWriter::table()
            .write_outcome("organization acme", &outcome, &warnings)
            .unwrap();
    }

    #[test]
    fn test_rows_in_both_formats() {
        let rows = vec![json!({"name": "v1", "manifest_digest": "sha256:aaa"})];
        OutputWriter::table().write_rows(&["name", "manifest_digest"], &rows).unwrap();
        OutputWriter::json().write_rows(&["name"], &rows).unwrap();
        OutputWriter::table().write_rows(&["name"], &[]).unwrap();
    }
}
