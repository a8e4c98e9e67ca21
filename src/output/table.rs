//
//  quayctl
//  output/table.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Table Output Formatting
//!
//! Terminal tables built on `comfy_table`, plus the cell formatters used by
//! the tag listing and change reports.
//!
//! ## Example
//!
//! ```rust,no_run
//! use quayctl::output::TableBuilder;
//!
//! TableBuilder::new()
//!     .headers(["Tag", "Digest", "Last modified"])
//!     .row(["latest", "sha256:9ce9", "Tue, 13 Jan 2026 10:00:00 -0000"])
//!     .print();
//! ```

use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use serde_json::Value;

/// A table with the UTF-8 preset and dynamic column widths.
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Fluent builder for terminal tables.
///
/// Colour support is detected from the terminal on creation; use
/// [`color`](TableBuilder::color) to override it.
pub struct TableBuilder {
    table: Table,
    color: bool,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self {
            table: create_table(),
            color: console::colors_enabled(),
        }
    }

    pub fn color(mut self, enabled: bool) -> Self {
        self.color = enabled;
        self
    }

    /// Sets the header row, cyan when colour is enabled.
    pub fn headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        if self.color {
            let cells: Vec<Cell> = headers.iter().map(|h| Cell::new(h).fg(Color::Cyan)).collect();
            self.table.set_header(cells);
        } else {
            self.table.set_header(headers);
        }
        self
    }

    pub fn row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row: Vec<String> = cells.into_iter().map(Into::into).collect();
        self.table.add_row(row);
        self
    }

    pub fn rows<I, R, S>(mut self, rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for row in rows {
            self = self.row(row);
        }
        self
    }

    pub fn print(self) {
        println!("{}", self.table);
    }

    pub fn build(self) -> Table {
        self.table
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `changed` in yellow, `ok` in green.
pub fn format_changed(changed: bool, color: bool) -> String {
    let label = if changed { "changed" } else { "ok" };
    if !color {
        return label.to_string();
    }

    use console::style;
    if changed {
        style(label).yellow().to_string()
    } else {
        style(label).green().to_string()
    }
}

/// Renders a JSON field as a table cell: strings unquoted, null as empty.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(Some(&json!("v1"))), "v1");
        assert_eq!(cell_text(Some(&json!(42))), "42");
        assert_eq!(cell_text(Some(&Value::Null)), "");
        assert_eq!(cell_text(None), "");
    }

    #[test]
    fn test_plain_formatters() {
        assert_eq!(format_changed(true, false), "changed");
        assert_eq!(format_changed(false, false), "ok");
    }

    #[test]
    fn test_builder_renders_rows() {
        let table = TableBuilder::new()
            .color(false)
            .headers(["Tag", "Digest"])
            .rows(vec![vec!["v1", "sha256:aaa"], vec!["v2", "sha256:bbb"]])
            .build();
        let rendered = table.to_string();
        assert!(rendered.contains("Tag"));
        assert!(rendered.contains("sha256:bbb"));
    }
}
