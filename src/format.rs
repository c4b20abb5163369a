//! Plain-text rendering of result sets.

use crate::db::{ResultSet, Value};

const SEPARATOR: &str = " | ";

/// Printed when a statement returns no column descriptor.
pub const COMMAND_OK: &str = "Command executed successfully.";

/// Renders a result set as newline-terminated text.
///
/// Layout: header row, dash underline, one line per row, then a row count
/// footer. Statements without a column descriptor render as [`COMMAND_OK`].
pub fn render(result: &ResultSet) -> String {
    let Some(columns) = &result.columns else {
        return format!("{COMMAND_OK}\n");
    };

    let mut out = String::new();
    out.push_str(&columns.join(SEPARATOR));
    out.push('\n');
    out.push_str(&"-".repeat(underline_width(columns)));
    out.push('\n');

    if result.row_count() == 0 {
        out.push_str("(0 rows returned)\n");
        return out;
    }

    for row in &result.rows {
        let cells: Vec<String> = row.iter().map(Value::to_display_string).collect();
        out.push_str(&cells.join(SEPARATOR));
        out.push('\n');
    }
    out.push_str(&format!("\n({} row(s) returned)\n", result.row_count()));
    out
}

/// Width of the dash line: header text plus separator padding on every
/// column, less the trailing space.
fn underline_width(columns: &[String]) -> usize {
    let text: usize = columns.iter().map(|c| c.chars().count()).sum();
    (text + columns.len() * SEPARATOR.len()).saturating_sub(1)
}
