//! Stimulus input: one row per simulation step, whitespace-separated values,
//! one column per neuron of the first layer.

use crate::xml::format_number;
use crate::{IrError, Result};

/// Parse stimulus text. Blank lines are skipped.
pub fn parse_rows(text: &str) -> Result<Vec<Vec<f64>>> {
    let mut rows = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|tok| {
                tok.parse::<f64>().map_err(|_| IrError::Stimulus {
                    line: i + 1,
                    reason: format!("'{}' is not a number", tok),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push(row);
    }
    Ok(rows)
}

/// Render rows in the engine's input format
pub fn render_rows(rows: &[Vec<f64>]) -> String {
    let mut out = String::new();
    for row in rows {
        let line = row.iter().map(|v| format_number(*v)).collect::<Vec<_>>().join(" ");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_render() {
        let rows = parse_rows("0 1.5\n\n  2e-10\t3\n").unwrap();
        assert_eq!(rows, vec![vec![0.0, 1.5], vec![2e-10, 3.0]]);
        assert_eq!(render_rows(&rows), "0 1.5\n2e-10 3\n");
    }

    #[test]
    fn bad_token_reports_line() {
        let err = parse_rows("1\nx\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
