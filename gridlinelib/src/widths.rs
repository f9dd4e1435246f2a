//! Column width resolution.
//!
//! All bands share one width vector, so the resolver walks every prepared row
//! (header, body and footer alike) once and keeps the widest measured line per
//! column. Explicit overrides replace the measured width outright, even when
//! the content is wider; such content simply overflows its border.

use std::collections::BTreeMap;

/// Printable width of a cell: the longest of its lines, in code points.
pub fn printable_width(s: &str) -> usize {
    s.split('\n').map(|line| line.chars().count()).max().unwrap_or(0)
}

/// Resolve content widths for the measured strings of all rows.
///
/// `overrides` maps a column position to a fixed content width. Overrides
/// for positions beyond the widest row are ignored.
pub fn resolve_widths(rows: &[Vec<String>], overrides: &BTreeMap<usize, usize>) -> Vec<usize> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0; columns];

    for row in rows {
        for (j, cell) in row.iter().enumerate() {
            widths[j] = widths[j].max(printable_width(cell));
        }
    }

    for (&j, &width) in overrides.range(..columns) {
        widths[j] = width;
    }

    tracing::trace!(?widths, "resolved column widths");
    widths
}
