//! Line composition for a single band.
//!
//! Given the glyphs of one band (header, body row or footer), the resolved
//! column widths and the measured/printed strings of the row, produce the
//! literal text lines: a top border, one or more content lines and a bottom
//! border. Which of those lines end up in the output is decided by the
//! [`Style`](crate::style::Style).
//!
//! Every visible column occupies `width + 2` characters: the content is
//! centered in that space, so there is always at least one blank on each side
//! unless the content overflows. Columns of width 0 are not drawn at all.

use crate::style::{Band, Border};

/// Per-render layout: resolved widths and centering.
///
/// This travels with every compositing call so that styles stay immutable and
/// can be shared between concurrent renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    /// Content width per column (without the 2-character margin)
    pub widths: Vec<usize>,
    /// Center every line within `available`
    pub center: bool,
    /// Width of the output device, when known
    pub available: Option<usize>,
}

impl Layout {
    pub fn new(widths: Vec<usize>) -> Self {
        Layout {
            widths,
            center: false,
            available: None,
        }
    }

    /// Enable centering within the given output width (`None` = unknown).
    pub fn centered(mut self, available: Option<usize>) -> Self {
        self.center = true;
        self.available = available;
        self
    }

    /// Left padding that centers a line of `width` characters.
    pub fn offset(&self, width: usize) -> usize {
        if !self.center {
            return 0;
        }
        self.available
            .map_or(0, |available| available.saturating_sub(width) / 2)
    }

    fn visible(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.widths
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, width)| *width > 0)
    }

    fn has_visible(&self) -> bool {
        self.widths.iter().any(|w| *w > 0)
    }
}

/// The composed lines of one band, already centered when requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedBand {
    pub top: String,
    pub content: Vec<String>,
    pub bottom: String,
    /// No printed cell had any content
    pub is_empty: bool,
}

/// Compose one band. Returns `None` when no column is visible.
pub fn compose_band(
    band: &Band,
    layout: &Layout,
    measured: &[String],
    printed: &[String],
) -> Option<ComposedBand> {
    if !layout.has_visible() {
        return None;
    }

    let top = border_line(&band.top, layout);
    let bottom = border_line(&band.bottom, layout);

    // Hidden columns do not contribute lines.
    let line_count = layout
        .visible()
        .map(|(i, _)| cell(printed, i).matches('\n').count() + 1)
        .max()
        .unwrap_or(1);
    let is_empty = layout.visible().all(|(i, _)| cell(printed, i).is_empty());

    let content = (0..line_count)
        .map(|line| {
            let cells: Vec<String> = layout
                .visible()
                .map(|(i, width)| {
                    cell_line(width, cell(measured, i), cell(printed, i), line, line_count)
                })
                .collect();
            format!(
                "{}{}{}",
                band.content.left,
                cells.join(&band.content.inner),
                band.content.right
            )
        })
        .collect::<Vec<_>>();

    let width = top.chars().count().max(bottom.chars().count());
    let pad = " ".repeat(layout.offset(width));

    Some(ComposedBand {
        top: format!("{}{}", pad, top),
        content: content
            .into_iter()
            .map(|line| format!("{}{}", pad, line))
            .collect(),
        bottom: format!("{}{}", pad, bottom),
        is_empty,
    })
}

fn cell(cells: &[String], i: usize) -> &str {
    cells.get(i).map(String::as_str).unwrap_or("")
}

/// Compose a standalone border line, centered when requested.
pub fn compose_border(border: &Border, layout: &Layout) -> Option<String> {
    if !layout.has_visible() {
        return None;
    }
    let line = border_line(border, layout);
    let pad = " ".repeat(layout.offset(line.chars().count()));
    Some(format!("{}{}", pad, line))
}

fn border_line(border: &Border, layout: &Layout) -> String {
    let segments: Vec<String> = layout
        .visible()
        .map(|(_, width)| border.fill.repeat(width + 2))
        .collect();
    format!("{}{}{}", border.left, segments.join(&border.joint), border.right)
}

/// One physical line of one cell, padded to `width + 2`.
///
/// Shorter cells are vertically centered within `line_count` lines; the extra
/// blank line of an odd split goes below the content.
fn cell_line(width: usize, measured: &str, printed: &str, line: usize, line_count: usize) -> String {
    let parts: Vec<&str> = printed.split('\n').collect();
    let pre = if line_count > 1 {
        (line_count - parts.len()) / 2
    } else {
        0
    };

    if line < pre || line >= pre + parts.len() {
        return " ".repeat(width + 2);
    }

    let index = line - pre;
    let part = parts[index];
    let len = measured
        .split('\n')
        .nth(index)
        .unwrap_or(part)
        .chars()
        .count();

    let room = width + 2;
    let left = room.saturating_sub(len) / 2;
    let right = room.saturating_sub(len) - left;
    format!("{}{}{}", " ".repeat(left), part, " ".repeat(right))
}
