//! Visual styles: border glyphs and border suppression.
//!
//! A style describes three bands, each with a top border, content walls and a
//! bottom border:
//!
//! ```text
//! ╔════╤════╗ <- header.top     [left, fill, joint, right]
//! ║    │    ║ <- header.content [left, inner, right]
//! ╠════╪════╣ <- header.bottom
//! ║    │    ║ <- body.content
//! ╟────┼────╢ <- body.bottom (between rows)
//! ║    │    ║
//! ╚════╧════╝ <- footer.top
//!              <- footer.content
//! ```
//!
//! Skip flags decide which borders are emitted, e.g. the body top border is
//! usually skipped so that consecutive rows share one separator.
//!
//! Styles hold no per-render state. Widths and centering are passed in a
//! [`Layout`] on every call, so one style can serve concurrent renders.

use serde::{Deserialize, Serialize};

use crate::compose::{compose_band, compose_border, ComposedBand, Layout};

/// A horizontal border line: `left fill… joint fill… right`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Border {
    pub left: String,
    pub fill: String,
    pub joint: String,
    pub right: String,
}

impl Border {
    pub fn new(glyphs: [&str; 4]) -> Self {
        let [left, fill, joint, right] = glyphs;
        Border {
            left: left.to_string(),
            fill: fill.to_string(),
            joint: joint.to_string(),
            right: right.to_string(),
        }
    }
}

/// The vertical walls of a content line: `left cell inner cell right`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Walls {
    pub left: String,
    pub inner: String,
    pub right: String,
}

impl Walls {
    pub fn new(glyphs: [&str; 3]) -> Self {
        let [left, inner, right] = glyphs;
        Walls {
            left: left.to_string(),
            inner: inner.to_string(),
            right: right.to_string(),
        }
    }
}

/// Glyphs of one band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub top: Border,
    pub content: Walls,
    pub bottom: Border,
}

impl Band {
    pub fn new(top: [&str; 4], content: [&str; 3], bottom: [&str; 4]) -> Self {
        Band {
            top: Border::new(top),
            content: Walls::new(content),
            bottom: Border::new(bottom),
        }
    }
}

/// Which borders are left out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skip {
    pub header_top: bool,
    pub header_bottom: bool,
    pub body_top: bool,
    pub body_bottom: bool,
    /// Top border of the first body row only
    pub first_body_top: bool,
    /// Bottom border of the last body row only
    pub last_body_bottom: bool,
    pub footer_top: bool,
    pub footer_bottom: bool,
}

/// Position of a body row among all body rows (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPosition {
    pub ordinal: usize,
    pub count: usize,
}

/// A named visual theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    pub name: String,
    pub header: Band,
    pub body: Band,
    pub footer: Band,
    #[serde(default)]
    pub skip: Skip,
    /// Emitted instead of the footer's top border when the footer is empty
    #[serde(default)]
    pub empty_footer: Option<Border>,
    /// Glyph of the rule above the footnotes
    #[serde(default = "default_rule")]
    pub rule: String,
}

fn default_rule() -> String {
    "─".to_string()
}

const BUILTIN_NAMES: [&str; 5] = ["classic", "smooth", "modern", "minimal", "ascii"];

impl Default for Style {
    fn default() -> Self {
        Style::classic()
    }
}

impl Style {
    /// Look up a built-in style by name (case-insensitive). Unknown names
    /// fall back to `classic`.
    pub fn named(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "smooth" => Style::smooth(),
            "modern" => Style::modern(),
            "minimal" => Style::minimal(),
            "ascii" => Style::ascii(),
            "classic" => Style::classic(),
            other => {
                tracing::debug!(style = other, "unknown style, using classic");
                Style::classic()
            }
        }
    }

    /// Names accepted by [`Style::named`]
    pub fn builtin_names() -> &'static [&'static str] {
        &BUILTIN_NAMES
    }

    /// Double-line outer box with single-line inner walls. The footer hangs
    /// below the closing border.
    pub fn classic() -> Self {
        Style {
            name: "classic".into(),
            header: Band::new(
                ["╔", "═", "╤", "╗"],
                ["║", "│", "║"],
                ["╠", "═", "╪", "╣"],
            ),
            body: Band::new(
                ["╟", "─", "┼", "╢"],
                ["║", "│", "║"],
                ["╟", "─", "┼", "╢"],
            ),
            footer: Band::new(
                ["╚", "═", "╧", "╝"],
                [" ", " ", " "],
                [" ", " ", " ", " "],
            ),
            skip: Skip {
                body_top: true,
                last_body_bottom: true,
                footer_bottom: true,
                ..Skip::default()
            },
            empty_footer: None,
            rule: default_rule(),
        }
    }

    /// Rounded single-line box throughout.
    pub fn smooth() -> Self {
        Style {
            name: "smooth".into(),
            header: Band::new(
                ["╭", "─", "┬", "╮"],
                ["│", "│", "│"],
                ["├", "─", "┼", "┤"],
            ),
            body: Band::new(
                ["├", "─", "┼", "┤"],
                ["│", "│", "│"],
                ["├", "─", "┼", "┤"],
            ),
            footer: Band::new(
                ["├", "─", "┴", "┤"],
                ["│", " ", "│"],
                ["╰", "─", "─", "╯"],
            ),
            skip: Skip {
                body_top: true,
                last_body_bottom: true,
                ..Skip::default()
            },
            empty_footer: Some(Border::new(["╰", "─", "┴", "╯"])),
            rule: default_rule(),
        }
    }

    /// Heavy rules under the header and above the footer, blank separator
    /// lines between rows.
    pub fn modern() -> Self {
        Style {
            name: "modern".into(),
            header: Band::new(
                [" ", " ", " ", " "],
                [" ", " ", " "],
                ["━", "━", "━", "━"],
            ),
            body: Band::new(
                [" ", " ", " ", " "],
                [" ", " ", " "],
                [" ", " ", " ", " "],
            ),
            footer: Band::new(
                ["━", "━", "━", "━"],
                [" ", " ", " "],
                [" ", " ", " ", " "],
            ),
            skip: Skip {
                header_top: true,
                body_top: true,
                last_body_bottom: true,
                footer_bottom: true,
                ..Skip::default()
            },
            empty_footer: None,
            rule: "━".into(),
        }
    }

    /// Rules under the header and above the footer only.
    pub fn minimal() -> Self {
        Style {
            name: "minimal".into(),
            header: Band::new(["", " ", " ", ""], ["", " ", ""], ["", "─", " ", ""]),
            body: Band::new(["", " ", " ", ""], ["", " ", ""], ["", " ", " ", ""]),
            footer: Band::new(["", "─", " ", ""], ["", " ", ""], ["", " ", " ", ""]),
            skip: Skip {
                header_top: true,
                body_top: true,
                body_bottom: true,
                footer_bottom: true,
                ..Skip::default()
            },
            empty_footer: None,
            rule: default_rule(),
        }
    }

    /// Plain ASCII box for logs and terminals without box-drawing glyphs.
    pub fn ascii() -> Self {
        Style {
            name: "ascii".into(),
            header: Band::new(
                ["+", "-", "+", "+"],
                ["|", "|", "|"],
                ["+", "=", "+", "+"],
            ),
            body: Band::new(
                ["+", "-", "+", "+"],
                ["|", "|", "|"],
                ["+", "-", "+", "+"],
            ),
            footer: Band::new(
                ["+", "=", "+", "+"],
                ["|", "|", "|"],
                ["+", "-", "+", "+"],
            ),
            skip: Skip {
                body_top: true,
                last_body_bottom: true,
                ..Skip::default()
            },
            empty_footer: Some(Border::new(["+", "-", "+", "+"])),
            rule: "-".into(),
        }
    }

    /// Render the header band.
    pub fn render_header(&self, layout: &Layout, measured: &[String], printed: &[String]) -> Vec<String> {
        let Some(band) = compose_band(&self.header, layout, measured, printed) else {
            return Vec::new();
        };
        emit(band, !self.skip.header_top, true, !self.skip.header_bottom)
    }

    /// Render one body row at the given position.
    pub fn render_row(
        &self,
        position: RowPosition,
        layout: &Layout,
        measured: &[String],
        printed: &[String],
    ) -> Vec<String> {
        let Some(band) = compose_band(&self.body, layout, measured, printed) else {
            return Vec::new();
        };
        let top = !self.skip.body_top && !(position.ordinal == 1 && self.skip.first_body_top);
        let bottom = !self.skip.body_bottom
            && !(position.ordinal == position.count && self.skip.last_body_bottom);
        emit(band, top, true, bottom)
    }

    /// Render the footer band. An empty footer emits only its closing
    /// border (if any); content lines and bottom border are dropped.
    pub fn render_footer(&self, layout: &Layout, measured: &[String], printed: &[String]) -> Vec<String> {
        let Some(mut band) = compose_band(&self.footer, layout, measured, printed) else {
            return Vec::new();
        };
        if band.is_empty {
            if let Some(close) = self.empty_footer.as_ref().and_then(|b| compose_border(b, layout)) {
                band.top = close;
            }
        }
        let filled = !band.is_empty;
        emit(band, !self.skip.footer_top, filled, filled && !self.skip.footer_bottom)
    }

    /// Render the title block: a blank line, the titles, a blank line.
    pub fn render_titles(&self, layout: &Layout, titles: &[String]) -> Vec<String> {
        let mut lines = vec![String::new()];
        for title in titles {
            let pad = " ".repeat(layout.offset(title.chars().count()));
            lines.push(format!("{}{}", pad, title));
        }
        lines.push(String::new());
        lines
    }

    /// Render numbered footnotes under a rule as long as the longest note.
    pub fn render_footnotes(&self, footnotes: &[String]) -> Vec<String> {
        let numbered: Vec<String> = footnotes
            .iter()
            .enumerate()
            .map(|(i, note)| format!("{}. {}", i + 1, note))
            .collect();
        let longest = numbered.iter().map(|n| n.chars().count()).max().unwrap_or(0);

        let mut lines = vec![String::new(), self.rule.repeat(longest)];
        lines.extend(numbered);
        lines.push(String::new());
        lines
    }
}

fn emit(band: ComposedBand, top: bool, content: bool, bottom: bool) -> Vec<String> {
    let mut lines = Vec::new();
    if top {
        lines.push(band.top);
    }
    if content {
        lines.extend(band.content);
    }
    if bottom {
        lines.push(band.bottom);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_named_lookup() {
        assert_eq!(Style::named("smooth").name, "smooth");
        assert_eq!(Style::named("MODERN").name, "modern");
        assert_eq!(Style::named("Minimal").name, "minimal");
        assert_eq!(Style::named("ascii").name, "ascii");
        assert_eq!(Style::named("classic").name, "classic");
    }

    #[test]
    fn test_unknown_style_falls_back() {
        assert_eq!(Style::named("no-such-style"), Style::classic());
        assert_eq!(Style::default(), Style::classic());
    }

    #[test]
    fn test_builtin_names_resolve_to_themselves() {
        for name in Style::builtin_names() {
            assert_eq!(Style::named(name).name, *name);
        }
    }

    #[test]
    fn test_header_band() {
        let cells = strings(&["ID", "Client"]);
        let lines = Style::classic().render_header(&Layout::new(vec![2, 6]), &cells, &cells);
        assert_eq!(
            lines,
            vec!["╔════╤════════╗", "║ ID │ Client ║", "╠════╪════════╣"]
        );
    }

    #[test]
    fn test_body_rows_share_one_separator() {
        let style = Style::classic();
        let layout = Layout::new(vec![1]);
        let cells = strings(&["x"]);

        let first = style.render_row(RowPosition { ordinal: 1, count: 2 }, &layout, &cells, &cells);
        let last = style.render_row(RowPosition { ordinal: 2, count: 2 }, &layout, &cells, &cells);

        assert_eq!(first, vec!["║ x ║", "╟───╢"]);
        assert_eq!(last, vec!["║ x ║"]);
    }

    #[test]
    fn test_first_body_top_flag() {
        let mut style = Style::ascii();
        style.skip.body_top = false;
        style.skip.first_body_top = true;
        let layout = Layout::new(vec![1]);
        let cells = strings(&["x"]);

        let first = style.render_row(RowPosition { ordinal: 1, count: 2 }, &layout, &cells, &cells);
        let second = style.render_row(RowPosition { ordinal: 2, count: 2 }, &layout, &cells, &cells);

        assert_eq!(first, vec!["| x |", "+---+"]);
        assert_eq!(second, vec!["+---+", "| x |"]);
    }

    #[test]
    fn test_minimal_has_no_body_borders() {
        let style = Style::minimal();
        let layout = Layout::new(vec![2, 3]);
        let cells = strings(&["ab", "cde"]);
        let lines = style.render_row(RowPosition { ordinal: 1, count: 3 }, &layout, &cells, &cells);
        assert_eq!(lines, vec![" ab   cde "]);
    }

    #[test]
    fn test_empty_footer_closes_table() {
        let layout = Layout::new(vec![1, 2]);

        assert_eq!(Style::classic().render_footer(&layout, &[], &[]), vec!["╚═══╧════╝"]);
        assert_eq!(Style::smooth().render_footer(&layout, &[], &[]), vec!["╰───┴────╯"]);
        assert_eq!(Style::ascii().render_footer(&layout, &[], &[]), vec!["+---+----+"]);
    }

    #[test]
    fn test_footer_with_content() {
        let layout = Layout::new(vec![1, 2]);
        let cells = strings(&["Σ", "42"]);

        assert_eq!(
            Style::classic().render_footer(&layout, &cells, &cells),
            vec!["╚═══╧════╝", "  Σ   42  "]
        );
        assert_eq!(
            Style::smooth().render_footer(&layout, &cells, &cells),
            vec!["├───┴────┤", "│ Σ   42 │", "╰────────╯"]
        );
    }

    #[test]
    fn test_footer_with_blank_cells_is_empty() {
        let layout = Layout::new(vec![1]);
        let cells = strings(&[""]);
        assert_eq!(Style::classic().render_footer(&layout, &cells, &cells), vec!["╚═══╝"]);
    }

    #[test]
    fn test_titles() {
        let titles = strings(&["GDP", "(annual)"]);
        let plain = Style::classic().render_titles(&Layout::new(vec![1]), &titles);
        assert_eq!(plain, vec!["", "GDP", "(annual)", ""]);

        let centered = Style::classic().render_titles(&Layout::new(vec![1]).centered(Some(13)), &titles);
        assert_eq!(centered, vec!["", "     GDP", "  (annual)", ""]);
    }

    #[test]
    fn test_footnotes() {
        let notes = strings(&["Source: Worldbank", "Geometric mean"]);
        let lines = Style::classic().render_footnotes(&notes);
        assert_eq!(
            lines,
            vec![
                "",
                "────────────────────",
                "1. Source: Worldbank",
                "2. Geometric mean",
                "",
            ]
        );
    }

    #[test]
    fn test_no_visible_columns_renders_nothing() {
        let layout = Layout::new(vec![0]);
        assert!(Style::classic().render_header(&layout, &[], &[]).is_empty());
        assert!(Style::classic().render_footer(&layout, &[], &[]).is_empty());
    }

    #[test]
    fn test_style_json_round_trip_with_defaults() {
        let json = serde_json::to_string(&Style::smooth()).unwrap();
        let back: Style = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Style::smooth());

        // skip, empty_footer and rule may be omitted
        let custom = r#"{
            "name": "dots",
            "header": {"top": {"left": ".", "fill": ".", "joint": ".", "right": "."},
                       "content": {"left": ":", "inner": ":", "right": ":"},
                       "bottom": {"left": ".", "fill": ".", "joint": ".", "right": "."}},
            "body": {"top": {"left": ".", "fill": ".", "joint": ".", "right": "."},
                     "content": {"left": ":", "inner": ":", "right": ":"},
                     "bottom": {"left": ".", "fill": ".", "joint": ".", "right": "."}},
            "footer": {"top": {"left": ".", "fill": ".", "joint": ".", "right": "."},
                       "content": {"left": ":", "inner": ":", "right": ":"},
                       "bottom": {"left": ".", "fill": ".", "joint": ".", "right": "."}}
        }"#;
        let dots: Style = serde_json::from_str(custom).unwrap();
        assert_eq!(dots.skip, Skip::default());
        assert_eq!(dots.rule, "─");
        assert!(dots.empty_footer.is_none());
    }
}
