//! Rendering a table to text.
//!
//! A render pass runs in four steps:
//!
//! 1. take a consistent snapshot of the table (the read lock is held only for
//!    the copy)
//! 2. build the measured and printed string of every participating cell
//! 3. resolve one width vector for all bands
//! 4. emit titles, header, body rows, footer and footnotes through the style
//!
//! The lines are joined with `\n` and written to the sink in a single call,
//! so a failing sink leaves nothing half-written by the engine itself.

use console::Term;
use std::collections::BTreeMap;
use std::io::Write;

use crate::compose::Layout;
use crate::format::Format;
use crate::style::{RowPosition, Style};
use crate::table::{Cell, RowKind, Table, TableData};
use crate::transform::Transform;
use crate::value::Value;
use crate::widths::resolve_widths;
use crate::Result;

/// How to find the output width used for centering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputWidth {
    /// Ask the terminal attached to stdout
    #[default]
    Detect,
    Fixed(usize),
    /// Treat the width as unknown; centering adds no padding
    Unknown,
}

impl OutputWidth {
    pub fn resolve(self) -> Option<usize> {
        match self {
            OutputWidth::Detect => Term::stdout()
                .size_checked()
                .map(|(_rows, columns)| usize::from(columns)),
            OutputWidth::Fixed(width) => Some(width),
            OutputWidth::Unknown => None,
        }
    }
}

/// Options of a render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Measure widths on transformed values instead of raw ones
    pub measure_transformed: bool,
    /// Print transformed values instead of raw ones
    pub print_transformed: bool,
    /// Center every line within the output width
    pub centered: bool,
    /// Columns to show, by header name; empty shows all
    pub columns: Vec<String>,
    pub output_width: OutputWidth,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            measure_transformed: false,
            print_transformed: true,
            centered: false,
            columns: Vec::new(),
            output_width: OutputWidth::Detect,
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether widths are measured on transformed values.
    ///
    /// Keep this off when transforms add invisible characters such as ANSI
    /// color codes.
    pub fn measure_transformed(mut self, yes: bool) -> Self {
        self.measure_transformed = yes;
        self
    }

    pub fn print_transformed(mut self, yes: bool) -> Self {
        self.print_transformed = yes;
        self
    }

    pub fn centered(mut self, yes: bool) -> Self {
        self.centered = yes;
        self
    }

    /// Restrict (and order) the rendered columns by header name.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn output_width(mut self, width: OutputWidth) -> Self {
        self.output_width = width;
        self
    }
}

/// Raw and transformed text of one cell, formatted with its column format.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct CellText {
    pub raw: String,
    pub transformed: String,
}

impl CellText {
    pub(crate) fn of(cell: &Cell, format: &Format) -> Self {
        let both = |v: &Value| (format.apply(v), format.apply(&cell.transform.apply(v)));

        let (raw, transformed) = match &cell.value {
            Value::Str(s) => join_lines(s.split('\n').map(|part| both(&Value::from(part)))),
            Value::List(items) => join_lines(items.iter().map(both)),
            other => both(other),
        };

        match &cell.transform {
            Transform::Recorded(printed) => CellText {
                raw,
                transformed: printed.clone(),
            },
            _ => CellText { raw, transformed },
        }
    }
}

fn join_lines(parts: impl Iterator<Item = (String, String)>) -> (String, String) {
    let (raw, transformed): (Vec<String>, Vec<String>) = parts.unzip();
    (raw.join("\n"), transformed.join("\n"))
}

/// Strings of one row, ready for the compositor.
#[derive(Debug, Clone)]
struct PreparedRow {
    kind: RowKind,
    measured: Vec<String>,
    printed: Vec<String>,
}

/// Build measured/printed strings for every row and map width overrides to
/// column positions.
fn prepare(data: &TableData, options: &RenderOptions) -> (Vec<PreparedRow>, BTreeMap<usize, usize>) {
    let projection = if options.columns.is_empty() {
        None
    } else {
        Some(data.column_indexes(&options.columns)).filter(|p| !p.is_empty())
    };
    // The header fixes the column count.
    let canonical = data.header().map(|h| h.cells.len());

    let formats: BTreeMap<usize, Format> = data
        .formats
        .iter()
        .map(|(&j, f)| (j, Format::parse(f)))
        .collect();
    let default_format = Format::default();

    let rows = data
        .rows
        .iter()
        .map(|row| {
            let sources: Vec<usize> = match &projection {
                Some(p) => p.clone(),
                None => (0..row.cells.len().min(canonical.unwrap_or(usize::MAX))).collect(),
            };
            let (measured, printed): (Vec<String>, Vec<String>) = sources
                .iter()
                .map(|&src| {
                    let Some(cell) = row.cells.get(src) else {
                        return (String::new(), String::new());
                    };
                    let format = formats.get(&src).unwrap_or(&default_format);
                    let text = CellText::of(cell, format);
                    let pick = |transformed: bool| {
                        if transformed {
                            text.transformed.clone()
                        } else {
                            text.raw.clone()
                        }
                    };
                    (pick(options.measure_transformed), pick(options.print_transformed))
                })
                .unzip();
            PreparedRow {
                kind: row.kind,
                measured,
                printed,
            }
        })
        .collect();

    let overrides = match &projection {
        Some(p) => p
            .iter()
            .enumerate()
            .filter_map(|(pos, src)| data.widths.get(src).map(|w| (pos, *w)))
            .collect(),
        None => data.widths.clone(),
    };

    (rows, overrides)
}

/// Render a snapshot into lines.
pub fn render_lines(data: &TableData, options: &RenderOptions, style: &Style) -> Vec<String> {
    let (rows, overrides) = prepare(data, options);

    let measured: Vec<Vec<String>> = rows.iter().map(|r| r.measured.clone()).collect();
    let mut layout = Layout::new(resolve_widths(&measured, &overrides));
    if options.centered {
        layout = layout.centered(options.output_width.resolve());
    }

    let body: Vec<&PreparedRow> = rows.iter().filter(|r| r.kind == RowKind::Body).collect();
    tracing::debug!(
        style = %style.name,
        rows = body.len(),
        columns = layout.widths.len(),
        centered = layout.center,
        "rendering table"
    );

    let mut lines = Vec::new();

    if !data.titles.is_empty() {
        lines.extend(style.render_titles(&layout, &data.titles));
    }

    if let Some(header) = rows.iter().find(|r| r.kind == RowKind::Header) {
        lines.extend(style.render_header(&layout, &header.measured, &header.printed));
    }

    let count = body.len();
    for (i, row) in body.iter().enumerate() {
        let position = RowPosition {
            ordinal: i + 1,
            count,
        };
        lines.extend(style.render_row(position, &layout, &row.measured, &row.printed));
    }

    match rows.iter().find(|r| r.kind == RowKind::Footer) {
        Some(footer) => lines.extend(style.render_footer(&layout, &footer.measured, &footer.printed)),
        None => lines.extend(style.render_footer(&layout, &[], &[])),
    }

    if !data.footnotes.is_empty() {
        lines.extend(style.render_footnotes(&data.footnotes));
    }

    lines
}

impl Table {
    /// Render the table into `dst` with a single write.
    pub fn render<W: Write + ?Sized>(&self, dst: &mut W, options: &RenderOptions, style: &Style) -> Result<()> {
        let rendered = self.render_to_string(options, style);
        dst.write_all(rendered.as_bytes())?;
        Ok(())
    }

    /// Render the table to a string (lines joined with `\n`, no trailing
    /// newline).
    pub fn render_to_string(&self, options: &RenderOptions, style: &Style) -> String {
        let snapshot = self.snapshot();
        render_lines(&snapshot, options, style).join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values;
    use std::io;

    fn plain() -> RenderOptions {
        RenderOptions::new().output_width(OutputWidth::Unknown)
    }

    fn clients() -> Table {
        let table = Table::new(["ID", "Client", "Amount"]);
        table.add_row("").insert(values![1, "Acme", 100]);
        table.add_row("").insert(values![2, "IronMountain", 200]);
        table
    }

    fn red() -> Transform {
        Transform::custom(|v| Value::from(format!("\u{1b}[31m{}\u{1b}[0m", v)))
    }

    #[test]
    fn test_classic_scenario() {
        let out = clients().render_to_string(&plain(), &Style::classic());
        let expected = [
            "╔════╤══════════════╤════════╗",
            "║ ID │    Client    │ Amount ║",
            "╠════╪══════════════╪════════╣",
            "║ 1  │     Acme     │  100   ║",
            "╟────┼──────────────┼────────╢",
            "║ 2  │ IronMountain │  200   ║",
            "╚════╧══════════════╧════════╝",
        ]
        .join("\n");
        assert_eq!(out, expected);
    }

    #[test]
    fn test_minimal_scenario_has_no_body_rules() {
        let out = clients().render_to_string(&plain(), &Style::minimal());
        let expected = [
            " ID      Client      Amount ",
            "──── ────────────── ────────",
            " 1        Acme        100   ",
            " 2    IronMountain    200   ",
            "──── ────────────── ────────",
        ]
        .join("\n");
        assert_eq!(out, expected);
    }

    #[test]
    fn test_idempotent() {
        let table = clients();
        table.add_title("Clients").unwrap();
        table.add_footnote("All amounts in EUR").unwrap();
        let first = table.render_to_string(&plain(), &Style::smooth());
        let second = table.render_to_string(&plain(), &Style::smooth());
        assert_eq!(first, second);
    }

    #[test]
    fn test_titles_and_footnotes() {
        let table = Table::new(["A"]);
        table.add_row("").push("x");
        table.add_title("Title").unwrap();
        table.add_footnote("note").unwrap();

        let out = table.render_to_string(&plain(), &Style::ascii());
        let expected = [
            "",
            "Title",
            "",
            "+---+",
            "| A |",
            "+===+",
            "| x |",
            "+---+",
            "",
            "-------",
            "1. note",
            "",
        ]
        .join("\n");
        assert_eq!(out, expected);
    }

    #[test]
    fn test_footer_rendered() {
        let table = clients();
        table.add_footer().insert(values!["", "Total", 300]);
        let out = table.render_to_string(&plain(), &Style::classic());
        let last: Vec<&str> = out.lines().rev().take(2).collect();
        assert_eq!(last, vec!["          Total        300    ", "╚════╧══════════════╧════════╝"]);
    }

    #[test]
    fn test_multiline_row_symmetry() {
        let table = Table::new(["A", "B"]);
        table.add_row("").insert(values!["one\ntwo\nthree", "x"]);
        let out = table.render_to_string(&plain(), &Style::ascii());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            &lines[3..6],
            ["|  one  |   |", "|  two  | x |", "| three |   |"]
        );
    }

    #[test]
    fn test_list_values_render_one_per_line() {
        let table = Table::new(["Growth"]);
        table.add_row("").push(vec![1.78, 0.0]);
        let out = table.render_to_string(&plain(), &Style::ascii());
        assert!(out.contains("|  1.78  |\n|   0    |"));
    }

    #[test]
    fn test_width_override_and_hidden_column() {
        let table = clients();
        table.set_column_width(10, ["Client"]).unwrap();
        table.set_column_width(0, ["ID"]).unwrap();
        let out = table.render_to_string(&plain(), &Style::ascii());
        let first = out.lines().next().unwrap();
        assert_eq!(first, "+------------+--------+");
        // Content wider than the override overflows
        assert!(out.contains("|IronMountain|"));
    }

    #[test]
    fn test_column_projection_uses_source_settings() {
        let table = clients();
        table.set_format("%05d", ["Amount"]).unwrap();
        table.set_column_width(8, ["Amount"]).unwrap();
        let options = plain().columns(["amount", "nope", "ID"]);
        let out = table.render_to_string(&options, &Style::ascii());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[1], "|  Amount  | ID |");
        assert_eq!(lines[3], "|  00100   | 1  |");
    }

    #[test]
    fn test_unknown_projection_shows_everything() {
        let table = clients();
        let all = table.render_to_string(&plain(), &Style::ascii());
        let unknown = table.render_to_string(&plain().columns(["nope"]), &Style::ascii());
        assert_eq!(all, unknown);
    }

    #[test]
    fn test_header_fixes_column_count() {
        let table = Table::new(["A"]);
        table.add_row("").insert(values!["x", "extra"]);
        let out = table.render_to_string(&plain(), &Style::ascii());
        assert!(!out.contains("extra"));
    }

    #[test]
    fn test_rows_without_header_use_all_cells() {
        let table = Table::default();
        table.add_row("").insert(values![1]);
        table.add_row("").insert(values![2, 3]);
        let out = table.render_to_string(&plain(), &Style::ascii());
        assert_eq!(out, ["| 1 |   |", "+---+---+", "| 2 | 3 |", "+---+---+"].join("\n"));
    }

    #[test]
    fn test_transformed_measurement_modes() {
        let table = Table::new(["Name"]);
        table.add_row("").push("ab").modify(red(), ["Name"]);

        // Measure raw, print colored: the border fits the visible text
        let colored = table.render_to_string(&plain(), &Style::ascii());
        assert!(colored.starts_with("+------+"));
        assert!(colored.contains("|  \u{1b}[31mab\u{1b}[0m  |"));

        // Measure colored: escapes inflate the column
        let inflated = table.render_to_string(&plain().measure_transformed(true), &Style::ascii());
        assert!(inflated.starts_with("+-------------+"));

        // Print raw
        let raw = table.render_to_string(&plain().print_transformed(false), &Style::ascii());
        assert!(raw.contains("|  ab  |"));
        assert!(!raw.contains('\u{1b}'));
    }

    #[test]
    fn test_transform_applies_per_line() {
        let table = Table::new(["Name"]);
        let upper = Transform::custom(|v| Value::from(v.to_string().to_uppercase()));
        table.add_row("").push("ab\ncd").modify(upper, ["Name"]);
        let out = table.render_to_string(&plain(), &Style::ascii());
        assert!(out.contains("|  AB  |\n|  CD  |"));
    }

    #[test]
    fn test_recorded_transform_is_printed_verbatim() {
        let text = CellText::of(
            &Cell {
                value: Value::from(1.5),
                transform: Transform::Recorded("1.50 EUR".into()),
            },
            &Format::parse("%.1f"),
        );
        assert_eq!(text.raw, "1.5");
        assert_eq!(text.transformed, "1.50 EUR");
    }

    #[test]
    fn test_format_applies_to_both_forms() {
        let cell = Cell {
            value: Value::from(3),
            transform: Transform::custom(|v| Value::from(v.as_i64().unwrap_or_default() * 2)),
        };
        let text = CellText::of(&cell, &Format::parse("<%d>"));
        assert_eq!(text, CellText { raw: "<3>".into(), transformed: "<6>".into() });
    }

    #[test]
    fn test_centered_output() {
        let table = Table::new(["A"]);
        table.add_title("T").unwrap();
        let options = plain().centered(true).output_width(OutputWidth::Fixed(11));
        let out = table.render_to_string(&options, &Style::ascii());
        // Table is 5 wide: (11 - 5) / 2 = 3; title: (11 - 1) / 2 = 5
        assert_eq!(
            out,
            ["", "     T", "", "   +---+", "   | A |", "   +===+", "   +---+"].join("\n")
        );
    }

    #[test]
    fn test_empty_table() {
        let table = Table::default();
        assert_eq!(table.render_to_string(&plain(), &Style::classic()), "");
    }

    #[test]
    fn test_render_to_writer() {
        let mut buf = Vec::new();
        clients().render(&mut buf, &plain(), &Style::classic()).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            clients().render_to_string(&plain(), &Style::classic())
        );
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_errors_propagate() {
        let err = clients()
            .render(&mut FailingSink, &plain(), &Style::classic())
            .unwrap_err();
        assert!(matches!(err, crate::GridlineError::Io(e) if e.kind() == io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn test_concurrent_renders_share_a_style() {
        use std::sync::Arc;
        use std::thread;

        let table = Arc::new(clients());
        let style = Arc::new(Style::smooth());
        let expected = table.render_to_string(&plain(), &style);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let table = Arc::clone(&table);
                let style = Arc::clone(&style);
                thread::spawn(move || table.render_to_string(&plain(), &style))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}
