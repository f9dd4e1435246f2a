//! # gridline
//!
//! Render JSON data as box-drawn text tables.
//!
//! ## Overview
//!
//! gridline is built on top of gridlinelib. It reads a table as vanilla JSON
//! (an array of objects) or rich JSON (as written by `--output rich-json`),
//! applies formats, widths and colors given on the command line, and prints
//! the result.
//!
//! ## Usage
//!
//! ```bash
//! # Render an array of objects from stdin
//! echo '[{"ID": 1, "Client": "Acme"}]' | gridline
//!
//! # Pick a style and a subset of columns
//! gridline data.json --style smooth --columns Client,Amount
//!
//! # Format and color columns
//! gridline data.json --format 'Amount=%.2f' --color Amount=green
//!
//! # Keep everything for later
//! gridline data.json --format 'Amount=%.2f' --output rich-json > table.json
//! gridline table.json --input-format rich
//! ```
//!
//! Set `GRIDLINE_LOG=debug` to see what the renderer does.

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::{Arg, ArgAction, ArgMatches, Command};
use gridlinelib::{
    GridlineError, OutputWidth, RenderOptions, RowKind, Style, Table, Transform, Value,
};
use tracing_subscriber::EnvFilter;

/// Build the clap Command structure
fn build_command() -> Command {
    Command::new("gridline")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Arthur Debert")
        .about("Render JSON data as box-drawn text tables")
        .arg(
            Arg::new("input")
                .help("JSON file to read ('-' for stdin)")
                .default_value("-"),
        )
        .arg(
            Arg::new("input-format")
                .short('i')
                .long("input-format")
                .value_parser(["vanilla", "rich"])
                .default_value("vanilla")
                .help("Input JSON flavor"),
        )
        .arg(
            Arg::new("missing")
                .long("missing")
                .help("Value for keys an object lacks (vanilla input)"),
        )
        .arg(
            Arg::new("style")
                .short('s')
                .long("style")
                .default_value("classic")
                .help("Built-in style name"),
        )
        .arg(
            Arg::new("style-file")
                .long("style-file")
                .conflicts_with("style")
                .help("Load the style from a JSON file"),
        )
        .arg(
            Arg::new("list-styles")
                .long("list-styles")
                .action(ArgAction::SetTrue)
                .help("List built-in styles and exit"),
        )
        .arg(
            Arg::new("columns")
                .short('c')
                .long("columns")
                .value_delimiter(',')
                .action(ArgAction::Append)
                .help("Columns to show, in order (comma-separated)"),
        )
        .arg(
            Arg::new("center")
                .long("center")
                .action(ArgAction::SetTrue)
                .help("Center the table in the terminal"),
        )
        .arg(
            Arg::new("term-width")
                .long("term-width")
                .value_parser(clap::value_parser!(usize))
                .help("Output width used for centering (default: detect)"),
        )
        .arg(
            Arg::new("raw")
                .long("raw")
                .action(ArgAction::SetTrue)
                .help("Print raw values, ignoring colors and other transforms"),
        )
        .arg(
            Arg::new("measure-transformed")
                .long("measure-transformed")
                .action(ArgAction::SetTrue)
                .help("Measure column widths on transformed values"),
        )
        .arg(
            Arg::new("title")
                .long("title")
                .action(ArgAction::Append)
                .help("Title line above the table (can be specified multiple times)"),
        )
        .arg(
            Arg::new("footnote")
                .long("footnote")
                .action(ArgAction::Append)
                .help("Footnote below the table (can be specified multiple times)"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .action(ArgAction::Append)
                .value_name("COL=FMT")
                .help("Column format, e.g. 'Amount=%.2f'"),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .action(ArgAction::Append)
                .value_name("COL=N")
                .help("Fixed column width; 0 hides the column"),
        )
        .arg(
            Arg::new("color")
                .long("color")
                .action(ArgAction::Append)
                .value_name("COL=COLOR")
                .help("Color body cells of a column, e.g. 'Amount=green' or 'Client=red.bold'"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_parser(["table", "json", "rich-json"])
                .default_value("table")
                .help("Output format"),
        )
}

fn setup_logging() {
    let filter = EnvFilter::try_from_env("GRIDLINE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn values<'a>(matches: &'a ArgMatches, id: &str) -> impl Iterator<Item = &'a String> {
    matches.get_many::<String>(id).into_iter().flatten()
}

/// Split a `COL=VALUE` argument
fn split_assignment<'a>(flag: &str, arg: &'a str) -> anyhow::Result<(&'a str, &'a str)> {
    arg.split_once('=')
        .ok_or_else(|| anyhow!("--{flag} expects COL=VALUE, got '{arg}'"))
}

fn open_input(path: &str) -> anyhow::Result<Box<dyn Read>> {
    if path == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("cannot open {path}"))?;
    Ok(Box::new(BufReader::new(file)))
}

fn load_table(matches: &ArgMatches) -> anyhow::Result<Table> {
    let path = matches.get_one::<String>("input").map_or("-", String::as_str);
    let input = open_input(path)?;

    let table = match matches.get_one::<String>("input-format").map(String::as_str) {
        Some("rich") => Table::from_rich_json(input),
        _ => {
            let missing = matches
                .get_one::<String>("missing")
                .map_or(Value::Null, Value::from);
            Table::from_vanilla_json(input, missing)
        }
    };
    table.with_context(|| format!("cannot read a table from {path}"))
}

fn load_style(matches: &ArgMatches) -> anyhow::Result<Style> {
    if let Some(path) = matches.get_one::<String>("style-file") {
        let file = File::open(path).with_context(|| format!("cannot open {path}"))?;
        let style = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("invalid style file {path}"))?;
        return Ok(style);
    }
    let name = matches.get_one::<String>("style").map_or("classic", String::as_str);
    Ok(Style::named(name))
}

/// Unknown columns in per-column options are reported and skipped
fn skip_unknown(flag: &str, column: &str, result: gridlinelib::Result<()>) -> anyhow::Result<()> {
    match result {
        Err(GridlineError::UnknownColumns(_)) => {
            tracing::warn!(column, "--{flag}: no such column, skipped");
            Ok(())
        }
        other => Ok(other?),
    }
}

/// Apply titles, footnotes, formats, widths and colors to the table
fn configure(table: &Table, matches: &ArgMatches) -> anyhow::Result<()> {
    for title in values(matches, "title") {
        table.add_title(title.as_str())?;
    }
    for footnote in values(matches, "footnote") {
        table.add_footnote(footnote.as_str())?;
    }
    for arg in values(matches, "format") {
        let (column, format) = split_assignment("format", arg)?;
        skip_unknown("format", column, table.set_format(format, [column]))?;
    }
    for arg in values(matches, "width") {
        let (column, width) = split_assignment("width", arg)?;
        let width: usize = width
            .parse()
            .with_context(|| format!("--width {column}: '{width}' is not a width"))?;
        skip_unknown("width", column, table.set_column_width(width, [column]))?;
    }
    for arg in values(matches, "color") {
        let (column, color) = split_assignment("color", arg)?;
        let transform = Transform::styled(console::Style::from_dotted_str(color));
        let data = table.snapshot();
        if data.column_index(column).is_none() {
            tracing::warn!(column, "--color: no such column, skipped");
            continue;
        }
        let body: Vec<usize> = data
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| row.kind() == RowKind::Body)
            .map(|(i, _)| i)
            .collect();
        for i in body {
            table.row(i)?.modify(transform.clone(), [column]);
        }
    }
    Ok(())
}

fn render_options(matches: &ArgMatches) -> RenderOptions {
    let output_width = matches
        .get_one::<usize>("term-width")
        .map_or(OutputWidth::Detect, |w| OutputWidth::Fixed(*w));

    RenderOptions::new()
        .measure_transformed(matches.get_flag("measure-transformed"))
        .print_transformed(!matches.get_flag("raw"))
        .centered(matches.get_flag("center"))
        .columns(values(matches, "columns").cloned())
        .output_width(output_width)
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();

    if matches.get_flag("list-styles") {
        for name in Style::builtin_names() {
            writeln!(stdout, "{name}")?;
        }
        return Ok(());
    }

    let table = load_table(matches)?;
    configure(&table, matches)?;
    tracing::debug!(rows = table.row_count(), "table loaded");

    match matches.get_one::<String>("output").map(String::as_str) {
        Some("json") => table.write_vanilla_json(&mut stdout)?,
        Some("rich-json") => table.write_rich_json(&mut stdout)?,
        _ => {
            let style = load_style(matches)?;
            table.render(&mut stdout, &render_options(matches), &style)?;
        }
    }
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    setup_logging();
    let matches = build_command().get_matches();

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
