//! JSON interchange.
//!
//! Two formats are supported:
//!
//! - **rich**: everything needed to rebuild the table, including row names
//!   and kinds, column formats, width overrides, titles and footnotes. Cells
//!   with a transform also carry the string it printed (`modified`), because
//!   the transform itself cannot be serialized. On import that string becomes
//!   a [`Transform::Recorded`].
//! - **vanilla**: a plain array of objects, one per body row, keyed by header
//!   text. Suitable for other tools; names, transforms and metadata are lost.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};

use crate::format::Format;
use crate::render::CellText;
use crate::table::{Cell, Row, RowKind, Table, TableData};
use crate::transform::Transform;
use crate::value::Value;
use crate::Result;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RichTable {
    rows: Vec<RichRow>,
    formats: BTreeMap<usize, String>,
    widths: BTreeMap<usize, usize>,
    titles: Vec<String>,
    footnotes: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RichRow {
    name: String,
    kind: RowKind,
    cells: Vec<RichCell>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RichCell {
    value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified: Option<String>,
}

impl RichTable {
    fn from_data(data: &TableData) -> Self {
        let formats: BTreeMap<usize, Format> = data
            .formats
            .iter()
            .map(|(&j, f)| (j, Format::parse(f)))
            .collect();
        let default_format = Format::default();

        let rows = data
            .rows
            .iter()
            .map(|row| RichRow {
                name: row.name.clone(),
                kind: row.kind,
                cells: row
                    .cells
                    .iter()
                    .enumerate()
                    .map(|(j, cell)| {
                        let modified = (!cell.transform.is_identity()).then(|| {
                            let format = formats.get(&j).unwrap_or(&default_format);
                            CellText::of(cell, format).transformed
                        });
                        RichCell {
                            value: cell.value.clone(),
                            modified,
                        }
                    })
                    .collect(),
            })
            .collect();

        RichTable {
            rows,
            formats: data.formats.clone(),
            widths: data.widths.clone(),
            titles: data.titles.clone(),
            footnotes: data.footnotes.clone(),
        }
    }

    fn into_data(self) -> TableData {
        let mut seen_header = false;
        let mut seen_footer = false;

        let rows: Vec<Row> = self
            .rows
            .into_iter()
            .map(|rich| {
                let duplicate = match rich.kind {
                    RowKind::Header => std::mem::replace(&mut seen_header, true),
                    RowKind::Footer => std::mem::replace(&mut seen_footer, true),
                    RowKind::Body => false,
                };
                let kind = if duplicate {
                    tracing::debug!(kind = ?rich.kind, "duplicate row kind imported as body");
                    RowKind::Body
                } else {
                    rich.kind
                };

                let mut row = Row::new(&rich.name, kind);
                row.cells = rich
                    .cells
                    .into_iter()
                    .map(|c| Cell {
                        value: c.value,
                        transform: c.modified.map_or(Transform::Identity, Transform::Recorded),
                    })
                    .collect();
                row
            })
            .collect();

        let mut data = TableData {
            formats: self.formats,
            widths: self.widths,
            titles: self.titles,
            footnotes: self.footnotes,
            ..TableData::default()
        };
        for row in rows {
            data.push_row(row);
        }
        data
    }
}

fn vanilla_rows(data: &TableData) -> Vec<serde_json::Value> {
    let header = data.header();
    data.body()
        .map(|row| {
            let object: serde_json::Map<String, serde_json::Value> = row
                .cells
                .iter()
                .enumerate()
                .map(|(j, cell)| {
                    let key = header
                        .and_then(|h| h.cells.get(j))
                        .map(|c| c.value.to_string())
                        .unwrap_or_else(|| format!("COL_{}", j));
                    (key, raw_json(&cell.value))
                })
                .collect();
            serde_json::Value::Object(object)
        })
        .collect()
}

fn raw_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Value::from(*f),
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::List(items) => serde_json::Value::Array(items.iter().map(raw_json).collect()),
    }
}

impl Table {
    /// Export the table, with all metadata, as rich JSON.
    pub fn to_rich_json(&self) -> Result<String> {
        let rich = RichTable::from_data(&self.read());
        tracing::debug!(rows = rich.rows.len(), "exporting rich JSON");
        Ok(serde_json::to_string(&rich)?)
    }

    pub fn write_rich_json<W: Write + ?Sized>(&self, dst: &mut W) -> Result<()> {
        dst.write_all(self.to_rich_json()?.as_bytes())?;
        Ok(())
    }

    /// Rebuild a table from rich JSON. A second header or footer row is
    /// imported as a body row.
    pub fn from_rich_json<R: Read>(src: R) -> Result<Table> {
        let rich: RichTable = serde_json::from_reader(src)?;
        tracing::debug!(rows = rich.rows.len(), "imported rich JSON");
        Ok(Table::from_data(rich.into_data()))
    }

    /// Export the body rows as an array of objects keyed by header text
    /// (`COL_<n>` for cells without a header). Raw values are written.
    pub fn to_vanilla_json(&self) -> Result<String> {
        let rows = vanilla_rows(&self.read());
        tracing::debug!(rows = rows.len(), "exporting vanilla JSON");
        Ok(serde_json::to_string(&rows)?)
    }

    pub fn write_vanilla_json<W: Write + ?Sized>(&self, dst: &mut W) -> Result<()> {
        dst.write_all(self.to_vanilla_json()?.as_bytes())?;
        Ok(())
    }

    /// Build a table from an array of objects.
    ///
    /// Columns appear in the order their keys are first seen; objects that
    /// lack a key get `missing` in that column.
    ///
    /// ```rust
    /// use gridlinelib::{Table, Value};
    ///
    /// let src = r#"[{"Client": "Acme", "Amount": 100}, {"Client": "Initech"}]"#;
    /// let table = Table::from_vanilla_json(src.as_bytes(), "n/a").unwrap();
    /// let row = table.row(2).unwrap();
    /// assert_eq!(row.values(), vec![Value::from("Initech"), Value::from("n/a")]);
    /// ```
    pub fn from_vanilla_json<R: Read>(src: R, missing: impl Into<Value>) -> Result<Table> {
        let objects: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_reader(src)?;
        let missing = missing.into();

        let mut columns: Vec<String> = Vec::new();
        for object in &objects {
            for key in object.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        tracing::debug!(rows = objects.len(), ?columns, "imported vanilla JSON");

        let table = Table::new(columns.iter().cloned());
        for mut object in objects {
            let values: Vec<Value> = columns
                .iter()
                .map(|key| object.remove(key).map_or_else(|| missing.clone(), Value::from))
                .collect();
            table.add_row("").insert(values);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{OutputWidth, RenderOptions};
    use crate::style::Style;
    use crate::values;
    use crate::GridlineError;
    use serde_json::json;

    fn clients() -> Table {
        let table = Table::new(["ID", "Client", "Amount"]);
        table.add_row("acme").insert(values![1, "Acme", 100]);
        table.add_row("").insert(values![2, "IronMountain", 200.5]);
        table.add_footer().insert(values!["", "Total", 300.5]);
        table
    }

    fn parse(s: &str) -> serde_json::Value {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn test_rich_export_shape() {
        let table = clients();
        table.set_format("%.1f", ["Amount"]).unwrap();
        table.set_column_width(20, ["Client"]).unwrap();
        table.add_title("Clients").unwrap();
        table
            .row_by_name("acme")
            .unwrap()
            .modify(Transform::custom(|v| Value::from(v.as_f64().unwrap_or_default() * 2.0)), ["Amount"]);

        let exported = parse(&table.to_rich_json().unwrap());
        assert_eq!(exported["formats"], json!({"2": "%.1f"}));
        assert_eq!(exported["widths"], json!({"1": 20}));
        assert_eq!(exported["titles"], json!(["Clients"]));
        assert_eq!(exported["rows"][0]["kind"], "header");
        assert_eq!(exported["rows"][1]["name"], "acme");
        assert_eq!(exported["rows"][1]["cells"][2], json!({"value": 100, "modified": "200.0"}));
        assert_eq!(exported["rows"][1]["cells"][0], json!({"value": 1}));
        assert_eq!(exported["rows"][3]["kind"], "footer");
    }

    #[test]
    fn test_rich_round_trip_renders_identically() {
        let table = clients();
        table.set_format("%.2f", ["Amount"]).unwrap();
        table.add_footnote("All amounts in EUR").unwrap();
        let upper = Transform::custom(|v| Value::from(v.to_string().to_uppercase()));
        table.row(2).unwrap().modify(upper, ["Client"]);

        let restored = Table::from_rich_json(table.to_rich_json().unwrap().as_bytes()).unwrap();

        let options = RenderOptions::new().output_width(OutputWidth::Unknown);
        let style = Style::smooth();
        assert_eq!(
            restored.render_to_string(&options, &style),
            table.render_to_string(&options, &style)
        );
        assert_eq!(restored.row_names(), table.row_names());
        assert!(restored
            .render_to_string(&options, &style)
            .contains("IRONMOUNTAIN"));
    }

    #[test]
    fn test_rich_import_restores_recorded_transform() {
        let src = r#"{"rows": [
            {"name": "header", "kind": "header", "cells": [{"value": "Amount"}]},
            {"name": "x", "cells": [{"value": 5, "modified": "five"}]}
        ]}"#;
        let table = Table::from_rich_json(src.as_bytes()).unwrap();
        let data = table.snapshot();
        let row = &data.rows()[1];
        assert_eq!(row.kind(), RowKind::Body);
        assert_eq!(row.name(), "x");
        assert!(matches!(&row.cells()[0].transform, Transform::Recorded(s) if s == "five"));
        assert!(data.formats().is_empty());
        assert!(data.titles().is_empty());
    }

    #[test]
    fn test_rich_import_demotes_duplicate_header() {
        let src = r#"{"rows": [
            {"name": "header", "kind": "header", "cells": [{"value": "A"}]},
            {"name": "header", "kind": "header", "cells": [{"value": "B"}]}
        ]}"#;
        let table = Table::from_rich_json(src.as_bytes()).unwrap();
        let data = table.snapshot();
        assert_eq!(data.header().unwrap().values(), values!["A"]);
        assert_eq!(data.body().count(), 1);
    }

    #[test]
    fn test_vanilla_export() {
        let exported = parse(&clients().to_vanilla_json().unwrap());
        assert_eq!(
            exported,
            json!([
                {"ID": 1, "Client": "Acme", "Amount": 100},
                {"ID": 2, "Client": "IronMountain", "Amount": 200.5}
            ])
        );
    }

    #[test]
    fn test_vanilla_export_without_header() {
        let table = Table::default();
        table.add_row("").insert(values!["a", vec![1, 2]]);
        let exported = parse(&table.to_vanilla_json().unwrap());
        assert_eq!(exported, json!([{"COL_0": "a", "COL_1": [1, 2]}]));
    }

    #[test]
    fn test_vanilla_export_ignores_transforms() {
        let table = Table::new(["A"]);
        table
            .add_row("")
            .push("x")
            .modify(Transform::custom(|_| Value::from("y")), ["A"]);
        assert_eq!(parse(&table.to_vanilla_json().unwrap()), json!([{"A": "x"}]));
    }

    #[test]
    fn test_vanilla_import_orders_columns_and_fills_missing() {
        let src = r#"[{"b": 1, "a": 2.5}, {"c": null, "b": "x"}]"#;
        let table = Table::from_vanilla_json(src.as_bytes(), "-").unwrap();
        let data = table.snapshot();

        assert_eq!(data.header().unwrap().values(), values!["b", "a", "c"]);
        let body: Vec<Vec<Value>> = data.body().map(Row::values).collect();
        assert_eq!(
            body,
            vec![values![1, 2.5, "-"], vec![Value::from("x"), Value::from("-"), Value::Null]]
        );
    }

    #[test]
    fn test_vanilla_round_trip() {
        let table = clients();
        let restored = Table::from_vanilla_json(table.to_vanilla_json().unwrap().as_bytes(), Value::Null).unwrap();
        let data = restored.snapshot();
        assert_eq!(data.header().unwrap().values(), values!["ID", "Client", "Amount"]);
        assert_eq!(data.body().count(), 2);
        assert!(data.footer().is_none());
    }

    #[test]
    fn test_empty_vanilla_input() {
        let table = Table::from_vanilla_json("[]".as_bytes(), Value::Null).unwrap();
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_invalid_json() {
        let err = Table::from_vanilla_json("{not json".as_bytes(), Value::Null).unwrap_err();
        assert!(matches!(err, GridlineError::Json(_)));
        let err = Table::from_rich_json("[1, 2]".as_bytes()).unwrap_err();
        assert!(matches!(err, GridlineError::Json(_)));
    }

    #[test]
    fn test_write_to_sink() {
        let mut buf = Vec::new();
        clients().write_vanilla_json(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), clients().to_vanilla_json().unwrap());
    }
}
