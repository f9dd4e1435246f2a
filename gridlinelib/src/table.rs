//! The table store.
//!
//! A [`Table`] owns its rows, the header/footer identity, per-column formats
//! and width overrides, titles and footnotes, all behind a single
//! reader-writer lock. Every operation takes the lock once, so readers never
//! observe a half-applied change.
//!
//! Row edits go through a [`RowMut`] handle. The handle remembers which row
//! it points at and takes the lock once per call, so it can be kept around
//! while the table is read or rendered:
//!
//! ```rust
//! use gridlinelib::{values, RenderOptions, Style, Table, Transform};
//!
//! let table = Table::new(["Year", "GDP growth"]);
//! let row = table.add_row("").insert(values![2015, 1.78]);
//! let before = table.render_to_string(&RenderOptions::new(), &Style::ascii());
//! row.modify(Transform::custom(|v| v.clone()), ["GDP growth"]);
//! assert_eq!(table.row_count(), 2);
//! assert!(before.contains("1.78"));
//! ```
//!
//! Columns are addressed by header name (case-insensitive). Unknown names are
//! skipped; operations only fail when none of the given names match.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::GridlineError;
use crate::transform::Transform;
use crate::value::Value;
use crate::Result;

/// Name under which the header row is stored
pub const HEADER: &str = "header";
/// Name under which the footer row is stored
pub const FOOTER: &str = "footer";

/// One cell: a raw value and its deferred transform.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    pub value: Value,
    pub transform: Transform,
}

impl Cell {
    pub fn new(value: impl Into<Value>) -> Self {
        Cell {
            value: value.into(),
            transform: Transform::Identity,
        }
    }
}

/// Role of a row in the rendered table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Header,
    Footer,
    #[default]
    Body,
}

/// A row of cells.
#[derive(Debug, Clone, Default)]
pub struct Row {
    /// Stable identity within its table, used by row handles
    pub(crate) id: u64,
    pub(crate) name: String,
    pub(crate) kind: RowKind,
    pub(crate) cells: Vec<Cell>,
}

impl Row {
    pub(crate) fn new(name: &str, kind: RowKind) -> Self {
        Row {
            id: 0,
            name: name.to_lowercase(),
            kind,
            cells: Vec::new(),
        }
    }

    /// Lower-cased row name; empty for unnamed rows
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RowKind {
        self.kind
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Raw values of all cells
    pub fn values(&self) -> Vec<Value> {
        self.cells.iter().map(|c| c.value.clone()).collect()
    }
}

/// Everything a table holds. A clone of this is the render snapshot.
#[derive(Debug, Clone, Default)]
pub struct TableData {
    pub(crate) rows: Vec<Row>,
    pub(crate) formats: BTreeMap<usize, String>,
    pub(crate) widths: BTreeMap<usize, usize>,
    pub(crate) titles: Vec<String>,
    pub(crate) footnotes: Vec<String>,
    pub(crate) next_id: u64,
}

impl TableData {
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn header(&self) -> Option<&Row> {
        self.rows.iter().find(|r| r.kind == RowKind::Header)
    }

    pub fn footer(&self) -> Option<&Row> {
        self.rows.iter().find(|r| r.kind == RowKind::Footer)
    }

    /// Body rows in table order
    pub fn body(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|r| r.kind == RowKind::Body)
    }

    /// Column format strings by column index
    pub fn formats(&self) -> &BTreeMap<usize, String> {
        &self.formats
    }

    /// Content width overrides by column index
    pub fn width_overrides(&self) -> &BTreeMap<usize, usize> {
        &self.widths
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn footnotes(&self) -> &[String] {
        &self.footnotes
    }

    /// Index of a header column, matched case-insensitively against the
    /// header's string cells.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        self.header()?.cells.iter().position(|cell| {
            cell.value
                .as_str()
                .is_some_and(|s| s.to_lowercase() == name)
        })
    }

    /// Indexes of the named columns; unknown names are skipped.
    pub fn column_indexes<I, S>(&self, names: I) -> Vec<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|name| {
                let name = name.as_ref();
                let index = self.column_index(name);
                if index.is_none() {
                    tracing::debug!(column = name, "unknown column skipped");
                }
                index
            })
            .collect()
    }

    fn find_kind(&self, kind: RowKind) -> Option<usize> {
        self.rows.iter().position(|r| r.kind == kind)
    }

    fn find_name(&self, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        match name.as_str() {
            HEADER => self.find_kind(RowKind::Header),
            FOOTER => self.find_kind(RowKind::Footer),
            _ => self.rows.iter().position(|r| r.name == name),
        }
    }

    /// Return the id of the named row, creating it when needed.
    /// `header` and `footer` are unique; other names may repeat.
    fn add_row(&mut self, name: &str) -> u64 {
        let name = name.to_lowercase();
        let kind = match name.as_str() {
            HEADER => RowKind::Header,
            FOOTER => RowKind::Footer,
            _ => RowKind::Body,
        };
        if kind != RowKind::Body {
            if let Some(index) = self.find_kind(kind) {
                return self.rows[index].id;
            }
        }
        self.push_row(Row::new(&name, kind))
    }

    /// Append a row under a fresh id.
    pub(crate) fn push_row(&mut self, mut row: Row) -> u64 {
        let id = self.next_id;
        row.id = id;
        self.next_id += 1;
        self.rows.push(row);
        id
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.rows.iter().position(|r| r.id == id)
    }

    fn resolve_columns<I, S>(&self, op: &'static str, names: I) -> Result<Vec<usize>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: Vec<S> = names.into_iter().collect();
        if names.is_empty() {
            return Err(GridlineError::NoColumns(op));
        }
        let indexes = self.column_indexes(&names);
        if indexes.is_empty() {
            return Err(GridlineError::UnknownColumns(op));
        }
        Ok(indexes)
    }

    /// A new table sharing this one's settings but holding only `rows`.
    fn with_rows(&self, rows: Vec<Row>) -> TableData {
        TableData {
            rows,
            formats: self.formats.clone(),
            widths: self.widths.clone(),
            titles: self.titles.clone(),
            footnotes: self.footnotes.clone(),
            next_id: self.next_id,
        }
    }

    fn select_rows<F>(&self, keep_footer: bool, mut keep: F) -> Vec<Row>
    where
        F: FnMut(&Row) -> bool,
    {
        self.rows
            .iter()
            .filter(|row| match row.kind {
                RowKind::Header => true,
                RowKind::Footer => keep_footer,
                RowKind::Body => keep(row),
            })
            .cloned()
            .collect()
    }
}

/// A thread-safe, mutable table.
#[derive(Debug, Default)]
pub struct Table {
    inner: RwLock<TableData>,
}

impl Clone for Table {
    fn clone(&self) -> Self {
        Table::from_data(self.snapshot())
    }
}

impl Table {
    /// Create a table; a non-empty column list becomes the header.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let table = Table::default();
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if !columns.is_empty() {
            table.add_header(columns);
        }
        table
    }

    pub(crate) fn from_data(data: TableData) -> Self {
        Table {
            inner: RwLock::new(data),
        }
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, TableData> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TableData> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// A consistent copy of the whole table.
    pub fn snapshot(&self) -> TableData {
        self.read().clone()
    }

    /// Add a title line above the table.
    pub fn add_title(&self, title: impl Into<String>) -> Result<()> {
        let title = title.into();
        if title.is_empty() {
            return Err(GridlineError::EmptyTitle);
        }
        self.write().titles.push(title);
        Ok(())
    }

    /// Add a footnote below the table.
    pub fn add_footnote(&self, footnote: impl Into<String>) -> Result<()> {
        let footnote = footnote.into();
        if footnote.is_empty() {
            return Err(GridlineError::EmptyFootnote);
        }
        self.write().footnotes.push(footnote);
        Ok(())
    }

    /// Append column names to the header row, creating it if needed.
    pub fn add_header<I, S>(&self, columns: I) -> RowMut<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_row(HEADER)
            .insert(columns.into_iter().map(|c| Value::Str(c.into())))
    }

    /// Return the footer row, creating an empty one if needed.
    ///
    /// Footer cells can be filled later by column name:
    ///
    /// ```rust
    /// use gridlinelib::Table;
    ///
    /// let table = Table::new(["Client", "Amount"]);
    /// table.add_footer();
    /// table.row_by_name("footer").unwrap().change("Amount", "Total: 300");
    /// ```
    pub fn add_footer(&self) -> RowMut<'_> {
        self.add_row(FOOTER)
    }

    /// Append a row. Names are case-insensitive; `"header"` and `"footer"`
    /// return the existing header/footer when there is one.
    pub fn add_row(&self, name: &str) -> RowMut<'_> {
        let id = self.write().add_row(name);
        RowMut { table: self, id }
    }

    /// Set the display format of columns (e.g. `"%.2f"`).
    pub fn set_format<I, S>(&self, format: &str, columns: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut data = self.write();
        let indexes = data.resolve_columns("set_format", columns)?;
        for index in indexes {
            data.formats.insert(index, format.to_string());
        }
        Ok(())
    }

    /// Fix the content width of columns, bypassing measurement. A width of
    /// 0 hides the column.
    pub fn set_column_width<I, S>(&self, width: usize, columns: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut data = self.write();
        let indexes = data.resolve_columns("set_column_width", columns)?;
        for index in indexes {
            data.widths.insert(index, width);
        }
        Ok(())
    }

    /// Eagerly rewrite the values of body cells in the given columns. List
    /// values are transformed element by element.
    pub fn transform<F, I, S>(&self, f: F, columns: I) -> Result<()>
    where
        F: Fn(&Value) -> Value,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut data = self.write();
        let indexes = data.resolve_columns("transform", columns)?;
        for row in data.rows.iter_mut().filter(|r| r.kind == RowKind::Body) {
            for &j in &indexes {
                let Some(cell) = row.cells.get_mut(j) else {
                    continue;
                };
                cell.value = match &cell.value {
                    Value::List(items) => Value::List(items.iter().map(&f).collect()),
                    other => f(other),
                };
            }
        }
        Ok(())
    }

    /// The nth row in table order (header and footer included).
    pub fn row(&self, nth: usize) -> Result<RowMut<'_>> {
        let id = self
            .read()
            .rows
            .get(nth)
            .map(|r| r.id)
            .ok_or(GridlineError::RowOutOfRange(nth))?;
        Ok(RowMut { table: self, id })
    }

    /// The first row with the given name (case-insensitive).
    pub fn row_by_name(&self, name: &str) -> Result<RowMut<'_>> {
        let data = self.read();
        match data.find_name(name) {
            Some(index) => Ok(RowMut {
                table: self,
                id: data.rows[index].id,
            }),
            None => Err(GridlineError::RowNotFound(name.to_lowercase())),
        }
    }

    /// Number of rows, header and footer included
    pub fn row_count(&self) -> usize {
        self.read().rows.len()
    }

    /// Row names in table order
    pub fn row_names(&self) -> Vec<String> {
        self.read().rows.iter().map(|r| r.name.clone()).collect()
    }

    /// A new table with the body rows for which `keep` returns true, given
    /// the values of `columns` (missing cells are `Null`). The header is always
    /// kept, the footer on request.
    pub fn filter<F, I, S>(&self, keep: F, keep_footer: bool, columns: I) -> Result<Table>
    where
        F: Fn(&[Value]) -> bool,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let data = self.read();
        let rows = filter_rows(&data, &keep, keep_footer, columns)?;
        Ok(Table::from_data(data.with_rows(rows)))
    }

    /// Like [`Table::filter`], but drops the rejected rows from this table.
    pub fn filter_in_place<F, I, S>(&self, keep: F, keep_footer: bool, columns: I) -> Result<()>
    where
        F: Fn(&[Value]) -> bool,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut data = self.write();
        data.rows = filter_rows(&data, &keep, keep_footer, columns)?;
        Ok(())
    }

    /// A new table with the body rows whose name passes `keep`. Unnamed rows
    /// are tested with `""`.
    pub fn filter_by_row_names<F>(&self, keep: F, keep_footer: bool) -> Table
    where
        F: Fn(&str) -> bool,
    {
        let data = self.read();
        let rows = data.select_rows(keep_footer, |row| keep(&row.name));
        Table::from_data(data.with_rows(rows))
    }

    /// Like [`Table::filter_by_row_names`], but in place.
    pub fn filter_by_row_names_in_place<F>(&self, keep: F, keep_footer: bool)
    where
        F: Fn(&str) -> bool,
    {
        let mut data = self.write();
        data.rows = data.select_rows(keep_footer, |row| keep(&row.name));
    }

    /// Remove rows by index. Either all given rows are removed or, on error,
    /// none are.
    pub fn remove_rows(&self, indexes: &[usize]) -> Result<()> {
        let mut data = self.write();
        for &nth in indexes {
            let row = data.rows.get(nth).ok_or(GridlineError::RowOutOfRange(nth))?;
            if row.kind != RowKind::Body {
                return Err(GridlineError::ProtectedRow);
            }
        }
        remove_indexes(&mut data.rows, indexes.to_vec());
        Ok(())
    }

    /// Remove every row carrying one of the given names. Names that match
    /// nothing are ignored.
    pub fn remove_rows_by_name<I, S>(&self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut data = self.write();
        let names: Vec<String> = names.into_iter().map(|n| n.as_ref().to_lowercase()).collect();
        let mut selected = Vec::new();
        for (i, row) in data.rows.iter().enumerate() {
            if !names.contains(&row.name) {
                continue;
            }
            if row.kind != RowKind::Body {
                return Err(GridlineError::ProtectedRow);
            }
            selected.push(i);
        }
        remove_indexes(&mut data.rows, selected);
        Ok(())
    }
}

fn filter_rows<F, I, S>(data: &TableData, keep: &F, keep_footer: bool, columns: I) -> Result<Vec<Row>>
where
    F: Fn(&[Value]) -> bool,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let indexes = data.resolve_columns("filter", columns)?;
    Ok(data.select_rows(keep_footer, |row| {
        let values: Vec<Value> = indexes
            .iter()
            .map(|&j| row.cells.get(j).map(|c| c.value.clone()).unwrap_or_default())
            .collect();
        keep(&values)
    }))
}

fn remove_indexes(rows: &mut Vec<Row>, mut indexes: Vec<usize>) {
    indexes.sort_unstable();
    indexes.dedup();
    for &nth in indexes.iter().rev() {
        rows.remove(nth);
    }
}

/// A handle on one row of a [`Table`].
///
/// Each call takes the table's lock for its own duration only, so every
/// single edit is atomic and the handle may outlive other table calls. Calls
/// on a row that has been removed in the meantime do nothing.
#[derive(Debug, Clone, Copy)]
pub struct RowMut<'a> {
    table: &'a Table,
    id: u64,
}

impl RowMut<'_> {
    fn inspect<T>(&self, f: impl FnOnce(&Row) -> T) -> Option<T> {
        let data = self.table.read();
        data.position(self.id).map(|index| f(&data.rows[index]))
    }

    fn edit(self, f: impl FnOnce(&mut TableData, usize)) -> Self {
        let mut data = self.table.write();
        match data.position(self.id) {
            Some(index) => f(&mut *data, index),
            None => tracing::debug!(row = self.id, "row no longer exists, edit skipped"),
        }
        self
    }

    /// Lower-cased row name, `None` once the row is gone
    pub fn name(&self) -> Option<String> {
        self.inspect(|row| row.name.clone())
    }

    pub fn kind(&self) -> Option<RowKind> {
        self.inspect(|row| row.kind)
    }

    /// Raw values of the row (empty once the row is gone)
    pub fn values(&self) -> Vec<Value> {
        self.inspect(Row::values).unwrap_or_default()
    }

    /// Append values as new cells.
    pub fn insert<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let cells: Vec<Cell> = values.into_iter().map(Cell::new).collect();
        self.edit(|data, index| data.rows[index].cells.extend(cells))
    }

    /// Append a single value.
    pub fn push(self, value: impl Into<Value>) -> Self {
        self.insert([value.into()])
    }

    /// Replace the value in a named column and reset its transform. A row
    /// shorter than the column is padded with empty cells; an unknown column
    /// is ignored.
    pub fn change(self, column: &str, value: impl Into<Value>) -> Self {
        let cell = Cell::new(value);
        self.edit(|data, index| {
            let Some(j) = data.column_index(column) else {
                tracing::debug!(column, "change: unknown column skipped");
                return;
            };
            let cells = &mut data.rows[index].cells;
            if cells.len() <= j {
                cells.resize_with(j + 1, Cell::default);
            }
            cells[j] = cell;
        })
    }

    /// Attach a deferred transform to the named columns. Unknown columns and
    /// cells this row does not have are skipped.
    pub fn modify<I, S>(self, transform: Transform, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.edit(|data, index| {
            let indexes = data.column_indexes(columns);
            for j in indexes {
                if let Some(cell) = data.rows[index].cells.get_mut(j) {
                    cell.transform = transform.clone();
                }
            }
        })
    }
}
