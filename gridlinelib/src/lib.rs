//! # gridlinelib
//!
//! Box-drawn text tables for terminals and logs.
//!
//! ## Overview
//!
//! A [`Table`] is a thread-safe store of rows (an optional header, body rows
//! and an optional footer) plus per-column formats and width overrides,
//! titles and footnotes. Rendering lays the rows out on a shared column grid
//! and draws them with a [`Style`]:
//!
//! - **Widths**: every column is as wide as its widest line, unless
//!   overridden. A width of 0 hides the column.
//! - **Multi-line cells**: embedded newlines and list values span several
//!   physical lines; shorter cells are centered vertically.
//! - **Deferred transforms**: a [`Transform`] attached to a cell changes what
//!   is printed (colors, units, ...) without touching the stored value.
//!   Widths can be measured on either form, so invisible escape codes do not
//!   break the grid.
//! - **JSON interchange**: rich JSON keeps everything, vanilla JSON is a plain
//!   array of objects.
//!
//! ## Example
//!
//! ```rust
//! use gridlinelib::{values, OutputWidth, RenderOptions, Style, Table};
//!
//! let table = Table::new(["ID", "Client", "Amount"]);
//! table.add_row("").insert(values![1, "Acme", 100]);
//! table.add_row("").insert(values![2, "IronMountain", 200]);
//!
//! let options = RenderOptions::new().output_width(OutputWidth::Unknown);
//! let out = table.render_to_string(&options, &Style::named("classic"));
//! assert_eq!(out.lines().next(), Some("╔════╤══════════════╤════════╗"));
//!
//! // Columns can be selected and reordered by name
//! let out = table.render_to_string(&options.columns(["client"]), &Style::ascii());
//! assert!(out.starts_with("+--------------+"));
//! ```

pub mod compose;
pub mod error;
pub mod format;
pub mod json;
pub mod render;
pub mod style;
pub mod table;
pub mod transform;
pub mod value;
pub mod widths;

pub use compose::Layout;
pub use error::GridlineError;
pub use format::Format;
pub use render::{OutputWidth, RenderOptions};
pub use style::{Band, Border, RowPosition, Skip, Style, Walls};
pub use table::{Cell, Row, RowKind, RowMut, Table, TableData};
pub use transform::Transform;
pub use value::Value;

/// Result type for gridlinelib operations
pub type Result<T> = std::result::Result<T, GridlineError>;
