//! pkgfmt: read, edit and canonically re-emit PKGBUILD build recipes.
//!
//! ```
//! use pkgfmt::{parse, render_lines, Tables};
//!
//! let tables = Tables::standard();
//! let mut doc = parse("pkgrel=1\npkgver=1.0\n", tables).unwrap();
//! doc.set_variable(tables, "pkgrel", &["2"], false);
//! assert_eq!(render_lines(&doc, tables), vec!["pkgver=1.0", "pkgrel=2"]);
//! ```

pub mod error;
pub mod model;
pub mod parser;
pub mod render;
pub mod tables;

pub use error::{EditError, ParseError};
pub use model::{Category, Document, Entry, OrderIndex, Value, ValueKind};
pub use parser::{parse, parse_partial};
pub use render::pkgbuild::lines as render_lines;
pub use tables::{Style, Tables};

/// Parse `input` and render it back in canonical layout.
pub fn format(input: &str, tables: &Tables) -> Result<String, ParseError> {
    let doc = parse(input, tables)?;
    Ok(render::pkgbuild::text(&doc, tables))
}
