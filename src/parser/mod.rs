//! Model builder: turns classified lines into a [`Document`].

pub mod classify;
pub mod quote;

use crate::error::ParseError;
use crate::model::{Category, Document, Entry, Value, ValueKind, BLANK, UNKNOWN};
use crate::tables::Tables;
use classify::{classify, Classified, LineKind};

/// Parse a recipe, failing on the first unterminated block.
pub fn parse(input: &str, tables: &Tables) -> Result<Document, ParseError> {
    match parse_partial(input, tables) {
        (doc, None) => Ok(doc),
        (_, Some(err)) => Err(err),
    }
}

/// Parse a recipe, returning every entry read before an error along with
/// the error itself.
pub fn parse_partial(input: &str, tables: &Tables) -> (Document, Option<ParseError>) {
    let lines: Vec<&str> = input.lines().collect();
    let mut doc = Document::new();
    // Consecutive blank/comment lines accumulate here until something else
    // shows up.
    let mut pending_blank: Option<Entry> = None;
    let mut index = 0;

    while index < lines.len() {
        let unit = match classify(&lines, index) {
            Ok(unit) => unit,
            Err(err) => {
                log::debug!("stopping at {}", err);
                doc.insert(pending_blank);
                return (doc, Some(err));
            }
        };
        index = unit.end;

        if unit.kind == LineKind::BlankComment {
            let group = pending_blank.get_or_insert_with(|| {
                Entry::spanning(Category::BlankComment, BLANK, unit.begin, unit.end)
            });
            group.end = Some(unit.end);
            group.values.extend(line_values(&unit));
            continue;
        }

        doc.insert(pending_blank.take());
        let entry = build_entry(unit, tables);
        log::debug!(
            "{} {:?} at lines {}-{}",
            entry.name(),
            entry.category,
            entry.begin.unwrap_or(0),
            entry.end.unwrap_or(0)
        );
        doc.insert([entry]);
    }

    doc.insert(pending_blank);
    (doc, None)
}

fn build_entry(unit: Classified, tables: &Tables) -> Entry {
    let (category, name, is_array, values) = match &unit.kind {
        LineKind::Variable {
            name,
            array,
            tokens,
        } => {
            let kind = if *array {
                ValueKind::Element
            } else {
                ValueKind::Scalar
            };
            let values = tokens
                .iter()
                .map(|t| Value::new(Some(unit.begin), t.clone(), kind))
                .collect();
            (Category::of_variable(tables, name), name.as_str(), *array, values)
        }
        LineKind::Function { name } => (
            Category::of_function(tables, name),
            name.as_str(),
            false,
            line_values(&unit),
        ),
        LineKind::Unknown => (Category::Unknown, UNKNOWN, false, line_values(&unit)),
        LineKind::BlankComment => (Category::BlankComment, BLANK, false, line_values(&unit)),
    };
    let mut entry = Entry::spanning(category, name, unit.begin, unit.end);
    entry.array = is_array;
    entry.values = values;
    entry
}

fn line_values(unit: &Classified) -> Vec<Value> {
    unit.lines
        .iter()
        .enumerate()
        .map(|(i, l)| Value::new(Some(unit.begin + i), l.clone(), ValueKind::Line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::Style;

    const NANO: &str = r#"# Maintainer: someone

pkgname=nano
pkgver=8.5
pkgrel=2
pkgdesc="A small and friendly text editor"
arch=('x86_64')
depends=('ncurses' 'file')
_extra=(a b "c d")
source=("https://nano-editor.org/dist/v8/nano-$pkgver.tar.xz"
        "nano.patch")

build() {
  cd "$pkgname-$pkgver"
  make
}

package() {
  make DESTDIR="$pkgdir" install
}
"#;

    #[test]
    fn categorizes_entries() {
        let doc = parse(NANO, Tables::standard()).unwrap();
        assert_eq!(
            doc.get("pkgdesc").unwrap().category,
            Category::Variable(Style::SingleQuoted)
        );
        assert_eq!(doc.get("_extra").unwrap().category, Category::UnknownVariable);
        assert_eq!(doc.get("build").unwrap().category, Category::Function);
        assert_eq!(doc.get("package").unwrap().values.len(), 3);
    }

    #[test]
    fn values_keep_raw_text() {
        let doc = parse(NANO, Tables::standard()).unwrap();
        let extra = doc.get("_extra").unwrap();
        let raw: Vec<&str> = extra.values.iter().map(|v| v.text.as_str()).collect();
        assert_eq!(raw, vec!["a", "b", "\"c d\""]);
        assert_eq!(extra.unquoted(), vec!["a", "b", "c d"]);
        assert!(extra.array);
        assert!(!doc.get("pkgver").unwrap().array);
        assert_eq!(doc.get("depends").unwrap().unquoted(), vec!["ncurses", "file"]);
    }

    #[test]
    fn multi_line_source_is_one_entry() {
        let doc = parse(NANO, Tables::standard()).unwrap();
        let source = doc.get("source").unwrap();
        assert_eq!((source.begin, source.end), (Some(10), Some(11)));
        assert_eq!(source.values.len(), 2);
    }

    #[test]
    fn blank_comment_runs_are_grouped() {
        let doc = parse(NANO, Tables::standard()).unwrap();
        let blanks = doc.get_all(BLANK);
        // header + blank before build + blank before package
        assert_eq!(blanks.len(), 3);
        assert_eq!(blanks[0].values.len(), 2);
        assert_eq!((blanks[0].begin, blanks[0].end), (Some(1), Some(2)));
    }

    #[test]
    fn split_functions_are_tagged() {
        let input = "pkgname=(a b)\npackage_a() {\n  true\n}\npkgver() {\n  echo 1\n}\n";
        let doc = parse(input, Tables::standard()).unwrap();
        assert_eq!(doc.get("package_a").unwrap().category, Category::SplitFunction);
        // the pkgver() function shares its key with the pkgver variable
        assert_eq!(doc.get("pkgver").unwrap().category, Category::UnknownFunction);
    }

    #[test]
    fn partial_parse_keeps_completed_entries() {
        let input = "pkgver=1\n# trailing\nbuild() {\n  make\n";
        let (doc, err) = parse_partial(input, Tables::standard());
        assert_eq!(
            err,
            Some(ParseError::UnclosedFunction {
                name: "build".into(),
                line: 3
            })
        );
        assert!(doc.get("pkgver").is_some());
        assert!(doc.get(BLANK).is_some());
        assert!(doc.get("build").is_none());
        assert!(parse(input, Tables::standard()).is_err());
    }

    #[test]
    fn empty_input_is_empty_document() {
        assert!(parse("", Tables::standard()).unwrap().is_empty());
    }
}
