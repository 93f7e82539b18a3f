//! Canonical PKGBUILD renderer.
//!
//! Output order:
//!
//! 1. the comment block opening the file
//! 2. known variables, in table order
//! 3. unrecognized variables
//! 4. lifecycle functions (`prepare`, `build`, `check`, `package`)
//! 5. split-package functions, other functions, unrecognized lines
//!
//! Within each step, entries keep their source order. A blank/comment group
//! travels with the entry that follows it in the source; groups with nothing
//! after them close the file.

use crate::model::{Category, Document, Entry, EntryRef, OrderIndex, Value};
use crate::parser::quote::{quote, unquote_if_plain};
use crate::render::Renderer;
use crate::tables::{Style, Tables};
use anyhow::Result;
use std::collections::HashSet;

pub struct PkgbuildRenderer<'a> {
    tables: &'a Tables,
}

impl<'a> PkgbuildRenderer<'a> {
    pub fn new(tables: &'a Tables) -> Self {
        PkgbuildRenderer { tables }
    }
}

impl Renderer for PkgbuildRenderer<'_> {
    fn render(&self, doc: &Document) -> Result<String> {
        Ok(text(doc, self.tables))
    }

    fn name(&self) -> &str {
        "pkgbuild"
    }
}

/// Render `doc` as file contents: newline-terminated lines, or nothing for
/// an empty document.
pub fn text(doc: &Document, tables: &Tables) -> String {
    let lines = lines(doc, tables);
    if lines.is_empty() {
        return String::new();
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Render `doc` to output lines, without terminators.
pub fn lines(doc: &Document, tables: &Tables) -> Vec<String> {
    let index = OrderIndex::new(doc);
    let mut out = Emitter {
        index: &index,
        emitted: HashSet::new(),
        lines: Vec::new(),
    };

    if let Some(first) = index.iter().next() {
        if index.entry(first).category == Category::BlankComment {
            out.emit(first);
        }
    }

    for name in tables.variable_order() {
        out.emit_named(name, |c| matches!(c, Category::Variable(_)));
    }
    out.emit_where(|c| c == Category::UnknownVariable);

    for name in tables.function_order() {
        out.emit_named(name, |c| c == Category::Function);
    }
    out.emit_where(|c| c == Category::SplitFunction);
    out.emit_where(|c| c == Category::UnknownFunction);
    out.emit_where(|c| c == Category::Unknown);

    // Trailing comments, plus anything the tables no longer place.
    out.emit_where(|_| true);

    out.lines
}

struct Emitter<'i, 'd> {
    index: &'i OrderIndex<'d>,
    emitted: HashSet<EntryRef>,
    lines: Vec<String>,
}

impl Emitter<'_, '_> {
    fn emit_named(&mut self, name: &str, accept: impl Fn(Category) -> bool) {
        for r in self.index.named(name) {
            if accept(self.index.entry(r).category) {
                self.emit_attached(r);
            }
        }
    }

    fn emit_where(&mut self, accept: impl Fn(Category) -> bool) {
        let refs: Vec<EntryRef> = self
            .index
            .iter()
            .filter(|r| accept(self.index.entry(*r).category))
            .collect();
        for r in refs {
            self.emit_attached(r);
        }
    }

    /// Emit `r` preceded by the comment groups directly above it. Entries
    /// added after parsing have nothing above them.
    fn emit_attached(&mut self, r: EntryRef) {
        if self.emitted.contains(&r) {
            return;
        }
        let entry = self.index.entry(r);
        let mut comments = Vec::new();
        if entry.category != Category::BlankComment && entry.begin.is_some() {
            let mut prev = self.index.previous(r);
            while let Some(p) = prev {
                if self.emitted.contains(&p)
                    || self.index.entry(p).category != Category::BlankComment
                {
                    break;
                }
                comments.push(p);
                prev = self.index.previous(p);
            }
        }
        for c in comments.into_iter().rev() {
            self.emit(c);
        }
        self.emit(r);
    }

    fn emit(&mut self, r: EntryRef) {
        if self.emitted.insert(r) {
            self.lines.extend(entry_lines(self.index.entry(r)));
        }
    }
}

/// Lines for one entry, laid out according to its category.
pub fn entry_lines(entry: &Entry) -> Vec<String> {
    match entry.category {
        Category::Variable(style) => variable_lines(entry.name(), &entry.values, style),
        Category::UnknownVariable => unknown_variable_lines(entry),
        Category::Function
        | Category::SplitFunction
        | Category::UnknownFunction
        | Category::Unknown
        | Category::BlankComment => verbatim_lines(&entry.values),
    }
}

fn variable_lines(name: &str, values: &[Value], style: Style) -> Vec<String> {
    if values.is_empty() {
        return if style.is_list() {
            vec![format!("{}=()", name)]
        } else {
            Vec::new()
        };
    }

    let word = |v: &Value| {
        if style.is_quoted() {
            quote(&v.text)
        } else {
            unquote_if_plain(&v.text)
        }
    };
    let words: Vec<String> = values.iter().map(word).collect();

    let line = match style {
        Style::Single | Style::SingleQuoted | Style::Optional | Style::OptionalQuoted
            if words.len() == 1 =>
        {
            format!("{}={}", name, words[0])
        }
        Style::Multiline => return multiline(name, &words),
        _ => format!("{}=({})", name, words.join(" ")),
    };
    vec![line]
}

/// `name=(first` with each later word aligned under the first.
fn multiline(name: &str, words: &[String]) -> Vec<String> {
    let open = format!("{}=(", name);
    let indent = " ".repeat(open.chars().count());
    let last = words.len() - 1;
    words
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let lead = if i == 0 { open.as_str() } else { indent.as_str() };
            let close = if i == last { ")" } else { "" };
            format!("{}{}{}", lead, w, close)
        })
        .collect()
}

/// Raw words as written, in parentheses when the source had them. An
/// emptied scalar renders nothing.
fn unknown_variable_lines(entry: &Entry) -> Vec<String> {
    match entry.values.as_slice() {
        [] if !entry.array => Vec::new(),
        [v] if !entry.array => vec![format!("{}={}", entry.name(), v.text)],
        values => {
            let words: Vec<&str> = values.iter().map(|v| v.text.as_str()).collect();
            vec![format!("{}=({})", entry.name(), words.join(" "))]
        }
    }
}

/// Each value on its own line, collapsing runs of blank lines.
fn verbatim_lines(values: &[Value]) -> Vec<String> {
    let mut out = Vec::with_capacity(values.len());
    let mut blank = false;
    for v in values {
        let empty = v.text.is_empty();
        if !(empty && blank) {
            out.push(v.text.clone());
        }
        blank = empty;
    }
    out
}
