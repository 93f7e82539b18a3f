//! In-memory model of a parsed recipe, with entries grouped by name.

use crate::error::EditError;
use crate::parser::quote;
use crate::tables::{Style, Tables};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;

/// Name under which blank and comment groups are stored.
pub const BLANK: &str = "<blank>";
/// Name under which unrecognized lines are stored.
pub const UNKNOWN: &str = "<unknown>";

/// Which kind of source text a value was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Right-hand side of `name=value`
    Scalar,
    /// One element of `name=(...)`
    Element,
    /// A whole physical line (function bodies, comments, unknown lines)
    Line,
}

/// One datum of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Value {
    /// 1-based source line; `None` for values added after parsing.
    pub line: Option<usize>,
    /// Raw payload, quotes included.
    pub text: String,
    pub kind: ValueKind,
}

impl Value {
    pub fn new(line: Option<usize>, text: impl Into<String>, kind: ValueKind) -> Self {
        Value {
            line,
            text: text.into(),
            kind,
        }
    }

    /// The payload with shell quoting resolved.
    pub fn unquoted(&self) -> String {
        match self.kind {
            ValueKind::Line => self.text.clone(),
            _ => quote::unquote(&self.text),
        }
    }
}

/// What an entry is, and for known variables how it is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "style", rename_all = "kebab-case")]
pub enum Category {
    Variable(Style),
    UnknownVariable,
    Function,
    SplitFunction,
    UnknownFunction,
    Unknown,
    BlankComment,
}

impl Category {
    pub fn of_variable(tables: &Tables, name: &str) -> Self {
        match tables.style(name) {
            Some(style) => Category::Variable(style),
            None => Category::UnknownVariable,
        }
    }

    pub fn of_function(tables: &Tables, name: &str) -> Self {
        if tables.is_split_function(name) {
            Category::SplitFunction
        } else if tables.is_known_function(name) {
            Category::Function
        } else {
            Category::UnknownFunction
        }
    }
}

/// A named, line-ranged unit of the recipe.
///
/// The name is fixed at construction: a [`Document`] files each entry
/// under its own name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub category: Category,
    name: String,
    /// First source line, `None` for entries added after parsing.
    pub begin: Option<usize>,
    /// Last source line, inclusive.
    pub end: Option<usize>,
    /// Variables only: the value was written as `name=(...)`.
    pub array: bool,
    pub values: Vec<Value>,
}

impl Entry {
    pub fn new(category: Category, name: impl Into<String>) -> Self {
        Entry {
            category,
            name: name.into(),
            begin: None,
            end: None,
            array: false,
            values: Vec::new(),
        }
    }

    /// An entry read from source lines `begin..=end`.
    pub fn spanning(category: Category, name: impl Into<String>, begin: usize, end: usize) -> Self {
        Entry {
            begin: Some(begin),
            end: Some(end),
            ..Entry::new(category, name)
        }
    }

    /// A synthetic variable entry, categorized against `tables`. More than
    /// one value always makes an array.
    pub fn variable(tables: &Tables, name: &str, values: &[&str], array: bool) -> Self {
        let mut entry = Entry::new(Category::of_variable(tables, name), name);
        entry.array = array || values.len() != 1;
        let kind = if entry.array {
            ValueKind::Element
        } else {
            ValueKind::Scalar
        };
        for v in values {
            entry.push(*v, kind);
        }
        entry
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn push(&mut self, text: impl Into<String>, kind: ValueKind) {
        self.values.push(Value::new(None, text, kind));
    }

    /// Replace the text of value `index`, or delete the value when `text`
    /// is empty.
    pub fn set(&mut self, index: usize, text: &str) -> Result<(), EditError> {
        let len = self.values.len();
        if index >= len {
            return Err(EditError::OutOfRange { index, len });
        }
        if text.is_empty() {
            self.values.remove(index);
        } else {
            self.values[index].text = text.to_string();
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values with quoting resolved, e.g. the list of dependencies.
    pub fn unquoted(&self) -> Vec<String> {
        self.values.iter().map(Value::unquoted).collect()
    }
}

/// Parsed recipe: entries keyed by name, duplicates kept in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Document {
    entries: IndexMap<String, Vec<Entry>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append entries under their names. Never merges or overwrites.
    pub fn insert(&mut self, entries: impl IntoIterator<Item = Entry>) {
        for entry in entries {
            self.entries.entry(entry.name.clone()).or_default().push(entry);
        }
    }

    /// Remove the `index`-th entry named `name`.
    pub fn remove(&mut self, name: &str, index: usize) -> Result<Entry, EditError> {
        let list = self
            .entries
            .get_mut(name)
            .ok_or_else(|| EditError::UnknownName(name.to_string()))?;
        if index >= list.len() {
            return Err(EditError::OutOfRange {
                index,
                len: list.len(),
            });
        }
        Ok(list.remove(index))
    }

    /// Remove every entry named `name`, returning how many were dropped.
    pub fn remove_all(&mut self, name: &str) -> usize {
        self.entries.shift_remove(name).map_or(0, |list| list.len())
    }

    /// First entry named `name`.
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name).and_then(|list| list.first())
    }

    pub fn get_all(&self, name: &str) -> &[Entry] {
        self.entries.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get_mut(&mut self, name: &str, index: usize) -> Option<&mut Entry> {
        self.entries.get_mut(name).and_then(|list| list.get_mut(index))
    }

    /// Replace the values of the first `name` variable, inserting a new
    /// entry when there is none. An existing array stays an array.
    pub fn set_variable(&mut self, tables: &Tables, name: &str, values: &[&str], array: bool) {
        let existing = self.entries.get_mut(name).and_then(|list| {
            list.iter_mut().find(|e| {
                matches!(e.category, Category::Variable(_) | Category::UnknownVariable)
            })
        });
        match existing {
            Some(entry) => {
                let replacement = Entry::variable(tables, name, values, array || entry.array);
                // Keep the source position so the entry stays where it was.
                let line = entry.begin;
                entry.array = replacement.array;
                entry.values = replacement
                    .values
                    .into_iter()
                    .map(|v| Value { line, ..v })
                    .collect();
            }
            None => self.insert([Entry::variable(tables, name, values, array)]),
        }
    }

    /// Every entry, grouped by name.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry_at(&self, r: EntryRef) -> &Entry {
        &self.entries[r.key][r.pos]
    }
}

/// Position of an entry inside a [`Document`]: name slot and list index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryRef {
    key: usize,
    pos: usize,
}

/// Entries sorted by source position, with each entry's predecessor.
///
/// Derived from a document and rebuilt for every render; entries added
/// after parsing sort after all source entries.
pub struct OrderIndex<'a> {
    doc: &'a Document,
    order: Vec<EntryRef>,
    rank: HashMap<EntryRef, usize>,
}

impl<'a> OrderIndex<'a> {
    pub fn new(doc: &'a Document) -> Self {
        let mut order: Vec<EntryRef> = doc
            .entries
            .values()
            .enumerate()
            .flat_map(|(key, list)| (0..list.len()).map(move |pos| EntryRef { key, pos }))
            .collect();
        order.sort_by_key(|r| {
            let begin = doc.entry_at(*r).begin;
            (begin.is_none(), begin.unwrap_or(0))
        });
        let rank = order.iter().enumerate().map(|(i, r)| (*r, i)).collect();
        OrderIndex { doc, order, rank }
    }

    pub fn entry(&self, r: EntryRef) -> &'a Entry {
        self.doc.entry_at(r)
    }

    /// All entries in source order.
    pub fn iter(&self) -> impl Iterator<Item = EntryRef> + '_ {
        self.order.iter().copied()
    }

    pub fn previous(&self, r: EntryRef) -> Option<EntryRef> {
        match self.rank.get(&r) {
            Some(&i) if i > 0 => Some(self.order[i - 1]),
            _ => None,
        }
    }

    /// Entries named `name`, in source order.
    pub fn named(&self, name: &str) -> Vec<EntryRef> {
        let Some(key) = self.doc.entries.get_index_of(name) else {
            return Vec::new();
        };
        let mut refs: Vec<EntryRef> = (0..self.doc.entries[key].len())
            .map(|pos| EntryRef { key, pos })
            .collect();
        refs.sort_by_key(|r| self.rank[r]);
        refs
    }
}
