//! Recognized-name tables: which variables and functions get canonical layout.
//!
//! The variable table is ordered: its order is the order in which the
//! renderer emits known variables.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// How a known variable is laid out on output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Style {
    /// `name=value`
    Single,
    /// `name="value"`
    SingleQuoted,
    /// `name=value` for one element, `name=(a b)` otherwise
    Optional,
    /// Like [`Style::Optional`], elements quoted
    OptionalQuoted,
    /// Always `name=(a b)`
    Array,
    /// Always `name=('a' 'b')`
    ArrayQuoted,
    /// One quoted element per line, aligned under the first
    Multiline,
}

impl Style {
    pub fn is_list(self) -> bool {
        !matches!(self, Style::Single | Style::SingleQuoted)
    }

    pub fn is_quoted(self) -> bool {
        matches!(
            self,
            Style::SingleQuoted | Style::OptionalQuoted | Style::ArrayQuoted | Style::Multiline
        )
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Style::Single => "single",
            Style::SingleQuoted => "single-quoted",
            Style::Optional => "optional",
            Style::OptionalQuoted => "optional-quoted",
            Style::Array => "array",
            Style::ArrayQuoted => "array-quoted",
            Style::Multiline => "multiline",
        };
        f.write_str(s)
    }
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Style::Single),
            "single-quoted" => Ok(Style::SingleQuoted),
            "optional" => Ok(Style::Optional),
            "optional-quoted" => Ok(Style::OptionalQuoted),
            "array" => Ok(Style::Array),
            "array-quoted" => Ok(Style::ArrayQuoted),
            "multiline" => Ok(Style::Multiline),
            _ => Err(format!(
                "unknown style: {}. Use single, single-quoted, optional, optional-quoted, array, array-quoted or multiline",
                s
            )),
        }
    }
}

/// Default known variables, in canonical output order.
const STANDARD_VARIABLES: &[(&str, Style)] = &[
    ("pkgbase", Style::Single),
    ("pkgname", Style::Optional),
    ("pkgver", Style::Single),
    ("pkgrel", Style::Single),
    ("epoch", Style::Single),
    ("pkgdesc", Style::SingleQuoted),
    ("arch", Style::Optional),
    ("url", Style::SingleQuoted),
    ("license", Style::ArrayQuoted),
    ("groups", Style::ArrayQuoted),
    ("depends", Style::ArrayQuoted),
    ("makedepends", Style::ArrayQuoted),
    ("checkdepends", Style::ArrayQuoted),
    ("optdepends", Style::Multiline),
    ("provides", Style::ArrayQuoted),
    ("conflicts", Style::ArrayQuoted),
    ("replaces", Style::ArrayQuoted),
    ("backup", Style::ArrayQuoted),
    ("options", Style::Array),
    ("install", Style::Single),
    ("changelog", Style::Single),
    ("source", Style::Multiline),
    ("noextract", Style::Multiline),
    ("validpgpkeys", Style::Multiline),
    ("md5sums", Style::Multiline),
    ("sha1sums", Style::Multiline),
    ("sha224sums", Style::Multiline),
    ("sha256sums", Style::Multiline),
    ("sha384sums", Style::Multiline),
    ("sha512sums", Style::Multiline),
    ("b2sums", Style::Multiline),
];

/// Build lifecycle functions, in output order.
const STANDARD_FUNCTIONS: &[&str] = &["prepare", "build", "check", "package"];

/// Functions named `package_<sub>` build one package of a split PKGBUILD.
pub const SPLIT_PREFIX: &str = "package_";

static STANDARD: LazyLock<Tables> = LazyLock::new(|| Tables {
    variables: STANDARD_VARIABLES
        .iter()
        .map(|(name, style)| (name.to_string(), *style))
        .collect(),
    functions: STANDARD_FUNCTIONS.iter().map(|f| f.to_string()).collect(),
    split_prefix: SPLIT_PREFIX.to_string(),
});

/// Immutable lookup tables shared by the parser and the renderer.
#[derive(Debug, Clone)]
pub struct Tables {
    variables: IndexMap<String, Style>,
    functions: Vec<String>,
    split_prefix: String,
}

impl Tables {
    /// The built-in tables for makepkg recipes.
    pub fn standard() -> &'static Tables {
        &STANDARD
    }

    /// Copy of these tables with `name` known and laid out as `style`.
    pub fn with_style(&self, name: &str, style: Style) -> Tables {
        let mut tables = self.clone();
        tables.variables.insert(name.to_string(), style);
        tables
    }

    pub fn style(&self, name: &str) -> Option<Style> {
        self.variables.get(name).copied()
    }

    pub fn is_known_function(&self, name: &str) -> bool {
        self.functions.iter().any(|f| f == name)
    }

    pub fn is_split_function(&self, name: &str) -> bool {
        name.starts_with(&self.split_prefix)
    }

    /// Known variable names in canonical order.
    pub fn variable_order(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// Known function names in lifecycle order.
    pub fn function_order(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(String::as_str)
    }
}
