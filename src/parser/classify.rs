//! Line classifier: decides what a physical line starts and where it ends.
//!
//! Knows shell syntax only; which names are "known" is decided by the
//! builder in [`super::parse_partial`].

use super::quote::{scan_value, BraceCounter, Scan};
use crate::error::ParseError;
use regex::Regex;
use std::sync::LazyLock;

static RE_ASSIGN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[[:blank:]]*([A-Za-z_][A-Za-z0-9_]*)=(.*)$").unwrap());

// `name() {`, `name()` (brace on a later line), `function name {`
static RE_FUNC_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^[[:blank:]]*(?:function[[:blank:]]+([A-Za-z_][A-Za-z0-9_:.-]*)[[:blank:]]*(?:\([[:blank:]]*\))?",
        r"|([A-Za-z_][A-Za-z0-9_:.-]*)[[:blank:]]*\([[:blank:]]*\))",
        r"[[:blank:]]*(\{.*)?$"
    ))
    .unwrap()
});

static RE_BLANK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[[:space:]]*(#.*)?$").unwrap());

/// Syntactic shape of a classified unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// `name=value` or `name=(...)`; tokens keep their quotes.
    Variable {
        name: String,
        array: bool,
        tokens: Vec<String>,
    },
    /// Header through closing brace.
    Function { name: String },
    BlankComment,
    Unknown,
}

/// One classified unit: a single line, or a block of lines read as one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub kind: LineKind,
    /// 1-based first line.
    pub begin: usize,
    /// 1-based last line, inclusive. Scanning resumes after it.
    pub end: usize,
    /// The physical lines `begin..=end`, without line terminators.
    pub lines: Vec<String>,
}

/// Classify the unit starting at `lines[index]` (0-based).
pub fn classify(lines: &[&str], index: usize) -> Result<Classified, ParseError> {
    let line = strip_cr(lines[index]);

    if let Some(caps) = RE_ASSIGN.captures(line) {
        return classify_assignment(lines, index, &caps[1], &caps[2]);
    }

    if let Some(caps) = RE_FUNC_DECL.captures(line) {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map_or("", |m| m.as_str())
            .to_string();
        return classify_function(lines, index, name);
    }

    let kind = if RE_BLANK_COMMENT.is_match(line) {
        LineKind::BlankComment
    } else {
        LineKind::Unknown
    };
    Ok(unit(kind, lines, index, index))
}

fn classify_assignment(
    lines: &[&str],
    index: usize,
    name: &str,
    value: &str,
) -> Result<Classified, ParseError> {
    let mut text = value.to_string();
    let mut end = index;
    loop {
        match scan_value(&text) {
            Scan::Complete { array, tokens } => {
                let kind = LineKind::Variable {
                    name: name.to_string(),
                    array,
                    tokens,
                };
                return Ok(unit(kind, lines, index, end));
            }
            Scan::Invalid => {
                log::debug!(
                    "line {}: assignment to {} is not a plain value, keeping it verbatim",
                    index + 1,
                    name
                );
                return Ok(unit(LineKind::Unknown, lines, index, end));
            }
            Scan::Incomplete => {
                end += 1;
                if end >= lines.len() {
                    return Err(ParseError::UnclosedValue {
                        name: name.to_string(),
                        line: index + 1,
                    });
                }
                text.push('\n');
                text.push_str(strip_cr(lines[end]));
            }
        }
    }
}

fn classify_function(lines: &[&str], index: usize, name: String) -> Result<Classified, ParseError> {
    let mut braces = BraceCounter::default();
    braces.feed(strip_cr(lines[index]));
    let mut end = index;
    while !braces.is_closed() {
        end += 1;
        if end >= lines.len() {
            return Err(ParseError::UnclosedFunction {
                name,
                line: index + 1,
            });
        }
        braces.feed(strip_cr(lines[end]));
    }
    Ok(unit(LineKind::Function { name }, lines, index, end))
}

fn unit(kind: LineKind, lines: &[&str], begin: usize, end: usize) -> Classified {
    Classified {
        kind,
        begin: begin + 1,
        end: end + 1,
        lines: lines[begin..=end]
            .iter()
            .map(|l| strip_cr(l).to_string())
            .collect(),
    }
}

fn strip_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(line: &str) -> Classified {
        classify(&[line], 0).unwrap()
    }

    #[test]
    fn scalar_assignment() {
        let c = one("pkgver=1.2.3");
        assert_eq!(
            c.kind,
            LineKind::Variable {
                name: "pkgver".into(),
                array: false,
                tokens: vec!["1.2.3".into()]
            }
        );
        assert_eq!((c.begin, c.end), (1, 1));
    }

    #[test]
    fn array_assignment_with_crlf_and_trailing_space() {
        let c = one("arch=('x86_64' 'i686')  \r");
        assert_eq!(
            c.kind,
            LineKind::Variable {
                name: "arch".into(),
                array: true,
                tokens: vec!["'x86_64'".into(), "'i686'".into()]
            }
        );
        assert_eq!(c.lines, vec!["arch=('x86_64' 'i686')  "]);
    }

    #[test]
    fn multi_line_array_spans_lines() {
        let lines = ["sha256sums=('aa'", "            'bb'", "            'cc')", "pkgrel=1"];
        let c = classify(&lines, 0).unwrap();
        assert_eq!((c.begin, c.end), (1, 3));
        match c.kind {
            LineKind::Variable { tokens, .. } => assert_eq!(tokens.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn commented_array_is_unknown_block() {
        let lines = ["source=('a' # upstream", "        'b')"];
        let c = classify(&lines, 0).unwrap();
        assert_eq!(c.kind, LineKind::Unknown);
        assert_eq!(c.end, 2);
    }

    #[test]
    fn unclosed_array_is_an_error() {
        let lines = ["depends=('a'", "'b'"];
        assert_eq!(
            classify(&lines, 0),
            Err(ParseError::UnclosedValue {
                name: "depends".into(),
                line: 1
            })
        );
    }

    #[test]
    fn function_body_is_one_unit() {
        let lines = ["build() {", "  cd \"$srcdir\"", "  make", "}", "x=1"];
        let c = classify(&lines, 0).unwrap();
        assert_eq!(c.kind, LineKind::Function { name: "build".into() });
        assert_eq!((c.begin, c.end), (1, 4));
        assert_eq!(c.lines.len(), 4);
    }

    #[test]
    fn nested_braces_do_not_close_early() {
        let lines = [
            "package_foo() {",
            "  if true; then {",
            "    echo;",
            "  }",
            "  fi",
            "}",
        ];
        let c = classify(&lines, 0).unwrap();
        assert_eq!(c.kind, LineKind::Function { name: "package_foo".into() });
        assert_eq!(c.end, 6);
    }

    #[test]
    fn function_keyword_and_one_liner() {
        assert_eq!(
            one("function check { make test; }").kind,
            LineKind::Function { name: "check".into() }
        );
        assert_eq!(one("prepare() { true; }").end, 1);
    }

    #[test]
    fn unclosed_function_reports_start_line() {
        let lines = ["# header", "package() {", "  make install"];
        assert_eq!(
            classify(&lines, 1),
            Err(ParseError::UnclosedFunction {
                name: "package".into(),
                line: 2
            })
        );
    }

    #[test]
    fn blank_comment_and_unknown() {
        assert_eq!(one("").kind, LineKind::BlankComment);
        assert_eq!(one("   # Maintainer: someone").kind, LineKind::BlankComment);
        assert_eq!(one("   \t").kind, LineKind::BlankComment);
        assert_eq!(one("export LANG=C").kind, LineKind::Unknown);
        assert_eq!(one("pkgver=1 # bump").kind, LineKind::Unknown);
        assert_eq!(one("depends+=(foo)").kind, LineKind::Unknown);
    }
}
