//! Quote-aware scanning of assignment values and function bodies.
//!
//! Values are split into raw words: quote characters stay in the payload,
//! so a word can be written back exactly as it was read. The rendering
//! helpers ([`quote`], [`unquote_if_plain`]) normalize quoting only when
//! doing so cannot change what the shell would see.

/// Outcome of scanning the right-hand side of `name=...`.
#[derive(Debug, PartialEq, Eq)]
pub enum Scan {
    /// A simple value. `array` is true for `(...)` values.
    Complete { array: bool, tokens: Vec<String> },
    /// A quote, group or paren is still open; more lines are needed.
    Incomplete,
    /// Not a plain assignment (trailing words, comments, operators).
    Invalid,
}

#[derive(Debug)]
enum Stop {
    Incomplete,
    Invalid,
}

/// Scan an assignment value, possibly spanning several lines joined by `\n`.
pub fn scan_value(text: &str) -> Scan {
    let chars: Vec<char> = text.chars().collect();
    if chars.first() == Some(&'(') {
        scan_array(&chars)
    } else {
        scan_scalar(&chars)
    }
}

fn scan_scalar(chars: &[char]) -> Scan {
    if chars.iter().all(|c| c.is_whitespace()) {
        return Scan::Complete {
            array: false,
            tokens: vec![String::new()],
        };
    }
    if chars[0].is_whitespace() {
        return Scan::Invalid;
    }
    match read_word(chars, 0) {
        Ok((word, end)) => {
            if chars[end..].iter().all(|c| c.is_whitespace()) {
                Scan::Complete {
                    array: false,
                    tokens: vec![word],
                }
            } else {
                Scan::Invalid
            }
        }
        Err(Stop::Incomplete) => Scan::Incomplete,
        Err(Stop::Invalid) => Scan::Invalid,
    }
}

fn scan_array(chars: &[char]) -> Scan {
    let mut tokens = Vec::new();
    // Comments inside arrays cannot be kept per element, but the array
    // still has to be read to its end.
    let mut commented = false;
    let mut i = 1;
    loop {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        if i >= chars.len() {
            return Scan::Incomplete;
        }
        match chars[i] {
            ')' => {
                return if !commented && chars[i + 1..].iter().all(|c| c.is_whitespace()) {
                    Scan::Complete {
                        array: true,
                        tokens,
                    }
                } else {
                    Scan::Invalid
                };
            }
            '#' => {
                commented = true;
                match chars[i..].iter().position(|&c| c == '\n') {
                    Some(n) => i += n,
                    None => return Scan::Incomplete,
                }
            }
            _ => match read_word(chars, i) {
                Ok((word, end)) => {
                    tokens.push(word);
                    i = end;
                }
                Err(Stop::Incomplete) => return Scan::Incomplete,
                Err(Stop::Invalid) => return Scan::Invalid,
            },
        }
    }
}

/// Read one shell word starting at `start`. Stops before unquoted
/// whitespace or `)`.
fn read_word(chars: &[char], start: usize) -> Result<(String, usize), Stop> {
    let mut i = start;
    while i < chars.len() {
        match chars[i] {
            c if c.is_whitespace() => break,
            ')' => break,
            '(' | ';' | '|' | '&' | '<' | '>' => return Err(Stop::Invalid),
            '\\' => {
                if i + 1 >= chars.len() {
                    // line continuation
                    return Err(Stop::Incomplete);
                }
                i += 2;
            }
            '\'' | '"' | '`' => {
                i = find_closing(chars, i).ok_or(Stop::Incomplete)? + 1;
            }
            '$' if matches!(chars.get(i + 1), Some('(') | Some('{')) => {
                i = find_group_end(chars, i + 1).ok_or(Stop::Incomplete)? + 1;
            }
            _ => i += 1,
        }
    }
    Ok((chars[start..i].iter().collect(), i))
}

/// Index of the quote closing the one at `open`. Backslash escapes apply
/// except inside single quotes.
fn find_closing(chars: &[char], open: usize) -> Option<usize> {
    let quote = chars[open];
    let mut i = open + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' if quote != '\'' => i += 2,
            c if c == quote => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Index of the bracket closing the `(` or `{` at `open`, skipping quoted text.
fn find_group_end(chars: &[char], open: usize) -> Option<usize> {
    let (left, right) = match chars[open] {
        '(' => ('(', ')'),
        _ => ('{', '}'),
    };
    let mut depth = 0usize;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '\'' | '"' | '`' => i = find_closing(chars, i)?,
            c if c == left => depth += 1,
            c if c == right => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// True if `raw` is exactly one quoted string, e.g. `'a b'` or `"$x"`.
pub fn is_fully_quoted(raw: &str) -> bool {
    let chars: Vec<char> = raw.chars().collect();
    match chars.first() {
        Some('\'') | Some('"') => find_closing(&chars, 0) == Some(chars.len() - 1),
        _ => false,
    }
}

/// Quote a raw word for a quoted style. Words that already carry quotes or
/// escapes are left alone.
pub fn quote(raw: &str) -> String {
    if is_fully_quoted(raw) || raw.contains(['\'', '"', '\\']) {
        raw.to_string()
    } else {
        format!("\"{}\"", raw)
    }
}

fn is_plain(c: char) -> bool {
    c.is_ascii_alphanumeric() || "._+-:/@%,=".contains(c)
}

/// Drop the quotes around a raw word when the contents need none.
pub fn unquote_if_plain(raw: &str) -> String {
    if is_fully_quoted(raw) {
        let inner = &raw[1..raw.len() - 1];
        if !inner.is_empty() && inner.chars().all(is_plain) {
            return inner.to_string();
        }
    }
    raw.to_string()
}

/// The literal text the shell would assign for `raw`, without expansions.
pub fn unquote(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_single = false;
    let mut in_double = false;
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '\\' if !in_single => match chars.peek() {
                Some(&next) if !in_double || "$`\"\\\n".contains(next) => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push(c),
            },
            _ => out.push(c),
        }
    }
    out
}

/// Tracks brace depth across the lines of a function body. Quote state
/// carries over line breaks; comments end at the line break.
#[derive(Debug, Default)]
pub struct BraceCounter {
    depth: i32,
    opened: bool,
    in_single: bool,
    in_double: bool,
}

impl BraceCounter {
    pub fn feed(&mut self, line: &str) {
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if self.in_single {
                if c == '\'' {
                    self.in_single = false;
                }
            } else if self.in_double {
                match c {
                    '\\' => i += 1,
                    '"' => self.in_double = false,
                    _ => {}
                }
            } else {
                match c {
                    '\\' => i += 1,
                    '\'' => self.in_single = true,
                    '"' => self.in_double = true,
                    '#' if i == 0 || chars[i - 1].is_whitespace() => break,
                    '{' => {
                        self.depth += 1;
                        self.opened = true;
                    }
                    '}' => self.depth -= 1,
                    _ => {}
                }
            }
            i += 1;
        }
    }

    /// True once the body has been opened and every brace is closed again.
    pub fn is_closed(&self) -> bool {
        self.opened && self.depth <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<String> {
        match scan_value(text) {
            Scan::Complete { tokens, .. } => tokens,
            other => panic!("expected complete scan of {:?}, got {:?}", text, other),
        }
    }

    #[test]
    fn scalar_keeps_quotes() {
        assert_eq!(tokens(r#""A small editor""#), vec![r#""A small editor""#]);
        assert_eq!(tokens("1.2.3"), vec!["1.2.3"]);
    }

    #[test]
    fn empty_scalar() {
        assert_eq!(
            scan_value(""),
            Scan::Complete {
                array: false,
                tokens: vec![String::new()]
            }
        );
    }

    #[test]
    fn array_splits_on_unquoted_whitespace() {
        assert_eq!(tokens(r#"(a b "c d")"#), vec!["a", "b", r#""c d""#]);
        assert_eq!(tokens(r"(a\ b c)"), vec![r"a\ b", "c"]);
    }

    #[test]
    fn empty_array() {
        assert_eq!(
            scan_value("()"),
            Scan::Complete {
                array: true,
                tokens: vec![]
            }
        );
    }

    #[test]
    fn array_spanning_lines() {
        assert_eq!(tokens("('a'\n        'b')"), vec!["'a'", "'b'"]);
        assert_eq!(scan_value("('a'\n        'b'"), Scan::Incomplete);
    }

    #[test]
    fn command_substitution_is_one_word() {
        assert_eq!(tokens("$(date +%s)"), vec!["$(date +%s)"]);
        assert_eq!(tokens("(${pkgname%-git} x)"), vec!["${pkgname%-git}", "x"]);
    }

    #[test]
    fn open_quote_is_incomplete() {
        assert_eq!(scan_value("\"first line"), Scan::Incomplete);
        assert_eq!(scan_value("'it"), Scan::Incomplete);
    }

    #[test]
    fn trailing_words_are_invalid() {
        assert_eq!(scan_value("1.0 # bump"), Scan::Invalid);
        assert_eq!(scan_value("(a b) extra"), Scan::Invalid);
        assert_eq!(scan_value("(a # note\n b)"), Scan::Invalid);
        assert_eq!(scan_value("(a # note"), Scan::Incomplete);
        assert_eq!(scan_value(" leading"), Scan::Invalid);
        assert_eq!(scan_value("a;b"), Scan::Invalid);
    }

    #[test]
    fn fully_quoted_detection() {
        assert!(is_fully_quoted("'a b'"));
        assert!(is_fully_quoted(r#""a \" b""#));
        assert!(!is_fully_quoted(r#""a"b"#));
        assert!(!is_fully_quoted("plain"));
        assert!(!is_fully_quoted("'"));
    }

    #[test]
    fn quote_wraps_bare_words_only() {
        assert_eq!(quote("ncurses"), "\"ncurses\"");
        assert_eq!(quote("'ncurses'"), "'ncurses'");
        assert_eq!(quote("$pkgname-'x'"), "$pkgname-'x'");
        assert_eq!(quote(""), "\"\"");
    }

    #[test]
    fn unquote_if_plain_keeps_significant_quotes() {
        assert_eq!(unquote_if_plain("'x86_64'"), "x86_64");
        assert_eq!(unquote_if_plain("\"$pkgver\""), "\"$pkgver\"");
        assert_eq!(unquote_if_plain("'a b'"), "'a b'");
        assert_eq!(unquote_if_plain("''"), "''");
    }

    #[test]
    fn unquote_resolves_shell_quoting() {
        assert_eq!(unquote(r#""c d""#), "c d");
        assert_eq!(unquote(r"'a\b'"), r"a\b");
        assert_eq!(unquote(r#""say \"hi\"""#), r#"say "hi""#);
        assert_eq!(unquote(r"a\ b"), "a b");
    }

    #[test]
    fn braces_close_at_depth_zero() {
        let mut b = BraceCounter::default();
        b.feed("build() {");
        assert!(!b.is_closed());
        b.feed("  cd \"${srcdir}\" # { not counted");
        b.feed("  echo '}'");
        assert!(!b.is_closed());
        b.feed("}");
        assert!(b.is_closed());
    }

    #[test]
    fn deferred_brace_is_not_closed() {
        let mut b = BraceCounter::default();
        b.feed("build()");
        assert!(!b.is_closed());
        b.feed("{ make; }");
        assert!(b.is_closed());
    }
}
