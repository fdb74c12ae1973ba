//! Line-oriented helpers for scanning TypeScript/JavaScript source text.
//!
//! Everything here is pattern-based. Comments are blanked out before
//! matching so commented-out code never produces findings; string contents
//! can optionally be blanked too so numbers inside strings are not counted.

use crate::models::project::ClassDecl;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    Line,
    Block,
    Str(u8),
}

/// Blank out comments (and string contents when `strings` is true) with
/// spaces. Newlines and byte offsets are preserved.
pub fn mask(src: &str, strings: bool) -> String {
    let b = src.as_bytes();
    let mut out = Vec::with_capacity(b.len());
    let mut st = State::Code;
    let mut i = 0;
    while i < b.len() {
        let c = b[i];
        let next = b.get(i + 1).copied();
        match st {
            State::Code => match c {
                b'/' if next == Some(b'/') => {
                    st = State::Line;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                b'/' if next == Some(b'*') => {
                    st = State::Block;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                b'\'' | b'"' | b'`' => {
                    st = State::Str(c);
                    out.push(c);
                }
                _ => out.push(c),
            },
            State::Line => {
                if c == b'\n' {
                    st = State::Code;
                    out.push(c);
                } else {
                    out.push(b' ');
                }
            }
            State::Block => {
                if c == b'*' && next == Some(b'/') {
                    st = State::Code;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                out.push(if c == b'\n' { c } else { b' ' });
            }
            State::Str(q) => {
                if c == b'\\' && next.is_some() {
                    if strings {
                        out.extend_from_slice(b"  ");
                    } else {
                        out.push(c);
                        out.push(b[i + 1]);
                    }
                    i += 2;
                    continue;
                }
                if c == q {
                    st = State::Code;
                    out.push(c);
                } else if c == b'\n' && q != b'`' {
                    // unterminated quote; recover at end of line
                    st = State::Code;
                    out.push(c);
                } else if strings && c != b'\n' {
                    out.push(b' ');
                } else {
                    out.push(c);
                }
            }
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A regex hit in a file: 1-based line, matched text, and capture group 1
/// when the pattern has one.
pub struct Hit {
    pub line: usize,
    pub text: String,
    pub group: Option<String>,
}

/// All matches of `patterns` in `code`, in line order.
pub fn find_hits(code: &str, patterns: &[Regex]) -> Vec<Hit> {
    let mut hits = Vec::new();
    for (idx, line) in code.lines().enumerate() {
        for re in patterns {
            for caps in re.captures_iter(line) {
                let whole = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
                hits.push(Hit {
                    line: idx + 1,
                    text: whole.trim().to_string(),
                    group: caps.get(1).map(|m| m.as_str().to_string()),
                });
            }
        }
    }
    hits.sort_by(|a, b| a.line.cmp(&b.line).then(a.text.cmp(&b.text)));
    hits.dedup();
    hits
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|[^\w.$])(-?\d+(?:\.\d+)?)\b").expect("static regex"))
}

fn string_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"'([^'\\\n]*)'|"([^"\\\n]*)"|`([^`\\]*)`"#).expect("static regex")
    })
}

fn class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\bclass\s+([A-Za-z_$][\w$]*)(?:\s*<[^>{]*>)?(?:\s+extends\s+([A-Za-z_$][\w$.]*))?",
        )
        .expect("static regex")
    })
}

/// Numeric literals (line, text) in code whose strings are already masked.
pub fn number_literals(code: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    for (idx, line) in code.lines().enumerate() {
        for caps in number_re().captures_iter(line) {
            if let Some(m) = caps.get(1) {
                out.push((idx + 1, m.as_str().to_string()));
            }
        }
    }
    out
}

/// Every literal value declared in `src`: string contents and numbers.
pub fn declared_literals(src: &str) -> BTreeSet<String> {
    let code = mask(src, false);
    let mut out = BTreeSet::new();
    for caps in string_re().captures_iter(&code) {
        if let Some(m) = caps.get(1).or(caps.get(2)).or(caps.get(3)) {
            out.insert(m.as_str().to_string());
        }
    }
    for (_, n) in number_literals(&mask(src, true)) {
        out.insert(n);
    }
    out
}

/// Class declarations with their direct parent, if any.
pub fn class_decls(src: &str, path: &str) -> Vec<ClassDecl> {
    let code = mask(src, true);
    let mut out = Vec::new();
    for (idx, line) in code.lines().enumerate() {
        for caps in class_re().captures_iter(line) {
            let Some(name) = caps.get(1) else { continue };
            out.push(ClassDecl {
                name: name.as_str().to_string(),
                extends: caps.get(2).map(|m| m.as_str().to_string()),
                path: path.to_string(),
                line: idx + 1,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_blanks_comments_but_keeps_offsets() {
        let src = "a // PENDING\n/* 'X'\n */ b = 'KEEP'";
        let m = mask(src, false);
        assert_eq!(m.len(), src.len());
        assert!(!m.contains("PENDING"));
        assert!(!m.contains("'X'"));
        assert!(m.contains("'KEEP'"));
        assert_eq!(m.lines().count(), src.lines().count());
    }

    #[test]
    fn test_mask_strings_hides_string_contents() {
        let m = mask("x = 'a // 42'; y = 7", true);
        assert!(!m.contains("42"));
        assert!(m.contains('7'));
    }

    #[test]
    fn test_number_literals_skip_identifiers_and_hex() {
        let nums: Vec<String> = number_literals("let v2 = 0xff + 404 - 1.5; arr[3]")
            .into_iter()
            .map(|(_, n)| n)
            .collect();
        assert_eq!(nums, vec!["404", "1.5", "3"]);
    }

    #[test]
    fn test_class_decls_capture_parent() {
        let src = "export class NotFoundError extends BaseError {}\nclass Plain {}\n// class Ghost extends X";
        let decls = class_decls(src, "common/errors/not-found.ts");
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].extends.as_deref(), Some("BaseError"));
        assert_eq!(decls[1].name, "Plain");
        assert_eq!(decls[1].extends, None);
    }

    #[test]
    fn test_declared_literals_collects_strings_and_numbers() {
        let lits = declared_literals("export const S = { A: 'PENDING', B: \"DONE\" }; export const MAX = 500;");
        assert!(lits.contains("PENDING"));
        assert!(lits.contains("DONE"));
        assert!(lits.contains("500"));
    }
}
