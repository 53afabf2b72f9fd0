// src/shared/envfile.rs

//! Line model of a dotenv file.
//!
//! Only assignment lines whose key is being set are touched; comments,
//! blank lines and every other assignment are kept byte for byte, line
//! endings included. Keys are matched by name at the start of the line, so
//! values may contain any character.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:export\s+)?([A-Za-z_][A-Za-z0-9_.]*)\s*=").expect("valid assignment regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    text: String,
    /// `"\n"`, `"\r\n"`, or empty for an unterminated last line.
    eol: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    lines: Vec<Line>,
}

impl EnvFile {
    pub fn parse(contents: &str) -> Self {
        let lines = contents
            .split_inclusive('\n')
            .map(|chunk| {
                let (text, eol) = if let Some(text) = chunk.strip_suffix("\r\n") {
                    (text, "\r\n")
                } else if let Some(text) = chunk.strip_suffix('\n') {
                    (text, "\n")
                } else {
                    (chunk, "")
                };
                Line {
                    text: text.to_string(),
                    eol,
                }
            })
            .collect();
        Self { lines }
    }

    /// Ending for appended lines: the first one the file uses, else `\n`.
    fn line_ending(&self) -> &'static str {
        self.lines
            .iter()
            .map(|l| l.eol)
            .find(|eol| !eol.is_empty())
            .unwrap_or("\n")
    }

    /// Key assigned on `line`, if it is an assignment.
    pub fn key_of(line: &str) -> Option<&str> {
        ASSIGNMENT
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }

    /// Unquoted value of the first assignment to `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.lines
            .iter()
            .find(|l| Self::key_of(&l.text) == Some(key))
            .and_then(|l| l.text.split_once('='))
            .map(|(_, value)| unquote(value.trim()))
    }

    /// Number of assignments to `key`.
    pub fn count(&self, key: &str) -> usize {
        self.lines
            .iter()
            .filter(|l| Self::key_of(&l.text) == Some(key))
            .count()
    }

    /// Set every key in `assignments`.
    ///
    /// The first assignment to a key is rewritten in place, later ones are
    /// dropped, and keys the file does not mention are appended in the
    /// given order.
    pub fn set_all(&mut self, assignments: &[(&str, String)]) {
        let eol = self.line_ending();
        let mut written: HashSet<&str> = HashSet::new();
        let mut lines = Vec::with_capacity(self.lines.len() + assignments.len());

        for line in self.lines.drain(..) {
            let assigned = Self::key_of(&line.text)
                .and_then(|key| assignments.iter().find(|(k, _)| *k == key));
            match assigned {
                Some((key, value)) => {
                    if written.insert(*key) {
                        lines.push(Line {
                            text: format_assignment(key, value),
                            eol: line.eol,
                        });
                    }
                }
                None => lines.push(line),
            }
        }

        for (key, value) in assignments {
            if written.insert(*key) {
                if let Some(last) = lines.last_mut().filter(|l| l.eol.is_empty()) {
                    last.eol = eol;
                }
                lines.push(Line {
                    text: format_assignment(key, value),
                    eol,
                });
            }
        }

        self.lines = lines;
    }

    pub fn render(&self) -> String {
        self.lines
            .iter()
            .flat_map(|l| [l.text.as_str(), l.eol])
            .collect()
    }
}

pub fn format_assignment(key: &str, value: &str) -> String {
    format!("{key}={}", format_value(value))
}

/// Bare when safe, otherwise double-quoted with `\`, `"` and `$` escaped.
pub fn format_value(value: &str) -> String {
    let needs_quotes = value
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '#' | '"' | '\'' | '\\' | '$' | '`'));
    if !needs_quotes {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' | '"' | '$' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn unquote(raw: &str) -> String {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        let inner = &raw[1..raw.len() - 1];
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some('n') => out.push('\n'),
                    Some(other) => out.push(other),
                    None => out.push('\\'),
                }
            } else {
                out.push(c);
            }
        }
        out
    } else if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        raw[1..raw.len() - 1].to_string()
    } else {
        raw.to_string()
    }
}
