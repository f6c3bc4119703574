//! Translation of `:name` placeholders into PostgreSQL positional parameters.
//!
//! Statements are written with named placeholders (`where id = :id`). The
//! scanner walks the text once, leaving quoted literals (including `E'..'`
//! escape strings and `$tag$..$tag$` bodies), quoted identifiers, comments
//! and `::` casts alone, and replaces every placeholder with `$n`.
//! A name that appears more than once reuses its first position.

use crate::params::{Parameter, ParameterSource};
use crate::Result;

/// Statement text with positional placeholders and the names behind them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSql {
    /// SQL text with `$1`, `$2`, ... in place of named placeholders.
    pub sql: String,
    /// Parameter names in position order; `names[0]` binds to `$1`.
    pub names: Vec<String>,
}

impl ParsedSql {
    /// Resolves every placeholder against `params`, in position order.
    ///
    /// Fails with `ParameterNotBound` on the first name with no value.
    pub fn bind<'p>(&self, params: &'p ParameterSource) -> Result<Vec<(&str, &'p Parameter)>> {
        self.names
            .iter()
            .map(|name| Ok((name.as_str(), params.parameter(name)?)))
            .collect()
    }
}

/// Rewrites named placeholders in `sql`.
pub fn parse(sql: &str) -> ParsedSql {
    let bytes = sql.as_bytes();
    let len = bytes.len();
    let mut out = String::with_capacity(len + 8);
    let mut names: Vec<String> = Vec::new();
    let mut copied = 0;
    let mut i = 0;

    while i < len {
        match bytes[i] {
            b'\'' if is_escape_string(bytes, i) => i = skip_escape_string(bytes, len, i) + 1,
            b'\'' | b'"' => i = skip_quoted(bytes, len, i, bytes[i]) + 1,
            b'$' => i = skip_dollar_quoted(bytes, len, i).unwrap_or(i + 1),
            b'-' if i + 1 < len && bytes[i + 1] == b'-' => i = skip_line_comment(bytes, len, i),
            b'/' if i + 1 < len && bytes[i + 1] == b'*' => {
                i = skip_block_comment(bytes, len, i) + 1
            }
            b':' if i + 1 < len && bytes[i + 1] == b':' => i += 2,
            b':' if i + 1 < len && is_name_start(bytes[i + 1]) => {
                let start = i + 1;
                let mut end = start;
                while end < len && is_name_char(bytes[end]) {
                    end += 1;
                }
                let name = &sql[start..end];
                let position = match names.iter().position(|n| n == name) {
                    Some(index) => index + 1,
                    None => {
                        names.push(name.to_string());
                        names.len()
                    }
                };
                out.push_str(&sql[copied..i]);
                out.push('$');
                out.push_str(&position.to_string());
                copied = end;
                i = end;
            }
            _ => i += 1,
        }
    }
    out.push_str(&sql[copied..]);

    ParsedSql { sql: out, names }
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Index of the closing quote, honouring doubled-quote escapes.
fn skip_quoted(bytes: &[u8], len: usize, i: usize, quote: u8) -> usize {
    let mut j = i + 1;
    while j < len {
        if bytes[j] == quote {
            if j + 1 < len && bytes[j + 1] == quote {
                j += 2;
                continue;
            }
            return j;
        }
        j += 1;
    }
    j
}

/// `E'..'` / `e'..'`, where the prefix is not the tail of an identifier.
fn is_escape_string(bytes: &[u8], i: usize) -> bool {
    i >= 1
        && matches!(bytes[i - 1], b'E' | b'e')
        && (i < 2 || !is_name_char(bytes[i - 2]))
}

/// Index of the closing quote of an escape string; `\x` and `''` never close it.
fn skip_escape_string(bytes: &[u8], len: usize, i: usize) -> usize {
    let mut j = i + 1;
    while j < len {
        match bytes[j] {
            b'\\' => j += 2,
            b'\'' if j + 1 < len && bytes[j + 1] == b'\'' => j += 2,
            b'\'' => return j,
            _ => j += 1,
        }
    }
    len
}

/// Index just past the closing `$tag$`, or `None` when `$` at `i` does not
/// open a dollar-quoted body (`$1`, `a$b`).
fn skip_dollar_quoted(bytes: &[u8], len: usize, i: usize) -> Option<usize> {
    if i > 0 && is_name_char(bytes[i - 1]) {
        return None;
    }
    let mut j = i + 1;
    if j < len && is_name_start(bytes[j]) {
        j += 1;
        while j < len && is_name_char(bytes[j]) {
            j += 1;
        }
    }
    if j >= len || bytes[j] != b'$' {
        return None;
    }
    let tag = &bytes[i..=j];
    let body = j + 1;
    let close = bytes[body..]
        .windows(tag.len())
        .position(|w| w == tag)
        .map_or(len, |offset| body + offset + tag.len());
    Some(close)
}

fn skip_line_comment(bytes: &[u8], len: usize, i: usize) -> usize {
    let mut j = i + 2;
    while j < len && bytes[j] != b'\n' {
        j += 1;
    }
    j
}

/// Index of the `/` that closes the comment.
fn skip_block_comment(bytes: &[u8], len: usize, i: usize) -> usize {
    let mut j = i + 2;
    while j + 1 < len {
        if bytes[j] == b'*' && bytes[j + 1] == b'/' {
            return j + 1;
        }
        j += 1;
    }
    len
}
