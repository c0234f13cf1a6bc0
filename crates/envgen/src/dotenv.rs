// Copyright (c) Contributors to the envgen project.
// SPDX-License-Identifier: Apache-2.0

//! Reading and writing `.env` syntax.

use indexmap::IndexMap;

use crate::{Error, Result};

#[cfg(test)]
#[path = "./dotenv_test.rs"]
mod dotenv_test;

fn needs_quotes(value: &str) -> bool {
    value.chars().any(|c| {
        c.is_whitespace() || matches!(c, '#' | '"' | '\'' | '\\' | '=' | '$' | '`')
    })
}

/// Format one `KEY=value` line, quoting the value only when needed.
pub fn format_line(key: &str, value: &str) -> String {
    if !needs_quotes(value) {
        return format!("{key}={value}");
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            '$' => quoted.push_str("\\$"),
            '`' => quoted.push_str("\\`"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    format!("{key}={quoted}")
}

/// Render entries as a `.env` document, one line per entry.
pub fn render<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = (&'a str, String)>,
{
    let mut out = String::new();
    for (key, value) in entries {
        out.push_str(&format_line(key, &value));
        out.push('\n');
    }
    out
}

/// Parse a `.env` document.
///
/// Accepts blank lines, `#` comments, an optional `export ` prefix, and
/// unquoted, single-quoted (literal) or double-quoted (escaped) values.
/// Later duplicates replace earlier ones.
pub fn parse(content: &str) -> Result<IndexMap<String, String>> {
    let mut entries = IndexMap::new();

    for (index, raw_line) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);

        let (key, rest) = line.split_once('=').ok_or_else(|| Error::ParseEnv {
            line: line_no,
            message: format!("expected KEY=value, found {raw_line:?}"),
        })?;
        let key = key.trim();
        if key.is_empty() || key.chars().any(char::is_whitespace) {
            return Err(Error::ParseEnv {
                line: line_no,
                message: format!("invalid key {key:?}"),
            });
        }

        let value = parse_value(rest.trim_start(), line_no)?;
        entries.insert(key.to_string(), value);
    }

    Ok(entries)
}

fn parse_value(raw: &str, line: usize) -> Result<String> {
    let unterminated = |quote: char| Error::ParseEnv {
        line,
        message: format!("unterminated {quote} quoted value"),
    };

    if let Some(rest) = raw.strip_prefix('\'') {
        let end = rest.find('\'').ok_or_else(|| unterminated('\''))?;
        return Ok(rest[..end].to_string());
    }

    if let Some(rest) = raw.strip_prefix('"') {
        let mut value = String::new();
        let mut chars = rest.chars();
        while let Some(c) = chars.next() {
            match c {
                '"' => return Ok(value),
                '\\' => match chars.next() {
                    Some('n') => value.push('\n'),
                    Some('r') => value.push('\r'),
                    Some('t') => value.push('\t'),
                    Some(other) => value.push(other),
                    None => break,
                },
                c => value.push(c),
            }
        }
        return Err(unterminated('"'));
    }

    // unquoted: an inline comment starts at whitespace followed by '#'
    let value = match raw.find(" #").or_else(|| raw.find("\t#")) {
        Some(pos) => &raw[..pos],
        None => raw,
    };
    Ok(value.trim_end().to_string())
}
