//! Indented plain text output shared by notes, admissions and the corpus.

use std::io::{self, Write};

use serde_json::Value;

pub const INDENT: usize = 4;
pub const MAX_COL: usize = 80;

fn indent(depth: usize) -> String {
    " ".repeat(depth * INDENT)
}

pub fn write_line<W: Write + ?Sized>(w: &mut W, depth: usize, line: &str) -> io::Result<()> {
    writeln!(w, "{}{}", indent(depth), line)
}

pub fn write_empty<W: Write + ?Sized>(w: &mut W) -> io::Result<()> {
    writeln!(w)
}

/// A line of `ch` filling the column width, optionally carrying a header.
pub fn write_divider<W: Write + ?Sized>(w: &mut W, depth: usize, ch: char, header: Option<&str>) -> io::Result<()> {
    let width = MAX_COL.saturating_sub(depth * INDENT);
    let line = match header {
        None => ch.to_string().repeat(width),
        Some(h) => {
            let lead = format!("{}{} {} ", ch, ch, h);
            let fill = width.saturating_sub(lead.chars().count());
            format!("{lead}{}", ch.to_string().repeat(fill))
        }
    };
    write_line(w, depth, &line)
}

/// Each line of `text` indented; at most `limit` lines when given.
pub fn write_block<W: Write + ?Sized>(w: &mut W, depth: usize, text: &str, limit: Option<usize>) -> io::Result<()> {
    for line in text.lines().take(limit.unwrap_or(usize::MAX)) {
        write_line(w, depth, line)?;
    }
    Ok(())
}

/// Word wrap `text` to the column width.
pub fn write_wrap<W: Write + ?Sized>(w: &mut W, depth: usize, text: &str) -> io::Result<()> {
    let width = MAX_COL.saturating_sub(depth * INDENT).max(20);
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.len() + 1 + word.len() > width {
            write_line(w, depth, &line)?;
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        write_line(w, depth, &line)?;
    }
    Ok(())
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some("None".into()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Write a JSON value as nested `key: value` lines.
pub fn write_value<W: Write + ?Sized>(w: &mut W, depth: usize, value: &Value) -> io::Result<()> {
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                match scalar(v) {
                    Some(s) => write_line(w, depth, &format!("{key}: {s}"))?,
                    None => {
                        write_line(w, depth, &format!("{key}:"))?;
                        write_value(w, depth + 1, v)?;
                    }
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                match scalar(item) {
                    Some(s) => write_line(w, depth, &format!("- {s}"))?,
                    None => write_value(w, depth, item)?,
                }
            }
        }
        other => {
            if let Some(s) = scalar(other) {
                write_line(w, depth, &s)?;
            }
        }
    }
    Ok(())
}

/// `1234567` → `1,234,567`
pub fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}
