//! Text and JSON output of a configuration tree.
//!
//! Text output lists the root's entries without enclosing brackets, one
//! `key = value` per line, so reading it back builds the same tree:
//!
//! ```text
//! name = "demo"
//! ports = [
//!     [0] = 80
//!     [1] = 443
//!     ]
//! ["two words"] = 1.5
//! ```
//!
//! Floats are written with one digit after the decimal point. That keeps
//! the kind across a round trip but not always the value. Infinities are
//! written as `1e999` and `-1e999`, which scan back as infinite floats.
//!
//! The language has no nil or NaN literal. Entries whose key or value is nil
//! read back as missing either way, so they are left out; entries holding
//! NaN are left out with a warning.

use crate::arena::ArrayId;
use crate::config::Config;
use crate::value::Value;
use serde_json::{Map, Number};
use std::fmt::Write as _;

/// Columns added for each nested array value.
const NESTED_INDENT: usize = 4;
/// Columns added inside an array used as a key.
const KEY_INDENT: usize = 2;

pub(crate) fn render(config: &Config) -> String {
    let mut out = String::new();
    for (key, value) in config.entries(config.root()) {
        write_entry(config, &mut out, 0, key, value);
    }
    out
}

fn write_entry(config: &Config, out: &mut String, level: usize, key: Value, value: Value) {
    if key.is_nil() || value.is_nil() {
        return;
    }
    if is_nan(key) || is_nan(value) {
        tracing::warn!("entry holding NaN left out of text output");
        return;
    }
    indent(out, level);
    write_key(config, out, level, key);
    out.push_str(" = ");
    write_value(config, out, level, value);
    out.push('\n');
}

fn write_key(config: &Config, out: &mut String, level: usize, key: Value) {
    match key {
        Value::String(_) => {
            let text = config.resolve(key).unwrap_or_default();
            if is_bare_key(text) {
                out.push_str(text);
            } else {
                out.push('[');
                quoted(out, text);
                out.push(']');
            }
        }
        Value::Array(id) => {
            out.push('[');
            write_array(config, out, level + KEY_INDENT, id);
            out.push(']');
        }
        other => {
            out.push('[');
            write_value(config, out, level, other);
            out.push(']');
        }
    }
}

fn write_value(config: &Config, out: &mut String, level: usize, value: Value) {
    match value {
        Value::Nil => out.push_str("nil"),
        Value::Integer(n) => {
            let _ = write!(out, "{n}");
        }
        Value::Float(f) if f.is_infinite() => {
            out.push_str(if f > 0.0 { "1e999" } else { "-1e999" });
        }
        Value::Float(f) => {
            let _ = write!(out, "{f:.1}");
        }
        Value::String(_) => quoted(out, config.resolve(value).unwrap_or_default()),
        Value::Array(id) => write_array(config, out, level, id),
    }
}

fn write_array(config: &Config, out: &mut String, level: usize, id: ArrayId) {
    let inner = level + NESTED_INDENT;
    out.push_str("[\n");
    for (key, value) in config.entries(id) {
        write_entry(config, out, inner, key, value);
    }
    indent(out, inner);
    out.push(']');
}

fn indent(out: &mut String, columns: usize) {
    out.extend(std::iter::repeat_n(' ', columns));
}

fn quoted(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn is_nan(value: Value) -> bool {
    value.as_float().is_some_and(f64::is_nan)
}

/// Keys that scan back as an identifier.
fn is_bare_key(text: &str) -> bool {
    let mut chars = text.chars();
    let starts = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && text != "include"
}

/// JSON form of the tree.
///
/// Arrays keyed exactly `0..n` in order become JSON arrays, all others JSON
/// objects with their keys rendered as strings.
pub(crate) fn json(config: &Config) -> serde_json::Value {
    json_array(config, config.root())
}

fn json_array(config: &Config, id: ArrayId) -> serde_json::Value {
    let is_list = config
        .entries(id)
        .enumerate()
        .all(|(position, (key, _))| key.as_integer() == i64::try_from(position).ok());

    if is_list {
        return serde_json::Value::Array(
            config
                .entries(id)
                .map(|(_, value)| json_value(config, value))
                .collect(),
        );
    }

    let mut object = Map::new();
    for (key, value) in config.entries(id) {
        object.insert(json_key(config, key), json_value(config, value));
    }
    serde_json::Value::Object(object)
}

fn json_key(config: &Config, key: Value) -> String {
    match key {
        Value::Nil => "nil".to_string(),
        Value::Integer(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::String(_) => config.resolve(key).unwrap_or_default().to_string(),
        Value::Array(id) => json_array(config, id).to_string(),
    }
}

pub(crate) fn json_value(config: &Config, value: Value) -> serde_json::Value {
    match value {
        Value::Nil => serde_json::Value::Null,
        Value::Integer(n) => serde_json::Value::from(n),
        Value::Float(f) => Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(_) => {
            serde_json::Value::String(config.resolve(value).unwrap_or_default().to_string())
        }
        Value::Array(id) => json_array(config, id),
    }
}
