//! Literal quoting for statements that inline values instead of binding them.
//!
//! Used by direct (non-prepared) INSERT/REPLACE, `FIND_IN_SET` search/list strings
//! and `copy()`, which hands SELECT text to another statement.

use crate::value::{Operand, Value};

/// Escape a string the way MySQL's `real_escape_string` does, without surrounding quotes.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for ch in s.chars() {
        match ch {
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\x1a' => out.push_str("\\Z"),
            c => out.push(c),
        }
    }
    out
}

/// Quote and escape a string literal.
pub fn quote_str(s: &str) -> String {
    format!("'{}'", escape(s))
}

/// Render a value as an inline SQL literal.
///
/// Numbers pass through, strings are escaped and quoted, JSON documents (arrays and
/// objects) are encoded and quoted.
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
        Value::Int(v) => v.to_string(),
        Value::UInt(v) => v.to_string(),
        Value::Float(v) if v.is_finite() => v.to_string(),
        Value::Float(_) => "NULL".to_string(),
        Value::Text(s) => quote_str(s),
        Value::Bytes(b) => {
            let mut hex = String::with_capacity(b.len() * 2 + 3);
            hex.push_str("X'");
            for byte in b {
                hex.push_str(&format!("{byte:02X}"));
            }
            hex.push('\'');
            hex
        }
        Value::Json(serde_json::Value::String(s)) => quote_str(s),
        Value::Json(v) => quote_str(&v.to_string()),
        Value::DateTime(dt) => quote_str(&dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        Value::Uuid(u) => quote_str(&u.to_string()),
    }
}

/// Render an operand inline: raw fragments verbatim, values as literals.
pub fn operand(op: &Operand) -> String {
    match op {
        Operand::Raw(r) => r.as_str().to_string(),
        Operand::Bind(v) => literal(v),
    }
}
