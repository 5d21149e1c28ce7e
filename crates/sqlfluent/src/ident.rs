//! Table and alias name validation.
//!
//! Table names go through [`Ident`], which supports dotted notation and quoted parts:
//!
//! - Unquoted parts are validated against: `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts (`"..."` or `` `...` ``) allow any characters except NUL; the closing
//!   quote is escaped by doubling it
//!
//! Aliases are plain identifiers and never quoted.

use crate::error::{SqlError, SqlResult};
use regex::Regex;
use std::sync::LazyLock;

static ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid alias pattern"));

/// A part of a SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    /// Unquoted identifier: must match `[A-Za-z_][A-Za-z0-9_$]*`.
    Unquoted(String),
    /// Quoted identifier with its quote character.
    Quoted { name: String, quote: char },
}

/// A validated table identifier (e.g. `users`, `shop.orders`, `` `Order Items` ``).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub parts: Vec<IdentPart>,
}

impl Ident {
    /// Parse an identifier string, supporting dotted and quoted forms.
    pub fn parse(s: &str) -> SqlResult<Self> {
        if s.trim().is_empty() {
            return Err(SqlError::config("table name cannot be empty"));
        }
        if s.contains('\0') {
            return Err(SqlError::config("identifier cannot contain NUL character"));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                match chars.next() {
                    Some('.') => {
                        if chars.peek().is_none() {
                            return Err(SqlError::config(format!("trailing '.' in identifier '{s}'")));
                        }
                    }
                    Some(c) => {
                        return Err(SqlError::config(format!(
                            "expected '.' between identifier parts in '{s}', got '{c}'"
                        )));
                    }
                    None => break,
                }
            }

            if let Some(&quote) = chars.peek().filter(|c| **c == '"' || **c == '`') {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some(c) if c == quote => {
                            if chars.peek() == Some(&quote) {
                                chars.next();
                                name.push(quote);
                            } else {
                                break;
                            }
                        }
                        Some(c) => name.push(c),
                        None => {
                            return Err(SqlError::config(format!("unclosed quoted identifier in '{s}'")));
                        }
                    }
                }
                if name.is_empty() {
                    return Err(SqlError::config("empty quoted identifier"));
                }
                parts.push(IdentPart::Quoted { name, quote });
                continue;
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                let valid = if name.is_empty() {
                    c == '_' || c.is_ascii_alphabetic()
                } else {
                    c == '_' || c == '$' || c.is_ascii_alphanumeric()
                };
                if !valid {
                    return Err(SqlError::config(format!(
                        "invalid character '{c}' in table name '{s}'"
                    )));
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(SqlError::config(format!("empty identifier segment in '{s}'")));
            }
            parts.push(IdentPart::Unquoted(name));
        }

        Ok(Self { parts })
    }

    /// Render the identifier as SQL.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match part {
                IdentPart::Unquoted(s) => out.push_str(s),
                IdentPart::Quoted { name, quote } => {
                    out.push(*quote);
                    for ch in name.chars() {
                        if ch == *quote {
                            out.push(ch);
                        }
                        out.push(ch);
                    }
                    out.push(*quote);
                }
            }
        }
        out
    }
}

/// Validate a table name and return its SQL rendering.
pub fn table_name(name: &str) -> SqlResult<String> {
    Ident::parse(name).map(|ident| ident.to_sql())
}

/// Validate a table alias.
pub fn alias_name(alias: &str) -> SqlResult<String> {
    if ALIAS_RE.is_match(alias) {
        Ok(alias.to_string())
    } else {
        Err(SqlError::config(format!("invalid alias '{alias}'")))
    }
}
