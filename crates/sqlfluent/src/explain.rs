//! Debug output for compiled statements, and placeholder substitution.

use crate::bind::BindMap;
use crate::placeholder::MARKER;
use crate::quote;
use crate::statement::Compiled;
use crate::value::Value;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use std::fmt;

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Rewrite every bound placeholder in `sql` through `replace`.
///
/// Placeholders are matched by maximal identifier munch, outside quoted strings
/// and identifiers; `::` casts are left alone. Names missing from `binds` stay.
fn substitute(sql: &str, binds: &BindMap, mut replace: impl FnMut(&str, &Value) -> String) -> String {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' | '`' => {
                out.push(c);
                i += 1;
                while i < chars.len() {
                    let d = chars[i];
                    out.push(d);
                    i += 1;
                    if d == '\\' && c != '`' && i < chars.len() {
                        out.push(chars[i]);
                        i += 1;
                    } else if d == c {
                        if i < chars.len() && chars[i] == c {
                            out.push(c);
                            i += 1;
                        } else {
                            break;
                        }
                    }
                }
            }
            MARKER
                if i + 1 < chars.len()
                    && is_ident(chars[i + 1])
                    && (i == 0 || chars[i - 1] != MARKER) =>
            {
                let start = i;
                i += 1;
                while i < chars.len() && is_ident(chars[i]) {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                match binds.get(&name) {
                    Some(value) => out.push_str(&replace(&name, value)),
                    None => out.push_str(&name),
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// The statement with every bound value inlined as a literal.
pub fn inline(compiled: &Compiled) -> String {
    substitute(&compiled.sql, &compiled.binds, |_, v| quote::literal(v))
}

/// A statement rendered for inspection instead of execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Explain {
    /// SQL with named placeholders
    pub sql: String,
    /// SQL with `?` placeholders
    pub positional_sql: String,
    /// Placeholder → value, in emission order
    pub params: Vec<(String, Value)>,
    /// Values in `?` order
    pub positional_params: Vec<Value>,
}

impl Explain {
    pub fn new(compiled: &Compiled) -> Self {
        let mut positional_params = Vec::with_capacity(compiled.binds.len());
        let positional_sql = substitute(&compiled.sql, &compiled.binds, |_, v| {
            positional_params.push(v.clone());
            "?".to_string()
        });
        Self {
            sql: compiled.sql.clone(),
            positional_sql,
            params: compiled
                .binds
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
            positional_params,
        }
    }

    /// Itemized placeholder table.
    pub fn table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["#", "placeholder", "value"]);
        for (i, (name, value)) in self.params.iter().enumerate() {
            table.add_row(vec![(i + 1).to_string(), name.clone(), value.to_string()]);
        }
        table
    }
}

impl fmt::Display for Explain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "named:      {}", self.sql)?;
        writeln!(f, "positional: {}", self.positional_sql)?;
        write!(f, "{}", self.table())
    }
}
