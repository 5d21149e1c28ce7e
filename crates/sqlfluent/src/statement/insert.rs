//! INSERT / REPLACE assembly.
//!
//! Two strategies:
//! - prepared: one `VALUES (:a, :b)` template plus a bind map per row, executed
//!   row by row;
//! - direct: every value inlined as a literal into a single multi-row statement.

use super::Compiled;
use super::state::{DupOp, DuplicateRule, QueryState};
use crate::bind::BindMap;
use crate::error::{SqlError, SqlResult};
use crate::ident::Ident;
use crate::placeholder;
use crate::quote;
use crate::value::{Operand, ValueMap, json_kind};

/// INSERT or REPLACE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertVerb {
    Insert,
    Replace,
}

impl InsertVerb {
    pub fn as_sql(self) -> &'static str {
        match self {
            InsertVerb::Insert => "INSERT",
            InsertVerb::Replace => "REPLACE",
        }
    }
}

/// Input accepted by `insert`/`replace`: one row or many, always associative.
pub trait IntoRows {
    fn into_rows(self) -> SqlResult<Vec<ValueMap>>;
}

impl IntoRows for ValueMap {
    fn into_rows(self) -> SqlResult<Vec<ValueMap>> {
        Ok(vec![self])
    }
}

impl IntoRows for Vec<ValueMap> {
    fn into_rows(self) -> SqlResult<Vec<ValueMap>> {
        Ok(self)
    }
}

impl IntoRows for &[ValueMap] {
    fn into_rows(self) -> SqlResult<Vec<ValueMap>> {
        Ok(self.to_vec())
    }
}

impl IntoRows for &serde_json::Value {
    fn into_rows(self) -> SqlResult<Vec<ValueMap>> {
        match self {
            serde_json::Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    ValueMap::from_json(item).map_err(|_| {
                        SqlError::config(format!(
                            "row {i} must be an associative column map, got {}",
                            json_kind(item)
                        ))
                    })
                })
                .collect(),
            other => ValueMap::from_json(other).map(|row| vec![row]),
        }
    }
}

impl IntoRows for serde_json::Value {
    fn into_rows(self) -> SqlResult<Vec<ValueMap>> {
        (&self).into_rows()
    }
}

/// A prepared insert: one template, one bind map per row.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertPlan {
    /// Template SQL, bound with the first row's values.
    pub statement: Compiled,
    pub rows: Vec<BindMap>,
}

fn check_options(state: &QueryState, verb: InsertVerb) -> SqlResult<()> {
    match verb {
        InsertVerb::Insert if state.ignore && !state.duplicates.is_empty() => Err(SqlError::config(
            "INSERT IGNORE and ON DUPLICATE KEY UPDATE are mutually exclusive",
        )),
        InsertVerb::Replace if state.ignore || !state.duplicates.is_empty() => Err(
            SqlError::config("REPLACE takes neither IGNORE nor ON DUPLICATE KEY UPDATE"),
        ),
        _ => Ok(()),
    }
}

/// Validate the row set and return its column list (first row's order).
fn columns(rows: &[ValueMap]) -> SqlResult<Vec<String>> {
    let Some(first) = rows.first() else {
        return Err(SqlError::config("insert requires at least one row"));
    };
    if first.is_empty() {
        return Err(SqlError::config("insert row 0 has no columns"));
    }
    let columns: Vec<String> = first.columns().map(str::to_string).collect();
    for column in &columns {
        Ident::parse(column)?;
    }

    for (i, row) in rows.iter().enumerate().skip(1) {
        if row.len() != columns.len() {
            return Err(SqlError::config(format!(
                "insert row {i} has {} columns, expected {}",
                row.len(),
                columns.len()
            )));
        }
        for column in &columns {
            let Some(value) = row.get(column) else {
                return Err(SqlError::config(format!(
                    "insert row {i} is missing column '{column}'"
                )));
            };
            let template = first.get(column);
            let same_shape = match (template, value) {
                (Some(Operand::Raw(a)), Operand::Raw(b)) => a == b,
                (Some(Operand::Bind(_)), Operand::Bind(_)) => true,
                _ => false,
            };
            if !same_shape {
                return Err(SqlError::config(format!(
                    "insert row {i} column '{column}': raw expressions must be identical in every row"
                )));
            }
        }
    }
    Ok(columns)
}

fn head(state: &QueryState, verb: InsertVerb, columns: &[String]) -> SqlResult<String> {
    let table = state.table()?;
    let ignore = if state.ignore { " IGNORE" } else { "" };
    Ok(format!(
        "{}{ignore} INTO {table} ({})",
        verb.as_sql(),
        columns.join(", ")
    ))
}

fn duplicate_expr(rule: &DuplicateRule, value: String) -> String {
    let column = &rule.column;
    match rule.op {
        DupOp::Set => format!("{column} = {value}"),
        DupOp::Add => format!("{column} = {column} + {value}"),
        DupOp::Sub => format!("{column} = {column} - {value}"),
    }
}

fn duplicate_clause(parts: Vec<String>) -> String {
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ON DUPLICATE KEY UPDATE {}", parts.join(", "))
    }
}

/// Bind one row: returns the VALUES items, the duplicate clause and the binds.
///
/// Names depend only on the column list and raw positions, which are identical
/// for every row, so all rows agree with the template.
fn bind_row(
    columns: &[String],
    row: &ValueMap,
    duplicates: &[DuplicateRule],
) -> (Vec<String>, String, BindMap) {
    let mut binds = BindMap::new();
    let mut items = Vec::with_capacity(columns.len());
    for column in columns {
        let item = match row.get(column) {
            Some(Operand::Raw(r)) => r.as_str().to_string(),
            Some(Operand::Bind(v)) => binds.push(placeholder::flat(column), v.clone()),
            None => "NULL".to_string(),
        };
        items.push(item);
    }
    let dup = duplicates
        .iter()
        .map(|rule| {
            let value = match &rule.value {
                Operand::Raw(r) => r.as_str().to_string(),
                Operand::Bind(v) => {
                    binds.push(placeholder::prefixed("dup", &rule.column), v.clone())
                }
            };
            duplicate_expr(rule, value)
        })
        .collect();
    (items, duplicate_clause(dup), binds)
}

/// Build the prepared template and per-row bind maps.
pub fn prepared(state: &QueryState, verb: InsertVerb, rows: &[ValueMap]) -> SqlResult<InsertPlan> {
    state.check()?;
    check_options(state, verb)?;
    let columns = columns(rows)?;
    let head = head(state, verb, &columns)?;

    let mut bound = rows
        .iter()
        .map(|row| bind_row(&columns, row, &state.duplicates));
    let Some((items, dup, first_binds)) = bound.next() else {
        return Err(SqlError::config("insert requires at least one row"));
    };
    let sql = format!("{head} VALUES ({}){dup}", items.join(", "));

    let mut per_row = vec![first_binds.clone()];
    per_row.extend(bound.map(|(_, _, binds)| binds));

    Ok(InsertPlan {
        statement: Compiled::new(sql, first_binds),
        rows: per_row,
    })
}

/// Build one multi-row statement with every value inlined.
pub fn direct(state: &QueryState, verb: InsertVerb, rows: &[ValueMap]) -> SqlResult<Compiled> {
    state.check()?;
    check_options(state, verb)?;
    let columns = columns(rows)?;
    let head = head(state, verb, &columns)?;

    let tuples: Vec<String> = rows
        .iter()
        .map(|row| {
            let items: Vec<String> = columns
                .iter()
                .map(|c| row.get(c).map_or_else(|| "NULL".to_string(), quote::operand))
                .collect();
            format!("({})", items.join(", "))
        })
        .collect();
    let dup = duplicate_clause(
        state
            .duplicates
            .iter()
            .map(|rule| duplicate_expr(rule, quote::operand(&rule.value)))
            .collect(),
    );

    Ok(Compiled::new(
        format!("{head} VALUES {}{dup}", tuples.join(", ")),
        BindMap::new(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Value, raw};
    use serde_json::json;

    fn state() -> QueryState {
        QueryState {
            table: Some("users".into()),
            ..QueryState::default()
        }
    }

    #[test]
    fn json_array_of_objects() {
        let rows = json!([{"id": 1}, {"id": 2}]).into_rows().unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn positional_rows_are_rejected() {
        let err = json!([[1, "A"]]).into_rows().unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("positional list"));
        assert!(json!("x").into_rows().unwrap_err().is_config());
    }

    #[test]
    fn prepared_template() {
        let rows = vec![
            ValueMap::new().set("id", 1).set("name", "A").set("created_at", raw("NOW()")),
            ValueMap::new().set("id", 2).set("name", "B").set("created_at", raw("NOW()")),
        ];
        let plan = prepared(&state(), InsertVerb::Insert, &rows).unwrap();
        assert_eq!(
            plan.statement.sql,
            "INSERT INTO users (id, name, created_at) VALUES (:id, :name, NOW())"
        );
        assert_eq!(plan.rows.len(), 2);
        assert_eq!(plan.rows[1].get(":name"), Some(&Value::from("B")));
        assert_eq!(plan.rows[1].len(), 2);
    }

    #[test]
    fn duplicate_rules() {
        let mut st = state();
        st.duplicates = vec![
            DuplicateRule {
                column: "name".into(),
                op: DupOp::Set,
                value: "A".into(),
            },
            DuplicateRule {
                column: "visits".into(),
                op: DupOp::Add,
                value: 1.into(),
            },
            DuplicateRule {
                column: "credits".into(),
                op: DupOp::Sub,
                value: raw("2").into(),
            },
        ];
        let rows = vec![ValueMap::new().set("id", 1)];
        let plan = prepared(&st, InsertVerb::Insert, &rows).unwrap();
        assert_eq!(
            plan.statement.sql,
            "INSERT INTO users (id) VALUES (:id) ON DUPLICATE KEY UPDATE name = :dup_name, \
             visits = visits + :dup_visits, credits = credits - 2"
        );
        let direct = direct(&st, InsertVerb::Insert, &rows).unwrap();
        assert_eq!(
            direct.sql,
            "INSERT INTO users (id) VALUES (1) ON DUPLICATE KEY UPDATE name = 'A', \
             visits = visits + 1, credits = credits - 2"
        );
    }

    #[test]
    fn direct_inlines_literals() {
        let rows = vec![
            ValueMap::new().set("id", 1).set("tags", json!(["a", "b"])),
            ValueMap::new().set("id", 2).set("tags", Value::Null),
        ];
        let mut st = state();
        st.ignore = true;
        let compiled = direct(&st, InsertVerb::Insert, &rows).unwrap();
        assert_eq!(
            compiled.sql,
            r#"INSERT IGNORE INTO users (id, tags) VALUES (1, '[\"a\",\"b\"]'), (2, NULL)"#
        );
        assert!(compiled.binds.is_empty());
    }

    #[test]
    fn conflicting_options() {
        let mut st = state();
        st.ignore = true;
        st.duplicates.push(DuplicateRule {
            column: "n".into(),
            op: DupOp::Set,
            value: 1.into(),
        });
        let rows = vec![ValueMap::new().set("id", 1)];
        assert!(prepared(&st, InsertVerb::Insert, &rows).unwrap_err().is_config());

        let mut st = state();
        st.ignore = true;
        assert!(direct(&st, InsertVerb::Replace, &rows).unwrap_err().is_config());
    }

    #[test]
    fn row_shapes_must_agree() {
        let rows = vec![
            ValueMap::new().set("id", 1).set("name", "A"),
            ValueMap::new().set("id", 2),
        ];
        assert!(prepared(&state(), InsertVerb::Insert, &rows).unwrap_err().is_config());

        let rows = vec![
            ValueMap::new().set("at", raw("NOW()")),
            ValueMap::new().set("at", "2024-01-01"),
        ];
        assert!(prepared(&state(), InsertVerb::Insert, &rows).unwrap_err().is_config());
        assert!(prepared(&state(), InsertVerb::Insert, &[]).unwrap_err().is_config());
    }

    #[test]
    fn replace_verb() {
        let rows = vec![ValueMap::new().set("id", 1)];
        let compiled = direct(&state(), InsertVerb::Replace, &rows).unwrap();
        assert_eq!(compiled.sql, "REPLACE INTO users (id) VALUES (1)");
        assert_eq!(compiled.kind, super::super::QueryType::Replace);
    }
}
