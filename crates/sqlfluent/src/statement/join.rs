//! JOIN clause rendering.

use super::state::{JoinKind, JoinOn, JoinSpec};
use crate::bind::BindMap;
use crate::error::{SqlError, SqlResult};
use crate::placeholder;
use crate::value::Operand;

fn on_fragment(on: &JoinOn, binds: &mut BindMap) -> String {
    match on {
        JoinOn::Raw(sql) => sql.clone(),
        JoinOn::Compare { column, cmp, value } => {
            let rhs = match value {
                Operand::Raw(r) => r.as_str().to_string(),
                Operand::Bind(v) => binds.push(placeholder::prefixed("join", column), v.clone()),
            };
            format!("{column} {} {rhs}", cmp.as_sql())
        }
    }
}

/// Render one join: `<TYPE> JOIN table alias ON first AND rest...`.
pub fn compile_join(join: &JoinSpec, binds: &mut BindMap) -> SqlResult<String> {
    let mut sql = format!("{} {}", join.kind.as_sql(), join.table);
    if let Some(alias) = &join.alias {
        sql.push(' ');
        sql.push_str(alias);
    }
    if join.kind == JoinKind::Cross {
        if !join.on.is_empty() {
            return Err(SqlError::compile(format!(
                "CROSS JOIN {} cannot take ON conditions",
                join.table
            )));
        }
        return Ok(sql);
    }
    if join.on.is_empty() {
        return Err(SqlError::compile(format!(
            "{} {} has no ON condition",
            join.kind.as_sql(),
            join.table
        )));
    }
    let parts: Vec<String> = join.on.iter().map(|on| on_fragment(on, binds)).collect();
    sql.push_str(" ON ");
    sql.push_str(&parts.join(" AND "));
    Ok(sql)
}

/// Render all joins in call order, each prefixed with a space.
pub fn compile_joins(joins: &[JoinSpec], binds: &mut BindMap) -> SqlResult<String> {
    let mut sql = String::new();
    for join in joins {
        sql.push(' ');
        sql.push_str(&compile_join(join, binds)?);
    }
    Ok(sql)
}
