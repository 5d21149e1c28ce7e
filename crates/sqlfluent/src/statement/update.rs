//! UPDATE statements.

use super::join::compile_joins;
use super::state::QueryState;
use super::{Compiled, require_filter};
use crate::bind::BindMap;
use crate::compile::{Tail, compile_tail, compile_where};
use crate::error::{SqlError, SqlResult};
use crate::placeholder;
use crate::value::Operand;

/// `UPDATE table alias joins SET col = :set_col, ... WHERE ... [ORDER BY] [LIMIT n]`
pub fn compile(state: &QueryState, strict: bool) -> SqlResult<Compiled> {
    let table = state.table_ref()?;
    if state.set_values.is_empty() {
        return Err(SqlError::config("UPDATE requires at least one SET value"));
    }
    require_filter(state, strict, "UPDATE")?;

    let mut binds = BindMap::new();
    let mut sql = format!("UPDATE {table}");
    sql.push_str(&compile_joins(&state.joins, &mut binds)?);

    let assignments: Vec<String> = state
        .set_values
        .iter()
        .map(|(column, value)| {
            let rhs = match value {
                Operand::Raw(r) => r.as_str().to_string(),
                Operand::Bind(v) => binds.push(placeholder::prefixed("set", column), v.clone()),
            };
            format!("{column} = {rhs}")
        })
        .collect();
    sql.push_str(" SET ");
    sql.push_str(&assignments.join(", "));

    let filter = compile_where(state.where_.as_ref(), &state.conditions, &mut binds)?;
    if !filter.is_empty() {
        sql.push(' ');
        sql.push_str(&filter);
    }
    sql.push_str(&compile_tail(
        state,
        Tail {
            grouping: false,
            ordering: true,
            limit: state.limit,
            offset: false,
        },
        &mut binds,
    )?);

    Ok(Compiled::new(sql, binds))
}
