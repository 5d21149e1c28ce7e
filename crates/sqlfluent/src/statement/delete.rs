//! DELETE statements.

use super::join::compile_joins;
use super::state::QueryState;
use super::{Compiled, require_filter};
use crate::bind::BindMap;
use crate::compile::{Tail, compile_tail, compile_where};
use crate::error::SqlResult;

/// `DELETE FROM table alias joins WHERE ... [ORDER BY] [LIMIT n]`
///
/// With joins the target must be named: `DELETE alias FROM table alias JOIN ...`.
pub fn compile(state: &QueryState, strict: bool) -> SqlResult<Compiled> {
    let table = state.table()?;
    let table_ref = state.table_ref()?;
    require_filter(state, strict, "DELETE")?;

    let mut binds = BindMap::new();
    let mut sql = if state.joins.is_empty() {
        format!("DELETE FROM {table_ref}")
    } else {
        let target = state.alias.as_deref().unwrap_or(table);
        format!("DELETE {target} FROM {table_ref}")
    };
    sql.push_str(&compile_joins(&state.joins, &mut binds)?);

    let filter = compile_where(state.where_.as_ref(), &state.conditions, &mut binds)?;
    if !filter.is_empty() {
        sql.push(' ');
        sql.push_str(&filter);
    }
    // Multi-table DELETE takes neither ORDER BY nor LIMIT.
    if state.joins.is_empty() {
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
    }

    Ok(Compiled::new(sql, binds))
}
