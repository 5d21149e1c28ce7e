//! SELECT-shaped statements: plain reads, `find`, counts, aggregates and existence checks.

use super::join::compile_joins;
use super::state::QueryState;
use super::{COUNT_COLUMN, Compiled, EXISTS_COLUMN, Operation};
use crate::bind::BindMap;
use crate::compile::{Tail, compile_tail, compile_where, projection};
use crate::condition::Condition;
use crate::error::SqlResult;

fn select_list(state: &QueryState) -> String {
    let mut items: Vec<String> = if state.columns.is_empty() {
        vec!["*".to_string()]
    } else {
        state.columns.clone()
    };
    for condition in &state.conditions {
        if let Condition::InSet { inset, .. } = condition
            && !condition.is_filter()
        {
            items.push(projection(inset));
        }
    }
    let list = items.join(", ");
    if state.distinct {
        format!("DISTINCT {list}")
    } else {
        list
    }
}

/// `FROM table alias joins WHERE ...`, with binds pushed in text order.
fn body(state: &QueryState, binds: &mut BindMap) -> SqlResult<String> {
    let mut sql = format!("FROM {}", state.table_ref()?);
    sql.push_str(&compile_joins(&state.joins, binds)?);
    let filter = compile_where(state.where_.as_ref(), &state.conditions, binds)?;
    if !filter.is_empty() {
        sql.push(' ');
        sql.push_str(&filter);
    }
    Ok(sql)
}

const GROUPED: Tail = Tail {
    grouping: true,
    ordering: false,
    limit: None,
    offset: false,
};

/// Compile a read operation. UPDATE/DELETE are dispatched elsewhere.
pub fn compile(state: &QueryState, op: &Operation) -> SqlResult<Compiled> {
    let mut binds = BindMap::new();

    let sql = match op {
        Operation::Count if state.distinct || !state.group_by.is_empty() => {
            let body = body(state, &mut binds)?;
            let tail = compile_tail(state, GROUPED, &mut binds)?;
            format!(
                "SELECT COUNT(*) AS {COUNT_COLUMN} FROM (SELECT {} {body}{tail}) AS counted",
                select_list(state)
            )
        }
        Operation::Count => {
            let body = body(state, &mut binds)?;
            let tail = compile_tail(state, GROUPED, &mut binds)?;
            format!("SELECT COUNT(*) AS {COUNT_COLUMN} {body}{tail}")
        }
        Operation::Aggregate(agg, column) => {
            let body = body(state, &mut binds)?;
            let tail = compile_tail(state, GROUPED, &mut binds)?;
            format!(
                "SELECT {}({column}) AS {} {body}{tail}",
                agg.function(),
                agg.column()
            )
        }
        Operation::Exists => {
            let body = body(state, &mut binds)?;
            let tail = compile_tail(
                state,
                Tail {
                    limit: Some(1),
                    ..GROUPED
                },
                &mut binds,
            )?;
            format!("SELECT 1 AS {EXISTS_COLUMN} {body}{tail}")
        }
        Operation::Find | Operation::Select | Operation::Update | Operation::Delete => {
            let limit = if *op == Operation::Find {
                Some(1)
            } else {
                state.limit
            };
            let body = body(state, &mut binds)?;
            let tail = compile_tail(
                state,
                Tail {
                    grouping: true,
                    ordering: true,
                    limit,
                    offset: true,
                },
                &mut binds,
            )?;
            format!("SELECT {} {body}{tail}", select_list(state))
        }
    };

    Ok(Compiled::new(sql, binds))
}
