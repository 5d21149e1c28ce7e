//! Condition compiler.
//!
//! Turns the primary WHERE entry, the condition list and the HAVING/GROUP/ORDER/LIMIT
//! state into SQL text. Values are pushed into the [`BindMap`] in exactly the order
//! their placeholders appear in the text; raw operands are inlined and never bound.

use crate::bind::BindMap;
use crate::condition::{ColumnTerm, Condition, InSet, InSetMode, Logical, WhereCondition};
use crate::error::{SqlError, SqlResult};
use crate::placeholder;
use crate::quote;
use crate::statement::state::{HavingTerm, MatchOrder, QueryState};
use crate::value::Operand;

/// Emit an operand: raw text verbatim, or a freshly bound placeholder.
fn operand(op: &Operand, name: String, binds: &mut BindMap) -> String {
    match op {
        Operand::Raw(r) => r.as_str().to_string(),
        Operand::Bind(v) => binds.push(name, v.clone()),
    }
}

fn term(column: &str, cmp: &str, value: &Operand, name: String, binds: &mut BindMap) -> String {
    let rhs = operand(value, name, binds);
    format!("{column} {cmp} {rhs}")
}

/// Compile the WHERE clause (including the leading `WHERE`), or `""` when unfiltered.
pub fn compile_where(
    primary: Option<&WhereCondition>,
    conditions: &[Condition],
    binds: &mut BindMap,
) -> SqlResult<String> {
    let mut sql = String::new();

    if let Some(w) = primary {
        sql.push_str("WHERE ");
        sql.push_str(&term(
            &w.column,
            w.cmp.as_sql(),
            &w.value,
            placeholder::flat(&w.column),
            binds,
        ));
    }

    for (index, condition) in conditions.iter().enumerate() {
        if !condition.is_filter() {
            continue;
        }
        let fragment = compile_condition(condition, index, binds)?;
        if sql.is_empty() {
            sql.push_str("WHERE ");
        } else {
            sql.push(' ');
            sql.push_str(condition.logical().as_sql());
            sql.push(' ');
        }
        sql.push_str(&fragment);
    }

    Ok(sql)
}

/// Compile one condition at outer position `index` into a boolean fragment.
pub fn compile_condition(condition: &Condition, index: usize, binds: &mut BindMap) -> SqlResult<String> {
    match condition {
        Condition::Simple {
            column, cmp, value, ..
        } => Ok(term(column, cmp.as_sql(), value, placeholder::flat(column), binds)),

        Condition::In {
            column,
            values,
            negate,
            ..
        } => {
            if values.is_empty() {
                // Empty list: IN matches nothing, NOT IN matches everything.
                return Ok(if *negate { "1=1" } else { "1=0" }.to_string());
            }
            let items: Vec<String> = values
                .iter()
                .enumerate()
                .map(|(i, v)| operand(v, placeholder::in_list(column, i), binds))
                .collect();
            let op = if *negate { "NOT IN" } else { "IN" };
            Ok(format!("{column} {op} ({})", items.join(", ")))
        }

        Condition::Against {
            columns,
            mode,
            value,
            ..
        } => {
            if columns.is_empty() {
                return Err(SqlError::compile("MATCH requires at least one column"));
            }
            let term = operand(value, placeholder::against(index), binds);
            Ok(format!(
                "MATCH({}) AGAINST ({term} {})",
                columns.join(", "),
                mode.as_sql()
            ))
        }

        Condition::InSet { inset, .. } => Ok(inset_filter(inset)),

        Condition::Conjoin {
            operator, members, ..
        } => {
            if members.is_empty() {
                return Err(SqlError::compile(format!(
                    "conjoin group at position {index} has no members"
                )));
            }
            let mut offset = 0;
            Ok(group(members, *operator, index, &mut offset, binds))
        }

        Condition::Nested {
            bind_operator,
            inner_operator,
            left,
            right,
            ..
        } => {
            if left.is_empty() || right.is_empty() {
                return Err(SqlError::compile(format!(
                    "nested group at position {index} needs members on both sides"
                )));
            }
            // One counter for both halves keeps right-hand offsets past the left ones.
            let mut offset = 0;
            let lhs = group(left, *inner_operator, index, &mut offset, binds);
            let rhs = group(right, *inner_operator, index, &mut offset, binds);
            Ok(format!("({lhs} {} {rhs})", bind_operator.as_sql()))
        }
    }
}

fn group(
    members: &[ColumnTerm],
    operator: Logical,
    index: usize,
    offset: &mut usize,
    binds: &mut BindMap,
) -> String {
    let parts: Vec<String> = members
        .iter()
        .map(|m| {
            let name = placeholder::grouped(&m.column, index, *offset);
            *offset += 1;
            term(&m.column, m.cmp.as_sql(), &m.value, name, binds)
        })
        .collect();
    format!("({})", parts.join(&format!(" {} ", operator.as_sql())))
}

fn inset_arg(text: &str, is_column: bool) -> String {
    if is_column {
        text.to_string()
    } else {
        quote::quote_str(text)
    }
}

fn find_in_set(inset: &InSet) -> String {
    format!(
        "FIND_IN_SET({}, {})",
        inset_arg(&inset.search, inset.search_is_column),
        inset_arg(&inset.list, inset.list_is_column)
    )
}

/// Boolean fragment for a `FIND_IN_SET` filter.
pub fn inset_filter(inset: &InSet) -> String {
    let list = inset_arg(&inset.list, inset.list_is_column);
    match inset.mode {
        InSetMode::Exists => format!("{} > 0", find_in_set(inset)),
        InSetMode::First => format!("{} = 1", find_in_set(inset)),
        InSetMode::None => format!("{} = 0", find_in_set(inset)),
        InSetMode::Last => format!(
            "{} = (LENGTH({list})-LENGTH(REPLACE({list},',',''))+1)",
            find_in_set(inset)
        ),
        InSetMode::Contains => {
            if inset.search_is_column {
                format!("{list} LIKE CONCAT('%', {}, '%')", inset.search)
            } else {
                format!("{list} LIKE '%{}%'", quote::escape(&inset.search))
            }
        }
        InSetMode::Position => projection(inset),
    }
}

/// Select-list expression for a position-mode `FIND_IN_SET`.
pub fn projection(inset: &InSet) -> String {
    format!("{} AS inset_position", find_in_set(inset))
}

fn compile_having(having: &[HavingTerm], binds: &mut BindMap) -> String {
    let parts: Vec<String> = having
        .iter()
        .map(|h| match h {
            HavingTerm::Raw(expr) => expr.clone(),
            HavingTerm::Compare { column, cmp, value } => term(
                column,
                cmp.as_sql(),
                value,
                placeholder::prefixed("having", column),
                binds,
            ),
        })
        .collect();
    parts.join(" AND ")
}

fn compile_match_order(order: &MatchOrder, i: usize, binds: &mut BindMap) -> String {
    let term = operand(&order.term, placeholder::match_order(i), binds);
    format!(
        "MATCH({}) AGAINST ({term} {}) {}",
        order.columns.join(", "),
        order.mode.as_sql(),
        order.direction.as_sql()
    )
}

/// Which trailing clauses a statement kind takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tail {
    pub grouping: bool,
    pub ordering: bool,
    pub limit: Option<u64>,
    pub offset: bool,
}

/// Compile GROUP BY → HAVING → ORDER BY → full-text order → LIMIT, space-prefixed.
pub fn compile_tail(state: &QueryState, tail: Tail, binds: &mut BindMap) -> SqlResult<String> {
    let mut sql = String::new();

    if tail.grouping {
        if !state.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&state.group_by.join(", "));
        }
        if !state.having.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&compile_having(&state.having, binds));
        }
    }

    if tail.ordering {
        let mut order: Vec<String> = state.order_by.clone();
        for (i, m) in state.match_order.iter().enumerate() {
            if m.columns.is_empty() {
                return Err(SqlError::compile("full-text ORDER BY requires at least one column"));
            }
            order.push(compile_match_order(m, i, binds));
        }
        if !order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }
    }

    let offset = if tail.offset { state.offset } else { None };
    match (tail.limit, offset) {
        (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
        (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
        // MySQL has no bare OFFSET; this is its documented "all rows" limit.
        (None, Some(offset)) => sql.push_str(&format!(" LIMIT 18446744073709551615 OFFSET {offset}")),
        (None, None) => {}
    }

    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Cmp, MatchMode, col};
    use crate::value::{Value, raw};

    fn simple(column: &str, value: impl Into<Operand>, logical: Logical) -> Condition {
        Condition::Simple {
            column: column.into(),
            cmp: Cmp::Eq,
            value: value.into(),
            logical,
        }
    }

    #[test]
    fn first_condition_opens_where() {
        let mut binds = BindMap::new();
        let conds = vec![
            simple("status", "active", Logical::Or),
            simple("role", "admin", Logical::Or),
        ];
        let sql = compile_where(None, &conds, &mut binds).unwrap();
        assert_eq!(sql, "WHERE status = :status OR role = :role");
    }

    #[test]
    fn primary_where_comes_first() {
        let mut binds = BindMap::new();
        let w = WhereCondition {
            column: "u.status".into(),
            cmp: Cmp::Eq,
            value: "active".into(),
        };
        let conds = vec![simple("u.role", "admin", Logical::And)];
        let sql = compile_where(Some(&w), &conds, &mut binds).unwrap();
        assert_eq!(sql, "WHERE u.status = :status AND u.role = :role");
        let names: Vec<_> = binds.names().collect();
        assert_eq!(names, vec![":status", ":role"]);
    }

    #[test]
    fn in_list_mixes_raw_and_bound() {
        let mut binds = BindMap::new();
        let cond = Condition::In {
            column: "status".into(),
            values: vec![raw("NOW()").into(), "x".into()],
            negate: false,
            logical: Logical::And,
        };
        let sql = compile_condition(&cond, 0, &mut binds).unwrap();
        assert_eq!(sql, "status IN (NOW(), :status_in_1)");
        assert_eq!(binds.len(), 1);
        assert_eq!(binds.get(":status_in_1"), Some(&Value::from("x")));
    }

    #[test]
    fn not_in_and_empty_lists() {
        let mut binds = BindMap::new();
        let cond = Condition::In {
            column: "id".into(),
            values: vec![1.into(), 2.into()],
            negate: true,
            logical: Logical::And,
        };
        assert_eq!(
            compile_condition(&cond, 0, &mut binds).unwrap(),
            "id NOT IN (:id_in_0, :id_in_1)"
        );
        let empty = Condition::In {
            column: "id".into(),
            values: vec![],
            negate: false,
            logical: Logical::And,
        };
        assert_eq!(compile_condition(&empty, 1, &mut binds).unwrap(), "1=0");
    }

    #[test]
    fn against_uses_index_named_placeholder() {
        let mut binds = BindMap::new();
        let cond = Condition::Against {
            columns: vec!["title".into(), "body".into()],
            mode: MatchMode::Boolean,
            value: "+rust -java".into(),
            logical: Logical::And,
        };
        let sql = compile_condition(&cond, 2, &mut binds).unwrap();
        assert_eq!(sql, "MATCH(title, body) AGAINST (:match_column_2 IN BOOLEAN MODE)");
    }

    #[test]
    fn conjoin_offsets_are_local() {
        let mut binds = BindMap::new();
        let cond = Condition::Conjoin {
            operator: Logical::Or,
            members: vec![col("a", "=", 1).unwrap(), col("b", "=", 2).unwrap()],
            logical: Logical::And,
        };
        assert_eq!(
            compile_condition(&cond, 0, &mut binds).unwrap(),
            "(a = :a_0_0 OR b = :b_0_1)"
        );
    }

    #[test]
    fn nested_shares_the_offset_counter() {
        let mut binds = BindMap::new();
        let cond = Condition::Nested {
            bind_operator: Logical::And,
            inner_operator: Logical::Or,
            left: vec![col("a", "=", 1).unwrap(), col("a", "=", 2).unwrap()],
            right: vec![col("a", "=", 3).unwrap()],
            logical: Logical::And,
        };
        assert_eq!(
            compile_condition(&cond, 1, &mut binds).unwrap(),
            "((a = :a_1_0 OR a = :a_1_1) AND (a = :a_1_2))"
        );
        assert_eq!(binds.len(), 3);
    }

    #[test]
    fn nested_rejects_empty_side() {
        let mut binds = BindMap::new();
        let cond = Condition::Nested {
            bind_operator: Logical::And,
            inner_operator: Logical::Or,
            left: vec![col("a", "=", 1).unwrap()],
            right: vec![],
            logical: Logical::And,
        };
        assert!(compile_condition(&cond, 0, &mut binds).unwrap_err().is_compile());
    }

    #[test]
    fn inset_fragments() {
        let tags = |mode| InSet::new("php", "tags", mode).list_column();
        assert_eq!(inset_filter(&tags(InSetMode::Exists)), "FIND_IN_SET('php', tags) > 0");
        assert_eq!(inset_filter(&tags(InSetMode::First)), "FIND_IN_SET('php', tags) = 1");
        assert_eq!(inset_filter(&tags(InSetMode::None)), "FIND_IN_SET('php', tags) = 0");
        assert_eq!(
            inset_filter(&tags(InSetMode::Last)),
            "FIND_IN_SET('php', tags) = (LENGTH(tags)-LENGTH(REPLACE(tags,',',''))+1)"
        );
        assert_eq!(inset_filter(&tags(InSetMode::Contains)), "tags LIKE '%php%'");
        assert_eq!(
            projection(&tags(InSetMode::Position)),
            "FIND_IN_SET('php', tags) AS inset_position"
        );
    }

    #[test]
    fn inset_escapes_literals() {
        let inset = InSet::new("it's", "a,b", InSetMode::Exists);
        assert_eq!(inset_filter(&inset), r"FIND_IN_SET('it\'s', 'a,b') > 0");
        let by_column = InSet::new("u.skill", "j.skills", InSetMode::Contains)
            .search_column()
            .list_column();
        assert_eq!(inset_filter(&by_column), "j.skills LIKE CONCAT('%', u.skill, '%')");
    }
}
