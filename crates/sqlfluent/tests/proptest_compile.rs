//! Property-based tests for the condition compiler.

use proptest::prelude::*;
use sqlfluent::prelude::*;
use sqlfluent::placeholder::sanitize;
use sqlfluent::{ColumnTerm, Compiled, Explain, Operand};
use std::collections::HashSet;

fn select(q: &Query) -> Compiled {
    q.compile(&Operation::Select).unwrap()
}

fn column() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["a", "b", "a_2", "status", "u.status", "DATE(created_at)"])
}

fn operand() -> impl Strategy<Value = Operand> {
    prop_oneof![
        3 => any::<i64>().prop_map(Operand::from),
        1 => Just(Operand::from(raw("NOW()"))),
        1 => Just(Operand::from(raw("col_b + 1"))),
    ]
}

/// A grouped condition: `Conjoin(members)` or `Nested(left, right)`.
#[derive(Debug, Clone)]
enum Group {
    Conjoin(Vec<&'static str>),
    Nested(Vec<&'static str>, Vec<&'static str>),
}

fn member() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["a", "a_1", "b", "u.a"])
}

fn group() -> impl Strategy<Value = Group> {
    prop_oneof![
        prop::collection::vec(member(), 1..4).prop_map(Group::Conjoin),
        (
            prop::collection::vec(member(), 1..5),
            prop::collection::vec(member(), 1..3),
        )
            .prop_map(|(left, right)| Group::Nested(left, right)),
        (
            prop::collection::vec(member(), 1..3),
            prop::collection::vec(member(), 1..5),
        )
            .prop_map(|(left, right)| Group::Nested(left, right)),
    ]
}

/// Terms for `columns`, each bound to a fresh value, recording the name each should get.
fn members(
    columns: &[&str],
    index: usize,
    offset: &mut usize,
    next: &mut i64,
    expected: &mut Vec<(String, i64)>,
) -> Vec<ColumnTerm> {
    columns
        .iter()
        .map(|column| {
            expected.push((format!(":{}_{index}_{offset}", sanitize(column)), *next));
            *offset += 1;
            *next += 1;
            col(*column, "=", *next - 1).unwrap()
        })
        .collect()
}

proptest! {
    /// Every bound value gets a distinct name, and the text references them in bind order.
    #[test]
    fn flat_placeholders_are_unique_and_ordered(
        terms in prop::collection::vec((column(), any::<i64>(), any::<bool>()), 1..12)
    ) {
        let mut q = Query::new();
        q.table("t");
        for (col, value, or) in &terms {
            if *or {
                q.or(col, "=", *value);
            } else {
                q.where_(col, "=", *value);
            }
        }
        let c = select(&q);

        let names: Vec<&str> = c.binds.names().collect();
        let unique: HashSet<&str> = names.iter().copied().collect();
        prop_assert_eq!(names.len(), terms.len());
        prop_assert_eq!(unique.len(), names.len());

        let explain = Explain::new(&c);
        let bound: Vec<Value> = c.binds.iter().map(|(_, v)| v.clone()).collect();
        prop_assert_eq!(explain.positional_params, bound);
        prop_assert!(!explain.positional_sql.contains(':'));
    }

    /// Nested members share one counter: every left offset precedes every right offset.
    #[test]
    fn nested_offsets_run_left_to_right(
        left in prop::collection::vec(any::<i64>(), 1..5),
        right in prop::collection::vec(any::<i64>(), 1..5),
        lead in 0usize..3,
    ) {
        let mut q = Query::new();
        q.table("t");
        for i in 0..lead {
            q.and(&format!("x{i}"), "=", 0);
        }
        q.nested(
            left.iter().map(|v| col("a", "=", *v)),
            right.iter().map(|v| col("a", "=", *v)),
            "OR",
            "AND",
        );
        let c = select(&q);

        let expected: Vec<String> = (0..left.len() + right.len())
            .map(|offset| format!(":a_{lead}_{offset}"))
            .collect();
        let group: Vec<&str> = c.binds.names().skip(lead).collect();
        prop_assert_eq!(group, expected.iter().map(String::as_str).collect::<Vec<_>>());

        let split = c.sql.find(") AND (").unwrap();
        for (i, name) in expected.iter().enumerate() {
            let at = c.sql.find(&format!("{name})")).or_else(|| c.sql.find(&format!("{name} "))).unwrap();
            prop_assert_eq!(at < split, i < left.len());
        }
    }

    /// Raw operands are emitted verbatim and never reach the bind map.
    #[test]
    fn raw_operands_are_never_bound(values in prop::collection::vec(operand(), 1..8)) {
        let mut q = Query::new();
        q.table("t").where_in("status", values.clone());
        let c = select(&q);

        let bound = values.iter().filter(|v| !v.is_raw()).count();
        prop_assert_eq!(c.binds.len(), bound);
        for v in &values {
            if let Operand::Raw(r) = v {
                prop_assert!(c.sql.contains(r.as_str()));
            }
        }
        prop_assert!(c.binds.iter().all(|(name, _)| name.starts_with(":status_in_")));
    }

    /// Compiling does not consume or alter the accumulated state.
    #[test]
    fn compile_is_idempotent(
        terms in prop::collection::vec((column(), operand()), 0..6),
        limit in prop::option::of(1u64..100),
    ) {
        let mut q = Query::new();
        q.table("t u");
        for (col, value) in terms {
            q.and(col, "<>", value);
        }
        if let Some(limit) = limit {
            q.limit(limit);
        }
        prop_assert_eq!(select(&q), select(&q));
        prop_assert_eq!(q.to_sql().unwrap(), select(&q).sql);
    }

    /// Mixed Conjoin and Nested groups after colliding flat leads: every name is
    /// unique, carries its group's outer index and running offset, and left
    /// members are emitted before right members.
    #[test]
    fn mixed_groups_keep_names_unique_and_ordered(
        leads in prop::collection::vec(prop::sample::select(vec!["a_1_0", "a_2_0", "b"]), 0..3),
        groups in prop::collection::vec(group(), 1..5),
    ) {
        let mut q = Query::new();
        q.table("t");
        let mut next = 0i64;
        let mut expected: Vec<(String, i64)> = Vec::new();
        for column in &leads {
            expected.push((format!(":{column}"), next));
            q.and(column, "=", next);
            next += 1;
        }
        for (g, group) in groups.iter().enumerate() {
            let index = leads.len() + g;
            let mut offset = 0;
            match group {
                Group::Conjoin(columns) => {
                    let terms = members(columns, index, &mut offset, &mut next, &mut expected);
                    q.conjoin(terms, "OR");
                }
                Group::Nested(left, right) => {
                    let left = members(left, index, &mut offset, &mut next, &mut expected);
                    let right = members(right, index, &mut offset, &mut next, &mut expected);
                    q.nested(left, right, "AND", "OR");
                }
            }
        }
        let c = select(&q);

        let names: Vec<&str> = c.binds.names().collect();
        let unique: HashSet<&str> = names.iter().copied().collect();
        prop_assert_eq!(unique.len(), names.len());
        prop_assert_eq!(names.len(), expected.len());

        for ((name, value), (base, want)) in c.binds.iter().zip(&expected) {
            prop_assert_eq!(value, &Value::Int(*want));
            let suffixed = name.strip_prefix(base.as_str()).is_some_and(|rest| {
                rest.is_empty() || rest.strip_prefix('_').is_some_and(|n| n.parse::<u32>().is_ok())
            });
            prop_assert!(suffixed, "{} does not derive from {}", name, base);
            prop_assert!(c.sql.contains(name));
        }
    }
}
