//! The fluent surface shared by [`Query`] and [`crate::Builder`].
//!
//! Every method records intent on the [`QueryState`] and returns `&mut Self`.
//! Errors (unknown keywords, invalid identifiers, ...) never interrupt the chain:
//! the first one is kept and reported by the next compile or terminal call.

use crate::condition::{
    Cmp, Condition, InSet, IntoTerm, Keyword, Logical, MatchMode, WhereCondition,
};
use crate::error::{SqlError, SqlResult};
use crate::ident;
use crate::statement::{
    self, CacheDirective, Compiled, Direction, DupOp, DuplicateRule, HavingTerm, JoinKind, JoinOn,
    JoinSpec, MatchOrder, Operation, QueryState,
};
use crate::value::{Operand, Raw, ValueMap};
use std::time::Duration;

/// Split `"orders o"` / `"orders AS o"` into a validated table and optional alias.
pub(crate) fn table_target(target: &str) -> SqlResult<(String, Option<String>)> {
    let parts: Vec<&str> = target.split_whitespace().collect();
    match parts.as_slice() {
        [table] => Ok((ident::table_name(table)?, None)),
        [table, alias] => Ok((ident::table_name(table)?, Some(ident::alias_name(alias)?))),
        [table, kw, alias] if kw.eq_ignore_ascii_case("as") => {
            Ok((ident::table_name(table)?, Some(ident::alias_name(alias)?)))
        }
        [] => Err(SqlError::config("table name cannot be empty")),
        _ => Err(SqlError::config(format!("invalid table reference '{target}'"))),
    }
}

fn terms<I>(members: I) -> SqlResult<Vec<crate::condition::ColumnTerm>>
where
    I: IntoIterator,
    I::Item: IntoTerm,
{
    members.into_iter().map(IntoTerm::into_term).collect()
}

/// Fluent statement configuration.
pub trait Fluent {
    fn state(&self) -> &QueryState;
    fn state_mut(&mut self) -> &mut QueryState;

    /// Whether UPDATE/DELETE without a filter are refused.
    fn strict_mode(&self) -> bool {
        true
    }

    /// Drop all accumulated intent.
    fn reset(&mut self) -> &mut Self {
        self.state_mut().clear();
        self
    }

    // ==================== Table & columns ====================

    /// Set the target table. Accepts `"users"` or `"users u"`.
    fn table(&mut self, name: &str) -> &mut Self {
        let state = self.state_mut();
        if let Some((table, alias)) = state.take(table_target(name)) {
            state.table = Some(table);
            if alias.is_some() {
                state.alias = alias;
            }
        }
        self
    }

    /// Set the target table and its alias.
    fn table_as(&mut self, name: &str, alias: &str) -> &mut Self {
        self.table(name).alias(alias)
    }

    fn alias(&mut self, alias: &str) -> &mut Self {
        let state = self.state_mut();
        if let Some(alias) = state.take(ident::alias_name(alias)) {
            state.alias = Some(alias);
        }
        self
    }

    /// Append SELECT columns (expressions allowed).
    fn columns<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state_mut()
            .columns
            .extend(columns.into_iter().map(Into::into));
        self
    }

    /// Append one raw select-list expression.
    fn select_raw(&mut self, expr: &str) -> &mut Self {
        self.state_mut().columns.push(expr.to_string());
        self
    }

    fn distinct(&mut self) -> &mut Self {
        self.state_mut().distinct = true;
        self
    }

    // ==================== WHERE ====================

    /// Primary `WHERE column cmp value`. A second call chains with AND.
    fn where_(
        &mut self,
        column: &str,
        cmp: impl Keyword<Cmp>,
        value: impl Into<Operand>,
    ) -> &mut Self {
        if self.state().where_.is_some() {
            return self.and(column, cmp, value);
        }
        let state = self.state_mut();
        if let Some(cmp) = state.take(cmp.keyword()) {
            state.where_ = Some(WhereCondition {
                column: column.to_string(),
                cmp,
                value: value.into(),
            });
        }
        self
    }

    /// `column IS NULL`
    fn where_null(&mut self, column: &str) -> &mut Self {
        self.and(column, Cmp::Is, Raw::new("NULL"))
    }

    /// `column IS NOT NULL`
    fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.and(column, Cmp::IsNot, Raw::new("NULL"))
    }

    /// Push a condition, or record an error.
    fn push_condition(&mut self, condition: SqlResult<Condition>) -> &mut Self {
        let state = self.state_mut();
        if let Some(condition) = state.take(condition) {
            state.conditions.push(condition);
        }
        self
    }

    fn and(
        &mut self,
        column: &str,
        cmp: impl Keyword<Cmp>,
        value: impl Into<Operand>,
    ) -> &mut Self {
        let condition = cmp.keyword().map(|cmp| Condition::Simple {
            column: column.to_string(),
            cmp,
            value: value.into(),
            logical: Logical::And,
        });
        self.push_condition(condition)
    }

    fn or(
        &mut self,
        column: &str,
        cmp: impl Keyword<Cmp>,
        value: impl Into<Operand>,
    ) -> &mut Self {
        let condition = cmp.keyword().map(|cmp| Condition::Simple {
            column: column.to_string(),
            cmp,
            value: value.into(),
            logical: Logical::Or,
        });
        self.push_condition(condition)
    }

    /// Shared body of the IN helpers.
    fn in_list<I>(&mut self, column: &str, values: I, negate: bool, logical: Logical) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        let condition = Condition::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
            negate,
            logical,
        };
        self.push_condition(Ok(condition))
    }

    fn where_in<I>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        self.in_list(column, values, false, Logical::And)
    }

    fn where_not_in<I>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        self.in_list(column, values, true, Logical::And)
    }

    fn or_in<I>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        self.in_list(column, values, false, Logical::Or)
    }

    fn or_not_in<I>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        self.in_list(column, values, true, Logical::Or)
    }

    /// Full-text `MATCH(columns) AGAINST (term mode)`.
    fn against(
        &mut self,
        columns: &[&str],
        term: impl Into<Operand>,
        mode: impl Keyword<MatchMode>,
    ) -> &mut Self {
        let condition = mode.keyword().map(|mode| Condition::Against {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            mode,
            value: term.into(),
            logical: Logical::And,
        });
        self.push_condition(condition)
    }

    fn or_against(
        &mut self,
        columns: &[&str],
        term: impl Into<Operand>,
        mode: impl Keyword<MatchMode>,
    ) -> &mut Self {
        let condition = mode.keyword().map(|mode| Condition::Against {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            mode,
            value: term.into(),
            logical: Logical::Or,
        });
        self.push_condition(condition)
    }

    /// `FIND_IN_SET` filter, or a position projection in [`crate::InSetMode::Position`].
    fn in_set(&mut self, inset: InSet) -> &mut Self {
        self.push_condition(Ok(Condition::InSet {
            inset,
            logical: Logical::And,
        }))
    }

    fn or_in_set(&mut self, inset: InSet) -> &mut Self {
        self.push_condition(Ok(Condition::InSet {
            inset,
            logical: Logical::Or,
        }))
    }

    /// One parenthesized group: `(a = :a_n_0 OR b = :b_n_1)`.
    fn conjoin<I>(&mut self, members: I, operator: impl Keyword<Logical>) -> &mut Self
    where
        I: IntoIterator,
        I::Item: IntoTerm,
    {
        let condition = operator.keyword().and_then(|operator| {
            Ok(Condition::Conjoin {
                operator,
                members: terms(members)?,
                logical: Logical::And,
            })
        });
        self.push_condition(condition)
    }

    fn or_conjoin<I>(&mut self, members: I, operator: impl Keyword<Logical>) -> &mut Self
    where
        I: IntoIterator,
        I::Item: IntoTerm,
    {
        let condition = operator.keyword().and_then(|operator| {
            Ok(Condition::Conjoin {
                operator,
                members: terms(members)?,
                logical: Logical::Or,
            })
        });
        self.push_condition(condition)
    }

    /// Two groups: `((left inner ...) bind (right inner ...))`.
    fn nested<L, R>(
        &mut self,
        left: L,
        right: R,
        inner: impl Keyword<Logical>,
        bind: impl Keyword<Logical>,
    ) -> &mut Self
    where
        L: IntoIterator,
        L::Item: IntoTerm,
        R: IntoIterator,
        R::Item: IntoTerm,
    {
        let condition = nested_condition(left, right, inner, bind, Logical::And);
        self.push_condition(condition)
    }

    fn or_nested<L, R>(
        &mut self,
        left: L,
        right: R,
        inner: impl Keyword<Logical>,
        bind: impl Keyword<Logical>,
    ) -> &mut Self
    where
        L: IntoIterator,
        L::Item: IntoTerm,
        R: IntoIterator,
        R::Item: IntoTerm,
    {
        let condition = nested_condition(left, right, inner, bind, Logical::Or);
        self.push_condition(condition)
    }

    // ==================== JOIN ====================

    /// Add a join on `target` (`"orders o"`). Joining the same table and alias
    /// again appends `on` to the existing join.
    fn join(&mut self, kind: impl Keyword<JoinKind>, target: &str, on: &str) -> &mut Self {
        let state = self.state_mut();
        let Some(kind) = state.take(kind.keyword()) else {
            return self;
        };
        let Some((table, alias)) = state.take(table_target(target)) else {
            return self;
        };
        let on = (!on.trim().is_empty()).then(|| JoinOn::Raw(on.to_string()));
        match state.find_join_mut(&table, alias.as_deref()) {
            Some(existing) => existing.on.extend(on),
            None => state.joins.push(JoinSpec {
                kind,
                table,
                alias,
                on: on.into_iter().collect(),
            }),
        }
        self
    }

    fn inner_join(&mut self, target: &str, on: &str) -> &mut Self {
        self.join(JoinKind::Inner, target, on)
    }

    fn left_join(&mut self, target: &str, on: &str) -> &mut Self {
        self.join(JoinKind::Left, target, on)
    }

    fn right_join(&mut self, target: &str, on: &str) -> &mut Self {
        self.join(JoinKind::Right, target, on)
    }

    fn full_join(&mut self, target: &str, on: &str) -> &mut Self {
        self.join(JoinKind::Full, target, on)
    }

    fn full_outer_join(&mut self, target: &str, on: &str) -> &mut Self {
        self.join(JoinKind::FullOuter, target, on)
    }

    fn cross_join(&mut self, target: &str) -> &mut Self {
        self.join(JoinKind::Cross, target, "")
    }

    /// Append a raw ON fragment to an existing join.
    fn and_on(&mut self, target: &str, fragment: &str) -> &mut Self {
        let on = JoinOn::Raw(fragment.to_string());
        push_join_on(self.state_mut(), target, Ok(on));
        self
    }

    /// Append a bound `column cmp value` ON fragment to an existing join.
    fn on_value(
        &mut self,
        target: &str,
        column: &str,
        cmp: impl Keyword<Cmp>,
        value: impl Into<Operand>,
    ) -> &mut Self {
        let on = cmp.keyword().map(|cmp| JoinOn::Compare {
            column: column.to_string(),
            cmp,
            value: value.into(),
        });
        push_join_on(self.state_mut(), target, on);
        self
    }

    // ==================== GROUP / HAVING / ORDER / LIMIT ====================

    fn group_by<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state_mut()
            .group_by
            .extend(columns.into_iter().map(Into::into));
        self
    }

    fn having(
        &mut self,
        column: &str,
        cmp: impl Keyword<Cmp>,
        value: impl Into<Operand>,
    ) -> &mut Self {
        let state = self.state_mut();
        if let Some(cmp) = state.take(cmp.keyword()) {
            state.having.push(HavingTerm::Compare {
                column: column.to_string(),
                cmp,
                value: value.into(),
            });
        }
        self
    }

    fn having_raw(&mut self, expr: &str) -> &mut Self {
        self.state_mut().having.push(HavingTerm::Raw(expr.to_string()));
        self
    }

    fn order_by(&mut self, column: &str, direction: impl Keyword<Direction>) -> &mut Self {
        let state = self.state_mut();
        if let Some(direction) = state.take(direction.keyword()) {
            state
                .order_by
                .push(format!("{column} {}", direction.as_sql()));
        }
        self
    }

    fn order_by_raw(&mut self, expr: &str) -> &mut Self {
        self.state_mut().order_by.push(expr.to_string());
        self
    }

    /// Order by full-text relevance, after any plain ORDER BY items.
    fn order_by_match(
        &mut self,
        columns: &[&str],
        term: impl Into<Operand>,
        mode: impl Keyword<MatchMode>,
        direction: impl Keyword<Direction>,
    ) -> &mut Self {
        let state = self.state_mut();
        let mode = state.take(mode.keyword());
        let direction = state.take(direction.keyword());
        if let (Some(mode), Some(direction)) = (mode, direction) {
            state.match_order.push(MatchOrder {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                term: term.into(),
                mode,
                direction,
            });
        }
        self
    }

    fn limit(&mut self, limit: u64) -> &mut Self {
        self.state_mut().limit = Some(limit);
        self
    }

    fn offset(&mut self, offset: u64) -> &mut Self {
        self.state_mut().offset = Some(offset);
        self
    }

    // ==================== Mutation intent ====================

    /// UPDATE SET value.
    fn set(&mut self, column: &str, value: impl Into<Operand>) -> &mut Self {
        self.state_mut().set_values.insert(column, value);
        self
    }

    fn set_raw(&mut self, column: &str, expr: &str) -> &mut Self {
        self.set(column, Raw::new(expr))
    }

    fn set_values(&mut self, values: ValueMap) -> &mut Self {
        self.state_mut().set_values.extend(values);
        self
    }

    /// `ON DUPLICATE KEY UPDATE` rule: `"="`, `"+="` or `"-="`.
    fn on_duplicate(
        &mut self,
        column: &str,
        op: impl Keyword<DupOp>,
        value: impl Into<Operand>,
    ) -> &mut Self {
        let state = self.state_mut();
        if let Some(op) = state.take(op.keyword()) {
            state.duplicates.push(DuplicateRule {
                column: column.to_string(),
                op,
                value: value.into(),
            });
        }
        self
    }

    /// `INSERT IGNORE`
    fn ignore(&mut self) -> &mut Self {
        self.state_mut().ignore = true;
        self
    }

    /// Choose the insert strategy for the next insert/replace.
    fn prepared(&mut self, prepared: bool) -> &mut Self {
        self.state_mut().prepared = Some(prepared);
        self
    }

    // ==================== Cache intent ====================

    /// Serve the next read from cache when fresh, with the default TTL.
    fn cache(&mut self) -> &mut Self {
        self.state_mut().cache = Some(CacheDirective::default());
        self
    }

    fn cache_for(&mut self, ttl: Duration) -> &mut Self {
        self.state_mut().cache = Some(CacheDirective {
            key: None,
            ttl: Some(ttl),
        });
        self
    }

    /// Cache under an explicit key.
    fn cache_key(&mut self, key: &str, ttl: Option<Duration>) -> &mut Self {
        self.state_mut().cache = Some(CacheDirective {
            key: Some(key.to_string()),
            ttl,
        });
        self
    }

    // ==================== Inspection ====================

    /// Compile the accumulated state without consuming it.
    fn compile(&self, op: &Operation) -> SqlResult<Compiled> {
        statement::compile(self.state(), op, self.strict_mode())
    }

    /// SQL text of the SELECT the current state describes.
    fn to_sql(&self) -> SqlResult<String> {
        self.compile(&Operation::Select).map(|c| c.sql)
    }
}

fn nested_condition<L, R>(
    left: L,
    right: R,
    inner: impl Keyword<Logical>,
    bind: impl Keyword<Logical>,
    logical: Logical,
) -> SqlResult<Condition>
where
    L: IntoIterator,
    L::Item: IntoTerm,
    R: IntoIterator,
    R::Item: IntoTerm,
{
    Ok(Condition::Nested {
        bind_operator: bind.keyword()?,
        inner_operator: inner.keyword()?,
        left: terms(left)?,
        right: terms(right)?,
        logical,
    })
}

fn push_join_on(state: &mut QueryState, target: &str, on: SqlResult<JoinOn>) {
    let Some(on) = state.take(on) else {
        return;
    };
    let Some((table, alias)) = state.take(table_target(target)) else {
        return;
    };
    match state.find_join_mut(&table, alias.as_deref()) {
        Some(join) => join.on.push(on),
        None => state.fail(SqlError::compile(format!(
            "no join on '{target}' to attach an ON condition to"
        ))),
    }
}

/// A driver-less statement holder: compiles, never executes.
#[derive(Debug, Clone)]
pub struct Query {
    state: QueryState,
    strict: bool,
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

impl Query {
    pub fn new() -> Self {
        Self {
            state: QueryState::new(),
            strict: true,
        }
    }

    /// Allow UPDATE/DELETE without a filter.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

impl Fluent for Query {
    fn state(&self) -> &QueryState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut QueryState {
        &mut self.state
    }

    fn strict_mode(&self) -> bool {
        self.strict
    }
}
