//! Accumulated intent for one statement.

use crate::condition::{Cmp, Condition, Keyword, MatchMode, WhereCondition};
use crate::error::{SqlError, SqlResult};
use crate::value::{Operand, ValueMap};
use std::str::FromStr;
use std::time::Duration;

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Cross,
    Full,
    FullOuter,
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Cross => "CROSS JOIN",
            JoinKind::Full => "FULL JOIN",
            JoinKind::FullOuter => "FULL OUTER JOIN",
        }
    }
}

impl FromStr for JoinKind {
    type Err = SqlError;

    fn from_str(s: &str) -> SqlResult<Self> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_uppercase();
        match normalized.trim_end_matches(" JOIN") {
            "" | "INNER" => Ok(JoinKind::Inner),
            "LEFT" | "LEFT OUTER" => Ok(JoinKind::Left),
            "RIGHT" | "RIGHT OUTER" => Ok(JoinKind::Right),
            "CROSS" => Ok(JoinKind::Cross),
            "FULL" => Ok(JoinKind::Full),
            "FULL OUTER" | "FULL_OUTER" => Ok(JoinKind::FullOuter),
            _ => Err(SqlError::compile(format!("unknown join type '{s}'"))),
        }
    }
}

impl Keyword<JoinKind> for JoinKind {
    fn keyword(self) -> SqlResult<JoinKind> {
        Ok(self)
    }
}

/// One ON fragment of a join.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOn {
    /// Column-to-column comparison or any other SQL, emitted verbatim.
    Raw(String),
    /// `column cmp value` with the value bound (or inlined when raw).
    Compare {
        column: String,
        cmp: Cmp,
        value: Operand,
    },
}

/// A joined table; keyed by `table + alias`.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    pub kind: JoinKind,
    pub table: String,
    pub alias: Option<String>,
    pub on: Vec<JoinOn>,
}

impl JoinSpec {
    pub fn matches(&self, table: &str, alias: Option<&str>) -> bool {
        self.table == table && self.alias.as_deref() == alias
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl FromStr for Direction {
    type Err = SqlError;

    fn from_str(s: &str) -> SqlResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "ASC" => Ok(Direction::Asc),
            "DESC" => Ok(Direction::Desc),
            other => Err(SqlError::compile(format!("unknown sort direction '{other}'"))),
        }
    }
}

impl Keyword<Direction> for Direction {
    fn keyword(self) -> SqlResult<Direction> {
        Ok(self)
    }
}

/// A HAVING term.
#[derive(Debug, Clone, PartialEq)]
pub enum HavingTerm {
    Raw(String),
    Compare {
        column: String,
        cmp: Cmp,
        value: Operand,
    },
}

/// Full-text relevance ordering, appended after the plain ORDER BY items.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOrder {
    pub columns: Vec<String>,
    pub term: Operand,
    pub mode: MatchMode,
    pub direction: Direction,
}

/// Update expression kind of an `ON DUPLICATE KEY UPDATE` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DupOp {
    /// `col = val`
    Set,
    /// `col = col + val`
    Add,
    /// `col = col - val`
    Sub,
}

impl FromStr for DupOp {
    type Err = SqlError;

    fn from_str(s: &str) -> SqlResult<Self> {
        match s.trim() {
            "=" => Ok(DupOp::Set),
            "+=" => Ok(DupOp::Add),
            "-=" => Ok(DupOp::Sub),
            other => Err(SqlError::compile(format!(
                "unknown duplicate-key operation '{other}' (expected =, += or -=)"
            ))),
        }
    }
}

impl Keyword<DupOp> for DupOp {
    fn keyword(self) -> SqlResult<DupOp> {
        Ok(self)
    }
}

/// A duplicate-key update rule.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateRule {
    pub column: String,
    pub op: DupOp,
    pub value: Operand,
}

/// Read-cache request for the next read terminal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheDirective {
    pub key: Option<String>,
    pub ttl: Option<Duration>,
}

/// Everything the fluent calls have accumulated for the current statement.
///
/// Cleared wholesale by [`QueryState::clear`] after every terminal call.
#[derive(Debug, Clone, Default)]
pub struct QueryState {
    /// Validated table SQL
    pub table: Option<String>,
    pub alias: Option<String>,
    /// SELECT list (empty means `*`)
    pub columns: Vec<String>,
    pub distinct: bool,
    pub joins: Vec<JoinSpec>,
    /// Primary WHERE entry
    pub where_: Option<WhereCondition>,
    /// Additional AND/OR chained conditions
    pub conditions: Vec<Condition>,
    pub group_by: Vec<String>,
    pub having: Vec<HavingTerm>,
    pub order_by: Vec<String>,
    pub match_order: Vec<MatchOrder>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// UPDATE SET values
    pub set_values: ValueMap,
    pub duplicates: Vec<DuplicateRule>,
    pub ignore: bool,
    /// Per-statement insert strategy override
    pub prepared: Option<bool>,
    pub cache: Option<CacheDirective>,
    /// First error hit by a fluent call
    pub build_error: Option<SqlError>,
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error; only the first one is kept.
    pub fn fail(&mut self, err: SqlError) {
        if self.build_error.is_none() {
            self.build_error = Some(err);
        }
    }

    /// Keep the value of `result` or record its error.
    pub fn take<T>(&mut self, result: SqlResult<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    /// Surface a recorded fluent error.
    pub fn check(&self) -> SqlResult<()> {
        match &self.build_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// The validated table, or a configuration error when none was set.
    pub fn table(&self) -> SqlResult<&str> {
        self.table
            .as_deref()
            .ok_or_else(|| SqlError::config("no table selected; call table() first"))
    }

    /// `table alias` as it appears after FROM/UPDATE/JOIN.
    pub fn table_ref(&self) -> SqlResult<String> {
        let table = self.table()?;
        Ok(match &self.alias {
            Some(alias) => format!("{table} {alias}"),
            None => table.to_string(),
        })
    }

    /// Whether any WHERE filter that can exclude rows is present.
    pub fn is_filtered(&self) -> bool {
        self.where_.is_some() || self.conditions.iter().any(Condition::restricts)
    }

    /// Whether nothing has been accumulated since the last reset.
    pub fn is_empty(&self) -> bool {
        self.table.is_none()
            && self.joins.is_empty()
            && self.where_.is_none()
            && self.conditions.is_empty()
            && self.set_values.is_empty()
            && self.build_error.is_none()
    }

    pub fn find_join_mut(&mut self, table: &str, alias: Option<&str>) -> Option<&mut JoinSpec> {
        self.joins.iter_mut().find(|j| j.matches(table, alias))
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
