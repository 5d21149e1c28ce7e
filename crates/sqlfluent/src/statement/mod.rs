//! Statement assembler.
//!
//! Each submodule turns a [`QueryState`] into one statement kind. The output is a
//! [`Compiled`] value: SQL text plus the ordered [`BindMap`], handed back to the
//! caller rather than kept anywhere shared.

pub mod delete;
pub mod insert;
pub mod join;
pub mod select;
pub mod state;
pub mod update;

pub use insert::{InsertPlan, InsertVerb, IntoRows};
pub use state::{
    CacheDirective, Direction, DupOp, DuplicateRule, HavingTerm, JoinKind, JoinOn, JoinSpec,
    MatchOrder, QueryState,
};

use crate::bind::BindMap;
use crate::error::SqlResult;
use std::fmt;

/// The kind of statement, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    /// SELECT query
    Select,
    /// INSERT statement
    Insert,
    /// REPLACE statement
    Replace,
    /// UPDATE statement
    Update,
    /// DELETE statement
    Delete,
    /// Other SQL (DDL, locks, ...)
    Other,
}

impl QueryType {
    /// Detect the statement kind from its leading keyword.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = sql.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
        let keyword: String = trimmed
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_uppercase();
        match keyword.as_str() {
            "SELECT" | "WITH" => QueryType::Select,
            "INSERT" => QueryType::Insert,
            "REPLACE" => QueryType::Replace,
            "UPDATE" => QueryType::Update,
            "DELETE" => QueryType::Delete,
            _ => QueryType::Other,
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryType::Select => write!(f, "SELECT"),
            QueryType::Insert => write!(f, "INSERT"),
            QueryType::Replace => write!(f, "REPLACE"),
            QueryType::Update => write!(f, "UPDATE"),
            QueryType::Delete => write!(f, "DELETE"),
            QueryType::Other => write!(f, "OTHER"),
        }
    }
}

/// A compiled statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub kind: QueryType,
    pub sql: String,
    pub binds: BindMap,
}

impl Compiled {
    pub fn new(sql: String, binds: BindMap) -> Self {
        Self {
            kind: QueryType::from_sql(&sql),
            sql,
            binds,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn binds(&self) -> &BindMap {
        &self.binds
    }
}

/// Aggregate reshaping of the select list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Total,
    Sum,
    Average,
}

impl Aggregate {
    pub fn function(self) -> &'static str {
        match self {
            Aggregate::Total | Aggregate::Sum => "SUM",
            Aggregate::Average => "AVG",
        }
    }

    /// The synthetic result column the aggregate is read from.
    pub fn column(self) -> &'static str {
        match self {
            Aggregate::Total => "aggregate_total",
            Aggregate::Sum => "aggregate_sum",
            Aggregate::Average => "aggregate_avg",
        }
    }
}

/// Synthetic column of `count()`.
pub const COUNT_COLUMN: &str = "aggregate_count";
/// Synthetic column of `exists()`.
pub const EXISTS_COLUMN: &str = "row_exists";
/// Projected column of a position-mode `FIND_IN_SET`.
pub const POSITION_COLUMN: &str = "inset_position";

/// What a compile pass should produce from the accumulated state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Select,
    Find,
    Count,
    Aggregate(Aggregate, String),
    Exists,
    Update,
    Delete,
}

/// Compile `state` for `op`. `strict` guards unfiltered UPDATE/DELETE.
///
/// The state is only read, so compiling twice yields identical output.
pub fn compile(state: &QueryState, op: &Operation, strict: bool) -> SqlResult<Compiled> {
    state.check()?;
    match op {
        Operation::Update => update::compile(state, strict),
        Operation::Delete => delete::compile(state, strict),
        read => select::compile(state, read),
    }
}

/// Fail with a configuration error when a destructive statement has no filter.
pub(crate) fn require_filter(state: &QueryState, strict: bool, verb: &str) -> SqlResult<()> {
    if strict && !state.is_filtered() {
        return Err(crate::error::SqlError::config(format!(
            "{verb} without a WHERE condition is refused in strict mode"
        )));
    }
    Ok(())
}
