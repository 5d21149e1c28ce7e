//! Condition tree for WHERE filters.
//!
//! A statement has at most one primary [`WhereCondition`] plus an ordered list of
//! additional [`Condition`]s, each chained with `AND` or `OR`. Conditions are a
//! closed sum type; the compiler matches on them exhaustively.
//!
//! Comparison and mode keywords can be given as strings (`"="`, `"boolean"`,
//! `"first"`, ...) or as enums. Unknown keywords are compile errors.

use crate::error::{SqlError, SqlResult};
use crate::value::Operand;
use std::fmt;
use std::str::FromStr;

/// Logical connective between conditions or group members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Logical {
    #[default]
    And,
    Or,
}

impl Logical {
    pub fn as_sql(self) -> &'static str {
        match self {
            Logical::And => "AND",
            Logical::Or => "OR",
        }
    }
}

impl FromStr for Logical {
    type Err = SqlError;

    fn from_str(s: &str) -> SqlResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" | "&&" => Ok(Logical::And),
            "OR" | "||" => Ok(Logical::Or),
            other => Err(SqlError::compile(format!("unknown logical operator '{other}'"))),
        }
    }
}

/// Comparison operator of a column term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Eq,
    Ne,
    LtGt,
    Gt,
    Gte,
    Lt,
    Lte,
    NullSafeEq,
    Like,
    NotLike,
    Regexp,
    Is,
    IsNot,
}

impl Cmp {
    pub fn as_sql(self) -> &'static str {
        match self {
            Cmp::Eq => "=",
            Cmp::Ne => "!=",
            Cmp::LtGt => "<>",
            Cmp::Gt => ">",
            Cmp::Gte => ">=",
            Cmp::Lt => "<",
            Cmp::Lte => "<=",
            Cmp::NullSafeEq => "<=>",
            Cmp::Like => "LIKE",
            Cmp::NotLike => "NOT LIKE",
            Cmp::Regexp => "REGEXP",
            Cmp::Is => "IS",
            Cmp::IsNot => "IS NOT",
        }
    }
}

impl FromStr for Cmp {
    type Err = SqlError;

    fn from_str(s: &str) -> SqlResult<Self> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_uppercase();
        match normalized.as_str() {
            "=" | "==" => Ok(Cmp::Eq),
            "!=" => Ok(Cmp::Ne),
            "<>" => Ok(Cmp::LtGt),
            ">" => Ok(Cmp::Gt),
            ">=" => Ok(Cmp::Gte),
            "<" => Ok(Cmp::Lt),
            "<=" => Ok(Cmp::Lte),
            "<=>" => Ok(Cmp::NullSafeEq),
            "LIKE" => Ok(Cmp::Like),
            "NOT LIKE" => Ok(Cmp::NotLike),
            "REGEXP" | "RLIKE" => Ok(Cmp::Regexp),
            "IS" => Ok(Cmp::Is),
            "IS NOT" => Ok(Cmp::IsNot),
            _ => Err(SqlError::compile(format!("unknown comparison '{s}'"))),
        }
    }
}

impl fmt::Display for Cmp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Conversion into a keyword enum, accepting either the enum itself or its SQL spelling.
///
/// ```ignore
/// q.and("age", ">=", 18);
/// q.and("age", Cmp::Gte, 18);
/// ```
pub trait Keyword<T> {
    fn keyword(self) -> SqlResult<T>;
}

impl<T: FromStr<Err = SqlError>> Keyword<T> for &str {
    fn keyword(self) -> SqlResult<T> {
        self.parse()
    }
}

impl<T: FromStr<Err = SqlError>> Keyword<T> for String {
    fn keyword(self) -> SqlResult<T> {
        self.parse()
    }
}

macro_rules! impl_keyword {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Keyword<$ty> for $ty {
                fn keyword(self) -> SqlResult<$ty> {
                    Ok(self)
                }
            }
        )*
    };
}

impl_keyword!(Logical, Cmp, MatchMode, InSetMode);

/// Full-text search modifier for `MATCH ... AGAINST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    NaturalLanguage,
    NaturalLanguageExpansion,
    Boolean,
    QueryExpansion,
}

impl MatchMode {
    pub fn as_sql(self) -> &'static str {
        match self {
            MatchMode::NaturalLanguage => "IN NATURAL LANGUAGE MODE",
            MatchMode::NaturalLanguageExpansion => "IN NATURAL LANGUAGE MODE WITH QUERY EXPANSION",
            MatchMode::Boolean => "IN BOOLEAN MODE",
            MatchMode::QueryExpansion => "WITH QUERY EXPANSION",
        }
    }
}

impl FromStr for MatchMode {
    type Err = SqlError;

    fn from_str(s: &str) -> SqlResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "natural" | "natural language" => Ok(MatchMode::NaturalLanguage),
            "natural expansion" | "natural language expansion" => {
                Ok(MatchMode::NaturalLanguageExpansion)
            }
            "boolean" => Ok(MatchMode::Boolean),
            "expansion" | "query expansion" => Ok(MatchMode::QueryExpansion),
            other => Err(SqlError::compile(format!("unknown full-text mode '{other}'"))),
        }
    }
}

/// How a `FIND_IN_SET` result is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InSetMode {
    /// Search occurs anywhere in the list: `> 0`.
    Exists,
    /// Search is the first element: `= 1`.
    First,
    /// Search is the last element.
    Last,
    /// Projects the 1-based position as `inset_position` instead of filtering.
    Position,
    /// Plain substring containment on the list string.
    Contains,
    /// Search is absent: `= 0`.
    None,
}

impl FromStr for InSetMode {
    type Err = SqlError;

    fn from_str(s: &str) -> SqlResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exists" | ">" => Ok(InSetMode::Exists),
            "first" | "=" => Ok(InSetMode::First),
            "last" => Ok(InSetMode::Last),
            "position" => Ok(InSetMode::Position),
            "contains" => Ok(InSetMode::Contains),
            "none" => Ok(InSetMode::None),
            other => Err(SqlError::compile(format!("unknown FIND_IN_SET mode '{other}'"))),
        }
    }
}

/// One member of a conjoin/nested group: `column comparison value`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnTerm {
    pub column: String,
    pub cmp: Cmp,
    pub value: Operand,
}

impl ColumnTerm {
    /// Build a term from a comparison keyword. Unknown keywords are errors.
    pub fn new(
        column: impl Into<String>,
        cmp: impl Keyword<Cmp>,
        value: impl Into<Operand>,
    ) -> SqlResult<Self> {
        Ok(Self {
            column: column.into(),
            cmp: cmp.keyword()?,
            value: value.into(),
        })
    }
}

/// Shorthand for building a [`ColumnTerm`] inside `conjoin`/`nested` calls.
///
/// An unknown comparison is carried along and reported when the group is added.
pub fn col(
    column: impl Into<String>,
    cmp: impl Keyword<Cmp>,
    value: impl Into<Operand>,
) -> SqlResult<ColumnTerm> {
    ColumnTerm::new(column, cmp, value)
}

/// Anything usable as a group member: a [`ColumnTerm`] or the result of [`col`].
pub trait IntoTerm {
    fn into_term(self) -> SqlResult<ColumnTerm>;
}

impl IntoTerm for ColumnTerm {
    fn into_term(self) -> SqlResult<ColumnTerm> {
        Ok(self)
    }
}

impl IntoTerm for SqlResult<ColumnTerm> {
    fn into_term(self) -> SqlResult<ColumnTerm> {
        self
    }
}

/// A `FIND_IN_SET` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct InSet {
    pub search: String,
    pub list: String,
    pub search_is_column: bool,
    pub list_is_column: bool,
    pub mode: InSetMode,
}

impl InSet {
    /// `search` and `list` are string literals by default (escaped and quoted).
    pub fn new(search: impl Into<String>, list: impl Into<String>, mode: InSetMode) -> Self {
        Self {
            search: search.into(),
            list: list.into(),
            search_is_column: false,
            list_is_column: false,
            mode,
        }
    }

    /// Treat `list` as a column reference.
    pub fn list_column(mut self) -> Self {
        self.list_is_column = true;
        self
    }

    /// Treat `search` as a column reference.
    pub fn search_column(mut self) -> Self {
        self.search_is_column = true;
        self
    }
}

/// The primary `WHERE column comparison value` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereCondition {
    pub column: String,
    pub cmp: Cmp,
    pub value: Operand,
}

/// One additional filter term, chained onto the WHERE clause by `logical`.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column comparison value`
    Simple {
        column: String,
        cmp: Cmp,
        value: Operand,
        logical: Logical,
    },
    /// `column [NOT] IN (...)`
    In {
        column: String,
        values: Vec<Operand>,
        negate: bool,
        logical: Logical,
    },
    /// `MATCH(columns) AGAINST (term mode)`
    Against {
        columns: Vec<String>,
        mode: MatchMode,
        value: Operand,
        logical: Logical,
    },
    /// `FIND_IN_SET(search, list) ...`
    InSet { inset: InSet, logical: Logical },
    /// `(a = .. OR b = ..)`
    Conjoin {
        operator: Logical,
        members: Vec<ColumnTerm>,
        logical: Logical,
    },
    /// `((a OR b) AND (c OR d))`
    Nested {
        bind_operator: Logical,
        inner_operator: Logical,
        left: Vec<ColumnTerm>,
        right: Vec<ColumnTerm>,
        logical: Logical,
    },
}

impl Condition {
    /// The connective that chains this condition onto the previous one.
    pub fn logical(&self) -> Logical {
        match self {
            Condition::Simple { logical, .. }
            | Condition::In { logical, .. }
            | Condition::Against { logical, .. }
            | Condition::InSet { logical, .. }
            | Condition::Conjoin { logical, .. }
            | Condition::Nested { logical, .. } => *logical,
        }
    }

    /// Whether this condition contributes a boolean fragment to WHERE.
    ///
    /// `FIND_IN_SET` in position mode is a projection, not a filter.
    pub fn is_filter(&self) -> bool {
        !matches!(
            self,
            Condition::InSet {
                inset: InSet {
                    mode: InSetMode::Position,
                    ..
                },
                ..
            }
        )
    }

    /// Whether this filter can exclude rows. An empty `NOT IN` renders `1=1`.
    pub fn restricts(&self) -> bool {
        match self {
            Condition::In {
                values,
                negate: true,
                ..
            } => !values.is_empty(),
            other => other.is_filter(),
        }
    }
}
