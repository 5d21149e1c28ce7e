//! # sqlfluent
//!
//! A fluent SQL statement builder with named placeholders.
//!
//! ## Features
//!
//! - **Fluent state**: chain table, join, filter, ordering and mutation intent, then
//!   run one terminal call; the builder resets itself afterwards
//! - **Collision-free binds**: every bound value gets a named placeholder derived
//!   from its column and structural position (`:status`, `:a_0_1`, `:id_in_2`, ...)
//! - **Raw passthrough**: [`raw`] fragments are emitted verbatim and never bound
//! - **Safe defaults**: strict mode refuses UPDATE/DELETE without a WHERE condition
//! - **Multi-row inserts**: prepared per-row execution or one inlined statement,
//!   with `ON DUPLICATE KEY UPDATE` rules (`=`, `+=`, `-=`)
//! - **Read cache**: memoize SELECT results through any [`CacheStore`]
//!
//! ## Compiling without a driver
//!
//! ```ignore
//! use sqlfluent::prelude::*;
//!
//! let mut q = Query::new();
//! q.table("users")
//!     .where_("status", "=", "active")
//!     .and("role", "=", "admin");
//! let compiled = q.compile(&Operation::Select)?;
//! assert_eq!(
//!     compiled.sql,
//!     "SELECT * FROM users WHERE status = :status AND role = :role"
//! );
//! ```
//!
//! ## Executing
//!
//! ```ignore
//! let mut db = Builder::new(driver);
//! let n = db
//!     .table("users")
//!     .prepared(true)
//!     .insert(vec![ValueMap::new().set("id", 1).set("name", "A")])?;
//!
//! let active = db.table("users").where_("status", "=", "active").count()?;
//! ```

pub mod bind;
pub mod builder;
pub mod cache;
pub mod compile;
pub mod condition;
pub mod config;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod explain;
pub mod fluent;
pub mod ident;
mod log;
pub mod placeholder;
pub mod prelude;
pub mod quote;
pub mod row;
pub mod statement;
pub mod value;

pub use bind::BindMap;
pub use builder::{Builder, Fetched, Phase};
pub use cache::{CacheGate, CacheStore, MemoryCache, NoCache};
pub use condition::{
    Cmp, ColumnTerm, Condition, InSet, InSetMode, IntoTerm, Keyword, Logical, MatchMode,
    WhereCondition, col,
};
pub use config::{BuilderConfig, ResultShape};
pub use dialect::{Dialect, LockOps, TableOps};
pub use driver::{Driver, DriverError, Statement};
pub use error::{SqlError, SqlResult};
pub use explain::Explain;
pub use fluent::{Fluent, Query};
pub use ident::Ident;
pub use row::Row;
pub use statement::{
    Aggregate, Compiled, Direction, DupOp, InsertPlan, InsertVerb, IntoRows, JoinKind, Operation,
    QueryState, QueryType,
};
pub use value::{Operand, Raw, Value, ValueMap, raw};
