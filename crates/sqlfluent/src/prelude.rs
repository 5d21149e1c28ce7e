//! Convenient imports for typical `sqlfluent` usage.
//!
//! ```ignore
//! use sqlfluent::prelude::*;
//! ```

pub use crate::{
    Builder, BuilderConfig, Cmp, Direction, Fetched, Fluent, InSet, InSetMode, Logical, MatchMode,
    Operation, Query, ResultShape, Row, SqlError, SqlResult, Value, ValueMap, col, raw,
};
