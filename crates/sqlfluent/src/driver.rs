//! Database driver contract.
//!
//! The builder never talks to a database itself. It hands compiled SQL and its
//! bind map to a [`Driver`] and reads results back through a [`Statement`].
//! Calls are synchronous; timeouts and cancellation belong to the driver.

use crate::error::{SqlError, SqlResult};
use crate::row::Row;
use crate::value::Value;
use std::fmt;

/// Error details reported by a driver for the last operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    /// SQLSTATE or driver-specific code
    pub code: String,
    pub message: String,
}

impl DriverError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<DriverError> for SqlError {
    fn from(err: DriverError) -> Self {
        SqlError::Execution {
            code: err.code,
            message: err.message,
        }
    }
}

/// A prepared (or directly executed) statement handle.
pub trait Statement {
    /// Bind `value` to the named placeholder (marker included, e.g. `:status`).
    fn bind(&mut self, name: &str, value: &Value);

    /// Execute with the current binds. `false` means the driver reported failure.
    fn execute(&mut self) -> bool;

    /// Status of the last execution.
    fn ok(&self) -> bool;

    /// Rows affected (writes) or returned (reads) by the last execution.
    fn row_count(&self) -> u64;

    fn fetch_all(&mut self) -> SqlResult<Vec<Row>>;

    fn fetch_next(&mut self) -> SqlResult<Option<Row>>;

    /// Error of the last execution, if any.
    fn errors(&self) -> Option<DriverError>;
}

/// A database connection.
pub trait Driver {
    type Statement: Statement;

    /// Driver name used to pick a [`crate::Dialect`] (`mysql`, `pgsql`, `sqlite`, ...).
    fn driver_name(&self) -> &str;

    fn prepare(&mut self, sql: &str) -> SqlResult<Self::Statement>;

    /// Run SQL that takes no binds and return its handle.
    fn query(&mut self, sql: &str) -> SqlResult<Self::Statement>;

    fn last_insert_id(&self) -> Option<String>;

    fn begin_transaction(&mut self) -> SqlResult<()>;

    fn commit(&mut self) -> SqlResult<()>;

    fn rollback(&mut self) -> SqlResult<()>;
}

impl<D: Driver + ?Sized> Driver for &mut D {
    type Statement = D::Statement;

    fn driver_name(&self) -> &str {
        (**self).driver_name()
    }

    fn prepare(&mut self, sql: &str) -> SqlResult<Self::Statement> {
        (**self).prepare(sql)
    }

    fn query(&mut self, sql: &str) -> SqlResult<Self::Statement> {
        (**self).query(sql)
    }

    fn last_insert_id(&self) -> Option<String> {
        (**self).last_insert_id()
    }

    fn begin_transaction(&mut self) -> SqlResult<()> {
        (**self).begin_transaction()
    }

    fn commit(&mut self) -> SqlResult<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> SqlResult<()> {
        (**self).rollback()
    }
}

/// The execution error for a failed statement, falling back to a generic code.
pub(crate) fn failure<S: Statement>(stmt: &S, sql: &str) -> SqlError {
    match stmt.errors() {
        Some(err) => err.into(),
        None => SqlError::execution("HY000", format!("statement failed: {sql}")),
    }
}
