//! Driver-specific statements: table locks, truncation, existence checks and drops.
//!
//! Everything else the builder emits is dialect-agnostic. Each dialect is a
//! zero-sized type implementing [`LockOps`] and [`TableOps`]; [`Dialect`] picks one
//! from the driver name. Unsupported combinations are configuration errors.

use crate::bind::BindMap;
use crate::error::{SqlError, SqlResult};
use crate::statement::Compiled;
use crate::value::Value;

/// Synthetic column of the existence check.
pub const TABLE_COUNT_COLUMN: &str = "table_count";

/// Table locking.
pub trait LockOps {
    /// SQL locking `tables` for writing.
    fn lock_tables(&self, tables: &[String]) -> SqlResult<String>;

    /// SQL releasing all table locks.
    fn unlock_tables(&self) -> SqlResult<String>;
}

/// Table maintenance.
pub trait TableOps {
    fn truncate(&self, table: &str) -> SqlResult<String>;

    /// A COUNT query reading [`TABLE_COUNT_COLUMN`]; non-zero means the table exists.
    fn table_exists(&self, table: &str) -> Compiled;

    fn drop_table(&self, table: &str, if_exists: bool) -> SqlResult<String>;
}

fn count_query(sql: &str, table: &str) -> Compiled {
    let mut binds = BindMap::new();
    binds.push(":table_name".to_string(), Value::from(table));
    Compiled::new(sql.to_string(), binds)
}

fn unsupported(dialect: &str, operation: &str) -> SqlError {
    SqlError::config(format!("{operation} is not supported by the {dialect} driver"))
}

fn require_tables(tables: &[String]) -> SqlResult<()> {
    if tables.is_empty() {
        return Err(SqlError::config("LOCK requires at least one table"));
    }
    Ok(())
}

fn drop_sql(table: &str, if_exists: bool) -> String {
    if if_exists {
        format!("DROP TABLE IF EXISTS {table}")
    } else {
        format!("DROP TABLE {table}")
    }
}

/// MySQL / MariaDB.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl LockOps for MySql {
    fn lock_tables(&self, tables: &[String]) -> SqlResult<String> {
        require_tables(tables)?;
        let list: Vec<String> = tables.iter().map(|t| format!("{t} WRITE")).collect();
        Ok(format!("LOCK TABLES {}", list.join(", ")))
    }

    fn unlock_tables(&self) -> SqlResult<String> {
        Ok("UNLOCK TABLES".to_string())
    }
}

impl TableOps for MySql {
    fn truncate(&self, table: &str) -> SqlResult<String> {
        Ok(format!("TRUNCATE TABLE {table}"))
    }

    fn table_exists(&self, table: &str) -> Compiled {
        count_query(
            "SELECT COUNT(*) AS table_count FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_name = :table_name",
            table,
        )
    }

    fn drop_table(&self, table: &str, if_exists: bool) -> SqlResult<String> {
        Ok(drop_sql(table, if_exists))
    }
}

/// PostgreSQL. Locks are released by COMMIT/ROLLBACK.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl LockOps for Postgres {
    fn lock_tables(&self, tables: &[String]) -> SqlResult<String> {
        require_tables(tables)?;
        Ok(format!(
            "LOCK TABLE {} IN ACCESS EXCLUSIVE MODE",
            tables.join(", ")
        ))
    }

    fn unlock_tables(&self) -> SqlResult<String> {
        Err(SqlError::config(
            "postgres has no explicit unlock; locks are released at commit or rollback",
        ))
    }
}

impl TableOps for Postgres {
    fn truncate(&self, table: &str) -> SqlResult<String> {
        Ok(format!("TRUNCATE TABLE {table}"))
    }

    fn table_exists(&self, table: &str) -> Compiled {
        count_query(
            "SELECT COUNT(*) AS table_count FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = :table_name",
            table,
        )
    }

    fn drop_table(&self, table: &str, if_exists: bool) -> SqlResult<String> {
        Ok(drop_sql(table, if_exists))
    }
}

/// SQLite.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl LockOps for Sqlite {
    fn lock_tables(&self, _tables: &[String]) -> SqlResult<String> {
        Err(unsupported("sqlite", "LOCK TABLES"))
    }

    fn unlock_tables(&self) -> SqlResult<String> {
        Err(unsupported("sqlite", "UNLOCK TABLES"))
    }
}

impl TableOps for Sqlite {
    fn truncate(&self, table: &str) -> SqlResult<String> {
        // No TRUNCATE; an unfiltered DELETE takes the truncate fast path.
        Ok(format!("DELETE FROM {table}"))
    }

    fn table_exists(&self, table: &str) -> Compiled {
        count_query(
            "SELECT COUNT(*) AS table_count FROM sqlite_master \
             WHERE type = 'table' AND name = :table_name",
            table,
        )
    }

    fn drop_table(&self, table: &str, if_exists: bool) -> SqlResult<String> {
        Ok(drop_sql(table, if_exists))
    }
}

/// Microsoft SQL Server.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServer;

impl LockOps for SqlServer {
    fn lock_tables(&self, _tables: &[String]) -> SqlResult<String> {
        Err(unsupported("sqlsrv", "LOCK TABLES"))
    }

    fn unlock_tables(&self) -> SqlResult<String> {
        Err(unsupported("sqlsrv", "UNLOCK TABLES"))
    }
}

impl TableOps for SqlServer {
    fn truncate(&self, table: &str) -> SqlResult<String> {
        Ok(format!("TRUNCATE TABLE {table}"))
    }

    fn table_exists(&self, table: &str) -> Compiled {
        count_query(
            "SELECT COUNT(*) AS table_count FROM INFORMATION_SCHEMA.TABLES \
             WHERE TABLE_NAME = :table_name",
            table,
        )
    }

    fn drop_table(&self, table: &str, if_exists: bool) -> SqlResult<String> {
        Ok(drop_sql(table, if_exists))
    }
}

/// Oracle.
#[derive(Debug, Clone, Copy, Default)]
pub struct Oracle;

impl LockOps for Oracle {
    fn lock_tables(&self, tables: &[String]) -> SqlResult<String> {
        require_tables(tables)?;
        Ok(format!("LOCK TABLE {} IN EXCLUSIVE MODE", tables.join(", ")))
    }

    fn unlock_tables(&self) -> SqlResult<String> {
        Err(SqlError::config(
            "oracle has no explicit unlock; locks are released at commit or rollback",
        ))
    }
}

impl TableOps for Oracle {
    fn truncate(&self, table: &str) -> SqlResult<String> {
        Ok(format!("TRUNCATE TABLE {table}"))
    }

    fn table_exists(&self, table: &str) -> Compiled {
        count_query(
            "SELECT COUNT(*) AS table_count FROM user_tables \
             WHERE table_name = UPPER(:table_name)",
            table,
        )
    }

    fn drop_table(&self, table: &str, if_exists: bool) -> SqlResult<String> {
        if if_exists {
            return Err(unsupported("oracle", "DROP TABLE IF EXISTS"));
        }
        Ok(drop_sql(table, false))
    }
}

/// The dialect of a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    MySql,
    Postgres,
    Sqlite,
    SqlServer,
    Oracle,
}

impl Dialect {
    /// Map a driver name to its dialect.
    pub fn from_driver_name(name: &str) -> SqlResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "pgsql" | "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "sqlsrv" | "mssql" | "dblib" => Ok(Dialect::SqlServer),
            "oci" | "oracle" => Ok(Dialect::Oracle),
            other => Err(SqlError::config(format!("unknown driver '{other}'"))),
        }
    }

    pub fn locks(self) -> &'static dyn LockOps {
        match self {
            Dialect::MySql => &MySql,
            Dialect::Postgres => &Postgres,
            Dialect::Sqlite => &Sqlite,
            Dialect::SqlServer => &SqlServer,
            Dialect::Oracle => &Oracle,
        }
    }

    pub fn tables(self) -> &'static dyn TableOps {
        match self {
            Dialect::MySql => &MySql,
            Dialect::Postgres => &Postgres,
            Dialect::Sqlite => &Sqlite,
            Dialect::SqlServer => &SqlServer,
            Dialect::Oracle => &Oracle,
        }
    }
}
