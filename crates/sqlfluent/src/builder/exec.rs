//! Terminal operations.

use super::{Builder, Phase};
use crate::bind::BindMap;
use crate::cache::{CacheGate, CacheStore, cache_key};
use crate::config::ResultShape;
use crate::dialect::TABLE_COUNT_COLUMN;
use crate::driver::{self, Driver, Statement};
use crate::error::{SqlError, SqlResult};
use crate::explain::{self, Explain};
use crate::fluent::Fluent;
use crate::ident;
use crate::log;
use crate::row::Row;
use crate::statement::{
    self, Aggregate, COUNT_COLUMN, Compiled, EXISTS_COLUMN, InsertVerb, IntoRows, Operation,
    QueryType, insert,
};
use crate::value::{Value, ValueMap};
use serde::de::DeserializeOwned;

/// Rows of a read, in the configured [`ResultShape`].
#[derive(Debug)]
pub enum Fetched<S> {
    Rows(Vec<Row>),
    Objects(Vec<serde_json::Map<String, serde_json::Value>>),
    /// The executed driver statement, unread.
    Statement(S),
    /// Debug mode: the statement that would have run.
    Explain(Explain),
}

impl<S> Fetched<S> {
    /// The rows, unless the statement shape was requested.
    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            Fetched::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn into_objects(self) -> Option<Vec<serde_json::Map<String, serde_json::Value>>> {
        match self {
            Fetched::Objects(objects) => Some(objects),
            _ => None,
        }
    }

    pub fn into_statement(self) -> Option<S> {
        match self {
            Fetched::Statement(stmt) => Some(stmt),
            _ => None,
        }
    }

    pub fn into_explain(self) -> Option<Explain> {
        match self {
            Fetched::Explain(explain) => Some(explain),
            _ => None,
        }
    }
}

fn raw_binds<I, K, V>(binds: I) -> BindMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    binds
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

impl<D: Driver, C: CacheStore> Builder<D, C> {
    // ==================== Dispatch ====================

    fn record(&mut self, explain: Explain) {
        log::explain(&explain);
        self.explained.push(explain);
    }

    /// In debug mode, record `compiled` and report that it must not run.
    fn dry_run(&mut self, compiled: &Compiled) -> bool {
        if !self.config.debug {
            return false;
        }
        self.record(Explain::new(compiled));
        true
    }

    /// Prepare, bind and execute. The returned handle is the only result record.
    fn dispatch(&mut self, compiled: &Compiled) -> SqlResult<D::Statement> {
        let max = self.config.max_sql_log_length;
        log::statement(compiled.kind, &compiled.sql, compiled.binds.len(), max);

        let mut stmt = self.driver.prepare(&compiled.sql)?;
        for (name, value) in compiled.binds.iter() {
            stmt.bind(name, value);
        }
        if !stmt.execute() {
            let err = driver::failure(&stmt, &compiled.sql);
            log::failed(compiled.kind, &compiled.sql, &err, max);
            return Err(err);
        }
        self.phase = Phase::Executed;
        Ok(stmt)
    }

    /// Run SQL without binds through `Driver::query`.
    fn dispatch_plain(&mut self, sql: &str) -> SqlResult<Option<D::Statement>> {
        if self.dry_run(&Compiled::new(sql.to_string(), BindMap::new())) {
            return Ok(None);
        }
        let kind = QueryType::from_sql(sql);
        let max = self.config.max_sql_log_length;
        log::statement(kind, sql, 0, max);
        let stmt = self.driver.query(sql)?;
        if !stmt.ok() {
            let err = driver::failure(&stmt, sql);
            log::failed(kind, sql, &err, max);
            return Err(err);
        }
        self.phase = Phase::Executed;
        Ok(Some(stmt))
    }

    /// Read rows without the cache gate.
    fn read_raw(&mut self, compiled: &Compiled) -> SqlResult<Vec<Row>> {
        if self.dry_run(compiled) {
            return Ok(Vec::new());
        }
        self.dispatch(compiled)?.fetch_all()
    }

    /// Read rows, through the cache gate when `cache()` was requested.
    fn read_rows(&mut self, compiled: &Compiled) -> SqlResult<Vec<Row>> {
        if self.dry_run(compiled) {
            return Ok(Vec::new());
        }
        let Some(directive) = self.state.cache.clone() else {
            return self.read_raw(compiled);
        };
        let prefix = &self.config.cache_prefix;
        let key = match &directive.key {
            Some(key) => format!("{prefix}:{key}"),
            None => cache_key(prefix, compiled)?,
        };

        if let Some(rows) = CacheGate::new(&self.cache).lookup(&key) {
            self.phase = Phase::Cached;
            return Ok(rows);
        }
        let rows = self.dispatch(compiled)?.fetch_all()?;
        let ttl = directive.ttl.or(self.config.cache_ttl);
        CacheGate::new(&self.cache).store(&key, &rows, ttl)?;
        Ok(rows)
    }

    fn compile_current(&self, op: &Operation) -> SqlResult<Compiled> {
        statement::compile(&self.state, op, self.config.strict)
    }

    fn read_first(&mut self, op: &Operation) -> SqlResult<Option<Row>> {
        let compiled = self.compile_current(op)?;
        Ok(self.read_rows(&compiled)?.into_iter().next())
    }

    // ==================== Reads ====================

    /// Run the SELECT and return rows in the configured shape.
    pub fn select(&mut self) -> SqlResult<Fetched<D::Statement>> {
        self.terminal(|b| {
            let compiled = b.compile_current(&Operation::Select)?;
            if b.config.debug {
                let explain = Explain::new(&compiled);
                b.record(explain.clone());
                return Ok(Fetched::Explain(explain));
            }
            match b.config.shape {
                ResultShape::Statement => Ok(Fetched::Statement(b.dispatch(&compiled)?)),
                ResultShape::Array => Ok(Fetched::Rows(b.read_rows(&compiled)?)),
                ResultShape::Object => Ok(Fetched::Objects(
                    b.read_rows(&compiled)?.iter().map(Row::to_json).collect(),
                )),
            }
        })
    }

    /// Run the SELECT and map every row onto `T`.
    pub fn select_as<T: DeserializeOwned>(&mut self) -> SqlResult<Vec<T>> {
        self.terminal(|b| {
            let compiled = b.compile_current(&Operation::Select)?;
            b.read_rows(&compiled)?
                .iter()
                .map(|row| row.deserialize::<T>())
                .collect()
        })
    }

    /// First matching row (`LIMIT 1`).
    pub fn find(&mut self) -> SqlResult<Option<Row>> {
        self.terminal(|b| b.read_first(&Operation::Find))
    }

    pub fn find_as<T: DeserializeOwned>(&mut self) -> SqlResult<Option<T>> {
        self.find()?.map(|row| row.deserialize()).transpose()
    }

    /// Execute the SELECT and read only its first row from the driver.
    pub fn fetch(&mut self) -> SqlResult<Option<Row>> {
        self.terminal(|b| {
            let compiled = b.compile_current(&Operation::Select)?;
            if b.dry_run(&compiled) {
                return Ok(None);
            }
            b.dispatch(&compiled)?.fetch_next()
        })
    }

    /// Execute the SELECT and hand back the driver statement.
    pub fn stmt(&mut self) -> SqlResult<D::Statement> {
        self.terminal(|b| {
            let compiled = b.compile_current(&Operation::Select)?;
            if b.dry_run(&compiled) {
                return Err(SqlError::config(
                    "stmt() has no driver handle in debug mode; use select()",
                ));
            }
            b.dispatch(&compiled)
        })
    }

    pub fn count(&mut self) -> SqlResult<u64> {
        self.terminal(|b| match b.read_first(&Operation::Count)? {
            Some(row) => {
                let n = row.get_i64(COUNT_COLUMN)?;
                u64::try_from(n).map_err(|_| SqlError::decode(COUNT_COLUMN, "negative count"))
            }
            None => Ok(0),
        })
    }

    fn aggregate(&mut self, agg: Aggregate, column: &str) -> SqlResult<Option<f64>> {
        self.terminal(|b| {
            let op = Operation::Aggregate(agg, column.to_string());
            let Some(row) = b.read_first(&op)? else {
                return Ok(None);
            };
            if row.try_get(agg.column())?.is_null() {
                return Ok(None);
            }
            row.get_f64(agg.column()).map(Some)
        })
    }

    /// `SUM(column)`, zero when nothing matched.
    pub fn total(&mut self, column: &str) -> SqlResult<f64> {
        Ok(self.aggregate(Aggregate::Total, column)?.unwrap_or(0.0))
    }

    /// `SUM(column)`, `None` when nothing matched.
    pub fn sum(&mut self, column: &str) -> SqlResult<Option<f64>> {
        self.aggregate(Aggregate::Sum, column)
    }

    /// `AVG(column)`, `None` when nothing matched.
    pub fn average(&mut self, column: &str) -> SqlResult<Option<f64>> {
        self.aggregate(Aggregate::Average, column)
    }

    pub fn exists(&mut self) -> SqlResult<bool> {
        self.terminal(|b| {
            Ok(b.read_first(&Operation::Exists)?
                .is_some_and(|row| row.get(EXISTS_COLUMN).is_some()))
        })
    }

    /// The SELECT as standalone SQL with values inlined, for splicing elsewhere.
    pub fn copy(&mut self) -> SqlResult<String> {
        self.terminal(|b| {
            let compiled = b.compile_current(&Operation::Select)?;
            Ok(explain::inline(&compiled))
        })
    }

    /// `INSERT INTO target (columns) SELECT ...` built from the current state.
    pub fn copy_into(&mut self, target: &str, columns: &[&str]) -> SqlResult<String> {
        self.terminal(|b| {
            let target = ident::table_name(target)?;
            let compiled = b.compile_current(&Operation::Select)?;
            let select = explain::inline(&compiled);
            if columns.is_empty() {
                Ok(format!("INSERT INTO {target} {select}"))
            } else {
                Ok(format!(
                    "INSERT INTO {target} ({}) {select}",
                    columns.join(", ")
                ))
            }
        })
    }

    /// Compile `op` for inspection; nothing is executed.
    pub fn explain(&mut self, op: Operation) -> SqlResult<Explain> {
        self.terminal(|b| Ok(Explain::new(&b.compile_current(&op)?)))
    }

    /// The INSERT for `rows` in the configured strategy, one entry per executed statement.
    pub fn explain_insert(&mut self, rows: impl IntoRows) -> SqlResult<Vec<Explain>> {
        self.terminal(|b| b.insert_explains(InsertVerb::Insert, &rows.into_rows()?))
    }

    pub fn explain_replace(&mut self, rows: impl IntoRows) -> SqlResult<Vec<Explain>> {
        self.terminal(|b| b.insert_explains(InsertVerb::Replace, &rows.into_rows()?))
    }

    fn insert_explains(&self, verb: InsertVerb, rows: &[ValueMap]) -> SqlResult<Vec<Explain>> {
        if !self.state.prepared.unwrap_or(self.config.prepare_inserts) {
            return Ok(vec![Explain::new(&insert::direct(&self.state, verb, rows)?)]);
        }
        let plan = insert::prepared(&self.state, verb, rows)?;
        Ok(plan
            .rows
            .into_iter()
            .map(|binds| Explain::new(&Compiled::new(plan.statement.sql.clone(), binds)))
            .collect())
    }

    // ==================== Writes ====================

    /// Insert rows; returns the number of rows the driver reported as inserted.
    ///
    /// Prepared mode runs the template once per row and counts successful
    /// executions; failing rows are logged and skipped. Direct mode runs a single
    /// statement and fails on driver error.
    pub fn insert(&mut self, rows: impl IntoRows) -> SqlResult<u64> {
        self.write_rows(InsertVerb::Insert, rows)
    }

    pub fn replace(&mut self, rows: impl IntoRows) -> SqlResult<u64> {
        self.write_rows(InsertVerb::Replace, rows)
    }

    fn write_rows(&mut self, verb: InsertVerb, rows: impl IntoRows) -> SqlResult<u64> {
        self.terminal(|b| {
            b.state.check()?;
            let rows = rows.into_rows()?;
            if b.config.debug {
                for explain in b.insert_explains(verb, &rows)? {
                    b.record(explain);
                }
                return Ok(0);
            }
            let prepared = b.state.prepared.unwrap_or(b.config.prepare_inserts);
            if !prepared {
                let compiled = insert::direct(&b.state, verb, &rows)?;
                return Ok(b.dispatch(&compiled)?.row_count());
            }

            let plan = insert::prepared(&b.state, verb, &rows)?;
            let max = b.config.max_sql_log_length;
            log::statement(plan.statement.kind, &plan.statement.sql, plan.statement.binds.len(), max);

            let mut stmt = b.driver.prepare(&plan.statement.sql)?;
            let mut inserted = 0;
            for (i, binds) in plan.rows.iter().enumerate() {
                for (name, value) in binds.iter() {
                    stmt.bind(name, value);
                }
                if stmt.execute() {
                    inserted += 1;
                } else {
                    log::row_failed(i, &driver::failure(&stmt, &plan.statement.sql));
                }
            }
            b.phase = Phase::Executed;
            Ok(inserted)
        })
    }

    /// Run the UPDATE; returns affected rows.
    pub fn update(&mut self) -> SqlResult<u64> {
        self.terminal(|b| {
            let compiled = b.compile_current(&Operation::Update)?;
            if b.dry_run(&compiled) {
                return Ok(0);
            }
            Ok(b.dispatch(&compiled)?.row_count())
        })
    }

    /// Run the DELETE; returns affected rows.
    pub fn delete(&mut self) -> SqlResult<u64> {
        self.terminal(|b| {
            let compiled = b.compile_current(&Operation::Delete)?;
            if b.dry_run(&compiled) {
                return Ok(0);
            }
            Ok(b.dispatch(&compiled)?.row_count())
        })
    }

    /// Last auto-increment id reported by the driver.
    pub fn last_insert_id(&self) -> Option<String> {
        self.driver.last_insert_id()
    }

    // ==================== Raw SQL ====================

    /// Run arbitrary SQL with named binds and read all rows.
    pub fn query_raw<I, K, V>(&mut self, sql: &str, binds: I) -> SqlResult<Vec<Row>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let compiled = Compiled::new(sql.to_string(), raw_binds(binds));
        self.terminal(|b| b.read_raw(&compiled))
    }

    /// Run arbitrary SQL with named binds; returns affected rows.
    pub fn execute_raw<I, K, V>(&mut self, sql: &str, binds: I) -> SqlResult<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let compiled = Compiled::new(sql.to_string(), raw_binds(binds));
        self.terminal(|b| {
            if b.dry_run(&compiled) {
                return Ok(0);
            }
            Ok(b.dispatch(&compiled)?.row_count())
        })
    }

    // ==================== Dialect-specific ====================

    /// Lock `tables` for writing.
    pub fn lock(&mut self, tables: &[&str]) -> SqlResult<()> {
        self.terminal(|b| {
            let tables = tables
                .iter()
                .map(|t| ident::table_name(t))
                .collect::<SqlResult<Vec<_>>>()?;
            let sql = b.dialect()?.locks().lock_tables(&tables)?;
            b.dispatch_plain(&sql).map(drop)
        })
    }

    pub fn unlock(&mut self) -> SqlResult<()> {
        self.terminal(|b| {
            let sql = b.dialect()?.locks().unlock_tables()?;
            b.dispatch_plain(&sql).map(drop)
        })
    }

    /// Empty the current table.
    pub fn truncate(&mut self) -> SqlResult<()> {
        self.terminal(|b| {
            b.state.check()?;
            let table = b.state.table()?.to_string();
            let sql = b.dialect()?.tables().truncate(&table)?;
            b.dispatch_plain(&sql).map(drop)
        })
    }

    pub fn table_exists(&mut self, table: &str) -> SqlResult<bool> {
        self.terminal(|b| {
            let table = ident::table_name(table)?;
            let compiled = b.dialect()?.tables().table_exists(&table);
            let rows = b.read_raw(&compiled)?;
            match rows.first() {
                Some(row) => Ok(row.get_i64(TABLE_COUNT_COLUMN)? > 0),
                None => Ok(false),
            }
        })
    }

    pub fn drop_table(&mut self, table: &str, if_exists: bool) -> SqlResult<()> {
        self.terminal(|b| {
            let table = ident::table_name(table)?;
            let sql = b.dialect()?.tables().drop_table(&table, if_exists)?;
            b.dispatch_plain(&sql).map(drop)
        })
    }

    // ==================== Transactions ====================

    pub fn begin(&mut self) -> SqlResult<()> {
        self.driver.begin_transaction()
    }

    pub fn commit(&mut self) -> SqlResult<()> {
        self.driver.commit()
    }

    pub fn rollback(&mut self) -> SqlResult<()> {
        self.driver.rollback()
    }

    /// Run `body` in a transaction: commit on `Ok`, roll back on `Err`.
    ///
    /// A failed rollback is folded into the returned error.
    pub fn transaction<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> SqlResult<T>,
    ) -> SqlResult<T> {
        self.begin()?;
        match body(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(error) => {
                self.reset();
                match self.rollback() {
                    Ok(()) => Err(error),
                    Err(rollback_err) => Err(SqlError::Other(format!(
                        "{error} (rollback failed: {rollback_err})"
                    ))),
                }
            }
        }
    }
}
