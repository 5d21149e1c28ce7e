//! `tracing` events for statement dispatch and the cache gate.
//!
//! Targets: `sqlfluent.sql` for statements, `sqlfluent.cache` for cache lookups.

use crate::statement::QueryType;

/// Truncate to at most `max_bytes`, backing off to a char boundary.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

pub(crate) fn truncate_sql(sql: &str, max: Option<usize>) -> String {
    match max {
        Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
        _ => sql.to_string(),
    }
}

/// Statement about to reach the driver.
pub(crate) fn statement(kind: QueryType, sql: &str, param_count: usize, max: Option<usize>) {
    tracing::debug!(
        target: "sqlfluent.sql",
        query_type = %kind,
        param_count,
        sql = %truncate_sql(sql, max),
        "dispatch"
    );
}

/// Driver-reported failure.
pub(crate) fn failed(kind: QueryType, sql: &str, error: &dyn std::fmt::Display, max: Option<usize>) {
    tracing::error!(
        target: "sqlfluent.sql",
        query_type = %kind,
        sql = %truncate_sql(sql, max),
        error = %error,
        "statement failed"
    );
}

/// One row of a prepared multi-row insert failed; the loop continues.
pub(crate) fn row_failed(row: usize, error: &dyn std::fmt::Display) {
    tracing::warn!(
        target: "sqlfluent.sql",
        row,
        error = %error,
        "insert row failed"
    );
}

pub(crate) fn explain(table: &dyn std::fmt::Display) {
    tracing::debug!(target: "sqlfluent.sql", "explain\n{table}");
}

pub(crate) fn cache_hit(key: &str) {
    tracing::debug!(target: "sqlfluent.cache", key, "cache hit");
}

pub(crate) fn cache_miss(key: &str, expired: bool) {
    tracing::debug!(target: "sqlfluent.cache", key, expired, "cache miss");
}
