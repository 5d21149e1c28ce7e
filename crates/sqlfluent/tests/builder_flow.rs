//! End-to-end builder flows against a recording driver.

mod common;

use common::RecordingDriver;
use serde::Deserialize;
use serde_json::json;
use sqlfluent::prelude::*;
use sqlfluent::{CacheStore, DupOp, MemoryCache, Operand, Phase};
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("sqlfluent=debug"))
        .with_test_writer()
        .try_init();
}

fn mysql() -> (Builder<RecordingDriver>, common::Recorder) {
    init_tracing();
    let (driver, recorder) = RecordingDriver::new("mysql");
    (Builder::new(driver), recorder)
}

#[test]
fn where_chain_binds_in_text_order() {
    let (mut db, rec) = mysql();
    rec.returns(vec![Row::new().with("id", 1)]);

    let rows = db
        .table("users")
        .where_("status", "=", "active")
        .and("role", "=", "admin")
        .select()
        .unwrap()
        .into_rows()
        .unwrap();
    assert_eq!(rows.len(), 1);

    let last = rec.last();
    assert_eq!(
        last.sql,
        "SELECT * FROM users WHERE status = :status AND role = :role"
    );
    assert_eq!(
        last.binds,
        vec![
            (":status".to_string(), Value::from("active")),
            (":role".to_string(), Value::from("admin")),
        ]
    );
}

#[test]
fn grouped_or_and_raw_list_entries() {
    let (mut db, rec) = mysql();
    db.table("users")
        .conjoin([col("a", "=", 1), col("b", "=", 2)], "OR")
        .where_in("status", [Operand::from(raw("NOW()")), Operand::from("x")])
        .select()
        .unwrap();

    let last = rec.last();
    assert_eq!(
        last.sql,
        "SELECT * FROM users WHERE (a = :a_0_0 OR b = :b_0_1) AND status IN (NOW(), :status_in_1)"
    );
    let names: Vec<&str> = last.binds.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec![":a_0_0", ":b_0_1", ":status_in_1"]);
}

#[test]
fn prepared_insert_reports_success_count() {
    let (mut db, rec) = mysql();
    let inserted = db
        .table("users")
        .prepared(true)
        .insert(&json!([{"id": 1, "name": "A"}]))
        .unwrap();
    assert_eq!(inserted, 1);
    assert_eq!(rec.last().sql, "INSERT INTO users (id, name) VALUES (:id, :name)");
    assert_eq!(db.last_insert_id().as_deref(), Some("7"));

    rec.fails_next(true);
    let inserted = db
        .table("users")
        .prepared(true)
        .insert(&json!([{"id": 1, "name": "A"}]))
        .unwrap();
    assert_eq!(inserted, 0);
}

#[test]
fn json_insert_keeps_column_order() {
    let (mut db, rec) = mysql();
    db.table("users")
        .insert(&json!({"name": "A", "id": 1, "email": "a@example.com"}))
        .unwrap();
    let last = rec.last();
    assert_eq!(
        last.sql,
        "INSERT INTO users (name, id, email) VALUES (:name, :id, :email)"
    );
    assert_eq!(last.binds[1], (":id".to_string(), Value::from(1)));
}

#[test]
fn positional_rows_are_rejected_before_dispatch() {
    let (mut db, rec) = mysql();
    let err = db.table("users").insert(&json!([[1, "A"]])).unwrap_err();
    assert!(err.is_config());
    assert!(rec.executed().is_empty());
}

#[test]
fn upsert_rules() {
    let (mut db, rec) = mysql();
    db.table("counters")
        .on_duplicate("hits", "+=", 1)
        .on_duplicate("seen_at", DupOp::Set, raw("NOW()"))
        .insert(ValueMap::new().set("slug", "home").set("hits", 1))
        .unwrap();
    assert_eq!(
        rec.last().sql,
        "INSERT INTO counters (slug, hits) VALUES (:slug, :hits) \
         ON DUPLICATE KEY UPDATE hits = hits + :dup_hits, seen_at = NOW()"
    );
}

#[test]
fn direct_replace_inlines_values() {
    let (mut db, rec) = mysql();
    rec.affects(2);
    let n = db
        .table("users")
        .prepared(false)
        .replace(vec![
            ValueMap::new().set("id", 1).set("name", "O'Hara"),
            ValueMap::new().set("id", 2).set("name", "B"),
        ])
        .unwrap();
    assert_eq!(n, 2);
    let last = rec.last();
    assert_eq!(
        last.sql,
        r"REPLACE INTO users (id, name) VALUES (1, 'O\'Hara'), (2, 'B')"
    );
    assert!(last.binds.is_empty());
}

#[test]
fn unfiltered_writes_need_lenient_config() {
    init_tracing();
    let (driver, rec) = RecordingDriver::new("mysql");
    let config: BuilderConfig = serde_json::from_value(json!({"strict": false})).unwrap();
    let mut db = Builder::with_config(driver, config);

    db.table("sessions").set("expired", true).update().unwrap();
    db.table("sessions").delete().unwrap();
    assert_eq!(
        rec.sql(),
        vec!["UPDATE sessions SET expired = :set_expired", "DELETE FROM sessions"]
    );
}

#[test]
fn driver_errors_carry_code_and_reset_state() {
    let (mut db, rec) = mysql();
    rec.fails_next(true);
    let err = db.table("missing").where_("id", "=", 1).find().unwrap_err();
    match &err {
        SqlError::Execution { code, message } => {
            assert_eq!(code, "42S02");
            assert!(message.contains("doesn't exist"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(db.state().is_empty());
    assert_eq!(db.phase(), Phase::Idle);
}

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    id: i64,
    name: String,
}

#[test]
fn typed_reads() {
    let (mut db, rec) = mysql();
    rec.returns(vec![
        Row::new().with("id", 1).with("name", "A"),
        Row::new().with("id", 2).with("name", "B"),
    ]);
    let users: Vec<User> = db.table("users").order_by("id", "ASC").select_as().unwrap();
    assert_eq!(users[1], User { id: 2, name: "B".into() });
    assert_eq!(rec.last().sql, "SELECT * FROM users ORDER BY id ASC");

    rec.returns(vec![Row::new().with("id", 3).with("name", "C")]);
    let user: Option<User> = db.table("users").where_("id", "=", 3).find_as().unwrap();
    assert_eq!(user.map(|u| u.name).as_deref(), Some("C"));
}

#[test]
fn aggregates_and_exists() {
    let (mut db, rec) = mysql();
    rec.returns(vec![Row::new().with("aggregate_total", Value::Null)]);
    assert_eq!(db.table("orders").total("amount").unwrap(), 0.0);

    rec.returns(vec![Row::new().with("aggregate_avg", 12.5)]);
    assert_eq!(db.table("orders").average("amount").unwrap(), Some(12.5));

    rec.returns(vec![]);
    assert!(!db.table("orders").where_("id", "=", 9).exists().unwrap());

    let sql = rec.sql();
    assert_eq!(sql[0], "SELECT SUM(amount) AS aggregate_total FROM orders");
    assert_eq!(sql[1], "SELECT AVG(amount) AS aggregate_avg FROM orders");
    assert_eq!(sql[2], "SELECT 1 AS row_exists FROM orders WHERE id = :id LIMIT 1");
}

#[test]
fn explicit_cache_key_and_ttl() {
    init_tracing();
    let (driver, rec) = RecordingDriver::new("mysql");
    let mut db = Builder::new(driver).with_cache(MemoryCache::new(8));
    rec.returns(vec![Row::new().with("id", 1)]);

    let query = |db: &mut Builder<RecordingDriver, MemoryCache>| {
        db.table("users")
            .where_("status", "=", "active")
            .cache_key("active_users", Some(Duration::from_secs(60)))
            .select()
            .unwrap()
            .into_rows()
            .unwrap()
    };
    let first = query(&mut db);
    assert_eq!(db.phase(), Phase::Idle);
    let second = query(&mut db);
    assert_eq!(first, second);
    assert_eq!(rec.executed().len(), 1);
    assert!(db.cache_store().has_item("sqlfluent:active_users"));

    // Expired entries are dropped and re-read.
    rec.returns(vec![Row::new().with("id", 2)]);
    let fresh = db
        .table("users")
        .cache_for(Duration::ZERO)
        .select()
        .unwrap()
        .into_rows()
        .unwrap();
    let again = db
        .table("users")
        .cache_for(Duration::ZERO)
        .select()
        .unwrap()
        .into_rows()
        .unwrap();
    assert_eq!(fresh[0].get_i64("id").unwrap(), 2);
    assert!(again.is_empty());
    assert_eq!(rec.executed().len(), 3);
}

#[test]
fn raw_statements() {
    let (mut db, rec) = mysql();
    rec.returns(vec![Row::new().with("n", 3)]);
    let rows = db
        .query_raw("SELECT COUNT(*) AS n FROM users WHERE role = :role", [(":role", "admin")])
        .unwrap();
    assert_eq!(rows[0].get_i64("n").unwrap(), 3);

    rec.affects(4);
    let n = db
        .execute_raw("UPDATE users SET score = score + :inc", [(":inc", 1)])
        .unwrap();
    assert_eq!(n, 4);
    assert_eq!(rec.last().binds, vec![(":inc".to_string(), Value::from(1))]);
}

#[test]
fn postgres_dialect_operations() {
    init_tracing();
    let (driver, rec) = RecordingDriver::new("pgsql");
    let mut db = Builder::new(driver);

    db.lock(&["users"]).unwrap();
    assert!(db.unlock().unwrap_err().is_config());
    db.drop_table("scratch", true).unwrap();
    assert_eq!(
        rec.sql(),
        vec![
            "LOCK TABLE users IN ACCESS EXCLUSIVE MODE",
            "DROP TABLE IF EXISTS scratch",
        ]
    );
}

#[test]
fn unknown_driver_is_a_config_error() {
    init_tracing();
    let (driver, rec) = RecordingDriver::new("odbc-unknown");
    let mut db = Builder::new(driver);
    assert!(db.lock(&["users"]).unwrap_err().is_config());
    assert!(rec.executed().is_empty());
}
