#![allow(dead_code)]

//! A scripted in-memory driver that records every statement it sees.

use sqlfluent::{Driver, DriverError, Row, SqlResult, Statement, Value};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// One executed statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub sql: String,
    pub binds: Vec<(String, Value)>,
}

#[derive(Debug, Default)]
struct Script {
    executed: Vec<Executed>,
    results: VecDeque<Vec<Row>>,
    failures: VecDeque<bool>,
    affected: u64,
    last_insert_id: Option<String>,
}

/// Cloneable handle onto the driver's script and log.
#[derive(Debug, Clone, Default)]
pub struct Recorder(Rc<RefCell<Script>>);

impl Recorder {
    /// Queue the rows returned by the next successful execution.
    pub fn returns(&self, rows: Vec<Row>) -> &Self {
        self.0.borrow_mut().results.push_back(rows);
        self
    }

    /// Queue an outcome for the next execution.
    pub fn fails_next(&self, fail: bool) -> &Self {
        self.0.borrow_mut().failures.push_back(fail);
        self
    }

    pub fn affects(&self, rows: u64) -> &Self {
        self.0.borrow_mut().affected = rows;
        self
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.0.borrow().executed.clone()
    }

    pub fn sql(&self) -> Vec<String> {
        self.0.borrow().executed.iter().map(|e| e.sql.clone()).collect()
    }

    pub fn last(&self) -> Executed {
        self.0
            .borrow()
            .executed
            .last()
            .cloned()
            .expect("no statement executed")
    }
}

#[derive(Debug)]
pub struct RecordingDriver {
    name: String,
    recorder: Recorder,
}

impl RecordingDriver {
    pub fn new(name: &str) -> (Self, Recorder) {
        let recorder = Recorder::default();
        recorder.affects(1);
        recorder.0.borrow_mut().last_insert_id = Some("7".into());
        let driver = Self {
            name: name.to_string(),
            recorder: recorder.clone(),
        };
        (driver, recorder)
    }
}

#[derive(Debug)]
pub struct RecordedStatement {
    sql: String,
    binds: Vec<(String, Value)>,
    recorder: Recorder,
    ok: bool,
    rows: VecDeque<Row>,
}

impl Statement for RecordedStatement {
    fn bind(&mut self, name: &str, value: &Value) {
        match self.binds.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value.clone(),
            None => self.binds.push((name.to_string(), value.clone())),
        }
    }

    fn execute(&mut self) -> bool {
        let mut script = self.recorder.0.borrow_mut();
        self.ok = !script.failures.pop_front().unwrap_or(false);
        script.executed.push(Executed {
            sql: self.sql.clone(),
            binds: self.binds.clone(),
        });
        if self.ok {
            self.rows = script.results.pop_front().unwrap_or_default().into();
        }
        self.ok
    }

    fn ok(&self) -> bool {
        self.ok
    }

    fn row_count(&self) -> u64 {
        self.recorder.0.borrow().affected
    }

    fn fetch_all(&mut self) -> SqlResult<Vec<Row>> {
        Ok(self.rows.drain(..).collect())
    }

    fn fetch_next(&mut self) -> SqlResult<Option<Row>> {
        Ok(self.rows.pop_front())
    }

    fn errors(&self) -> Option<DriverError> {
        if self.ok {
            None
        } else {
            Some(DriverError::new("42S02", "Table 'app.missing' doesn't exist"))
        }
    }
}

impl Driver for RecordingDriver {
    type Statement = RecordedStatement;

    fn driver_name(&self) -> &str {
        &self.name
    }

    fn prepare(&mut self, sql: &str) -> SqlResult<RecordedStatement> {
        Ok(RecordedStatement {
            sql: sql.to_string(),
            binds: Vec::new(),
            recorder: self.recorder.clone(),
            ok: false,
            rows: VecDeque::new(),
        })
    }

    fn query(&mut self, sql: &str) -> SqlResult<RecordedStatement> {
        let mut stmt = self.prepare(sql)?;
        stmt.execute();
        Ok(stmt)
    }

    fn last_insert_id(&self) -> Option<String> {
        self.recorder.0.borrow().last_insert_id.clone()
    }

    fn begin_transaction(&mut self) -> SqlResult<()> {
        Ok(())
    }

    fn commit(&mut self) -> SqlResult<()> {
        Ok(())
    }

    fn rollback(&mut self) -> SqlResult<()> {
        Ok(())
    }
}
