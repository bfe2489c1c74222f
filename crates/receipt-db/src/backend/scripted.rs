//! In-memory backend for tests.
//!
//! Records every statement it is handed and answers from a script: queued
//! result sets for `fetch`, and failures keyed on a SQL fragment.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Backend, ColumnKind, DbMode, Row, Session, SqlValue};
use crate::error::{DbError, DbResult};

#[derive(Debug)]
enum Failure {
    /// Every statement containing the fragment fails.
    Always(String),
    /// The first `remaining` matching statements report a duplicate key.
    Duplicate { fragment: String, remaining: usize },
}

#[derive(Debug, Default)]
struct Script {
    statements: Vec<(String, Vec<SqlValue>)>,
    failures: Vec<Failure>,
    results: VecDeque<Vec<Row>>,
    affected: Option<u64>,
    opened: usize,
    closed: usize,
}

impl Script {
    fn check(&mut self, sql: &str) -> DbResult<()> {
        for failure in &mut self.failures {
            match failure {
                Failure::Always(fragment) if sql.contains(fragment.as_str()) => {
                    return Err(DbError::QueryFailed(format!("scripted failure on '{fragment}'")));
                }
                Failure::Duplicate { fragment, remaining }
                    if *remaining > 0 && sql.contains(fragment.as_str()) =>
                {
                    *remaining -= 1;
                    return Err(DbError::duplicate("id", "scripted"));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ScriptedBackend {
    mode: DbMode,
    script: Arc<Mutex<Script>>,
}

impl ScriptedBackend {
    pub(crate) fn new(mode: DbMode) -> Self {
        ScriptedBackend {
            mode,
            script: Arc::new(Mutex::new(Script::default())),
        }
    }

    pub(crate) fn fail_on(self, fragment: &str) -> Self {
        self.lock()
            .failures
            .push(Failure::Always(fragment.to_string()));
        self
    }

    pub(crate) fn duplicate_on(self, fragment: &str, times: usize) -> Self {
        self.lock().failures.push(Failure::Duplicate {
            fragment: fragment.to_string(),
            remaining: times,
        });
        self
    }

    /// Row count reported by `execute`. Defaults to 1.
    pub(crate) fn affecting(self, rows: u64) -> Self {
        self.lock().affected = Some(rows);
        self
    }

    pub(crate) fn push_result(&self, rows: Vec<Row>) {
        self.lock().results.push_back(rows);
    }

    pub(crate) fn statements(&self) -> Vec<String> {
        self.lock()
            .statements
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    pub(crate) fn params(&self) -> Vec<Vec<SqlValue>> {
        self.lock()
            .statements
            .iter()
            .map(|(_, params)| params.clone())
            .collect()
    }

    /// `(opened, closed)` session counts.
    pub(crate) fn sessions(&self) -> (usize, usize) {
        let script = self.lock();
        (script.opened, script.closed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn mode(&self) -> DbMode {
        self.mode
    }

    async fn open(&self) -> DbResult<Box<dyn Session>> {
        self.lock().opened += 1;
        Ok(Box::new(ScriptedSession {
            script: Arc::clone(&self.script),
        }))
    }
}

struct ScriptedSession {
    script: Arc<Mutex<Script>>,
}

impl ScriptedSession {
    fn record(&self, sql: &str, params: &[SqlValue]) -> DbResult<()> {
        let mut script = self.script.lock().unwrap();
        script.statements.push((sql.to_string(), params.to_vec()));
        script.check(sql)
    }
}

#[async_trait]
impl Session for ScriptedSession {
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<u64> {
        self.record(sql, params)?;
        Ok(self.script.lock().unwrap().affected.unwrap_or(1))
    }

    async fn fetch(
        &mut self,
        sql: &str,
        params: &[SqlValue],
        _columns: &[ColumnKind],
    ) -> DbResult<Vec<Row>> {
        self.record(sql, params)?;
        Ok(self
            .script
            .lock()
            .unwrap()
            .results
            .pop_front()
            .unwrap_or_default())
    }

    async fn execute_script(&mut self, sql: &str) -> DbResult<()> {
        self.record(sql, &[])
    }

    async fn close(self: Box<Self>) -> DbResult<()> {
        self.script.lock().unwrap().closed += 1;
        Ok(())
    }
}
