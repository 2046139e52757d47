use std::sync::{Arc, RwLock};
use std::time::Instant;

use crate::connection::{Connection, Rows};
use crate::error::StorageError;
use crate::value::Value;

use super::log::QueryLog;

/// One argument of a parameterized query. A `Many` binding occupies a single
/// `?` in the template and expands to one placeholder per element, which is
/// how `IN (?)` clauses take list values.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    One(Value),
    Many(Vec<Value>),
}

impl From<Value> for Binding {
    fn from(value: Value) -> Self {
        Binding::One(value)
    }
}

impl From<i64> for Binding {
    fn from(n: i64) -> Self {
        Binding::One(Value::Integer(n))
    }
}

impl From<i32> for Binding {
    fn from(n: i32) -> Self {
        Binding::One(Value::Integer(i64::from(n)))
    }
}

impl From<f64> for Binding {
    fn from(r: f64) -> Self {
        Binding::One(Value::Real(r))
    }
}

impl From<bool> for Binding {
    fn from(b: bool) -> Self {
        Binding::One(Value::Boolean(b))
    }
}

impl From<&str> for Binding {
    fn from(s: &str) -> Self {
        Binding::One(Value::Text(s.to_string()))
    }
}

impl From<String> for Binding {
    fn from(s: String) -> Self {
        Binding::One(Value::Text(s))
    }
}

impl From<Vec<Value>> for Binding {
    fn from(values: Vec<Value>) -> Self {
        Binding::Many(values)
    }
}

impl From<&[Value]> for Binding {
    fn from(values: &[Value]) -> Self {
        Binding::Many(values.to_vec())
    }
}

/// Builds and runs parameterized statements against the host connection,
/// expanding list bindings and keeping the query log.
pub struct QueryExecutor {
    conn: Arc<dyn Connection>,
    log: RwLock<QueryLog>,
    logging: RwLock<bool>,
}

impl QueryExecutor {
    pub fn new(conn: Arc<dyn Connection>) -> Self {
        QueryExecutor {
            conn,
            log: RwLock::new(QueryLog::new()),
            logging: RwLock::new(false),
        }
    }

    pub fn set_logging(&self, enabled: bool) -> Result<(), StorageError> {
        let mut logging = self
            .logging
            .write()
            .map_err(|_| StorageError::LockPoisoned("logging write"))?;
        *logging = enabled;
        Ok(())
    }

    pub fn log(&self) -> Result<QueryLog, StorageError> {
        let log = self
            .log
            .read()
            .map_err(|_| StorageError::LockPoisoned("log read"))?;
        Ok(log.clone())
    }

    pub fn clear_log(&self) -> Result<(), StorageError> {
        let mut log = self
            .log
            .write()
            .map_err(|_| StorageError::LockPoisoned("log write"))?;
        log.clear();
        Ok(())
    }

    /// Execute `template` with the given bindings. Each binding consumes
    /// exactly one `?`; the binding count must match the placeholder count or
    /// the call fails with `ArgumentMismatch` before anything is executed.
    pub fn execute(&self, template: &str, bindings: &[Binding]) -> Result<Rows, StorageError> {
        let (sql, params) = expand(template, bindings)?;

        let start = Instant::now();
        let rows = self.conn.execute(&sql, &params)?;
        let elapsed = start.elapsed().as_secs_f64();

        let logging = self
            .logging
            .read()
            .map_err(|_| StorageError::LockPoisoned("logging read"))?;
        if *logging {
            let rendered = render(&sql, &params, self.conn.as_ref());
            let mut log = self
                .log
                .write()
                .map_err(|_| StorageError::LockPoisoned("log write"))?;
            log.append(rendered, elapsed);
        }

        Ok(rows)
    }

    pub fn last_insert_id(&self) -> Result<Value, StorageError> {
        self.conn.last_insert_id()
    }

    pub fn begin_transaction(&self) -> Result<(), StorageError> {
        self.conn.begin_transaction()
    }

    pub fn commit(&self) -> Result<(), StorageError> {
        self.conn.commit()
    }
}

/// Split the template on `?`, check arity, and splice list bindings into
/// repeated comma-separated placeholders.
fn expand(template: &str, bindings: &[Binding]) -> Result<(String, Vec<Value>), StorageError> {
    let parts: Vec<&str> = template.split('?').collect();
    let placeholders = parts.len() - 1;

    if bindings.len() != placeholders {
        return Err(StorageError::ArgumentMismatch {
            placeholders,
            arguments: bindings.len(),
        });
    }

    let mut sql = String::with_capacity(template.len());
    let mut params = Vec::new();

    for (i, part) in parts.iter().enumerate() {
        sql.push_str(part);
        match bindings.get(i) {
            Some(Binding::One(value)) => {
                sql.push('?');
                params.push(value.clone());
            }
            Some(Binding::Many(values)) => {
                let expanded = vec!["?"; values.len()].join(", ");
                sql.push_str(&expanded);
                params.extend(values.iter().cloned());
            }
            None => {} // trailing part after the last placeholder
        }
    }

    Ok((sql, params))
}

/// Replace each placeholder in order with its quoted parameter, for logging.
fn render(sql: &str, params: &[Value], conn: &dyn Connection) -> String {
    let mut rendered = String::with_capacity(sql.len());
    let mut params = params.iter();

    for ch in sql.chars() {
        if ch == '?' {
            match params.next() {
                Some(value) => rendered.push_str(&conn.quote(value)),
                None => rendered.push('?'),
            }
        } else {
            rendered.push(ch);
        }
    }

    rendered
}
