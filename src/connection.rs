use crate::error::StorageError;
use crate::record::Record;
use crate::value::Value;

/// The database boundary: a single synchronous handle supplied by the host.
///
/// Implementations wrap whatever driver the host uses; the storage core only
/// needs a parameter-placeholder execution primitive, the generated-key
/// read-back, and an explicit begin/commit pair.
pub trait Connection: Send + Sync {
    /// Prepare and execute `sql` with positional parameters, returning the
    /// materialized result rows. Execution failures (constraint violations,
    /// connection errors) surface as `StorageError::Database` and are never
    /// caught by the core.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<Rows, StorageError>;

    /// The key generated by the most recent INSERT.
    fn last_insert_id(&self) -> Result<Value, StorageError>;

    fn begin_transaction(&self) -> Result<(), StorageError>;

    fn commit(&self) -> Result<(), StorageError>;

    /// Render a value as a SQL literal. Only used to inline parameters into
    /// logged query text; never used to build executed statements.
    fn quote(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Real(r) => r.to_string(),
            Value::Boolean(b) => if *b { "1" } else { "0" }.to_string(),
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

/// Result rows from a single statement, fetched eagerly.
#[derive(Debug, Clone, Default)]
pub struct Rows {
    rows: Vec<Record>,
}

impl Rows {
    pub fn new(rows: Vec<Record>) -> Self {
        Rows { rows }
    }

    pub fn empty() -> Self {
        Rows::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.rows
    }

    pub fn into_records(self) -> Vec<Record> {
        self.rows
    }

    pub fn first(&self) -> Option<&Record> {
        self.rows.first()
    }

    /// The named column of every row, in row order. The analog of fetching a
    /// single column from a statement (used for key lists).
    pub fn column(&self, name: &str) -> Vec<Value> {
        self.rows
            .iter()
            .filter_map(|row| row.get(name).cloned())
            .collect()
    }

    /// The named column of the first row, if any.
    pub fn first_value(&self, name: &str) -> Option<&Value> {
        self.rows.first().and_then(|row| row.get(name))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl IntoIterator for Rows {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
