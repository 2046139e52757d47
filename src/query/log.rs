use std::fmt;

/// Append-only log of executed queries with their literals inlined, paired
/// with elapsed execution time in seconds. Never truncated by the core;
/// exposed for diagnostics and not consumed internally.
#[derive(Debug, Clone, Default)]
pub struct QueryLog {
    entries: Vec<(String, f64)>,
}

impl QueryLog {
    pub fn new() -> Self {
        QueryLog::default()
    }

    pub fn append(&mut self, query: String, elapsed: f64) {
        self.entries.push((query, elapsed));
    }

    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Explicit host-side reset; nothing in the core calls this.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl fmt::Display for QueryLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (query, elapsed) in &self.entries {
            writeln!(f, "{} {} ms", query, elapsed * 1000.0)?;
        }
        Ok(())
    }
}
