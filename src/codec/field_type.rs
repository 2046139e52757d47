use serde::{Deserialize, Serialize};

/// Declared type of a persisted field. The codec consults these instead of
/// inspecting live object state; every entity type declares its table of them
/// in its metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Integer,
    Real,
    Text,
    Boolean,
    /// Stored as the canonical `YYYY-MM-DD HH:MM:SS` text form.
    Timestamp,
    /// Any non-scalar value, stored as an opaque JSON string.
    Collection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldType {
    pub kind: FieldKind,
    pub nullable: bool,
}

impl FieldType {
    pub fn new(kind: FieldKind) -> Self {
        FieldType {
            kind,
            nullable: false,
        }
    }

    pub fn integer() -> Self {
        FieldType::new(FieldKind::Integer)
    }

    pub fn real() -> Self {
        FieldType::new(FieldKind::Real)
    }

    pub fn text() -> Self {
        FieldType::new(FieldKind::Text)
    }

    pub fn boolean() -> Self {
        FieldType::new(FieldKind::Boolean)
    }

    pub fn timestamp() -> Self {
        FieldType::new(FieldKind::Timestamp)
    }

    pub fn collection() -> Self {
        FieldType::new(FieldKind::Collection)
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}
