use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Placeholder/argument count mismatch in a parameterized query.
    ArgumentMismatch {
        placeholders: usize,
        arguments: usize,
    },
    /// Relation name absent from the owning type's metadata.
    UnknownRelation {
        type_name: String,
        relation: String,
    },
    /// Reference string matches none of the three accepted grammars.
    MalformedReference { reference: String },
    /// Type name was never registered with the storage.
    UnknownType(String),
    /// An operation was attempted before `select` picked an active type.
    NoActiveType,
    LockPoisoned(&'static str),
    /// Database execution failure, propagated unchanged from the connection.
    Database(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ArgumentMismatch {
                placeholders,
                arguments,
            } => write!(
                f,
                "number of arguments ({}) does not match number of placeholders ({})",
                arguments, placeholders
            ),
            StorageError::UnknownRelation {
                type_name,
                relation,
            } => write!(
                f,
                "object {} does not have any related object(s) '{}'",
                type_name, relation
            ),
            StorageError::MalformedReference { reference } => {
                write!(f, "malformed relation reference '{}'", reference)
            }
            StorageError::UnknownType(type_name) => {
                write!(f, "type '{}' is not registered with the storage", type_name)
            }
            StorageError::NoActiveType => {
                write!(f, "no active type selected on the storage")
            }
            StorageError::LockPoisoned(operation) => {
                write!(f, "storage lock poisoned during {}", operation)
            }
            StorageError::Database(message) => write!(f, "database error: {}", message),
        }
    }
}

impl std::error::Error for StorageError {}
