mod cache;
mod codec;
mod connection;
mod error;
mod meta;
mod object;
mod query;
mod record;
mod relation;
mod storage;
mod value;

pub use cache::StorageCache;
pub use codec::{
    coerce, coerce_record, decode_collection, decode_timestamp, encode_collection,
    encode_timestamp, to_record, FieldKind, FieldType, TIMESTAMP_FORMAT,
};
pub use connection::{Connection, Rows};
pub use error::StorageError;
pub use meta::{JoinTable, MetaData, Reference, Relation, RelationKind};
pub use object::{share, with_object, with_object_mut, DataObject, ObjectCore, Related, SharedObject};
pub use query::{Binding, QueryExecutor, QueryLog};
pub use record::Record;
pub use storage::{ObjectSet, Storage};
pub use value::Value;

// Re-export the timestamp type used for temporal field values.
pub use time::PrimitiveDateTime;
