mod codec;
mod field_type;

pub use codec::{
    coerce, coerce_record, decode_collection, decode_timestamp, encode_collection,
    encode_timestamp, to_record, TIMESTAMP_FORMAT,
};
pub use field_type::{FieldKind, FieldType};
