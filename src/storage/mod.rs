mod context;
mod object_set;
mod storage;

pub(crate) use context::Context;
pub use object_set::ObjectSet;
pub use storage::Storage;
