use crate::meta::MetaData;

/// The type/table/primary-key coordinates one operation runs against.
///
/// Built from the registry at call time and threaded through the internals
/// as an immutable value, so relation loads against other types never touch
/// the caller's selection.
#[derive(Debug, Clone)]
pub(crate) struct Context {
    pub type_name: String,
    pub table: String,
    pub primary_key: String,
}

impl Context {
    pub fn new(type_name: &str, meta: &MetaData) -> Self {
        Context {
            type_name: type_name.to_string(),
            table: meta.table.clone(),
            primary_key: meta.primary_key.clone(),
        }
    }
}
