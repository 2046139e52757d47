mod core;
mod data_object;

pub use self::core::{ObjectCore, Related};
pub use data_object::{share, with_object, with_object_mut, DataObject, SharedObject};
