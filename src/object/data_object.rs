use std::any::Any;
use std::sync::{Arc, RwLock};

use crate::error::StorageError;
use crate::meta::MetaData;
use crate::record::Record;

use super::core::ObjectCore;

/// A live persisted object, shared between the caller, the identity map and
/// any relation results that reference it.
pub type SharedObject = Arc<RwLock<dyn DataObject>>;

/// The contract every persisted domain type implements.
///
/// This is a capability interface rather than runtime reflection: a type
/// declares its table, primary key, field types and relations in
/// `meta_data`, and moves its state in and out of flat records through
/// `export`/`import`. The embedded [`ObjectCore`] carries the related-object
/// slots.
pub trait DataObject: Send + Sync + 'static {
    /// Stable type name used for registration, identity-map keys and
    /// relation targets.
    fn type_name(&self) -> &'static str;

    /// Raw per-type metadata. Computed once per type at registration and
    /// memoized by the storage; implementations just build it.
    fn meta_data(&self) -> MetaData;

    /// The object's persisted state as a flat record. Temporal and
    /// collection fields must already be in their canonical string forms
    /// (see the codec's `encode_timestamp`/`encode_collection`).
    fn export(&self) -> Record;

    /// Apply the known columns of `record` to the object's fields, ignoring
    /// unknown columns. Values arrive coerced to the declared field types.
    /// Also used for generated-key write-back and join-column back-fill,
    /// where the record carries a single column.
    fn import(&mut self, record: &Record);

    /// Post-construction hook run by `Storage::create`, after the optional
    /// dependency injector.
    fn init(&mut self) {}

    fn core(&self) -> &ObjectCore;

    fn core_mut(&mut self) -> &mut ObjectCore;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Wrap a concrete entity into the shared handle the storage works with.
/// Used for fresh, unsaved objects built outside `Storage::create`.
pub fn share<T: DataObject>(object: T) -> SharedObject {
    Arc::new(RwLock::new(object))
}

/// Run a closure against the concrete type behind a shared object.
///
/// std lock guards cannot be mapped to a downcast reference, so typed access
/// goes through a closure. Fails with `LockPoisoned` on a poisoned lock; a
/// wrong-type downcast yields `None`.
pub fn with_object<T: DataObject, R>(
    object: &SharedObject,
    f: impl FnOnce(&T) -> R,
) -> Result<Option<R>, StorageError> {
    let guard = object
        .read()
        .map_err(|_| StorageError::LockPoisoned("object read"))?;
    Ok(guard.as_any().downcast_ref::<T>().map(f))
}

/// Mutable variant of [`with_object`].
pub fn with_object_mut<T: DataObject, R>(
    object: &SharedObject,
    f: impl FnOnce(&mut T) -> R,
) -> Result<Option<R>, StorageError> {
    let mut guard = object
        .write()
        .map_err(|_| StorageError::LockPoisoned("object write"))?;
    Ok(guard.as_any_mut().downcast_mut::<T>().map(f))
}
