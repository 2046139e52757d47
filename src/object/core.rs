use std::collections::HashMap;

use super::data_object::SharedObject;

/// A loaded relation result: a single target (possibly absent) or an ordered
/// set of targets. Cloning clones the shared handles, not the entities.
#[derive(Clone, Default)]
pub enum Related {
    #[default]
    None,
    One(Option<SharedObject>),
    Many(Vec<SharedObject>),
}

impl Related {
    /// All objects in the result, in load order.
    pub fn objects(&self) -> Vec<SharedObject> {
        match self {
            Related::None => Vec::new(),
            Related::One(one) => one.iter().cloned().collect(),
            Related::Many(many) => many.clone(),
        }
    }

    pub fn first(&self) -> Option<SharedObject> {
        match self {
            Related::None => None,
            Related::One(one) => one.clone(),
            Related::Many(many) => many.first().cloned(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Related::None => 0,
            Related::One(one) => usize::from(one.is_some()),
            Related::Many(many) => many.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Related {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Related::None => write!(f, "Related::None"),
            Related::One(one) => write!(f, "Related::One(<{} object>)", one.iter().count()),
            Related::Many(many) => write!(f, "Related::Many(<{} objects>)", many.len()),
        }
    }
}

impl From<Option<SharedObject>> for Related {
    fn from(one: Option<SharedObject>) -> Self {
        Related::One(one)
    }
}

impl From<Vec<SharedObject>> for Related {
    fn from(many: Vec<SharedObject>) -> Self {
        Related::Many(many)
    }
}

/// The embeddable base state of a persisted object: the per-instance
/// related-object slots. Concrete entity types embed one of these and hand
/// it out through `DataObject::core`/`core_mut`.
#[derive(Debug, Clone, Default)]
pub struct ObjectCore {
    related: HashMap<String, Related>,
}

impl ObjectCore {
    pub fn new() -> Self {
        ObjectCore::default()
    }

    /// The populated slot for a relation name, if any. A populated slot is
    /// returned by `get_related` without touching the resolver.
    pub fn related(&self, name: &str) -> Option<&Related> {
        self.related.get(name)
    }

    /// Pre-set or overwrite a relation slot. Used by the resolver after a
    /// load, and by callers attaching unsaved children before a cascade save.
    pub fn set_related(&mut self, name: impl Into<String>, related: impl Into<Related>) {
        self.related.insert(name.into(), related.into());
    }

    pub fn clear_related(&mut self, name: &str) -> Option<Related> {
        self.related.remove(name)
    }

    /// Names of the currently populated slots.
    pub fn related_names(&self) -> Vec<String> {
        self.related.keys().cloned().collect()
    }
}
