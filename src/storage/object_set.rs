use crate::object::SharedObject;
use crate::value::Value;

/// Result of a batch get or a search: the requested keys in request order,
/// each paired with the object found for it (keys that matched no row stay
/// empty but remain in the set).
#[derive(Clone, Default)]
pub struct ObjectSet {
    entries: Vec<(Value, Option<SharedObject>)>,
}

impl ObjectSet {
    pub fn new() -> Self {
        ObjectSet::default()
    }

    /// Seed the set with the requested keys, deduplicated on their canonical
    /// string form, first occurrence wins the position.
    pub(crate) fn with_keys(keys: &[Value]) -> Self {
        let mut entries: Vec<(Value, Option<SharedObject>)> = Vec::with_capacity(keys.len());
        for key in keys {
            let key_string = key.key_string();
            if !entries.iter().any(|(k, _)| k.key_string() == key_string) {
                entries.push((key.clone(), None));
            }
        }
        ObjectSet { entries }
    }

    /// Merge a found object into its key's entry.
    pub(crate) fn fill(&mut self, key: &Value, object: SharedObject) {
        let key_string = key.key_string();
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|(k, _)| k.key_string() == key_string)
        {
            entry.1 = Some(object);
        }
    }

    /// Keys whose entry is still unfilled.
    pub(crate) fn missing_keys(&self) -> Vec<Value> {
        self.entries
            .iter()
            .filter(|(_, object)| object.is_none())
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn get(&self, key: &Value) -> Option<SharedObject> {
        let key_string = key.key_string();
        self.entries
            .iter()
            .find(|(k, _)| k.key_string() == key_string)
            .and_then(|(_, object)| object.clone())
    }

    /// The found objects, in request order.
    pub fn objects(&self) -> Vec<SharedObject> {
        self.entries
            .iter()
            .filter_map(|(_, object)| object.clone())
            .collect()
    }

    pub fn first(&self) -> Option<SharedObject> {
        self.entries.iter().find_map(|(_, object)| object.clone())
    }

    pub fn keys(&self) -> Vec<&Value> {
        self.entries.iter().map(|(key, _)| key).collect()
    }

    /// Number of requested keys (found or not).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of keys that matched a row.
    pub fn found_len(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, object)| object.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, Option<&SharedObject>)> {
        self.entries
            .iter()
            .map(|(key, object)| (key, object.as_ref()))
    }
}
