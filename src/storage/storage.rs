use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::cache::StorageCache;
use crate::codec;
use crate::connection::{Connection, Rows};
use crate::error::StorageError;
use crate::meta::{MetaData, Reference, RelationKind};
use crate::object::{DataObject, Related, SharedObject};
use crate::query::{Binding, QueryExecutor, QueryLog};
use crate::record::Record;
use crate::relation;
use crate::value::Value;

use super::context::Context;
use super::object_set::ObjectSet;

type Factory = Box<dyn Fn() -> SharedObject + Send + Sync>;
type Injector = Box<dyn Fn(&mut dyn DataObject) + Send + Sync>;

struct RegisteredType {
    factory: Factory,
    meta: Arc<MetaData>,
}

/// The storage facade: query execution, hydration, identity-mapped loads,
/// dirty-tracked saves and relation access, over a host-supplied connection
/// and a host-owned cache.
pub struct Storage {
    executor: QueryExecutor,
    cache: Arc<StorageCache>,
    registry: RwLock<HashMap<String, RegisteredType>>,
    injector: RwLock<Option<Injector>>,
    active: RwLock<Option<Context>>,
}

impl Storage {
    pub fn new(conn: Arc<dyn Connection>, cache: Arc<StorageCache>) -> Self {
        Storage {
            executor: QueryExecutor::new(conn),
            cache,
            registry: RwLock::new(HashMap::new()),
            injector: RwLock::new(None),
            active: RwLock::new(None),
        }
    }

    /// Install a callback consulted whenever the storage instantiates an
    /// object, letting the host inject collaborators.
    pub fn set_dependency_injector(
        &self,
        injector: impl Fn(&mut dyn DataObject) + Send + Sync + 'static,
    ) -> Result<(), StorageError> {
        let mut slot = self
            .injector
            .write()
            .map_err(|_| StorageError::LockPoisoned("injector write"))?;
        *slot = Some(Box::new(injector));
        Ok(())
    }

    pub fn set_logging(&self, enabled: bool) -> Result<(), StorageError> {
        self.executor.set_logging(enabled)
    }

    pub fn log(&self) -> Result<QueryLog, StorageError> {
        self.executor.log()
    }

    pub fn log_string(&self) -> Result<String, StorageError> {
        Ok(self.executor.log()?.to_string())
    }

    pub fn begin_transaction(&self) -> Result<(), StorageError> {
        self.executor.begin_transaction()
    }

    pub fn commit(&self) -> Result<(), StorageError> {
        self.executor.commit()
    }

    pub fn cache(&self) -> &StorageCache {
        &self.cache
    }

    /// Register an entity type: computes and memoizes its metadata and
    /// stores a factory for hydration and relation loads.
    pub fn register<T: DataObject + Default>(&self) -> Result<(), StorageError> {
        let probe = T::default();
        let type_name = probe.type_name().to_string();
        let meta = Arc::new(probe.meta_data());

        let mut registry = self
            .registry
            .write()
            .map_err(|_| StorageError::LockPoisoned("registry write"))?;
        registry.insert(
            type_name,
            RegisteredType {
                factory: Box::new(|| -> SharedObject { Arc::new(RwLock::new(T::default())) }),
                meta,
            },
        );
        Ok(())
    }

    /// The memoized metadata of a registered type.
    pub fn meta_of(&self, type_name: &str) -> Result<Arc<MetaData>, StorageError> {
        let registry = self
            .registry
            .read()
            .map_err(|_| StorageError::LockPoisoned("registry read"))?;
        registry
            .get(type_name)
            .map(|registered| registered.meta.clone())
            .ok_or_else(|| StorageError::UnknownType(type_name.to_string()))
    }

    /// Pick the active type; its table and primary key become the context
    /// for the untargeted operations (`get`, `search`, `count`, ...).
    pub fn select(&self, type_name: &str) -> Result<&Self, StorageError> {
        let meta = self.meta_of(type_name)?;
        let mut active = self
            .active
            .write()
            .map_err(|_| StorageError::LockPoisoned("selection write"))?;
        *active = Some(Context::new(type_name, &meta));
        Ok(self)
    }

    /// The active type name, if one is selected.
    pub fn selected_type(&self) -> Result<Option<String>, StorageError> {
        let active = self
            .active
            .read()
            .map_err(|_| StorageError::LockPoisoned("selection read"))?;
        Ok(active.as_ref().map(|ctx| ctx.type_name.clone()))
    }

    fn selection(&self) -> Result<Context, StorageError> {
        let active = self
            .active
            .read()
            .map_err(|_| StorageError::LockPoisoned("selection read"))?;
        active.clone().ok_or(StorageError::NoActiveType)
    }

    /// Create a fresh instance of a registered type, running the dependency
    /// injector and the object's `init` hook.
    pub fn create(&self, type_name: &str) -> Result<SharedObject, StorageError> {
        let object = {
            let registry = self
                .registry
                .read()
                .map_err(|_| StorageError::LockPoisoned("registry read"))?;
            let registered = registry
                .get(type_name)
                .ok_or_else(|| StorageError::UnknownType(type_name.to_string()))?;
            (registered.factory)()
        };

        {
            let mut guard = object
                .write()
                .map_err(|_| StorageError::LockPoisoned("object write"))?;
            let injector = self
                .injector
                .read()
                .map_err(|_| StorageError::LockPoisoned("injector read"))?;
            if let Some(injector) = injector.as_ref() {
                injector(&mut *guard);
            }
            guard.init();
        }

        Ok(object)
    }

    /// Get one object of the active type by primary key. Identity-mapped:
    /// a cached instance comes back without a query; a missing row is a soft
    /// `None`.
    pub fn get(&self, pk: impl Into<Value>) -> Result<Option<SharedObject>, StorageError> {
        let ctx = self.selection()?;
        self.get_ctx(&ctx, pk.into())
    }

    /// Batch get by primary keys. Satisfies as many keys as possible from
    /// the object cache and issues at most one `IN (...)` query for the
    /// remainder; preserves the requested key set and order.
    pub fn get_many(&self, pks: &[Value]) -> Result<ObjectSet, StorageError> {
        let ctx = self.selection()?;
        self.get_many_ctx(&ctx, pks)
    }

    /// Search the active type's table. The condition is prefixed with
    /// `WHERE` unless it is empty or already starts with `GROUP BY`,
    /// `HAVING`, `ORDER BY` or `LIMIT`. Matching primary keys are then
    /// funneled through `get_many`, so repeated searches never duplicate
    /// live objects.
    pub fn search(&self, options: &str, bindings: &[Binding]) -> Result<ObjectSet, StorageError> {
        let ctx = self.selection()?;
        self.search_ctx(&ctx, options, bindings)
    }

    /// Count rows of the active type's table matching a condition.
    pub fn count(&self, condition: &str, bindings: &[Binding]) -> Result<u64, StorageError> {
        let ctx = self.selection()?;
        self.count_ctx(&ctx, condition, bindings)
    }

    /// Run a raw query and hydrate every row into the active type.
    /// Bypasses both caches: the results are not registered in the
    /// identity map.
    pub fn request(
        &self,
        query: &str,
        bindings: &[Binding],
    ) -> Result<Vec<SharedObject>, StorageError> {
        let ctx = self.selection()?;
        let meta = self.meta_of(&ctx.type_name)?;
        let rows = self.executor.execute(query, bindings)?;

        let mut objects = Vec::with_capacity(rows.len());
        for record in rows {
            let object = self.create(&ctx.type_name)?;
            let coerced = codec::coerce_record(&record, &meta.fields);
            {
                let mut guard = object
                    .write()
                    .map_err(|_| StorageError::LockPoisoned("object write"))?;
                guard.import(&coerced);
            }
            objects.push(object);
        }
        Ok(objects)
    }

    /// Raw executor passthrough: placeholder expansion, logging, no
    /// hydration.
    pub fn query(&self, template: &str, bindings: &[Binding]) -> Result<Rows, StorageError> {
        self.executor.execute(template, bindings)
    }

    /// Save an object and cascade to its populated owned relations.
    ///
    /// The row write is dirty-tracked: a record matching its cached snapshot
    /// issues no UPDATE at all, a changed one updates only the changed
    /// columns, an absent one is inserted (reading back a generated key).
    /// Afterwards, every populated relation slot not of kind `BelongsTo` is
    /// back-filled with this row's primary key and saved recursively.
    pub fn save(&self, object: &SharedObject) -> Result<&Self, StorageError> {
        let type_name = {
            let guard = object
                .read()
                .map_err(|_| StorageError::LockPoisoned("object read"))?;
            guard.type_name()
        };
        let meta = self.meta_of(type_name)?;
        let ctx = Context::new(type_name, &meta);

        let pk_value = self.write_row(&ctx, &meta, object)?;
        self.cascade(&meta, object, &pk_value)?;
        Ok(self)
    }

    pub fn save_all(&self, objects: &[SharedObject]) -> Result<&Self, StorageError> {
        for object in objects {
            self.save(object)?;
        }
        Ok(self)
    }

    /// Slot-cached relation access; loads through the resolver on a miss.
    pub fn get_related(
        &self,
        object: &SharedObject,
        name: &str,
    ) -> Result<Related, StorageError> {
        relation::resolve(self, object, name, false)
    }

    /// Bypass both the slot and the relation cache, overwriting them with a
    /// fresh load.
    pub fn get_related_reload(
        &self,
        object: &SharedObject,
        name: &str,
    ) -> Result<Related, StorageError> {
        relation::resolve(self, object, name, true)
    }

    // --- context-threaded internals ---

    pub(crate) fn get_ctx(
        &self,
        ctx: &Context,
        pk: Value,
    ) -> Result<Option<SharedObject>, StorageError> {
        if pk.is_empty() {
            return Ok(None);
        }

        if let Some(cached) = self.cache.lookup_object(&ctx.type_name, &pk)? {
            return Ok(Some(cached));
        }

        let sql = format!(
            "SELECT * FROM `{}` WHERE `{}` = ?",
            ctx.table, ctx.primary_key
        );
        let rows = self.executor.execute(&sql, &[pk.into()])?;

        let meta = self.meta_of(&ctx.type_name)?;
        let mut first = None;
        for record in rows {
            let object = self.hydrate(ctx, &meta, record)?;
            if first.is_none() {
                first = Some(object);
            }
        }
        Ok(first)
    }

    pub(crate) fn get_many_ctx(
        &self,
        ctx: &Context,
        pks: &[Value],
    ) -> Result<ObjectSet, StorageError> {
        let mut set = ObjectSet::with_keys(pks);
        if set.is_empty() {
            return Ok(set);
        }

        for key in set.missing_keys() {
            if let Some(cached) = self.cache.lookup_object(&ctx.type_name, &key)? {
                set.fill(&key, cached);
            }
        }

        let missing = set.missing_keys();
        if missing.is_empty() {
            return Ok(set);
        }

        let sql = format!(
            "SELECT * FROM `{}` WHERE `{}` IN (?)",
            ctx.table, ctx.primary_key
        );
        let rows = self.executor.execute(&sql, &[missing.into()])?;

        let meta = self.meta_of(&ctx.type_name)?;
        for record in rows {
            let pk = record.get(&ctx.primary_key).cloned().unwrap_or(Value::Null);
            let object = self.hydrate(ctx, &meta, record)?;
            set.fill(&pk, object);
        }
        Ok(set)
    }

    pub(crate) fn search_ctx(
        &self,
        ctx: &Context,
        options: &str,
        bindings: &[Binding],
    ) -> Result<ObjectSet, StorageError> {
        let options = options.trim();
        let upper = options.to_uppercase();
        // A keyword only counts at a word boundary: `whereabouts = ?` is a
        // bare condition, not an already-prefixed clause.
        let prefixed = ["WHERE", "GROUP BY", "HAVING", "ORDER BY", "LIMIT"]
            .iter()
            .any(|kw| match upper.strip_prefix(kw) {
                Some(rest) => rest.is_empty() || rest.starts_with(char::is_whitespace),
                None => false,
            });

        let options = if options.is_empty() || prefixed {
            options.to_string()
        } else {
            format!("WHERE {}", options)
        };

        let sql = format!(
            "SELECT `{}` FROM `{}` {}",
            ctx.primary_key, ctx.table, options
        );
        let rows = self.executor.execute(sql.trim_end(), bindings)?;
        let keys = rows.column(&ctx.primary_key);

        self.get_many_ctx(ctx, &keys)
    }

    fn count_ctx(
        &self,
        ctx: &Context,
        condition: &str,
        bindings: &[Binding],
    ) -> Result<u64, StorageError> {
        let sql = format!("SELECT COUNT(*) FROM `{}` WHERE {}", ctx.table, condition);
        let rows = self.executor.execute(&sql, bindings)?;
        Ok(scalar_result(&rows))
    }

    /// Turn one fetched record into a registered live object: instantiate,
    /// coerce per the declared field types, import, and register the raw
    /// record and the instance in the caches.
    fn hydrate(
        &self,
        ctx: &Context,
        meta: &MetaData,
        record: Record,
    ) -> Result<SharedObject, StorageError> {
        let pk = record.get(&ctx.primary_key).cloned().unwrap_or(Value::Null);

        let object = self.create(&ctx.type_name)?;
        let coerced = codec::coerce_record(&record, &meta.fields);
        {
            let mut guard = object
                .write()
                .map_err(|_| StorageError::LockPoisoned("object write"))?;
            guard.import(&coerced);
        }

        self.cache.insert_snapshot(&ctx.table, &pk, record)?;
        self.cache.insert_object(&ctx.type_name, &pk, object.clone())?;
        Ok(object)
    }

    /// The dirty-tracked row write. Returns the primary-key value the row
    /// ended up with (possibly freshly generated).
    fn write_row(
        &self,
        ctx: &Context,
        meta: &MetaData,
        object: &SharedObject,
    ) -> Result<Value, StorageError> {
        let mut data = {
            let guard = object
                .read()
                .map_err(|_| StorageError::LockPoisoned("object read"))?;
            codec::to_record(&*guard)
        };
        let mut pk_value = data.get(&ctx.primary_key).cloned().unwrap_or(Value::Null);

        if self.record_present(ctx, &pk_value)? {
            let snapshot = self.cache.lookup_snapshot(&ctx.table, &pk_value)?;
            let changed = match snapshot {
                Some(snapshot) => data.diff(&snapshot),
                None => data.clone(),
            };

            if !changed.is_empty() {
                let set_clause = changed
                    .columns()
                    .map(|column| format!("`{}` = ?", column))
                    .collect::<Vec<_>>()
                    .join(", ");
                let sql = format!(
                    "UPDATE `{}` SET {} WHERE `{}` = ?",
                    ctx.table, set_clause, ctx.primary_key
                );

                let mut bindings: Vec<Binding> =
                    changed.values().cloned().map(Binding::One).collect();
                bindings.push(pk_value.clone().into());
                self.executor.execute(&sql, &bindings)?;
            }
        } else {
            let columns = data
                .columns()
                .map(|column| format!("`{}`", column))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!("INSERT INTO `{}` ({}) VALUES (?)", ctx.table, columns);
            let values: Vec<Value> = data.values().cloned().collect();
            self.executor.execute(&sql, &[values.into()])?;

            if pk_value.is_empty() {
                pk_value = self.executor.last_insert_id()?;
                let mut generated = Record::new();
                generated.insert(ctx.primary_key.clone(), pk_value.clone());
                let coerced = codec::coerce_record(&generated, &meta.fields);
                {
                    let mut guard = object
                        .write()
                        .map_err(|_| StorageError::LockPoisoned("object write"))?;
                    guard.import(&coerced);
                }
                data.insert(ctx.primary_key.clone(), pk_value.clone());
            }
        }

        self.cache.insert_snapshot(&ctx.table, &pk_value, data)?;
        self.cache
            .insert_object(&ctx.type_name, &pk_value, object.clone())?;
        Ok(pk_value)
    }

    /// Is the row already in the database? A non-empty primary key plus
    /// either a cached snapshot or a COUNT probe.
    fn record_present(&self, ctx: &Context, pk: &Value) -> Result<bool, StorageError> {
        if pk.is_empty() {
            return Ok(false);
        }
        if self.cache.lookup_snapshot(&ctx.table, pk)?.is_some() {
            return Ok(true);
        }

        let sql = format!(
            "SELECT COUNT(*) FROM `{}` WHERE `{}` = ?",
            ctx.table, ctx.primary_key
        );
        let rows = self.executor.execute(&sql, &[pk.clone().into()])?;
        Ok(scalar_result(&rows) > 0)
    }

    /// Save every populated owned relation, back-filling the join column
    /// with the owner's primary key first. Many-to-many children carry no
    /// foreign-key column, so they are saved without back-fill.
    fn cascade(
        &self,
        meta: &MetaData,
        object: &SharedObject,
        pk_value: &Value,
    ) -> Result<(), StorageError> {
        for (name, rel) in &meta.related {
            if rel.kind == RelationKind::BelongsTo {
                continue;
            }

            let slot = {
                let guard = object
                    .read()
                    .map_err(|_| StorageError::LockPoisoned("object read"))?;
                guard.core().related(name).cloned()
            };
            let Some(related) = slot else {
                continue;
            };

            let reference =
                Reference::parse(&rel.reference).ok_or_else(|| StorageError::MalformedReference {
                    reference: rel.reference.clone(),
                })?;

            for child in related.objects() {
                if rel.kind != RelationKind::ManyToMany {
                    let child_meta = {
                        let guard = child
                            .read()
                            .map_err(|_| StorageError::LockPoisoned("object read"))?;
                        self.meta_of(guard.type_name())?
                    };

                    let mut backfill = Record::new();
                    backfill.insert(reference.column.clone(), pk_value.clone());
                    let coerced = codec::coerce_record(&backfill, &child_meta.fields);
                    {
                        let mut guard = child
                            .write()
                            .map_err(|_| StorageError::LockPoisoned("object write"))?;
                        guard.import(&coerced);
                    }
                }

                self.save(&child)?;
            }
        }
        Ok(())
    }
}

/// First column of the first row as an unsigned count; zero when absent.
fn scalar_result(rows: &Rows) -> u64 {
    rows.first()
        .and_then(|record| record.values().next())
        .and_then(Value::as_i64)
        .map(|n| n.max(0) as u64)
        .unwrap_or(0)
}
