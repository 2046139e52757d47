use crate::cache::StorageCache;
use crate::error::StorageError;
use crate::meta::{MetaData, Reference, Relation, RelationKind};
use crate::object::{Related, SharedObject};
use crate::storage::{Context, Storage};
use crate::value::Value;

/// Produce the related object(s) for `name` on `owner`.
///
/// A populated slot on the owner wins unless `force_reload`. Otherwise the
/// relation cache is consulted under the exact `(class, column, value)` key,
/// and only a miss (or a forced reload, which overwrites) touches the
/// database. The loaded result lands in both the relation cache and the
/// owner's slot.
pub(crate) fn resolve(
    storage: &Storage,
    owner: &SharedObject,
    name: &str,
    force_reload: bool,
) -> Result<Related, StorageError> {
    if !force_reload {
        let guard = owner
            .read()
            .map_err(|_| StorageError::LockPoisoned("owner read"))?;
        if let Some(related) = guard.core().related(name) {
            return Ok(related.clone());
        }
    }

    let (owner_type, exported) = {
        let guard = owner
            .read()
            .map_err(|_| StorageError::LockPoisoned("owner read"))?;
        (guard.type_name(), guard.export())
    };

    let meta = storage.meta_of(owner_type)?;
    let relation = meta
        .related
        .get(name)
        .ok_or_else(|| StorageError::UnknownRelation {
            type_name: owner_type.to_string(),
            relation: name.to_string(),
        })?;

    let reference =
        Reference::parse(&relation.reference).ok_or_else(|| StorageError::MalformedReference {
            reference: relation.reference.clone(),
        })?;

    let target_meta = storage.meta_of(&relation.class)?;
    let value = exported
        .get(&reference.local_field)
        .cloned()
        .unwrap_or(Value::Null);

    let cache_key = StorageCache::relation_key(&relation.class, &reference.column, &value);
    let cached = if force_reload {
        None
    } else {
        storage.cache().lookup_relation(&cache_key)?
    };

    let related = match cached {
        Some(hit) => hit,
        None => {
            let loaded = load(storage, relation, &reference, &target_meta, &value)?;
            storage.cache().insert_relation(cache_key, loaded.clone())?;
            loaded
        }
    };

    let mut guard = owner
        .write()
        .map_err(|_| StorageError::LockPoisoned("owner write"))?;
    guard.core_mut().set_related(name, related.clone());

    Ok(related)
}

/// Load one relation from the database, with a per-call context for the
/// target type.
fn load(
    storage: &Storage,
    relation: &Relation,
    reference: &Reference,
    target_meta: &MetaData,
    value: &Value,
) -> Result<Related, StorageError> {
    let ctx = Context::new(&relation.class, target_meta);

    match relation.kind {
        RelationKind::HasMany => {
            let found = storage.search_ctx(
                &ctx,
                &format!("`{}` = ?", reference.column),
                &[value.clone().into()],
            )?;
            Ok(Related::Many(found.objects()))
        }
        RelationKind::BelongsTo | RelationKind::HasOne => {
            if reference.column == target_meta.primary_key {
                Ok(Related::One(storage.get_ctx(&ctx, value.clone())?))
            } else {
                let found = storage.search_ctx(
                    &ctx,
                    &format!("`{}` = ?", reference.column),
                    &[value.clone().into()],
                )?;
                Ok(Related::One(found.first()))
            }
        }
        RelationKind::ManyToMany => {
            let join = reference
                .join_table
                .as_ref()
                .ok_or_else(|| StorageError::MalformedReference {
                    reference: relation.reference.clone(),
                })?;

            let sql = format!(
                "SELECT `{}` FROM `{}` WHERE `{}` = ?",
                join.target_column, join.table, join.local_column
            );
            let rows = storage.query(&sql, &[value.clone().into()])?;
            let keys = rows.column(&join.target_column);

            let found = storage.get_many_ctx(&ctx, &keys)?;
            Ok(Related::Many(found.objects()))
        }
    }
}
