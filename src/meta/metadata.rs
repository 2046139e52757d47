use std::collections::BTreeMap;

use crate::codec::FieldType;

/// Cardinality and ownership of a relation.
///
/// `BelongsTo` is the owning side (the foreign key lives on this record);
/// the other three are owned and take part in cascading saves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    BelongsTo,
    HasOne,
    HasMany,
    ManyToMany,
}

/// A declared relation: the target type name plus a reference string in one
/// of the three accepted grammars (see [`crate::Reference::parse`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub kind: RelationKind,
    pub class: String,
    pub reference: String,
}

/// Per-entity-type descriptor: table, primary key, the declared field-type
/// table consulted by the codec, and the relation map. Built once per type at
/// registration time and memoized by the storage.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaData {
    pub table: String,
    pub primary_key: String,
    pub fields: BTreeMap<String, FieldType>,
    pub related: BTreeMap<String, Relation>,
}

impl MetaData {
    pub fn new(table: impl Into<String>) -> Self {
        MetaData {
            table: table.into(),
            primary_key: "id".to_string(),
            fields: BTreeMap::new(),
            related: BTreeMap::new(),
        }
    }

    pub fn primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.insert(name.into(), field_type);
        self
    }

    pub fn relation(
        mut self,
        name: impl Into<String>,
        kind: RelationKind,
        class: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        self.related.insert(
            name.into(),
            Relation {
                kind,
                class: class.into(),
                reference: reference.into(),
            },
        );
        self
    }
}
