mod metadata;
mod reference;

pub use metadata::{MetaData, Relation, RelationKind};
pub use reference::{JoinTable, Reference};
