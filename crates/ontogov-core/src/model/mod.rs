pub mod binding;
pub mod digest;
pub mod entity;
pub mod relationship;
pub mod rule;
pub mod snapshot;
pub mod types;
pub mod validation;

pub use binding::{Binding, ColumnDef, TableCatalog, TableDef};
pub use entity::{Constraint, EntityDef, EntityKind, PropertyDef};
pub use relationship::{Cardinality, CrossFilter, RelationshipDef};
pub use rule::{RuleDef, RuleProvenance};
pub use snapshot::OntologySnapshot;
pub use types::{TypeChange, TypeDescriptor, TypeFamily};
pub use validation::validate_snapshot;
