//! Entity metadata catalog
//!
//! Static, per-type description of persistent attributes. The example matcher
//! and execution engines read these tables; nothing in the core mutates them.
//!
//! - [`ManagedType`]: the table for one entity or embeddable type
//! - [`Managed`]: hands out a type's table
//! - [`Value`] / [`ValueType`]: what accessors produce and what attributes declare
//! - [`AttributePath`] / [`Record`]: dotted paths and flattened snapshots

mod attribute;
mod managed_type;
mod path;
mod value;

pub use attribute::{
    AccessorError, CollectionType, PersistentAttributeType, PluralAttribute, SingularAttribute,
};
pub use managed_type::{Managed, ManagedType, ManagedTypeBuilder};
pub use path::{AttributePath, Record};
pub use value::{Value, ValueType};
