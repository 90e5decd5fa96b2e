//! Persistent domain objects
//!
//! An [`Entity`] is a [`Managed`] type with a primary key. It is "new" while
//! its identifier is unset and managed or detached once the identifier is
//! set, depending on whether the current unit of work tracks it.

use std::fmt::{Debug, Display};
use std::hash::Hash;

use crate::metadata::Managed;

/// Who assigns an entity's identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdAssignment {
    /// The execution engine generates identifiers on insert
    #[default]
    Generated,
    /// Callers set identifiers before the first save
    Manual,
}

/// A persistent domain object identified by a primary key
///
/// # Example
///
/// ```rust,ignore
/// impl Entity for Country {
///     type Id = String;
///     const ID_ASSIGNMENT: IdAssignment = IdAssignment::Manual;
///
///     fn id(&self) -> Option<&String> {
///         self.code.as_ref()
///     }
///
///     fn set_id(&mut self, id: String) {
///         self.code = Some(id);
///     }
/// }
/// ```
pub trait Entity: Managed + Clone + Debug {
    type Id: Clone + Eq + Hash + Debug + Display + Send + Sync + 'static;

    const ID_ASSIGNMENT: IdAssignment = IdAssignment::Generated;

    fn id(&self) -> Option<&Self::Id>;

    fn set_id(&mut self, id: Self::Id);

    fn is_id_set(&self) -> bool {
        self.id().is_some()
    }

    /// Fully qualified type name, the default cache region
    fn canonical_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}
