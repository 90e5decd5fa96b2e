//! Attribute descriptions stored in a managed type's metadata table

use std::fmt;
use std::sync::Arc;

use crate::query::Predicate;
use crate::repository::{RepositoryResult, SearchParameters};

use super::path::{AttributePath, Record};
use super::value::{Value, ValueType};

/// Classification of a singular attribute
///
/// Drives the skip rules of the example matcher: only `Basic` attributes are
/// compared directly, `Embedded` attributes are matched recursively, and
/// to-one associations are left to repository hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersistentAttributeType {
    /// Plain column value
    Basic,
    /// Value object stored inline with its owner
    Embedded,
    /// Reference to another entity, many owners per target
    ManyToOne,
    /// Reference to another entity, one owner per target
    OneToOne,
}

impl PersistentAttributeType {
    /// Whether the attribute references another entity
    #[must_use]
    pub const fn is_to_one(self) -> bool {
        matches!(self, Self::ManyToOne | Self::OneToOne)
    }
}

impl fmt::Display for PersistentAttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Embedded => write!(f, "embedded"),
            Self::ManyToOne => write!(f, "many_to_one"),
            Self::OneToOne => write!(f, "one_to_one"),
        }
    }
}

/// Collection kind of a plural attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionType {
    List,
    Set,
    Map,
}

impl fmt::Display for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Set => write!(f, "set"),
            Self::Map => write!(f, "map"),
        }
    }
}

/// Failure to read an attribute off an instance
///
/// Indicates a mismatch between the metadata table and the instance, never a
/// recoverable runtime condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorError {
    /// Path of the attribute being read, filled in by the metadata table
    pub attribute: Option<String>,
    pub reason: String,
}

impl AccessorError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            attribute: None,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn for_attribute(mut self, attribute: impl Into<String>) -> Self {
        if self.attribute.is_none() {
            self.attribute = Some(attribute.into());
        }
        self
    }
}

impl fmt::Display for AccessorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(attribute) => write!(f, "cannot read `{attribute}`: {}", self.reason),
            None => write!(f, "cannot read attribute: {}", self.reason),
        }
    }
}

impl std::error::Error for AccessorError {}

pub(crate) type ValueAccessor<T> =
    Arc<dyn Fn(&T) -> Result<Value, AccessorError> + Send + Sync>;

pub(crate) type EmbeddedMatcher<T> = Arc<
    dyn Fn(&T, &AttributePath, &SearchParameters) -> RepositoryResult<Option<Predicate>>
        + Send
        + Sync,
>;

pub(crate) type EmbeddedSnapshot<T> =
    Arc<dyn Fn(&T, &AttributePath, &mut Record) -> Result<(), AccessorError> + Send + Sync>;

/// Type-erased link from an owner to an embedded value and that value's own
/// metadata
pub(crate) struct EmbeddedBinding<T> {
    pub(crate) matcher: EmbeddedMatcher<T>,
    pub(crate) snapshot: EmbeddedSnapshot<T>,
}

pub(crate) enum Access<T> {
    Value(ValueAccessor<T>),
    Embedded(EmbeddedBinding<T>),
}

/// A single-valued attribute of a managed type
pub struct SingularAttribute<T> {
    pub(crate) name: &'static str,
    pub(crate) value_type: ValueType,
    pub(crate) attribute_type: PersistentAttributeType,
    pub(crate) access: Access<T>,
}

impl<T> SingularAttribute<T> {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        self.value_type
    }

    #[must_use]
    pub const fn attribute_type(&self) -> PersistentAttributeType {
        self.attribute_type
    }

    /// Read the attribute's value off an instance
    ///
    /// Embedded attributes have no scalar value; reading one is an error.
    pub fn read(&self, instance: &T) -> Result<Value, AccessorError> {
        match &self.access {
            Access::Value(accessor) => accessor(instance).map_err(|e| e.for_attribute(self.name)),
            Access::Embedded(_) => Err(AccessorError::new(
                "embedded attribute has no scalar value",
            )
            .for_attribute(self.name)),
        }
    }

    pub(crate) fn embedded(&self) -> Option<&EmbeddedBinding<T>> {
        match &self.access {
            Access::Embedded(binding) => Some(binding),
            Access::Value(_) => None,
        }
    }
}

impl<T> fmt::Debug for SingularAttribute<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingularAttribute")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("attribute_type", &self.attribute_type)
            .finish_non_exhaustive()
    }
}

/// A collection-valued attribute of a managed type
pub struct PluralAttribute<T> {
    pub(crate) name: &'static str,
    pub(crate) collection_type: CollectionType,
    pub(crate) element_type: ValueType,
    pub(crate) accessor: ValueAccessor<T>,
}

impl<T> PluralAttribute<T> {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn collection_type(&self) -> CollectionType {
        self.collection_type
    }

    #[must_use]
    pub const fn element_type(&self) -> ValueType {
        self.element_type
    }

    /// Read the collection off an instance as a [`Value::List`] or [`Value::Null`]
    pub fn read(&self, instance: &T) -> Result<Value, AccessorError> {
        match (self.accessor)(instance).map_err(|e| e.for_attribute(self.name))? {
            value @ (Value::List(_) | Value::Null) => Ok(value),
            other => Err(AccessorError::new(format!(
                "{} attribute produced a non-collection value {other}",
                self.collection_type
            ))
            .for_attribute(self.name)),
        }
    }
}

impl<T> fmt::Debug for PluralAttribute<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluralAttribute")
            .field("name", &self.name)
            .field("collection_type", &self.collection_type)
            .field("element_type", &self.element_type)
            .finish_non_exhaustive()
    }
}
