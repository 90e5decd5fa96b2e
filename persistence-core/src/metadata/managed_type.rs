//! Per-type metadata tables
//!
//! A [`ManagedType`] is built once per entity or embeddable type, usually behind
//! a `once_cell::sync::Lazy` static, and handed out through [`Managed`]. It
//! replaces runtime reflection: every attribute is registered with its name,
//! declared type, classification and an accessor closure.
//!
//! # Example
//!
//! ```rust
//! use once_cell::sync::Lazy;
//! use persistence_core::metadata::{Managed, ManagedType, ValueType};
//!
//! struct Address {
//!     city: Option<String>,
//! }
//!
//! static ADDRESS: Lazy<ManagedType<Address>> = Lazy::new(|| {
//!     ManagedType::<Address>::builder("Address")
//!         .basic("city", ValueType::Text, |a: &Address| a.city.clone())
//!         .build()
//! });
//!
//! impl Managed for Address {
//!     fn managed_type() -> &'static ManagedType<Self> {
//!         &ADDRESS
//!     }
//! }
//!
//! assert_eq!(Address::managed_type().singular_attributes().len(), 1);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::query::ExampleMatcher;
use crate::repository::SearchParameters;

use super::attribute::{
    Access, AccessorError, CollectionType, EmbeddedBinding, EmbeddedMatcher, EmbeddedSnapshot,
    PersistentAttributeType, PluralAttribute, SingularAttribute, ValueAccessor,
};
use super::path::{AttributePath, Record};
use super::value::{Value, ValueType};

/// Types described by a static metadata table
pub trait Managed: Sized + Send + Sync + 'static {
    fn managed_type() -> &'static ManagedType<Self>;
}

/// Metadata table for one entity or embeddable type
pub struct ManagedType<T> {
    name: &'static str,
    singular: Vec<SingularAttribute<T>>,
    plural: Vec<PluralAttribute<T>>,
}

impl<T: 'static> ManagedType<T> {
    #[must_use]
    pub fn builder(name: &'static str) -> ManagedTypeBuilder<T> {
        ManagedTypeBuilder {
            name,
            singular: Vec::new(),
            plural: Vec::new(),
        }
    }
}

impl<T> ManagedType<T> {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn singular_attributes(&self) -> &[SingularAttribute<T>] {
        &self.singular
    }

    #[must_use]
    pub fn plural_attributes(&self) -> &[PluralAttribute<T>] {
        &self.plural
    }

    #[must_use]
    pub fn singular_attribute(&self, name: &str) -> Option<&SingularAttribute<T>> {
        self.singular.iter().find(|attr| attr.name == name)
    }

    #[must_use]
    pub fn plural_attribute(&self, name: &str) -> Option<&PluralAttribute<T>> {
        self.plural.iter().find(|attr| attr.name == name)
    }

    /// Flatten an instance into a [`Record`] keyed by attribute path
    ///
    /// To-one associations contribute whatever their accessor returns
    /// (usually the target's identifier); embedded values contribute one entry
    /// per embedded attribute.
    pub fn snapshot(&self, instance: &T) -> Result<Record, AccessorError> {
        let mut record = Record::new();
        self.write_snapshot(instance, &AttributePath::root(), &mut record)?;
        Ok(record)
    }

    pub(crate) fn write_snapshot(
        &self,
        instance: &T,
        prefix: &AttributePath,
        record: &mut Record,
    ) -> Result<(), AccessorError> {
        for attr in &self.singular {
            let path = prefix.child(attr.name);
            match attr.embedded() {
                Some(binding) => (binding.snapshot)(instance, &path, record)?,
                None => {
                    let value = attr.read(instance).map_err(|e| e.for_attribute(path.as_str()))?;
                    record.insert(path, value);
                }
            }
        }
        for attr in &self.plural {
            let path = prefix.child(attr.name);
            let value = attr.read(instance).map_err(|e| e.for_attribute(path.as_str()))?;
            record.insert(path, value);
        }
        Ok(())
    }
}

impl<T> fmt::Debug for ManagedType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedType")
            .field("name", &self.name)
            .field("singular", &self.singular)
            .field("plural", &self.plural)
            .finish()
    }
}

/// Builder for [`ManagedType`]
///
/// Attributes are visited by the example matcher in registration order.
pub struct ManagedTypeBuilder<T> {
    name: &'static str,
    singular: Vec<SingularAttribute<T>>,
    plural: Vec<PluralAttribute<T>>,
}

impl<T: 'static> ManagedTypeBuilder<T> {
    /// Register a plain attribute with an infallible accessor
    #[must_use]
    pub fn basic<V, F>(self, name: &'static str, value_type: ValueType, accessor: F) -> Self
    where
        V: Into<Value>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.singular_value(
            name,
            value_type,
            PersistentAttributeType::Basic,
            Arc::new(move |instance: &T| Ok(accessor(instance).into())),
        )
    }

    /// Register a plain attribute whose accessor may fail
    #[must_use]
    pub fn try_basic<F>(self, name: &'static str, value_type: ValueType, accessor: F) -> Self
    where
        F: Fn(&T) -> Result<Value, AccessorError> + Send + Sync + 'static,
    {
        self.singular_value(
            name,
            value_type,
            PersistentAttributeType::Basic,
            Arc::new(accessor),
        )
    }

    /// Register a many-to-one association; the accessor usually returns the
    /// target's identifier
    #[must_use]
    pub fn many_to_one<V, F>(self, name: &'static str, value_type: ValueType, accessor: F) -> Self
    where
        V: Into<Value>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.singular_value(
            name,
            value_type,
            PersistentAttributeType::ManyToOne,
            Arc::new(move |instance: &T| Ok(accessor(instance).into())),
        )
    }

    /// Register a one-to-one association
    #[must_use]
    pub fn one_to_one<V, F>(self, name: &'static str, value_type: ValueType, accessor: F) -> Self
    where
        V: Into<Value>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.singular_value(
            name,
            value_type,
            PersistentAttributeType::OneToOne,
            Arc::new(move |instance: &T| Ok(accessor(instance).into())),
        )
    }

    /// Register an embedded value object described by its own metadata table
    #[must_use]
    pub fn embedded<A, F>(mut self, name: &'static str, accessor: F) -> Self
    where
        A: Managed,
        F: for<'a> Fn(&'a T) -> Option<&'a A> + Send + Sync + 'static,
    {
        let accessor = Arc::new(accessor);
        let for_match = Arc::clone(&accessor);

        let matcher: EmbeddedMatcher<T> = Arc::new(
            move |owner: &T, path: &AttributePath, search: &SearchParameters| {
                ExampleMatcher::new().match_embedded(path, (*for_match)(owner), search)
            },
        );
        let snapshot: EmbeddedSnapshot<T> = Arc::new(
            move |owner: &T, path: &AttributePath, record: &mut Record| match (*accessor)(owner) {
                Some(value) => A::managed_type().write_snapshot(value, path, record),
                None => Ok(()),
            },
        );

        self.singular.push(SingularAttribute {
            name,
            value_type: ValueType::Embedded,
            attribute_type: PersistentAttributeType::Embedded,
            access: Access::Embedded(EmbeddedBinding { matcher, snapshot }),
        });
        self
    }

    /// Register a list-typed collection, the only kind matched by membership
    #[must_use]
    pub fn list<V, F>(self, name: &'static str, element_type: ValueType, accessor: F) -> Self
    where
        V: Into<Value>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.collection(name, CollectionType::List, element_type, accessor)
    }

    #[must_use]
    pub fn collection<V, F>(
        mut self,
        name: &'static str,
        collection_type: CollectionType,
        element_type: ValueType,
        accessor: F,
    ) -> Self
    where
        V: Into<Value>,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.plural.push(PluralAttribute {
            name,
            collection_type,
            element_type,
            accessor: Arc::new(move |instance: &T| Ok(accessor(instance).into())),
        });
        self
    }

    #[must_use]
    pub fn build(self) -> ManagedType<T> {
        ManagedType {
            name: self.name,
            singular: self.singular,
            plural: self.plural,
        }
    }

    fn singular_value(
        mut self,
        name: &'static str,
        value_type: ValueType,
        attribute_type: PersistentAttributeType,
        accessor: ValueAccessor<T>,
    ) -> Self {
        self.singular.push(SingularAttribute {
            name,
            value_type,
            attribute_type,
            access: Access::Value(accessor),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{Address, Customer};

    #[test]
    fn test_attributes_keep_registration_order() {
        let names: Vec<_> = Customer::managed_type()
            .singular_attributes()
            .iter()
            .map(SingularAttribute::name)
            .collect();
        assert_eq!(
            names,
            vec!["id", "name", "email", "age", "active", "visits", "account", "address"]
        );
        assert_eq!(Customer::managed_type().plural_attributes().len(), 2);
    }

    #[test]
    fn test_attribute_classification() {
        let mt = Customer::managed_type();
        assert_eq!(
            mt.singular_attribute("account").map(SingularAttribute::attribute_type),
            Some(PersistentAttributeType::ManyToOne)
        );
        assert_eq!(
            mt.singular_attribute("address").map(SingularAttribute::value_type),
            Some(ValueType::Embedded)
        );
        assert_eq!(
            mt.plural_attribute("badges").map(PluralAttribute::collection_type),
            Some(CollectionType::Set)
        );
        assert!(mt.singular_attribute("missing").is_none());
    }

    #[test]
    fn test_snapshot_flattens_embedded_values() {
        let customer = Customer::named("Alice")
            .with_id(1)
            .with_address(Address::in_city("Paris"))
            .with_tags(&["vip"]);
        let record = Customer::managed_type().snapshot(&customer).unwrap();

        assert_eq!(record.get(&"id".into()), &Value::Int(1));
        assert_eq!(record.get(&"address.city".into()), &Value::from("Paris"));
        assert!(record.get(&"address.street".into()).is_null());
        assert_eq!(record.get(&"tags".into()), &Value::from(vec!["vip"]));
    }

    #[test]
    fn test_snapshot_reports_failing_accessor() {
        let mut customer = Customer::named("Alice");
        customer.visits = Some(u64::MAX);
        let error = Customer::managed_type().snapshot(&customer).unwrap_err();
        assert_eq!(error.attribute.as_deref(), Some("visits"));
    }

    #[test]
    fn test_reading_embedded_attribute_as_scalar_fails() {
        let customer = Customer::named("Alice").with_address(Address::in_city("Paris"));
        let address = Customer::managed_type().singular_attribute("address").unwrap();
        assert!(address.read(&customer).is_err());
    }
}
