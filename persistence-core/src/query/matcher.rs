//! Query-by-example predicate construction
//!
//! The [`ExampleMatcher`] walks a managed type's metadata table and turns a
//! partially populated example instance into a [`Predicate`]:
//!
//! - non-null basic attributes become equality predicates
//! - non-empty textual attributes become string predicates shaped by the
//!   search mode (exact or pattern, case-sensitive or not)
//! - non-empty list attributes become membership predicates
//! - embedded values are matched recursively below their attribute path
//!
//! To-one associations are never matched here; repositories that need them
//! supply their own predicate through
//! [`RepositoryHooks::composite_key_predicate`](crate::repository::RepositoryHooks::composite_key_predicate).
//!
//! # Example
//!
//! ```rust,ignore
//! let example = Customer { name: Some("Al".into()), ..Customer::default() };
//! let search = SearchParameters::default().with_search_mode(SearchMode::Anywhere);
//!
//! let predicate = ExampleMatcher::new().match_entity(Some(&example), &search)?;
//! assert_eq!(predicate.unwrap().to_string(), "name LIKE '%Al%'");
//! ```

use tracing::trace;

use crate::metadata::{
    AttributePath, CollectionType, Managed, ManagedType, PersistentAttributeType, Value,
};
use crate::repository::{RepositoryError, RepositoryResult, SearchParameters};

use super::predicate::Predicate;

/// Builds predicates from example instances
///
/// Stateless; one instance can serve any number of concurrent callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExampleMatcher;

impl ExampleMatcher {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Predicate matching every entity that agrees with the example
    ///
    /// Returns `Ok(None)` when the example is absent or constrains nothing,
    /// which means "match everything".
    ///
    /// # Errors
    ///
    /// Fails with an `AccessorFailure` error when an attribute cannot be read
    /// off the example.
    pub fn match_entity<E: Managed>(
        &self,
        example: Option<&E>,
        search: &SearchParameters,
    ) -> RepositoryResult<Option<Predicate>> {
        let Some(example) = example else {
            return Ok(None);
        };

        let mt = E::managed_type();
        let root = AttributePath::root();
        let mut predicates = Vec::new();
        self.by_example(mt, &root, example, search, &mut predicates)?;
        self.by_example_on_embedded(mt, &root, example, search, &mut predicates)?;
        self.by_example_on_lists(mt, &root, example, &mut predicates)?;

        let predicate = Predicate::and(predicates);
        trace!(
            entity = mt.name(),
            predicate = ?predicate.as_ref().map(ToString::to_string),
            "Built predicate from example"
        );
        Ok(predicate)
    }

    /// Predicate matching an embedded value rooted at `path`
    ///
    /// Only the embeddable's singular attributes are visited; collections
    /// inside embeddables are ignored.
    ///
    /// # Errors
    ///
    /// Fails with an `AccessorFailure` error when an attribute cannot be read.
    pub fn match_embedded<A: Managed>(
        &self,
        path: &AttributePath,
        embeddable: Option<&A>,
        search: &SearchParameters,
    ) -> RepositoryResult<Option<Predicate>> {
        let Some(embeddable) = embeddable else {
            return Ok(None);
        };

        let mut predicates = Vec::new();
        self.by_example(A::managed_type(), path, embeddable, search, &mut predicates)?;
        Ok(Predicate::and(predicates))
    }

    fn by_example<T>(
        &self,
        mt: &ManagedType<T>,
        root: &AttributePath,
        example: &T,
        search: &SearchParameters,
        predicates: &mut Vec<Predicate>,
    ) -> RepositoryResult<()> {
        for attr in mt.singular_attributes() {
            if attr.attribute_type().is_to_one()
                || attr.attribute_type() == PersistentAttributeType::Embedded
            {
                continue;
            }

            let value = attr
                .read(example)
                .map_err(|e| RepositoryError::accessor_failure(mt.name(), &e))?;
            let path = root.child(attr.name());

            match value {
                Value::Null => {}
                Value::Text(text) if attr.value_type().is_textual() => {
                    if !text.is_empty() {
                        predicates.push(search.string_predicate(path, &text));
                    }
                }
                value => predicates.push(Predicate::Equal { path, value }),
            }
        }
        Ok(())
    }

    fn by_example_on_embedded<T>(
        &self,
        mt: &ManagedType<T>,
        root: &AttributePath,
        example: &T,
        search: &SearchParameters,
        predicates: &mut Vec<Predicate>,
    ) -> RepositoryResult<()> {
        for attr in mt.singular_attributes() {
            if let Some(binding) = attr.embedded() {
                let path = root.child(attr.name());
                if let Some(predicate) = (binding.matcher)(example, &path, search)? {
                    predicates.push(predicate);
                }
            }
        }
        Ok(())
    }

    /// Membership predicates for list-typed collections; sets and maps are
    /// not matched
    fn by_example_on_lists<T>(
        &self,
        mt: &ManagedType<T>,
        root: &AttributePath,
        example: &T,
        predicates: &mut Vec<Predicate>,
    ) -> RepositoryResult<()> {
        for attr in mt.plural_attributes() {
            if attr.collection_type() != CollectionType::List {
                continue;
            }

            let value = attr
                .read(example)
                .map_err(|e| RepositoryError::accessor_failure(mt.name(), &e))?;
            if let Value::List(values) = value {
                if !values.is_empty() {
                    predicates.push(Predicate::member_of(root.child(attr.name()), values));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{Address, Customer};
    use crate::query::TextOperator;
    use crate::repository::{RepositoryErrorKind, SearchMode};

    fn exact() -> SearchParameters {
        SearchParameters::default()
    }

    fn anywhere() -> SearchParameters {
        SearchParameters::default().with_search_mode(SearchMode::Anywhere)
    }

    #[test]
    fn test_absent_example_matches_everything() {
        let predicate = ExampleMatcher::new()
            .match_entity::<Customer>(None, &exact())
            .unwrap();
        assert!(predicate.is_none());
    }

    #[test]
    fn test_unpopulated_example_matches_everything() {
        let predicate = ExampleMatcher::new()
            .match_entity(Some(&Customer::default()), &exact())
            .unwrap();
        assert!(predicate.is_none());
    }

    #[test]
    fn test_scalar_attribute_becomes_equality() {
        let example = Customer {
            age: Some(42),
            ..Customer::default()
        };
        let predicate = ExampleMatcher::new()
            .match_entity(Some(&example), &exact())
            .unwrap();
        assert_eq!(predicate, Some(Predicate::equal("age", 42_i64)));
    }

    #[test]
    fn test_exact_mode_uses_text_equality() {
        let predicate = ExampleMatcher::new()
            .match_entity(Some(&Customer::named("Alice")), &exact())
            .unwrap();
        assert_eq!(
            predicate,
            Some(Predicate::text("name", TextOperator::Equal, "Alice", true))
        );
    }

    #[test]
    fn test_pattern_mode_wraps_wildcards() {
        let predicate = ExampleMatcher::new()
            .match_entity(Some(&Customer::named("Al")), &anywhere())
            .unwrap()
            .unwrap();
        assert_eq!(predicate.to_string(), "name LIKE '%Al%'");
    }

    #[test]
    fn test_case_insensitive_pattern() {
        let search = anywhere().with_case_sensitive(false);
        let predicate = ExampleMatcher::new()
            .match_entity(Some(&Customer::named("AL")), &search)
            .unwrap()
            .unwrap();
        assert_eq!(predicate.to_string(), "lower(name) LIKE '%al%'");
    }

    #[test]
    fn test_empty_string_is_unconstrained() {
        let example = Customer {
            name: Some(String::new()),
            email: Some(String::new()),
            ..Customer::default()
        };
        let predicate = ExampleMatcher::new()
            .match_entity(Some(&example), &anywhere())
            .unwrap();
        assert!(predicate.is_none());
    }

    #[test]
    fn test_to_one_association_is_skipped() {
        let example = Customer {
            account: Some(7),
            ..Customer::default()
        };
        let predicate = ExampleMatcher::new()
            .match_entity(Some(&example), &exact())
            .unwrap();
        assert!(predicate.is_none());
    }

    #[test]
    fn test_non_empty_list_becomes_membership() {
        let example = Customer::default().with_tags(&["vip"]);
        let predicate = ExampleMatcher::new()
            .match_entity(Some(&example), &exact())
            .unwrap();
        assert_eq!(
            predicate,
            Some(Predicate::member_of("tags", vec!["vip".into()]))
        );
    }

    #[test]
    fn test_empty_list_is_unconstrained() {
        let example = Customer::default().with_tags(&[]);
        let predicate = ExampleMatcher::new()
            .match_entity(Some(&example), &exact())
            .unwrap();
        assert!(predicate.is_none());
    }

    #[test]
    fn test_set_collections_are_ignored() {
        let example = Customer {
            badges: Some(vec!["gold".to_string()]),
            ..Customer::default()
        };
        let predicate = ExampleMatcher::new()
            .match_entity(Some(&example), &exact())
            .unwrap();
        assert!(predicate.is_none());
    }

    #[test]
    fn test_embedded_value_is_matched_below_its_path() {
        let example = Customer::default().with_address(Address::in_city("Paris"));
        let predicate = ExampleMatcher::new()
            .match_entity(Some(&example), &exact())
            .unwrap()
            .unwrap();
        assert_eq!(predicate.to_string(), "address.city = 'Paris'");
    }

    #[test]
    fn test_match_embedded_directly() {
        let address = Address {
            street: Some("Rue de Rivoli".to_string()),
            city: Some("Paris".to_string()),
            zip: None,
        };
        let predicate = ExampleMatcher::new()
            .match_embedded(&AttributePath::from("billing"), Some(&address), &exact())
            .unwrap()
            .unwrap();
        assert_eq!(
            predicate.to_string(),
            "billing.street = 'Rue de Rivoli' AND billing.city = 'Paris'"
        );
        assert!(ExampleMatcher::new()
            .match_embedded::<Address>(&AttributePath::from("billing"), None, &exact())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_all_leaves_are_conjoined() {
        let example = Customer::named("Alice")
            .with_tags(&["vip", "new"])
            .with_address(Address::in_city("Paris"));
        let predicate = ExampleMatcher::new()
            .match_entity(Some(&example), &exact())
            .unwrap()
            .unwrap();
        assert_eq!(
            predicate.to_string(),
            "name = 'Alice' AND address.city = 'Paris' AND tags IN ('vip', 'new')"
        );
    }

    #[test]
    fn test_failing_accessor_is_fatal() {
        let example = Customer {
            visits: Some(u64::MAX),
            ..Customer::default()
        };
        let error = ExampleMatcher::new()
            .match_entity(Some(&example), &exact())
            .unwrap_err();
        assert_eq!(error.kind, RepositoryErrorKind::AccessorFailure);
        assert_eq!(error.entity_type.as_deref(), Some("Customer"));
    }

    #[test]
    fn test_example_is_left_untouched() {
        let example = Customer::named("Alice").with_tags(&["vip"]);
        let before = example.clone();
        ExampleMatcher::new()
            .match_entity(Some(&example), &anywhere())
            .unwrap();
        assert_eq!(example, before);
    }
}
