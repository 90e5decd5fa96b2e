//! Predicate evaluation over flattened records

use std::borrow::Cow;
use std::cmp::Ordering;

use crate::metadata::{Record, Value};
use crate::query::{Predicate, TextOperator};
use crate::repository::{OrderBy, OrderDirection};

/// Whether the record satisfies the predicate
///
/// Comparisons against null never hold.
pub(crate) fn matches(predicate: &Predicate, record: &Record) -> bool {
    match predicate {
        Predicate::Equal { path, value } => same(record.get(path), value),
        Predicate::Text {
            path,
            operator,
            value,
            case_sensitive,
        } => {
            let Some(actual) = record.get(path).as_text() else {
                return false;
            };
            let actual = if *case_sensitive {
                Cow::Borrowed(actual)
            } else {
                Cow::Owned(actual.to_lowercase())
            };
            match operator {
                TextOperator::Equal => actual == value.as_str(),
                TextOperator::Like => like(value, &actual),
            }
        }
        Predicate::MemberOf { path, values } => record.get(path).as_list().is_some_and(|items| {
            items
                .iter()
                .any(|item| values.iter().any(|value| same(item, value)))
        }),
        Predicate::And(children) => children.iter().all(|child| matches(child, record)),
    }
}

fn same(a: &Value, b: &Value) -> bool {
    !a.is_null() && !b.is_null() && a.compare(b) == Ordering::Equal
}

/// SQL LIKE: `%` matches any run of characters, `_` exactly one
pub(crate) fn like(pattern: &str, text: &str) -> bool {
    let text: Vec<char> = text.chars().collect();

    // matched[j]: the pattern prefix seen so far matches text[..j]
    let mut matched = vec![false; text.len() + 1];
    matched[0] = true;

    for p in pattern.chars() {
        let mut next = vec![false; text.len() + 1];
        if p == '%' {
            next[0] = matched[0];
        }
        for j in 1..=text.len() {
            next[j] = match p {
                '%' => next[j - 1] || matched[j],
                '_' => matched[j - 1],
                c => matched[j - 1] && text[j - 1] == c,
            };
        }
        matched = next;
    }
    matched[text.len()]
}

/// Ordering of two records under a list of ordering clauses
pub(crate) fn compare(a: &Record, b: &Record, orders: &[OrderBy]) -> Ordering {
    for order in orders {
        let ord = a.get(&order.attribute).compare(b.get(&order.attribute));
        let ord = match order.direction {
            OrderDirection::Ascending => ord,
            OrderDirection::Descending => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::AttributePath;

    fn record() -> Record {
        let mut record = Record::new();
        record.insert("name".into(), Value::from("Alice"));
        record.insert("age".into(), Value::from(30_i64));
        record.insert("tags".into(), Value::from(vec!["vip", "new"]));
        record.insert("address.city".into(), Value::from("Paris"));
        record
    }

    #[test]
    fn test_like_wildcards() {
        assert!(like("%li%", "Alice"));
        assert!(like("Al%", "Alice"));
        assert!(like("%ce", "Alice"));
        assert!(like("A_ice", "Alice"));
        assert!(like("%", ""));
        assert!(like("Alice", "Alice"));
        assert!(!like("Al", "Alice"));
        assert!(!like("_", ""));
        assert!(!like("%x%", "Alice"));
    }

    #[test]
    fn test_equality_and_nulls() {
        let record = record();
        assert!(matches(&Predicate::equal("age", 30_i64), &record));
        assert!(matches(&Predicate::equal("age", 30.0), &record));
        assert!(!matches(&Predicate::equal("email", Value::Null), &record));
        assert!(!matches(&Predicate::equal("email", "a@b.c"), &record));
    }

    #[test]
    fn test_text_case_handling() {
        let record = record();
        assert!(matches(
            &Predicate::text("name", TextOperator::Like, "%LIC%", false),
            &record
        ));
        assert!(!matches(
            &Predicate::text("name", TextOperator::Like, "%LIC%", true),
            &record
        ));
        assert!(matches(
            &Predicate::text("address.city", TextOperator::Equal, "Paris", true),
            &record
        ));
    }

    #[test]
    fn test_membership_and_conjunction() {
        let record = record();
        let vip = Predicate::member_of("tags", vec!["vip".into()]);
        let gold = Predicate::member_of("tags", vec!["gold".into()]);
        assert!(matches(&vip, &record));
        assert!(!matches(&gold, &record));

        let both = Predicate::and([vip.clone(), Predicate::equal("age", 30_i64)]).unwrap();
        assert!(matches(&both, &record));
        let neither = Predicate::and([vip, gold]).unwrap();
        assert!(!matches(&neither, &record));
    }

    #[test]
    fn test_compare_with_orders() {
        let a = record();
        let mut b = Record::new();
        b.insert(AttributePath::from("name"), Value::from("Bob"));

        let asc = [OrderBy::asc("name")];
        let desc = [OrderBy::desc("name")];
        assert_eq!(compare(&a, &b, &asc), Ordering::Less);
        assert_eq!(compare(&a, &b, &desc), Ordering::Greater);
        assert_eq!(compare(&a, &b, &[]), Ordering::Equal);
    }
}
