//! In-memory, LINQ-style query operators over an ordered sequence.
//!
//! Every load returns its documents as a [`Queryable`]. Transforming operators
//! ([`filter`](Queryable::filter), [`select`](Queryable::select),
//! [`order_by`](Queryable::order_by)) build a new sequence and leave the source untouched,
//! so chains keep the full operator set:
//!
//! ```ignore
//! use ravenlayer::prelude::*;
//!
//! let names = loaded
//!     .results
//!     .filter(|doc| doc.get("Active") == Some(true.into()))
//!     .order_by("Name")
//!     .select_field("Name");
//! ```
//!
//! Lookups ([`first`](Queryable::first), [`element_at`](Queryable::element_at),
//! [`random`](Queryable::random), ...) return `None` when nothing matches.
//! [`single`](Queryable::single) is the only operator that fails, and only when the
//! predicate matches more than one element.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    comparable::compare_values,
    document::{Document, Snapshot},
    error::{ClientError, ClientResult},
};

/// Named-field access used by [`Queryable::select_field`] and [`Queryable::order_by`].
pub trait FieldAccess {
    /// Returns a copy of the named field's value, if present.
    fn field(&self, name: &str) -> Option<Value>;
}

impl FieldAccess for Document {
    fn field(&self, name: &str) -> Option<Value> {
        self.get(name)
    }
}

impl FieldAccess for Snapshot {
    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl FieldAccess for Value {
    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

/// An owned, ordered sequence with query operators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Queryable<T> {
    items: Vec<T>,
}

impl<T> Default for Queryable<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Queryable<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True iff the sequence has no elements.
    pub fn empty(&self) -> bool {
        self.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    /// True if every element satisfies `predicate`. Vacuously true when empty.
    pub fn all(&self, predicate: impl FnMut(&T) -> bool) -> bool {
        self.items.iter().all(predicate)
    }

    /// True if at least one element satisfies `predicate`.
    pub fn any(&self, predicate: impl FnMut(&T) -> bool) -> bool {
        self.items.iter().any(predicate)
    }

    /// Alias of [`any`](Queryable::any).
    pub fn exists(&self, predicate: impl FnMut(&T) -> bool) -> bool {
        self.any(predicate)
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Number of elements satisfying `predicate`.
    pub fn count_where(&self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        self.items.iter().filter(|item| predicate(item)).count()
    }

    pub fn element_at(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn first_where(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<&T> {
        self.items.iter().find(|item| predicate(item))
    }

    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn last_where(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<&T> {
        self.items.iter().rev().find(|item| predicate(item))
    }

    /// Picks one element uniformly at random.
    pub fn random(&self) -> Option<&T> {
        self.items.choose(&mut rand::thread_rng())
    }

    /// Picks one element uniformly at random among those satisfying `predicate`.
    pub fn random_where(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<&T> {
        self.items
            .iter()
            .filter(|item| predicate(item))
            .collect::<Vec<_>>()
            .choose(&mut rand::thread_rng())
            .copied()
    }

    /// Returns the unique element satisfying `predicate`, or `None` if nothing matches.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MultipleResults`] if more than one element matches.
    pub fn single(&self, mut predicate: impl FnMut(&T) -> bool) -> ClientResult<Option<&T>> {
        let mut matches = self.items.iter().filter(|item| predicate(item));
        let found = matches.next();

        if found.is_some() && matches.next().is_some() {
            return Err(ClientError::MultipleResults);
        }

        Ok(found)
    }

    /// Projects every element through `projection`.
    pub fn select<U>(&self, projection: impl FnMut(&T) -> U) -> Queryable<U> {
        Queryable::new(self.items.iter().map(projection).collect())
    }

    /// Sorts ascending by a key extracted with `key`. The sort is stable.
    pub fn order_by_key<K: Ord>(&self, mut key: impl FnMut(&T) -> K) -> Queryable<T>
    where
        T: Clone,
    {
        let mut items = self.items.clone();
        items.sort_by_key(|item| key(item));

        Queryable::new(items)
    }
}

impl<T: Clone> Queryable<T> {
    /// Keeps the elements satisfying `predicate`, preserving order.
    #[doc(alias = "where")]
    pub fn filter(&self, mut predicate: impl FnMut(&T) -> bool) -> Queryable<T> {
        Queryable::new(
            self.items
                .iter()
                .filter(|item| predicate(item))
                .cloned()
                .collect(),
        )
    }
}

impl<T: FieldAccess + Clone> Queryable<T> {
    /// Projects every element to the value of `field`; a missing field projects to `null`.
    pub fn select_field(&self, field: &str) -> Queryable<Value> {
        self.select(|item| item.field(field).unwrap_or(Value::Null))
    }

    /// Sorts ascending by the natural ordering of `field`. Ties keep their relative order.
    pub fn order_by(&self, field: &str) -> Queryable<T> {
        let mut keyed = self
            .items
            .iter()
            .map(|item| (item.field(field), item.clone()))
            .collect::<Vec<_>>();

        keyed.sort_by(|(a, _), (b, _)| compare_values(a.as_ref(), b.as_ref()));

        Queryable::new(keyed.into_iter().map(|(_, item)| item).collect())
    }
}

impl Queryable<Document> {
    /// Returns the document with identifier `id`.
    pub fn find_by_id(&self, id: &str) -> ClientResult<Option<&Document>> {
        self.single(|doc| doc.id() == id)
    }

    /// Identifiers of all documents, in sequence order.
    pub fn ids(&self) -> Vec<String> {
        self.items.iter().map(|doc| doc.id().to_string()).collect()
    }
}

impl<T> From<Vec<T>> for Queryable<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

impl<T> FromIterator<T> for Queryable<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<T> IntoIterator for Queryable<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Queryable<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Metadata;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn doc(id: &str, fields: Value) -> Document {
        let Value::Object(fields) = fields else {
            panic!("fields must be an object");
        };
        Document::new(Metadata::new(id), fields)
    }

    fn people() -> Queryable<Document> {
        Queryable::new(vec![
            doc("people/1", json!({ "Name": "Oren", "Age": 40 })),
            doc("people/2", json!({ "Name": "Ayende", "Age": 35 })),
            doc("people/3", json!({ "Name": "Fitzchak", "Age": 35 })),
            doc("people/4", json!({ "Name": "Tal" })),
        ])
    }

    fn age(doc: &Document) -> Option<i64> {
        doc.get("Age").and_then(|v| v.as_i64())
    }

    #[test]
    fn quantifiers() {
        let people = people();

        assert!(people.any(|d| age(d) == Some(40)));
        assert!(people.exists(|d| d.id() == "people/4"));
        assert!(!people.all(|d| age(d).is_some()));
        assert!(Queryable::<Document>::default().all(|_| false));
        assert!(!Queryable::<Document>::default().any(|_| true));
    }

    #[test]
    fn counting_and_positional_access() {
        let people = people();

        assert_eq!(people.count(), 4);
        assert_eq!(people.count_where(|d| age(d) == Some(35)), 2);
        assert_eq!(people.element_at(1).map(Document::id), Some("people/2"));
        assert_eq!(people.element_at(9), None);
        assert_eq!(people.first().map(Document::id), Some("people/1"));
        assert_eq!(people.last().map(Document::id), Some("people/4"));
        assert_eq!(
            people.first_where(|d| age(d) == Some(35)).map(Document::id),
            Some("people/2")
        );
        assert_eq!(
            people.last_where(|d| age(d) == Some(35)).map(Document::id),
            Some("people/3")
        );
        assert_eq!(people.first_where(|d| age(d) == Some(99)), None);
        assert!(Queryable::<Document>::default().first().is_none());
        assert!(Queryable::<Document>::default().last().is_none());
    }

    #[test]
    fn random_picks_from_the_filtered_subset() {
        let people = people();

        for _ in 0..20 {
            let pick = people.random_where(|d| age(d) == Some(35)).unwrap();
            assert!(pick.id() == "people/2" || pick.id() == "people/3");
            assert!(people.random().is_some());
        }

        assert!(people.random_where(|d| age(d) == Some(1)).is_none());
        assert!(Queryable::<Document>::default().random().is_none());
    }

    #[test]
    fn single_law() {
        let people = people();

        assert_eq!(
            people.single(|d| age(d) == Some(40)).unwrap().map(Document::id),
            Some("people/1")
        );
        assert_eq!(people.single(|d| age(d) == Some(1)).unwrap(), None);
        assert_eq!(
            people.single(|d| age(d) == Some(35)),
            Err(ClientError::MultipleResults)
        );
    }

    #[test]
    fn find_by_id() {
        let people = people();

        assert_eq!(
            people.find_by_id("people/3").unwrap().and_then(|d| d.get("Name")),
            Some(json!("Fitzchak"))
        );
        assert!(people.find_by_id("people/7").unwrap().is_none());
    }

    #[test]
    fn filter_does_not_touch_the_source() {
        let people = people();
        let adults = people.filter(|d| age(d).is_some_and(|a| a > 36));

        assert_eq!(adults.ids(), vec!["people/1"]);
        assert_eq!(people.len(), 4);
        assert!(adults.filter(|_| false).empty());
    }

    #[test]
    fn select_projects_fields_and_closures() {
        let people = people();

        assert_eq!(
            people.select_field("Age").into_vec(),
            vec![json!(40), json!(35), json!(35), Value::Null]
        );
        assert_eq!(
            people.select(|d| d.id().len()).into_vec(),
            vec![8, 8, 8, 8]
        );
    }

    #[test]
    fn order_by_is_stable_and_ranks_missing_first() {
        let people = people();

        assert_eq!(
            people.order_by("Age").ids(),
            vec!["people/4", "people/2", "people/3", "people/1"]
        );
        assert_eq!(
            people.order_by("Name").select_field("Name").into_vec(),
            vec![json!("Ayende"), json!("Fitzchak"), json!("Oren"), json!("Tal")]
        );
        assert_eq!(
            people.order_by_key(|d| std::cmp::Reverse(d.id().to_string())).ids(),
            vec!["people/4", "people/3", "people/2", "people/1"]
        );
    }

    #[test]
    fn chains_compose() {
        let names = people()
            .filter(|d| age(d).is_some())
            .order_by("Age")
            .select_field("Name")
            .filter(|name| name != &json!("Oren"));

        assert_eq!(names.into_vec(), vec![json!("Ayende"), json!("Fitzchak")]);
    }

    fn arb_row() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i64>().prop_map(|n| json!({ "n": n })),
            any::<u64>().prop_map(|n| json!({ "n": n })),
            ((1_i64 << 53)..(1_i64 << 53) + 8).prop_map(|n| json!({ "n": n })),
            "[a-z]{0,6}".prop_map(|s| json!({ "n": s })),
            Just(json!({ "n": null })),
            Just(json!({})),
        ]
    }

    /// `a <= b` using each type's own ordering: missing and null first, then integers,
    /// then strings.
    fn natively_ordered(a: Option<&Value>, b: Option<&Value>) -> bool {
        fn rank(value: Option<&Value>) -> u8 {
            match value {
                None | Some(Value::Null) => 0,
                Some(Value::Number(_)) => 1,
                _ => 2,
            }
        }

        match (a, b) {
            (Some(Value::Number(a)), Some(Value::Number(b))) => {
                match (a.as_i64(), b.as_i64(), a.as_u64(), b.as_u64()) {
                    (Some(a), Some(b), _, _) => a <= b,
                    (_, _, Some(a), Some(b)) => a <= b,
                    // one side is negative, the other above i64::MAX
                    (Some(_), None, _, _) => true,
                    _ => false,
                }
            }
            (Some(Value::String(a)), Some(Value::String(b))) => a.as_str() <= b.as_str(),
            _ => rank(a) <= rank(b),
        }
    }

    fn numbered_rows<T: serde::Serialize>(values: &[T]) -> Queryable<Value> {
        values.iter().map(|n| json!({ "n": n })).collect()
    }

    #[test]
    fn order_by_distinguishes_integers_beyond_float_precision() {
        let ordered = Queryable::new(vec![
            json!({ "n": 9007199254740993_i64 }),
            json!({ "n": 9007199254740992_i64 }),
        ])
        .order_by("n");

        assert_eq!(
            ordered.select_field("n").into_vec(),
            vec![json!(9007199254740992_i64), json!(9007199254740993_i64)]
        );
    }

    proptest! {
        #[test]
        fn filtered_sequences_satisfy_their_predicate(values in proptest::collection::vec(any::<i32>(), 0..50), pivot in any::<i32>()) {
            let seq = Queryable::new(values.clone());
            let filtered = seq.filter(|v| *v > pivot);

            prop_assert!(filtered.all(|v| *v > pivot));
            prop_assert_eq!(filtered.count(), values.iter().filter(|v| **v > pivot).count());
            prop_assert_eq!(filtered.count(), seq.count_where(|v| *v > pivot));
        }

        #[test]
        fn order_by_yields_non_decreasing_fields(rows in proptest::collection::vec(arb_row(), 0..40)) {
            let ordered = Queryable::new(rows.clone()).order_by("n");

            prop_assert_eq!(ordered.len(), rows.len());
            for pair in ordered.as_slice().windows(2) {
                prop_assert!(
                    natively_ordered(pair[0].get("n"), pair[1].get("n")),
                    "{} sorted before {}", pair[0], pair[1]
                );
            }
        }

        #[test]
        fn order_by_on_signed_integers_matches_sorting(values in proptest::collection::vec(any::<i64>(), 0..40)) {
            let mut expected = values.clone();
            expected.sort();

            prop_assert_eq!(
                numbered_rows(&values).order_by("n").select(|row| row["n"].as_i64().unwrap()).into_vec(),
                expected
            );
        }

        #[test]
        fn order_by_on_unsigned_integers_matches_sorting(values in proptest::collection::vec(any::<u64>(), 0..40)) {
            let mut expected = values.clone();
            expected.sort();

            prop_assert_eq!(
                numbered_rows(&values).order_by("n").select(|row| row["n"].as_u64().unwrap()).into_vec(),
                expected
            );
        }
    }
}
