//! Reversible mutation records.
//!
//! Each change targets a field of a model `M` through an accessor
//! (`fn(&mut M) -> &mut C`), performs its mutation in [`TrackableChange::apply`]
//! and undoes it exactly in [`TrackableChange::rollback`] using only the state
//! it captured while applying. An accessor is a plain function pointer, so a
//! change can never be built without a target.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::hash::Hash;

use crate::error::DomainError;

/// Accessor from a model to one of its fields.
pub type Field<M, T> = fn(&mut M) -> &mut T;

/// The variant of a trackable change, for enumeration and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// A property was assigned.
    PropertySet,
    /// An item was added to a collection.
    ItemAdded,
    /// An item was removed from a collection.
    ItemRemoved,
    /// An item was inserted into a sequence at an index.
    ItemInserted,
    /// The item at an index was removed from a sequence.
    ItemRemovedAt,
    /// The item at an index was replaced.
    IndexUpdated,
    /// A collection was emptied.
    CollectionCleared,
    /// A sequence was reordered.
    CollectionSorted,
    /// A domain-specific change.
    Custom(&'static str),
}

/// A mutation that knows how to undo itself.
pub trait TrackableChange<M>: Send {
    /// Performs the mutation on `model`.
    fn apply(&mut self, model: &mut M);

    /// Performs the exact inverse of [`Self::apply`].
    fn rollback(&mut self, model: &mut M);

    /// The variant of this change.
    fn kind(&self) -> ChangeKind;
}

impl<M> fmt::Debug for dyn TrackableChange<M> + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind())
    }
}

/// A collection that items can be added to and removed from by value, and
/// that can put a removed item back exactly where it was.
pub trait TrackedCollection<T> {
    /// Where a removed item sat.
    type Position: Send;

    /// Adds `item`. Returns false when the collection already held it and
    /// is unchanged.
    fn add_item(&mut self, item: T) -> bool;

    /// Removes one occurrence of `item`, returning it with its position.
    fn remove_item(&mut self, item: &T) -> Option<(T, Self::Position)>;

    /// Puts back an item taken out by `remove_item`.
    fn restore_item(&mut self, item: T, position: Self::Position);
}

impl<T: PartialEq> TrackedCollection<T> for Vec<T> {
    type Position = usize;

    fn add_item(&mut self, item: T) -> bool {
        self.push(item);
        true
    }

    fn remove_item(&mut self, item: &T) -> Option<(T, usize)> {
        let index = self.iter().rposition(|existing| existing == item)?;
        Some((self.remove(index), index))
    }

    fn restore_item(&mut self, item: T, position: usize) {
        let index = position.min(self.len());
        self.insert(index, item);
    }
}

impl<T: Eq + Hash> TrackedCollection<T> for HashSet<T> {
    type Position = ();

    fn add_item(&mut self, item: T) -> bool {
        self.insert(item)
    }

    fn remove_item(&mut self, item: &T) -> Option<(T, ())> {
        self.take(item).map(|taken| (taken, ()))
    }

    fn restore_item(&mut self, item: T, (): ()) {
        self.insert(item);
    }
}

impl<T: Ord> TrackedCollection<T> for BTreeSet<T> {
    type Position = ();

    fn add_item(&mut self, item: T) -> bool {
        self.insert(item)
    }

    fn remove_item(&mut self, item: &T) -> Option<(T, ())> {
        self.take(item).map(|taken| (taken, ()))
    }

    fn restore_item(&mut self, item: T, (): ()) {
        self.insert(item);
    }
}

/// Assigns a property, restoring the prior value on rollback.
pub struct PropertySet<M, T> {
    field: Field<M, T>,
    value: Option<T>,
    prior: Option<T>,
}

impl<M, T> PropertySet<M, T> {
    /// Sets `field` to `value`.
    #[must_use]
    pub fn new(field: Field<M, T>, value: T) -> Self {
        Self {
            field,
            value: Some(value),
            prior: None,
        }
    }
}

impl<M, T: Send> TrackableChange<M> for PropertySet<M, T> {
    fn apply(&mut self, model: &mut M) {
        if let Some(value) = self.value.take() {
            self.prior = Some(std::mem::replace((self.field)(model), value));
        }
    }

    fn rollback(&mut self, model: &mut M) {
        if let Some(prior) = self.prior.take() {
            self.value = Some(std::mem::replace((self.field)(model), prior));
        }
    }

    fn kind(&self) -> ChangeKind {
        ChangeKind::PropertySet
    }
}

/// Adds an item to a collection, removing it again on rollback. Adding an
/// item a set already holds is a no-op both ways.
pub struct ItemAdded<M, C, T> {
    field: Field<M, C>,
    item: T,
    inserted: bool,
}

impl<M, C, T> ItemAdded<M, C, T> {
    /// Adds `item` to `field`.
    #[must_use]
    pub fn new(field: Field<M, C>, item: T) -> Self {
        Self {
            field,
            item,
            inserted: false,
        }
    }
}

impl<M, C, T> TrackableChange<M> for ItemAdded<M, C, T>
where
    C: TrackedCollection<T>,
    T: Clone + Send,
{
    fn apply(&mut self, model: &mut M) {
        self.inserted = (self.field)(model).add_item(self.item.clone());
    }

    fn rollback(&mut self, model: &mut M) {
        if std::mem::take(&mut self.inserted) {
            (self.field)(model).remove_item(&self.item);
        }
    }

    fn kind(&self) -> ChangeKind {
        ChangeKind::ItemAdded
    }
}

/// Removes an item from a collection, restoring it at its old position on
/// rollback.
pub struct ItemRemoved<M, C: TrackedCollection<T>, T> {
    field: Field<M, C>,
    item: T,
    removed: Option<(T, C::Position)>,
}

impl<M, C: TrackedCollection<T>, T> ItemRemoved<M, C, T> {
    /// Removes `item` from `field`.
    #[must_use]
    pub fn new(field: Field<M, C>, item: T) -> Self {
        Self {
            field,
            item,
            removed: None,
        }
    }

    /// True when the last apply found and removed the item.
    #[must_use]
    pub fn was_removed(&self) -> bool {
        self.removed.is_some()
    }
}

impl<M, C, T> TrackableChange<M> for ItemRemoved<M, C, T>
where
    C: TrackedCollection<T>,
    T: Send,
{
    fn apply(&mut self, model: &mut M) {
        self.removed = (self.field)(model).remove_item(&self.item);
    }

    fn rollback(&mut self, model: &mut M) {
        if let Some((item, position)) = self.removed.take() {
            (self.field)(model).restore_item(item, position);
        }
    }

    fn kind(&self) -> ChangeKind {
        ChangeKind::ItemRemoved
    }
}

/// Inserts an item at an index, removing it from that index on rollback.
pub struct ItemInserted<M, T> {
    field: Field<M, Vec<T>>,
    index: usize,
    item: Option<T>,
}

impl<M, T> ItemInserted<M, T> {
    /// Inserts `item` at `index` of the sequence currently held by `field`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::IndexOutOfRange` if `index > len`.
    pub fn new(field: Field<M, Vec<T>>, len: usize, index: usize, item: T) -> Result<Self, DomainError> {
        if index > len {
            return Err(DomainError::IndexOutOfRange { index, len });
        }
        Ok(Self {
            field,
            index,
            item: Some(item),
        })
    }
}

impl<M, T: Send> TrackableChange<M> for ItemInserted<M, T> {
    fn apply(&mut self, model: &mut M) {
        if let Some(item) = self.item.take() {
            (self.field)(model).insert(self.index, item);
        }
    }

    fn rollback(&mut self, model: &mut M) {
        let sequence = (self.field)(model);
        if self.item.is_none() && self.index < sequence.len() {
            self.item = Some(sequence.remove(self.index));
        }
    }

    fn kind(&self) -> ChangeKind {
        ChangeKind::ItemInserted
    }
}

/// Removes the item at an index, re-inserting it there on rollback.
pub struct ItemRemovedAt<M, T> {
    field: Field<M, Vec<T>>,
    index: usize,
    removed: Option<T>,
}

impl<M, T> ItemRemovedAt<M, T> {
    /// Removes the item at `index` of the sequence currently held by `field`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::IndexOutOfRange` if `index >= len`.
    pub fn new(field: Field<M, Vec<T>>, len: usize, index: usize) -> Result<Self, DomainError> {
        if index >= len {
            return Err(DomainError::IndexOutOfRange { index, len });
        }
        Ok(Self {
            field,
            index,
            removed: None,
        })
    }
}

impl<M, T: Send> TrackableChange<M> for ItemRemovedAt<M, T> {
    fn apply(&mut self, model: &mut M) {
        let sequence = (self.field)(model);
        if self.index < sequence.len() {
            self.removed = Some(sequence.remove(self.index));
        }
    }

    fn rollback(&mut self, model: &mut M) {
        if let Some(item) = self.removed.take() {
            (self.field)(model).insert(self.index, item);
        }
    }

    fn kind(&self) -> ChangeKind {
        ChangeKind::ItemRemovedAt
    }
}

/// Replaces the item at an index, restoring the original on rollback.
pub struct IndexUpdated<M, T> {
    field: Field<M, Vec<T>>,
    index: usize,
    value: Option<T>,
    original: Option<T>,
}

impl<M, T> IndexUpdated<M, T> {
    /// Replaces the item at `index` of the sequence currently held by `field`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::IndexOutOfRange` if `index >= len`.
    pub fn new(field: Field<M, Vec<T>>, len: usize, index: usize, value: T) -> Result<Self, DomainError> {
        if index >= len {
            return Err(DomainError::IndexOutOfRange { index, len });
        }
        Ok(Self {
            field,
            index,
            value: Some(value),
            original: None,
        })
    }
}

impl<M, T: Send> TrackableChange<M> for IndexUpdated<M, T> {
    fn apply(&mut self, model: &mut M) {
        let sequence = (self.field)(model);
        if let (Some(value), Some(slot)) = (self.value.take(), sequence.get_mut(self.index)) {
            self.original = Some(std::mem::replace(slot, value));
        }
    }

    fn rollback(&mut self, model: &mut M) {
        let sequence = (self.field)(model);
        if let (Some(original), Some(slot)) = (self.original.take(), sequence.get_mut(self.index)) {
            self.value = Some(std::mem::replace(slot, original));
        }
    }

    fn kind(&self) -> ChangeKind {
        ChangeKind::IndexUpdated
    }
}

/// Empties a collection, restoring the full original contents on rollback.
pub struct CollectionCleared<M, C> {
    field: Field<M, C>,
    snapshot: Option<C>,
}

impl<M, C> CollectionCleared<M, C> {
    /// Clears `field`.
    #[must_use]
    pub fn new(field: Field<M, C>) -> Self {
        Self {
            field,
            snapshot: None,
        }
    }
}

impl<M, C: Default + Send> TrackableChange<M> for CollectionCleared<M, C> {
    fn apply(&mut self, model: &mut M) {
        self.snapshot = Some(std::mem::take((self.field)(model)));
    }

    fn rollback(&mut self, model: &mut M) {
        if let Some(snapshot) = self.snapshot.take() {
            *(self.field)(model) = snapshot;
        }
    }

    fn kind(&self) -> ChangeKind {
        ChangeKind::CollectionCleared
    }
}

/// Comparator used by [`CollectionSorted`].
pub type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering + Send>;

/// Sorts a sequence, restoring the original order on rollback.
pub struct CollectionSorted<M, T> {
    field: Field<M, Vec<T>>,
    compare: Comparator<T>,
    snapshot: Option<Vec<T>>,
}

impl<M, T: Ord + 'static> CollectionSorted<M, T> {
    /// Sorts `field` by the natural order of its items.
    #[must_use]
    pub fn new(field: Field<M, Vec<T>>) -> Self {
        Self::by(field, Box::new(T::cmp))
    }
}

impl<M, T> CollectionSorted<M, T> {
    /// Sorts `field` with `compare`.
    #[must_use]
    pub fn by(field: Field<M, Vec<T>>, compare: Comparator<T>) -> Self {
        Self {
            field,
            compare,
            snapshot: None,
        }
    }
}

impl<M, T: Clone + Send> TrackableChange<M> for CollectionSorted<M, T> {
    fn apply(&mut self, model: &mut M) {
        let sequence = (self.field)(model);
        self.snapshot = Some(sequence.clone());
        sequence.sort_by(|a, b| (self.compare)(a, b));
    }

    fn rollback(&mut self, model: &mut M) {
        if let Some(snapshot) = self.snapshot.take() {
            *(self.field)(model) = snapshot;
        }
    }

    fn kind(&self) -> ChangeKind {
        ChangeKind::CollectionSorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Model {
        name: String,
        tags: HashSet<String>,
        ordered: BTreeSet<u32>,
        slots: Vec<u32>,
    }

    fn model() -> Model {
        Model {
            name: "before".to_owned(),
            tags: HashSet::from(["a".to_owned()]),
            ordered: BTreeSet::from([1, 2]),
            slots: vec![3, 1, 2],
        }
    }

    fn round_trip(change: &mut dyn TrackableChange<Model>, expected_after: impl Fn(&Model)) {
        let original = model();
        let mut m = original.clone();

        change.apply(&mut m);
        expected_after(&m);
        change.rollback(&mut m);

        assert_eq!(m, original);
    }

    #[test]
    fn test_property_set_restores_prior_value() {
        let mut change = PropertySet::new(|m: &mut Model| &mut m.name, "after".to_owned());
        round_trip(&mut change, |m| assert_eq!(m.name, "after"));
        assert_eq!(TrackableChange::<Model>::kind(&change), ChangeKind::PropertySet);
    }

    #[test]
    fn test_item_added_is_removed_on_rollback() {
        let mut change = ItemAdded::new(|m: &mut Model| &mut m.tags, "b".to_owned());
        round_trip(&mut change, |m| assert!(m.tags.contains("b")));
    }

    #[test]
    fn test_item_removed_is_readded_on_rollback() {
        let mut change = ItemRemoved::new(|m: &mut Model| &mut m.ordered, 2_u32);
        round_trip(&mut change, |m| assert!(!m.ordered.contains(&2)));
    }

    #[test]
    fn test_item_removed_when_absent_rolls_back_to_nothing() {
        // Arrange
        let mut m = model();
        let mut change = ItemRemoved::new(|m: &mut Model| &mut m.tags, "missing".to_owned());

        // Act
        change.apply(&mut m);
        let removed = change.was_removed();
        change.rollback(&mut m);

        // Assert
        assert!(!removed);
        assert_eq!(m, model());
    }

    #[test]
    fn test_vec_add_removes_last_occurrence_on_rollback() {
        // Arrange
        let mut m = Model {
            slots: vec![1, 2, 1],
            ..Model::default()
        };
        let mut change = ItemAdded::new(|m: &mut Model| &mut m.slots, 1_u32);

        // Act
        change.apply(&mut m);
        change.rollback(&mut m);

        // Assert
        assert_eq!(m.slots, vec![1, 2, 1]);
    }

    #[test]
    fn test_duplicate_set_add_keeps_item_on_rollback() {
        // Arrange
        let mut m = model();
        let mut change = ItemAdded::new(|m: &mut Model| &mut m.tags, "a".to_owned());

        // Act
        change.apply(&mut m);
        change.rollback(&mut m);

        // Assert
        assert_eq!(m.tags, HashSet::from(["a".to_owned()]));
    }

    #[test]
    fn test_vec_remove_restores_original_position() {
        // Arrange
        let mut m = Model {
            slots: vec![1, 2, 3],
            ..Model::default()
        };
        let mut change = ItemRemoved::new(|m: &mut Model| &mut m.slots, 1_u32);

        // Act
        change.apply(&mut m);
        let applied = m.slots.clone();
        change.rollback(&mut m);

        // Assert
        assert_eq!(applied, vec![2, 3]);
        assert_eq!(m.slots, vec![1, 2, 3]);
    }

    #[test]
    fn test_item_inserted_is_removed_at_index_on_rollback() {
        let mut change = ItemInserted::new(|m: &mut Model| &mut m.slots, 3, 1, 9).unwrap();
        round_trip(&mut change, |m| assert_eq!(m.slots, vec![3, 9, 1, 2]));
    }

    #[test]
    fn test_item_inserted_rejects_index_past_end() {
        let result = ItemInserted::new(|m: &mut Model| &mut m.slots, 3, 4, 9);
        assert!(matches!(
            result,
            Err(DomainError::IndexOutOfRange { index: 4, len: 3 })
        ));
    }

    #[test]
    fn test_item_removed_at_is_reinserted_on_rollback() {
        let mut change = ItemRemovedAt::new(|m: &mut Model| &mut m.slots, 3, 0).unwrap();
        round_trip(&mut change, |m| assert_eq!(m.slots, vec![1, 2]));
    }

    #[test]
    fn test_item_removed_at_rejects_index_at_len() {
        let result = ItemRemovedAt::<Model, u32>::new(|m: &mut Model| &mut m.slots, 3, 3);
        assert!(matches!(
            result,
            Err(DomainError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_index_updated_restores_original() {
        let mut change = IndexUpdated::new(|m: &mut Model| &mut m.slots, 3, 2, 7).unwrap();
        round_trip(&mut change, |m| assert_eq!(m.slots, vec![3, 1, 7]));
    }

    #[test]
    fn test_collection_cleared_restores_contents() {
        let mut change = CollectionCleared::new(|m: &mut Model| &mut m.tags);
        round_trip(&mut change, |m| assert!(m.tags.is_empty()));
    }

    #[test]
    fn test_collection_sorted_restores_order() {
        let mut change = CollectionSorted::new(|m: &mut Model| &mut m.slots);
        round_trip(&mut change, |m| assert_eq!(m.slots, vec![1, 2, 3]));
    }

    #[test]
    fn test_collection_sorted_by_comparator() {
        let mut change =
            CollectionSorted::by(|m: &mut Model| &mut m.slots, Box::new(|a: &u32, b: &u32| b.cmp(a)));
        round_trip(&mut change, |m| assert_eq!(m.slots, vec![3, 2, 1]));
    }

    #[test]
    fn test_reapply_after_rollback_repeats_mutation() {
        // Arrange
        let mut m = model();
        let mut change = PropertySet::new(|m: &mut Model| &mut m.name, "after".to_owned());

        // Act
        change.apply(&mut m);
        change.rollback(&mut m);
        change.apply(&mut m);

        // Assert
        assert_eq!(m.name, "after");
    }
}
