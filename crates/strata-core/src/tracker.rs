//! Change buffering and the validate-or-rollback transaction boundary.

use std::cmp::Ordering;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::change::{
    ChangeKind, CollectionCleared, CollectionSorted, Field, IndexUpdated, ItemAdded,
    ItemInserted, ItemRemoved, ItemRemovedAt, PropertySet, TrackableChange, TrackedCollection,
};
use crate::error::DomainError;
use crate::validation::{ValidationResult, Validator};

/// How the tracker treats a newly added change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingMode {
    /// Buffer the change and complete the batch right away.
    #[default]
    Immediate,
    /// Buffer the change and wait for an explicit `process`.
    Buffering,
    /// Apply the change without buffering it; used while replaying history.
    Initializing,
}

/// A stack of applied changes that can be undone newest-first.
pub struct ChangeTracker<M> {
    changes: Vec<Box<dyn TrackableChange<M>>>,
    mode: TrackingMode,
}

impl<M> ChangeTracker<M> {
    /// Creates an empty tracker in `Immediate` mode.
    #[must_use]
    pub fn new() -> Self {
        Self {
            changes: Vec::new(),
            mode: TrackingMode::Immediate,
        }
    }

    /// Applies `change` to `model` and, unless initializing, pushes it onto
    /// the stack.
    ///
    /// Returns true when the current mode requires the batch to be completed
    /// now (`Immediate`).
    pub fn add(&mut self, model: &mut M, mut change: Box<dyn TrackableChange<M>>) -> bool {
        change.apply(model);
        match self.mode {
            TrackingMode::Initializing => false,
            TrackingMode::Buffering => {
                self.changes.push(change);
                false
            }
            TrackingMode::Immediate => {
                self.changes.push(change);
                true
            }
        }
    }

    /// Switches to `Buffering` mode.
    pub fn buffer_changes(&mut self) {
        self.mode = TrackingMode::Buffering;
    }

    /// Switches to `Initializing` mode.
    pub fn initialize(&mut self) {
        self.mode = TrackingMode::Initializing;
    }

    /// Switches back to `Immediate` mode.
    pub fn immediate(&mut self) {
        self.mode = TrackingMode::Immediate;
    }

    /// The current mode.
    #[must_use]
    pub fn mode(&self) -> TrackingMode {
        self.mode
    }

    /// Number of buffered changes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// True when nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Buffered changes, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &dyn TrackableChange<M>> {
        self.changes
            .iter()
            .rev()
            .map(|change| &**change as &dyn TrackableChange<M>)
    }

    /// Undoes every buffered change newest-first, leaving the stack empty.
    pub fn rollback(&mut self, model: &mut M) {
        while let Some(mut change) = self.changes.pop() {
            change.rollback(model);
        }
    }

    /// Forgets the buffered changes, keeping their effects.
    pub fn clear(&mut self) {
        self.changes.clear();
    }
}

impl<M> Default for ChangeTracker<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for ChangeTracker<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeTracker")
            .field("mode", &self.mode)
            .field("changes", &self.iter().map(|c| c.kind()).collect::<Vec<_>>())
            .finish()
    }
}

/// Tracker state guarded by the [`ModelChangeTracker`] lock.
pub struct TrackerState<M> {
    model: Option<M>,
    validator: Option<Box<dyn Validator<M>>>,
    changes: ChangeTracker<M>,
}

impl<M> TrackerState<M> {
    /// The bound model.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::TrackerNotInitialized` before `init`.
    pub fn model(&self) -> Result<&M, DomainError> {
        self.model.as_ref().ok_or(DomainError::TrackerNotInitialized)
    }

    /// The underlying change stack.
    pub fn changes(&mut self) -> &mut ChangeTracker<M> {
        &mut self.changes
    }

    /// Opens a mutation scope over the bound model.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::TrackerNotInitialized` before `init`.
    pub(crate) fn scope(&mut self) -> Result<ChangeScope<'_, M>, DomainError> {
        let model = self.model.as_mut().ok_or(DomainError::TrackerNotInitialized)?;
        Ok(ChangeScope {
            model,
            changes: &mut self.changes,
        })
    }

    /// Validates the model against the buffered changes, rolling them back
    /// unless the result is valid. The buffer is empty on every exit path.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::TrackerNotInitialized` before `init`, or the
    /// validator's own error after rolling back.
    pub fn process(&mut self) -> Result<ValidationResult, DomainError> {
        self.changes.immediate();
        let (Some(model), Some(validator)) = (self.model.as_mut(), self.validator.as_ref()) else {
            return Err(DomainError::TrackerNotInitialized);
        };

        match validator.validate(model) {
            Ok(result) if result.is_valid() => {
                debug!(changes = self.changes.len(), "change batch accepted");
                self.changes.clear();
                Ok(result)
            }
            Ok(result) => {
                warn!(changes = self.changes.len(), %result, "change batch rejected, rolling back");
                self.changes.rollback(model);
                Ok(result)
            }
            Err(error) => {
                warn!(changes = self.changes.len(), %error, "validator failed, rolling back");
                self.changes.rollback(model);
                Err(error)
            }
        }
    }

    /// Validates the bound model without touching the buffer.
    pub(crate) fn validate(&self) -> Result<ValidationResult, DomainError> {
        let (Some(model), Some(validator)) = (self.model.as_ref(), self.validator.as_ref()) else {
            return Err(DomainError::TrackerNotInitialized);
        };
        validator.validate(model)
    }

    /// Undoes whatever is buffered and returns to `Immediate` mode.
    pub(crate) fn abandon(&mut self) {
        if let Some(model) = self.model.as_mut() {
            self.changes.rollback(model);
        } else {
            self.changes.clear();
        }
        self.changes.immediate();
    }
}

/// A [`ChangeTracker`] bound to a model and a validator.
///
/// All access goes through an internal mutex, so concurrent `process` calls
/// on a shared tracker cannot interleave their rollbacks.
pub struct ModelChangeTracker<M> {
    state: Mutex<TrackerState<M>>,
}

impl<M: 'static> ModelChangeTracker<M> {
    /// Creates an unbound tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TrackerState {
                model: None,
                validator: None,
                changes: ChangeTracker::new(),
            }),
        }
    }

    /// Binds `model` and `validator`. A tracker can be bound only once.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::TrackerAlreadyInitialized` on a second call.
    pub fn init(&self, model: M, validator: impl Validator<M> + 'static) -> Result<(), DomainError> {
        let mut state = self.lock();
        if state.model.is_some() {
            return Err(DomainError::TrackerAlreadyInitialized);
        }
        state.model = Some(model);
        state.validator = Some(Box::new(validator));
        Ok(())
    }

    /// True once `init` has succeeded.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.lock().model.is_some()
    }

    /// Applies `change`; in `Immediate` mode the batch is processed at once
    /// and its result returned.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::TrackerNotInitialized` before `init`, or the
    /// validator's error when processing.
    pub fn add(
        &self,
        change: impl TrackableChange<M> + 'static,
    ) -> Result<Option<ValidationResult>, DomainError> {
        let mut state = self.lock();
        let complete = state.scope()?.push(Box::new(change));
        if complete {
            state.process().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Validates the model, rolling back every buffered change if it is
    /// invalid or if the validator fails. The buffer is always empty
    /// afterwards and the mode is `Immediate`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::TrackerNotInitialized` before `init`, or the
    /// validator's own error after rolling back.
    pub fn process(&self) -> Result<ValidationResult, DomainError> {
        self.lock().process()
    }

    /// Runs `f` with changes buffered, then processes them as one batch.
    /// An error from `f` unwinds the changes it made before returning.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, `DomainError::TrackerNotInitialized`
    /// before `init`, or the validator's error.
    pub fn batch<F>(&self, f: F) -> Result<ValidationResult, DomainError>
    where
        F: FnOnce(&mut ChangeScope<'_, M>) -> Result<(), DomainError>,
    {
        let mut state = self.lock();
        state.changes.buffer_changes();
        let outcome = state.scope().and_then(|mut scope| f(&mut scope));
        if let Err(error) = outcome {
            state.abandon();
            return Err(error);
        }
        state.process()
    }

    /// Switches to `Buffering` mode.
    pub fn buffer_changes(&self) {
        self.lock().changes.buffer_changes();
    }

    /// Switches to `Initializing` mode.
    pub fn initialize(&self) {
        self.lock().changes.initialize();
    }

    /// The current mode.
    #[must_use]
    pub fn mode(&self) -> TrackingMode {
        self.lock().changes.mode()
    }

    /// Number of buffered changes.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock().changes.len()
    }

    /// Kinds of the buffered changes, newest first.
    #[must_use]
    pub fn pending_kinds(&self) -> Vec<ChangeKind> {
        self.lock().changes.iter().map(|c| c.kind()).collect()
    }

    /// Reads the bound model.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::TrackerNotInitialized` before `init`.
    pub fn read<R>(&self, f: impl FnOnce(&M) -> R) -> Result<R, DomainError> {
        self.lock().model().map(f)
    }

    /// Takes the tracker lock.
    pub fn lock(&self) -> MutexGuard<'_, TrackerState<M>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<M: 'static> Default for ModelChangeTracker<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: fmt::Debug + 'static> fmt::Debug for ModelChangeTracker<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ModelChangeTracker")
            .field("model", &state.model)
            .field("changes", &state.changes)
            .finish_non_exhaustive()
    }
}

/// Mutation handle over a bound model.
///
/// Every method records a trackable change through the tracker, so whatever
/// a handler does here can be rolled back.
pub struct ChangeScope<'a, M> {
    model: &'a mut M,
    changes: &'a mut ChangeTracker<M>,
}

impl<M: 'static> ChangeScope<'_, M> {
    /// Read access to the model as of the changes made so far.
    #[must_use]
    pub fn model(&self) -> &M {
        &*self.model
    }

    fn push(&mut self, change: Box<dyn TrackableChange<M>>) -> bool {
        self.changes.add(self.model, change)
    }

    /// Applies a custom change.
    pub fn record(&mut self, change: impl TrackableChange<M> + 'static) {
        self.push(Box::new(change));
    }

    /// Assigns `value` to `field`.
    pub fn set<T: Send + 'static>(&mut self, field: Field<M, T>, value: T) {
        self.record(PropertySet::new(field, value));
    }

    /// Adds `item` to the collection at `field`.
    pub fn add_item<C, T>(&mut self, field: Field<M, C>, item: T)
    where
        C: TrackedCollection<T> + 'static,
        T: Clone + Send + 'static,
    {
        self.record(ItemAdded::new(field, item));
    }

    /// Removes `item` from the collection at `field`.
    pub fn remove_item<C, T>(&mut self, field: Field<M, C>, item: T)
    where
        C: TrackedCollection<T> + 'static,
        T: Send + 'static,
    {
        self.record(ItemRemoved::new(field, item));
    }

    /// Inserts `item` at `index` of the sequence at `field`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::IndexOutOfRange` if `index` is past the end.
    pub fn insert_at<T: Send + 'static>(
        &mut self,
        field: Field<M, Vec<T>>,
        index: usize,
        item: T,
    ) -> Result<(), DomainError> {
        let len = field(self.model).len();
        self.record(ItemInserted::new(field, len, index, item)?);
        Ok(())
    }

    /// Removes the item at `index` of the sequence at `field`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::IndexOutOfRange` if there is no item at `index`.
    pub fn remove_at<T: Send + 'static>(
        &mut self,
        field: Field<M, Vec<T>>,
        index: usize,
    ) -> Result<(), DomainError> {
        let len = field(self.model).len();
        self.record(ItemRemovedAt::new(field, len, index)?);
        Ok(())
    }

    /// Replaces the item at `index` of the sequence at `field`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::IndexOutOfRange` if there is no item at `index`.
    pub fn update_at<T: Send + 'static>(
        &mut self,
        field: Field<M, Vec<T>>,
        index: usize,
        value: T,
    ) -> Result<(), DomainError> {
        let len = field(self.model).len();
        self.record(IndexUpdated::new(field, len, index, value)?);
        Ok(())
    }

    /// Empties the collection at `field`.
    pub fn clear<C: Default + Send + 'static>(&mut self, field: Field<M, C>) {
        self.record(CollectionCleared::new(field));
    }

    /// Sorts the sequence at `field` by natural order.
    pub fn sort<T: Ord + Clone + Send + 'static>(&mut self, field: Field<M, Vec<T>>) {
        self.record(CollectionSorted::new(field));
    }

    /// Sorts the sequence at `field` with `compare`.
    pub fn sort_by<T: Clone + Send + 'static>(
        &mut self,
        field: Field<M, Vec<T>>,
        compare: impl Fn(&T, &T) -> Ordering + Send + 'static,
    ) {
        self.record(CollectionSorted::by(field, Box::new(compare)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::validation::RuleSet;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Ledger {
        owner: String,
        balance: i64,
        entries: Vec<i64>,
        tags: BTreeSet<String>,
    }

    fn rules() -> RuleSet<Ledger> {
        RuleSet::new()
            .rule("owner", "must not be empty", |l: &Ledger| !l.owner.is_empty())
            .rule("balance", "must not be negative", |l: &Ledger| l.balance >= 0)
    }

    fn seeded() -> Ledger {
        Ledger {
            owner: "ada".to_owned(),
            balance: 10,
            entries: vec![10],
            tags: BTreeSet::from(["vip".to_owned()]),
        }
    }

    fn bound() -> ModelChangeTracker<Ledger> {
        let tracker = ModelChangeTracker::new();
        tracker.init(seeded(), rules()).unwrap();
        tracker
    }

    fn failing(_: &Ledger) -> Result<ValidationResult, DomainError> {
        Err(DomainError::Validation("rules unavailable".to_owned()))
    }

    #[test]
    fn test_base_tracker_buffers_unless_initializing() {
        // Arrange
        let mut model = seeded();
        let mut tracker = ChangeTracker::<Ledger>::new();

        // Act
        let due = tracker.add(&mut model, Box::new(PropertySet::new(|l: &mut Ledger| &mut l.balance, 1)));
        tracker.buffer_changes();
        let deferred = tracker.add(&mut model, Box::new(PropertySet::new(|l: &mut Ledger| &mut l.balance, 2)));
        tracker.initialize();
        let skipped = tracker.add(&mut model, Box::new(PropertySet::new(|l: &mut Ledger| &mut l.balance, 3)));

        // Assert
        assert!(due);
        assert!(!deferred);
        assert!(!skipped);
        assert_eq!(tracker.len(), 2);
        assert_eq!(model.balance, 3);
    }

    #[test]
    fn test_base_tracker_rolls_back_newest_first() {
        // Arrange
        let mut model = seeded();
        let mut tracker = ChangeTracker::<Ledger>::new();
        tracker.buffer_changes();
        tracker.add(
            &mut model,
            Box::new(ItemInserted::new(|l: &mut Ledger| &mut l.entries, 1, 1, 20).unwrap()),
        );
        tracker.add(
            &mut model,
            Box::new(IndexUpdated::new(|l: &mut Ledger| &mut l.entries, 2, 1, 25).unwrap()),
        );
        tracker.add(&mut model, Box::new(CollectionSorted::by(
            |l: &mut Ledger| &mut l.entries,
            Box::new(|a: &i64, b: &i64| b.cmp(a)),
        )));
        assert_eq!(model.entries, vec![25, 10]);

        // Act
        let kinds: Vec<ChangeKind> = tracker.iter().map(|c| c.kind()).collect();
        tracker.rollback(&mut model);

        // Assert
        assert_eq!(
            kinds,
            vec![
                ChangeKind::CollectionSorted,
                ChangeKind::IndexUpdated,
                ChangeKind::ItemInserted
            ]
        );
        assert_eq!(model, seeded());
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_init_twice_fails() {
        // Arrange
        let tracker = bound();

        // Act
        let result = tracker.init(Ledger::default(), rules());

        // Assert
        assert!(matches!(result, Err(DomainError::TrackerAlreadyInitialized)));
        assert_eq!(tracker.read(|l| l.owner.clone()).unwrap(), "ada");
    }

    #[test]
    fn test_process_before_init_fails() {
        // Arrange
        let tracker = ModelChangeTracker::<Ledger>::new();

        // Act
        let result = tracker.process();

        // Assert
        assert!(matches!(result, Err(DomainError::TrackerNotInitialized)));
    }

    #[test]
    fn test_add_before_init_fails() {
        // Arrange
        let tracker = ModelChangeTracker::<Ledger>::new();

        // Act
        let result = tracker.add(PropertySet::new(|l: &mut Ledger| &mut l.balance, 5));

        // Assert
        assert!(matches!(result, Err(DomainError::TrackerNotInitialized)));
    }

    #[test]
    fn test_immediate_add_validates_each_change() {
        // Arrange
        let tracker = bound();

        // Act
        let accepted = tracker
            .add(PropertySet::new(|l: &mut Ledger| &mut l.balance, 5))
            .unwrap();
        let rejected = tracker
            .add(PropertySet::new(|l: &mut Ledger| &mut l.balance, -1))
            .unwrap();

        // Assert
        assert!(accepted.is_some_and(|r| r.is_valid()));
        assert!(rejected.is_some_and(|r| !r.is_valid()));
        assert_eq!(tracker.read(|l| l.balance).unwrap(), 5);
        assert_eq!(tracker.pending(), 0);
    }

    #[test]
    fn test_buffered_changes_wait_for_process() {
        // Arrange
        let tracker = bound();
        tracker.buffer_changes();

        // Act
        let result = tracker
            .add(PropertySet::new(|l: &mut Ledger| &mut l.balance, -50))
            .unwrap();

        // Assert
        assert!(result.is_none());
        assert_eq!(tracker.pending(), 1);
        assert_eq!(tracker.pending_kinds(), vec![ChangeKind::PropertySet]);
        assert_eq!(tracker.read(|l| l.balance).unwrap(), -50);
    }

    #[test]
    fn test_process_invalid_restores_prior_state() {
        // Arrange
        let tracker = bound();
        tracker.buffer_changes();
        tracker
            .add(PropertySet::new(|l: &mut Ledger| &mut l.owner, String::new()))
            .unwrap();
        tracker
            .add(ItemAdded::new(|l: &mut Ledger| &mut l.entries, -30_i64))
            .unwrap();
        tracker
            .add(PropertySet::new(|l: &mut Ledger| &mut l.balance, -20))
            .unwrap();

        // Act
        let result = tracker.process().unwrap();

        // Assert
        assert!(!result.is_valid());
        assert_eq!(result.errors().count(), 2);
        assert_eq!(tracker.read(Clone::clone).unwrap(), seeded());
        assert_eq!(tracker.pending(), 0);
        assert_eq!(tracker.mode(), TrackingMode::Immediate);
    }

    #[test]
    fn test_process_valid_keeps_changes_and_clears_buffer() {
        // Arrange
        let tracker = bound();
        tracker.buffer_changes();
        tracker
            .add(PropertySet::new(|l: &mut Ledger| &mut l.balance, 40))
            .unwrap();

        // Act
        let result = tracker.process().unwrap();

        // Assert
        assert!(result.is_valid());
        assert_eq!(tracker.read(|l| l.balance).unwrap(), 40);
        assert_eq!(tracker.pending(), 0);
    }

    #[test]
    fn test_process_rolls_back_when_validator_fails() {
        // Arrange
        let tracker = ModelChangeTracker::new();
        tracker.init(seeded(), failing).unwrap();
        tracker.buffer_changes();
        tracker
            .add(PropertySet::new(|l: &mut Ledger| &mut l.balance, 99))
            .unwrap();

        // Act
        let result = tracker.process();

        // Assert
        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(tracker.read(|l| l.balance).unwrap(), 10);
        assert_eq!(tracker.pending(), 0);
    }

    #[test]
    fn test_initializing_mode_skips_buffer() {
        // Arrange
        let tracker = bound();
        tracker.initialize();

        // Act
        let result = tracker
            .add(PropertySet::new(|l: &mut Ledger| &mut l.balance, -5))
            .unwrap();

        // Assert
        assert!(result.is_none());
        assert_eq!(tracker.pending(), 0);
        assert_eq!(tracker.read(|l| l.balance).unwrap(), -5);
    }

    #[test]
    fn test_batch_processes_all_changes_as_one() {
        // Arrange
        let tracker = bound();

        // Act
        let result = tracker
            .batch(|scope| {
                scope.set(|l: &mut Ledger| &mut l.balance, -5);
                scope.add_item(|l: &mut Ledger| &mut l.entries, -15_i64);
                scope.set(|l: &mut Ledger| &mut l.balance, 0);
                Ok(())
            })
            .unwrap();

        // Assert
        assert!(result.is_valid());
        assert_eq!(tracker.read(|l| (l.balance, l.entries.clone())).unwrap(), (0, vec![10, -15]));
    }

    #[test]
    fn test_batch_error_unwinds_changes() {
        // Arrange
        let tracker = bound();

        // Act
        let result = tracker.batch(|scope| {
            scope.set(|l: &mut Ledger| &mut l.balance, 70);
            scope.remove_at(|l: &mut Ledger| &mut l.entries, 4)
        });

        // Assert
        assert!(matches!(
            result,
            Err(DomainError::IndexOutOfRange { index: 4, len: 1 })
        ));
        assert_eq!(tracker.read(Clone::clone).unwrap(), seeded());
        assert_eq!(tracker.mode(), TrackingMode::Immediate);
    }

    #[test]
    fn test_scope_sequence_operations_roll_back_together() {
        // Arrange
        let tracker = bound();

        // Act
        let result = tracker
            .batch(|scope| {
                scope.insert_at(|l: &mut Ledger| &mut l.entries, 0, 5)?;
                scope.insert_at(|l: &mut Ledger| &mut l.entries, 2, 1)?;
                scope.update_at(|l: &mut Ledger| &mut l.entries, 1, 7)?;
                scope.sort(|l: &mut Ledger| &mut l.entries);
                scope.remove_at(|l: &mut Ledger| &mut l.entries, 0)?;
                scope.clear(|l: &mut Ledger| &mut l.entries);
                scope.set(|l: &mut Ledger| &mut l.owner, String::new());
                Ok(())
            })
            .unwrap();

        // Assert
        assert!(!result.is_valid());
        assert_eq!(tracker.read(Clone::clone).unwrap(), seeded());
    }

    #[test]
    fn test_batch_duplicate_set_add_survives_rollback() {
        // Arrange
        let tracker = bound();

        // Act
        let result = tracker
            .batch(|scope| {
                scope.add_item(|l: &mut Ledger| &mut l.tags, "vip".to_owned());
                scope.set(|l: &mut Ledger| &mut l.balance, -1);
                Ok(())
            })
            .unwrap();

        // Assert
        assert!(!result.is_valid());
        assert_eq!(tracker.read(Clone::clone).unwrap(), seeded());
    }

    #[test]
    fn test_batch_remove_item_rollback_keeps_order() {
        // Arrange
        let tracker = ModelChangeTracker::new();
        let ledger = Ledger {
            entries: vec![1, 2, 3],
            ..seeded()
        };
        tracker.init(ledger.clone(), rules()).unwrap();

        // Act
        let result = tracker
            .batch(|scope| {
                scope.remove_item(|l: &mut Ledger| &mut l.entries, 1_i64);
                scope.set(|l: &mut Ledger| &mut l.balance, -1);
                Ok(())
            })
            .unwrap();

        // Assert
        assert!(!result.is_valid());
        assert_eq!(tracker.read(|l| l.entries.clone()).unwrap(), vec![1, 2, 3]);
        assert_eq!(tracker.read(Clone::clone).unwrap(), ledger);
    }
}
