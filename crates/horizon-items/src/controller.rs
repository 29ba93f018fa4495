//! The items update controller.
//!
//! [`ItemsController`] holds the last snapshot a view has accepted, diffs
//! every new snapshot against it and drives the view with exactly one
//! update per snapshot. It doubles as the view's [`ItemsDataSource`].
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use horizon_items::controller::ItemsController;
//! use horizon_items::diff::Changeset;
//! use horizon_items::view::{ItemsDataSource, ItemsView};
//!
//! #[derive(Default)]
//! struct CountingView {
//!     reloads: Cell<usize>,
//!     batches: Cell<usize>,
//! }
//!
//! impl ItemsView for CountingView {
//!     fn data_source_attached(&self) -> bool { true }
//!     fn attach_data_source(&self, _: Rc<dyn ItemsDataSource>) {}
//!     fn reload_data(&self) { self.reloads.set(self.reloads.get() + 1) }
//!     fn perform_batch_updates(&self, _: &Changeset) { self.batches.set(self.batches.get() + 1) }
//! }
//!
//! let view = Rc::new(CountingView::default());
//! let controller = ItemsController::new("cell", |label: &mut String, _, item: &u32| {
//!     *label = item.to_string();
//! });
//! controller.set_view(&view);
//!
//! controller.update_collection(vec![vec![1, 2, 3]]);
//! controller.update_collection(vec![vec![1, 2, 3]]);
//! controller.update_collection(vec![vec![1, 2, 4]]);
//!
//! assert_eq!(view.reloads.get(), 1);
//! assert_eq!(view.batches.get(), 1);
//! ```

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use horizon_items_core::UpdateSpan;
use horizon_items_core::logging::targets;

use crate::diff::{DiffOptions, Update};
use crate::model::{IndexPath, Section, Snapshot};
use crate::view::{ItemsDataSource, ItemsView};

/// A type-erased cell configuration callback.
type ErasedCellConfig<T> = Box<dyn Fn(&mut dyn Any, IndexPath, &T) -> bool>;

/// Reconciles successive snapshots into incremental view updates.
///
/// The controller holds its view weakly: once the view is dropped every
/// update silently turns into bookkeeping only. It is confined to the UI
/// context (`!Send`) and must be shared through `Rc`.
///
/// Updates are applied one at a time, in call order. An update requested
/// while another is being applied (for example from inside the view's batch
/// callback) is queued and applied right after it.
pub struct ItemsController<T> {
    cell_identifier: String,
    cell_config: ErasedCellConfig<T>,
    options: DiffOptions,
    view: RefCell<Option<Weak<dyn ItemsView>>>,
    last_snapshot: RefCell<Rc<Snapshot<T>>>,
    /// The snapshot being applied; what the data source answers from while
    /// the view processes it.
    staged: RefCell<Option<Rc<Snapshot<T>>>>,
    /// Whether the current view displays `last_snapshot`.
    synced: Cell<bool>,
    pending: RefCell<VecDeque<Snapshot<T>>>,
    applying: Cell<bool>,
    generation: Cell<u64>,
}

impl<T: PartialEq + 'static> ItemsController<T> {
    /// Create a controller.
    ///
    /// `cell_config` is called with a dequeued cell of type `C`, the item's
    /// position and the item itself. Cells of any other type are left
    /// untouched.
    pub fn new<C, F>(cell_identifier: impl Into<String>, cell_config: F) -> Rc<Self>
    where
        C: 'static,
        F: Fn(&mut C, IndexPath, &T) + 'static,
    {
        Self::with_options(cell_identifier, cell_config, DiffOptions::default())
    }

    /// Create a controller with custom diff options.
    pub fn with_options<C, F>(
        cell_identifier: impl Into<String>,
        cell_config: F,
        options: DiffOptions,
    ) -> Rc<Self>
    where
        C: 'static,
        F: Fn(&mut C, IndexPath, &T) + 'static,
    {
        let cell_config: ErasedCellConfig<T> = Box::new(move |cell, at, item| {
            match cell.downcast_mut::<C>() {
                Some(cell) => {
                    cell_config(cell, at, item);
                    true
                }
                None => {
                    tracing::warn!(
                        target: targets::CONTROLLER,
                        %at,
                        expected = std::any::type_name::<C>(),
                        "cell has unexpected type, skipping configuration"
                    );
                    false
                }
            }
        });

        Rc::new(Self {
            cell_identifier: cell_identifier.into(),
            cell_config,
            options,
            view: RefCell::new(None),
            last_snapshot: RefCell::new(Rc::new(Snapshot::empty())),
            staged: RefCell::new(None),
            synced: Cell::new(false),
            pending: RefCell::new(VecDeque::new()),
            applying: Cell::new(false),
            generation: Cell::new(0),
        })
    }

    /// Set the view to drive. Only a weak reference is kept.
    ///
    /// A view other than the current live one has displayed nothing yet, so
    /// the next update loads it in full with [`ItemsView::reload_data`].
    /// Setting the same view again changes nothing.
    pub fn set_view<V: ItemsView + 'static>(&self, view: &Rc<V>) {
        let view: Weak<V> = Rc::downgrade(view);
        let view: Weak<dyn ItemsView> = view;

        let mut current = self.view.borrow_mut();
        let same = current
            .as_ref()
            .is_some_and(|current| current.strong_count() > 0 && Weak::ptr_eq(current, &view));
        if !same {
            tracing::debug!(target: targets::CONTROLLER, "new view, next update reloads it");
            self.synced.set(false);
        }
        *current = Some(view);
    }

    /// Returns the view, if it is still alive.
    pub fn view(&self) -> Option<Rc<dyn ItemsView>> {
        self.view.borrow().as_ref().and_then(Weak::upgrade)
    }

    /// Returns the diff options.
    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    /// Returns the number of snapshots processed so far.
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// Returns the snapshot the data source currently answers from.
    pub fn snapshot(&self) -> Rc<Snapshot<T>> {
        if let Some(staged) = self.staged.borrow().as_ref() {
            return staged.clone();
        }
        self.last_snapshot.borrow().clone()
    }

    /// Apply a new snapshot to the view.
    ///
    /// Never fails. Without a live view the snapshot is only recorded, so a
    /// later view starts from it.
    pub fn update_collection(&self, snapshot: impl Into<Snapshot<T>>) {
        self.pending.borrow_mut().push_back(snapshot.into());

        if self.applying.replace(true) {
            tracing::trace!(target: targets::CONTROLLER, "update in progress, queued snapshot");
            return;
        }
        let _applying = ApplyingGuard(&self.applying);

        loop {
            let next = self.pending.borrow_mut().pop_front();
            match next {
                Some(snapshot) => self.apply(snapshot),
                None => break,
            }
        }
    }

    fn apply(&self, snapshot: Snapshot<T>) {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        let _span = UpdateSpan::new(generation);

        let snapshot = Rc::new(snapshot);

        let Some(view) = self.view() else {
            tracing::trace!(target: targets::CONTROLLER, "view released, recording snapshot only");
            self.synced.set(false);
            *self.last_snapshot.borrow_mut() = snapshot;
            return;
        };

        // A view that never displayed the last snapshot diffs from nothing.
        let old = if self.synced.get() {
            self.last_snapshot.borrow().clone()
        } else {
            Rc::new(Snapshot::empty())
        };
        self.synced.set(true);
        let update = Update::between(&old, &snapshot, &self.options);

        match &update {
            Update::None => {
                tracing::trace!(target: targets::CONTROLLER, "no structural change");
            }
            Update::FullInsert { sections } => {
                tracing::debug!(
                    target: targets::CONTROLLER,
                    sections,
                    items = snapshot.total_items(),
                    "full insert"
                );
                *self.staged.borrow_mut() = Some(snapshot.clone());
                view.reload_data();
            }
            Update::Batch(changes) => {
                tracing::debug!(
                    target: targets::CONTROLLER,
                    sections_deleted = changes.deleted_sections().len(),
                    sections_inserted = changes.inserted_sections().len(),
                    sections_moved = changes.moved_sections().len(),
                    sections_reloaded = changes.reloaded_sections().len(),
                    items_deleted = changes.deleted_items().len(),
                    items_inserted = changes.inserted_items().len(),
                    items_moved = changes.moved_items().len(),
                    items_reloaded = changes.reloaded_items().len(),
                    "batch update"
                );
                *self.staged.borrow_mut() = Some(snapshot.clone());
                view.perform_batch_updates(changes);
            }
        }

        self.staged.borrow_mut().take();
        *self.last_snapshot.borrow_mut() = snapshot;
    }
}

impl<T: Clone + PartialEq + 'static> ItemsController<T> {
    /// Returns a copy of the item at `at`.
    pub fn item(&self, at: IndexPath) -> Option<T> {
        self.snapshot().item(at).cloned()
    }

    /// Returns a copy of the section at `index`.
    pub fn section(&self, index: usize) -> Option<Section<T>> {
        self.snapshot().section(index).cloned()
    }
}

impl<T: PartialEq + 'static> ItemsDataSource for ItemsController<T> {
    fn number_of_sections(&self) -> usize {
        self.snapshot().section_count()
    }

    fn number_of_items(&self, section: usize) -> usize {
        self.snapshot().item_count(section)
    }

    fn header_title(&self, section: usize) -> Option<String> {
        self.snapshot()
            .section(section)
            .and_then(|s| s.header().map(str::to_owned))
    }

    fn footer_title(&self, section: usize) -> Option<String> {
        self.snapshot()
            .section(section)
            .and_then(|s| s.footer().map(str::to_owned))
    }

    fn cell_identifier(&self) -> &str {
        &self.cell_identifier
    }

    fn configure_cell(&self, cell: &mut dyn Any, at: IndexPath) -> bool {
        let snapshot = self.snapshot();
        match snapshot.item(at) {
            Some(item) => (self.cell_config)(cell, at, item),
            None => {
                tracing::debug!(target: targets::CONTROLLER, %at, "no item to configure");
                false
            }
        }
    }
}

impl<T> std::fmt::Debug for ItemsController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemsController")
            .field("cell_identifier", &self.cell_identifier)
            .field("options", &self.options)
            .field("generation", &self.generation.get())
            .field("sections", &self.last_snapshot.borrow().section_count())
            .finish_non_exhaustive()
    }
}

/// Clears the in-progress flag when the drain loop exits, including by
/// unwinding out of a view callback.
struct ApplyingGuard<'a>(&'a Cell<bool>);

impl Drop for ApplyingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

static_assertions::assert_not_impl_any!(ItemsController<u32>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::Changeset;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Attach,
        Reload { sections: usize },
        Batch { changes: Changeset, sections: usize },
    }

    /// Records calls, and what the data source reports during each.
    #[derive(Default)]
    struct Recorder {
        source: RefCell<Option<Rc<dyn ItemsDataSource>>>,
        calls: RefCell<Vec<Call>>,
        on_batch: RefCell<Option<Box<dyn Fn()>>>,
    }

    impl Recorder {
        fn sections(&self) -> usize {
            self.source
                .borrow()
                .as_ref()
                .map_or(0, |source| source.number_of_sections())
        }
    }

    impl ItemsView for Recorder {
        fn data_source_attached(&self) -> bool {
            self.source.borrow().is_some()
        }

        fn attach_data_source(&self, source: Rc<dyn ItemsDataSource>) {
            *self.source.borrow_mut() = Some(source);
            self.calls.borrow_mut().push(Call::Attach);
        }

        fn reload_data(&self) {
            let sections = self.sections();
            self.calls.borrow_mut().push(Call::Reload { sections });
        }

        fn perform_batch_updates(&self, changes: &Changeset) {
            let sections = self.sections();
            self.calls.borrow_mut().push(Call::Batch {
                changes: changes.clone(),
                sections,
            });
            if let Some(callback) = self.on_batch.borrow().as_ref() {
                callback();
            }
        }
    }

    fn controller() -> Rc<ItemsController<i32>> {
        ItemsController::new("cell", |cell: &mut String, _, item: &i32| {
            *cell = format!("#{item}");
        })
    }

    fn attached(controller: &Rc<ItemsController<i32>>) -> Rc<Recorder> {
        let view = Rc::new(Recorder::default());
        controller.set_view(&view);
        view.attach_data_source(controller.clone());
        view.calls.borrow_mut().clear();
        view
    }

    #[test]
    fn test_first_snapshot_reloads() {
        let controller = controller();
        let view = attached(&controller);

        controller.update_collection(vec![vec![1, 2]]);

        assert_eq!(*view.calls.borrow(), vec![Call::Reload { sections: 1 }]);
        assert_eq!(controller.generation(), 1);
    }

    #[test]
    fn test_identical_snapshot_is_noop() {
        let controller = controller();
        let view = attached(&controller);

        controller.update_collection(vec![vec![1, 2]]);
        controller.update_collection(vec![vec![1, 2]]);

        assert_eq!(view.calls.borrow().len(), 1);
    }

    #[test]
    fn test_data_source_reflects_new_state_during_batch() {
        let controller = controller();
        let view = attached(&controller);

        controller.update_collection(vec![vec![1]]);
        controller.update_collection(vec![vec![1], vec![2]]);

        let calls = view.calls.borrow();
        let Call::Batch { changes, sections } = &calls[1] else {
            panic!("expected a batch, got {:?}", calls[1]);
        };
        assert_eq!(*sections, 2);
        assert_eq!(changes.inserted_sections(), &[1]);
    }

    #[test]
    fn test_released_view_records_snapshot() {
        let controller = controller();
        let view = attached(&controller);
        drop(view);

        controller.update_collection(vec![vec![7]]);

        assert!(controller.view().is_none());
        assert_eq!(controller.item(IndexPath::new(0, 0)), Some(7));
    }

    #[test]
    fn test_replacement_view_is_reloaded_in_full() {
        let controller = controller();
        let first = attached(&controller);
        controller.update_collection(vec![vec![1, 2]]);

        let second = attached(&controller);
        controller.update_collection(vec![vec![2]]);

        assert_eq!(*second.calls.borrow(), vec![Call::Reload { sections: 1 }]);
        assert_eq!(first.calls.borrow().len(), 1);

        // From here on the new view is diffed incrementally.
        controller.update_collection(vec![vec![2, 3]]);
        assert!(matches!(second.calls.borrow()[1], Call::Batch { .. }));
    }

    #[test]
    fn test_setting_same_view_keeps_diffing() {
        let controller = controller();
        let view = attached(&controller);
        controller.update_collection(vec![vec![1]]);

        controller.set_view(&view);
        controller.update_collection(vec![vec![1, 2]]);

        let calls = view.calls.borrow();
        let Call::Batch { changes, .. } = &calls[1] else {
            panic!("expected a batch, got {:?}", calls[1]);
        };
        assert_eq!(changes.inserted_items(), &[IndexPath::new(0, 1)]);
    }

    #[test]
    fn test_reentrant_update_is_queued() {
        let controller = controller();
        let view = attached(&controller);
        controller.update_collection(vec![vec![1]]);

        let weak = Rc::downgrade(&controller);
        *view.on_batch.borrow_mut() = Some(Box::new(move || {
            if let Some(controller) = weak.upgrade() {
                if controller.generation() == 2 {
                    controller.update_collection(vec![vec![1, 2, 3]]);
                }
            }
        }));

        controller.update_collection(vec![vec![1, 2]]);

        let calls = view.calls.borrow();
        assert_eq!(calls.len(), 3);
        let Call::Batch { changes, .. } = &calls[2] else {
            panic!("expected a batch");
        };
        assert_eq!(changes.inserted_items(), &[IndexPath::new(0, 2)]);
        assert_eq!(controller.generation(), 3);
    }

    #[test]
    fn test_configure_cell() {
        let controller = controller();
        controller.update_collection(vec![vec![5, 6]]);

        let mut cell = String::new();
        assert!(controller.configure_cell(&mut cell, IndexPath::new(0, 1)));
        assert_eq!(cell, "#6");

        let mut wrong_type = 0u8;
        assert!(!controller.configure_cell(&mut wrong_type, IndexPath::new(0, 0)));
        assert!(!controller.configure_cell(&mut cell, IndexPath::new(3, 0)));
        assert_eq!(controller.cell_identifier(), "cell");
    }

    #[test]
    fn test_titles() {
        let controller = controller();
        controller.update_collection(vec![
            Section::new(vec![1]).with_header("Odd").with_footer("1 item"),
        ]);

        assert_eq!(controller.header_title(0).as_deref(), Some("Odd"));
        assert_eq!(controller.footer_title(0).as_deref(), Some("1 item"));
        assert_eq!(controller.header_title(1), None);
        assert_eq!(controller.number_of_items(0), 1);
        assert_eq!(controller.section(0).map(|s| s.id().to_owned()), Some("Odd".into()));
    }
}
