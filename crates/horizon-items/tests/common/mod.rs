//! Shared test doubles.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use horizon_items::prelude::*;

/// One call made to a [`RecordingView`].
#[derive(Debug, Clone, PartialEq)]
pub enum ViewCall {
    Attach,
    Reload { sections: usize, items: usize },
    Batch(Changeset),
}

/// A view that records every call and maintains its own displayed cells.
///
/// Reloads copy everything from the data source. Batches are applied to
/// the previously displayed cells the way a real list view would: carried
/// over cells keep their old content, so a changeset that misses a change
/// shows up as a mismatch against [`render`](Self::render).
#[derive(Default)]
pub struct RecordingView {
    source: RefCell<Option<Rc<dyn ItemsDataSource>>>,
    calls: RefCell<Vec<ViewCall>>,
    displayed: RefCell<Vec<Vec<String>>>,
}

impl RecordingView {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<ViewCall> {
        self.calls.borrow().clone()
    }

    /// Calls other than data source attachment.
    pub fn mutations(&self) -> Vec<ViewCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| !matches!(call, ViewCall::Attach))
            .cloned()
            .collect()
    }

    pub fn attach_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| matches!(call, ViewCall::Attach))
            .count()
    }

    pub fn detach(&self) {
        self.source.borrow_mut().take();
    }

    /// The cells as maintained from reloads and batches.
    pub fn displayed(&self) -> Vec<Vec<String>> {
        self.displayed.borrow().clone()
    }

    /// Every cell freshly configured from the data source.
    pub fn render(&self) -> Vec<Vec<String>> {
        let source = self.source.borrow();
        let Some(source) = source.as_ref() else {
            return Vec::new();
        };
        (0..source.number_of_sections())
            .map(|section| fresh_section(source.as_ref(), section))
            .collect()
    }

    fn totals(&self) -> (usize, usize) {
        let source = self.source.borrow();
        let Some(source) = source.as_ref() else {
            return (0, 0);
        };
        let sections = source.number_of_sections();
        let items = (0..sections).map(|s| source.number_of_items(s)).sum();
        (sections, items)
    }

    fn apply_batch(&self, changes: &Changeset) {
        let old = self.displayed();
        let source = self.source.borrow();
        let source = source.as_ref().expect("batch without data source").as_ref();
        let count = source.number_of_sections();

        let moved_from: HashSet<usize> = changes.moved_sections().iter().map(|m| m.0).collect();
        let moved_to: HashSet<usize> = changes.moved_sections().iter().map(|m| m.1).collect();

        let mut carried = (0..old.len())
            .filter(|o| !changes.deleted_sections().contains(o) && !moved_from.contains(o));

        let mut origin: Vec<Option<usize>> = vec![None; count];
        for &(from, to) in changes.moved_sections() {
            origin[to] = Some(from);
        }
        for (n, slot) in origin.iter_mut().enumerate() {
            if changes.inserted_sections().contains(&n) || moved_to.contains(&n) {
                continue;
            }
            *slot = Some(carried.next().expect("new section without origin"));
        }
        assert!(carried.next().is_none(), "old section left unaccounted");

        let displayed = origin
            .iter()
            .enumerate()
            .map(|(n, origin)| match origin {
                None => fresh_section(source, n),
                Some(_) if changes.reloaded_sections().contains(&n) => fresh_section(source, n),
                Some(o) => apply_items(&old[*o], *o, n, changes, source),
            })
            .collect();

        *self.displayed.borrow_mut() = displayed;
    }
}

fn cell(source: &dyn ItemsDataSource, section: usize, item: usize) -> String {
    let mut cell = String::new();
    assert!(source.configure_cell(&mut cell, IndexPath::new(section, item)));
    cell
}

fn fresh_section(source: &dyn ItemsDataSource, section: usize) -> Vec<String> {
    (0..source.number_of_items(section))
        .map(|item| cell(source, section, item))
        .collect()
}

fn apply_items(
    old: &[String],
    old_section: usize,
    new_section: usize,
    changes: &Changeset,
    source: &dyn ItemsDataSource,
) -> Vec<String> {
    let len = source.number_of_items(new_section);
    let mut items: Vec<Option<String>> = vec![None; len];

    let deleted: HashSet<usize> = changes
        .deleted_items()
        .iter()
        .filter(|p| p.section() == old_section)
        .map(|p| p.item())
        .collect();
    let mut moved_from = HashSet::new();
    for &(from, to) in changes.moved_items() {
        if to.section() == new_section {
            assert_eq!(from.section(), old_section, "item moved across sections");
            items[to.item()] = Some(old[from.item()].clone());
            moved_from.insert(from.item());
        }
    }

    let mut carried = (0..old.len()).filter(|i| !deleted.contains(i) && !moved_from.contains(i));
    for (j, slot) in items.iter_mut().enumerate() {
        let path = IndexPath::new(new_section, j);
        if changes.inserted_items().contains(&path) {
            *slot = Some(cell(source, new_section, j));
            continue;
        }
        if slot.is_some() {
            continue;
        }
        let i = carried.next().expect("new item without origin");
        *slot = Some(if changes.reloaded_items().contains(&path) {
            cell(source, new_section, j)
        } else {
            old[i].clone()
        });
    }
    assert!(carried.next().is_none(), "old item left unaccounted");

    items.into_iter().map(Option::unwrap).collect()
}

impl ItemsView for RecordingView {
    fn data_source_attached(&self) -> bool {
        self.source.borrow().is_some()
    }

    fn attach_data_source(&self, source: Rc<dyn ItemsDataSource>) {
        *self.source.borrow_mut() = Some(source);
        self.calls.borrow_mut().push(ViewCall::Attach);
    }

    fn reload_data(&self) {
        let (sections, items) = self.totals();
        self.calls
            .borrow_mut()
            .push(ViewCall::Reload { sections, items });
        let rendered = self.render();
        *self.displayed.borrow_mut() = rendered;
    }

    fn perform_batch_updates(&self, changes: &Changeset) {
        self.calls.borrow_mut().push(ViewCall::Batch(changes.clone()));
        self.apply_batch(changes);
    }
}

/// A controller rendering items into `String` cells.
pub fn string_controller<T>() -> Rc<ItemsController<T>>
where
    T: std::fmt::Display + PartialEq + 'static,
{
    ItemsController::new("cell", |cell: &mut String, _, item: &T| {
        *cell = item.to_string();
    })
}

pub fn context() -> UiContext {
    UiContext::new(UiContextConfig::default().with_name("test-ui")).unwrap()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("horizon_items=trace,horizon_items_core=trace")
        .with_test_writer()
        .try_init();
}
