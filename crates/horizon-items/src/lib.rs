//! Horizon Items - Incremental sectioned-items binding for list and grid views.
//!
//! This is the main crate. It re-exports all of `horizon-items-core` and
//! adds the domain layer on top:
//!
//! - [`model`]: Sections, snapshots and index paths
//! - [`diff`]: The snapshot diff engine
//! - [`view`]: The interface a list or grid view implements
//! - [`controller`]: The update controller that drives a view
//! - [`binding`]: Push and pull entry points on views
//!
//! # Example
//!
//! ```
//! use std::cell::{Cell, RefCell};
//! use std::rc::Rc;
//!
//! use futures_util::stream;
//! use horizon_items::prelude::*;
//!
//! #[derive(Default)]
//! struct GridView {
//!     source: RefCell<Option<Rc<dyn ItemsDataSource>>>,
//!     updates: Cell<usize>,
//! }
//!
//! impl ItemsView for GridView {
//!     fn data_source_attached(&self) -> bool { self.source.borrow().is_some() }
//!     fn attach_data_source(&self, source: Rc<dyn ItemsDataSource>) {
//!         *self.source.borrow_mut() = Some(source);
//!     }
//!     fn reload_data(&self) { self.updates.set(self.updates.get() + 1) }
//!     fn perform_batch_updates(&self, _: &Changeset) { self.updates.set(self.updates.get() + 1) }
//! }
//!
//! let ctx = UiContext::new(UiContextConfig::default()).unwrap();
//! let view = Rc::new(GridView::default());
//! let controller = ItemsController::new("tile", |tile: &mut u32, _, value: &u32| *tile = *value);
//!
//! let snapshots = SnapshotStream::new(stream::iter(vec![
//!     vec![vec![1, 2], vec![3]],
//!     vec![vec![1, 2], vec![3]],
//!     vec![vec![2, 1], vec![3, 4]],
//! ]));
//!
//! let handle = view.sections_stream(controller.clone(), snapshots, &ctx);
//! assert!(ctx.block_on(handle.wait()));
//!
//! // First load, then one batch; the repeated snapshot changed nothing.
//! assert_eq!(view.updates.get(), 2);
//! assert_eq!(controller.number_of_items(1), 2);
//! ```

pub use horizon_items_core::*;

pub mod binding;
pub mod controller;
pub mod diff;
pub mod model;
pub mod prelude;
pub mod view;
