//! The interface between the update controller and a list or grid view.
//!
//! A view implementing [`ItemsView`] owns layout, cell reuse and scrolling;
//! this crate only tells it *what* changed. In the other direction the view
//! pulls counts, titles and cell contents from an [`ItemsDataSource`], which
//! is normally an [`ItemsController`](crate::controller::ItemsController).
//!
//! ```text
//! ┌──────────────┐  reload_data / perform_batch_updates  ┌───────────┐
//! │ ItemsControl │──────────────────────────────────────>│ ItemsView │
//! │     ler      │<──────────────────────────────────────│           │
//! └──────────────┘   counts, titles, configure_cell      └───────────┘
//! ```
//!
//! Both traits take `&self`: views and data sources are shared through `Rc`
//! and live on the UI context, so mutable state sits behind interior
//! mutability. The controller never calls a view re-entrantly.

use std::any::Any;
use std::rc::Rc;

use crate::diff::Changeset;
use crate::model::IndexPath;

/// A list or grid view that can apply structural updates.
pub trait ItemsView {
    /// Returns `true` if a data source is currently attached.
    fn data_source_attached(&self) -> bool;

    /// Attach `source`, replacing any previous data source.
    fn attach_data_source(&self, source: Rc<dyn ItemsDataSource>);

    /// Discard all displayed state and reload from the data source.
    ///
    /// This is also the first call a view receives after being handed to a
    /// controller that already holds data.
    fn reload_data(&self);

    /// Apply `changes` as one atomic batch.
    ///
    /// The data source already reflects the new state when this is called.
    /// Apply deletions against the old state and everything else against
    /// the new state, in the order given by
    /// [`Changeset::operations`](crate::diff::Changeset::operations).
    fn perform_batch_updates(&self, changes: &Changeset);
}

/// The source of everything a view displays.
pub trait ItemsDataSource {
    /// Returns the number of sections.
    fn number_of_sections(&self) -> usize;

    /// Returns the number of items in `section`, or 0 if out of range.
    fn number_of_items(&self, section: usize) -> usize;

    /// Returns the header title of `section`.
    fn header_title(&self, section: usize) -> Option<String>;

    /// Returns the footer title of `section`.
    fn footer_title(&self, section: usize) -> Option<String>;

    /// Returns the reuse identifier of the cells this source configures.
    fn cell_identifier(&self) -> &str;

    /// Configure a dequeued `cell` for the item at `at`.
    ///
    /// Returns `false` if there is no such item or the cell is not of the
    /// type this source configures.
    fn configure_cell(&self, cell: &mut dyn Any, at: IndexPath) -> bool;
}
