//! Prelude module for Horizon Items.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```
//! use horizon_items::prelude::*;
//! ```
//!
//! This provides access to:
//! - The data model (`Section`, `Snapshot`, `IndexPath`)
//! - The view interface (`ItemsView`, `ItemsDataSource`, `Changeset`)
//! - The controller and its entry points (`ItemsController`, `ItemsViewExt`)
//! - Snapshot delivery (`Subject`, `SnapshotStream`, `UiContext`)

// ============================================================================
// Data Model
// ============================================================================

pub use crate::model::{IndexPath, Section, SectionLike, Snapshot};

// ============================================================================
// Diffing and View Interface
// ============================================================================

pub use crate::diff::{Changeset, DiffOptions, Operation, Update};
pub use crate::view::{ItemsDataSource, ItemsView};

// ============================================================================
// Controller and Binding
// ============================================================================

pub use crate::binding::{ItemsSubscriber, ItemsViewExt};
pub use crate::controller::ItemsController;

// ============================================================================
// Delivery
// ============================================================================

pub use horizon_items_core::{
    AsyncSequence, AsyncSequenceExt, Cancellable, Publisher, PublisherExt, SnapshotStream, Subject,
    TaskHandle, UiContext, UiContextConfig,
};
