//! Data model for sectioned item collections.
//!
//! # Core Types
//!
//! - [`Section`]: An identified group of items with optional header and
//!   footer titles
//! - [`Snapshot`]: One complete state of a collection, as a list of sections
//! - [`IndexPath`]: The position of one item within a snapshot
//! - [`SectionLike`]: The shape any caller type needs to be used as a
//!   section
//!
//! Section identity is the key to incremental updates: a section with the
//! same id in two successive snapshots is diffed item by item, while a
//! section whose id changed is removed and inserted as a whole.
//!
//! ```text
//! Snapshot
//! ├── Section "Fruits"   [apple, pear]
//! └── Section "Veggies"  [leek]
//!                          ▲
//!                          └── IndexPath(1, 0)
//! ```

mod index;
mod section;
mod snapshot;

pub use index::IndexPath;
pub use section::{Section, SectionLike};
pub use snapshot::{FLAT_SECTION_ID, Snapshot};
