//! Index paths for addressing items in sectioned collections.

use std::fmt;

/// The position of one item: a section index and an item index within it.
///
/// Index paths order section-major, so sorting a list of paths yields the
/// order in which the items appear on screen.
///
/// Like any positional index, an `IndexPath` is only meaningful against the
/// snapshot it was computed for; after an update it may refer to a different
/// item or none at all.
///
/// # Example
///
/// ```
/// use horizon_items::model::IndexPath;
///
/// let a = IndexPath::new(0, 5);
/// let b = IndexPath::new(1, 0);
/// assert!(a < b);
/// assert_eq!(b.section(), 1);
/// assert_eq!(a.item(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct IndexPath {
    section: usize,
    item: usize,
}

impl IndexPath {
    /// Create an index path.
    #[inline]
    pub const fn new(section: usize, item: usize) -> Self {
        Self { section, item }
    }

    /// Returns the section index.
    #[inline]
    pub const fn section(&self) -> usize {
        self.section
    }

    /// Returns the item index within the section.
    #[inline]
    pub const fn item(&self) -> usize {
        self.item
    }

    /// Returns the path of the item at `item` in the same section.
    #[inline]
    pub const fn sibling(&self, item: usize) -> Self {
        Self::new(self.section, item)
    }
}

impl From<(usize, usize)> for IndexPath {
    fn from((section, item): (usize, usize)) -> Self {
        Self::new(section, item)
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.section, self.item)
    }
}
