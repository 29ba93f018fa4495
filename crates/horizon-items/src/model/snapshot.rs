//! Snapshots: the complete state of a sectioned collection at one instant.

use super::index::IndexPath;
use super::section::{Section, SectionLike};

/// The id of the single implicit section of a flat snapshot.
pub const FLAT_SECTION_ID: &str = "items";

/// One complete state of the collection shown by a view.
///
/// Every producer input normalizes into a snapshot:
///
/// - a list of [`Section`]s is taken as-is;
/// - a flat list of items becomes one section with the fixed id
///   [`FLAT_SECTION_ID`], so successive flat snapshots diff item by item;
/// - a nested list of item lists becomes one section per inner list, with
///   positional ids `"section-0"`, `"section-1"`, and so on.
///
/// # Example
///
/// ```
/// use horizon_items::model::{IndexPath, Snapshot};
///
/// let snapshot = Snapshot::nested(vec![vec!['a', 'b'], vec!['c']]);
/// assert_eq!(snapshot.section_count(), 2);
/// assert_eq!(snapshot.item(IndexPath::new(1, 0)), Some(&'c'));
/// assert_eq!(snapshot.as_sections()[1].id(), "section-1");
/// ```
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    sections: Vec<Section<T>>,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Snapshot<T> {
    /// A snapshot with no sections.
    pub fn empty() -> Self {
        Self {
            sections: Vec::new(),
        }
    }

    /// A snapshot of the given sections.
    pub fn sections(sections: Vec<Section<T>>) -> Self {
        Self { sections }
    }

    /// A snapshot of one implicit section holding `items`.
    pub fn items(items: Vec<T>) -> Self {
        Self {
            sections: vec![Section::with_fixed_id(FLAT_SECTION_ID, items)],
        }
    }

    /// A snapshot of positionally identified sections.
    pub fn nested(groups: Vec<Vec<T>>) -> Self {
        let sections = groups
            .into_iter()
            .enumerate()
            .map(|(index, items)| Section::with_fixed_id(format!("section-{index}"), items))
            .collect();
        Self { sections }
    }

    /// Returns the sections.
    pub fn as_sections(&self) -> &[Section<T>] {
        &self.sections
    }

    /// Consume the snapshot, returning its sections.
    pub fn into_sections(self) -> Vec<Section<T>> {
        self.sections
    }

    /// Returns the number of sections.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Returns the number of items in `section`, or 0 if out of range.
    pub fn item_count(&self, section: usize) -> usize {
        self.sections.get(section).map_or(0, Section::len)
    }

    /// Returns the total number of items across all sections.
    pub fn total_items(&self) -> usize {
        self.sections.iter().map(Section::len).sum()
    }

    /// Returns `true` if there are no sections.
    ///
    /// A snapshot of empty sections is not empty.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Returns the section at `index`.
    pub fn section(&self, index: usize) -> Option<&Section<T>> {
        self.sections.get(index)
    }

    /// Returns the item at `path`.
    pub fn item(&self, path: IndexPath) -> Option<&T> {
        self.sections.get(path.section())?.get(path.item())
    }
}

impl<T: Clone> Snapshot<T> {
    /// A snapshot of any [`SectionLike`] values.
    pub fn from_section_like<S: SectionLike<Item = T>>(groups: &[S]) -> Self {
        Self {
            sections: groups.iter().map(Section::from_section_like).collect(),
        }
    }
}

impl<T> From<Vec<Section<T>>> for Snapshot<T> {
    fn from(sections: Vec<Section<T>>) -> Self {
        Self::sections(sections)
    }
}

impl<T> From<Vec<Vec<T>>> for Snapshot<T> {
    fn from(groups: Vec<Vec<T>>) -> Self {
        Self::nested(groups)
    }
}

impl<T> FromIterator<Section<T>> for Snapshot<T> {
    fn from_iter<I: IntoIterator<Item = Section<T>>>(iter: I) -> Self {
        Self::sections(iter.into_iter().collect())
    }
}
