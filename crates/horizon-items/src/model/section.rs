//! Sections: identified, titled groups of items.

use std::hash::{Hash, Hasher};
use std::ops::Index;

/// Anything that can be presented as a section.
///
/// Implement this for your own group types to feed them to
/// [`Snapshot::from_section_like`](super::Snapshot::from_section_like)
/// without building [`Section`] values by hand.
pub trait SectionLike {
    /// The item type.
    type Item;

    /// The header title.
    fn header(&self) -> Option<&str>;

    /// The footer title.
    fn footer(&self) -> Option<&str>;

    /// The items, in display order.
    fn items(&self) -> &[Self::Item];
}

/// Where a section's id came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdSource {
    Explicit,
    Header,
    Generated,
}

/// An ordered, immutable group of items with a stable identity.
///
/// Two sections are equal when their ids are equal, whatever their content:
/// identity answers "is this the same section", while content changes are
/// found by the diff engine.
///
/// The id is, in order of preference, the one given explicitly, the header
/// title, or a freshly generated unique value. A section without header or
/// explicit id therefore never matches any other section.
///
/// # Example
///
/// ```
/// use horizon_items::model::Section;
///
/// let fruits = Section::new(vec!["apple", "pear"]).with_header("Fruits");
/// assert_eq!(fruits.id(), "Fruits");
/// assert_eq!(fruits.len(), 2);
/// assert_eq!(fruits.get(1), Some(&"pear"));
/// assert_eq!(fruits.get(2), None);
///
/// // Same id, different content: still the same section.
/// let more = Section::new(vec!["plum"]).with_header("Fruits");
/// assert_eq!(fruits, more);
/// ```
#[derive(Debug, Clone)]
pub struct Section<T> {
    id: String,
    id_source: IdSource,
    header: Option<String>,
    footer: Option<String>,
    items: Vec<T>,
}

impl<T> Section<T> {
    /// Create an untitled section with a generated id.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            id_source: IdSource::Generated,
            header: None,
            footer: None,
            items,
        }
    }

    /// Create an untitled section with a known id, skipping id generation.
    pub(crate) fn with_fixed_id(id: impl Into<String>, items: Vec<T>) -> Self {
        Self {
            id: id.into(),
            id_source: IdSource::Explicit,
            header: None,
            footer: None,
            items,
        }
    }

    /// Create a section from all of its parts at once.
    pub fn from_parts(
        header: Option<String>,
        items: Vec<T>,
        footer: Option<String>,
        id: Option<String>,
    ) -> Self {
        let mut section = Self::new(items);
        if let Some(header) = header {
            section = section.with_header(header);
        }
        if let Some(footer) = footer {
            section = section.with_footer(footer);
        }
        if let Some(id) = id {
            section = section.with_id(id);
        }
        section
    }

    /// Set the header title.
    ///
    /// Unless an explicit id was set, the header also becomes the id.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        let header = header.into();
        if self.id_source != IdSource::Explicit {
            self.id = header.clone();
            self.id_source = IdSource::Header;
        }
        self.header = Some(header);
        self
    }

    /// Set the footer title.
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    /// Set an explicit id, overriding the header-derived or generated one.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self.id_source = IdSource::Explicit;
        self
    }

    /// Returns the section's identity.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the header title.
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    /// Returns the footer title.
    pub fn footer(&self) -> Option<&str> {
        self.footer.as_deref()
    }

    /// Returns the items.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the section has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the item at `index`, or `None` if out of range.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Iterate over the items.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Consume the section, returning its items.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Returns `true` if header and footer equal `other`'s.
    pub(crate) fn same_titles(&self, other: &Self) -> bool {
        self.header == other.header && self.footer == other.footer
    }
}

impl<T: Clone> Section<T> {
    /// Copy any [`SectionLike`] value into a section.
    pub fn from_section_like<S>(source: &S) -> Self
    where
        S: SectionLike<Item = T> + ?Sized,
    {
        Self::from_parts(
            source.header().map(str::to_owned),
            source.items().to_vec(),
            source.footer().map(str::to_owned),
            None,
        )
    }
}

impl<T> SectionLike for Section<T> {
    type Item = T;

    fn header(&self) -> Option<&str> {
        Section::header(self)
    }

    fn footer(&self) -> Option<&str> {
        Section::footer(self)
    }

    fn items(&self) -> &[T] {
        Section::items(self)
    }
}

impl<T> PartialEq for Section<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Section<T> {}

impl<T> Hash for Section<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> Index<usize> for Section<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<'a, T> IntoIterator for &'a Section<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T> IntoIterator for Section<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_id_defaults_to_header() {
        let section = Section::new(vec![1, 2]).with_header("Numbers");
        assert_eq!(section.id(), "Numbers");
        assert_eq!(section.header(), Some("Numbers"));
    }

    #[test]
    fn test_explicit_id_wins_over_header() {
        let section = Section::new(vec![1]).with_id("n").with_header("Numbers");
        assert_eq!(section.id(), "n");

        let section = Section::from_parts(Some("Numbers".into()), vec![1], None, Some("n".into()));
        assert_eq!(section.id(), "n");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = Section::new(vec![1]);
        let b = Section::new(vec![1]);
        assert_ne!(a, b);
        assert!(!a.id().is_empty());
    }

    #[test]
    fn test_equality_ignores_content() {
        let a = Section::new(vec![1, 2, 3]).with_id("a").with_footer("three");
        let b = Section::new(vec![4]).with_id("a");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
    }

    #[test]
    fn test_collection_access() {
        let section = Section::new(vec!["a", "b", "c"]);
        assert_eq!(section.len(), 3);
        assert!(!section.is_empty());
        assert_eq!(section[1], "b");
        assert_eq!(section.get(3), None);
        assert_eq!(section.iter().copied().collect::<Vec<_>>(), vec!["a", "b", "c"]);

        let collected: Vec<_> = (&section).into_iter().collect();
        assert_eq!(collected.len(), 3);
        assert_eq!(section.into_items(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_from_section_like() {
        struct Group {
            title: String,
            members: Vec<u32>,
        }

        impl SectionLike for Group {
            type Item = u32;

            fn header(&self) -> Option<&str> {
                Some(&self.title)
            }

            fn footer(&self) -> Option<&str> {
                None
            }

            fn items(&self) -> &[u32] {
                &self.members
            }
        }

        let group = Group {
            title: "Admins".into(),
            members: vec![7, 9],
        };
        let section = Section::from_section_like(&group);
        assert_eq!(section.id(), "Admins");
        assert_eq!(section.items(), &[7, 9]);
        assert_eq!(section.footer(), None);
    }
}
