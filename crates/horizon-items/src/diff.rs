//! Snapshot diffing.
//!
//! [`Update::between`] reconciles two successive [`Snapshot`]s into the
//! minimal structural change a view needs to go from one to the other.
//!
//! # Sections
//!
//! Sections are matched by id. Old-only sections are deleted, new-only
//! sections are inserted. Retained sections whose relative order changed are
//! reported as moves: every retained section outside a longest increasing
//! subsequence of old positions (taken in new order) moves, so swapping two
//! sections is a single move. A retained section whose header or footer
//! changed is reloaded as a whole.
//!
//! # Items
//!
//! Items inside a retained section are matched by value:
//!
//! 1. a common prefix and suffix are stripped;
//! 2. the remainder is aligned with a longest common subsequence;
//! 3. unaligned old and new items with equal values become moves;
//! 4. remaining unaligned items between the same two aligned neighbours are
//!    paired up as in-place reloads;
//! 5. whatever is left is deleted or inserted.
//!
//! Items never move across sections: an item that changes section is
//! deleted from one and inserted into the other.
//!
//! # Index conventions
//!
//! Deletions and move sources are indices into the old snapshot. Insertions,
//! reloads and move destinations are indices into the new snapshot. Item
//! changes inside a moved section are therefore addressed at the section's
//! old index for deletions and its new index for everything else.
//!
//! # Example
//!
//! ```
//! use horizon_items::diff::{DiffOptions, Update};
//! use horizon_items::model::{IndexPath, Section, Snapshot};
//!
//! let old = Snapshot::sections(vec![Section::new(vec![1, 2, 3]).with_id("a")]);
//! let new = Snapshot::sections(vec![Section::new(vec![1, 2, 4]).with_id("a")]);
//!
//! let Update::Batch(changes) = Update::between(&old, &new, &DiffOptions::default()) else {
//!     unreachable!()
//! };
//! assert_eq!(changes.reloaded_items(), &[IndexPath::new(0, 2)]);
//! assert_eq!(changes.len(), 1);
//! ```

use std::collections::HashMap;

use horizon_items_core::logging::targets;

use crate::model::{IndexPath, Section, Snapshot};

/// Largest LCS table (in cells) built for one section; larger sections fall
/// back to greedy alignment.
const MAX_LCS_CELLS: usize = 4_000_000;

/// Options controlling how changes are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    /// Report reordered sections and items as moves. When off, they are
    /// deleted and inserted instead.
    pub detect_moves: bool,
    /// Report changed content at an unchanged position as a reload. When
    /// off, it is deleted and inserted instead.
    pub reload_in_place: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            detect_moves: true,
            reload_in_place: true,
        }
    }
}

impl DiffOptions {
    /// Enable or disable move detection.
    pub fn with_moves(mut self, enabled: bool) -> Self {
        self.detect_moves = enabled;
        self
    }

    /// Enable or disable in-place reloads.
    pub fn with_reloads(mut self, enabled: bool) -> Self {
        self.reload_in_place = enabled;
        self
    }
}

/// One structural change, as yielded by [`Changeset::operations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Delete the section at this old index.
    DeleteSection(usize),
    /// Delete the item at this old path.
    DeleteItem(IndexPath),
    /// Insert a section at this new index.
    InsertSection(usize),
    /// Insert an item at this new path.
    InsertItem(IndexPath),
    /// Move a section from an old to a new index.
    MoveSection {
        /// Old index.
        from: usize,
        /// New index.
        to: usize,
    },
    /// Move an item from an old to a new path.
    MoveItem {
        /// Old path.
        from: IndexPath,
        /// New path.
        to: IndexPath,
    },
    /// Reload the section at this new index.
    ReloadSection(usize),
    /// Reload the item at this new path.
    ReloadItem(IndexPath),
}

/// The structural difference between two snapshots.
///
/// Apply it as one atomic batch: every deletion, then every insertion, then
/// every move, then every reload. [`operations`](Self::operations) yields
/// the changes in exactly that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    deleted_sections: Vec<usize>,
    inserted_sections: Vec<usize>,
    moved_sections: Vec<(usize, usize)>,
    reloaded_sections: Vec<usize>,
    deleted_items: Vec<IndexPath>,
    inserted_items: Vec<IndexPath>,
    moved_items: Vec<(IndexPath, IndexPath)>,
    reloaded_items: Vec<IndexPath>,
}

impl Changeset {
    /// Compute the changes from `old` to `new`.
    ///
    /// Unlike [`Update::between`] this never takes the first-population
    /// shortcut: an empty `old` yields one insertion per section.
    pub fn between<T: PartialEq>(old: &Snapshot<T>, new: &Snapshot<T>, options: &DiffOptions) -> Self {
        let mut changes = Self::default();
        changes.diff_sections(old.as_sections(), new.as_sections(), options);
        changes.normalize();

        tracing::trace!(
            target: targets::DIFF,
            sections_deleted = changes.deleted_sections.len(),
            sections_inserted = changes.inserted_sections.len(),
            sections_moved = changes.moved_sections.len(),
            sections_reloaded = changes.reloaded_sections.len(),
            items_deleted = changes.deleted_items.len(),
            items_inserted = changes.inserted_items.len(),
            items_moved = changes.moved_items.len(),
            items_reloaded = changes.reloaded_items.len(),
            "computed changeset"
        );

        changes
    }

    /// Returns `true` if the two snapshots are structurally identical.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the total number of operations.
    pub fn len(&self) -> usize {
        self.deleted_sections.len()
            + self.inserted_sections.len()
            + self.moved_sections.len()
            + self.reloaded_sections.len()
            + self.deleted_items.len()
            + self.inserted_items.len()
            + self.moved_items.len()
            + self.reloaded_items.len()
    }

    /// Old indices of deleted sections.
    pub fn deleted_sections(&self) -> &[usize] {
        &self.deleted_sections
    }

    /// New indices of inserted sections.
    pub fn inserted_sections(&self) -> &[usize] {
        &self.inserted_sections
    }

    /// Moved sections as `(old index, new index)`.
    pub fn moved_sections(&self) -> &[(usize, usize)] {
        &self.moved_sections
    }

    /// New indices of reloaded sections.
    pub fn reloaded_sections(&self) -> &[usize] {
        &self.reloaded_sections
    }

    /// Old paths of deleted items.
    pub fn deleted_items(&self) -> &[IndexPath] {
        &self.deleted_items
    }

    /// New paths of inserted items.
    pub fn inserted_items(&self) -> &[IndexPath] {
        &self.inserted_items
    }

    /// Moved items as `(old path, new path)`.
    pub fn moved_items(&self) -> &[(IndexPath, IndexPath)] {
        &self.moved_items
    }

    /// New paths of reloaded items.
    pub fn reloaded_items(&self) -> &[IndexPath] {
        &self.reloaded_items
    }

    /// Iterate over every change in application order.
    pub fn operations(&self) -> impl Iterator<Item = Operation> + '_ {
        let deletions = self
            .deleted_sections
            .iter()
            .map(|&s| Operation::DeleteSection(s))
            .chain(self.deleted_items.iter().map(|&p| Operation::DeleteItem(p)));
        let insertions = self
            .inserted_sections
            .iter()
            .map(|&s| Operation::InsertSection(s))
            .chain(self.inserted_items.iter().map(|&p| Operation::InsertItem(p)));
        let moves = self
            .moved_sections
            .iter()
            .map(|&(from, to)| Operation::MoveSection { from, to })
            .chain(
                self.moved_items
                    .iter()
                    .map(|&(from, to)| Operation::MoveItem { from, to }),
            );
        let reloads = self
            .reloaded_sections
            .iter()
            .map(|&s| Operation::ReloadSection(s))
            .chain(self.reloaded_items.iter().map(|&p| Operation::ReloadItem(p)));

        deletions.chain(insertions).chain(moves).chain(reloads)
    }

    fn diff_sections<T: PartialEq>(
        &mut self,
        old: &[Section<T>],
        new: &[Section<T>],
        options: &DiffOptions,
    ) {
        // First occurrence of a duplicated id wins; later duplicates stay
        // unmatched and are deleted or inserted.
        let mut old_by_id: HashMap<&str, usize> = HashMap::with_capacity(old.len());
        for (index, section) in old.iter().enumerate() {
            old_by_id.entry(section.id()).or_insert(index);
        }

        let mut claimed = vec![false; old.len()];
        let mut retained: Vec<(usize, usize)> = Vec::new();

        for (new_index, section) in new.iter().enumerate() {
            match old_by_id.get(section.id()) {
                Some(&old_index) if !claimed[old_index] => {
                    claimed[old_index] = true;
                    if !options.reload_in_place && !old[old_index].same_titles(section) {
                        self.deleted_sections.push(old_index);
                        self.inserted_sections.push(new_index);
                    } else {
                        retained.push((old_index, new_index));
                    }
                }
                _ => self.inserted_sections.push(new_index),
            }
        }

        self.deleted_sections.extend(
            claimed
                .iter()
                .enumerate()
                .filter(|&(_, &claimed)| !claimed)
                .map(|(index, _)| index),
        );

        let old_order: Vec<usize> = retained.iter().map(|&(old_index, _)| old_index).collect();
        let in_place = longest_increasing_subsequence(&old_order);

        for (position, &(old_index, new_index)) in retained.iter().enumerate() {
            if !in_place[position] {
                if options.detect_moves {
                    self.moved_sections.push((old_index, new_index));
                } else {
                    self.deleted_sections.push(old_index);
                    self.inserted_sections.push(new_index);
                    continue;
                }
            }

            let (old_section, new_section) = (&old[old_index], &new[new_index]);
            if !old_section.same_titles(new_section) {
                self.reloaded_sections.push(new_index);
                continue;
            }

            let edits = diff_items(old_section.items(), new_section.items(), options);
            let old_path = |item: usize| IndexPath::new(old_index, item);
            let new_path = |item: usize| IndexPath::new(new_index, item);

            self.deleted_items.extend(edits.deleted.into_iter().map(old_path));
            self.inserted_items.extend(edits.inserted.into_iter().map(new_path));
            self.reloaded_items.extend(edits.reloaded.into_iter().map(new_path));
            self.moved_items.extend(
                edits
                    .moved
                    .into_iter()
                    .map(|(from, to)| (old_path(from), new_path(to))),
            );
        }
    }

    fn normalize(&mut self) {
        self.deleted_sections.sort_unstable();
        self.inserted_sections.sort_unstable();
        self.moved_sections.sort_unstable();
        self.reloaded_sections.sort_unstable();
        self.deleted_items.sort_unstable();
        self.inserted_items.sort_unstable();
        self.moved_items.sort_unstable();
        self.reloaded_items.sort_unstable();
    }
}

/// What a view has to do to show a new snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// Nothing changed structurally.
    None,
    /// The view was empty; load everything at once.
    FullInsert {
        /// Number of sections in the new snapshot.
        sections: usize,
    },
    /// Apply these changes as one batch.
    Batch(Changeset),
}

impl Update {
    /// Decide how to get from `old` to `new`.
    ///
    /// An `old` snapshot without sections is populated with a single
    /// [`Update::FullInsert`] instead of a per-item diff.
    pub fn between<T: PartialEq>(old: &Snapshot<T>, new: &Snapshot<T>, options: &DiffOptions) -> Self {
        match (old.is_empty(), new.is_empty()) {
            (true, true) => Self::None,
            (true, false) => Self::FullInsert {
                sections: new.section_count(),
            },
            _ => {
                let changes = Changeset::between(old, new, options);
                if changes.is_empty() {
                    Self::None
                } else {
                    Self::Batch(changes)
                }
            }
        }
    }

    /// Returns `true` for [`Update::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Item-level edits within one section, as local indices.
#[derive(Debug, Default, PartialEq, Eq)]
struct ItemEdits {
    deleted: Vec<usize>,
    inserted: Vec<usize>,
    moved: Vec<(usize, usize)>,
    reloaded: Vec<usize>,
}

fn diff_items<T: PartialEq>(old: &[T], new: &[T], options: &DiffOptions) -> ItemEdits {
    let prefix = old.iter().zip(new).take_while(|(a, b)| a == b).count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let old_mid = &old[prefix..old.len() - suffix];
    let new_mid = &new[prefix..new.len() - suffix];

    let mut edits = ItemEdits::default();
    if old_mid.is_empty() && new_mid.is_empty() {
        return edits;
    }

    let anchors = align(old_mid, new_mid);

    let mut old_used = vec![false; old_mid.len()];
    let mut new_used = vec![false; new_mid.len()];
    for &(i, j) in &anchors {
        old_used[i] = true;
        new_used[j] = true;
    }

    if options.detect_moves {
        for (i, item) in old_mid.iter().enumerate() {
            if old_used[i] {
                continue;
            }
            let target = new_mid
                .iter()
                .enumerate()
                .position(|(j, candidate)| !new_used[j] && candidate == item);
            if let Some(j) = target {
                old_used[i] = true;
                new_used[j] = true;
                edits.moved.push((prefix + i, prefix + j));
            }
        }
    }

    // Gaps between consecutive anchors, with the section bounds as the
    // outermost anchors.
    let bounds = anchors
        .iter()
        .copied()
        .chain(std::iter::once((old_mid.len(), new_mid.len())));
    let (mut old_start, mut new_start) = (0, 0);

    for (old_end, new_end) in bounds {
        let mut old_left = (old_start..old_end).filter(|&i| !old_used[i]);
        let mut new_left = (new_start..new_end).filter(|&j| !new_used[j]);

        if options.reload_in_place {
            loop {
                match (old_left.next(), new_left.next()) {
                    (Some(_), Some(j)) => edits.reloaded.push(prefix + j),
                    (Some(i), None) => edits.deleted.push(prefix + i),
                    (None, Some(j)) => edits.inserted.push(prefix + j),
                    (None, None) => break,
                }
            }
        } else {
            edits.deleted.extend(old_left.map(|i| prefix + i));
            edits.inserted.extend(new_left.map(|j| prefix + j));
        }

        old_start = old_end + 1;
        new_start = new_end + 1;
    }

    edits
}

/// Align two slices, returning increasing `(old, new)` index pairs of equal
/// items.
fn align<T: PartialEq>(old: &[T], new: &[T]) -> Vec<(usize, usize)> {
    if old.is_empty() || new.is_empty() {
        return Vec::new();
    }

    match old.len().checked_mul(new.len()) {
        Some(cells) if cells <= MAX_LCS_CELLS => lcs(old, new),
        _ => {
            tracing::debug!(
                target: targets::DIFF,
                old = old.len(),
                new = new.len(),
                "section too large for exact alignment, using greedy matching"
            );
            greedy(old, new)
        }
    }
}

/// Longest common subsequence by dynamic programming.
fn lcs<T: PartialEq>(old: &[T], new: &[T]) -> Vec<(usize, usize)> {
    let (n, m) = (old.len(), new.len());
    let width = m + 1;
    // table[i * width + j] = LCS length of old[i..] and new[j..]
    let mut table = vec![0u32; (n + 1) * width];

    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i * width + j] = if old[i] == new[j] {
                table[(i + 1) * width + j + 1] + 1
            } else {
                table[(i + 1) * width + j].max(table[i * width + j + 1])
            };
        }
    }

    let mut pairs = Vec::with_capacity(table[0] as usize);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if table[(i + 1) * width + j] >= table[i * width + j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}

/// Match each old item to the next equal new item, left to right.
fn greedy<T: PartialEq>(old: &[T], new: &[T]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    let mut cursor = 0;
    for (i, item) in old.iter().enumerate() {
        if let Some(offset) = new[cursor..].iter().position(|candidate| candidate == item) {
            pairs.push((i, cursor + offset));
            cursor += offset + 1;
            if cursor == new.len() {
                break;
            }
        }
    }
    pairs
}

/// Mark the members of one longest strictly increasing subsequence.
fn longest_increasing_subsequence(sequence: &[usize]) -> Vec<bool> {
    // tails[k] = position of the smallest tail of an increasing run of
    // length k + 1
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; sequence.len()];

    for (position, &value) in sequence.iter().enumerate() {
        let length = tails.partition_point(|&tail| sequence[tail] < value);
        previous[position] = length.checked_sub(1).map(|k| tails[k]);
        if length == tails.len() {
            tails.push(position);
        } else {
            tails[length] = position;
        }
    }

    let mut members = vec![false; sequence.len()];
    let mut cursor = tails.last().copied();
    while let Some(position) = cursor {
        members[position] = true;
        cursor = previous[position];
    }
    members
}
