//! Reordering primitives shared by sites and categories.
//!
//! All operations are total: ids that are not found, equal ids and
//! out-of-range indices leave the collection unchanged instead of failing.
//! A drag that lands nowhere is indistinguishable from a cancelled one.

use crate::models::{Category, Site, SiteId};

/// An element with a stable identity inside an [`OrderedCollection`].
pub trait Identified {
    /// Identity type.
    type Id: PartialEq + Clone;

    /// Returns the element's identity.
    fn id(&self) -> &Self::Id;

    /// Stores the element's position after a reorder commits.
    fn set_order(&mut self, order: i64);
}

impl Identified for Site {
    type Id = SiteId;

    fn id(&self) -> &SiteId {
        &self.id
    }

    fn set_order(&mut self, order: i64) {
        self.order = order;
    }
}

impl Identified for Category {
    type Id = String;

    fn id(&self) -> &String {
        &self.name
    }

    fn set_order(&mut self, order: i64) {
        self.order = order;
    }
}

/// Direction for [`OrderedCollection::swap_adjacent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards index 0.
    Up,
    /// Towards the end.
    Down,
}

/// Moves `source_id` into the slot `target_id` occupied, shifting the rest.
///
/// Returns the input untouched when the ids are equal or either is missing.
///
/// ```
/// use startdeck::catalog::ordering::reorder;
/// use startdeck::models::Category;
///
/// let cats: Vec<Category> = ["A", "B", "C"].iter().map(|n| Category::new(n).unwrap()).collect();
/// let moved = reorder(cats, &"A".to_string(), &"C".to_string());
/// let names: Vec<_> = moved.iter().map(|c| c.name.as_str()).collect();
/// assert_eq!(names, ["B", "C", "A"]);
/// ```
pub fn reorder<T: Identified>(mut items: Vec<T>, source_id: &T::Id, target_id: &T::Id) -> Vec<T> {
    move_within(&mut items, source_id, target_id);
    items
}

fn move_within<T: Identified>(items: &mut Vec<T>, source_id: &T::Id, target_id: &T::Id) -> bool {
    if source_id == target_id {
        return false;
    }

    let Some(from) = items.iter().position(|item| item.id() == source_id) else {
        return false;
    };
    let Some(to) = items.iter().position(|item| item.id() == target_id) else {
        return false;
    };

    let moved = items.remove(from);
    items.insert(to, moved);
    true
}

/// A list of identified elements with order-preserving edits.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedCollection<T: Identified> {
    items: Vec<T>,
}

impl<T: Identified> Default for OrderedCollection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Identified> OrderedCollection<T> {
    /// Wraps `items` as-is; call [`renumber`](Self::renumber) to sync orders.
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    /// Elements in order.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Iterates elements in order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of the element with `id`.
    pub fn position(&self, id: &T::Id) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// Element with `id`.
    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Whether an element with `id` exists.
    pub fn contains(&self, id: &T::Id) -> bool {
        self.position(id).is_some()
    }

    /// Replaces the element with the same id in place, or appends it.
    ///
    /// Returns `true` if an existing element was replaced.
    pub fn upsert(&mut self, item: T) -> bool {
        match self.position(item.id()) {
            Some(index) => {
                self.items[index] = item;
                true
            }
            None => {
                self.items.push(item);
                false
            }
        }
    }

    /// Removes and returns the element with `id`.
    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        let index = self.position(id)?;
        Some(self.items.remove(index))
    }

    /// Keeps only elements matching `keep`, returning how many were removed.
    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) -> usize {
        let before = self.items.len();
        self.items.retain(keep);
        before - self.items.len()
    }

    /// Drag commit: see [`reorder`]. Returns `true` if anything moved.
    pub fn reorder(&mut self, source_id: &T::Id, target_id: &T::Id) -> bool {
        let moved = move_within(&mut self.items, source_id, target_id);
        if moved {
            self.renumber();
        }
        moved
    }

    /// Swaps the element at `index` with its neighbour in `direction`.
    ///
    /// No-op at either boundary and for out-of-range indices.
    pub fn swap_adjacent(&mut self, index: usize, direction: Direction) -> bool {
        let neighbour = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => index.checked_add(1),
        };

        match neighbour {
            Some(other) if index < self.items.len() && other < self.items.len() => {
                self.items.swap(index, other);
                self.renumber();
                true
            }
            _ => false,
        }
    }

    /// Rewrites every element's order to its index.
    pub fn renumber(&mut self) {
        for (index, item) in self.items.iter_mut().enumerate() {
            item.set_order(index as i64);
        }
    }

    /// Consumes the collection, returning the elements.
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<'a, T: Identified> IntoIterator for &'a OrderedCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Tracks a drag gesture: `start` → any number of `hover` → `end`.
///
/// Intermediate hovers are visual only; only [`end`](Self::end) produces
/// a reorder to commit.
#[derive(Debug, Clone, PartialEq)]
pub enum DragState<Id> {
    /// No gesture in progress.
    Idle,
    /// An element is being dragged.
    Dragging {
        /// The element picked up.
        source: Id,
        /// The element currently under the pointer.
        over: Option<Id>,
    },
}

impl<Id> Default for DragState<Id> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<Id: PartialEq + Clone> DragState<Id> {
    /// Picks up `source`, abandoning any gesture in progress.
    pub fn start(&mut self, source: Id) {
        *self = Self::Dragging { source, over: None };
    }

    /// Records the element under the pointer (`None` when over empty space).
    pub fn hover(&mut self, target: Option<Id>) {
        if let Self::Dragging { over, .. } = self {
            *over = target;
        }
    }

    /// Drops the element, returning `(source, target)` if there is a move to commit.
    pub fn end(&mut self) -> Option<(Id, Id)> {
        match std::mem::take(self) {
            Self::Dragging {
                source,
                over: Some(target),
            } if source != target => Some((source, target)),
            _ => None,
        }
    }

    /// Abandons the gesture without committing.
    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }

    /// Whether a gesture is in progress.
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }
}
