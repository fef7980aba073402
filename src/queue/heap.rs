//! # Binary heap with a caller-supplied ordering.
//!
//! ```text
//! index:      0
//!           /   \
//!          1     2        parent(i) = (i - 1) / 2
//!         / \   / \       left(i)   = 2i + 1
//!        3   4 5   6      right(i)  = 2i + 2
//! ```
//!
//! The element at index 0 is the one for which `is_before(root, x)` holds against
//! every other element `x` (or at least is never violated).

use crate::error::QueueError;

/// Ordered container with peek/pop of the highest-priority item.
///
/// `F` answers "should `a` come out before `b`?". Any context the ordering needs is
/// captured by the closure itself.
///
/// # Example
/// ```
/// use pairvisor::PriorityQueue;
///
/// let mut q = PriorityQueue::new(|a: &i32, b: &i32| a < b);
/// q.push(15).unwrap();
/// q.push(7).unwrap();
/// assert_eq!(q.peek(), Some(&7));
/// assert_eq!(q.pop(), Some(7));
/// assert_eq!(q.peek(), Some(&15));
/// ```
pub struct PriorityQueue<T, F> {
    items: Vec<T>,
    is_before: F,
    limit: Option<usize>,
}

impl<T, F> PriorityQueue<T, F>
where
    F: Fn(&T, &T) -> bool,
{
    /// Creates an empty, unbounded queue.
    pub fn new(is_before: F) -> Self {
        Self {
            items: Vec::new(),
            is_before,
            limit: None,
        }
    }

    /// Creates an empty queue that refuses pushes beyond `limit` items.
    pub fn with_limit(is_before: F, limit: usize) -> Self {
        Self {
            items: Vec::new(),
            is_before,
            limit: Some(limit),
        }
    }

    /// Inserts `item`, sifting it up to its place.
    ///
    /// On error the item is dropped and the queue is unchanged.
    pub fn push(&mut self, item: T) -> Result<(), QueueError> {
        if let Some(limit) = self.limit {
            if self.items.len() >= limit {
                return Err(QueueError::Full { limit });
            }
        }
        self.items.try_reserve(1).map_err(|_| QueueError::Alloc)?;
        self.items.push(item);
        self.sift_up(self.items.len() - 1);
        Ok(())
    }

    /// Removes and returns the highest-priority item.
    pub fn pop(&mut self) -> Option<T> {
        if self.items.is_empty() {
            return None;
        }
        let last = self.items.len() - 1;
        self.items.swap(0, last);
        let top = self.items.pop();
        self.sift_down(0);
        top
    }

    /// Returns the highest-priority item without removing it.
    pub fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Removes the first item (in storage order) accepted by `matches`.
    ///
    /// The removed slot is refilled with the tail element, which is then sifted up
    /// if it now precedes its parent, or down otherwise.
    pub fn remove_matching<P>(&mut self, mut matches: P) -> Option<T>
    where
        P: FnMut(&T) -> bool,
    {
        let idx = self.items.iter().position(|item| matches(item))?;
        let last = self.items.len() - 1;
        self.items.swap(idx, last);
        let removed = self.items.pop();

        if idx < self.items.len() {
            if idx != 0 && self.before(idx, parent(idx)) {
                self.sift_up(idx);
            } else {
                self.sift_down(idx);
            }
        }
        removed
    }

    /// Iterates over queued items in storage (not priority) order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Drops every queued item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn before(&self, a: usize, b: usize) -> bool {
        (self.is_before)(&self.items[a], &self.items[b])
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let up = parent(idx);
            if !self.before(idx, up) {
                break;
            }
            self.items.swap(idx, up);
            idx = up;
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        while let Some(child) = self.preferred_child(idx) {
            if !self.before(child, idx) {
                break;
            }
            self.items.swap(idx, child);
            idx = child;
        }
    }

    /// The child that should come first, or `None` for a leaf.
    fn preferred_child(&self, idx: usize) -> Option<usize> {
        let left = 2 * idx + 1;
        let right = left + 1;
        let len = self.items.len();

        if right < len {
            Some(if self.before(left, right) { left } else { right })
        } else if left < len {
            Some(left)
        } else {
            None
        }
    }
}

#[inline]
fn parent(idx: usize) -> usize {
    (idx - 1) / 2
}
