//! # Slot storage for queued tasks.
//!
//! The scheduler's heap orders small `(due, slot)` entries; the tasks themselves live
//! here. Freed slots are recycled, so indices stay small and stable for as long as a
//! task is queued.

use crate::tasks::Task;

#[derive(Default)]
pub(crate) struct Arena {
    slots: Vec<Option<Task>>,
    free: Vec<usize>,
    len: usize,
}

impl Arena {
    pub(crate) fn insert(&mut self, task: Task) -> usize {
        self.len += 1;
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(task);
                slot
            }
            None => {
                self.slots.push(Some(task));
                self.slots.len() - 1
            }
        }
    }

    pub(crate) fn remove(&mut self, slot: usize) -> Option<Task> {
        let task = self.slots.get_mut(slot)?.take()?;
        self.free.push(slot);
        self.len -= 1;
        Some(task)
    }

    pub(crate) fn get(&self, slot: usize) -> Option<&Task> {
        self.slots.get(slot)?.as_ref()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.len = 0;
    }
}
