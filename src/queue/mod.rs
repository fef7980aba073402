//! Priority queue backing the scheduler.
//!
//! [`PriorityQueue`] is a binary heap over a contiguous `Vec`, ordered by a
//! caller-supplied "is before" relation. It stores plain values (the scheduler
//! stores small `Copy` entries that point into its task arena), so a resize of the
//! backing vector never invalidates anything the caller holds.
//!
//! ## Rules
//! - `push` sifts the new tail **up**; `pop` moves the tail to the root and sifts **down**.
//! - `remove_matching` replaces the removed slot with the tail element, then sifts in
//!   whichever direction restores the heap property.
//! - Ties are broken by heap shape, not insertion order (no FIFO guarantee).

mod heap;

pub use heap::PriorityQueue;
