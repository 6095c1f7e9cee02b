//! # Alloc
//!
//! A first-fit, coalescing free-list allocator for the byte ranges inside a
//! table's data stream. Every `save`/`delete`/`replace` against a table goes
//! through a [`FreeList`] to decide where an entity's serialized bytes live;
//! `compact` consults [`FreeList::compaction_plan`] to repack the stream with
//! no wasted space.
//!
//! There is no file I/O here -- this crate only tracks byte ranges. `storage`
//! owns turning a [`Slot`] into an actual read/write against the data file.

use std::cmp::Ordering;

/// A contiguous byte range `[offset, offset + length)` inside a data stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub offset: u64,
    pub length: u64,
}

impl Slot {
    #[must_use]
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    #[must_use]
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// A single move in a [`CompactionPlan`]: relocate `length` bytes from
/// `from_offset` to `to_offset`. Plans are always returned in ascending
/// `from_offset` order, and `to_offset <= from_offset` always holds, so
/// applying moves in order never overwrites a byte range not yet read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionMove {
    pub from_offset: u64,
    pub to_offset: u64,
    pub length: u64,
}

/// The result of [`FreeList::compaction_plan`]: the moves to apply, and the
/// stream length once every live slot has been packed to the front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactionPlan {
    pub moves: Vec<CompactionMove>,
    pub new_end: u64,
}

/// Tracks the free (unused) byte ranges of a data stream and the current
/// end-of-stream offset.
///
/// Free ranges are kept sorted by offset and coalesced on every release, so
/// the list never holds two adjacent free ranges split in two.
#[derive(Debug, Clone, Default)]
pub struct FreeList {
    free: Vec<Slot>,
    end: u64,
}

impl FreeList {
    /// Creates a free list for a stream whose current length is `end` and
    /// which has no free ranges yet (a freshly created or fully-packed
    /// stream).
    #[must_use]
    pub fn new(end: u64) -> Self {
        Self {
            free: Vec::new(),
            end,
        }
    }

    /// Rebuilds a free list from its persisted parts (the table header
    /// stores exactly this: the stream length and the free-range list).
    #[must_use]
    pub fn from_parts(end: u64, mut free: Vec<Slot>) -> Self {
        free.sort_by_key(|s| s.offset);
        let mut list = Self { free: Vec::new(), end };
        for slot in free {
            list.release(slot);
        }
        list
    }

    /// The current end-of-stream offset: every byte at or beyond this
    /// offset is unallocated and not yet part of the file.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.end
    }

    /// The free ranges below [`end`](Self::end), sorted by offset.
    #[must_use]
    pub fn free_slots(&self) -> &[Slot] {
        &self.free
    }

    /// Total free bytes below [`end`](Self::end) (fragmentation still inside
    /// the live stream, as opposed to bytes never yet allocated).
    #[must_use]
    pub fn free_bytes(&self) -> u64 {
        self.free.iter().map(|s| s.length).sum()
    }

    /// Reserves `length` bytes, reusing a free range via first-fit if one is
    /// large enough, otherwise growing the stream at its current end.
    pub fn reserve(&mut self, length: u64) -> Slot {
        if length == 0 {
            return Slot::new(self.end, 0);
        }
        if let Some(idx) = self.free.iter().position(|s| s.length >= length) {
            let slot = self.free[idx];
            match slot.length.cmp(&length) {
                Ordering::Equal => {
                    self.free.remove(idx);
                }
                _ => {
                    self.free[idx] = Slot::new(slot.offset + length, slot.length - length);
                }
            }
            return Slot::new(slot.offset, length);
        }
        let offset = self.end;
        self.end += length;
        Slot::new(offset, length)
    }

    /// Returns `slot` to the free list, coalescing it with any adjacent free
    /// range, and shrinking [`end`](Self::end) directly if the released
    /// range (after coalescing) sits at the tail of the stream.
    pub fn release(&mut self, slot: Slot) {
        if slot.length == 0 {
            return;
        }
        let mut merged = slot;

        let idx = self
            .free
            .iter()
            .position(|s| s.offset >= merged.offset)
            .unwrap_or(self.free.len());

        if idx > 0 {
            let prev = self.free[idx - 1];
            if prev.end() == merged.offset {
                merged = Slot::new(prev.offset, prev.length + merged.length);
                self.free.remove(idx - 1);
            }
        }

        let idx = self
            .free
            .iter()
            .position(|s| s.offset >= merged.offset)
            .unwrap_or(self.free.len());
        if idx < self.free.len() && self.free[idx].offset == merged.end() {
            let next = self.free.remove(idx);
            merged = Slot::new(merged.offset, merged.length + next.length);
        }

        if merged.end() == self.end {
            self.end = merged.offset;
            // shrinking the tail may expose the previous free slot as the
            // new tail; fold it in too so free_bytes() never counts a range
            // that is actually beyond end.
            if let Some(last) = self.free.last().copied() {
                if last.end() == self.end {
                    self.free.pop();
                    self.end = last.offset;
                }
            }
            return;
        }

        let idx = self
            .free
            .iter()
            .position(|s| s.offset >= merged.offset)
            .unwrap_or(self.free.len());
        self.free.insert(idx, merged);
    }

    /// Resizes an existing allocation in place where possible (shrinking
    /// always succeeds in place; growing succeeds in place only if the
    /// following bytes are free or the slot is already at the stream's
    /// tail), falling back to release-then-reserve otherwise.
    pub fn replace(&mut self, old: Slot, new_length: u64) -> Slot {
        if new_length <= old.length {
            if new_length < old.length {
                self.release(Slot::new(old.offset + new_length, old.length - new_length));
            }
            return Slot::new(old.offset, new_length);
        }

        let extra = new_length - old.length;

        if old.end() == self.end {
            self.end += extra;
            return Slot::new(old.offset, new_length);
        }

        if let Some(idx) = self.free.iter().position(|s| s.offset == old.end()) {
            if self.free[idx].length >= extra {
                if self.free[idx].length == extra {
                    self.free.remove(idx);
                } else {
                    self.free[idx] = Slot::new(self.free[idx].offset + extra, self.free[idx].length - extra);
                }
                return Slot::new(old.offset, new_length);
            }
        }

        self.release(old);
        self.reserve(new_length)
    }

    /// Produces a plan that repacks `live` (the currently occupied slots,
    /// any order) to the front of the stream with no gaps, eliminating every
    /// free range. Slots already at their packed position are omitted from
    /// the move list.
    #[must_use]
    pub fn compaction_plan(&self, live: &[Slot]) -> CompactionPlan {
        let mut ordered: Vec<Slot> = live.to_vec();
        ordered.sort_by_key(|s| s.offset);

        let mut moves = Vec::new();
        let mut cursor = 0u64;
        for slot in ordered {
            if slot.offset != cursor {
                moves.push(CompactionMove {
                    from_offset: slot.offset,
                    to_offset: cursor,
                    length: slot.length,
                });
            }
            cursor += slot.length;
        }

        CompactionPlan { moves, new_end: cursor }
    }

    /// Applies a plan by replacing this free list's state with the packed,
    /// gap-free layout it describes. Callers move the underlying bytes
    /// themselves (per [`CompactionMove`]) before calling this.
    pub fn reset_after_compaction(&mut self, plan: &CompactionPlan) {
        self.free.clear();
        self.end = plan.new_end;
    }
}
