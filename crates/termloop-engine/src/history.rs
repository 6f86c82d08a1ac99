use termloop_types::{Error, Result};

/// Fixed-capacity ring of committed input lines.
///
/// Index 0 is always the most recently pushed entry; index `k` is the entry
/// pushed `k` operations before it. Pushing onto a full buffer silently
/// overwrites the logically oldest slot. All operations are O(1).
///
/// No internal synchronization; the console engine serializes access.
#[derive(Debug)]
pub struct HistoryBuffer {
    slots: Vec<Option<String>>,
    head: usize,
    len: usize,
}

impl HistoryBuffer {
    /// Capacity must be at least 1; it is fixed for the buffer's lifetime.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: vec![None; capacity],
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Push a new most-recent entry. Never fails; when the buffer is full the
    /// oldest entry is discarded without notice.
    pub fn push(&mut self, item: String) {
        if self.len > 0 {
            self.head = (self.head + 1) % self.capacity();
        }
        self.slots[self.head] = Some(item);
        if self.len < self.capacity() {
            self.len += 1;
        }
    }

    /// Remove and return the most-recent entry.
    pub fn pop(&mut self) -> Result<String> {
        let item = self.slots[self.head].take().ok_or(Error::EmptyBuffer)?;
        self.len -= 1;
        if self.len > 0 {
            self.head = (self.head + self.capacity() - 1) % self.capacity();
        }
        Ok(item)
    }

    /// The most-recent entry, without removing it.
    pub fn top(&self) -> Result<&str> {
        self.element_at(0)
    }

    /// The entry `k` pushes below the top, 0-based.
    pub fn element_at(&self, k: usize) -> Result<&str> {
        if self.len == 0 {
            return Err(Error::EmptyBuffer);
        }
        if k >= self.len {
            return Err(Error::IndexOutOfRange {
                index: k,
                len: self.len,
            });
        }
        let slot = (self.head + self.capacity() - k) % self.capacity();
        // Slots inside [0, len) are always occupied
        Ok(self.slots[slot].as_deref().unwrap_or_default())
    }

    pub fn has_element_at(&self, k: usize) -> bool {
        k < self.len
    }
}
