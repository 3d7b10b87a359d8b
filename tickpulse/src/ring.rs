//! Fixed-capacity ring arena.
//!
//! Slots start empty (`None`) and are overwritten in place by a write cursor, so memory
//! never grows past `N`. Readers only get ordered iteration, never raw slot indices.

/// Ring buffer of exactly `N` slots with an explicit write cursor.
///
/// The value written `i` pushes before the most recent one lives at slot
/// `(head - 1 - i + N) % N`.
#[derive(Debug, Clone)]
pub struct FixedRing<T, const N: usize> {
    slots: [Option<T>; N],
    head: usize,
    len: usize,
}

impl<T, const N: usize> FixedRing<T, N> {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            head: 0,
            len: 0,
        }
    }

    /// Overwrite the slot under the cursor and advance it, evicting the oldest value
    /// once full.
    pub fn push(&mut self, value: T) {
        self.slots[self.head] = Some(value);
        self.head = (self.head + 1) % N;
        self.len = (self.len + 1).min(N);
    }

    /// All `N` slots, oldest first. Unwritten slots appear first as `None`.
    pub fn chronological(&self) -> impl Iterator<Item = Option<&T>> + '_ {
        (0..N).map(move |i| self.slots[(self.head + i) % N].as_ref())
    }

    /// All `N` slots, most recent first. Unwritten slots appear last as `None`.
    pub fn recent_first(&self) -> impl Iterator<Item = Option<&T>> + '_ {
        (0..N).map(move |i| self.slots[(self.head + N - 1 - i) % N].as_ref())
    }

    /// Most recently pushed value
    pub fn latest(&self) -> Option<&T> {
        self.slots[(self.head + N - 1) % N].as_ref()
    }

    /// Number of written slots, at most `N`.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T, const N: usize> Default for FixedRing<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
