/// A fixed-capacity circular buffer of the most recent samples.
///
/// Slots start out unwritten and are overwritten in ring order. The
/// capacity is set at construction and never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    slots: Vec<Option<f64>>,
    cursor: usize,
}

impl Window {
    /// Create a window with `capacity` unwritten slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity >= 1, "window capacity must be at least one");

        Self {
            slots: vec![None; capacity],
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The number of written slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// The slot the next sample will overwrite.
    pub fn write_cursor(&self) -> usize {
        self.cursor
    }

    /// Overwrite the slot under the cursor and advance the cursor.
    pub fn push(&mut self, sample: f64) {
        self.slots[self.cursor] = Some(sample);
        self.cursor = (self.cursor + 1) % self.slots.len();
    }

    /// The arithmetic mean of the written slots, or `None` if nothing has
    /// been written yet.
    ///
    /// Until the window fills, the divisor is the number of written slots
    /// rather than the capacity. A NaN sample makes the mean NaN for as
    /// long as it stays in the window.
    pub fn mean(&self) -> Option<f64> {
        let (sum, count) = self
            .slots
            .iter()
            .flatten()
            .fold((0.0, 0usize), |(sum, count), &sample| (sum + sample, count + 1));

        (count > 0).then(|| sum / count as f64)
    }

    /// Iterate over the written samples, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let (newer, older) = self.slots.split_at(self.cursor);
        older.iter().chain(newer).flatten().copied()
    }
}
