//! Circular sample buffer over arena memory
//!
//! The single wraparound rule shared by every delay-based component. Reads
//! are addressed by *age*: age 0 is the sample most recently pushed, age 1
//! the one before it, and so on. Ages beyond the capacity clamp to the oldest
//! sample still held.

/// Fixed-capacity circular buffer borrowing its storage from an arena
pub struct RingBuffer<'a> {
    data: &'a mut [f32],
    /// Slot the next push writes to
    write_pos: usize,
}

impl<'a> RingBuffer<'a> {
    /// Wrap a zeroed slice
    pub fn new(data: &'a mut [f32]) -> Self {
        Self { data, write_pos: 0 }
    }

    /// Number of samples held
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Largest age that can be read
    #[inline]
    pub fn max_age(&self) -> usize {
        self.data.len().saturating_sub(1)
    }

    /// Write one sample, overwriting the oldest
    #[inline]
    pub fn push(&mut self, sample: f32) {
        let len = self.data.len();
        if len == 0 {
            return;
        }
        self.data[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos >= len {
            self.write_pos = 0;
        }
    }

    /// Read the sample pushed `age` pushes ago
    #[inline]
    pub fn read(&self, age: usize) -> f32 {
        let len = self.data.len();
        if len == 0 {
            return 0.0;
        }
        let age = age.min(len - 1);
        self.data[(self.write_pos + len - 1 - age) % len]
    }

    /// Zero the contents
    pub fn clear(&mut self) {
        self.data.fill(0.0);
        self.write_pos = 0;
    }
}
