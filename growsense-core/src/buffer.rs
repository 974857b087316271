//! Fixed-Size Rolling Window
//!
//! ## Overview
//!
//! A ring buffer of the most recent `N` readings, used where a value has to
//! be smoothed across polling cycles (CPU temperature for drift compensation).
//! Capacity is a const generic, so the window never touches the heap.
//!
//! Per-cycle sample buffers are a different thing: they are filled and thrown
//! away inside one sampling cycle (see [`crate::sampling`]). This window
//! outlives cycles.
//!
//! ### Memory Layout
//!
//! ```text
//! RollingWindow<5>:
//! ┌─────┬─────┬─────┬─────┬─────┐
//! │  0  │  1  │  2  │  3  │  4  │  ← slots
//! └─────┴─────┴─────┴─────┴─────┘
//!    ↑
//!    └── write_pos: next slot to overwrite once full
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use growsense_core::buffer::RollingWindow;
//!
//! // Seed with the first reading, as the compensation loop does
//! let mut cpu: RollingWindow<5> = RollingWindow::filled(48.0);
//! cpu.push(53.0);
//!
//! assert_eq!(cpu.mean(), Some(49.0));
//! ```

/// Fixed-size ring buffer of `f32` readings
///
/// Overwrites the oldest reading when full. Not thread-safe; wrap it in a
/// mutex if shared.
#[derive(Debug, Clone)]
pub struct RollingWindow<const N: usize> {
    data: [f32; N],
    write_pos: usize,
    len: usize,
}

impl<const N: usize> RollingWindow<N> {
    /// Empty window
    pub const fn new() -> Self {
        Self {
            data: [0.0; N],
            write_pos: 0,
            len: 0,
        }
    }

    /// Window already full of `value`
    pub const fn filled(value: f32) -> Self {
        Self {
            data: [value; N],
            write_pos: 0,
            len: N,
        }
    }

    /// Add a reading, dropping the oldest when full
    pub fn push(&mut self, value: f32) {
        self.data[self.write_pos] = value;
        self.write_pos = (self.write_pos + 1) % N;

        if self.len < N {
            self.len += 1;
        }
    }

    /// Number of stored readings
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if window is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if window is full
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Most recent reading
    pub fn last(&self) -> Option<f32> {
        if self.is_empty() {
            return None;
        }
        let idx = if self.write_pos == 0 { N - 1 } else { self.write_pos - 1 };
        Some(self.data[idx])
    }

    /// Arithmetic mean of the stored readings
    pub fn mean(&self) -> Option<f32> {
        if self.is_empty() {
            return None;
        }
        Some(self.iter().sum::<f32>() / self.len as f32)
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        // Until the window is full the oldest reading sits at slot 0
        let start = if self.len < N { 0 } else { self.write_pos };
        (0..self.len).map(move |i| self.data[(start + i) % N])
    }

    /// Forget all readings
    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.len = 0;
    }
}

impl<const N: usize> Default for RollingWindow<N> {
    fn default() -> Self {
        Self::new()
    }
}
