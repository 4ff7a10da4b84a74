//! Cell allocation discipline for the tape.
//!
//! Grounded on the same push/pop/watermark shape a stack-machine register
//! allocator uses over a fixed window, generalized here to an unbounded
//! cell index space: named symbols bump the watermark permanently for the
//! life of their scope, temporaries acquire and release in LIFO order.

use crate::error::{Error, Result};

pub struct TapeAllocator {
    watermark: usize,
    scope_marks: Vec<usize>,
    temp_stack: Vec<usize>,
    high_water_mark: usize,
}

impl TapeAllocator {
    /// `base` is the first cell this allocator may hand out — callers pass
    /// the frame's work origin (0 for globals, 0 for a freshly entered
    /// function frame, or a suffix offset when inlining a call).
    pub fn new(base: usize) -> Self {
        Self {
            watermark: base,
            scope_marks: Vec::new(),
            temp_stack: Vec::new(),
            high_water_mark: base,
        }
    }

    #[must_use]
    pub const fn watermark(&self) -> usize {
        self.watermark
    }

    /// Reserve a fresh cell (or contiguous run, for arrays) at the top of
    /// the current frame.
    pub fn allocate_named(&mut self, cells: usize) -> usize {
        let cell = self.watermark;
        self.watermark += cells;
        self.high_water_mark = self.high_water_mark.max(self.watermark);
        cell
    }

    /// Acquire a single scratch cell; released in LIFO order via
    /// `release_temp`.
    pub fn allocate_temp(&mut self) -> usize {
        let cell = self.watermark;
        self.watermark += 1;
        self.high_water_mark = self.high_water_mark.max(self.watermark);
        self.temp_stack.push(cell);
        cell
    }

    pub fn release_temp(&mut self, cell: usize) {
        let top = self.temp_stack.pop();
        assert_eq!(
            top,
            Some(cell),
            "temporaries must be released in LIFO order"
        );
        self.watermark = cell;
    }

    pub fn enter_scope(&mut self) {
        self.scope_marks.push(self.watermark);
    }

    /// Pop the watermark back to where it was when the matching
    /// `enter_scope` ran. The caller is responsible for emitting the
    /// zeroing code for any cells released this way (the allocator only
    /// tracks indices; it is not the one writing instructions).
    pub fn exit_scope(&mut self) -> std::ops::Range<usize> {
        let mark = self
            .scope_marks
            .pop()
            .expect("exit_scope without matching enter_scope");
        let released = mark..self.watermark;
        self.watermark = mark;
        released
    }

    /// Total cells ever reserved by this allocator; used to size a bounded
    /// tape implementation and to report `Error::Capacity`.
    #[must_use]
    pub const fn high_water_mark(&self) -> usize {
        self.high_water_mark
    }

    pub fn check_capacity(&self, limit: usize) -> Result<()> {
        if self.high_water_mark > limit {
            return Err(Error::capacity(format!(
                "frame requires {} cells, limit is {limit}",
                self.high_water_mark
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_allocation_is_permanent_within_scope() {
        let mut t = TapeAllocator::new(0);
        let a = t.allocate_named(1);
        let b = t.allocate_named(1);
        assert_eq!((a, b), (0, 1));
        assert_eq!(t.watermark(), 2);
    }

    #[test]
    fn temps_release_in_lifo_order() {
        let mut t = TapeAllocator::new(0);
        let a = t.allocate_temp();
        let b = t.allocate_temp();
        assert_eq!((a, b), (0, 1));
        t.release_temp(b);
        assert_eq!(t.watermark(), 1);
        t.release_temp(a);
        assert_eq!(t.watermark(), 0);
    }

    #[test]
    #[should_panic(expected = "LIFO order")]
    fn releasing_out_of_order_panics() {
        let mut t = TapeAllocator::new(0);
        let a = t.allocate_temp();
        let _b = t.allocate_temp();
        t.release_temp(a);
    }

    #[test]
    fn scope_exit_releases_named_and_temp_cells_together() {
        let mut t = TapeAllocator::new(0);
        t.enter_scope();
        t.allocate_named(1);
        t.allocate_named(3); // e.g. an array
        let released = t.exit_scope();
        assert_eq!(released, 0..4);
        assert_eq!(t.watermark(), 0);
    }

    #[test]
    fn high_water_mark_tracks_peak_even_after_release() {
        let mut t = TapeAllocator::new(0);
        t.enter_scope();
        t.allocate_named(5);
        t.exit_scope();
        assert_eq!(t.watermark(), 0);
        assert_eq!(t.high_water_mark(), 5);
    }

    #[test]
    fn capacity_check_flags_oversized_frames() {
        let mut t = TapeAllocator::new(0);
        t.allocate_named(10);
        assert!(t.check_capacity(5).is_err());
        assert!(t.check_capacity(10).is_ok());
    }
}
