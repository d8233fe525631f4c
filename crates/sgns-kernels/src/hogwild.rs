//! Lock-free shared view over an embedding matrix.
//!
//! Workers of one kernel call read and write the same columns without any
//! synchronization. Each element is a relaxed 32-bit cell: loads and stores
//! are individually atomic (so the program has no undefined behaviour), but
//! an update is a plain load followed by a plain store. Two workers touching
//! the same element can therefore lose one of their updates (Hogwild-style
//! asynchronous SGD). `add` must stay a load followed by a store, never a
//! fetch-add or a locked update.

use std::sync::atomic::{AtomicU32, Ordering};

/// One `f32` element of a shared matrix.
#[derive(Debug, Default)]
#[repr(transparent)]
pub struct HogwildCell {
    bits: AtomicU32,
}

const _: () = {
    assert!(std::mem::size_of::<HogwildCell>() == std::mem::size_of::<f32>());
    assert!(std::mem::align_of::<HogwildCell>() == std::mem::align_of::<f32>());
};

impl HogwildCell {
    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set(&self, value: f32) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Racy `+=`: concurrent adds to the same cell may overwrite each other.
    #[inline]
    pub fn add(&self, x: f32) {
        self.set(self.get() + x);
    }
}

/// Column-per-entry matrix borrowed from the caller for one kernel call.
///
/// Column `v` occupies cells `v * nrows .. (v + 1) * nrows`.
#[derive(Debug, Clone, Copy)]
pub struct SharedMatrix<'a> {
    cells: &'a [HogwildCell],
    nrows: usize,
}

impl<'a> SharedMatrix<'a> {
    /// Borrow `data` exclusively and expose it as shared cells.
    pub fn new(data: &'a mut [f32], nrows: usize) -> Self {
        let len = data.len();
        // SAFETY: `HogwildCell` is a transparent wrapper over `AtomicU32`,
        // whose size and alignment match `f32` (checked at compile time
        // above), and every `f32` bit pattern is a valid `u32`. The exclusive
        // borrow guarantees no other access to `data` exists while the cell
        // view is alive.
        let cells = unsafe { std::slice::from_raw_parts(data.as_mut_ptr().cast::<HogwildCell>(), len) };
        Self { cells, nrows }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Cells of vocabulary entry `id`.
    ///
    /// Callers guarantee `id` is within the vocabulary; an out-of-range id
    /// trips the debug assertion and then the slice bounds check.
    #[inline]
    pub fn column(&self, id: u32) -> &'a [HogwildCell] {
        let range = column_range(id, self.nrows);
        debug_assert!(
            range.end <= self.cells.len(),
            "column id {id} out of bounds for matrix of {} cells with nrows {}",
            self.cells.len(),
            self.nrows
        );
        &self.cells[range]
    }
}

/// Cell range of column `id`. Saturates on overflow so the range lands past
/// any real buffer and the slice check fails instead of wrapping.
#[inline]
fn column_range(id: u32, nrows: usize) -> std::ops::Range<usize> {
    let start = (id as usize).saturating_mul(nrows);
    start..start.saturating_add(nrows)
}

/// Dot product of two columns as currently visible to this worker.
#[inline]
pub fn dot(a: &[HogwildCell], b: &[HogwildCell]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x.get() * y.get()).sum()
}

/// `dst += alpha * src`, element by element, in place.
#[inline]
pub fn axpy(dst: &[HogwildCell], src: &[HogwildCell], alpha: f32) {
    for (d, s) in dst.iter().zip(src) {
        d.add(alpha * s.get());
    }
}

/// Overwrite every cell with zero.
#[inline]
pub fn zero(dst: &[HogwildCell]) {
    for d in dst {
        d.set(0.0);
    }
}
