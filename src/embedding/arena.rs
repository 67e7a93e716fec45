//! Fixed-size row vectors shared between training threads.
//!
//! Each scalar is an `f32` stored as bits in an `AtomicU32`. Reads are relaxed
//! loads and writes are per-scalar atomic adds, so concurrent workers may
//! interleave updates to the same row (Hogwild). No operation ever locks the
//! whole matrix. A caller that wants a consistent view of one row can take a
//! [`RowLease`], which excludes other lease holders of that row but not
//! lease-free writers.

use crossbeam::utils::Backoff;
use ndarray::Array2;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// A `rows × dim` matrix of atomically updated `f32`s.
pub struct RowArena {
    rows: usize,
    dim: usize,
    data: Box<[AtomicU32]>,
    leases: Box<[AtomicBool]>,
}

impl std::fmt::Debug for RowArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowArena")
            .field("rows", &self.rows)
            .field("dim", &self.dim)
            .finish()
    }
}

impl RowArena {
    /// All-zero arena.
    pub fn zeros(rows: usize, dim: usize) -> Self {
        Self::from_fn(rows, dim, |_, out| out.fill(0.0))
    }

    /// Arena whose row `r` is filled by `init(r, row)`.
    pub fn from_fn<F>(rows: usize, dim: usize, mut init: F) -> Self
    where
        F: FnMut(usize, &mut [f32]),
    {
        let mut row = vec![0.0f32; dim];
        let mut data = Vec::with_capacity(rows * dim);
        for r in 0..rows {
            init(r, &mut row);
            data.extend(row.iter().map(|v| AtomicU32::new(v.to_bits())));
        }
        Self {
            rows,
            dim,
            data: data.into_boxed_slice(),
            leases: (0..rows).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Row width.
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    fn cells(&self, row: usize) -> &[AtomicU32] {
        &self.data[row * self.dim..(row + 1) * self.dim]
    }

    /// Copy a row into `out` (`out.len()` must equal `dim`).
    #[inline]
    pub fn read_row(&self, row: usize, out: &mut [f32]) {
        for (o, c) in out.iter_mut().zip(self.cells(row)) {
            *o = f32::from_bits(c.load(Ordering::Relaxed));
        }
    }

    /// Owned copy of a row.
    pub fn row(&self, row: usize) -> Vec<f32> {
        let mut out = vec![0.0; self.dim];
        self.read_row(row, &mut out);
        out
    }

    /// Dot product of a row with `v`.
    #[inline]
    pub fn dot(&self, row: usize, v: &[f32]) -> f32 {
        self.cells(row)
            .iter()
            .zip(v)
            .map(|(c, x)| f32::from_bits(c.load(Ordering::Relaxed)) * x)
            .sum()
    }

    /// `row += scale * v`, one atomic add per scalar.
    #[inline]
    pub fn add_row(&self, row: usize, v: &[f32], scale: f32) {
        for (c, x) in self.cells(row).iter().zip(v) {
            atomic_add(c, scale * x);
        }
    }

    /// `out += scale * row`.
    #[inline]
    pub fn axpy_into(&self, row: usize, scale: f32, out: &mut [f32]) {
        for (o, c) in out.iter_mut().zip(self.cells(row)) {
            *o += scale * f32::from_bits(c.load(Ordering::Relaxed));
        }
    }

    /// Exclusive lease on one row, spinning until other holders release it.
    pub fn lease(&self, row: usize) -> RowLease<'_> {
        let flag = &self.leases[row];
        let backoff = Backoff::new();
        while flag
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            backoff.snooze();
        }
        RowLease {
            arena: self,
            row,
            flag,
        }
    }

    /// Copy the whole arena into a dense matrix.
    pub fn to_array(&self) -> Array2<f32> {
        Array2::from_shape_fn((self.rows, self.dim), |(r, d)| {
            f32::from_bits(self.data[r * self.dim + d].load(Ordering::Relaxed))
        })
    }
}

#[inline]
fn atomic_add(cell: &AtomicU32, delta: f32) {
    let mut current = cell.load(Ordering::Relaxed);
    loop {
        let next = (f32::from_bits(current) + delta).to_bits();
        match cell.compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return,
            Err(actual) => current = actual,
        }
    }
}

/// Row-exclusive access among lease holders. Released on drop.
pub struct RowLease<'a> {
    arena: &'a RowArena,
    row: usize,
    flag: &'a AtomicBool,
}

impl RowLease<'_> {
    /// Leased row index.
    pub fn row(&self) -> usize {
        self.row
    }

    /// Copy the leased row into `out`.
    pub fn read(&self, out: &mut [f32]) {
        self.arena.read_row(self.row, out);
    }

    /// `row += scale * v`.
    pub fn add(&self, v: &[f32], scale: f32) {
        self.arena.add_row(self.row, v, scale);
    }
}

impl Drop for RowLease<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn add_and_read_back() {
        let arena = RowArena::zeros(2, 3);
        arena.add_row(1, &[1.0, 2.0, 3.0], 0.5);
        assert_eq!(arena.row(0), vec![0.0, 0.0, 0.0]);
        assert_eq!(arena.row(1), vec![0.5, 1.0, 1.5]);
        assert!((arena.dot(1, &[2.0, 0.0, 2.0]) - 4.0).abs() < 1e-6);

        let mut acc = vec![1.0; 3];
        arena.axpy_into(1, 2.0, &mut acc);
        assert_eq!(acc, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn concurrent_adds_are_not_lost() {
        let arena = Arc::new(RowArena::zeros(1, 4));
        std::thread::scope(|s| {
            for _ in 0..4 {
                let arena = Arc::clone(&arena);
                s.spawn(move || {
                    for _ in 0..1000 {
                        arena.add_row(0, &[1.0; 4], 1.0);
                    }
                });
            }
        });
        assert_eq!(arena.row(0), vec![4000.0; 4]);
    }

    #[test]
    fn lease_is_released_on_drop() {
        let arena = RowArena::zeros(1, 2);
        {
            let lease = arena.lease(0);
            lease.add(&[1.0, 1.0], 1.0);
        }
        // Would spin forever if the first lease leaked.
        let lease = arena.lease(0);
        let mut out = [0.0; 2];
        lease.read(&mut out);
        assert_eq!(out, [1.0, 1.0]);
        assert_eq!(lease.row(), 0);
    }

    #[test]
    fn to_array_has_arena_shape() {
        let arena = RowArena::from_fn(3, 2, |r, row| row.fill(r as f32));
        let m = arena.to_array();
        assert_eq!(m.dim(), (3, 2));
        assert_eq!(m[[2, 1]], 2.0);
    }
}
