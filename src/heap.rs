//! Bump allocator over a caller-owned backing buffer.
//!
//! Rust port of `heapblock.c`'s "reserve zero, commit later" idiom
//! (`heapblock_alloc`, `heapblock_alloc_aligned`), re-expressed as a typestate
//! so that the single-outstanding-reservation discipline is enforced by the
//! borrow checker instead of documented-only convention.

use crate::error::{BootCodecError, Result};

pub struct Heap<'a> {
    backing: &'a mut [u8],
    high_water: usize,
}

impl<'a> Heap<'a> {
    pub fn new(backing: &'a mut [u8]) -> Self {
        Heap {
            backing,
            high_water: 0,
        }
    }

    #[inline]
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.backing.len() - self.high_water
    }

    /// The backing buffer up to the high-water mark: everything committed so far.
    #[inline]
    pub fn committed(&self) -> &[u8] {
        &self.backing[..self.high_water]
    }

    fn aligned_start(&self, align: usize) -> Result<usize> {
        debug_assert!(align.is_power_of_two());
        self.high_water
            .checked_add(align - 1)
            .map(|v| v & !(align - 1))
            .filter(|&start| start <= self.backing.len())
            .ok_or(BootCodecError::OutputOverflow("heap exhausted"))
    }

    /// Reserves the rest of the buffer (from the next `align`-aligned
    /// position onward) without moving the high-water mark. Only one
    /// `ScratchReservation` may exist at a time — it mutably borrows `self`.
    pub fn reserve_scratch(&mut self, align: usize) -> Result<ScratchReservation<'_, 'a>> {
        let start = self.aligned_start(align)?;
        Ok(ScratchReservation { heap: self, start })
    }

    /// Convenience for `reserve_scratch(align).commit(len)` in one call.
    pub fn alloc_aligned(&mut self, len: usize, align: usize) -> Result<Reservation<'_>> {
        self.reserve_scratch(align)?.commit(len)
    }
}

/// A view of "the rest of the buffer" that has not yet committed to a size.
pub struct ScratchReservation<'h, 'a> {
    heap: &'h mut Heap<'a>,
    start: usize,
}

impl<'h, 'a> ScratchReservation<'h, 'a> {
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.heap.backing[self.start..]
    }

    /// Commits `len` bytes, advancing the heap's high-water mark and yielding
    /// the committed region.
    pub fn commit(self, len: usize) -> Result<Reservation<'h>> {
        let end = self
            .start
            .checked_add(len)
            .filter(|&e| e <= self.heap.backing.len())
            .ok_or(BootCodecError::OutputOverflow("commit exceeds heap capacity"))?;
        self.heap.high_water = end;
        Ok(Reservation {
            region: &mut self.heap.backing[self.start..end],
        })
    }
}

/// A committed region of the backing buffer.
pub struct Reservation<'h> {
    region: &'h mut [u8],
}

impl<'h> Reservation<'h> {
    pub fn as_slice(&self) -> &[u8] {
        self.region
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.region
    }

    pub fn into_mut_slice(self) -> &'h mut [u8] {
        self.region
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_then_commit_advances_high_water() {
        let mut backing = [0u8; 64];
        let mut heap = Heap::new(&mut backing);
        {
            let mut scratch = heap.reserve_scratch(16).unwrap();
            scratch.as_mut_slice()[0] = 42;
            scratch.commit(10).unwrap();
        }
        assert_eq!(heap.high_water(), 10);
    }

    #[test]
    fn alloc_aligned_rounds_up_start() {
        let mut backing = [0u8; 64];
        let mut heap = Heap::new(&mut backing);
        heap.alloc_aligned(3, 16).unwrap();
        assert_eq!(heap.high_water(), 3);
        let next = heap.reserve_scratch(16).unwrap();
        assert_eq!(next.start, 16);
    }

    #[test]
    fn commit_past_capacity_fails() {
        let mut backing = [0u8; 8];
        let mut heap = Heap::new(&mut backing);
        assert!(heap.alloc_aligned(16, 1).is_err());
    }
}
