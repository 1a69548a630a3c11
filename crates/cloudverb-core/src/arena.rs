//! Fixed-capacity bump arena for DSP buffers
//!
//! Every delay buffer and per-block scratch buffer in the engine is carved out
//! of one [`Arena`] during construction. Nothing is ever returned to the arena;
//! the whole region is released when the arena itself is dropped, which the
//! borrow checker only allows once every component holding a slice is gone.
//!
//! ```ignore
//! let mut arena = Arena::new(ReverbChannel::required_bytes(&config));
//! let mut alloc = arena.allocator();
//! let channel = ReverbChannel::new(&config, &mut alloc)?;
//! ```

use std::mem;

use bytemuck::Pod;

use crate::error::ArenaError;

/// Alignment guaranteed by the backing storage
const STORAGE_ALIGN: usize = mem::align_of::<u64>();

/// Owned backing memory for an [`ArenaAllocator`]
pub struct Arena {
    /// Stored as words so the region starts 8-byte aligned
    storage: Box<[u64]>,
    capacity: usize,
}

impl Arena {
    /// Create an arena with room for `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        let words = capacity.div_ceil(STORAGE_ALIGN);
        log::debug!("Arena::new: {} bytes", capacity);
        Self {
            storage: vec![0u64; words].into_boxed_slice(),
            capacity,
        }
    }

    /// Total bytes this arena can hand out
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Start handing out slices from the beginning of the arena
    ///
    /// The returned allocator borrows the arena for as long as any slice it
    /// produced is alive.
    pub fn allocator(&mut self) -> ArenaAllocator<'_> {
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut self.storage[..]);
        ArenaAllocator {
            free: &mut bytes[..self.capacity],
            capacity: self.capacity,
            used: 0,
            allocation_count: 0,
        }
    }
}

/// Bump-pointer allocator over an [`Arena`]
pub struct ArenaAllocator<'a> {
    /// Unclaimed tail of the arena
    free: &'a mut [u8],
    capacity: usize,
    used: usize,
    allocation_count: usize,
}

impl<'a> ArenaAllocator<'a> {
    /// Claim a zeroed slice of `count` elements
    ///
    /// Padding needed to align the slice counts against capacity. Exact fits
    /// succeed; anything larger than what remains fails without consuming
    /// memory.
    pub fn allocate<T: Pod>(&mut self, count: usize) -> Result<&'a mut [T], ArenaError> {
        let align = mem::align_of::<T>();
        if align > STORAGE_ALIGN {
            return Err(ArenaError::UnsupportedAlignment(align));
        }

        let addr = self.free.as_ptr() as usize;
        let padding = ((addr + align - 1) & !(align - 1)) - addr;
        let size = count.saturating_mul(mem::size_of::<T>());
        let needed = padding.saturating_add(size);

        if needed > self.free.len() {
            let err = ArenaError::Exhausted {
                requested: needed,
                available: self.free.len(),
            };
            log::error!("ArenaAllocator::allocate: {}", err);
            return Err(err);
        }

        let free = mem::take(&mut self.free);
        let (head, tail) = free.split_at_mut(needed);
        self.free = tail;
        self.used += needed;
        self.allocation_count += 1;

        let slice: &'a mut [T] = bytemuck::try_cast_slice_mut(&mut head[padding..])
            .map_err(|_| ArenaError::UnsupportedAlignment(align))?;
        slice.fill(T::zeroed());
        Ok(slice)
    }

    /// Claim a zeroed `f32` buffer
    #[inline]
    pub fn allocate_samples(&mut self, count: usize) -> Result<&'a mut [f32], ArenaError> {
        self.allocate::<f32>(count)
    }

    /// Total bytes this allocator started with
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes handed out so far, padding included
    pub fn used(&self) -> usize {
        self.used
    }

    /// Bytes still available
    pub fn remaining(&self) -> usize {
        self.free.len()
    }

    /// Number of successful allocations
    pub fn allocation_count(&self) -> usize {
        self.allocation_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_fit_succeeds() {
        let mut arena = Arena::new(64);
        let mut alloc = arena.allocator();
        let buf = alloc.allocate::<f32>(16).unwrap();
        assert_eq!(buf.len(), 16);
        assert_eq!(alloc.remaining(), 0);
        assert_eq!(alloc.used(), 64);
    }

    #[test]
    fn test_one_byte_over_fails() {
        let mut arena = Arena::new(64);
        let mut alloc = arena.allocator();
        alloc.allocate::<f32>(15).unwrap();
        let err = alloc.allocate::<u8>(5).unwrap_err();
        assert_eq!(
            err,
            ArenaError::Exhausted {
                requested: 5,
                available: 4
            }
        );
        // Failed request consumes nothing
        assert_eq!(alloc.remaining(), 4);
        assert_eq!(alloc.allocation_count(), 1);
    }

    #[test]
    fn test_allocations_do_not_overlap() {
        let mut arena = Arena::new(1024);
        let mut alloc = arena.allocator();
        let a = alloc.allocate::<f32>(10).unwrap();
        let b = alloc.allocate::<f32>(10).unwrap();
        a.fill(1.0);
        b.fill(2.0);
        assert!(a.iter().all(|&x| x == 1.0));
        assert!(b.iter().all(|&x| x == 2.0));

        let a_end = a.as_ptr() as usize + a.len() * 4;
        assert!(b.as_ptr() as usize >= a_end, "Second slice must start after the first");
        assert_eq!(alloc.allocation_count(), 2);
    }

    #[test]
    fn test_padding_counts_against_capacity() {
        let mut arena = Arena::new(16);
        let mut alloc = arena.allocator();
        alloc.allocate::<u8>(1).unwrap();
        // Next f64 starts at offset 8
        let d = alloc.allocate::<f64>(1).unwrap();
        assert_eq!(d[0], 0.0);
        assert_eq!(alloc.used(), 16);
        assert!(alloc.allocate::<u8>(1).is_err());
    }

    #[test]
    fn test_allocations_start_zeroed() {
        let mut arena = Arena::new(64);
        {
            let mut alloc = arena.allocator();
            alloc.allocate::<f32>(16).unwrap().fill(3.0);
        }
        let mut alloc = arena.allocator();
        assert!(alloc.allocate::<f32>(16).unwrap().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_zero_length_allocation() {
        let mut arena = Arena::new(0);
        let mut alloc = arena.allocator();
        assert!(alloc.allocate::<f32>(0).unwrap().is_empty());
        assert!(alloc.allocate::<f32>(1).is_err());
    }
}
