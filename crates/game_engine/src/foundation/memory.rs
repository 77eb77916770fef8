//! Memory management utilities
//!
//! Two allocators used for per-frame scratch data and fixed-size object
//! pools. Neither hands out raw pointers: the stack allocator returns byte
//! ranges into its own buffer and the pool returns ids.

use super::collections::FreeList;
use thiserror::Error;

/// Allocator errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// Not enough space left in the allocator
    #[error("Out of memory: requested {requested} bytes, {available} available")]
    OutOfMemory {
        /// Bytes requested including alignment padding
        requested: usize,
        /// Bytes left in the allocator
        available: usize,
    },

    /// Alignment was zero or not a power of two
    #[error("Invalid alignment: {0}")]
    InvalidAlignment(usize),

    /// Marker does not belong to the current stack state
    #[error("Invalid marker {marker}: current top is {top}")]
    InvalidMarker {
        /// Marker offset
        marker: usize,
        /// Current top of stack
        top: usize,
    },

    /// Pool has no free slots left
    #[error("Pool exhausted: capacity {0}")]
    PoolExhausted(usize),
}

/// A region handed out by [`StackAllocator::allocate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    /// Byte offset into the allocator buffer
    pub offset: usize,
    /// Size in bytes
    pub size: usize,
}

/// Saved stack position for bulk release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker(usize);

/// Stack allocator for temporary allocations
///
/// Allocations are released in bulk by rolling back to a [`Marker`] or by
/// [`StackAllocator::reset`] at the end of a frame.
pub struct StackAllocator {
    data: Vec<u8>,
    top: usize,
}

impl StackAllocator {
    /// Create a new stack allocator with a fixed capacity in bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            top: 0,
        }
    }

    /// Reserve `size` bytes aligned to `align`
    pub fn allocate(&mut self, size: usize, align: usize) -> Result<Allocation, MemoryError> {
        if align == 0 || !align.is_power_of_two() {
            return Err(MemoryError::InvalidAlignment(align));
        }

        let offset = (self.top + align - 1) & !(align - 1);
        let end = offset.checked_add(size).ok_or(MemoryError::OutOfMemory {
            requested: size,
            available: self.available(),
        })?;

        if end > self.data.len() {
            return Err(MemoryError::OutOfMemory {
                requested: end - self.top,
                available: self.available(),
            });
        }

        self.top = end;
        Ok(Allocation { offset, size })
    }

    /// Copy bytes into a fresh allocation
    pub fn push_bytes(&mut self, bytes: &[u8], align: usize) -> Result<Allocation, MemoryError> {
        let allocation = self.allocate(bytes.len(), align)?;
        self.data[allocation.offset..allocation.offset + allocation.size].copy_from_slice(bytes);
        Ok(allocation)
    }

    /// Bytes of an allocation
    pub fn bytes(&self, allocation: Allocation) -> &[u8] {
        &self.data[allocation.offset..allocation.offset + allocation.size]
    }

    /// Mutable bytes of an allocation
    pub fn bytes_mut(&mut self, allocation: Allocation) -> &mut [u8] {
        &mut self.data[allocation.offset..allocation.offset + allocation.size]
    }

    /// Current top of stack
    pub fn marker(&self) -> Marker {
        Marker(self.top)
    }

    /// Release everything allocated after `marker`
    pub fn free_to_marker(&mut self, marker: Marker) -> Result<(), MemoryError> {
        if marker.0 > self.top {
            return Err(MemoryError::InvalidMarker {
                marker: marker.0,
                top: self.top,
            });
        }
        self.top = marker.0;
        Ok(())
    }

    /// Release everything
    pub fn reset(&mut self) {
        self.top = 0;
    }

    /// Bytes in use
    pub fn used(&self) -> usize {
        self.top
    }

    /// Bytes remaining
    pub fn available(&self) -> usize {
        self.data.len() - self.top
    }

    /// Total capacity in bytes
    pub fn capacity(&self) -> usize {
        self.data.len()
    }
}

/// Identifier of an object held by a [`PoolAllocator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolId(usize);

/// Memory pool allocator for fixed-size objects
pub struct PoolAllocator<T> {
    slots: FreeList<T>,
    capacity: usize,
}

impl<T> PoolAllocator<T> {
    /// Create a new pool that holds at most `capacity` objects
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: FreeList::new(),
            capacity,
        }
    }

    /// Place a value in the pool
    pub fn acquire(&mut self, value: T) -> Result<PoolId, MemoryError> {
        if self.slots.len() >= self.capacity {
            return Err(MemoryError::PoolExhausted(self.capacity));
        }
        Ok(PoolId(self.slots.insert(value)))
    }

    /// Take a value out of the pool, freeing its slot
    pub fn release(&mut self, id: PoolId) -> Option<T> {
        self.slots.remove(id.0)
    }

    /// Borrow a pooled value
    pub fn get(&self, id: PoolId) -> Option<&T> {
        self.slots.get(id.0)
    }

    /// Mutably borrow a pooled value
    pub fn get_mut(&mut self, id: PoolId) -> Option<&mut T> {
        self.slots.get_mut(id.0)
    }

    /// Number of objects in the pool
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the pool holds no objects
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Free slots remaining
    pub fn available(&self) -> usize {
        self.capacity - self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_alignment_and_markers() {
        let mut stack = StackAllocator::new(64);
        let a = stack.allocate(3, 1).unwrap();
        assert_eq!(a.offset, 0);

        let marker = stack.marker();
        let b = stack.allocate(8, 8).unwrap();
        assert_eq!(b.offset, 8);
        assert_eq!(stack.used(), 16);

        stack.free_to_marker(marker).unwrap();
        assert_eq!(stack.used(), 3);

        stack.reset();
        assert_eq!(stack.available(), 64);
    }

    #[test]
    fn test_stack_out_of_memory_and_bad_alignment() {
        let mut stack = StackAllocator::new(16);
        stack.allocate(10, 1).unwrap();
        assert!(matches!(stack.allocate(8, 4), Err(MemoryError::OutOfMemory { .. })));
        assert_eq!(stack.allocate(1, 3), Err(MemoryError::InvalidAlignment(3)));
        // Failed allocation leaves the stack untouched
        assert_eq!(stack.used(), 10);
    }

    #[test]
    fn test_stack_rejects_marker_above_top() {
        let mut stack = StackAllocator::new(32);
        stack.allocate(16, 1).unwrap();
        let high = stack.marker();
        stack.reset();
        assert!(matches!(stack.free_to_marker(high), Err(MemoryError::InvalidMarker { .. })));
    }

    #[test]
    fn test_push_bytes_roundtrip() {
        let mut stack = StackAllocator::new(32);
        let alloc = stack.push_bytes(&[1, 2, 3, 4], 4).unwrap();
        assert_eq!(stack.bytes(alloc), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_pool_capacity() {
        let mut pool = PoolAllocator::new(2);
        let a = pool.acquire("a").unwrap();
        pool.acquire("b").unwrap();
        assert_eq!(pool.acquire("c"), Err(MemoryError::PoolExhausted(2)));

        assert_eq!(pool.release(a), Some("a"));
        assert_eq!(pool.available(), 1);
        assert!(pool.acquire("c").is_ok());
    }
}
