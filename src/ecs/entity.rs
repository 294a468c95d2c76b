//! Entity identifiers and allocation

use std::fmt;

/// Opaque entity identifier.
///
/// Issued in increasing order starting at 1 and never recycled, so the raw
/// value `0` is free for callers to use as a "no entity" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u64);

impl EntityId {
    /// Sentinel that the allocator never issues.
    pub const NULL: EntityId = EntityId(0);

    pub fn to_bits(self) -> u64 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// Entity allocator
///
/// A plain monotonic counter. The counter wraps at 2^64 instead of
/// overflowing; ids are not reissued before that.
pub struct EntityAllocator {
    next_id: u64,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> u64 {
        self.next_id.wrapping_sub(1)
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_allocation() {
        let mut allocator = EntityAllocator::new();

        let e1 = allocator.allocate();
        assert_eq!(e1.to_bits(), 1);
        assert!(!e1.is_null());

        let e2 = allocator.allocate();
        assert_eq!(e2.to_bits(), 2);
        assert!(e2 > e1);

        assert_eq!(allocator.issued(), 2);
    }

    #[test]
    fn test_null_is_never_issued() {
        let mut allocator = EntityAllocator::new();
        for _ in 0..1_000 {
            assert_ne!(allocator.allocate(), EntityId::NULL);
        }
    }

    #[test]
    fn test_display() {
        let mut allocator = EntityAllocator::new();
        let e = allocator.allocate();
        assert_eq!(e.to_string(), "entity#1");
    }
}
