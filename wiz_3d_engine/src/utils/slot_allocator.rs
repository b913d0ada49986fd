/// Bounded pool of binding slot indices with lowest-first allocation.
///
/// Explicitly annotated slots are reserved up front; unannotated
/// declarations then take the lowest index still free, so assignment is
/// deterministic for a given declaration order.
///
/// # Example
///
/// ```ignore
/// let mut alloc = SlotAllocator::new(14);
/// alloc.reserve(0);       // b0 claimed by an annotation
/// alloc.alloc_lowest();   // Some(1)
/// alloc.alloc_lowest();   // Some(2)
/// ```
pub struct SlotAllocator {
    used: Vec<bool>,
    len: u32,
}

impl SlotAllocator {
    /// Create an allocator over slots `0..capacity`
    pub fn new(capacity: u32) -> Self {
        Self {
            used: vec![false; capacity as usize],
            len: 0,
        }
    }

    /// Claim a specific slot
    ///
    /// Returns `false` if the slot is out of range or already taken.
    pub fn reserve(&mut self, slot: u32) -> bool {
        match self.used.get_mut(slot as usize) {
            Some(taken) if !*taken => {
                *taken = true;
                self.len += 1;
                true
            }
            _ => false,
        }
    }

    /// Claim the lowest free slot, or `None` when every slot is taken
    pub fn alloc_lowest(&mut self) -> Option<u32> {
        let index = self.used.iter().position(|taken| !taken)?;
        self.used[index] = true;
        self.len += 1;
        Some(index as u32)
    }

    /// Whether `slot` is currently claimed
    pub fn is_taken(&self, slot: u32) -> bool {
        self.used.get(slot as usize).copied().unwrap_or(false)
    }

    /// Total number of slots managed
    pub fn capacity(&self) -> u32 {
        self.used.len() as u32
    }

    /// Number of currently claimed slots
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether no slots are currently claimed
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "slot_allocator_tests.rs"]
mod tests;
