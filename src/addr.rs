//! Address decomposition for a set-associative cache.
//!
//! A 64-bit address is partitioned, least-significant bits first, into
//! `block_bits` offset bits, `set_bits` set-index bits, and the remaining
//! `64 - block_bits - set_bits` tag bits:
//!
//! ```text
//!   63                                      s+b        b          0
//!   ┌────────────────────────────────────────┬──────────┬──────────┐
//!   │                  tag                   │ set index│  offset  │
//!   └────────────────────────────────────────┴──────────┴──────────┘
//!                                              set_bits   block_bits
//! ```
//!
//! All three extractors are pure functions of an address plus a fixed
//! [`Geometry`]; any 64-bit input is valid. The only error condition is a
//! geometry that does not fit the address width, caught once at
//! construction rather than per access.

use crate::error::ConfigError;

/// Address width the simulator models, in bits.
pub const ADDRESS_BITS: u32 = 64;

/// Mask with the low `bits` bits set.
#[inline]
fn low_mask(bits: u32) -> u64 {
    if bits >= ADDRESS_BITS {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Fixed cache geometry: how an address splits into fields, and how many
/// lines each set holds.
///
/// Validated once by [`Geometry::new`]; immutable afterwards, so the
/// per-access extractors never need to re-check it.
///
/// # Example
///
/// ```
/// use waycache::addr::Geometry;
///
/// let g = Geometry::new(4, 8, 2).unwrap();
/// assert_eq!(g.num_sets(), 256);
/// assert_eq!(g.tag_bits(), 52);
///
/// // 16-byte blocks: offsets within a block share one block address
/// assert_eq!(g.block_address(0x1234), 0x1230);
/// assert_eq!(g.set_index(0x1234), 0x23);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    block_bits: u32,
    set_bits: u32,
    lines_per_set: usize,
}

impl Geometry {
    /// Creates a geometry with `block_bits` offset bits, `set_bits` index
    /// bits, and `lines_per_set` lines of associativity per set.
    ///
    /// Returns a [`ConfigError`] if `lines_per_set` is zero or the offset
    /// and index fields together exceed the 64-bit address width.
    pub fn new(block_bits: u32, set_bits: u32, lines_per_set: usize) -> Result<Self, ConfigError> {
        if lines_per_set == 0 {
            return Err(ConfigError::new("lines per set must be > 0"));
        }
        if block_bits.checked_add(set_bits).map_or(true, |used| used > ADDRESS_BITS) {
            return Err(ConfigError::new(format!(
                "block bits ({}) + set bits ({}) exceed the {}-bit address width",
                block_bits, set_bits, ADDRESS_BITS
            )));
        }
        // 2^set_bits sets must be indexable in memory.
        if set_bits >= usize::BITS {
            return Err(ConfigError::new(format!(
                "set bits ({}) too large to allocate",
                set_bits
            )));
        }
        Ok(Self {
            block_bits,
            set_bits,
            lines_per_set,
        })
    }

    /// Number of block offset bits.
    #[inline]
    pub fn block_bits(&self) -> u32 {
        self.block_bits
    }

    /// Number of set index bits.
    #[inline]
    pub fn set_bits(&self) -> u32 {
        self.set_bits
    }

    /// Number of tag bits (`64 - block_bits - set_bits`).
    #[inline]
    pub fn tag_bits(&self) -> u32 {
        ADDRESS_BITS - self.block_bits - self.set_bits
    }

    /// Lines per set (associativity).
    #[inline]
    pub fn lines_per_set(&self) -> usize {
        self.lines_per_set
    }

    /// Number of sets (`2^set_bits`).
    #[inline]
    pub fn num_sets(&self) -> usize {
        1usize << self.set_bits
    }

    /// Returns the block-aligned address: `addr` with the low `block_bits`
    /// offset bits cleared. Masks in place, does not shift.
    ///
    /// This is the identity lines are compared, inserted, and evicted by.
    #[inline]
    pub fn block_address(&self, addr: u64) -> u64 {
        addr & !low_mask(self.block_bits)
    }

    /// Returns the set index: the `set_bits`-wide field immediately above
    /// the offset bits. Always in `[0, num_sets())`.
    #[inline]
    pub fn set_index(&self, addr: u64) -> u64 {
        (addr >> self.block_bits) & low_mask(self.set_bits)
    }

    /// Returns the tag: the top `tag_bits()` bits of the address.
    #[inline]
    pub fn tag(&self, addr: u64) -> u64 {
        let tag_bits = self.tag_bits();
        if tag_bits == 0 {
            return 0;
        }
        (addr >> (ADDRESS_BITS - tag_bits)) & low_mask(tag_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_lines_per_set() {
        assert!(Geometry::new(4, 2, 0).is_err());
    }

    #[test]
    fn test_rejects_oversized_fields() {
        assert!(Geometry::new(33, 32, 1).is_err());
        // Exactly 64 bits of offset + index leaves a zero-width tag; legal.
        assert!(Geometry::new(32, 32, 1).is_ok());
    }

    #[test]
    fn test_field_widths() {
        let g = Geometry::new(6, 10, 4).unwrap();
        assert_eq!(g.block_bits(), 6);
        assert_eq!(g.set_bits(), 10);
        assert_eq!(g.tag_bits(), 48);
        assert_eq!(g.num_sets(), 1024);
        assert_eq!(g.lines_per_set(), 4);
    }

    #[test]
    fn test_block_address_masks_without_shifting() {
        let g = Geometry::new(4, 4, 2).unwrap();
        assert_eq!(g.block_address(0x0000), 0x0000);
        assert_eq!(g.block_address(0x000f), 0x0000);
        assert_eq!(g.block_address(0x1234), 0x1230);
        assert_eq!(g.block_address(u64::MAX), u64::MAX & !0xf);
    }

    #[test]
    fn test_set_index_range() {
        let g = Geometry::new(2, 3, 2).unwrap();
        for addr in [0u64, 0x4, 0x1f, 0xffff, u64::MAX] {
            assert!(g.set_index(addr) < g.num_sets() as u64);
        }
        // Bit 2 selects between set 0 and set 1 with block_bits = 2
        let g = Geometry::new(2, 1, 1).unwrap();
        assert_eq!(g.set_index(0x0), 0);
        assert_eq!(g.set_index(0x4), 1);
    }

    #[test]
    fn test_tag_takes_top_bits() {
        let g = Geometry::new(4, 4, 2).unwrap();
        assert_eq!(g.tag(0x0000), 0);
        assert_eq!(g.tag(0xdead_beef_0000_0100), 0xdead_beef_0000_01);
        assert_eq!(g.tag(u64::MAX), low_mask(56));
    }

    #[test]
    fn test_zero_width_tag() {
        let g = Geometry::new(32, 32, 1).unwrap();
        assert_eq!(g.tag(u64::MAX), 0);
    }

    #[test]
    fn test_fields_partition_the_address() {
        // Reassembling offset | set | tag must reproduce the address.
        let g = Geometry::new(5, 7, 2).unwrap();
        for addr in [0u64, 1, 0x42, 0xdead_beef, 0x0123_4567_89ab_cdef, u64::MAX] {
            let offset = addr & ((1 << 5) - 1);
            let rebuilt = offset
                | (g.set_index(addr) << g.block_bits())
                | (g.tag(addr) << (g.block_bits() + g.set_bits()));
            assert_eq!(rebuilt, addr);
            // block_address is offset bits cleared, nothing more
            assert_eq!(g.block_address(addr), addr & !((1 << 5) - 1));
        }
    }
}
