//! # Address Space
//!
//! This module provides `AddressSpace`, the byte buffer a memory image is
//! loaded into. Logical addresses are relative to a movable base, the
//! *origin*, so an image dumped from ROM at `0x8000` can be viewed at the
//! addresses the CPU saw it at.
//!
//! ## Design Principles
//!
//! The address space follows the same rules as a CPU data bus:
//! - No bus errors - reads always succeed
//! - Reads outside the loaded window return `0x00`
//! - The buffer is immutable once loaded; reloading replaces it wholesale
//!
//! Decoders routinely probe past the end of the image when an instruction is
//! truncated (a 3-byte jump in the last byte, say), so the zero fill is what
//! keeps decoding total.

/// A loaded memory image with a relocatable origin.
///
/// The valid window is `[origin, origin + size)`. Every address inside the
/// window has a stored byte; gaps in a sparse source (Intel HEX records that
/// skip addresses) are filled with zero at load time.
///
/// # Examples
///
/// ```
/// use idis::AddressSpace;
///
/// let mut space = AddressSpace::from_bytes(vec![0xF8, 0x10]);
/// assert_eq!(space.read(0x0001), 0x10);
///
/// // Rebase the image without moving any bytes
/// space.set_origin(0x8000);
/// assert_eq!(space.read(0x8001), 0x10);
/// assert!(space.in_range(0x8000));
/// assert!(!space.in_range(0x0000));
///
/// // Out-of-range reads never fail
/// assert_eq!(space.read(0x9000), 0x00);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressSpace {
    data: Vec<u8>,
    origin: u32,
}

impl AddressSpace {
    /// Creates an empty address space (origin 0, size 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an address space holding `data` at origin 0.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data, origin: 0 }
    }

    /// Reads the byte at logical address `addr`.
    ///
    /// Returns `0x00` for any address outside the valid window.
    pub fn read(&self, addr: u32) -> u8 {
        match self.index_of(addr) {
            Some(idx) => self.data[idx],
            None => 0x00,
        }
    }

    /// Reads a big-endian 16-bit value (high byte at `addr`).
    pub fn read_word_be(&self, addr: u32) -> u16 {
        u16::from_be_bytes([self.read(addr), self.read(addr.wrapping_add(1))])
    }

    /// Reads a little-endian 16-bit value (low byte at `addr`).
    pub fn read_word_le(&self, addr: u32) -> u16 {
        u16::from_le_bytes([self.read(addr), self.read(addr.wrapping_add(1))])
    }

    /// Returns true if `origin <= addr < origin + size`.
    pub fn in_range(&self, addr: u32) -> bool {
        self.index_of(addr).is_some()
    }

    /// Rebases the valid window to start at `addr`.
    ///
    /// Stored bytes are not moved: the first byte of the image simply becomes
    /// visible at `addr`.
    pub fn set_origin(&mut self, addr: u32) {
        self.origin = addr;
    }

    /// First valid logical address.
    pub fn origin(&self) -> u32 {
        self.origin
    }

    /// Number of valid addresses.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Returns true if no image is loaded.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Last valid logical address, or `None` for an empty image.
    ///
    /// An image rebased so high that it would run past `u32::MAX` is cut off
    /// there: bytes beyond the top of the address range are unreachable.
    pub fn end(&self) -> Option<u32> {
        let last = self.data.len().checked_sub(1)?;
        let last = u32::try_from(last).unwrap_or(u32::MAX);
        Some(self.origin.saturating_add(last))
    }

    fn index_of(&self, addr: u32) -> Option<usize> {
        let idx = addr.checked_sub(self.origin)? as usize;
        if idx < self.data.len() {
            Some(idx)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_space_reads_zero() {
        let space = AddressSpace::new();

        assert_eq!(space.size(), 0);
        assert_eq!(space.read(0x0000), 0x00);
        assert!(!space.in_range(0x0000));
        assert_eq!(space.end(), None);
    }

    #[test]
    fn test_window_bounds() {
        let mut space = AddressSpace::from_bytes(vec![0x11, 0x22, 0x33]);
        space.set_origin(0x0100);

        assert!(!space.in_range(0x00FF));
        assert!(space.in_range(0x0100));
        assert!(space.in_range(0x0102));
        assert!(!space.in_range(0x0103));
        assert_eq!(space.end(), Some(0x0102));

        assert_eq!(space.read(0x00FF), 0x00);
        assert_eq!(space.read(0x0100), 0x11);
        assert_eq!(space.read(0x0103), 0x00);
    }

    #[test]
    fn test_word_reads_probe_past_end() {
        let space = AddressSpace::from_bytes(vec![0x12, 0x34, 0x56]);

        assert_eq!(space.read_word_be(0x0000), 0x1234);
        assert_eq!(space.read_word_le(0x0000), 0x3412);
        // High half falls outside the window and reads as zero
        assert_eq!(space.read_word_be(0x0002), 0x5600);
        assert_eq!(space.read_word_le(0x0002), 0x0056);
    }

    #[test]
    fn test_origin_at_top_of_range() {
        let mut space = AddressSpace::from_bytes(vec![0xC3, 0x00, 0x10]);
        space.set_origin(u32::MAX);

        assert!(space.in_range(u32::MAX));
        assert_eq!(space.end(), Some(u32::MAX));
        assert_eq!(space.read(u32::MAX), 0xC3);
        // The word read wraps to address 0, which is outside the window
        assert_eq!(space.read_word_le(u32::MAX), 0x00C3);
    }
}
