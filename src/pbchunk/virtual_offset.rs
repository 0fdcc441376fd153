use std::fmt;

/// BGZF virtual file offset: the compressed block start in the upper 48
/// bits and the offset into the uncompressed block in the lower 16.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct VirtualOffset(u64);

impl VirtualOffset {
    pub fn new(raw: u64) -> Self {
        VirtualOffset(raw)
    }

    pub fn from_parts(block_offset: u64, within_block: u16) -> Self {
        VirtualOffset((block_offset << 16) | u64::from(within_block))
    }

    /// Returns the file offset of the compressed block holding the record.
    pub fn block_offset(&self) -> u64 {
        self.0 >> 16
    }

    pub fn within_block(&self) -> u16 {
        (self.0 & 0xffff) as u16
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for VirtualOffset {
    fn from(raw: u64) -> Self {
        VirtualOffset(raw)
    }
}

impl fmt::Display for VirtualOffset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.block_offset(), self.within_block())
    }
}
