//! Core IR and analysis passes for the sift6502 code/data discriminator.
//!
//! Given a raw byte image mapped at a base address, a table of capability
//! flagged segments, and a table of known symbols, the analyzer decides which
//! address ranges hold valid 6502 instruction streams and which hold data,
//! then derives symbols from the discovered code and renders a pseudo
//! assembly listing.
//!
//! # Basic usage
//!
//! ```rust
//! use sift6502::{analysis, symbol, DataBlock};
//!
//! // LDA #$01; RTS at $8000
//! let image = DataBlock::new(0x8000, vec![0xA9, 0x01, 0x60]);
//! let segments = analysis::default_segments();
//! let symbols = Vec::new();
//!
//! let config = analysis::AnalysisConfig {
//!     image: &image,
//!     segments: &segments,
//!     symbols: &symbols,
//!     allow_brk: false,
//! };
//!
//! let blocks = analysis::analyse_code_blocks(&config);
//! assert_eq!(blocks.len(), 1);
//!
//! let new_symbols = symbol::build_symbols(&config, &blocks, false);
//! # let _ = new_symbols;
//! ```

pub mod analysis;
pub mod decoder;
pub mod listing;
pub mod opcode;
pub mod parser;
pub mod symbol;

use std::cmp::Ordering;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::decoder::{ByteCursor, InstrIter};
use crate::opcode::OpInfo;

/// An address in the 6502's 64 KiB address space.
pub type Address = u16;

/// Capability set shared by segments and symbols.
///
/// A symbol's capabilities override segment defaults at that exact address;
/// a segment's capabilities are the default for every address it covers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Caps(u8);

impl Caps {
    pub const NONE: Caps = Caps(0);
    pub const READ: Caps = Caps(1 << 0);
    pub const WRITE: Caps = Caps(1 << 1);
    pub const EXEC: Caps = Caps(1 << 2);
    pub const ALL: Caps = Caps(0b111);

    /// True if this set grants any of the wanted capabilities.
    pub fn grants(self, wanted: Caps) -> bool {
        self.0 & wanted.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Caps {
    type Output = Caps;

    fn bitor(self, rhs: Caps) -> Caps {
        Caps(self.0 | rhs.0)
    }
}

impl BitOrAssign for Caps {
    fn bitor_assign(&mut self, rhs: Caps) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Caps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = |cap, c| if self.grants(cap) { c } else { '-' };
        write!(
            f,
            "Caps({}{}{})",
            letter(Caps::READ, 'r'),
            letter(Caps::WRITE, 'w'),
            letter(Caps::EXEC, 'x')
        )
    }
}

/// A contiguous address range `[start, start + size)`.
///
/// Collections of blocks describing code are kept sorted by `start` and
/// non-overlapping; [`blocks_contain`] and [`inverted_blocks`] rely on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AddressBlock {
    pub start: Address,
    pub size: u16,
}

impl AddressBlock {
    pub fn new(start: Address, size: u16) -> Self {
        Self { start, size }
    }

    /// One past the last address. Widened so a range ending at `$10000`
    /// does not wrap.
    pub fn end(self) -> u32 {
        self.start as u32 + self.size as u32
    }

    pub fn contains(self, address: Address) -> bool {
        address >= self.start && (address as u32) < self.end()
    }

    pub fn is_empty(self) -> bool {
        self.size == 0
    }
}

/// Binary containment search over a sorted, non-overlapping block list.
pub fn blocks_contain(blocks: &[AddressBlock], address: Address) -> bool {
    blocks
        .binary_search_by(|block| {
            if block.end() <= address as u32 {
                Ordering::Less
            } else if address < block.start {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        })
        .is_ok()
}

/// Complement of `blocks` within `range`.
///
/// `blocks` must be sorted, non-overlapping, and contained in `range`; the
/// result has the same shape, and the union of both lists covers `range`
/// exactly.
pub fn inverted_blocks(range: AddressBlock, blocks: &[AddressBlock]) -> Vec<AddressBlock> {
    let mut result = Vec::new();

    let mut start = range.start as u32;

    for block in blocks {
        if (block.start as u32) > start {
            result.push(AddressBlock::new(
                start as Address,
                (block.start as u32 - start) as u16,
            ));
        }

        start = block.end();

        if start >= range.end() {
            break;
        }
    }

    if start < range.end() {
        result.push(AddressBlock::new(start as Address, (range.end() - start) as u16));
    }

    result
}

/// Merge two sorted vectors, keeping items from `a` first on equal keys.
pub fn merge_sorted_by<T, F>(a: Vec<T>, b: Vec<T>, mut less: F) -> Vec<T>
where
    F: FnMut(&T, &T) -> bool,
{
    let mut result = Vec::with_capacity(a.len() + b.len());

    let mut a = a.into_iter().peekable();
    let mut b = b.into_iter().peekable();

    loop {
        match (a.peek(), b.peek()) {
            (Some(x), Some(y)) => {
                if less(y, x) {
                    result.push(b.next().unwrap());
                } else {
                    result.push(a.next().unwrap());
                }
            }
            (Some(_), None) => result.push(a.next().unwrap()),
            (None, Some(_)) => result.push(b.next().unwrap()),
            (None, None) => break,
        }
    }

    result
}

/// The analyzed binary image: raw bytes plus their load address.
///
/// Immutable once loaded; the analyzer only ever borrows it.
#[derive(Debug, Clone, Default)]
pub struct DataBlock {
    pub address: Address,
    pub data: Vec<u8>,
}

impl DataBlock {
    pub fn new(address: Address, data: Vec<u8>) -> Self {
        Self { address, data }
    }

    /// The whole image as an address range.
    pub fn as_block(&self) -> AddressBlock {
        AddressBlock::new(self.address, self.data.len() as u16)
    }

    pub fn contains(&self, address: Address) -> bool {
        self.as_block().contains(address)
    }

    /// Bounded cursor over the bytes of `block`.
    ///
    /// Panics if `block` lies partly outside the image: the analyzer never
    /// requests such a block, so this is a logic fault rather than an input
    /// problem.
    pub fn bytes(&self, block: AddressBlock) -> ByteCursor<'_> {
        let whole = self.as_block();

        if block.start < whole.start || block.end() > whole.end() {
            panic!(
                "block ${:04X}+${:04X} lies outside the loaded image",
                block.start, block.size
            );
        }

        ByteCursor::window(&self.data, (block.start - self.address) as usize, block.size as usize)
    }

    /// Iterate the decoded instructions of `block`.
    pub fn instructions(&self, block: AddressBlock) -> InstrIter<'_> {
        InstrIter::new(self.bytes(block), block.start)
    }
}

/// A declared default-capability region of the address space.
///
/// Segments may overlap; lookups take the first containing segment in stored
/// order, so the input row order decides priority. Surprising, but preserved
/// for compatibility with existing segment tables.
#[derive(Debug, Clone)]
pub struct Segment {
    pub name: String,
    pub range: AddressBlock,
    pub caps: Caps,
}

impl Segment {
    pub fn contains(&self, address: Address) -> bool {
        self.range.contains(address)
    }
}

/// One decoded instruction.
///
/// The operand's meaning depends on the addressing mode: a resolved absolute
/// or zero-page address for memory modes, the resolved target for relative
/// branches, and the raw literal for immediate mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Instr {
    pub opcode: u8,
    pub operand: u16,
}

impl Instr {
    /// Static descriptor for this opcode, if it is a documented instruction.
    pub fn info(&self) -> Option<&'static OpInfo> {
        opcode::lookup(self.opcode)
    }

    /// Encoded size in bytes; unknown opcodes count as one byte.
    pub fn size(&self) -> usize {
        opcode::instr_size(self.opcode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_grants_and_or() {
        let rw = Caps::READ | Caps::WRITE;

        assert!(rw.grants(Caps::READ));
        assert!(rw.grants(Caps::WRITE));
        assert!(!rw.grants(Caps::EXEC));
        assert!(!Caps::NONE.grants(Caps::ALL));
        assert!(Caps::ALL.grants(Caps::EXEC));
    }

    #[test]
    fn block_contains_is_half_open() {
        let block = AddressBlock::new(0x8000, 0x10);

        assert!(block.contains(0x8000));
        assert!(block.contains(0x800F));
        assert!(!block.contains(0x8010));
        assert!(!block.contains(0x7FFF));
    }

    #[test]
    fn block_end_does_not_wrap() {
        let block = AddressBlock::new(0x8000, 0x8000);

        assert_eq!(block.end(), 0x10000);
        assert!(block.contains(0xFFFF));
    }

    #[test]
    fn blocks_contain_searches_sorted_list() {
        let blocks = vec![
            AddressBlock::new(0x1000, 4),
            AddressBlock::new(0x2000, 8),
            AddressBlock::new(0x3000, 1),
        ];

        assert!(blocks_contain(&blocks, 0x1000));
        assert!(blocks_contain(&blocks, 0x1003));
        assert!(!blocks_contain(&blocks, 0x1004));
        assert!(blocks_contain(&blocks, 0x2007));
        assert!(blocks_contain(&blocks, 0x3000));
        assert!(!blocks_contain(&blocks, 0x2FFF));
        assert!(!blocks_contain(&blocks, 0x3001));
        assert!(!blocks_contain(&[], 0x1000));
    }

    #[test]
    fn inverted_blocks_covers_range_exactly() {
        let range = AddressBlock::new(0x8000, 0x100);
        let blocks = vec![
            AddressBlock::new(0x8010, 0x10),
            AddressBlock::new(0x8080, 0x40),
        ];

        let inverted = inverted_blocks(range, &blocks);

        assert_eq!(
            inverted,
            vec![
                AddressBlock::new(0x8000, 0x10),
                AddressBlock::new(0x8020, 0x60),
                AddressBlock::new(0x80C0, 0x40),
            ]
        );

        // Union of both lists covers every address exactly once.
        let mut covered = 0u32;
        for block in blocks.iter().chain(inverted.iter()) {
            covered += block.size as u32;
        }
        assert_eq!(covered, range.size as u32);
    }

    #[test]
    fn inverted_blocks_of_empty_is_whole_range() {
        let range = AddressBlock::new(0x4000, 0x20);

        assert_eq!(inverted_blocks(range, &[]), vec![range]);
    }

    #[test]
    fn inverted_blocks_of_full_cover_is_empty() {
        let range = AddressBlock::new(0x4000, 0x20);

        assert!(inverted_blocks(range, &[range]).is_empty());
    }

    #[test]
    fn merge_is_left_biased_on_ties() {
        let a = vec![(1, "a1"), (3, "a3")];
        let b = vec![(1, "b1"), (2, "b2")];

        let merged = merge_sorted_by(a, b, |l, r| l.0 < r.0);

        assert_eq!(merged, vec![(1, "a1"), (1, "b1"), (2, "b2"), (3, "a3")]);
    }

    #[test]
    #[should_panic(expected = "outside the loaded image")]
    fn data_block_rejects_out_of_range_block() {
        let image = DataBlock::new(0x8000, vec![0; 16]);

        let _ = image.bytes(AddressBlock::new(0x8008, 0x10));
    }
}
