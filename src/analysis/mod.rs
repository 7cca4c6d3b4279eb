//! The code-block analyzer: an iterative fixed-point process that decides
//! which address ranges of the image are valid instruction streams.
//!
//! Discovery runs in four phases: symbol-seeded scanning expanded through
//! jump cross-references (a reachability closure over known entry points), a
//! linear fallback over whatever stayed uncovered, then a repair loop of
//! bad-jump trimming and isolated-block elimination iterated to a fixed
//! point. Blocks only shrink or disappear during repair, which is what
//! guarantees termination.

mod repair;
mod scan;

use crate::symbol::{symbols_at, Symbol};
use crate::{inverted_blocks, merge_sorted_by, Address, AddressBlock, Caps, DataBlock, Segment};

/// Borrowed inputs for one analysis run. Nothing here is mutated; the
/// discovered blocks and built symbols are new owned values.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisConfig<'a> {
    pub image: &'a DataBlock,
    /// Overlap resolves by first match in stored order.
    pub segments: &'a [Segment],
    /// Must be sorted by value (see [`crate::symbol::sort_symbols`]).
    pub symbols: &'a [Symbol],
    /// Treat BRK as an analyzable instruction instead of rejecting the block.
    pub allow_brk: bool,
}

/// Does `address` grant any of `wanted`, per symbol overrides first and
/// segment defaults second?
pub(crate) fn target_grants(config: &AnalysisConfig<'_>, address: Address, wanted: Caps) -> bool {
    for symbol in symbols_at(config.symbols, address) {
        if symbol.caps.grants(wanted) {
            return true;
        }
    }

    for segment in config.segments {
        if !segment.contains(address) {
            continue;
        }

        return segment.caps.grants(wanted);
    }

    false
}

/// Run the full analysis over the whole image.
///
/// The result is sorted by start address, non-overlapping, and together with
/// its inversion covers the image exactly.
pub fn analyse_code_blocks(config: &AnalysisConfig<'_>) -> Vec<AddressBlock> {
    let range = config.image.as_block();

    let mut result = scan::find_code_blocks_using_symbols(config, range);

    let linear = scan::find_code_blocks_linearly(config, &inverted_blocks(range, &result));
    result = merge_sorted_by(result, linear, |l, r| l.start < r.start);

    loop {
        let code_points = repair::list_code_points(config, &result);

        if repair::remove_bad_jump_blocks(config, &mut result, &code_points) {
            continue;
        }

        if repair::remove_isolated_blocks(config, &mut result) {
            continue;
        }

        break;
    }

    result
}

/// Segment table used when the caller supplies none: the whole address space
/// with every capability.
pub fn default_segments() -> Vec<Segment> {
    vec![
        Segment {
            name: "ALL1".into(),
            range: AddressBlock::new(0x0000, 0x8000),
            caps: Caps::ALL,
        },
        Segment {
            name: "ALL2".into(),
            range: AddressBlock::new(0x8000, 0x8000),
            caps: Caps::ALL,
        },
    ]
}

/// Entry symbols synthesized from the 6502 hardware vector table.
///
/// If the image fully contains `$FFFA..=$FFFF`, the three little-endian
/// vector words become EXEC symbols seeding the analysis; otherwise the
/// result is empty.
pub fn vector_entry_symbols(image: &DataBlock) -> Vec<Symbol> {
    const VECTOR_BASE: Address = 0xFFFA;
    const VECTOR_NAMES: [&str; 3] = ["ENTRY_NMI", "ENTRY_RESET", "ENTRY_IRQ"];

    if !image.contains(VECTOR_BASE) || !image.contains(0xFFFF) {
        return Vec::new();
    }

    let mut result = Vec::with_capacity(3);

    for (i, name) in VECTOR_NAMES.iter().enumerate() {
        let offset = (VECTOR_BASE - image.address) as usize + 2 * i;

        let lo = image.data[offset] as u16;
        let hi = image.data[offset + 1] as u16;

        result.push(Symbol::new(*name, lo | (hi << 8), Caps::EXEC));
    }

    result
}
