//! Repair passes: trimming blocks whose jumps target in-image addresses
//! that are not instruction starts, and dropping small blocks stranded in
//! data.
//!
//! Both passes only ever shrink or remove blocks, so the driver loop that
//! alternates them reaches a fixed point.

use log::debug;

use crate::analysis::AnalysisConfig;
use crate::opcode::AddressingMode;
use crate::{Address, AddressBlock};

/// Blocks shorter than this are candidates for isolated-block removal.
const MIN_BLOCK_SIZE: u16 = 12;

/// Start addresses of every instruction in `blocks`, sorted ascending.
///
/// An in-image jump is only sound when its target is one of these.
pub(crate) fn list_code_points(config: &AnalysisConfig<'_>, blocks: &[AddressBlock]) -> Vec<Address> {
    let mut result = Vec::new();

    for block in blocks {
        for (addr, _instr) in config.image.instructions(*block) {
            result.push(addr);
        }
    }

    result
}

/// Trim blocks at the first jump whose target lies inside the image but is
/// not the start of an instruction, whether that target sits between
/// instruction starts or in an uncovered data gap.
///
/// The head up to the offending instruction survives; the offending
/// instruction and everything after it is discarded, and a block whose very
/// first instruction offends disappears. Returns whether anything changed.
pub(crate) fn remove_bad_jump_blocks(
    config: &AnalysisConfig<'_>,
    blocks: &mut Vec<AddressBlock>,
    code_points: &[Address],
) -> bool {
    let mut changed = false;

    for block in blocks.iter_mut() {
        for (addr, instr) in config.image.instructions(*block) {
            let Some(info) = instr.info() else {
                break;
            };

            if !info.is_jump()
                || !matches!(info.mode, AddressingMode::Absolute | AddressingMode::Relative)
            {
                continue;
            }

            if config.image.contains(instr.operand)
                && code_points.binary_search(&instr.operand).is_err()
            {
                debug!(
                    "trimming block ${:04X}: jump at ${:04X} targets ${:04X}, not an instruction start",
                    block.start, addr, instr.operand
                );

                block.size = addr - block.start;
                changed = true;
                break;
            }
        }
    }

    blocks.retain(|block| !block.is_empty());

    changed
}

/// Drop blocks shorter than [`MIN_BLOCK_SIZE`] that sit alone in data, with
/// an uncovered gap strictly larger than the block itself on both sides.
///
/// Gaps are measured to the neighboring blocks, or to the image boundary
/// where there is no neighbor, so a small block flush against other code or
/// against the edge of the image is kept. Returns whether anything changed.
pub(crate) fn remove_isolated_blocks(
    config: &AnalysisConfig<'_>,
    blocks: &mut Vec<AddressBlock>,
) -> bool {
    let range = config.image.as_block();
    let before = blocks.len();

    let mut kept = Vec::with_capacity(blocks.len());

    for (i, block) in blocks.iter().enumerate() {
        if block.size >= MIN_BLOCK_SIZE {
            kept.push(*block);
            continue;
        }

        let prev_end = if i > 0 { blocks[i - 1].end() as i64 } else { range.start as i64 };
        let next_start = blocks
            .get(i + 1)
            .map(|b| b.start as i64)
            .unwrap_or(range.end() as i64);

        let gap_before = block.start as i64 - prev_end;
        let gap_after = next_start - block.end() as i64;

        if gap_before > block.size as i64 && gap_after > block.size as i64 {
            debug!("removing isolated block ${:04X}+${:04X}", block.start, block.size);
            continue;
        }

        kept.push(*block);
    }

    *blocks = kept;

    blocks.len() != before
}
