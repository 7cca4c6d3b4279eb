//! Discovery passes: single-block scanning, symbol-seeded expansion, and
//! the linear fallback sweep.

use std::collections::HashSet;

use log::debug;

use crate::analysis::{target_grants, AnalysisConfig};
use crate::decoder::decode_operand;
use crate::opcode::{self, AddressingMode, Mnemonic};
use crate::{blocks_contain, inverted_blocks, merge_sorted_by, Address, AddressBlock, Caps};

/// Scan one candidate code block starting at `range.start`.
///
/// Decodes instructions sequentially until a control-transfer instruction is
/// reached; the block ends there, inclusive. Returns `None` when the bytes
/// cannot be a valid block: an unknown opcode, an operand overrunning the
/// window, a disallowed BRK, a jump target without EXEC capability, a memory
/// operand without the READ or WRITE capability the instruction needs, or the
/// window ending before any control transfer.
pub(crate) fn scan_code(config: &AnalysisConfig<'_>, range: AddressBlock) -> Option<AddressBlock> {
    let mut bytes = config.image.bytes(range);

    debug!("scanning code at ${:04X}", range.start);

    while bytes.position() < bytes.limit() {
        let addr = range.start.wrapping_add(bytes.position() as Address);

        let opcode = bytes.consume();

        let Some(info) = opcode::lookup(opcode) else {
            debug!("invalidated ${:04X}: ${:04X} is not an instruction", range.start, addr);
            return None;
        };

        if bytes.position() + info.mode.operand_size() > bytes.limit() {
            debug!("invalidated ${:04X}: ${:04X} is not an instruction", range.start, addr);
            return None;
        }

        if info.mnemonic == Mnemonic::Brk && !config.allow_brk {
            debug!("invalidated ${:04X}: BRK is not allowed", range.start);
            return None;
        }

        let instr = decode_operand(addr, opcode, &mut bytes);

        use AddressingMode::*;

        match info.mode {
            ZeroPage | ZeroPageX | ZeroPageY | Absolute | AbsoluteX | AbsoluteY | Relative
                if info.is_jump() =>
            {
                if !target_grants(config, instr.operand, Caps::EXEC) {
                    debug!(
                        "invalidated ${:04X}: ${:04X} is bad jump target",
                        range.start, instr.operand
                    );
                    return None;
                }
            }

            ZeroPage | ZeroPageX | ZeroPageY | Absolute | AbsoluteX | AbsoluteY | Relative
            | IndirectX | IndirectY | Indirect => {
                let wanted = if info.is_write() { Caps::WRITE } else { Caps::READ };

                if !target_grants(config, instr.operand, wanted) {
                    debug!(
                        "invalidated ${:04X}: ${:04X} is bad {} target",
                        range.start,
                        instr.operand,
                        if info.is_write() { "write" } else { "read" }
                    );
                    return None;
                }
            }

            _ => {}
        }

        if info.is_jump() {
            return Some(AddressBlock::new(range.start, bytes.position() as u16));
        }
    }

    debug!("invalidated ${:04X}: reached end of analysis range", range.start);

    None
}

/// Resolved `ABS`/`REL` jump targets referenced from `blocks`, in block
/// order.
pub(crate) fn list_code_xrefs(config: &AnalysisConfig<'_>, blocks: &[AddressBlock]) -> Vec<Address> {
    let mut result = Vec::new();

    for block in blocks {
        for (_addr, instr) in config.image.instructions(*block) {
            let Some(info) = instr.info() else {
                continue;
            };

            if info.is_jump()
                && matches!(info.mode, AddressingMode::Absolute | AddressingMode::Relative)
            {
                result.push(instr.operand);
            }
        }
    }

    result
}

/// Scan code at every `point` that falls inside one of the uncovered
/// `ranges`, chaining past fall-through block ends until an END-flagged
/// transfer or a failed scan.
///
/// `ranges` and `points` must both be sorted ascending.
fn scan_code_at_points(
    config: &AnalysisConfig<'_>,
    ranges: &[AddressBlock],
    points: &[Address],
) -> Vec<AddressBlock> {
    let mut result = Vec::new();
    let mut scanned: HashSet<Address> = HashSet::new();

    // Points are ascending, so anything below the running chain end is
    // already inside a block emitted by this call.
    let mut chain_end: u32 = 0;

    let mut i = 0;

    for range in ranges {
        while i < points.len() && points[i] < range.start {
            i += 1;
        }

        while i < points.len() && range.contains(points[i]) {
            if (points[i] as u32) >= chain_end && !scanned.contains(&points[i]) {
                debug!("begin scan at point ${:04X}", points[i]);

                let mut addr = points[i] as u32;
                let mut max_len = range.size - (points[i] - range.start);

                while addr < range.end() {
                    scanned.insert(addr as Address);

                    let Some(block) = scan_code(config, AddressBlock::new(addr as Address, max_len))
                    else {
                        break;
                    };

                    result.push(block);
                    chain_end = block.end();

                    let at_end = config
                        .image
                        .instructions(block)
                        .any(|(_, instr)| instr.info().is_some_and(|info| info.is_jump() && info.is_end()));

                    if at_end {
                        break;
                    }

                    addr += block.size as u32;
                    max_len -= block.size;
                }
            }

            i += 1;
        }
    }

    result
}

/// Phase A: reachability closure seeded by EXEC symbols.
///
/// Repeatedly scans at every pending seed point inside the uncovered
/// complement, merges the discovered blocks, and promotes the new blocks'
/// in-range, uncovered, untried jump targets to the next round of seed
/// points, until no new points appear.
pub(crate) fn find_code_blocks_using_symbols(
    config: &AnalysisConfig<'_>,
    range: AddressBlock,
) -> Vec<AddressBlock> {
    let mut result: Vec<AddressBlock> = Vec::new();
    let mut analysed_points: HashSet<Address> = HashSet::new();

    let mut current_points: Vec<Address> = config
        .symbols
        .iter()
        .filter(|s| range.contains(s.value) && s.caps.grants(Caps::EXEC))
        .map(|s| s.value)
        .collect();

    current_points.sort_unstable();
    current_points.dedup();

    loop {
        let uncovered = inverted_blocks(range, &result);
        let new_blocks = scan_code_at_points(config, &uncovered, &current_points);

        result = merge_sorted_by(result, new_blocks, |l, r| l.start < r.start);

        current_points = list_code_xrefs(config, &result)
            .into_iter()
            .filter(|&xref| {
                range.contains(xref)
                    && !blocks_contain(&result, xref)
                    && analysed_points.insert(xref)
            })
            .collect();

        current_points.sort_unstable();

        if current_points.is_empty() {
            return result;
        }
    }
}

/// Phase B: linear fallback over the uncovered gaps.
///
/// Tries a scan at the gap start; on success skips past the block, on
/// failure advances one byte, so every byte is eventually considered as a
/// potential block start.
pub(crate) fn find_code_blocks_linearly(
    config: &AnalysisConfig<'_>,
    ranges: &[AddressBlock],
) -> Vec<AddressBlock> {
    let mut result = Vec::new();

    for range in ranges {
        debug!("begin linear scan at ${:04X}", range.start);

        let mut offset: u32 = 0;

        while offset < range.size as u32 {
            let start = range.start + offset as u16;
            let size = range.size - offset as u16;

            match scan_code(config, AddressBlock::new(start, size)) {
                Some(block) => {
                    offset += block.size as u32;
                    result.push(block);
                }
                None => offset += 1,
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::default_segments;
    use crate::symbol::{sort_symbols, Symbol};
    use crate::{DataBlock, Segment};

    fn config<'a>(
        image: &'a DataBlock,
        segments: &'a [Segment],
        symbols: &'a [Symbol],
    ) -> AnalysisConfig<'a> {
        AnalysisConfig { image, segments, symbols, allow_brk: false }
    }

    #[test]
    fn scan_accepts_a_block_ending_in_rts() {
        // lda #$01; rts
        let image = DataBlock::new(0x8000, vec![0xA9, 0x01, 0x60]);
        let segments = default_segments();
        let symbols = Vec::new();

        let block = scan_code(&config(&image, &segments, &symbols), image.as_block());

        assert_eq!(block, Some(AddressBlock::new(0x8000, 3)));
    }

    #[test]
    fn scan_rejects_a_block_without_a_terminator() {
        // lda #$01; nop -- runs off the end without a control transfer
        let image = DataBlock::new(0x8000, vec![0xA9, 0x01, 0xEA]);
        let segments = default_segments();
        let symbols = Vec::new();

        assert_eq!(scan_code(&config(&image, &segments, &symbols), image.as_block()), None);
    }

    #[test]
    fn scan_rejects_unknown_opcodes_and_truncated_operands() {
        let segments = default_segments();
        let symbols = Vec::new();

        // $FF is not a documented opcode.
        let image = DataBlock::new(0x8000, vec![0xFF, 0x60]);
        assert_eq!(scan_code(&config(&image, &segments, &symbols), image.as_block()), None);

        // jmp with its high operand byte beyond the window.
        let image = DataBlock::new(0x8000, vec![0x4C, 0x00]);
        assert_eq!(scan_code(&config(&image, &segments, &symbols), image.as_block()), None);
    }

    #[test]
    fn scan_rejects_brk_unless_allowed() {
        let image = DataBlock::new(0x8000, vec![0x00]);
        let segments = default_segments();
        let symbols = Vec::new();

        assert_eq!(scan_code(&config(&image, &segments, &symbols), image.as_block()), None);

        let allowing = AnalysisConfig {
            image: &image,
            segments: &segments,
            symbols: &symbols,
            allow_brk: true,
        };

        // BRK is JUMP-flagged, so it terminates the block.
        assert_eq!(scan_code(&allowing, image.as_block()), Some(AddressBlock::new(0x8000, 1)));
    }

    #[test]
    fn scan_validates_jump_targets_against_segment_caps() {
        // jmp $9000 with only a read-only segment: bad jump target.
        let image = DataBlock::new(0x8000, vec![0x4C, 0x00, 0x90]);
        let symbols = Vec::new();

        let read_only = vec![Segment {
            name: "DAT".into(),
            range: AddressBlock::new(0x9000, 0x100),
            caps: Caps::READ,
        }];
        assert_eq!(scan_code(&config(&image, &read_only, &symbols), image.as_block()), None);

        // Same jump into an executable segment is fine even with no symbol.
        let exec = vec![Segment {
            name: "CODE".into(),
            range: AddressBlock::new(0x8000, 0x4000),
            caps: Caps::READ | Caps::EXEC,
        }];
        assert_eq!(
            scan_code(&config(&image, &exec, &symbols), image.as_block()),
            Some(AddressBlock::new(0x8000, 3))
        );
    }

    #[test]
    fn scan_validates_write_targets() {
        // sta $9000; rts with $9000 read-only: bad write target.
        let image = DataBlock::new(0x8000, vec![0x8D, 0x00, 0x90, 0x60]);
        let symbols = Vec::new();

        let read_only = vec![
            Segment {
                name: "ROM".into(),
                range: AddressBlock::new(0x8000, 0x2000),
                caps: Caps::READ | Caps::EXEC,
            },
        ];
        assert_eq!(scan_code(&config(&image, &read_only, &symbols), image.as_block()), None);

        // A WRITE symbol at the target overrides the segment default.
        let mut symbols = vec![Symbol::new("PORT", 0x9000, Caps::WRITE)];
        sort_symbols(&mut symbols);
        assert_eq!(
            scan_code(&config(&image, &read_only, &symbols), image.as_block()),
            Some(AddressBlock::new(0x8000, 4))
        );
    }

    #[test]
    fn symbol_seeded_discovery_follows_jump_targets() {
        // $8000: jsr $8007; jmp $8000  (chained blocks ending at the jmp)
        // $8006: data that never scans ($FF)
        // $8007: lda #$00; rts         (discovered via the jsr xref)
        let image = DataBlock::new(
            0x8000,
            vec![
                0x20, 0x07, 0x80, // jsr $8007
                0x4C, 0x00, 0x80, // jmp $8000 (known code point)
                0xFF, // garbage
                0xA9, 0x00, 0x60, // lda #$00; rts
            ],
        );
        let segments = default_segments();
        let mut symbols = vec![Symbol::new("START", 0x8000, Caps::EXEC)];
        sort_symbols(&mut symbols);

        let blocks =
            find_code_blocks_using_symbols(&config(&image, &segments, &symbols), image.as_block());

        // jsr ends the first block (not END-flagged, so the chain continues
        // to the jmp); the jsr target is discovered through the xref pass.
        assert!(blocks_contain(&blocks, 0x8000));
        assert!(blocks_contain(&blocks, 0x8007));
        assert!(!blocks_contain(&blocks, 0x8006));

        // Sorted and non-overlapping.
        for pair in blocks.windows(2) {
            assert!(pair[0].end() <= pair[1].start as u32);
        }
    }

    #[test]
    fn linear_scan_advances_one_byte_on_failure() {
        // One garbage byte, then a valid block.
        let image = DataBlock::new(0x8000, vec![0xFF, 0xA9, 0x01, 0x60]);
        let segments = default_segments();
        let symbols = Vec::new();

        let blocks =
            find_code_blocks_linearly(&config(&image, &segments, &symbols), &[image.as_block()]);

        assert_eq!(blocks, vec![AddressBlock::new(0x8001, 3)]);
    }

    #[test]
    fn linear_scan_of_garbage_finds_nothing() {
        let image = DataBlock::new(0x8000, vec![0xFF; 8]);
        let segments = default_segments();
        let symbols = Vec::new();

        let blocks =
            find_code_blocks_linearly(&config(&image, &segments, &symbols), &[image.as_block()]);

        assert!(blocks.is_empty());
    }
}
