//! Named, capability-flagged addresses and the symbol builder.
//!
//! The input symbol set is caller-supplied and never mutated; the builder
//! produces a separate set derived from the discovered code, which the caller
//! merges with the input for printing.

use crate::analysis::AnalysisConfig;
use crate::opcode::AddressingMode;
use crate::{merge_sorted_by, Address, AddressBlock, Caps};

/// A named address whose capabilities override segment defaults at that
/// exact address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub value: Address,
    pub caps: Caps,
}

impl Symbol {
    pub fn new(name: impl Into<String>, value: Address, caps: Caps) -> Self {
        Self { name: name.into(), value, caps }
    }
}

/// All symbols at `address` within a table sorted by value.
///
/// Multiple symbols may share an address; the returned slice preserves their
/// stored order.
pub fn symbols_at(symbols: &[Symbol], address: Address) -> &[Symbol] {
    let lo = symbols.partition_point(|s| s.value < address);
    let hi = symbols.partition_point(|s| s.value <= address);

    &symbols[lo..hi]
}

/// Stable sort by value; ties keep insertion order.
pub fn sort_symbols(symbols: &mut [Symbol]) {
    symbols.sort_by_key(|s| s.value);
}

/// Sorted union of two sorted symbol tables. On equal addresses the entries
/// of `a` come first, so input symbols keep priority over built ones.
pub fn merge_symbols(a: Vec<Symbol>, b: Vec<Symbol>) -> Vec<Symbol> {
    merge_sorted_by(a, b, |l, r| l.value < r.value)
}

/// Derive symbols from the discovered code blocks.
///
/// Jump targets become `CODE_<hex>` symbols flagged EXEC; other memory
/// operands become `DATA_<hex>` symbols flagged READ or WRITE per the
/// instruction, widened by the covering segment's capabilities. Targets
/// outside the image are skipped unless `extended` is set, and targets
/// already described by an input symbol with the same value and capabilities
/// are never re-emitted.
///
/// The result is sorted by address and deduplicated by (address, caps); two
/// generated symbols that collide there collapse to whichever sorted first.
pub fn build_symbols(
    config: &AnalysisConfig<'_>,
    blocks: &[AddressBlock],
    extended: bool,
) -> Vec<Symbol> {
    let mut result: Vec<Symbol> = Vec::new();

    let mut add_symbol = |name: String, value: Address, caps: Caps| {
        if !extended && !config.image.contains(value) {
            return;
        }

        for known in symbols_at(config.symbols, value) {
            if known.value == value && known.caps == caps {
                return;
            }
        }

        result.push(Symbol { name, value, caps });
    };

    for block in blocks {
        for (_addr, instr) in config.image.instructions(*block) {
            let Some(info) = instr.info() else {
                continue;
            };

            use AddressingMode::*;

            match info.mode {
                ZeroPage | ZeroPageX | ZeroPageY | Absolute | AbsoluteX | AbsoluteY
                | IndirectX | IndirectY | Relative
                    if info.is_jump() =>
                {
                    add_symbol(format!("CODE_{:04X}", instr.operand), instr.operand, Caps::EXEC);
                }

                ZeroPage | ZeroPageX | ZeroPageY | Absolute | AbsoluteX | AbsoluteY
                | IndirectX | IndirectY | Relative | Indirect => {
                    let mut caps = if info.is_write() { Caps::WRITE } else { Caps::READ };

                    // First containing segment decides the widening.
                    for segment in config.segments {
                        if !segment.contains(instr.operand) {
                            continue;
                        }

                        caps |= segment.caps;
                        break;
                    }

                    add_symbol(format!("DATA_{:04X}", instr.operand), instr.operand, caps);
                }

                _ => {}
            }
        }
    }

    result.sort_by_key(|s| (s.value, s.caps));
    result.dedup_by(|a, b| a.value == b.value && a.caps == b.caps);

    result
}
