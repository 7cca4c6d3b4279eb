//! Pseudo-assembly listing output.
//!
//! The listing interleaves three kinds of item: code spans printed one
//! instruction per line, data spans printed as `.db` rows, and labels for
//! symbols that fall inside the image. Symbols outside the image print as a
//! leading equate block instead.

use std::io::{self, Write};

use crate::opcode::AddressingMode;
use crate::symbol::{symbols_at, Symbol};
use crate::{inverted_blocks, AddressBlock, Caps, DataBlock, Instr};

/// One renderable span of the listing, in output order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintItem {
    Code(AddressBlock),
    Data(AddressBlock),
    Label(String),
}

/// Render one instruction as listing text, substituting symbol names for
/// operands where a symbol of the matching class exists.
///
/// Jump instructions take the first EXEC symbol at the target, writes the
/// first WRITE symbol, everything else the first READ symbol. Without a
/// match the operand prints as hex sized by the addressing mode, so a
/// branch with no symbol shows only the low byte of its resolved target.
pub fn instr_text(instr: &Instr, symbols: &[Symbol]) -> String {
    let Some(info) = instr.info() else {
        return format!(".db ${:02X}", instr.opcode);
    };

    use AddressingMode::*;

    let mut operand = String::new();

    if matches!(
        info.mode,
        ZeroPage | ZeroPageX | ZeroPageY | Absolute | AbsoluteX | AbsoluteY | IndirectX
            | IndirectY | Indirect | Relative
    ) {
        let wanted = if info.is_jump() {
            Caps::EXEC
        } else if info.is_write() {
            Caps::WRITE
        } else {
            Caps::READ
        };

        if let Some(symbol) = symbols_at(symbols, instr.operand)
            .iter()
            .find(|s| s.caps.grants(wanted))
        {
            operand = symbol.name.clone();
        }
    }

    if operand.is_empty() {
        match info.mode.operand_size() {
            1 => operand = format!("${:02X}", instr.operand as u8),
            2 => operand = format!("${:04X}", instr.operand),
            _ => {}
        }
    }

    match info.mode {
        Implied => info.name.to_string(),
        Accumulator => format!("{} A", info.name),
        Immediate => format!("{} #{}", info.name, operand),
        ZeroPage | Absolute | Relative => format!("{} {}", info.name, operand),
        ZeroPageX | AbsoluteX => format!("{} {}, X", info.name, operand),
        ZeroPageY | AbsoluteY => format!("{} {}, Y", info.name, operand),
        Indirect => format!("{} ({})", info.name, operand),
        IndirectX => format!("{} ({}, X)", info.name, operand),
        IndirectY => format!("{} ({}), Y", info.name, operand),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Code,
    Data,
    Name,
}

/// Lay out the print order for `range`: code blocks, the data gaps between
/// them, and labels for in-range READ or EXEC symbols.
///
/// A label in the middle of a span splits it, so the label lands between the
/// two halves; zero-size halves are dropped.
pub fn gen_print_items(
    range: AddressBlock,
    code_blocks: &[AddressBlock],
    symbols: &[Symbol],
) -> Vec<PrintItem> {
    let data_blocks = inverted_blocks(range, code_blocks);

    let mut map: Vec<(u32, Kind, &str)> = Vec::new();

    for block in code_blocks {
        map.push((block.start as u32, Kind::Code, ""));
    }

    for block in &data_blocks {
        map.push((block.start as u32, Kind::Data, ""));
    }

    for symbol in symbols {
        if range.contains(symbol.value) && symbol.caps.grants(Caps::READ | Caps::EXEC) {
            map.push((symbol.value as u32, Kind::Name, symbol.name.as_str()));
        }
    }

    // Labels sort before the span that starts at the same address.
    map.sort_by_key(|&(addr, kind, _)| (addr, kind != Kind::Name));

    let mut result = Vec::new();
    let mut prev_kind = Kind::Name;

    for (i, &(addr, kind, name)) in map.iter().enumerate() {
        let size = match map.get(i + 1) {
            Some(&(next, _, _)) => next - addr,
            None => range.end() - addr,
        };

        let mut kind = kind;

        if kind == Kind::Name {
            result.push(PrintItem::Label(name.to_string()));
            kind = prev_kind;
        }

        if size != 0 {
            let block = AddressBlock::new(addr as u16, size as u16);

            match kind {
                Kind::Code => result.push(PrintItem::Code(block)),
                Kind::Data => result.push(PrintItem::Data(block)),
                Kind::Name => {}
            }
        }

        prev_kind = kind;
    }

    result
}

const DATA_BYTES_PER_LINE: usize = 8;

/// Write the listing body.
///
/// Code lines carry the address and raw instruction bytes in a comment
/// column; data lines elide the bytes with `...` and print `.db` rows of up
/// to eight bytes. Each span is followed by a blank line.
pub fn write_listing<W: Write>(
    image: &DataBlock,
    items: &[PrintItem],
    symbols: &[Symbol],
    output: &mut W,
) -> io::Result<()> {
    for item in items {
        match item {
            PrintItem::Code(block) => {
                for (addr, instr) in image.instructions(*block) {
                    let offset = (addr - image.address) as usize;
                    let raw = &image.data[offset..offset + instr.size()];

                    let mut bytes = String::new();
                    for (i, byte) in raw.iter().enumerate() {
                        if i != 0 {
                            bytes.push(' ');
                        }
                        bytes.push_str(&format!("{:02X}", byte));
                    }

                    writeln!(
                        output,
                        "    /* {:04X} {:<8} */ {}",
                        addr,
                        bytes,
                        instr_text(&instr, symbols)
                    )?;
                }

                writeln!(output)?;
            }

            PrintItem::Data(block) => {
                let offset = (block.start - image.address) as usize;
                let data = &image.data[offset..offset + block.size as usize];

                for (i, chunk) in data.chunks(DATA_BYTES_PER_LINE).enumerate() {
                    write!(
                        output,
                        "    /* {:04X} ...      */ .db ",
                        block.start as usize + i * DATA_BYTES_PER_LINE
                    )?;

                    for (j, byte) in chunk.iter().enumerate() {
                        if j != 0 {
                            write!(output, ", ")?;
                        }
                        write!(output, "${:02X}", byte)?;
                    }

                    writeln!(output)?;
                }

                writeln!(output)?;
            }

            PrintItem::Label(name) => {
                writeln!(output, "{}:", name)?;
            }
        }
    }

    Ok(())
}

/// Write equates for every symbol outside `range`, followed by a blank line.
pub fn write_equates<W: Write>(
    range: AddressBlock,
    symbols: &[Symbol],
    output: &mut W,
) -> io::Result<()> {
    for symbol in symbols {
        if range.contains(symbol.value) {
            continue;
        }

        writeln!(output, "    {} = ${:04X}", symbol.name, symbol.value)?;
    }

    writeln!(output)
}
