//! Bounded byte cursor and instruction decoding.
//!
//! Decoding never fails: reading past the cursor's limit yields zero bytes,
//! and an unknown opcode decodes to an `Instr` with a zero operand. Callers
//! that care (the analyzer does) check remaining length and the instruction
//! table before trusting the result.

use crate::opcode::{self, AddressingMode};
use crate::{Address, Instr};

/// Sequential forward reader over a byte slice with position and limit.
///
/// Reads at or past the limit return `0` without advancing, so a decode that
/// overruns its window produces zero-filled operand bytes instead of a fault.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    offset: usize,
    limit: usize,
}

impl<'a> ByteCursor<'a> {
    /// Cursor over the whole slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0, limit: data.len() }
    }

    /// Bounded sub-view `[start, start + length)`, clamped to the slice.
    pub fn window(data: &'a [u8], start: usize, length: usize) -> Self {
        let limit = length.min(data.len().saturating_sub(start));

        Self { data: &data[start..], offset: 0, limit }
    }

    pub fn consume(&mut self) -> u8 {
        if self.offset >= self.limit {
            return 0;
        }

        let byte = self.data[self.offset];
        self.offset += 1;
        byte
    }

    pub fn position(&self) -> usize {
        self.offset
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

/// Decode the operand of `opcode` at `addr`, consuming its bytes from `input`.
///
/// Two-byte operands are little-endian; relative operands resolve to the
/// branch target address (`addr + 2 + displacement`), not the raw
/// displacement. Unknown opcodes consume nothing and yield a zero operand.
pub fn decode_operand(addr: Address, opcode: u8, input: &mut ByteCursor<'_>) -> Instr {
    let mut result = Instr { opcode, operand: 0 };

    let Some(info) = opcode::lookup(opcode) else {
        return result;
    };

    use AddressingMode::*;

    match info.mode {
        Implied | Accumulator => {}

        Immediate | ZeroPage | ZeroPageX | ZeroPageY | IndirectX | IndirectY => {
            result.operand = input.consume() as u16;
        }

        Absolute | AbsoluteX | AbsoluteY | Indirect => {
            let lo = input.consume() as u16;
            let hi = input.consume() as u16;

            result.operand = lo | (hi << 8);
        }

        Relative => {
            let displacement = input.consume() as i8;

            result.operand = addr.wrapping_add(2).wrapping_add(displacement as u16);
        }
    }

    result
}

/// Decode one whole instruction at `addr`.
pub fn decode_instruction(addr: Address, input: &mut ByteCursor<'_>) -> Instr {
    let opcode = input.consume();

    decode_operand(addr, opcode, input)
}

/// Iterator over the `(address, instruction)` pairs of a code block.
#[derive(Debug, Clone)]
pub struct InstrIter<'a> {
    cursor: ByteCursor<'a>,
    start: Address,
}

impl<'a> InstrIter<'a> {
    pub fn new(cursor: ByteCursor<'a>, start: Address) -> Self {
        Self { cursor, start }
    }
}

impl Iterator for InstrIter<'_> {
    type Item = (Address, Instr);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.position() >= self.cursor.limit() {
            return None;
        }

        let addr = self.start.wrapping_add(self.cursor.position() as u16);

        Some((addr, decode_instruction(addr, &mut self.cursor)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn cursor_reads_then_yields_zero_at_limit() {
        let mut cursor = ByteCursor::new(&[0x11, 0x22]);

        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.limit(), 2);
        assert_eq!(cursor.consume(), 0x11);
        assert_eq!(cursor.consume(), 0x22);
        assert_eq!(cursor.consume(), 0);
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn cursor_window_clamps_to_slice() {
        let data = [1u8, 2, 3, 4];

        let mut cursor = ByteCursor::window(&data, 3, 8);
        assert_eq!(cursor.limit(), 1);
        assert_eq!(cursor.consume(), 4);
        assert_eq!(cursor.consume(), 0);
    }

    #[rstest]
    // implied: no operand bytes consumed
    #[case(&[0xEA], 0xEA, 0x0000, 1)]
    // immediate: literal byte
    #[case(&[0xA9, 0x7F], 0xA9, 0x007F, 2)]
    // zero page
    #[case(&[0x85, 0x10], 0x85, 0x0010, 2)]
    // absolute: little-endian
    #[case(&[0x4C, 0x34, 0x12], 0x4C, 0x1234, 3)]
    // indirect absolute
    #[case(&[0x6C, 0xFE, 0xFF], 0x6C, 0xFFFE, 3)]
    // indexed indirect: single byte
    #[case(&[0x81, 0x40], 0x81, 0x0040, 2)]
    fn decode_consumes_per_mode(
        #[case] bytes: &[u8],
        #[case] opcode: u8,
        #[case] operand: u16,
        #[case] size: usize,
    ) {
        let mut cursor = ByteCursor::new(bytes);
        let instr = decode_instruction(0x8000, &mut cursor);

        assert_eq!(instr.opcode, opcode);
        assert_eq!(instr.operand, operand);
        assert_eq!(cursor.position(), size);
        assert_eq!(instr.size(), size);
    }

    #[rstest]
    // forward branch: $8000 + 2 + $10
    #[case(0x8000, 0x10, 0x8012)]
    // backward branch: $8000 + 2 - 2 = branch-to-self
    #[case(0x8000, 0xFE, 0x8000)]
    // maximum backward displacement
    #[case(0x8000, 0x80, 0x7F82)]
    // wraps around the top of the address space
    #[case(0xFFFD, 0x10, 0x000F)]
    fn relative_operand_resolves_target(
        #[case] addr: Address,
        #[case] displacement: u8,
        #[case] target: Address,
    ) {
        let bytes = [0xD0, displacement]; // bne
        let mut cursor = ByteCursor::new(&bytes);

        let instr = decode_instruction(addr, &mut cursor);
        assert_eq!(instr.operand, target);

        // The displacement round-trips from the resolved target.
        let back = (instr.operand.wrapping_sub(addr.wrapping_add(2))) as u8;
        assert_eq!(back, displacement);
    }

    #[test]
    fn unknown_opcode_consumes_nothing_extra() {
        let mut cursor = ByteCursor::new(&[0xFF, 0x12, 0x34]);

        let instr = decode_instruction(0x8000, &mut cursor);

        assert_eq!(instr.opcode, 0xFF);
        assert_eq!(instr.operand, 0);
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn truncated_operand_reads_as_zero() {
        // jmp with only the low operand byte present
        let mut cursor = ByteCursor::new(&[0x4C, 0x34]);

        let instr = decode_instruction(0x8000, &mut cursor);

        assert_eq!(instr.operand, 0x0034);
    }

    #[test]
    fn instr_iter_walks_a_block() {
        // lda #$01; sta $0200; rts
        let bytes = [0xA9, 0x01, 0x8D, 0x00, 0x02, 0x60];

        let decoded: Vec<_> = InstrIter::new(ByteCursor::new(&bytes), 0x8000).collect();

        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0], (0x8000, Instr { opcode: 0xA9, operand: 0x01 }));
        assert_eq!(decoded[1], (0x8002, Instr { opcode: 0x8D, operand: 0x0200 }));
        assert_eq!(decoded[2], (0x8005, Instr { opcode: 0x60, operand: 0 }));
    }
}
