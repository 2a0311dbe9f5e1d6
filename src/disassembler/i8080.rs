//! Intel 8080 instruction decoder
//!
//! The opcode byte is read as `xx yyy zzz`: the top two bits pick one of the
//! four quadrants of the classic 8080 opcode matrix, `yyy` and `zzz` select
//! registers, register pairs, conditions or operations within it.
//!
//! 16-bit operands are little-endian. Hex literals carry an `H` suffix and
//! get a leading `0` when they would otherwise start with `A`-`F`.

use super::{Decoded, Decoder, Instruction};
use crate::annotations::AnnotationStore;
use crate::memory::AddressSpace;

const REG8: [&str; 8] = ["B", "C", "D", "E", "H", "L", "M", "A"];
const REG16: [&str; 4] = ["B", "D", "H", "SP"];
const REG16_PSW: [&str; 4] = ["B", "D", "H", "PSW"];

const ROTATE: [&str; 8] = ["RLC", "RRC", "RAL", "RAR", "DAA", "CMA", "STC", "CMC"];
const ALU: [&str; 8] = ["ADD", "ADC", "SUB", "SBB", "ANA", "XRA", "ORA", "CMP"];
const ALU_IMM: [&str; 8] = ["ADI", "ACI", "SUI", "SBI", "ANI", "XRI", "ORI", "CPI"];
const RETURN: [&str; 8] = ["RNZ", "RZ", "RNC", "RC", "RPO", "RPE", "RP", "RM"];
const JUMP: [&str; 8] = ["JNZ", "JZ", "JNC", "JC", "JPO", "JPE", "JP", "JM"];
const CALL: [&str; 8] = ["CNZ", "CZ", "CNC", "CC", "CPO", "CPE", "CP", "CM"];

/// Decoder for the Intel 8080.
#[derive(Debug, Clone, Copy, Default)]
pub struct I8080Decoder;

/// 8-bit immediate literal, e.g. `3FH` or `0C0H`.
pub fn format_imm8(value: u8) -> String {
    if value > 0x9F {
        format!("{:03X}H", value)
    } else {
        format!("{:02X}H", value)
    }
}

/// 16-bit immediate literal, e.g. `1234H` or `0C000H`.
pub fn format_imm16(value: u16) -> String {
    if value > 0x9FFF {
        format!("{:05X}H", value)
    } else {
        format!("{:04X}H", value)
    }
}

impl I8080Decoder {
    fn imm8(space: &AddressSpace, addr: u32) -> String {
        format_imm8(space.read(addr.wrapping_add(1)))
    }

    fn imm16(&self, space: &AddressSpace, addr: u32) -> String {
        format_imm16(self.read_word(space, addr.wrapping_add(1)))
    }

    /// 3-byte instruction whose operand is an absolute address.
    fn absolute(&self, addr: u32, mnemonic: &'static str, space: &AddressSpace, annotations: &AnnotationStore) -> Instruction {
        let target = self.read_word(space, addr.wrapping_add(1));
        let operand = self.symbol_or(annotations, target as u32, self.format_address(target));
        Instruction::new(addr, mnemonic, operand, 3).with_target(target as u32)
    }
}

impl Decoder for I8080Decoder {
    fn decode_opcode(&self, addr: u32, space: &AddressSpace, annotations: &AnnotationStore) -> Decoded {
        let opcode = space.read(addr);
        let x = (opcode >> 6) & 0x3;
        let y = ((opcode >> 3) & 0x7) as usize;
        let z = opcode & 0x7;
        let rp = y >> 1;
        let odd = y & 1 == 1;

        let instr = match (x, z) {
            // Quadrant 00: data transfer, 16-bit arithmetic, rotates
            (0, 0) if y == 0 => Instruction::implied(addr, "NOP"),
            (0, 0) => Instruction::implied(addr, "UNDEF"),
            (0, 1) if odd => Instruction::new(addr, "DAD", REG16[rp], 1),
            (0, 1) => Instruction::new(
                addr,
                "LXI",
                format!("{},{}", REG16[rp], self.imm16(space, addr)),
                3,
            ),
            (0, 2) => match (rp, odd) {
                (2, false) => self.absolute(addr, "SHLD", space, annotations),
                (3, false) => self.absolute(addr, "STA", space, annotations),
                (_, false) => Instruction::new(addr, "STAX", REG16[rp], 1),
                (2, true) => self.absolute(addr, "LHLD", space, annotations),
                (3, true) => self.absolute(addr, "LDA", space, annotations),
                (_, true) => Instruction::new(addr, "LDAX", REG16[rp], 1),
            },
            (0, 3) if odd => Instruction::new(addr, "DCX", REG16[rp], 1),
            (0, 3) => Instruction::new(addr, "INX", REG16[rp], 1),
            (0, 4) => Instruction::new(addr, "INR", REG8[y], 1),
            (0, 5) => Instruction::new(addr, "DCR", REG8[y], 1),
            (0, 6) => Instruction::new(
                addr,
                "MVI",
                format!("{},{}", REG8[y], Self::imm8(space, addr)),
                2,
            ),
            (0, _) => Instruction::implied(addr, ROTATE[y]),

            // Quadrant 01: register moves; MOV M,M is HLT
            (1, 6) if y == 6 => Instruction::implied(addr, "HLT"),
            (1, _) => Instruction::new(addr, "MOV", format!("{},{}", REG8[y], REG8[z as usize]), 1),

            // Quadrant 10: accumulator ALU ops on registers
            (2, _) => Instruction::new(addr, ALU[y], REG8[z as usize], 1),

            // Quadrant 11: control flow, stack, I/O, immediates
            (_, 0) => Instruction::implied(addr, RETURN[y]),
            (_, 1) if !odd => Instruction::new(addr, "POP", REG16_PSW[rp], 1),
            (_, 1) => match rp {
                0 => Instruction::implied(addr, "RET"),
                2 => Instruction::implied(addr, "PCHL"),
                3 => Instruction::implied(addr, "SPHL"),
                _ => Instruction::implied(addr, "UNDEF"),
            },
            (_, 2) => self.absolute(addr, JUMP[y], space, annotations),
            (_, 3) => match y {
                0 => self.absolute(addr, "JMP", space, annotations),
                2 => Instruction::new(addr, "OUT", Self::imm8(space, addr), 2),
                3 => Instruction::new(addr, "IN", Self::imm8(space, addr), 2),
                4 => Instruction::implied(addr, "XTHL"),
                5 => Instruction::implied(addr, "XCHG"),
                6 => Instruction::implied(addr, "DI"),
                7 => Instruction::implied(addr, "EI"),
                _ => Instruction::implied(addr, "UNDEF"),
            },
            (_, 4) => self.absolute(addr, CALL[y], space, annotations),
            (_, 5) if !odd => Instruction::new(addr, "PUSH", REG16_PSW[rp], 1),
            (_, 5) if y == 1 => self.absolute(addr, "CALL", space, annotations),
            (_, 5) => Instruction::implied(addr, "UNDEF"),
            (_, 6) => Instruction::new(addr, ALU_IMM[y], Self::imm8(space, addr), 2),
            (_, _) => {
                Instruction::new(addr, "RST", format!("{}", y), 1).with_target(8 * y as u32)
            }
        };

        instr.into()
    }

    fn read_word(&self, space: &AddressSpace, addr: u32) -> u16 {
        space.read_word_le(addr)
    }

    fn format_address(&self, value: u16) -> String {
        format_imm16(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Instruction {
        let space = AddressSpace::from_bytes(bytes.to_vec());
        I8080Decoder.decode(0x0000, &space, &AnnotationStore::new())
    }

    #[test]
    fn test_nop_and_hlt() {
        let nop = decode(&[0x00]);
        assert_eq!(nop.mnemonic, "NOP");
        assert_eq!(nop.length, 1);

        let hlt = decode(&[0x76]);
        assert_eq!(hlt.mnemonic, "HLT");
        assert_eq!(hlt.length, 1);
    }

    #[test]
    fn test_lxi() {
        let instr = decode(&[0x21, 0x34, 0x12]);
        assert_eq!(instr.mnemonic, "LXI");
        assert_eq!(instr.operand, "H,1234H");
        assert_eq!(instr.length, 3);

        let sp = decode(&[0x31, 0x00, 0xF0]);
        assert_eq!(sp.operand, "SP,0F000H");
    }

    #[test]
    fn test_mov_and_alu() {
        let mov = decode(&[0x78]);
        assert_eq!(mov.mnemonic, "MOV");
        assert_eq!(mov.operand, "A,B");

        let add = decode(&[0x86]);
        assert_eq!(add.mnemonic, "ADD");
        assert_eq!(add.operand, "M");

        let cmp = decode(&[0xBF]);
        assert_eq!(cmp.mnemonic, "CMP");
        assert_eq!(cmp.operand, "A");
    }

    #[test]
    fn test_mvi_pads_letter_led_immediates() {
        assert_eq!(decode(&[0x3E, 0x9F]).operand, "A,9FH");
        assert_eq!(decode(&[0x3E, 0xA0]).operand, "A,0A0H");
        assert_eq!(decode(&[0x06, 0x00]).operand, "B,00H");
    }

    #[test]
    fn test_register_pair_ops() {
        assert_eq!(decode(&[0x0B]).mnemonic, "DCX");
        assert_eq!(decode(&[0x23]).mnemonic, "INX");
        assert_eq!(decode(&[0x09]).operand, "B");
        assert_eq!(decode(&[0xF5]).operand, "PSW");
        assert_eq!(decode(&[0x1A]).mnemonic, "LDAX");
    }

    #[test]
    fn test_jump_resolves_label() {
        let space = AddressSpace::from_bytes(vec![0xC3, 0x00, 0x01]);
        let mut ann = AnnotationStore::new();

        let raw = I8080Decoder.decode(0x0000, &space, &ann);
        assert_eq!(raw.mnemonic, "JMP");
        assert_eq!(raw.operand, "0100H");
        assert_eq!(raw.target, Some(0x0100));

        ann.set_label(0x0100, "MAIN");
        let sym = I8080Decoder.decode(0x0000, &space, &ann);
        assert_eq!(sym.operand, "MAIN");
    }

    #[test]
    fn test_call_and_conditional_call() {
        let call = decode(&[0xCD, 0x00, 0xC0]);
        assert_eq!(call.mnemonic, "CALL");
        assert_eq!(call.operand, "0C000H");
        assert_eq!(call.length, 3);

        let cz = decode(&[0xCC, 0x34, 0x12]);
        assert_eq!(cz.mnemonic, "CZ");
        assert_eq!(cz.length, 3);
    }

    #[test]
    fn test_io_and_rst() {
        let out = decode(&[0xD3, 0x10]);
        assert_eq!((out.mnemonic, out.operand.as_str(), out.length), ("OUT", "10H", 2));

        let rst = decode(&[0xFF]);
        assert_eq!((rst.mnemonic, rst.operand.as_str()), ("RST", "7"));
        assert_eq!(rst.target, Some(0x0038));
    }

    #[test]
    fn test_undefined_slots_consume_one_byte() {
        for op in [0x08, 0x10, 0x18, 0x20, 0x28, 0x30, 0x38, 0xCB, 0xD9, 0xDD, 0xED, 0xFD] {
            let instr = decode(&[op, 0xFF, 0xFF]);
            assert_eq!(instr.mnemonic, "UNDEF", "opcode {:02X}", op);
            assert_eq!(instr.operand, "");
            assert_eq!(instr.length, 1);
        }
    }

    #[test]
    fn test_operand_reads_at_top_of_address_range() {
        let mut space = AddressSpace::from_bytes(vec![0xC3, 0x34, 0x12]);
        space.set_origin(u32::MAX);

        let instr = I8080Decoder.decode(u32::MAX, &space, &AnnotationStore::new());
        assert_eq!(instr.mnemonic, "JMP");
        assert_eq!(instr.operand, "0000H");
        assert_eq!(instr.length, 3);
    }

    #[test]
    fn test_every_opcode_has_sane_length() {
        for op in 0..=0xFFu8 {
            let instr = decode(&[op, 0x00, 0x00]);
            assert!((1..=3).contains(&instr.length), "opcode {:02X}", op);
        }
    }
}
