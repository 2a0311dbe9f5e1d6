//! CDP1802 instruction decoder
//!
//! The opcode byte splits into a high nibble `I` selecting the operation
//! group and a low nibble `N` that is usually a register number.
//!
//! Instruction sizes:
//! - short branches (`3N`) are 2 bytes; the operand is the low byte of a
//!   target in the current page
//! - long branches (`C0`-`C3`, `C9`-`CB`) are 3 bytes with a big-endian
//!   absolute target
//! - immediate ALU ops (`7C`, `7D`, `7F`, `F8`-`FD`, `FF`) are 2 bytes
//! - everything else, including skips, is 1 byte

use super::{Decoded, Decoder, Instruction};
use crate::annotations::{AnnotationEdit, AnnotationStore};
use crate::memory::AddressSpace;

const SHORT_BRANCH: [&str; 16] = [
    "BR", "BQ", "BZ", "BDF", "B1", "B2", "B3", "B4", "NBR", "BNQ", "BNZ", "BNF", "BN1", "BN2",
    "BN3", "BN4",
];

const LONG_BRANCH: [&str; 16] = [
    "LBR", "LBQ", "LBZ", "LBDF", "NOP", "LSNQ", "LSNZ", "LSNF", "NLBR", "LBNQ", "LBNZ", "LBNF",
    "LSIE", "LSQ", "LSZ", "LSDF",
];

const GROUP_7: [&str; 16] = [
    "RET", "DIS", "LDXA", "STXD", "ADC", "SDB", "SHRC", "SMB", "SAV", "MARK", "REQ", "SEQ", "ADCI",
    "SDBI", "SHLC", "SMBI",
];

const GROUP_F: [&str; 16] = [
    "LDX", "OR", "AND", "XOR", "ADD", "SD", "SHR", "SM", "LDI", "ORI", "ANI", "XRI", "ADI", "SDI",
    "SHL", "SMI",
];

/// Register used by the standard call/return technique: `SEP R4` is
/// conventionally followed by the address of the subroutine being called.
const CALL_REGISTER: u8 = 0x4;

/// Decoder for the RCA CDP1802.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cdp1802Decoder;

impl Cdp1802Decoder {
    /// 2-byte short branch into the current page.
    fn short_branch(&self, addr: u32, lo: u8, space: &AddressSpace, annotations: &AnnotationStore) -> Instruction {
        let n = space.read(addr.wrapping_add(1));
        let target = (addr & !0xFF) | n as u32;
        let operand = self.symbol_or(annotations, target, format!("{:02X}", n));
        Instruction::new(addr, SHORT_BRANCH[lo as usize], operand, 2).with_target(target)
    }

    /// 3-byte long branch to an absolute address.
    fn long_branch(&self, addr: u32, lo: u8, space: &AddressSpace, annotations: &AnnotationStore) -> Instruction {
        let target = self.read_word(space, addr.wrapping_add(1));
        let operand = self.symbol_or(annotations, target as u32, self.format_address(target));
        Instruction::new(addr, LONG_BRANCH[lo as usize], operand, 3).with_target(target as u32)
    }

    fn immediate(addr: u32, mnemonic: &'static str, space: &AddressSpace) -> Instruction {
        Instruction::new(addr, mnemonic, format!("{:02X}", space.read(addr.wrapping_add(1))), 2)
    }
}

fn register(addr: u32, mnemonic: &'static str, n: u8) -> Instruction {
    Instruction::new(addr, mnemonic, format!("R{:X}", n), 1)
}

impl Decoder for Cdp1802Decoder {
    fn decode_opcode(&self, addr: u32, space: &AddressSpace, annotations: &AnnotationStore) -> Decoded {
        let opcode = space.read(addr);
        let hi = opcode >> 4;
        let lo = opcode & 0x0F;

        let instr = match hi {
            0x0 if lo == 0 => Instruction::implied(addr, "IDL"),
            0x0 => register(addr, "LDN", lo),
            0x1 => register(addr, "INC", lo),
            0x2 => register(addr, "DEC", lo),
            // 38 is the short skip: no operand byte is consumed
            0x3 if lo == 0x8 => Instruction::implied(addr, SHORT_BRANCH[0x8]),
            0x3 => self.short_branch(addr, lo, space, annotations),
            0x4 => register(addr, "LDA", lo),
            0x5 => register(addr, "STR", lo),
            0x6 => match lo {
                0x0 => Instruction::implied(addr, "IRX"),
                0x8 => Instruction::implied(addr, "UNDEF"),
                0x1..=0x7 => Instruction::new(addr, "OUT", format!("{}", lo), 1),
                _ => Instruction::new(addr, "INP", format!("{}", lo & 0x7), 1),
            },
            0x7 => match lo {
                0xC | 0xD | 0xF => Self::immediate(addr, GROUP_7[lo as usize], space),
                _ => Instruction::implied(addr, GROUP_7[lo as usize]),
            },
            0x8 => register(addr, "GLO", lo),
            0x9 => register(addr, "GHI", lo),
            0xA => register(addr, "PLO", lo),
            0xB => register(addr, "PHI", lo),
            0xC => match lo {
                0x0..=0x3 | 0x9..=0xB => self.long_branch(addr, lo, space, annotations),
                _ => Instruction::implied(addr, LONG_BRANCH[lo as usize]),
            },
            0xD => {
                let instr = register(addr, "SEP", lo);
                if lo == CALL_REGISTER {
                    let vector = addr.wrapping_add(1);
                    log::debug!("SEP R4 at {:04X}: marking {:04X} as DW", addr, vector);
                    return Decoded {
                        instruction: instr,
                        edits: vec![AnnotationEdit::SetDw {
                            address: vector,
                            count: 1,
                        }],
                    };
                }
                instr
            }
            0xE => register(addr, "SEX", lo),
            _ => match lo {
                0x8..=0xD | 0xF => Self::immediate(addr, GROUP_F[lo as usize], space),
                _ => Instruction::implied(addr, GROUP_F[lo as usize]),
            },
        };

        instr.into()
    }

    fn read_word(&self, space: &AddressSpace, addr: u32) -> u16 {
        space.read_word_be(addr)
    }

    fn format_address(&self, value: u16) -> String {
        format!("{:04X}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Instruction {
        let space = AddressSpace::from_bytes(bytes.to_vec());
        Cdp1802Decoder.decode(0x0000, &space, &AnnotationStore::new())
    }

    #[test]
    fn test_idl_and_ldn() {
        let idl = decode(&[0x00]);
        assert_eq!(idl.mnemonic, "IDL");
        assert_eq!(idl.operand, "");
        assert_eq!(idl.length, 1);

        let ldn = decode(&[0x0F]);
        assert_eq!(ldn.mnemonic, "LDN");
        assert_eq!(ldn.operand, "RF");
    }

    #[test]
    fn test_register_ops() {
        let inc = decode(&[0x1A]);
        assert_eq!(inc.mnemonic, "INC");
        assert_eq!(inc.operand, "RA");
        assert_eq!(inc.length, 1);

        assert_eq!(decode(&[0x8C]).operand, "RC");
        assert_eq!(decode(&[0xE2]).mnemonic, "SEX");
        assert_eq!(decode(&[0xB3]).mnemonic, "PHI");
    }

    #[test]
    fn test_short_branch_in_page() {
        let mut bytes = vec![0x00; 0x0200];
        bytes[0x0100] = 0x3A; // BNZ at 0x1100
        bytes[0x0101] = 0x20;
        let mut space = AddressSpace::from_bytes(bytes);
        space.set_origin(0x1000);

        let instr = Cdp1802Decoder.decode(0x1100, &space, &AnnotationStore::new());
        assert_eq!(instr.mnemonic, "BNZ");
        assert_eq!(instr.operand, "20");
        assert_eq!(instr.length, 2);
        assert_eq!(instr.target, Some(0x1120));
    }

    #[test]
    fn test_short_skip_is_one_byte() {
        let instr = decode(&[0x38, 0xFF]);
        assert_eq!(instr.mnemonic, "NBR");
        assert_eq!(instr.length, 1);
    }

    #[test]
    fn test_long_branch() {
        let instr = decode(&[0xC0, 0x12, 0x34]);
        assert_eq!(instr.mnemonic, "LBR");
        assert_eq!(instr.operand, "1234");
        assert_eq!(instr.length, 3);
        assert_eq!(instr.target, Some(0x1234));
    }

    #[test]
    fn test_long_skips_are_one_byte() {
        for (op, name) in [(0xC4, "NOP"), (0xC8, "NLBR"), (0xCE, "LSZ"), (0xC5, "LSNQ")] {
            let instr = decode(&[op, 0xAA, 0xBB]);
            assert_eq!(instr.mnemonic, name);
            assert_eq!(instr.length, 1, "{} should be 1 byte", name);
        }
    }

    #[test]
    fn test_immediates() {
        let ldi = decode(&[0xF8, 0x3F]);
        assert_eq!(ldi.mnemonic, "LDI");
        assert_eq!(ldi.operand, "3F");
        assert_eq!(ldi.length, 2);

        let smbi = decode(&[0x7F, 0x01]);
        assert_eq!(smbi.mnemonic, "SMBI");
        assert_eq!(smbi.length, 2);

        // Shifts take no immediate
        assert_eq!(decode(&[0xFE]).length, 1);
        assert_eq!(decode(&[0x7E]).length, 1);
    }

    #[test]
    fn test_io_group() {
        assert_eq!(decode(&[0x60]).mnemonic, "IRX");
        let out = decode(&[0x63]);
        assert_eq!((out.mnemonic, out.operand.as_str()), ("OUT", "3"));
        let inp = decode(&[0x6B]);
        assert_eq!((inp.mnemonic, inp.operand.as_str()), ("INP", "3"));
        assert_eq!(decode(&[0x68]).mnemonic, "UNDEF");
    }

    #[test]
    fn test_sep_r4_requests_dw() {
        let space = AddressSpace::from_bytes(vec![0xD4, 0x12, 0x34]);
        let decoded = Cdp1802Decoder.decode_mut(0x0000, &space, &AnnotationStore::new());

        assert_eq!(decoded.instruction.mnemonic, "SEP");
        assert_eq!(decoded.instruction.operand, "R4");
        assert_eq!(
            decoded.edits,
            vec![AnnotationEdit::SetDw {
                address: 0x0001,
                count: 1
            }]
        );
    }

    #[test]
    fn test_decode_at_top_of_address_range() {
        let mut space = AddressSpace::from_bytes(vec![0xD4]);
        space.set_origin(u32::MAX);
        let ann = AnnotationStore::new();

        let decoded = Cdp1802Decoder.decode_mut(u32::MAX, &space, &ann);
        assert_eq!(decoded.instruction.operand, "R4");
        assert_eq!(decoded.edits[0].address(), 0x0000);

        space = AddressSpace::from_bytes(vec![0xC0]);
        space.set_origin(u32::MAX);
        assert_eq!(Cdp1802Decoder.decode(u32::MAX, &space, &ann).operand, "0000");
        space = AddressSpace::from_bytes(vec![0x30]);
        space.set_origin(u32::MAX);
        assert_eq!(Cdp1802Decoder.decode(u32::MAX, &space, &ann).operand, "00");
    }

    #[test]
    fn test_sep_other_register_has_no_edit() {
        let space = AddressSpace::from_bytes(vec![0xD5]);
        let decoded = Cdp1802Decoder.decode_mut(0x0000, &space, &AnnotationStore::new());
        assert!(decoded.edits.is_empty());
    }
}
