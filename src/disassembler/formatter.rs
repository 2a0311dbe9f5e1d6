//! Formatting functions for disassembled lines

use crate::disassembler::Instruction;

/// One listing line: a decoded instruction together with its raw bytes and
/// the label and comment attached to its address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Logical address of the first byte
    pub address: u32,

    /// The bytes the instruction occupies
    pub bytes: Vec<u8>,

    /// Label attached to `address`
    pub label: Option<String>,

    /// Instruction or directive mnemonic
    pub mnemonic: &'static str,

    /// Operand text, possibly empty
    pub operand: String,

    /// Comment attached to `address`
    pub comment: Option<String>,

    /// Size in bytes
    pub length: usize,
}

impl Line {
    /// Build a line from an instruction plus its annotations.
    pub fn new(instr: Instruction, bytes: Vec<u8>, label: Option<String>, comment: Option<String>) -> Self {
        Self {
            address: instr.address,
            bytes,
            label,
            mnemonic: instr.mnemonic,
            operand: instr.operand,
            comment,
            length: instr.length,
        }
    }

    /// The raw bytes as contiguous upper-case hex pairs, e.g. `"F83F"`.
    pub fn hex_bytes(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02X}", b)).collect()
    }
}

/// Format a line in the tab-separated listing layout used by `.asm` export:
///
/// `ADDR<TAB>BYTES<TAB>LABEL:<TAB>MNEMONIC<TAB>OPERAND<TAB>;COMMENT`
///
/// Absent labels and comments leave their field empty.
pub fn format_line(line: &Line) -> String {
    let label = match &line.label {
        Some(name) => format!("{}:", name),
        None => String::new(),
    };
    let comment = match &line.comment {
        Some(text) => format!(";{}", text),
        None => String::new(),
    };

    format!(
        "{:04X}\t{}\t{}\t{}\t{}\t{}",
        line.address,
        line.hex_bytes(),
        label,
        line.mnemonic,
        line.operand,
        comment
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_plain() {
        let line = Line::new(
            Instruction::new(0x8000, "LDI", "3F", 2),
            vec![0xF8, 0x3F],
            None,
            None,
        );

        assert_eq!(format_line(&line), "8000\tF83F\t\tLDI\t3F\t");
    }

    #[test]
    fn test_format_label_and_comment() {
        let line = Line::new(
            Instruction::implied(0x0010, "RET"),
            vec![0x70],
            Some("EXIT".to_string()),
            Some("back to monitor".to_string()),
        );

        assert_eq!(format_line(&line), "0010\t70\tEXIT:\tRET\t\t;back to monitor");
    }
}
