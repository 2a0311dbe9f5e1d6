//! Disassembler Module
//!
//! Converts bytes of an `AddressSpace` into symbolic instructions, one
//! address at a time. Decoding is straight-line only: nothing here follows
//! branches.
//!
//! Every decoder applies the same directive precedence before looking at the
//! opcode table:
//!
//! 1. a `DW` entry at the address renders words,
//! 2. else a `DB` entry renders bytes,
//! 3. else the architecture's opcode table decides.

pub mod cdp1802;
pub mod formatter;
pub mod i8080;

use crate::annotations::{AnnotationEdit, AnnotationStore};
use crate::memory::AddressSpace;
use std::fmt;
use std::str::FromStr;

pub use cdp1802::Cdp1802Decoder;
pub use i8080::I8080Decoder;

/// A single decoded instruction or data directive.
///
/// Produced fresh on every query and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Logical address of the first byte
    pub address: u32,

    /// Mnemonic (e.g. "LDI", "MOV", "DW", "UNDEF")
    pub mnemonic: &'static str,

    /// Operand text, empty when the instruction takes none
    pub operand: String,

    /// Total size in bytes, always at least 1
    pub length: usize,

    /// Address named by the operand, for branches, calls, absolute memory
    /// references and single-word `DW` vectors
    pub target: Option<u32>,
}

impl Instruction {
    pub fn new(address: u32, mnemonic: &'static str, operand: impl Into<String>, length: usize) -> Self {
        Self {
            address,
            mnemonic,
            operand: operand.into(),
            length,
            target: None,
        }
    }

    /// A one-byte instruction without operand.
    pub fn implied(address: u32, mnemonic: &'static str) -> Self {
        Self::new(address, mnemonic, "", 1)
    }

    pub fn with_target(mut self, target: u32) -> Self {
        self.target = Some(target);
        self
    }
}

/// Result of a decode that may also want to write annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub instruction: Instruction,

    /// Annotation writes implied by the instruction. Applying them changes
    /// how later addresses decode.
    pub edits: Vec<AnnotationEdit>,
}

impl From<Instruction> for Decoded {
    fn from(instruction: Instruction) -> Self {
        Self {
            instruction,
            edits: Vec::new(),
        }
    }
}

/// Per-architecture instruction decoding.
///
/// Implementors supply the opcode table, word byte order and address literal
/// syntax; directive handling is shared.
///
/// # Non-idempotence
///
/// `decode_mut` may return annotation edits (the CDP1802 `SEP R4` return
/// convention marks the following word as a `DW` vector). A caller that
/// applies those edits must expect a later decode of a nearby address to
/// produce different output than before.
pub trait Decoder {
    /// Decode the opcode at `addr`, ignoring directives.
    fn decode_opcode(&self, addr: u32, space: &AddressSpace, annotations: &AnnotationStore) -> Decoded;

    /// Read a 16-bit word in this CPU's byte order.
    fn read_word(&self, space: &AddressSpace, addr: u32) -> u16;

    /// Render a raw 16-bit address literal.
    fn format_address(&self, value: u16) -> String;

    /// Render an address operand: the label at `target` if one exists,
    /// otherwise `fallback`.
    fn symbol_or(&self, annotations: &AnnotationStore, target: u32, fallback: String) -> String {
        match annotations.label(target) {
            Some(name) => name.to_string(),
            None => fallback,
        }
    }

    /// Decode at `addr` with directive precedence, returning any annotation
    /// edits the instruction implies without applying them.
    fn decode_mut(&self, addr: u32, space: &AddressSpace, annotations: &AnnotationStore) -> Decoded {
        if let Some(count) = annotations.dw(addr) {
            return self.decode_dw(addr, count, space, annotations).into();
        }
        if let Some(count) = annotations.db(addr) {
            return decode_db(addr, count, space).into();
        }
        self.decode_opcode(addr, space, annotations)
    }

    /// Read-only decode at `addr`; implied annotation edits are dropped.
    fn decode(&self, addr: u32, space: &AddressSpace, annotations: &AnnotationStore) -> Instruction {
        self.decode_mut(addr, space, annotations).instruction
    }

    /// Render a `DW` directive of `count` words.
    ///
    /// A single word is treated as a vector and resolved through the labels.
    fn decode_dw(&self, addr: u32, count: usize, space: &AddressSpace, annotations: &AnnotationStore) -> Instruction {
        if count == 1 {
            let value = self.read_word(space, addr);
            let operand = self.symbol_or(annotations, value as u32, self.format_address(value));
            return Instruction::new(addr, "DW", operand, 2).with_target(value as u32);
        }

        let words: Vec<String> = (0..count)
            .map(|i| {
                let at = addr.wrapping_add((i as u32).wrapping_mul(2));
                format!("{:04X}", self.read_word(space, at))
            })
            .collect();
        Instruction::new(addr, "DW", words.join(","), count.saturating_mul(2).max(1))
    }
}

/// Render a `DB` directive of `count` bytes.
fn decode_db(addr: u32, count: usize, space: &AddressSpace) -> Instruction {
    let bytes: Vec<String> = (0..count)
        .map(|i| format!("{:02X}", space.read(addr.wrapping_add(i as u32))))
        .collect();
    Instruction::new(addr, "DB", bytes.join(","), count.max(1))
}

/// Supported CPU architectures.
///
/// Selected once from configuration; the engine dispatches through
/// `decoder()` and never inspects decoder types at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum Architecture {
    /// RCA CDP1802 (COSMAC)
    #[default]
    #[value(name = "cdp1802", alias = "1802")]
    Cdp1802,

    /// Intel 8080
    #[value(name = "i8080", alias = "8080")]
    I8080,
}

static CDP1802: Cdp1802Decoder = Cdp1802Decoder;
static I8080: I8080Decoder = I8080Decoder;

impl Architecture {
    /// The decoder for this architecture.
    pub fn decoder(self) -> &'static dyn Decoder {
        match self {
            Architecture::Cdp1802 => &CDP1802,
            Architecture::I8080 => &I8080,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Architecture::Cdp1802 => "cdp1802",
            Architecture::I8080 => "i8080",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Architecture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cdp1802" | "1802" => Ok(Architecture::Cdp1802),
            "i8080" | "8080" => Ok(Architecture::I8080),
            other => Err(format!("unknown architecture '{}'", other)),
        }
    }
}
