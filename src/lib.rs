//! # Interactive Disassembler Core
//!
//! An annotating disassembler engine for two 8-bit CPUs: the RCA CDP1802
//! (register-indirect load/store) and the Intel 8080 (accumulator machine).
//!
//! This crate turns a raw binary or Intel HEX memory image into symbolic
//! instruction text, and lets a user attach persistent metadata (data
//! directives, labels, comments) that override or annotate the raw decode.
//!
//! ## Quick Start
//!
//! ```rust
//! use idis::{AddressSpace, AnnotationStore, Architecture, DisassemblyEngine};
//!
//! // LXI H,1234H ; HLT
//! let image = AddressSpace::from_bytes(vec![0x21, 0x34, 0x12, 0x76]);
//! let mut engine = DisassemblyEngine::from_parts(Architecture::I8080, image, AnnotationStore::new());
//!
//! let line = engine.get_line(0x0000).unwrap();
//! assert_eq!(line.mnemonic, "LXI");
//! assert_eq!(line.operand, "H,1234H");
//! assert_eq!(engine.next_addr(0x0000).unwrap(), 0x0003);
//! ```
//!
//! ## Architecture
//!
//! - **Images are read-only**: the decoders only ever read the `AddressSpace`,
//!   and out-of-range reads yield zero so tail probes never fail
//! - **Annotations win**: `DW`/`DB` directives take precedence over opcode decode
//! - **Nothing is cached**: every line is decoded fresh, because annotations can
//!   change between queries
//! - **No fatal errors**: every failure is a `DisasmError` value plus a status
//!   message for the caller to display
//!
//! ## Modules
//!
//! - `memory` - `AddressSpace`, the relocatable image buffer
//! - `hex` - Intel HEX and raw binary loading
//! - `annotations` - `DB`/`DW` directives, labels and comments
//! - `disassembler` - the `Decoder` trait and both CPU decoders
//! - `config` - the `.cfg` annotation persistence format
//! - `engine` - `DisassemblyEngine`, the surface consumed by a front end

pub mod annotations;
pub mod config;
pub mod disassembler;
pub mod engine;
pub mod hex;
pub mod memory;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export public API
pub use annotations::{AnnotationEdit, AnnotationStore};
pub use config::{ConfigCodec, ConfigData};
pub use disassembler::formatter::{format_line, Line};
pub use disassembler::{Architecture, Decoded, Decoder, Instruction};
pub use engine::{DisassemblyEngine, EngineConfig, StringTerminator};
pub use hex::HexLoader;
pub use memory::AddressSpace;

use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by the disassembler core.
///
/// None of these are fatal: loaders fall back to an empty image, stepping
/// leaves the current address untouched, and config errors are per line.
/// The `Display` text doubles as the status message shown to the user.
#[derive(Debug, Error)]
pub enum DisasmError {
    /// The image file could not be opened or read.
    #[error("cannot open file '{}': {message}", path.display())]
    Load { path: PathBuf, message: String },

    /// An Intel HEX line is malformed or carries an unsupported record type.
    ///
    /// `line` is 1-indexed.
    #[error("error format line {line}: {text}")]
    Format { line: usize, text: String },

    /// An Intel HEX data record failed its checksum.
    #[error("check sum error line {line}: {computed:02X}")]
    Checksum { line: usize, computed: u8 },

    /// An address fell outside the valid `[origin, origin + size)` window.
    #[error("range error {target:04X}")]
    Range { target: u32 },

    /// A persisted annotation line could not be parsed.
    #[error("config error file:{file} line:{line} {text}")]
    ConfigParse {
        file: String,
        line: usize,
        text: String,
    },

    /// A jump request named neither a hex address nor a known label.
    #[error("invalid address {0}")]
    UnknownTarget(String),

    /// Writing a `.cfg` or `.asm` file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DisasmError {
    /// Returns true for errors that abort an image load.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            DisasmError::Load { .. } | DisasmError::Format { .. } | DisasmError::Checksum { .. }
        )
    }
}
