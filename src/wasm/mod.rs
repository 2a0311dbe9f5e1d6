//! WebAssembly bindings for the disassembler engine.
//!
//! This module exposes `DisassemblyEngine` to JavaScript so a browser front
//! end can browse and annotate an image held in memory.

#[cfg(feature = "wasm")]
pub mod api;

#[cfg(feature = "wasm")]
pub use api::WasmDisassembler;
