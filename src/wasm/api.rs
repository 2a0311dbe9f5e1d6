//! WASM API for the disassembler.
//!
//! Provides JavaScript-callable interfaces for image loading, line lookup,
//! stepping and annotation editing. Images and `.cfg` text are passed in
//! memory; there is no file system in the browser.

use crate::{
    AddressSpace, AnnotationStore, Architecture, ConfigCodec, DisassemblyEngine, HexLoader, Line,
};
use wasm_bindgen::prelude::*;

/// JavaScript-compatible error wrapper
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct JsError {
    message: String,
}

#[wasm_bindgen]
impl JsError {
    #[wasm_bindgen(constructor)]
    pub fn new(message: &str) -> JsError {
        JsError {
            message: message.to_string(),
        }
    }

    #[wasm_bindgen(getter)]
    pub fn message(&self) -> String {
        self.message.clone()
    }
}

impl From<crate::DisasmError> for JsError {
    fn from(err: crate::DisasmError) -> Self {
        JsError::new(&err.to_string())
    }
}

/// One listing line for JavaScript
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct DisassemblyLine {
    address: u32,
    bytes: Vec<u8>,
    label: Option<String>,
    mnemonic: String,
    operand: String,
    comment: Option<String>,
    length: usize,
}

impl From<Line> for DisassemblyLine {
    fn from(line: Line) -> Self {
        DisassemblyLine {
            address: line.address,
            bytes: line.bytes,
            label: line.label,
            mnemonic: line.mnemonic.to_string(),
            operand: line.operand,
            comment: line.comment,
            length: line.length,
        }
    }
}

#[wasm_bindgen]
impl DisassemblyLine {
    #[wasm_bindgen(getter)]
    pub fn address(&self) -> u32 {
        self.address
    }

    #[wasm_bindgen(getter)]
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn label(&self) -> Option<String> {
        self.label.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn mnemonic(&self) -> String {
        self.mnemonic.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn operand(&self) -> String {
        self.operand.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn comment(&self) -> Option<String> {
        self.comment.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.length
    }
}

/// Main disassembler interface for JavaScript
#[wasm_bindgen]
pub struct WasmDisassembler {
    engine: DisassemblyEngine,
    on_status: Option<js_sys::Function>,
}

fn parse_arch(name: &str) -> Result<Architecture, JsError> {
    name.parse::<Architecture>().map_err(|e| JsError::new(&e))
}

#[wasm_bindgen]
impl WasmDisassembler {
    /// Create a disassembler over a raw binary image
    #[wasm_bindgen(constructor)]
    pub fn new(arch: &str, image: Vec<u8>) -> Result<WasmDisassembler, JsError> {
        let arch = parse_arch(arch)?;
        Ok(WasmDisassembler {
            engine: DisassemblyEngine::from_parts(
                arch,
                AddressSpace::from_bytes(image),
                AnnotationStore::new(),
            ),
            on_status: None,
        })
    }

    /// Create a disassembler over Intel HEX text
    pub fn from_hex(arch: &str, text: &str) -> Result<WasmDisassembler, JsError> {
        let arch = parse_arch(arch)?;
        let space = HexLoader::parse(text)?;
        Ok(WasmDisassembler {
            engine: DisassemblyEngine::from_parts(arch, space, AnnotationStore::new()),
            on_status: None,
        })
    }

    /// Register a callback receiving every status message as it is produced
    pub fn set_status_callback(&mut self, callback: js_sys::Function) {
        self.on_status = Some(callback);
    }

    fn flush_status(&mut self) {
        if let Some(callback) = &self.on_status {
            if let Some(status) = self.engine.take_status() {
                let _ = callback.call1(&JsValue::NULL, &JsValue::from_str(&status));
            }
        }
    }

    /// Listing line at an address, or undefined outside the image
    pub fn get_line(&mut self, addr: u32) -> Option<DisassemblyLine> {
        self.engine.get_line(addr).map(DisassemblyLine::from)
    }

    /// Up to `count` consecutive lines starting at `addr`
    pub fn get_lines(&mut self, addr: u32, count: usize) -> Vec<DisassemblyLine> {
        self.engine
            .lines(addr)
            .take(count)
            .map(DisassemblyLine::from)
            .collect()
    }

    pub fn next_addr(&mut self, addr: u32) -> Result<u32, JsError> {
        let result = self.engine.next_addr(addr);
        self.flush_status();
        Ok(result?)
    }

    pub fn prev_addr(&mut self, addr: u32) -> Result<u32, JsError> {
        let result = self.engine.prev_addr(addr);
        self.flush_status();
        Ok(result?)
    }

    pub fn jump_target(&mut self, text: &str) -> Result<u32, JsError> {
        let result = self.engine.jump_target(text);
        self.flush_status();
        Ok(result?)
    }

    pub fn operand_target(&mut self, addr: u32) -> Result<u32, JsError> {
        let result = self.engine.operand_target(addr);
        self.flush_status();
        Ok(result?)
    }

    pub fn set_db(&mut self, addr: u32, count: usize) {
        self.engine.set_db(addr, count);
    }

    pub fn set_dw(&mut self, addr: u32, count: usize) {
        self.engine.set_dw(addr, count);
    }

    pub fn clear_db(&mut self, addr: u32) {
        self.engine.clear_db(addr);
    }

    pub fn clear_dw(&mut self, addr: u32) {
        self.engine.clear_dw(addr);
    }

    pub fn set_label(&mut self, addr: u32, name: &str) {
        self.engine.set_label(addr, name);
    }

    pub fn clear_label(&mut self, addr: u32) {
        self.engine.clear_label(addr);
    }

    pub fn set_comment(&mut self, addr: u32, text: &str) {
        self.engine.set_comment(addr, text);
    }

    pub fn clear_comment(&mut self, addr: u32) {
        self.engine.clear_comment(addr);
    }

    pub fn set_origin(&mut self, addr: u32) {
        self.engine.set_origin(addr);
    }

    #[wasm_bindgen(getter)]
    pub fn origin(&self) -> u32 {
        self.engine.origin()
    }

    #[wasm_bindgen(getter)]
    pub fn size(&self) -> usize {
        self.engine.size()
    }

    /// Annotations and origin in `.cfg` text form
    pub fn export_config(&self) -> String {
        ConfigCodec::encode(self.engine.origin(), self.engine.annotations())
    }

    /// Replace annotations (and origin, if present) from `.cfg` text.
    ///
    /// Returns the number of rejected lines.
    pub fn import_config(&mut self, text: &str) -> usize {
        let (data, errors) = ConfigCodec::decode(text, "config");
        let origin = data.origin.unwrap_or(self.engine.origin());
        let space = self.engine.space().clone();
        self.engine = DisassemblyEngine::from_parts(self.engine.arch(), space, data.annotations);
        self.engine.set_origin(origin);
        if let Some(last) = errors.last() {
            self.engine.set_status(last.to_string());
        }
        self.flush_status();
        errors.len()
    }

    /// The full listing in `.asm` export format
    pub fn export_source(&mut self) -> String {
        self.engine.export_source()
    }

    /// Take the pending status message, if any
    pub fn take_status(&mut self) -> Option<String> {
        self.engine.take_status()
    }
}
