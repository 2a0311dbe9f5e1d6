//! Disassembly engine
//!
//! `DisassemblyEngine` owns one open image: its `AddressSpace`, its
//! `AnnotationStore` and the selected architecture. A front end drives it
//! through line lookup, stepping, annotation edits and load/save; it never
//! touches the maps directly.
//!
//! Failures never escape as panics. Each one is returned as a `DisasmError`
//! and also left in a one-shot status slot that `take_status` drains, so a
//! UI can simply show whatever message is pending after every command.
//!
//! # Decode side effects
//!
//! Decoding a CDP1802 `SEP R4` marks the next address as a one-word `DW`
//! vector. `get_line`, `next_addr`, `lines` and the exports apply that edit,
//! so the output for an address can change after a neighbouring address is
//! decoded. Use `peek_line` for a decode that leaves the annotations alone.

use crate::annotations::{AnnotationEdit, AnnotationStore};
use crate::config::ConfigCodec;
use crate::disassembler::formatter::{format_line, Line};
use crate::disassembler::{Architecture, Decoder, Instruction};
use crate::hex;
use crate::memory::AddressSpace;
use crate::DisasmError;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Settings fixed when an engine is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// CPU to decode for
    pub arch: Architecture,

    /// Load address of the image. A persisted `offset` in the image's
    /// `.cfg` file takes precedence.
    pub origin: Option<u32>,
}

/// Byte that ends a string marked with `mark_string`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringTerminator {
    /// C-style `0x00`
    Nul,
    /// Carriage return `0x0D`
    CarriageReturn,
}

impl StringTerminator {
    pub fn byte(self) -> u8 {
        match self {
            StringTerminator::Nul => 0x00,
            StringTerminator::CarriageReturn => 0x0D,
        }
    }
}

/// An annotating disassembler over one memory image.
#[derive(Debug, Default)]
pub struct DisassemblyEngine {
    arch: Architecture,
    space: AddressSpace,
    annotations: AnnotationStore,
    path: Option<PathBuf>,
    default_origin: Option<u32>,
    status: Option<String>,
    config_errors: Vec<DisasmError>,
}

/// Path of the annotation file belonging to `path` (`rom.bin` -> `rom.bin.cfg`).
pub fn config_path(path: &Path) -> PathBuf {
    with_suffix(path, ".cfg")
}

/// Path of the source export belonging to `path` (`rom.bin` -> `rom.bin.asm`).
pub fn export_path(path: &Path) -> PathBuf {
    with_suffix(path, ".asm")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

impl DisassemblyEngine {
    /// Open an image file and its annotations.
    ///
    /// Never fails: if the image cannot be loaded the engine holds an empty
    /// image and the reason is left in the status slot.
    pub fn open(path: impl AsRef<Path>, config: EngineConfig) -> Self {
        let mut engine = Self {
            arch: config.arch,
            default_origin: config.origin,
            ..Self::default()
        };
        log::debug!("architecture {}", engine.arch);
        engine.load(path);
        engine
    }

    /// Build an engine around an in-memory image, with no backing file.
    pub fn from_parts(arch: Architecture, space: AddressSpace, annotations: AnnotationStore) -> Self {
        Self {
            arch,
            space,
            annotations,
            ..Self::default()
        }
    }

    /// Switch to another image file.
    ///
    /// The previous image and annotations are discarded; annotations come
    /// from the new file's own `.cfg`, if it has one.
    pub fn load(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.annotations = AnnotationStore::new();
        self.config_errors.clear();

        self.space = match hex::load_image(&path) {
            Ok(mut space) => {
                log::info!("loaded {} ({} bytes)", path.display(), space.size());
                space.set_origin(self.default_origin.unwrap_or(0));
                space
            }
            Err(err) => {
                log::warn!("load of {} failed: {}", path.display(), err);
                self.status = Some(err.to_string());
                AddressSpace::new()
            }
        };
        self.path = Some(path);
        self.load_config();
    }

    /// Load the same file again from disk.
    pub fn reload(&mut self) {
        if let Some(path) = self.path.clone() {
            self.load(path);
        }
    }

    fn load_config(&mut self) {
        let Some(path) = self.path.as_deref().map(config_path) else {
            return;
        };
        if !path.exists() {
            return;
        }

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                log::warn!("cannot read {}: {}", path.display(), err);
                self.status = Some(format!("cannot read '{}': {}", path.display(), err));
                return;
            }
        };

        let (data, errors) = ConfigCodec::decode(&text, &path.display().to_string());
        // A failed image load stays at origin 0
        if let Some(origin) = data.origin.filter(|_| !self.space.is_empty()) {
            self.space.set_origin(origin);
        }
        self.annotations = data.annotations;
        for err in &errors {
            log::warn!("{}", err);
        }
        if let Some(last) = errors.last() {
            self.status = Some(last.to_string());
        }
        self.config_errors = errors;
        log::info!(
            "loaded {} ({} annotations)",
            path.display(),
            self.annotations.len()
        );
    }

    /// Write the origin and annotations to `<image>.cfg`.
    pub fn save(&mut self) -> Result<PathBuf, DisasmError> {
        let path = self.companion_path(config_path)?;
        let text = ConfigCodec::encode(self.space.origin(), &self.annotations);
        let result = fs::write(&path, text);
        self.report(result.map_err(DisasmError::from))?;

        log::info!("saved {}", path.display());
        self.status = Some("cfg saved".to_string());
        Ok(path)
    }

    /// Write the full listing to `<image>.asm`.
    pub fn source_export(&mut self) -> Result<PathBuf, DisasmError> {
        let path = self.companion_path(export_path)?;
        let result = self.write_source(&path);
        self.report(result)?;

        log::info!("exported {}", path.display());
        self.status = Some("source saved".to_string());
        Ok(path)
    }

    fn write_source(&mut self, path: &Path) -> Result<(), DisasmError> {
        let mut out = BufWriter::new(File::create(path)?);
        let origin = self.space.origin();
        for line in self.lines(origin) {
            writeln!(out, "{}", format_line(&line))?;
        }
        out.flush()?;
        Ok(())
    }

    /// The full listing as text, one formatted line per instruction.
    pub fn export_source(&mut self) -> String {
        let origin = self.space.origin();
        self.lines(origin)
            .map(|line| format_line(&line) + "\n")
            .collect()
    }

    fn companion_path(&mut self, derive: fn(&Path) -> PathBuf) -> Result<PathBuf, DisasmError> {
        if let Some(path) = self.path.as_deref() {
            return Ok(derive(path));
        }
        self.report(Err(DisasmError::Load {
            path: PathBuf::new(),
            message: "no file".to_string(),
        }))
    }

    /// Record an error in the status slot on its way out.
    fn report<T>(&mut self, result: Result<T, DisasmError>) -> Result<T, DisasmError> {
        if let Err(err) = &result {
            log::warn!("{}", err);
            self.status = Some(err.to_string());
        }
        result
    }

    fn range_error<T>(&mut self, target: u32) -> Result<T, DisasmError> {
        self.report(Err(DisasmError::Range { target }))
    }

    /// Decode at `addr`, applying any annotation edits the decode implies.
    pub fn decode(&mut self, addr: u32) -> Instruction {
        let decoded = self
            .arch
            .decoder()
            .decode_mut(addr, &self.space, &self.annotations);
        self.apply_edits(decoded.edits);
        decoded.instruction
    }

    /// Edits aimed outside the image are dropped.
    fn apply_edits(&mut self, edits: Vec<AnnotationEdit>) {
        for edit in edits {
            if self.space.in_range(edit.address()) {
                self.annotations.apply(edit);
            } else {
                log::debug!("dropping edit outside image: {:?}", edit);
            }
        }
    }

    /// The listing line at `addr`, or `None` outside the image.
    pub fn get_line(&mut self, addr: u32) -> Option<Line> {
        if !self.space.in_range(addr) {
            return None;
        }
        let instr = self.decode(addr);
        Some(self.make_line(instr))
    }

    /// Like `get_line`, but never modifies the annotations.
    pub fn peek_line(&self, addr: u32) -> Option<Line> {
        if !self.space.in_range(addr) {
            return None;
        }
        let instr = self
            .arch
            .decoder()
            .decode(addr, &self.space, &self.annotations);
        Some(self.make_line(instr))
    }

    fn make_line(&self, instr: Instruction) -> Line {
        let addr = instr.address;
        let bytes = (0..instr.length as u32)
            .map(|i| self.space.read(addr.wrapping_add(i)))
            .collect();
        Line::new(
            instr,
            bytes,
            self.annotations.label(addr).map(str::to_string),
            self.annotations.comment(addr).map(str::to_string),
        )
    }

    /// Lines from `from` to the end of the image, in address order.
    pub fn lines(&mut self, from: u32) -> Lines<'_> {
        Lines {
            engine: self,
            next: Some(from),
        }
    }

    /// Address of the instruction following the one at `addr`.
    ///
    /// Fails with `DisasmError::Range` if that address is outside the image.
    /// A failed step leaves the annotations untouched; decode edits are only
    /// applied once the step succeeds.
    pub fn next_addr(&mut self, addr: u32) -> Result<u32, DisasmError> {
        let decoded = self
            .arch
            .decoder()
            .decode_mut(addr, &self.space, &self.annotations);
        let length = u32::try_from(decoded.instruction.length).unwrap_or(u32::MAX);

        match addr.checked_add(length) {
            Some(target) if self.space.in_range(target) => {
                self.apply_edits(decoded.edits);
                Ok(target)
            }
            _ => self.range_error(addr.saturating_add(length)),
        }
    }

    /// The address one byte before `addr`.
    ///
    /// Backward steps are byte-granular: instruction boundaries are only
    /// known when decoding forward from a known start.
    pub fn prev_addr(&mut self, addr: u32) -> Result<u32, DisasmError> {
        let target = addr.wrapping_sub(1);
        if addr > 0 && self.space.in_range(target) {
            Ok(target)
        } else {
            self.range_error(target)
        }
    }

    /// Resolve jump input: 1-4 hex digits, otherwise a label name.
    pub fn jump_target(&mut self, text: &str) -> Result<u32, DisasmError> {
        let text = text.trim();
        let is_hex = (1..=4).contains(&text.len()) && text.chars().all(|c| c.is_ascii_hexdigit());

        let addr = if is_hex {
            u32::from_str_radix(text, 16).ok()
        } else {
            self.annotations.address_of(text)
        };

        match addr {
            Some(addr) if self.space.in_range(addr) => Ok(addr),
            Some(addr) => self.range_error(addr),
            None => self.report(Err(DisasmError::UnknownTarget(text.to_string()))),
        }
    }

    /// The address referred to by the operand of the instruction at `addr`.
    ///
    /// Only branches, calls, absolute memory references and one-word `DW`
    /// vectors have one.
    pub fn operand_target(&mut self, addr: u32) -> Result<u32, DisasmError> {
        let instr = self.decode(addr);
        match instr.target {
            Some(target) if self.space.in_range(target) => Ok(target),
            Some(target) => self.range_error(target),
            None => self.report(Err(DisasmError::UnknownTarget(instr.operand))),
        }
    }

    /// Mark a terminated string at `addr` as `DB` data.
    ///
    /// The directive covers every byte up to and including the terminator,
    /// and the text itself becomes the comment at `addr` unless it is empty.
    /// Without a terminator the string runs to the end of the image. Returns
    /// the number of bytes covered.
    pub fn mark_string(&mut self, addr: u32, terminator: StringTerminator) -> usize {
        let end = terminator.byte();
        let mut text = String::new();
        let mut count = 0;
        let mut p = Some(addr);

        while let Some(at) = p.filter(|&at| self.space.in_range(at)) {
            let b = self.space.read(at);
            count += 1;
            if b == end {
                break;
            }
            text.push(b as char);
            p = at.checked_add(1);
        }

        if count > 0 {
            self.annotations.set_db(addr, count);
            if !text.is_empty() {
                self.annotations.set_comment(addr, text);
            }
        }
        count
    }

    pub fn set_db(&mut self, addr: u32, count: usize) {
        self.annotations.set_db(addr, count);
    }

    pub fn set_dw(&mut self, addr: u32, count: usize) {
        self.annotations.set_dw(addr, count);
    }

    pub fn clear_db(&mut self, addr: u32) {
        self.annotations.clear_db(addr);
    }

    pub fn clear_dw(&mut self, addr: u32) {
        self.annotations.clear_dw(addr);
    }

    pub fn set_label(&mut self, addr: u32, name: impl Into<String>) {
        self.annotations.set_label(addr, name);
    }

    pub fn clear_label(&mut self, addr: u32) {
        self.annotations.clear_label(addr);
    }

    pub fn set_comment(&mut self, addr: u32, text: impl Into<String>) {
        self.annotations.set_comment(addr, text);
    }

    pub fn clear_comment(&mut self, addr: u32) {
        self.annotations.clear_comment(addr);
    }

    /// Rebase the image to start at `addr`.
    pub fn set_origin(&mut self, addr: u32) {
        self.space.set_origin(addr);
    }

    /// Take the pending status message, clearing it.
    pub fn take_status(&mut self) -> Option<String> {
        self.status.take()
    }

    /// Replace the pending status message.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    /// `"<file>(SSSS-EEEE)"` for a loaded image, `"no file"` otherwise.
    pub fn status_line(&self) -> String {
        match (&self.path, self.space.end()) {
            (Some(path), Some(end)) => {
                format!("{}({:04X}-{:04X})", path.display(), self.space.origin(), end)
            }
            (None, Some(end)) => format!("({:04X}-{:04X})", self.space.origin(), end),
            _ => "no file".to_string(),
        }
    }

    /// Errors from the last `.cfg` load, one per rejected line.
    pub fn config_errors(&self) -> &[DisasmError] {
        &self.config_errors
    }

    pub fn arch(&self) -> Architecture {
        self.arch
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn space(&self) -> &AddressSpace {
        &self.space
    }

    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    pub fn origin(&self) -> u32 {
        self.space.origin()
    }

    pub fn size(&self) -> usize {
        self.space.size()
    }

    pub fn in_range(&self, addr: u32) -> bool {
        self.space.in_range(addr)
    }
}

/// Iterator over consecutive listing lines; see `DisassemblyEngine::lines`.
pub struct Lines<'a> {
    engine: &'a mut DisassemblyEngine,
    next: Option<u32>,
}

impl Iterator for Lines<'_> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        let addr = self.next?;
        let line = self.engine.get_line(addr)?;
        self.next = addr.checked_add(line.length as u32);
        Some(line)
    }
}
