//! Intel HEX and raw binary image loading.
//!
//! Intel HEX records have the form `:LLAAAATT[DD...]CC`:
//!
//! | Field | Meaning |
//! | --- | --- |
//! | `LL` | data byte count |
//! | `AAAA` | 16-bit load address, big-endian |
//! | `TT` | record type |
//! | `DD` | data bytes |
//! | `CC` | two's complement of the low byte of the sum of all other bytes |
//!
//! Loading is fail-clean: any error discards everything accumulated so far.

use crate::memory::AddressSpace;
use crate::DisasmError;
use std::fs;
use std::path::Path;

const RECORD_DATA: u8 = 0x00;
const RECORD_EOF: u8 = 0x01;
const RECORD_EXT_SEGMENT: u8 = 0x02;
const RECORD_START_SEGMENT: u8 = 0x03;
const RECORD_EXT_LINEAR: u8 = 0x04;

/// Intel HEX loader.
///
/// Record types 2-4 (extended and start addresses) are accepted and
/// ignored. Type 5 and anything else aborts the load.
///
/// # Examples
///
/// ```
/// use idis::HexLoader;
///
/// let text = ":03000000C40000 39\n:00000001FF\n".replace(' ', "");
/// let space = HexLoader::parse(&text).unwrap();
/// assert_eq!(space.size(), 3);
/// assert_eq!(space.read(0x0000), 0xC4);
/// ```
#[derive(Debug, Default)]
pub struct HexLoader {
    data: Vec<u8>,
}

/// A decoded record, before its data is stored.
#[derive(Debug)]
struct Record {
    address: u16,
    record_type: u8,
    data: Vec<u8>,
    checksum: u8,
}

impl HexLoader {
    /// Parses Intel HEX text into an address space at origin 0.
    ///
    /// Record addresses are absolute: a record at `0x8000` lands at index
    /// `0x8000`, and any skipped addresses are zero-filled.
    pub fn parse(text: &str) -> Result<AddressSpace, DisasmError> {
        let mut loader = HexLoader::default();

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }

            let record = parse_record(trimmed).ok_or_else(|| DisasmError::Format {
                line,
                text: trimmed.to_string(),
            })?;

            match record.record_type {
                RECORD_DATA => {
                    let computed = record.sum();
                    if computed != 0 {
                        return Err(DisasmError::Checksum { line, computed });
                    }
                    loader.store(record.address, &record.data);
                }
                RECORD_EOF => break,
                RECORD_EXT_SEGMENT | RECORD_START_SEGMENT | RECORD_EXT_LINEAR => {}
                _ => {
                    return Err(DisasmError::Format {
                        line,
                        text: format!("type= {}", record.record_type),
                    })
                }
            }
        }

        Ok(AddressSpace::from_bytes(loader.data))
    }

    /// Reads and parses an Intel HEX file.
    pub fn load_file(path: &Path) -> Result<AddressSpace, DisasmError> {
        let text = fs::read_to_string(path).map_err(|e| DisasmError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&text)
    }

    fn store(&mut self, address: u16, bytes: &[u8]) {
        let start = address as usize;
        let end = start + bytes.len();
        if self.data.len() < end {
            self.data.resize(end, 0x00);
        }
        self.data[start..end].copy_from_slice(bytes);
    }
}

impl Record {
    /// Sum of every record byte including the checksum; zero when valid.
    fn sum(&self) -> u8 {
        let [hi, lo] = self.address.to_be_bytes();
        let mut sum = (self.data.len() as u8)
            .wrapping_add(hi)
            .wrapping_add(lo)
            .wrapping_add(self.record_type);
        for &b in &self.data {
            sum = sum.wrapping_add(b);
        }
        sum.wrapping_add(self.checksum)
    }
}

/// Splits one `:`-prefixed line into its fields, or `None` if malformed.
fn parse_record(line: &str) -> Option<Record> {
    let body = line.strip_prefix(':')?;
    if body.len() % 2 != 0 || !body.is_ascii() {
        return None;
    }

    let bytes = (0..body.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&body[i..i + 2], 16).ok())
        .collect::<Option<Vec<u8>>>()?;

    // length, address (2), type, checksum
    if bytes.len() < 5 {
        return None;
    }
    let length = bytes[0] as usize;
    if bytes.len() != length + 5 {
        return None;
    }

    Some(Record {
        address: u16::from_be_bytes([bytes[1], bytes[2]]),
        record_type: bytes[3],
        data: bytes[4..4 + length].to_vec(),
        checksum: bytes[4 + length],
    })
}

/// Reads a file verbatim as an image starting at origin 0.
pub fn read_binary(path: &Path) -> Result<AddressSpace, DisasmError> {
    let data = fs::read(path).map_err(|e| DisasmError::Load {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(AddressSpace::from_bytes(data))
}

/// Loads an image, choosing the Intel HEX loader for `.hex` files.
pub fn load_image(path: &Path) -> Result<AddressSpace, DisasmError> {
    let is_hex = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("hex"))
        .unwrap_or(false);

    if is_hex {
        HexLoader::load_file(path)
    } else {
        read_binary(path)
    }
}
