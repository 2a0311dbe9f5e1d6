//! Annotation persistence (`<image>.cfg`)
//!
//! A line-oriented, tab-separated text format. Bare-word lines open a
//! section; every other line is `ADDR<TAB>VALUE` with a hex address and is
//! routed to the current section:
//!
//! ```text
//! offset
//! 8000	0
//! dw
//! 8010	1
//! db
//! 8012	4
//! label
//! 8000	START
//! comment
//! 8000	cold start entry
//! ```
//!
//! The `offset` section holds the origin as the address of its single
//! entry; the value field is ignored. Counts in `dw`/`db` are decimal.
//!
//! Label and comment text is escaped so it stays on one line: `\\`, `\t`,
//! `\r` and `\n` stand for a backslash, tab, carriage return and line feed.

use crate::annotations::AnnotationStore;
use crate::DisasmError;

const SECTION_OFFSET: &str = "offset";
const SECTION_DW: &str = "dw";
const SECTION_DB: &str = "db";
const SECTION_LABEL: &str = "label";
const SECTION_COMMENT: &str = "comment";

/// Everything a `.cfg` file restores.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigData {
    /// Origin from the `offset` section, if present
    pub origin: Option<u32>,
    pub annotations: AnnotationStore,
}

/// Codec between `ConfigData` and `.cfg` text.
pub struct ConfigCodec;

impl ConfigCodec {
    /// Serialize an origin and annotation set.
    pub fn encode(origin: u32, annotations: &AnnotationStore) -> String {
        let mut lines = vec![SECTION_OFFSET.to_string(), format!("{:04X}\t0", origin)];

        lines.push(SECTION_DW.to_string());
        lines.extend(annotations.dw_entries().map(|(addr, count)| entry(addr, &count.to_string())));
        lines.push(SECTION_DB.to_string());
        lines.extend(annotations.db_entries().map(|(addr, count)| entry(addr, &count.to_string())));
        lines.push(SECTION_LABEL.to_string());
        lines.extend(annotations.labels().map(|(addr, name)| entry(addr, &escape(name))));
        lines.push(SECTION_COMMENT.to_string());
        lines.extend(annotations.comments().map(|(addr, text)| entry(addr, &escape(text))));

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    /// Parse `.cfg` text.
    ///
    /// Malformed lines are skipped and reported as `DisasmError::ConfigParse`
    /// values naming `file` and the 1-indexed line; the rest of the text
    /// still loads.
    pub fn decode(text: &str, file: &str) -> (ConfigData, Vec<DisasmError>) {
        let mut data = ConfigData::default();
        let mut errors = Vec::new();
        let mut section: Option<&str> = None;

        for (idx, line) in text.lines().enumerate() {
            if line.is_empty() {
                continue;
            }

            if is_section_header(line) {
                section = Some(line);
                continue;
            }

            let parsed = parse_entry(line)
                .and_then(|(addr, value)| apply_entry(&mut data, section, addr, value));
            if parsed.is_none() {
                errors.push(DisasmError::ConfigParse {
                    file: file.to_string(),
                    line: idx + 1,
                    text: format!("{} {}", section.unwrap_or(""), line),
                });
            }
        }

        (data, errors)
    }
}

fn entry(addr: u32, value: &str) -> String {
    format!("{:04X}\t{}", addr, value)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Inverse of `escape`. Unknown escapes are kept as written.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn is_section_header(line: &str) -> bool {
    line.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split `ADDR<TAB>VALUE`; the value must be non-empty.
fn parse_entry(line: &str) -> Option<(u32, &str)> {
    let (addr, value) = line.split_once('\t')?;
    if addr.is_empty() || value.is_empty() || !addr.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let addr = u32::from_str_radix(addr, 16).ok()?;
    Some((addr, value))
}

fn apply_entry(data: &mut ConfigData, section: Option<&str>, addr: u32, value: &str) -> Option<()> {
    match section? {
        SECTION_OFFSET => data.origin = Some(addr),
        SECTION_DW => data.annotations.set_dw(addr, value.trim().parse().ok()?),
        SECTION_DB => data.annotations.set_db(addr, value.trim().parse().ok()?),
        SECTION_LABEL => data.annotations.set_label(addr, unescape(value)),
        SECTION_COMMENT => data.annotations.set_comment(addr, unescape(value)),
        _ => return None,
    }
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let mut ann = AnnotationStore::new();
        ann.set_dw(0x0010, 1);
        ann.set_label(0x0000, "START");

        let text = ConfigCodec::encode(0x0000, &ann);
        assert_eq!(
            text,
            "offset\n0000\t0\ndw\n0010\t1\ndb\nlabel\n0000\tSTART\ncomment\n"
        );
    }

    #[test]
    fn test_round_trip() {
        let mut ann = AnnotationStore::new();
        ann.set_dw(0x8010, 3);
        ann.set_db(0x8020, 12);
        ann.set_label(0x8000, "START");
        ann.set_comment(0x8000, "entry point; keep\tthis");

        let text = ConfigCodec::encode(0x8000, &ann);
        let (data, errors) = ConfigCodec::decode(&text, "rom.bin.cfg");

        assert!(errors.is_empty());
        assert_eq!(data.origin, Some(0x8000));
        assert_eq!(data.annotations, ann);
    }

    #[test]
    fn test_control_characters_survive_round_trip() {
        let mut ann = AnnotationStore::new();
        ann.set_comment(0x0001, "HI\r\n");
        ann.set_comment(0x0010, "C:\\ROM\\n");
        ann.set_label(0x0020, "TAB\tBED");

        let text = ConfigCodec::encode(0x0000, &ann);
        assert!(text.contains("0001\tHI\\r\\n\n"));

        let (data, errors) = ConfigCodec::decode(&text, "x.cfg");
        assert!(errors.is_empty());
        assert_eq!(data.annotations, ann);
    }

    #[test]
    fn test_unknown_escape_kept() {
        assert_eq!(unescape("a\\qb\\"), "a\\qb\\");
    }

    #[test]
    fn test_bad_address_reported_with_line() {
        let text = "label\n0000\tGOOD\nZZZZ\tFoo\n0002\tALSO_GOOD\n";
        let (data, errors) = ConfigCodec::decode(text, "x.cfg");

        assert_eq!(errors.len(), 1);
        match &errors[0] {
            DisasmError::ConfigParse { file, line, .. } => {
                assert_eq!(file, "x.cfg");
                assert_eq!(*line, 3);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(data.annotations.label(0x0000), Some("GOOD"));
        assert_eq!(data.annotations.label(0x0002), Some("ALSO_GOOD"));
    }

    #[test]
    fn test_entry_without_section() {
        let (data, errors) = ConfigCodec::decode("0000\tORPHAN\n", "x.cfg");
        assert_eq!(errors.len(), 1);
        assert!(data.annotations.is_empty());
    }

    #[test]
    fn test_unknown_section() {
        let (_, errors) = ConfigCodec::decode("symbols\n0000\tX\n", "x.cfg");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_non_numeric_count() {
        let (data, errors) = ConfigCodec::decode("db\n0000\tmany\n0004\t2\n", "x.cfg");
        assert_eq!(errors.len(), 1);
        assert_eq!(data.annotations.db(0x0004), Some(2));
    }
}
