//! User annotations over a memory image
//!
//! Four independent maps keyed by logical address: `DB` byte counts, `DW`
//! word counts, label names and comments. Writes are unchecked: overlapping
//! or out-of-range directives are the annotator's responsibility and simply
//! render as overlapping decode output.

use std::collections::BTreeMap;

/// Annotation maps attached to one image.
///
/// Maps are ordered by address, so reverse label lookup and persistence are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationStore {
    db: BTreeMap<u32, usize>,
    dw: BTreeMap<u32, usize>,
    labels: BTreeMap<u32, String>,
    comments: BTreeMap<u32, String>,
}

/// A single pending write to an `AnnotationStore`.
///
/// Decoders return these instead of mutating the store directly, so the
/// side effects of a decode can be inspected before they are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationEdit {
    SetDb { address: u32, count: usize },
    SetDw { address: u32, count: usize },
    SetLabel { address: u32, name: String },
    SetComment { address: u32, text: String },
}

impl AnnotationEdit {
    /// Address the edit writes to
    pub fn address(&self) -> u32 {
        match self {
            AnnotationEdit::SetDb { address, .. }
            | AnnotationEdit::SetDw { address, .. }
            | AnnotationEdit::SetLabel { address, .. }
            | AnnotationEdit::SetComment { address, .. } => *address,
        }
    }
}

impl AnnotationStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `count` bytes at `addr` as a `DB` directive
    pub fn set_db(&mut self, addr: u32, count: usize) {
        self.db.insert(addr, count);
    }

    /// Render `count` words at `addr` as a `DW` directive.
    ///
    /// Besides explicit calls, the engine sets `DW 1` here itself when it
    /// decodes a CDP1802 `SEP R4` at `addr - 1`.
    pub fn set_dw(&mut self, addr: u32, count: usize) {
        self.dw.insert(addr, count);
    }

    /// Remove the `DB` directive at `addr`
    pub fn clear_db(&mut self, addr: u32) {
        self.db.remove(&addr);
    }

    /// Remove the `DW` directive at `addr`
    pub fn clear_dw(&mut self, addr: u32) {
        self.dw.remove(&addr);
    }

    /// Attach label `name` to `addr`, replacing any previous one
    pub fn set_label(&mut self, addr: u32, name: impl Into<String>) {
        self.labels.insert(addr, name.into());
    }

    /// Remove the label at `addr`
    pub fn clear_label(&mut self, addr: u32) {
        self.labels.remove(&addr);
    }

    /// Attach a comment to `addr`, replacing any previous one
    pub fn set_comment(&mut self, addr: u32, text: impl Into<String>) {
        self.comments.insert(addr, text.into());
    }

    /// Remove the comment at `addr`
    pub fn clear_comment(&mut self, addr: u32) {
        self.comments.remove(&addr);
    }

    /// `DB` byte count at `addr`, if any
    pub fn db(&self, addr: u32) -> Option<usize> {
        self.db.get(&addr).copied()
    }

    /// `DW` word count at `addr`, if any
    pub fn dw(&self, addr: u32) -> Option<usize> {
        self.dw.get(&addr).copied()
    }

    /// Label at `addr`, if any
    pub fn label(&self, addr: u32) -> Option<&str> {
        self.labels.get(&addr).map(String::as_str)
    }

    /// Comment at `addr`, if any
    pub fn comment(&self, addr: u32) -> Option<&str> {
        self.comments.get(&addr).map(String::as_str)
    }

    /// Look up the address carrying label `name`.
    ///
    /// Names are not required to be unique. When several addresses share a
    /// name, the lowest address wins.
    pub fn address_of(&self, name: &str) -> Option<u32> {
        self.labels
            .iter()
            .find(|(_, label)| label.as_str() == name)
            .map(|(addr, _)| *addr)
    }

    /// Apply one edit produced by a decoder.
    pub fn apply(&mut self, edit: AnnotationEdit) {
        match edit {
            AnnotationEdit::SetDb { address, count } => self.set_db(address, count),
            AnnotationEdit::SetDw { address, count } => self.set_dw(address, count),
            AnnotationEdit::SetLabel { address, name } => self.set_label(address, name),
            AnnotationEdit::SetComment { address, text } => self.set_comment(address, text),
        }
    }

    /// `DB` directives in address order
    pub fn db_entries(&self) -> impl Iterator<Item = (u32, usize)> + '_ {
        self.db.iter().map(|(a, n)| (*a, *n))
    }

    /// `DW` directives in address order
    pub fn dw_entries(&self) -> impl Iterator<Item = (u32, usize)> + '_ {
        self.dw.iter().map(|(a, n)| (*a, *n))
    }

    /// Labels in address order
    pub fn labels(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.labels.iter().map(|(a, s)| (*a, s.as_str()))
    }

    /// Comments in address order
    pub fn comments(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.comments.iter().map(|(a, s)| (*a, s.as_str()))
    }

    /// Total number of entries across all four maps
    pub fn len(&self) -> usize {
        self.db.len() + self.dw.len() + self.labels.len() + self.comments.len()
    }

    /// Returns true if no annotation of any kind is set
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear() {
        let mut store = AnnotationStore::new();

        store.set_db(0x0010, 4);
        store.set_dw(0x0020, 2);
        store.set_label(0x0030, "LOOP");
        store.set_comment(0x0030, "main loop");

        assert_eq!(store.db(0x0010), Some(4));
        assert_eq!(store.dw(0x0020), Some(2));
        assert_eq!(store.label(0x0030), Some("LOOP"));
        assert_eq!(store.comment(0x0030), Some("main loop"));
        assert_eq!(store.len(), 4);

        store.clear_db(0x0010);
        store.clear_dw(0x0020);
        store.clear_label(0x0030);
        store.clear_comment(0x0030);

        assert!(store.is_empty());
        assert_eq!(store.label(0x0030), None);
    }

    #[test]
    fn test_reverse_lookup_first_match() {
        let mut store = AnnotationStore::new();

        store.set_label(0x0200, "DUP");
        store.set_label(0x0100, "DUP");
        store.set_label(0x0300, "START");

        assert_eq!(store.address_of("START"), Some(0x0300));
        assert_eq!(store.address_of("DUP"), Some(0x0100));
        assert_eq!(store.address_of("MISSING"), None);
    }

    #[test]
    fn test_apply_edit() {
        let mut store = AnnotationStore::new();

        store.apply(AnnotationEdit::SetDw {
            address: 0x0005,
            count: 1,
        });

        assert_eq!(store.dw(0x0005), Some(1));
    }

    #[test]
    fn test_set_overwrites() {
        let mut store = AnnotationStore::new();

        store.set_label(0x0000, "A");
        store.set_label(0x0000, "B");

        assert_eq!(store.label(0x0000), Some("B"));
        assert_eq!(store.labels().count(), 1);
    }
}
