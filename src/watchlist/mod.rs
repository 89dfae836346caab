//! Ordered, deduplicated watch-list with file persistence.
//!
//! The list lives in a plain text file so users can hand-edit it: tokens
//! may be separated by newlines, commas, semicolons, or whitespace, in
//! half-width or full-width form. A missing file seeds a small default
//! list; an existing-but-empty file means the user explicitly cleared it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::errors::Result;
use crate::symbols;

/// Seed list written on first-ever load: the two composite indices plus
/// one liquid stock so the quote path is exercised out of the box.
pub const DEFAULT_SYMBOLS: &[&str] = &["sh000001", "sz399001", "sh600519"];

/// Token separators accepted by the loader, full-width variants included.
const SEPARATORS: &[char] = &[',', ';', '，', '；', '　'];

/// Ordered set of canonical symbols, persisted to a text file.
#[derive(Debug)]
pub struct WatchlistStore {
    path: PathBuf,
    symbols: Vec<String>,
    loaded: bool,
}

impl WatchlistStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            symbols: Vec::new(),
            loaded: false,
        }
    }

    /// Whether [`load`](Self::load) has run since construction.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Defensive copy of the stored list, in insertion order.
    pub fn symbols(&self) -> Vec<String> {
        self.symbols.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Replace the stored list.
    ///
    /// Each entry is normalized (entries that fail normalization are
    /// discarded) and deduplicated case-insensitively while preserving
    /// first-seen order. The new list is persisted immediately; a write
    /// failure is logged and never blocks the in-memory update.
    pub fn set_symbols<S: AsRef<str>>(&mut self, raw: &[S]) {
        self.symbols = dedup_normalized(raw.iter().map(|s| s.as_ref()));
        self.loaded = true;
        if let Err(e) = self.save() {
            warn!("failed to persist watch-list to {:?}: {}", self.path, e);
        }
    }

    /// Read the list back from disk.
    ///
    /// A missing file seeds [`DEFAULT_SYMBOLS`] and persists them right
    /// away so subsequent loads are deterministic. An existing-but-empty
    /// file loads as an explicitly empty list.
    pub fn load(&mut self) -> Result<()> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                self.symbols = parse_tokens(&content);
                self.loaded = true;
                debug!("loaded {} symbols from {:?}", self.symbols.len(), self.path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no watch-list at {:?}, seeding defaults", self.path);
                self.symbols = DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect();
                self.loaded = true;
                self.save()
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write the list to disk, one symbol per line.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut content = self.symbols.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Split raw file content into tokens on any accepted separator.
fn parse_tokens(content: &str) -> Vec<String> {
    dedup_normalized(
        content
            .split(|c: char| c.is_whitespace() || SEPARATORS.contains(&c))
            .filter(|t| !t.is_empty()),
    )
}

/// Normalize each entry, drop failures, dedup preserving first-seen order.
fn dedup_normalized<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in raw {
        let Some(canonical) = symbols::normalize(token) else {
            debug!("discarding unnormalizable watch-list entry {:?}", token);
            continue;
        };
        if !out.contains(&canonical) {
            out.push(canonical);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_set_symbols_dedups_case_insensitively() {
        let dir = tempdir().unwrap();
        let mut store = WatchlistStore::new(dir.path().join("symbols.txt"));

        store.set_symbols(&["600000", "sh600000", "SH600000"]);
        assert_eq!(store.symbols(), vec!["sh600000".to_string()]);
    }

    #[test]
    fn test_set_symbols_preserves_first_seen_order() {
        let dir = tempdir().unwrap();
        let mut store = WatchlistStore::new(dir.path().join("symbols.txt"));

        store.set_symbols(&["sz000001", "sh600519", "000001", "sh600000"]);
        assert_eq!(
            store.symbols(),
            vec!["sz000001", "sh600519", "sh600000"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("symbols.txt");

        let mut store = WatchlistStore::new(&path);
        store.set_symbols(&["sh600519", "sz000001", "sh000001"]);
        let written = store.symbols();

        let mut reloaded = WatchlistStore::new(&path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.symbols(), written);
    }

    #[test]
    fn test_missing_file_seeds_defaults_and_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("symbols.txt");

        let mut store = WatchlistStore::new(&path);
        store.load().unwrap();
        assert_eq!(store.symbols().len(), DEFAULT_SYMBOLS.len());
        assert!(path.exists());

        // The seed was persisted, so a fresh load sees the same list.
        let mut second = WatchlistStore::new(&path);
        second.load().unwrap();
        assert_eq!(second.symbols(), store.symbols());
    }

    #[test]
    fn test_empty_file_is_explicitly_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("symbols.txt");
        fs::write(&path, "").unwrap();

        let mut store = WatchlistStore::new(&path);
        store.load().unwrap();
        assert!(store.symbols().is_empty());
    }

    #[test]
    fn test_loader_tolerates_hand_edited_delimiters() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("symbols.txt");
        fs::write(&path, "sh600519，sz000001；600000, 1.601318\nsh000001；；\n").unwrap();

        let mut store = WatchlistStore::new(&path);
        store.load().unwrap();
        assert_eq!(
            store.symbols(),
            vec!["sh600519", "sz000001", "sh600000", "sh601318", "sh000001"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_invalid_entries_are_discarded() {
        let dir = tempdir().unwrap();
        let mut store = WatchlistStore::new(dir.path().join("symbols.txt"));

        store.set_symbols(&["sh600000", "abc", ""]);
        assert_eq!(store.symbols(), vec!["sh600000".to_string()]);
    }
}
