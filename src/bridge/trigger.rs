//! Trigger file: hands the newest message to the terminal injector.
//!
//! The watcher replaces the file atomically; the injector claims it by
//! renaming it aside before reading, so a message is injected at most once.

use super::cursor::write_atomic;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MAX_TRIGGER_BYTES: usize = 4000;

/// Find a safe UTF-8 boundary at or before the given byte index.
fn safe_byte_boundary(s: &str, byte_idx: usize) -> usize {
    if byte_idx >= s.len() {
        return s.len();
    }
    let mut idx = byte_idx;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[derive(Debug, Clone)]
pub struct TriggerFile {
    path: PathBuf,
}

impl TriggerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the file with `content`, trimmed and bounded.
    pub fn write(&self, content: &str) -> io::Result<()> {
        let trimmed = content.trim();
        let bounded = &trimmed[..safe_byte_boundary(trimmed, MAX_TRIGGER_BYTES)];
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        write_atomic(&self.path, bounded.as_bytes())?;
        debug!(path = %self.path.display(), bytes = bounded.len(), "trigger written");
        Ok(())
    }

    /// Read without clearing. `None` when there is no file.
    pub fn peek(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Atomic read-and-clear: rename aside, read, delete.
    pub fn take(&self) -> io::Result<Option<String>> {
        let claimed = self.path.with_extension("in-progress");
        match fs::rename(&self.path, &claimed) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        }
        let text = fs::read_to_string(&claimed);
        let _ = fs::remove_file(&claimed);
        text.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_then_take_clears() {
        let dir = TempDir::new().unwrap();
        let trigger = TriggerFile::new(dir.path().join("flag"));
        trigger.write("  hello there \n").unwrap();
        assert_eq!(trigger.peek().unwrap().as_deref(), Some("hello there"));
        assert_eq!(trigger.take().unwrap().as_deref(), Some("hello there"));
        assert_eq!(trigger.take().unwrap(), None);
        assert!(!trigger.path().exists());
    }

    #[test]
    fn write_replaces_previous_content() {
        let dir = TempDir::new().unwrap();
        let trigger = TriggerFile::new(dir.path().join("nested/flag"));
        trigger.write("first").unwrap();
        trigger.write("second").unwrap();
        assert_eq!(trigger.peek().unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn write_bounds_on_char_boundary() {
        let dir = TempDir::new().unwrap();
        let trigger = TriggerFile::new(dir.path().join("flag"));
        let long = "é".repeat(MAX_TRIGGER_BYTES);
        trigger.write(&long).unwrap();
        let stored = trigger.peek().unwrap().unwrap();
        assert!(stored.len() <= MAX_TRIGGER_BYTES);
        assert!(stored.chars().all(|c| c == 'é'));
    }

    #[test]
    fn missing_file_peeks_none() {
        let dir = TempDir::new().unwrap();
        let trigger = TriggerFile::new(dir.path().join("absent"));
        assert_eq!(trigger.peek().unwrap(), None);
    }
}
