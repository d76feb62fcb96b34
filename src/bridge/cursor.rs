//! Durable cursors: one value per key, surviving process restarts.
//!
//! The file store keeps each cursor in its own file under the state
//! directory and replaces it with write-temp-then-rename, so readers see the
//! old value or the new one, never a torn write. There is no locking; one
//! writer per cursor at a time is assumed.

use agentbridge_core::{CursorKey, Error, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

pub trait CursorStore: Send + Sync {
    /// `None` means no prior state.
    fn get(&self, key: CursorKey) -> Result<Option<String>>;
    fn set(&self, key: CursorKey, value: &str) -> Result<()>;
}

/// Cursor files under a state directory (`last_read`, `last_interaction`, `last_send`).
#[derive(Debug, Clone)]
pub struct FileCursorStore {
    dir: PathBuf,
}

impl FileCursorStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: CursorKey) -> PathBuf {
        self.dir.join(key.storage_name())
    }
}

impl CursorStore for FileCursorStore {
    fn get(&self, key: CursorKey) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => {
                let value = raw.trim();
                Ok((!value.is_empty()).then(|| value.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::cursor(key, e)),
        }
    }

    fn set(&self, key: CursorKey, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::cursor(key, e))?;
        let path = self.path_for(key);
        write_atomic(&path, value.as_bytes()).map_err(|e| Error::cursor(key, e))?;
        debug!(cursor = %key, value, "cursor advanced");
        Ok(())
    }
}

/// Write `contents` next to `path` and rename it into place.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let parent = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("cursor");
    let tmp = parent.join(format!(".{}.tmp-{}", name, std::process::id()));

    let mut file = fs::File::create(&tmp)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

/// Process-local cursors for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    values: Mutex<HashMap<CursorKey, String>>,
}

impl MemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CursorStore for MemoryCursorStore {
    fn get(&self, key: CursorKey) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        Ok(values.get(&key).cloned())
    }

    fn set(&self, key: CursorKey, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        values.insert(key, value.to_string());
        Ok(())
    }
}

/// Send instants are stored as fractional unix seconds.
pub fn encode_instant(instant: DateTime<Utc>) -> String {
    format!(
        "{}.{:06}",
        instant.timestamp(),
        instant.timestamp_subsec_micros()
    )
}

pub fn decode_instant(raw: &str) -> Option<DateTime<Utc>> {
    let secs: f64 = raw.trim().parse().ok()?;
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_cursor_is_absent() {
        let dir = TempDir::new().unwrap();
        let store = FileCursorStore::new(dir.path().join("state"));
        assert_eq!(store.get(CursorKey::Read).unwrap(), None);
    }

    #[test]
    fn set_creates_dir_and_persists() {
        let dir = TempDir::new().unwrap();
        let store = FileCursorStore::new(dir.path().join("state"));
        store.set(CursorKey::Interaction, "1234").unwrap();

        let reopened = FileCursorStore::new(dir.path().join("state"));
        assert_eq!(reopened.get(CursorKey::Interaction).unwrap().as_deref(), Some("1234"));
        assert_eq!(reopened.get(CursorKey::Read).unwrap(), None);
        assert!(dir.path().join("state/last_interaction").is_file());
    }

    #[test]
    fn set_overwrites_and_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = FileCursorStore::new(dir.path());
        store.set(CursorKey::Read, "1").unwrap();
        store.set(CursorKey::Read, "2").unwrap();
        assert_eq!(store.get(CursorKey::Read).unwrap().as_deref(), Some("2"));

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn whitespace_file_reads_as_absent() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("last_read"), "  \n").unwrap();
        let store = FileCursorStore::new(dir.path());
        assert_eq!(store.get(CursorKey::Read).unwrap(), None);
    }

    #[test]
    fn hand_written_value_is_trimmed() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("last_read"), "999\n").unwrap();
        let store = FileCursorStore::new(dir.path());
        assert_eq!(store.get(CursorKey::Read).unwrap().as_deref(), Some("999"));
    }

    #[test]
    fn instant_encoding_matches_unix_seconds() {
        let t = DateTime::from_timestamp(1_718_000_000, 250_000_000).unwrap();
        assert_eq!(encode_instant(t), "1718000000.250000");
        assert_eq!(decode_instant("1718000000.250000"), Some(t));
    }

    #[test]
    fn decode_accepts_python_style_floats() {
        let t = decode_instant("1718000000.5").unwrap();
        assert_eq!(t.timestamp(), 1_718_000_000);
        assert_eq!(t.timestamp_subsec_millis(), 500);
        assert_eq!(decode_instant("1718000000").unwrap().timestamp(), 1_718_000_000);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert_eq!(decode_instant("yesterday"), None);
        assert_eq!(decode_instant("NaN"), None);
    }
}
