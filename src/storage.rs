// src/storage.rs - Best-effort key/value persistence for session preferences.
//
// Stands in for the browser's localStorage: one JSON document per key in the
// data directory. Every failure is logged and swallowed; in-memory state stays
// authoritative when the disk is unavailable.
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PrefsStore {
    dir: PathBuf,
}

impl PrefsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Read the value stored under `key`. Missing keys are not an error;
    /// unreadable or unparsable files are logged and treated as missing.
    pub fn get(&self, key: &str) -> Option<Value> {
        let path = self.key_path(key);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!("failed to read stored key '{}': {}", key, err);
                return None;
            }
        };

        match serde_json::from_slice(&data) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("failed to parse stored key '{}': {}", key, err);
                None
            }
        }
    }

    /// Write `value` under `key`. Failures are logged, never propagated.
    pub fn set(&self, key: &str, value: &Value) {
        if let Err(err) = self.try_set(key, value) {
            tracing::warn!("failed to persist key '{}': {}", key, err);
        }
    }

    fn try_set(&self, key: &str, value: &Value) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let final_path = self.key_path(key);
        let tmp_path = self.dir.join(format!("{}.json.tmp", key));
        let bytes = serde_json::to_vec(value)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;

        fs::write(&tmp_path, bytes)?;
        rename_replacing(&tmp_path, &final_path)
    }
}

// fs::rename does not replace an existing file on every platform.
fn rename_replacing(tmp: &Path, target: &Path) -> io::Result<()> {
    match fs::rename(tmp, target) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if target.exists() {
                fs::remove_file(target)?;
                fs::rename(tmp, target)
            } else {
                Err(rename_err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_a_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = PrefsStore::new(dir.path());

        store.set("selectedProducts", &json!([1, 2, 3]));
        assert_eq!(store.get("selectedProducts"), Some(json!([1, 2, 3])));

        store.set("selectedProducts", &json!([4]));
        assert_eq!(store.get("selectedProducts"), Some(json!([4])));
    }

    #[test]
    fn missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = PrefsStore::new(dir.path());
        assert_eq!(store.get("dirOverride"), None);
    }

    #[test]
    fn corrupt_file_is_treated_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = PrefsStore::new(dir.path());
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(dir.path().join("dirOverride.json"), b"not json {").unwrap();
        assert_eq!(store.get("dirOverride"), None);
    }
}
