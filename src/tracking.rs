//! Persisted upload tracking.
//!
//! This module handles:
//! - The tracked-file map keyed by resolved absolute path
//! - Streaming SHA-256 content hashing for cache invalidation
//! - Atomic-enough persistence (write temp sibling, rename over target)
//!
//! A file is only considered already-uploaded when its stored content hash
//! matches a freshly computed hash of the bytes on disk; a stale hash means
//! the file changed and must be re-uploaded.

use log::{error, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

const HASH_CHUNK_SIZE: usize = 4096;

/// Metadata recorded for one successfully uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedFile {
    pub name: String,
    pub uri: String,
    pub hash: String,
    pub upload_date: String,
    pub original_path: String,
    #[serde(default)]
    pub store_name: Option<String>,
}

/// In-memory tracked-file map with a persisted JSON form.
pub struct TrackingStore {
    path: PathBuf,
    entries: HashMap<String, TrackedFile>,
}

impl TrackingStore {
    /// Load the store from `path`. A missing file yields an empty store;
    /// malformed content is logged and also yields an empty store.
    pub fn load(path: PathBuf) -> Self {
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("failed to parse tracking file {:?}: {}. Starting fresh.", path, e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self { path, entries }
    }

    /// Persist the whole map. Writes a `.tmp` sibling first and renames it
    /// over the target, so a torn write never corrupts the previous state.
    pub fn save(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                error!("failed to create cache dir {:?}: {}", parent, e);
                return;
            }
        }
        let json = match serde_json::to_string_pretty(&self.entries) {
            Ok(json) => json,
            Err(e) => {
                error!("failed to serialize tracking data: {}", e);
                return;
            }
        };
        let tmp = self.path.with_extension("json.tmp");
        let result = std::fs::write(&tmp, json).and_then(|_| std::fs::rename(&tmp, &self.path));
        if let Err(e) = result {
            error!("failed to save tracking file {:?}: {}", self.path, e);
        }
    }

    /// Streaming SHA-256 of the file contents, as a 64-hex-char digest.
    /// Reads in fixed-size chunks so memory use is independent of file size.
    pub fn compute_file_hash(path: &Path) -> std::io::Result<String> {
        let mut file = File::open(path)?;
        let mut hasher = Sha256::new();
        let mut buf = [0u8; HASH_CHUNK_SIZE];
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// True iff an entry exists for the resolved path and its stored hash
    /// matches the current file content.
    pub fn is_tracked(&self, path: &Path) -> bool {
        let key = resolve_key(path);
        let Some(entry) = self.entries.get(&key) else {
            return false;
        };
        match Self::compute_file_hash(path) {
            Ok(hash) => entry.hash == hash,
            Err(_) => false,
        }
    }

    pub fn get(&self, path: &Path) -> Option<&TrackedFile> {
        self.entries.get(&resolve_key(path))
    }

    /// Record one complete entry and persist the whole map immediately.
    pub fn insert(&mut self, path: &Path, entry: TrackedFile) {
        self.entries.insert(resolve_key(path), entry);
        self.save();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &TrackedFile)> {
        self.entries.iter()
    }

    /// Empty the map and delete the persisted file.
    pub fn clear(&mut self) -> std::io::Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        self.entries.clear();
        Ok(())
    }
}

/// Resolve a path to its canonical absolute form, falling back to the input
/// when the file vanished between checks. Map keys always use the resolved
/// form, so different spellings of one path share an entry.
fn resolve_key(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn sample_entry(path: &str, hash: &str) -> TrackedFile {
        TrackedFile {
            name: "files/x".to_string(),
            uri: "uri://x".to_string(),
            hash: hash.to_string(),
            upload_date: "2024-01-01 00:00:00".to_string(),
            original_path: path.to_string(),
            store_name: None,
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let store = TrackingStore::load(dir.path().join("file_tracking.json"));
        assert!(store.is_empty());
    }

    #[test]
    fn malformed_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file_tracking.json");
        fs::write(&path, "{ not json").unwrap();
        let store = TrackingStore::load(path);
        assert!(store.is_empty());
    }

    #[test]
    fn save_load_round_trip_preserves_entries() {
        let dir = tempdir().unwrap();
        let tracking = dir.path().join("file_tracking.json");
        let pdf = dir.path().join("b.pdf");
        fs::write(&pdf, b"%PDF content").unwrap();

        let mut store = TrackingStore::load(tracking.clone());
        let hash = TrackingStore::compute_file_hash(&pdf).unwrap();
        store.insert(&pdf, sample_entry("/a/b.pdf", &hash));

        let reloaded = TrackingStore::load(tracking);
        assert_eq!(reloaded.len(), 1);
        let entry = reloaded.get(&pdf).unwrap();
        assert_eq!(entry.name, "files/x");
        assert_eq!(entry.uri, "uri://x");
        assert_eq!(entry.hash, hash);
        assert_eq!(entry.upload_date, "2024-01-01 00:00:00");
        assert_eq!(entry.original_path, "/a/b.pdf");
    }

    #[test]
    fn hash_is_64_hex_chars_and_content_addressed() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.pdf");
        let b = dir.path().join("b.pdf");
        fs::write(&a, b"same").unwrap();
        fs::write(&b, b"same").unwrap();

        let ha = TrackingStore::compute_file_hash(&a).unwrap();
        let hb = TrackingStore::compute_file_hash(&b).unwrap();
        assert_eq!(ha.len(), 64);
        assert!(ha.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(ha, hb);

        fs::write(&b, b"different").unwrap();
        assert_ne!(ha, TrackingStore::compute_file_hash(&b).unwrap());
    }

    #[test]
    fn is_tracked_requires_matching_hash() {
        let dir = tempdir().unwrap();
        let pdf = dir.path().join("doc.pdf");
        fs::write(&pdf, b"version one").unwrap();

        let mut store = TrackingStore::load(dir.path().join("file_tracking.json"));
        assert!(!store.is_tracked(&pdf));

        let hash = TrackingStore::compute_file_hash(&pdf).unwrap();
        store.insert(&pdf, sample_entry("doc.pdf", &hash));
        assert!(store.is_tracked(&pdf));

        // Content change invalidates the entry.
        fs::write(&pdf, b"version two").unwrap();
        assert!(!store.is_tracked(&pdf));
    }

    #[test]
    fn entries_are_keyed_by_canonical_path() {
        let dir = tempdir().unwrap();
        let pdf = dir.path().join("doc.pdf");
        fs::write(&pdf, b"content").unwrap();

        let mut store = TrackingStore::load(dir.path().join("file_tracking.json"));
        let hash = TrackingStore::compute_file_hash(&pdf).unwrap();
        store.insert(&pdf, sample_entry("doc.pdf", &hash));

        // A different spelling of the same path resolves to the same entry.
        let indirect = dir.path().join(".").join("doc.pdf");
        assert!(store.get(&indirect).is_some());
        assert!(store.is_tracked(&indirect));
    }

    #[test]
    fn clear_removes_entries_and_persisted_file() {
        let dir = tempdir().unwrap();
        let tracking = dir.path().join("file_tracking.json");
        let pdf = dir.path().join("doc.pdf");
        fs::write(&pdf, b"content").unwrap();

        let mut store = TrackingStore::load(tracking.clone());
        let hash = TrackingStore::compute_file_hash(&pdf).unwrap();
        store.insert(&pdf, sample_entry("doc.pdf", &hash));
        assert!(tracking.exists());

        store.clear().unwrap();
        assert!(store.is_empty());
        assert!(!tracking.exists());
        assert!(TrackingStore::load(tracking).is_empty());
    }
}
