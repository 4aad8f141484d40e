use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::EnrichmentData;

/// Cache key for a canonical movie name. Hashed so arbitrary names stay
/// filesystem- and JSON-safe.
pub fn cache_key(canonical_name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_name.as_bytes());
    hex::encode(hasher.finalize())
}

/// File-backed store of already-fetched movie metadata. Within a run it is
/// authoritative: a key present here is never queried again.
pub struct EnrichmentCache {
    path: PathBuf,
    entries: HashMap<String, EnrichmentData>,
    pending: usize,
    save_interval: usize,
}

impl EnrichmentCache {
    /// Opens the cache at `path`. A missing file starts the cache empty; an
    /// unreadable or corrupt one does too, after a warning, and its entries
    /// get refetched.
    pub fn open<P: AsRef<Path>>(path: P, save_interval: usize) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(body) => match serde_json::from_str(&body) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(
                        "Cache file '{}' is corrupt ({}), starting empty",
                        path.display(),
                        err
                    );
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        debug!(
            "Opened enrichment cache '{}' with {} entries",
            path.display(),
            entries.len()
        );
        Self {
            path,
            entries,
            pending: 0,
            save_interval,
        }
    }

    pub fn get(&self, key: &str) -> Option<&EnrichmentData> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, data: EnrichmentData) {
        self.entries.insert(key, data);
        self.pending += 1;
    }

    /// Persists when enough new entries accumulated since the last save. A
    /// failed mid-run save is logged and retried at the next interval.
    pub fn maybe_save(&mut self) {
        if self.save_interval > 0 && self.pending >= self.save_interval {
            if let Err(err) = self.save() {
                warn!("Mid-run cache save failed: {}", err);
            }
        }
    }

    pub fn save(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let body = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, body)?;
        self.pending = 0;
        debug!(
            "Saved enrichment cache '{}' with {} entries",
            self.path.display(),
            self.entries.len()
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
