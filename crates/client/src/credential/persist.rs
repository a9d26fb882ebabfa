// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable token entries: load/save to JSON file with atomic writes.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Persisted entries for one session, keyed by entry name.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PersistedEntries {
    pub entries: HashMap<String, PersistedEntry>,
}

/// A single named, path-scoped, time-limited entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedEntry {
    pub value: String,
    /// Expiry as epoch seconds.
    pub expires_at: u64,
    /// Path scope the entry applies to.
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_path() -> String {
    "/".to_owned()
}

/// Load persisted entries from a JSON file.
pub fn load(path: &Path) -> anyhow::Result<PersistedEntries> {
    let contents = std::fs::read_to_string(path)?;
    let entries: PersistedEntries = serde_json::from_str(&contents)?;
    Ok(entries)
}

/// Save entries to a JSON file atomically (write tmp + rename).
///
/// Uses a unique temp filename (PID + counter) to avoid corruption when
/// concurrent saves race on the same `.tmp` file — a shorter write can leave
/// trailing bytes from a longer previous write.
pub fn save(path: &Path, entries: &PersistedEntries) -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    if let Some(dir) = path.parent() {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }
    }

    let json = serde_json::to_string_pretty(entries)?;
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(
        "{}.{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
        seq,
    );
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
