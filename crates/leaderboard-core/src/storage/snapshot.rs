use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::record::ScoreRecord;

/// Default snapshot file name
pub const SCORES_FILE: &str = "scores.json";

/// The on-disk snapshot of every stored score
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the snapshot, reporting why it could not be loaded.
    ///
    /// Entries that do not parse as a record are skipped with a warning so a
    /// single bad entry cannot drop the rest of the file.
    pub fn try_load(&self) -> Result<Vec<ScoreRecord>> {
        let content = fs::read_to_string(&self.path)?;
        let entries: Vec<serde_json::Value> = serde_json::from_str(&content)?;

        let records = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(
                        "Skipping unreadable score #{} in {}: {}",
                        index,
                        self.path.display(),
                        e
                    );
                    None
                }
            })
            .collect();
        Ok(records)
    }

    /// Where an unreadable snapshot is copied before it can be overwritten
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| SCORES_FILE.into());
        name.push(".corrupt");
        self.path.with_file_name(name)
    }

    /// Load the snapshot, starting empty when it is missing or unreadable
    pub fn load(&self) -> Vec<ScoreRecord> {
        match self.try_load() {
            Ok(records) => {
                debug!(
                    "Loaded {} scores from {}",
                    records.len(),
                    self.path.display()
                );
                records
            }
            Err(e) if e.is_not_found() => {
                debug!(
                    "No existing scores file at {}, starting fresh",
                    self.path.display()
                );
                Vec::new()
            }
            Err(e) => {
                warn!(
                    "Failed to load scores from {}: {}, starting fresh",
                    self.path.display(),
                    e
                );
                let backup = self.backup_path();
                match fs::copy(&self.path, &backup) {
                    Ok(_) => info!("Kept unreadable scores file as {}", backup.display()),
                    Err(e) => error!("Failed to back up {}: {}", self.path.display(), e),
                }
                Vec::new()
            }
        }
    }

    /// Replace the snapshot with `records`
    pub fn try_save(&self, records: &[ScoreRecord]) -> Result<()> {
        let content = serde_json::to_string_pretty(records)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| SCORES_FILE.to_string());
        let temp_path = dir.join(format!(".{}.tmp.{}", file_name, std::process::id()));

        let written = write_synced(&temp_path, content.as_bytes())
            .and_then(|()| fs::rename(&temp_path, &self.path));
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        debug!("Saved {} scores to {}", records.len(), self.path.display());
        Ok(())
    }

    /// Replace the snapshot, logging instead of failing.
    ///
    /// Returns whether the write succeeded.
    pub fn save(&self, records: &[ScoreRecord]) -> bool {
        match self.try_save(records) {
            Ok(()) => true,
            Err(e) => {
                error!("Error saving scores to {}: {}", self.path.display(), e);
                false
            }
        }
    }
}

impl Default for SnapshotFile {
    fn default() -> Self {
        Self::new(SCORES_FILE)
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
