//! Run-to-run progress marker: the URL of the most recently discovered
//! event at the end of the last successful run.

use crate::error::*;
use std::fs;
use std::path::{Path, PathBuf};

pub const CHECKPOINT_FILE: &str = "last_scraped_event.txt";

pub trait CheckpointStore {
    /// Last checkpoint, or `None` on a first run (full backfill).
    fn load(&self) -> Result<Option<String>>;
    /// Overwrite the stored checkpoint. Called once, at run end.
    fn save(&self, url: &str) -> Result<()>;
    /// Forget progress; the next run backfills everything.
    fn clear(&self) -> Result<()>;
}

/// Single text file holding exactly one URL. Saves go through a temp file
/// and rename so a crash never leaves a half-written checkpoint.
pub struct FileCheckpoint {
    path: PathBuf,
}

impl FileCheckpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointStore for FileCheckpoint {
    fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                let text = text.trim().to_string();
                Ok(if text.is_empty() { None } else { Some(text) })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, url: &str) -> Result<()> {
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, url)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_file_means_full_backfill() {
        let dir = tempfile::tempdir().unwrap();
        let cp = FileCheckpoint::new(dir.path().join("last_scraped_event.txt"));
        assert_eq!(cp.load().unwrap(), None);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cp = FileCheckpoint::new(dir.path().join("last_scraped_event.txt"));
        cp.save("http://stats.test/event/9").unwrap();
        assert_eq!(
            cp.load().unwrap().as_deref(),
            Some("http://stats.test/event/9")
        );
        cp.save("http://stats.test/event/10").unwrap();
        assert_eq!(
            cp.load().unwrap().as_deref(),
            Some("http://stats.test/event/10")
        );
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cp = FileCheckpoint::new(dir.path().join("last_scraped_event.txt"));
        cp.save("http://stats.test/event/9").unwrap();
        cp.clear().unwrap();
        cp.clear().unwrap();
        assert_eq!(cp.load().unwrap(), None);
    }
}
