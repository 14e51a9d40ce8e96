use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Final delivery of a finished download: given a filename and bytes,
/// persist them somewhere the user will find them. The CLI writes into
/// the configured output directory.
pub trait DownloadSink {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf>;
}

pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        fs::write(&path, bytes)?;
        Ok(path)
    }
}
