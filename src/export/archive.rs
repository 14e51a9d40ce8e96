use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;

/// In-memory zip builder for the multi-file export path.
///
/// Entries are added one at a time from the single task that collects
/// settled downloads; entry paths never collide because each is derived
/// from its own file's year, month and name.
pub struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    pub fn add_bytes(&mut self, path: &str, bytes: &[u8]) -> Result<()> {
        self.writer.start_file(path, entry_options())?;
        self.writer.write_all(bytes)?;
        Ok(())
    }

    /// Text note recording why one artifact is missing from the archive.
    pub fn add_error_note(&mut self, path: &str, reason: &str) -> Result<()> {
        self.writer.start_file(path, entry_options())?;
        self.writer.write_all(reason.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Finalize into the zip bytes. Failure here aborts the whole export.
    pub fn finish(self) -> Result<Vec<u8>> {
        Ok(self.writer.finish()?.into_inner())
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}
