mod archive;
mod sink;

pub use archive::ArchiveBuilder;
pub use sink::{DirectorySink, DownloadSink};

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use chrono::{Datelike, Local, NaiveDate};
use clap::ValueEnum;
use futures::{stream, StreamExt};
use tracing::warn;

use crate::catalog::{month_name, DteFile};
use crate::error::{DteError, Result};
use crate::portal::{ArtifactFetcher, ArtifactFormat};

/// What the user asked to download for each selected document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Pdf,
    Json,
    Both,
}

impl ExportFormat {
    pub fn artifact_formats(self) -> &'static [ArtifactFormat] {
        match self {
            ExportFormat::Pdf => &[ArtifactFormat::Pdf],
            ExportFormat::Json => &[ArtifactFormat::Json],
            ExportFormat::Both => &[ArtifactFormat::Pdf, ArtifactFormat::Json],
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Json => "json",
            ExportFormat::Both => "both",
        };
        f.write_str(s)
    }
}

/// Which delivery path an export took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// Single document: artifacts saved directly, no archive.
    Direct,
    /// Several documents packaged into one nested zip.
    Archive,
}

/// One artifact that could not be downloaded. Recorded, never fatal.
#[derive(Debug, Clone)]
pub struct ExportFailure {
    pub file: String,
    pub format: ArtifactFormat,
    pub reason: String,
}

/// Outcome summary handed back to the caller. Counts are per document:
/// a document with any failed artifact counts as failed.
#[derive(Debug)]
pub struct ExportOutcome {
    pub mode: ExportMode,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: Vec<ExportFailure>,
    pub saved: Vec<PathBuf>,
}

impl ExportOutcome {
    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty() && self.succeeded > 0
    }
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Top-level folder inside the archive, also the archive name stem.
    pub root_folder: String,
    pub concurrent_downloads: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            root_folder: "dte-export".to_string(),
            concurrent_downloads: 8,
        }
    }
}

/// Download the given documents and deliver them through the sink.
///
/// One document takes the direct path: each requested format is fetched
/// in turn and saved under its own filename. Several documents take the
/// archive path: every (document, format) fetch is issued concurrently,
/// results are folded into the zip as they settle, and each failure
/// becomes a note under errors/ instead of aborting the batch. Only
/// archive finalization is fatal.
pub async fn export_selected<F, S>(
    fetcher: &F,
    sink: &S,
    files: &[DteFile],
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<ExportOutcome>
where
    F: ArtifactFetcher + Sync,
    S: DownloadSink + Sync,
{
    if files.is_empty() {
        return Err(DteError::EmptySelection);
    }

    let formats = format.artifact_formats();
    if files.len() == 1 {
        export_direct(fetcher, sink, &files[0], formats).await
    } else {
        export_archive(fetcher, sink, files, formats, options).await
    }
}

async fn export_direct<F, S>(
    fetcher: &F,
    sink: &S,
    file: &DteFile,
    formats: &[ArtifactFormat],
) -> Result<ExportOutcome>
where
    F: ArtifactFetcher + Sync,
    S: DownloadSink + Sync,
{
    let mut failed = Vec::new();
    let mut saved = Vec::new();

    for fmt in formats {
        match fetcher.fetch(file.raw_id, *fmt).await {
            Ok(bytes) => {
                let filename = format!("{}.{}", file.name, fmt.extension());
                saved.push(sink.save(&filename, &bytes)?);
            }
            Err(e) => {
                warn!(file = %file.name, format = %fmt, error = %e, "artifact download failed");
                failed.push(ExportFailure {
                    file: file.name.clone(),
                    format: *fmt,
                    reason: e.to_string(),
                });
            }
        }
    }

    let succeeded = usize::from(failed.is_empty());
    Ok(ExportOutcome {
        mode: ExportMode::Direct,
        attempted: 1,
        succeeded,
        failed,
        saved,
    })
}

async fn export_archive<F, S>(
    fetcher: &F,
    sink: &S,
    files: &[DteFile],
    formats: &[ArtifactFormat],
    options: &ExportOptions,
) -> Result<ExportOutcome>
where
    F: ArtifactFetcher + Sync,
    S: DownloadSink + Sync,
{
    let mut archive = ArchiveBuilder::new();
    let mut failed: Vec<ExportFailure> = Vec::new();
    let mut failed_ids: BTreeSet<i64> = BTreeSet::new();

    let tasks = files
        .iter()
        .flat_map(|file| formats.iter().map(move |fmt| (file, *fmt)));

    // All fetches are in flight together; the archive is only touched
    // from this task as each one settles.
    let mut results = stream::iter(tasks)
        .map(|(file, fmt)| async move { (file, fmt, fetcher.fetch(file.raw_id, fmt).await) })
        .buffer_unordered(options.concurrent_downloads.max(1));

    while let Some((file, fmt, result)) = results.next().await {
        match result {
            Ok(bytes) => match archive_slot(file) {
                Some((year, month)) => {
                    let path = format!(
                        "{}/{}/{}/{}.{}",
                        options.root_folder,
                        year,
                        month,
                        file.name,
                        fmt.extension()
                    );
                    archive.add_bytes(&path, &bytes)?;
                }
                None => {
                    failed.push(ExportFailure {
                        file: file.name.clone(),
                        format: fmt,
                        reason: format!("stored date '{}' is not dd/mm/yyyy", file.date),
                    });
                    failed_ids.insert(file.raw_id);
                }
            },
            Err(e) => {
                warn!(file = %file.name, format = %fmt, error = %e, "artifact download failed");
                failed.push(ExportFailure {
                    file: file.name.clone(),
                    format: fmt,
                    reason: e.to_string(),
                });
                failed_ids.insert(file.raw_id);
            }
        }
    }

    for failure in &failed {
        let path = format!(
            "{}/errors/{}.{}.txt",
            options.root_folder,
            failure.file,
            failure.format.extension()
        );
        archive.add_error_note(&path, &failure.reason)?;
    }

    let bytes = archive.finish()?;
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    let filename = format!("{}-{}.zip", options.root_folder, stamp);
    let path = sink.save(&filename, &bytes)?;

    Ok(ExportOutcome {
        mode: ExportMode::Archive,
        attempted: files.len(),
        succeeded: files.len() - failed_ids.len(),
        failed,
        saved: vec![path],
    })
}

/// Archive folder for a file, parsed from its own stored date so the
/// placement is independent of whatever grouping is currently visible.
fn archive_slot(file: &DteFile) -> Option<(i32, String)> {
    let date = NaiveDate::parse_from_str(&file.date, "%d/%m/%Y").ok()?;
    Some((date.year(), month_name(date.month0())))
}
