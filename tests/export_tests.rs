use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;

use async_trait::async_trait;
use tempfile::TempDir;

use dte::{
    export_selected, ArtifactFetcher, ArtifactFormat, DirectorySink, DteError, DteFile,
    ExportFormat, ExportMode, ExportOptions,
};

/// In-memory stand-in for the portal: deterministic bytes per artifact,
/// with a configurable set of document ids that always fail.
struct MockFetcher {
    fail_ids: BTreeSet<i64>,
}

impl MockFetcher {
    fn reliable() -> Self {
        Self {
            fail_ids: BTreeSet::new(),
        }
    }

    fn failing(ids: &[i64]) -> Self {
        Self {
            fail_ids: ids.iter().copied().collect(),
        }
    }
}

#[async_trait]
impl ArtifactFetcher for MockFetcher {
    async fn fetch(&self, raw_id: i64, format: ArtifactFormat) -> dte::Result<Vec<u8>> {
        if self.fail_ids.contains(&raw_id) {
            return Err(DteError::PortalStatus {
                url: format!("mock://documents/{raw_id}"),
                status: 500,
            });
        }
        Ok(format!("artifact-{raw_id}-{format}").into_bytes())
    }
}

fn dte_file(id: i64, date: &str) -> DteFile {
    DteFile {
        id: id.to_string(),
        raw_id: id,
        name: format!("DTE-DOC{id}"),
        date: date.to_string(),
        size: "N/A".to_string(),
    }
}

fn options() -> ExportOptions {
    ExportOptions {
        root_folder: "dte-export".to_string(),
        concurrent_downloads: 4,
    }
}

fn read_archive_entry(path: &std::path::Path, name: &str) -> String {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    content
}

#[tokio::test]
async fn empty_selection_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let sink = DirectorySink::new(temp_dir.path());

    let result = export_selected(
        &MockFetcher::reliable(),
        &sink,
        &[],
        ExportFormat::Pdf,
        &options(),
    )
    .await;
    assert!(matches!(result, Err(DteError::EmptySelection)));
}

#[tokio::test]
async fn single_file_takes_the_direct_path() {
    let temp_dir = TempDir::new().unwrap();
    let sink = DirectorySink::new(temp_dir.path());
    let files = vec![dte_file(1, "20/08/2025")];

    let outcome = export_selected(
        &MockFetcher::reliable(),
        &sink,
        &files,
        ExportFormat::Both,
        &options(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.mode, ExportMode::Direct);
    assert_eq!(outcome.attempted, 1);
    assert_eq!(outcome.succeeded, 1);
    assert!(outcome.failed.is_empty());
    assert_eq!(outcome.saved.len(), 2);

    let pdf = std::fs::read(temp_dir.path().join("DTE-DOC1.pdf")).unwrap();
    assert_eq!(pdf, b"artifact-1-pdf");
    let json = std::fs::read(temp_dir.path().join("DTE-DOC1.json")).unwrap();
    assert_eq!(json, b"artifact-1-json");
}

#[tokio::test]
async fn multiple_files_are_packaged_into_a_nested_archive() {
    let temp_dir = TempDir::new().unwrap();
    let sink = DirectorySink::new(temp_dir.path());
    let files = vec![
        dte_file(1, "20/08/2025"),
        dte_file(2, "22/08/2025"),
        dte_file(3, "05/03/2025"),
        dte_file(4, "31/12/2024"),
    ];

    let outcome = export_selected(
        &MockFetcher::reliable(),
        &sink,
        &files,
        ExportFormat::Pdf,
        &options(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.mode, ExportMode::Archive);
    assert_eq!(outcome.succeeded, 4);
    assert!(outcome.failed.is_empty());
    assert_eq!(outcome.saved.len(), 1);

    // Folder layout comes from each file's own date
    let archive = &outcome.saved[0];
    assert_eq!(
        read_archive_entry(archive, "dte-export/2025/Agosto/DTE-DOC1.pdf"),
        "artifact-1-pdf"
    );
    assert_eq!(
        read_archive_entry(archive, "dte-export/2025/Agosto/DTE-DOC2.pdf"),
        "artifact-2-pdf"
    );
    assert_eq!(
        read_archive_entry(archive, "dte-export/2025/Marzo/DTE-DOC3.pdf"),
        "artifact-3-pdf"
    );
    assert_eq!(
        read_archive_entry(archive, "dte-export/2024/Diciembre/DTE-DOC4.pdf"),
        "artifact-4-pdf"
    );
}

#[tokio::test]
async fn one_failed_download_does_not_abort_the_batch() {
    let temp_dir = TempDir::new().unwrap();
    let sink = DirectorySink::new(temp_dir.path());
    let files: Vec<DteFile> = (1..=5).map(|id| dte_file(id, "20/08/2025")).collect();

    let outcome = export_selected(
        &MockFetcher::failing(&[3]),
        &sink,
        &files,
        ExportFormat::Pdf,
        &options(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.mode, ExportMode::Archive);
    assert_eq!(outcome.attempted, 5);
    assert_eq!(outcome.succeeded, 4);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].file, "DTE-DOC3");
    assert!(outcome.is_partial());

    // Archive exists with the four good artifacts plus an error note
    let archive = &outcome.saved[0];
    for id in [1, 2, 4, 5] {
        assert_eq!(
            read_archive_entry(archive, &format!("dte-export/2025/Agosto/DTE-DOC{id}.pdf")),
            format!("artifact-{id}-pdf")
        );
    }
    let note = read_archive_entry(archive, "dte-export/errors/DTE-DOC3.pdf.txt");
    assert!(note.contains("HTTP 500"));
}

#[tokio::test]
async fn both_formats_fetch_two_artifacts_per_file() {
    let temp_dir = TempDir::new().unwrap();
    let sink = DirectorySink::new(temp_dir.path());
    let files = vec![dte_file(1, "20/08/2025"), dte_file(2, "22/08/2025")];

    let outcome = export_selected(
        &MockFetcher::reliable(),
        &sink,
        &files,
        ExportFormat::Both,
        &options(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.succeeded, 2);
    let archive = &outcome.saved[0];
    for id in [1, 2] {
        for ext in ["pdf", "json"] {
            assert_eq!(
                read_archive_entry(
                    archive,
                    &format!("dte-export/2025/Agosto/DTE-DOC{id}.{ext}")
                ),
                format!("artifact-{id}-{ext}")
            );
        }
    }
}

#[tokio::test]
async fn a_failed_format_marks_the_document_failed_once() {
    let temp_dir = TempDir::new().unwrap();
    let sink = DirectorySink::new(temp_dir.path());
    let files = vec![dte_file(1, "20/08/2025"), dte_file(2, "22/08/2025")];

    let outcome = export_selected(
        &MockFetcher::failing(&[2]),
        &sink,
        &files,
        ExportFormat::Both,
        &options(),
    )
    .await
    .unwrap();

    // Document 2 failed both formats, but counts as one failed document
    assert_eq!(outcome.attempted, 2);
    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.failed.len(), 2);

    let archive = &outcome.saved[0];
    let pdf_note = read_archive_entry(archive, "dte-export/errors/DTE-DOC2.pdf.txt");
    assert!(pdf_note.contains("HTTP 500"));
    let json_note = read_archive_entry(archive, "dte-export/errors/DTE-DOC2.json.txt");
    assert!(json_note.contains("HTTP 500"));
}
