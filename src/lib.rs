pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod portal;

pub use catalog::{
    ClientGroup, DocumentBrowser, DteFile, FilterCriteria, MonthGroup, NodeLevel, SelectionState,
    YearGroup,
};
pub use error::{DteError, Result};
pub use export::{
    export_selected, DirectorySink, DownloadSink, ExportFormat, ExportMode, ExportOptions,
    ExportOutcome,
};
pub use portal::{ArtifactFetcher, ArtifactFormat, InvoiceRecord, PortalClient};
