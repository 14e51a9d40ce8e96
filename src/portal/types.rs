use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw invoice record as listed by the portal backend.
///
/// `created_at` stays a string until grouping; the portal has emitted
/// more than one timestamp shape over time.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InvoiceRecord {
    pub id: i64,
    #[serde(rename = "generationCode")]
    pub generation_code: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// Downloadable artifact renderings of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    Pdf,
    Json,
}

impl ArtifactFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactFormat::Pdf => "pdf",
            ArtifactFormat::Json => "json",
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
