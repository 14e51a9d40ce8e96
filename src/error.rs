use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DteError {
    #[error("Config directory not found at {0}. Run 'dte init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Account '{0}' not found in accounts.toml")]
    AccountNotFound(String),

    #[error("No linked accounts. Add accounts to accounts.toml before listing documents.")]
    NoAccounts,

    #[error("Invalid {field} value '{value}'. Expected YYYY-MM-DD.")]
    InvalidDate { field: &'static str, value: String },

    #[error("Invalid node reference '{0}'. Expected CLIENT, CLIENT/YEAR or CLIENT/YEAR-MONTH.")]
    InvalidNodeRef(String),

    #[error("No documents selected. Use --all, --id, --client, --year or --month.")]
    EmptySelection,

    #[error("Document '{0}' is not in the current view. Use 'dte list' to see available ids.")]
    DocumentNotFound(String),

    #[error("Node '{0}' has no documents in the current view")]
    NodeNotFound(String),

    #[error("Portal request failed for {url}: {source}")]
    PortalRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Portal returned HTTP {status} for {url}")]
    PortalStatus { url: String, status: u16 },

    #[error("Failed to build export archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Failed to render JSON output: {0}")]
    JsonOutput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DteError>;
