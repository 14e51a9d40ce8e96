use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub portal: PortalSettings,
    pub export: ExportSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PortalSettings {
    pub base_url: String,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExportSettings {
    pub output_dir: String,
    #[serde(default = "default_root_folder")]
    pub root_folder: String,
    #[serde(default = "default_concurrent_downloads")]
    pub concurrent_downloads: usize,
}

fn default_page_size() -> u32 {
    100
}

fn default_root_folder() -> String {
    "dte-export".to_string()
}

fn default_concurrent_downloads() -> usize {
    8
}
