use serde::{Deserialize, Serialize};

/// A linked portal account. The table key in accounts.toml is the client
/// identifier used in list output and selection flags.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Account {
    pub name: String,
    #[serde(default)]
    pub tax_id: Option<String>,
}
