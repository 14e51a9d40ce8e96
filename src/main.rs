mod catalog;
mod config;
mod error;
mod export;
mod portal;

use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tabled::{settings::Style, Table, Tabled};

use crate::catalog::{group_portfolio, ClientGroup, DocumentBrowser, FilterCriteria, NodeLevel};
use crate::config::{
    config_dir, load_accounts, load_config, resolve_output_dir, Account, ACCOUNTS_TEMPLATE,
    CONFIG_TEMPLATE,
};
use crate::error::{DteError, Result};
use crate::export::{export_selected, DirectorySink, ExportFormat, ExportMode, ExportOptions};
use crate::portal::PortalClient;

#[derive(Parser)]
#[command(name = "dte")]
#[command(version, about = "Browse, filter and bulk-export DTE tax documents", long_about = None)]
struct Cli {
    /// Path to config directory (default: ~/.dte or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with template files
    Init,

    /// Show portal configuration and linked accounts
    Status,

    /// List documents visible under the given filters
    List {
        /// Case-insensitive match against client or document names
        #[arg(short, long)]
        search: Option<String>,

        /// Keep documents dated on or after this day (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Keep documents dated on or before this day (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Restrict the listing to one linked account
        #[arg(short, long)]
        account: Option<String>,

        /// Print the visible tree as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Download selected documents (zip archive when more than one)
    Export {
        /// Case-insensitive match against client or document names
        #[arg(short, long)]
        search: Option<String>,

        /// Keep documents dated on or after this day (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Keep documents dated on or before this day (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Select every document visible under the filters
        #[arg(long)]
        all: bool,

        /// Select one document by id (repeatable)
        #[arg(long, value_name = "ID")]
        id: Vec<String>,

        /// Select every visible document of a client (repeatable)
        #[arg(long, value_name = "CLIENT")]
        client: Vec<String>,

        /// Select a client's year, as CLIENT/YEAR (repeatable)
        #[arg(long, value_name = "CLIENT/YEAR")]
        year: Vec<String>,

        /// Select a client's month, as CLIENT/YEAR-MONTH (repeatable)
        #[arg(long, value_name = "CLIENT/YEAR-MONTH")]
        month: Vec<String>,

        /// Artifact formats to download
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Pdf)]
        format: ExportFormat,

        /// Custom output directory (default: export.output_dir from config.toml)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Status => cmd_status(&cfg_dir),
        Commands::List {
            search,
            from,
            to,
            account,
            json,
        } => cmd_list(&cfg_dir, search, from, to, account, json).await,
        Commands::Export {
            search,
            from,
            to,
            all,
            id,
            client,
            year,
            month,
            format,
            output,
        } => {
            let selection = SelectionFlags {
                all,
                ids: id,
                clients: client,
                years: year,
                months: month,
            };
            cmd_export(&cfg_dir, search, from, to, selection, format, output).await
        }
    }
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &PathBuf) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(DteError::AlreadyInitialized(cfg_dir.clone()));
    }

    // Create directories
    fs::create_dir_all(cfg_dir)?;
    fs::create_dir_all(cfg_dir.join("output"))?;

    // Write template files
    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;
    fs::write(cfg_dir.join("accounts.toml"), ACCOUNTS_TEMPLATE)?;

    println!("Initialized dte config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Set the portal URL and token:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!(
        "  2. Link your accounts:            $EDITOR {}/accounts.toml",
        cfg_dir.display()
    );
    println!();
    println!("Then browse your documents:");
    println!("  dte list");

    Ok(())
}

/// Show portal configuration and linked accounts
fn cmd_status(cfg_dir: &PathBuf) -> Result<()> {
    if !cfg_dir.exists() {
        return Err(DteError::ConfigNotFound(cfg_dir.clone()));
    }

    let config = load_config(cfg_dir)?;
    let accounts = load_accounts(cfg_dir)?;
    let output_dir = resolve_output_dir(&config.export.output_dir, cfg_dir);

    println!("DTE Portal Status");
    println!("{}", "-".repeat(50));
    println!("Config directory: {}", cfg_dir.display());
    println!("Portal:           {}", config.portal.base_url);
    println!(
        "API token:        {}",
        if config.portal.api_token.is_some() {
            "configured"
        } else {
            "not set"
        }
    );
    println!("Accounts:         {}", accounts.len());
    println!("Output directory: {}", output_dir.display());

    if !accounts.is_empty() {
        println!();
        println!("Linked accounts:");
        let mut sorted: Vec<_> = accounts.iter().collect();
        sorted.sort_by_key(|(k, _)| *k);
        for (id, account) in sorted {
            println!("  {} - {}", id, account.name);
        }
    }

    Ok(())
}

// Table row struct for tabled
#[derive(Tabled)]
struct DocumentRow {
    #[tabled(rename = "CLIENT")]
    client: String,
    #[tabled(rename = "YEAR")]
    year: i32,
    #[tabled(rename = "MONTH")]
    month: String,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "DOCUMENT")]
    document: String,
    #[tabled(rename = "ID")]
    id: String,
}

/// List documents surviving the current filters
async fn cmd_list(
    cfg_dir: &PathBuf,
    search: Option<String>,
    from: Option<String>,
    to: Option<String>,
    account: Option<String>,
    json: bool,
) -> Result<()> {
    if !cfg_dir.exists() {
        return Err(DteError::ConfigNotFound(cfg_dir.clone()));
    }

    let criteria = build_criteria(search, from, to)?;
    let config = load_config(cfg_dir)?;
    let accounts = load_accounts(cfg_dir)?;
    let portal = PortalClient::new(&config.portal)?;

    let groups = fetch_catalog(&portal, &accounts, account.as_deref()).await?;
    let mut browser = DocumentBrowser::new(groups);
    browser.set_criteria(criteria);

    let visible = browser.visible();
    let total = catalog::flatten_files(browser.master()).len();

    if json {
        let payload = serde_json::to_string_pretty(&visible)
            .map_err(|e| DteError::JsonOutput(e.to_string()))?;
        println!("{payload}");
        return Ok(());
    }

    if visible.is_empty() {
        if total == 0 {
            println!("No documents found for the linked accounts.");
        } else {
            println!("No documents match the current filters.");
        }
        return Ok(());
    }

    let rows = document_rows(&visible);
    let shown = rows.len();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    println!();
    println!("Total: {} of {} documents", shown, total);
    println!("Select with 'dte export --id <ID>' or --client/--year/--month (e.g. --month acme/2025-8)");

    Ok(())
}

fn document_rows(tree: &[ClientGroup]) -> Vec<DocumentRow> {
    let mut rows = Vec::new();
    for client in tree {
        for year in &client.years {
            for month in &year.months {
                for file in &month.files {
                    rows.push(DocumentRow {
                        client: client.id.clone(),
                        year: year.year,
                        month: month.month_name.clone(),
                        date: file.date.clone(),
                        document: file.name.clone(),
                        id: file.id.clone(),
                    });
                }
            }
        }
    }
    rows
}

struct SelectionFlags {
    all: bool,
    ids: Vec<String>,
    clients: Vec<String>,
    years: Vec<String>,
    months: Vec<String>,
}

impl SelectionFlags {
    fn is_empty(&self) -> bool {
        !self.all
            && self.ids.is_empty()
            && self.clients.is_empty()
            && self.years.is_empty()
            && self.months.is_empty()
    }
}

/// Download the selected documents
async fn cmd_export(
    cfg_dir: &PathBuf,
    search: Option<String>,
    from: Option<String>,
    to: Option<String>,
    selection: SelectionFlags,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    if !cfg_dir.exists() {
        return Err(DteError::ConfigNotFound(cfg_dir.clone()));
    }

    let criteria = build_criteria(search, from, to)?;

    // Reject an empty selection before touching the network
    if selection.is_empty() {
        return Err(DteError::EmptySelection);
    }

    let config = load_config(cfg_dir)?;
    let accounts = load_accounts(cfg_dir)?;
    let portal = PortalClient::new(&config.portal)?;

    let groups = fetch_catalog(&portal, &accounts, None).await?;
    let mut browser = DocumentBrowser::new(groups);
    browser.set_criteria(criteria);

    apply_selection(&mut browser, &selection)?;

    let files = browser.selected_files();
    if files.is_empty() {
        return Err(DteError::EmptySelection);
    }

    let output_dir = match output {
        Some(dir) => dir,
        None => resolve_output_dir(&config.export.output_dir, cfg_dir),
    };
    let sink = DirectorySink::new(output_dir);
    let options = ExportOptions {
        root_folder: config.export.root_folder.clone(),
        concurrent_downloads: config.export.concurrent_downloads,
    };

    let outcome = export_selected(&portal, &sink, &files, format, &options).await?;

    match outcome.mode {
        ExportMode::Direct => {
            println!("Downloaded {}", files[0].name);
        }
        ExportMode::Archive => {
            println!(
                "Exported {} of {} documents",
                outcome.succeeded, outcome.attempted
            );
        }
    }
    for path in &outcome.saved {
        println!("  Saved: {}", path.display());
    }
    if !outcome.failed.is_empty() {
        println!("  Failed: {} artifact(s)", outcome.failed.len());
        for failure in &outcome.failed {
            println!(
                "    {}.{}: {}",
                failure.file,
                failure.format.extension(),
                failure.reason
            );
        }
        if outcome.mode == ExportMode::Archive {
            println!("  Error notes are inside the archive under errors/");
        }
    }

    Ok(())
}

/// Drive the selection state from the CLI flags, validating every
/// reference against the currently visible tree.
fn apply_selection(browser: &mut DocumentBrowser, selection: &SelectionFlags) -> Result<()> {
    if selection.all {
        browser.toggle_select_all();
    }

    for client in &selection.clients {
        if browser.node_file_ids(client, NodeLevel::Client).is_empty() {
            return Err(DteError::NodeNotFound(client.clone()));
        }
        browser.toggle_node(client, NodeLevel::Client);
    }

    for year in &selection.years {
        let node_id = year_node_id(year)?;
        if browser.node_file_ids(&node_id, NodeLevel::Year).is_empty() {
            return Err(DteError::NodeNotFound(year.clone()));
        }
        browser.toggle_node(&node_id, NodeLevel::Year);
    }

    for month in &selection.months {
        let node_id = month_node_id(month)?;
        if browser.node_file_ids(&node_id, NodeLevel::Month).is_empty() {
            return Err(DteError::NodeNotFound(month.clone()));
        }
        browser.toggle_node(&node_id, NodeLevel::Month);
    }

    if !selection.ids.is_empty() {
        let visible = browser.visible_file_ids();
        for id in &selection.ids {
            if !visible.contains(id) {
                return Err(DteError::DocumentNotFound(id.clone()));
            }
            browser.toggle_file(id);
        }
    }

    Ok(())
}

/// "acme/2025" -> year node id (same shape, validated)
fn year_node_id(flag: &str) -> Result<String> {
    if let Some((client, year)) = flag.split_once('/') {
        if !client.is_empty() && year.parse::<i32>().is_ok() {
            return Ok(flag.to_string());
        }
    }
    Err(DteError::InvalidNodeRef(flag.to_string()))
}

/// "acme/2025-8" (calendar month) -> "acme/2025-7" (0-based month id)
fn month_node_id(flag: &str) -> Result<String> {
    let Some((client, rest)) = flag.split_once('/') else {
        return Err(DteError::InvalidNodeRef(flag.to_string()));
    };
    let Some((year, month)) = rest.rsplit_once('-') else {
        return Err(DteError::InvalidNodeRef(flag.to_string()));
    };
    let (Ok(year), Ok(month)) = (year.parse::<i32>(), month.parse::<u32>()) else {
        return Err(DteError::InvalidNodeRef(flag.to_string()));
    };
    if client.is_empty() || !(1..=12).contains(&month) {
        return Err(DteError::InvalidNodeRef(flag.to_string()));
    }
    Ok(format!("{client}/{year}-{}", month - 1))
}

fn build_criteria(
    search: Option<String>,
    from: Option<String>,
    to: Option<String>,
) -> Result<FilterCriteria> {
    Ok(FilterCriteria::new(
        search.unwrap_or_default(),
        validate_date("--from", from)?,
        validate_date("--to", to)?,
    ))
}

fn validate_date(field: &'static str, value: Option<String>) -> Result<String> {
    match value {
        Some(s) => {
            chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| DteError::InvalidDate {
                field,
                value: s.clone(),
            })?;
            Ok(s)
        }
        None => Ok(String::new()),
    }
}

/// Fetch every account's listing and group it into the catalog tree
async fn fetch_catalog(
    portal: &PortalClient,
    accounts: &HashMap<String, Account>,
    only: Option<&str>,
) -> Result<Vec<ClientGroup>> {
    if accounts.is_empty() {
        return Err(DteError::NoAccounts);
    }
    if let Some(key) = only {
        if !accounts.contains_key(key) {
            return Err(DteError::AccountNotFound(key.to_string()));
        }
    }

    let mut sorted: Vec<_> = accounts.iter().collect();
    sorted.sort_by_key(|(k, _)| *k);

    let mut entries = Vec::new();
    for (id, account) in sorted {
        if let Some(key) = only {
            if id != key {
                continue;
            }
        }
        let records = portal.list_documents(id).await?;
        entries.push((id.clone(), account.name.clone(), records));
    }

    Ok(group_portfolio(entries))
}
