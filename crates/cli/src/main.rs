//! Port Entity Exporter CLI
//!
//! Extracts entities from Port and writes them to a JSON, YAML or CSV file.

mod logging;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, ValueEnum};
use port_export_client::config::{DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT_SECS};
use port_export_client::{Exporter, PortClient, PortConfig};
use port_export_core::{parse_list, ExportSelection};
use port_export_writer::{write_export, OutputFormat};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

/// Port Entity Exporter - extract entities from Port to a file
///
/// Examples:
///   port-exporter --all
///   port-exporter --blueprints service,deployment
///   port-exporter --entities service:checkout,prod-eu
///   port-exporter --all --exclude service-1,old-deployment
///   port-exporter --all --format yaml --output entities.yaml
#[derive(Parser)]
#[command(name = "port-exporter")]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("selection")
        .required(true)
        .args(["all", "blueprints", "entities"])
))]
struct Cli {
    /// Export all entities from all blueprints
    #[arg(long)]
    all: bool,

    /// Comma-separated list of blueprint identifiers to export
    #[arg(long)]
    blueprints: Option<String>,

    /// Comma-separated list of entities to export (blueprint:entity or just entity)
    #[arg(long)]
    entities: Option<String>,

    /// Comma-separated list of entity identifiers to exclude from export
    #[arg(long)]
    exclude: Option<String>,

    /// Output file name; the format extension is added when missing
    #[arg(short, long, default_value = "port_entities")]
    output: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = FormatArg::Json)]
    format: FormatArg,

    /// Include calculated properties (default)
    #[arg(long, overrides_with = "exclude_calculated")]
    include_calculated: bool,

    /// Leave calculated properties out of the export
    #[arg(long, overrides_with = "include_calculated")]
    exclude_calculated: bool,

    /// Port client ID
    #[arg(long, env = "PORT_CLIENT_ID", hide_env_values = true)]
    client_id: Option<String>,

    /// Port client secret
    #[arg(long, env = "PORT_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Port API base URL
    #[arg(long, env = "PORT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Timeout for each HTTP request, in seconds
    #[arg(long, env = "PORT_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Items requested per page on list endpoints
    #[arg(long, env = "PORT_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Log file (appended to)
    #[arg(long, default_value = "port_exporter.log")]
    log_file: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Json,
    Yaml,
    Csv,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Yaml => OutputFormat::Yaml,
            FormatArg::Csv => OutputFormat::Csv,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load environment variables from .env if present.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Held until exit so the log file is flushed
    let _log_guard = logging::init_logging(cli.verbose, &cli.log_file)?;

    run(cli)
        .await
        .inspect_err(|e| error!("Export failed: {e:#}"))
}

async fn run(cli: Cli) -> Result<()> {
    let selection = ExportSelection::from_flags(
        cli.all,
        cli.blueprints.as_deref(),
        cli.entities.as_deref(),
    )?
    .with_exclusions(cli.exclude.as_deref().map(parse_list).unwrap_or_default())?
    .with_calculated(cli.include_calculated || !cli.exclude_calculated);

    let config = PortConfig::new(
        cli.client_id.unwrap_or_default(),
        cli.client_secret.unwrap_or_default(),
    )
    .with_base_url(cli.base_url)
    .with_timeout(Duration::from_secs(cli.timeout))
    .with_page_size(cli.page_size);

    let mut client = PortClient::new(config).context("Invalid Port configuration")?;
    client
        .authenticate()
        .await
        .context("Authentication failed. Please check your credentials.")?;

    println!("Exporting {}...", selection.mode);
    if !selection.exclude.is_empty() {
        info!(
            "Excluding {} identifiers: {}",
            selection.exclude.len(),
            selection
                .exclude
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    let exporter = Exporter::new(client);
    let set = exporter
        .export(&selection)
        .await
        .context("Failed to fetch entities")?;

    let format = OutputFormat::from(cli.format);
    let path = write_export(&set, &cli.output, format)
        .with_context(|| format!("Failed to save entities to {}", cli.output.display()))?;

    println!("\n✓ Export complete:");
    println!("  • Entities exported: {}", set.total_entities());
    println!("  • Blueprints included: {}", set.blueprint_count());
    println!("  • Output file: {}", path.display());
    println!("  • Format: {}", format);

    Ok(())
}
