//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use vaultflat_core::ProgressReporter;
use vaultflat_shared::{AppConfig, FlattenOptions, FlattenSummary, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// vaultflat — flatten a Markdown export into one vault folder.
#[derive(Parser)]
#[command(
    name = "vaultflat",
    version,
    about = "Flatten and convert a Markdown notes export into a single wikilink-friendly folder.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Convert an export tree into a flat output folder.
    Flatten {
        /// Root of the exported files.
        export_root: PathBuf,

        /// Folder the flattened notes are written to (created if missing).
        output_dir: PathBuf,

        /// Don't copy non-markdown assets (images, attachments).
        #[arg(long)]
        no_assets: bool,

        /// Subfolder name inside the output folder for copied assets.
        #[arg(long)]
        assets_dir: Option<String>,

        /// Don't prepend parent-folder breadcrumbs.
        #[arg(long)]
        no_breadcrumbs: bool,

        /// Print the run summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "vaultflat=info",
        1 => "vaultflat=debug",
        _ => "vaultflat=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    // stdout carries the summary (and --json output)
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Flatten {
            export_root,
            output_dir,
            no_assets,
            assets_dir,
            no_breadcrumbs,
            json,
        } => {
            let config = load_config()?;
            let options = flatten_options(&config, no_assets, assets_dir, no_breadcrumbs);
            cmd_flatten(&export_root, &output_dir, &options, json)
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

/// Merge CLI flags over the loaded config.
fn flatten_options(
    config: &AppConfig,
    no_assets: bool,
    assets_dir: Option<String>,
    no_breadcrumbs: bool,
) -> FlattenOptions {
    let mut options = FlattenOptions::from(config);
    if no_assets {
        options.copy_assets = false;
    }
    if let Some(dir) = assets_dir {
        options.assets_dir = dir;
    }
    if no_breadcrumbs {
        options.breadcrumbs = false;
    }
    options
}

fn cmd_flatten(
    export_root: &Path,
    output_dir: &Path,
    options: &FlattenOptions,
    json: bool,
) -> Result<()> {
    if !export_root.is_dir() {
        return Err(eyre!(
            "export folder '{}' does not exist or is not a directory",
            export_root.display()
        ));
    }

    info!(
        export_root = %export_root.display(),
        output_dir = %output_dir.display(),
        copy_assets = options.copy_assets,
        "flattening export"
    );

    let reporter = CliProgress::new();
    let summary = vaultflat_core::flatten(export_root, output_dir, options, &reporter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}

fn print_summary(summary: &FlattenSummary) {
    println!();
    println!("  Finished.");
    println!("  Markdown files converted: {}", summary.markdown_converted);
    if let Some(assets_root) = &summary.assets_root {
        println!(
            "  Assets copied into:       {} ({} files)",
            assets_root.display(),
            summary.assets_copied
        );
    }
    if !summary.failures.is_empty() {
        println!("  Skipped:                  {}", summary.skipped());
        for failure in &summary.failures {
            println!(
                "    - {} ({}: {})",
                failure.path.display(),
                failure.kind,
                failure.reason
            );
        }
    }
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn markdown_converted(&self, relative_path: &Path, count: usize) {
        self.spinner.set_message(format!(
            "Converted [{count}] {}",
            relative_path.display()
        ));
    }

    fn asset_copied(&self, relative_path: &Path, count: usize) {
        self.spinner.set_message(format!(
            "Copied asset [{count}] {}",
            relative_path.display()
        ));
    }

    fn file_skipped(&self, path: &Path, reason: &str) {
        self.spinner
            .println(format!("  skipped {}: {reason}", path.display()));
    }

    fn done(&self, _summary: &FlattenSummary) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
