//! vaultflat CLI — flatten a Markdown export into a single vault folder.
//!
//! Strips export frontmatter, turns file links into wikilinks, adds parent
//! breadcrumbs, and copies attachments alongside.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
