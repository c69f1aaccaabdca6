mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sync {
            file,
            icons,
            icon_dir,
        } => {
            commands::sync::handle(&file, icons, &icon_dir)?;
        }

        Commands::Details { file, gems } => {
            commands::details::handle(&file, &gems)?;
        }

        Commands::Guide { input, output } => {
            commands::guide::handle(&input, &output)?;
        }

        Commands::Validate { file, snapshot } => {
            let issues = commands::validate::handle(&file, &snapshot)?;
            if issues > 0 {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
