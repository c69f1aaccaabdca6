//! CLI argument definitions
//!
//! All clap-derived structs and enums for CLI parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "poeguide")]
#[command(about = "Data toolchain for the Korean PoE leveling guide", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scrape the poedb Quest page and regenerate the gems.js sections
    #[command(visible_alias = "s")]
    Sync {
        /// Path to gems.js
        #[arg(long, default_value = "js/gems.js")]
        file: PathBuf,

        /// Also download missing gem icons
        #[arg(long)]
        icons: bool,

        /// Directory for downloaded icons
        #[arg(long, default_value = "img/gems")]
        icon_dir: PathBuf,
    },

    /// Scrape per-gem tooltip details (resumable)
    #[command(visible_alias = "d")]
    Details {
        /// Path to gem_details.js
        #[arg(long, default_value = "js/gem_details.js")]
        file: PathBuf,

        /// Path to gems.js (for the gem ID list)
        #[arg(long, default_value = "js/gems.js")]
        gems: PathBuf,
    },

    /// Build guide.js from the campaign-guide spreadsheet export
    #[command(visible_alias = "g")]
    Guide {
        /// Spreadsheet export: JSON object of "Act N" -> CSV text
        #[arg(long, default_value = "cyclon_campaign_guide.json")]
        input: PathBuf,

        /// Output JS file
        #[arg(long, default_value = "js/guide.js")]
        output: PathBuf,
    },

    /// Diff gems.js against a scraped poedb snapshot
    #[command(visible_alias = "v")]
    Validate {
        /// Path to gems.js
        #[arg(long, default_value = "js/gems.js")]
        file: PathBuf,

        /// Snapshot JSON file
        #[arg(long, default_value = "poedb_rewards.json")]
        snapshot: PathBuf,
    },
}
