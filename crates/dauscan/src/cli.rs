//! Cli — command-line surface.
//!
//! One optional positional argument selects how many days back to scan;
//! anything non-numeric is rejected by clap before any processing starts.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "dauscan", version, about = "Scan API server logs and record daily active users as Redis bitmaps")]
pub struct Cli {
    /// How many days back to scan (default: 1, yesterday only)
    pub days_back: Option<u32>,

    /// Path to the TOML config file (overrides DAUSCAN_CONFIG_FILE)
    #[arg(short, long)]
    pub config: Option<String>,
}
