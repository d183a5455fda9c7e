use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;

#[derive(Parser, Debug)]
#[command(name = "Office Presence")]
#[command(bin_name = "office-presence")]
#[command(about = "Report and watch whether you are at the office")]
pub struct Cli {
    /// JSON config file; defaults apply when it does not exist.
    #[arg(long, short, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub role: Role,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    #[command(about = "Sample location on an interval and publish the status")]
    Reporter,
    #[command(about = "Subscribe to the status and render every change")]
    Viewer,
    #[command(about = "Run reporter and viewer against one shared store")]
    Both,
}

impl Role {
    pub fn runs_reporter(self) -> bool {
        matches!(self, Role::Reporter | Role::Both)
    }

    pub fn runs_viewer(self) -> bool {
        matches!(self, Role::Viewer | Role::Both)
    }
}
