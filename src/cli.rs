use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "settings-admin",
    version,
    about = "Admin web page for site and mailer settings",
    long_about = "Serves an authenticated settings page that reads site and mail-server configuration keys from a store (memory, YAML file or Redis), validates edits and writes them back as one batch."
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "SETTINGS_ADMIN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Server port, overriding the configuration file
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "SETTINGS_ADMIN_JSON_LOGS")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the web server (default)
    Serve,

    /// Validate a configuration file and exit
    Check {
        /// Configuration file to validate
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Print the current settings as JSON (password masked)
    Show,
}

impl Cli {
    pub fn effective_command(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Serve)
    }
}
