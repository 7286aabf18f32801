use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser)]
#[command(name = "approle")]
#[command(about = "Converge Entra ID group app-role assignments to a declared state")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file (.json or .toml)
    pub config: PathBuf,

    /// Compute and print the changes without applying them
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Maximum concurrent directory writes per application
    #[arg(long, default_value_t = approle_core::DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Client secret (overrides the config file)
    #[arg(long, env = "APPROLE_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Log level when RUST_LOG is not set
    #[arg(long, env = "APPROLE_LOG", default_value = "warn")]
    pub log_level: String,
}

#[derive(Clone, Copy, ValueEnum, Default, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// One line per change
    #[default]
    Text,
    Json,
    Table,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["approle", "assign.json"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("assign.json"));
        assert!(!cli.dry_run);
        assert_eq!(cli.format, OutputFormat::Text);
        assert_eq!(cli.concurrency, approle_core::DEFAULT_CONCURRENCY);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "approle",
            "assign.toml",
            "--dry-run",
            "--format",
            "json",
            "--concurrency",
            "2",
        ])
        .unwrap();
        assert!(cli.dry_run);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.concurrency, 2);
    }

    #[test]
    fn test_config_is_required() {
        assert!(Cli::try_parse_from(["approle"]).is_err());
    }
}
