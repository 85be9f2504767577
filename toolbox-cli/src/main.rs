use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod terminal;

use config::{ConfigLoader, ToolboxConfig};

#[derive(Parser, Debug)]
#[command(name = "toolbox", about = "Minimal plugins for your notes, from the terminal")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings document to use instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Directory to treat as the note vault
    #[arg(long, global = true, value_name = "DIR")]
    vault: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage sub-plugins
    Plugin(commands::plugin::PluginArgs),
    /// List the commands of running sub-plugins
    Commands,
    /// Run a command
    Run(commands::command::RunArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
}

impl Cli {
    /// Flags win over the config files
    fn apply_overrides(&self, mut config: ToolboxConfig) -> ToolboxConfig {
        if let Some(settings) = &self.settings {
            config.settings_path = settings.clone();
        }
        if let Some(vault) = &self.vault {
            config.vault_dir = vault.clone();
        }
        if self.verbose {
            config.log_level = "debug".to_string();
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.apply_overrides(ConfigLoader::load()?);

    // stdout carries command output, logs go to stderr
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Plugin(args) => commands::plugin::run(args, &config).await,
        Commands::Commands => commands::command::list(&config).await,
        Commands::Run(args) => commands::command::run(args, &config).await,
        Commands::Config(args) => commands::config::run(args, &config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_anywhere() {
        let cli = Cli::parse_from([
            "toolbox",
            "plugin",
            "list",
            "--settings",
            "/tmp/data.json",
            "-v",
        ]);
        assert_eq!(cli.settings, Some(PathBuf::from("/tmp/data.json")));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Plugin(_)));
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let cli = Cli::parse_from(["toolbox", "--vault", "/notes", "-v", "commands"]);
        let config = cli.apply_overrides(ToolboxConfig::default());
        assert_eq!(config.vault_dir, PathBuf::from("/notes"));
        assert_eq!(config.log_level, "debug");
        assert!(config.settings_path.ends_with("data.json"));
    }

    #[test]
    fn test_run_subcommand() {
        let cli = Cli::parse_from(["toolbox", "run", "random:generate-random-string"]);
        match cli.command {
            Commands::Run(args) => assert_eq!(args.command_id, "random:generate-random-string"),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
