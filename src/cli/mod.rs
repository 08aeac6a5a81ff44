pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "postwatch")]
#[command(about = "Watch web pages for new posts and forward them to Discord", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: ~/.config/postwatch/config.toml)
    #[arg(short, long, env = "POSTWATCH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Also append logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Poll every enabled source until interrupted (default)
    Run,
    /// Run a single cycle for one source
    Once {
        /// Source name as configured under [sources]
        source: String,

        /// Treat every post on the page as new
        #[arg(long)]
        ignore_cache: bool,
    },
    /// List configured sources
    List,
    /// Validate the configuration and every source
    Check,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// List available strategies
    Strategies,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_run() {
        let cli = Cli::try_parse_from(["postwatch"]).unwrap();
        assert_eq!(cli.command(), Commands::Run);
    }

    #[test]
    fn test_once_with_flags() {
        let cli = Cli::try_parse_from([
            "postwatch",
            "once",
            "events",
            "--ignore-cache",
            "--config",
            "/tmp/pw.toml",
        ])
        .unwrap();

        assert_eq!(
            cli.command(),
            Commands::Once {
                source: "events".into(),
                ignore_cache: true
            }
        );
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/pw.toml")));
    }
}
