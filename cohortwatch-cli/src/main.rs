use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use config::ConfigLoader;

#[derive(Parser)]
#[command(name = "cohortwatch", about = "Live view of cohort events on the message bus")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay server
    Serve(commands::serve::ServeArgs),
    /// Publish one payload to a cohort topic
    Send(commands::send::SendArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ConfigLoader::load()?;

    match cli.command {
        Commands::Serve(args) => commands::serve::run(args, config).await,
        Commands::Send(args) => commands::send::run(args, config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_with_cohort() {
        let cli = Cli::parse_from(["cohortwatch", "-v", "serve", "--cohort", "cocoMDS", "-p", "9000"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.cohort.as_deref(), Some("cocoMDS"));
                assert_eq!(args.port, Some(9000));
            }
            Commands::Send(_) => panic!("expected serve"),
        }
    }

    #[test]
    fn test_send_requires_cohort() {
        assert!(Cli::try_parse_from(["cohortwatch", "send"]).is_err());
    }
}
