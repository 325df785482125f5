//! Cottage CLI - Command-line interface
//!
//! Usage:
//!   cottage list
//!   cottage add --id <id> [--capacity N ...]
//!   cottage update --id <id> [--capacity N ...]
//!   cottage delete <id>
//!   cottage search --places N --bedrooms N --max-lake M --max-city M --start DD.MM.YYYY --nights N

mod input;

use clap::{Parser, Subcommand};
use cottage_core::{AppConfig, Cottage, LoggingConfig};
use cottage_graph::CottageCatalog;
use input::{CottageArgs, SearchArgs};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cottage")]
#[command(about = "Cottage catalog backed by a SPARQL store")]
#[command(version)]
struct Cli {
    /// TOML configuration file; environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all cottages
    List,
    /// Add a new cottage
    Add(CottageArgs),
    /// Replace an existing cottage
    Update(CottageArgs),
    /// Delete a cottage and its location
    Delete {
        /// Cottage identifier
        id: String,
    },
    /// Find cottages available for a stay
    Search(SearchArgs),
}

fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "cottage_cli={level},cottage_graph={level}",
            level = config.level
        ))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    if config.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

fn print_cottages(cottages: &[Cottage]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(cottages)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config)?;
    init_tracing(&config.logging);

    tracing::debug!(
        query = %config.store.query_endpoint,
        update = %config.store.update_endpoint,
        "Using graph store"
    );
    let catalog = CottageCatalog::from_config(&config.store)?;

    match cli.command {
        Commands::List => {
            print_cottages(&catalog.list_cottages().await?)?;
        }
        Commands::Add(args) => {
            let cottage = Cottage::from(args);
            catalog.add_cottage(&cottage).await?;
            println!("Added cottage {}", cottage.cottage_id);
        }
        Commands::Update(args) => {
            let cottage = Cottage::from(args);
            catalog.update_cottage(&cottage).await?;
            println!("Updated cottage {}", cottage.cottage_id);
        }
        Commands::Delete { id } => {
            catalog.delete_cottage(&id).await?;
            println!("Deleted cottage {}", id);
        }
        Commands::Search(args) => {
            let cottages = catalog
                .search_availability(
                    args.places,
                    args.bedrooms,
                    args.max_lake,
                    args.city.as_deref(),
                    args.max_city,
                    args.start,
                    args.nights,
                )
                .await?;
            print_cottages(&cottages)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_arguments() {
        let cli = Cli::try_parse_from([
            "cottage", "search", "--places", "4", "--bedrooms", "2", "--max-lake", "100",
            "--city", "Lahti", "--max-city", "300", "--start", "01.06.2024", "--nights", "7",
        ])
        .unwrap();

        let Commands::Search(args) = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(args.start, chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(args.nights, 7);
        assert_eq!(args.city.as_deref(), Some("Lahti"));
    }

    #[test]
    fn test_search_rejects_zero_nights_and_iso_dates() {
        let base = [
            "cottage", "search", "--places", "1", "--bedrooms", "1", "--max-lake", "1",
            "--max-city", "1",
        ];
        let zero_nights = base
            .into_iter()
            .chain(["--start", "01.06.2024", "--nights", "0"]);
        assert!(Cli::try_parse_from(zero_nights).is_err());

        let iso_date = base
            .into_iter()
            .chain(["--start", "2024-06-01", "--nights", "2"]);
        assert!(Cli::try_parse_from(iso_date).is_err());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["cottage", "delete", "C1", "--config", "cottage.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("cottage.toml")));
        assert!(matches!(cli.command, Commands::Delete { id } if id == "C1"));
    }
}
