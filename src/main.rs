use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use folio::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for folio::AppCommand {
    fn from(cmd: Commands) -> folio::AppCommand {
        match cmd {
            Commands::List { assets, json } => folio::AppCommand::List { assets, json },
            Commands::Show { name, assets, json } => {
                folio::AppCommand::Show { name, assets, json }
            }
            Commands::Total { name } => folio::AppCommand::Total { name },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display all portfolios with live valuations
    List {
        /// Only include these asset symbols
        #[arg(long, value_delimiter = ',')]
        assets: Vec<String>,
        /// Print the canonical JSON form
        #[arg(long)]
        json: bool,
    },
    /// Display a portfolio by name
    Show {
        name: String,
        /// Only include these asset symbols
        #[arg(long, value_delimiter = ',')]
        assets: Vec<String>,
        /// Print the canonical JSON form
        #[arg(long)]
        json: bool,
    },
    /// Display the total value of a portfolio
    Total { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => folio::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = folio::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
portfolios:
  - name: "Will's Portfolio"
    assets:
      - symbol: USD
        shares: 10
        valuation: 1
      - symbol: ETH
        shares: 10
        valuation: 1000
      - symbol: BTC
        shares: 10
        valuation: 10000
  - name: "Ale's Portfolio"
    assets:
      - symbol: USD
        shares: 100
        valuation: 1
      - symbol: ETH
        shares: 100
        valuation: 1000
      - symbol: BTC
        shares: 100
        valuation: 10000

providers:
  coinbase:
    base_url: "https://api.coinbase.com"
  coindesk:
    base_url: "https://api.coindesk.com"
  cryptocompare:
    base_url: "https://min-api.cryptocompare.com"
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
