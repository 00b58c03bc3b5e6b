use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use satcalc::core::log::init_logging;

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

impl From<Commands> for satcalc::AppCommand {
    fn from(cmd: Commands) -> satcalc::AppCommand {
        match cmd {
            Commands::Currencies => satcalc::AppCommand::Currencies,
            Commands::Convert { quantity, currency } => {
                satcalc::AppCommand::Convert { quantity, currency }
            }
            Commands::Reverse { value, currency } => {
                satcalc::AppCommand::Reverse { value, currency }
            }
            Commands::Calc { currency } => satcalc::AppCommand::Calc { currency },
            Commands::Ticker { watch } => satcalc::AppCommand::Ticker { watch },
            Commands::Portfolio { btc, watch } => satcalc::AppCommand::Portfolio {
                base_quantity: btc,
                watch,
            },
            Commands::Address => satcalc::AppCommand::Address,
            Commands::CheckPayment { address } => satcalc::AppCommand::CheckPayment { address },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List supported fiat currencies
    Currencies,
    /// Convert a BTC amount into fiat
    Convert {
        /// Amount of the base asset, e.g. 0.5
        quantity: String,
        /// Fiat currency code (defaults to the configured one)
        #[arg(short = 'C', long)]
        currency: Option<String>,
    },
    /// Convert a fiat value back into BTC
    Reverse {
        /// Fiat value, symbols and separators allowed, e.g. "$22,500.00"
        value: String,
        /// Fiat currency code (defaults to the configured one)
        #[arg(short = 'C', long)]
        currency: Option<String>,
    },
    /// Interactive calculator with periodic price refresh
    Calc {
        /// Fiat currency code to start with
        #[arg(short = 'C', long)]
        currency: Option<String>,
    },
    /// Show live market prices
    Ticker {
        /// Keep refreshing on the configured interval
        #[arg(short, long)]
        watch: bool,
    },
    /// Show the portfolio card
    Portfolio {
        /// Override the BTC amount the card is based on
        #[arg(long)]
        btc: Option<f64>,
        /// Keep refreshing on the configured interval
        #[arg(short, long)]
        watch: bool,
    },
    /// Print the configured deposit address
    Address,
    /// Check whether an address has received the minimum payment
    CheckPayment {
        /// Address to check (defaults to the configured one)
        address: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => satcalc::cli::setup::setup(),
        Some(cmd) => satcalc::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
