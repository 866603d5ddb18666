//! mcprice - Monte Carlo option pricing from the command line
//!
//! # Commands
//!
//! - `mcprice run --config <file>` - price every run of a TOML run file
//! - `mcprice price --scheme <scheme> --exercise <call|put> ...` - price a single contract

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use pricing::simulation::RngEngine;
use pricing::{ExerciseType, PayoffSelection, PayoffStyle, PricingRequest, SchemeSelection};
use runner::{
    deadline_from_seconds, publish, ContractTable, ExecutionMode, Orchestrator, OutputFormat,
    RunFile,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Monte Carlo option pricer
#[derive(Parser)]
#[command(name = "mcprice")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Where reports go
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Console)]
    format: OutputFormat,

    /// Directory for csv and text reports
    #[arg(short, long, global = true, default_value = ".")]
    output: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price all runs of a run file
    Run {
        /// Path to the TOML run file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Price a single contract
    Price(PriceArgs),
}

#[derive(Args)]
struct PriceArgs {
    /// Annualized volatility [default: 0.1]
    #[arg(long)]
    vol: Option<f64>,

    /// Annualized risk-free rate [default: 0.1]
    #[arg(long)]
    rate: Option<f64>,

    /// Time to expiry in years [default: 0.25]
    #[arg(long)]
    expiry: Option<f64>,

    /// Spot price [default: 100]
    #[arg(long)]
    spot: Option<f64>,

    /// Strike price [default: 120]
    #[arg(long)]
    strike: Option<f64>,

    /// Number of simulated paths [default: 100000]
    #[arg(long)]
    paths: Option<usize>,

    /// Number of time steps, required by explicit-euler and milstein
    #[arg(long)]
    steps: Option<usize>,

    /// gbm, explicit-euler or milstein
    #[arg(long)]
    scheme: SchemeSelection,

    /// call or put
    #[arg(long)]
    exercise: ExerciseType,

    /// european or asian
    #[arg(long, default_value = "european")]
    style: PayoffStyle,

    #[arg(long)]
    upper_cap: Option<f64>,

    #[arg(long)]
    lower_cap: Option<f64>,

    /// default or mersenne-twister
    #[arg(long, default_value = "default")]
    engine: RngEngine,

    /// Fixed seed for a reproducible run, the clock otherwise
    #[arg(long)]
    seed: Option<u64>,

    /// Abort the run when it takes longer, fractions allowed
    #[arg(long)]
    max_seconds: Option<f64>,
}

impl PriceArgs {
    fn request(&self) -> anyhow::Result<PricingRequest> {
        let contract = ContractTable {
            vola: self.vol,
            rate: self.rate,
            expiry: self.expiry,
            spot: self.spot,
            strike: self.strike,
            paths: self.paths,
            steps: self.steps,
        }
        .contract()?;
        let payoff = PayoffSelection::new(self.exercise, self.style).with_caps(
            self.upper_cap.unwrap_or_default(),
            self.lower_cap.unwrap_or_default(),
        );
        Ok(PricingRequest::new(contract, self.scheme, payoff)?)
    }

    fn orchestrator(&self) -> anyhow::Result<Orchestrator> {
        Ok(Orchestrator::new(ExecutionMode::Sequential, self.engine)
            .with_seed(self.seed)
            .with_deadline(deadline_from_seconds(self.max_seconds)?))
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (requests, orchestrator) = match &cli.command {
        Commands::Run { config } => {
            let file = RunFile::load(config)
                .with_context(|| format!("failed to load run file {}", config.display()))?;
            let orchestrator = Orchestrator::new(file.mode(), file.engine)
                .with_seed(file.seed)
                .with_deadline(file.deadline()?);
            (file.requests()?, orchestrator)
        }
        Commands::Price(args) => (vec![args.request()?], args.orchestrator()?),
    };

    let outcomes = orchestrator.run(&requests)?;
    let written = publish(&outcomes, cli.format, &cli.output)?;
    for path in &written {
        println!("{}", path.display());
    }

    let nr_failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();
    if nr_failed > 0 {
        bail!("{nr_failed} of {} runs failed", outcomes.len());
    }
    Ok(())
}
