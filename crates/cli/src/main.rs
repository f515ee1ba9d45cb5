//! Demo binary: parses [`cli::Cli`], then runs one of `check`/`build`/`serve`
//! against the crates this workspace builds, the way `cuenv-cli`'s
//! `main()` dispatches through its own `Commands` enum.

mod cli;
mod config;
mod demo;
mod error;
mod orchestrator;

use cli::Commands;
use error::Result;
use tracing::instrument;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
#[instrument(name = "kiln_main")]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("kiln panicked: {panic_info}");
        eprintln!("run with RUST_LOG=debug for more detail");
    }));

    if let Err(error) = run_main().await {
        eprintln!("{error:?}");
        std::process::exit(1);
    }
}

#[instrument(name = "kiln_main_impl")]
async fn run_main() -> Result<()> {
    let args = cli::parse();
    init_tracing(&args.level);
    run_command(args).await
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[instrument(skip(args))]
async fn run_command(args: cli::Cli) -> Result<()> {
    match args.command {
        Commands::Check { targets } => {
            let outcome = orchestrator::check(&args.config, &targets)?;
            println!("{} target set(s), {} invalid", outcome.all.len(), outcome.invalid.len());
            Ok(())
        }
        Commands::Build { targets } => orchestrator::build(&args.config, &targets).await,
        Commands::Serve { addr } => orchestrator::serve(&args.config, addr).await,
    }
}
