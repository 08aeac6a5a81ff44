use std::fs::OpenOptions;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use postwatch::app::AppContext;
use postwatch::cli::{commands, Cli, Commands};
use postwatch::config::Config;
use postwatch::daemon::extract_panic_message;

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(file_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    Ok(())
}

/// Route panics through tracing so they reach the log file too.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        error!(location = %location, "Panic: {}", extract_panic_message(info.payload()));
        original_hook(info);
    }));
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let command = cli.command();

    match command {
        Commands::Init { force } => {
            let path = match &cli.config {
                Some(path) => path.clone(),
                None => Config::default_config_path()?,
            };
            return commands::init(&path, force);
        }
        Commands::Strategies => {
            commands::list_strategies();
            return Ok(());
        }
        _ => {}
    }

    let config = Config::load(cli.config.as_deref())?;

    if let Commands::List = command {
        commands::list_sources(&config);
        return Ok(());
    }

    let ctx = AppContext::new(config)?;
    commands::guarded(&ctx.reporter, dispatch(&ctx, command)).await
}

async fn dispatch(ctx: &AppContext, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run => commands::run(ctx).await,
        Commands::Once {
            source,
            ignore_cache,
        } => commands::once(ctx, &source, ignore_cache).await,
        Commands::Check => commands::check(ctx),
        Commands::List | Commands::Init { .. } | Commands::Strategies => Ok(()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.log_file.as_deref()) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }
    install_panic_hook();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
