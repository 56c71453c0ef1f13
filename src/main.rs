//! DeviantArt Downloader - CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use deviantart_downloader::{
    cli::Args,
    config::{validate_config, Config},
    download::{self, RunContext},
    error::{exit_codes, Error, Result},
    output::{
        log_file_writer, print_banner, print_config_summary, print_creator_stats, print_error,
        print_global_stats, print_info, print_success, print_warning,
    },
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_) | Error::ConfigValidation { .. } | Error::MissingConfig(_) => {
                    ExitCode::from(exit_codes::CONFIG_ERROR as u8)
                }
                Error::Authentication(_) | Error::RetryExhausted { .. } | Error::Protocol { .. } => {
                    ExitCode::from(exit_codes::API_ERROR as u8)
                }
                Error::Database(_) | Error::Persistence { .. } => {
                    ExitCode::from(exit_codes::STATE_ERROR as u8)
                }
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Print banner
    print_banner();

    // Load configuration
    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        print_warning(&format!(
            "Configuration file not found: {}",
            args.config.display()
        ));
        print_info("Using default configuration with CLI arguments and environment");
        Config::default()
    };

    // Merge CLI arguments into config
    args.merge_into_config(&mut config);

    // Validate configuration
    validate_config(&config)?;

    std::fs::create_dir_all(&config.options.save_dir)?;
    let _log_guard = init_logging(&config, args.debug);

    print_config_summary(
        &config.account.username,
        &config.options.save_dir.display().to_string(),
        &config.database_path().display().to_string(),
        config.options.tagger_url.as_deref(),
    );

    let mut ctx = RunContext::from_config(&config).await?;
    ctx.settings.show_progress = !args.quiet;

    let stats = download::run(&ctx).await?;

    for creator in stats.creators.iter().filter(|c| c.pages > 0 || c.failed) {
        print_creator_stats(creator);
    }

    let counts = match ctx.ledger.counts().await {
        Ok(counts) => Some(counts),
        Err(e) => {
            tracing::warn!("Could not read ledger totals: {}", e);
            None
        }
    };
    print_global_stats(&stats, counts);

    ctx.ledger.close().await;

    if stats.creators_failed > 0 {
        print_warning(&format!(
            "{} creator(s) failed and will be retried on the next run",
            stats.creators_failed
        ));
    } else {
        print_success("All followed creators processed");
    }

    Ok(())
}

/// Log to stderr and, when it can be opened, to the configured log file.
///
/// File writes go through a background worker; the returned guard flushes it
/// when dropped and must be held until the run ends.
fn init_logging(config: &Config, debug: bool) -> Option<WorkerGuard> {
    let log_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let log_path = config.log_file();
    let (file_layer, guard) = match log_file_writer(&log_path) {
        Ok((writer, guard)) => {
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            print_warning(&e.to_string());
            (None, None)
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}
