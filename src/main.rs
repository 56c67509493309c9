use accountant_bot::args::{Args, Command, WebhookAction};
use accountant_bot::bot::UpdateSource;
use accountant_bot::{commands, Config, Mode, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");

    // This allows for running the bot without hitting the Google APIs. When
    // ACCOUNTANT_BOT_IN_TEST_MODE is set and non-zero in length, then the mode will be Mode::Test,
    // otherwise it will be Mode::Google.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Run(run_args) => {
            let config = Config::from_args(args.common(), run_args)?;
            debug!("{config:?}");
            commands::run(config, mode, UpdateSource::from_args(run_args))
                .await?
                .print()
        }

        Command::Webhook(webhook_args) => match webhook_args.action() {
            WebhookAction::Set(set_args) => commands::set_webhook(args.common(), set_args)
                .await?
                .print(),
            WebhookAction::Delete => commands::delete_webhook(args.common()).await?.print(),
            WebhookAction::Info => commands::webhook_info(args.common()).await?.print(),
        },
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use the default log level for this crate and teloxide.
            EnvFilter::new(format!(
                "{}={level},teloxide={level}",
                env!("CARGO_CRATE_NAME"),
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
