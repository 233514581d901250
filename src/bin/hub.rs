use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use carewatch::{
    actors::Supervisor,
    config::{Config, read_config_file},
    notify::Notifier,
    storage::{open_event_log, open_reminder_store},
    util::get_config_path,
};
use clap::Parser;
use tracing::{info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file (defaults to $CAREWATCH_CONFIG or ./carewatch.json)
    #[arg(short, long)]
    file: Option<String>,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("carewatch", LevelFilter::DEBUG),
        ("carewatch_hub", LevelFilter::TRACE),
        ("tower_http", LevelFilter::INFO),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    match &args.file {
        Some(path) => read_config_file(path).with_context(|| format!("failed to load {path}")),
        None => {
            let path = get_config_path();
            if Path::new(&path).exists() {
                read_config_file(&path).with_context(|| format!("failed to load {path}"))
            } else {
                warn!("no config file at {path}, using defaults");
                Ok(Config::default())
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = load_config(&args)?;

    let log = open_event_log(&config.storage.clone().unwrap_or_default()).await?;
    let reminders = open_reminder_store(&config.reminder_store).await?;
    let (notifier, banners) = Notifier::from_config(&config)?;
    let notifier = Arc::new(notifier);

    info!(
        "monitoring {} with {} notification channel(s), event log: {}",
        config.subject.display_name(),
        notifier.channel_count(),
        log.name()
    );

    let supervisor = Supervisor::start(&config, log.clone(), reminders.clone(), notifier.clone());

    #[cfg(feature = "api")]
    if let Some(mut settings) = config.api.clone() {
        use carewatch::api::{ApiState, spawn_api_server};
        use carewatch::util::get_api_token;

        if settings.token.is_none() {
            settings.token = get_api_token();
        }

        let state = ApiState::new(
            log,
            reminders,
            banners,
            notifier,
            config.subject.clone(),
            supervisor.handle(),
        );
        spawn_api_server(settings, state)
            .await
            .context("failed to start API server")?;
    }

    #[cfg(not(feature = "api"))]
    {
        drop(banners);
        if config.api.is_some() {
            warn!("API configured but the `api` feature is disabled");
        }
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    info!("received Ctrl-C, shutting down");
    supervisor.shutdown().await
}
