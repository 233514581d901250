use std::sync::Arc;

use anyhow::{Context, bail};
use carewatch::{
    assistant::Assistant,
    config::{Config, read_config_file},
    notify::Notifier,
    storage::{open_event_log, open_reminder_store},
    util::get_config_path,
};
use clap::{Parser, Subcommand};
use tracing::{level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

/// Operate on the stores of a carewatch hub
#[derive(Debug, Parser)]
struct Args {
    /// Config file (defaults to $CAREWATCH_CONFIG or ./carewatch.json)
    #[arg(short, long)]
    file: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Manage reminders
    Reminders {
        #[command(subcommand)]
        action: ReminderAction,
    },

    /// Read the event log
    Log {
        #[command(subcommand)]
        action: LogAction,
    },

    /// Ask the assistant a question
    Chat {
        /// What to say
        text: Vec<String>,
    },

    /// Raise a safety alert by hand and deliver it to every channel
    Alert {
        /// Why the caregiver should check in
        reason: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ReminderAction {
    List,
    Add {
        /// Reminder text
        text: String,
        /// Time of day, HH:MM
        time: String,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
enum LogAction {
    /// Print the most recent entries, oldest first
    Tail {
        #[arg(short, default_value_t = 10)]
        n: usize,
    },
    /// Print the most recent entries that fired an alert
    Alerts {
        #[arg(short, default_value_t = 10)]
        n: usize,
    },
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("carewatch", LevelFilter::WARN),
        ("carewatch_ctl", LevelFilter::INFO),
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

fn load_config(file: Option<&str>) -> anyhow::Result<Config> {
    let path = file.map(str::to_string).unwrap_or_else(get_config_path);
    if file.is_none() && !std::path::Path::new(&path).exists() {
        return Ok(Config::default());
    }
    read_config_file(&path).with_context(|| format!("failed to load {path}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = load_config(args.file.as_deref())?;

    match args.command {
        Command::Reminders { action } => {
            let store = open_reminder_store(&config.reminder_store).await?;

            match action {
                ReminderAction::List => {
                    for task in store.list().await? {
                        println!("{:>4}  {}  {}", task.id, task.time, task.text);
                    }
                }
                ReminderAction::Add { text, time } => {
                    let task = store.create(&text, &time).await?;
                    println!("added reminder {} at {}", task.id, task.time);
                }
                ReminderAction::Delete { id } => {
                    store.delete(id).await?;
                    println!("deleted reminder {id}");
                }
            }
        }

        Command::Log { action } => {
            let log = open_event_log(&config.storage.clone().unwrap_or_default()).await?;

            let entries = match action {
                LogAction::Tail { n } => log.tail(n).await?,
                LogAction::Alerts { n } => log.alerts(n).await?,
            };

            for entry in entries {
                println!(
                    "{}  {:<8}  {:<7}  {}",
                    entry.timestamp().format("%Y-%m-%d %H:%M:%S"),
                    entry.status,
                    entry.sample.source,
                    entry.message
                );
            }
        }

        Command::Chat { text } => {
            let (notifier, _) = Notifier::from_config(&config)?;
            let assistant = Assistant::new(Arc::new(notifier));
            println!("{}", assistant.reply(&text.join(" ")).await);
        }

        Command::Alert { reason } => {
            let reason = reason.join(" ");
            if reason.trim().is_empty() {
                bail!("a reason is required");
            }

            let (notifier, _) = Notifier::from_config(&config)?;
            if notifier.channel_count() == 0 {
                bail!("no notification channel configured");
            }

            let message = notifier
                .render_manual_alert(&config.subject.id, &config.subject.display_name(), reason.trim())
                .await;
            println!("{}", message.body);

            let results = notifier.deliver(&message).await;
            for (channel, result) in &results {
                match result {
                    Ok(()) => println!("  {channel:<8} delivered"),
                    Err(e) => println!("  {channel:<8} failed: {e}"),
                }
            }

            if results.iter().all(|(_, result)| result.is_err()) {
                bail!("no channel accepted the alert");
            }
        }
    }

    Ok(())
}
