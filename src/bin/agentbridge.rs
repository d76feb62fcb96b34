//! agentbridge: two-way Discord bridge for coding agents
//!
//! Usage:
//!   agentbridge read [--since 10]             → recent messages (optionally last N minutes)
//!   agentbridge unread                        → only messages since the last check
//!   agentbridge send "message" [--force]      → send (rate limited)
//!   agentbridge reply <msg_id> "text"         → threaded reply (rate limited)
//!   agentbridge watch [30]                    → poll for new messages every N seconds
//!   agentbridge interactions [--json]         → pending messages from allowed users
//!   agentbridge delete <msg_id>               → delete one message
//!   agentbridge cleanup [5]                   → delete the bridge's last N messages
//!   agentbridge users                         → list allowed interactive users
//!   agentbridge context                       → recent conversation digest

use agentbridge::bridge::gate::SendOutcome;
use agentbridge::bridge::tracker::PollRequest;
use agentbridge::bridge::watch::WatchSink;
use agentbridge::format;
use agentbridge::Bridge;
use agentbridge_core::config::load_dotenv;
use agentbridge_core::{BridgeConfig, Error, FilteredMessage, MessageId};
use anyhow::Context;
use chrono::{Duration, Local};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "agentbridge",
    about = "Two-way Discord bridge: read messages from a channel, post updates back",
    version = env!("CARGO_PKG_VERSION"),
    long_about = "agentbridge lets an agent talk to humans through one Discord channel.\n\
                  Configuration comes from the environment or a .env file:\n\
                  DISCORD_BOT_TOKEN, DISCORD_CHANNEL_ID (required), DISCORD_BOT_ID,\n\
                  DISCORD_ALLOWED_USERS (\"id:Name,id:Name\"), DISCORD_RATE_LIMIT (seconds)."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Load variables from this file instead of ./.env
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Log bridge activity to stderr
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Read recent messages
    Read {
        /// Only messages from the last N minutes
        #[arg(long, value_parser = parse_minutes)]
        since: Option<Duration>,
        /// Include the bridge's own messages
        #[arg(long, default_value_t = false)]
        all: bool,
    },
    /// Read only messages since the last check
    Unread,
    /// Send a message (rate limited)
    Send {
        #[arg(required = true)]
        message: Vec<String>,
        /// Bypass the rate limit
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Reply to a specific message (rate limited)
    Reply {
        message_id: String,
        #[arg(required = true)]
        message: Vec<String>,
        /// Bypass the rate limit
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Watch for new messages continuously
    Watch {
        /// Seconds between polls
        #[arg(default_value_t = 30)]
        interval: u64,
    },
    /// Delete a specific message
    Delete { message_id: String },
    /// Delete the bridge's most recent messages
    Cleanup {
        #[arg(default_value_t = 5)]
        count: usize,
    },
    /// Check pending messages from allowed users
    Interactions {
        /// Look back this many minutes when no cursor exists (0 = whole page)
        #[arg(long, default_value = "60", value_parser = parse_minutes)]
        since: Duration,
        /// Leave the interaction cursor where it is
        #[arg(long, default_value_t = false)]
        no_mark: bool,
        /// Also print the batch as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List allowed interactive users
    Users,
    /// Recent messages formatted for an agent's context
    Context,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    load_dotenv(cli.env_file.as_deref())?;
    let config = BridgeConfig::from_env()?;
    let bridge = Bridge::from_config(config);

    match cli.command {
        Commands::Read { since, all } => {
            let window = since.filter(|w| !w.is_zero());
            let request = PollRequest::recent(window).with_own(all);
            if let Some(batch) = poll_or_report(&bridge, &request).await? {
                if batch.is_empty() {
                    println!("No new messages from humans.");
                } else {
                    print!("{}", format::format_batch("Discord Messages", &batch));
                }
            }
        }

        Commands::Unread => {
            let request = PollRequest::unread(bridge.config().page_size);
            if let Some(batch) = poll_or_report(&bridge, &request).await? {
                if batch.is_empty() {
                    println!("No new messages.");
                } else {
                    print!("{}", format::format_batch("New Discord Messages", &batch));
                }
            }
        }

        Commands::Send { message, force } => {
            send(&bridge, &message.join(" "), None, force).await?;
        }

        Commands::Reply {
            message_id,
            message,
            force,
        } => {
            let target = MessageId::new(message_id);
            send(&bridge, &message.join(" "), Some(&target), force).await?;
        }

        Commands::Watch { interval } => {
            watch(&bridge, std::time::Duration::from_secs(interval.max(1))).await;
        }

        Commands::Delete { message_id } => {
            let id = MessageId::new(message_id);
            bridge.moderator().delete(&id).await?;
            println!("Message {id} deleted");
        }

        Commands::Cleanup { count } => {
            let report = bridge.moderator().cleanup_own(count).await?;
            if report.deleted.is_empty() && report.failed.is_empty() {
                println!("No bot messages to delete");
            } else {
                for id in &report.failed {
                    eprintln!("Failed to delete {id}");
                }
                println!("Deleted {} bot messages", report.deleted.len());
            }
        }

        Commands::Interactions {
            since,
            no_mark,
            json,
        } => {
            let window = (!since.is_zero()).then_some(since);
            let request = PollRequest::interactions(window).with_marking(!no_mark);
            if let Some(batch) = poll_or_report(&bridge, &request).await? {
                if batch.is_empty() {
                    println!("No pending interactions from allowed users.");
                } else {
                    print!("{}", format::format_interactions(&batch));
                }
                if json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&batch).context("serialize interactions")?
                    );
                }
            }
        }

        Commands::Users => {
            println!("{}", format::format_users(bridge.filter().allow_list()));
        }

        Commands::Context => {
            let batch = poll_or_report(&bridge, &PollRequest::context())
                .await?
                .unwrap_or_default();
            println!("{}", format::format_context(&batch));
        }
    }

    Ok(())
}

/// A non-negative number of minutes that fits a time window.
fn parse_minutes(raw: &str) -> Result<Duration, String> {
    let minutes: i64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a whole number of minutes"))?;
    if minutes < 0 {
        return Err("minutes must not be negative".to_string());
    }
    Duration::try_minutes(minutes).ok_or_else(|| format!("{minutes} minutes is too long a window"))
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "agentbridge=info,agentbridge_discord=info"
    } else {
        "agentbridge=warn,agentbridge_discord=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Fetch failures are reported and read as "nothing this time".
async fn poll_or_report(
    bridge: &Bridge,
    request: &PollRequest,
) -> anyhow::Result<Option<Vec<FilteredMessage>>> {
    match bridge.tracker().poll(request).await {
        Ok(batch) => Ok(Some(batch)),
        Err(e @ Error::FetchError { .. }) => {
            eprintln!("Error: {e}");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

async fn send(
    bridge: &Bridge,
    content: &str,
    reply_to: Option<&MessageId>,
    force: bool,
) -> anyhow::Result<()> {
    match bridge.gate().send(content, reply_to, force).await? {
        SendOutcome::Sent(message) => match reply_to {
            Some(target) => println!("Replied to message {target} (id {})", message.id),
            None => println!("Message sent (id {})", message.id),
        },
        SendOutcome::RateLimited { wait } => {
            println!(
                "RATE LIMITED: wait {} before sending another message",
                format::format_wait(wait)
            );
            println!("   (use --force to bypass)");
        }
    }
    Ok(())
}

struct PrintSink;

impl WatchSink for PrintSink {
    fn messages(&mut self, batch: &[FilteredMessage]) {
        print!("{}", format::format_batch("New Discord Messages", batch));
        println!(
            "\n[{}] Waiting for new messages...\n",
            Local::now().format("%H:%M:%S")
        );
    }

    fn error(&mut self, error: &Error) {
        eprintln!("Error: {error}");
    }
}

async fn watch(bridge: &Bridge, interval: std::time::Duration) {
    println!("Watching for new messages (every {}s)...", interval.as_secs());
    println!("Press Ctrl+C to stop.\n");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    bridge.watcher(interval).run(&mut PrintSink, cancel).await;
}
