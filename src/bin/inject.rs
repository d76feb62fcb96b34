use agentbridge::bridge::trigger::TriggerFile;
use agentbridge::tmux;
use agentbridge_core::config::DEFAULT_TRIGGER_FILE;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "agentbridge-inject",
    about = "Type the latest bridged message into the agent's tmux session"
)]
struct Cli {
    /// Text to inject. When empty, the trigger file is used.
    text: Vec<String>,

    /// Trigger file written by `agentbridge watch`
    #[arg(long, env = "AGENTBRIDGE_TRIGGER_FILE", default_value = DEFAULT_TRIGGER_FILE)]
    file: PathBuf,

    /// Exact tmux session name (default: first session containing "claude")
    #[arg(long)]
    session: Option<String>,

    /// Leave the trigger file in place after injecting
    #[arg(long, default_value_t = false)]
    keep: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let text = if cli.text.is_empty() {
        let trigger = TriggerFile::new(&cli.file);
        let read = if cli.keep {
            trigger.peek()
        } else {
            trigger.take()
        };
        match read {
            Ok(Some(text)) => text,
            Ok(None) => {
                println!("No file: {}", cli.file.display());
                return ExitCode::SUCCESS;
            }
            Err(e) => {
                eprintln!("ERROR: cannot read {}: {e}", cli.file.display());
                return ExitCode::FAILURE;
            }
        }
    } else {
        cli.text.join(" ")
    };

    let text = text.trim();
    if text.is_empty() {
        return ExitCode::SUCCESS;
    }

    let sessions = match tmux::list_sessions().await {
        Ok(sessions) => sessions,
        Err(e) => {
            eprintln!("ERROR: {e}");
            return ExitCode::FAILURE;
        }
    };
    let Some(target) = tmux::pick_session(&sessions, cli.session.as_deref(), "claude") else {
        eprintln!("ERROR: No tmux session found");
        return ExitCode::FAILURE;
    };

    match tmux::send_text(&target, text).await {
        Ok(()) => {
            println!("Injected into session: {target}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ERROR: {e}");
            ExitCode::FAILURE
        }
    }
}
