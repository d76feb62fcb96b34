//! Thin wrapper over the tmux CLI for the terminal injector.

use std::time::Duration;
use tokio::process::Command;

/// Pause between typing the text and pressing Enter.
const ENTER_DELAY: Duration = Duration::from_millis(300);

async fn run_tmux(args: &[&str]) -> Result<String, String> {
    let output = Command::new("tmux")
        .args(args)
        .output()
        .await
        .map_err(|e| format!("tmux exec failed: {e}"))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(format!("tmux error: {stderr}"))
    }
}

pub async fn list_sessions() -> Result<Vec<String>, String> {
    match run_tmux(&["list-sessions", "-F", "#{session_name}"]).await {
        Ok(output) => Ok(output.lines().map(String::from).collect()),
        Err(e) if e.contains("no server running") => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

/// Pick the injection target: an exact `preferred` name, else the first
/// session whose name contains `hint` (case-insensitive), else the first
/// session at all.
pub fn pick_session(sessions: &[String], preferred: Option<&str>, hint: &str) -> Option<String> {
    if let Some(name) = preferred {
        return sessions.iter().find(|s| s.as_str() == name).cloned();
    }
    let hint = hint.to_lowercase();
    sessions
        .iter()
        .find(|s| s.to_lowercase().contains(&hint))
        .or_else(|| sessions.first())
        .cloned()
}

/// Type `text` literally into the session, then press Enter.
pub async fn send_text(name: &str, text: &str) -> Result<(), String> {
    run_tmux(&["send-keys", "-t", name, "-l", text]).await?;
    tokio::time::sleep(ENTER_DELAY).await;
    run_tmux(&["send-keys", "-t", name, "Enter"]).await.map(|_| ())
}
