use agentbridge_core::{AllowList, FilteredMessage};
use chrono::{DateTime, Utc};
use std::time::Duration;

const MAX_CONTENT_CHARS: usize = 500;
const RULE_WIDTH: usize = 60;

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// `[USER] [2024-05-01 12:00] Alice: hello`
pub fn format_message(msg: &FilteredMessage) -> String {
    let prefix = if msg.bot { "[BOT]" } else { "[USER]" };
    format!(
        "{} [{}] {}: {}",
        prefix,
        format_timestamp(&msg.timestamp),
        msg.author,
        truncate_chars(&msg.content, MAX_CONTENT_CHARS)
    )
}

fn banner(title: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!("\n{rule}\n{title}\n{rule}\n\n")
}

/// A titled block of messages, one per paragraph.
pub fn format_batch(title: &str, batch: &[FilteredMessage]) -> String {
    let mut out = banner(title);
    for msg in batch {
        out.push_str(&format_message(msg));
        out.push_str("\n\n");
    }
    out
}

pub fn format_interactions(batch: &[FilteredMessage]) -> String {
    let mut out = banner(&format!("Pending Interactions ({} messages)", batch.len()));
    for msg in batch {
        out.push_str(&format!(
            "  [{}] {}: {}\n\n",
            format_timestamp(&msg.timestamp),
            msg.author,
            msg.content
        ));
    }
    out
}

/// Compact digest for pasting into an agent prompt.
pub fn format_context(batch: &[FilteredMessage]) -> String {
    if batch.is_empty() {
        return "No recent Discord messages from humans.".to_string();
    }
    let mut out = String::from("Recent Discord messages:\n\n");
    for msg in batch {
        out.push_str(&format!("- {}: {}\n", msg.author, msg.content));
    }
    out
}

pub fn format_users(allowed: &AllowList) -> String {
    if allowed.is_empty() {
        return "\nNo allowlist configured - all users can interact.\n\
                Set DISCORD_ALLOWED_USERS in .env to restrict access.\n"
            .to_string();
    }
    let mut out = String::from("\nAllowed interactive users:\n");
    for (id, name) in allowed.iter() {
        out.push_str(&format!("  {name} (ID: {id})\n"));
    }
    out
}

/// Whole seconds, rounded up so "wait 0s" never appears while still limited.
pub fn format_wait(wait: Duration) -> String {
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    format!("{secs}s")
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentbridge_core::MessageId;

    fn msg(author: &str, content: &str, bot: bool) -> FilteredMessage {
        FilteredMessage {
            id: MessageId::new("1"),
            author: author.into(),
            author_id: "42".into(),
            bot,
            content: content.into(),
            timestamp: "2024-05-01T12:34:56Z".parse().unwrap(),
        }
    }

    #[test]
    fn message_line_has_prefix_time_and_author() {
        assert_eq!(
            format_message(&msg("Alice", "hi", false)),
            "[USER] [2024-05-01 12:34] Alice: hi"
        );
        assert!(format_message(&msg("Bridge", "ok", true)).starts_with("[BOT]"));
    }

    #[test]
    fn long_content_is_truncated_by_chars() {
        let long = "ü".repeat(600);
        let line = format_message(&msg("A", &long, false));
        assert_eq!(line.chars().filter(|c| *c == 'ü').count(), 500);
    }

    #[test]
    fn context_digest() {
        assert_eq!(format_context(&[]), "No recent Discord messages from humans.");
        let out = format_context(&[msg("Alice", "one", false), msg("Bob", "two", false)]);
        assert_eq!(out, "Recent Discord messages:\n\n- Alice: one\n- Bob: two\n");
    }

    #[test]
    fn users_listing() {
        assert!(format_users(&AllowList::default()).contains("all users can interact"));
        let out = format_users(&AllowList::parse("42:Alice"));
        assert!(out.contains("Alice (ID: 42)"));
    }

    #[test]
    fn wait_rounds_up() {
        assert_eq!(format_wait(Duration::from_millis(199_200)), "200s");
        assert_eq!(format_wait(Duration::from_secs(200)), "200s");
    }

    #[test]
    fn interactions_header_counts() {
        let out = format_interactions(&[msg("Alice", "ping", false)]);
        assert!(out.contains("Pending Interactions (1 messages)"));
        assert!(out.contains("  [2024-05-01 12:34] Alice: ping"));
    }
}
