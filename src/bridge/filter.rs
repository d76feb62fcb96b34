//! Access filter: who may interact, and what to call them.

use agentbridge_core::{AllowList, BridgeConfig, Message};

#[derive(Debug, Clone, Default)]
pub struct AccessFilter {
    allowed: AllowList,
    own_id: Option<String>,
}

impl AccessFilter {
    pub fn new(allowed: AllowList, own_id: Option<String>) -> Self {
        Self { allowed, own_id }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.allowed_users.clone(), config.own_id.clone())
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allowed
    }

    pub fn own_id(&self) -> Option<&str> {
        self.own_id.as_deref()
    }

    /// Empty allow-list permits everyone.
    pub fn is_allowed(&self, author_id: &str) -> bool {
        self.allowed.is_empty() || self.allowed.contains(author_id)
    }

    /// Authored by the bridge itself. Always false without a configured identity.
    pub fn is_own(&self, message: &Message) -> bool {
        self.own_id.as_deref() == Some(message.author.id.as_str())
    }

    pub fn display_label(&self, message: &Message) -> String {
        self.allowed
            .name_of(&message.author.id)
            .unwrap_or_else(|| message.author.display_name())
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentbridge_core::{Author, MessageId};
    use chrono::Utc;

    fn msg(author_id: &str, global_name: Option<&str>) -> Message {
        Message {
            id: MessageId::new("1"),
            author: Author {
                id: author_id.into(),
                username: format!("user{author_id}"),
                global_name: global_name.map(String::from),
                bot: false,
            },
            timestamp: Utc::now(),
            content: "hi".into(),
            message_reference: None,
        }
    }

    #[test]
    fn empty_allow_list_permits_all() {
        let filter = AccessFilter::default();
        assert!(filter.is_allowed("anyone"));
    }

    #[test]
    fn allow_list_gates_membership() {
        let filter = AccessFilter::new(AllowList::parse("42:Alice"), None);
        assert!(filter.is_allowed("42"));
        assert!(!filter.is_allowed("99"));
    }

    #[test]
    fn label_prefers_allow_list_then_global_then_username() {
        let filter = AccessFilter::new(AllowList::parse("42:Alice"), None);
        assert_eq!(filter.display_label(&msg("42", Some("Ally"))), "Alice");
        assert_eq!(filter.display_label(&msg("7", Some("Gus"))), "Gus");
        assert_eq!(filter.display_label(&msg("7", None)), "user7");
    }

    #[test]
    fn own_messages_need_configured_identity() {
        let anonymous = AccessFilter::default();
        assert!(!anonymous.is_own(&msg("7", None)));

        let bridge = AccessFilter::new(AllowList::default(), Some("7".into()));
        assert!(bridge.is_own(&msg("7", None)));
        assert!(!bridge.is_own(&msg("8", None)));
    }
}
