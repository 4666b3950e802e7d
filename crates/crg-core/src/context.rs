use crate::state::Message;

const GLOBAL_WELCOME: &str = "**Global Intelligence Mode Active.**\n\nI am analyzing worldwide regulatory frameworks (MiCA, SEC, IOSCO). Ask me about global AML trends, cross-border compliance, or international licensing standards.";

const GLOBAL_PLACEHOLDER: &str = "Ask about global crypto regulations, AML compliance, or risk factors...";

/// The scope a conversation runs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatContext {
    Global,
    /// Country mode; `None` until a jurisdiction has been chosen.
    Country(Option<String>),
}

impl Default for ChatContext {
    fn default() -> Self {
        ChatContext::Global
    }
}

impl ChatContext {
    pub fn country(name: impl Into<String>) -> Self {
        ChatContext::Country(Some(name.into()))
    }

    /// Jurisdiction passed to the chat gateway.
    pub fn jurisdiction(&self) -> Option<&str> {
        match self {
            ChatContext::Country(Some(name)) => Some(name),
            _ => None,
        }
    }

    /// True when country mode is active but nothing has been picked yet.
    pub fn needs_country(&self) -> bool {
        matches!(self, ChatContext::Country(None))
    }

    /// Seed message for a fresh conversation in this context.
    pub fn welcome(&self) -> Option<Message> {
        match self {
            ChatContext::Global => Some(Message::model("welcome-global", GLOBAL_WELCOME, Vec::new())),
            ChatContext::Country(Some(name)) => Some(Message::model(
                format!("welcome-{}", name),
                format!(
                    "**Jurisdiction Protocol: {name}**\n\nI have switched context to **{name}**. Ask me about local licensing requirements, specific tax treatments, or registration with local authorities (e.g., Central Bank or Securities Commission)."
                ),
                Vec::new(),
            )),
            ChatContext::Country(None) => None,
        }
    }

    /// Hint shown in the empty input line.
    pub fn placeholder(&self) -> String {
        match self {
            ChatContext::Country(Some(name)) => format!("Ask about {} regulations...", name),
            _ => GLOBAL_PLACEHOLDER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jurisdiction_only_for_selected_country() {
        assert_eq!(ChatContext::Global.jurisdiction(), None);
        assert_eq!(ChatContext::Country(None).jurisdiction(), None);
        assert_eq!(ChatContext::country("Malta").jurisdiction(), Some("Malta"));
    }

    #[test]
    fn test_welcome_mentions_country() {
        let msg = ChatContext::country("Singapore").welcome().unwrap();
        assert_eq!(msg.id, "welcome-Singapore");
        assert!(msg.text_content().contains("Jurisdiction Protocol: Singapore"));
        assert!(msg.text_content().contains("**Singapore**"));
    }

    #[test]
    fn test_no_welcome_without_country() {
        assert!(ChatContext::Country(None).welcome().is_none());
        assert!(ChatContext::Country(None).needs_country());
    }

    #[test]
    fn test_placeholder() {
        assert_eq!(ChatContext::country("Japan").placeholder(), "Ask about Japan regulations...");
        assert!(ChatContext::Global.placeholder().starts_with("Ask about global"));
    }
}
