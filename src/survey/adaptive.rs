use tracing::debug;

/// Single-slot mailbox carrying a follow-up prompt from the survey flow to authoring.
///
/// A new request overwrites any pending one.
#[derive(Debug, Clone, Default)]
pub struct SuggestionChannel {
    pending: Option<String>,
}

impl SuggestionChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a prompt, replacing the pending one.
    pub fn request_follow_up(&mut self, prompt: impl Into<String>) {
        if self.pending.is_some() {
            debug!("Overwriting unconsumed follow-up suggestion");
        }
        self.pending = Some(prompt.into());
    }

    /// Read and clear the pending prompt.
    pub fn consume_suggestion(&mut self) -> Option<String> {
        self.pending.take()
    }

    /// Discard the pending prompt.
    pub fn clear_suggestion(&mut self) {
        self.pending = None;
    }

    /// Peek at the pending prompt.
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_returns_once() {
        let mut channel = SuggestionChannel::new();
        channel.request_follow_up("Explore employment stability");
        assert_eq!(
            channel.consume_suggestion().as_deref(),
            Some("Explore employment stability")
        );
        assert_eq!(channel.consume_suggestion(), None);
    }

    #[test]
    fn test_last_write_wins() {
        let mut channel = SuggestionChannel::new();
        channel.request_follow_up("Explore employment stability");
        channel.request_follow_up("Explore income source");
        assert_eq!(channel.pending(), Some("Explore income source"));
        assert_eq!(channel.consume_suggestion().as_deref(), Some("Explore income source"));
        assert!(channel.pending().is_none());
    }

    #[test]
    fn test_clear_discards() {
        let mut channel = SuggestionChannel::new();
        channel.request_follow_up("x");
        channel.clear_suggestion();
        assert_eq!(channel.consume_suggestion(), None);
    }
}
