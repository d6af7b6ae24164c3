//! The transport-agnostic relay pipeline.

use crate::{Action, ActionKind, ChatTransport, MESSAGE_LIMIT, SPLIT_TARGET};
use crate::{generate_system_prompt, parse_actions, render_reply, split_message};
use derive_getters::Getters;
use relay_conversation::ConversationStore;
use relay_core::Role;
use relay_models::{CompletionClient, RetryingCompletion, with_system_prompt};
use relay_rate_limit::ScopedLimiter;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Sent when the channel or the relay as a whole is over its rate limit.
pub const RATE_LIMITED_REPLY: &str =
    "I'm receiving too many messages right now. Please try again later.";

/// Sent when no completion could be obtained.
pub const APOLOGY_REPLY: &str =
    "Sorry, I encountered an error while processing your message. Please try again later.";

/// A message received from the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct InboundMessage {
    /// Channel the message was posted in
    channel_id: String,
    /// Platform id of the message
    message_id: String,
    /// Display name of the author
    author: String,
    /// Text with bot mentions already removed
    content: String,
    /// The message mentioned the bot
    #[builder(default)]
    mentions_bot: bool,
    /// The message started with the command prefix
    #[builder(default)]
    is_command: bool,
}

impl InboundMessage {
    /// Creates a new builder for `InboundMessage`.
    pub fn builder() -> InboundMessageBuilder {
        InboundMessageBuilder::default()
    }

    /// True when the bot was addressed directly.
    pub fn is_addressed(&self) -> bool {
        self.mentions_bot || self.is_command
    }
}

/// What the pipeline did with one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Not addressed to the bot, or empty
    Ignored,
    /// Dropped by admission control
    RateLimited,
    /// No completion could be obtained
    Failed,
    /// A completion was processed; `sent` is the id of the last message
    /// posted, if any text was sent
    Replied {
        /// Id of the last message posted
        sent: Option<String>,
    },
}

/// Pipeline tuning.
#[derive(Debug, Clone, PartialEq, Eq, Getters, derive_setters::Setters)]
#[setters(prefix = "with_", into)]
pub struct RelaySettings {
    /// Prefix that marks a command; stripped before relaying
    command_prefix: String,
    /// A channel the bot replied in this recently is followed without a mention
    engagement: Duration,
    /// Pause between consecutive reactions
    reaction_spacing: Duration,
    /// Base persona for the system prompt
    persona: String,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            command_prefix: "!".to_string(),
            engagement: Duration::from_secs(20 * 60),
            reaction_spacing: Duration::from_millis(300),
            persona: String::new(),
        }
    }
}

/// Remove `<@id>` and `<@!id>` mentions of the bot and trim.
pub fn strip_mentions(content: &str, bot_id: &str) -> String {
    content
        .replace(&format!("<@{}>", bot_id), "")
        .replace(&format!("<@!{}>", bot_id), "")
        .trim()
        .to_string()
}

/// Relays inbound chat messages to the completion endpoint and posts replies.
///
/// Shared by every event task: admission goes through the [`ScopedLimiter`],
/// history through the [`ConversationStore`], and completions through a
/// [`RetryingCompletion`] bound to the shutdown token. Replies can be paced
/// through a second, outbound limiter keyed by channel.
pub struct RelayHandler {
    limiter: Arc<ScopedLimiter>,
    outbound: Option<Arc<ScopedLimiter>>,
    store: Arc<ConversationStore>,
    completion: RetryingCompletion<Arc<dyn CompletionClient>>,
    settings: RelaySettings,
    system_prompt: String,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for RelayHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayHandler")
            .field("settings", &self.settings)
            .field("model", &self.completion.client().model_name())
            .finish_non_exhaustive()
    }
}

impl RelayHandler {
    /// Assemble a handler from its shared components.
    pub fn new(
        limiter: Arc<ScopedLimiter>,
        store: Arc<ConversationStore>,
        completion: RetryingCompletion<Arc<dyn CompletionClient>>,
        settings: RelaySettings,
        shutdown: CancellationToken,
    ) -> Self {
        let system_prompt = generate_system_prompt(settings.persona());
        Self {
            limiter,
            outbound: None,
            store,
            completion,
            settings,
            system_prompt,
            shutdown,
        }
    }

    /// Wait on `limiter` before every message part the relay posts.
    pub fn with_outbound_limiter(mut self, limiter: Arc<ScopedLimiter>) -> Self {
        self.outbound = Some(limiter);
        self
    }

    /// Pipeline settings.
    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// The conversation store.
    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    /// The full system prompt sent ahead of every conversation.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// True when `raw` starts with the command prefix.
    pub fn is_command(&self, raw: &str) -> bool {
        !self.settings.command_prefix.is_empty() && raw.starts_with(&self.settings.command_prefix)
    }

    /// Run one inbound message through the pipeline.
    #[instrument(
        skip(self, inbound, transport),
        fields(channel_id = %inbound.channel_id, author = %inbound.author)
    )]
    pub async fn handle<T>(&self, inbound: &InboundMessage, transport: &T) -> RelayOutcome
    where
        T: ChatTransport + ?Sized,
    {
        let channel = inbound.channel_id.as_str();
        let content = self.clean_content(inbound);
        if content.is_empty() {
            return RelayOutcome::Ignored;
        }

        let addressed = inbound.is_addressed();
        if !addressed && !self.store.engaged_within(channel, self.settings.engagement) {
            debug!("Not addressed and not engaged, ignoring");
            return RelayOutcome::Ignored;
        }

        if !self.limiter.allow(channel) {
            warn!("Rate limit exceeded");
            if addressed {
                if let Err(e) = transport.send_message(channel, RATE_LIMITED_REPLY).await {
                    warn!(error = %e, "Failed to send rate limit notice");
                }
            }
            return RelayOutcome::RateLimited;
        }

        if addressed {
            if let Err(e) = transport.start_typing(channel).await {
                warn!(error = %e, "Failed to set typing indicator");
            }
        }

        info!(content_length = content.len(), "Received message");
        self.store
            .append(channel, Role::User, content, Some(inbound.author.clone()));

        let messages = with_system_prompt(&self.system_prompt, self.store.format_for_api(channel));
        let reply = match self.completion.complete(&messages, &self.shutdown).await {
            Ok(reply) => reply,
            Err(e) if e.is_cancelled() => {
                warn!(error = %e, "Completion cancelled");
                return RelayOutcome::Failed;
            }
            Err(e) => {
                error!(error = %e, "Failed to get completion");
                if let Err(e) = transport.send_message(channel, APOLOGY_REPLY).await {
                    warn!(error = %e, "Failed to send apology");
                }
                return RelayOutcome::Failed;
            }
        };

        let (actions, clean) = parse_actions(&reply);
        self.execute_actions(inbound, &actions, transport).await;
        self.store.append(channel, Role::Assistant, clean.clone(), None);

        let plan = render_reply(&clean, &actions);
        let Some(text) = plan.content else {
            info!("No response content to send");
            return RelayOutcome::Replied { sent: None };
        };

        let sent = self.send_reply(channel, &text, transport).await;
        if plan.pin {
            if let Some(message_id) = &sent {
                match transport.pin_message(channel, message_id).await {
                    Ok(()) => info!(message_id = %message_id, "Pinned message"),
                    Err(e) => warn!(error = %e, message_id = %message_id, "Failed to pin message"),
                }
            }
        }

        info!(
            response_length = clean.len(),
            context_size = self.store.size(channel),
            "Sent response"
        );
        RelayOutcome::Replied { sent }
    }

    fn clean_content(&self, inbound: &InboundMessage) -> String {
        let content = inbound.content.trim();
        let content = if inbound.is_command {
            content
                .strip_prefix(self.settings.command_prefix.as_str())
                .unwrap_or(content)
        } else {
            content
        };
        content.trim().to_string()
    }

    /// Post `text`, split into parts when over the platform limit.
    ///
    /// Each part first waits for an outbound token when a limiter is set.
    async fn send_reply<T>(&self, channel: &str, text: &str, transport: &T) -> Option<String>
    where
        T: ChatTransport + ?Sized,
    {
        let parts = if text.len() > MESSAGE_LIMIT {
            split_message(text, SPLIT_TARGET)
        } else {
            vec![text.to_string()]
        };

        let mut last = None;
        for part in &parts {
            if let Some(outbound) = &self.outbound {
                outbound.wait_and_consume(channel).await;
            }
            match transport.send_message(channel, part).await {
                Ok(id) => last = Some(id),
                Err(e) => {
                    error!(error = %e, "Failed to send response");
                    return None;
                }
            }
        }
        last
    }

    /// Run the side-effect actions. Failures are logged and skipped.
    async fn execute_actions<T>(&self, inbound: &InboundMessage, actions: &[Action], transport: &T)
    where
        T: ChatTransport + ?Sized,
    {
        let channel = inbound.channel_id.as_str();
        let message_id = inbound.message_id.as_str();

        for action in actions {
            info!(kind = %action.kind, params = %action.parameters, "Executing action");
            match &action.kind {
                ActionKind::Status => {
                    if let Err(e) = transport.set_status(&action.parameters).await {
                        warn!(error = %e, "Failed to update status");
                    }
                }
                ActionKind::React => {
                    let emoji = action.parameters.trim();
                    if let Err(e) = transport.add_reaction(channel, message_id, emoji).await {
                        warn!(error = %e, emoji, "Failed to add reaction");
                    }
                }
                ActionKind::Reactions => {
                    let emojis = action
                        .parameters
                        .split('|')
                        .map(str::trim)
                        .filter(|emoji| !emoji.is_empty());
                    for (i, emoji) in emojis.enumerate() {
                        if i > 0 {
                            tokio::time::sleep(self.settings.reaction_spacing).await;
                        }
                        if let Err(e) = transport.add_reaction(channel, message_id, emoji).await {
                            warn!(error = %e, emoji, "Failed to add reaction in sequence");
                        }
                    }
                }
                ActionKind::Delete => {
                    if action.parameters.trim() != "previous" {
                        warn!(params = %action.parameters, "Unsupported delete target");
                        continue;
                    }
                    match transport.delete_previous_bot_message(channel, message_id).await {
                        Ok(Some(deleted)) => info!(message_id = %deleted, "Deleted previous message"),
                        Ok(None) => debug!("No previous message to delete"),
                        Err(e) => warn!(error = %e, "Failed to delete previous message"),
                    }
                }
                ActionKind::File => {
                    let Some((filename, content)) = action.parameters.split_once('|') else {
                        warn!(params = %action.parameters, "Invalid file action format");
                        continue;
                    };
                    let filename = filename.trim();
                    if let Err(e) = transport
                        .send_file(channel, filename, content.as_bytes())
                        .await
                    {
                        warn!(error = %e, filename, "Failed to upload file");
                    }
                }
                ActionKind::Silence | ActionKind::Format | ActionKind::Pin => {
                    debug!("Applied when the reply is rendered");
                }
                ActionKind::Unknown(name) => {
                    warn!(kind = %name, "Unknown action type received");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_mentions() {
        assert_eq!(strip_mentions("<@42> hello <@!42>", "42"), "hello");
        assert_eq!(strip_mentions("<@7> hi", "42"), "<@7> hi");
    }

    #[test]
    fn test_inbound_builder_defaults() {
        let inbound = InboundMessage::builder()
            .channel_id("c")
            .message_id("m")
            .author("fry")
            .content("hi")
            .build()
            .unwrap();
        assert!(!inbound.is_addressed());
    }

    #[test]
    fn test_settings_setters() {
        let settings = RelaySettings::default()
            .with_command_prefix("?")
            .with_reaction_spacing(Duration::ZERO);
        assert_eq!(settings.command_prefix(), "?");
        assert_eq!(*settings.reaction_spacing(), Duration::ZERO);
    }
}
