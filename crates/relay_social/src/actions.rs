//! Action markup embedded in model replies.
//!
//! A reply may carry directives of the form `[ACTION:type|parameters]`. The
//! type is letters only and case-insensitive; the parameters run to the next
//! `]`.

use regex::Regex;
use std::sync::LazyLock;

static ACTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[ACTION:([a-zA-Z]+)\|([^\]]+)\]").expect("Valid action regex")
});

/// What an action asks the bot to do.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ActionKind {
    /// Change the bot's presence text
    #[display("status")]
    Status,
    /// Add one reaction to the triggering message
    #[display("react")]
    React,
    /// Suppress the text reply
    #[display("silence")]
    Silence,
    /// Format the reply (code, bold, italic, quote)
    #[display("format")]
    Format,
    /// Add several reactions in order
    #[display("reactions")]
    Reactions,
    /// Delete the bot's previous message
    #[display("delete")]
    Delete,
    /// Pin the reply once sent
    #[display("pin")]
    Pin,
    /// Upload a generated file
    #[display("file")]
    File,
    /// Any other type, ignored
    #[display("{_0}")]
    Unknown(String),
}

impl ActionKind {
    /// Parse a type name, ignoring case.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "status" => ActionKind::Status,
            "react" => ActionKind::React,
            "silence" => ActionKind::Silence,
            "format" => ActionKind::Format,
            "reactions" => ActionKind::Reactions,
            "delete" => ActionKind::Delete,
            "pin" => ActionKind::Pin,
            "file" => ActionKind::File,
            other => ActionKind::Unknown(other.to_string()),
        }
    }
}

/// One parsed directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// Directive type
    pub kind: ActionKind,
    /// Raw parameter text
    pub parameters: String,
}

impl Action {
    /// Create an action.
    pub fn new(kind: ActionKind, parameters: impl Into<String>) -> Self {
        Self {
            kind,
            parameters: parameters.into(),
        }
    }
}

/// Extract actions in order of appearance and return them with the reply
/// text stripped of all markup and trimmed.
///
/// # Example
///
/// ```
/// use relay_social::{ActionKind, parse_actions};
///
/// let (actions, text) = parse_actions("[ACTION:react|👍] Sounds good!");
/// assert_eq!(actions[0].kind, ActionKind::React);
/// assert_eq!(actions[0].parameters, "👍");
/// assert_eq!(text, "Sounds good!");
/// ```
pub fn parse_actions(content: &str) -> (Vec<Action>, String) {
    let actions = ACTION_PATTERN
        .captures_iter(content)
        .map(|caps| Action::new(ActionKind::parse(&caps[1]), &caps[2]))
        .inspect(|action| {
            tracing::debug!(kind = %action.kind, params = %action.parameters, "Parsed action");
        })
        .collect();
    let clean = ACTION_PATTERN.replace_all(content, "").trim().to_string();
    (actions, clean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_actions_in_order() {
        let (actions, text) = parse_actions(
            "[ACTION:status|Helping]\n[ACTION:REACT|💻]\nHere you go.\n[ACTION:pin|keep]",
        );
        let kinds: Vec<_> = actions.iter().map(|a| a.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![ActionKind::Status, ActionKind::React, ActionKind::Pin]
        );
        assert_eq!(text, "Here you go.");
    }

    #[test]
    fn test_parameters_keep_inner_separators() {
        let (actions, _) = parse_actions("[ACTION:reactions|1️⃣|2️⃣|3️⃣]");
        assert_eq!(actions[0].parameters, "1️⃣|2️⃣|3️⃣");
    }

    #[test]
    fn test_unknown_type_is_preserved() {
        let (actions, text) = parse_actions("[ACTION:dance|wildly]ok");
        assert_eq!(actions[0].kind, ActionKind::Unknown("dance".to_string()));
        assert_eq!(text, "ok");
    }

    #[test]
    fn test_incomplete_markup_is_left_alone() {
        let (actions, text) = parse_actions("[ACTION:react] and [ACTION:|x]");
        assert!(actions.is_empty());
        assert_eq!(text, "[ACTION:react] and [ACTION:|x]");
    }

    #[test]
    fn test_plain_text() {
        let (actions, text) = parse_actions("  just words  ");
        assert!(actions.is_empty());
        assert_eq!(text, "just words");
    }
}
