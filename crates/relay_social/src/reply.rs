//! Turning a cleaned model reply plus its actions into what gets sent.

use crate::{Action, ActionKind};
use tracing::debug;

/// Longest message the platform accepts.
pub const MESSAGE_LIMIT: usize = 2000;

/// Target length of each part when a reply must be split.
pub const SPLIT_TARGET: usize = 1900;

/// What to post after a completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyPlan {
    /// Text to send, `None` when nothing should be posted
    pub content: Option<String>,
    /// Pin the sent message
    pub pin: bool,
}

/// Apply `silence`, `format` and `pin` actions to `clean_text`.
///
/// Any `silence` drops the text. The last `format` action wins. Whitespace-only
/// content is never sent.
///
/// # Example
///
/// ```
/// use relay_social::{Action, ActionKind, render_reply};
///
/// let plan = render_reply(
///     "ignored",
///     &[Action::new(ActionKind::Format, "bold|Important"), Action::new(ActionKind::Pin, "yes")],
/// );
/// assert_eq!(plan.content.as_deref(), Some("**Important**"));
/// assert!(plan.pin);
/// ```
pub fn render_reply(clean_text: &str, actions: &[Action]) -> ReplyPlan {
    let silenced = actions.iter().any(|a| a.kind == ActionKind::Silence);
    let mut content = if silenced {
        String::new()
    } else {
        clean_text.to_string()
    };
    let mut pin = false;

    for action in actions {
        match action.kind {
            ActionKind::Format => {
                if let Some(formatted) = apply_format(&action.parameters) {
                    content = formatted;
                }
            }
            ActionKind::Pin => pin = true,
            _ => {}
        }
    }

    let content = (!content.trim().is_empty()).then_some(content);
    ReplyPlan { content, pin }
}

/// Render `kind|content` format parameters.
///
/// Code accepts both `code|lang|source` and `code:lang|source`.
fn apply_format(parameters: &str) -> Option<String> {
    let (kind, body) = parameters.split_once('|')?;
    let formatted = match kind.trim() {
        "code" => {
            let (language, code) = body.split_once('|')?;
            fenced(language, code)
        }
        kind if kind.starts_with("code:") => fenced(&kind["code:".len()..], body),
        "bold" => format!("**{}**", body),
        "italic" => format!("*{}*", body),
        "quote" => body
            .split('\n')
            .map(|line| format!("> {}", line))
            .collect::<Vec<_>>()
            .join("\n"),
        other => {
            debug!(format = other, "Unsupported format type");
            return None;
        }
    };
    debug!(format = kind, "Applied formatting");
    Some(formatted)
}

fn fenced(language: &str, code: &str) -> String {
    format!("```{}\n{}\n```", language.trim(), code)
}

/// Split `message` into parts no longer than `max_len` bytes.
///
/// Prefers breaking after a newline, then after a space, when one falls in the
/// back half of the part. Never splits inside a UTF-8 character.
pub fn split_message(message: &str, max_len: usize) -> Vec<String> {
    if message.len() <= max_len {
        return vec![message.to_string()];
    }

    let mut parts = Vec::new();
    let mut rest = message;
    while !rest.is_empty() {
        if rest.len() <= max_len {
            parts.push(rest.to_string());
            break;
        }

        let mut cut = max_len.max(1);
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if cut == 0 {
            // a single character wider than max_len
            cut = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }

        let window = &rest[..cut];
        if let Some(i) = window.rfind('\n').filter(|i| *i > max_len / 2) {
            cut = i + 1;
        } else if let Some(i) = window.rfind(' ').filter(|i| *i > max_len / 2) {
            cut = i + 1;
        }

        parts.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(params: &str) -> ReplyPlan {
        render_reply("plain", &[Action::new(ActionKind::Format, params)])
    }

    #[test]
    fn test_plain_reply() {
        let plan = render_reply("hello", &[]);
        assert_eq!(plan.content.as_deref(), Some("hello"));
        assert!(!plan.pin);
    }

    #[test]
    fn test_silence_drops_text() {
        let plan = render_reply("hello", &[Action::new(ActionKind::Silence, "true")]);
        assert_eq!(plan.content, None);
    }

    #[test]
    fn test_code_formats() {
        assert_eq!(
            format("code|rust|fn main() {}").content.as_deref(),
            Some("```rust\nfn main() {}\n```")
        );
        assert_eq!(
            format("code:python|print(1)").content.as_deref(),
            Some("```python\nprint(1)\n```")
        );
    }

    #[test]
    fn test_text_formats() {
        assert_eq!(format("bold|hey").content.as_deref(), Some("**hey**"));
        assert_eq!(format("italic|hey").content.as_deref(), Some("*hey*"));
        assert_eq!(
            format("quote|one\ntwo").content.as_deref(),
            Some("> one\n> two")
        );
    }

    #[test]
    fn test_unknown_format_keeps_text() {
        assert_eq!(format("sparkle|hey").content.as_deref(), Some("plain"));
        assert_eq!(format("bold").content.as_deref(), Some("plain"));
    }

    #[test]
    fn test_last_format_wins() {
        let plan = render_reply(
            "plain",
            &[
                Action::new(ActionKind::Format, "bold|first"),
                Action::new(ActionKind::Format, "italic|second"),
            ],
        );
        assert_eq!(plan.content.as_deref(), Some("*second*"));
    }

    #[test]
    fn test_whitespace_only_is_not_sent() {
        let plan = render_reply("   \n", &[Action::new(ActionKind::Pin, "x")]);
        assert_eq!(plan.content, None);
        assert!(plan.pin);
    }

    #[test]
    fn test_short_message_not_split() {
        assert_eq!(split_message("short", 10), vec!["short"]);
    }

    #[test]
    fn test_split_prefers_newline() {
        let text = "aaaaaaa\nbbbbbbbbbb";
        let parts = split_message(text, 10);
        assert_eq!(parts, vec!["aaaaaaa\n", "bbbbbbbbbb"]);
    }

    #[test]
    fn test_split_prefers_space() {
        let parts = split_message("aaaaaaa bbbbbbbbbb", 10);
        assert_eq!(parts, vec!["aaaaaaa ", "bbbbbbbbbb"]);
    }

    #[test]
    fn test_split_hard_cut_and_reassembly() {
        let text = "x".repeat(4500);
        let parts = split_message(&text, SPLIT_TARGET);
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.len() <= SPLIT_TARGET));
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn test_split_respects_char_boundaries() {
        let text = "é".repeat(10);
        let parts = split_message(&text, 5);
        assert!(parts.iter().all(|p| p.len() <= 5));
        assert_eq!(parts.concat(), text);
    }
}
