//! System prompt assembly.

use crate::ActionKind;
use std::fmt::Write;

const DEFAULT_PERSONA: &str =
    "You are a helpful Discord bot assistant. You can respond to user queries and perform special actions.";

/// How one action is explained to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDescription {
    /// Action type
    pub kind: ActionKind,
    /// What it does
    pub description: &'static str,
    /// Parameter format
    pub parameters: &'static str,
    /// Example markup
    pub examples: &'static [&'static str],
    /// Known limitations
    pub limitations: &'static str,
    /// Usage advice
    pub best_practices: &'static str,
}

/// Every action the relay can execute, in the order they are documented.
pub fn action_descriptions() -> Vec<ActionDescription> {
    vec![
        ActionDescription {
            kind: ActionKind::Status,
            description: "Changes the bot's status message displayed in Discord.",
            parameters: "A single string representing the status text to display.",
            examples: &[
                "[ACTION:status|Playing chess]",
                "[ACTION:status|Listening to music]",
            ],
            limitations: "Status changes may not be immediately visible to all users.",
            best_practices: "Keep status messages concise and relevant to the conversation.",
        },
        ActionDescription {
            kind: ActionKind::React,
            description: "Adds a single emoji reaction to the user's message.",
            parameters: "A single emoji (Unicode emoji or custom emoji).",
            examples: &["[ACTION:react|👍]", "[ACTION:react|🎉]"],
            limitations: "Custom emojis only work if the bot can see the server they belong to.",
            best_practices: "Use reactions to acknowledge a message without a long reply.",
        },
        ActionDescription {
            kind: ActionKind::Silence,
            description: "Suppresses the text reply entirely.",
            parameters: "Any text, for example a short reason.",
            examples: &["[ACTION:silence|not addressed to me]"],
            limitations: "Other actions in the same reply still run.",
            best_practices: "Use when a message in an ongoing conversation needs no answer.",
        },
        ActionDescription {
            kind: ActionKind::Format,
            description: "Applies special formatting to the bot's message.",
            parameters: "Format type and content separated by '|'. Types: code, bold, italic, quote. Code takes a language: code:language|source.",
            examples: &[
                "[ACTION:format|code:python|print(\"Hello World\")]",
                "[ACTION:format|bold|Important information]",
                "[ACTION:format|italic|Emphasized text]",
                "[ACTION:format|quote|This is a quote]",
            ],
            limitations: "Formats cannot be combined and the formatted content replaces the reply text.",
            best_practices: "Use code formatting when sharing code snippets.",
        },
        ActionDescription {
            kind: ActionKind::Reactions,
            description: "Adds multiple emoji reactions in sequence to the user's message.",
            parameters: "Multiple emojis separated by '|'.",
            examples: &["[ACTION:reactions|👍|❤️|🎉]", "[ACTION:reactions|1️⃣|2️⃣|3️⃣]"],
            limitations: "Reactions are added slowly to stay under platform rate limits.",
            best_practices: "Use for simple polls or a sequence of emotions.",
        },
        ActionDescription {
            kind: ActionKind::Delete,
            description: "Deletes the bot's previous message in the channel.",
            parameters: "The word 'previous'.",
            examples: &["[ACTION:delete|previous]"],
            limitations: "Only the most recent of the bot's last few messages can be deleted.",
            best_practices: "Use to retract a mistaken answer.",
        },
        ActionDescription {
            kind: ActionKind::Pin,
            description: "Pins the reply once it has been sent.",
            parameters: "Any text, for example why the message matters.",
            examples: &["[ACTION:pin|Important code example]"],
            limitations: "Requires the Manage Messages permission.",
            best_practices: "Reserve pins for information the channel will need again.",
        },
        ActionDescription {
            kind: ActionKind::File,
            description: "Uploads a generated text file to the channel.",
            parameters: "File name and file content separated by '|'.",
            examples: &["[ACTION:file|notes.md|# Meeting notes]"],
            limitations: "Content cannot contain ']'.",
            best_practices: "Use for output too long or structured for a chat message.",
        },
    ]
}

/// Build the system prompt: the base persona followed by action instructions.
///
/// An empty `base` falls back to a generic assistant persona.
///
/// # Example
///
/// ```
/// use relay_social::generate_system_prompt;
///
/// let prompt = generate_system_prompt("You are Bender.");
/// assert!(prompt.starts_with("You are Bender."));
/// assert!(prompt.contains("# SPECIAL ACTIONS"));
/// ```
pub fn generate_system_prompt(base: &str) -> String {
    let mut sb = String::new();

    let base = base.trim();
    sb.push_str(if base.is_empty() { DEFAULT_PERSONA } else { base });
    sb.push_str("\n\n");

    sb.push_str("# SPECIAL ACTIONS\n\n");
    sb.push_str(
        "You can perform special actions by including action markup in your responses using this format:\n",
    );
    sb.push_str("```\n[ACTION:action_type|action_parameters]\n```\n\n");
    sb.push_str(
        "Always include a normal text response along with any actions to explain what you're doing.\n\n",
    );

    sb.push_str("## Available Actions\n\n");
    for action in action_descriptions() {
        let _ = writeln!(sb, "### {}", action.kind.to_string().to_uppercase());
        let _ = writeln!(sb, "**Description:** {}\n", action.description);
        let _ = writeln!(sb, "**Parameters:** {}\n", action.parameters);
        sb.push_str("**Examples:**\n");
        for example in action.examples {
            let _ = writeln!(sb, "```\n{}\n```", example);
        }
        let _ = writeln!(sb, "**Limitations:** {}\n", action.limitations);
        let _ = writeln!(sb, "**Best Practices:** {}\n", action.best_practices);
    }

    sb.push_str("## General Guidelines\n\n");
    sb.push_str("1. **Combine actions with text responses** - Say what the actions are doing.\n");
    sb.push_str("2. **Rate limits** - Use actions sparingly to avoid platform rate limits.\n");
    sb.push_str("3. **Error handling** - A failed action is logged and the remaining actions still run.\n");
    sb.push_str("4. **Permissions** - Some actions need extra permissions in the server.\n\n");

    sb.push_str("## Combined Usage Example\n\n");
    sb.push_str(
        "```\n[ACTION:status|Helping with code]\n[ACTION:react|💻]\nHere's the Python code you requested:\n\n[ACTION:format|code:python|def hello_world():\n    print(\"Hello, World!\")]\n\n[ACTION:pin|Important code example]\n```\n\n",
    );
    sb.push_str(
        "This example changes the bot's status, adds a reaction, formats code, and pins the message.\n",
    );

    sb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_actions;

    #[test]
    fn test_default_persona() {
        let prompt = generate_system_prompt("   ");
        assert!(prompt.starts_with(DEFAULT_PERSONA));
    }

    #[test]
    fn test_every_action_is_documented() {
        let prompt = generate_system_prompt("base");
        for heading in ["STATUS", "REACT", "SILENCE", "FORMAT", "REACTIONS", "DELETE", "PIN", "FILE"] {
            assert!(prompt.contains(&format!("### {}\n", heading)), "missing {}", heading);
        }
    }

    #[test]
    fn test_examples_parse_as_their_action() {
        for description in action_descriptions() {
            for example in description.examples {
                let (actions, _) = parse_actions(example);
                assert_eq!(actions.len(), 1, "{}", example);
                assert_eq!(actions[0].kind, description.kind, "{}", example);
            }
        }
    }
}
