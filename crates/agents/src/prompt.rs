//! Prompt text for the non-conversational generation calls.

/// Prompt used for a spontaneous message in an idle channel.
pub const DEFAULT_PROACTIVE_PROMPT: &str = "\
The chat has been quiet for a while. Start a new conversation with a short, \
casual message: share a fun thought, ask the channel a light question, or \
mention something cat-related. One or two sentences, no greeting like \
\"hello everyone\".";

/// Prompt used to greet a member who just joined. `{name}` is replaced by the
/// member's display name.
pub const DEFAULT_WELCOME_PROMPT: &str = "\
{name} just joined the server. Write a short, warm welcome for them in one or \
two sentences and mention them by name.";

/// Proactive prompt, honouring a configured override.
pub fn proactive_prompt(custom: Option<&str>) -> String {
    custom
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PROACTIVE_PROMPT)
        .to_string()
}

/// Welcome prompt for `name`, honouring a configured override.
pub fn welcome_prompt(custom: Option<&str>, name: &str) -> String {
    custom
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_WELCOME_PROMPT)
        .replace("{name}", name)
}

/// Ask the model for one emoji that fits `content`.
pub fn emoji_prompt(content: &str) -> String {
    format!(
        "Reply with exactly one emoji that best represents the following message, \
         and nothing else.\n\nMessage: {content}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proactive_uses_default_when_unset_or_blank() {
        assert_eq!(proactive_prompt(None), DEFAULT_PROACTIVE_PROMPT);
        assert_eq!(proactive_prompt(Some("   ")), DEFAULT_PROACTIVE_PROMPT);
        assert_eq!(proactive_prompt(Some(" say hi ")), "say hi");
    }

    #[test]
    fn welcome_substitutes_name() {
        let p = welcome_prompt(None, "Mochi");
        assert!(p.starts_with("Mochi just joined"));
        assert_eq!(welcome_prompt(Some("hi {name}!"), "Tom"), "hi Tom!");
    }

    #[test]
    fn emoji_prompt_embeds_message() {
        let p = emoji_prompt("I love pizza");
        assert!(p.ends_with("Message: I love pizza"));
        assert!(p.contains("exactly one emoji"));
    }
}
