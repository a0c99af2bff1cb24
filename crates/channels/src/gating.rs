//! Channel-name gating for spontaneous messages.

use ekitten_common::types::{Community, TextChannel};

/// Whether `name` matches `pattern`, case-insensitively.
///
/// `*` matches any run of characters; a pattern without `*` must match the
/// whole name. `"*general*"` therefore selects every channel whose name
/// contains "general".
pub fn matches_channel_pattern(name: &str, pattern: &str) -> bool {
    glob_match(&pattern.to_lowercase(), &name.to_lowercase())
}

/// Channels of `community` whose name matches `pattern`, in display order.
pub fn candidate_channels<'a>(community: &'a Community, pattern: &str) -> Vec<&'a TextChannel> {
    community
        .channels
        .iter()
        .filter(|c| matches_channel_pattern(&c.name, pattern))
        .collect()
}

fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    let [first, middle @ .., last] = parts.as_slice() else {
        return pattern == text;
    };

    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };
    for part in middle {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}
