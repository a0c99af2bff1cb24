//! Parsers for model output: identity-leak prefixes, signatures, and the
//! inline media directive.

use regex::Regex;

use crate::error::Result;

/// Strips the bot's own name when the model echoes it back, e.g.
/// `"e-kitten: e-kitten: hi - kitten"` becomes `"hi"`.
#[derive(Debug, Clone)]
pub struct IdentityStripper {
    prefix: Option<Regex>,
    signature: Option<Regex>,
}

impl IdentityStripper {
    pub fn new<S: AsRef<str>>(aliases: &[S]) -> Result<Self> {
        let mut names: Vec<String> = aliases
            .iter()
            .map(|a| a.as_ref().trim())
            .filter(|a| !a.is_empty())
            .map(regex::escape)
            .collect();
        if names.is_empty() {
            return Ok(Self {
                prefix: None,
                signature: None,
            });
        }
        // Longest first so "e-kitten" wins over "kitten".
        names.sort_by_key(|n| std::cmp::Reverse(n.len()));
        let alternation = names.join("|");
        Ok(Self {
            prefix: Some(Regex::new(&format!(r"(?i)^\s*(?:{alternation})\s*:\s*"))?),
            signature: Some(Regex::new(&format!(
                r"(?i)(?:^|\s)[-~]\s*(?:{alternation})\s*$"
            ))?),
        })
    }

    /// Remove every leading `"<alias>:"`, then one trailing signature.
    pub fn strip(&self, text: &str) -> String {
        let mut text = text.trim();
        if let Some(prefix) = &self.prefix {
            while let Some(m) = prefix.find(text) {
                text = &text[m.end()..];
            }
        }
        if let Some(signature) = &self.signature
            && let Some(m) = signature.find(text)
        {
            text = &text[..m.start()];
        }
        text.trim().to_string()
    }
}

/// Finds `KEYWORD: "term"` or `KEYWORD: term until end of line`.
#[derive(Debug, Clone)]
pub struct MediaDirective {
    pattern: Regex,
}

impl MediaDirective {
    pub fn new(keyword: &str) -> Result<Self> {
        let keyword = regex::escape(keyword.trim());
        let pattern = Regex::new(&format!(
            r#"(?i)\b{keyword}\s*:[ \t]*(?:"([^"\n]*)"|([^\n]*))"#
        ))?;
        Ok(Self { pattern })
    }

    /// Remove the first directive from `text`. Returns the remaining text and
    /// the search term, which is `None` when the directive was blank.
    pub fn extract(&self, text: &str) -> (String, Option<String>) {
        let Some(caps) = self.pattern.captures(text) else {
            return (text.trim().to_string(), None);
        };
        let term = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().trim().to_string())
            .filter(|t| !t.is_empty());
        let Some(whole) = caps.get(0) else {
            return (text.trim().to_string(), term);
        };
        let remaining = format!("{}{}", &text[..whole.start()], &text[whole.end()..]);
        (collapse_blank_lines(remaining.trim()), term)
    }
}

/// Directive removal can leave a run of empty lines behind.
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.split('\n') {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line.trim_end());
    }
    out
}
