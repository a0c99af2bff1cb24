/// Replace `${ENV_VAR}` placeholders in raw config text before parsing, so
/// secrets such as `${DISCORD_TOKEN}` never need to live in the file.
///
/// Unresolvable variables are left as-is.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Same as [`substitute_env`] with an injectable lookup, so tests never touch
/// the process environment.
fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated: keep the remainder verbatim.
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match (!name.is_empty()).then(|| lookup(name)).flatten() {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_var() {
        let lookup = |name: &str| match name {
            "EKITTEN_TEST_VAR" => Some("hello".to_string()),
            _ => None,
        };
        assert_eq!(
            substitute_env_with("key=${EKITTEN_TEST_VAR}", lookup),
            "key=hello"
        );
    }

    #[test]
    fn leaves_unknown_var() {
        let lookup = |_: &str| None;
        assert_eq!(
            substitute_env_with("${EKITTEN_NONEXISTENT_XYZ}", lookup),
            "${EKITTEN_NONEXISTENT_XYZ}"
        );
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        let lookup = |_: &str| Some("x".to_string());
        assert_eq!(
            substitute_env_with("token = \"${DISCORD_TOKEN", lookup),
            "token = \"${DISCORD_TOKEN"
        );
    }

    #[test]
    fn substitutes_inside_toml_string() {
        let lookup = |name: &str| (name == "GEMINI_API_KEY").then(|| "k-123".to_string());
        assert_eq!(
            substitute_env_with("api_key = \"${GEMINI_API_KEY}\"", lookup),
            "api_key = \"k-123\""
        );
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain text"), "plain text");
    }
}
