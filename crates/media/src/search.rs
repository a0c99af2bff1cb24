use async_trait::async_trait;

/// Looks up a media URL for a search term.
///
/// Never fails outward: no result and lookup errors both yield `None`.
#[async_trait]
pub trait MediaSearch: Send + Sync {
    async fn search(&self, term: &str) -> Option<String>;
}

/// Search that never finds anything. Used when no API key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledMediaSearch;

#[async_trait]
impl MediaSearch for DisabledMediaSearch {
    async fn search(&self, _term: &str) -> Option<String> {
        None
    }
}
