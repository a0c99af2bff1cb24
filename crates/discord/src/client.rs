use {
    secrecy::{ExposeSecret, Secret},
    serenity::{Client, utils::validate_token},
};

use crate::{
    error::{Context, Result},
    handler::DiscordHandler,
};

/// Reject tokens that cannot be a bot token before opening a gateway session.
pub fn check_token(token: &str) -> Result<()> {
    validate_token(token).context("malformed discord token")
}

/// Build a gateway client for `handler`. The caller drives it with
/// [`Client::start`].
pub async fn build_client(token: &Secret<String>, handler: DiscordHandler) -> Result<Client> {
    check_token(token.expose_secret())?;
    let client = Client::builder(token.expose_secret(), DiscordHandler::intents())
        .event_handler(handler)
        .await?;
    Ok(client)
}
