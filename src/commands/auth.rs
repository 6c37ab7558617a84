//! Authentication command handlers for the OAuth flow.
//!
//! - `ledger auth` runs the OAuth consent flow
//! - `ledger auth --verify` verifies and refreshes the stored tokens

use crate::api::TokenProvider;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;

/// Handles the `ledger auth` command by running the OAuth consent flow.
///
/// This is the only command that asks the user to open a browser. It:
/// 1. Loads the OAuth client credentials from the secrets directory
/// 2. Prints the consent URL and waits for Google to redirect back to a local port
/// 3. Saves tokens to `token.json` with the required scopes
///
/// # Errors
/// Returns an error if the OAuth flow fails or if the client secret file is missing.
pub async fn auth(config: &Config) -> Result<Out<()>> {
    let _ = TokenProvider::initialize(config.client_secret_path(), config.token_path())
        .await
        .pub_result(ErrorType::Auth)?;
    Ok("Authorization complete".into())
}

/// Handles the `ledger auth --verify` command.
///
/// This command never starts the consent flow. It loads the stored tokens, checks their scopes and
/// refreshes the access token. If the tokens are missing or invalid it fails with a message
/// telling the user to run `ledger auth`.
pub async fn auth_verify(config: &Config) -> Result<Out<()>> {
    let mut token_provider = TokenProvider::load(config.client_secret_path(), config.token_path())
        .await
        .context(
            "Unable to use the existing tokens found in the token JSON file. \n\n\
            You should run 'ledger auth' (without the --verify flag).",
        )
        .pub_result(ErrorType::Auth)?;
    token_provider
        .refresh()
        .await
        .context("Unable to refresh the token")
        .pub_result(ErrorType::Auth)?;
    Ok("Your OAuth token is valid!".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_type;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_verify_without_token() {
        let env = TestEnv::new().await;
        let e = auth_verify(&env.config()).await.unwrap_err();
        assert_eq!(error_type(&e), Some(ErrorType::Auth));
        assert!(format!("{e:#}").contains("ledger auth"));
    }
}
