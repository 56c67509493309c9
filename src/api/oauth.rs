//! Service account authentication for the Google Sheets API.
//!
//! The bot runs unattended, so instead of the interactive OAuth consent flow it authenticates as a
//! service account. The spreadsheet has to be shared with the service account's email address.

use crate::api::OAUTH_SCOPES;
use crate::error::LedgerError;
use crate::Result;
use anyhow::Context;
use tracing::{debug, info};
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

/// Hands out access tokens for the service account. The underlying authenticator caches the token
/// and only goes back to Google when it is about to expire.
pub(crate) struct TokenProvider {
    auth: DefaultAuthenticator,
}

impl TokenProvider {
    /// Parses the service account `credentials_json`, builds an authenticator and fetches a first
    /// token so that bad credentials are detected at startup.
    ///
    /// # Errors
    /// - `LedgerError::CredentialParse` if the JSON is not a valid service account key.
    /// - `LedgerError::ClientInit` if the authenticator cannot be built or Google rejects it.
    pub(crate) async fn from_json(credentials_json: &str) -> std::result::Result<Self, LedgerError> {
        let key = parse_key(credentials_json)?;
        info!("Authenticating as service account {}", key.client_email);

        let auth = ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .context("Failed to create the service account authenticator")
            .map_err(LedgerError::ClientInit)?;

        let provider = Self { auth };
        provider
            .token()
            .await
            .context("Google rejected the service account credentials")
            .map_err(LedgerError::ClientInit)?;
        debug!("Initial access token obtained");
        Ok(provider)
    }

    /// Returns a valid access token, refreshing it first if needed.
    pub(crate) async fn token(&self) -> Result<String> {
        let token = self
            .auth
            .token(OAUTH_SCOPES)
            .await
            .context("Failed to get a valid access token")?;
        token
            .token()
            .map(str::to_string)
            .context("The access token returned by Google is empty")
    }
}

fn parse_key(credentials_json: &str) -> std::result::Result<ServiceAccountKey, LedgerError> {
    yup_oauth2::parse_service_account_key(credentials_json).map_err(LedgerError::CredentialParse)
}
