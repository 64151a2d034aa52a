//! Credential types.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

/// OAuth credential persisted to the token file.
///
/// Token material is held behind [`SecretString`] so it is zeroized on drop and
/// redacted from `Debug` output; serialization exposes it deliberately, since
/// the whole point of the token file is to survive process restarts.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredential {
    /// Bearer access token.
    #[serde(serialize_with = "expose_secret")]
    pub access_token: SecretString,
    /// Refresh token, absent when the provider did not grant offline access.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "expose_opt_secret"
    )]
    pub refresh_token: Option<SecretString>,
    /// Expiration timestamp (Unix seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    /// Granted scopes.
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl StoredCredential {
    /// Get expiration as DateTime.
    pub fn expires_at_datetime(&self) -> Option<DateTime<Utc>> {
        self.expires_at
            .map(|ts| DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now))
    }

    /// Check if the access token is expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at_datetime()
            .map(|exp| Utc::now() >= exp)
            .unwrap_or(false)
    }

    /// Check if the token needs refresh (within 5 minutes of expiry).
    pub fn needs_refresh(&self) -> bool {
        self.expires_at_datetime()
            .map(|exp| Utc::now() >= exp - Duration::minutes(5))
            .unwrap_or(false)
    }

    /// Bearer value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token.expose_secret())
    }
}

/// Response shape of the OAuth token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Convert into a persistable credential, keeping `previous_refresh` when
    /// the endpoint omitted a refresh token (refresh grants usually do).
    pub fn into_credential(self, previous_refresh: Option<SecretString>) -> StoredCredential {
        StoredCredential {
            access_token: SecretString::from(self.access_token),
            refresh_token: self
                .refresh_token
                .map(SecretString::from)
                .or(previous_refresh),
            expires_at: self
                .expires_in
                .map(|secs| (Utc::now() + Duration::seconds(secs)).timestamp()),
            scopes: self
                .scope
                .map(|s| s.split_whitespace().map(String::from).collect())
                .unwrap_or_default(),
        }
    }
}

fn expose_secret<S: Serializer>(
    value: &SecretString,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(value.expose_secret())
}

fn expose_opt_secret<S: Serializer>(
    value: &Option<SecretString>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(secret) => serializer.serialize_some(secret.expose_secret()),
        None => serializer.serialize_none(),
    }
}
