//! The `pikaramaApi` credential.

use std::collections::HashMap;

use crate::error::{PikaramaError, Result};

pub const DEFAULT_BASE_URL: &str = "https://www.pikarama.com";

/// Secret field names as stored by the host.
pub const API_TOKEN: &str = "apiToken";
pub const BASE_URL: &str = "baseUrl";
pub const WEBHOOK_SECRET: &str = "webhookSecret";

/// Access grant to the Pikarama API. Read-only to the nodes.
#[derive(Clone, PartialEq, Eq)]
pub struct PikaramaCredentials {
    pub api_token: String,
    pub base_url: String,
    /// Fallback signing secret, used only when no per-registration secret
    /// was persisted.
    pub webhook_secret: Option<String>,
}

impl std::fmt::Debug for PikaramaCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PikaramaCredentials")
            .field("base_url", &self.base_url)
            .field("api_token", &"<redacted>")
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl PikaramaCredentials {
    pub fn new(api_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: base_url.into(),
            webhook_secret: None,
        }
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = Some(secret.into()).filter(|s: &String| !s.is_empty());
        self
    }

    /// Build from the decrypted secrets the host passes to a node.
    pub fn from_secrets(secrets: &HashMap<String, String>) -> Result<Self> {
        let non_empty = |key: &str| secrets.get(key).filter(|v| !v.is_empty()).cloned();

        let api_token = non_empty(API_TOKEN).ok_or(PikaramaError::MissingCredential(API_TOKEN))?;
        let base_url = non_empty(BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());

        Ok(Self {
            api_token,
            base_url,
            webhook_secret: non_empty(WEBHOOK_SECRET),
        })
    }

    /// Inverse of [`from_secrets`](Self::from_secrets).
    pub fn to_secrets(&self) -> HashMap<String, String> {
        let mut secrets = HashMap::from([
            (API_TOKEN.to_owned(), self.api_token.clone()),
            (BASE_URL.to_owned(), self.base_url.clone()),
        ]);
        if let Some(secret) = &self.webhook_secret {
            secrets.insert(WEBHOOK_SECRET.to_owned(), secret.clone());
        }
        secrets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_defaults_when_absent() {
        let secrets = HashMap::from([(API_TOKEN.to_owned(), "tok".to_owned())]);
        let creds = PikaramaCredentials::from_secrets(&secrets).unwrap();
        assert_eq!(creds.base_url, DEFAULT_BASE_URL);
        assert_eq!(creds.webhook_secret, None);
    }

    #[test]
    fn empty_token_is_missing() {
        let secrets = HashMap::from([(API_TOKEN.to_owned(), String::new())]);
        assert!(matches!(
            PikaramaCredentials::from_secrets(&secrets),
            Err(PikaramaError::MissingCredential("apiToken"))
        ));
    }

    #[test]
    fn empty_webhook_secret_is_absent() {
        let creds = PikaramaCredentials::new("tok", DEFAULT_BASE_URL).with_webhook_secret("");
        assert_eq!(creds.webhook_secret, None);

        let secrets = creds.with_webhook_secret("fallback").to_secrets();
        let back = PikaramaCredentials::from_secrets(&secrets).unwrap();
        assert_eq!(back.webhook_secret.as_deref(), Some("fallback"));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let creds = PikaramaCredentials::new("tok-123", DEFAULT_BASE_URL).with_webhook_secret("s");
        let shown = format!("{creds:?}");
        assert!(!shown.contains("tok-123"));
    }
}
