use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ForgeError, Result};
use crate::storage::{Stores, API_KEY_KEY};

pub const MIN_KEY_LENGTH: usize = 20;

/// Environment variables consulted before any stored key, in priority order.
pub const ENV_VARS: &[&str] = &["GEMINI_API_KEY", "VITE_GEMINI_API_KEY"];

const PLACEHOLDER_KEYS: &[&str] = &[
    "your_api_key_here",
    "coloque_sua_chave_aqui",
    "PLACEHOLDER_API_KEY",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    Environment,
    Session,
    Durable,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CredentialSource::Environment => "environment",
            CredentialSource::Session => "session",
            CredentialSource::Durable => "durable",
        };
        f.write_str(label)
    }
}

/// A validated API key and where it came from. `Debug` never prints the key.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredential {
    key: String,
    pub source: CredentialSource,
}

impl ApiCredential {
    pub fn new(raw: &str, source: CredentialSource) -> Result<Self> {
        Ok(Self {
            key: validate_key(raw)?,
            source,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn masked(&self) -> String {
        mask_key(&self.key)
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("key", &self.masked())
            .field("source", &self.source)
            .finish()
    }
}

/// Trims the key and rejects empty, short or placeholder values.
pub fn validate_key(raw: &str) -> Result<String> {
    let key = raw.trim();
    if key.is_empty() {
        return Err(ForgeError::validation("Enter an API key."));
    }
    if PLACEHOLDER_KEYS.iter().any(|p| p.eq_ignore_ascii_case(key)) {
        return Err(ForgeError::validation(
            "The API key is still the placeholder value; paste your own key.",
        ));
    }
    if key.chars().count() < MIN_KEY_LENGTH {
        return Err(ForgeError::validation(
            "The API key looks invalid; check that you copied the complete key.",
        ));
    }
    Ok(key.to_string())
}

/// `first8...last4`, or `***` for keys too short to mask.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < 12 {
        return "***".to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Reads and writes the stored copies of the credential.
#[derive(Clone)]
pub struct CredentialStore {
    stores: Stores,
    environment_key: Option<String>,
}

impl CredentialStore {
    pub fn new(stores: Stores) -> Self {
        Self {
            stores,
            environment_key: None,
        }
    }

    /// Picks up the first non-empty variable from [`ENV_VARS`].
    pub fn with_process_environment(self) -> Self {
        let key = ENV_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|value| !value.trim().is_empty());
        self.with_environment_key(key)
    }

    pub fn with_environment_key(mut self, key: Option<String>) -> Self {
        self.environment_key = key;
        self
    }

    /// Environment first, then the session slot, then the durable slot.
    ///
    /// Invalid stored values are discarded so they are not offered again.
    pub fn resolve(&self) -> Result<Option<ApiCredential>> {
        if let Some(raw) = &self.environment_key {
            match ApiCredential::new(raw, CredentialSource::Environment) {
                Ok(credential) => return Ok(Some(credential)),
                Err(e) => warn!(error = %e, "ignoring API key from the environment"),
            }
        }

        for (source, store) in [
            (CredentialSource::Session, &self.stores.session),
            (CredentialSource::Durable, &self.stores.durable),
        ] {
            let Some(raw) = store.get(API_KEY_KEY)? else {
                continue;
            };
            match ApiCredential::new(&raw, source) {
                Ok(credential) => {
                    debug!(source = %source, key = %credential.masked(), "resolved stored API key");
                    return Ok(Some(credential));
                }
                Err(e) => {
                    warn!(source = %source, error = %e, "discarding invalid stored API key");
                    store.remove(API_KEY_KEY)?;
                }
            }
        }
        Ok(None)
    }

    /// Validates and stores the key in the session slot; `remember` decides the durable slot.
    pub fn store(&self, raw: &str, remember: bool) -> Result<ApiCredential> {
        let key = validate_key(raw)?;
        self.stores.session.set(API_KEY_KEY, &key)?;
        if remember {
            self.stores.durable.set(API_KEY_KEY, &key)?;
        } else {
            self.stores.durable.remove(API_KEY_KEY)?;
        }
        let source = if remember {
            CredentialSource::Durable
        } else {
            CredentialSource::Session
        };
        Ok(ApiCredential { key, source })
    }

    pub fn clear(&self) -> Result<()> {
        self.stores.session.remove(API_KEY_KEY)?;
        self.stores.durable.remove(API_KEY_KEY)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::KeyValueStore;

    const KEY: &str = "AIzaSyA-test-key-0123456789";

    #[test]
    fn validate_rejects_short_and_placeholder_keys() {
        assert!(validate_key("short").is_err());
        assert!(validate_key("   ").is_err());
        assert!(validate_key("your_api_key_here").is_err());
        assert_eq!(validate_key(&format!("  {KEY} ")).unwrap(), KEY);
    }

    #[test]
    fn mask_keeps_prefix_and_suffix_only() {
        assert_eq!(mask_key(KEY), "AIzaSyA-...6789");
        assert_eq!(mask_key("abc"), "***");
    }

    #[test]
    fn debug_output_masks_key() {
        let credential = ApiCredential::new(KEY, CredentialSource::Session).unwrap();
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains(KEY));
        assert!(rendered.contains("AIzaSyA-...6789"));
    }

    #[test]
    fn resolve_prefers_environment_then_session_then_durable() {
        let stores = Stores::in_memory();
        stores.durable.set(API_KEY_KEY, "durable-key-0123456789abc").unwrap();
        let creds = CredentialStore::new(stores.clone());
        assert_eq!(
            creds.resolve().unwrap().map(|c| c.source),
            Some(CredentialSource::Durable)
        );

        stores.session.set(API_KEY_KEY, "session-key-0123456789abc").unwrap();
        assert_eq!(
            creds.resolve().unwrap().map(|c| c.source),
            Some(CredentialSource::Session)
        );

        let creds = creds.with_environment_key(Some(KEY.to_string()));
        let resolved = creds.resolve().unwrap().unwrap();
        assert_eq!(resolved.source, CredentialSource::Environment);
        assert_eq!(resolved.key(), KEY);
    }

    #[test]
    fn invalid_environment_key_falls_through_to_storage() {
        let stores = Stores::in_memory();
        stores.session.set(API_KEY_KEY, KEY).unwrap();
        let creds = CredentialStore::new(stores).with_environment_key(Some("tiny".into()));
        assert_eq!(
            creds.resolve().unwrap().map(|c| c.source),
            Some(CredentialSource::Session)
        );
    }

    #[test]
    fn invalid_stored_key_is_discarded() {
        let stores = Stores::in_memory();
        stores.durable.set(API_KEY_KEY, "nope").unwrap();
        let creds = CredentialStore::new(stores.clone());
        assert!(creds.resolve().unwrap().is_none());
        assert_eq!(stores.durable.get(API_KEY_KEY).unwrap(), None);
    }

    #[test]
    fn store_without_remember_clears_durable_copy() {
        let stores = Stores::in_memory();
        stores.durable.set(API_KEY_KEY, "old-durable-key-0123456789").unwrap();
        let creds = CredentialStore::new(stores.clone());

        let stored = creds.store(KEY, false).unwrap();
        assert_eq!(stored.source, CredentialSource::Session);
        assert_eq!(stores.session.get(API_KEY_KEY).unwrap().as_deref(), Some(KEY));
        assert_eq!(stores.durable.get(API_KEY_KEY).unwrap(), None);

        creds.store(KEY, true).unwrap();
        assert_eq!(stores.durable.get(API_KEY_KEY).unwrap().as_deref(), Some(KEY));

        creds.clear().unwrap();
        assert!(creds.resolve().unwrap().is_none());
    }

    #[test]
    fn store_rejects_invalid_key_before_writing() {
        let stores = Stores::in_memory();
        let creds = CredentialStore::new(stores.clone());
        assert!(matches!(
            creds.store("short", true),
            Err(ForgeError::Validation(_))
        ));
        assert_eq!(stores.session.get(API_KEY_KEY).unwrap(), None);
    }
}
