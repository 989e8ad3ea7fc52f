use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

use super::jar::{CookieJar, StoredCookie};

/// Keychain service name used when none is configured
pub const DEFAULT_SERVICE_NAME: &str = "authdeck";

/// Jar backed by the OS keychain. Each cookie is one keychain entry whose
/// secret is the JSON-encoded [`StoredCookie`].
pub struct KeyringJar {
    service: String,
}

impl KeyringJar {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, name: &str) -> Result<Entry> {
        Entry::new(&self.service, name).context("Failed to create keyring entry")
    }
}

impl Default for KeyringJar {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_NAME)
    }
}

impl CookieJar for KeyringJar {
    fn put(&self, cookie: StoredCookie) -> Result<()> {
        let secret = serde_json::to_string(&cookie)?;
        self.entry(&cookie.name)?
            .set_password(&secret)
            .context("Failed to store cookie in keychain")
    }

    fn fetch(&self, name: &str) -> Result<Option<StoredCookie>> {
        let entry = self.entry(name)?;
        let secret = match entry.get_password() {
            Ok(secret) => secret,
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(e) => return Err(e).context("Failed to retrieve cookie from keychain"),
        };
        let cookie: StoredCookie =
            serde_json::from_str(&secret).context("Failed to parse keychain cookie")?;
        if cookie.is_expired() {
            debug!(name, "Dropping expired keychain cookie");
            self.remove(name)?;
            return Ok(None);
        }
        Ok(Some(cookie))
    }

    fn remove(&self, name: &str) -> Result<()> {
        match self.entry(name)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete cookie from keychain"),
        }
    }
}
