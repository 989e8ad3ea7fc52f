use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A named value with an absolute expiry, as persisted by a [`CookieJar`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl StoredCookie {
    /// Build a cookie that expires `max_age` from now.
    pub fn new(name: impl Into<String>, value: impl Into<String>, max_age: Duration) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires_at: Utc::now() + max_age,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn time_until_expiry(&self) -> Duration {
        self.expires_at - Utc::now()
    }
}

/// Durable key-value slots with expiry.
///
/// Backends enforce expiry themselves: `fetch` never returns an expired
/// cookie, and `remove` on a missing name is not an error.
pub trait CookieJar: Send + Sync {
    fn put(&self, cookie: StoredCookie) -> Result<()>;

    fn fetch(&self, name: &str) -> Result<Option<StoredCookie>>;

    fn remove(&self, name: &str) -> Result<()>;
}

/// Process-local jar. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryJar {
    cookies: Mutex<HashMap<String, StoredCookie>>,
}

impl MemoryJar {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, StoredCookie>>> {
        self.cookies
            .lock()
            .map_err(|_| anyhow!("Cookie jar lock poisoned"))
    }
}

impl CookieJar for MemoryJar {
    fn put(&self, cookie: StoredCookie) -> Result<()> {
        self.lock()?.insert(cookie.name.clone(), cookie);
        Ok(())
    }

    fn fetch(&self, name: &str) -> Result<Option<StoredCookie>> {
        let mut cookies = self.lock()?;
        match cookies.get(name).cloned() {
            Some(cookie) if cookie.is_expired() => {
                cookies.remove(name);
                Ok(None)
            }
            other => Ok(other),
        }
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.lock()?.remove(name);
        Ok(())
    }
}

/// Jar persisted as one JSON file mapping cookie name to cookie.
pub struct FileJar {
    path: PathBuf,
}

impl FileJar {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, StoredCookie>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read cookie file: {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cookie file: {}", self.path.display()))
    }

    fn save(&self, cookies: &HashMap<String, StoredCookie>) -> Result<()> {
        if cookies.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path).with_context(|| {
                    format!("Failed to remove cookie file: {}", self.path.display())
                })?;
            }
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(cookies)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write cookie file: {}", self.path.display()))?;
        Ok(())
    }
}

impl CookieJar for FileJar {
    fn put(&self, cookie: StoredCookie) -> Result<()> {
        let mut cookies = self.load()?;
        cookies.insert(cookie.name.clone(), cookie);
        self.save(&cookies)
    }

    fn fetch(&self, name: &str) -> Result<Option<StoredCookie>> {
        let mut cookies = self.load()?;
        match cookies.remove(name) {
            Some(cookie) if cookie.is_expired() => {
                debug!(name, "Dropping expired cookie");
                self.save(&cookies)?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    fn remove(&self, name: &str) -> Result<()> {
        let mut cookies = self.load()?;
        if cookies.remove(name).is_some() {
            self.save(&cookies)?;
        }
        Ok(())
    }
}
