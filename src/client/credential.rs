//! API key resolution
//!
//! The key is looked up once per process, on the first request that needs it,
//! and reused for every request after that. Concurrent first requests share a
//! single lookup.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::debug;
use tokio::sync::OnceCell;

use crate::error::{ConfigError, Result};

/// Where an API key may come from, tried in order
#[derive(Debug, Clone)]
pub enum KeySource {
    /// Environment variable
    Env(String),
    /// Secret file mounted by an external secret store
    File(PathBuf),
    /// Key written directly in the config file
    Inline(String),
}

/// Lazily resolved, immutable API credential
pub struct Credential {
    sources: Vec<KeySource>,
    key: OnceCell<String>,
    loads: AtomicUsize,
}

impl Credential {
    pub fn new(sources: Vec<KeySource>) -> Self {
        Self {
            sources,
            key: OnceCell::new(),
            loads: AtomicUsize::new(0),
        }
    }

    /// A credential with a known key
    #[cfg(test)]
    pub fn fixed(key: impl Into<String>) -> Self {
        Self::new(vec![KeySource::Inline(key.into())])
    }

    /// Get the API key, resolving it on first use
    pub async fn get(&self) -> Result<&str> {
        let key = self.key.get_or_try_init(|| self.resolve()).await?;
        Ok(key.as_str())
    }

    /// Number of times the sources were actually read
    #[cfg(test)]
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    async fn resolve(&self) -> Result<String> {
        self.loads.fetch_add(1, Ordering::SeqCst);

        for source in &self.sources {
            let value = match source {
                KeySource::Env(name) => std::env::var(name).ok(),
                KeySource::File(path) => match tokio::fs::read_to_string(path).await {
                    Ok(contents) => Some(contents),
                    Err(e) => {
                        debug!("API key file {} unreadable: {}", path.display(), e);
                        None
                    }
                },
                KeySource::Inline(key) => Some(key.clone()),
            };

            if let Some(value) = value {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    debug!("API key resolved from {}", source_kind(source));
                    return Ok(trimmed.to_string());
                }
            }
        }

        Err(ConfigError::MissingApiKey.into())
    }
}

fn source_kind(source: &KeySource) -> &'static str {
    match source {
        KeySource::Env(_) => "environment",
        KeySource::File(_) => "secret file",
        KeySource::Inline(_) => "config file",
    }
}
