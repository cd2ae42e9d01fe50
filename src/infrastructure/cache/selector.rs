//! Chooses and lazily builds the process's single backend handle.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use super::{CacheBackend, MemoryCache, NullCache, RedisCache};
use crate::config::Config;
use crate::error::{CacheError, ConfigurationError};

/// Closed set of backends the selector can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Redis,
    Memory,
    Null,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Redis => "redis",
            Self::Memory => "memory",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigurationError;

    fn from_str(kind: &str) -> Result<Self, Self::Err> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            "null" | "none" => Ok(Self::Null),
            _ => Err(ConfigurationError::UnsupportedBackend {
                kind: kind.to_string(),
            }),
        }
    }
}

/// Lazily constructed, process-wide backend handle.
///
/// The configured kind is only interpreted on the first call to
/// [`current`](Self::current), so an unsupported kind fails there. Building a
/// backend never performs network I/O, so the guarded section stays short.
pub struct BackendSelector {
    kind: String,
    redis_url: Option<String>,
    preset: Option<Arc<dyn CacheBackend>>,
    slot: RwLock<Option<Arc<dyn CacheBackend>>>,
    constructions: AtomicUsize,
}

impl BackendSelector {
    pub fn new(kind: impl Into<String>, redis_url: Option<String>) -> Self {
        Self {
            kind: kind.into(),
            redis_url,
            preset: None,
            slot: RwLock::new(None),
            constructions: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.backend.clone(), config.redis_url.clone())
    }

    /// A selector that always hands out `backend`, including after a reset.
    pub fn with_backend(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            kind: "preset".to_string(),
            redis_url: None,
            slot: RwLock::new(Some(Arc::clone(&backend))),
            preset: Some(backend),
            constructions: AtomicUsize::new(0),
        }
    }

    /// Returns the backend, building it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnsupportedBackend`] for an unknown kind and
    /// [`ConfigurationError::MissingSetting`] when Redis has no URL. A failed
    /// attempt leaves the slot empty, so the next call tries again.
    pub fn current(&self) -> Result<Arc<dyn CacheBackend>, CacheError> {
        if let Some(backend) = self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Ok(Arc::clone(backend));
        }

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(backend) = slot.as_ref() {
            return Ok(Arc::clone(backend));
        }

        let backend = self.build()?;
        self.constructions.fetch_add(1, Ordering::Relaxed);
        *slot = Some(Arc::clone(&backend));
        Ok(backend)
    }

    /// Drops the built backend; the next call builds a fresh one.
    ///
    /// A preset backend is put back instead.
    pub fn reset(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = self.preset.clone();
    }

    /// How many times a backend was built by this selector.
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::Relaxed)
    }

    fn build(&self) -> Result<Arc<dyn CacheBackend>, CacheError> {
        let kind: BackendKind = self.kind.parse()?;

        let backend: Arc<dyn CacheBackend> = match kind {
            BackendKind::Redis => {
                let url = self
                    .redis_url
                    .as_deref()
                    .ok_or(ConfigurationError::MissingSetting {
                        kind: "redis",
                        setting: "REDIS_URL or REDIS_HOST",
                    })?;
                Arc::new(RedisCache::new(url)?)
            }
            BackendKind::Memory => Arc::new(MemoryCache::new()),
            BackendKind::Null => Arc::new(NullCache::new()),
        };

        info!("Cache backend selected: {}", kind);
        Ok(backend)
    }
}
