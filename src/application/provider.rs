//! Entry point handing out one instance per service type.
//!
//! ```ignore
//! let provider = CacheProvider::new(Config::from_env()?);
//! let prices = provider.get_singleton::<PriceService>()?;
//! let price = prices.price(42).await?;
//! ```
//!
//! Most processes use the global provider instead, configured from the
//! environment on first use:
//!
//! ```ignore
//! let prices = cache_provider::get_singleton::<PriceService>()?;
//! ```

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::application::diagnostics::{WrappingReport, write_report};
use crate::application::interceptor::CacheProxy;
use crate::application::registry::{ServiceClass, SingletonRegistry};
use crate::application::validator::{MethodTable, has_cache_method, scan};
use crate::config::{Config, load_from_env};
use crate::error::{CacheError, ConfigurationError};
use crate::infrastructure::cache::{BackendSelector, CacheBackend};

/// Registry of service singletons sharing one backend and configuration.
pub struct CacheProvider {
    config: Arc<Config>,
    backend: Arc<BackendSelector>,
    registry: SingletonRegistry,
}

impl CacheProvider {
    /// Provider whose backend is chosen from `config` at first use.
    pub fn new(config: Config) -> Self {
        let backend = Arc::new(BackendSelector::from_config(&config));
        Self::with_selector(config, backend)
    }

    /// Provider that stores every value in `backend`.
    pub fn with_backend(config: Config, backend: Arc<dyn CacheBackend>) -> Self {
        Self::with_selector(config, Arc::new(BackendSelector::with_backend(backend)))
    }

    fn with_selector(config: Config, backend: Arc<BackendSelector>) -> Self {
        Self {
            config: Arc::new(config),
            backend,
            registry: SingletonRegistry::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &Arc<BackendSelector> {
        &self.backend
    }

    /// Returns the single instance of `C`, building it on first request.
    ///
    /// The first request validates `C`'s declarations, constructs it and wraps
    /// it when at least one method is cacheable. Later requests return the
    /// same `Arc`.
    ///
    /// # Errors
    ///
    /// - [`CacheError::Configuration`] when a declaration breaks the
    ///   eligibility rules
    /// - [`CacheError::Construction`] when `C::construct` fails
    ///
    /// Nothing is registered on failure, so a later request tries again.
    pub fn get_singleton<C: ServiceClass>(&self) -> Result<Arc<C::Interface>, CacheError> {
        self.registry.get_or_build::<C, _>(|| self.build::<C>())
    }

    /// Runs the eligibility validator over `C` without constructing it.
    ///
    /// # Errors
    ///
    /// Returns the first declaration error found.
    pub fn validate<C: ServiceClass>(&self) -> Result<MethodTable, ConfigurationError> {
        scan(
            C::NAME,
            &C::metadata(),
            &self.config.cache_version,
            self.config.validation_mode(),
        )
    }

    /// Whether `C` declares at least one cacheable method.
    ///
    /// # Errors
    ///
    /// Same as [`validate`](Self::validate).
    pub fn has_cache_method<C: ServiceClass>(&self) -> Result<bool, ConfigurationError> {
        has_cache_method(C::NAME, &C::metadata(), self.config.validation_mode())
    }

    /// Forgets every singleton and the backend handle.
    pub fn reset(&self) {
        self.registry.reset();
        self.backend.reset();
        debug!("Cache provider reset");
    }

    fn build<C: ServiceClass>(&self) -> Result<Arc<C::Interface>, CacheError> {
        let table = self.validate::<C>()?;
        let instance = C::construct().map_err(|e| CacheError::construction(C::NAME, e))?;

        if !table.has_cacheable() {
            info!("{} has no cacheable methods, using it as is", C::NAME);
            return Ok(instance.into_plain());
        }

        self.write_diagnostics(C::NAME, &table);
        info!(
            "{} wrapped with {} cached method(s)",
            C::NAME,
            table.len()
        );

        let proxy = CacheProxy::new(
            C::NAME,
            Arc::new(table),
            Arc::clone(&self.backend),
            self.config.get_failure,
        );
        Ok(instance.into_cached(proxy))
    }

    fn write_diagnostics(&self, class: &'static str, table: &MethodTable) {
        if !self.config.strict {
            return;
        }
        let Some(root) = self.config.autogen_path.as_deref() else {
            return;
        };

        let report = WrappingReport::new(
            class,
            &self.config.cache_version,
            self.config.validation_mode(),
            table,
        );
        match write_report(root, &report) {
            Ok(path) => debug!("Wrapping report for {} written to {}", class, path.display()),
            Err(e) => warn!("Failed to write wrapping report for {}: {:#}", class, e),
        }
    }
}

static GLOBAL: OnceCell<CacheProvider> = OnceCell::new();

/// Installs `provider` as the global provider.
///
/// # Errors
///
/// Fails when a global provider already exists.
pub fn install(provider: CacheProvider) -> Result<&'static CacheProvider, ConfigurationError> {
    GLOBAL
        .set(provider)
        .map_err(|_| ConfigurationError::Invalid("global cache provider already installed".into()))?;
    global()
}

/// The global provider, configured from the environment on first use.
///
/// # Errors
///
/// Returns [`ConfigurationError::Invalid`] when the environment holds an
/// unparsable or invalid setting.
pub fn global() -> Result<&'static CacheProvider, ConfigurationError> {
    GLOBAL.get_or_try_init(|| {
        let config =
            load_from_env().map_err(|e| ConfigurationError::Invalid(format!("{e:#}")))?;
        Ok(CacheProvider::new(config))
    })
}

/// [`CacheProvider::get_singleton`] on the global provider.
///
/// # Errors
///
/// See [`CacheProvider::get_singleton`] and [`global`].
pub fn get_singleton<C: ServiceClass>() -> Result<Arc<C::Interface>, CacheError> {
    global()?.get_singleton::<C>()
}

/// [`CacheProvider::reset`] on the global provider, if one exists.
pub fn reset() {
    if let Some(provider) = GLOBAL.get() {
        provider.reset();
    }
}
