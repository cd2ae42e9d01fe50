#![allow(dead_code)]

use async_trait::async_trait;
use cache_provider::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts how often the uncached bodies run.
pub static PRICE_CALLS: AtomicUsize = AtomicUsize::new(0);
pub static PRODUCT_CALLS: AtomicUsize = AtomicUsize::new(0);
pub static CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub sku: i32,
    pub name: String,
}

cache_value!(Product => "catalog.product");

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("unknown sku {0}")]
    UnknownSku(i32),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[async_trait]
pub trait PriceLookup: Send + Sync {
    async fn price(&self, sku: i32) -> Result<f64, LookupError>;
    async fn product(&self, sku: i32) -> Result<Option<Product>, LookupError>;
    async fn bulk_total(&self, skus: &[i32]) -> Result<f64, LookupError>;
    fn region(&self) -> String;
}

#[derive(Default)]
pub struct PriceService;

#[async_trait]
impl PriceLookup for PriceService {
    async fn price(&self, sku: i32) -> Result<f64, LookupError> {
        PRICE_CALLS.fetch_add(1, Ordering::SeqCst);
        match sku {
            42 => Ok(9.99),
            0 => Err(LookupError::UnknownSku(sku)),
            _ => Ok(f64::from(sku) / 10.0),
        }
    }

    async fn product(&self, sku: i32) -> Result<Option<Product>, LookupError> {
        PRODUCT_CALLS.fetch_add(1, Ordering::SeqCst);
        Ok((sku > 0).then(|| Product {
            sku,
            name: format!("product-{sku}"),
        }))
    }

    async fn bulk_total(&self, skus: &[i32]) -> Result<f64, LookupError> {
        Ok(skus.iter().map(|sku| f64::from(*sku)).sum())
    }

    fn region(&self) -> String {
        "eu-west".to_string()
    }
}

/// Routes every declared method through the cache.
pub struct CachedPriceService {
    inner: PriceService,
    proxy: CacheProxy,
}

#[async_trait]
impl PriceLookup for CachedPriceService {
    async fn price(&self, sku: i32) -> Result<f64, LookupError> {
        self.proxy
            .invoke("price", cache_args![sku], || self.inner.price(sku))
            .await
    }

    async fn product(&self, sku: i32) -> Result<Option<Product>, LookupError> {
        self.proxy
            .invoke_optional("product", cache_args![sku], || self.inner.product(sku))
            .await
    }

    async fn bulk_total(&self, skus: &[i32]) -> Result<f64, LookupError> {
        self.proxy
            .invoke("bulk_total", cache_args![skus], || self.inner.bulk_total(skus))
            .await
    }

    fn region(&self) -> String {
        self.inner.region()
    }
}

impl ServiceClass for PriceService {
    type Interface = dyn PriceLookup;
    const NAME: &'static str = "PriceService";

    fn metadata() -> ClassMetadata {
        ClassMetadata::new()
            .method(
                MethodSpec::new("price")
                    .returns::<f64>()
                    .param(ParamSpec::normal("sku", ParamType::I32))
                    .cached("price", 60),
            )
            .method(
                MethodSpec::new("product")
                    .returns::<Product>()
                    .param(ParamSpec::normal("sku", ParamType::I32))
                    .cached("product", 300),
            )
            .method(
                MethodSpec::new("bulk_total")
                    .returns::<f64>()
                    .param(ParamSpec::normal("skus", ParamType::array_of(ParamType::I32)))
                    .cached("bulk", 60),
            )
            .method(MethodSpec::new("region").returns::<String>())
    }

    fn construct() -> Result<Self, BoxError> {
        CONSTRUCTIONS.fetch_add(1, Ordering::SeqCst);
        Ok(PriceService)
    }

    fn into_plain(self) -> Arc<dyn PriceLookup> {
        Arc::new(self)
    }

    fn into_cached(self, proxy: CacheProxy) -> Arc<dyn PriceLookup> {
        Arc::new(CachedPriceService { inner: self, proxy })
    }
}

/// A service without cacheable methods.
pub trait Clock: Send + Sync {
    fn zone(&self) -> &'static str;
}

pub struct UtcClock;

impl Clock for UtcClock {
    fn zone(&self) -> &'static str {
        "UTC"
    }
}

impl ServiceClass for UtcClock {
    type Interface = dyn Clock;
    const NAME: &'static str = "UtcClock";

    fn metadata() -> ClassMetadata {
        ClassMetadata::new().method(MethodSpec::new("zone").returns::<String>())
    }

    fn construct() -> Result<Self, BoxError> {
        Ok(UtcClock)
    }

    fn into_plain(self) -> Arc<dyn Clock> {
        Arc::new(self)
    }

    fn into_cached(self, _proxy: CacheProxy) -> Arc<dyn Clock> {
        Arc::new(self)
    }
}

/// A service declaring a cached method that returns nothing.
pub struct Auditor;

impl Clock for Auditor {
    fn zone(&self) -> &'static str {
        "audit"
    }
}

impl ServiceClass for Auditor {
    type Interface = dyn Clock;
    const NAME: &'static str = "Auditor";

    fn metadata() -> ClassMetadata {
        ClassMetadata::new()
            .method(MethodSpec::new("record").cached("record", 10))
            .method(MethodSpec::new("zone").returns::<String>())
    }

    fn construct() -> Result<Self, BoxError> {
        Ok(Auditor)
    }

    fn into_plain(self) -> Arc<dyn Clock> {
        Arc::new(self)
    }

    fn into_cached(self, _proxy: CacheProxy) -> Arc<dyn Clock> {
        Arc::new(self)
    }
}

pub fn test_config() -> Config {
    Config {
        cache_version: "v1".to_string(),
        backend: "memory".to_string(),
        strict: true,
        ..Config::default()
    }
}

pub fn memory_provider() -> (CacheProvider, Arc<MemoryCache>) {
    let cache = Arc::new(MemoryCache::new());
    let provider = CacheProvider::with_backend(test_config(), cache.clone());
    (provider, cache)
}
