mod common;

use cache_provider::domain::CachedValue;
use cache_provider::prelude::*;
use common::{LookupError, PRICE_CALLS, PRODUCT_CALLS, PriceService, Product, memory_provider};
use serial_test::serial;
use std::sync::Arc;
use std::sync::atomic::Ordering;

#[tokio::test]
#[serial]
async fn test_second_call_served_from_cache() {
    let (provider, cache) = memory_provider();
    let prices = provider.get_singleton::<PriceService>().unwrap();
    let before = PRICE_CALLS.load(Ordering::SeqCst);

    assert_eq!(prices.price(42).await.unwrap(), 9.99);
    assert_eq!(prices.price(42).await.unwrap(), 9.99);

    assert_eq!(PRICE_CALLS.load(Ordering::SeqCst) - before, 1);
    let stored = cache.get("v1|price|42|").await.unwrap().unwrap();
    assert_eq!(stored.decode::<f64>().unwrap(), 9.99);
}

#[tokio::test]
#[serial]
async fn test_distinct_arguments_use_distinct_keys() {
    let (provider, cache) = memory_provider();
    let prices = provider.get_singleton::<PriceService>().unwrap();

    assert_eq!(prices.price(5).await.unwrap(), 0.5);
    assert_eq!(prices.price(6).await.unwrap(), 0.6);

    assert!(cache.get("v1|price|5|").await.unwrap().is_some());
    assert!(cache.get("v1|price|6|").await.unwrap().is_some());
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
#[serial]
async fn test_absent_result_is_not_cached() {
    let (provider, cache) = memory_provider();
    let prices = provider.get_singleton::<PriceService>().unwrap();
    let before = PRODUCT_CALLS.load(Ordering::SeqCst);

    assert_eq!(prices.product(-1).await.unwrap(), None);
    assert_eq!(prices.product(-1).await.unwrap(), None);
    assert_eq!(PRODUCT_CALLS.load(Ordering::SeqCst) - before, 2);
    assert!(cache.is_empty());

    let expected = Product {
        sku: 3,
        name: "product-3".to_string(),
    };
    assert_eq!(prices.product(3).await.unwrap(), Some(expected.clone()));
    assert_eq!(prices.product(3).await.unwrap(), Some(expected));
    assert_eq!(PRODUCT_CALLS.load(Ordering::SeqCst) - before, 3);

    let stored = cache.get("v1|product|3|").await.unwrap().unwrap();
    assert_eq!(stored.type_tag, "catalog.product");
}

#[tokio::test]
#[serial]
async fn test_entry_written_by_another_build_is_a_hit() {
    let (provider, cache) = memory_provider();
    cache
        .set(
            "v1|product|8|",
            CachedValue {
                type_tag: "catalog.product".to_string(),
                payload: serde_json::json!({ "sku": 8, "name": "stored" }),
            },
            300,
        )
        .await
        .unwrap();

    let prices = provider.get_singleton::<PriceService>().unwrap();
    let before = PRODUCT_CALLS.load(Ordering::SeqCst);

    let product = prices.product(8).await.unwrap().unwrap();
    assert_eq!(product.name, "stored");
    assert_eq!(PRODUCT_CALLS.load(Ordering::SeqCst) - before, 0);
}

#[tokio::test]
#[serial]
async fn test_body_error_is_not_cached() {
    let (provider, cache) = memory_provider();
    let prices = provider.get_singleton::<PriceService>().unwrap();
    let before = PRICE_CALLS.load(Ordering::SeqCst);

    assert!(matches!(prices.price(0).await, Err(LookupError::UnknownSku(0))));
    assert!(matches!(prices.price(0).await, Err(LookupError::UnknownSku(0))));

    assert_eq!(PRICE_CALLS.load(Ordering::SeqCst) - before, 2);
    assert!(cache.is_empty());
}

#[tokio::test]
#[serial]
async fn test_array_arguments() {
    let (provider, cache) = memory_provider();
    let prices = provider.get_singleton::<PriceService>().unwrap();

    assert_eq!(prices.bulk_total(&[]).await.unwrap(), 0.0);
    assert_eq!(prices.bulk_total(&[1, 2]).await.unwrap(), 3.0);

    assert!(cache.get("v1|bulk|null|").await.unwrap().is_some());
    assert!(cache.get("v1|bulk|[1][2]|").await.unwrap().is_some());
}

#[tokio::test]
#[serial]
async fn test_foreign_value_under_key_is_a_collision() {
    let (provider, cache) = memory_provider();
    cache
        .set(
            "v1|price|7|",
            CachedValue::encode(&"seven".to_string()).unwrap(),
            60,
        )
        .await
        .unwrap();

    let prices = provider.get_singleton::<PriceService>().unwrap();
    let err = prices.price(7).await.unwrap_err();

    assert!(matches!(
        err,
        LookupError::Cache(CacheError::KeyCollision { ref key, .. }) if key == "v1|price|7|"
    ));
}

#[tokio::test]
#[serial]
async fn test_version_bump_isolates_entries() {
    let cache = Arc::new(MemoryCache::new());
    let v1 = CacheProvider::with_backend(common::test_config(), cache.clone());
    let v2 = CacheProvider::with_backend(
        Config {
            cache_version: "v2".to_string(),
            ..common::test_config()
        },
        cache.clone(),
    );

    v1.get_singleton::<PriceService>()
        .unwrap()
        .price(8)
        .await
        .unwrap();
    v2.get_singleton::<PriceService>()
        .unwrap()
        .price(8)
        .await
        .unwrap();

    assert!(cache.get("v1|price|8|").await.unwrap().is_some());
    assert!(cache.get("v2|price|8|").await.unwrap().is_some());
}

#[tokio::test]
#[serial]
async fn test_uncached_method_runs_directly() {
    let (provider, cache) = memory_provider();
    let prices = provider.get_singleton::<PriceService>().unwrap();

    assert_eq!(prices.region(), "eu-west");
    assert!(cache.is_empty());
}

#[tokio::test]
#[serial]
async fn test_null_backend_always_recomputes() {
    let provider = CacheProvider::with_backend(common::test_config(), Arc::new(NullCache::new()));
    let prices = provider.get_singleton::<PriceService>().unwrap();

    assert_eq!(prices.price(42).await.unwrap(), 9.99);
    assert_eq!(prices.price(42).await.unwrap(), 9.99);
}

#[tokio::test]
#[serial]
async fn test_unsupported_backend_fails_at_first_cached_call() {
    let provider = CacheProvider::new(Config {
        backend: "memcache".to_string(),
        ..common::test_config()
    });

    let prices = provider.get_singleton::<PriceService>().unwrap();
    assert_eq!(prices.region(), "eu-west");

    assert!(matches!(
        prices.price(42).await,
        Err(LookupError::Cache(CacheError::Configuration(
            ConfigurationError::UnsupportedBackend { .. }
        )))
    ));
}
