//! ResponseOptimizer integration tests - cache, presets, summaries, metrics
//!
//! `cargo test -p pare-core --test optimizer_integration`

use pare_core::{
    DetailLevel, FieldPreset, OperationPresets, OptimizationConfig, PresetRegistry,
    ResponseOptimizer, ShapingConfig,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn cards(n: usize) -> Value {
    let items: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "id": format!("c{}", i),
                "name": format!("Card {}", i),
                "desc": "Some description of the card",
                "idList": "l1",
                "closed": false,
                "pos": i,
                "due": null,
                "dueComplete": false,
                "badges": {"votes": 0, "comments": 2},
                "limits": {},
                "customFieldItems": []
            })
        })
        .collect();
    Value::Array(items)
}

/// Fetch closure that counts how often it actually ran
fn counting_fetch(
    counter: &Arc<AtomicUsize>,
    data: Value,
) -> impl FnOnce() -> std::future::Ready<anyhow::Result<Value>> {
    let counter = counter.clone();
    move || {
        counter.fetch_add(1, Ordering::SeqCst);
        std::future::ready(Ok(data))
    }
}

// ============================================================================
// Shaping
// ============================================================================

#[test]
fn test_full_level_is_identity() {
    let optimizer = ResponseOptimizer::default();
    let data = cards(3);
    let cfg = ShapingConfig::new().level(DetailLevel::Full);
    assert_eq!(optimizer.optimize(data.clone(), "get_cards_in_list", Some(&cfg)), data);
}

#[test]
fn test_field_subset_shrinks() {
    let optimizer = ResponseOptimizer::default();
    let data = cards(3);

    for level in [DetailLevel::Minimal, DetailLevel::Standard, DetailLevel::Detailed] {
        let cfg = ShapingConfig::new().level(level);
        let out = optimizer.optimize(data.clone(), "get_cards_in_list", Some(&cfg));
        let stats = optimizer.optimization_stats(&data, &out);
        assert!(stats.optimized_size < stats.original_size, "{} should shrink", level);

        for (before, after) in data.as_array().unwrap().iter().zip(out.as_array().unwrap()) {
            for (key, value) in after.as_object().unwrap() {
                assert_eq!(before.get(key), Some(value));
            }
        }
    }
}

#[test]
fn test_max_items_keeps_order() {
    let optimizer = ResponseOptimizer::default();

    let cfg = ShapingConfig::new().max_items(4).fields(["id"]);
    let out = optimizer.optimize(cards(10), "get_cards_in_list", Some(&cfg));
    assert_eq!(
        out,
        json!([{"id": "c0"}, {"id": "c1"}, {"id": "c2"}, {"id": "c3"}])
    );

    let cfg = ShapingConfig::new().max_items(50);
    let out = optimizer.optimize(cards(2), "get_cards_in_list", Some(&cfg));
    assert_eq!(out.as_array().unwrap().len(), 2);
}

#[test]
fn test_max_items_zero_is_empty() {
    let optimizer = ResponseOptimizer::default();

    for level in [DetailLevel::Minimal, DetailLevel::Standard, DetailLevel::Detailed] {
        let cfg = ShapingConfig::new().level(level).max_items(0);
        let out = optimizer.optimize(cards(5), "get_cards_in_list", Some(&cfg));
        assert_eq!(out, json!([]), "{}", level);
    }

    // Default level from config
    let cfg = ShapingConfig::new().max_items(0);
    assert_eq!(optimizer.optimize(cards(5), "get_cards_in_list", Some(&cfg)), json!([]));
}

#[test]
fn test_summary_invariants() {
    let optimizer = ResponseOptimizer::default();
    let cfg = ShapingConfig::new().summarize(true);
    let out = optimizer.optimize(cards(12), "get_cards_in_list", Some(&cfg));

    let summary = &out["summary"];
    let total = summary["totalCount"].as_u64().unwrap();
    let shown = summary["items"].as_array().unwrap().len() as u64;
    let remaining = summary["remainingCount"].as_u64().unwrap();

    assert_eq!(total, 12);
    assert_eq!(shown, 5);
    assert_eq!(shown + remaining, total);
    assert_eq!(summary["hasMore"], true);
    assert_eq!(summary["items"][0], json!({"id": "c0", "name": "Card 0"}));
}

#[test]
fn test_card_stats_in_summary() {
    let items: Vec<Value> = (0..25)
        .map(|i| {
            let (due, complete) = match i {
                0..=2 => (json!("2020-01-01T00:00:00.000Z"), false),
                3..=4 => (json!("2020-01-01T00:00:00.000Z"), true),
                5..=8 => (json!("2999-01-01T00:00:00.000Z"), false),
                _ => (Value::Null, false),
            };
            json!({
                "id": format!("c{}", i),
                "name": format!("Card {}", i),
                "due": due,
                "dueComplete": complete,
                "closed": i == 24
            })
        })
        .collect();

    let optimizer = ResponseOptimizer::default();
    let cfg = ShapingConfig::new().summarize(true);
    let out = optimizer.optimize(Value::Array(items), "get_cards_in_list", Some(&cfg));

    assert_eq!(
        out["summary"]["stats"],
        json!({"withDueDate": 9, "overdue": 3, "completed": 2, "archived": 1})
    );
    assert_eq!(
        out["summary"]["text"],
        "25 cards (9 with due dates, 3 overdue, 2 completed, 1 archived) - showing first 5"
    );
}

#[test]
fn test_description_truncation() {
    let optimizer = ResponseOptimizer::default();
    let data = json!({"id": "c1", "name": "Card", "desc": "word ".repeat(40)});
    let cfg = ShapingConfig::new()
        .level(DetailLevel::Minimal)
        .truncate_descriptions(20);
    let out = optimizer.optimize(data, "get_card", Some(&cfg));

    let desc = out["desc"].as_str().unwrap();
    assert!(desc.ends_with("..."));
    assert!(desc.chars().count() <= 23);
    assert_eq!(out["descOriginalLength"], 200);
}

#[test]
fn test_custom_preset() {
    let presets = PresetRegistry::new().with_operation(
        "get_widgets",
        OperationPresets {
            standard: Some(FieldPreset::include(["id", "name"])),
            ..Default::default()
        },
    );
    let optimizer = ResponseOptimizer::builder().presets(presets).build();

    let out = optimizer.optimize(
        json!([{"id": 1, "name": "a", "secret": "x"}, {"id": 2, "name": "b", "size": 9}]),
        "get_widgets",
        None,
    );
    assert_eq!(out, json!([{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]));

    // Built-in operations are gone from this registry
    let card = json!({"id": "c1", "badges": {}});
    assert_eq!(optimizer.optimize(card.clone(), "get_card", None), card);
}

// ============================================================================
// Cache
// ============================================================================

#[tokio::test]
async fn test_cache_round_trip() -> anyhow::Result<()> {
    let optimizer = ResponseOptimizer::default();
    let fetches = Arc::new(AtomicUsize::new(0));
    let params = json!({"listId": "l1"});
    let cfg = ShapingConfig::new().level(DetailLevel::Minimal);

    let first = optimizer
        .optimize_with_cache("get_cards_in_list", &params, counting_fetch(&fetches, cards(3)), Some(&cfg))
        .await?;
    let second = optimizer
        .optimize_with_cache("get_cards_in_list", &params, counting_fetch(&fetches, cards(3)), Some(&cfg))
        .await?;

    assert_eq!(first, second);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    let stats = optimizer.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.entries, 1);

    // Any shaping change is a different entry
    let variants = [
        ShapingConfig::new().level(DetailLevel::Standard),
        ShapingConfig::new().level(DetailLevel::Minimal).fields(["id"]),
        ShapingConfig::new().level(DetailLevel::Minimal).max_items(1),
    ];
    for variant in &variants {
        optimizer
            .optimize_with_cache("get_cards_in_list", &params, counting_fetch(&fetches, cards(3)), Some(variant))
            .await?;
    }
    assert_eq!(fetches.load(Ordering::SeqCst), 4);

    // Key order in params does not matter
    let reordered: Value = serde_json::from_str(r#"{"b": 2, "a": 1}"#)?;
    let ordered: Value = serde_json::from_str(r#"{"a": 1, "b": 2}"#)?;
    optimizer
        .optimize_with_cache("get_card", &reordered, counting_fetch(&fetches, json!({"id": "c"})), None)
        .await?;
    optimizer
        .optimize_with_cache("get_card", &ordered, counting_fetch(&fetches, json!({"id": "c"})), None)
        .await?;
    assert_eq!(fetches.load(Ordering::SeqCst), 5);

    let metrics = optimizer.performance_metrics(None);
    assert!(metrics.cache_hit_rate > 0.0);
    assert_eq!(metrics.by_level["cache"].calls, 2);
    Ok(())
}

#[tokio::test]
async fn test_non_cacheable_always_fetches() -> anyhow::Result<()> {
    let optimizer = ResponseOptimizer::default();
    let fetches = Arc::new(AtomicUsize::new(0));
    let params = json!({"cardId": "c1"});

    for _ in 0..2 {
        optimizer
            .optimize_with_cache("update_card", &params, counting_fetch(&fetches, json!({"id": "c1"})), None)
            .await?;
    }
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
    assert!(optimizer.cache().is_empty());

    optimizer.set_caching_enabled(false);
    for _ in 0..2 {
        optimizer
            .optimize_with_cache("get_card", &params, counting_fetch(&fetches, json!({"id": "c1"})), None)
            .await?;
    }
    assert_eq!(fetches.load(Ordering::SeqCst), 4);
    assert!(optimizer.cache().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_fifo_eviction() -> anyhow::Result<()> {
    let config = OptimizationConfig {
        cache_max_size: 2,
        ..Default::default()
    };
    let optimizer = ResponseOptimizer::new(config);
    let fetches = Arc::new(AtomicUsize::new(0));

    for id in ["a", "b", "c"] {
        optimizer
            .optimize_with_cache("get_card", &json!({"id": id}), counting_fetch(&fetches, json!({"id": id})), None)
            .await?;
    }
    assert_eq!(optimizer.cache_stats().entries, 2);
    assert_eq!(optimizer.cache_stats().evictions, 1);

    // "c" and "b" still cached, "a" was evicted first
    for id in ["c", "b"] {
        optimizer
            .optimize_with_cache("get_card", &json!({"id": id}), counting_fetch(&fetches, json!({"id": id})), None)
            .await?;
    }
    assert_eq!(fetches.load(Ordering::SeqCst), 3);

    optimizer
        .optimize_with_cache("get_card", &json!({"id": "a"}), counting_fetch(&fetches, json!({"id": "a"})), None)
        .await?;
    assert_eq!(fetches.load(Ordering::SeqCst), 4);
    Ok(())
}

#[tokio::test]
async fn test_fetch_error_propagates() {
    let optimizer = ResponseOptimizer::default();

    let result = optimizer
        .optimize_with_cache(
            "get_board",
            &json!({"boardId": "b1"}),
            || async { Err::<Value, _>(anyhow::anyhow!("upstream returned 503")) },
            None,
        )
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "upstream returned 503");
    assert!(optimizer.cache().is_empty());
    assert_eq!(optimizer.cache_stats().misses, 1);
}

#[tokio::test]
async fn test_invalidate_after_write() -> anyhow::Result<()> {
    let optimizer = ResponseOptimizer::default();
    let fetches = Arc::new(AtomicUsize::new(0));
    let params = json!({"boardId": "b1"});

    optimizer
        .optimize_with_cache("get_board", &params, counting_fetch(&fetches, json!({"id": "b1"})), None)
        .await?;
    optimizer
        .optimize_with_cache("get_boards", &json!({}), counting_fetch(&fetches, json!([])), None)
        .await?;
    optimizer
        .optimize_with_cache("get_me", &json!({}), counting_fetch(&fetches, json!({"id": "m"})), None)
        .await?;

    assert_eq!(optimizer.invalidate_cache("update_board"), 2);
    assert_eq!(optimizer.cache_stats().entries, 1);

    optimizer
        .optimize_with_cache("get_board", &params, counting_fetch(&fetches, json!({"id": "b1"})), None)
        .await?;
    assert_eq!(fetches.load(Ordering::SeqCst), 4);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_cache() -> anyhow::Result<()> {
    const CALLS: usize = 64;
    const CAPACITY: usize = 4;

    let config = OptimizationConfig {
        cache_max_size: CAPACITY,
        ..Default::default()
    };
    let optimizer = Arc::new(ResponseOptimizer::new(config));
    let fetches = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::with_capacity(CALLS);
    for i in 0..CALLS {
        let optimizer = Arc::clone(&optimizer);
        let fetches = Arc::clone(&fetches);
        handles.push(tokio::spawn(async move {
            let id = format!("c{}", i % 8);
            let params = json!({ "id": id });
            optimizer
                .optimize_with_cache(
                    "get_card",
                    &params,
                    || async move {
                        fetches.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        Ok::<_, anyhow::Error>(json!({"id": id, "name": "Card", "badges": {}}))
                    },
                    None,
                )
                .await
        }));
    }

    for handle in handles {
        let value = handle.await??;
        assert!(value.get("badges").is_none());
    }

    let stats = optimizer.cache_stats();
    assert!(stats.entries <= CAPACITY);
    assert_eq!(stats.capacity, CAPACITY);
    assert_eq!(stats.hits + stats.misses, CALLS as u64);
    assert_eq!(stats.misses as usize, fetches.load(Ordering::SeqCst));

    assert_eq!(optimizer.metrics().len(), CALLS);
    assert_eq!(optimizer.performance_metrics(None).total_calls, CALLS);
    Ok(())
}

// ============================================================================
// Metrics / lifecycle
// ============================================================================

#[test]
fn test_report() {
    let optimizer = ResponseOptimizer::default();
    assert_eq!(optimizer.generate_report(None), "No performance metrics available.");

    let cfg = ShapingConfig::new().level(DetailLevel::Minimal);
    optimizer.optimize(cards(5), "get_cards_in_list", Some(&cfg));

    let report = optimizer.generate_report(Some(Duration::from_secs(3600)));
    assert!(report.starts_with("=== Performance Report ==="));
    assert!(report.contains("Total API Calls: 1"));
    assert!(report.contains("get_cards_in_list:"));
    assert!(report.contains("minimal: 1 calls"));
}

#[test]
fn test_metrics_disabled() {
    let config = OptimizationConfig {
        enable_metrics: false,
        ..Default::default()
    };
    let optimizer = ResponseOptimizer::new(config);
    optimizer.optimize(cards(2), "get_cards_in_list", None);
    assert!(optimizer.metrics().is_empty());
}

#[tokio::test]
async fn test_sweep_and_shutdown() -> anyhow::Result<()> {
    let config = OptimizationConfig {
        cache_cleanup_interval_ms: 10,
        ..Default::default()
    };
    let optimizer = ResponseOptimizer::new(config);
    assert!(optimizer.start_background_sweep()?);

    optimizer.cache().set(
        "get_me",
        &json!({}),
        &Value::Null,
        json!({"id": "m"}),
        Some(Duration::from_millis(1)),
    )?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(optimizer.cache().is_empty());
    assert!(optimizer.cache_stats().expirations >= 1);

    optimizer.shutdown().await;
    assert!(!optimizer.is_sweeping());
    Ok(())
}
