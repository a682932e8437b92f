//! Threshold persistence and evaluation across monitor instances

use async_trait::async_trait;
use fx_timeseries::alert::{
    threshold_key, AlertDirection, AlertError, AlertEvent, AlertMonitor, AlertNotifier,
    AlertResult, AlertThreshold, JsonFileStore, ThresholdStore,
};
use fx_timeseries::cache::ExpiringCache;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Default)]
struct Collector(Mutex<Vec<AlertEvent>>);

#[async_trait]
impl AlertNotifier for Collector {
    async fn notify(&self, event: &AlertEvent) -> AlertResult<()> {
        self.0.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Refuses every delivery.
struct Offline;

#[async_trait]
impl AlertNotifier for Offline {
    async fn notify(&self, _event: &AlertEvent) -> AlertResult<()> {
        Err(AlertError::Notify("channel closed".to_string()))
    }
}

#[tokio::test]
async fn test_file_store_survives_monitor_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state").join("thresholds.json");
    let collector = Arc::new(Collector::default());

    {
        let monitor = AlertMonitor::new(Arc::new(JsonFileStore::new(&path)), collector.clone());
        monitor
            .set_threshold("USD", "JPY", &AlertThreshold::new(Some(150.0), None).with_once(true, false))
            .unwrap();
        let fired = monitor.check("USD", "JPY", 151.0).await.unwrap();
        assert_eq!(fired.len(), 1);
    }

    let monitor = AlertMonitor::new(Arc::new(JsonFileStore::new(&path)), collector.clone());
    assert!(monitor.check("USD", "JPY", 152.0).await.unwrap().is_empty());
    assert!(monitor.check("USD", "JPY", 149.0).await.unwrap().is_empty());
    assert_eq!(monitor.check("USD", "JPY", 150.0).await.unwrap().len(), 1);

    let events = collector.0.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.direction == AlertDirection::Above));
}

#[tokio::test]
async fn test_pairs_are_independent() {
    let store = Arc::new(ExpiringCache::new());
    let monitor = AlertMonitor::new(store.clone(), Arc::new(Collector::default()));

    monitor
        .set_threshold("USD", "JPY", &AlertThreshold::new(None, Some(140.0)))
        .unwrap();

    assert!(monitor.check("USD", "EUR", 0.5).await.unwrap().is_empty());
    let fired = monitor.check("USD", "JPY", 139.0).await.unwrap();
    assert_eq!(fired[0].direction, AlertDirection::Below);
    assert!(store.load(&threshold_key("USD", "EUR")).unwrap().is_none());
}

#[tokio::test]
async fn test_failed_delivery_still_records_fired_flag() {
    let store = Arc::new(ExpiringCache::new());
    let monitor = AlertMonitor::new(store.clone(), Arc::new(Offline));
    monitor
        .set_threshold("EUR", "GBP", &AlertThreshold::new(Some(0.9), None).with_once(true, false))
        .unwrap();

    let err = monitor.check("EUR", "GBP", 0.95).await.unwrap_err();
    assert!(matches!(err, AlertError::Notify(_)));

    let stored = store.load(&threshold_key("EUR", "GBP")).unwrap().unwrap();
    assert!(stored.upper_fired);
}

#[test]
fn test_inverted_bounds_are_rejected() {
    let monitor = AlertMonitor::new(Arc::new(ExpiringCache::new()), Arc::new(Collector::default()));
    let err = monitor
        .set_threshold("USD", "JPY", &AlertThreshold::new(Some(140.0), Some(150.0)))
        .unwrap_err();
    assert!(matches!(err, AlertError::InvertedBounds { .. }));
}
