//! Price threshold alerts
//!
//! An [`AlertThreshold`] holds optional upper/lower bounds for one currency
//! pair. [`AlertThreshold::evaluate`] compares the latest value against it
//! and returns the alerts to deliver. In "once" mode a bound fires a single
//! time and re-arms only after the value moves back across it.
//!
//! Storage and delivery are collaborators: [`ThresholdStore`] persists the
//! threshold as JSON under [`threshold_key`], and [`AlertNotifier`] delivers
//! alerts. [`AlertMonitor`] wires the two together. Delivery is at most once
//! per evaluation with no acknowledgement.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{CacheError, CacheStore, CacheStoreExt};

pub mod file_store;

pub use file_store::JsonFileStore;

/// Alert errors
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    /// Threshold could not be read or written
    #[error("threshold storage error: {0}")]
    Storage(#[from] CacheError),

    /// Threshold file could not be read or written
    #[error("threshold file error: {0}")]
    File(String),

    /// Notification delivery failed
    #[error("notification failed: {0}")]
    Notify(String),

    /// Bounds are inverted
    #[error("lower bound {lower} is above upper bound {upper}")]
    InvertedBounds {
        /// Configured lower bound
        lower: f64,
        /// Configured upper bound
        upper: f64,
    },
}

/// Result type for alert operations
pub type AlertResult<T> = Result<T, AlertError>;

/// Storage key for the `base -> symbol` threshold.
pub fn threshold_key(base: &str, symbol: &str) -> String {
    format!("thresh:{base}->{symbol}")
}

/// Persisted threshold state.
///
/// Missing fields decode to their defaults so older records stay readable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertThreshold {
    /// Fire when the latest value is at or above this
    pub upper: Option<f64>,
    /// Fire when the latest value is at or below this
    pub lower: Option<f64>,
    /// Upper bound fires once until re-armed
    pub upper_once: bool,
    /// Lower bound fires once until re-armed
    pub lower_once: bool,
    /// Upper bound has fired in once mode
    pub upper_fired: bool,
    /// Lower bound has fired in once mode
    pub lower_fired: bool,
}

/// Which bound was crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDirection {
    /// `latest >= upper`
    Above,
    /// `latest <= lower`
    Below,
}

impl fmt::Display for AlertDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Above => f.write_str("above"),
            Self::Below => f.write_str("below"),
        }
    }
}

/// A fired alert.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    /// Base currency
    pub base: String,
    /// Quoted currency
    pub symbol: String,
    /// Crossed bound
    pub direction: AlertDirection,
    /// Latest value
    pub current: f64,
    /// Bound value
    pub threshold: f64,
}

impl AlertEvent {
    /// Human-readable notification body.
    pub fn message(&self) -> String {
        match self.direction {
            AlertDirection::Above => format!(
                "{}->{} at {} is at or above the upper limit {}",
                self.base, self.symbol, self.current, self.threshold
            ),
            AlertDirection::Below => format!(
                "{}->{} at {} is at or below the lower limit {}",
                self.base, self.symbol, self.current, self.threshold
            ),
        }
    }
}

/// Result of one evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Alerts to deliver
    pub events: Vec<AlertEvent>,
    /// Fired flags changed and the threshold should be persisted
    pub changed: bool,
}

impl AlertThreshold {
    /// Threshold with the given bounds and no once-mode.
    pub fn new(upper: Option<f64>, lower: Option<f64>) -> Self {
        Self {
            upper,
            lower,
            ..Self::default()
        }
    }

    /// Enable once-mode per bound.
    pub fn with_once(mut self, upper_once: bool, lower_once: bool) -> Self {
        self.upper_once = upper_once;
        self.lower_once = lower_once;
        self
    }

    /// Replace the bounds and once-mode settings, keeping the fired flags.
    pub fn update_bounds(
        &mut self,
        upper: Option<f64>,
        lower: Option<f64>,
        upper_once: bool,
        lower_once: bool,
    ) {
        self.upper = upper;
        self.lower = lower;
        self.upper_once = upper_once;
        self.lower_once = lower_once;
    }

    /// Reject `lower > upper`.
    pub fn validate(&self) -> AlertResult<()> {
        match (self.lower, self.upper) {
            (Some(lower), Some(upper)) if lower > upper => {
                Err(AlertError::InvertedBounds { lower, upper })
            }
            _ => Ok(()),
        }
    }

    /// Whether any bound is set.
    pub fn is_active(&self) -> bool {
        self.upper.is_some() || self.lower.is_some()
    }

    /// Clear the fired flags, re-arming once-mode bounds.
    pub fn reset_once_flags(&mut self) {
        self.upper_fired = false;
        self.lower_fired = false;
    }

    /// Compare `latest` against both bounds, updating fired flags in place.
    pub fn evaluate(&mut self, base: &str, symbol: &str, latest: f64) -> Evaluation {
        let mut evaluation = Evaluation::default();
        let event = |direction, threshold| AlertEvent {
            base: base.to_string(),
            symbol: symbol.to_string(),
            direction,
            current: latest,
            threshold,
        };

        if let Some(upper) = self.upper {
            if latest >= upper && !(self.upper_once && self.upper_fired) {
                evaluation.events.push(event(AlertDirection::Above, upper));
                if self.upper_once {
                    self.upper_fired = true;
                    evaluation.changed = true;
                }
            }
            if self.upper_once && self.upper_fired && latest < upper {
                self.upper_fired = false;
                evaluation.changed = true;
            }
        }

        if let Some(lower) = self.lower {
            if latest <= lower && !(self.lower_once && self.lower_fired) {
                evaluation.events.push(event(AlertDirection::Below, lower));
                if self.lower_once {
                    self.lower_fired = true;
                    evaluation.changed = true;
                }
            }
            if self.lower_once && self.lower_fired && latest > lower {
                self.lower_fired = false;
                evaluation.changed = true;
            }
        }

        evaluation
    }
}

/// Persistence for thresholds.
pub trait ThresholdStore: Send + Sync {
    /// Load the threshold stored under `key`.
    fn load(&self, key: &str) -> AlertResult<Option<AlertThreshold>>;

    /// Store `threshold` under `key`.
    fn save(&self, key: &str, threshold: &AlertThreshold) -> AlertResult<()>;
}

/// Any [`CacheStore`] can hold thresholds; entries never expire.
impl<C: CacheStore + ?Sized> ThresholdStore for C {
    fn load(&self, key: &str) -> AlertResult<Option<AlertThreshold>> {
        Ok(self.get_json(key)?)
    }

    fn save(&self, key: &str, threshold: &AlertThreshold) -> AlertResult<()> {
        Ok(self.put_json(key, threshold, std::time::Duration::ZERO)?)
    }
}

/// Alert delivery.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    /// Deliver one alert.
    async fn notify(&self, event: &AlertEvent) -> AlertResult<()>;
}

/// Notifier that writes alerts to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl AlertNotifier for LogNotifier {
    async fn notify(&self, event: &AlertEvent) -> AlertResult<()> {
        warn!(
            base = %event.base,
            symbol = %event.symbol,
            direction = %event.direction,
            current = event.current,
            threshold = event.threshold,
            "{}",
            event.message()
        );
        Ok(())
    }
}

/// Loads, evaluates and persists thresholds, delivering fired alerts.
pub struct AlertMonitor {
    store: Arc<dyn ThresholdStore>,
    notifier: Arc<dyn AlertNotifier>,
}

impl AlertMonitor {
    /// Create a monitor over `store` and `notifier`.
    pub fn new(store: Arc<dyn ThresholdStore>, notifier: Arc<dyn AlertNotifier>) -> Self {
        Self { store, notifier }
    }

    /// Current threshold for the pair (default when none is stored).
    pub fn threshold(&self, base: &str, symbol: &str) -> AlertResult<AlertThreshold> {
        Ok(self
            .store
            .load(&threshold_key(base, symbol))?
            .unwrap_or_default())
    }

    /// Replace the pair's threshold.
    pub fn set_threshold(&self, base: &str, symbol: &str, threshold: &AlertThreshold) -> AlertResult<()> {
        threshold.validate()?;
        self.store.save(&threshold_key(base, symbol), threshold)?;
        info!(base, symbol, upper = ?threshold.upper, lower = ?threshold.lower, "threshold saved");
        Ok(())
    }

    /// Change the pair's bounds and once-mode settings without re-arming
    /// bounds that already fired.
    pub fn update_bounds(
        &self,
        base: &str,
        symbol: &str,
        upper: Option<f64>,
        lower: Option<f64>,
        upper_once: bool,
        lower_once: bool,
    ) -> AlertResult<AlertThreshold> {
        let mut threshold = self.threshold(base, symbol)?;
        threshold.update_bounds(upper, lower, upper_once, lower_once);
        self.set_threshold(base, symbol, &threshold)?;
        Ok(threshold)
    }

    /// Re-arm once-mode bounds for the pair.
    pub fn reset_once_flags(&self, base: &str, symbol: &str) -> AlertResult<()> {
        let mut threshold = self.threshold(base, symbol)?;
        threshold.reset_once_flags();
        self.store.save(&threshold_key(base, symbol), &threshold)
    }

    /// Evaluate `latest` for the pair and deliver any fired alerts.
    ///
    /// Fired flags are persisted before delivery, so a failed notification
    /// is not retried on the next evaluation.
    pub async fn check(&self, base: &str, symbol: &str, latest: f64) -> AlertResult<Vec<AlertEvent>> {
        let key = threshold_key(base, symbol);
        let Some(mut threshold) = self.store.load(&key)? else {
            debug!(key = %key, "no threshold configured");
            return Ok(Vec::new());
        };

        let evaluation = threshold.evaluate(base, symbol, latest);
        if evaluation.changed {
            self.store.save(&key, &threshold)?;
        }

        for event in &evaluation.events {
            self.notifier.notify(event).await?;
        }
        Ok(evaluation.events)
    }
}
