//! Prometheus metrics for hosted contracts.
//!
//! All metrics follow the naming convention: `qc_contracts_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **CounterVec**: actions by contract/action/outcome, flushed effects by kind
//! - **Histogram**: wall time of a whole unit of work

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};
use std::sync::Once;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    /// Actions pushed to the host, by contract, action and outcome
    pub static ref ACTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("qc_contracts_actions_total", "Actions executed by hosted contracts"),
        &["contract", "action", "outcome"]  // outcome: committed/rejected/failed
    ).expect("metric creation failed");

    /// Side effects flushed after commit, by kind
    pub static ref EFFECTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("qc_contracts_effects_total", "Side effects dispatched after commit"),
        &["kind"]  // kind: notification/transfer/usage
    ).expect("metric creation failed");

    /// Unit-of-work duration
    pub static ref ACTION_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "qc_contracts_action_duration_seconds",
            "Time spent executing one action including inline actions"
        ).buckets(exponential_buckets(0.000_01, 2.0, 16).expect("valid bucket layout"))
    ).expect("metric creation failed");
}

static REGISTER: Once = Once::new();

/// Outcome label of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// All mutations and effects committed.
    Committed,
    /// Rejected for missing authorization.
    Rejected,
    /// Aborted by any other error; state rolled back.
    Failed,
}

impl ActionOutcome {
    /// Label value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Committed => "committed",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

/// Register the contract metrics with the global registry. Safe to call
/// repeatedly; only the first call registers.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let mut result = Ok(());
    REGISTER.call_once(|| {
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(ACTIONS_TOTAL.clone()),
            Box::new(EFFECTS_TOTAL.clone()),
            Box::new(ACTION_DURATION.clone()),
        ];
        for collector in collectors {
            if let Err(e) = REGISTRY.register(collector) {
                result = Err(TelemetryError::MetricsInit(e.to_string()));
                return;
            }
        }
    });
    result
}

/// Count one executed action.
pub fn record_action(contract: &str, action: &str, outcome: ActionOutcome) {
    ACTIONS_TOTAL
        .with_label_values(&[contract, action, outcome.as_str()])
        .inc();
}

/// Count one dispatched side effect.
pub fn record_effect(kind: &str) {
    EFFECTS_TOTAL.with_label_values(&[kind]).inc();
}

/// Observe the duration of one unit of work.
pub fn observe_action_duration(seconds: f64) {
    ACTION_DURATION.observe(seconds);
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics_twice() {
        assert!(register_metrics().is_ok());
        assert!(register_metrics().is_ok());
    }

    #[test]
    fn test_record_action() {
        let before = ACTIONS_TOTAL
            .with_label_values(&["hodl", "party", "rejected"])
            .get();
        record_action("hodl", "party", ActionOutcome::Rejected);
        let after = ACTIONS_TOTAL
            .with_label_values(&["hodl", "party", "rejected"])
            .get();
        assert!((after - before - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_encode_contains_action_counter() {
        register_metrics().unwrap();
        record_action("addressbook", "upsert", ActionOutcome::Committed);
        let text = encode_metrics().unwrap();
        assert!(text.contains("qc_contracts_actions_total"));
    }
}
