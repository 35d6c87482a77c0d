//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `bank_transactions_total` - Completed balance-mutating transactions
//! - `bank_policy_rejections_total` - Withdrawals/transfers refused by policy
//! - `bank_rollbacks_total` - Compensating transactions created
//! - `bank_interest_credits_total` - Interest credits applied
//! - `bank_operation_duration_seconds` - Histogram of operation latencies
//!
//! Each ledger instance owns its registry, so multiple instances (and
//! tests) never collide on registration.

use prometheus::{Histogram, HistogramOpts, IntCounter, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Completed transactions
    pub transactions_total: IntCounter,

    /// Policy rejections
    pub policy_rejections_total: IntCounter,

    /// Rollbacks performed
    pub rollbacks_total: IntCounter,

    /// Interest credits applied
    pub interest_credits_total: IntCounter,

    /// Operation latency histogram
    pub operation_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create a metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let transactions_total = IntCounter::with_opts(Opts::new(
            "bank_transactions_total",
            "Completed balance-mutating transactions",
        ))?;
        registry.register(Box::new(transactions_total.clone()))?;

        let policy_rejections_total = IntCounter::with_opts(Opts::new(
            "bank_policy_rejections_total",
            "Withdrawals and transfers refused by policy",
        ))?;
        registry.register(Box::new(policy_rejections_total.clone()))?;

        let rollbacks_total = IntCounter::with_opts(Opts::new(
            "bank_rollbacks_total",
            "Compensating transactions created",
        ))?;
        registry.register(Box::new(rollbacks_total.clone()))?;

        let interest_credits_total = IntCounter::with_opts(Opts::new(
            "bank_interest_credits_total",
            "Interest credits applied by the accrual batch",
        ))?;
        registry.register(Box::new(interest_credits_total.clone()))?;

        let operation_duration = Histogram::with_opts(
            HistogramOpts::new(
                "bank_operation_duration_seconds",
                "Histogram of ledger operation latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        Ok(Self {
            transactions_total,
            policy_rejections_total,
            rollbacks_total,
            interest_credits_total,
            operation_duration,
            registry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        let metrics = Metrics::new().unwrap();
        metrics.transactions_total.inc();
        metrics.operation_duration.observe(0.002);

        assert_eq!(metrics.transactions_total.get(), 1);
        assert_eq!(metrics.registry.gather().len(), 5);
    }

    #[test]
    fn test_independent_registries() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.transactions_total.inc();
        assert_eq!(b.transactions_total.get(), 0);
    }
}
