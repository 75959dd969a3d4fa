//! Metrics collection and export for shared pools

use crossbeam::utils::CachePadded;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "metrics")]
use crate::errors::PoolResult;

/// Point-in-time metrics for a pool
///
/// # Examples
///
/// ```
/// use shared_pool::SharedPool;
///
/// let pool = SharedPool::create(String::new);
///
/// {
///     let _handle = pool.acquire().unwrap();
///     let metrics = pool.metrics();
///     assert_eq!(metrics.total_acquired, 1);
///     assert_eq!(metrics.checked_out, 1);
/// }
///
/// assert_eq!(pool.metrics().total_released, 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "metrics", derive(serde::Serialize))]
pub struct PoolMetrics {
    /// Handles handed out by `acquire`
    pub total_acquired: usize,

    /// Objects given back to the pool by handles
    pub total_released: usize,

    /// Objects built by the creator
    pub total_created: usize,

    /// Acquisitions served from the idle set
    pub reuse_hits: usize,

    /// Creator calls that returned an error
    pub construction_failures: usize,

    /// Objects currently tracked by the pool
    pub allocated: usize,

    /// Idle objects
    pub available: usize,

    /// Objects owned by live handles
    pub checked_out: usize,

    /// Storage capacity of the allocated set
    pub capacity: usize,

    /// Share of allocated objects that are checked out (0.0 to 1.0)
    pub utilization: f64,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("total_acquired".to_string(), self.total_acquired.to_string());
        metrics.insert("total_released".to_string(), self.total_released.to_string());
        metrics.insert("total_created".to_string(), self.total_created.to_string());
        metrics.insert("reuse_hits".to_string(), self.reuse_hits.to_string());
        metrics.insert(
            "construction_failures".to_string(),
            self.construction_failures.to_string(),
        );
        metrics.insert("allocated".to_string(), self.allocated.to_string());
        metrics.insert("available".to_string(), self.available.to_string());
        metrics.insert("checked_out".to_string(), self.checked_out.to_string());
        metrics.insert("capacity".to_string(), self.capacity.to_string());
        metrics.insert("utilization".to_string(), format!("{:.2}", self.utilization));
        metrics
    }
}

/// Metrics exporter for the Prometheus text format
#[cfg(feature = "metrics")]
pub struct MetricsExporter;

#[cfg(feature = "metrics")]
impl MetricsExporter {
    /// Render `metrics` in Prometheus exposition format
    ///
    /// Every sample carries a `pool` label plus the given tags.
    ///
    /// # Examples
    ///
    /// ```
    /// use shared_pool::SharedPool;
    /// use std::collections::HashMap;
    ///
    /// let pool = SharedPool::create(|| vec![0u8; 16]);
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("service".to_string(), "api".to_string());
    ///
    /// let output = pool.export_metrics_prometheus("buffers", Some(&tags)).unwrap();
    /// assert!(output.contains("sharedpool_objects_checked_out"));
    /// assert!(output.contains("service=\"api\""));
    /// ```
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> PoolResult<String> {
        use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Opts, Registry, TextEncoder};

        let mut labels = tags.cloned().unwrap_or_default();
        labels.insert("pool".to_string(), pool_name.to_string());
        let opts = |name: &str, help: &str| Opts::new(name, help).const_labels(labels.clone());

        let registry = Registry::new();

        let gauges = [
            ("sharedpool_objects_allocated", "Objects tracked by the pool", metrics.allocated),
            ("sharedpool_objects_available", "Idle objects", metrics.available),
            (
                "sharedpool_objects_checked_out",
                "Objects owned by live handles",
                metrics.checked_out,
            ),
            ("sharedpool_capacity", "Storage capacity of the allocated set", metrics.capacity),
        ];
        for (name, help, value) in gauges {
            let gauge = IntGauge::with_opts(opts(name, help))?;
            gauge.set(i64::try_from(value).unwrap_or(i64::MAX));
            registry.register(Box::new(gauge))?;
        }

        let utilization = Gauge::with_opts(opts(
            "sharedpool_utilization",
            "Checked out share of allocated objects",
        ))?;
        utilization.set(metrics.utilization);
        registry.register(Box::new(utilization))?;

        let counters = [
            ("sharedpool_acquired_total", "Handles handed out", metrics.total_acquired),
            ("sharedpool_released_total", "Objects returned by handles", metrics.total_released),
            ("sharedpool_created_total", "Objects built by the creator", metrics.total_created),
            (
                "sharedpool_reuse_hits_total",
                "Acquisitions served from idle objects",
                metrics.reuse_hits,
            ),
            (
                "sharedpool_construction_failures_total",
                "Failed creator calls",
                metrics.construction_failures,
            ),
        ];
        for (name, help, value) in counters {
            let counter = IntCounter::with_opts(opts(name, help))?;
            counter.inc_by(value as u64);
            registry.register(Box::new(counter))?;
        }

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Lock-free counters updated by the pool
pub(crate) struct MetricsTracker {
    total_acquired: CachePadded<AtomicUsize>,
    total_released: CachePadded<AtomicUsize>,
    total_created: CachePadded<AtomicUsize>,
    reuse_hits: CachePadded<AtomicUsize>,
    construction_failures: CachePadded<AtomicUsize>,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self {
            total_acquired: CachePadded::new(AtomicUsize::new(0)),
            total_released: CachePadded::new(AtomicUsize::new(0)),
            total_created: CachePadded::new(AtomicUsize::new(0)),
            reuse_hits: CachePadded::new(AtomicUsize::new(0)),
            construction_failures: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    pub fn record_acquired(&self, reused: bool) {
        self.total_acquired.fetch_add(1, Ordering::Relaxed);
        if reused {
            self.reuse_hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_released(&self) {
        self.total_released.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_created(&self) {
        self.total_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_construction_failure(&self) {
        self.construction_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, allocated: usize, available: usize, capacity: usize) -> PoolMetrics {
        let checked_out = allocated - available;
        let utilization = if allocated > 0 {
            checked_out as f64 / allocated as f64
        } else {
            0.0
        };

        PoolMetrics {
            total_acquired: self.total_acquired.load(Ordering::Relaxed),
            total_released: self.total_released.load(Ordering::Relaxed),
            total_created: self.total_created.load(Ordering::Relaxed),
            reuse_hits: self.reuse_hits.load(Ordering::Relaxed),
            construction_failures: self.construction_failures.load(Ordering::Relaxed),
            allocated,
            available,
            checked_out,
            capacity,
            utilization,
        }
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new()
    }
}
