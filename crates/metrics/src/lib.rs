use model::MessageClass;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

const CLASS_COUNT: usize = MessageClass::ALL.len();

#[derive(Debug, Default)]
struct ClassCounters {
    received: AtomicU64,
    dropped: AtomicU64,
    malformed: AtomicU64,
    stale: AtomicU64,
    applied: AtomicU64,
}

/// Thread-safe metrics collector for the ingestion pipeline.
#[derive(Debug)]
pub struct IngestMetrics {
    classes: [ClassCounters; CLASS_COUNT],
    inner: RwLock<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    start_time: Instant,
    last_applied: [Option<Instant>; CLASS_COUNT],
    last_error_time: Option<Instant>,
}

impl Default for IngestMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self {
            classes: Default::default(),
            inner: RwLock::new(MetricsInner {
                start_time: Instant::now(),
                last_applied: [None; CLASS_COUNT],
                last_error_time: None,
            }),
        }
    }

    fn counters(&self, class: MessageClass) -> &ClassCounters {
        &self.classes[class.index()]
    }

    // --- Increment methods ---

    /// A delivery was handed to the pipeline.
    pub fn inc_received(&self, class: MessageClass) {
        self.counters(class).received.fetch_add(1, Ordering::Relaxed);
    }

    /// A delivery was rejected because its queue was full.
    pub fn inc_dropped(&self, class: MessageClass) {
        self.counters(class).dropped.fetch_add(1, Ordering::Relaxed);
        self.inner.write().last_error_time = Some(Instant::now());
    }

    pub fn inc_malformed(&self, class: MessageClass) {
        self.counters(class).malformed.fetch_add(1, Ordering::Relaxed);
        self.inner.write().last_error_time = Some(Instant::now());
    }

    pub fn inc_stale(&self, class: MessageClass) {
        self.counters(class).stale.fetch_add(1, Ordering::Relaxed);
    }

    /// A message was applied to the ledger.
    pub fn inc_applied(&self, class: MessageClass) {
        self.counters(class).applied.fetch_add(1, Ordering::Relaxed);
        self.inner.write().last_applied[class.index()] = Some(Instant::now());
    }

    // --- Getter methods ---

    pub fn received(&self, class: MessageClass) -> u64 {
        self.counters(class).received.load(Ordering::Relaxed)
    }

    pub fn dropped(&self, class: MessageClass) -> u64 {
        self.counters(class).dropped.load(Ordering::Relaxed)
    }

    pub fn malformed(&self, class: MessageClass) -> u64 {
        self.counters(class).malformed.load(Ordering::Relaxed)
    }

    pub fn stale(&self, class: MessageClass) -> u64 {
        self.counters(class).stale.load(Ordering::Relaxed)
    }

    pub fn applied(&self, class: MessageClass) -> u64 {
        self.counters(class).applied.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> f64 {
        self.inner.read().start_time.elapsed().as_secs_f64()
    }

    pub fn secs_since_last_applied(&self, class: MessageClass) -> Option<f64> {
        self.inner.read().last_applied[class.index()].map(|t| t.elapsed().as_secs_f64())
    }

    pub fn secs_since_last_error(&self) -> Option<f64> {
        self.inner
            .read()
            .last_error_time
            .map(|t| t.elapsed().as_secs_f64())
    }

    /// Generate a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let classes = MessageClass::ALL.map(|class| ClassSnapshot {
            class,
            received: self.received(class),
            dropped: self.dropped(class),
            malformed: self.malformed(class),
            stale: self.stale(class),
            applied: self.applied(class),
            secs_since_last_applied: self.secs_since_last_applied(class),
        });

        MetricsSnapshot {
            classes,
            uptime_secs: self.uptime_secs(),
            secs_since_last_error: self.secs_since_last_error(),
        }
    }
}

/// Counters of one message class at a point in time.
#[derive(Debug, Clone)]
pub struct ClassSnapshot {
    pub class: MessageClass,
    pub received: u64,
    pub dropped: u64,
    pub malformed: u64,
    pub stale: u64,
    pub applied: u64,
    pub secs_since_last_applied: Option<f64>,
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub classes: [ClassSnapshot; CLASS_COUNT],
    pub uptime_secs: f64,
    pub secs_since_last_error: Option<f64>,
}

/// Health status of the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Ticks are flowing.
    Healthy,
    /// No tick applied for a while.
    Degraded,
    /// No tick applied for an extended period.
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "HEALTHY"),
            HealthStatus::Degraded => write!(f, "DEGRADED"),
            HealthStatus::Unhealthy => write!(f, "UNHEALTHY"),
        }
    }
}

impl MetricsSnapshot {
    /// Threshold in seconds for considering data stale (degraded).
    const STALE_THRESHOLD_SECS: f64 = 30.0;
    /// Threshold in seconds for considering the pipeline unhealthy.
    const UNHEALTHY_THRESHOLD_SECS: f64 = 60.0;

    pub fn class(&self, class: MessageClass) -> &ClassSnapshot {
        &self.classes[class.index()]
    }

    pub fn total_received(&self) -> u64 {
        self.classes.iter().map(|c| c.received).sum()
    }

    pub fn total_dropped(&self) -> u64 {
        self.classes.iter().map(|c| c.dropped).sum()
    }

    pub fn total_malformed(&self) -> u64 {
        self.classes.iter().map(|c| c.malformed).sum()
    }

    /// Determine the health status from the age of the last applied tick.
    pub fn health_status(&self) -> HealthStatus {
        let secs_since_tick = match self.class(MessageClass::Tick).secs_since_last_applied {
            Some(secs) => secs,
            None => {
                // No ticks yet - if uptime is short, we're still starting up
                if self.uptime_secs < Self::STALE_THRESHOLD_SECS {
                    return HealthStatus::Healthy;
                } else if self.uptime_secs < Self::UNHEALTHY_THRESHOLD_SECS {
                    return HealthStatus::Degraded;
                } else {
                    return HealthStatus::Unhealthy;
                }
            }
        };

        if secs_since_tick > Self::UNHEALTHY_THRESHOLD_SECS {
            HealthStatus::Unhealthy
        } else if secs_since_tick > Self::STALE_THRESHOLD_SECS {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Ingestion Metrics ===")?;
        writeln!(f, "Uptime:              {:.1}s", self.uptime_secs)?;
        writeln!(
            f,
            "{:<16} {:>10} {:>8} {:>10} {:>8} {:>10}",
            "class", "received", "dropped", "malformed", "stale", "applied"
        )?;
        for c in &self.classes {
            writeln!(
                f,
                "{:<16} {:>10} {:>8} {:>10} {:>8} {:>10}",
                c.class.as_str(),
                c.received,
                c.dropped,
                c.malformed,
                c.stale,
                c.applied
            )?;
        }
        if let Some(secs) = self.class(MessageClass::Tick).secs_since_last_applied {
            writeln!(f, "Since last tick:     {:.1}s", secs)?;
        }
        if let Some(secs) = self.secs_since_last_error {
            writeln!(f, "Since last error:    {:.1}s", secs)?;
        }
        Ok(())
    }
}

/// Shared handle to metrics.
pub type SharedMetrics = Arc<IngestMetrics>;

pub fn create_metrics() -> SharedMetrics {
    Arc::new(IngestMetrics::new())
}
