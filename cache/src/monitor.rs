//! Response-time and access telemetry.
//!
//! [`PerformanceMonitor`] is the seam the cache reports to; [`LatencyMonitor`]
//! is a self-contained implementation with threshold-based alerting.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam_utils::CachePadded;
use parking_lot::Mutex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Whether an access found its item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
  Hit,
  Miss,
}

/// Overall health, ordered from best to worst.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
  #[default]
  Healthy,
  Warning,
  Critical,
}

impl fmt::Display for HealthStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      HealthStatus::Healthy => f.write_str("healthy"),
      HealthStatus::Warning => f.write_str("warning"),
      HealthStatus::Critical => f.write_str("critical"),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
  pub total_accesses: u64,
  pub hits: u64,
  pub misses: u64,
  pub hit_rate: f64,
  pub miss_rate: f64,
  /// Mean over the recent response-time window, in milliseconds.
  pub average_response_ms: f64,
  /// Worst response time in the recent window, in milliseconds.
  pub max_response_ms: f64,
  pub response_samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
  pub severity: HealthStatus,
  pub message: String,
  pub raised_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
  pub status: HealthStatus,
  pub metrics: PerformanceMetrics,
  pub active_alerts: Vec<Alert>,
}

/// Receives timing and access events and reports on them.
pub trait PerformanceMonitor: Send + Sync {
  fn record_response_time(&self, elapsed: Duration);
  fn record_access(&self, outcome: AccessOutcome);
  fn metrics(&self) -> PerformanceMetrics;
  fn performance_summary(&self) -> PerformanceSummary;
  /// Begins periodic evaluation. Calling it again restarts the loop.
  fn start_monitoring(&self, interval: Duration);
  fn stop_monitoring(&self);
}

/// Limits beyond which [`LatencyMonitor`] raises alerts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertThresholds {
  pub warning_response: Duration,
  pub critical_response: Duration,
  /// Hit rates below this raise a warning.
  pub min_hit_rate: f64,
  /// Accesses required before the hit rate is judged at all.
  pub min_accesses: u64,
}

impl Default for AlertThresholds {
  fn default() -> Self {
    Self {
      warning_response: Duration::from_millis(100),
      critical_response: Duration::from_millis(500),
      min_hit_rate: 0.5,
      min_accesses: 20,
    }
  }
}

const RESPONSE_WINDOW: usize = 256;

#[derive(Debug)]
struct MonitorState {
  hits: CachePadded<AtomicU64>,
  misses: CachePadded<AtomicU64>,
  responses_ms: Mutex<VecDeque<f64>>,
  thresholds: AlertThresholds,
}

impl MonitorState {
  fn metrics(&self) -> PerformanceMetrics {
    let hits = self.hits.load(Ordering::Relaxed);
    let misses = self.misses.load(Ordering::Relaxed);
    let total = hits + misses;
    let (hit_rate, miss_rate) = if total == 0 {
      (0.0, 0.0)
    } else {
      (hits as f64 / total as f64, misses as f64 / total as f64)
    };

    let responses = self.responses_ms.lock();
    let samples = responses.len();
    let average = if samples == 0 {
      0.0
    } else {
      responses.iter().sum::<f64>() / samples as f64
    };
    let max = responses.iter().copied().fold(0.0, f64::max);

    PerformanceMetrics {
      total_accesses: total,
      hits,
      misses,
      hit_rate,
      miss_rate,
      average_response_ms: average,
      max_response_ms: max,
      response_samples: samples,
    }
  }

  fn evaluate(&self) -> PerformanceSummary {
    let metrics = self.metrics();
    let limits = &self.thresholds;
    let now = Utc::now();
    let mut alerts = Vec::new();

    let critical_ms = limits.critical_response.as_secs_f64() * 1_000.0;
    let warning_ms = limits.warning_response.as_secs_f64() * 1_000.0;
    if metrics.response_samples > 0 {
      if metrics.average_response_ms > critical_ms {
        alerts.push(Alert {
          severity: HealthStatus::Critical,
          message: format!(
            "average response time {:.1}ms exceeds {:.0}ms",
            metrics.average_response_ms, critical_ms
          ),
          raised_at: now,
        });
      } else if metrics.average_response_ms > warning_ms {
        alerts.push(Alert {
          severity: HealthStatus::Warning,
          message: format!(
            "average response time {:.1}ms exceeds {:.0}ms",
            metrics.average_response_ms, warning_ms
          ),
          raised_at: now,
        });
      }
    }

    if metrics.total_accesses >= limits.min_accesses && metrics.hit_rate < limits.min_hit_rate {
      alerts.push(Alert {
        severity: HealthStatus::Warning,
        message: format!(
          "hit rate {:.1}% below {:.1}%",
          metrics.hit_rate * 100.0,
          limits.min_hit_rate * 100.0
        ),
        raised_at: now,
      });
    }

    let status = alerts
      .iter()
      .map(|a| a.severity)
      .max()
      .unwrap_or(HealthStatus::Healthy);

    PerformanceSummary {
      status,
      metrics,
      active_alerts: alerts,
    }
  }
}

/// A [`PerformanceMonitor`] that keeps counters in memory and evaluates
/// [`AlertThresholds`] on demand or on a periodic background task.
#[derive(Debug)]
pub struct LatencyMonitor {
  state: Arc<MonitorState>,
  monitoring: Mutex<Option<CancellationToken>>,
}

impl Default for LatencyMonitor {
  fn default() -> Self {
    Self::new()
  }
}

impl LatencyMonitor {
  pub fn new() -> Self {
    Self::with_thresholds(AlertThresholds::default())
  }

  pub fn with_thresholds(thresholds: AlertThresholds) -> Self {
    Self {
      state: Arc::new(MonitorState {
        hits: CachePadded::new(AtomicU64::new(0)),
        misses: CachePadded::new(AtomicU64::new(0)),
        responses_ms: Mutex::new(VecDeque::with_capacity(RESPONSE_WINDOW)),
        thresholds,
      }),
      monitoring: Mutex::new(None),
    }
  }

  pub fn is_monitoring(&self) -> bool {
    self.monitoring.lock().is_some()
  }
}

impl PerformanceMonitor for LatencyMonitor {
  fn record_response_time(&self, elapsed: Duration) {
    let mut responses = self.state.responses_ms.lock();
    if responses.len() == RESPONSE_WINDOW {
      responses.pop_front();
    }
    responses.push_back(elapsed.as_secs_f64() * 1_000.0);
  }

  fn record_access(&self, outcome: AccessOutcome) {
    let counter = match outcome {
      AccessOutcome::Hit => &self.state.hits,
      AccessOutcome::Miss => &self.state.misses,
    };
    counter.fetch_add(1, Ordering::Relaxed);
  }

  fn metrics(&self) -> PerformanceMetrics {
    self.state.metrics()
  }

  fn performance_summary(&self) -> PerformanceSummary {
    self.state.evaluate()
  }

  /// Spawns the evaluation loop on the current Tokio runtime.
  ///
  /// Does nothing (besides logging) when called outside a runtime.
  fn start_monitoring(&self, interval: Duration) {
    let handle = match tokio::runtime::Handle::try_current() {
      Ok(handle) => handle,
      Err(_) => {
        warn!("performance monitoring requested outside of a Tokio runtime; ignoring");
        return;
      }
    };

    let token = CancellationToken::new();
    if let Some(previous) = self.monitoring.lock().replace(token.clone()) {
      previous.cancel();
    }

    let state = Arc::clone(&self.state);
    let period = interval.max(Duration::from_millis(1));
    handle.spawn(async move {
      info!(interval_ms = period.as_millis() as u64, "performance monitoring started");
      let mut ticker = tokio::time::interval(period);
      let mut last_status = HealthStatus::Healthy;
      loop {
        tokio::select! {
          biased;
          _ = token.cancelled() => break,
          _ = ticker.tick() => {
            let summary = state.evaluate();
            if summary.status != last_status {
              for alert in &summary.active_alerts {
                warn!(severity = %alert.severity, "{}", alert.message);
              }
              info!(from = %last_status, to = %summary.status, "performance status changed");
              last_status = summary.status;
            } else {
              debug!(status = %summary.status, "performance check");
            }
          }
        }
      }
      info!("performance monitoring stopped");
    });
  }

  fn stop_monitoring(&self) {
    if let Some(token) = self.monitoring.lock().take() {
      token.cancel();
    }
  }
}

impl Drop for LatencyMonitor {
  fn drop(&mut self) {
    self.stop_monitoring();
  }
}
