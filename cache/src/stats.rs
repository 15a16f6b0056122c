//! Health and statistics reporting.

use crate::config::CacheConfig;
use crate::entry::CacheEntry;
use crate::monitor::{HealthStatus, PerformanceSummary};
use crate::registry::Registry;
use crate::store::StorageStats;

use serde::Serialize;

/// Utilization at or above this share of a budget raises a warning.
const HIGH_UTILIZATION: f64 = 0.9;
/// Staleness above this share raises a warning.
const HIGH_STALENESS: f64 = 0.5;
const LOW_HIT_RATE: f64 = 0.5;
/// Lookups required before the hit rate is judged.
const MIN_LOOKUPS_FOR_HIT_RATE: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionStats {
  pub enabled: bool,
  /// Mean ratio over entries that actually compress (ratio < 1.0).
  pub average_ratio: f64,
  /// Σ(original size − compressed size) over all entries.
  pub space_saved: u64,
}

impl CompressionStats {
  pub(crate) fn from_entries<'a>(entries: impl IntoIterator<Item = &'a CacheEntry>) -> Self {
    let mut compressed = 0usize;
    let mut ratio_sum = 0.0;
    let mut space_saved = 0u64;

    for entry in entries {
      if entry.compression_ratio < 1.0 {
        compressed += 1;
        ratio_sum += entry.compression_ratio;
      }
      space_saved = space_saved.saturating_add(entry.space_saved());
    }

    Self {
      enabled: true,
      average_ratio: if compressed == 0 {
        1.0
      } else {
        ratio_sum / compressed as f64
      },
      space_saved,
    }
  }
}

/// Figures taken from the registry under a single lock.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RegistryFigures {
  pub(crate) entry_count: usize,
  pub(crate) total_size: u64,
  pub(crate) stale_count: usize,
  pub(crate) fragmentation: f64,
  pub(crate) compression: Option<CompressionStats>,
}

impl RegistryFigures {
  pub(crate) fn collect(registry: &Registry, compression_enabled: bool) -> Self {
    Self {
      entry_count: registry.len(),
      total_size: registry.total_size(),
      stale_count: registry.iter().filter(|e| e.is_stale).count(),
      fragmentation: registry.fragmentation(),
      compression: compression_enabled.then(|| CompressionStats::from_entries(registry.iter())),
    }
  }
}

/// A point-in-time report combining persistent store figures with the
/// registry's own.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
  /// Counts and sizes as reported by the persistent store.
  pub storage: StorageStats,
  pub entry_count: usize,
  /// Estimated bytes held by the registry's entries.
  pub cached_size: u64,
  pub stale_count: usize,
  pub hit_rate: f64,
  pub miss_rate: f64,
  /// stale entries / entries, 0 when empty.
  pub staleness_rate: f64,
  /// Vacant registry slots / slots in use at peak.
  pub fragmentation_rate: f64,
  /// entries / max entries.
  pub utilization_rate: f64,
  /// cached size / max cache size.
  pub size_utilization_rate: f64,
  /// Present only while compression is enabled.
  pub compression: Option<CompressionStats>,
}

impl CacheStats {
  pub(crate) fn assemble(
    storage: StorageStats,
    figures: RegistryFigures,
    config: &CacheConfig,
    (hit_rate, miss_rate): (f64, f64),
  ) -> Self {
    let ratio = |part: f64, whole: f64| if whole > 0.0 { part / whole } else { 0.0 };

    Self {
      storage,
      entry_count: figures.entry_count,
      cached_size: figures.total_size,
      stale_count: figures.stale_count,
      hit_rate,
      miss_rate,
      staleness_rate: ratio(figures.stale_count as f64, figures.entry_count as f64),
      fragmentation_rate: figures.fragmentation,
      utilization_rate: ratio(figures.entry_count as f64, config.max_entries as f64),
      size_utilization_rate: ratio(figures.total_size as f64, config.max_cache_size_bytes as f64),
      compression: figures.compression,
    }
  }
}

/// A health verdict with the reasons behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheHealth {
  pub status: HealthStatus,
  pub issues: Vec<String>,
  pub stats: CacheStats,
  /// The performance monitor's own view, when one is attached.
  pub performance: Option<PerformanceSummary>,
}

impl CacheHealth {
  pub(crate) fn assess(
    stats: CacheStats,
    lookups: u64,
    performance: Option<PerformanceSummary>,
  ) -> Self {
    let mut status = HealthStatus::Healthy;
    let mut issues = Vec::new();
    let mut raise = |level: HealthStatus, issue: String| {
      status = status.max(level);
      issues.push(issue);
    };

    for (label, rate) in [
      ("entry", stats.utilization_rate),
      ("size", stats.size_utilization_rate),
    ] {
      if rate > 1.0 {
        raise(
          HealthStatus::Critical,
          format!("{label} budget exceeded ({:.0}%)", rate * 100.0),
        );
      } else if rate >= HIGH_UTILIZATION {
        raise(
          HealthStatus::Warning,
          format!("{label} budget nearly full ({:.0}%)", rate * 100.0),
        );
      }
    }

    if stats.staleness_rate > HIGH_STALENESS {
      raise(
        HealthStatus::Warning,
        format!("{:.0}% of entries are stale", stats.staleness_rate * 100.0),
      );
    }

    if lookups >= MIN_LOOKUPS_FOR_HIT_RATE && stats.hit_rate < LOW_HIT_RATE {
      raise(
        HealthStatus::Warning,
        format!("hit rate is {:.0}%", stats.hit_rate * 100.0),
      );
    }

    if let Some(summary) = &performance {
      for alert in &summary.active_alerts {
        raise(alert.severity, alert.message.clone());
      }
    }

    Self {
      status,
      issues,
      stats,
      performance,
    }
  }
}
