use crate::handles::RecipeCache;
use crate::monitor::HealthStatus;

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Spawns the periodic maintenance loop on the current Tokio runtime.
///
/// Every tick refreshes priorities, logs the health verdict, and evicts
/// down to budget when the registry has grown past it. The loop ends when
/// `token` is cancelled or the cache is disposed.
pub(crate) fn spawn(cache: RecipeCache, interval: Duration, token: CancellationToken) -> JoinHandle<()> {
  let shutdown = cache.shared.shutdown.child_token();
  let period = interval.max(Duration::from_millis(1));

  tokio::spawn(async move {
    info!(interval_ms = period.as_millis() as u64, "cache health task started");
    let mut ticker = tokio::time::interval(period);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
      tokio::select! {
        biased;
        _ = token.cancelled() => break,
        _ = shutdown.cancelled() => break,
        _ = ticker.tick() => tick(&cache).await,
      }
    }
    info!("cache health task stopped");
  })
}

async fn tick(cache: &RecipeCache) {
  let refreshed = cache.recalculate_priorities();
  debug!(refreshed, "priorities recalculated");

  let health = match cache.get_cache_health().await {
    Ok(health) => health,
    Err(error) => {
      warn!(error = %error, "health check failed");
      return;
    }
  };

  match health.status {
    HealthStatus::Healthy => debug!(status = %health.status, "cache health check"),
    HealthStatus::Warning | HealthStatus::Critical => {
      for issue in &health.issues {
        warn!(status = %health.status, "{issue}");
      }
    }
  }

  if health.stats.utilization_rate > 1.0 || health.stats.size_utilization_rate > 1.0 {
    match cache.enforce_budgets().await {
      Ok(outcome) => info!(evicted = outcome.evicted.len(), "cache brought back within budget"),
      Err(error) => warn!(error = %error, "budget enforcement failed"),
    }
  }
}
