//! Prometheus metrics (spec.md §4.7 "observability hook", §2 ambient
//! stack). Grounded in the teacher's `main.rs` registry pattern: one
//! lazily-built `Registry`, a handful of static gauges/counters
//! registered into it at process start, rendered on demand.

use once_cell::sync::Lazy;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};

pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

pub static ACTIVE_SHARDS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("shard_mine_active_shards", "Number of live shards").expect("metric construction")
});

pub static ACTIVE_PLAYERS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("shard_mine_active_players", "Number of connected players").expect("metric construction")
});

pub static TICKS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("shard_mine_ticks_total", "Total game loop ticks executed across all shards").expect("metric construction")
});

pub static DIGS_PROCESSED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("shard_mine_digs_processed_total", "Total dig commands processed").expect("metric construction")
});

pub static DIGS_RATE_LIMITED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("shard_mine_digs_rate_limited_total", "Total dig commands rejected by the rate limiter").expect("metric construction")
});

pub static TICK_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    let opts = HistogramOpts::new("shard_mine_tick_duration_seconds", "Wall-clock duration of one tick");
    Histogram::with_opts(opts).expect("metric construction")
});

/// Registers every metric into the global registry. Call once at
/// startup; registering the same metric twice returns an error from
/// `prometheus`, which we log and ignore since it only happens under
/// test re-initialization.
pub fn init() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(ACTIVE_SHARDS.clone()),
        Box::new(ACTIVE_PLAYERS.clone()),
        Box::new(TICKS_TOTAL.clone()),
        Box::new(DIGS_PROCESSED_TOTAL.clone()),
        Box::new(DIGS_RATE_LIMITED_TOTAL.clone()),
        Box::new(TICK_DURATION_SECONDS.clone()),
    ];
    for collector in collectors {
        if let Err(e) = REGISTRY.register(collector) {
            tracing::debug!("metric already registered: {e}");
        }
    }
}

/// Renders the registry in Prometheus text exposition format.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).ok();
    String::from_utf8_lossy(&buffer).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_registered_metric_names() {
        init();
        ACTIVE_SHARDS.set(3);
        let text = render();
        assert!(text.contains("shard_mine_active_shards"));
    }
}
