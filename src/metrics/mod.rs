use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;
use tracing::error;


lazy_static! {
    pub static ref WATCHERS_NOTIFIED: IntCounter = IntCounter::new(
        "directory_watchers_notified",
        "Number of one-shot watcher callbacks delivered"
    )
    .expect("metric can not be created");

    pub static ref WATCHER_FAILURES: IntCounter = IntCounter::new(
        "directory_watcher_failures",
        "Number of watcher callbacks that panicked during delivery"
    )
    .expect("metric can not be created");

    pub static ref BATCH_OUTCOMES: IntCounterVec = IntCounterVec::new(
        Opts::new("directory_batch_outcomes", "Multi-op batches by outcome"),
        &["outcome"]
    )
    .expect("Should succeed to create metric");

    pub static ref EPHEMERALS_EXPIRED: IntCounter = IntCounter::new(
        "directory_ephemerals_expired",
        "Ephemeral nodes removed because their session expired"
    )
    .expect("metric can not be created");

    pub static ref REACTOR_TASK_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("reactor_task_failures", "Reactor work items that panicked"),
        &["reactor"]
    )
    .expect("Should succeed to create metric");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER: Once = Once::new();

fn register_custom_metrics() {
    REGISTER.call_once(|| {
        REGISTRY
            .register(Box::new(WATCHERS_NOTIFIED.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(WATCHER_FAILURES.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(BATCH_OUTCOMES.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(EPHEMERALS_EXPIRED.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(REACTOR_TASK_FAILURES.clone()))
            .expect("collector can be registered");
    });
}

/// Export metrics in the Prometheus text exposition format
pub fn gather_metrics() -> String {
    register_custom_metrics();

    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
        return String::default();
    }
    match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    }
}
