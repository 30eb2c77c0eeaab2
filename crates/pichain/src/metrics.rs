//! Optional Prometheus metrics. Disabled by default; enable the
//! `metrics` feature to register and update these. Every recording
//! function has a no-op fallback so call sites never need to be
//! `cfg`-gated themselves.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;
#[cfg(feature = "metrics")]
use prometheus::{register_histogram, register_int_counter, Histogram, IntCounter};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref BLOCKS_CREATED: IntCounter =
        register_int_counter!("pichain_blocks_created_total", "Blocks created by this replica")
            .unwrap();
    pub static ref BLOCKS_COMMITTED: IntCounter = register_int_counter!(
        "pichain_blocks_committed_total",
        "Blocks committed by this replica"
    )
    .unwrap();
    pub static ref PAXOS_ROUNDS_STARTED: IntCounter = register_int_counter!(
        "pichain_paxos_rounds_started_total",
        "Paxos rounds this replica initiated as proposer"
    )
    .unwrap();
    pub static ref PAXOS_ROUNDS_WON: IntCounter = register_int_counter!(
        "pichain_paxos_rounds_won_total",
        "Paxos rounds this replica drove to a commit"
    )
    .unwrap();
    pub static ref BLOCK_VALIDATION_LATENCY: Histogram = register_histogram!(
        "pichain_block_validation_latency_seconds",
        "Time spent validating an inbound block"
    )
    .unwrap();
}

#[cfg(feature = "metrics")]
pub fn record_block_created() {
    BLOCKS_CREATED.inc();
}
#[cfg(not(feature = "metrics"))]
pub fn record_block_created() {}

#[cfg(feature = "metrics")]
pub fn record_block_committed() {
    BLOCKS_COMMITTED.inc();
}
#[cfg(not(feature = "metrics"))]
pub fn record_block_committed() {}

#[cfg(feature = "metrics")]
pub fn record_paxos_round_started() {
    PAXOS_ROUNDS_STARTED.inc();
}
#[cfg(not(feature = "metrics"))]
pub fn record_paxos_round_started() {}

#[cfg(feature = "metrics")]
pub fn record_paxos_round_won() {
    PAXOS_ROUNDS_WON.inc();
}
#[cfg(not(feature = "metrics"))]
pub fn record_paxos_round_won() {}

#[cfg(feature = "metrics")]
pub fn observe_validation_latency(seconds: f64) {
    BLOCK_VALIDATION_LATENCY.observe(seconds);
}
#[cfg(not(feature = "metrics"))]
pub fn observe_validation_latency(_seconds: f64) {}
