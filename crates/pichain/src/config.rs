use std::time::Duration;

/// Tunable timing and batching parameters. Field names track the
/// constants a replica is configured with; defaults are the values used
/// throughout development and the scenario tests.
#[derive(Debug, Clone)]
pub struct Config {
    /// Extra time a `Quick` replica waits on top of its (zero) patience
    /// before proposing, so a handful of transactions can accumulate into
    /// one block instead of one block per transaction.
    pub accumulation_time: Duration,
    /// Upper bound a Paxos round is allowed to run before the coordinator
    /// gives up on it and lets the next patience timeout start a fresh
    /// round for the same pending transactions.
    pub max_commit_time: Duration,
    /// A block is proposed once its pending queue reaches this many
    /// transactions, even if the patience timer has not yet fired.
    pub max_txn_count: usize,
    /// Number of ancestor blocks a `RespondBlock` reply carries alongside
    /// the requested block, letting a replica catch up several blocks at
    /// once instead of one round trip per missing ancestor.
    pub recovery_blocks_count: usize,
    /// Multiplier applied on top of the measured RTT for `Medium`
    /// patience and the floor of `Slow` patience.
    pub epsilon: f64,
    /// RTT assumed before any `Pong` replies have been observed.
    pub initial_expected_rtt: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            accumulation_time: Duration::from_millis(100),
            max_commit_time: Duration::from_secs(2),
            max_txn_count: 7500,
            recovery_blocks_count: 5,
            epsilon: 0.001,
            initial_expected_rtt: Duration::from_secs(1),
        }
    }
}
