use thiserror::Error;

/// Fatal conditions a replica cannot fold back into its own state machine.
/// Everything recoverable (a stale Paxos round, an unknown peer, a block
/// that fails validation) is handled inline and logged via `tracing`
/// instead of being surfaced here — see the module docs on
/// [`crate::domain::pipeline`].
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("host callback failure: {0}")]
    HostCallback(String),
}

pub type NodeResult<T> = Result<T, NodeError>;
