pub mod block_tree;
pub mod error;
pub mod paxos;
pub mod pipeline;
pub mod role_engine;

pub use block_tree::BlockStore;
pub use error::{NodeError, NodeResult};
pub use paxos::{PaxosDriver, PaxosOutcome};
pub use pipeline::{Coordinator, Effect, PersistOp};
pub use role_engine::RoleEngine;
