//! # piChain shared types
//!
//! Domain entities and wire message types shared between the consensus
//! core and its host/transport. Mirrors the role `shared-types` plays for
//! the rest of the workspace: a single source of truth for cross-module
//! types so the core crate never has to reach across a boundary to define
//! something another module also needs.

pub mod block;
pub mod message;
pub mod role;

pub use block::{compose_id, Block, BlockId, NodeId, Seq, Transaction, TxnId};
pub use message::{Message, PaxosMessage};
pub use role::Role;
