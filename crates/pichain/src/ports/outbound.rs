use async_trait::async_trait;
use pichain_types::block::NodeId;
use pichain_types::Message;

use crate::domain::error::NodeError;

/// Wire send/broadcast to the rest of the peer set. A production adapter
/// frames each message with its `kind_tag()` and drives real sockets;
/// only an in-memory loopback adapter is provided here (see
/// `adapters::loopback_transport`) — real transport is left to the host.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, to: NodeId, message: Message);
    async fn broadcast(&self, message: Message);
}

/// Durable key-value storage for the handful of fields a replica must
/// recover after a restart: its sequence counter, head block id, and
/// committed block id.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, NodeError>;
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), NodeError>;
}

/// Delivers committed transaction payloads to the embedding application.
/// A failure here is one of the two fatal conditions a replica cannot
/// route around (see [`NodeError`]).
#[async_trait]
pub trait CommitHandler: Send + Sync {
    async fn on_commit(&self, contents: Vec<Vec<u8>>) -> Result<(), NodeError>;
}
