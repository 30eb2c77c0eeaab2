use async_trait::async_trait;
use pichain_types::block::NodeId;
use pichain_types::Message;

use crate::domain::error::NodeError;

/// The host-facing surface of a running replica: submit a new command and
/// hand the replica messages that arrived over the transport. Implemented
/// by [`crate::service::node::Node`].
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// Submit `content` to be proposed as a transaction. Returns once the
    /// submission has been accepted into the local pending queue, not
    /// once it is committed — commit delivery happens asynchronously via
    /// [`super::outbound::CommitHandler`].
    async fn submit(&self, content: Vec<u8>) -> Result<(), NodeError>;

    /// Hand the replica a message that arrived from `from` over the
    /// transport.
    async fn deliver(&self, from: NodeId, message: Message) -> Result<(), NodeError>;
}
