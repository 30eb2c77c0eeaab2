use std::collections::HashMap;

use async_trait::async_trait;
use pichain_types::block::NodeId;
use pichain_types::Message;
use tokio::sync::mpsc;

use crate::ports::outbound::Transport;

/// Mailbox a [`LoopbackTransport`] delivers into: the sender half a
/// replica's actor reads its inbound channel from. Keyed by `NodeId` so
/// a whole in-process cluster can wire up to each other without sockets.
pub type Inbox = mpsc::UnboundedSender<(NodeId, Message)>;

/// In-process `Transport` that delivers directly into peer inboxes.
/// Stands in for a real socket-based transport in tests and single-process
/// embeddings; production wire I/O is left to the host.
pub struct LoopbackTransport {
    self_id: NodeId,
    peers: HashMap<NodeId, Inbox>,
}

impl LoopbackTransport {
    pub fn new(self_id: NodeId, peers: HashMap<NodeId, Inbox>) -> Self {
        LoopbackTransport { self_id, peers }
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&self, to: NodeId, message: Message) {
        if let Some(inbox) = self.peers.get(&to) {
            let _ = inbox.send((self.self_id, message));
        }
    }

    async fn broadcast(&self, message: Message) {
        for (peer_id, inbox) in &self.peers {
            if *peer_id != self.self_id {
                let _ = inbox.send((self.self_id, message.clone()));
            }
        }
    }
}
