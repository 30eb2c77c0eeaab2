//! Exercises the actor/transport layer itself (not just the pure
//! `Coordinator` logic the other scenarios drive directly), so a wiring
//! mistake in `service::node` or `adapters::loopback_transport` would
//! show up here even if `Coordinator` is correct in isolation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use pichain::adapters::in_memory_kv::InMemoryKvStore;
use pichain::adapters::loopback_transport::{Inbox, LoopbackTransport};
use pichain::domain::error::NodeError;
use pichain::ports::inbound::NodeApi;
use pichain::ports::outbound::CommitHandler;
use pichain::{spawn, Config, Node};
use tokio::sync::mpsc;

#[derive(Clone, Default)]
struct RecordingCommitHandler {
    seen: Arc<Mutex<Vec<Vec<u8>>>>,
}

#[async_trait]
impl CommitHandler for RecordingCommitHandler {
    async fn on_commit(&self, contents: Vec<Vec<u8>>) -> Result<(), NodeError> {
        self.seen.lock().extend(contents);
        Ok(())
    }
}

/// Spin up `n` replicas wired together through real `LoopbackTransport`
/// inboxes and a background pump per replica that forwards everything
/// arriving on its inbox into its `Node::deliver`.
fn spawn_cluster(n: usize, handlers: &[RecordingCommitHandler]) -> Vec<Node> {
    let mut inboxes: HashMap<i32, Inbox> = HashMap::new();
    let mut rxs = Vec::new();
    for id in 0..n as i32 {
        let (tx, rx) = mpsc::unbounded_channel();
        inboxes.insert(id, tx);
        rxs.push(rx);
    }

    let mut nodes = Vec::new();
    for (id, mut rx) in (0i32..n as i32).zip(rxs.into_iter()) {
        let transport = LoopbackTransport::new(id, inboxes.clone());
        let node = spawn(
            id,
            n,
            Config::default(),
            transport,
            InMemoryKvStore::new(),
            handlers[id as usize].clone(),
        );
        let forward_to = node.clone();
        tokio::spawn(async move {
            while let Some((from, message)) = rx.recv().await {
                let _ = forward_to.deliver(from, message).await;
            }
        });
        nodes.push(node);
    }
    nodes
}

#[tokio::test(flavor = "multi_thread")]
async fn a_submitted_transaction_is_committed_across_the_real_actor_stack() {
    let handlers: Vec<RecordingCommitHandler> = (0..3).map(|_| RecordingCommitHandler::default()).collect();
    let nodes = spawn_cluster(3, &handlers);

    nodes[0].submit(b"hello from the actor stack".to_vec()).await.unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if handlers.iter().all(|h| !h.seen.lock().is_empty()) {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "commit did not propagate in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    for handler in &handlers {
        assert_eq!(handler.seen.lock().as_slice(), &[b"hello from the actor stack".to_vec()]);
    }
}
