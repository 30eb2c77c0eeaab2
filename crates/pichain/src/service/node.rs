use async_trait::async_trait;
use pichain_types::block::NodeId;
use pichain_types::{Message, TxnId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::domain::error::NodeError;
use crate::domain::pipeline::{Coordinator, Effect, PersistOp};
use crate::ipc::dispatch;
use crate::ports::inbound::NodeApi;
use crate::ports::outbound::{CommitHandler, KvStore, Transport};

enum Event {
    Submit(Vec<u8>),
    Deliver(NodeId, Message),
    TimerFired(TxnId),
}

/// A running replica. All state lives in a single task (see [`spawn`]);
/// this handle is just a channel into it, so it can be cloned and shared
/// between the transport's receive loop and the host freely.
#[derive(Clone)]
pub struct Node {
    events: mpsc::UnboundedSender<Event>,
}

#[async_trait]
impl NodeApi for Node {
    async fn submit(&self, content: Vec<u8>) -> Result<(), NodeError> {
        self.events
            .send(Event::Submit(content))
            .map_err(|_| NodeError::HostCallback("replica task has stopped".into()))
    }

    async fn deliver(&self, from: NodeId, message: Message) -> Result<(), NodeError> {
        self.events
            .send(Event::Deliver(from, message))
            .map_err(|_| NodeError::HostCallback("replica task has stopped".into()))
    }
}

/// Start a replica's actor task and return a handle to it. The task owns
/// the `Coordinator` exclusively and drains one event at a time —
/// submissions, inbound messages, and timer firings all funnel through
/// the same channel, so handlers never interleave.
pub fn spawn<T, K, C>(
    node_id: NodeId,
    peer_count: usize,
    config: Config,
    transport: T,
    mut kv: K,
    commit_handler: C,
) -> Node
where
    T: Transport + 'static,
    K: KvStore + 'static,
    C: CommitHandler + 'static,
{
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<Event>();
    let timer_tx = events_tx.clone();

    tokio::spawn(async move {
        let mut coordinator = Coordinator::new(node_id, peer_count, config);
        let mut rng = StdRng::from_entropy();

        while let Some(event) = events_rx.recv().await {
            let effects = match event {
                Event::Submit(content) => coordinator.submit(content, &mut rng),
                Event::Deliver(from, message) => dispatch(&mut coordinator, from, message, &mut rng),
                Event::TimerFired(txn_id) => coordinator.timer_fired(txn_id, &mut rng),
            };
            for effect in effects {
                if let Err(err) = apply_effect(effect, &transport, &mut kv, &commit_handler, &timer_tx).await {
                    tracing::error!(node_id, %err, "replica halting on a fatal error");
                    return;
                }
            }
        }
    });

    Node { events: events_tx }
}

/// Carries out one `Effect`. Persistence failures and host commit-callback
/// failures are the two conditions a replica cannot fold back into its own
/// state machine (see [`NodeError`]); both are propagated here so the
/// caller halts the replica rather than continuing on corrupted state.
async fn apply_effect<T, K, C>(
    effect: Effect,
    transport: &T,
    kv: &mut K,
    commit_handler: &C,
    timer_events: &mpsc::UnboundedSender<Event>,
) -> Result<(), NodeError>
where
    T: Transport,
    K: KvStore,
    C: CommitHandler,
{
    match effect {
        Effect::Send(to, message) => transport.send(to, message).await,
        Effect::Broadcast(message) => {
            match &message {
                Message::Block(_) => crate::metrics::record_block_created(),
                Message::Paxos(pichain_types::PaxosMessage::Try { .. }) => {
                    crate::metrics::record_paxos_round_started()
                }
                Message::Paxos(pichain_types::PaxosMessage::Commit { .. }) => {
                    crate::metrics::record_paxos_round_won()
                }
                _ => {}
            }
            transport.broadcast(message).await
        }
        Effect::Commit(contents) => {
            commit_handler.on_commit(contents).await?;
            crate::metrics::record_block_committed();
        }
        Effect::Persist(op) => {
            let (key, value): (&[u8], Vec<u8>) = match op {
                PersistOp::Counter(seq) => (b"counter", seq.to_le_bytes().to_vec()),
                PersistOp::Head(id) => (b"head_block", id.to_le_bytes().to_vec()),
                PersistOp::Committed(id) => (b"committed_block", id.to_le_bytes().to_vec()),
            };
            kv.put(key, &value)?;
        }
        Effect::StartTimer { txn_id, after } => {
            let tx = timer_events.clone();
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                let _ = tx.send(Event::TimerFired(txn_id));
            });
        }
    }
    Ok(())
}
