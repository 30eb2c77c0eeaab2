use std::time::{Duration, SystemTime, UNIX_EPOCH};

use pichain_types::block::NodeId;
use pichain_types::Message;
use rand::Rng;

use crate::domain::pipeline::{Coordinator, Effect};

/// Route an inbound wire message to the `Coordinator` method that owns
/// its kind. `HEL`/`ACK` round-trip through the same codec as everything
/// else but the core has nothing to do with them beyond acknowledging
/// receipt, so they fall through to no effects.
pub fn dispatch(
    coordinator: &mut Coordinator,
    from: NodeId,
    message: Message,
    rng: &mut impl Rng,
) -> Vec<Effect> {
    match message {
        Message::Hello { .. } | Message::HelloAck { .. } => Vec::new(),
        Message::Paxos(paxos_message) => coordinator.receive_paxos(from, paxos_message, rng),
        Message::Block(block) => coordinator.receive_block(block, rng),
        Message::Txn(txn) => coordinator.receive_transaction(txn, rng),
        Message::RequestBlock { block_id } => coordinator.receive_request_block(block_id, from),
        Message::RespondBlock { blocks } => coordinator.receive_respond_blocks(blocks),
        Message::Ping { sent_at_millis } => {
            vec![Effect::Send(from, Message::Pong { sent_at_millis })]
        }
        Message::Pong { sent_at_millis } => {
            let now_millis = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64;
            let rtt = Duration::from_millis(now_millis.saturating_sub(sent_at_millis));
            coordinator.receive_pong(from, rtt)
        }
        Message::AckCommit { block_id } => coordinator.receive_ack_commit(block_id, from),
    }
}
