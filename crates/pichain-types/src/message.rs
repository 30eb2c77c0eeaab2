use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockId, NodeId};
use crate::Transaction;

/// The five Paxos sub-messages, all carried under the `PAM` wire tag. This
/// mirrors treating Paxos traffic as one family with an inner kind, rather
/// than giving each sub-message its own top-level tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PaxosMessage {
    Try {
        request_seq: u64,
        new_block: Block,
        last_committed_block: Block,
    },
    TryOk {
        request_seq: u64,
        prop_block: Option<Block>,
        supp_block: Option<Block>,
    },
    Propose {
        request_seq: u64,
        com_block: Block,
        new_block: Block,
    },
    ProposeAck {
        request_seq: u64,
        com_block: Block,
    },
    Commit {
        request_seq: u64,
        com_block: Block,
    },
}

/// Top-level wire message. `kind_tag` returns the 3-character tag a
/// transport frames the message with; `PaxosMessage` always travels under
/// the single `PAM` tag regardless of its inner variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Message {
    Hello { node_index: NodeId },
    HelloAck { node_index: NodeId },
    Paxos(PaxosMessage),
    Block(Block),
    Txn(Transaction),
    RequestBlock { block_id: BlockId },
    RespondBlock { blocks: Vec<Block> },
    Ping { sent_at_millis: u64 },
    Pong { sent_at_millis: u64 },
    AckCommit { block_id: BlockId },
}

impl Message {
    pub fn kind_tag(&self) -> &'static str {
        match self {
            Message::Hello { .. } => "HEL",
            Message::HelloAck { .. } => "ACK",
            Message::Paxos(_) => "PAM",
            Message::Block(_) => "BLK",
            Message::Txn(_) => "TXN",
            Message::RequestBlock { .. } => "RQB",
            Message::RespondBlock { .. } => "RSB",
            Message::Ping { .. } => "PIN",
            Message::Pong { .. } => "PON",
            Message::AckCommit { .. } => "ACM",
        }
    }
}
