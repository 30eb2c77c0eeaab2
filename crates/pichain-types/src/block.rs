use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::role::Role;

/// Index of a replica in the fixed peer set. Genesis uses `-1` as a
/// sentinel creator so genesis never collides with a real replica's id.
pub type NodeId = i32;

/// Per-replica monotonic counter used to build block and transaction ids.
pub type Seq = u64;

pub type BlockId = i64;
pub type TxnId = i64;

/// Combine a creator id and that creator's local sequence counter into a
/// single id that is unique cluster-wide without any coordination: two
/// replicas never share a `creator_id`, so `(creator_id, seq)` pairs never
/// collide between them.
pub fn compose_id(creator_id: NodeId, seq: Seq) -> i64 {
    (creator_id as i64) | ((seq as i64) << 16)
}

pub const GENESIS_BLOCK_ID: BlockId = -1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub txn_id: TxnId,
    pub creator_id: NodeId,
    pub content: Vec<u8>,
}

impl Transaction {
    pub fn new(creator_id: NodeId, seq: Seq, content: Vec<u8>) -> Self {
        Transaction {
            txn_id: compose_id(creator_id, seq),
            creator_id,
            content,
        }
    }
}

/// Equality and hashing are keyed on `txn_id` alone: two `Transaction`
/// values with the same id are the same transaction regardless of any
/// other field, which is what the known-transaction and pending-queue
/// dedup sets rely on.
impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.txn_id == other.txn_id
    }
}
impl Eq for Transaction {}

impl std::hash::Hash for Transaction {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.txn_id.hash(state);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub block_id: BlockId,
    pub creator_id: NodeId,
    pub parent_block_id: Option<BlockId>,
    pub txs: Vec<Transaction>,
    /// Cumulative transaction count from genesis to this block, inclusive.
    /// `None` until the Block Store computes it on insertion (a block
    /// freshly built by this replica already knows its own depth; a block
    /// received over the wire does not until its parent is on hand).
    pub depth: Option<u64>,
    pub creator_state: Role,
}

impl Block {
    pub fn new(
        creator_id: NodeId,
        seq: Seq,
        parent_block_id: Option<BlockId>,
        txs: Vec<Transaction>,
        creator_state: Role,
    ) -> Self {
        Block {
            block_id: compose_id(creator_id, seq),
            creator_id,
            parent_block_id,
            txs,
            depth: None,
            creator_state,
        }
    }

    pub fn genesis() -> Self {
        Block {
            block_id: GENESIS_BLOCK_ID,
            creator_id: -1,
            parent_block_id: None,
            txs: Vec::new(),
            depth: Some(0),
            creator_state: Role::Quick,
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.block_id == GENESIS_BLOCK_ID
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.block_id == other.block_id
    }
}
impl Eq for Block {}

/// Total ordering used for fork choice: deeper blocks win; ties are broken
/// by creator id. Both sides must have a known `depth` — the Block Store
/// guarantees this for any block reachable from genesis before it is
/// compared.
impl PartialOrd for Block {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Block {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.depth, other.depth) {
            (Some(a), Some(b)) if a != b => a.cmp(&b),
            _ => self.creator_id.cmp(&other.creator_id),
        }
    }
}
