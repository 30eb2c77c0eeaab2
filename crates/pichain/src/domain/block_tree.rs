use std::collections::{HashMap, HashSet};

use pichain_types::block::GENESIS_BLOCK_ID;
use pichain_types::{Block, BlockId};

/// Holds every block a replica currently knows about and the two pointers
/// that matter for safety: `committed` (the prefix every correct replica
/// agrees on) and `head` (this replica's current view of the longest
/// valid chain). Depth is computed on insertion from the parent's depth,
/// so a block can only be added once its parent is already stored.
///
/// Invariants maintained by this type (a caller that only goes through
/// these methods cannot violate them):
/// - `committed` is always an ancestor of `head`.
/// - no stored block has a parent id that is not itself stored, except
///   the current genesis, whose parent is always `None`.
/// - depth is monotonically non-decreasing along any parent chain.
pub struct BlockStore {
    blocks: HashMap<BlockId, Block>,
    head_id: BlockId,
    committed_id: BlockId,
    genesis_id: BlockId,
}

impl BlockStore {
    pub fn new() -> Self {
        let genesis = Block::genesis();
        let id = genesis.block_id;
        let mut blocks = HashMap::new();
        blocks.insert(id, genesis);
        BlockStore {
            blocks,
            head_id: id,
            committed_id: id,
            genesis_id: id,
        }
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.blocks.contains_key(&id)
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    pub fn head(&self) -> &Block {
        self.blocks.get(&self.head_id).expect("head is always stored")
    }

    pub fn head_id(&self) -> BlockId {
        self.head_id
    }

    pub fn committed(&self) -> &Block {
        self.blocks
            .get(&self.committed_id)
            .expect("committed is always stored")
    }

    pub fn committed_id(&self) -> BlockId {
        self.committed_id
    }

    pub fn genesis_id(&self) -> BlockId {
        self.genesis_id
    }

    pub fn set_head(&mut self, id: BlockId) {
        debug_assert!(self.blocks.contains_key(&id));
        self.head_id = id;
    }

    pub fn set_committed(&mut self, id: BlockId) {
        debug_assert!(self.blocks.contains_key(&id));
        self.committed_id = id;
    }

    /// Insert `block`, deriving its depth from its parent. Returns `true`
    /// if the block is now (or was already) stored, `false` if its parent
    /// is unknown and the caller needs to fetch ancestors first.
    pub fn add_block(&mut self, mut block: Block) -> bool {
        if self.blocks.contains_key(&block.block_id) {
            return true;
        }
        let parent_id = match block.parent_block_id {
            Some(id) => id,
            None => return block.block_id == GENESIS_BLOCK_ID,
        };
        let parent_depth = match self.blocks.get(&parent_id) {
            Some(parent) => parent.depth.expect("stored blocks always have a depth"),
            None => return false,
        };
        block.depth = Some(parent_depth + block.txs.len() as u64);
        self.blocks.insert(block.block_id, block);
        true
    }

    /// True if `ancestor_id` lies on `block_id`'s parent chain (inclusive
    /// of `block_id` itself).
    pub fn ancestor(&self, ancestor_id: BlockId, block_id: BlockId) -> bool {
        let mut cur = block_id;
        loop {
            if cur == ancestor_id {
                return true;
            }
            match self.blocks.get(&cur).and_then(|b| b.parent_block_id) {
                Some(parent) => cur = parent,
                None => return false,
            }
        }
    }

    /// Walk both chains up to their lowest common ancestor.
    pub fn common_ancestor(&self, a_id: BlockId, b_id: BlockId) -> BlockId {
        let mut a = a_id;
        let mut b = b_id;
        let depth_of = |id: BlockId, store: &Self| store.blocks[&id].depth.unwrap_or(0);

        while depth_of(a, self) > depth_of(b, self) {
            a = self.blocks[&a].parent_block_id.expect("ancestor chain reaches genesis");
        }
        while depth_of(b, self) > depth_of(a, self) {
            b = self.blocks[&b].parent_block_id.expect("ancestor chain reaches genesis");
        }
        while a != b && (a != self.genesis_id || b != self.genesis_id) {
            a = self.blocks[&a].parent_block_id.expect("ancestor chain reaches genesis");
            b = self.blocks[&b].parent_block_id.expect("ancestor chain reaches genesis");
        }
        a
    }

    /// A block is acceptable as a new head once it descends from the
    /// committed block and is not worse than the current head under the
    /// depth/creator-id fork-choice order.
    pub fn valid(&self, block_id: BlockId) -> bool {
        let block = match self.blocks.get(&block_id) {
            Some(b) => b,
            None => return false,
        };
        if !self.ancestor(self.committed_id, block_id) {
            return false;
        }
        !(*block < *self.head())
    }

    /// The committed chain from genesis to the committed block, oldest
    /// first. Used for introspection/logging only.
    pub fn committed_chain(&self) -> Vec<BlockId> {
        let mut chain = Vec::new();
        let mut cur = self.committed_id;
        loop {
            chain.push(cur);
            match self.blocks.get(&cur).and_then(|b| b.parent_block_id) {
                Some(parent) => cur = parent,
                None => break,
            }
        }
        chain.reverse();
        chain
    }

    /// Up to `limit` ancestors of `block_id`, starting with `block_id`
    /// itself, walking toward genesis. Backs the recovery response to a
    /// `RequestBlock`.
    pub fn ancestors(&self, block_id: BlockId, limit: usize) -> Vec<Block> {
        let mut result = Vec::new();
        let mut cur = Some(block_id);
        while let Some(id) = cur {
            let Some(block) = self.blocks.get(&id) else { break };
            result.push(block.clone());
            if result.len() >= limit {
                break;
            }
            cur = block.parent_block_id;
        }
        result
    }

    /// Advance genesis to `new_genesis_id` and drop every block that is
    /// no longer reachable as an ancestor of anything at or above it.
    /// Only called once every live peer has acknowledged the commit
    /// (see the coordinator's ack-commit bookkeeping) so no replica can
    /// still need the pruned blocks as ancestor references.
    pub fn advance_genesis(&mut self, new_genesis_id: BlockId) {
        if !self.blocks.contains_key(&new_genesis_id) {
            return;
        }
        // a block survives iff it descends from the new genesis, i.e.
        // walking its parent chain reaches `new_genesis_id`. Depth alone
        // is not enough: a sibling fork at or above the new genesis's
        // depth would pass a depth-only filter while its own ancestors
        // below that depth are pruned, leaving a dangling parent_block_id.
        let keep: HashSet<BlockId> = self
            .blocks
            .keys()
            .copied()
            .filter(|&id| self.ancestor(new_genesis_id, id))
            .collect();
        self.blocks.retain(|id, _| keep.contains(id));
        if let Some(block) = self.blocks.get_mut(&new_genesis_id) {
            block.parent_block_id = None;
        }
        self.genesis_id = new_genesis_id;
    }
}

impl Default for BlockStore {
    fn default() -> Self {
        Self::new()
    }
}
