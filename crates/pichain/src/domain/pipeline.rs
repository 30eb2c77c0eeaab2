use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use pichain_types::block::{NodeId, Seq};
use pichain_types::{Block, BlockId, Message, PaxosMessage, Role, Transaction, TxnId};
use rand::Rng;

use crate::config::Config;
use crate::domain::block_tree::BlockStore;
use crate::domain::paxos::PaxosDriver;
use crate::domain::role_engine::RoleEngine;

/// A key the coordinator wants persisted and the value to persist it
/// under. The coordinator never touches a `KvStore` directly — it is pure
/// domain logic — so persistence is reported as an effect for the service
/// layer to carry out.
#[derive(Debug, Clone)]
pub enum PersistOp {
    Counter(Seq),
    Head(BlockId),
    Committed(BlockId),
}

/// Everything a single coordinator method call can ask the outside world
/// to do. Handlers return a `Vec<Effect>` instead of performing I/O
/// themselves, which is what keeps the state machine synchronous and
/// trivially testable.
#[derive(Debug, Clone)]
pub enum Effect {
    Send(NodeId, Message),
    Broadcast(Message),
    /// Deliver committed transaction payloads to the host, in block order.
    Commit(Vec<Vec<u8>>),
    Persist(PersistOp),
    /// Arm a patience timer for `txn_id`. The timer fires by posting a
    /// `TimerFired` event back to the coordinator; `timer_fired` checks
    /// whether `txn_id` is still pending before acting on it, so a timer
    /// that is effectively superseded is simply a no-op when it fires.
    StartTimer { txn_id: TxnId, after: Duration },
}

/// Owns a replica's entire local state: its view of the block tree, its
/// speed class, the Paxos round it may be running, and the transactions
/// waiting to be batched into a block. One `Coordinator` is driven by
/// exactly one task, so none of its methods need to be reentrant-safe —
/// see the actor in `service::node`.
pub struct Coordinator {
    node_id: NodeId,
    n: usize,
    seq: Seq,
    store: BlockStore,
    role: RoleEngine,
    paxos: PaxosDriver,
    known_txs: HashSet<TxnId>,
    pending_txs: VecDeque<Transaction>,
    oldest_pending: Option<TxnId>,
    sync_mode: bool,
    /// Per committed block, the set of peers (including this replica)
    /// known to have committed it too. Reaching all `n` lets genesis
    /// safely advance to that block.
    commit_acks: HashMap<BlockId, HashSet<NodeId>>,
    config: Config,
}

impl Coordinator {
    pub fn new(node_id: NodeId, n: usize, config: Config) -> Self {
        let store = BlockStore::new();
        let initial_role = if node_id == 0 { Role::Quick } else { Role::Slow };
        let role = RoleEngine::new(initial_role, config.initial_expected_rtt, config.epsilon);
        let paxos = PaxosDriver::new(store.head().clone(), n);
        Coordinator {
            node_id,
            n,
            seq: 0,
            store,
            role,
            paxos,
            known_txs: HashSet::new(),
            pending_txs: VecDeque::new(),
            oldest_pending: None,
            sync_mode: false,
            commit_acks: HashMap::new(),
            config,
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn role(&self) -> Role {
        self.role.role()
    }

    pub fn store(&self) -> &BlockStore {
        &self.store
    }

    pub fn is_syncing(&self) -> bool {
        self.sync_mode
    }

    fn next_seq(&mut self) -> Seq {
        self.seq += 1;
        self.seq
    }

    fn accumulation_bonus(&self) -> Duration {
        if self.role.role() == Role::Quick {
            self.config.accumulation_time
        } else {
            Duration::ZERO
        }
    }

    /// Insert `block` if its ancestry is already on hand. Returns the id
    /// of the nearest missing ancestor (and flips on sync mode) if not.
    fn ensure_known(&mut self, block: Block) -> Option<BlockId> {
        if self.store.contains(block.block_id) {
            return None;
        }
        let parent_id = block.parent_block_id?;
        if !self.store.contains(parent_id) {
            self.sync_mode = true;
            return Some(parent_id);
        }
        self.store.add_block(block);
        None
    }

    fn record_ack(&mut self, block_id: BlockId, peer: NodeId) {
        let acks = self.commit_acks.entry(block_id).or_default();
        acks.insert(peer);
        if acks.len() >= self.n {
            self.store.advance_genesis(block_id);
            self.commit_acks.retain(|id, _| self.store.contains(*id));
        }
    }

    fn readjust_timeout(&mut self, rng: &mut impl Rng) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(front) = self.pending_txs.front() {
            if Some(front.txn_id) != self.oldest_pending {
                self.oldest_pending = Some(front.txn_id);
                let patience = self.role.patience(self.n, rng) + self.accumulation_bonus();
                effects.push(Effect::StartTimer {
                    txn_id: front.txn_id,
                    after: patience,
                });
            }
        }
        effects
    }

    fn create_block(&mut self) -> Block {
        let head = self.store.head().clone();
        let seq = self.next_seq();
        let txs: Vec<Transaction> = self.pending_txs.drain(..).collect();
        self.role.promote();
        let mut block = Block::new(self.node_id, seq, Some(head.block_id), txs, self.role.role());
        let parent_depth = head.depth.expect("head always has a known depth");
        block.depth = Some(parent_depth + block.txs.len() as u64);
        self.store.add_block(block.clone());
        block
    }

    fn move_to(&mut self, target: Block, rng: &mut impl Rng) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(missing) = self.ensure_known(target.clone()) {
            effects.push(Effect::Broadcast(Message::RequestBlock { block_id: missing }));
            return effects;
        }
        let target_id = target.block_id;
        let head_id = self.store.head_id();
        if target_id == head_id || self.store.ancestor(target_id, head_id) {
            return effects;
        }

        let common = self.store.common_ancestor(head_id, target_id);

        let mut to_broadcast: Vec<Transaction> = Vec::new();
        let mut cur = head_id;
        while cur != common {
            let block = self.store.get(cur).expect("on a stored chain").clone();
            to_broadcast.extend(block.txs);
            cur = block.parent_block_id.expect("non-genesis block has a parent");
        }

        let mut target_tx_ids: HashSet<TxnId> = HashSet::new();
        let mut cur = target_id;
        while cur != common {
            let block = self.store.get(cur).expect("on a stored chain").clone();
            for tx in &block.txs {
                target_tx_ids.insert(tx.txn_id);
                self.known_txs.insert(tx.txn_id);
            }
            cur = block.parent_block_id.expect("non-genesis block has a parent");
        }
        self.pending_txs.retain(|t| !target_tx_ids.contains(&t.txn_id));
        to_broadcast.retain(|t| !target_tx_ids.contains(&t.txn_id));

        self.store.set_head(target_id);
        effects.push(Effect::Persist(PersistOp::Head(target_id)));
        for tx in to_broadcast {
            effects.push(Effect::Broadcast(Message::Txn(tx)));
        }
        effects.extend(self.readjust_timeout(rng));
        effects
    }

    fn commit(&mut self, block: Block, rng: &mut impl Rng) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(missing) = self.ensure_known(block.clone()) {
            effects.push(Effect::Broadcast(Message::RequestBlock { block_id: missing }));
            return effects;
        }
        if self.store.ancestor(block.block_id, self.store.committed_id()) {
            return effects;
        }
        self.store.set_committed(block.block_id);
        effects.push(Effect::Persist(PersistOp::Committed(block.block_id)));
        effects.extend(self.move_to(block.clone(), rng));
        tracing::trace!(chain = ?self.store.committed_chain(), "committed chain advanced");

        let contents = block.txs.iter().map(|t| t.content.clone()).collect();
        effects.push(Effect::Commit(contents));
        effects.push(Effect::Broadcast(Message::AckCommit {
            block_id: block.block_id,
        }));
        self.record_ack(block.block_id, self.node_id);
        effects
    }

    pub fn submit(&mut self, content: Vec<u8>, rng: &mut impl Rng) -> Vec<Effect> {
        let seq = self.next_seq();
        let txn = Transaction::new(self.node_id, seq, content);
        let mut effects = vec![Effect::Persist(PersistOp::Counter(self.seq))];
        effects.push(Effect::Broadcast(Message::Txn(txn.clone())));
        effects.extend(self.receive_transaction(txn, rng));
        effects
    }

    pub fn receive_transaction(&mut self, txn: Transaction, rng: &mut impl Rng) -> Vec<Effect> {
        if self.known_txs.contains(&txn.txn_id) {
            return Vec::new();
        }
        self.known_txs.insert(txn.txn_id);
        self.pending_txs.push_back(txn.clone());

        let mut effects = Vec::new();
        if self.pending_txs.len() == 1 {
            self.oldest_pending = Some(txn.txn_id);
            let patience = self.role.patience(self.n, rng) + self.accumulation_bonus();
            effects.push(Effect::StartTimer {
                txn_id: txn.txn_id,
                after: patience,
            });
        } else if self.pending_txs.len() >= self.config.max_txn_count {
            if let Some(front) = self.pending_txs.front() {
                effects.push(Effect::StartTimer {
                    txn_id: front.txn_id,
                    after: Duration::ZERO,
                });
            }
        }
        effects
    }

    pub fn receive_block(&mut self, block: Block, rng: &mut impl Rng) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(missing) = self.ensure_known(block.clone()) {
            effects.push(Effect::Broadcast(Message::RequestBlock { block_id: missing }));
            return effects;
        }

        let head = self.store.head().clone();
        if head < block || block.creator_state == Role::Quick {
            self.role.demote_to_slow();
        }

        if !self.store.valid(block.block_id) {
            return effects;
        }

        effects.extend(self.move_to(block, rng));
        effects.extend(self.readjust_timeout(rng));
        effects
    }

    pub fn receive_request_block(&self, block_id: BlockId, sender: NodeId) -> Vec<Effect> {
        if !self.store.contains(block_id) {
            return Vec::new();
        }
        let blocks = self.store.ancestors(block_id, self.config.recovery_blocks_count);
        vec![Effect::Send(sender, Message::RespondBlock { blocks })]
    }

    pub fn receive_respond_blocks(&mut self, blocks: Vec<Block>) -> Vec<Effect> {
        if !self.sync_mode {
            return Vec::new();
        }
        // `blocks` is ordered newest (the originally requested block)
        // first; inserting oldest-first guarantees every parent is
        // already stored by the time its child is added.
        for block in blocks.into_iter().rev() {
            self.store.add_block(block);
        }
        self.sync_mode = false;
        Vec::new()
    }

    pub fn receive_ack_commit(&mut self, block_id: BlockId, sender: NodeId) -> Vec<Effect> {
        self.record_ack(block_id, sender);
        Vec::new()
    }

    pub fn receive_pong(&mut self, sender: NodeId, rtt: Duration) -> Vec<Effect> {
        self.role.observe_rtt(sender, rtt);
        Vec::new()
    }

    pub fn receive_paxos(
        &mut self,
        sender: NodeId,
        message: PaxosMessage,
        rng: &mut impl Rng,
    ) -> Vec<Effect> {
        let outcome = match message {
            PaxosMessage::Try {
                request_seq,
                new_block,
                last_committed_block,
            } => self.paxos.on_try(request_seq, new_block, last_committed_block),
            PaxosMessage::TryOk {
                request_seq,
                prop_block,
                supp_block,
            } => self.paxos.on_try_ok(request_seq, prop_block, supp_block),
            PaxosMessage::Propose {
                request_seq,
                com_block,
                new_block,
            } => self.paxos.on_propose(request_seq, com_block, new_block),
            PaxosMessage::ProposeAck {
                request_seq,
                com_block,
            } => self.paxos.on_propose_ack(request_seq, com_block),
            PaxosMessage::Commit { com_block, .. } => self.paxos.on_commit(com_block),
        };

        let mut effects = Vec::new();
        if let Some(commit_block) = outcome.commit {
            effects.extend(self.commit(commit_block, rng));
        }
        if let Some(reply) = outcome.unicast {
            // a reply addressed back to ourselves is this replica's own
            // vote; since we are both proposer and acceptor, deliver it
            // in-process instead of round-tripping it over the wire.
            if sender == self.node_id {
                effects.extend(self.receive_paxos(self.node_id, reply, rng));
            } else {
                effects.push(Effect::Send(sender, Message::Paxos(reply)));
            }
        }
        if let Some(broadcast) = outcome.broadcast {
            effects.push(Effect::Broadcast(Message::Paxos(broadcast.clone())));
            // PAM broadcasts are self-delivered too: the proposer needs
            // to count its own vote toward majority.
            effects.extend(self.receive_paxos(self.node_id, broadcast, rng));
        }
        effects
    }

    /// The patience timer for `txn_id` has elapsed. A no-op if the
    /// transaction already landed in a block in the meantime.
    pub fn timer_fired(&mut self, txn_id: TxnId, rng: &mut impl Rng) -> Vec<Effect> {
        if !self.pending_txs.iter().any(|t| t.txn_id == txn_id) {
            return Vec::new();
        }
        let block = self.create_block();
        let mut effects = vec![Effect::Persist(PersistOp::Counter(self.seq))];
        effects.extend(self.move_to(block.clone(), rng));
        effects.push(Effect::Broadcast(Message::Block(block.clone())));

        if self.role.role() == Role::Quick && !self.paxos.commit_running() {
            let committed = self.store.committed().clone();
            let try_msg = self.paxos.begin_round(block, committed);
            effects.push(Effect::Broadcast(Message::Paxos(try_msg.clone())));
            // the proposer votes for its own round too; see `receive_paxos`.
            effects.extend(self.receive_paxos(self.node_id, try_msg, rng));
        }
        effects
    }
}
