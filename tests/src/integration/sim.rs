//! A deterministic, virtual-time network of `Coordinator`s. Bypasses the
//! actor/transport layer entirely so the six end-to-end scenarios run as
//! fast, flake-free logic tests instead of depending on real sleeps and
//! scheduler timing.

use std::collections::{HashSet, VecDeque};

use pichain::config::Config;
use pichain::domain::pipeline::{Coordinator, Effect};
use pichain::ipc::dispatch;
use pichain_types::block::NodeId;
use pichain_types::{Message, TxnId};
use rand::rngs::mock::StepRng;

pub struct Sim {
    coordinators: Vec<Coordinator>,
    committed: Vec<Vec<Vec<u8>>>,
    messages: VecDeque<(usize, NodeId, Message)>,
    timers: Vec<(u128, usize, TxnId)>,
    now: u128,
    /// Pairs of node indices that currently drop messages between them in
    /// both directions, modeling a network partition.
    cut: HashSet<(usize, usize)>,
    rng: StepRng,
}

impl Sim {
    pub fn new(n: usize) -> Self {
        let coordinators = (0..n)
            .map(|i| Coordinator::new(i as NodeId, n, Config::default()))
            .collect();
        Sim {
            coordinators,
            committed: vec![Vec::new(); n],
            messages: VecDeque::new(),
            timers: Vec::new(),
            now: 0,
            cut: HashSet::new(),
            // a fixed, non-zero step keeps slow-patience jitter deterministic
            // across test runs without biasing every draw to the same value.
            rng: StepRng::new(0x9e37_79b9, 0x9e37_79b9),
        }
    }

    pub fn len(&self) -> usize {
        self.coordinators.len()
    }

    pub fn role(&self, idx: usize) -> pichain_types::Role {
        self.coordinators[idx].role()
    }

    pub fn committed_contents(&self, idx: usize) -> &[Vec<u8>] {
        &self.committed[idx]
    }

    pub fn head_id(&self, idx: usize) -> pichain_types::BlockId {
        self.coordinators[idx].store().head_id()
    }

    /// Drop messages between `a` and `b` in both directions until
    /// [`Self::heal`] is called.
    pub fn partition(&mut self, a: usize, b: usize) {
        self.cut.insert((a.min(b), a.max(b)));
    }

    pub fn heal(&mut self, a: usize, b: usize) {
        self.cut.remove(&(a.min(b), a.max(b)));
    }

    pub fn submit(&mut self, idx: usize, content: Vec<u8>) {
        let effects = self.coordinators[idx].submit(content, &mut self.rng);
        self.handle_effects(idx, effects);
    }

    fn handle_effects(&mut self, from_idx: usize, effects: Vec<Effect>) {
        let from_id = self.coordinators[from_idx].node_id();
        for effect in effects {
            match effect {
                Effect::Send(to, message) => {
                    let to_idx = to as usize;
                    if !self.blocked(from_idx, to_idx) {
                        self.messages.push_back((to_idx, from_id, message));
                    }
                }
                Effect::Broadcast(message) => {
                    for to_idx in 0..self.coordinators.len() {
                        if to_idx != from_idx && !self.blocked(from_idx, to_idx) {
                            self.messages.push_back((to_idx, from_id, message.clone()));
                        }
                    }
                }
                Effect::Commit(contents) => self.committed[from_idx].extend(contents),
                Effect::Persist(_) => {}
                Effect::StartTimer { txn_id, after } => {
                    let at = self.now + after.as_millis();
                    let pos = self.timers.partition_point(|t| t.0 <= at);
                    self.timers.insert(pos, (at, from_idx, txn_id));
                }
            }
        }
    }

    fn blocked(&self, a: usize, b: usize) -> bool {
        self.cut.contains(&(a.min(b), a.max(b)))
    }

    /// Drain in-flight messages and fire due timers until the network is
    /// quiescent or `max_steps` operations have run (a liveness bug would
    /// otherwise spin this loop forever).
    pub fn run_until_idle(&mut self, max_steps: usize) {
        for _ in 0..max_steps {
            if let Some((to_idx, from_id, message)) = self.messages.pop_front() {
                let effects = dispatch(&mut self.coordinators[to_idx], from_id, message, &mut self.rng);
                self.handle_effects(to_idx, effects);
                continue;
            }
            if !self.timers.is_empty() {
                let (at, idx, txn_id) = self.timers.remove(0);
                self.now = self.now.max(at);
                let effects = self.coordinators[idx].timer_fired(txn_id, &mut self.rng);
                self.handle_effects(idx, effects);
                continue;
            }
            break;
        }
    }
}
