use pichain_types::{Block, PaxosMessage};

/// What a Paxos Driver step wants the coordinator to do next. A step can
/// ask for at most one unicast reply, at most one broadcast, and can ask
/// the coordinator to commit a block (which it does unconditionally —
/// committing an already-committed ancestor is a no-op on the Block
/// Store). `None` in every field means "nothing to do".
#[derive(Default)]
pub struct PaxosOutcome {
    pub unicast: Option<PaxosMessage>,
    pub broadcast: Option<PaxosMessage>,
    pub commit: Option<Block>,
}

/// Runs both roles of single-decree Paxos a replica plays at once: the
/// proposer side that decides what to commit next for this replica's own
/// candidate block, and the acceptor side that votes on a committer's
/// proposal. A replica is always both at once since any replica can
/// originate a commit round.
pub struct PaxosDriver {
    n: usize,
    genesis: Block,

    // acceptor state
    s_max_block: Block,
    s_prop_block: Option<Block>,
    s_supp_block: Option<Block>,

    // proposer/committer state
    c_new_block: Option<Block>,
    c_com_block: Option<Block>,
    c_request_seq: u64,
    c_votes: usize,
    c_prop_block: Option<Block>,
    c_supp_block: Option<Block>,
    commit_running: bool,
}

impl PaxosDriver {
    pub fn new(genesis: Block, n: usize) -> Self {
        PaxosDriver {
            n,
            s_max_block: genesis.clone(),
            genesis,
            s_prop_block: None,
            s_supp_block: None,
            c_new_block: None,
            c_com_block: None,
            c_request_seq: 0,
            c_votes: 0,
            c_prop_block: None,
            c_supp_block: None,
            commit_running: false,
        }
    }

    pub fn commit_running(&self) -> bool {
        self.commit_running
    }

    fn has_majority(&self) -> bool {
        self.c_votes * 2 > self.n
    }

    /// Start a new commit round for `new_block`, broadcasting `Try`.
    pub fn begin_round(&mut self, new_block: Block, last_committed: Block) -> PaxosMessage {
        self.commit_running = true;
        self.c_votes = 0;
        self.c_request_seq += 1;
        self.c_supp_block = None;
        self.c_prop_block = None;
        self.c_new_block = Some(new_block.clone());
        PaxosMessage::Try {
            request_seq: self.c_request_seq,
            new_block,
            last_committed_block: last_committed,
        }
    }

    pub fn on_try(
        &mut self,
        request_seq: u64,
        new_block: Block,
        last_committed_block: Block,
    ) -> PaxosOutcome {
        let mut outcome = PaxosOutcome {
            commit: Some(last_committed_block),
            ..Default::default()
        };
        if self.s_max_block < new_block {
            self.s_max_block = new_block;
            outcome.unicast = Some(PaxosMessage::TryOk {
                request_seq,
                prop_block: self.s_prop_block.clone(),
                supp_block: self.s_supp_block.clone(),
            });
        }
        outcome
    }

    pub fn on_try_ok(
        &mut self,
        request_seq: u64,
        prop_block: Option<Block>,
        supp_block: Option<Block>,
    ) -> PaxosOutcome {
        let mut outcome = PaxosOutcome::default();
        if request_seq != self.c_request_seq {
            return outcome;
        }
        if let Some(supp) = supp_block {
            let adopt = match &self.c_supp_block {
                None => true,
                Some(current) => *current < supp,
            };
            if adopt {
                self.c_prop_block = prop_block;
                self.c_supp_block = Some(supp);
            }
        }
        self.c_votes += 1;
        if self.has_majority() {
            self.c_votes = 0;
            self.c_request_seq += 1;
            let new_block = self
                .c_new_block
                .clone()
                .expect("a round in progress always has a candidate block");
            let com_block = self.c_prop_block.clone().unwrap_or_else(|| new_block.clone());
            self.c_com_block = Some(com_block.clone());
            outcome.broadcast = Some(PaxosMessage::Propose {
                request_seq: self.c_request_seq,
                com_block,
                new_block,
            });
        }
        outcome
    }

    pub fn on_propose(
        &mut self,
        request_seq: u64,
        com_block: Block,
        new_block: Block,
    ) -> PaxosOutcome {
        let mut outcome = PaxosOutcome::default();
        if new_block.depth != self.s_max_block.depth {
            return outcome;
        }
        self.s_prop_block = Some(com_block.clone());
        self.s_supp_block = Some(new_block);
        outcome.unicast = Some(PaxosMessage::ProposeAck {
            request_seq,
            com_block,
        });
        outcome
    }

    pub fn on_propose_ack(&mut self, request_seq: u64, com_block: Block) -> PaxosOutcome {
        let mut outcome = PaxosOutcome::default();
        if request_seq != self.c_request_seq {
            return outcome;
        }
        self.c_votes += 1;
        if self.has_majority() {
            self.c_request_seq += 1;
            outcome.broadcast = Some(PaxosMessage::Commit {
                request_seq: self.c_request_seq,
                com_block: com_block.clone(),
            });
            outcome.commit = Some(com_block);
            self.commit_running = false;
        }
        outcome
    }

    pub fn on_commit(&mut self, com_block: Block) -> PaxosOutcome {
        self.s_supp_block = None;
        self.s_prop_block = None;
        self.s_max_block = self.genesis.clone();
        self.commit_running = false;
        PaxosOutcome {
            commit: Some(com_block),
            ..Default::default()
        }
    }
}
