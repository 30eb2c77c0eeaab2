//! # piChain
//!
//! A fault-tolerant, strongly consistent replicated log over a fixed set
//! of peers. Leader rotation picks who proposes next; single-decree
//! Paxos over a block tree gets every replica to agree on what was
//! proposed.
//!
//! - [`domain::block_tree`] — the Block Store: the tree of known blocks
//!   and the committed/head pointers into it.
//! - [`domain::role_engine`] — the Role Engine: a replica's speed class
//!   and the patience timer derived from it.
//! - [`domain::paxos`] — the Paxos Driver: the proposer and acceptor
//!   state machines that decide what gets committed.
//! - [`domain::pipeline`] — the Pipeline Coordinator: ties the three
//!   above together into the single state machine one replica runs.
//! - [`service::node`] — the actor that owns a `Coordinator` and exposes
//!   it as a host-facing API over ports.
//!
//! Wire and persistence concerns live behind [`ports`]; [`adapters`]
//! provides in-memory implementations suitable for embedding and tests.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ipc;
pub mod metrics;
pub mod ports;
pub mod service;

pub use config::Config;
pub use domain::error::{NodeError, NodeResult};
pub use service::{spawn, Node};
