pub mod in_memory_kv;
pub mod loopback_transport;

pub use in_memory_kv::InMemoryKvStore;
pub use loopback_transport::{Inbox, LoopbackTransport};
