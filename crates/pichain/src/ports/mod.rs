pub mod inbound;
pub mod outbound;

pub use inbound::NodeApi;
pub use outbound::{CommitHandler, KvStore, Transport};
