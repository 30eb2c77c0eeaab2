pub mod node;

pub use node::{spawn, Node};
