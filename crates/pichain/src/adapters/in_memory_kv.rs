use std::collections::HashMap;

use crate::domain::error::NodeError;
use crate::ports::outbound::KvStore;

/// `KvStore` backed by a plain `HashMap`. Used for embedding without
/// durability and in tests; nothing here survives a restart.
#[derive(Default)]
pub struct InMemoryKvStore {
    entries: HashMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for InMemoryKvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, NodeError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), NodeError> {
        self.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}
