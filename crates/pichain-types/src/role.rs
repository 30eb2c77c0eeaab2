use serde::{Deserialize, Serialize};

/// A replica's current self-assessed speed class, used by the patience
/// timer to decide how long to wait before proposing a block.
///
/// Ordered `Quick < Medium < Slow` so a replica can be compared against a
/// peer's advertised `creator_state` directly: seeing a strictly faster
/// (or equally quick) peer propose a block is what triggers demotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    Quick,
    Medium,
    Slow,
}

impl Role {
    /// Step one notch closer to `Quick`. Already-`Quick` replicas stay put.
    pub fn promote(self) -> Self {
        match self {
            Role::Quick => Role::Quick,
            Role::Medium => Role::Quick,
            Role::Slow => Role::Medium,
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Slow
    }
}
