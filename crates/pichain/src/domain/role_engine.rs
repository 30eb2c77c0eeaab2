use std::collections::HashMap;
use std::time::Duration;

use pichain_types::block::NodeId;
use pichain_types::Role;
use rand::Rng;

/// Tracks this replica's speed class and the round-trip times it has
/// observed from peers, and turns both into the patience a replica waits
/// before proposing a block for its pending transactions.
pub struct RoleEngine {
    role: Role,
    expected_rtt: Duration,
    epsilon: f64,
    rtts: HashMap<NodeId, Duration>,
    /// `Slow` patience is drawn once and then reused verbatim for as long
    /// as the replica stays `Slow`; promoting out of `Slow` and back in
    /// draws a fresh value.
    cached_slow_patience: Option<Duration>,
}

impl RoleEngine {
    pub fn new(initial_role: Role, initial_expected_rtt: Duration, epsilon: f64) -> Self {
        RoleEngine {
            role: initial_role,
            expected_rtt: initial_expected_rtt,
            epsilon,
            rtts: HashMap::new(),
            cached_slow_patience: None,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn expected_rtt(&self) -> Duration {
        self.expected_rtt
    }

    pub fn promote(&mut self) {
        let next = self.role.promote();
        if next != self.role {
            self.cached_slow_patience = None;
        }
        self.role = next;
    }

    pub fn demote_to_slow(&mut self) {
        if self.role != Role::Slow {
            self.cached_slow_patience = None;
        }
        self.role = Role::Slow;
    }

    pub fn observe_rtt(&mut self, peer: NodeId, rtt: Duration) {
        self.rtts.insert(peer, rtt);
        if let Some(max) = self.rtts.values().max() {
            self.expected_rtt = *max + Duration::from_secs(1);
        }
    }

    /// How long to wait before proposing a block for the currently
    /// pending transactions, given `n` peers in the cluster.
    pub fn patience(&mut self, n: usize, rng: &mut impl Rng) -> Duration {
        match self.role {
            Role::Quick => Duration::ZERO,
            Role::Medium => self.expected_rtt.mul_f64(1.0 + self.epsilon),
            Role::Slow => {
                if let Some(cached) = self.cached_slow_patience {
                    return cached;
                }
                let floor = self.expected_rtt.mul_f64(2.0 + self.epsilon);
                let span = self.expected_rtt.mul_f64(n as f64 * 0.5);
                let jitter = Duration::from_secs_f64(rng.gen::<f64>() * span.as_secs_f64());
                let value = floor + jitter;
                self.cached_slow_patience = Some(value);
                value
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quick_patience_is_zero() {
        let mut engine = RoleEngine::new(Role::Quick, Duration::from_secs(1), 0.001);
        let mut rng = rand::thread_rng();
        assert_eq!(engine.patience(4, &mut rng), Duration::ZERO);
    }

    #[test]
    fn slow_patience_is_cached_across_calls() {
        let mut engine = RoleEngine::new(Role::Slow, Duration::from_millis(100), 0.001);
        let mut rng = rand::thread_rng();
        let first = engine.patience(4, &mut rng);
        let second = engine.patience(4, &mut rng);
        assert_eq!(first, second);
    }

    #[test]
    fn promoting_out_of_slow_clears_the_cache() {
        let mut engine = RoleEngine::new(Role::Slow, Duration::from_millis(100), 0.001);
        let mut rng = rand::thread_rng();
        engine.patience(4, &mut rng);
        assert!(engine.cached_slow_patience.is_some());
        engine.promote();
        engine.promote();
        engine.demote_to_slow();
        assert!(engine.cached_slow_patience.is_none());
    }

    #[test]
    fn observe_rtt_tracks_the_max_plus_one_second() {
        let mut engine = RoleEngine::new(Role::Medium, Duration::from_secs(1), 0.001);
        engine.observe_rtt(1, Duration::from_millis(200));
        engine.observe_rtt(2, Duration::from_millis(500));
        assert_eq!(engine.expected_rtt(), Duration::from_millis(1500));
    }
}
