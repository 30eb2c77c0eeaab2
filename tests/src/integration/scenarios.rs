use pichain_types::Role;

use super::sim::Sim;

#[test]
fn healthy_single_transaction_commits_on_every_replica() {
    let mut sim = Sim::new(3);
    sim.submit(0, b"set x 1".to_vec());
    sim.run_until_idle(10_000);

    for idx in 0..sim.len() {
        assert_eq!(sim.committed_contents(idx), &[b"set x 1".to_vec()]);
    }
}

#[test]
fn burst_of_transactions_all_land_in_the_same_order_everywhere() {
    let mut sim = Sim::new(5);
    let payloads: Vec<Vec<u8>> = (0..20).map(|i| format!("cmd-{i}").into_bytes()).collect();
    for (i, payload) in payloads.iter().enumerate() {
        sim.submit(i % sim.len(), payload.clone());
    }
    sim.run_until_idle(100_000);

    let reference = sim.committed_contents(0).to_vec();
    assert!(!reference.is_empty());
    for idx in 1..sim.len() {
        assert_eq!(sim.committed_contents(idx), reference.as_slice());
    }
    for payload in &payloads {
        assert!(reference.contains(payload));
    }
}

#[test]
fn election_proceeds_when_the_default_leader_is_unreachable() {
    let mut sim = Sim::new(5);
    // isolate replica 0, the only one that starts QUICK; the remaining
    // four (a majority of five) must still make progress on their own.
    for peer in 1..sim.len() {
        sim.partition(0, peer);
    }
    sim.submit(1, b"elect me".to_vec());
    sim.run_until_idle(200_000);

    for idx in 1..sim.len() {
        assert_eq!(sim.committed_contents(idx), &[b"elect me".to_vec()]);
    }
    assert!(sim.committed_contents(0).is_empty());
}

#[test]
fn two_replicas_racing_as_quick_still_converge() {
    let mut sim = Sim::new(3);

    // drive replica 1 through two self-created blocks so it promotes
    // Slow -> Medium -> Quick, matching replica 0's starting role.
    sim.submit(1, b"warm up 1".to_vec());
    sim.run_until_idle(50_000);
    sim.submit(1, b"warm up 2".to_vec());
    sim.run_until_idle(50_000);
    assert_eq!(sim.role(1), Role::Quick);

    // both replicas are now QUICK; submitting to both at once has them
    // race to propose competing blocks for the same round.
    sim.submit(0, b"race a".to_vec());
    sim.submit(1, b"race b".to_vec());
    sim.run_until_idle(200_000);

    let reference = sim.committed_contents(0).to_vec();
    for idx in 1..sim.len() {
        assert_eq!(sim.committed_contents(idx), reference.as_slice());
    }
    assert!(reference.contains(&b"race a".to_vec()));
    assert!(reference.contains(&b"race b".to_vec()));
    for idx in 0..sim.len() {
        assert_eq!(sim.head_id(idx), sim.head_id(0));
    }
}

#[test]
fn partition_then_heal_reconverges() {
    let mut sim = Sim::new(5);
    sim.partition(3, 0);
    sim.partition(3, 1);
    sim.partition(3, 2);
    sim.partition(4, 0);
    sim.partition(4, 1);
    sim.partition(4, 2);

    sim.submit(0, b"while split".to_vec());
    sim.run_until_idle(200_000);
    for idx in 0..3 {
        assert_eq!(sim.committed_contents(idx), &[b"while split".to_vec()]);
    }
    assert!(sim.committed_contents(3).is_empty());
    assert!(sim.committed_contents(4).is_empty());

    sim.heal(3, 0);
    sim.heal(3, 1);
    sim.heal(3, 2);
    sim.heal(4, 0);
    sim.heal(4, 1);
    sim.heal(4, 2);

    // a fresh transaction is what actually triggers the isolated
    // replicas' recovery request once they see a block they can't place.
    sim.submit(1, b"after heal".to_vec());
    sim.run_until_idle(200_000);

    let reference = sim.committed_contents(0).to_vec();
    for idx in 0..sim.len() {
        assert_eq!(sim.committed_contents(idx), reference.as_slice());
    }
}

#[test]
fn crash_then_rejoin_catches_up_via_block_recovery() {
    let mut sim = Sim::new(4);
    // replica 3 "crashes": cut off from everyone while the others commit.
    for peer in 0..3 {
        sim.partition(3, peer);
    }

    sim.submit(0, b"during crash 1".to_vec());
    sim.run_until_idle(200_000);
    sim.submit(0, b"during crash 2".to_vec());
    sim.run_until_idle(200_000);

    assert!(sim.committed_contents(3).is_empty());

    // replica 3 "restarts" and rejoins the network.
    for peer in 0..3 {
        sim.heal(3, peer);
    }
    sim.submit(0, b"after rejoin".to_vec());
    sim.run_until_idle(300_000);

    let reference = sim.committed_contents(0).to_vec();
    assert_eq!(sim.committed_contents(3), reference.as_slice());
}
