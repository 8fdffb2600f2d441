//! Adversarial proposals against the validation pipeline
//!
//! Each scenario drives a forged or mistimed proposal through the real
//! service and asserts it is rejected with no state mutation.

use crate::integration::support::TestNet;
use shared_crypto::sha256;
use tc_consensus::{
    ConsensusApi, ConsensusBehaviour, ConsensusHeaderInformation, MinerInRound,
};

#[tokio::test]
async fn test_unauthorized_miner_injection_rejected() {
    let net = TestNet::start(4).await;
    let base = net.current_round().await;
    let sender = *base.miners.keys().next().unwrap();

    let mut proposed = base.generate_next_round(30_000).unwrap();
    // Slot the intruder in with perfectly consistent timing so only the
    // miner-list check can catch it.
    let intruder = crate::integration::support::test_key(77);
    let mut slot = MinerInRound::new(
        intruder,
        5,
        proposed.round_start_time() + proposed.mining_interval_ms * 4,
    );
    slot.is_extra_block_producer = false;
    proposed.miners.insert(intruder, slot);

    let header = ConsensusHeaderInformation {
        sender_public_key: sender,
        round: proposed,
        behaviour: ConsensusBehaviour::NextRound,
    };
    let bytes = header.to_bytes().unwrap();

    let validation = net.service.validate_before_execution(&bytes).await.unwrap();
    assert!(!validation.success);
    assert!(validation.message.contains("differs"));

    assert!(net.service.process_consensus_information(&bytes).await.is_err());
    assert_eq!(net.current_round().await.round_number, 1);
}

#[tokio::test]
async fn test_outsider_sender_rejected() {
    let net = TestNet::start(3).await;
    let base = net.current_round().await;
    let outsider = crate::integration::support::test_key(50);

    let header = ConsensusHeaderInformation {
        sender_public_key: outsider,
        round: base.clone(),
        behaviour: ConsensusBehaviour::UpdateValue,
    };
    let validation = net
        .service
        .validate_before_execution(&header.to_bytes().unwrap())
        .await
        .unwrap();
    assert!(!validation.success);
    assert!(validation.message.contains("no mining permission"));
}

#[tokio::test]
async fn test_slot_boundary_judged_consistently() {
    let net = TestNet::start(3).await;
    let base = net.current_round().await;
    let first = base.miner_by_order(1).unwrap();
    let key = first.public_key;
    let boundary = base.slot_end_time(first);

    // The scheduler refuses to attempt at the exact boundary...
    net.clock.set(boundary);
    let command = net.service.get_consensus_command(key.as_bytes()).await.unwrap();
    assert_eq!(command.behaviour, ConsensusBehaviour::Nothing);

    // ...and the validator rejects a block stamped at that same instant,
    // flagging it as recoverable.
    let mut proposed = base.clone();
    {
        let slot = proposed.miners.get_mut(&key).unwrap();
        let in_value = sha256(b"boundary");
        slot.out_value = Some(sha256(&in_value));
        slot.signature = Some(in_value);
        slot.actual_mining_times.push(boundary);
    }
    let header = ConsensusHeaderInformation {
        sender_public_key: key,
        round: proposed,
        behaviour: ConsensusBehaviour::UpdateValue,
    };
    let validation = net
        .service
        .validate_before_execution(&header.to_bytes().unwrap())
        .await
        .unwrap();
    assert!(!validation.success);
    assert!(validation.is_retrigger);
}

#[tokio::test]
async fn test_termination_without_new_round_id_rejected() {
    let net = TestNet::start(3).await;
    let base = net.current_round().await;
    let sender = *base.miners.keys().next().unwrap();

    // Same expected times, so the round id cannot change.
    let mut proposed = base.clone();
    proposed.round_number += 1;
    let header = ConsensusHeaderInformation {
        sender_public_key: sender,
        round: proposed,
        behaviour: ConsensusBehaviour::NextRound,
    };
    let validation = net
        .service
        .validate_before_execution(&header.to_bytes().unwrap())
        .await
        .unwrap();
    assert!(!validation.success);
    assert!(validation.message.contains("round id"));
}

#[tokio::test]
async fn test_termination_cannot_lower_lib() {
    let net = TestNet::start(5).await;

    // Establish a confirmed height first.
    let order = net.keys_in_order().await;
    for (i, key) in order.iter().enumerate() {
        let secret = TestNet::secret_for(key, 1);
        net.mine_update_value(key, secret, None, (i as u64 + 1) * 10, Default::default())
            .await;
    }
    let base = net.current_round().await;
    assert_eq!(base.confirmed_irreversible_block_height, 20);

    let now = base.extra_block_mining_time();
    net.clock.set(now);

    // NextTerm proposal smuggling a lower height.
    let mut term_round = base.generate_next_round(now).unwrap();
    term_round.term_number = base.term_number + 1;
    term_round.confirmed_irreversible_block_height = 5;
    let sender = *base.miners.keys().next().unwrap();
    let header = ConsensusHeaderInformation {
        sender_public_key: sender,
        round: term_round,
        behaviour: ConsensusBehaviour::NextTerm,
    };
    let validation = net
        .service
        .validate_before_execution(&header.to_bytes().unwrap())
        .await
        .unwrap();
    assert!(!validation.success);
    assert!(validation.message.contains("regressed"));

    // The same attack through NextRound fails identically.
    let mut next_round = base.generate_next_round(now).unwrap();
    next_round.confirmed_irreversible_block_height = 5;
    let header = ConsensusHeaderInformation {
        sender_public_key: sender,
        round: next_round,
        behaviour: ConsensusBehaviour::NextRound,
    };
    let validation = net
        .service
        .validate_before_execution(&header.to_bytes().unwrap())
        .await
        .unwrap();
    assert!(!validation.success);

    // Nothing committed either way.
    assert_eq!(
        net.current_round().await.confirmed_irreversible_block_height,
        20
    );
}

#[tokio::test]
async fn test_forged_reveal_for_other_miner_rejected() {
    let net = TestNet::start(5).await;

    // Round 1 completes so round 2 has commitments to check against.
    let order = net.keys_in_order().await;
    for (i, key) in order.iter().enumerate() {
        let secret = TestNet::secret_for(key, 1);
        net.mine_update_value(key, secret, None, 100 + i as u64, Default::default())
            .await;
    }
    net.terminate_round().await;

    let base = net.current_round().await;
    let order2 = net.keys_in_order().await;
    let sender = order2[0];
    let victim = order2[1];
    net.clock
        .set(base.miners[&sender].expected_mining_time + 10);

    let mut proposed = base.clone();
    {
        let in_value = sha256(b"attacker secret");
        let slot = proposed.miners.get_mut(&sender).unwrap();
        slot.out_value = Some(sha256(&in_value));
        slot.signature = Some(in_value);
        slot.actual_mining_times
            .push(base.miners[&sender].expected_mining_time + 10);
    }
    // Forged reveal for the victim rides along.
    proposed.miners.get_mut(&victim).unwrap().previous_in_value = Some(sha256(b"forged"));

    let header = ConsensusHeaderInformation {
        sender_public_key: sender,
        round: proposed,
        behaviour: ConsensusBehaviour::UpdateValue,
    };
    let validation = net
        .service
        .validate_before_execution(&header.to_bytes().unwrap())
        .await
        .unwrap();
    assert!(!validation.success);
    assert!(validation.message.contains("commitment"));
}

#[tokio::test]
async fn test_malformed_header_leaves_node_usable() {
    let net = TestNet::start(3).await;

    let validation = net
        .service
        .validate_before_execution(&[0xFF, 0x00, 0x12])
        .await
        .unwrap();
    assert!(!validation.success);
    assert!(net
        .service
        .process_consensus_information(&[0xFF, 0x00, 0x12])
        .await
        .is_err());

    // The node keeps processing legitimate proposals afterwards.
    let round = net.current_round().await;
    let first = round.miner_by_order(1).unwrap().public_key;
    net.mine_update_value(
        &first,
        TestNet::secret_for(&first, 1),
        None,
        7,
        Default::default(),
    )
    .await;
    assert_eq!(net.current_round().await.miners[&first].produced_blocks, 1);
}
