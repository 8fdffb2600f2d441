//! Round and term lifecycle scenarios
//!
//! Multi-round flows through the real service: genesis stall handling,
//! LIB-input carry-forward across terminations, quorum-gated LIB
//! advancement, and term changes.

use crate::integration::support::{TestNet, INTERVAL};
use tc_consensus::{ConsensusApi, ConsensusBehaviour, ConsensusConfig, ConsensusHeaderInformation};

#[tokio::test]
async fn test_first_round_stall_triggers_round_termination() {
    let net = TestNet::start(5).await;
    let round1 = net.current_round().await;

    // The order-1 miner is offline; when the second miner's slot arrives it
    // is told to terminate the round instead of producing.
    let second = round1.miner_by_order(2).unwrap().public_key;
    net.clock.set(round1.miner_by_order(2).unwrap().expected_mining_time + 10);
    let command = net
        .service
        .get_consensus_command(second.as_bytes())
        .await
        .unwrap();
    assert_eq!(command.behaviour, ConsensusBehaviour::NextRound);

    let trigger = tc_consensus::TriggerInformation::from_public_key(&second);
    let bytes = net.service.generate_consensus_extra_data(&trigger).await.unwrap();
    let header = ConsensusHeaderInformation::from_bytes(&bytes).unwrap();
    assert_eq!(header.behaviour, ConsensusBehaviour::NextRound);
    net.service.process_consensus_information(&bytes).await.unwrap();

    let round2 = net.current_round().await;
    assert_eq!(round2.round_number, 2);
    assert_eq!(round2.term_number, 1);
    // Same miner set, and every silent miner was charged a missed slot.
    let before: Vec<_> = round1.miners.keys().collect();
    let after: Vec<_> = round2.miners.keys().collect();
    assert_eq!(before, after);
    for slot in round2.miners.values() {
        assert_eq!(slot.missed_time_slots, 1);
    }
}

#[tokio::test]
async fn test_lifecycle_carries_lib_inputs_and_advances_height() {
    let net = TestNet::start(5).await;

    // Round 1: every miner mines with an attested height 10..=50.
    let order = net.keys_in_order().await;
    for (i, key) in order.iter().enumerate() {
        let secret = TestNet::secret_for(key, 1);
        net.mine_update_value(key, secret, None, (i as u64 + 1) * 10, Default::default())
            .await;
    }
    // consent = 4 of 5: descending [50,40,30,20,10], 4th largest = 20.
    let round1 = net.current_round().await;
    assert_eq!(round1.confirmed_irreversible_block_height, 20);
    assert_eq!(net.service.get_current_lib_height().await, 20);
    assert!(!net.sink.irreversible_events().is_empty());

    // Terminate round 1: the new round must carry every miner's implied
    // height and the confirmed pair forward, not reset them.
    assert_eq!(net.terminate_round().await, ConsensusBehaviour::NextRound);
    let round2 = net.current_round().await;
    assert_eq!(round2.round_number, 2);
    assert_eq!(round2.confirmed_irreversible_block_height, 20);
    for (key, slot) in &round2.miners {
        assert_eq!(
            slot.implied_irreversible_block_height,
            round1.miners[key].implied_irreversible_block_height,
            "implied height reset for miner {key}"
        );
        assert!(slot.implied_irreversible_block_height > 0);
    }

    // Round 2: four of five miners mine with fresh attestations, revealing
    // their round-1 secrets as they go.
    let order2 = net.keys_in_order().await;
    for (i, key) in order2.iter().take(4).enumerate() {
        let secret = TestNet::secret_for(key, 2);
        let reveal = TestNet::secret_for(key, 1);
        net.mine_update_value(key, secret, Some(reveal), 200 + i as u64 * 10, Default::default())
            .await;
    }
    // consent = 4: descending [230,220,210,200] -> 200.
    let round2 = net.current_round().await;
    assert_eq!(round2.confirmed_irreversible_block_height, 200);
    assert_eq!(round2.confirmed_irreversible_block_round_number, 2);
    let last_event = *net.sink.irreversible_events().last().unwrap();
    assert_eq!(last_event.height, 200);
    assert_eq!(last_event.round_number, 2);

    // Direct reveals were accepted and back-filled into round 1.
    let round1_stored = net.service.get_round(1).await.unwrap();
    for key in order2.iter().take(4) {
        assert_eq!(
            round2.miners[key].previous_in_value,
            Some(TestNet::secret_for(key, 1))
        );
        assert_eq!(
            round1_stored.miners[key].in_value,
            Some(TestNet::secret_for(key, 1))
        );
    }

    // Round 3 carries the confirmed pair unchanged.
    assert_eq!(net.terminate_round().await, ConsensusBehaviour::NextRound);
    let round3 = net.current_round().await;
    assert_eq!(round3.round_number, 3);
    assert_eq!(round3.confirmed_irreversible_block_height, 200);
    assert_eq!(round3.confirmed_irreversible_block_round_number, 2);
}

#[tokio::test]
async fn test_lib_quorum_not_met_leaves_height_unchanged() {
    let net = TestNet::start(5).await;

    // Only three of five miners mine: below the 2/3+1 consent of four.
    let order = net.keys_in_order().await;
    for (i, key) in order.iter().take(3).enumerate() {
        let secret = TestNet::secret_for(key, 1);
        net.mine_update_value(key, secret, None, 100 + i as u64, Default::default())
            .await;
    }

    // A normal outcome, not an error: height unchanged, no event.
    assert_eq!(net.service.get_current_lib_height().await, 0);
    assert!(net.sink.irreversible_events().is_empty());
}

#[tokio::test]
async fn test_term_change_with_re_election() {
    // A three-second term so round one already crosses the boundary.
    let net = TestNet::start_with_config(
        5,
        ConsensusConfig {
            mining_interval_ms: INTERVAL,
            period_seconds: 3,
            ..ConsensusConfig::default()
        },
    )
    .await;

    let order = net.keys_in_order().await;
    for (i, key) in order.iter().enumerate() {
        let secret = TestNet::secret_for(key, 1);
        net.mine_update_value(key, secret, None, (i as u64 + 1) * 10, Default::default())
            .await;
    }
    // Slots at 1s,5s,9s,13s,17s: the last four actual mining times lie past
    // the three-second boundary, which meets the consent quorum of four.
    let round1 = net.current_round().await;
    assert!(round1.need_to_change_term(1_000, 3));

    let behaviour = net.terminate_round().await;
    assert_eq!(behaviour, ConsensusBehaviour::NextTerm);

    let round2 = net.current_round().await;
    assert_eq!(round2.round_number, 2);
    assert_eq!(round2.term_number, 2);
    // The election re-elected the same set; LIB inputs still carried.
    let before: Vec<_> = round1.miners.keys().collect();
    let after: Vec<_> = round2.miners.keys().collect();
    assert_eq!(before, after);
    assert_eq!(
        round2.confirmed_irreversible_block_height,
        round1.confirmed_irreversible_block_height
    );
    // Init plus the term change both pushed the miner count.
    assert_eq!(net.election.pushed_counts(), vec![5, 5]);
}

#[tokio::test]
async fn test_replayed_termination_rejected() {
    let net = TestNet::start(3).await;
    let round1 = net.current_round().await;
    let second = round1.miner_by_order(2).unwrap().public_key;
    net.clock.set(round1.miner_by_order(2).unwrap().expected_mining_time + 10);

    let trigger = tc_consensus::TriggerInformation::from_public_key(&second);
    let bytes = net.service.generate_consensus_extra_data(&trigger).await.unwrap();
    net.service.process_consensus_information(&bytes).await.unwrap();
    assert_eq!(net.current_round().await.round_number, 2);

    // Replaying the same round-2 proposal against round 2 fails: the round
    // number no longer advances the chain.
    let result = net.service.process_consensus_information(&bytes).await;
    assert!(result.is_err());
    assert_eq!(net.current_round().await.round_number, 2);
}
