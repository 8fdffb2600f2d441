//! Threshold secret recovery end-to-end
//!
//! Ten miners, threshold six. A miner commits in round one and then goes
//! silent; its peers hand in the shares they decrypted, and once the
//! threshold is met (strictly fewer than all participants) the round-one
//! secret is reconstructed, commitment-checked, and recorded.

use crate::integration::support::TestNet;
use shared_crypto::MinerPublicKey;
use std::collections::BTreeMap;
use tc_consensus::{ConsensusApi, ConsensusBehaviour};

/// Run round 1 with all ten miners mining, terminate, and return the
/// miner chosen to stay silent in round 2 (the last slot of round 2).
async fn setup_round_two(net: &TestNet) -> MinerPublicKey {
    let order = net.keys_in_order().await;
    for (i, key) in order.iter().enumerate() {
        let secret = TestNet::secret_for(key, 1);
        net.mine_update_value(key, secret, None, 100 + i as u64, Default::default())
            .await;
    }
    assert_eq!(net.terminate_round().await, ConsensusBehaviour::NextRound);
    *net.keys_in_order().await.last().unwrap()
}

/// The share miner `contributor` received of `producer`'s round-1 secret.
async fn share_for(net: &TestNet, producer: &MinerPublicKey, contributor: &MinerPublicKey) -> Vec<u8> {
    let round1 = net.service.get_round(1).await.unwrap();
    round1.miners[producer].encrypted_pieces[contributor].clone()
}

#[tokio::test]
async fn test_seven_of_ten_pieces_reveal_the_secret() {
    let net = TestNet::start(10).await;
    let silent = setup_round_two(&net).await;
    let secret = TestNet::secret_for(&silent, 1);

    let order2 = net.keys_in_order().await;
    let contributors: Vec<MinerPublicKey> =
        order2.iter().filter(|k| **k != silent).take(7).copied().collect();

    for (i, contributor) in contributors.iter().enumerate() {
        let piece = share_for(&net, &silent, contributor).await;
        let mut decrypted = BTreeMap::new();
        decrypted.insert(silent.to_vec(), piece);

        net.mine_update_value(
            contributor,
            TestNet::secret_for(contributor, 2),
            Some(TestNet::secret_for(contributor, 1)),
            200 + i as u64,
            decrypted,
        )
        .await;

        let current = net.current_round().await;
        if i + 1 < 6 {
            // Below the 2/3 threshold of ten: nothing reconstructed yet.
            assert!(current.miners[&silent].previous_in_value.is_none());
        } else {
            // At and past the threshold the secret is recovered; full
            // participation is never required.
            assert_eq!(current.miners[&silent].previous_in_value, Some(secret));
        }
    }

    // The reveal was back-filled into the round it belongs to.
    let round1 = net.service.get_round(1).await.unwrap();
    assert_eq!(round1.miners[&silent].in_value, Some(secret));
}

#[tokio::test]
async fn test_five_of_ten_pieces_reveal_nothing() {
    let net = TestNet::start(10).await;
    let silent = setup_round_two(&net).await;

    let order2 = net.keys_in_order().await;
    let contributors: Vec<MinerPublicKey> =
        order2.iter().filter(|k| **k != silent).take(5).copied().collect();

    for (i, contributor) in contributors.iter().enumerate() {
        let piece = share_for(&net, &silent, contributor).await;
        let mut decrypted = BTreeMap::new();
        decrypted.insert(silent.to_vec(), piece);
        net.mine_update_value(
            contributor,
            TestNet::secret_for(contributor, 2),
            Some(TestNet::secret_for(contributor, 1)),
            300 + i as u64,
            decrypted,
        )
        .await;
    }

    // Below threshold: a silent no-op, never an error.
    let current = net.current_round().await;
    assert!(current.miners[&silent].previous_in_value.is_none());
    let round1 = net.service.get_round(1).await.unwrap();
    assert!(round1.miners[&silent].in_value.is_none());
}

#[tokio::test]
async fn test_direct_reveal_is_not_overwritten_by_reconstruction() {
    let net = TestNet::start(10).await;
    let order = net.keys_in_order().await;
    for (i, key) in order.iter().enumerate() {
        let secret = TestNet::secret_for(key, 1);
        net.mine_update_value(key, secret, None, 100 + i as u64, Default::default())
            .await;
    }
    net.terminate_round().await;

    // The first round-2 miner reveals its own secret directly.
    let order2 = net.keys_in_order().await;
    let revealer = order2[0];
    net.mine_update_value(
        &revealer,
        TestNet::secret_for(&revealer, 2),
        Some(TestNet::secret_for(&revealer, 1)),
        200,
        Default::default(),
    )
    .await;

    let current = net.current_round().await;
    assert_eq!(
        current.miners[&revealer].previous_in_value,
        Some(TestNet::secret_for(&revealer, 1))
    );
}
