use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use alloy::primitives::B256;
use beacon_sync::{
    config::{client_config::Config, networks, types::ChainConfig},
    consensus::{
        constants::{DOMAIN_SYNC_COMMITTEE, SLOTS_PER_PERIOD},
        errors::ConsensusError,
        rpc::mock_rpc::MockRpc,
        store::LightClientStore,
        types::{CommitteeUpdate, HeadUpdate, LightClientBootstrap},
        utils::{compute_domain, compute_signing_root},
        ConsensusLightClient,
    },
    database::ConfigDB,
    types::{
        block::{BeaconBlock, BeaconBlockBody},
        header::BeaconBlockHeader,
        pubkey::PubKey,
        signature::BlsSignature,
        sync_committee::{SyncAggregate, SyncCommittee},
    },
    Client, ClientBuilder,
};
use milagro_bls::{AggregateSignature, PublicKey, SecretKey, Signature};
use sha2::{Digest, Sha256};
use ssz_types::{typenum::U512, BitVector, FixedVector};
use tree_hash::TreeHash;

/// A sync committee together with the secret keys behind it.
struct TestCommittee {
    keys: Vec<SecretKey>,
    committee: SyncCommittee,
}

fn test_committee(seed: u8) -> TestCommittee {
    let mut keys = Vec::with_capacity(512);
    let mut pubkeys = Vec::with_capacity(512);
    for i in 0..512u16 {
        let mut ikm = [0u8; 32];
        ikm[1] = seed;
        let scalar = i + 1;
        ikm[30] = (scalar >> 8) as u8;
        ikm[31] = scalar as u8;
        let sk = SecretKey::from_bytes(&ikm).expect("valid secret key");
        pubkeys.push(PubKey::from(
            PublicKey::from_secret_key(&sk).as_bytes().to_vec(),
        ));
        keys.push(sk);
    }

    TestCommittee {
        keys,
        committee: SyncCommittee {
            pubkeys: FixedVector::from(pubkeys),
            aggregate_pubkey: PubKey::default(),
        },
    }
}

/// Folds a leaf up a branch, producing the root the verifier will recompute.
fn root_from_branch(leaf: B256, branch: &[B256], index: usize) -> B256 {
    let mut value = leaf;
    for (i, node) in branch.iter().enumerate() {
        let mut hasher = Sha256::new();
        if (index >> i) & 1 == 1 {
            hasher.update(node);
            hasher.update(value);
        } else {
            hasher.update(value);
            hasher.update(node);
        }
        value = B256::from_slice(&hasher.finalize());
    }
    value
}

fn test_config(current_slot: u64) -> Config {
    let base = networks::mainnet();
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();

    Config {
        consensus_rpc: String::new(),
        chain: ChainConfig {
            chain_id: 1,
            genesis_time: now - current_slot * 12,
            genesis_root: base.chain.genesis_root,
        },
        forks: base.forks,
        max_checkpoint_age: 123123123,
        ..Default::default()
    }
}

fn sign_header(
    committee: &TestCommittee,
    header: &BeaconBlockHeader,
    signature_slot: u64,
    config: &Config,
    num_signers: usize,
) -> SyncAggregate {
    let domain = compute_domain(
        &DOMAIN_SYNC_COMMITTEE,
        config.fork_version(signature_slot.saturating_sub(1)),
        config.chain.genesis_root,
    );
    let signing_root = compute_signing_root(header.root(), domain);

    let mut bits = BitVector::<U512>::new();
    let mut signatures = Vec::with_capacity(num_signers);
    for (i, key) in committee.keys.iter().take(num_signers).enumerate() {
        bits.set(i, true).unwrap();
        signatures.push(Signature::new(signing_root.as_slice(), key));
    }
    let signatures: Vec<&Signature> = signatures.iter().collect();
    let aggregate = AggregateSignature::aggregate(&signatures);

    let mut signature = [0u8; 96];
    signature.copy_from_slice(&aggregate.as_bytes());

    SyncAggregate {
        sync_committee_bits: bits,
        sync_committee_signature: BlsSignature { signature },
    }
}

fn header_at(slot: u64, state_root: B256) -> BeaconBlockHeader {
    BeaconBlockHeader {
        slot,
        state_root,
        ..Default::default()
    }
}

fn bootstrap_for(committee: &SyncCommittee, slot: u64) -> (LightClientBootstrap, B256) {
    let branch = vec![B256::ZERO; 5];
    let state_root = root_from_branch(committee.tree_hash_root(), &branch, 22);
    let header = header_at(slot, state_root);
    let checkpoint = header.root();

    (
        LightClientBootstrap {
            header,
            current_sync_committee: committee.clone(),
            current_sync_committee_branch: FixedVector::from(branch),
        },
        checkpoint,
    )
}

fn committee_update(
    signer: &TestCommittee,
    next: &SyncCommittee,
    attested_slot: u64,
    signature_slot: u64,
    config: &Config,
    num_signers: usize,
) -> CommitteeUpdate {
    let branch = vec![B256::repeat_byte(0xcc); 5];
    let state_root = root_from_branch(next.tree_hash_root(), &branch, 23);
    let attested_header = header_at(attested_slot, state_root);
    let sync_aggregate = sign_header(signer, &attested_header, signature_slot, config, num_signers);

    CommitteeUpdate {
        attested_header,
        next_sync_committee: next.clone(),
        next_sync_committee_branch: FixedVector::from(branch),
        sync_aggregate,
        signature_slot,
    }
}

fn finality_update(
    signer: &TestCommittee,
    attested_slot: u64,
    finalized_header: BeaconBlockHeader,
    signature_slot: u64,
    config: &Config,
    num_signers: usize,
) -> HeadUpdate {
    let branch = vec![B256::repeat_byte(0xfb); 6];
    let state_root = root_from_branch(finalized_header.root(), &branch, 41);
    let attested_header = header_at(attested_slot, state_root);
    let sync_aggregate = sign_header(signer, &attested_header, signature_slot, config, num_signers);

    HeadUpdate {
        attested_header,
        finalized_header: Some(finalized_header),
        finality_branch: Some(FixedVector::from(branch)),
        sync_aggregate,
        signature_slot,
    }
}

fn optimistic_update(
    signer: &TestCommittee,
    attested_header: BeaconBlockHeader,
    signature_slot: u64,
    config: &Config,
    num_signers: usize,
) -> HeadUpdate {
    let sync_aggregate = sign_header(signer, &attested_header, signature_slot, config, num_signers);

    HeadUpdate {
        attested_header,
        finalized_header: None,
        finality_branch: None,
        sync_aggregate,
        signature_slot,
    }
}

fn block_at(slot: u64, block_number: u64) -> BeaconBlock {
    let mut body = BeaconBlockBody::default();
    body.execution_payload.block_number = block_number;

    BeaconBlock {
        slot,
        proposer_index: 0,
        parent_root: B256::repeat_byte(0xaa),
        state_root: B256::repeat_byte(0xbb),
        body,
    }
}

const PERIOD_10_SLOT: u64 = 10 * SLOTS_PER_PERIOD;
const PERIOD_11_SLOT: u64 = 11 * SLOTS_PER_PERIOD;
const CURRENT_SLOT: u64 = PERIOD_11_SLOT + 10;

fn bootstrapped_store(committee: &TestCommittee) -> LightClientStore {
    let (bootstrap, checkpoint) = bootstrap_for(&committee.committee, PERIOD_10_SLOT);
    LightClientStore::from_bootstrap(&bootstrap, checkpoint).unwrap()
}

#[test]
fn committee_rotation_scenario() {
    let c0 = test_committee(1);
    let c1 = test_committee(2);
    let config = test_config(CURRENT_SLOT);
    let mut store = bootstrapped_store(&c0);

    assert_eq!(store.finalized_period(), 10);
    assert!(store.next_sync_committee().is_none());

    // U1 reveals the committee of period 11, signed by the current one.
    let u1 = committee_update(
        &c0,
        &c1.committee,
        PERIOD_10_SLOT + 1,
        PERIOD_10_SLOT + 2,
        &config,
        512,
    );
    store
        .insert(
            &u1.clone().into(),
            CURRENT_SLOT,
            config.chain.genesis_root,
            &config.forks,
        )
        .unwrap();
    assert_eq!(store.next_sync_committee(), Some(&c1.committee));
    assert_eq!(store.optimistic_header().slot, PERIOD_10_SLOT + 1);

    // U2 finalizes into period 11; the signature period selects the next
    // committee, and the rollover promotes it.
    let finalized = header_at(PERIOD_11_SLOT, B256::repeat_byte(0x11));
    let u2 = finality_update(
        &c1,
        PERIOD_11_SLOT + 5,
        finalized,
        PERIOD_11_SLOT + 6,
        &config,
        350,
    );
    store
        .insert(
            &u2.into(),
            CURRENT_SLOT,
            config.chain.genesis_root,
            &config.forks,
        )
        .unwrap();

    assert_eq!(store.current_sync_committee(), &c1.committee);
    assert!(store.next_sync_committee().is_none());
    assert_eq!(store.finalized_header().slot, PERIOD_11_SLOT);
    assert_eq!(store.optimistic_header().slot, PERIOD_11_SLOT + 5);
    assert_eq!(store.finalized_period(), 11);
}

#[test]
fn stale_update_leaves_store_unchanged() {
    let c0 = test_committee(1);
    let config = test_config(CURRENT_SLOT);
    let mut store = bootstrapped_store(&c0);

    let attested = header_at(PERIOD_10_SLOT + 5, B256::repeat_byte(0x33));
    let update = optimistic_update(&c0, attested, PERIOD_10_SLOT + 6, &config, 400);
    store
        .insert(
            &update.clone().into(),
            CURRENT_SLOT,
            config.chain.genesis_root,
            &config.forks,
        )
        .unwrap();

    let snapshot = store.clone();
    let err = store
        .insert(
            &update.into(),
            CURRENT_SLOT,
            config.chain.genesis_root,
            &config.forks,
        )
        .unwrap_err();

    assert!(matches!(err, ConsensusError::StaleUpdate(_, _)));
    assert_eq!(store, snapshot);
}

#[test]
fn threshold_enforced_before_signature_checks() {
    let c0 = test_committee(1);
    let config = test_config(CURRENT_SLOT);
    let mut store = bootstrapped_store(&c0);

    // Garbage signature: the participation check must fire first.
    let mut bits = BitVector::<U512>::new();
    for i in 0..341 {
        bits.set(i, true).unwrap();
    }
    let update = HeadUpdate {
        attested_header: header_at(PERIOD_10_SLOT + 5, B256::repeat_byte(0x33)),
        finalized_header: None,
        finality_branch: None,
        sync_aggregate: SyncAggregate {
            sync_committee_bits: bits,
            sync_committee_signature: BlsSignature::default(),
        },
        signature_slot: PERIOD_10_SLOT + 6,
    };

    let err = store
        .insert(
            &update.into(),
            CURRENT_SLOT,
            config.chain.genesis_root,
            &config.forks,
        )
        .unwrap_err();
    assert_eq!(err, ConsensusError::InsufficientSigners(341));
}

#[test]
fn unknown_committee_rejected() {
    let c0 = test_committee(1);
    let config = test_config(12 * SLOTS_PER_PERIOD + 10);
    let mut store = bootstrapped_store(&c0);

    // Signature period 11 with no known next committee.
    let attested = header_at(PERIOD_11_SLOT + 1, B256::repeat_byte(0x33));
    let update = optimistic_update(&c0, attested, PERIOD_11_SLOT + 2, &config, 400);
    let err = store
        .insert(
            &update.into(),
            12 * SLOTS_PER_PERIOD + 10,
            config.chain.genesis_root,
            &config.forks,
        )
        .unwrap_err();
    assert_eq!(err, ConsensusError::UnknownCommittee(11));
}

#[test]
fn conflicting_committee_rejected_and_redelivery_is_noop() {
    let c0 = test_committee(1);
    let c1 = test_committee(2);
    let c2 = test_committee(3);
    let config = test_config(CURRENT_SLOT);
    let mut store = bootstrapped_store(&c0);

    let u1 = committee_update(
        &c0,
        &c1.committee,
        PERIOD_10_SLOT + 1,
        PERIOD_10_SLOT + 2,
        &config,
        512,
    );
    store
        .insert(
            &u1.clone().into(),
            CURRENT_SLOT,
            config.chain.genesis_root,
            &config.forks,
        )
        .unwrap();

    // The identical update again: accepted, but nothing changes.
    let snapshot = store.clone();
    let transition = store
        .insert(
            &u1.into(),
            CURRENT_SLOT,
            config.chain.genesis_root,
            &config.forks,
        )
        .unwrap();
    assert!(transition.is_noop());
    assert_eq!(store, snapshot);

    // A different committee for the same period is a conflict.
    let u_conflict = committee_update(
        &c0,
        &c2.committee,
        PERIOD_10_SLOT + 3,
        PERIOD_10_SLOT + 4,
        &config,
        512,
    );
    let err = store
        .insert(
            &u_conflict.into(),
            CURRENT_SLOT,
            config.chain.genesis_root,
            &config.forks,
        )
        .unwrap_err();
    assert_eq!(err, ConsensusError::ConflictingCommitteeUpdate);
    assert_eq!(store, snapshot);
}

#[test]
fn heads_advance_monotonically() {
    let c0 = test_committee(1);
    let config = test_config(CURRENT_SLOT);
    let mut store = bootstrapped_store(&c0);

    let mut last_optimistic = store.optimistic_header().slot;
    for offset in [3u64, 7, 20, 21] {
        let attested = header_at(PERIOD_10_SLOT + offset, B256::repeat_byte(offset as u8));
        let update = optimistic_update(&c0, attested, PERIOD_10_SLOT + offset + 1, &config, 450);
        store
            .insert(
                &update.into(),
                CURRENT_SLOT,
                config.chain.genesis_root,
                &config.forks,
            )
            .unwrap();

        assert!(store.optimistic_header().slot >= last_optimistic);
        assert!(store.finalized_header().slot <= store.optimistic_header().slot);
        last_optimistic = store.optimistic_header().slot;
    }

    // A finality proof for a slot at or below the stored finalized slot is
    // ignored; the head still advances.
    let finalized = header_at(PERIOD_10_SLOT, B256::repeat_byte(0x44));
    let previously_finalized = store.finalized_header().clone();
    let regress = finality_update(
        &c0,
        PERIOD_10_SLOT + 30,
        finalized,
        PERIOD_10_SLOT + 31,
        &config,
        450,
    );
    let transition = store
        .insert(
            &regress.into(),
            CURRENT_SLOT,
            config.chain.genesis_root,
            &config.forks,
        )
        .unwrap();
    assert!(transition.finalized.is_none());
    assert_eq!(store.finalized_header(), &previously_finalized);
    assert_eq!(store.optimistic_header().slot, PERIOD_10_SLOT + 30);
}

#[test]
fn invalid_signature_rejected() {
    let c0 = test_committee(1);
    let c1 = test_committee(2);
    let config = test_config(CURRENT_SLOT);
    let mut store = bootstrapped_store(&c0);

    // Signed by the wrong committee's keys.
    let attested = header_at(PERIOD_10_SLOT + 5, B256::repeat_byte(0x33));
    let update = optimistic_update(&c1, attested, PERIOD_10_SLOT + 6, &config, 400);
    let err = store
        .insert(
            &update.into(),
            CURRENT_SLOT,
            config.chain.genesis_root,
            &config.forks,
        )
        .unwrap_err();
    assert_eq!(err, ConsensusError::InvalidSignature);
}

#[tokio::test]
async fn driver_publishes_verified_payload() {
    let c0 = test_committee(1);
    let config = test_config(CURRENT_SLOT);

    let block = block_at(PERIOD_10_SLOT + 5, 1234);
    let attested = block.header();

    let (bootstrap, checkpoint) = bootstrap_for(&c0.committee, PERIOD_10_SLOT);
    let rpc = MockRpc::default();
    rpc.stage_bootstrap(bootstrap);
    rpc.stage_optimistic_update(optimistic_update(
        &c0,
        attested.clone(),
        PERIOD_10_SLOT + 6,
        &config,
        400,
    ));
    rpc.stage_block(attested.root(), block);

    let mut client =
        ConsensusLightClient::with_custom_rpc(rpc, checkpoint, Arc::new(config));
    let mut heads = client.feed().subscribe();

    client.bootstrap().await.unwrap();
    client.advance().await.unwrap();

    let event = heads.try_recv().unwrap();
    assert_eq!(event.header, attested);
    assert_eq!(event.payload.block_number, 1234);
    assert_eq!(client.get_header().unwrap().slot, PERIOD_10_SLOT + 5);
}

#[tokio::test]
async fn block_root_mismatch_suppresses_publication() {
    let c0 = test_committee(1);
    let config = test_config(CURRENT_SLOT);

    let block = block_at(PERIOD_10_SLOT + 5, 1234);
    let attested = block.header();

    // The provider serves a different block under the attested root.
    let tampered = block_at(PERIOD_10_SLOT + 5, 4321);

    let (bootstrap, checkpoint) = bootstrap_for(&c0.committee, PERIOD_10_SLOT);
    let rpc = MockRpc::default();
    rpc.stage_bootstrap(bootstrap);
    rpc.stage_optimistic_update(optimistic_update(
        &c0,
        attested.clone(),
        PERIOD_10_SLOT + 6,
        &config,
        400,
    ));
    rpc.stage_block(attested.root(), tampered);

    let mut client =
        ConsensusLightClient::with_custom_rpc(rpc, checkpoint, Arc::new(config));
    let mut heads = client.feed().subscribe();

    client.bootstrap().await.unwrap();
    client.advance().await.unwrap();

    // No event, but the header update itself still stands.
    assert!(heads.try_recv().is_err());
    assert_eq!(client.get_header().unwrap().slot, PERIOD_10_SLOT + 5);
    assert_eq!(client.get_finalized_header().unwrap().slot, PERIOD_10_SLOT);
}

#[tokio::test]
async fn driver_learns_next_committee() {
    let c0 = test_committee(1);
    let c1 = test_committee(2);
    let config = test_config(CURRENT_SLOT);

    let block = block_at(PERIOD_10_SLOT + 5, 1);
    let attested = block.header();

    let (bootstrap, checkpoint) = bootstrap_for(&c0.committee, PERIOD_10_SLOT);
    let rpc = MockRpc::default();
    rpc.stage_bootstrap(bootstrap);
    rpc.stage_update(
        10,
        committee_update(
            &c0,
            &c1.committee,
            PERIOD_10_SLOT + 1,
            PERIOD_10_SLOT + 2,
            &config,
            512,
        ),
    );
    rpc.stage_optimistic_update(optimistic_update(
        &c0,
        attested.clone(),
        PERIOD_10_SLOT + 6,
        &config,
        400,
    ));
    rpc.stage_block(attested.root(), block);

    let mut client =
        ConsensusLightClient::with_custom_rpc(rpc, checkpoint, Arc::new(config));
    client.bootstrap().await.unwrap();
    client.advance().await.unwrap();

    let store = client.store_handle();
    let store = store.read();
    assert_eq!(
        store.as_ref().unwrap().next_sync_committee(),
        Some(&c1.committee)
    );
}

#[test]
fn builder_constructs_client_from_network_preset() {
    let client: Client<ConfigDB, MockRpc> = ClientBuilder::new()
        .network(networks::Network::Mainnet)
        .consensus_rpc("http://localhost:5052")
        .build()
        .unwrap();

    // Nothing is known before the client is started.
    assert!(client.header().is_none());
    assert!(client.finalized().is_none());
}

#[tokio::test]
async fn advance_before_bootstrap_does_not_panic() {
    let c0 = test_committee(1);
    let config = test_config(CURRENT_SLOT);

    let attested = header_at(PERIOD_10_SLOT + 5, B256::repeat_byte(0x33));
    let rpc = MockRpc::default();
    rpc.stage_optimistic_update(optimistic_update(
        &c0,
        attested,
        PERIOD_10_SLOT + 6,
        &config,
        400,
    ));

    let mut client = ConsensusLightClient::with_custom_rpc(rpc, B256::ZERO, Arc::new(config));
    // The update is rejected and logged; nothing is applied.
    client.advance().await.unwrap();
    assert!(client.get_header().is_none());
}

#[tokio::test]
async fn bootstrap_rejects_mismatched_checkpoint() {
    let c0 = test_committee(1);
    let config = test_config(CURRENT_SLOT);

    let (bootstrap, _) = bootstrap_for(&c0.committee, PERIOD_10_SLOT);
    let rpc = MockRpc::default();
    rpc.stage_bootstrap(bootstrap);

    let mut client = ConsensusLightClient::with_custom_rpc(
        rpc,
        B256::repeat_byte(0xde),
        Arc::new(config),
    );
    assert!(client.bootstrap().await.is_err());
    assert!(client.get_header().is_none());
}
