use alloy::primitives::{FixedBytes, B256};
use milagro_bls::{AggregateSignature, PublicKey};
use sha2::{Digest, Sha256};
use ssz_types::BitVector;
use tree_hash::TreeHash;
use tree_hash_derive::TreeHash;

use crate::{
    consensus::constants::{EPOCHS_PER_SYNC_COMMITTEE_PERIOD, SLOTS_PER_EPOCH},
    types::{pubkey::PubKey, signature::BlsSignature},
};

/// The sync-committee period a slot belongs to.
pub fn calc_sync_period(slot: u64) -> u64 {
    let epoch = slot / SLOTS_PER_EPOCH;
    epoch / EPOCHS_PER_SYNC_COMMITTEE_PERIOD
}

pub fn get_bits(bitfield: &BitVector<ssz_types::typenum::U512>) -> u64 {
    bitfield.iter().filter(|bit| *bit).count() as u64
}

pub fn get_participating_keys(
    pubkeys: &[PubKey],
    bitfield: &BitVector<ssz_types::typenum::U512>,
) -> Vec<PublicKey> {
    let mut public_keys: Vec<PublicKey> = Vec::new();
    bitfield.iter().enumerate().for_each(|(i, bit)| {
        if bit {
            if let Ok(pk) = PublicKey::from_bytes_unchecked(pubkeys[i].as_ref()) {
                public_keys.push(pk);
            }
        }
    });
    public_keys
}

pub fn is_aggregate_valid(sig_bytes: &BlsSignature, msg: &[u8], pks: &[&PublicKey]) -> bool {
    match AggregateSignature::from_bytes(&sig_bytes.signature) {
        Ok(sig) => sig.fast_aggregate_verify(msg, pks),
        Err(_) => false,
    }
}

/// Folds a Merkle branch into the root it commits to.
///
/// https://github.com/ethereum/consensus-specs/blob/dev/specs/phase0/beacon-chain.md#is_valid_merkle_branch
pub fn is_valid_merkle_branch(
    leaf: B256,
    branch: &[B256],
    depth: usize,
    index: usize,
    root: B256,
) -> bool {
    if branch.len() < depth {
        return false;
    }
    let mut value = leaf;
    for (i, node) in branch.iter().take(depth).enumerate() {
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
    value == root
}

pub fn is_proof_valid<L: TreeHash>(
    state_root: B256,
    leaf_object: &L,
    branch: &[B256],
    depth: usize,
    index: usize,
) -> bool {
    is_valid_merkle_branch(leaf_object.tree_hash_root(), branch, depth, index, state_root)
}

#[derive(Default, Debug, TreeHash)]
struct SigningData {
    object_root: B256,
    domain: B256,
}

#[derive(Default, Debug, TreeHash)]
struct ForkData {
    current_version: FixedBytes<4>,
    genesis_validator_root: B256,
}

pub fn compute_signing_root(object_root: B256, domain: B256) -> B256 {
    let data = SigningData {
        object_root,
        domain,
    };
    data.tree_hash_root()
}

pub fn compute_domain(
    domain_type: &[u8],
    fork_version: FixedBytes<4>,
    genesis_root: B256,
) -> B256 {
    let fork_data_root = compute_fork_data_root(fork_version, genesis_root);
    let start = domain_type;
    let end = &fork_data_root.as_slice()[..28];
    let d = [start, end].concat();
    B256::from_slice(&d)
}

pub fn compute_fork_data_root(
    current_version: FixedBytes<4>,
    genesis_validator_root: B256,
) -> B256 {
    let fork_data = ForkData {
        current_version,
        genesis_validator_root,
    };
    fork_data.tree_hash_root()
}
