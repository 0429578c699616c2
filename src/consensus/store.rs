use alloy::primitives::B256;

use crate::{
    config::types::Forks,
    consensus::{
        constants::{CURRENT_COMMITTEE_PROOF_DEPTH, CURRENT_COMMITTEE_PROOF_INDEX},
        errors::ConsensusError,
        types::{LightClientBootstrap, LightClientUpdate},
        utils::{calc_sync_period, is_proof_valid},
        verify::{verify_update, Transition},
    },
    types::{header::BeaconBlockHeader, sync_committee::SyncCommittee},
};

/// The client's trusted state. Mutated only by [`LightClientStore::apply`],
/// which takes the full transition a verified update produced, so a store is
/// never left holding half of an update.
#[derive(Debug, Clone, PartialEq)]
pub struct LightClientStore {
    finalized_header: BeaconBlockHeader,
    optimistic_header: BeaconBlockHeader,
    current_sync_committee: SyncCommittee,
    next_sync_committee: Option<SyncCommittee>,
}

impl LightClientStore {
    /// Anchors a fresh store to a trusted checkpoint root. The served header
    /// must hash to the checkpoint and the committee proof must commit to the
    /// header's state root.
    pub fn from_bootstrap(
        bootstrap: &LightClientBootstrap,
        checkpoint_root: B256,
    ) -> Result<Self, ConsensusError> {
        let header_root = bootstrap.header.root();
        if header_root != checkpoint_root {
            return Err(ConsensusError::InvalidHeaderHash(checkpoint_root, header_root));
        }

        let committee_valid = is_proof_valid(
            bootstrap.header.state_root,
            &bootstrap.current_sync_committee,
            &bootstrap.current_sync_committee_branch,
            CURRENT_COMMITTEE_PROOF_DEPTH,
            CURRENT_COMMITTEE_PROOF_INDEX,
        );
        if !committee_valid {
            return Err(ConsensusError::InvalidCurrentSyncCommitteeProof);
        }

        Ok(Self {
            finalized_header: bootstrap.header.clone(),
            optimistic_header: bootstrap.header.clone(),
            current_sync_committee: bootstrap.current_sync_committee.clone(),
            next_sync_committee: None,
        })
    }

    pub fn finalized_header(&self) -> &BeaconBlockHeader {
        &self.finalized_header
    }

    pub fn optimistic_header(&self) -> &BeaconBlockHeader {
        &self.optimistic_header
    }

    pub fn current_sync_committee(&self) -> &SyncCommittee {
        &self.current_sync_committee
    }

    pub fn next_sync_committee(&self) -> Option<&SyncCommittee> {
        self.next_sync_committee.as_ref()
    }

    /// The sync-committee period of the finalized header. This is the period
    /// the current committee serves.
    pub fn finalized_period(&self) -> u64 {
        calc_sync_period(self.finalized_header.slot)
    }

    /// The single state-transition entry point. Verifies `update` against the
    /// current trusted state and, only if the whole update checks out, applies
    /// the resulting transition. A rejected update leaves the store untouched.
    pub fn insert(
        &mut self,
        update: &LightClientUpdate,
        expected_current_slot: u64,
        genesis_root: B256,
        forks: &Forks,
    ) -> Result<Transition, ConsensusError> {
        let transition = verify_update(self, update, expected_current_slot, genesis_root, forks)?;
        self.apply(transition.clone());
        Ok(transition)
    }

    pub fn apply(&mut self, transition: Transition) {
        if transition.rotate {
            if let Some(next) = self.next_sync_committee.take() {
                self.current_sync_committee = next;
            }
        }
        if let Some(next) = transition.next_sync_committee {
            self.next_sync_committee = Some(next);
        }
        if let Some(finalized) = transition.finalized {
            self.finalized_header = finalized;
        }
        if let Some(optimistic) = transition.optimistic {
            self.optimistic_header = optimistic;
        }
        // The optimistic head never lags the finalized one.
        if self.finalized_header.slot > self.optimistic_header.slot {
            self.optimistic_header = self.finalized_header.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use sha2::{Digest, Sha256};
    use ssz_types::FixedVector;
    use tree_hash::TreeHash;

    use super::*;
    use crate::{consensus::constants::SLOTS_PER_PERIOD, types::pubkey::PubKey};

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

    fn committee(seed: u8) -> SyncCommittee {
        SyncCommittee {
            pubkeys: FixedVector::from_elem(PubKey::from(vec![seed; 48])),
            aggregate_pubkey: PubKey::default(),
        }
    }

    fn bootstrap_at(slot: u64) -> (LightClientBootstrap, B256) {
        let current_sync_committee = committee(1);
        let branch = vec![B256::ZERO; CURRENT_COMMITTEE_PROOF_DEPTH];
        let state_root = root_from_branch(
            current_sync_committee.tree_hash_root(),
            &branch,
            CURRENT_COMMITTEE_PROOF_INDEX,
        );
        let header = BeaconBlockHeader {
            slot,
            state_root,
            ..Default::default()
        };
        let checkpoint = header.root();

        (
            LightClientBootstrap {
                header,
                current_sync_committee,
                current_sync_committee_branch: FixedVector::from(branch),
            },
            checkpoint,
        )
    }

    #[test]
    fn bootstrap_anchors_all_fields() {
        let (bootstrap, checkpoint) = bootstrap_at(10 * SLOTS_PER_PERIOD);
        let store = LightClientStore::from_bootstrap(&bootstrap, checkpoint).unwrap();

        assert_eq!(store.finalized_header(), &bootstrap.header);
        assert_eq!(store.optimistic_header(), &bootstrap.header);
        assert_eq!(store.current_sync_committee(), &bootstrap.current_sync_committee);
        assert!(store.next_sync_committee().is_none());
        assert_eq!(store.finalized_period(), 10);
    }

    #[test]
    fn bootstrap_rejects_wrong_root() {
        let (bootstrap, _) = bootstrap_at(10 * SLOTS_PER_PERIOD);
        let err = LightClientStore::from_bootstrap(&bootstrap, B256::repeat_byte(0xde)).unwrap_err();
        assert!(matches!(err, ConsensusError::InvalidHeaderHash(_, _)));
    }

    #[test]
    fn bootstrap_rejects_bad_committee_proof() {
        let (mut bootstrap, _) = bootstrap_at(10 * SLOTS_PER_PERIOD);
        bootstrap.current_sync_committee_branch =
            FixedVector::from(vec![B256::repeat_byte(0xbd); CURRENT_COMMITTEE_PROOF_DEPTH]);
        let checkpoint = bootstrap.header.root();

        let err = LightClientStore::from_bootstrap(&bootstrap, checkpoint).unwrap_err();
        assert_eq!(err, ConsensusError::InvalidCurrentSyncCommitteeProof);
    }

    #[test]
    fn apply_rotates_next_into_current() {
        let (bootstrap, checkpoint) = bootstrap_at(10 * SLOTS_PER_PERIOD);
        let mut store = LightClientStore::from_bootstrap(&bootstrap, checkpoint).unwrap();

        let next = committee(2);
        store.apply(Transition {
            next_sync_committee: Some(next.clone()),
            ..Default::default()
        });
        assert_eq!(store.next_sync_committee(), Some(&next));

        let finalized = BeaconBlockHeader {
            slot: 11 * SLOTS_PER_PERIOD,
            ..Default::default()
        };
        store.apply(Transition {
            finalized: Some(finalized),
            rotate: true,
            ..Default::default()
        });

        assert_eq!(store.current_sync_committee(), &next);
        assert!(store.next_sync_committee().is_none());
        assert_eq!(store.finalized_period(), 11);
    }

    #[test]
    fn optimistic_head_never_lags_finalized() {
        let (bootstrap, checkpoint) = bootstrap_at(10 * SLOTS_PER_PERIOD);
        let mut store = LightClientStore::from_bootstrap(&bootstrap, checkpoint).unwrap();

        let finalized = BeaconBlockHeader {
            slot: 10 * SLOTS_PER_PERIOD + 64,
            ..Default::default()
        };
        store.apply(Transition {
            finalized: Some(finalized.clone()),
            ..Default::default()
        });

        assert_eq!(store.finalized_header(), &finalized);
        assert_eq!(store.optimistic_header(), &finalized);
    }
}
