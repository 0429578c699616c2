use alloy::primitives::B256;

use crate::{
    config::types::Forks,
    consensus::{
        constants::{
            FINALITY_PROOF_DEPTH, FINALITY_PROOF_INDEX, MIN_SYNC_COMMITTEE_PARTICIPANTS,
            NEXT_COMMITTEE_PROOF_DEPTH, NEXT_COMMITTEE_PROOF_INDEX,
        },
        errors::ConsensusError,
        store::LightClientStore,
        types::{CommitteeUpdate, HeadUpdate, LightClientUpdate},
        utils::{
            calc_sync_period, compute_domain, compute_signing_root, get_bits,
            get_participating_keys, is_aggregate_valid, is_proof_valid, is_valid_merkle_branch,
        },
    },
    types::{header::BeaconBlockHeader, sync_committee::SyncCommittee},
};

use super::constants::DOMAIN_SYNC_COMMITTEE;

/// The state changes a verified update is entitled to make. Produced by
/// [`verify_update`] and applied atomically by the store; a rejected update
/// never produces one.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Transition {
    pub optimistic: Option<BeaconBlockHeader>,
    pub finalized: Option<BeaconBlockHeader>,
    pub next_sync_committee: Option<SyncCommittee>,
    /// Promote the known next committee to current before any other field is
    /// applied. Set when the finalized header crosses a period boundary.
    pub rotate: bool,
}

impl Transition {
    pub fn is_noop(&self) -> bool {
        self == &Self::default()
    }
}

/// Judges an update exclusively against the store's current trusted state.
///
/// Checks, in order: participation threshold, slot ordering, committee
/// availability for the signature period, the update's Merkle proof, and
/// finally the aggregate BLS signature over the attested header. Returns the
/// transition the update is entitled to; the store is not touched.
pub fn verify_update(
    store: &LightClientStore,
    update: &LightClientUpdate,
    expected_current_slot: u64,
    genesis_root: B256,
    forks: &Forks,
) -> Result<Transition, ConsensusError> {
    let bits = get_bits(&update.sync_aggregate().sync_committee_bits);
    if bits < MIN_SYNC_COMMITTEE_PARTICIPANTS {
        return Err(ConsensusError::InsufficientSigners(bits));
    }

    let attested_slot = update.attested_header().slot;
    let signature_slot = update.signature_slot();
    let valid_time =
        expected_current_slot >= signature_slot && signature_slot > attested_slot;
    if !valid_time {
        return Err(ConsensusError::InvalidTimestamp);
    }

    let store_period = store.finalized_period();
    let signature_period = calc_sync_period(signature_slot);
    let committee = if signature_period == store_period {
        store.current_sync_committee()
    } else if signature_period == store_period + 1 {
        store
            .next_sync_committee()
            .ok_or(ConsensusError::UnknownCommittee(signature_period))?
    } else {
        return Err(ConsensusError::UnknownCommittee(signature_period));
    };

    let transition = match update {
        LightClientUpdate::Committee(update) => {
            verify_committee_update(store, update, store_period)?
        }
        LightClientUpdate::Head(update) => verify_head_update(store, update, store_period)?,
    };

    let pks =
        get_participating_keys(&committee.pubkeys, &update.sync_aggregate().sync_committee_bits);
    let pks: Vec<&_> = pks.iter().collect();

    let fork_version = forks.fork_version(signature_slot.saturating_sub(1));
    let domain = compute_domain(&DOMAIN_SYNC_COMMITTEE, fork_version, genesis_root);
    let signing_root = compute_signing_root(update.attested_header().root(), domain);
    let is_valid_sig = is_aggregate_valid(
        &update.sync_aggregate().sync_committee_signature,
        signing_root.as_slice(),
        &pks,
    );
    if !is_valid_sig {
        return Err(ConsensusError::InvalidSignature);
    }

    Ok(transition)
}

fn verify_committee_update(
    store: &LightClientStore,
    update: &CommitteeUpdate,
    store_period: u64,
) -> Result<Transition, ConsensusError> {
    let update_period = calc_sync_period(update.attested_header.slot);
    if update_period != store_period {
        return Err(ConsensusError::InvalidPeriod(update_period, store_period));
    }

    let proof_valid = is_proof_valid(
        update.attested_header.state_root,
        &update.next_sync_committee,
        &update.next_sync_committee_branch,
        NEXT_COMMITTEE_PROOF_DEPTH,
        NEXT_COMMITTEE_PROOF_INDEX,
    );
    if !proof_valid {
        return Err(ConsensusError::InvalidNextSyncCommitteeProof);
    }

    let mut transition = match store.next_sync_committee() {
        // Redundant redelivery of the committee we already hold is a no-op.
        Some(known) if known == &update.next_sync_committee => Transition::default(),
        Some(_) => return Err(ConsensusError::ConflictingCommitteeUpdate),
        None => Transition {
            next_sync_committee: Some(update.next_sync_committee.clone()),
            ..Default::default()
        },
    };

    // Committee-learning and head-advancement are independent: an older
    // attested header still reveals the committee, a newer one also moves
    // the optimistic head.
    if update.attested_header.slot > store.optimistic_header().slot {
        transition.optimistic = Some(update.attested_header.clone());
    }

    Ok(transition)
}

fn verify_head_update(
    store: &LightClientStore,
    update: &HeadUpdate,
    store_period: u64,
) -> Result<Transition, ConsensusError> {
    let attested_slot = update.attested_header.slot;
    let optimistic_slot = store.optimistic_header().slot;
    if attested_slot <= optimistic_slot {
        return Err(ConsensusError::StaleUpdate(attested_slot, optimistic_slot));
    }

    let mut transition = Transition {
        optimistic: Some(update.attested_header.clone()),
        ..Default::default()
    };

    if let Some(finalized_header) = &update.finalized_header {
        let branch = update
            .finality_branch
            .as_ref()
            .ok_or(ConsensusError::InvalidFinalityProof)?;
        let proof_valid = is_valid_merkle_branch(
            finalized_header.root(),
            branch,
            FINALITY_PROOF_DEPTH,
            FINALITY_PROOF_INDEX,
            update.attested_header.state_root,
        );
        if !proof_valid {
            return Err(ConsensusError::InvalidFinalityProof);
        }
        if attested_slot < finalized_header.slot {
            return Err(ConsensusError::InvalidTimestamp);
        }

        // Finality never moves backwards: a proof for a slot at or below the
        // stored finalized slot is ignored while the head still advances.
        if finalized_header.slot > store.finalized_header().slot {
            let new_period = calc_sync_period(finalized_header.slot);
            if new_period > store_period {
                if store.next_sync_committee().is_none() {
                    return Err(ConsensusError::UnknownCommittee(new_period));
                }
                transition.rotate = true;
            }
            transition.finalized = Some(finalized_header.clone());
        }
    }

    Ok(transition)
}
