use alloy::primitives::B256;
use serde::{Deserialize, Serialize};
use serde_this_or_that::as_u64;
use ssz_types::{
    typenum::{U5, U6},
    FixedVector,
};

use crate::types::{
    header::BeaconBlockHeader,
    sync_committee::{SyncAggregate, SyncCommittee},
};

pub type CommitteeProofLen = U5;
pub type FinalityProofLen = U6;

/// Trust-anchoring snapshot served for a trusted block root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightClientBootstrap {
    pub header: BeaconBlockHeader,
    pub current_sync_committee: SyncCommittee,
    pub current_sync_committee_branch: FixedVector<B256, CommitteeProofLen>,
}

/// Reveals the sync committee of the upcoming period, authenticated by the
/// committee of the current one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitteeUpdate {
    pub attested_header: BeaconBlockHeader,
    pub next_sync_committee: SyncCommittee,
    pub next_sync_committee_branch: FixedVector<B256, CommitteeProofLen>,
    pub sync_aggregate: SyncAggregate,
    #[serde(deserialize_with = "as_u64")]
    pub signature_slot: u64,
}

/// Advances the head: an attested header and, for finality updates, the
/// finalized header it proves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadUpdate {
    pub attested_header: BeaconBlockHeader,
    #[serde(default)]
    pub finalized_header: Option<BeaconBlockHeader>,
    #[serde(default)]
    pub finality_branch: Option<FixedVector<B256, FinalityProofLen>>,
    pub sync_aggregate: SyncAggregate,
    #[serde(deserialize_with = "as_u64")]
    pub signature_slot: u64,
}

/// A self-contained, immutable claim about the chain; validity is judged
/// exclusively against the store's current trusted state.
#[derive(Debug, Clone, PartialEq)]
pub enum LightClientUpdate {
    Committee(CommitteeUpdate),
    Head(HeadUpdate),
}

impl LightClientUpdate {
    pub fn attested_header(&self) -> &BeaconBlockHeader {
        match self {
            Self::Committee(update) => &update.attested_header,
            Self::Head(update) => &update.attested_header,
        }
    }

    pub fn sync_aggregate(&self) -> &SyncAggregate {
        match self {
            Self::Committee(update) => &update.sync_aggregate,
            Self::Head(update) => &update.sync_aggregate,
        }
    }

    pub fn signature_slot(&self) -> u64 {
        match self {
            Self::Committee(update) => update.signature_slot,
            Self::Head(update) => update.signature_slot,
        }
    }
}

impl From<CommitteeUpdate> for LightClientUpdate {
    fn from(update: CommitteeUpdate) -> Self {
        Self::Committee(update)
    }
}

impl From<HeadUpdate> for LightClientUpdate {
    fn from(update: HeadUpdate) -> Self {
        Self::Head(update)
    }
}
