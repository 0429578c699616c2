use alloy::primitives::B256;
use thiserror::Error;

/// Typed rejections produced while validating bootstrap data and light-client
/// updates. A rejected update never mutates the store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("invalid header hash found: {0}, expected: {1}")]
    InvalidHeaderHash(B256, B256),
    #[error("invalid current sync committee proof")]
    InvalidCurrentSyncCommitteeProof,
    #[error("invalid next sync committee proof")]
    InvalidNextSyncCommitteeProof,
    #[error("invalid finality proof")]
    InvalidFinalityProof,
    #[error("invalid sync committee signature")]
    InvalidSignature,
    #[error("invalid update slot ordering")]
    InvalidTimestamp,
    #[error("committee update for period {0} outside the finalized period {1}")]
    InvalidPeriod(u64, u64),
    #[error("stale update: attested slot {0} is not newer than optimistic slot {1}")]
    StaleUpdate(u64, u64),
    #[error("insufficient signers: {0}")]
    InsufficientSigners(u64),
    #[error("no known committee for signature period {0}")]
    UnknownCommittee(u64),
    #[error("conflicting next committee for the current period")]
    ConflictingCommitteeUpdate,
    #[error("checkpoint is too old")]
    CheckpointTooOld,
    #[error("store is not initialized")]
    StoreNotInitialized,
    #[error("fetched block root {0} does not match attested header root {1}")]
    BlockRootMismatch(B256, B256),
    #[error("rpc is for the incorrect network")]
    IncorrectRpcNetwork,
}
