//! Consensus constants.
//!
//! Mostly taken from:
//! https://github.com/ethereum/consensus-specs/blob/dev/presets/mainnet/phase0.yaml
//! and the Altair light-client sync protocol.

use std::time::Duration;

/// Number of slots per epoch.
///
/// 2**5 (= 32) slots, 6.4 minutes
pub const SLOTS_PER_EPOCH: u64 = 32;

/// Number of epochs served by a single sync committee.
///
/// 2**8 (= 256) epochs, ~27 hours
pub const EPOCHS_PER_SYNC_COMMITTEE_PERIOD: u64 = 256;

/// Number of slots served by a single sync committee.
pub const SLOTS_PER_PERIOD: u64 = SLOTS_PER_EPOCH * EPOCHS_PER_SYNC_COMMITTEE_PERIOD;

/// Seconds per slot.
pub const SECONDS_PER_SLOT: u64 = 12;

/// Number of validators in a sync committee.
pub const SYNC_COMMITTEE_SIZE: u64 = 512;

/// Minimum number of participating signers for an update to be considered,
/// a two-thirds supermajority of the committee.
pub const MIN_SYNC_COMMITTEE_PARTICIPANTS: u64 = 342;

/// Maximum number of committee updates served by a single range request.
pub const MAX_REQUEST_LIGHT_CLIENT_UPDATES: u8 = 128;

/// Per-call deadline for provider requests; a timed-out tick is retried on
/// the next interval.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Generalized-index coordinates of the `current_sync_committee` field in the
/// beacon state, relative to the attested state root.
pub const CURRENT_COMMITTEE_PROOF_DEPTH: usize = 5;
pub const CURRENT_COMMITTEE_PROOF_INDEX: usize = 22;

/// Coordinates of the `next_sync_committee` field in the beacon state.
pub const NEXT_COMMITTEE_PROOF_DEPTH: usize = 5;
pub const NEXT_COMMITTEE_PROOF_INDEX: usize = 23;

/// Coordinates of the `finalized_checkpoint.root` field in the beacon state.
pub const FINALITY_PROOF_DEPTH: usize = 6;
pub const FINALITY_PROOF_INDEX: usize = 41;

/// Domain type for sync-committee attestations.
pub const DOMAIN_SYNC_COMMITTEE: [u8; 4] = [7, 0, 0, 0];
