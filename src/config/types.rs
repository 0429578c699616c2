use alloy::primitives::{FixedBytes, B256};
use serde::{Deserialize, Serialize};

use crate::consensus::constants::SLOTS_PER_EPOCH;

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub genesis_time: u64,
    pub genesis_root: B256,
}

/// The fork schedule of a network. Wire types are single-fork; the schedule
/// only selects the fork version signatures are domained with.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct Forks {
    pub genesis: Fork,
    pub altair: Fork,
    pub bellatrix: Fork,
    pub capella: Fork,
    pub deneb: Fork,
    pub electra: Fork,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct Fork {
    pub epoch: u64,
    pub fork_version: FixedBytes<4>,
}

impl Forks {
    /// The fork version active at `slot`.
    pub fn fork_version(&self, slot: u64) -> FixedBytes<4> {
        let epoch = slot / SLOTS_PER_EPOCH;

        if epoch >= self.electra.epoch {
            self.electra.fork_version
        } else if epoch >= self.deneb.epoch {
            self.deneb.fork_version
        } else if epoch >= self.capella.epoch {
            self.capella.fork_version
        } else if epoch >= self.bellatrix.epoch {
            self.bellatrix.fork_version
        } else if epoch >= self.altair.epoch {
            self.altair.fork_version
        } else {
            self.genesis.fork_version
        }
    }
}
