pub mod http_rpc;
pub mod mock_rpc;

use alloy::primitives::B256;
use anyhow::Result;
use async_trait::async_trait;

use crate::{
    consensus::types::{CommitteeUpdate, HeadUpdate, LightClientBootstrap},
    types::block::BeaconBlock,
};

// implements https://github.com/ethereum/beacon-APIs/tree/master/apis/beacon/light_client
// plus block-by-root, which the driver needs to serve execution payloads
#[async_trait]
pub trait ConsensusRpc: Send + Sync {
    fn new(path: &str) -> Self;
    async fn get_bootstrap(&self, block_root: B256) -> Result<LightClientBootstrap>;
    async fn get_updates(&self, period: u64, count: u8) -> Result<Vec<CommitteeUpdate>>;
    async fn get_finality_update(&self) -> Result<HeadUpdate>;
    async fn get_optimistic_update(&self) -> Result<HeadUpdate>;
    async fn get_block(&self, block_root: B256) -> Result<BeaconBlock>;
    async fn chain_id(&self) -> Result<u64>;
    fn name(&self) -> String;
}
