use std::{collections::HashMap, sync::Arc};

use alloy::primitives::B256;
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;

use super::ConsensusRpc;
use crate::{
    consensus::types::{CommitteeUpdate, HeadUpdate, LightClientBootstrap},
    types::block::BeaconBlock,
};

/// In-memory provider scripted by tests. Every response must be staged first;
/// an unstaged call behaves like a transport error.
#[derive(Clone, Default, Debug)]
pub struct MockRpc {
    inner: Arc<Mutex<MockResponses>>,
}

#[derive(Default, Debug)]
struct MockResponses {
    bootstrap: Option<LightClientBootstrap>,
    updates: HashMap<u64, Vec<CommitteeUpdate>>,
    finality_update: Option<HeadUpdate>,
    optimistic_update: Option<HeadUpdate>,
    blocks: HashMap<B256, BeaconBlock>,
    chain_id: Option<u64>,
}

impl MockRpc {
    pub fn stage_bootstrap(&self, bootstrap: LightClientBootstrap) {
        self.inner.lock().bootstrap = Some(bootstrap);
    }

    pub fn stage_update(&self, period: u64, update: CommitteeUpdate) {
        self.inner.lock().updates.entry(period).or_default().push(update);
    }

    pub fn stage_finality_update(&self, update: HeadUpdate) {
        self.inner.lock().finality_update = Some(update);
    }

    pub fn stage_optimistic_update(&self, update: HeadUpdate) {
        self.inner.lock().optimistic_update = Some(update);
    }

    pub fn stage_block(&self, root: B256, block: BeaconBlock) {
        self.inner.lock().blocks.insert(root, block);
    }

    pub fn stage_chain_id(&self, chain_id: u64) {
        self.inner.lock().chain_id = Some(chain_id);
    }
}

#[async_trait]
impl ConsensusRpc for MockRpc {
    fn new(_path: &str) -> Self {
        MockRpc::default()
    }

    async fn get_bootstrap(&self, _block_root: B256) -> Result<LightClientBootstrap> {
        self.inner
            .lock()
            .bootstrap
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no bootstrap staged"))
    }

    async fn get_updates(&self, period: u64, count: u8) -> Result<Vec<CommitteeUpdate>> {
        let inner = self.inner.lock();
        let updates = inner.updates.get(&period).cloned().unwrap_or_default();
        Ok(updates.into_iter().take(count as usize).collect())
    }

    async fn get_finality_update(&self) -> Result<HeadUpdate> {
        self.inner
            .lock()
            .finality_update
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no finality update staged"))
    }

    async fn get_optimistic_update(&self) -> Result<HeadUpdate> {
        self.inner
            .lock()
            .optimistic_update
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no optimistic update staged"))
    }

    async fn get_block(&self, block_root: B256) -> Result<BeaconBlock> {
        self.inner
            .lock()
            .blocks
            .get(&block_root)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no block staged for root {block_root}"))
    }

    async fn chain_id(&self) -> Result<u64> {
        self.inner
            .lock()
            .chain_id
            .ok_or_else(|| anyhow::anyhow!("no chain id staged"))
    }

    fn name(&self) -> String {
        "mock".to_string()
    }
}
