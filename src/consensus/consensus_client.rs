use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use alloy::primitives::B256;
use anyhow::{anyhow, Result};
use chrono::Duration;
use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use crate::{
    config::client_config::Config,
    consensus::{
        constants::{SECONDS_PER_SLOT, SLOTS_PER_EPOCH},
        errors::ConsensusError,
        rpc::ConsensusRpc,
        store::LightClientStore,
        types::LightClientUpdate,
        verify::Transition,
    },
    events::{ChainHeadEvent, ChainHeadFeed},
    types::header::BeaconBlockHeader,
};

// https://github.com/ethereum/consensus-specs/blob/dev/specs/altair/light-client/sync-protocol.md
// does not implement force updates

/// Drives the light-client protocol against a [`ConsensusRpc`] provider.
///
/// One [`advance`](Self::advance) call is one tick: learn the next committee
/// if it is still unknown, apply a head update, and publish the matching
/// execution payload. Everything short of a failed bootstrap is retried on
/// the next tick.
#[derive(Debug)]
pub struct ConsensusLightClient<R: ConsensusRpc> {
    rpc: R,
    store: Arc<RwLock<Option<LightClientStore>>>,
    feed: ChainHeadFeed,
    initial_checkpoint: B256,
    last_checkpoint: Arc<RwLock<Option<B256>>>,
    pub config: Arc<Config>,
}

impl<R: ConsensusRpc> ConsensusLightClient<R> {
    pub fn new(rpc: &str, checkpoint_block_root: B256, config: Arc<Config>) -> Self {
        Self::with_custom_rpc(R::new(rpc), checkpoint_block_root, config)
    }

    pub fn with_custom_rpc(rpc: R, checkpoint_block_root: B256, config: Arc<Config>) -> Self {
        ConsensusLightClient {
            rpc,
            store: Arc::new(RwLock::new(None)),
            feed: ChainHeadFeed::default(),
            initial_checkpoint: checkpoint_block_root,
            last_checkpoint: Arc::new(RwLock::new(None)),
            config,
        }
    }

    pub async fn check_rpc(&self) -> Result<()> {
        let chain_id = self.rpc.chain_id().await?;

        if chain_id != self.config.chain.chain_id {
            Err(ConsensusError::IncorrectRpcNetwork.into())
        } else {
            Ok(())
        }
    }

    pub fn feed(&self) -> &ChainHeadFeed {
        &self.feed
    }

    /// Snapshot of the latest validly-signed header, if bootstrapped.
    pub fn get_header(&self) -> Option<BeaconBlockHeader> {
        self.store
            .read()
            .as_ref()
            .map(|store| store.optimistic_header().clone())
    }

    /// Snapshot of the latest finalized header, if bootstrapped.
    pub fn get_finalized_header(&self) -> Option<BeaconBlockHeader> {
        self.store
            .read()
            .as_ref()
            .map(|store| store.finalized_header().clone())
    }

    /// Shared handle for concurrent readers. The driver stays the only
    /// writer.
    pub fn store_handle(&self) -> Arc<RwLock<Option<LightClientStore>>> {
        self.store.clone()
    }

    pub fn last_checkpoint_handle(&self) -> Arc<RwLock<Option<B256>>> {
        self.last_checkpoint.clone()
    }

    /// Establishes trust and applies the first head update. Any failure here
    /// is fatal; once this returns, [`advance`](Self::advance) keeps the
    /// client current.
    pub async fn sync(&mut self) -> Result<()> {
        self.bootstrap().await?;

        if let Err(err) = self.advance().await {
            warn!("could not advance past bootstrap: {err}");
        }

        info!(
            "light client in sync with checkpoint: {}",
            self.initial_checkpoint
        );

        Ok(())
    }

    pub async fn bootstrap(&mut self) -> Result<()> {
        let bootstrap = self
            .rpc
            .get_bootstrap(self.initial_checkpoint)
            .await
            .map_err(|err| anyhow!("could not fetch bootstrap: {err}"))?;

        if !self.is_valid_checkpoint(bootstrap.header.slot) {
            if self.config.strict_checkpoint_age {
                return Err(ConsensusError::CheckpointTooOld.into());
            }
            warn!("checkpoint too old, consider using a more recent block");
        }

        let store = LightClientStore::from_bootstrap(&bootstrap, self.initial_checkpoint)?;
        *self.store.write() = Some(store);

        Ok(())
    }

    /// One tick of the sync loop. Fetches, verifies and applies an update,
    /// then publishes the execution payload of the new head. All errors past
    /// bootstrap are non-fatal; the caller just schedules the next tick.
    pub async fn advance(&mut self) -> Result<()> {
        self.check_committee_update().await;

        // Finality updates land on epoch boundaries; in between, track the
        // head optimistically.
        let update = if self.expected_current_slot() % SLOTS_PER_EPOCH == 0 {
            self.rpc.get_finality_update().await?
        } else {
            self.rpc.get_optimistic_update().await?
        };

        let update = LightClientUpdate::from(update);
        let num_signers = update.sync_aggregate().num_signers();
        let transition = match self.insert(&update) {
            Ok(transition) => transition,
            Err(err) => {
                warn!("head update rejected: {err}");
                return Ok(());
            }
        };

        if let Some(finalized) = &transition.finalized {
            self.log_update("finalized slot", finalized, num_signers);
            if finalized.slot % SLOTS_PER_EPOCH == 0 {
                *self.last_checkpoint.write() = Some(finalized.root());
            }
        }

        if let Some(attested) = &transition.optimistic {
            self.log_update("updated head", attested, num_signers);
            self.publish_head(attested).await?;
        }

        Ok(())
    }

    /// Asks the provider for the committee of the upcoming period while it is
    /// still unknown. Provider errors and rejections are retried next tick.
    async fn check_committee_update(&mut self) {
        let period = {
            let store = self.store.read();
            match store.as_ref() {
                Some(store) if store.next_sync_committee().is_none() => store.finalized_period(),
                _ => return,
            }
        };

        debug!("checking for sync committee update");
        match self.rpc.get_updates(period, 1).await {
            Ok(updates) => {
                for update in updates {
                    match self.insert(&update.into()) {
                        Ok(_) => info!("updating sync committee"),
                        Err(err) => warn!("committee update rejected: {err}"),
                    }
                }
            }
            Err(err) => warn!("could not fetch committee update: {err}"),
        }
    }

    /// Cross-checks the full block behind `attested` and broadcasts its
    /// execution payload. A root mismatch means the provider served a block
    /// that is not the one the committee signed; nothing is published.
    async fn publish_head(&mut self, attested: &BeaconBlockHeader) -> Result<()> {
        let expected_root = attested.root();
        let block = self.rpc.get_block(expected_root).await?;

        let block_root = block.root();
        if block_root != expected_root {
            error!(
                "provider served inconsistent block: {}",
                ConsensusError::BlockRootMismatch(block_root, expected_root)
            );
            return Ok(());
        }

        self.feed.publish(ChainHeadEvent {
            header: attested.clone(),
            payload: block.execution_payload().clone(),
        });

        Ok(())
    }

    fn insert(&mut self, update: &LightClientUpdate) -> Result<Transition, ConsensusError> {
        let expected_current_slot = self.expected_current_slot();
        let mut guard = self.store.write();
        let store = guard.as_mut().ok_or(ConsensusError::StoreNotInitialized)?;
        store.insert(
            update,
            expected_current_slot,
            self.config.chain.genesis_root,
            &self.config.forks,
        )
    }

    fn log_update(&self, label: &str, header: &BeaconBlockHeader, num_signers: u64) {
        let participation = num_signers as f32 / 512_f32 * 100f32;
        let decimals = if participation == 100.0 { 1 } else { 2 };
        let age = self.age(header.slot);

        info!(
            "{label}  slot={}  confidence={:.decimals$}%  age={:02}:{:02}:{:02}:{:02}",
            header.slot,
            participation,
            age.num_days(),
            age.num_hours() % 24,
            age.num_minutes() % 60,
            age.num_seconds() % 60,
        );
    }

    fn age(&self, slot: u64) -> Duration {
        let expected_time = self.slot_timestamp(slot);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("`now` is ahead of `UNIX_EPOCH`");
        let delay = now.saturating_sub(std::time::Duration::from_secs(expected_time));
        chrono::Duration::from_std(delay)
            .expect("it's safe to assume that `delay` fits into a `chrono::Duration`")
    }

    pub fn expected_current_slot(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("`now` is ahead of `UNIX_EPOCH`");
        let genesis_time = self.config.chain.genesis_time;
        let since_genesis = now.saturating_sub(std::time::Duration::from_secs(genesis_time));

        since_genesis.as_secs() / SECONDS_PER_SLOT
    }

    fn slot_timestamp(&self, slot: u64) -> u64 {
        slot * SECONDS_PER_SLOT + self.config.chain.genesis_time
    }

    /// Gets the duration until the next update.
    /// Updates are scheduled for 8 seconds into each slot.
    pub fn duration_until_next_update(&self) -> Duration {
        let current_slot = self.expected_current_slot();
        let next_slot = current_slot + 1;
        let next_slot_timestamp = self.slot_timestamp(next_slot);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("`now` is ahead of `UNIX_EPOCH`")
            .as_secs();

        let time_to_next_slot = next_slot_timestamp.saturating_sub(now);
        let next_update = time_to_next_slot + 8;

        Duration::seconds(next_update as i64)
    }

    // Determines blockhash_slot age and returns true if it is less than 14 days old
    fn is_valid_checkpoint(&self, blockhash_slot: u64) -> bool {
        let current_slot = self.expected_current_slot();
        let current_slot_timestamp = self.slot_timestamp(current_slot);
        let blockhash_slot_timestamp = self.slot_timestamp(blockhash_slot);

        let slot_age = current_slot_timestamp.saturating_sub(blockhash_slot_timestamp);

        slot_age < self.config.max_checkpoint_age
    }
}
