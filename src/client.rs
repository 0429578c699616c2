use std::{path::PathBuf, sync::Arc};

use alloy::primitives::B256;
use anyhow::{anyhow, Result};
use parking_lot::RwLock;
use tokio::{
    spawn,
    sync::{broadcast, watch},
    time::sleep,
};
use tracing::{info, warn};

use crate::{
    config::{client_config::Config, Network},
    consensus::{rpc::ConsensusRpc, store::LightClientStore, ConsensusLightClient},
    database::Database,
    errors::ClientError,
    events::{ChainHeadEvent, ChainHeadFeed},
    types::header::BeaconBlockHeader,
};

#[derive(Default)]
pub struct ClientBuilder {
    network: Option<Network>,
    consensus_rpc: Option<String>,
    checkpoint: Option<B256>,
    data_dir: Option<PathBuf>,
    config: Option<Config>,
    strict_checkpoint_age: bool,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn network(mut self, network: Network) -> Self {
        self.network = Some(network);
        self
    }

    pub fn consensus_rpc(mut self, consensus_rpc: &str) -> Self {
        self.consensus_rpc = Some(consensus_rpc.to_string());
        self
    }

    pub fn checkpoint(mut self, checkpoint: B256) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    pub fn data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = Some(data_dir);
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn strict_checkpoint_age(mut self) -> Self {
        self.strict_checkpoint_age = true;
        self
    }

    pub fn build<DB: Database, R: ConsensusRpc + 'static>(self) -> Result<Client<DB, R>> {
        let base_config = if let Some(network) = self.network {
            network.to_base_config()
        } else {
            let config = self
                .config
                .as_ref()
                .ok_or(anyhow!("missing network config"))?;
            config.to_base_config()
        };

        let consensus_rpc = self
            .consensus_rpc
            .or_else(|| self.config.as_ref().map(|config| config.consensus_rpc.clone()))
            .or(base_config.consensus_rpc)
            .ok_or(anyhow!("missing consensus rpc url"))?;

        let checkpoint = self
            .checkpoint
            .or_else(|| self.config.as_ref().and_then(|config| config.checkpoint));

        let data_dir = self
            .data_dir
            .or_else(|| self.config.as_ref().and_then(|config| config.data_dir.clone()));

        let strict_checkpoint_age = if let Some(config) = &self.config {
            self.strict_checkpoint_age || config.strict_checkpoint_age
        } else {
            self.strict_checkpoint_age
        };

        let config = Config {
            consensus_rpc,
            default_checkpoint: base_config.default_checkpoint,
            checkpoint,
            data_dir,
            chain: base_config.chain,
            forks: base_config.forks,
            max_checkpoint_age: base_config.max_checkpoint_age,
            strict_checkpoint_age,
        };

        Client::new(config)
    }
}

/// Owns the driver task and gives downstream consumers their view of the
/// chain: an event subscription plus header snapshots.
pub struct Client<DB: Database, R: ConsensusRpc> {
    consensus: Option<ConsensusLightClient<R>>,
    store: Arc<RwLock<Option<LightClientStore>>>,
    feed: ChainHeadFeed,
    last_checkpoint: Arc<RwLock<Option<B256>>>,
    shutdown: watch::Sender<bool>,
    db: DB,
}

impl<DB: Database, R: ConsensusRpc + 'static> Client<DB, R> {
    fn new(config: Config) -> Result<Self> {
        let db = DB::new(&config)?;
        let checkpoint = match config.checkpoint {
            Some(checkpoint) => checkpoint,
            None => db.load_checkpoint()?,
        };

        let config = Arc::new(config);
        let consensus =
            ConsensusLightClient::<R>::new(&config.consensus_rpc, checkpoint, config.clone());

        let store = consensus.store_handle();
        let feed = consensus.feed().clone();
        let last_checkpoint = consensus.last_checkpoint_handle();
        let (shutdown, _) = watch::channel(false);

        Ok(Client {
            consensus: Some(consensus),
            store,
            feed,
            last_checkpoint,
            shutdown,
            db,
        })
    }

    /// Bootstraps against the trusted checkpoint and spawns the tick loop.
    /// Fails only when trust cannot be established.
    pub async fn start(&mut self) -> Result<()> {
        let mut consensus = self
            .consensus
            .take()
            .ok_or(anyhow!("client already started"))?;

        consensus
            .check_rpc()
            .await
            .map_err(ClientError::ConsensusSyncError)?;
        consensus
            .sync()
            .await
            .map_err(ClientError::ConsensusSyncError)?;

        let mut shutdown_rx = self.shutdown.subscribe();
        spawn(async move {
            loop {
                let next_update = consensus
                    .duration_until_next_update()
                    .to_std()
                    .unwrap_or(std::time::Duration::from_secs(12));

                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = sleep(next_update) => {}
                }

                if let Err(err) = consensus.advance().await {
                    warn!("{}", ClientError::ConsensusAdvanceError(err));
                }
            }
        });

        Ok(())
    }

    /// Subscribes to verified chain-head events. Dropping the receiver
    /// unregisters the subscription.
    pub fn subscribe(&self) -> broadcast::Receiver<ChainHeadEvent> {
        self.feed.subscribe()
    }

    pub fn header(&self) -> Option<BeaconBlockHeader> {
        self.store
            .read()
            .as_ref()
            .map(|store| store.optimistic_header().clone())
    }

    pub fn finalized(&self) -> Option<BeaconBlockHeader> {
        self.store
            .read()
            .as_ref()
            .map(|store| store.finalized_header().clone())
    }

    /// Stops the tick loop and persists the last finalized checkpoint so the
    /// next run bootstraps from it.
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(true);

        let Some(checkpoint) = *self.last_checkpoint.read() else {
            return;
        };

        info!("saving last checkpoint hash");
        if self.db.save_checkpoint(checkpoint).is_err() {
            warn!("checkpoint save failed");
        }
    }
}
