use std::path::PathBuf;

use alloy::primitives::{b256, B256};
use anyhow::Result;
use beacon_sync::{
    config::{networks, Config},
    consensus::rpc::http_rpc::HttpRpc,
    database::FileDB,
    Client, ClientBuilder,
};
use tracing::info;

const CONSENSUS_RPC_URL: &str = "http://testing.mainnet.beacon-api.nimbus.team";
const TRUSTED_CHECKPOINT: B256 =
    b256!("9c30624f15e4df4e8f819f89db8b930f36b561b7f70905688ea208d22fb0b822");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    // An optional TOML file overrides the built-in mainnet setup.
    let builder = match std::env::args().nth(1) {
        Some(path) => {
            ClientBuilder::new().config(Config::from_file(&PathBuf::from(path), "mainnet"))
        }
        None => ClientBuilder::new()
            .network(networks::Network::Mainnet)
            .consensus_rpc(CONSENSUS_RPC_URL)
            .checkpoint(TRUSTED_CHECKPOINT)
            .data_dir(PathBuf::from("/tmp/beacon-sync")),
    };

    let mut client: Client<FileDB, HttpRpc> = builder.build()?;

    info!("starting beacon light client...");
    client.start().await?;

    let mut heads = client.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = heads.recv() => {
                if let Ok(event) = event {
                    info!(
                        "new execution payload  block={}  hash={}",
                        event.payload.block_number, event.payload.block_hash
                    );
                }
            }
        }
    }

    client.shutdown().await;

    Ok(())
}
