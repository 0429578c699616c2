use std::cmp;

use alloy::primitives::B256;
use anyhow::Result;
use async_trait::async_trait;
use serde_this_or_that::as_u64;

use super::ConsensusRpc;
use crate::{
    consensus::{
        constants::{MAX_REQUEST_LIGHT_CLIENT_UPDATES, REQUEST_TIMEOUT},
        types::{CommitteeUpdate, HeadUpdate, LightClientBootstrap},
    },
    errors::RpcError,
    types::block::{BeaconBlock, SignedBeaconBlock},
};

/// Provider backed by the standard beacon-node REST API. Every call carries
/// the client-level deadline; a timed-out tick is retried on the next one.
#[derive(Clone, Debug)]
pub struct HttpRpc {
    rpc: String,
    client: reqwest::Client,
}

#[async_trait]
impl ConsensusRpc for HttpRpc {
    fn new(rpc: &str) -> Self {
        HttpRpc {
            rpc: rpc.to_string(),
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to construct http client"),
        }
    }

    async fn get_bootstrap(&self, block_root: B256) -> Result<LightClientBootstrap> {
        let req = format!(
            "{}/eth/v1/beacon/light_client/bootstrap/{block_root}",
            self.rpc
        );

        let res = self
            .client
            .get(req)
            .send()
            .await
            .map_err(|e| RpcError::new("bootstrap", e))?
            .json::<BootstrapResponse>()
            .await
            .map_err(|e| RpcError::new("bootstrap", e))?;

        Ok(res.data)
    }

    async fn get_updates(&self, period: u64, count: u8) -> Result<Vec<CommitteeUpdate>> {
        let count = cmp::min(count, MAX_REQUEST_LIGHT_CLIENT_UPDATES);
        let req = format!(
            "{}/eth/v1/beacon/light_client/updates?start_period={}&count={}",
            self.rpc, period, count
        );

        let res = self
            .client
            .get(req)
            .send()
            .await
            .map_err(|e| RpcError::new("updates", e))?
            .json::<UpdateResponse>()
            .await
            .map_err(|e| RpcError::new("updates", e))?;

        Ok(res.into_iter().map(|d| d.data).collect())
    }

    async fn get_finality_update(&self) -> Result<HeadUpdate> {
        let req = format!("{}/eth/v1/beacon/light_client/finality_update", self.rpc);
        let res = self
            .client
            .get(req)
            .send()
            .await
            .map_err(|e| RpcError::new("finality_update", e))?
            .json::<HeadUpdateResponse>()
            .await
            .map_err(|e| RpcError::new("finality_update", e))?;

        Ok(res.data)
    }

    async fn get_optimistic_update(&self) -> Result<HeadUpdate> {
        let req = format!("{}/eth/v1/beacon/light_client/optimistic_update", self.rpc);
        let res = self
            .client
            .get(req)
            .send()
            .await
            .map_err(|e| RpcError::new("optimistic_update", e))?
            .json::<HeadUpdateResponse>()
            .await
            .map_err(|e| RpcError::new("optimistic_update", e))?;

        Ok(res.data)
    }

    async fn get_block(&self, block_root: B256) -> Result<BeaconBlock> {
        let req = format!("{}/eth/v2/beacon/blocks/{block_root}", self.rpc);
        let res = self
            .client
            .get(req)
            .send()
            .await
            .map_err(|e| RpcError::new("blocks", e))?
            .json::<BlockResponse>()
            .await
            .map_err(|e| RpcError::new("blocks", e))?;

        Ok(res.data.message)
    }

    async fn chain_id(&self) -> Result<u64> {
        let req = format!("{}/eth/v1/config/spec", self.rpc);
        let res = self
            .client
            .get(req)
            .send()
            .await
            .map_err(|e| RpcError::new("spec", e))?
            .json::<SpecResponse>()
            .await
            .map_err(|e| RpcError::new("spec", e))?;

        Ok(res.data.chain_id)
    }

    fn name(&self) -> String {
        "http".to_string()
    }
}

type UpdateResponse = Vec<UpdateData>;

#[derive(serde::Deserialize, Debug)]
struct UpdateData {
    data: CommitteeUpdate,
}

#[derive(serde::Deserialize, Debug)]
struct HeadUpdateResponse {
    data: HeadUpdate,
}

#[derive(serde::Deserialize, Debug)]
struct BootstrapResponse {
    data: LightClientBootstrap,
}

#[derive(serde::Deserialize, Debug)]
struct BlockResponse {
    data: SignedBeaconBlock,
}

#[derive(serde::Deserialize, Debug)]
struct SpecResponse {
    data: Spec,
}

#[derive(serde::Deserialize, Debug)]
struct Spec {
    #[serde(rename = "DEPOSIT_NETWORK_ID", deserialize_with = "as_u64")]
    chain_id: u64,
}
