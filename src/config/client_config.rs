use std::{path::PathBuf, process::exit};

use alloy::primitives::{FixedBytes, B256};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::Deserialize;

use crate::config::{networks, BaseConfig, ChainConfig, Forks};

#[derive(Deserialize, Debug, Default)]
pub struct Config {
    pub consensus_rpc: String,
    pub default_checkpoint: B256,
    #[serde(default)]
    pub checkpoint: Option<B256>,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    pub chain: ChainConfig,
    pub forks: Forks,
    pub max_checkpoint_age: u64,
    #[serde(default)]
    pub strict_checkpoint_age: bool,
}

impl Config {
    /// Loads the configuration for `network`, layering a TOML file and
    /// `BEACON_SYNC_` environment variables over the network preset.
    pub fn from_file(config_path: &PathBuf, network: &str) -> Self {
        let base_config = match network {
            "mainnet" => networks::mainnet(),
            "sepolia" => networks::sepolia(),
            _ => BaseConfig::default(),
        };

        let base_provider = Serialized::from(base_config, network);
        let toml_provider = Toml::file(config_path).nested();
        let env_provider = Env::prefixed("BEACON_SYNC_");

        let config_res = Figment::new()
            .merge(base_provider)
            .merge(toml_provider)
            .merge(env_provider)
            .select(network)
            .extract();

        match config_res {
            Ok(config) => config,
            Err(err) => {
                match err.kind {
                    figment::error::Kind::MissingField(field) => {
                        let field = field.replace('_', "-");
                        println!("\x1b[91merror\x1b[0m: missing configuration field: {field}");
                    }
                    _ => println!("cannot parse configuration: {err}"),
                }
                exit(1);
            }
        }
    }

    pub fn fork_version(&self, slot: u64) -> FixedBytes<4> {
        self.forks.fork_version(slot)
    }

    pub fn to_base_config(&self) -> BaseConfig {
        BaseConfig {
            consensus_rpc: Some(self.consensus_rpc.clone()),
            default_checkpoint: self.default_checkpoint,
            chain: self.chain.clone(),
            forks: self.forks.clone(),
            max_checkpoint_age: self.max_checkpoint_age,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn from_file_layers_toml_over_network_preset() {
        let dir = std::env::temp_dir().join(format!("beacon-sync-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(
            &path,
            "[mainnet]\nconsensus_rpc = \"http://localhost:5052\"\nstrict_checkpoint_age = true\n",
        )
        .unwrap();

        let config = Config::from_file(&path, "mainnet");
        assert_eq!(config.consensus_rpc, "http://localhost:5052");
        assert!(config.strict_checkpoint_age);
        // Preset values survive the merge.
        assert_eq!(config.chain.chain_id, 1);
        assert_eq!(config.max_checkpoint_age, 1_209_600);

        let _ = fs::remove_dir_all(dir);
    }
}
