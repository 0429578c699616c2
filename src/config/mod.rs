pub mod base;
pub mod client_config;
pub mod networks;
pub mod types;

pub use crate::config::{
    base::BaseConfig,
    client_config::Config,
    networks::Network,
    types::{ChainConfig, Fork, Forks},
};
