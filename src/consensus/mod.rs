pub mod constants;
pub mod errors;
pub mod rpc;
pub mod store;
pub mod types;
pub mod utils;
pub mod verify;

mod consensus_client;
pub use crate::consensus::consensus_client::*;
