pub mod block;
pub mod execution_payload;
pub mod header;
pub mod pubkey;
mod serde;
pub mod signature;
pub mod sync_committee;
