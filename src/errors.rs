use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("rpc error on method: {method}, message: {error}")]
pub struct RpcError<E: ToString> {
    method: String,
    error: E,
}

impl<E: ToString> RpcError<E> {
    pub fn new(method: &str, err: E) -> Self {
        Self {
            method: method.to_string(),
            error: err,
        }
    }
}

/// Errors surfaced by [`crate::Client`]. Only sync errors are fatal; the
/// advance loop logs and carries on.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("consensus advance error: {0}")]
    ConsensusAdvanceError(AnyhowError),

    #[error("consensus sync error: {0}")]
    ConsensusSyncError(AnyhowError),
}
