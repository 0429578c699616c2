use thiserror::Error;

/// An error related to hexadecimal string encoding and decoding.
#[derive(Error, Debug)]
pub enum HexError {
    /// A failure to convert a string into a byte vector.
    #[error("Could not decode hex")]
    DecodeError(#[from] hex::FromHexError),
    /// A failure to adhere to the convention that a hex-encoded
    /// string must include the "0x" prefix.
    #[error("Hex strings must start with 0x, but found {0}")]
    PrefixError(String),
}

/// Encode hex with 0x prefix
pub fn hex_encode<T: AsRef<[u8]>>(data: T) -> String {
    format!("0x{}", hex::encode(data))
}

/// Decode hex with 0x prefix
pub fn hex_decode(data: &str) -> Result<Vec<u8>, HexError> {
    match data.strip_prefix("0x") {
        Some(hex) => hex::decode(hex).map_err(|e| e.into()),
        None => Err(HexError::PrefixError(data.chars().take(2).collect())),
    }
}
