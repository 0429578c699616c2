pub mod bytes;
pub mod serde;
