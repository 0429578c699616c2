use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use serde_this_or_that::as_u64;
use ssz_derive::{Decode, Encode};
use ssz_types::{typenum, FixedVector, VariableList};
use tree_hash_derive::TreeHash;

use super::serde::{de_hex_to_txs, de_number_to_u256, se_txs_to_hex, se_u256_to_number};
use crate::utils::serde::{hex_fixed_vec, hex_var_list};

pub type Bloom = FixedVector<u8, typenum::U256>;
pub type ExtraData = VariableList<u8, typenum::U32>;
pub type Transaction = VariableList<u8, typenum::U1073741824>;
pub type Transactions = VariableList<Transaction, typenum::U1048576>;

/// The execution-layer block carried inside a beacon block body.
///
/// https://github.com/ethereum/consensus-specs/blob/dev/specs/capella/beacon-chain.md#executionpayload
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct ExecutionPayload {
    pub parent_hash: B256,
    pub fee_recipient: Address,
    pub state_root: B256,
    pub receipts_root: B256,
    #[serde(with = "hex_fixed_vec")]
    pub logs_bloom: Bloom,
    pub prev_randao: B256,
    #[serde(deserialize_with = "as_u64")]
    pub block_number: u64,
    #[serde(deserialize_with = "as_u64")]
    pub gas_limit: u64,
    #[serde(deserialize_with = "as_u64")]
    pub gas_used: u64,
    #[serde(deserialize_with = "as_u64")]
    pub timestamp: u64,
    #[serde(with = "hex_var_list")]
    pub extra_data: ExtraData,
    #[serde(deserialize_with = "de_number_to_u256")]
    #[serde(serialize_with = "se_u256_to_number")]
    pub base_fee_per_gas: U256,
    pub block_hash: B256,
    #[serde(serialize_with = "se_txs_to_hex")]
    #[serde(deserialize_with = "de_hex_to_txs")]
    pub transactions: Transactions,
    pub withdrawals: VariableList<Withdrawal, typenum::U16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct Withdrawal {
    #[serde(deserialize_with = "as_u64")]
    pub index: u64,
    #[serde(deserialize_with = "as_u64")]
    pub validator_index: u64,
    pub address: Address,
    #[serde(deserialize_with = "as_u64")]
    pub amount: u64,
}
