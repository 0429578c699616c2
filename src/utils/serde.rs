//! Serde adapters for ssz byte containers that travel as 0x-prefixed hex.

pub mod hex_fixed_vec {
    use serde::{Deserialize, Deserializer, Serializer};
    use ssz_types::{typenum::Unsigned, FixedVector};

    use crate::utils::bytes::{hex_decode, hex_encode};

    pub fn serialize<S, U>(bytes: &FixedVector<u8, U>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        U: Unsigned,
    {
        serializer.serialize_str(&hex_encode(&bytes[..]))
    }

    pub fn deserialize<'de, D, U>(deserializer: D) -> Result<FixedVector<u8, U>, D::Error>
    where
        D: Deserializer<'de>,
        U: Unsigned,
    {
        let hex: String = Deserialize::deserialize(deserializer)?;
        let vec = hex_decode(&hex).map_err(serde::de::Error::custom)?;
        FixedVector::new(vec)
            .map_err(|e| serde::de::Error::custom(format!("invalid fixed vector: {e:?}")))
    }
}

pub mod hex_var_list {
    use serde::{Deserialize, Deserializer, Serializer};
    use ssz_types::{typenum::Unsigned, VariableList};

    use crate::utils::bytes::{hex_decode, hex_encode};

    pub fn serialize<S, U>(bytes: &VariableList<u8, U>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        U: Unsigned,
    {
        serializer.serialize_str(&hex_encode(&bytes[..]))
    }

    pub fn deserialize<'de, D, U>(deserializer: D) -> Result<VariableList<u8, U>, D::Error>
    where
        D: Deserializer<'de>,
        U: Unsigned,
    {
        let hex: String = Deserialize::deserialize(deserializer)?;
        let vec = hex_decode(&hex).map_err(serde::de::Error::custom)?;
        VariableList::new(vec)
            .map_err(|e| serde::de::Error::custom(format!("invalid variable list: {e:?}")))
    }
}
