//! CBOR value codec.
//!
//! Durable values are stored as CBOR blobs. Decoding is lenient about map
//! key order but strict about types.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};

/// Encode a value to CBOR.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(Bytes::from(buf))
}

/// Decode a value from CBOR.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::from_reader(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Sample {
        name: String,
        total_supply: u64,
        balances: BTreeMap<String, u64>,
        payload: serde_json::Value,
    }

    #[test]
    fn test_encode_decode_nested() {
        let sample = Sample {
            name: "ledger".into(),
            total_supply: 150,
            balances: BTreeMap::from([("did:xhe:aa".to_string(), 150)]),
            payload: serde_json::json!({"amount": 50, "memo": "x", "tags": [1, 2]}),
        };
        let bytes = encode(&sample).unwrap();
        let back: Sample = decode(&bytes).unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result: Result<Sample> = decode(b"\xff\x00garbage");
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }

    #[test]
    fn test_decode_wrong_shape_fails() {
        let bytes = encode(&42u64).unwrap();
        let result: Result<Sample> = decode(&bytes);
        assert!(result.is_err());
    }
}
