//! Golden test vectors for deterministic verification.
//!
//! These vectors pin content hashing, address derivation and canonical pulse
//! hashing so that any implementation reading the same stores derives the
//! same addresses and pulse ids.

use chrono::{TimeZone, Utc};
use serde_json::Value;
use xhe_kernel_core::{Address, ContentHash, CoreError, Pulse, PulseBuilder, PulseKind, Sequence};

/// A content hashing vector.
#[derive(Debug, Clone)]
pub struct ContentVector {
    pub name: &'static str,
    pub content: &'static str,
    /// Expected SHA-256 (hex).
    pub sha256: &'static str,
}

impl ContentVector {
    /// Expected `xhe://` address.
    pub fn content_address(&self) -> String {
        format!("xhe://{}", self.sha256)
    }

    /// Expected `did:xhe:` address (first 32 hex chars).
    pub fn identity_address(&self) -> String {
        format!("did:xhe:{}", &self.sha256[..32])
    }
}

/// A canonical pulse hashing vector.
#[derive(Debug, Clone)]
pub struct PulseVector {
    pub name: &'static str,
    pub kind: PulseKind,
    /// Payload as JSON text.
    pub payload: &'static str,
    pub timestamp_millis: i64,
    pub author: &'static str,
    pub sequence: u64,
    pub kernel_version: &'static str,
    /// Expected hash of the canonical record (hex).
    pub expected_hash: &'static str,
}

const AUTHOR: &str = "did:xhe:0123456789abcdef0123456789abcdef";

/// Get all content vectors.
pub fn content_vectors() -> Vec<ContentVector> {
    vec![
        ContentVector {
            name: "hello world",
            content: "hello world",
            sha256: "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9",
        },
        ContentVector {
            name: "abc",
            content: "abc",
            sha256: "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
        },
        ContentVector {
            name: "short post",
            content: "hi",
            sha256: "8f434346648f6b96df89dda901c5176b10a6d83961dd3c1ac88b59b2dc327aa4",
        },
        ContentVector {
            name: "uppercase",
            content: "XHE",
            sha256: "37183379b8872793c2c444f78e45b7a03f4a17f9a0638f4b76b7eda8543c7180",
        },
    ]
}

/// Get all pulse vectors.
pub fn pulse_vectors() -> Vec<PulseVector> {
    vec![
        PulseVector {
            name: "follow at whole second",
            kind: PulseKind::Follow,
            payload: r#"{"did":"did:xhe:00ff"}"#,
            timestamp_millis: 1_700_000_000_000,
            author: AUTHOR,
            sequence: 1,
            kernel_version: "0.1.0",
            expected_hash: "943bb92326aa666ab820e01fa8e14ff60016f50d32a5d4994fcbadf8d583f948",
        },
        PulseVector {
            name: "kernel init with millis",
            kind: PulseKind::KernelInit,
            payload: r#"{"publicKey":"abababababababababababababababababababababababababababababababab","did":"did:xhe:0123456789abcdef0123456789abcdef","kernelVersion":"0.1.0"}"#,
            timestamp_millis: 1_700_000_000_123,
            author: AUTHOR,
            sequence: 1,
            kernel_version: "0.1.0",
            expected_hash: "04c48124d4907ea907be68203c8b9fd7b36e781448abb54a9aaffeeef0512329",
        },
        PulseVector {
            name: "transfer with numeric payload",
            kind: PulseKind::SlipTransfer,
            payload: r#"{"txId":"00112233445566778899aabbccddeeff","to":"did:xhe:fedcba9876543210fedcba9876543210","from":"did:xhe:0123456789abcdef0123456789abcdef","memo":"rent","amount":30}"#,
            timestamp_millis: 1_704_067_200_000,
            author: AUTHOR,
            sequence: 42,
            kernel_version: "0.1.0",
            expected_hash: "a4fa47dc341768ef6b7007e797f7339d51d68454ac90894d46dcb3809ed860b3",
        },
    ]
}

/// Seal the pulse a vector describes.
pub fn pulse_from_vector(vector: &PulseVector) -> Result<Pulse, CoreError> {
    let payload: Value = serde_json::from_str(vector.payload)
        .map_err(|e| CoreError::EncodingError(e.to_string()))?;
    let timestamp = Utc
        .timestamp_millis_opt(vector.timestamp_millis)
        .single()
        .ok_or_else(|| CoreError::EncodingError("timestamp out of range".into()))?;

    PulseBuilder::new(vector.kind, Sequence::new(vector.sequence))
        .payload(payload)
        .timestamp(timestamp)
        .author(vector.author)
        .kernel_version(vector.kernel_version)
        .seal()
}

/// Check every vector against this implementation.
///
/// Returns `(name, matches, actual)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let content = content_vectors().into_iter().map(|v| {
        let hash = ContentHash::of_str(v.content);
        let address = Address::content(&hash).to_string();
        let matches = hash.to_hex() == v.sha256 && address == v.content_address();
        (v.name.to_string(), matches, hash.to_hex())
    });

    let pulses = pulse_vectors().into_iter().map(|v| match pulse_from_vector(&v) {
        Ok(pulse) => {
            let matches = pulse.hash == v.expected_hash;
            (v.name.to_string(), matches, pulse.hash)
        }
        Err(e) => (v.name.to_string(), false, e.to_string()),
    });

    content.chain(pulses).collect()
}
