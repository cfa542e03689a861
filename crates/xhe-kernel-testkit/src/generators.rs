//! Proptest generators for property-based testing.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

use xhe_kernel_core::{Address, ContentHash, Pulse, PulseBuilder, PulseKind, Scheme, Sequence};

/// Generate non-empty content.
pub fn content() -> impl Strategy<Value = String> {
    "\\PC{1,200}".prop_map(String::from)
}

/// Generate a lowercase hex string of `len` characters.
pub fn hex_string(len: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(any::<u8>(), len.div_ceil(2)).prop_map(move |bytes| {
        let mut s = hex::encode(bytes);
        s.truncate(len);
        s
    })
}

/// Generate a random ContentHash.
pub fn content_hash() -> impl Strategy<Value = ContentHash> {
    any::<[u8; 32]>().prop_map(ContentHash::from_bytes)
}

/// Generate a well-formed did.
pub fn did() -> impl Strategy<Value = String> {
    hex_string(32).prop_map(|id| Address::Identity { id }.to_string())
}

/// Generate a valid sequence number (1-indexed).
pub fn sequence() -> impl Strategy<Value = Sequence> {
    (1u64..=99_999_999).prop_map(Sequence::new)
}

/// Generate an id usable in `slip://`, `feed://` and `channel://` addresses.
pub fn id() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,32}".prop_map(String::from)
}

/// Generate a scheme `generate` accepts.
pub fn generatable_scheme() -> impl Strategy<Value = Scheme> {
    prop_oneof![
        Just(Scheme::Content),
        Just(Scheme::Identity),
        Just(Scheme::Pulse),
        Just(Scheme::External),
    ]
}

/// Generate any well-formed address.
pub fn address() -> impl Strategy<Value = Address> {
    prop_oneof![
        hex_string(64).prop_map(|hash| Address::Content { hash }),
        hex_string(32).prop_map(|id| Address::Identity { id }),
        (proptest::option::of(sequence()), hex_string(64))
            .prop_map(|(sequence, hash)| Address::Pulse { sequence, hash }),
        hex_string(64).prop_map(|hash| Address::External { hash }),
        id().prop_map(|id| Address::Slip { id }),
        id().prop_map(|id| Address::Feed { id }),
        id().prop_map(|id| Address::Channel { id }),
    ]
}

/// Generate a PulseKind.
pub fn pulse_kind() -> impl Strategy<Value = PulseKind> {
    prop_oneof![
        Just(PulseKind::KernelInit),
        Just(PulseKind::KernelReset),
        Just(PulseKind::AddressGenerate),
        Just(PulseKind::AddressResolve),
        Just(PulseKind::IndexClear),
        Just(PulseKind::IdentityRegenerate),
        Just(PulseKind::SlipMint),
        Just(PulseKind::SlipTransfer),
        Just(PulseKind::Follow),
        Just(PulseKind::Unfollow),
        Just(PulseKind::Block),
        Just(PulseKind::Unblock),
        Just(PulseKind::PostCreate),
        Just(PulseKind::PostReply),
        Just(PulseKind::PostRepost),
        Just(PulseKind::ChannelCreate),
        Just(PulseKind::ChannelJoin),
        Just(PulseKind::ChannelLeave),
    ]
}

/// Generate a millisecond-precision timestamp.
pub fn timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..=4_102_444_800_000).prop_map(|ms| {
        Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
    })
}

/// Generate a small JSON payload.
pub fn payload() -> impl Strategy<Value = Value> {
    (
        "[a-z]{1,8}",
        "\\PC{0,32}",
        any::<u32>(),
        any::<bool>(),
    )
        .prop_map(|(key, text, number, flag)| {
            let mut map = Map::new();
            map.insert(key, Value::String(text));
            map.insert("n".into(), json!(number));
            map.insert("flag".into(), json!(flag));
            map.insert("nested".into(), json!({ "z": 1, "a": [number] }));
            Value::Object(map)
        })
}

/// Parameters for generating a pulse.
#[derive(Debug, Clone)]
pub struct PulseParams {
    pub kind: PulseKind,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub sequence: Sequence,
    pub kernel_version: String,
}

impl Arbitrary for PulseParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            pulse_kind(),
            payload(),
            timestamp(),
            did(),
            sequence(),
            "[0-9]\\.[0-9]{1,2}\\.[0-9]{1,2}",
        )
            .prop_map(
                |(kind, payload, timestamp, author, sequence, kernel_version)| PulseParams {
                    kind,
                    payload,
                    timestamp,
                    author,
                    sequence,
                    kernel_version,
                },
            )
            .boxed()
    }
}

/// Seal a pulse from parameters.
pub fn pulse_from_params(params: &PulseParams) -> Pulse {
    // Payloads from `payload()` are plain JSON values, which always encode.
    match PulseBuilder::new(params.kind, params.sequence)
        .payload(params.payload.clone())
        .timestamp(params.timestamp)
        .author(params.author.clone())
        .kernel_version(params.kernel_version.clone())
        .seal()
    {
        Ok(pulse) => pulse,
        Err(e) => panic!("pulse params failed to seal: {e}"),
    }
}
