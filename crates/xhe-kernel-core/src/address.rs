//! Address grammar.
//!
//! An [`Address`] names one piece of kernel-managed state. Parsing and
//! display are reciprocal: for every constructed address,
//! `addr.to_string().parse::<Address>() == Ok(addr)`.
//!
//! ```text
//! xhe://<hex>            content
//! did:xhe:<hex>          identity
//! pulse://[<seq>/]<hex>  audit pulse
//! ipfs://<hex>           external content
//! slip://<id>            ledger transaction
//! feed://<id>            personal feed
//! channel://<id>         channel
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::crypto::ContentHash;
use crate::error::AddressError;
use crate::types::{Scheme, Sequence};

const CONTENT_PREFIX: &str = "xhe://";
const IDENTITY_PREFIX: &str = "did:xhe:";
const PULSE_PREFIX: &str = "pulse://";
const EXTERNAL_PREFIX: &str = "ipfs://";
const SLIP_PREFIX: &str = "slip://";
const FEED_PREFIX: &str = "feed://";
const CHANNEL_PREFIX: &str = "channel://";

/// Upper bound on accepted address length.
pub const MAX_ADDRESS_LEN: usize = 512;

/// A parsed kernel address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Address {
    Content { hash: String },
    Identity { id: String },
    Pulse { sequence: Option<Sequence>, hash: String },
    External { hash: String },
    Slip { id: String },
    Feed { id: String },
    Channel { id: String },
}

impl Address {
    /// Parse an address string.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        input.parse()
    }

    /// Content address for a hash.
    pub fn content(hash: &ContentHash) -> Self {
        Address::Content {
            hash: hash.to_hex(),
        }
    }

    /// External-content address for a hash.
    pub fn external(hash: &ContentHash) -> Self {
        Address::External {
            hash: hash.to_hex(),
        }
    }

    /// Identity address derived from a content hash (first 32 hex chars).
    pub fn identity_from_hash(hash: &ContentHash) -> Self {
        Address::Identity {
            id: hash.did_fragment(),
        }
    }

    /// Pulse address at a sequence.
    pub fn pulse(sequence: Sequence, hash: impl Into<String>) -> Self {
        Address::Pulse {
            sequence: Some(sequence),
            hash: hash.into(),
        }
    }

    /// The scheme of this address.
    pub fn scheme(&self) -> Scheme {
        match self {
            Address::Content { .. } => Scheme::Content,
            Address::Identity { .. } => Scheme::Identity,
            Address::Pulse { .. } => Scheme::Pulse,
            Address::External { .. } => Scheme::External,
            Address::Slip { .. } => Scheme::Slip,
            Address::Feed { .. } => Scheme::Feed,
            Address::Channel { .. } => Scheme::Channel,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Content { hash } => write!(f, "{CONTENT_PREFIX}{hash}"),
            Address::Identity { id } => write!(f, "{IDENTITY_PREFIX}{id}"),
            Address::Pulse {
                sequence: Some(seq),
                hash,
            } => write!(f, "{PULSE_PREFIX}{seq}/{hash}"),
            Address::Pulse {
                sequence: None,
                hash,
            } => write!(f, "{PULSE_PREFIX}{hash}"),
            Address::External { hash } => write!(f, "{EXTERNAL_PREFIX}{hash}"),
            Address::Slip { id } => write!(f, "{SLIP_PREFIX}{id}"),
            Address::Feed { id } => write!(f, "{FEED_PREFIX}{id}"),
            Address::Channel { id } => write!(f, "{CHANNEL_PREFIX}{id}"),
        }
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.len() > MAX_ADDRESS_LEN {
            return Err(AddressError::InvalidId(format!(
                "address exceeds {MAX_ADDRESS_LEN} bytes"
            )));
        }

        if let Some(rest) = input.strip_prefix(CONTENT_PREFIX) {
            return Ok(Address::Content {
                hash: hex_component(rest, "hash")?,
            });
        }
        if let Some(rest) = input.strip_prefix(IDENTITY_PREFIX) {
            return Ok(Address::Identity {
                id: hex_component(rest, "identity")?,
            });
        }
        if let Some(rest) = input.strip_prefix(PULSE_PREFIX) {
            return parse_pulse(rest);
        }
        if let Some(rest) = input.strip_prefix(EXTERNAL_PREFIX) {
            return Ok(Address::External {
                hash: hex_component(rest, "hash")?,
            });
        }
        if let Some(rest) = input.strip_prefix(SLIP_PREFIX) {
            return Ok(Address::Slip {
                id: id_component(rest)?,
            });
        }
        if let Some(rest) = input.strip_prefix(FEED_PREFIX) {
            return Ok(Address::Feed {
                id: id_component(rest)?,
            });
        }
        if let Some(rest) = input.strip_prefix(CHANNEL_PREFIX) {
            return Ok(Address::Channel {
                id: id_component(rest)?,
            });
        }

        let prefix: String = input.chars().take(16).collect();
        Err(AddressError::UnknownPrefix(prefix))
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

fn parse_pulse(rest: &str) -> Result<Address, AddressError> {
    match rest.split_once('/') {
        Some((seq, hash)) => {
            if seq.is_empty() {
                return Err(AddressError::EmptyComponent("sequence"));
            }
            Ok(Address::Pulse {
                sequence: Some(seq.parse()?),
                hash: hex_component(hash, "hash")?,
            })
        }
        None => Ok(Address::Pulse {
            sequence: None,
            hash: hex_component(rest, "hash")?,
        }),
    }
}

fn hex_component(s: &str, what: &'static str) -> Result<String, AddressError> {
    if s.is_empty() {
        return Err(AddressError::EmptyComponent(what));
    }
    if !is_lower_hex(s) {
        return Err(AddressError::NotHex(what));
    }
    Ok(s.to_string())
}

fn id_component(s: &str) -> Result<String, AddressError> {
    if s.is_empty() {
        return Err(AddressError::EmptyComponent("id"));
    }
    if !s
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(AddressError::InvalidId(s.to_string()));
    }
    Ok(s.to_string())
}

/// Whether `s` is non-empty lowercase hex.
pub fn is_lower_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_each_scheme() {
        let cases = [
            ("xhe://deadbeef", Scheme::Content),
            ("did:xhe:0123456789abcdef0123456789abcdef", Scheme::Identity),
            ("pulse://00000007/abc123", Scheme::Pulse),
            ("pulse://abc123", Scheme::Pulse),
            ("ipfs://ff00", Scheme::External),
            ("slip://a1b2c3", Scheme::Slip),
            ("feed://0123abcd", Scheme::Feed),
            ("channel://general_1", Scheme::Channel),
        ];
        for (input, scheme) in cases {
            let addr = Address::parse(input).unwrap();
            assert_eq!(addr.scheme(), scheme, "{input}");
            assert_eq!(addr.to_string(), input);
        }
    }

    #[test]
    fn test_pulse_components() {
        let addr = Address::parse("pulse://00000012/beef").unwrap();
        assert_eq!(
            addr,
            Address::Pulse {
                sequence: Some(Sequence::new(12)),
                hash: "beef".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_malformed() {
        for input in [
            "not-a-valid-address",
            "",
            "xhe://",
            "xhe://XYZ",
            "xhe://DEADBEEF",
            "did:xhe:",
            "did:xhe:not hex",
            "pulse:///abc",
            "pulse://12x/abc",
            "pulse://00000001/",
            "slip://",
            "slip://has space",
            "channel://a/b",
            "https://example.com",
        ] {
            assert!(Address::parse(input).is_err(), "{input} should not parse");
        }
    }

    #[test]
    fn test_constructors() {
        let hash = ContentHash::of_str("hello world");
        assert_eq!(
            Address::content(&hash).to_string(),
            format!("xhe://{}", hash.to_hex())
        );
        assert_eq!(
            Address::identity_from_hash(&hash).to_string(),
            "did:xhe:b94d27b9934d3e08a52e52d7da7dabfa"
        );
        assert_eq!(
            Address::pulse(Sequence::new(3), "ab").to_string(),
            "pulse://00000003/ab"
        );
    }

    #[test]
    fn test_serde_as_string() {
        let addr = Address::parse("feed://abc").unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"feed://abc\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_never_panics(input in ".{0,80}") {
                let _ = Address::parse(&input);
            }

            #[test]
            fn hash_addresses_round_trip(
                data in proptest::collection::vec(any::<u8>(), 0..128),
                seq in 1u64..100_000_000,
            ) {
                let hash = ContentHash::of(&data);
                for addr in [
                    Address::content(&hash),
                    Address::external(&hash),
                    Address::identity_from_hash(&hash),
                    Address::pulse(Sequence::new(seq), hash.to_hex()),
                ] {
                    prop_assert_eq!(Address::parse(&addr.to_string()).unwrap(), addr);
                }
            }
        }
    }
}
