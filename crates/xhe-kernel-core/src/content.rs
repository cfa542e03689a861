//! Content store entries and the derived address index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::ContentHash;
use crate::types::Scheme;

/// Default number of characters kept in an index preview.
pub const DEFAULT_PREVIEW_LEN: usize = 50;

/// Authoritative stored content, keyed by its hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry {
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub scheme: Scheme,
}

/// Non-authoritative index entry, keyed by full address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressIndexEntry {
    pub hash: ContentHash,
    #[serde(rename = "type")]
    pub scheme: Scheme,
    pub timestamp: DateTime<Utc>,
    pub preview: String,
}

/// An index entry together with the address it is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedAddress {
    pub address: String,
    #[serde(flatten)]
    pub entry: AddressIndexEntry,
}

/// First `max_chars` characters of `content`, with `...` when truncated.
pub fn preview(content: &str, max_chars: usize) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
