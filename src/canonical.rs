//! Canonical serialization for plan fingerprints and policy hashes.
//!
//! Hashed values must serialize identically on every run:
//!
//! - Struct fields serialize in declaration order
//! - Id lists are sorted before hashing
//! - Maps in hashed data are `BTreeMap`, never `HashMap`

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes.
///
/// Values that fail to serialize hash as the empty byte string; every type
/// hashed by this crate is plain data and always serializes.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}

/// Compute the canonical xxh64 hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    xxh64(&to_canonical_bytes(value), 0)
}

/// Canonical hash as a 16-character hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}
