//! Short content hashes used as stable row identities.

use sha2::{Digest, Sha256};

/// Number of digest bytes kept; two hex characters each.
const HASH_BYTES: usize = 4;

/// SHA-256 of `text`, truncated to 8 uppercase hex characters.
pub fn short_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    hex::encode_upper(&digest[..HASH_BYTES])
}
