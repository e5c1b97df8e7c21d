//! Short content hashes.
//!
//! Used when an artifact omits `hashes.js` / `hashes.css`, so asset URLs
//! are still cache-busted.

/// Length of the hex fingerprint in characters.
const FINGERPRINT_LEN: usize = 10;

/// Compute a blake3 fingerprint: first 10 hex chars of the digest.
#[inline]
pub fn fingerprint<T: AsRef<[u8]> + ?Sized>(data: &T) -> String {
    let digest = blake3::hash(data.as_ref());
    hex::encode(&digest.as_bytes()[..FINGERPRINT_LEN / 2])
}
