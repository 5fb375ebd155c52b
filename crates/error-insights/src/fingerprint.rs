//! Call-site fingerprints for recognizing recurring errors.

use sha2::{Digest, Sha256};

use crate::trace::ErrorDetails;

/// Frames hashed into a fingerprint.
pub const FINGERPRINT_FRAMES: usize = 3;

/// Hex characters kept from the digest.
const FINGERPRINT_LEN: usize = 16;

/// Hashes the outer error type plus its top frames into a compact id.
///
/// Two errors of the same type observed at the same call site hash to the
/// same fingerprint. The root cause never participates: the outer type and
/// site are what recur identically across repeats of the same bug. With no
/// frames the type name alone is hashed, so ingestion never blocks on
/// failed symbol resolution. Stability is only guaranteed within a single
/// process run.
pub fn fingerprint(details: &ErrorDetails) -> String {
    let mut seed = details.kind.clone();
    for frame in details.frames.iter().take(FINGERPRINT_FRAMES) {
        seed.push('|');
        seed.push_str(&frame.module);
        seed.push('.');
        seed.push_str(&frame.function);
        seed.push(':');
        seed.push_str(&frame.line.unwrap_or(0).to_string());
    }

    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..FINGERPRINT_LEN].to_string()
}
