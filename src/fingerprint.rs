//! Request fingerprinting for log correlation

use sha2::{Digest, Sha256};

use crate::interaction::Request;

/// Number of fingerprint bytes shown in logs
const SHORT_ID_BYTES: usize = 6;

/// Compute SHA-256 fingerprint of a request
///
/// The fingerprint includes:
/// 1. Method (uppercase normalized)
/// 2. URI (trimmed)
/// 3. Headers (sorted, normalized)
/// 4. Body
#[must_use]
pub fn fingerprint_request(request: &Request) -> [u8; 32] {
    let mut hasher = Sha256::new();

    let method = request.method.to_uppercase();
    hasher.update((method.len() as u64).to_le_bytes());
    hasher.update(method.as_bytes());

    let uri = request.uri.trim();
    hasher.update((uri.len() as u64).to_le_bytes());
    hasher.update(uri.as_bytes());

    for (name, value) in request.headers.normalized() {
        hasher.update((name.len() as u64).to_le_bytes());
        hasher.update(name.as_bytes());
        hasher.update((value.len() as u64).to_le_bytes());
        hasher.update(value.as_bytes());
    }

    let body = request.body.as_bytes();
    hasher.update((body.len() as u64).to_le_bytes());
    hasher.update(body);

    hasher.finalize().into()
}

/// Short hex id of a request, for log lines
#[must_use]
pub fn short_id(request: &Request) -> String {
    hex::encode(&fingerprint_request(request)[..SHORT_ID_BYTES])
}
