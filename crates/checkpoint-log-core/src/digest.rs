use sha2::{Digest, Sha256};

/// Computes the integrity token for a canonical entry serialization.
///
/// Implementations must be pure: the same canonical text yields the same token
/// on every call and in every process. Stored tokens are only comparable with
/// tokens produced by the same implementation.
pub trait DigestFunction {
    fn digest(&self, canonical: &str) -> String;
}

/// 32-bit rolling polynomial digest (base 31) over UTF-16 code units.
///
/// This reproduces the tokens already stored by the browser client, so it stays
/// the default even though it is trivially forgeable and collision-prone.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct RollingDigest;

impl DigestFunction for RollingDigest {
    fn digest(&self, canonical: &str) -> String {
        let accumulator = canonical.encode_utf16().fold(0_i32, |acc, unit| {
            acc.wrapping_shl(5).wrapping_sub(acc).wrapping_add(i32::from(unit))
        });
        format!("{:x}", accumulator.unsigned_abs())
    }
}

/// Lowercase hex SHA-256 of the canonical text.
///
/// Opt-in only. Entries tagged by [`RollingDigest`] never validate under it.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct Sha256Digest;

impl DigestFunction for Sha256Digest {
    fn digest(&self, canonical: &str) -> String {
        format!("{:x}", Sha256::digest(canonical.as_bytes()))
    }
}
