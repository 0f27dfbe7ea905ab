//! Content fingerprints for stable, cross-process identities.
//!
//! Both [`VariationId`](crate::VariationId) and [`RegionKey`](crate::RegionKey)
//! are SHA-256 digests over a canonical byte encoding of the values that
//! define them. Unlike `std::hash::Hash`, the result does not depend on the
//! hasher or the process, so it can key a persistent cache.
//!
//! A variation's kind is its type path as reported by
//! [`std::any::type_name`]. That string is fixed for a given build but not
//! guaranteed across compiler versions, so a persistent cache keyed on these
//! fingerprints belongs to the build that wrote it.
//!
//! Every field is written with a one-byte type tag and, for variable-length
//! data, a little-endian length prefix. Two different field sequences
//! therefore never encode to the same byte stream.

use core::fmt;

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

/// A 256-bit content fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Get the digest bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full lowercase hex rendering (64 characters).
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{byte:02x}")).collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First 8 bytes are plenty to tell keys apart in logs
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

const TAG_BYTES: u8 = 0x01;
const TAG_U64: u8 = 0x02;
const TAG_I64: u8 = 0x03;
const TAG_BOOL: u8 = 0x04;
const TAG_FINGERPRINT: u8 = 0x05;
const TAG_SEQUENCE: u8 = 0x06;

/// Incremental canonical encoder feeding a SHA-256 state.
pub(crate) struct Fingerprinter {
    hasher: Sha256,
}

impl Fingerprinter {
    /// Starts a fingerprint in the given domain.
    ///
    /// The domain keeps fingerprints of different kinds of value apart even
    /// if their fields happen to encode identically.
    pub(crate) fn new(domain: &str) -> Self {
        let mut this = Self {
            hasher: Sha256::new(),
        };
        this.str(domain);
        this
    }

    pub(crate) fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.hasher.update([TAG_BYTES]);
        self.hasher.update((bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
        self
    }

    pub(crate) fn str(&mut self, text: &str) -> &mut Self {
        self.bytes(text.as_bytes())
    }

    pub(crate) fn u64(&mut self, value: u64) -> &mut Self {
        self.hasher.update([TAG_U64]);
        self.hasher.update(value.to_le_bytes());
        self
    }

    pub(crate) fn i64(&mut self, value: i64) -> &mut Self {
        self.hasher.update([TAG_I64]);
        self.hasher.update(value.to_le_bytes());
        self
    }

    pub(crate) fn bool(&mut self, value: bool) -> &mut Self {
        self.hasher.update([TAG_BOOL, u8::from(value)]);
        self
    }

    pub(crate) fn fingerprint(&mut self, value: &Fingerprint) -> &mut Self {
        self.hasher.update([TAG_FINGERPRINT]);
        self.hasher.update(value.as_bytes());
        self
    }

    /// Marks the start of an ordered sequence of `len` items.
    pub(crate) fn sequence(&mut self, len: usize) -> &mut Self {
        self.hasher.update([TAG_SEQUENCE]);
        self.hasher.update((len as u64).to_le_bytes());
        self
    }

    pub(crate) fn finish(self) -> Fingerprint {
        Fingerprint(self.hasher.finalize().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn of(f: impl FnOnce(&mut Fingerprinter)) -> Fingerprint {
        let mut fp = Fingerprinter::new("test");
        f(&mut fp);
        fp.finish()
    }

    #[test]
    fn test_same_input_same_fingerprint() {
        let a = of(|fp| {
            fp.str("weight").u64(7);
        });
        let b = of(|fp| {
            fp.str("weight").u64(7);
        });
        assert_eq!(a, b);
    }

    #[test]
    fn test_length_prefix_separates_fields() {
        // "ab" + "c" must not collide with "a" + "bc"
        let a = of(|fp| {
            fp.str("ab").str("c");
        });
        let b = of(|fp| {
            fp.str("a").str("bc");
        });
        assert_ne!(a, b);
    }

    #[test]
    fn test_type_tags_separate_values() {
        let a = of(|fp| {
            fp.u64(1);
        });
        let b = of(|fp| {
            fp.i64(1);
        });
        let c = of(|fp| {
            fp.bool(true);
        });
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn test_domain_separates() {
        let a = Fingerprinter::new("region").finish();
        let b = Fingerprinter::new("variation").finish();
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_and_hex() {
        let fp = of(|fp| {
            fp.str("x");
        });
        assert_eq!(fp.to_string().len(), 16);
        assert_eq!(fp.to_hex().len(), 64);
        assert!(fp.to_hex().starts_with(&fp.to_string()));
    }
}
