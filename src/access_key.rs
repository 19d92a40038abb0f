//! Deterministic access keys for protected media variants.
//!
//! An access key is the truncated hex HMAC-SHA256 of a canonical resource
//! descriptor under a service-wide secret: 32 lowercase hex characters
//! (128 bits). It has no internal structure a consumer may parse; the same
//! descriptor and secret always re-derive the identical key, so callers can
//! regenerate instead of storing.
//!
//! [`validate`] checks structural well-formedness only. Whether a presented
//! key actually corresponds to a requested resource is decided by
//! [`matches_descriptor`], which re-derives and compares.

use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::Serialize;
use sha2::Sha256;
use std::fmt;

use crate::auth::hash::constant_time_eq;

type HmacSha256 = Hmac<Sha256>;

/// Declared access-key length in hex characters. Part of the contract:
/// consumers may rely on exact-length keys.
pub const ACCESS_KEY_LEN: usize = 32;

/// Canonical descriptor of one playable media variant.
///
/// The canonical string is `<id>:<quality>` or `<id>:<sequence>:<quality>`;
/// the constructor rejects `:` inside components so distinct descriptors can
/// never canonicalize to the same string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaResourceDescriptor {
    media_id: String,
    sequence: Option<u32>,
    quality: String,
}

impl MediaResourceDescriptor {
    pub fn new(
        media_id: impl Into<String>,
        sequence: Option<u32>,
        quality: impl Into<String>,
    ) -> Result<Self, &'static str> {
        let media_id = media_id.into();
        let quality = quality.into();
        if media_id.is_empty() || quality.is_empty() {
            return Err("descriptor components must be non-empty");
        }
        if media_id.contains(':') || quality.contains(':') {
            return Err("descriptor components must not contain ':'");
        }
        Ok(Self {
            media_id,
            sequence,
            quality,
        })
    }

    /// Canonical, stable string form. Never changes once constructed.
    pub fn canonical(&self) -> String {
        match self.sequence {
            Some(sequence) => format!("{}:{}:{}", self.media_id, sequence, self.quality),
            None => format!("{}:{}", self.media_id, self.quality),
        }
    }
}

impl fmt::Display for MediaResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Opaque key gating one media variant. Treat as a black box; string
/// equality is the only meaningful operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AccessKey(String);

impl AccessKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the access key for a descriptor. Pure and deterministic: no
/// randomness, no timestamp.
pub fn generate(descriptor: &MediaResourceDescriptor, secret: &[u8]) -> AccessKey {
    let mut mac = HmacSha256::new_from_slice(secret).expect("hmac accepts any key length");
    mac.update(descriptor.canonical().as_bytes());
    let digest = mac.finalize().into_bytes();
    let mut key = hex::encode(digest);
    key.truncate(ACCESS_KEY_LEN);
    AccessKey(key)
}

/// Structural validation only: exact length, hex alphabet (either case).
/// The descriptor is not recoverable from a key, so entitlement binding is
/// the caller's job. Never panics.
pub fn validate(key: &str) -> bool {
    key.len() == ACCESS_KEY_LEN && key.chars().all(|c| c.is_ascii_hexdigit())
}

/// Entitlement check: does a presented key match the claimed descriptor?
/// Re-derives and compares in constant time.
pub fn matches_descriptor(
    key: &str,
    descriptor: &MediaResourceDescriptor,
    secret: &[u8],
) -> bool {
    if !validate(key) {
        return false;
    }
    let expected = generate(descriptor, secret);
    constant_time_eq(key.to_ascii_lowercase().as_bytes(), expected.as_str().as_bytes())
}

/// Mint a random key in the same output format, for resources that have no
/// stable descriptor. Not re-derivable; the caller must persist it.
pub fn mint_random() -> AccessKey {
    let mut entropy = [0u8; ACCESS_KEY_LEN / 2];
    OsRng.fill_bytes(&mut entropy);
    AccessKey(hex::encode(entropy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const SECRET: &[u8] = b"test_access_key_secret";

    fn descriptor() -> MediaResourceDescriptor {
        MediaResourceDescriptor::new("test-simple-001", Some(6), "720p").unwrap()
    }

    #[test]
    fn test_canonical_forms() {
        assert_eq!(descriptor().canonical(), "test-simple-001:6:720p");
        let no_sequence = MediaResourceDescriptor::new("m-1", None, "1080p").unwrap();
        assert_eq!(no_sequence.canonical(), "m-1:1080p");
    }

    #[test]
    fn test_descriptor_rejects_ambiguous_components() {
        assert!(MediaResourceDescriptor::new("", None, "720p").is_err());
        assert!(MediaResourceDescriptor::new("m-1", None, "").is_err());
        assert!(MediaResourceDescriptor::new("m:1", None, "720p").is_err());
        assert!(MediaResourceDescriptor::new("m-1", None, "72:0p").is_err());
    }

    #[test]
    fn test_generate_matches_python_reference() {
        // hmac.new(secret, b"test-simple-001:6:720p", sha256).hexdigest()[:32]
        let key = generate(&descriptor(), SECRET);
        assert_eq!(key.as_str(), "47b29a53a53a58a40e7b46cf167dd19b");
        assert_eq!(key.as_str().len(), ACCESS_KEY_LEN);
    }

    #[test]
    fn test_generate_is_deterministic() {
        assert_eq!(generate(&descriptor(), SECRET), generate(&descriptor(), SECRET));
    }

    #[test]
    fn test_generate_separates_nearby_descriptors() {
        let base = generate(&descriptor(), SECRET);
        let other_quality = MediaResourceDescriptor::new("test-simple-001", Some(6), "1080p").unwrap();
        let other_sequence = MediaResourceDescriptor::new("test-simple-001", Some(7), "720p").unwrap();
        assert_eq!(
            generate(&other_quality, SECRET).as_str(),
            "25cece849ed720abfdc0f5eda73bddc5"
        );
        assert_eq!(
            generate(&other_sequence, SECRET).as_str(),
            "eaf183c87ddba837da07f66fc5fa4bff"
        );
        assert_ne!(base, generate(&other_quality, SECRET));
        assert_ne!(base, generate(&other_sequence, SECRET));
    }

    #[test]
    fn test_generate_depends_on_secret() {
        assert_ne!(generate(&descriptor(), SECRET), generate(&descriptor(), b"other-secret"));
    }

    #[test]
    fn test_validate_well_formed_keys() {
        assert!(validate(generate(&descriptor(), SECRET).as_str()));
        assert!(validate("47B29A53A53A58A40E7B46CF167DD19B")); // either case
    }

    #[test]
    fn test_validate_rejects_malformed_keys() {
        assert!(!validate(""));
        assert!(!validate("47b29a53"));
        assert!(!validate(&"a".repeat(ACCESS_KEY_LEN + 1)));
        // Right length, one character outside the alphabet.
        assert!(!validate("47b29a53a53a58a40e7b46cf167dd19g"));
        assert!(!validate("47b29a53a53a58a40e7b46cf167dd19!"));
    }

    #[test]
    fn test_matches_descriptor_binds_key_to_resource() {
        let key = generate(&descriptor(), SECRET);
        assert!(matches_descriptor(key.as_str(), &descriptor(), SECRET));
        assert!(matches_descriptor(
            &key.as_str().to_ascii_uppercase(),
            &descriptor(),
            SECRET
        ));

        let other = MediaResourceDescriptor::new("test-simple-001", Some(6), "1080p").unwrap();
        assert!(!matches_descriptor(key.as_str(), &other, SECRET));
        assert!(!matches_descriptor(key.as_str(), &descriptor(), b"other-secret"));
        assert!(!matches_descriptor("not-a-key", &descriptor(), SECRET));
    }

    #[test]
    fn test_no_collisions_across_descriptor_grid() {
        let qualities = ["480p", "720p", "1080p", "2160p"];
        let mut seen = HashSet::new();
        for series in 0..125 {
            for episode in 0..20u32 {
                for quality in qualities {
                    let descriptor = MediaResourceDescriptor::new(
                        format!("series-{}", series),
                        Some(episode),
                        quality,
                    )
                    .unwrap();
                    seen.insert(generate(&descriptor, SECRET));
                }
            }
        }
        assert_eq!(seen.len(), 125 * 20 * qualities.len());
    }

    #[test]
    fn test_mint_random_format_and_uniqueness() {
        let first = mint_random();
        let second = mint_random();
        assert!(validate(first.as_str()));
        assert_ne!(first, second);
    }
}
