//! Mapping of algorithm names from [`SshOptions`] onto russh preferences.
//!
//! The tables list every algorithm russh supports out of the box, including
//! the legacy SHA-1 and CBC variants older switches still require. Names are
//! matched exactly; an unknown name fails the connection instead of being
//! silently dropped.

use std::borrow::Cow;

use russh::keys::{Algorithm, EcdsaCurve, HashAlg};
use russh::{Preferred, cipher, compression, kex, mac};

use super::config::SshOptions;
use crate::error::TransportError;

pub const ALL_KEX_ORDER: &[kex::Name] = &[
    kex::CURVE25519,
    kex::CURVE25519_PRE_RFC_8731,
    kex::DH_GEX_SHA1,
    kex::DH_GEX_SHA256,
    kex::DH_G1_SHA1,
    kex::DH_G14_SHA1,
    kex::DH_G14_SHA256,
    kex::DH_G15_SHA512,
    kex::DH_G16_SHA512,
    kex::DH_G17_SHA512,
    kex::DH_G18_SHA512,
    kex::ECDH_SHA2_NISTP256,
    kex::ECDH_SHA2_NISTP384,
    kex::ECDH_SHA2_NISTP521,
];

pub const ALL_CIPHERS: &[cipher::Name] = &[
    cipher::AES_128_CTR,
    cipher::AES_192_CTR,
    cipher::AES_256_CTR,
    cipher::AES_256_GCM,
    cipher::AES_128_CBC,
    cipher::AES_192_CBC,
    cipher::AES_256_CBC,
    cipher::CHACHA20_POLY1305,
];

pub const ALL_MAC_ALGORITHMS: &[mac::Name] = &[
    mac::HMAC_SHA1,
    mac::HMAC_SHA256,
    mac::HMAC_SHA512,
    mac::HMAC_SHA1_ETM,
    mac::HMAC_SHA256_ETM,
    mac::HMAC_SHA512_ETM,
];

pub const ALL_COMPRESSION_ALGORITHMS: &[compression::Name] = &[
    compression::NONE,
    compression::ZLIB,
    compression::ZLIB_LEGACY,
];

pub const ALL_KEY_TYPES: &[Algorithm] = &[
    Algorithm::Dsa,
    Algorithm::Ecdsa {
        curve: EcdsaCurve::NistP256,
    },
    Algorithm::Ecdsa {
        curve: EcdsaCurve::NistP384,
    },
    Algorithm::Ecdsa {
        curve: EcdsaCurve::NistP521,
    },
    Algorithm::Ed25519,
    Algorithm::Rsa { hash: None },
    Algorithm::Rsa {
        hash: Some(HashAlg::Sha256),
    },
    Algorithm::Rsa {
        hash: Some(HashAlg::Sha512),
    },
    Algorithm::SkEcdsaSha2NistP256,
    Algorithm::SkEd25519,
];

/// Build russh preferences from the configured name lists.
///
/// Empty lists keep russh's default order for that category.
pub fn preferred(options: &SshOptions) -> Result<Preferred, TransportError> {
    let mut preferred = Preferred::default();

    if !options.kex_algs.is_empty() {
        preferred.kex = Cow::Owned(select("key exchange", &options.kex_algs, ALL_KEX_ORDER, |n| {
            n.as_ref()
        })?);
    }
    if !options.encryption_algs.is_empty() {
        preferred.cipher = Cow::Owned(select(
            "encryption",
            &options.encryption_algs,
            ALL_CIPHERS,
            |n| n.as_ref(),
        )?);
    }
    if !options.mac_algs.is_empty() {
        preferred.mac = Cow::Owned(select("MAC", &options.mac_algs, ALL_MAC_ALGORITHMS, |n| {
            n.as_ref()
        })?);
    }
    if !options.compression_algs.is_empty() {
        preferred.compression = Cow::Owned(select(
            "compression",
            &options.compression_algs,
            ALL_COMPRESSION_ALGORITHMS,
            |n| n.as_ref(),
        )?);
    }
    if !options.signature_algs.is_empty() {
        preferred.key = Cow::Owned(select(
            "signature",
            &options.signature_algs,
            ALL_KEY_TYPES,
            |a| a.as_str(),
        )?);
    }

    Ok(preferred)
}

/// Resolve `names` against `table`, keeping the caller's order.
fn select<T: Clone>(
    kind: &'static str,
    names: &[String],
    table: &[T],
    name_of: impl Fn(&T) -> &str,
) -> Result<Vec<T>, TransportError> {
    names
        .iter()
        .map(|name| {
            table
                .iter()
                .find(|candidate| name_of(candidate) == name)
                .cloned()
                .ok_or_else(|| TransportError::UnsupportedAlgorithm {
                    kind,
                    name: name.clone(),
                })
        })
        .collect()
}
