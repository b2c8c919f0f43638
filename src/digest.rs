use base64::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

use crate::Error;

/// Elements of the _sd_alg claim
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SdAlg {
    /// SHA-256 algorithm for hashing disclosures
    Sha256,
}

impl SdAlg {
    const SHA256_STR: &'static str = "sha-256";
}

impl SdAlg {
    /// String encoding of the _sd_alg field
    pub fn to_str(&self) -> &'static str {
        match self {
            SdAlg::Sha256 => Self::SHA256_STR,
        }
    }
}

impl TryFrom<&str> for SdAlg {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Ok(match value {
            Self::SHA256_STR => SdAlg::Sha256,
            other => return Err(Error::UnknownSdAlg(other.to_owned())),
        })
    }
}

impl From<SdAlg> for &'static str {
    fn from(value: SdAlg) -> Self {
        value.to_str()
    }
}

/// Computes the claim hash of an encoded disclosure string.
///
/// The digest is taken over the base64url disclosure string itself, then
/// formatted as lowercase hex ASCII before the final base64url encoding.
/// Both stages are required for interop; verifiers compare the resulting
/// strings for equality.
pub fn hash_encoded_disclosure(digest_algo: SdAlg, disclosure: &str) -> Result<String, Error> {
    if disclosure.is_empty() {
        return Err(Error::EmptyDisclosureHash);
    }
    match digest_algo {
        SdAlg::Sha256 => {
            let digest = Sha256::digest(disclosure.as_bytes());
            let hex_digest = hex::encode(digest);
            Ok(base64::encode_config(hex_digest, URL_SAFE_NO_PAD))
        }
    }
}
