//! Minimal JWS layer for the HMAC-SHA-256 family.
//!
//! RFC 7515 compact serialization, restricted to the symmetric algorithm
//! the SD-JWT core signs with. Other JWS families are an orthogonal
//! substitution behind the same two entry points.

use base64::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use std::ops::Deref;
use zeroize::ZeroizeOnDrop;

use crate::Error;

type HmacSha256 = Hmac<Sha256>;

/// JWS algorithms supported by this crate.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    HS256,
}

/// Protected JWS header.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Header {
    #[serde(rename = "alg")]
    pub algorithm: Algorithm,

    #[serde(rename = "typ", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
}

/// Symmetric signing key. Zeroed on drop.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SymmetricKey(Box<[u8]>);

impl SymmetricKey {
    pub fn new(value: Box<[u8]>) -> Self {
        Self(value)
    }
}

impl Deref for SymmetricKey {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Box<[u8]>> for SymmetricKey {
    fn from(value: Box<[u8]>) -> Self {
        Self::new(value)
    }
}

impl From<Vec<u8>> for SymmetricKey {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value.into_boxed_slice())
    }
}

impl From<&str> for SymmetricKey {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes().into())
    }
}

fn base64_encode_json<T: Serialize>(object: &T) -> Result<String, Error> {
    let json = serde_json::to_string(object)?;
    Ok(base64::encode_config(json, URL_SAFE_NO_PAD))
}

/// Signs `claims` as a compact JWT with header `{"alg":"HS256","typ":"JWT"}`.
///
/// The payload is compact JSON with object keys in sorted order, which
/// keeps the signing input reproducible for a given claim set.
pub fn encode_sign(claims: &Value, key: &SymmetricKey) -> Result<String, Error> {
    let header = Header {
        algorithm: Algorithm::HS256,
        type_: Some("JWT".to_owned()),
    };
    let signing_input = format!("{}.{}", base64_encode_json(&header)?, base64_encode_json(claims)?);

    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| Error::InvalidKey)?;
    mac.update(signing_input.as_bytes());
    let signature = mac.finalize().into_bytes();

    Ok(format!(
        "{}.{}",
        signing_input,
        base64::encode_config(signature, URL_SAFE_NO_PAD)
    ))
}

/// Validates a compact JWT and returns its payload.
///
/// The MAC comparison is constant time. Any structural defect surfaces as
/// [`Error::InvalidToken`].
pub fn decode_verify(jwt: &str, key: &SymmetricKey) -> Result<Value, Error> {
    let segments: Vec<&str> = jwt.split('.').collect();
    let (header_b64, payload_b64, signature_b64) = match segments.as_slice() {
        [header, payload, signature] => (*header, *payload, *signature),
        _ => return Err(Error::InvalidToken),
    };

    let header_bytes =
        base64::decode_config(header_b64, URL_SAFE_NO_PAD).map_err(|_| Error::InvalidToken)?;
    let _header: Header =
        serde_json::from_slice(&header_bytes).map_err(|_| Error::InvalidToken)?;

    let signature =
        base64::decode_config(signature_b64, URL_SAFE_NO_PAD).map_err(|_| Error::InvalidToken)?;

    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| Error::InvalidKey)?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(payload_b64.as_bytes());
    mac.verify_slice(&signature).map_err(|_| Error::InvalidToken)?;

    let payload =
        base64::decode_config(payload_b64, URL_SAFE_NO_PAD).map_err(|_| Error::InvalidToken)?;
    serde_json::from_slice(&payload).map_err(|_| Error::InvalidToken)
}
