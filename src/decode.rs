use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::digest::SdAlg;
use crate::disclosure::DisclosureSet;
use crate::jws::{self, SymmetricKey};
use crate::serialized::Presentation;
use crate::{Error, ARRAY_CLAIM_ITEM_PROPERTY_NAME, SD_ALG_CLAIM_NAME, SD_CLAIM_NAME};

/// Registered validity claims of the issuer JWT, surfaced alongside the
/// reconstructed claim set. Whether an expired or not-yet-valid credential
/// is acceptable is the caller's decision.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
pub struct ValidityClaims {
    pub nbf: Option<f64>,
    pub iat: Option<f64>,
    pub exp: Option<f64>,
}

/// Validates a serialized SD-JWT presentation and reconstructs the
/// cleartext claim map from the forwarded disclosures.
pub fn decode_verify(serialized: &str, key: &SymmetricKey) -> Result<Map<String, Value>, Error> {
    let presentation = Presentation::parse(serialized);
    decode_verify_disclosure_array(&presentation.jwt, key, &presentation.disclosures)
}

/// Like [`decode_verify`], additionally extracting the JWT's registered
/// validity claims for the caller to act on.
pub fn decode_verify_validity(
    serialized: &str,
    key: &SymmetricKey,
) -> Result<(ValidityClaims, Map<String, Value>), Error> {
    let claims = decode_verify(serialized, key)?;
    let validity: ValidityClaims = serde_json::from_value(Value::Object(claims.clone()))?;
    Ok((validity, claims))
}

/// Same as [`decode_verify`], with the JWT and disclosures already split.
///
/// The payload is walked recursively: each `_sd` digest with a forwarded
/// disclosure becomes a cleartext member of its enclosing object, each
/// matched `{"...": digest}` array wrapper is replaced by the disclosed
/// value, and disclosure values that themselves carry `_sd` digests are
/// resolved by the same pass. Administrative claims and digests nobody
/// disclosed are removed from the final view.
pub fn decode_verify_disclosure_array<S: AsRef<str>>(
    jwt: &str,
    key: &SymmetricKey,
    disclosures: &[S],
) -> Result<Map<String, Value>, Error> {
    let payload = jws::decode_verify(jwt, key)?;
    let Value::Object(mut claims) = payload else {
        return Err(Error::InvalidToken);
    };

    match claims.remove(SD_ALG_CLAIM_NAME) {
        Some(Value::String(alg)) => {
            SdAlg::try_from(alg.as_str())?;
        }
        Some(other) => return Err(Error::UnknownSdAlg(other.to_string())),
        None => return Err(Error::MissingSdAlg),
    }

    let disclosures = DisclosureSet::parse(disclosures)?;
    let mut used = BTreeSet::new();
    restore_object(&mut claims, &disclosures, &mut used)?;

    for disclosure in disclosures.iter() {
        if !used.contains(&disclosure.claim_hash) {
            return Err(Error::UnknownDigest(disclosure.claim_hash.clone()));
        }
    }

    Ok(claims)
}

fn restore_object(
    claims: &mut Map<String, Value>,
    disclosures: &DisclosureSet,
    used: &mut BTreeSet<String>,
) -> Result<(), Error> {
    if let Some(sd_claims) = claims.remove(SD_CLAIM_NAME) {
        let digests = sd_claims.as_array().ok_or(Error::InvalidToken)?;
        for digest in digests {
            let digest = digest.as_str().ok_or(Error::InvalidToken)?;
            let Some(disclosure) = disclosures.lookup(digest) else {
                // nobody disclosed this digest; it drops with the _sd array
                continue;
            };
            let Some(name) = &disclosure.name else {
                continue;
            };
            used.insert(disclosure.claim_hash.clone());
            claims.insert(name.clone(), disclosure.value.clone());
        }
    }

    for (_, value) in claims.iter_mut() {
        restore_value(value, disclosures, used)?;
    }

    Ok(())
}

fn restore_value(
    value: &mut Value,
    disclosures: &DisclosureSet,
    used: &mut BTreeSet<String>,
) -> Result<(), Error> {
    match value {
        Value::Object(claims) => restore_object(claims, disclosures, used),
        Value::Array(items) => {
            for item in items.iter_mut() {
                if let Some(digest) = array_item_digest(item) {
                    if let Some(disclosure) = disclosures.lookup(&digest) {
                        if disclosure.name.is_none() {
                            used.insert(disclosure.claim_hash.clone());
                            *item = disclosure.value.clone();
                        }
                    }
                    // unmatched wrappers stay in place
                }
                restore_value(item, disclosures, used)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn array_item_digest(item: &Value) -> Option<String> {
    let wrapper = item.as_object()?;
    if wrapper.len() != 1 {
        return None;
    }
    wrapper
        .get(ARRAY_CLAIM_ITEM_PROPERTY_NAME)?
        .as_str()
        .map(str::to_owned)
}
