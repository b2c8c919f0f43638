use serde_json::{Map, Value};

use crate::digest::SdAlg;
use crate::disclosure::{Disclosure, DisclosureSet};
use crate::instruction::Instruction;
use crate::jws::{self, SymmetricKey};
use crate::salt::SaltProvider;
use crate::{Error, ARRAY_CLAIM_ITEM_PROPERTY_NAME, SD_ALG_CLAIM_NAME, SD_CLAIM_NAME};

/// Walks the instruction forest and produces the JWT claim map together
/// with the emitted disclosure set.
///
/// Digests land in an `_sd` array at the enclosing object level, created
/// on demand; array elements are wrapped as `{"...": digest}`. Traversal
/// order of the instructions is preserved throughout.
pub fn build_claims<S: SaltProvider + ?Sized>(
    instructions: &[Instruction],
    salts: &mut S,
) -> Result<(Map<String, Value>, DisclosureSet), Error> {
    let mut claims = Map::new();
    let mut disclosures = DisclosureSet::new();
    walk_object(instructions, &mut claims, &mut disclosures, salts)?;
    Ok((claims, disclosures))
}

/// Issues a complete serialized SD-JWT: signed token followed by the
/// tilde-separated disclosures.
pub fn encode_sign<S: SaltProvider + ?Sized>(
    instructions: &[Instruction],
    key: &SymmetricKey,
    salts: &mut S,
) -> Result<String, Error> {
    let (mut claims, disclosures) = build_claims(instructions, salts)?;
    claims.insert(
        SD_ALG_CLAIM_NAME.to_owned(),
        Value::String(SdAlg::Sha256.to_str().to_owned()),
    );

    let jwt = jws::encode_sign(&Value::Object(claims), key)?;
    Ok(format!("{}{}", jwt, disclosures.serialized()))
}

fn walk_object<S: SaltProvider + ?Sized>(
    instructions: &[Instruction],
    storage: &mut Map<String, Value>,
    disclosures: &mut DisclosureSet,
    salts: &mut S,
) -> Result<(), Error> {
    for instruction in instructions {
        match instruction {
            Instruction::Claim { name, value, sd } => {
                check_claim_name(name)?;
                if *sd {
                    let disclosure =
                        Disclosure::new(salts.next_salt(), Some(name.clone()), value.clone())?;
                    push_sd_digest(storage, disclosure.claim_hash.clone());
                    disclosures.add(disclosure)?;
                } else {
                    storage.insert(name.clone(), value.clone());
                }
            }

            Instruction::Object { name, children } => {
                check_claim_name(name)?;
                let mut child_storage = Map::new();
                walk_object(children, &mut child_storage, disclosures, salts)?;
                storage.insert(name.clone(), Value::Object(child_storage));
            }

            Instruction::Array { name, elements } => {
                check_claim_name(name)?;
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    let Instruction::ArrayElement { value, sd } = element else {
                        return Err(Error::UnknownNodeKind);
                    };
                    if *sd {
                        let disclosure = Disclosure::new(salts.next_salt(), None, value.clone())?;
                        items.push(
                            serde_json::json!({ARRAY_CLAIM_ITEM_PROPERTY_NAME: disclosure.claim_hash.clone()}),
                        );
                        disclosures.add(disclosure)?;
                    } else {
                        items.push(value.clone());
                    }
                }
                storage.insert(name.clone(), Value::Array(items));
            }

            Instruction::SdObject { name, children } => {
                check_claim_name(name)?;
                let collapsed = collect_cleartext(children)?;
                let disclosure = Disclosure::new(
                    salts.next_salt(),
                    Some(name.clone()),
                    Value::Object(collapsed),
                )?;
                push_sd_digest(storage, disclosure.claim_hash.clone());
                disclosures.add(disclosure)?;
            }

            Instruction::Recursive { name, children } => {
                check_claim_name(name)?;
                let child_hashes = walk_recursive(children, disclosures, salts)?;
                let disclosure = Disclosure::new(
                    salts.next_salt(),
                    Some(name.clone()),
                    serde_json::json!({SD_CLAIM_NAME: child_hashes}),
                )?;
                push_sd_digest(storage, disclosure.claim_hash.clone());
                disclosures.add(disclosure)?;
            }

            // elements only make sense inside an array parent
            Instruction::ArrayElement { .. } => return Err(Error::UnknownNodeKind),
        }
    }
    Ok(())
}

/// Children of a recursive parent become disclosures of their own; the
/// ordered claim hashes travel back up to feed the parent's digest list.
fn walk_recursive<S: SaltProvider + ?Sized>(
    children: &[Instruction],
    disclosures: &mut DisclosureSet,
    salts: &mut S,
) -> Result<Vec<String>, Error> {
    let mut hashes = Vec::with_capacity(children.len());
    for child in children {
        match child {
            Instruction::Claim { name, value, .. } => {
                check_claim_name(name)?;
                let disclosure =
                    Disclosure::new(salts.next_salt(), Some(name.clone()), value.clone())?;
                hashes.push(disclosure.claim_hash.clone());
                disclosures.add(disclosure)?;
            }
            Instruction::Recursive { name, children } => {
                check_claim_name(name)?;
                let nested = walk_recursive(children, disclosures, salts)?;
                let disclosure = Disclosure::new(
                    salts.next_salt(),
                    Some(name.clone()),
                    serde_json::json!({SD_CLAIM_NAME: nested}),
                )?;
                hashes.push(disclosure.claim_hash.clone());
                disclosures.add(disclosure)?;
            }
            _ => return Err(Error::UnknownNodeKind),
        }
    }
    Ok(hashes)
}

/// Renders a collapsed subtree as its cleartext object. Disclosure flags
/// inside the subtree are moot; the single parent disclosure already hides
/// every descendant.
fn collect_cleartext(children: &[Instruction]) -> Result<Map<String, Value>, Error> {
    let mut collapsed = Map::new();
    for child in children {
        match child {
            Instruction::Claim { name, value, .. } => {
                check_claim_name(name)?;
                collapsed.insert(name.clone(), value.clone());
            }
            Instruction::Object { name, children } => {
                check_claim_name(name)?;
                collapsed.insert(name.clone(), Value::Object(collect_cleartext(children)?));
            }
            Instruction::Array { name, elements } => {
                check_claim_name(name)?;
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    let Instruction::ArrayElement { value, .. } = element else {
                        return Err(Error::UnknownNodeKind);
                    };
                    items.push(value.clone());
                }
                collapsed.insert(name.clone(), Value::Array(items));
            }
            _ => return Err(Error::UnknownNodeKind),
        }
    }
    Ok(collapsed)
}

fn push_sd_digest(storage: &mut Map<String, Value>, digest: String) {
    match storage.get_mut(SD_CLAIM_NAME) {
        Some(Value::Array(digests)) => digests.push(Value::String(digest)),
        _ => {
            storage.insert(
                SD_CLAIM_NAME.to_owned(),
                Value::Array(vec![Value::String(digest)]),
            );
        }
    }
}

fn check_claim_name(name: &str) -> Result<(), Error> {
    if name == SD_CLAIM_NAME || name == SD_ALG_CLAIM_NAME || name == ARRAY_CLAIM_ITEM_PROPERTY_NAME
    {
        return Err(Error::ReservedClaimName);
    }
    Ok(())
}
