use base64::URL_SAFE_NO_PAD;
use serde_json::Value;

use crate::digest::{hash_encoded_disclosure, SdAlg};
use crate::Error;

/// One emitted disclosure: the canonical triple together with its base64url
/// encoding and the digest that appears in the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Disclosure {
    /// Salt drawn for the node
    pub salt: String,

    /// Claim name; absent for array element disclosures
    pub name: Option<String>,

    /// Disclosed value. For a collapsed subtree this is the cleartext
    /// object; for a recursive parent it is a digest list, not cleartext.
    pub value: Value,

    /// Base64url of the canonical triple
    pub encoded: String,

    /// Base64url of the hex ASCII SHA-256 of `encoded`
    pub claim_hash: String,
}

impl Disclosure {
    /// Canonicalizes and hashes a disclosure for the given claim.
    ///
    /// `name` is `None` for array elements, which are encoded with an empty
    /// middle field.
    pub fn new(salt: String, name: Option<String>, value: Value) -> Result<Self, Error> {
        let canonical = canonical_triple(&salt, name.as_deref().unwrap_or(""), &value)?;
        let encoded = base64::encode_config(canonical, URL_SAFE_NO_PAD);
        let claim_hash = hash_encoded_disclosure(SdAlg::Sha256, &encoded)?;

        Ok(Disclosure {
            salt,
            name,
            value,
            encoded,
            claim_hash,
        })
    }

    /// Decodes an encoded disclosure string, recomputing its claim hash.
    pub fn parse(encoded: &str) -> Result<Self, Error> {
        let bytes =
            base64::decode_config(encoded, URL_SAFE_NO_PAD).map_err(|_| Error::MalformedDisclosure)?;
        let json: Value = serde_json::from_slice(&bytes).map_err(|_| Error::MalformedDisclosure)?;

        let values = json.as_array().ok_or(Error::MalformedDisclosure)?;
        if values.len() != 3 {
            return Err(Error::MalformedDisclosure);
        }
        let salt = values[0].as_str().ok_or(Error::MalformedDisclosure)?;
        let name = values[1].as_str().ok_or(Error::MalformedDisclosure)?;

        Ok(Disclosure {
            salt: salt.to_owned(),
            name: (!name.is_empty()).then(|| name.to_owned()),
            value: values[2].clone(),
            encoded: encoded.to_owned(),
            claim_hash: hash_encoded_disclosure(SdAlg::Sha256, encoded)?,
        })
    }
}

/// Canonical byte form of a disclosure: the compact JSON array
/// `["salt","name",value]`.
///
/// Scalar values are quoted JSON strings while object values (collapsed
/// subtrees, recursive digest lists) are spliced in unquoted. The asymmetry
/// is load bearing for interop; the produced bytes feed the digest directly.
pub(crate) fn canonical_triple(
    salt: &str,
    name: &str,
    value: &Value,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&serde_json::json!([salt, name, value]))
}

/// Insertion-ordered collection of disclosures keyed by claim hash.
///
/// One instance exists per build or per verification; iteration order is
/// the order in which disclosures were added, which keeps the serialized
/// form deterministic for a fixed salt sequence.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DisclosureSet {
    entries: Vec<Disclosure>,
}

impl DisclosureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a disclosure. Duplicate claim hashes are rejected; fresh
    /// salts make them impossible during issuance.
    pub fn add(&mut self, disclosure: Disclosure) -> Result<(), Error> {
        if self.lookup(&disclosure.claim_hash).is_some() {
            return Err(Error::MultipleDisclosuresWithSameHash);
        }
        self.entries.push(disclosure);
        Ok(())
    }

    pub fn lookup(&self, claim_hash: &str) -> Option<&Disclosure> {
        self.entries.iter().find(|d| d.claim_hash == claim_hash)
    }

    /// Rebuilds a set from forwarded disclosure strings.
    pub fn parse<S: AsRef<str>>(encoded: &[S]) -> Result<Self, Error> {
        let mut set = Self::new();
        for disclosure in encoded {
            set.add(Disclosure::parse(disclosure.as_ref())?)?;
        }
        Ok(set)
    }

    /// Wire form of the set: `~d1~d2~`, or the empty string when there is
    /// nothing to disclose.
    pub fn serialized(&self) -> String {
        if self.entries.is_empty() {
            return String::new();
        }
        let mut s = String::from("~");
        for disclosure in &self.entries {
            s.push_str(&disclosure.encoded);
            s.push('~');
        }
        s
    }

    /// Encoded disclosure strings in insertion order.
    pub fn encoded_disclosures(&self) -> Vec<String> {
        self.entries.iter().map(|d| d.encoded.clone()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Disclosure> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_leaf_triple() {
        let canonical = canonical_triple("salt_zyx", "birthdate", &json!("xyz")).unwrap();
        assert_eq!(canonical, r#"["salt_zyx","birthdate","xyz"]"#);
        assert_eq!(
            base64::encode_config(canonical, URL_SAFE_NO_PAD),
            "WyJzYWx0X3p5eCIsImJpcnRoZGF0ZSIsInh5eiJd",
        );
    }

    #[test]
    fn test_canonical_array_element_triple() {
        let canonical = canonical_triple("salt_zyx", "", &json!("se")).unwrap();
        assert_eq!(canonical, r#"["salt_zyx","","se"]"#);
        assert_eq!(
            base64::encode_config(canonical, URL_SAFE_NO_PAD),
            "WyJzYWx0X3p5eCIsIiIsInNlIl0",
        );
    }

    #[test]
    fn test_canonical_object_value_is_spliced_unquoted() {
        let canonical = canonical_triple(
            "salt_zyx",
            "address",
            &json!({"street_address": "testgatan 3"}),
        )
        .unwrap();
        assert_eq!(
            canonical,
            r#"["salt_zyx","address",{"street_address":"testgatan 3"}]"#
        );
    }

    #[test]
    fn test_canonical_digest_list_value() {
        let canonical = canonical_triple("salt_zyx", "address", &json!({"_sd": ["h1", "h2"]})).unwrap();
        assert_eq!(canonical, r#"["salt_zyx","address",{"_sd":["h1","h2"]}]"#);
    }

    #[test]
    fn test_new_computes_both_hashes() {
        let disclosure = Disclosure::new(
            "salt_zyx".to_owned(),
            Some("birthdate".to_owned()),
            json!("1970-01-01"),
        )
        .unwrap();
        assert_eq!(
            disclosure.encoded,
            "WyJzYWx0X3p5eCIsImJpcnRoZGF0ZSIsIjE5NzAtMDEtMDEiXQ"
        );
        assert_eq!(
            disclosure.claim_hash,
            "Zjc4YWM0MzQ5ODJiY2RiZmIyN2RkNDMwZmY5M2Q3N2FhOGYxMzQ2YWQ4ODYyZGVjMTQ4NjQ2YzcxM2E0MDUzZg"
        );
    }

    #[test]
    fn test_parse_inverts_new() {
        let disclosure = Disclosure::parse("WyJzYWx0X3p5eCIsImJpcnRoZGF0ZSIsIjE5NzAtMDEtMDEiXQ").unwrap();
        assert_eq!(disclosure.salt, "salt_zyx");
        assert_eq!(disclosure.name.as_deref(), Some("birthdate"));
        assert_eq!(disclosure.value, json!("1970-01-01"));
        assert_eq!(
            disclosure.claim_hash,
            "Zjc4YWM0MzQ5ODJiY2RiZmIyN2RkNDMwZmY5M2Q3N2FhOGYxMzQ2YWQ4ODYyZGVjMTQ4NjQ2YzcxM2E0MDUzZg"
        );
    }

    #[test]
    fn test_parse_array_element_has_no_name() {
        let disclosure = Disclosure::parse("WyJzYWx0X3p5eCIsIiIsInNlIl0").unwrap();
        assert_eq!(disclosure.name, None);
        assert_eq!(disclosure.value, json!("se"));
    }

    #[test]
    fn test_parse_rejects_bad_base64() {
        assert!(matches!(
            Disclosure::parse("not~base64!"),
            Err(Error::MalformedDisclosure)
        ));
    }

    #[test]
    fn test_parse_rejects_wrong_arity() {
        // ["salt_zyx","a"]
        let two = base64::encode_config(r#"["salt_zyx","a"]"#, URL_SAFE_NO_PAD);
        assert!(matches!(
            Disclosure::parse(&two),
            Err(Error::MalformedDisclosure)
        ));
    }

    #[test]
    fn test_serialized_brackets_with_tildes() {
        let mut set = DisclosureSet::new();
        assert_eq!(set.serialized(), "");

        set.add(
            Disclosure::new("zyx".to_owned(), Some("birthdate".to_owned()), json!("xyz")).unwrap(),
        )
        .unwrap();
        let one = set.serialized();
        assert!(one.starts_with('~') && one.ends_with('~'));
        assert_eq!(one.matches('~').count(), 2);

        set.add(
            Disclosure::new("zyx".to_owned(), Some("given_name".to_owned()), json!("xyz")).unwrap(),
        )
        .unwrap();
        assert_eq!(set.serialized().matches('~').count(), 3);
    }

    #[test]
    fn test_duplicate_claim_hash_rejected() {
        let mut set = DisclosureSet::new();
        let disclosure =
            Disclosure::new("zyx".to_owned(), Some("birthdate".to_owned()), json!("xyz")).unwrap();
        set.add(disclosure.clone()).unwrap();
        assert!(matches!(
            set.add(disclosure),
            Err(Error::MultipleDisclosuresWithSameHash)
        ));
    }

    #[test]
    fn test_parse_set_keys_by_claim_hash() {
        let set = DisclosureSet::parse(&[
            "WyJzYWx0X3p5eCIsImJpcnRoZGF0ZSIsIjE5NzAtMDEtMDEiXQ",
            "WyJzYWx0X3p5eCIsImdpdmVuX25hbWUiLCJKb2huIl0",
        ])
        .unwrap();
        assert_eq!(set.len(), 2);

        let birthdate = set
            .lookup("Zjc4YWM0MzQ5ODJiY2RiZmIyN2RkNDMwZmY5M2Q3N2FhOGYxMzQ2YWQ4ODYyZGVjMTQ4NjQ2YzcxM2E0MDUzZg")
            .unwrap();
        assert_eq!(birthdate.name.as_deref(), Some("birthdate"));
        assert_eq!(birthdate.value, json!("1970-01-01"));

        let given_name = set
            .lookup("MzE0ZDU5NzY0NGQ4YjRlZTM1YjJjYWMwNGFlNmMwM2JiNGFmYTk5ODQxMDhjMzIzNGQ3ZTY2NmZmMWJmYzk4Nw")
            .unwrap();
        assert_eq!(given_name.name.as_deref(), Some("given_name"));
        assert_eq!(given_name.value, json!("John"));
    }
}
