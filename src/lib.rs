//! Selective Disclosure JWTs.
//!
//! An SD-JWT is a signed JWT whose payload replaces chosen claims with
//! obfuscated digests, accompanied by a set of *disclosure* strings the
//! holder can forward selectively. The issuer side of this crate walks an
//! instruction forest describing the credential and produces the signed
//! token together with its disclosures; the verifier side validates a
//! serialized presentation and folds the forwarded disclosures back into
//! a cleartext claim map.
//!
//! ```
//! use sd_jwt::{decode_verify, encode_sign, FixedSalt, Instruction, SymmetricKey};
//!
//! let instructions = vec![Instruction::Claim {
//!     name: "birthdate".to_owned(),
//!     value: serde_json::json!("1970-01-01"),
//!     sd: true,
//! }];
//!
//! let key = SymmetricKey::from("test key");
//! let mut salts = FixedSalt::new("salt_zyx");
//! let presentation = encode_sign(&instructions, &key, &mut salts).unwrap();
//! let claims = decode_verify(&presentation, &key).unwrap();
//!
//! assert_eq!(claims["birthdate"], serde_json::json!("1970-01-01"));
//! ```

pub(crate) mod decode;
pub(crate) mod digest;
pub(crate) mod disclosure;
pub(crate) mod encode;
pub(crate) mod instruction;
pub mod jws;
pub(crate) mod salt;
pub(crate) mod serialized;

pub use decode::{decode_verify, decode_verify_disclosure_array, decode_verify_validity, ValidityClaims};
pub use digest::{hash_encoded_disclosure, SdAlg};
pub use disclosure::{Disclosure, DisclosureSet};
pub use encode::{build_claims, encode_sign};
pub use instruction::{classify_forest, combine_instruction_sets, Instruction, Instructions, NodeSpec};
pub use jws::SymmetricKey;
pub use salt::{FixedSalt, RngSalt, SaltProvider};
pub use serialized::{
    EnvelopePresentation, JwsPresentation, JwsPresentationWithKeyBinding, Presentation,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Disclosure hash requested before the node was canonicalized")]
    EmptyDisclosureHash,
    #[error("Instruction node matches none of the known kinds")]
    UnknownNodeKind,
    #[error("Instruction node carries both a scalar value and children")]
    ValueAndChildrenConflict,
    #[error("Instruction claims a name reserved by SD-JWT")]
    ReservedClaimName,
    #[error("Multiple disclosures given with the same hash")]
    MultipleDisclosuresWithSameHash,
    #[error("Disclosure is not a base64url encoding of the canonical triple")]
    MalformedDisclosure,
    #[error("JWT is missing the _sd_alg property")]
    MissingSdAlg,
    #[error("Unknown value of _sd_alg {0}")]
    UnknownSdAlg(String),
    #[error("Invalid MAC key")]
    InvalidKey,
    #[error("JWT signature or structural validation failed")]
    InvalidToken,
    #[error("Disclosure with hash {0} does not match any digest in the payload")]
    UnknownDigest(String),
    #[error(transparent)]
    JsonSerialization(#[from] serde_json::Error),
}

const SD_CLAIM_NAME: &str = "_sd";
const SD_ALG_CLAIM_NAME: &str = "_sd_alg";
const ARRAY_CLAIM_ITEM_PROPERTY_NAME: &str = "...";
