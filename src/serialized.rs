use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

use crate::Error;

/// Tilde-delimited wire form of an SD-JWT presentation:
/// `<jwt>~<d1>~…~<dn>~[<key binding>]`.
///
/// The key binding JWT is carried verbatim; this crate neither synthesizes
/// nor verifies it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presentation {
    /// Issuer-signed JWT
    pub jwt: String,

    /// Encoded disclosures the holder chose to forward
    pub disclosures: Vec<String>,

    /// Holder key binding JWT, if any
    pub key_binding: Option<String>,
}

impl Presentation {
    /// Splits a serialized presentation. Total: any input maps to some
    /// presentation; whether the parts are valid surfaces later, during
    /// verification.
    pub fn parse(serialized: &str) -> Self {
        let mut split = serialized.split('~');
        let jwt = split.next().unwrap_or_default().to_owned();
        let rest: Vec<&str> = split.collect();

        match rest.split_last() {
            None => Presentation {
                jwt,
                disclosures: Vec::new(),
                key_binding: None,
            },
            Some((last, middle)) => Presentation {
                jwt,
                disclosures: middle.iter().map(|s| (*s).to_owned()).collect(),
                key_binding: (!last.is_empty()).then(|| (*last).to_owned()),
            },
        }
    }
}

impl fmt::Display for Presentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.jwt)?;

        if !self.disclosures.is_empty() {
            f.write_char('~')?;
            for disclosure in &self.disclosures {
                f.write_str(disclosure)?;
                f.write_char('~')?;
            }
        } else if self.key_binding.is_some() {
            // keep the key binding separated so parsing stays the inverse
            f.write_char('~')?;
        }

        if let Some(key_binding) = &self.key_binding {
            f.write_str(key_binding)?;
        }

        Ok(())
    }
}

/// Presentation enveloped in a holder JWT payload, binding the SD-JWT to
/// an audience and a nonce.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvelopePresentation {
    pub aud: String,

    pub iat: i64,

    pub nonce: String,

    #[serde(rename = "_sd_jwt")]
    pub sd_jwt: String,
}

/// JSON serialization of a presentation with the issuer JWT broken into
/// its RFC 7515 segments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JwsPresentation {
    pub payload: String,

    pub protected: String,

    pub signature: String,

    pub disclosures: Vec<String>,
}

/// [`JwsPresentation`] extended with a holder key binding JWT.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JwsPresentationWithKeyBinding {
    #[serde(flatten)]
    pub presentation: JwsPresentation,

    pub key_binding: String,
}

impl JwsPresentation {
    /// Breaks a presentation's compact JWT into its three segments.
    pub fn from_presentation(presentation: &Presentation) -> Result<Self, Error> {
        let segments: Vec<&str> = presentation.jwt.split('.').collect();
        let [protected, payload, signature] = segments.as_slice() else {
            return Err(Error::InvalidToken);
        };

        Ok(JwsPresentation {
            payload: (*payload).to_owned(),
            protected: (*protected).to_owned(),
            signature: (*signature).to_owned(),
            disclosures: presentation.disclosures.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presentation(jwt: &str, disclosures: &[&str], key_binding: Option<&str>) -> Presentation {
        Presentation {
            jwt: jwt.to_owned(),
            disclosures: disclosures.iter().map(|s| (*s).to_owned()).collect(),
            key_binding: key_binding.map(str::to_owned),
        }
    }

    #[test]
    fn test_serialize_jwt_only() {
        assert_eq!(presentation("xx.xxx.xxx", &[], None).to_string(), "xx.xxx.xxx");
    }

    #[test]
    fn test_serialize_one_disclosure() {
        assert_eq!(
            presentation("xx.xxx.xxx", &["d1"], None).to_string(),
            "xx.xxx.xxx~d1~",
        );
    }

    #[test]
    fn test_serialize_two_disclosures() {
        assert_eq!(
            presentation("xx.xxx.xxx", &["d1", "d2"], None).to_string(),
            "xx.xxx.xxx~d1~d2~",
        );
    }

    #[test]
    fn test_serialize_with_key_binding() {
        assert_eq!(
            presentation("xx.xxx.xxx", &["d1"], Some("kb")).to_string(),
            "xx.xxx.xxx~d1~kb",
        );
    }

    #[test]
    fn test_serialize_key_binding_without_disclosures() {
        assert_eq!(
            presentation("xx.xxx.xxx", &[], Some("kb")).to_string(),
            "xx.xxx.xxx~kb",
        );
    }

    #[test]
    fn test_parse_jwt_only() {
        assert_eq!(
            Presentation::parse("xx.xxx.xxx"),
            presentation("xx.xxx.xxx", &[], None),
        );
    }

    #[test]
    fn test_parse_disclosures() {
        assert_eq!(
            Presentation::parse("xx.xxx.xxx~d1~"),
            presentation("xx.xxx.xxx", &["d1"], None),
        );
        assert_eq!(
            Presentation::parse("xx.xxx.xxx~d1~d2~"),
            presentation("xx.xxx.xxx", &["d1", "d2"], None),
        );
    }

    #[test]
    fn test_parse_key_binding() {
        assert_eq!(
            Presentation::parse("xx.xxx.xxx~d1~d2~kb"),
            presentation("xx.xxx.xxx", &["d1", "d2"], Some("kb")),
        );
    }

    #[test]
    fn test_jws_presentation_segments() {
        let jws = JwsPresentation::from_presentation(&presentation(
            "xx.xxx.xxxx",
            &["d1", "d2"],
            None,
        ))
        .unwrap();

        assert_eq!(
            jws,
            JwsPresentation {
                payload: "xxx".to_owned(),
                protected: "xx".to_owned(),
                signature: "xxxx".to_owned(),
                disclosures: vec!["d1".to_owned(), "d2".to_owned()],
            },
        );
    }

    #[test]
    fn test_jws_presentation_rejects_malformed_jwt() {
        let result = JwsPresentation::from_presentation(&presentation("xx.xxx", &[], None));
        assert!(result.is_err());
    }

    #[test]
    fn test_jws_presentation_with_key_binding_flattens() {
        let with_binding = JwsPresentationWithKeyBinding {
            presentation: JwsPresentation {
                payload: "xxx".to_owned(),
                protected: "xx".to_owned(),
                signature: "xxxx".to_owned(),
                disclosures: vec!["d1".to_owned()],
            },
            key_binding: "kb".to_owned(),
        };

        let json = serde_json::to_value(&with_binding).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "payload": "xxx",
                "protected": "xx",
                "signature": "xxxx",
                "disclosures": ["d1"],
                "key_binding": "kb",
            }),
        );
    }

    #[test]
    fn test_envelope_presentation_claim_names() {
        let envelope = EnvelopePresentation {
            aud: "verifier".to_owned(),
            iat: 1_683_000_000,
            nonce: "nonce".to_owned(),
            sd_jwt: "xx.xxx.xxx~d1~".to_owned(),
        };

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "aud": "verifier",
                "iat": 1_683_000_000,
                "nonce": "nonce",
                "_sd_jwt": "xx.xxx.xxx~d1~",
            }),
        );

        let back: EnvelopePresentation = serde_json::from_value(json).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn test_split_serialize_identity() {
        for form in [
            "xx.xxx.xxx",
            "xx.xxx.xxx~d1~",
            "xx.xxx.xxx~d1~d2~",
            "xx.xxx.xxx~d1~d2~kb",
            "xx.xxx.xxx~kb",
        ] {
            assert_eq!(Presentation::parse(form).to_string(), form);
        }
    }
}
