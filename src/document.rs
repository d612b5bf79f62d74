//! # DID Document
//!
//! The document synthesized for a successfully resolved `did:x509`
//! identifier. The document references the chain's leaf key only; the
//! rest of the chain participates in resolution but never appears in the
//! output.

use serde::{Deserialize, Serialize};

use crate::chain::Certificate;
use crate::error::Error;
use crate::jwk::PublicKeyJwk;

/// Context for resolved DID documents.
pub const CONTEXT: &str = "https://www.w3.org/ns/did/v1";

/// DID document for a resolved `did:x509` identifier.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// The context of the DID document.
    #[serde(rename = "@context")]
    pub context: String,

    /// The resolved DID, echoing the identifier passed to `resolve`.
    pub id: String,

    /// Verification methods for the DID subject. Exactly one entry,
    /// carrying the leaf certificate's public key.
    pub verification_method: Vec<VerificationMethod>,

    /// References to verification methods usable for assertions. Present
    /// when the leaf key may produce signatures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion_method: Option<Vec<String>>,

    /// References to verification methods usable for key agreement.
    /// Present when the leaf certificate's key usage permits it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_agreement: Option<Vec<String>>,
}

impl Document {
    /// Build the document for a resolved identifier from the chain's leaf
    /// certificate.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if the leaf public key has no JWK
    /// representation, or `MalformedChain` if the key usage extension
    /// fails to decode.
    pub fn for_certificate(did: &str, leaf: &Certificate<'_>) -> Result<Self, Error> {
        let key_id = format!("{did}#key-1");
        let verification_method = VerificationMethod {
            id: key_id.clone(),
            method_type: MethodType::JsonWebKey2020,
            controller: did.to_string(),
            public_key_jwk: leaf.public_key_jwk()?,
        };

        Ok(Self {
            context: CONTEXT.to_string(),
            id: did.to_string(),
            verification_method: vec![verification_method],
            assertion_method: leaf.supports_signing()?.then(|| vec![key_id.clone()]),
            key_agreement: leaf.supports_key_agreement()?.then(|| vec![key_id]),
        })
    }
}

/// A verification method expressing the leaf certificate's public key.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// A DID URL that identifies the verification method.
    pub id: String,

    /// The format of the public key material.
    #[serde(rename = "type")]
    pub method_type: MethodType,

    /// The DID of the controller of the verification method.
    pub controller: String,

    /// The public key encoded as a JWK.
    pub public_key_jwk: PublicKeyJwk,
}

/// Verification method types produced by this crate.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum MethodType {
    /// A JWK-format public key.
    #[default]
    JsonWebKey2020,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn serialized_shape() {
        let document = Document {
            context: CONTEXT.to_string(),
            id: "did:x509:0:sha256:abc::eku:1.2.3".to_string(),
            verification_method: vec![VerificationMethod {
                id: "did:x509:0:sha256:abc::eku:1.2.3#key-1".to_string(),
                method_type: MethodType::JsonWebKey2020,
                controller: "did:x509:0:sha256:abc::eku:1.2.3".to_string(),
                public_key_jwk: PublicKeyJwk { kty: "EC".to_string(), ..PublicKeyJwk::default() },
            }],
            assertion_method: Some(vec!["did:x509:0:sha256:abc::eku:1.2.3#key-1".to_string()]),
            key_agreement: None,
        };

        let json = serde_json::to_value(&document).expect("should serialize");
        assert_eq!(json["@context"], CONTEXT);
        assert_eq!(json["verificationMethod"][0]["type"], "JsonWebKey2020");
        assert_eq!(json["verificationMethod"][0]["publicKeyJwk"]["kty"], "EC");
        assert!(json.get("keyAgreement").is_none());
    }
}
