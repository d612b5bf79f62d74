//! # Public Key JWK
//!
//! JSON Web Key representation of a certificate's subject public key.
//! This is the body of the key document returned by
//! [`resolve_jwk`](crate::resolve_jwk) and the `publicKeyJwk` of each
//! verification method in a resolved DID document.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use x509_parser::der_parser::oid;
use x509_parser::oid_registry::Oid;
use x509_parser::prelude::SubjectPublicKeyInfo;
use x509_parser::public_key::PublicKey;

use crate::error::Error;

const OID_EC_P256: Oid<'static> = oid!(1.2.840.10045.3.1.7);
const OID_EC_P384: Oid<'static> = oid!(1.3.132.0.34);
const OID_EC_P521: Oid<'static> = oid!(1.3.132.0.35);
const OID_ED25519: Oid<'static> = oid!(1.3.101.112);

/// Simplified JWK public key structure. All byte parameters are unpadded
/// base64url.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct PublicKeyJwk {
    /// Key type (`EC`, `RSA`, or `OKP`).
    pub kty: String,

    /// Cryptographic curve, for `EC` and `OKP` keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,

    /// X coordinate (`EC`), or the public key bytes (`OKP`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,

    /// Y coordinate (`EC`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,

    /// Modulus (`RSA`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// Public exponent (`RSA`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}

impl PublicKeyJwk {
    /// Build a JWK from a certificate's subject public key info.
    ///
    /// Supports EC keys on P-256/P-384/P-521, RSA keys, and Ed25519 keys.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` for any other key type, an unknown curve, or a
    /// compressed EC point.
    pub fn from_spki(spki: &SubjectPublicKeyInfo<'_>) -> Result<Self, Error> {
        let parsed = spki.parsed().map_err(|e| Error::InvalidKey(e.to_string()))?;

        match parsed {
            PublicKey::EC(point) => {
                let (crv, size) =
                    match spki.algorithm.parameters.as_ref().and_then(|p| p.as_oid().ok()) {
                        Some(curve) if curve == OID_EC_P256 => ("P-256", 32),
                        Some(curve) if curve == OID_EC_P384 => ("P-384", 48),
                        Some(curve) if curve == OID_EC_P521 => ("P-521", 66),
                        Some(curve) => {
                            return Err(Error::InvalidKey(format!("unsupported curve: {curve}")));
                        }
                        None => {
                            return Err(Error::InvalidKey(
                                "missing EC curve parameter".to_string(),
                            ));
                        }
                    };

                // only uncompressed SEC1 points carry both coordinates
                let data = point.data();
                if data.len() != 1 + 2 * size || data[0] != 0x04 {
                    return Err(Error::InvalidKey("expected uncompressed EC point".to_string()));
                }
                Ok(Self {
                    kty: "EC".to_string(),
                    crv: Some(crv.to_string()),
                    x: Some(Base64UrlUnpadded::encode_string(&data[1..=size])),
                    y: Some(Base64UrlUnpadded::encode_string(&data[1 + size..])),
                    ..Self::default()
                })
            }
            PublicKey::RSA(rsa) => Ok(Self {
                kty: "RSA".to_string(),
                n: Some(Base64UrlUnpadded::encode_string(trim_leading_zeros(rsa.modulus))),
                e: Some(Base64UrlUnpadded::encode_string(trim_leading_zeros(rsa.exponent))),
                ..Self::default()
            }),
            PublicKey::Unknown(data) if spki.algorithm.algorithm == OID_ED25519 => Ok(Self {
                kty: "OKP".to_string(),
                crv: Some("Ed25519".to_string()),
                x: Some(Base64UrlUnpadded::encode_string(data)),
                ..Self::default()
            }),
            _ => Err(Error::InvalidKey(format!(
                "unsupported algorithm: {}",
                spki.algorithm.algorithm
            ))),
        }
    }
}

/// DER integers are sign-prefixed; JWK parameters are the minimal
/// magnitude bytes.
fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let mut bytes = bytes;
    while bytes.len() > 1 && bytes[0] == 0 {
        bytes = &bytes[1..];
    }
    bytes
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn trims_sign_prefix() {
        assert_eq!(trim_leading_zeros(&[0x00, 0xff, 0x01]), &[0xff, 0x01]);
        assert_eq!(trim_leading_zeros(&[0x01, 0x00, 0x01]), &[0x01, 0x00, 0x01]);
        assert_eq!(trim_leading_zeros(&[0x00]), &[0x00]);
    }

    #[test]
    fn serializes_minimal_fields() {
        let jwk = PublicKeyJwk {
            kty: "EC".to_string(),
            crv: Some("P-256".to_string()),
            x: Some("eA".to_string()),
            y: Some("eQ".to_string()),
            ..PublicKeyJwk::default()
        };
        let json = serde_json::to_value(&jwk).expect("should serialize");
        assert_eq!(json, serde_json::json!({"kty": "EC", "crv": "P-256", "x": "eA", "y": "eQ"}));
    }
}
