//! # Certificate Chain
//!
//! Loading of a PEM certificate bundle into an ordered chain (leaf first)
//! and a read-only accessor over each decoded certificate. All use of the
//! underlying X.509 decoder is kept behind [`Certificate`] so the rest of
//! the crate never touches decoder types directly.

use x509_parser::der_parser::oid;
use x509_parser::oid_registry::Oid;
use x509_parser::pem::Pem;
use x509_parser::prelude::{FromDer, GeneralName, X509Certificate};

use crate::error::Error;
use crate::jwk::PublicKeyJwk;

const OID_COMMON_NAME: Oid<'static> = oid!(2.5.4.3);
const OID_COUNTRY: Oid<'static> = oid!(2.5.4.6);
const OID_LOCALITY: Oid<'static> = oid!(2.5.4.7);
const OID_STATE_OR_PROVINCE: Oid<'static> = oid!(2.5.4.8);
const OID_STREET_ADDRESS: Oid<'static> = oid!(2.5.4.9);
const OID_ORGANIZATION: Oid<'static> = oid!(2.5.4.10);
const OID_ORGANIZATIONAL_UNIT: Oid<'static> = oid!(2.5.4.11);
const OID_EMAIL_ADDRESS: Oid<'static> = oid!(1.2.840.113549.1.9.1);

/// Split a PEM bundle into its constituent blocks.
///
/// Blocks are returned in input order (leaf first by convention). Arbitrary
/// whitespace between blocks is tolerated.
///
/// # Errors
///
/// Returns `NoCertificateChain` if the input contains no PEM blocks at all,
/// and `MalformedChain` (with the decoder's message) if a block fails to
/// decode or is not a certificate.
pub fn load(chain_pem: &str) -> Result<Vec<Pem>, Error> {
    if chain_pem.trim().is_empty() {
        return Err(Error::NoCertificateChain);
    }

    let mut blocks = vec![];
    for block in Pem::iter_from_buffer(chain_pem.as_bytes()) {
        let block = block.map_err(|e| Error::MalformedChain(e.to_string()))?;
        if block.label != "CERTIFICATE" {
            return Err(Error::MalformedChain(format!(
                "expected CERTIFICATE PEM block, found {}",
                block.label
            )));
        }
        blocks.push(block);
    }
    if blocks.is_empty() {
        return Err(Error::NoCertificateChain);
    }

    Ok(blocks)
}

/// Decode each PEM block into a [`Certificate`], preserving order.
///
/// # Errors
///
/// Returns `MalformedChain` if any block's DER fails to decode.
pub fn parse(blocks: &[Pem]) -> Result<Vec<Certificate<'_>>, Error> {
    blocks.iter().map(|block| Certificate::from_der(&block.contents)).collect()
}

/// Read-only view over one decoded certificate.
#[derive(Debug)]
pub struct Certificate<'a> {
    der: &'a [u8],
    inner: X509Certificate<'a>,
}

impl<'a> Certificate<'a> {
    /// Decode a certificate from DER bytes.
    ///
    /// # Errors
    ///
    /// Returns `MalformedChain` carrying the decoder's message verbatim.
    pub fn from_der(der: &'a [u8]) -> Result<Self, Error> {
        let (trailing, inner) =
            X509Certificate::from_der(der).map_err(|e| Error::MalformedChain(e.to_string()))?;
        if !trailing.is_empty() {
            return Err(Error::MalformedChain("trailing bytes after certificate".to_string()));
        }
        Ok(Self { der, inner })
    }

    /// The certificate's DER encoding, as supplied. This is the input to
    /// trust anchor fingerprinting.
    #[must_use]
    pub const fn der(&self) -> &[u8] {
        self.der
    }

    /// Values of the subject attribute identified by canonical key (`CN`,
    /// `O`, `OU`, `C`, `L`, `ST`, `STREET`, `E`). A subject may carry the
    /// same attribute more than once; all values are returned in
    /// certificate order. Unrecognized keys and non-string attribute
    /// values yield nothing.
    #[must_use]
    pub fn subject_values(&self, key: &str) -> Vec<String> {
        let Some(oid) = subject_oid(key) else {
            return vec![];
        };
        self.inner
            .subject()
            .iter_attributes()
            .filter(|attr| *attr.attr_type() == oid)
            .filter_map(|attr| attr.as_str().ok().map(ToString::to_string))
            .collect()
    }

    /// Subject alternative name entries as `(kind, value)` pairs, where
    /// kind is one of `email`, `dns`, or `uri`. Other SAN forms (IP
    /// addresses, directory names, ...) are not addressable by a policy
    /// and are omitted.
    ///
    /// # Errors
    ///
    /// Returns `MalformedChain` if the extension fails to decode.
    pub fn san_entries(&self) -> Result<Vec<(&'static str, String)>, Error> {
        let Some(san) = self
            .inner
            .subject_alternative_name()
            .map_err(|e| Error::MalformedChain(e.to_string()))?
        else {
            return Ok(vec![]);
        };

        let mut entries = vec![];
        for name in &san.value.general_names {
            match name {
                GeneralName::RFC822Name(value) => entries.push(("email", (*value).to_string())),
                GeneralName::DNSName(value) => entries.push(("dns", (*value).to_string())),
                GeneralName::URI(value) => entries.push(("uri", (*value).to_string())),
                _ => {}
            }
        }
        Ok(entries)
    }

    /// Whether the certificate's extended key usage list contains the
    /// dotted-decimal OID. An OID absent from the list — including one
    /// that is not even a well-formed OID — is simply not found.
    ///
    /// # Errors
    ///
    /// Returns `MalformedChain` if the extension fails to decode.
    pub fn has_eku(&self, oid: &str) -> Result<bool, Error> {
        let Some(eku) =
            self.inner.extended_key_usage().map_err(|e| Error::MalformedChain(e.to_string()))?
        else {
            return Ok(false);
        };
        let eku = eku.value;

        // standard purposes are pre-decoded into flags; everything else is
        // in `other`
        let mut oids: Vec<String> = vec![];
        if eku.any {
            oids.push("2.5.29.37.0".to_string());
        }
        if eku.server_auth {
            oids.push("1.3.6.1.5.5.7.3.1".to_string());
        }
        if eku.client_auth {
            oids.push("1.3.6.1.5.5.7.3.2".to_string());
        }
        if eku.code_signing {
            oids.push("1.3.6.1.5.5.7.3.3".to_string());
        }
        if eku.email_protection {
            oids.push("1.3.6.1.5.5.7.3.4".to_string());
        }
        if eku.time_stamping {
            oids.push("1.3.6.1.5.5.7.3.8".to_string());
        }
        if eku.ocsp_signing {
            oids.push("1.3.6.1.5.5.7.3.9".to_string());
        }
        oids.extend(eku.other.iter().map(Oid::to_id_string));

        Ok(oids.iter().any(|o| o == oid))
    }

    /// The raw value of the extension with the given OID, interpreted as
    /// UTF-8, or `None` if the extension is absent or not UTF-8.
    ///
    /// # Errors
    ///
    /// Returns `MalformedChain` if the certificate carries the extension
    /// more than once.
    pub fn extension_utf8(&self, oid: &Oid<'_>) -> Result<Option<String>, Error> {
        let ext = self
            .inner
            .get_extension_unique(oid)
            .map_err(|e| Error::MalformedChain(e.to_string()))?;
        Ok(ext.and_then(|e| std::str::from_utf8(e.value).ok().map(ToString::to_string)))
    }

    /// Whether the certificate's key may produce signatures: either the
    /// key usage extension permits digitalSignature, or no key usage
    /// extension is present.
    ///
    /// # Errors
    ///
    /// Returns `MalformedChain` if the extension fails to decode.
    pub fn supports_signing(&self) -> Result<bool, Error> {
        let usage = self.inner.key_usage().map_err(|e| Error::MalformedChain(e.to_string()))?;
        Ok(usage.map_or(true, |ku| ku.value.digital_signature()))
    }

    /// Whether the certificate's key usage extension permits keyAgreement.
    ///
    /// # Errors
    ///
    /// Returns `MalformedChain` if the extension fails to decode.
    pub fn supports_key_agreement(&self) -> Result<bool, Error> {
        let usage = self.inner.key_usage().map_err(|e| Error::MalformedChain(e.to_string()))?;
        Ok(usage.is_some_and(|ku| ku.value.key_agreement()))
    }

    /// The certificate's public key as a JWK.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` for key types with no JWK representation in
    /// this crate.
    pub fn public_key_jwk(&self) -> Result<PublicKeyJwk, Error> {
        PublicKeyJwk::from_spki(self.inner.public_key())
    }
}

fn subject_oid(key: &str) -> Option<Oid<'static>> {
    match key {
        "CN" => Some(OID_COMMON_NAME),
        "O" => Some(OID_ORGANIZATION),
        "OU" => Some(OID_ORGANIZATIONAL_UNIT),
        "C" => Some(OID_COUNTRY),
        "L" => Some(OID_LOCALITY),
        "ST" => Some(OID_STATE_OR_PROVINCE),
        "STREET" => Some(OID_STREET_ADDRESS),
        "E" => Some(OID_EMAIL_ADDRESS),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_input() {
        assert_eq!(load("").expect_err("should fail"), Error::NoCertificateChain);
        assert_eq!(load("  \n  ").expect_err("should fail"), Error::NoCertificateChain);
    }

    #[test]
    fn no_pem_blocks() {
        // text with no PEM boundaries never yields a chain
        assert!(load("not a certificate").is_err());
    }

    #[test]
    fn wrong_label() {
        let block = "-----BEGIN PUBLIC KEY-----\nAAAA\n-----END PUBLIC KEY-----\n";
        let err = load(block).expect_err("should fail");
        assert!(matches!(err, Error::MalformedChain(_)));
    }

    #[test]
    fn garbage_der() {
        let err = Certificate::from_der(&[0x30, 0x03, 0x01, 0x01, 0x00]).expect_err("should fail");
        assert!(matches!(err, Error::MalformedChain(_)));
    }
}
