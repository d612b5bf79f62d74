//! # did:x509 Resolution
//!
//! Orchestration of the resolution stages: identifier parsing, chain
//! loading, trust anchor matching, policy evaluation, and document
//! synthesis. Each stage is fail-fast; the first error aborts the call
//! and no partial output is ever returned.
//!
//! Resolution does not verify the signing relationship between
//! successive chain certificates, validity periods, or revocation. The
//! caller is expected to supply a chain whose links were already
//! established, e.g. by a TLS handshake or prior PKI validation.

use std::str::FromStr;

use crate::chain::{self, Certificate};
use crate::document::Document;
use crate::error::Error;
use crate::identifier::DidX509;
use crate::policy;

/// Resolve a `did:x509` identifier against a PEM certificate chain and
/// return the DID document as JSON text.
///
/// `chain_pem` is a concatenation of PEM certificate blocks, leaf first.
/// `strict` is reserved for stricter validation profiles and does not
/// alter resolution.
///
/// # Errors
///
/// Returns the first failing stage's [`Error`]; see the error taxonomy.
pub fn resolve(chain_pem: &str, did: &str, strict: bool) -> Result<String, Error> {
    let document = resolve_document(chain_pem, did, strict)?;
    serde_json::to_string(&document).map_err(|e| Error::Serialization(e.to_string()))
}

/// Resolve a `did:x509` identifier against a PEM certificate chain and
/// return the DID document.
///
/// # Errors
///
/// Returns the first failing stage's [`Error`].
pub fn resolve_document(chain_pem: &str, did: &str, strict: bool) -> Result<Document, Error> {
    if !strict {
        tracing::debug!("strict validation disabled for {did}");
    }

    // an empty chain fails before the identifier is even looked at
    if chain_pem.trim().is_empty() {
        return Err(Error::NoCertificateChain);
    }

    let identifier = DidX509::from_str(did)?;
    let blocks = chain::load(chain_pem)?;
    let certificates = chain::parse(&blocks)?;
    tracing::debug!(
        "resolving {did} against a chain of {} certificates",
        certificates.len()
    );

    let leaf = validate(&certificates, &identifier)?;
    Document::for_certificate(did, leaf)
}

/// Resolve a `did:x509` identifier to the leaf certificate's public key,
/// returned as JWK JSON text.
///
/// Unlike [`resolve`], each element of `chain` must contain exactly one
/// PEM certificate. The first element is the leaf; the whole sequence is
/// subject to the same trust anchor matching and policy evaluation as
/// [`resolve`].
///
/// # Errors
///
/// Returns the first failing stage's [`Error`].
pub fn resolve_jwk(chain: &[impl AsRef<str>], did: &str, strict: bool) -> Result<String, Error> {
    if !strict {
        tracing::debug!("strict validation disabled for {did}");
    }
    if chain.is_empty() {
        return Err(Error::NoCertificateChain);
    }

    let identifier = DidX509::from_str(did)?;

    let mut blocks = Vec::with_capacity(chain.len());
    for element in chain {
        let mut element_blocks = chain::load(element.as_ref())?;
        if element_blocks.len() != 1 {
            return Err(Error::MalformedChain("expected exactly one PEM element".to_string()));
        }
        blocks.push(element_blocks.remove(0));
    }
    let certificates = chain::parse(&blocks)?;

    let leaf = validate(&certificates, &identifier)?;
    let jwk = leaf.public_key_jwk()?;
    serde_json::to_string(&jwk).map_err(|e| Error::Serialization(e.to_string()))
}

/// Match the trust anchor and evaluate every policy, returning the leaf
/// on success.
fn validate<'c, 'a>(
    certificates: &'c [Certificate<'a>], identifier: &DidX509,
) -> Result<&'c Certificate<'a>, Error> {
    policy::find_trust_anchor(certificates, identifier.alg, &identifier.fingerprint)?;

    // find_trust_anchor guarantees at least 2 certificates
    let leaf = &certificates[0];
    policy::check_all(leaf, &identifier.policies)?;

    Ok(leaf)
}
