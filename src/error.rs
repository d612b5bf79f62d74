//! # Resolution Errors
//!
//! Typed errors for `did:x509` resolution. Every stage of resolution
//! (identifier parsing, chain loading, trust anchor matching, policy
//! evaluation) fails fast with exactly one of these variants; no partial
//! document is ever produced.

use thiserror::Error;

/// Errors returned by `did:x509` resolution.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The identifier does not start with `did:x509:`, or names a policy
    /// this crate does not recognize.
    #[error("unsupported did:x509 scheme: {0}")]
    UnsupportedScheme(String),

    /// The identifier version is not a supported version (only `0` is
    /// currently defined).
    #[error("unsupported did:x509 version: {0}")]
    UnsupportedVersion(String),

    /// The certificate chain input is empty.
    #[error("no certificate chain")]
    NoCertificateChain,

    /// The chain has fewer than 2 certificates, so it cannot carry a trust
    /// anchor separate from the leaf.
    #[error("certificate chain too short")]
    ChainTooShort,

    /// The fingerprint is not valid unpadded base64url, has the wrong
    /// decoded length, or names an unknown hash algorithm.
    #[error("invalid certificate fingerprint: {0}")]
    InvalidFingerprint(String),

    /// No certificate in the chain hashes to the identifier's fingerprint.
    #[error("trust anchor not found in certificate chain")]
    TrustAnchorNotFound,

    /// A `subject` policy has an odd number of arguments, names an
    /// unrecognized key, or its value does not match the leaf subject.
    #[error("invalid subject key/value: {0}")]
    InvalidSubjectField(String),

    /// A `subject` policy repeats a key, directly or via an alias (`S` and
    /// `ST` name the same attribute). Carries the canonical key.
    #[error("duplicate field: {0}")]
    DuplicateField(String),

    /// No subject alternative name of the requested type and value exists
    /// on the leaf certificate.
    #[error("SAN not found: {0}")]
    SanNotFound(String),

    /// The requested OID is not in the leaf certificate's extended key
    /// usage list.
    #[error("EKU not found: {0}")]
    EkuNotFound(String),

    /// The leaf certificate's OIDC issuer extension is absent or does not
    /// match the requested issuer.
    #[error("Fulcio issuer not found: {0}")]
    FulcioIssuerNotFound(String),

    /// The leaf certificate's public key cannot be represented as a JWK.
    #[error("invalid public key: {0}")]
    InvalidKey(String),

    /// A certificate failed to decode, or a key-document chain element did
    /// not contain exactly one PEM block. The decoder's message is
    /// preserved verbatim.
    #[error("malformed certificate chain: {0}")]
    MalformedChain(String),

    /// A resolved document failed to serialize.
    #[error("serialization error: {0}")]
    Serialization(String),
}
