//! # Certificate Policies
//!
//! A `did:x509` identifier carries an ordered list of policies, each of
//! which must hold for the chain's leaf certificate. Evaluation is a
//! logical AND: the first failing policy aborts resolution with its
//! specific error. All value comparisons are exact — no normalization
//! beyond the percent-decoding performed at parse time, and no wildcard
//! or prefix matching.

use std::collections::BTreeMap;

use percent_encoding::percent_decode_str;
use x509_parser::der_parser::oid;
use x509_parser::oid_registry::Oid;

use crate::chain::Certificate;
use crate::error::Error;
use crate::identifier::HashAlg;

/// Extension recording the OIDC issuer on certificates from Fulcio-style
/// short-lived certificate issuers.
const OID_FULCIO_ISSUER: Oid<'static> = oid!(1.3.6.1.4.1.57264.1.1);

/// One parsed certificate policy.
///
/// The registry of policy names is closed: the parser maps each group to
/// one of these variants, with unrecognized names carried as [`Unknown`]
/// so they fail at evaluation time rather than parse time.
///
/// [`Unknown`]: Policy::Unknown
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Policy {
    /// `subject` — key/value pairs that must each exactly match the leaf
    /// certificate's subject. Pairs are kept in declaration order; keys
    /// are canonicalized and checked for duplicates at evaluation.
    Subject {
        /// Raw `(key, value)` pairs as declared.
        fields: Vec<(String, String)>,
    },

    /// `san` — a subject alternative name of the given kind (`email`,
    /// `dns`, `uri`) and exact value must exist on the leaf.
    San {
        /// SAN kind.
        kind: String,
        /// Required value.
        value: String,
    },

    /// `eku` — the dotted-decimal OID must appear in the leaf's extended
    /// key usage list.
    Eku {
        /// Dotted-decimal OID.
        oid: String,
    },

    /// `fulcio-issuer` — the leaf's OIDC issuer extension must exactly
    /// equal `https://` followed by the given issuer. The argument is
    /// scheme-less; `https://` is implied.
    FulcioIssuer {
        /// Required issuer, without the `https://` scheme.
        issuer: String,
    },

    /// A policy name this crate does not recognize. Always an evaluation
    /// error.
    Unknown {
        /// The unrecognized name.
        name: String,
    },
}

impl Policy {
    /// Parse one `name:arg(:arg)*` policy group. Splitting happens on raw
    /// colons; each argument is percent-decoded after splitting.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedScheme` for undecodable arguments or wrong
    /// argument counts, and `InvalidSubjectField` for a `subject` policy
    /// without key/value pairing.
    pub fn parse(group: &str) -> Result<Self, Error> {
        let mut parts = group.split(':');
        let name = parts.next().unwrap_or("");
        let args = parts.map(decode_arg).collect::<Result<Vec<_>, _>>()?;

        match name {
            "subject" => {
                if args.is_empty() || args.len() % 2 != 0 {
                    return Err(Error::InvalidSubjectField(
                        "subject policy requires key/value pairs".to_string(),
                    ));
                }
                let fields =
                    args.chunks_exact(2).map(|pair| (pair[0].clone(), pair[1].clone())).collect();
                Ok(Self::Subject { fields })
            }
            "san" => {
                let [kind, value] = args.try_into().map_err(|_| {
                    Error::UnsupportedScheme("san policy expects a type and a value".to_string())
                })?;
                Ok(Self::San { kind, value })
            }
            "eku" => {
                let [oid] = args.try_into().map_err(|_| {
                    Error::UnsupportedScheme("eku policy expects a single OID".to_string())
                })?;
                Ok(Self::Eku { oid })
            }
            "fulcio-issuer" => {
                let [issuer] = args.try_into().map_err(|_| {
                    Error::UnsupportedScheme(
                        "fulcio-issuer policy expects a single issuer".to_string(),
                    )
                })?;
                Ok(Self::FulcioIssuer { issuer })
            }
            _ => Ok(Self::Unknown { name: name.to_string() }),
        }
    }

    /// Evaluate this policy against the chain's leaf certificate.
    ///
    /// # Errors
    ///
    /// Returns the policy's specific error variant on any mismatch; see
    /// [`Error`].
    pub fn check(&self, leaf: &Certificate<'_>) -> Result<(), Error> {
        match self {
            Self::Subject { fields } => check_subject(leaf, fields),
            Self::San { kind, value } => {
                let found =
                    leaf.san_entries()?.iter().any(|(k, v)| k == kind && v == value);
                if found {
                    Ok(())
                } else {
                    Err(Error::SanNotFound(format!("{kind}:{value}")))
                }
            }
            Self::Eku { oid } => {
                if leaf.has_eku(oid)? {
                    Ok(())
                } else {
                    Err(Error::EkuNotFound(oid.clone()))
                }
            }
            Self::FulcioIssuer { issuer } => {
                // the extension value carries the full issuer URL; the
                // policy argument omits the scheme
                let expected = format!("https://{issuer}");
                if leaf.extension_utf8(&OID_FULCIO_ISSUER)?.as_deref() == Some(&*expected) {
                    Ok(())
                } else {
                    Err(Error::FulcioIssuerNotFound(expected))
                }
            }
            Self::Unknown { name } => Err(Error::UnsupportedScheme(name.clone())),
        }
    }
}

/// Evaluate every policy against the leaf. Conjunction: the first failure
/// aborts.
///
/// # Errors
///
/// Returns the first failing policy's error.
pub fn check_all(leaf: &Certificate<'_>, policies: &[Policy]) -> Result<(), Error> {
    for policy in policies {
        policy.check(leaf)?;
    }
    Ok(())
}

/// Find the trust anchor: the chain certificate whose digest equals the
/// identifier's fingerprint. Any position qualifies, leaf included.
///
/// # Errors
///
/// Returns `ChainTooShort` for a chain with fewer than 2 certificates and
/// `TrustAnchorNotFound` when no digest matches.
pub fn find_trust_anchor(
    chain: &[Certificate<'_>], alg: HashAlg, fingerprint: &[u8],
) -> Result<(), Error> {
    if chain.len() < 2 {
        return Err(Error::ChainTooShort);
    }
    for (position, certificate) in chain.iter().enumerate() {
        if alg.digest(certificate.der()) == fingerprint {
            tracing::trace!("trust anchor matched at chain position {position}");
            return Ok(());
        }
    }
    Err(Error::TrustAnchorNotFound)
}

fn decode_arg(arg: &str) -> Result<String, Error> {
    percent_decode_str(arg)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| Error::UnsupportedScheme(format!("invalid percent-encoding: {e}")))
}

/// Canonicalize a subject key, folding aliases: `S` and `ST` both name
/// stateOrProvinceName.
fn canonical_key(key: &str) -> Option<&'static str> {
    match key {
        "CN" => Some("CN"),
        "O" => Some("O"),
        "OU" => Some("OU"),
        "C" => Some("C"),
        "L" => Some("L"),
        "S" | "ST" => Some("ST"),
        "STREET" => Some("STREET"),
        "E" => Some("E"),
        _ => None,
    }
}

fn check_subject(leaf: &Certificate<'_>, fields: &[(String, String)]) -> Result<(), Error> {
    let required = normalize_subject(fields)?;
    for (key, value) in required {
        if !leaf.subject_values(key).iter().any(|v| v == value) {
            return Err(Error::InvalidSubjectField(format!("{key}={value}")));
        }
    }
    Ok(())
}

/// Build the canonical-key mapping for a subject policy, rejecting
/// duplicates — including cross-alias duplicates — with the canonical key
/// name.
fn normalize_subject(fields: &[(String, String)]) -> Result<BTreeMap<&'static str, &str>, Error> {
    let mut required = BTreeMap::new();
    for (key, value) in fields {
        let Some(canonical) = canonical_key(key) else {
            return Err(Error::InvalidSubjectField(format!("unrecognized subject key: {key}")));
        };
        if required.insert(canonical, value.as_str()).is_some() {
            return Err(Error::DuplicateField(canonical.to_string()));
        }
    }
    Ok(required)
}

#[cfg(test)]
mod test {
    use super::*;

    fn pair(key: &str, value: &str) -> (String, String) {
        (key.to_string(), value.to_string())
    }

    #[test]
    fn subject_requires_pairs() {
        let err = Policy::parse("subject:CN").expect_err("should fail");
        assert!(matches!(err, Error::InvalidSubjectField(_)));

        let err = Policy::parse("subject").expect_err("should fail");
        assert!(matches!(err, Error::InvalidSubjectField(_)));
    }

    #[test]
    fn san_arity() {
        let err = Policy::parse("san:email").expect_err("should fail");
        assert!(matches!(err, Error::UnsupportedScheme(_)));

        let err = Policy::parse("san:email:a:b").expect_err("should fail");
        assert!(matches!(err, Error::UnsupportedScheme(_)));
    }

    #[test]
    fn eku_arity() {
        let err = Policy::parse("eku:1.2.3:4.5.6").expect_err("should fail");
        assert!(matches!(err, Error::UnsupportedScheme(_)));
    }

    #[test]
    fn fulcio_issuer_is_schemeless() {
        // the `https://` scheme is implied, not part of the argument
        let policy =
            Policy::parse("fulcio-issuer:accounts.google.com").expect("should parse");
        assert_eq!(policy, Policy::FulcioIssuer { issuer: "accounts.google.com".to_string() });
    }

    #[test]
    fn alias_folding() {
        assert_eq!(canonical_key("S"), Some("ST"));
        assert_eq!(canonical_key("ST"), Some("ST"));
        assert_eq!(canonical_key("CN"), Some("CN"));
        assert_eq!(canonical_key("X"), None);
    }

    #[test]
    fn duplicate_direct() {
        let err = normalize_subject(&[pair("CN", "a"), pair("CN", "a")]).expect_err("should fail");
        assert_eq!(err, Error::DuplicateField("CN".to_string()));
    }

    #[test]
    fn duplicate_via_alias() {
        // `S` and `ST` collide on the canonical key
        let err = normalize_subject(&[pair("S", "WA"), pair("ST", "WA")]).expect_err("should fail");
        assert_eq!(err, Error::DuplicateField("ST".to_string()));
    }

    #[test]
    fn unknown_subject_key() {
        let err = normalize_subject(&[pair("CNX", "a")]).expect_err("should fail");
        assert!(matches!(err, Error::InvalidSubjectField(_)));
    }

    #[test]
    fn unknown_policy_fails_at_parse_into_variant() {
        let policy = Policy::parse("email:bob%40example.com").expect("should parse");
        assert_eq!(policy, Policy::Unknown { name: "email".to_string() });
    }
}
