//! # did:x509 Identifier
//!
//! Parsing of the `did:x509` method-specific identifier:
//!
//! ```text
//! did:x509:<version>:<alg>:<base64url-fingerprint>(::<policy>:<arg>(:<arg>)*)*
//! ```
//!
//! Policy groups are separated by `::`; within a group, `:` separates the
//! policy name from its arguments. Arguments are percent-encoded per
//! RFC 3986, so a literal colon can only appear in an argument as `%3A`.
//! Splitting always happens on the raw (undecoded) string.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use base64ct::{Base64UrlUnpadded, Encoding};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::Error;
use crate::policy::Policy;

/// Method prefix all `did:x509` identifiers must carry (case-sensitive).
pub const PREFIX: &str = "did:x509:";

/// A parsed `did:x509` identifier. Immutable once parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DidX509 {
    /// Identifier format version. Only `0` is currently defined.
    pub version: u32,

    /// Digest algorithm used for the trust anchor fingerprint.
    pub alg: HashAlg,

    /// Digest of the trust anchor certificate's DER encoding. Always
    /// exactly [`HashAlg::size`] bytes.
    pub fingerprint: Vec<u8>,

    /// Certificate policies, in declaration order. Order does not affect
    /// the resolution result.
    pub policies: Vec<Policy>,
}

impl FromStr for DidX509 {
    type Err = Error;

    fn from_str(did: &str) -> Result<Self, Error> {
        let Some(rest) = did.strip_prefix(PREFIX) else {
            return Err(Error::UnsupportedScheme(did.to_string()));
        };

        let mut groups = rest.split("::");
        let header = groups.next().unwrap_or("");

        let mut parts = header.splitn(3, ':');
        let (Some(version), Some(alg), Some(fingerprint)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::InvalidFingerprint(header.to_string()));
        };

        let parsed: u32 =
            version.parse().map_err(|_| Error::UnsupportedVersion(version.to_string()))?;
        if parsed != 0 {
            return Err(Error::UnsupportedVersion(version.to_string()));
        }

        let alg = HashAlg::from_str(alg)?;
        let bytes = Base64UrlUnpadded::decode_vec(fingerprint)
            .map_err(|e| Error::InvalidFingerprint(format!("{fingerprint}: {e}")))?;
        if bytes.len() != alg.size() {
            return Err(Error::InvalidFingerprint(format!(
                "expected {} digest bytes, found {}",
                alg.size(),
                bytes.len()
            )));
        }

        // A trailing `::` with no policies is legal, so empty groups are
        // skipped rather than rejected.
        let mut policies = vec![];
        for group in groups {
            if group.is_empty() {
                continue;
            }
            policies.push(Policy::parse(group)?);
        }

        Ok(Self { version: parsed, alg, fingerprint: bytes, policies })
    }
}

/// Digest algorithms usable for the trust anchor fingerprint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HashAlg {
    /// SHA-256 (32-byte digest).
    #[default]
    Sha256,

    /// SHA-384 (48-byte digest).
    Sha384,

    /// SHA-512 (64-byte digest).
    Sha512,
}

impl HashAlg {
    /// Digest output size in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Digest `data` with this algorithm.
    #[must_use]
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

impl FromStr for HashAlg {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            _ => Err(Error::InvalidFingerprint(format!("unsupported hash algorithm: {s}"))),
        }
    }
}

impl Display for HashAlg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Sha384 => write!(f, "sha384"),
            Self::Sha512 => write!(f, "sha512"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const FINGERPRINT: &str = "hH32p4SXlD8n_HLrk_mmNzIKArVh0KkbCeh6eAftfGE";

    #[test]
    fn parse_with_policies() {
        let did = format!("{PREFIX}0:sha256:{FINGERPRINT}::subject:CN:Acme%20Inc::eku:1.2.3");
        let parsed: DidX509 = did.parse().expect("should parse");

        assert_eq!(parsed.version, 0);
        assert_eq!(parsed.alg, HashAlg::Sha256);
        assert_eq!(parsed.fingerprint.len(), 32);
        assert_eq!(parsed.policies.len(), 2);
        assert_eq!(
            parsed.policies[0],
            Policy::Subject { fields: vec![("CN".to_string(), "Acme Inc".to_string())] }
        );
        assert_eq!(parsed.policies[1], Policy::Eku { oid: "1.2.3".to_string() });
    }

    #[test]
    fn parse_no_policies() {
        let did = format!("{PREFIX}0:sha256:{FINGERPRINT}");
        let parsed: DidX509 = did.parse().expect("should parse");
        assert!(parsed.policies.is_empty());

        // trailing `::` is tolerated
        let did = format!("{PREFIX}0:sha256:{FINGERPRINT}::");
        let parsed: DidX509 = did.parse().expect("should parse");
        assert!(parsed.policies.is_empty());
    }

    #[test]
    fn percent_encoded_colon() {
        let did = format!("{PREFIX}0:sha256:{FINGERPRINT}::san:uri:https%3A%2F%2Fexample.com");
        let parsed: DidX509 = did.parse().expect("should parse");
        assert_eq!(
            parsed.policies[0],
            Policy::San {
                kind: "uri".to_string(),
                value: "https://example.com".to_string()
            }
        );
    }

    #[test]
    fn wrong_prefix() {
        let err = "djd:y508:1:abcd::".parse::<DidX509>().expect_err("should fail");
        assert!(matches!(err, Error::UnsupportedScheme(_)));

        // case-sensitive
        let err = format!("DID:X509:0:sha256:{FINGERPRINT}")
            .parse::<DidX509>()
            .expect_err("should fail");
        assert!(matches!(err, Error::UnsupportedScheme(_)));
    }

    #[test]
    fn unsupported_version() {
        let err =
            format!("{PREFIX}1:sha256:{FINGERPRINT}").parse::<DidX509>().expect_err("should fail");
        assert_eq!(err, Error::UnsupportedVersion("1".to_string()));

        let err =
            format!("{PREFIX}x:sha256:{FINGERPRINT}").parse::<DidX509>().expect_err("should fail");
        assert_eq!(err, Error::UnsupportedVersion("x".to_string()));
    }

    #[test]
    fn bad_fingerprint() {
        // unknown digest name
        let err = format!("{PREFIX}0:md5:{FINGERPRINT}").parse::<DidX509>().expect_err("md5");
        assert!(matches!(err, Error::InvalidFingerprint(_)));

        // wrong decoded length
        let err = format!("{PREFIX}0:sha256:h").parse::<DidX509>().expect_err("short");
        assert!(matches!(err, Error::InvalidFingerprint(_)));

        // sha384 fingerprint declared as sha256
        let err = format!("{PREFIX}0:sha384:{FINGERPRINT}").parse::<DidX509>().expect_err("len");
        assert!(matches!(err, Error::InvalidFingerprint(_)));

        // not base64url
        let err = format!("{PREFIX}0:sha256:!!!!").parse::<DidX509>().expect_err("encoding");
        assert!(matches!(err, Error::InvalidFingerprint(_)));

        // missing fingerprint part entirely
        let err = format!("{PREFIX}0:sha256").parse::<DidX509>().expect_err("missing");
        assert!(matches!(err, Error::InvalidFingerprint(_)));
    }

    #[test]
    fn unknown_policy_parses() {
        // unknown names survive parsing and only fail at evaluation time,
        // so fingerprint errors always take precedence
        let did = format!("{PREFIX}0:sha256:{FINGERPRINT}::email:bob%40example.com");
        let parsed: DidX509 = did.parse().expect("should parse");
        assert_eq!(parsed.policies[0], Policy::Unknown { name: "email".to_string() });
    }

    #[test]
    fn hash_alg_round_trip() {
        for alg in [HashAlg::Sha256, HashAlg::Sha384, HashAlg::Sha512] {
            let parsed = alg.to_string().parse::<HashAlg>().expect("should parse");
            assert_eq!(parsed, alg);
            assert_eq!(alg.digest(b"abc").len(), alg.size());
        }
    }
}
