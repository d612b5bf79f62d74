//! # did:x509 Resolver
//!
//! Resolution of `did:x509` identifiers. The `did:x509` method binds a
//! DID to an X.509 certificate chain: the identifier embeds a digest of
//! one certificate in the chain (the trust anchor) together with a list
//! of policies the chain's leaf certificate must satisfy — subject name
//! fields, subject alternative names, extended key usages, or an OIDC
//! issuer extension.
//!
//! Resolution checks the trust anchor and every policy, and only when all
//! of them hold produces a DID document for the leaf key ([`resolve`]) or
//! a JWK key document ([`resolve_jwk`]).
//!
//! ```no_run
//! let chain_pem = std::fs::read_to_string("chain.pem").expect("should read");
//! let document = did_x509::resolve(
//!     &chain_pem,
//!     "did:x509:0:sha256:WE4P5dd8DnLHSkyHaIjhp4udlkF9LqoKwCvu9gl38jk::subject:CN:Acme%20Inc",
//!     true,
//! )?;
//! # Ok::<(), did_x509::Error>(())
//! ```
//!
//! Resolution does **not** verify the signatures linking successive chain
//! certificates, validity periods, or revocation. Callers must establish
//! those properties before trusting a resolved document.
//!
//! See the [did:x509 method specification](https://github.com/microsoft/did-x509)
//! for more.

mod chain;
mod document;
mod error;
mod identifier;
mod jwk;
mod policy;
mod resolve;

pub use self::chain::Certificate;
pub use self::document::{CONTEXT, Document, MethodType, VerificationMethod};
pub use self::error::Error;
pub use self::identifier::{DidX509, HashAlg, PREFIX};
pub use self::jwk::PublicKeyJwk;
pub use self::policy::Policy;
pub use self::resolve::{resolve, resolve_document, resolve_jwk};

/// Crate result type, defaulting to the crate [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
