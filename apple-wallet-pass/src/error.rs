// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    cryptographic_message_syntax::CmsError, thiserror::Error,
    x509_certificate::X509CertificateError,
};

/// Broad classification of a [PassError].
///
/// Each pipeline stage fails with errors of a single kind, so the kind
/// identifies which stage rejected the input and what corrective action
/// applies.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Pass content cannot be represented as JSON.
    Serialization,
    /// A certificate or private key is malformed or unusable.
    Credential,
    /// The passphrase failed to decrypt the private key.
    Authentication,
    /// The cryptographic library failed to produce a signature.
    Signing,
    /// The archive could not be written to or read from its sink.
    Archive,
    /// The bundle violates a precondition of the pipeline.
    Precondition,
    /// A finished pass failed verification.
    Verification,
}

/// Unified error type for building and verifying wallet passes.
#[derive(Debug, Error)]
pub enum PassError {
    #[error("JSON serialization error: {0}")]
    Json(serde_json::Error),

    #[error("field {0} has a non-finite numeric value")]
    NonFiniteNumber(String),

    #[error("not a valid decimal number: {0:?}")]
    InvalidDecimal(String),

    #[error("error decoding PEM data for {0}: {1}")]
    Pem(&'static str, pem::PemError),

    #[error("unexpected PEM record for {0}: {1}")]
    UnexpectedPemTag(&'static str, String),

    #[error("error parsing {0}: {1}")]
    Certificate(&'static str, X509CertificateError),

    #[error("error parsing private key: {0}")]
    PrivateKey(String),

    #[error("PKCS#12 parse error: {0}")]
    Pkcs12(String),

    #[error("private key does not correspond to the signing certificate")]
    KeyCertificateMismatch,

    #[error("incorrect passphrase for encrypted private key")]
    BadPassphrase,

    #[error("incorrect passphrase for PKCS#12 data")]
    Pkcs12BadPassphrase,

    #[error("CMS error: {0}")]
    Cms(CmsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("file name is reserved for pass metadata: {0}")]
    ReservedFileName(String),

    #[error("file already present in pass: {0}")]
    DuplicateFile(String),

    #[error("file name is empty")]
    EmptyFileName,

    #[error("duplicate field key {key} in {group}")]
    DuplicateFieldKey { group: &'static str, key: String },

    #[error("required pass attribute is empty: {0}")]
    MissingRequiredAttribute(&'static str),

    #[error("pass archive is missing {0}")]
    MissingArchiveEntry(String),

    #[error("pass archive entry is not listed in manifest: {0}")]
    UnlistedArchiveEntry(String),

    #[error("digest mismatch for {0}")]
    DigestMismatch(String),

    #[error("manifest.json is malformed: {0}")]
    MalformedManifest(serde_json::Error),

    #[error("signature embeds the signed content; a detached signature is required")]
    SignatureNotDetached,

    #[error("signature has no signers")]
    SignatureNoSigners,

    #[error("signature verification failed: {0}")]
    SignatureVerification(CmsError),

    #[error("signer certificate is not embedded in the signature")]
    SignerCertificateNotEmbedded,

    #[error("no embedded CA certificate issued signer certificate {0}")]
    SignerCertificateNotIssued(String),
}

impl PassError {
    /// Obtain the [ErrorKind] of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Json(_) | Self::NonFiniteNumber(_) | Self::InvalidDecimal(_) => {
                ErrorKind::Serialization
            }
            Self::Pem(_, _)
            | Self::UnexpectedPemTag(_, _)
            | Self::Certificate(_, _)
            | Self::PrivateKey(_)
            | Self::Pkcs12(_)
            | Self::KeyCertificateMismatch => ErrorKind::Credential,
            Self::BadPassphrase | Self::Pkcs12BadPassphrase => ErrorKind::Authentication,
            Self::Cms(_) => ErrorKind::Signing,
            Self::Io(_) | Self::Zip(_) => ErrorKind::Archive,
            Self::ReservedFileName(_)
            | Self::DuplicateFile(_)
            | Self::EmptyFileName
            | Self::DuplicateFieldKey { .. }
            | Self::MissingRequiredAttribute(_) => ErrorKind::Precondition,
            Self::MissingArchiveEntry(_)
            | Self::UnlistedArchiveEntry(_)
            | Self::DigestMismatch(_)
            | Self::MalformedManifest(_)
            | Self::SignatureNotDetached
            | Self::SignatureNoSigners
            | Self::SignatureVerification(_)
            | Self::SignerCertificateNotEmbedded
            | Self::SignerCertificateNotIssued(_) => ErrorKind::Verification,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(PassError::BadPassphrase.kind(), ErrorKind::Authentication);
        assert_eq!(
            PassError::KeyCertificateMismatch.kind(),
            ErrorKind::Credential
        );
        assert_eq!(
            PassError::ReservedFileName("signature".into()).kind(),
            ErrorKind::Precondition
        );
        assert_eq!(
            PassError::NonFiniteNumber("price".into()).kind(),
            ErrorKind::Serialization
        );
        assert_eq!(
            PassError::Io(std::io::Error::new(std::io::ErrorKind::Other, "full")).kind(),
            ErrorKind::Archive
        );
    }
}
