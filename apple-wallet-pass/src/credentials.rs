// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Loading of the certificates and key used to sign passes.

Passes are signed with a Pass Type ID certificate issued by the wallet
platform's certificate authority (WWDR). Signing requires:

* The Pass Type ID certificate.
* The private key of that certificate.
* The certificate of the authority that issued it.

Certificates are accepted as PEM or DER. Private keys are accepted as
PKCS#8, either plain (`PRIVATE KEY`) or password protected
(`ENCRYPTED PRIVATE KEY`), in PEM or DER form. Unencrypted PKCS#1 RSA
keys (`RSA PRIVATE KEY`) are accepted in PEM form. Alternatively the
certificate and key can be read from a PKCS#12 export, which is the form
produced by exporting a certificate from `Keychain Access`.
*/

use {
    crate::error::PassError,
    log::warn,
    pkcs8::{der::Encode, EncryptedPrivateKeyInfo, PrivateKeyInfo},
    x509_certificate::{CapturedX509Certificate, InMemorySigningKeyPair, Sign},
};

const PEM_CERTIFICATE: &str = "CERTIFICATE";
const PEM_PRIVATE_KEY: &str = "PRIVATE KEY";
const PEM_ENCRYPTED_PRIVATE_KEY: &str = "ENCRYPTED PRIVATE KEY";
const PEM_RSA_PRIVATE_KEY: &str = "RSA PRIVATE KEY";

fn is_pem(data: &[u8]) -> bool {
    data.windows(11).any(|w| w == b"-----BEGIN ")
}

/// Parse a certificate from PEM or DER data.
///
/// `what` describes the certificate in error messages.
pub fn parse_certificate(
    what: &'static str,
    data: &[u8],
) -> Result<CapturedX509Certificate, PassError> {
    let cert = if is_pem(data) {
        let doc = pem::parse(data).map_err(|e| PassError::Pem(what, e))?;

        if doc.tag() != PEM_CERTIFICATE {
            return Err(PassError::UnexpectedPemTag(what, doc.tag().to_string()));
        }

        CapturedX509Certificate::from_der(doc.contents())
    } else {
        CapturedX509Certificate::from_der(data)
    };

    cert.map_err(|e| PassError::Certificate(what, e))
}

fn decrypt_private_key(der: &[u8], passphrase: &str) -> Result<InMemorySigningKeyPair, PassError> {
    let info = EncryptedPrivateKeyInfo::try_from(der)
        .map_err(|e| PassError::PrivateKey(format!("invalid encrypted PKCS#8 data: {}", e)))?;

    // A wrong passphrase surfaces as a cipher padding failure, which pkcs5
    // reports as either a decryption or an encryption failure.
    let decrypted = info.decrypt(passphrase).map_err(|e| match e {
        pkcs8::Error::EncryptedPrivateKey(
            pkcs8::pkcs5::Error::UnsupportedAlgorithm { .. }
            | pkcs8::pkcs5::Error::AlgorithmParametersInvalid { .. }
            | pkcs8::pkcs5::Error::NoPbes1CryptSupport,
        ) => PassError::PrivateKey(format!("unable to decrypt key: {}", e)),
        pkcs8::Error::EncryptedPrivateKey(_) => PassError::BadPassphrase,
        e => PassError::PrivateKey(format!("unable to decrypt key: {}", e)),
    })?;

    // Block cipher padding occasionally validates under a wrong passphrase.
    // What comes out is then not a key.
    InMemorySigningKeyPair::from_pkcs8_der(decrypted.as_bytes())
        .map_err(|_| PassError::BadPassphrase)
}

/// Wrap a PKCS#1 RSA private key into PKCS#8.
fn rsa_private_key_to_pkcs8(der: &[u8]) -> Result<Vec<u8>, PassError> {
    pkcs1::RsaPrivateKey::try_from(der)
        .map_err(|e| PassError::PrivateKey(format!("invalid PKCS#1 data: {}", e)))?;

    PrivateKeyInfo::new(pkcs1::ALGORITHM_ID, der)
        .to_der()
        .map_err(|e| PassError::PrivateKey(format!("unable to encode PKCS#8 data: {}", e)))
}

/// Parse a private key from PEM or DER data.
///
/// `passphrase` is only consulted if the key is encrypted.
pub fn parse_private_key(
    data: &[u8],
    passphrase: &str,
) -> Result<InMemorySigningKeyPair, PassError> {
    let plain = |der: &[u8]| {
        InMemorySigningKeyPair::from_pkcs8_der(der)
            .map_err(|e| PassError::PrivateKey(e.to_string()))
    };

    if is_pem(data) {
        let doc = pem::parse(data).map_err(|e| PassError::Pem("signing key", e))?;

        match doc.tag() {
            PEM_PRIVATE_KEY => plain(doc.contents()),
            PEM_ENCRYPTED_PRIVATE_KEY => decrypt_private_key(doc.contents(), passphrase),
            PEM_RSA_PRIVATE_KEY => plain(&rsa_private_key_to_pkcs8(doc.contents())?),
            tag => Err(PassError::UnexpectedPemTag("signing key", tag.to_string())),
        }
    } else if EncryptedPrivateKeyInfo::try_from(data).is_ok() {
        decrypt_private_key(data, passphrase)
    } else {
        plain(data)
    }
}

fn bmp_string(s: &str) -> Vec<u8> {
    let mut bytes = s
        .encode_utf16()
        .flat_map(|c| c.to_be_bytes())
        .collect::<Vec<_>>();
    bytes.extend([0x00, 0x00]);

    bytes
}

/// Extract certificates and a private key from PKCS#12 data.
fn parse_pkcs12(
    data: &[u8],
    passphrase: &str,
) -> Result<(Vec<CapturedX509Certificate>, InMemorySigningKeyPair), PassError> {
    let pfx = p12::PFX::parse(data)
        .map_err(|e| PassError::Pkcs12(format!("data does not appear to be PKCS#12: {:?}", e)))?;

    if !pfx.verify_mac(passphrase) {
        return Err(PassError::Pkcs12BadPassphrase);
    }

    let data = match pfx.auth_safe {
        p12::ContentInfo::Data(data) => data,
        _ => return Err(PassError::Pkcs12("unexpected content info".to_string())),
    };

    let content_infos = yasna::parse_der(&data, |reader| {
        reader.collect_sequence_of(p12::ContentInfo::parse)
    })
    .map_err(|e| PassError::Pkcs12(format!("failed parsing inner content info: {:?}", e)))?;

    let bmp_passphrase = bmp_string(passphrase);

    let mut certificates = vec![];
    let mut signing_key = None;

    for content in content_infos {
        let bags_data = match content {
            p12::ContentInfo::Data(inner) => inner,
            p12::ContentInfo::EncryptedData(encrypted) => {
                encrypted.data(&bmp_passphrase).ok_or_else(|| {
                    PassError::Pkcs12("failed decrypting inner encrypted data".to_string())
                })?
            }
            _ => {
                return Err(PassError::Pkcs12(
                    "unexpected content type in inner data".to_string(),
                ))
            }
        };

        let bags = yasna::parse_ber(&bags_data, |reader| {
            reader.collect_sequence_of(p12::SafeBag::parse)
        })
        .map_err(|e| PassError::Pkcs12(format!("failed parsing safe bags: {:?}", e)))?;

        for bag in bags {
            match bag.bag {
                p12::SafeBagKind::CertBag(p12::CertBag::X509(cert_data)) => {
                    certificates.push(
                        CapturedX509Certificate::from_der(cert_data)
                            .map_err(|e| PassError::Certificate("PKCS#12 certificate", e))?,
                    );
                }
                p12::SafeBagKind::Pkcs8ShroudedKeyBag(key_bag) => {
                    let decrypted = key_bag.decrypt(&bmp_passphrase).ok_or_else(|| {
                        PassError::Pkcs12("failed decrypting shrouded key bag".to_string())
                    })?;

                    signing_key = Some(
                        InMemorySigningKeyPair::from_pkcs8_der(&decrypted)
                            .map_err(|e| PassError::PrivateKey(e.to_string()))?,
                    );
                }
                _ => {
                    return Err(PassError::Pkcs12(
                        "unexpected bag type in inner data".to_string(),
                    ));
                }
            }
        }
    }

    let signing_key =
        signing_key.ok_or_else(|| PassError::Pkcs12("no private key found".to_string()))?;

    Ok((certificates, signing_key))
}

/// Parsed material needed to sign a pass.
///
/// Instances are immutable and can be shared across threads building
/// passes concurrently.
pub struct SigningCredentials {
    signer_certificate: CapturedX509Certificate,
    signing_key: InMemorySigningKeyPair,
    ca_certificate: CapturedX509Certificate,
}

impl SigningCredentials {
    /// Construct an instance from parsed material.
    ///
    /// Errors if the key is not the key of the signer certificate. Logs a
    /// warning if the signer certificate does not appear to be issued by
    /// the CA certificate or is outside its validity window; wallet
    /// applications will reject passes signed this way.
    pub fn new(
        signer_certificate: CapturedX509Certificate,
        signing_key: InMemorySigningKeyPair,
        ca_certificate: CapturedX509Certificate,
    ) -> Result<Self, PassError> {
        if signing_key.public_key_data() != signer_certificate.public_key_data() {
            return Err(PassError::KeyCertificateMismatch);
        }

        let signer_name = signer_certificate
            .subject_common_name()
            .unwrap_or_else(|| "<unknown>".to_string());

        if signer_certificate
            .verify_signed_by_certificate(&ca_certificate)
            .is_err()
        {
            warn!(
                "signing certificate {} does not appear to be issued by {}",
                signer_name,
                ca_certificate
                    .subject_common_name()
                    .unwrap_or_else(|| "<unknown>".to_string())
            );
        }

        if !signer_certificate.time_constraints_valid(None) {
            warn!(
                "signing certificate {} is not valid at the current time (valid {} to {})",
                signer_name,
                signer_certificate.validity_not_before(),
                signer_certificate.validity_not_after()
            );
        }

        Ok(Self {
            signer_certificate,
            signing_key,
            ca_certificate,
        })
    }

    /// Construct an instance from PEM or DER encoded material.
    pub fn from_pem(
        signer_certificate: &[u8],
        signing_key: &[u8],
        passphrase: &str,
        ca_certificate: &[u8],
    ) -> Result<Self, PassError> {
        let signer_certificate = parse_certificate("signer certificate", signer_certificate)?;
        let signing_key = parse_private_key(signing_key, passphrase)?;
        let ca_certificate = parse_certificate("CA certificate", ca_certificate)?;

        Self::new(signer_certificate, signing_key, ca_certificate)
    }

    /// Construct an instance from PKCS#12 data and a PEM or DER CA certificate.
    ///
    /// The PKCS#12 data may hold additional certificates. The one matching
    /// the private key is used as the signer certificate.
    pub fn from_pkcs12(
        data: &[u8],
        passphrase: &str,
        ca_certificate: &[u8],
    ) -> Result<Self, PassError> {
        let (certificates, signing_key) = parse_pkcs12(data, passphrase)?;

        let public_key = signing_key.public_key_data();
        let signer_certificate = certificates
            .into_iter()
            .find(|cert| cert.public_key_data() == public_key)
            .ok_or(PassError::KeyCertificateMismatch)?;

        let ca_certificate = parse_certificate("CA certificate", ca_certificate)?;

        Self::new(signer_certificate, signing_key, ca_certificate)
    }

    pub fn signer_certificate(&self) -> &CapturedX509Certificate {
        &self.signer_certificate
    }

    pub fn signing_key(&self) -> &InMemorySigningKeyPair {
        &self.signing_key
    }

    pub fn ca_certificate(&self) -> &CapturedX509Certificate {
        &self.ca_certificate
    }
}
