// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Detached CMS signatures over `manifest.json`.

use {
    crate::{credentials::SigningCredentials, error::PassError},
    cryptographic_message_syntax::{SignedDataBuilder, SignerBuilder},
    log::debug,
    x509_certificate::KeyInfoSigner,
};

/// Sign manifest content, producing the content of the `signature` file.
///
/// The result is a DER encoded CMS `SignedData` with a SHA-256 message
/// digest. The manifest itself is not embedded. The signer and CA
/// certificates are included so the signature can be validated without
/// obtaining them separately.
pub fn sign_manifest(
    manifest: &[u8],
    credentials: &SigningCredentials,
) -> Result<Vec<u8>, PassError> {
    let signer = SignerBuilder::new(
        credentials.signing_key() as &dyn KeyInfoSigner,
        credentials.signer_certificate().clone(),
    );

    let signature = SignedDataBuilder::default()
        .content_external(manifest.to_vec())
        .signer(signer)
        .certificate(credentials.ca_certificate().clone())
        .build_der()
        .map_err(PassError::Cms)?;

    debug!("produced {} byte manifest signature", signature.len());

    Ok(signature)
}
