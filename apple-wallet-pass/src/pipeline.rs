// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Turning a [PassBundle] into a signed `.pkpass` archive.

Building a pass runs these stages in order:

1. Serialize the bundle to `pass.json`.
2. Compute the manifest of SHA-1 digests of `pass.json` and every asset.
3. Sign `manifest.json` with a detached CMS signature.
4. Write `signature`, `manifest.json`, `pass.json` and the assets to a
   zip archive.

The first failing stage aborts the build and its error is returned
unchanged, so [crate::PassError::kind] identifies the stage. The bundle
is never modified.
*/

use {
    crate::{
        archive::{write_archive, ArchiveParts},
        bundle::PassBundle,
        credentials::SigningCredentials,
        error::PassError,
        manifest::Manifest,
        pass_json::serialize_pass,
        signing::sign_manifest,
    },
    log::info,
    std::{
        io::{Cursor, Seek, Write},
        path::Path,
    },
};

/// A signed pass.
#[derive(Clone, Debug)]
pub struct SignedPass {
    pass_json: Vec<u8>,
    manifest: Vec<u8>,
    signature: Vec<u8>,
    archive: Vec<u8>,
}

impl SignedPass {
    /// Content of `pass.json`.
    pub fn pass_json(&self) -> &[u8] {
        &self.pass_json
    }

    /// Content of `manifest.json`.
    pub fn manifest(&self) -> &[u8] {
        &self.manifest
    }

    /// Content of `signature`.
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// The `.pkpass` archive.
    pub fn archive(&self) -> &[u8] {
        &self.archive
    }

    pub fn into_archive(self) -> Vec<u8> {
        self.archive
    }
}

struct SignedParts {
    pass_json: Vec<u8>,
    manifest: Vec<u8>,
    signature: Vec<u8>,
}

/// Builds signed passes with a set of credentials.
///
/// A builder holds no mutable state. One instance can build many passes,
/// including from multiple threads at once.
#[derive(Clone, Copy)]
pub struct PassBuilder<'a> {
    credentials: &'a SigningCredentials,
}

impl<'a> PassBuilder<'a> {
    pub fn new(credentials: &'a SigningCredentials) -> Self {
        Self { credentials }
    }

    fn sign(&self, bundle: &PassBundle) -> Result<SignedParts, PassError> {
        bundle.validate()?;

        info!("serializing pass {}", bundle.serial_number);
        let pass_json = serialize_pass(bundle)?;

        info!("computing manifest of {} files", bundle.files().len() + 1);
        let manifest = Manifest::build(&pass_json, bundle.files())?.to_json()?;

        info!(
            "signing manifest with {}",
            self.credentials
                .signer_certificate()
                .subject_common_name()
                .unwrap_or_else(|| "<unknown>".to_string())
        );
        let signature = sign_manifest(&manifest, self.credentials)?;

        Ok(SignedParts {
            pass_json,
            manifest,
            signature,
        })
    }

    /// Build a pass into a writable and seekable sink.
    ///
    /// The sink is returned on success. Nothing is written to the sink if
    /// a stage before archive assembly fails.
    pub fn build_to_writer<W: Write + Seek>(
        &self,
        bundle: &PassBundle,
        sink: W,
    ) -> Result<W, PassError> {
        let parts = self.sign(bundle)?;

        info!("writing pass archive");
        write_archive(
            sink,
            ArchiveParts {
                pass_json: &parts.pass_json,
                manifest: &parts.manifest,
                signature: &parts.signature,
                assets: bundle.files(),
            },
        )
    }

    /// Build a pass in memory.
    pub fn build(&self, bundle: &PassBundle) -> Result<SignedPass, PassError> {
        let parts = self.sign(bundle)?;

        info!("writing pass archive");
        let archive = write_archive(
            Cursor::new(Vec::<u8>::new()),
            ArchiveParts {
                pass_json: &parts.pass_json,
                manifest: &parts.manifest,
                signature: &parts.signature,
                assets: bundle.files(),
            },
        )?
        .into_inner();

        Ok(SignedPass {
            pass_json: parts.pass_json,
            manifest: parts.manifest,
            signature: parts.signature,
            archive,
        })
    }

    /// Build a pass and write it to a file.
    ///
    /// The file is only created once the archive is complete.
    pub fn build_to_path(
        &self,
        bundle: &PassBundle,
        path: impl AsRef<Path>,
    ) -> Result<SignedPass, PassError> {
        let path = path.as_ref();
        let signed = self.build(bundle)?;

        info!("writing {}", path.display());
        std::fs::write(path, signed.archive())?;

        Ok(signed)
    }
}

/// Build a signed pass from encoded credentials.
///
/// Certificates are PEM or DER. The signing key is PKCS#8, optionally
/// encrypted with `passphrase`. The archive is written to `sink` and
/// also returned as part of the [SignedPass].
pub fn build(
    bundle: &PassBundle,
    signer_certificate: &[u8],
    signing_key: &[u8],
    passphrase: &str,
    ca_certificate: &[u8],
    sink: &mut impl Write,
) -> Result<SignedPass, PassError> {
    let credentials =
        SigningCredentials::from_pem(signer_certificate, signing_key, passphrase, ca_certificate)?;

    let signed = PassBuilder::new(&credentials).build(bundle)?;
    sink.write_all(signed.archive())?;
    sink.flush()?;

    Ok(signed)
}
