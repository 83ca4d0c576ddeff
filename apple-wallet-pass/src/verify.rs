// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Verification of signed pass archives.

Verification checks what a wallet application checks when a pass is
installed:

* Every file other than `manifest.json` and `signature` is listed in the
  manifest with a matching SHA-1 digest, and every listed file exists.
* `signature` is a detached CMS signature whose message digest matches
  the `manifest.json` content and whose signatures verify.
* Each signer certificate is embedded in the signature along with a CA
  certificate that issued it.

Trust in the CA certificate itself is not evaluated. The common names of
certificates embedded in the signature are reported so callers can apply
their own policy.
*/

use {
    crate::{
        archive::{read_archive, MANIFEST_JSON, PASS_JSON, SIGNATURE},
        error::PassError,
        manifest::{sha1_hex, Manifest},
    },
    cryptographic_message_syntax::{SignedData, SignerInfo},
    log::debug,
    std::collections::BTreeMap,
};

/// The content of a pass archive that passed verification.
#[derive(Clone, Debug)]
pub struct VerifiedPass {
    files: BTreeMap<String, Vec<u8>>,
    manifest: Manifest,
    certificate_names: Vec<String>,
}

impl VerifiedPass {
    /// Every file of the archive, keyed by name.
    pub fn files(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.files
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Parsed `pass.json`.
    pub fn pass_json(&self) -> Result<serde_json::Value, PassError> {
        let data = self
            .files
            .get(PASS_JSON)
            .ok_or_else(|| PassError::MissingArchiveEntry(PASS_JSON.to_string()))?;

        serde_json::from_slice(data).map_err(PassError::Json)
    }

    /// Common names of certificates embedded in the signature.
    pub fn certificate_names(&self) -> &[String] {
        &self.certificate_names
    }
}

fn required<'a>(files: &'a BTreeMap<String, Vec<u8>>, name: &str) -> Result<&'a [u8], PassError> {
    files
        .get(name)
        .map(|v| v.as_slice())
        .ok_or_else(|| PassError::MissingArchiveEntry(name.to_string()))
}

fn verify_manifest(
    files: &BTreeMap<String, Vec<u8>>,
    manifest: &Manifest,
) -> Result<(), PassError> {
    for (name, data) in files {
        if name == MANIFEST_JSON || name == SIGNATURE {
            continue;
        }

        let expected = manifest
            .digest(name)
            .ok_or_else(|| PassError::UnlistedArchiveEntry(name.clone()))?;

        let actual = sha1_hex(data);
        debug!("{} {}", actual, name);
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(PassError::DigestMismatch(name.clone()));
        }
    }

    if let Some((name, _)) = manifest.iter().find(|(name, _)| !files.contains_key(*name)) {
        return Err(PassError::MissingArchiveEntry(name.to_string()));
    }

    Ok(())
}

fn verify_signer_issued(signed_data: &SignedData, signer: &SignerInfo) -> Result<(), PassError> {
    let (issuer, serial) = signer
        .certificate_issuer_and_serial()
        .ok_or(PassError::SignerCertificateNotEmbedded)?;

    let signer_cert = signed_data
        .certificates()
        .find(|cert| cert.issuer_name() == issuer && cert.serial_number_asn1() == serial)
        .ok_or(PassError::SignerCertificateNotEmbedded)?;

    let issued = signed_data
        .certificates()
        .filter(|cert| cert.constructed_data() != signer_cert.constructed_data())
        .any(|ca| signer_cert.verify_signed_by_certificate(ca).is_ok());

    if issued {
        Ok(())
    } else {
        Err(PassError::SignerCertificateNotIssued(
            signer_cert
                .subject_common_name()
                .unwrap_or_else(|| "<unknown>".to_string()),
        ))
    }
}

fn verify_signature(signature: &[u8], manifest: &[u8]) -> Result<Vec<String>, PassError> {
    let signed_data = SignedData::parse_ber(signature).map_err(PassError::SignatureVerification)?;

    if signed_data.signed_content().is_some() {
        return Err(PassError::SignatureNotDetached);
    }

    let mut signer_count = 0;
    for signer in signed_data.signers() {
        signer
            .verify_message_digest_with_content(manifest)
            .map_err(PassError::SignatureVerification)?;
        signer
            .verify_signature_with_signed_data(&signed_data)
            .map_err(PassError::SignatureVerification)?;
        verify_signer_issued(&signed_data, signer)?;
        signer_count += 1;
    }

    if signer_count == 0 {
        return Err(PassError::SignatureNoSigners);
    }

    Ok(signed_data
        .certificates()
        .filter_map(|cert| cert.subject_common_name())
        .collect())
}

/// Verify a `.pkpass` archive.
pub fn verify_pass(data: &[u8]) -> Result<VerifiedPass, PassError> {
    let files = read_archive(data)?;

    required(&files, PASS_JSON)?;
    let manifest_data = required(&files, MANIFEST_JSON)?;
    let signature = required(&files, SIGNATURE)?;

    let manifest = Manifest::from_json(manifest_data)?;
    verify_manifest(&files, &manifest)?;

    let certificate_names = verify_signature(signature, manifest_data)?;

    Ok(VerifiedPass {
        files,
        manifest,
        certificate_names,
    })
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::{
            archive::{is_reserved_name, write_archive, ArchiveParts},
            bundle::PassIssuer,
            content::ContentBlock,
            credentials::test::test_credentials,
            error::ErrorKind,
            fields::Field,
            pipeline::{PassBuilder, SignedPass},
        },
        cryptographic_message_syntax::{SignedDataBuilder, SignerBuilder},
        std::io::Cursor,
        x509_certificate::KeyInfoSigner,
    };

    fn signed_pass() -> SignedPass {
        let mut content = ContentBlock::generic();
        content
            .add_primary_field(Field::new("member", "Jane Appleseed"))
            .unwrap();

        let mut issuer = PassIssuer::new("T1", "pass.com.example.test", "Example");
        issuer.description = Some("Membership".into());

        let mut bundle = issuer.new_pass(content);
        bundle.add_file("icon.png", b"icon".to_vec()).unwrap();
        bundle.add_file("strip.png", b"strip".to_vec()).unwrap();

        PassBuilder::new(&test_credentials())
            .build(&bundle)
            .unwrap()
    }

    /// Reassemble an archive after changing its files.
    fn rewrite(signed: &SignedPass, f: impl FnOnce(&mut BTreeMap<String, Vec<u8>>)) -> Vec<u8> {
        let mut files = read_archive(signed.archive()).unwrap();
        f(&mut files);

        let pass_json = files.remove(PASS_JSON).unwrap_or_default();
        let manifest = files.remove(MANIFEST_JSON).unwrap_or_default();
        let signature = files.remove(SIGNATURE).unwrap_or_default();

        write_archive(
            Cursor::new(Vec::<u8>::new()),
            ArchiveParts {
                pass_json: &pass_json,
                manifest: &manifest,
                signature: &signature,
                assets: &files,
            },
        )
        .unwrap()
        .into_inner()
    }

    #[test]
    fn valid_pass() -> Result<(), PassError> {
        let signed = signed_pass();
        let verified = verify_pass(signed.archive())?;

        assert_eq!(verified.files().len(), 5);
        assert_eq!(verified.manifest().len(), 3);
        assert_eq!(verified.pass_json()?["description"], "Membership");
        assert!(verified
            .certificate_names()
            .contains(&"Test Worldwide Developer Relations CA".to_string()));
        assert!(verified
            .certificate_names()
            .contains(&"Pass Type ID: pass.com.example.test".to_string()));

        Ok(())
    }

    #[test]
    fn tampered_asset() {
        let signed = signed_pass();
        let data = rewrite(&signed, |files| {
            files.insert("icon.png".to_string(), b"evil".to_vec());
        });

        let err = verify_pass(&data).unwrap_err();
        assert!(matches!(err, PassError::DigestMismatch(ref name) if name == "icon.png"));
        assert_eq!(err.kind(), ErrorKind::Verification);
    }

    #[test]
    fn unlisted_and_missing_entries() {
        let signed = signed_pass();

        let data = rewrite(&signed, |files| {
            files.insert("extra.png".to_string(), vec![]);
        });
        assert!(matches!(
            verify_pass(&data),
            Err(PassError::UnlistedArchiveEntry(ref name)) if name == "extra.png"
        ));

        let data = rewrite(&signed, |files| {
            files.remove("strip.png");
        });
        assert!(matches!(
            verify_pass(&data),
            Err(PassError::MissingArchiveEntry(ref name)) if name == "strip.png"
        ));
    }

    #[test]
    fn tampered_manifest() {
        let signed = signed_pass();

        // Consistent digests, but not the manifest that was signed.
        let data = rewrite(&signed, |files| {
            files.insert("icon.png".to_string(), b"evil".to_vec());
            let assets = files.iter().filter(|(name, _)| !is_reserved_name(name));
            let manifest = Manifest::build(&files[PASS_JSON], assets).unwrap();
            files.insert(MANIFEST_JSON.to_string(), manifest.to_json().unwrap());
        });

        let err = verify_pass(&data).unwrap_err();
        assert!(matches!(err, PassError::SignatureVerification(_)));
    }

    #[test]
    fn corrupt_signature() {
        let signed = signed_pass();
        let data = rewrite(&signed, |files| {
            files.insert(SIGNATURE.to_string(), b"not a signature".to_vec());
        });

        assert!(matches!(
            verify_pass(&data),
            Err(PassError::SignatureVerification(_))
        ));
    }

    #[test]
    fn signature_without_ca_certificate() {
        let creds = test_credentials();
        let signed = signed_pass();

        let data = rewrite(&signed, |files| {
            let signer = SignerBuilder::new(
                creds.signing_key() as &dyn KeyInfoSigner,
                creds.signer_certificate().clone(),
            );
            let signature = SignedDataBuilder::default()
                .content_external(files[MANIFEST_JSON].clone())
                .signer(signer)
                .build_der()
                .unwrap();
            files.insert(SIGNATURE.to_string(), signature);
        });

        let err = verify_pass(&data).unwrap_err();
        assert!(matches!(
            err,
            PassError::SignerCertificateNotIssued(ref name)
                if name == "Pass Type ID: pass.com.example.test"
        ));
        assert_eq!(err.kind(), ErrorKind::Verification);
    }
}
