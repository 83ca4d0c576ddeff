// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Content digests of the files of a pass.

use {
    crate::{
        archive::{is_reserved_name, PASS_JSON},
        error::PassError,
    },
    log::debug,
    serde::{Deserialize, Serialize},
    std::collections::BTreeMap,
};

/// Compute the hex encoded SHA-1 digest of data.
///
/// SHA-1 is what wallet applications recompute when validating a pass.
pub fn sha1_hex(data: &[u8]) -> String {
    hex::encode(ring::digest::digest(&ring::digest::SHA1_FOR_LEGACY_USE_ONLY, data).as_ref())
}

/// Mapping of file name to hex content digest.
///
/// Keys are sorted, making `manifest.json` reproducible.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Manifest(BTreeMap<String, String>);

impl Manifest {
    /// Compute the manifest of a pass document and its asset files.
    pub fn build<'a>(
        pass_json: &[u8],
        assets: impl IntoIterator<Item = (&'a String, &'a Vec<u8>)>,
    ) -> Result<Self, PassError> {
        let mut digests = BTreeMap::new();
        digests.insert(PASS_JSON.to_string(), sha1_hex(pass_json));

        for (name, data) in assets {
            if is_reserved_name(name) {
                return Err(PassError::ReservedFileName(name.clone()));
            }

            let digest = sha1_hex(data);
            debug!("{} {}", digest, name);
            if digests.insert(name.clone(), digest).is_some() {
                return Err(PassError::DuplicateFile(name.clone()));
            }
        }

        Ok(Self(digests))
    }

    /// Parse `manifest.json` content.
    pub fn from_json(data: &[u8]) -> Result<Self, PassError> {
        serde_json::from_slice(data).map_err(PassError::MalformedManifest)
    }

    /// Serialize to `manifest.json` content.
    pub fn to_json(&self) -> Result<Vec<u8>, PassError> {
        serde_json::to_vec(self).map_err(PassError::Json)
    }

    /// Obtain the hex digest recorded for a file.
    pub fn digest(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(|s| s.as_str())
    }

    /// Iterate over `(name, hex digest)` entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
