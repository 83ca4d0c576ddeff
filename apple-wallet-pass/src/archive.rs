// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reading and writing `.pkpass` zip archives.

use {
    crate::error::PassError,
    log::debug,
    std::{
        collections::{btree_map::Entry, BTreeMap},
        io::{Cursor, Read, Seek, Write},
    },
    zip::{result::ZipError, write::FileOptions, ZipArchive, ZipWriter},
};

/// Name of the pass document.
pub const PASS_JSON: &str = "pass.json";
/// Name of the manifest of file digests.
pub const MANIFEST_JSON: &str = "manifest.json";
/// Name of the detached signature over the manifest.
pub const SIGNATURE: &str = "signature";

/// Names generated by the pipeline which assets cannot use.
pub const RESERVED_NAMES: [&str; 3] = [PASS_JSON, MANIFEST_JSON, SIGNATURE];

/// Upper bound on the buffer reserved up front for an archive entry.
///
/// Declared entry sizes come from the archive itself.
const MAX_RESERVED_ENTRY_SIZE: u64 = 1 << 20;

pub fn is_reserved_name(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// The content of a signed pass archive.
#[derive(Clone, Copy, Debug)]
pub struct ArchiveParts<'a> {
    pub pass_json: &'a [u8],
    pub manifest: &'a [u8],
    pub signature: &'a [u8],
    pub assets: &'a BTreeMap<String, Vec<u8>>,
}

/// Write a pass archive to a sink.
///
/// Entries are written in the order `signature`, `manifest.json`,
/// `pass.json`, followed by assets sorted by name. Entry timestamps are
/// fixed, so identical parts produce identical archives.
///
/// The sink is returned on success.
pub fn write_archive<W: Write + Seek>(sink: W, parts: ArchiveParts<'_>) -> Result<W, PassError> {
    if let Some(name) = parts.assets.keys().find(|name| is_reserved_name(name)) {
        return Err(PassError::ReservedFileName(name.clone()));
    }

    let mut zf = ZipWriter::new(sink);
    let options = FileOptions::default().unix_permissions(0o644);

    let entries = [
        (SIGNATURE, parts.signature),
        (MANIFEST_JSON, parts.manifest),
        (PASS_JSON, parts.pass_json),
    ]
    .into_iter()
    .chain(
        parts
            .assets
            .iter()
            .map(|(name, data)| (name.as_str(), data.as_slice())),
    );

    for (name, data) in entries {
        debug!("writing {} ({} bytes)", name, data.len());
        zf.start_file(name, options)?;
        zf.write_all(data)?;
    }

    Ok(zf.finish()?)
}

/// Read every file of an archive into memory.
///
/// Directory entries are ignored. Duplicate names are an error.
pub fn read_archive(data: &[u8]) -> Result<BTreeMap<String, Vec<u8>>, PassError> {
    let mut za = ZipArchive::new(Cursor::new(data))?;
    let mut files = BTreeMap::new();

    for i in 0..za.len() {
        let mut zf = za.by_index(i)?;

        if zf.is_dir() {
            continue;
        }

        let mut buf = Vec::with_capacity(zf.size().min(MAX_RESERVED_ENTRY_SIZE) as usize);
        zf.read_to_end(&mut buf)?;

        match files.entry(zf.name().to_string()) {
            Entry::Occupied(_) => {
                return Err(ZipError::InvalidArchive("duplicate entry name").into());
            }
            Entry::Vacant(entry) => {
                entry.insert(buf);
            }
        }
    }

    Ok(files)
}

#[cfg(test)]
mod test {
    use {super::*, crate::error::ErrorKind};

    fn assets() -> BTreeMap<String, Vec<u8>> {
        BTreeMap::from([
            ("logo.png".to_string(), b"logo".to_vec()),
            ("icon.png".to_string(), b"icon".to_vec()),
        ])
    }

    #[test]
    fn entry_order_and_content() -> Result<(), PassError> {
        let assets = assets();
        let parts = ArchiveParts {
            pass_json: b"{\"a\":1}",
            manifest: b"{}",
            signature: &[0x30, 0x00],
            assets: &assets,
        };

        let data = write_archive(Cursor::new(Vec::<u8>::new()), parts)?.into_inner();

        let mut za = ZipArchive::new(Cursor::new(&data))?;
        let names = (0..za.len())
            .map(|i| za.by_index(i).map(|f| f.name().to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(
            names,
            vec!["signature", "manifest.json", "pass.json", "icon.png", "logo.png"]
        );

        let files = read_archive(&data)?;
        assert_eq!(files.len(), 5);
        assert_eq!(files["pass.json"], b"{\"a\":1}");
        assert_eq!(files["signature"], vec![0x30, 0x00]);
        assert_eq!(files["logo.png"], b"logo");

        // Fixed timestamps make output reproducible.
        let again = write_archive(Cursor::new(Vec::<u8>::new()), parts)?.into_inner();
        assert_eq!(data, again);

        Ok(())
    }

    #[test]
    fn reserved_asset_rejected() {
        let mut assets = assets();
        assets.insert("signature".to_string(), vec![]);

        let err = write_archive(
            Cursor::new(Vec::<u8>::new()),
            ArchiveParts {
                pass_json: b"{}",
                manifest: b"{}",
                signature: b"",
                assets: &assets,
            },
        )
        .unwrap_err();

        assert!(matches!(err, PassError::ReservedFileName(ref name) if name == "signature"));
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn entries_larger_than_reserved_size() -> Result<(), PassError> {
        let mut assets = assets();
        let big = (0..MAX_RESERVED_ENTRY_SIZE * 2 + 7)
            .map(|i| (i % 251) as u8)
            .collect::<Vec<_>>();
        assets.insert("strip@2x.png".to_string(), big.clone());

        let data = write_archive(
            Cursor::new(Vec::<u8>::new()),
            ArchiveParts {
                pass_json: b"{}",
                manifest: b"{}",
                signature: b"",
                assets: &assets,
            },
        )?
        .into_inner();

        let files = read_archive(&data)?;
        assert_eq!(files["strip@2x.png"], big);

        Ok(())
    }

    #[test]
    fn read_garbage() {
        let err = read_archive(b"not a zip file").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Archive);
    }
}
