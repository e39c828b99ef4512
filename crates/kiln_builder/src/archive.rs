//! Release and stemcell tarball readers.
//!
//! Both archive kinds are gzipped tars carrying a YAML manifest at their root
//! (`release.MF` and `stemcell.MF`). Only that manifest is read.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;
use tar::Archive;
use tracing::debug;

use crate::error::{BuilderError, BuilderResult};
use crate::models::{ReleaseManifest, StemcellManifest};
use crate::reader::{ReleaseManifestReader, StemcellManifestReader};

const RELEASE_MANIFEST: &str = "release.MF";
const STEMCELL_MANIFEST: &str = "stemcell.MF";

/// Reads `release.MF` out of a release tarball.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReleaseTarballReader;

impl ReleaseManifestReader for ReleaseTarballReader {
    fn read(&self, path: &Path) -> BuilderResult<ReleaseManifest> {
        read_manifest(path, RELEASE_MANIFEST)
    }
}

/// Reads `stemcell.MF` out of a stemcell tarball.
#[derive(Debug, Default, Clone, Copy)]
pub struct StemcellTarballReader;

impl StemcellManifestReader for StemcellTarballReader {
    fn read(&self, path: &Path) -> BuilderResult<StemcellManifest> {
        read_manifest(path, STEMCELL_MANIFEST)
    }
}

fn read_manifest<T: DeserializeOwned>(archive_path: &Path, manifest: &'static str) -> BuilderResult<T> {
    debug!("Reading {} from {:?}", manifest, archive_path);

    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(file));

    for entry in archive.entries()? {
        let mut entry = entry?;

        let is_manifest = {
            let entry_path = entry.path()?;
            let relative = entry_path.strip_prefix(".").unwrap_or(&*entry_path);
            relative == Path::new(manifest)
        };
        if !is_manifest {
            continue;
        }

        let mut content = String::new();
        entry.read_to_string(&mut content)?;

        return serde_yaml::from_str(&content).map_err(|source| BuilderError::Unmarshal {
            path: format!("{}:{}", archive_path.display(), manifest),
            source,
        });
    }

    Err(BuilderError::ArchiveManifestMissing {
        manifest,
        archive: archive_path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::tempdir;

    fn write_tarball(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (name, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            builder.append_data(&mut header, name, content.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_read_release_manifest() {
        let temp = tempdir().unwrap();
        let tarball = temp.path().join("cf-release-1.tgz");
        write_tarball(
            &tarball,
            &[
                ("./jobs/router.tgz", "binary"),
                ("./release.MF", "name: cf\nversion: '287'\ncommit_hash: abc123\n"),
            ],
        );

        let manifest = ReleaseTarballReader.read(&tarball).unwrap();
        assert_eq!(manifest.name, "cf");
        assert_eq!(manifest.version, "287");
    }

    #[test]
    fn test_read_stemcell_manifest() {
        let temp = tempdir().unwrap();
        let tarball = temp.path().join("stemcell.tgz");
        write_tarball(
            &tarball,
            &[("stemcell.MF", "name: bosh-warden\nversion: 2332\noperating_system: ubuntu-trusty\n")],
        );

        let manifest = StemcellTarballReader.read(&tarball).unwrap();
        assert_eq!(manifest.version, "2332");
        assert_eq!(manifest.operating_system, "ubuntu-trusty");
    }

    #[test]
    fn test_missing_manifest() {
        let temp = tempdir().unwrap();
        let tarball = temp.path().join("empty-release.tgz");
        write_tarball(&tarball, &[("./README", "nothing here")]);

        let err = ReleaseTarballReader.read(&tarball).unwrap_err();
        assert!(err.to_string().starts_with("could not find release.MF in"));
    }

    #[test]
    fn test_missing_tarball() {
        let temp = tempdir().unwrap();
        let result = StemcellTarballReader.read(&temp.path().join("absent.tgz"));
        assert!(matches!(result, Err(BuilderError::Io(_))));
    }
}
