// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Filesystem resource importer

use std::fs;
use std::path::{Component, Path, PathBuf};

use usda_lite_core::unique_name;

use crate::error::{Error, Result};
use crate::interop::{DocumentRef, ImportedResource, ResourceImporter};

/// Copies resources into `<asset_root>/<asset_dir_name>/`.
#[derive(Debug, Clone)]
pub struct FsResourceImporter {
    pub asset_dir_name: String,
}

impl FsResourceImporter {
    pub fn new(asset_dir_name: impl Into<String>) -> Self {
        Self {
            asset_dir_name: asset_dir_name.into(),
        }
    }
}

impl Default for FsResourceImporter {
    fn default() -> Self {
        Self::new("Assets")
    }
}

/// `dir/file`, or `dir/stem_N.ext` with the smallest free `N`.
pub fn collision_free_destination(dir: &Path, file_name: &str) -> PathBuf {
    let file = Path::new(file_name);
    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    let extension = file.extension().and_then(|e| e.to_str());
    let with_extension = |base: &str| match extension {
        Some(ext) => format!("{}.{}", base, ext),
        None => base.to_string(),
    };

    let base = unique_name(stem, |candidate| dir.join(with_extension(candidate)).exists());
    dir.join(with_extension(&base))
}

/// `target` relative to directory `from`, `/`-separated, walking up with
/// `..` to the common ancestor. Paths inside `from` get a `./` prefix.
pub fn relative_path(from: &Path, target: &Path) -> String {
    let from: Vec<Component<'_>> = from.components().collect();
    let target: Vec<Component<'_>> = target.components().collect();
    let common = from
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = vec!["..".to_string(); from.len() - common];
    parts.extend(
        target[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    let joined = parts.join("/");
    if joined.starts_with("..") {
        joined
    } else {
        format!("./{}", joined)
    }
}

impl ResourceImporter for FsResourceImporter {
    fn import(&self, source: &Path, doc: &DocumentRef) -> Result<ImportedResource> {
        let file_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::NotFound(source.display().to_string()))?;
        if !source.is_file() {
            return Err(Error::NotFound(source.display().to_string()));
        }

        let dir = doc.asset_root.join(&self.asset_dir_name);
        fs::create_dir_all(&dir)?;
        let destination = collision_free_destination(&dir, file_name);
        fs::copy(source, &destination)?;

        let scene_dir = doc.scene_file.parent().unwrap_or_else(|| Path::new(""));
        let relative_path = relative_path(scene_dir, &destination);
        tracing::info!(
            source = %source.display(),
            destination = %destination.display(),
            relative = %relative_path,
            "Imported resource"
        );
        Ok(ImportedResource {
            destination,
            relative_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/a/scenes"), Path::new("/a/scenes/Assets/x.wav")),
            "./Assets/x.wav"
        );
        assert_eq!(
            relative_path(Path::new("/a/scenes/levels"), Path::new("/a/Assets/x.wav")),
            "../../Assets/x.wav"
        );
    }

    #[test]
    fn test_import_avoids_collisions() {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("Ding Dong.wav");
        fs::write(&source, b"RIFF").unwrap();
        let doc = DocumentRef::new(root.path().join("Scene.usda"));
        let importer = FsResourceImporter::default();

        let first = importer.import(&source, &doc).unwrap();
        assert_eq!(first.destination, root.path().join("Assets").join("Ding Dong.wav"));
        assert_eq!(first.relative_path, "./Assets/Ding Dong.wav");

        let second = importer.import(&source, &doc).unwrap();
        assert_eq!(second.destination, root.path().join("Assets").join("Ding Dong_1.wav"));
        assert_eq!(fs::read(&second.destination).unwrap(), b"RIFF");

        let third = importer.import(&source, &doc).unwrap();
        assert!(third.relative_path.ends_with("Ding Dong_2.wav"));
    }

    #[test]
    fn test_nested_scene_walks_up() {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("tone.mp3");
        fs::write(&source, b"ID3").unwrap();
        let doc = DocumentRef::new(root.path().join("levels").join("One.usda"))
            .with_asset_root(root.path());

        let imported = FsResourceImporter::new("Audio").import(&source, &doc).unwrap();
        assert_eq!(imported.relative_path, "../Audio/tone.mp3");
    }

    #[test]
    fn test_missing_source() {
        let root = tempfile::tempdir().unwrap();
        let doc = DocumentRef::new(root.path().join("Scene.usda"));
        let result = FsResourceImporter::default().import(&root.path().join("nope.wav"), &doc);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
