// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! File-backed document store

use std::fs::{self, File};

use memmap2::Mmap;
use usda_lite_processing::{DocumentRef, Error, Result, Stage, StageSource, StageStore};

/// Reads scene files through a memory map and writes them back whole.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStageSource;

impl StageSource for FileStageSource {
    fn load(&self, doc: &DocumentRef) -> Result<Stage> {
        let file = File::open(&doc.scene_file)?;
        if file.metadata()?.len() == 0 {
            return Ok(Stage::parse(""));
        }
        // SAFETY: the map lives only for this call and is parsed into an owned
        // `Stage` before it is dropped. `StageStore` calls `load` and `persist`
        // only while holding its cache write lock, so our own writes never
        // overlap a mapping. An outside process truncating the file mid-load
        // is not guarded against.
        let mmap = unsafe { Mmap::map(&file)? };
        let text = std::str::from_utf8(&mmap)
            .map_err(|e| Error::Backend(format!("{}: {}", doc, e)))?;
        Ok(Stage::parse(text))
    }

    fn persist(&self, doc: &DocumentRef, stage: &Stage) -> Result<()> {
        fs::write(&doc.scene_file, stage.to_text())?;
        tracing::debug!(doc = %doc, "Persisted document");
        Ok(())
    }
}

/// A [`StageStore`] over files on disk.
pub fn file_store() -> StageStore {
    StageStore::with_source(FileStageSource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use usda_lite_processing::{DocumentReader, DocumentWriter};

    const SCENE: &str = "#usda 1.0\n(\n    defaultPrim = \"Root\"\n)\n\ndef Xform \"Root\"\n{\n}\n";

    #[test]
    fn test_load_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Scene.usda");
        fs::write(&path, SCENE).unwrap();
        let doc = DocumentRef::new(&path);
        let store = file_store();

        assert_eq!(store.metadata(&doc).unwrap().default_prim.as_deref(), Some("Root"));
        store.set_meters_per_unit(&doc, 0.01).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("metersPerUnit = 0.01"));
        assert!(written.contains("def Xform \"Root\""));
    }

    #[test]
    fn test_refresh_rereads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Scene.usda");
        fs::write(&path, SCENE).unwrap();
        let doc = DocumentRef::new(&path);
        let store = file_store();
        assert_eq!(store.load_tree(&doc).unwrap().len(), 1);

        fs::write(&path, "#usda 1.0\ndef \"A\"\n{\n}\ndef \"B\"\n{\n}\n").unwrap();
        assert_eq!(store.load_tree(&doc).unwrap().len(), 1);
        store.refresh(&doc).unwrap();
        assert_eq!(store.load_tree(&doc).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let doc = DocumentRef::new(dir.path().join("Missing.usda"));
        assert!(matches!(file_store().load_tree(&doc), Err(Error::Io(_))));
    }
}
