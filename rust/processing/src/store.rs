// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stage cache implementing the document boundary
//!
//! [`StageStore`] keeps one [`Stage`] per open document. Stages are loaded
//! on first use from a [`StageSource`] and written back through it after
//! every mutation. A store without a source is purely in memory.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use rustc_hash::FxHashMap;
use usda_lite_core::SceneNode;

use crate::error::{Error, Result};
use crate::interop::{
    DocumentMetadata, DocumentReader, DocumentRef, DocumentWriter, MaterialRecord, PrimAttributes,
    PrimTransform, ReferenceRecord, VariantSetRecord,
};
use crate::stage::Stage;

/// Where stage text comes from and goes to.
pub trait StageSource: Send + Sync {
    fn load(&self, doc: &DocumentRef) -> Result<Stage>;

    fn persist(&self, doc: &DocumentRef, stage: &Stage) -> Result<()>;
}

type Stages = FxHashMap<DocumentRef, Stage>;

pub struct StageStore {
    stages: RwLock<Stages>,
    source: Option<Box<dyn StageSource>>,
}

impl StageStore {
    /// Documents exist only once inserted with [`StageStore::insert_text`].
    pub fn in_memory() -> Self {
        Self {
            stages: RwLock::new(Stages::default()),
            source: None,
        }
    }

    pub fn with_source(source: impl StageSource + 'static) -> Self {
        Self {
            stages: RwLock::new(Stages::default()),
            source: Some(Box::new(source)),
        }
    }

    fn read_lock(&self) -> Result<RwLockReadGuard<'_, Stages>> {
        self.stages
            .read()
            .map_err(|_| Error::Backend("stage cache lock poisoned".to_string()))
    }

    fn write_lock(&self) -> Result<RwLockWriteGuard<'_, Stages>> {
        self.stages
            .write()
            .map_err(|_| Error::Backend("stage cache lock poisoned".to_string()))
    }

    /// Replace a document's stage with parsed `text`.
    pub fn insert_text(&self, doc: &DocumentRef, text: &str) -> Result<()> {
        self.write_lock()?.insert(doc.clone(), Stage::parse(text));
        Ok(())
    }

    /// Current text of a document, loading it when needed.
    pub fn text(&self, doc: &DocumentRef) -> Result<String> {
        self.with_stage(doc, |stage| Ok(stage.to_text()))
    }

    /// Forget a document; the next access reloads it.
    pub fn evict(&self, doc: &DocumentRef) -> Result<()> {
        self.write_lock()?.remove(doc);
        Ok(())
    }

    fn load(&self, doc: &DocumentRef) -> Result<Stage> {
        match &self.source {
            Some(source) => {
                let stage = source.load(doc)?;
                tracing::debug!(doc = %doc, roots = stage.layer().roots.len(), "Loaded stage");
                Ok(stage)
            }
            None => Err(Error::NotFound(doc.to_string())),
        }
    }

    /// Run `f` against a document's stage under the read lock.
    pub fn with_stage<T>(
        &self,
        doc: &DocumentRef,
        f: impl FnOnce(&Stage) -> Result<T>,
    ) -> Result<T> {
        {
            let stages = self.read_lock()?;
            if let Some(stage) = stages.get(doc) {
                return f(stage);
            }
        }
        let mut stages = self.write_lock()?;
        if !stages.contains_key(doc) {
            let stage = self.load(doc)?;
            stages.insert(doc.clone(), stage);
        }
        match stages.get(doc) {
            Some(stage) => f(stage),
            None => Err(Error::NotFound(doc.to_string())),
        }
    }

    /// Run a mutation under the write lock, then persist the result.
    ///
    /// Holding the write lock across the persist serializes writers of the
    /// same document.
    pub fn mutate<T>(
        &self,
        doc: &DocumentRef,
        f: impl FnOnce(&mut Stage) -> Result<T>,
    ) -> Result<T> {
        let mut stages = self.write_lock()?;
        if !stages.contains_key(doc) {
            let stage = self.load(doc)?;
            stages.insert(doc.clone(), stage);
        }
        let stage = stages
            .get_mut(doc)
            .ok_or_else(|| Error::NotFound(doc.to_string()))?;
        let value = f(stage)?;
        if let Some(source) = &self.source {
            source.persist(doc, stage)?;
        }
        Ok(value)
    }
}

impl DocumentReader for StageStore {
    fn refresh(&self, doc: &DocumentRef) -> Result<()> {
        if self.source.is_some() {
            self.evict(doc)?;
        }
        Ok(())
    }

    fn load_tree(&self, doc: &DocumentRef) -> Result<Vec<SceneNode>> {
        self.with_stage(doc, |stage| Ok(stage.composed_roots()))
    }

    fn metadata(&self, doc: &DocumentRef) -> Result<DocumentMetadata> {
        self.with_stage(doc, |stage| Ok(stage.metadata()))
    }

    fn prim_attributes(&self, doc: &DocumentRef, path: &str) -> Result<Option<PrimAttributes>> {
        self.with_stage(doc, |stage| Ok(stage.prim_attributes(path)))
    }

    fn prim_transform(&self, doc: &DocumentRef, path: &str) -> Result<Option<PrimTransform>> {
        self.with_stage(doc, |stage| Ok(stage.prim_transform(path)))
    }

    fn variant_sets(&self, doc: &DocumentRef, scope_path: &str) -> Result<Vec<VariantSetRecord>> {
        self.with_stage(doc, |stage| stage.variant_sets(scope_path))
    }

    fn references(&self, doc: &DocumentRef, path: &str) -> Result<Vec<ReferenceRecord>> {
        self.with_stage(doc, |stage| stage.references(path))
    }

    fn materials(&self, doc: &DocumentRef) -> Result<Vec<MaterialRecord>> {
        self.with_stage(doc, |stage| Ok(stage.materials()))
    }

    fn material_binding(&self, doc: &DocumentRef, path: &str) -> Result<Option<String>> {
        self.with_stage(doc, |stage| stage.material_binding(path))
    }

    fn material_binding_strength(&self, doc: &DocumentRef, path: &str) -> Result<Option<String>> {
        self.with_stage(doc, |stage| stage.material_binding_strength(path))
    }
}

impl DocumentWriter for StageStore {
    fn set_default_prim(&self, doc: &DocumentRef, prim_name: &str) -> Result<()> {
        self.mutate(doc, |stage| stage.set_default_prim(prim_name))
    }

    fn set_meters_per_unit(&self, doc: &DocumentRef, meters_per_unit: f64) -> Result<()> {
        self.mutate(doc, |stage| stage.set_meters_per_unit(meters_per_unit))
    }

    fn set_up_axis(&self, doc: &DocumentRef, axis: &str) -> Result<()> {
        self.mutate(doc, |stage| stage.set_up_axis(axis))
    }

    fn set_prim_transform(
        &self,
        doc: &DocumentRef,
        path: &str,
        transform: &PrimTransform,
    ) -> Result<()> {
        self.mutate(doc, |stage| stage.set_prim_transform(path, transform))
    }

    fn apply_variant_selection(
        &self,
        doc: &DocumentRef,
        scope_path: &str,
        set_name: &str,
        selection: Option<&str>,
        persist: bool,
    ) -> Result<()> {
        if persist {
            self.mutate(doc, |stage| {
                stage.apply_variant_selection(scope_path, set_name, selection, true)
            })
        } else {
            // Session-only: nothing to write back
            self.with_stage(doc, |_| Ok(()))?;
            let mut stages = self.write_lock()?;
            let stage = stages
                .get_mut(doc)
                .ok_or_else(|| Error::NotFound(doc.to_string()))?;
            stage.apply_variant_selection(scope_path, set_name, selection, false)
        }
    }

    fn add_reference(
        &self,
        doc: &DocumentRef,
        path: &str,
        reference: &ReferenceRecord,
    ) -> Result<()> {
        self.mutate(doc, |stage| stage.add_reference(path, reference))
    }

    fn remove_reference(
        &self,
        doc: &DocumentRef,
        path: &str,
        reference: &ReferenceRecord,
    ) -> Result<()> {
        self.mutate(doc, |stage| stage.remove_reference(path, reference))
    }

    fn set_material_binding(
        &self,
        doc: &DocumentRef,
        path: &str,
        material_path: &str,
    ) -> Result<()> {
        self.mutate(doc, |stage| stage.set_material_binding(path, material_path))
    }

    fn clear_material_binding(&self, doc: &DocumentRef, path: &str) -> Result<()> {
        self.mutate(doc, |stage| stage.clear_material_binding(path))
    }

    fn set_component_attribute(
        &self,
        doc: &DocumentRef,
        path: &str,
        type_tag: &str,
        name: &str,
        literal: &str,
    ) -> Result<()> {
        self.mutate(doc, |stage| {
            stage.set_component_attribute(path, type_tag, name, literal)
        })
    }

    fn delete_component_attribute(&self, doc: &DocumentRef, path: &str, name: &str) -> Result<()> {
        self.mutate(doc, |stage| stage.delete_component_attribute(path, name))
    }

    fn ensure_struct_prim(
        &self,
        doc: &DocumentRef,
        parent_path: &str,
        type_name: &str,
        name: &str,
    ) -> Result<String> {
        self.mutate(doc, |stage| stage.ensure_struct_prim(parent_path, type_name, name))
    }

    fn delete_prim(&self, doc: &DocumentRef, path: &str) -> Result<()> {
        self.mutate(doc, |stage| stage.delete_prim(path))
    }

    fn set_prim_active(&self, doc: &DocumentRef, path: &str, active: bool) -> Result<()> {
        self.mutate(doc, |stage| stage.set_prim_active(path, active))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Serves a fixed text and counts persists.
    struct FixedSource {
        text: &'static str,
        persists: Arc<AtomicUsize>,
    }

    impl StageSource for FixedSource {
        fn load(&self, _doc: &DocumentRef) -> Result<Stage> {
            Ok(Stage::parse(self.text))
        }

        fn persist(&self, _doc: &DocumentRef, _stage: &Stage) -> Result<()> {
            self.persists.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn doc() -> DocumentRef {
        DocumentRef::new("/scenes/test.usda")
    }

    #[test]
    fn test_in_memory_requires_insert() {
        let store = StageStore::in_memory();
        assert!(matches!(store.load_tree(&doc()), Err(Error::NotFound(_))));

        store
            .insert_text(&doc(), r#"def Xform "Root" { def Sphere "Ball" {} }"#)
            .unwrap();
        let roots = store.load_tree(&doc()).unwrap();
        assert_eq!(roots[0].children[0].path, "/Root/Ball");
    }

    #[test]
    fn test_writes_persist_through_source() {
        let persists = Arc::new(AtomicUsize::new(0));
        let store = StageStore::with_source(FixedSource {
            text: r#"def Xform "Root" {}"#,
            persists: persists.clone(),
        });

        store
            .set_component_attribute(&doc(), "/Root", "float", "opacity", "0.5")
            .unwrap();
        assert_eq!(persists.load(Ordering::SeqCst), 1);
        assert!(store.text(&doc()).unwrap().contains("float opacity = 0.5"));

        // A failed write does not persist
        assert!(store.delete_prim(&doc(), "/Missing").is_err());
        assert_eq!(persists.load(Ordering::SeqCst), 1);

        // Refresh drops the cached edit and reloads the source text
        store.refresh(&doc()).unwrap();
        assert!(!store.text(&doc()).unwrap().contains("opacity"));
    }

    #[test]
    fn test_session_variant_selection_skips_persist() {
        let persists = Arc::new(AtomicUsize::new(0));
        let store = StageStore::with_source(FixedSource {
            text: r#"def Xform "Root" {
                variantSet "look" = {
                    "A" { def Sphere "Inner" {} }
                    "B" { def Cube "Inner" {} }
                }
            }"#,
            persists: persists.clone(),
        });

        store
            .apply_variant_selection(&doc(), "/Root", "look", Some("B"), false)
            .unwrap();
        assert_eq!(persists.load(Ordering::SeqCst), 0);
        let roots = store.load_tree(&doc()).unwrap();
        assert_eq!(roots[0].children[0].type_name.as_deref(), Some("Cube"));

        store
            .apply_variant_selection(&doc(), "/Root", "look", Some("A"), true)
            .unwrap();
        assert_eq!(persists.load(Ordering::SeqCst), 1);
    }
}
