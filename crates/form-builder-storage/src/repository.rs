//! Form repository over a single key-value slot
//!
//! All schemas live in one JSON array. Every write reads the whole
//! collection, changes it in memory and writes it back; the last writer
//! wins. The `try_*` methods report failures, the plain methods log them and
//! fall back to an empty/absent result.

use std::sync::Arc;

use form_builder_core::{EngineConfig, FormSchema, DEFAULT_STORAGE_KEY};

use crate::error::StorageResult;
use crate::store::{FileStore, KeyValueStore, MemoryStore};

/// Persistence gateway for form schemas
#[derive(Debug, Clone)]
pub struct FormRepository {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl FormRepository {
    /// Repository using the default storage key
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Open the store described by the config: file-backed when `data_dir` is set
    pub fn from_config(config: &EngineConfig) -> StorageResult<Self> {
        let store: Arc<dyn KeyValueStore> = match &config.data_dir {
            Some(dir) => Arc::new(FileStore::new(dir)?),
            None => Arc::new(MemoryStore::new()),
        };
        Ok(Self::with_key(store, config.storage_key.clone()))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Decode the whole collection; an empty slot is an empty collection
    pub fn try_list(&self) -> StorageResult<Vec<FormSchema>> {
        match self.store.get(&self.key)? {
            Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    /// All stored forms; fails closed to an empty list
    pub fn list(&self) -> Vec<FormSchema> {
        self.try_list().unwrap_or_else(|e| {
            tracing::error!(key = %self.key, error = %e, "Error loading forms");
            Vec::new()
        })
    }

    /// Stored forms, newest first
    pub fn list_recent(&self) -> Vec<FormSchema> {
        let mut forms = self.list();
        forms.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        forms
    }

    pub fn try_get(&self, id: &str) -> StorageResult<Option<FormSchema>> {
        Ok(self.try_list()?.into_iter().find(|f| f.id == id))
    }

    pub fn get(&self, id: &str) -> Option<FormSchema> {
        self.list().into_iter().find(|f| f.id == id)
    }

    fn write_all(&self, forms: &[FormSchema]) -> StorageResult<()> {
        let raw = serde_json::to_string(forms)?;
        self.store.set(&self.key, &raw)
    }

    /// Insert or replace a form by id
    ///
    /// Fields are sorted and renumbered before the form is written.
    pub fn try_save(&self, form: &FormSchema) -> StorageResult<()> {
        let mut form = form.clone();
        form.normalize_order();

        let mut forms = self.try_list()?;
        forms.retain(|f| f.id != form.id);
        forms.push(form);
        self.write_all(&forms)?;

        tracing::info!(key = %self.key, forms = forms.len(), "Form saved");
        Ok(())
    }

    /// Save, logging and swallowing failures; returns whether it succeeded
    pub fn save(&self, form: &FormSchema) -> bool {
        match self.try_save(form) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(form_id = %form.id, error = %e, "Error saving form");
                false
            }
        }
    }

    /// Remove a form by id; missing ids are a no-op
    pub fn try_delete(&self, id: &str) -> StorageResult<()> {
        let mut forms = self.try_list()?;
        let before = forms.len();
        forms.retain(|f| f.id != id);
        if forms.len() == before {
            tracing::debug!(form_id = id, "Delete of unknown form ignored");
        }
        self.write_all(&forms)
    }

    /// Delete, logging and swallowing failures; returns whether it succeeded
    pub fn delete(&self, id: &str) -> bool {
        match self.try_delete(id) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(form_id = id, error = %e, "Error deleting form");
                false
            }
        }
    }

    /// Drop the whole collection
    pub fn clear(&self) -> StorageResult<()> {
        self.store.remove(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_builder_core::{Field, FieldType};

    fn repo() -> FormRepository {
        FormRepository::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_empty_slot_lists_nothing() {
        let repo = repo();
        assert!(repo.try_list().unwrap().is_empty());
        assert!(repo.get("form_x").is_none());
    }

    #[test]
    fn test_save_upserts_by_id() {
        let repo = repo();
        let mut form = FormSchema::new("Feedback").with_id("form_1");
        assert!(repo.save(&form));

        form.name = "Feedback v2".to_string();
        assert!(repo.save(&form));

        let forms = repo.list();
        assert_eq!(forms.len(), 1);
        assert_eq!(forms[0].name, "Feedback v2");
    }

    #[test]
    fn test_save_normalizes_field_order() {
        let repo = repo();
        let mut form = FormSchema::new("Ordered").with_id("form_1");
        let mut b = Field::new("b", FieldType::Text, "B");
        b.order = 7;
        let mut a = Field::new("a", FieldType::Text, "A");
        a.order = 2;
        form.fields = vec![b, a];

        repo.try_save(&form).unwrap();
        let stored = repo.try_get("form_1").unwrap().unwrap();
        let ids: Vec<(&str, usize)> = stored.fields.iter().map(|f| (f.id.as_str(), f.order)).collect();
        assert_eq!(ids, vec![("a", 0), ("b", 1)]);
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let repo = repo();
        assert!(repo.delete("nothing"));
        repo.try_save(&FormSchema::new("Keep").with_id("keep")).unwrap();
        assert!(repo.delete("nothing"));
        assert_eq!(repo.list().len(), 1);
        assert!(repo.delete("keep"));
        assert!(repo.list().is_empty());
    }

    #[test]
    fn test_corrupt_slot_fails_closed() {
        let store = Arc::new(MemoryStore::new());
        store.set(DEFAULT_STORAGE_KEY, "{not json").unwrap();
        let repo = FormRepository::new(store);
        assert!(repo.try_list().is_err());
        assert!(repo.list().is_empty());
        assert!(!repo.save(&FormSchema::new("Lost")));
        assert!(!repo.delete("anything"));
    }

    #[test]
    fn test_from_config_uses_memory_without_data_dir() {
        let config = EngineConfig::builder().storage_key("surveys").build();
        let repo = FormRepository::from_config(&config).unwrap();
        assert_eq!(repo.key(), "surveys");
        assert!(repo.save(&FormSchema::new("s")));
        assert_eq!(repo.list().len(), 1);
    }
}
