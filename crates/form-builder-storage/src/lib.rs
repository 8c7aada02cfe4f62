//! Form Builder Storage
//!
//! Persists form schemas as one JSON array under a single key of a
//! key-value store. Loading fails closed to an empty collection; saving and
//! deleting log failures instead of surfacing them.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use form_builder_core::FormSchema;
//! use form_builder_storage::{FormRepository, MemoryStore};
//!
//! let repo = FormRepository::new(Arc::new(MemoryStore::new()));
//! let form = FormSchema::new("Contact");
//! assert!(repo.save(&form));
//! assert_eq!(repo.get(&form.id).map(|f| f.name), Some("Contact".to_string()));
//! ```

pub mod error;
pub mod repository;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use repository::FormRepository;
pub use store::{FileStore, KeyValueStore, MemoryStore};
