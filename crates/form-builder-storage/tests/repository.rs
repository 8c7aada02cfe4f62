use std::sync::Arc;

use chrono::{Duration, Utc};
use form_builder_core::{
    DerivedConfig, EngineConfig, Field, FieldOption, FieldType, FormSchema, ValidationRule,
};
use form_builder_storage::{FileStore, FormRepository, KeyValueStore, MemoryStore};
use tempfile::TempDir;

fn signup() -> FormSchema {
    FormSchema::new("Signup")
        .with_field(
            Field::new("email", FieldType::Text, "Email")
                .with_required(true)
                .with_rule(ValidationRule::required("Email is required"))
                .with_rule(ValidationRule::email("Invalid email")),
        )
        .with_field(Field::new("dob", FieldType::Date, "Date of birth"))
        .with_field(
            Field::new("age", FieldType::Number, "Age").with_derived(DerivedConfig::new(
                ["dob"],
                "new Date().getFullYear() - new Date(dob).getFullYear()",
            )),
        )
        .with_field(Field::new("plan", FieldType::Select, "Plan").with_options([
            FieldOption::new("free", "Free"),
            FieldOption::new("pro", "Pro"),
        ]))
}

#[test]
fn test_save_then_get_round_trips() {
    let repo = FormRepository::new(Arc::new(MemoryStore::new()));
    let form = signup();

    assert!(repo.save(&form));
    let stored = repo.get(&form.id).expect("form stored");
    assert_eq!(stored, form);
    assert!(stored.field("age").unwrap().is_derived());
}

#[test]
fn test_save_renumbers_sparse_order() {
    let repo = FormRepository::new(Arc::new(MemoryStore::new()));
    let mut form = signup();
    for (i, field) in form.fields.iter_mut().enumerate() {
        field.order = i * 10;
    }

    repo.try_save(&form).unwrap();
    let stored = repo.try_get(&form.id).unwrap().unwrap();
    let orders: Vec<usize> = stored.fields.iter().map(|f| f.order).collect();
    assert_eq!(orders, vec![0, 1, 2, 3]);

    form.normalize_order();
    assert_eq!(stored, form);
}

#[test]
fn test_upsert_keeps_other_forms() {
    let repo = FormRepository::new(Arc::new(MemoryStore::new()));
    let a = FormSchema::new("A").with_id("form_a");
    let mut b = FormSchema::new("B").with_id("form_b");
    repo.try_save(&a).unwrap();
    repo.try_save(&b).unwrap();

    b.push_field(Field::new("note", FieldType::Textarea, "Note"));
    repo.try_save(&b).unwrap();

    let forms = repo.list();
    assert_eq!(forms.len(), 2);
    assert_eq!(repo.get("form_a").unwrap().fields.len(), 0);
    assert_eq!(repo.get("form_b").unwrap().fields.len(), 1);
}

#[test]
fn test_delete_and_clear() {
    let repo = FormRepository::new(Arc::new(MemoryStore::new()));
    repo.try_save(&FormSchema::new("A").with_id("form_a")).unwrap();
    repo.try_save(&FormSchema::new("B").with_id("form_b")).unwrap();

    repo.try_delete("form_missing").unwrap();
    assert_eq!(repo.list().len(), 2);

    repo.try_delete("form_a").unwrap();
    let ids: Vec<String> = repo.list().into_iter().map(|f| f.id).collect();
    assert_eq!(ids, vec!["form_b".to_string()]);

    repo.clear().unwrap();
    assert!(repo.list().is_empty());
}

#[test]
fn test_corrupt_collection_is_reported_and_swallowed() {
    let store = Arc::new(MemoryStore::new());
    store.set("forms", r#"[{"id": 7}]"#).unwrap();
    let repo = FormRepository::with_key(store, "forms");

    assert!(repo.try_list().is_err());
    assert!(repo.list().is_empty());
    assert!(repo.get("7").is_none());
}

#[test]
fn test_list_recent_newest_first() {
    let repo = FormRepository::new(Arc::new(MemoryStore::new()));
    let now = Utc::now();
    for (id, age_days) in [("old", 3), ("new", 0), ("mid", 1)] {
        let mut form = FormSchema::new(id).with_id(id);
        form.created_at = now - Duration::days(age_days);
        repo.try_save(&form).unwrap();
    }

    let ids: Vec<String> = repo.list_recent().into_iter().map(|f| f.id).collect();
    assert_eq!(ids, vec!["new", "mid", "old"]);
}

#[test]
fn test_file_store_persists_across_instances() {
    let dir = TempDir::new().unwrap();
    let form = signup();

    {
        let repo = FormRepository::new(Arc::new(FileStore::new(dir.path()).unwrap()));
        assert!(repo.save(&form));
    }

    let repo = FormRepository::new(Arc::new(FileStore::new(dir.path()).unwrap()));
    assert_eq!(repo.get(&form.id), Some(form));
}

#[test]
fn test_from_config_with_data_dir() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig::builder().data_dir(dir.path()).build();
    let repo = FormRepository::from_config(&config).unwrap();

    assert!(repo.save(&FormSchema::new("Survey")));
    assert!(dir.path().join("dynamicFormBuilder_forms.json").exists());
}
