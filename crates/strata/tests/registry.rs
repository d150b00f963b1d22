mod common;

use common::TestModel;
use std::any::TypeId;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use strata::reflect::{FieldInfo, FieldType, RawAccess, StructInfo, TypeInfo};
use strata::{Entity, ModelOption, OrmError, Reflect, Registry};

static PARSES: AtomicUsize = AtomicUsize::new(0);

/// Counts how often the registry asks for its metadata.
#[allow(dead_code)]
#[derive(Default)]
struct Counted {
    id: i64,
}

// SAFETY: the single field entry matches `Counted::id`.
unsafe impl Reflect for Counted {
    fn type_info() -> TypeInfo {
        PARSES.fetch_add(1, Ordering::SeqCst);
        TypeInfo::Struct(StructInfo {
            name: "Counted",
            type_id: TypeId::of::<Counted>(),
            size: size_of::<Counted>(),
            table_name: None,
            fields: vec![FieldInfo {
                name: "id",
                ty: FieldType::of::<i64>(),
                tag: None,
                offset: std::mem::offset_of!(Counted, id),
                raw: RawAccess::of::<i64>(),
            }],
        })
    }
}

#[derive(Debug, Default, Entity)]
#[orm(table = "people")]
struct Person {
    id: i64,
    #[orm(column = "nick")]
    nick_name: String,
    #[orm("column=born")]
    birth_year: i32,
}

#[derive(Debug, Default, Entity)]
struct BadTag {
    #[orm("column")]
    id: i64,
}

#[allow(dead_code)]
#[derive(Default)]
struct Misreported {
    id: i64,
}

// SAFETY: deliberately inconsistent; the registry must refuse it before any
// field access happens.
unsafe impl Reflect for Misreported {
    fn type_info() -> TypeInfo {
        TypeInfo::Struct(StructInfo {
            name: "Misreported",
            type_id: TypeId::of::<Misreported>(),
            size: size_of::<Misreported>(),
            table_name: None,
            fields: vec![FieldInfo {
                name: "id",
                ty: FieldType::of::<i64>(),
                tag: None,
                offset: 4096,
                raw: RawAccess::of::<i64>(),
            }],
        })
    }
}

#[allow(dead_code)]
#[derive(Default)]
struct ForeignId {
    id: i64,
}

// SAFETY: as above; the reported `TypeId` belongs to another type.
unsafe impl Reflect for ForeignId {
    fn type_info() -> TypeInfo {
        TypeInfo::Struct(StructInfo {
            name: "ForeignId",
            type_id: TypeId::of::<TestModel>(),
            size: size_of::<ForeignId>(),
            table_name: None,
            fields: vec![],
        })
    }
}

#[derive(Debug, Default, Entity)]
struct Clash {
    user_id: i64,
    #[orm(column = "user_id")]
    owner: i64,
}

#[test]
fn concurrent_first_use_parses_once() {
    let registry = Registry::new();
    let models: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| registry.get::<Counted>().unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(PARSES.load(Ordering::SeqCst), 1);
    assert!(models.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(registry.len(), 1);
}

#[test]
fn derived_names_and_attributes() {
    let registry = Registry::new();
    let person = registry.get::<Person>().unwrap();
    assert_eq!(person.table_name(), "people");
    assert_eq!(person.field("id").unwrap().column, "id");
    assert_eq!(person.field("nick_name").unwrap().column, "nick");
    assert_eq!(person.field("birth_year").unwrap().column, "born");
    assert_eq!(person.column("born").unwrap().name, "birth_year");
    assert_eq!(person.entity_type(), TypeId::of::<Person>());

    let test = registry.get::<TestModel>().unwrap();
    assert_eq!(test.table_name(), "test_model");
    assert_eq!(TestModel::FIELD_FIRST_NAME, "first_name");
}

#[test]
fn malformed_tag_fails_registration() {
    let registry = Registry::new();
    let err = registry.get::<BadTag>().unwrap_err();
    assert!(matches!(err, OrmError::InvalidTag(pair) if pair == "column"));
    assert!(registry.is_empty());
}

#[test]
fn register_applies_options_and_replaces() {
    let registry = Registry::new();
    assert_eq!(registry.get::<Person>().unwrap().table_name(), "people");

    let model = registry
        .register::<Person>([
            ModelOption::table_name("persons"),
            ModelOption::column_name("nick_name", "nickname"),
        ])
        .unwrap();
    assert_eq!(model.table_name(), "persons");

    let cached = registry.get::<Person>().unwrap();
    assert!(Arc::ptr_eq(&model, &cached));
    assert_eq!(cached.field("nick_name").unwrap().column, "nickname");

    let err = registry
        .register::<Person>([ModelOption::column_name("missing", "x")])
        .unwrap_err();
    assert!(matches!(err, OrmError::InvalidField(f) if f == "missing"));
    assert_eq!(registry.get::<Person>().unwrap().table_name(), "persons");
}

#[test]
fn duplicate_columns_are_rejected() {
    let registry = Registry::new();
    let err = registry.get::<Clash>().unwrap_err();
    assert!(
        matches!(&err, OrmError::InvalidTag(msg) if msg.contains("user_id") && msg.contains("owner")),
        "{err}"
    );
    assert!(registry.is_empty());

    let before = registry.get::<TestModel>().unwrap();
    let err = registry
        .register::<TestModel>([ModelOption::column_name("age", "first_name")])
        .unwrap_err();
    assert!(matches!(err, OrmError::InvalidModelOption(_)), "{err}");

    let cached = registry.get::<TestModel>().unwrap();
    assert!(Arc::ptr_eq(&before, &cached));
    assert_eq!(cached.column("first_name").unwrap().name, "first_name");
    assert_eq!(cached.column("age").unwrap().name, "age");
}

#[test]
fn inconsistent_metadata_is_rejected() {
    let registry = Registry::new();
    assert!(matches!(
        registry.get::<Misreported>(),
        Err(OrmError::InvalidModelType)
    ));
    assert!(matches!(
        registry.get::<ForeignId>(),
        Err(OrmError::InvalidModelType)
    ));
    assert!(registry.is_empty());
}

#[test]
fn pointer_and_scalar_types() {
    let registry = Registry::new();
    let boxed = registry.get::<Box<TestModel>>().unwrap();
    assert_eq!(boxed.table_name(), "test_model");
    assert_eq!(boxed.fields().len(), 4);

    assert!(matches!(
        registry.get::<i32>(),
        Err(OrmError::InvalidModelType)
    ));
    assert!(matches!(
        registry.get::<Box<Box<TestModel>>>(),
        Err(OrmError::InvalidModelType)
    ));
}
