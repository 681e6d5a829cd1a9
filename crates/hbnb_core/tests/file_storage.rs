use hbnb_core::model::record::RecordDecodeError;
use hbnb_core::model::timestamp::parse_timestamp;
use hbnb_core::{
    AttrValue, AttributeMap, EntityRegistry, FileStorage, Record, RecordStore, StoreError,
};
use serde_json::Value;
use std::fs;

fn registry() -> &'static EntityRegistry {
    EntityRegistry::builtin()
}

fn new_record(kind: &str) -> Record {
    Record::new(registry().lookup(kind).unwrap())
}

#[test]
fn flush_then_open_restores_equal_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("file.json");

    let mut place = new_record("Place");
    place.set_attribute("name", AttrValue::from("Loft"));
    place.set_attribute("max_guest", AttrValue::Int(5));
    place.set_attribute("latitude", AttrValue::Float(5.0));
    place.set_attribute(
        "amenity_ids",
        AttrValue::StrList(vec!["wifi".to_string(), "pool".to_string()]),
    );
    let user = new_record("User");

    let mut storage = FileStorage::new(&path);
    storage.register(place.clone());
    storage.register(user.clone());
    storage.flush().unwrap();

    let reopened = FileStorage::open(&path, registry()).unwrap();
    assert_eq!(reopened.len(), 2);
    assert_eq!(reopened.get(&place.key()), Some(&place));
    assert_eq!(reopened.get(&user.key()), Some(&user));
    assert_eq!(
        reopened.get(&place.key()).unwrap().attribute("latitude"),
        Some(&AttrValue::Float(5.0))
    );
}

#[test]
fn exported_entries_are_ordered_and_tagged_with_kind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("file.json");
    let mut city = new_record("City");
    city.set_attribute("name", AttrValue::from("Paris"));

    let mut storage = FileStorage::new(&path);
    storage.register(city.clone());
    storage.flush().unwrap();

    let root: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let entry = root
        .get(format!("City.{}", city.id()))
        .and_then(Value::as_object)
        .unwrap();
    let fields = entry.keys().map(String::as_str).collect::<Vec<_>>();
    assert_eq!(
        fields,
        vec!["id", "created_at", "updated_at", "state_id", "name", "__class__"]
    );
    assert_eq!(entry["__class__"], "City");
    assert_eq!(entry["name"], "Paris");
}

#[test]
fn missing_and_blank_files_load_empty() {
    let dir = tempfile::tempdir().unwrap();
    let missing = FileStorage::open(dir.path().join("absent.json"), registry()).unwrap();
    assert!(missing.is_empty());

    let blank = dir.path().join("blank.json");
    fs::write(&blank, "  \n").unwrap();
    assert!(FileStorage::open(&blank, registry()).unwrap().is_empty());
}

#[test]
fn malformed_files_are_errors_not_empty_stores() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("file.json");

    fs::write(&path, "{not json").unwrap();
    assert!(matches!(
        FileStorage::open(&path, registry()),
        Err(StoreError::Json(_))
    ));

    fs::write(&path, "[1, 2]").unwrap();
    assert!(matches!(
        FileStorage::open(&path, registry()),
        Err(StoreError::Corrupt(_))
    ));

    fs::write(&path, r#"{"User.1": 3}"#).unwrap();
    assert!(matches!(
        FileStorage::open(&path, registry()),
        Err(StoreError::Corrupt(_))
    ));
}

#[test]
fn invalid_entry_fails_the_whole_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("file.json");
    fs::write(
        &path,
        r#"{
            "User.1": {"id": "1", "created_at": "2024-01-02T03:04:05.000006",
                       "updated_at": "2024-01-02T03:04:05.000006", "__class__": "User"},
            "Country.2": {"id": "2", "created_at": "2024-01-02T03:04:05.000006",
                          "updated_at": "2024-01-02T03:04:05.000006", "__class__": "Country"}
        }"#,
    )
    .unwrap();

    let mut storage = FileStorage::new(&path);
    match storage.load(registry()) {
        Err(StoreError::InvalidRecord { key, source }) => {
            assert_eq!(key, "Country.2");
            assert_eq!(source, RecordDecodeError::UnknownKind("Country".to_string()));
        }
        other => panic!("expected invalid record, got {other:?}"),
    }
    assert!(storage.is_empty());
}

#[test]
fn listing_orders_by_creation_time() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = FileStorage::new(dir.path().join("file.json"));
    let early = parse_timestamp("2024-01-01T00:00:00.000000").unwrap();
    let late = parse_timestamp("2024-06-01T12:30:00").unwrap();

    for (kind, id, created_at) in [("User", "b", late), ("State", "z", early), ("User", "a", late)]
    {
        storage.register(Record::restore(
            kind,
            id,
            created_at,
            created_at,
            AttributeMap::new(),
        ));
    }

    let keys = storage
        .list(None)
        .into_iter()
        .map(Record::key)
        .collect::<Vec<_>>();
    assert_eq!(keys, vec!["State.z", "User.a", "User.b"]);
    assert_eq!(storage.list(Some("User")).len(), 2);
    assert_eq!(storage.count("State"), 1);
    assert_eq!(storage.count("City"), 0);
}
