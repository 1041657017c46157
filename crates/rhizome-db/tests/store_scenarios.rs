//! Store, reopen, lookup, and select behavior of the database.

use rhizome_db::{AnyEntity, Database, DbError, Entity, Farm, Id, Properties};
use serde_json::{json, Value};

fn props(value: Value) -> Properties {
    value.as_object().unwrap().clone()
}

fn person_props(short_name: &str, email: &str) -> Properties {
    props(json!({
        "short_name": short_name,
        "name": "Somebody",
        "email": email,
        "affiliation": "Chatelain",
        "role": "grower",
    }))
}

fn farm_props(short_name: &str) -> Properties {
    props(json!({
        "short_name": short_name,
        "name": "Chatelain Maraîchage",
        "description": "",
        "license": "",
        "people": [],
        "cameras": [],
        "scanning_devices": [],
    }))
}

// ---------------------------------------------------------------------------
// Store and reopen
// ---------------------------------------------------------------------------

#[test]
fn stored_records_survive_a_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let farm_id;
    {
        let db = Database::open(dir.path()).unwrap();
        let farm = db.factory().create("Farm", &farm_props("south")).unwrap();
        farm_id = farm.id();
        db.store(&farm, false).unwrap();
    }

    let db = Database::open(dir.path()).unwrap();
    let farm = db.require(&farm_id).unwrap();
    assert_eq!(farm.classname(), "Farm");
    assert_eq!(farm.as_farm().unwrap().borrow().short_name(), "south");
}

#[test]
fn add_person_links_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let farm_id;
    {
        let db = Database::open(dir.path()).unwrap();
        let farm = db.factory().create("Farm", &farm_props("south")).unwrap();
        farm_id = farm.id();
        db.store(&farm, false).unwrap();

        let person = db
            .factory()
            .create("Person", &person_props("julie", "julie@example.org"))
            .unwrap();
        Farm::add_person(
            farm.as_farm().unwrap(),
            person.as_person().unwrap(),
            &db,
        )
        .unwrap();
    }

    let db = Database::open(dir.path()).unwrap();
    let farm = db.require(&farm_id).unwrap();
    let people = farm.as_farm().unwrap().borrow().people();
    assert_eq!(people.len(), 1);
    assert_eq!(people[0].borrow().email(), "julie@example.org");
}

#[test]
fn add_person_twice_keeps_one_reference() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path()).unwrap();
    let farm = db.factory().create("Farm", &farm_props("south")).unwrap();
    db.store(&farm, false).unwrap();
    let person = db
        .factory()
        .create("Person", &person_props("julie", "julie@example.org"))
        .unwrap();

    let farm_handle = farm.as_farm().unwrap();
    let person_handle = person.as_person().unwrap();
    Farm::add_person(farm_handle, person_handle, &db).unwrap();
    Farm::add_person(farm_handle, person_handle, &db).unwrap();

    assert_eq!(farm_handle.borrow().people().len(), 1);
    assert_eq!(farm.serialize()["people"].as_array().unwrap().len(), 1);
}

#[test]
fn store_clears_the_modified_flag() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path()).unwrap();
    let farm = db.factory().create("Farm", &farm_props("south")).unwrap();
    assert!(farm.is_modified());
    // Entity-level store goes through the bound database.
    farm.store(false).unwrap();
    assert!(!farm.is_modified());
    assert!(db.lookup(&farm.id()).unwrap().is_some());
}

#[test]
fn store_fails_once_the_database_is_gone() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path()).unwrap();
    let farm = db.factory().create("Farm", &farm_props("south")).unwrap();
    drop(db);
    assert!(matches!(farm.store(false), Err(DbError::UnboundEntity)));
}

#[test]
fn recursive_store_rewrites_children() {
    let dir = tempfile::tempdir().unwrap();
    let farm_id;
    {
        let db = Database::open(dir.path()).unwrap();
        let farm = db.factory().create("Farm", &farm_props("south")).unwrap();
        farm_id = farm.id();
        db.store(&farm, false).unwrap();
        let zone = db
            .factory()
            .create(
                "Zone",
                &props(json!({
                    "farm": farm_id.as_str(),
                    "short_name": "bed-3",
                    "scan_paths": [],
                })),
            )
            .unwrap();
        db.store(&zone, false).unwrap();
    }

    // After the reopen the zone sits in the farm's reverse collection, so a
    // recursive store of the farm covers it too.
    let db = Database::open(dir.path()).unwrap();
    let farm = db.require(&farm_id).unwrap();
    let zones = farm.as_farm().unwrap().borrow().zones();
    assert_eq!(zones.len(), 1);
    zones[0].borrow_mut().core_mut().mark_modified();
    db.store(&farm, true).unwrap();
    assert!(!AnyEntity::Zone(zones[0].clone()).is_modified());
}

// ---------------------------------------------------------------------------
// Lookup and select
// ---------------------------------------------------------------------------

#[test]
fn lookup_unknown_id_is_none_and_require_fails() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path()).unwrap();
    let id = Id::parse("nosuchrecord0001").unwrap();
    assert!(db.lookup(&id).unwrap().is_none());
    assert!(matches!(
        db.require(&id),
        Err(DbError::NotFound { id: missing }) if missing == id
    ));
}

#[test]
fn lookup_loads_records_written_by_another_handle() {
    let dir = tempfile::tempdir().unwrap();
    let writer = Database::open(dir.path()).unwrap();
    let reader = Database::open(dir.path()).unwrap();

    let person = writer
        .factory()
        .create("Person", &person_props("julie", "julie@example.org"))
        .unwrap();
    writer.store(&person, false).unwrap();

    // The reader opened before the write; the record comes in lazily.
    let found = reader.lookup(&person.id()).unwrap().unwrap();
    assert_eq!(found.as_person().unwrap().borrow().short_name(), "julie");
}

#[test]
fn select_filters_by_classname_in_insertion_order() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path()).unwrap();
    let anna = db
        .factory()
        .create("Person", &person_props("anna", "anna@example.org"))
        .unwrap();
    let farm = db.factory().create("Farm", &farm_props("south")).unwrap();
    let bert = db
        .factory()
        .create("Person", &person_props("bert", "bert@example.org"))
        .unwrap();
    db.store(&anna, false).unwrap();
    db.store(&farm, false).unwrap();
    db.store(&bert, false).unwrap();

    let people = db.select("Person");
    assert_eq!(people.len(), 2);
    assert_eq!(people[0].id(), anna.id());
    assert_eq!(people[1].id(), bert.id());
    assert_eq!(db.select("Farm").len(), 1);
    assert!(db.select("Scan").is_empty());
}

#[test]
fn select_where_matches_serialized_properties() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path()).unwrap();
    for (name, email) in [("anna", "anna@example.org"), ("bert", "bert@example.org")] {
        let person = db
            .factory()
            .create("Person", &person_props(name, email))
            .unwrap();
        db.store(&person, false).unwrap();
    }

    let hits = db.select_where("Person", "short_name", &json!("bert"));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].as_person().unwrap().borrow().email(), "bert@example.org");
    assert!(db
        .select_where("Person", "short_name", &json!("carl"))
        .is_empty());
}

// ---------------------------------------------------------------------------
// Corrupt stores
// ---------------------------------------------------------------------------

#[test]
fn open_rejects_an_invalid_task_state() {
    let dir = tempfile::tempdir().unwrap();
    Database::open(dir.path()).unwrap();
    let envelope = json!({
        "id": "badanalysis00001",
        "classname": "Analysis",
        "value": {
            "id": "badanalysis00001",
            "short_name": "stitching",
            "state": "Paused",
        },
    });
    std::fs::write(
        dir.path().join("objects/badanalysis00001.json"),
        serde_json::to_string_pretty(&envelope).unwrap(),
    )
    .unwrap();

    assert!(matches!(
        Database::open(dir.path()),
        Err(DbError::InvalidState(s)) if s == "Paused"
    ));
}

#[test]
fn open_rejects_an_envelope_under_the_wrong_name() {
    let dir = tempfile::tempdir().unwrap();
    Database::open(dir.path()).unwrap();
    let envelope = json!({
        "id": "actualid00000001",
        "classname": "Person",
        "value": {
            "id": "actualid00000001",
            "short_name": "julie",
            "name": "Julie",
            "email": "julie@example.org",
            "affiliation": "",
            "role": "",
        },
    });
    std::fs::write(
        dir.path().join("objects/wrongname0000001.json"),
        serde_json::to_string_pretty(&envelope).unwrap(),
    )
    .unwrap();

    assert!(matches!(
        Database::open(dir.path()),
        Err(DbError::CorruptRecord(_))
    ));
}

#[test]
fn open_rejects_unknown_classnames() {
    let dir = tempfile::tempdir().unwrap();
    Database::open(dir.path()).unwrap();
    let envelope = json!({
        "id": "mystery000000001",
        "classname": "Spaceship",
        "value": { "id": "mystery000000001" },
    });
    std::fs::write(
        dir.path().join("objects/mystery000000001.json"),
        serde_json::to_string_pretty(&envelope).unwrap(),
    )
    .unwrap();

    assert!(matches!(
        Database::open(dir.path()),
        Err(DbError::UnknownClass(name)) if name == "Spaceship"
    ));
}
