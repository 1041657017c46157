//! Rewiring of the live graph after a bulk load.

use rhizome_db::{AnyEntity, Database, DbError, Entity, Id, Properties};
use serde_json::{json, Value};

fn props(value: Value) -> Properties {
    value.as_object().unwrap().clone()
}

/// Populate a store with one farm, zone, observation unit, scan, analysis,
/// datastream, and note, all wired together, and return their ids.
struct GraphIds {
    farm: Id,
    zone: Id,
    unit: Id,
    scan: Id,
    analysis: Id,
    datastream: Id,
    note: Id,
}

fn build_graph(dir: &std::path::Path) -> GraphIds {
    let db = Database::open(dir).unwrap();
    let factory = db.factory();

    let person = factory
        .create(
            "Person",
            &props(json!({
                "short_name": "julie",
                "name": "Julie",
                "email": "julie@example.org",
                "affiliation": "Chatelain",
                "role": "grower",
            })),
        )
        .unwrap();
    let camera = factory
        .create(
            "Camera",
            &props(json!({
                "short_name": "cam",
                "name": "Topdown camera",
                "description": "",
                "lens": "24mm",
                "software_module": { "id": "romi.camera", "version": "1.0" },
                "parameters": {},
            })),
        )
        .unwrap();
    let farm = factory
        .create(
            "Farm",
            &props(json!({
                "short_name": "south",
                "name": "South field",
                "people": [person.id().as_str()],
                "cameras": [camera.id().as_str()],
            })),
        )
        .unwrap();
    let zone = factory
        .create(
            "Zone",
            &props(json!({
                "farm": farm.id().as_str(),
                "short_name": "bed-3",
                "scan_paths": [],
            })),
        )
        .unwrap();
    let unit = factory
        .create(
            "ObservationUnit",
            &props(json!({
                "context": farm.id().as_str(),
                "type": "crop",
                "short_name": "lettuce",
            })),
        )
        .unwrap();
    let scan = factory
        .create(
            "Scan",
            &props(json!({
                "zone": zone.id().as_str(),
                "observation_unit": unit.id().as_str(),
                "date": "2019-04-16T10:30:00+02:00",
                "people": [person.id().as_str()],
                "camera": camera.id().as_str(),
            })),
        )
        .unwrap();
    let analysis = factory
        .create(
            "Analysis",
            &props(json!({
                "zone": zone.id().as_str(),
                "scan": scan.id().as_str(),
                "short_name": "stitching",
                "state": "Finished",
            })),
        )
        .unwrap();
    let datastream = factory
        .create(
            "DataStream",
            &props(json!({
                "observation_unit": unit.id().as_str(),
                "observable": { "name": "air temperature", "uri": "obo:ENVO_09200001" },
                "unit": { "name": "degree Celsius", "uri": "obo:UO_0000027" },
            })),
        )
        .unwrap();
    let note = factory
        .create(
            "Note",
            &props(json!({
                "context": unit.id().as_str(),
                "author": person.id().as_str(),
                "date": "2019-04-15T12:00:00+02:00",
                "text": "Lettuce planted out",
            })),
        )
        .unwrap();

    let ids = GraphIds {
        farm: farm.id(),
        zone: zone.id(),
        unit: unit.id(),
        scan: scan.id(),
        analysis: analysis.id(),
        datastream: datastream.id(),
        note: note.id(),
    };
    for entity in [
        &person, &camera, &farm, &zone, &unit, &scan, &analysis, &datastream, &note,
    ] {
        db.store(entity, false).unwrap();
    }
    ids
}

// ---------------------------------------------------------------------------
// Forward and reverse edges after reopen
// ---------------------------------------------------------------------------

#[test]
fn zone_and_farm_are_wired_both_ways() {
    let dir = tempfile::tempdir().unwrap();
    let ids = build_graph(dir.path());

    let db = Database::open(dir.path()).unwrap();
    let zone = db.require(&ids.zone).unwrap();
    let zone = zone.as_zone().unwrap();
    let farm = zone.borrow().farm().expect("farm edge should be live");
    assert_eq!(farm.borrow().short_name(), "south");

    let back = farm.borrow().get_zone("bed-3").expect("reverse edge");
    assert_eq!(back.borrow().core().id(), &ids.zone);
}

#[test]
fn observation_unit_joins_its_farm() {
    let dir = tempfile::tempdir().unwrap();
    let ids = build_graph(dir.path());

    let db = Database::open(dir.path()).unwrap();
    let farm = db.require(&ids.farm).unwrap();
    let units = farm.as_farm().unwrap().borrow().observation_units();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].borrow().core().id(), &ids.unit);
    assert!(units[0].borrow().context().is_some());
}

#[test]
fn scan_joins_zone_and_observation_unit() {
    let dir = tempfile::tempdir().unwrap();
    let ids = build_graph(dir.path());

    let db = Database::open(dir.path()).unwrap();
    let scan = db.require(&ids.scan).unwrap();
    let scan = scan.as_scan().unwrap();
    assert!(scan.borrow().camera().is_some());
    assert_eq!(scan.borrow().people().len(), 1);

    let zone = db.require(&ids.zone).unwrap();
    let zone_scans = zone.as_zone().unwrap().borrow().scans();
    assert_eq!(zone_scans.len(), 1);
    assert_eq!(zone_scans[0].borrow().core().id(), &ids.scan);

    let unit = db.require(&ids.unit).unwrap();
    assert_eq!(unit.as_observation_unit().unwrap().borrow().scans().len(), 1);
}

#[test]
fn analysis_joins_zone_and_scan() {
    let dir = tempfile::tempdir().unwrap();
    let ids = build_graph(dir.path());

    let db = Database::open(dir.path()).unwrap();
    let zone = db.require(&ids.zone).unwrap();
    let analyses = zone.as_zone().unwrap().borrow().analyses();
    assert_eq!(analyses.len(), 1);
    assert_eq!(analyses[0].borrow().core().id(), &ids.analysis);

    let scan = db.require(&ids.scan).unwrap();
    assert_eq!(scan.as_scan().unwrap().borrow().analyses().len(), 1);
}

#[test]
fn datastream_joins_its_observation_unit() {
    let dir = tempfile::tempdir().unwrap();
    let ids = build_graph(dir.path());

    let db = Database::open(dir.path()).unwrap();
    let unit = db.require(&ids.unit).unwrap();
    let streams = unit.as_observation_unit().unwrap().borrow().datastreams();
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0].borrow().core().id(), &ids.datastream);
}

#[test]
fn note_resolves_a_polymorphic_context() {
    let dir = tempfile::tempdir().unwrap();
    let ids = build_graph(dir.path());

    let db = Database::open(dir.path()).unwrap();
    let note = db.require(&ids.note).unwrap();
    let context = note.as_note().unwrap().borrow().context().unwrap();
    assert!(matches!(context, AnyEntity::ObservationUnit(_)));
    assert_eq!(context.id(), ids.unit);
    assert!(note.as_note().unwrap().borrow().author().is_some());

    // Notes are found through their context property, not a reverse edge.
    let hits = db.select_where("Note", "context", &json!(ids.unit.as_str()));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id(), ids.note);
}

// ---------------------------------------------------------------------------
// Failure modes and detachment
// ---------------------------------------------------------------------------

#[test]
fn open_fails_on_a_dangling_reference() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = Database::open(dir.path()).unwrap();
        let zone = db
            .factory()
            .create(
                "Zone",
                &props(json!({
                    "farm": "nosuchfarm00001",
                    "short_name": "orphan",
                    "scan_paths": [],
                })),
            )
            .unwrap();
        db.store(&zone, false).unwrap();
    }

    assert!(matches!(
        Database::open(dir.path()),
        Err(DbError::UnresolvedReference { id }) if id.as_str() == "nosuchfarm00001"
    ));
}

#[test]
fn clone_detached_leaves_the_graph_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let ids = build_graph(dir.path());

    let db = Database::open(dir.path()).unwrap();
    let zone = db.require(&ids.zone).unwrap();
    let copy = zone.clone_detached();
    assert_ne!(copy.id(), ids.zone);
    assert!(copy.as_zone().unwrap().borrow().farm_id().is_none());
    assert!(copy.is_modified());

    // The copy is not indexed until it is stored.
    assert!(db.lookup(&copy.id()).unwrap().is_none());
    db.store(&copy, false).unwrap();
    assert!(db.lookup(&copy.id()).unwrap().is_some());

    // The original farm still has exactly one zone.
    let farm = db.require(&ids.farm).unwrap();
    assert_eq!(farm.as_farm().unwrap().borrow().zones().len(), 1);
}
