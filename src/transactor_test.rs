use super::*;
use crate::attribute::{AttrOptions, Cardinality};
use crate::snapshot::Snapshot;
use crate::value::ValueType;

fn patient(id: &str, city: &str) -> Entity {
    Entity::new(id).with_attr(Attribute::new(
        "patient/city",
        city,
        ValueType::String,
        AttrOptions {
            indexed: true,
            cardinality: Cardinality::Single,
        },
    ))
}

#[test]
fn add_entity_stamps_attributes_and_advances_curr_time() {
    let snap = Snapshot::empty();
    let next = add_entity(&snap, patient("pat1", "London")).unwrap();

    assert_eq!(next.curr_time(), 1);
    let attr = next.attr_at(&EntityId::new("pat1"), &AttrName::new("patient/city")).unwrap();
    assert_eq!(attr.curr_ts(), 1);
    assert_eq!(attr.prev_ts(), None);
}

#[test]
fn add_entity_populates_all_three_indices() {
    let snap = Snapshot::empty();
    let next = add_entity(&snap, patient("pat1", "London")).unwrap();
    let e = EntityId::new("pat1");
    let a = AttrName::new("patient/city");
    let v = Value::from("London");
    assert!(next.eavt().contains(&e, &a, &v));
    assert!(next.avet().contains(&e, &a, &v));
    assert!(next.veat().contains(&e, &a, &v));
}

#[test]
fn add_entity_rejects_a_duplicate_id() {
    let snap = Snapshot::empty();
    let next = add_entity(&snap, patient("pat1", "London")).unwrap();
    let err = add_entity(&next, patient("pat1", "Paris")).unwrap_err();
    assert_eq!(err, Error::DuplicateEntity(EntityId::new("pat1")));
}

#[test]
fn update_entity_advances_version_and_reindexes() {
    let snap = Snapshot::empty();
    let snap = add_entity(&snap, patient("pat1", "London")).unwrap();
    let id = EntityId::new("pat1");
    let attr_name = AttrName::new("patient/city");

    let next = update_entity(&snap, &id, &attr_name, Value::from("Paris"), UpdateOp::ResetTo).unwrap();

    assert!(!next.avet().contains(&id, &attr_name, &Value::from("London")));
    assert!(next.avet().contains(&id, &attr_name, &Value::from("Paris")));
    let attr = next.attr_at(&id, &attr_name).unwrap();
    assert_eq!(attr.prev_ts(), Some(1));
    assert_eq!(attr.curr_ts(), 2);
}

#[test]
fn update_entity_rejects_a_type_mismatch() {
    let snap = add_entity(&Snapshot::empty(), patient("pat1", "London")).unwrap();
    let err = update_entity(
        &snap,
        &EntityId::new("pat1"),
        &AttrName::new("patient/city"),
        Value::Int(3),
        UpdateOp::ResetTo,
    )
    .unwrap_err();
    assert!(matches!(err, Error::TypeMismatch(_, _)));
}

#[test]
fn update_entity_unknown_attribute_is_an_error() {
    let snap = add_entity(&Snapshot::empty(), patient("pat1", "London")).unwrap();
    let err = update_entity(
        &snap,
        &EntityId::new("pat1"),
        &AttrName::new("patient/weight"),
        Value::Int(3),
        UpdateOp::ResetTo,
    )
    .unwrap_err();
    assert!(matches!(err, Error::UnknownAttribute(_, _)));
}

#[test]
fn remove_on_single_cardinality_is_a_no_op_reset() {
    let snap = add_entity(&Snapshot::empty(), patient("pat1", "London")).unwrap();
    let id = EntityId::new("pat1");
    let attr_name = AttrName::new("patient/city");
    let next = update_entity(&snap, &id, &attr_name, Value::from("London"), UpdateOp::Remove).unwrap();
    assert_eq!(next.value_of_at(&id, &attr_name), Some(&Value::from("London")));
}

#[test]
fn multi_cardinality_add_unions_and_remove_subtracts() {
    let entity = Entity::new("pat1").with_attr(Attribute::new(
        "patient/symptoms",
        "fever",
        ValueType::String,
        AttrOptions {
            indexed: false,
            cardinality: Cardinality::Multiple,
        },
    ));
    let snap = add_entity(&Snapshot::empty(), entity).unwrap();
    let id = EntityId::new("pat1");
    let attr_name = AttrName::new("patient/symptoms");

    let snap = update_entity(&snap, &id, &attr_name, Value::from("cough"), UpdateOp::Add).unwrap();
    let set = snap.value_of_at(&id, &attr_name).unwrap().as_set().unwrap().clone();
    assert_eq!(set, std::collections::BTreeSet::from([Value::from("fever"), Value::from("cough")]));

    let snap = update_entity(&snap, &id, &attr_name, Value::from("fever"), UpdateOp::Remove).unwrap();
    let set = snap.value_of_at(&id, &attr_name).unwrap().as_set().unwrap().clone();
    assert_eq!(set, std::collections::BTreeSet::from([Value::from("cough")]));
}

#[test]
fn remove_entity_drops_it_from_storage_and_every_index() {
    let snap = add_entity(&Snapshot::empty(), patient("pat1", "London")).unwrap();
    let id = EntityId::new("pat1");
    let next = remove_entity(&snap, &id).unwrap();

    assert!(next.entity_at(&id).is_none());
    assert!(!next.avet().contains(&id, &AttrName::new("patient/city"), &Value::from("London")));
}

#[test]
fn add_then_remove_restores_storage_and_every_index_modulo_curr_time() {
    let empty = Snapshot::empty();
    let added = add_entity(&empty, patient("pat1", "London")).unwrap();
    let restored = remove_entity(&added, &EntityId::new("pat1")).unwrap();

    assert_eq!(restored.storage(), empty.storage());
    assert_eq!(restored.eavt(), empty.eavt());
    assert_eq!(restored.avet(), empty.avet());
    assert_eq!(restored.veat(), empty.veat());
}

#[test]
fn reset_to_is_idempotent_when_repeated_with_the_same_value() {
    let snap = add_entity(&Snapshot::empty(), patient("pat1", "London")).unwrap();
    let id = EntityId::new("pat1");
    let attr_name = AttrName::new("patient/city");

    let once = update_entity(&snap, &id, &attr_name, Value::from("Paris"), UpdateOp::ResetTo).unwrap();
    let twice = update_entity(&once, &id, &attr_name, Value::from("Paris"), UpdateOp::ResetTo).unwrap();

    assert_eq!(once.value_of_at(&id, &attr_name), twice.value_of_at(&id, &attr_name));
    assert_eq!(twice.value_of_at(&id, &attr_name), Some(&Value::from("Paris")));

    // A second identical reset neither duplicates nor loses the index
    // path: exactly one (id, attr_name, "Paris") leaf survives.
    let leafset = twice
        .avet()
        .levels()
        .get(&crate::index::Atom::Attr(attr_name.clone()))
        .and_then(|l2| l2.get(&crate::index::Atom::Value(Value::from("Paris"))))
        .unwrap();
    assert_eq!(leafset.len(), 1);
    assert!(!twice.avet().contains(&id, &attr_name, &Value::from("London")));
}

#[test]
fn remove_entity_unknown_id_is_an_error() {
    let snap = Snapshot::empty();
    let err = remove_entity(&snap, &EntityId::new("ghost")).unwrap_err();
    assert_eq!(err, Error::UnknownEntity(EntityId::new("ghost")));
}

#[test]
fn apply_ops_advances_curr_time_by_one_regardless_of_batch_size() {
    let snap = Snapshot::empty();
    let ops = vec![
        Op::AddEntity(patient("pat1", "London")),
        Op::AddEntity(patient("pat2", "Paris")),
        Op::UpdateEntity {
            id: EntityId::new("pat1"),
            attr: AttrName::new("patient/city"),
            value: Value::from("Berlin"),
            op: UpdateOp::ResetTo,
        },
    ];
    let next = apply_ops(&snap, &ops).unwrap();
    assert_eq!(next.curr_time(), 1);
    let attr = next.attr_at(&EntityId::new("pat1"), &AttrName::new("patient/city")).unwrap();
    assert_eq!(attr.curr_ts(), 1);
    assert_eq!(attr.prev_ts(), Some(1));
}

#[test]
fn apply_ops_touching_the_same_attribute_twice_keeps_prev_ts_strictly_earlier() {
    let snap = add_entity(&Snapshot::empty(), patient("pat1", "London")).unwrap();
    let id = EntityId::new("pat1");
    let attr_name = AttrName::new("patient/city");

    let ops = vec![
        Op::UpdateEntity {
            id: id.clone(),
            attr: attr_name.clone(),
            value: Value::from("Paris"),
            op: UpdateOp::ResetTo,
        },
        Op::UpdateEntity {
            id: id.clone(),
            attr: attr_name.clone(),
            value: Value::from("Berlin"),
            op: UpdateOp::ResetTo,
        },
    ];
    let next = apply_ops(&snap, &ops).unwrap();
    let attr = next.attr_at(&id, &attr_name).unwrap();

    assert_eq!(attr.curr_ts(), 2);
    assert_eq!(attr.prev_ts(), Some(1));
    assert_eq!(attr.value(), &Value::from("Berlin"));
}

#[test]
fn apply_ops_leaves_no_partial_effect_on_failure() {
    let snap = Snapshot::empty();
    let ops = vec![
        Op::AddEntity(patient("pat1", "London")),
        Op::UpdateEntity {
            id: EntityId::new("nonexistent"),
            attr: AttrName::new("patient/city"),
            value: Value::from("Berlin"),
            op: UpdateOp::ResetTo,
        },
    ];
    assert!(apply_ops(&snap, &ops).is_err());
    // The error is surfaced directly; callers never see the
    // partially-applied intermediate snapshot because apply_ops returns
    // only the Result, never a side channel to `working`.
}
