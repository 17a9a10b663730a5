//! End-to-end checks against the demo dataset described in the source
//! design document: two patients, two machines, three blood-pressure
//! test results, wired up through the public [`crate::Connection`] API.

use std::collections::BTreeSet;

use crate::attribute::{AttrOptions, Cardinality};
use crate::entity::{Entity, EntityId};
use crate::query::term::{CompareOp, Query, Term};
use crate::value::{Value, ValueType};
use crate::{make_attr, make_entity, Connection};

fn indexed() -> AttrOptions {
    AttrOptions {
        indexed: true,
        cardinality: Cardinality::Single,
    }
}

fn unindexed_multi() -> AttrOptions {
    AttrOptions {
        indexed: false,
        cardinality: Cardinality::Multiple,
    }
}

fn patient(id: &str, city: &str, symptoms: &[&str]) -> Entity {
    let symptom_set: BTreeSet<Value> = symptoms.iter().map(|s| Value::from(*s)).collect();
    make_entity(id)
        .with_attr(make_attr("patient/city", city, ValueType::String, indexed()))
        .with_attr(make_attr(
            "patient/symptoms",
            Value::Set(symptom_set),
            ValueType::String,
            unindexed_multi(),
        ))
        .with_attr(make_attr(
            "patient/tests",
            Value::Set(BTreeSet::new()),
            ValueType::Ref,
            unindexed_multi(),
        ))
}

fn machine(id: &str) -> Entity {
    make_entity(id).with_attr(make_attr("machine/name", id, ValueType::String, indexed()))
}

fn test_result(id: &str, patient_id: &str, machine_id: &str, systolic: i64, diastolic: i64) -> Entity {
    make_entity(id)
        .with_attr(make_attr(
            "test/patient",
            Value::Ref(EntityId::new(patient_id)),
            ValueType::Ref,
            indexed(),
        ))
        .with_attr(make_attr(
            "test/machine",
            Value::Ref(EntityId::new(machine_id)),
            ValueType::Ref,
            indexed(),
        ))
        .with_attr(make_attr("test/bp-systolic", Value::Int(systolic), ValueType::Number, indexed()))
        .with_attr(make_attr("test/bp-diastolic", Value::Int(diastolic), ValueType::Number, indexed()))
}

/// Wires up the whole demo dataset against a fresh connection: two
/// patients, two machines, three tests, and pat1's `patient/tests` link
/// to its one recorded test.
fn demo_connection() -> Connection {
    let conn = Connection::new();
    conn.add_entities(vec![
        patient("pat1", "London", &["fever", "cough"]),
        patient("pat2", "Paris", &["fever", "cough"]),
        machine("machine1"),
        machine("machine2"),
    ])
    .unwrap();
    conn.add_entities(vec![
        test_result("t2-pat1", "pat1", "machine1", 170, 80),
        test_result("t4-pat2", "pat2", "machine2", 170, 90),
        test_result("t3-pat2", "pat2", "machine1", 140, 80),
    ])
    .unwrap();
    conn.update_entity(
        EntityId::new("pat1"),
        "patient/tests".into(),
        Value::Ref(EntityId::new("t2-pat1")),
        crate::attribute::UpdateOp::Add,
    )
    .unwrap();
    conn
}

fn bp_query(threshold: i64) -> Query {
    Query::new(
        vec!["id".to_string(), "k".to_string(), "b".to_string()],
        vec![
            [
                Term::var("id"),
                Term::lit(crate::attribute::AttrName::new("test/bp-systolic")),
                Term::compare("b", CompareOp::Lt, Value::Int(threshold)),
            ],
            [
                Term::var("id"),
                Term::lit(crate::attribute::AttrName::new("test/bp-diastolic")),
                Term::var("k"),
            ],
        ],
    )
}

#[test]
fn scenario_1_bp_over_200_matches_all_three_tests() {
    let conn = demo_connection();
    let snap = conn.snapshot();
    let rows = crate::query::q(&snap, &bp_query(200)).unwrap();

    let mut ids: Vec<String> = rows
        .iter()
        .map(|row| {
            row.iter()
                .find(|(name, _)| name == "id")
                .map(|(_, v)| v.to_string())
                .unwrap()
        })
        .collect();
    ids.sort();
    assert_eq!(rows.len(), 3);
    assert_eq!(
        ids,
        vec!["->t2-pat1".to_string(), "->t3-pat2".to_string(), "->t4-pat2".to_string()]
    );
}

#[test]
fn scenario_2_bp_over_160_matches_only_t3_pat2() {
    let conn = demo_connection();
    let snap = conn.snapshot();
    let rows = crate::query::q(&snap, &bp_query(160)).unwrap();

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert!(row.contains(&("id".to_string(), Value::Ref(EntityId::new("t3-pat2")))));
    assert!(row.contains(&("k".to_string(), Value::Int(80))));
    assert!(row.contains(&("b".to_string(), Value::Int(140))));
}

#[test]
fn scenario_3_symptom_reset_leaves_two_evolution_entries() {
    let conn = demo_connection();
    conn.update_entity(
        EntityId::new("pat1"),
        "patient/symptoms".into(),
        Value::Set(BTreeSet::from([Value::from("cold-sweat"), Value::from("sneeze")])),
        crate::attribute::UpdateOp::ResetTo,
    )
    .unwrap();

    let versions = conn.evolution_of(&EntityId::new("pat1"), &"patient/symptoms".into());
    assert_eq!(versions.len(), 2);
    let sets: Vec<BTreeSet<Value>> = versions
        .iter()
        .map(|(_, attr)| attr.value().as_set().cloned().unwrap())
        .collect();
    assert_eq!(sets[0], BTreeSet::from([Value::from("fever"), Value::from("cough")]));
    assert_eq!(
        sets[1],
        BTreeSet::from([Value::from("cold-sweat"), Value::from("sneeze")])
    );
}

#[test]
fn scenario_4_adding_a_test_to_patient_tests_leaves_two_evolution_entries() {
    let conn = demo_connection();
    let versions = conn.evolution_of(&EntityId::new("pat1"), &"patient/tests".into());

    assert_eq!(versions.len(), 2);
    let (_, before) = &versions[0];
    let (_, after) = &versions[1];
    let before_set = before.value().as_set().cloned().unwrap();
    let after_set = after.value().as_set().cloned().unwrap();
    assert!(before_set.is_empty());
    assert_eq!(after_set, BTreeSet::from([Value::Ref(EntityId::new("t2-pat1"))]));
}

#[test]
fn scenario_5_incoming_bfs_from_pat2_visits_pat2_then_its_tests() {
    let conn = demo_connection();
    let visited = conn.traverse(&EntityId::new("pat2"), crate::graph::Strategy::Bfs, crate::graph::Direction::Incoming);

    assert_eq!(visited.len(), 3);
    assert_eq!(visited[0].id(), &EntityId::new("pat2"));
    let rest: BTreeSet<String> = visited[1..].iter().map(|e| e.id().to_string()).collect();
    assert_eq!(
        rest,
        BTreeSet::from(["t3-pat2".to_string(), "t4-pat2".to_string()])
    );
}

#[test]
fn scenario_6_literal_equality_clause_binds_v_to_london() {
    let conn = demo_connection();
    let snap = conn.snapshot();
    let query = Query::new(
        vec!["v".to_string()],
        vec![[
            Term::compare("id", CompareOp::Eq, Value::Ref(EntityId::new("pat1"))),
            Term::compare("a", CompareOp::Eq, Value::from("patient/city")),
            Term::var("v"),
        ]],
    );
    let rows = crate::query::q(&snap, &query).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], vec![("v".to_string(), Value::from("London"))]);
}
