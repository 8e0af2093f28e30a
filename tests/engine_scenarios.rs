use balance_formula_core::compute::Propagator;
use balance_formula_core::{
    Candidate, Engine, EngineConfig, EngineError, Entity, EntityId, EntityKind, EntitySnapshot, FormulaTerm,
    HistoryLog, ValidationError,
};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use std::collections::HashSet;

fn raw(id: i64, name: &str, value: f64) -> Entity {
    Entity::raw(EntityId(id), EntityKind::Account, name, value)
}

fn calc(id: i64, kind: EntityKind, name: &str, terms: &[(i64, f64)]) -> Entity {
    let formula = terms.iter().map(|&(t, c)| FormulaTerm::new(EntityId(t), c)).collect();
    Entity::calculated(EntityId(id), kind, name, formula)
}

#[test]
fn chain_resolves_and_propagates_in_order() {
    let engine = Engine::default();
    let mut snap = EntitySnapshot::new(vec![
        raw(1, "A", 100.0),
        calc(2, EntityKind::Account, "B", &[(1, 1.0)]),
        calc(3, EntityKind::Account, "C", &[(2, 2.0)]),
    ])
    .unwrap();

    let ledger = engine.resolve(&snap);
    assert_eq!(
        [1, 2, 3].map(|i| ledger.value_of(EntityId(i))),
        [100.0, 100.0, 200.0]
    );

    let mut log = HistoryLog::new();
    let rows = engine.record_balance_edit(&mut snap, EntityId(1), 250.0, &mut log).unwrap();
    let tail: Vec<(&str, f64)> = rows[1..].iter().map(|r| (r.name_snapshot.as_str(), r.value)).collect();
    assert_eq!(tail, vec![("B", 250.0), ("C", 500.0)]);

    // The snapshot now carries the edit; a fresh resolve agrees with the history.
    assert_eq!(engine.resolve(&snap).value_of(EntityId(3)), 500.0);
}

#[test]
fn diamond_dependent_comes_after_both_branches() {
    let engine = Engine::default();
    let snap = EntitySnapshot::new(vec![
        raw(1, "A", 100.0),
        calc(2, EntityKind::Group, "B", &[(1, 1.0)]),
        calc(3, EntityKind::Institution, "C", &[(1, 1.0)]),
        calc(4, EntityKind::Dashboard, "D", &[(2, 1.0), (3, 1.0)]),
    ])
    .unwrap();

    let rows = engine.propagate(EntityId(1), 250.0, &snap);
    let names: Vec<&str> = rows.iter().map(|r| r.name_snapshot.as_str()).collect();
    let values: Vec<f64> = rows.iter().map(|r| r.value).collect();
    assert_eq!(names, vec!["B", "C", "D"]);
    assert_eq!(values, vec![250.0, 250.0, 500.0]);
}

#[test]
fn self_and_multi_hop_references_are_rejected() {
    let engine = Engine::default();
    let mut snap = EntitySnapshot::new(vec![raw(1, "A", 1.0), calc(2, EntityKind::Account, "B", &[(1, 1.0)])]).unwrap();

    let err = engine
        .validate_formula(Candidate::Existing(EntityId(2)), &[FormulaTerm::new(EntityId(2), 1.0)], &snap)
        .unwrap_err();
    assert!(matches!(err, ValidationError::SelfReference { .. }));

    let err = engine
        .update_formula(&mut snap, EntityId(1), true, vec![FormulaTerm::new(EntityId(2), 1.0)])
        .unwrap_err();
    match err {
        EngineError::Validation(ValidationError::CycleDetected { path, .. }) => {
            assert_eq!(path.join(" -> "), "A -> B -> A");
        }
        other => panic!("Wrong error type: {:?}", other),
    }
    // Rejected formulas never reach resolution.
    assert!(engine.audit(&snap).is_clean());
    assert_eq!(engine.resolve(&snap).value_of(EntityId(2)), 1.0);
}

#[test]
fn dangling_reference_is_tolerated_everywhere() {
    let engine = Engine::new(EngineConfig { warn_on_dangling: false, ..Default::default() });
    let snap = EntitySnapshot::new(vec![
        raw(1, "A", 10.0),
        calc(2, EntityKind::Group, "B", &[(1, 2.0), (500, 1.0)]),
    ])
    .unwrap();

    assert_eq!(engine.resolve(&snap).value_of(EntityId(2)), 20.0);
    let rows = engine.propagate(EntityId(1), 11.0, &snap);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].value, 22.0);
    assert!(engine.trace(&snap, EntityId(2)).contains("#500(missing)"));
}

#[test]
fn cycle_injected_past_validation_is_reported() {
    let engine = Engine::default();
    let json = r#"[
        {"id": 1, "kind": "account", "name": "A", "is_calculated": true, "formula": [{"target": 2, "coefficient": 1.0}]},
        {"id": 2, "kind": "account", "name": "B", "is_calculated": true, "formula": [{"target": 1, "coefficient": 1.0}]},
        {"id": 3, "kind": "account", "name": "C", "raw_value": 5.0}
    ]"#;
    let snap = EntitySnapshot::from_json(json).unwrap();

    let ledger = engine.resolve(&snap);
    assert_eq!(ledger.fallbacks(), &[EntityId(1), EntityId(2)]);
    assert_eq!(ledger.value_of(EntityId(3)), 5.0);

    let report = engine.audit(&snap);
    assert!(report.involves(EntityId(1)) && report.involves(EntityId(2)));
    assert!(!report.involves(EntityId(3)));
}

// --- Properties over generated acyclic graphs ---

#[derive(Debug, Clone)]
enum NodeSpec {
    Raw(f64),
    Calc(Vec<(usize, f64)>),
}

fn node_strategy(index: usize) -> BoxedStrategy<NodeSpec> {
    let raw = (-1_000i32..1_000).prop_map(|v| NodeSpec::Raw(v as f64)).boxed();
    if index == 0 {
        return raw;
    }
    // Targets only point at lower indices, which keeps every graph acyclic.
    let calc = prop::collection::vec((0..index, -3i32..=3), 1..4)
        .prop_map(|terms| NodeSpec::Calc(terms.into_iter().map(|(t, c)| (t, c as f64)).collect()))
        .boxed();
    prop_oneof![raw, calc].boxed()
}

fn graph_strategy() -> impl Strategy<Value = Vec<NodeSpec>> {
    (2usize..12).prop_flat_map(|n| (0..n).map(node_strategy).collect::<Vec<_>>())
}

fn id_of(index: usize) -> EntityId {
    EntityId(index as i64 + 1)
}

/// Entities are emitted highest index first so dependents precede their targets.
fn build_snapshot(nodes: &[NodeSpec]) -> EntitySnapshot {
    let entities = nodes
        .iter()
        .enumerate()
        .rev()
        .map(|(i, node)| match node {
            NodeSpec::Raw(v) => Entity::raw(id_of(i), EntityKind::Account, format!("n{}", i), *v),
            NodeSpec::Calc(terms) => Entity::calculated(
                id_of(i),
                EntityKind::Group,
                format!("n{}", i),
                terms.iter().map(|&(t, c)| FormulaTerm::new(id_of(t), c)).collect(),
            ),
        })
        .collect();
    EntitySnapshot::new(entities).unwrap()
}

fn expected_values(nodes: &[NodeSpec]) -> Vec<f64> {
    let mut values: Vec<f64> = Vec::with_capacity(nodes.len());
    for node in nodes {
        let v = match node {
            NodeSpec::Raw(v) => *v,
            NodeSpec::Calc(terms) => terms.iter().fold(0.0, |acc, &(t, c)| acc + c * values[t]),
        };
        values.push(v);
    }
    values
}

fn reaches(nodes: &[NodeSpec], from: usize, target: usize) -> bool {
    let mut stack = vec![from];
    let mut seen = HashSet::new();
    while let Some(node) = stack.pop() {
        if node == target {
            return true;
        }
        if !seen.insert(node) {
            continue;
        }
        if let NodeSpec::Calc(terms) = &nodes[node] {
            stack.extend(terms.iter().map(|&(t, _)| t));
        }
    }
    false
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn resolve_matches_hand_computation(nodes in graph_strategy()) {
        let snap = build_snapshot(&nodes);
        let ledger = balance_formula_core::resolve(&snap);
        prop_assert!(ledger.fallbacks().is_empty());
        for (i, expected) in expected_values(&nodes).into_iter().enumerate() {
            prop_assert_eq!(ledger.get(id_of(i)), Some(expected));
        }
    }

    #[test]
    fn validator_rejects_exactly_the_cycles(nodes in graph_strategy()) {
        let snap = build_snapshot(&nodes);
        for owner in 0..nodes.len() {
            for target in 0..nodes.len() {
                let result = balance_formula_core::validate(
                    Candidate::Existing(id_of(owner)),
                    &[FormulaTerm::new(id_of(target), 1.0)],
                    &snap,
                );
                prop_assert_eq!(result.is_err(), reaches(&nodes, target, owner), "owner {} target {}", owner, target);
            }
        }
    }

    #[test]
    fn propagation_is_idempotent_and_correct(
        nodes in graph_strategy(),
        pick in any::<prop::sample::Index>(),
        new_value in -1_000i32..1_000,
    ) {
        let changed = pick.index(nodes.len());
        let new_value = new_value as f64;
        let snap = build_snapshot(&nodes);
        let cfg = EngineConfig::default();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let first = Propagator::new(&snap, &cfg).propagate_at(id_of(changed), new_value, at);
        let second = Propagator::new(&snap, &cfg).propagate_at(id_of(changed), new_value, at);
        prop_assert_eq!(&first, &second);

        let mut edited = nodes.clone();
        edited[changed] = NodeSpec::Raw(new_value);
        let expected = expected_values(&edited);
        for record in &first {
            let index = (record.entity_id.get() - 1) as usize;
            prop_assert!(reaches(&nodes, index, changed));
            prop_assert_eq!(record.value, expected[index]);
        }
        let dependents = (0..nodes.len()).filter(|&i| i != changed && reaches(&nodes, i, changed)).count();
        prop_assert_eq!(first.len(), dependents);
    }
}
