//! Dependency wiring
//!
//! Translates declared dependency ids into edges on final, post-merge
//! targets: edges into merged-away targets are redirected to their
//! absorber, self-edges produced by redirection are dropped, test
//! bundles gain an edge on their test host, and targets consuming
//! generated inputs gain an edge on the synthetic aggregate target that
//! materializes them. Cycles in the final graph are fatal.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use armature_core::TargetId;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::DiGraph;
use tracing::debug;

use crate::disambiguate::DisambiguatedTarget;
use crate::error::ResolveError;

/// The final dependency edges, plus the set of targets that need
/// generated inputs materialized before they compile.
#[derive(Debug, Clone, Default)]
pub struct WiredGraph {
    pub edges: BTreeMap<TargetId, BTreeSet<TargetId>>,
    pub requires_generated: BTreeSet<TargetId>,
}

pub fn wire_dependencies(
    targets: &BTreeMap<TargetId, DisambiguatedTarget>,
    redirects: &BTreeMap<TargetId, TargetId>,
) -> Result<WiredGraph, ResolveError> {
    let mut wired = WiredGraph::default();

    for (id, disambiguated) in targets {
        let target = &disambiguated.target;
        let mut edges = BTreeSet::new();

        for dependency in &target.dependencies {
            let survivor =
                redirects
                    .get(dependency)
                    .ok_or_else(|| ResolveError::UnknownDependency {
                        target: id.clone(),
                        dependency: dependency.clone(),
                    })?;
            if survivor == id {
                debug!(id = %id, dependency = %dependency, "dropping self-edge after merge");
                continue;
            }
            edges.insert(survivor.clone());
        }

        if target.product.kind.is_test_bundle() {
            if let Some(host) = &target.test_host {
                let survivor =
                    redirects
                        .get(host)
                        .ok_or_else(|| ResolveError::UnknownTestHost {
                            target: id.clone(),
                            host: host.clone(),
                        })?;
                if survivor != id {
                    edges.insert(survivor.clone());
                }
            }
        }

        if target.requires_generated_inputs() {
            wired.requires_generated.insert(id.clone());
        }

        wired.edges.insert(id.clone(), edges);
    }

    detect_cycles(&wired.edges)?;
    Ok(wired)
}

/// Any cycle in the final graph is a configuration error; report the
/// offending cycle rotated to start at its smallest id so the message is
/// deterministic.
fn detect_cycles(edges: &BTreeMap<TargetId, BTreeSet<TargetId>>) -> Result<(), ResolveError> {
    let mut graph: DiGraph<TargetId, ()> = DiGraph::new();
    let mut indices = HashMap::new();
    for id in edges.keys() {
        indices.insert(id, graph.add_node(id.clone()));
    }
    for (from, targets) in edges {
        for to in targets {
            if let Some(to_index) = indices.get(to) {
                graph.add_edge(indices[from], *to_index, ());
            }
        }
    }

    if toposort(&graph, None).is_ok() {
        return Ok(());
    }

    let mut cycles: Vec<Vec<TargetId>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .map(|scc| {
            let mut ids: Vec<TargetId> = scc.iter().map(|ix| graph[*ix].clone()).collect();
            ids.sort();
            ids
        })
        .collect();
    cycles.sort();

    let members = cycles
        .into_iter()
        .next()
        .unwrap_or_default();
    Err(ResolveError::DependencyCycle(walk_cycle(&members, edges)))
}

/// Order the strongly connected component as an actual edge walk,
/// starting from its smallest member and always taking the smallest
/// in-component successor.
fn walk_cycle(
    members: &[TargetId],
    edges: &BTreeMap<TargetId, BTreeSet<TargetId>>,
) -> Vec<TargetId> {
    let component: BTreeSet<&TargetId> = members.iter().collect();
    let Some(start) = members.first() else {
        return Vec::new();
    };

    let mut path = vec![start.clone()];
    let mut current = start.clone();
    loop {
        let next = edges
            .get(&current)
            .and_then(|succ| succ.iter().find(|id| component.contains(id)))
            .cloned();
        match next {
            Some(next) if next == *start => break,
            Some(next) if path.contains(&next) => break,
            Some(next) => {
                path.push(next.clone());
                current = next;
            }
            None => break,
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disambiguate::disambiguate_targets;
    use crate::merge::merge_targets;
    use armature_test_fixtures as fixtures;
    use pretty_assertions::assert_eq;

    fn wired() -> WiredGraph {
        let project = fixtures::sample_project();
        let outcome = merge_targets(&project);
        let targets = disambiguate_targets(outcome.targets);
        wire_dependencies(&targets, &outcome.redirects).unwrap()
    }

    #[test]
    fn edges_are_redirected_through_merges() {
        let wired = wired();

        // "B 1" depended on "A 1", which merged into "A 2".
        assert_eq!(
            wired.edges[&TargetId::from("B 1")],
            [TargetId::from("A 2")].into_iter().collect()
        );
        // "A 2" depended on "A 1"; the redirected edge would be a
        // self-edge and is dropped.
        assert!(!wired.edges[&TargetId::from("A 2")].contains(&TargetId::from("A 2")));
        assert!(wired.edges[&TargetId::from("A 2")].contains(&TargetId::from("C 1")));
    }

    #[test]
    fn test_bundles_gain_host_edges() {
        let wired = wired();

        for id in ["B 2", "B 3"] {
            assert!(
                wired.edges[&TargetId::from(id)].contains(&TargetId::from("A 2")),
                "{id} should depend on its test host"
            );
        }
    }

    #[test]
    fn generated_input_consumers_are_flagged() {
        let wired = wired();

        // "C 1" consumes a generated module map.
        assert!(wired.requires_generated.contains(&TargetId::from("C 1")));
        assert!(!wired.requires_generated.contains(&TargetId::from("C 2")));
    }

    #[test]
    fn unknown_dependency_is_fatal() {
        let project = fixtures::sample_project();
        let outcome = merge_targets(&project);
        let mut targets = disambiguate_targets(outcome.targets);
        targets
            .get_mut(&TargetId::from("C 2"))
            .unwrap()
            .target
            .dependencies
            .insert(TargetId::from("missing"));

        let result = wire_dependencies(&targets, &outcome.redirects);
        assert!(matches!(
            result,
            Err(ResolveError::UnknownDependency { dependency, .. }) if dependency == TargetId::from("missing")
        ));
    }

    #[test]
    fn cycles_are_fatal_and_reported_deterministically() {
        let project = fixtures::sample_project();
        let outcome = merge_targets(&project);
        let mut targets = disambiguate_targets(outcome.targets);
        // C 1 -> C 2 closes a loop with the existing C 2 -> C 1 edge.
        targets
            .get_mut(&TargetId::from("C 1"))
            .unwrap()
            .target
            .dependencies
            .insert(TargetId::from("C 2"));

        let err = wire_dependencies(&targets, &outcome.redirects).unwrap_err();
        match err {
            ResolveError::DependencyCycle(cycle) => {
                assert_eq!(cycle, vec![TargetId::from("C 1"), TargetId::from("C 2")]);
            }
            other => panic!("expected cycle error, got {other}"),
        }
    }
}
