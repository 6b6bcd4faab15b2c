//! Target merging
//!
//! Collapses eligible target pairs into single combined targets. A
//! candidate merge of `src` into `dest` is legal only when every other
//! target that links `src`'s product also links `dest`'s product, so no
//! external linker loses access to `src`'s symbols, and `src`'s product
//! is not a required standalone link unit. Illegal or ambiguous
//! candidates are skipped, never errors.

use std::collections::{BTreeMap, BTreeSet};

use armature_core::{Project, Target, TargetId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Why a merge candidate was left standalone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No candidate destination passed the legality check.
    NoViableAbsorber,
    /// More than one destination passed; absorbing into either would be
    /// arbitrary.
    AmbiguousAbsorber,
    /// The source product is listed as a required link unit.
    RequiredLinkUnit,
}

/// A merge candidate that stayed standalone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedMerge {
    pub src: TargetId,
    pub dests: BTreeSet<TargetId>,
    pub reason: SkipReason,
}

/// Result of the merge stage.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The reduced target map.
    pub targets: BTreeMap<TargetId, Target>,
    /// Every original id mapped to its surviving id. Identity for
    /// unmerged targets.
    pub redirects: BTreeMap<TargetId, TargetId>,
    pub skipped: Vec<SkippedMerge>,
}

/// Apply the project's merge candidates to its target map.
pub fn merge_targets(project: &Project) -> MergeOutcome {
    let mut targets = project.targets.clone();
    let mut redirects: BTreeMap<TargetId, TargetId> = project
        .targets
        .keys()
        .map(|id| (id.clone(), id.clone()))
        .collect();
    let mut skipped = Vec::new();

    // Candidates are processed in sorted source-id order so the outcome
    // is independent of how the extractor enumerated them.
    for (src_id, dests) in &project.merge_candidates {
        let Some(src) = targets.get(src_id) else {
            continue;
        };

        if project.required_links.contains(&src.product.path) {
            skipped.push(SkippedMerge {
                src: src_id.clone(),
                dests: dests.clone(),
                reason: SkipReason::RequiredLinkUnit,
            });
            continue;
        }

        // An earlier merge may have absorbed a candidate destination;
        // chase it to its survivor.
        let mut viable: BTreeSet<TargetId> = dests
            .iter()
            .filter_map(|dest| redirects.get(dest).cloned())
            .filter(|dest| dest != src_id && targets.contains_key(dest))
            .collect();
        viable.retain(|dest| is_legal_merge(&targets, src_id, dest));

        match viable.len() {
            1 => {
                let dest_id = viable.into_iter().next().unwrap();
                debug!(src = %src_id, dest = %dest_id, "merging target");
                let src = targets.remove(src_id).unwrap();
                let dest = targets.get_mut(&dest_id).unwrap();
                absorb(dest, src);
                for survivor in redirects.values_mut() {
                    if survivor == src_id {
                        *survivor = dest_id.clone();
                    }
                }
            }
            0 => skipped.push(SkippedMerge {
                src: src_id.clone(),
                dests: dests.clone(),
                reason: SkipReason::NoViableAbsorber,
            }),
            _ => skipped.push(SkippedMerge {
                src: src_id.clone(),
                dests: dests.clone(),
                reason: SkipReason::AmbiguousAbsorber,
            }),
        }
    }

    MergeOutcome {
        targets,
        redirects,
        skipped,
    }
}

/// Every third target that holds a direct link edge on `src`'s product
/// must be equally satisfied by linking `dest`'s product after the
/// merge.
fn is_legal_merge(
    targets: &BTreeMap<TargetId, Target>,
    src_id: &TargetId,
    dest_id: &TargetId,
) -> bool {
    let src_path = &targets[src_id].product.path;
    let dest_path = &targets[dest_id].product.path;

    targets
        .iter()
        .filter(|(id, _)| *id != src_id && *id != dest_id)
        .all(|(_, other)| {
            !other.links.iter().any(|link| link == src_path)
                || other.links.iter().any(|link| link == dest_path)
        })
}

/// Union `src`'s build inputs into `dest`. `dest`'s declared settings
/// win on collision; `dest`'s link inputs stay untouched since they
/// reference output paths that remain valid.
fn absorb(dest: &mut Target, src: Target) {
    for path in src.inputs.srcs {
        if !dest.inputs.srcs.contains(&path) {
            dest.inputs.srcs.push(path);
        }
    }
    for path in src.inputs.non_arc_srcs {
        if !dest.inputs.non_arc_srcs.contains(&path) {
            dest.inputs.non_arc_srcs.push(path);
        }
    }
    dest.inputs.hdrs.extend(src.inputs.hdrs);
    dest.inputs.resources.extend(src.inputs.resources);
    dest.frameworks.extend(src.frameworks);
    dest.modulemaps.extend(src.modulemaps);
    dest.swiftmodules.extend(src.swiftmodules);
    dest.resource_bundles.extend(src.resource_bundles);
    dest.is_swift |= src.is_swift;

    for (key, value) in src.build_settings {
        dest.build_settings.entry(key).or_insert(value);
    }

    let dest_id = dest.id.clone();
    dest.dependencies
        .extend(src.dependencies.into_iter().filter(|id| *id != dest_id));
    dest.dependencies.remove(&src.id);

    if dest.test_host.is_none() {
        dest.test_host = src.test_host;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use armature_core::{FilePath, SettingValue};
    use armature_test_fixtures as fixtures;
    use pretty_assertions::assert_eq;

    #[test]
    fn merges_library_into_sole_consumer() {
        let project = fixtures::sample_project();
        let outcome = merge_targets(&project);

        assert!(!outcome.targets.contains_key(&TargetId::from("A 1")));
        assert_eq!(
            outcome.redirects[&TargetId::from("A 1")],
            TargetId::from("A 2")
        );
        assert_eq!(
            outcome.redirects[&TargetId::from("B 1")],
            TargetId::from("B 1")
        );

        let merged = &outcome.targets[&TargetId::from("A 2")];
        assert!(merged
            .inputs
            .srcs
            .contains(&FilePath::project("x/y.swift")));
        assert!(merged
            .inputs
            .non_arc_srcs
            .contains(&FilePath::project("b.c")));
        assert!(merged.is_swift);
        // Absorbed resources join the destination's.
        assert!(merged
            .inputs
            .resources
            .contains(&FilePath::project("Assets.xcassets/Contents.json")));
        assert!(merged
            .inputs
            .resources
            .contains(&FilePath::project("en.lproj/Localized.strings")));
    }

    #[test]
    fn destination_settings_win_on_collision() {
        let project = fixtures::sample_project();
        let outcome = merge_targets(&project);

        let merged = &outcome.targets[&TargetId::from("A 2")];
        // "T" is declared by both sides; the destination keeps its value.
        assert_eq!(merged.build_settings["T"], SettingValue::from("43"));
        // "Y" only exists on the source and is carried over.
        assert_eq!(merged.build_settings["Y"], SettingValue::Bool(true));
    }

    #[test]
    fn direct_link_on_source_rejects_merge() {
        let project = fixtures::project_with_link_on_merge_source();
        let outcome = merge_targets(&project);

        assert!(outcome.targets.contains_key(&TargetId::from("A 1")));
        assert_eq!(
            outcome.redirects[&TargetId::from("A 1")],
            TargetId::from("A 1")
        );
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].reason, SkipReason::NoViableAbsorber);
    }

    #[test]
    fn required_link_unit_is_never_merged() {
        let mut project = fixtures::sample_project();
        project.required_links.insert("z/A.a".to_string());

        let outcome = merge_targets(&project);
        assert!(outcome.targets.contains_key(&TargetId::from("A 1")));
        assert_eq!(outcome.skipped[0].reason, SkipReason::RequiredLinkUnit);
    }

    #[test]
    fn ambiguous_absorber_is_skipped() {
        let mut project = fixtures::sample_project();
        // With "A 2"'s direct link on "z/A.a" removed, no third target
        // links "A 1"'s product and both destinations pass the legality
        // check.
        project
            .targets
            .get_mut(&TargetId::from("A 2"))
            .unwrap()
            .links
            .retain(|link| link != "z/A.a");
        project
            .merge_candidates
            .get_mut(&TargetId::from("A 1"))
            .unwrap()
            .insert(TargetId::from("B 1"));

        let outcome = merge_targets(&project);
        assert!(outcome.targets.contains_key(&TargetId::from("A 1")));
        assert_eq!(
            outcome.redirects[&TargetId::from("A 1")],
            TargetId::from("A 1")
        );
        assert_eq!(outcome.skipped[0].reason, SkipReason::AmbiguousAbsorber);
    }

    #[test]
    fn illegal_second_absorber_does_not_block_the_merge() {
        let mut project = fixtures::sample_project();
        project
            .merge_candidates
            .get_mut(&TargetId::from("A 1"))
            .unwrap()
            .insert(TargetId::from("B 1"));

        // "A 2" links "z/A.a" without linking "a/b.framework", so "B 1"
        // fails the legality check and "A 2" stays the sole viable
        // absorber.
        let outcome = merge_targets(&project);
        assert!(!outcome.targets.contains_key(&TargetId::from("A 1")));
        assert!(outcome.skipped.is_empty());
        assert_eq!(
            outcome.redirects[&TargetId::from("A 1")],
            TargetId::from("A 2")
        );
    }

    #[test]
    fn dependency_edges_do_not_point_at_self_after_merge() {
        let project = fixtures::sample_project();
        let outcome = merge_targets(&project);

        let merged = &outcome.targets[&TargetId::from("A 2")];
        assert!(!merged.dependencies.contains(&TargetId::from("A 2")));
        assert!(!merged.dependencies.contains(&TargetId::from("A 1")));
    }
}
