//! Target disambiguation
//!
//! Targets frequently share a base product name across packages. Each
//! surviving target gets a globally unique display name: singletons keep
//! their base name, colliding groups extend it with the shortest suffix
//! of their package path that tells the group members apart. The result
//! is a pure function of the target set, never of iteration order.

use std::collections::BTreeMap;

use armature_core::{Target, TargetId};

/// A final display name paired with the (possibly merged) target it
/// names.
#[derive(Debug, Clone)]
pub struct DisambiguatedTarget {
    pub name: String,
    pub target: Target,
}

/// Assign a unique display name to every post-merge target.
pub fn disambiguate_targets(
    targets: BTreeMap<TargetId, Target>,
) -> BTreeMap<TargetId, DisambiguatedTarget> {
    let mut groups: BTreeMap<&str, Vec<&TargetId>> = BTreeMap::new();
    for (id, target) in &targets {
        groups.entry(target.name()).or_default().push(id);
    }

    let mut names: BTreeMap<TargetId, String> = BTreeMap::new();
    for (base, members) in &groups {
        if members.len() == 1 {
            names.insert(members[0].clone(), (*base).to_string());
            continue;
        }
        for id in members {
            let suffix = distinguishing_suffix(id, members, &targets);
            let name = match suffix {
                Some(suffix) => format!("{base} ({suffix})"),
                // The full package path is still shared; fall back to
                // the unique target id.
                None => format!("{base} ({id})"),
            };
            names.insert((*id).clone(), name);
        }
    }

    targets
        .into_iter()
        .map(|(id, target)| {
            let name = names.remove(&id).unwrap_or_else(|| id.to_string());
            (id, DisambiguatedTarget { name, target })
        })
        .collect()
}

/// The shortest tail of `id`'s package segments that no other group
/// member shares at the same length, or `None` if the full package path
/// is itself ambiguous.
fn distinguishing_suffix(
    id: &TargetId,
    members: &[&TargetId],
    targets: &BTreeMap<TargetId, Target>,
) -> Option<String> {
    let segments = targets[id].label.package_segments();
    let max_len = members
        .iter()
        .map(|member| targets[*member].label.package_segments().len())
        .max()
        .unwrap_or(0);

    for len in 1..=max_len {
        let tail = suffix_of(&segments, len);
        let unique = members.iter().all(|member| {
            *member == id || suffix_of(&targets[*member].label.package_segments(), len) != tail
        });
        if unique {
            return Some(tail);
        }
    }
    None
}

fn suffix_of(segments: &[&str], len: usize) -> String {
    let start = segments.len().saturating_sub(len);
    segments[start..].join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use armature_test_fixtures as fixtures;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn names_of(targets: BTreeMap<TargetId, Target>) -> BTreeMap<TargetId, String> {
        disambiguate_targets(targets)
            .into_iter()
            .map(|(id, d)| (id, d.name))
            .collect()
    }

    #[test]
    fn unique_base_names_stay_unchanged() {
        let project = fixtures::sample_project();
        let names = names_of(project.targets);

        assert_eq!(names[&TargetId::from("B 1")], "b");
        assert_eq!(names[&TargetId::from("C 1")], "c");
        assert_eq!(names[&TargetId::from("R 1")], "R1");
    }

    #[test]
    fn colliding_names_get_shortest_unique_package_suffix() {
        let project = fixtures::sample_project();
        let names = names_of(project.targets);

        // Both "A 1" and "A 2" produce a product named "A"; one package
        // segment is not enough ("A" vs "A"), two are.
        assert_eq!(names[&TargetId::from("A 1")], "A (lib/A)");
        assert_eq!(names[&TargetId::from("A 2")], "A (app/A)");
    }

    #[test]
    fn identical_packages_fall_back_to_target_id() {
        let mut project = fixtures::sample_project();
        let mut clone = project.targets[&TargetId::from("C 1")].clone();
        clone.id = TargetId::from("C 1b");
        project.targets.insert(clone.id.clone(), clone);

        let names = names_of(project.targets);
        assert_eq!(names[&TargetId::from("C 1")], "c (C 1)");
        assert_eq!(names[&TargetId::from("C 1b")], "c (C 1b)");
    }

    #[test]
    fn names_are_pairwise_distinct() {
        let project = fixtures::sample_project();
        let names = names_of(project.targets);
        let distinct: BTreeSet<&String> = names.values().collect();
        assert_eq!(distinct.len(), names.len());
    }

    proptest! {
        /// Display names are unique for arbitrary target sets, and two
        /// runs over the same set agree.
        #[test]
        fn disambiguation_is_unique_and_stable(
            specs in proptest::collection::btree_set(
                (
                    proptest::collection::vec("[a-c]{1,2}", 0..4),
                    "[A-B]",
                ),
                1..12,
            )
        ) {
            let targets: Vec<Target> = specs
                .iter()
                .enumerate()
                .map(|(i, (segments, name))| {
                    let label = if segments.is_empty() {
                        format!("//:{name}")
                    } else {
                        format!("//{}:{name}", segments.join("/"))
                    };
                    fixtures::library_target(&format!("t{i}"), &label, &format!("p{i}/lib.a"))
                })
                .collect();

            let map: BTreeMap<TargetId, Target> = targets
                .iter()
                .map(|t| (t.id.clone(), t.clone()))
                .collect();

            let first = names_of(map.clone());
            let second = names_of(map);
            prop_assert_eq!(&first, &second);

            let distinct: BTreeSet<&String> = first.values().collect();
            prop_assert_eq!(distinct.len(), first.len());
        }
    }
}
