//! Build setting assembly
//!
//! Settings are computed per final target as ordered layers, later
//! layers winning on key collision: global project settings, the
//! target's declared (post-merge) settings, then settings derived from
//! the resolved model.

use std::collections::{BTreeMap, BTreeSet};

use armature_core::{ProductType, SettingValue, Target, TargetId};

use crate::disambiguate::DisambiguatedTarget;
use crate::path_resolver::PathResolver;
use crate::phases::LinkManifest;

/// Assemble the final settings for one target.
///
/// `targets` is the full post-merge set, used to resolve the test
/// host's product path and display name; `redirects` chases hosts that
/// were merged away.
pub fn assemble_settings(
    target: &Target,
    global: &BTreeMap<String, SettingValue>,
    targets: &BTreeMap<TargetId, DisambiguatedTarget>,
    redirects: &BTreeMap<TargetId, TargetId>,
    manifest: Option<&LinkManifest>,
    resolver: &PathResolver<'_>,
) -> BTreeMap<String, SettingValue> {
    let mut settings = global.clone();
    settings.extend(
        target
            .build_settings
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );

    settings.insert(
        "PACKAGE_BIN_DIR".to_string(),
        SettingValue::from(target.package_bin_dir.clone()),
    );
    settings.insert(
        "TARGET_NAME".to_string(),
        SettingValue::from(target.name()),
    );
    settings.insert(
        "SDKROOT".to_string(),
        SettingValue::from(target.platform.sdk_root()),
    );

    if !target.swiftmodules.is_empty() {
        let dirs: BTreeSet<String> = target
            .swiftmodules
            .iter()
            .map(|module| {
                let mut parent = module.clone();
                parent.path = module.parent().to_string();
                resolver.resolve_build_dir(&parent)
            })
            .collect();
        settings.insert(
            "SWIFT_INCLUDE_PATHS".to_string(),
            SettingValue::from(dirs.into_iter().collect::<Vec<_>>().join(" ")),
        );
    }

    if !target.modulemaps.is_empty() {
        let flags: Vec<String> = target
            .modulemaps
            .iter()
            .map(|map| format!("-Xcc -fmodule-map-file={}", resolver.resolve(map)))
            .collect();
        settings.insert(
            "OTHER_SWIFT_FLAGS".to_string(),
            SettingValue::from(flags.join(" ")),
        );
    }

    if let Some(manifest) = manifest {
        let mut flags = Vec::new();
        if target.product.kind == ProductType::CommandLineTool {
            // Command-line tools have no bundle to carry the Swift
            // runtime; point the linker at the toolchain copies.
            flags.push(
                "-L$(TOOLCHAIN_DIR)/usr/lib/swift/$(TARGET_DEVICE_PLATFORM_NAME)".to_string(),
            );
            flags.push("-L/usr/lib/swift".to_string());
        }
        flags.push("-filelist".to_string());
        flags.push(format!("\"{},$(BUILD_DIR)\"", resolver.resolve(&manifest.path)));
        settings.insert("OTHER_LDFLAGS".to_string(), SettingValue::Array(flags));
    }

    if target.product.kind == ProductType::Application {
        settings.insert(
            "LD_RUNPATH_SEARCH_PATHS".to_string(),
            SettingValue::from(vec!["$(inherited)", "@executable_path/../Frameworks"]),
        );
    }

    if let Some(host) = resolved_test_host(target, targets, redirects) {
        match target.product.kind {
            // Unit tests load the host binary in-process, so they point
            // at its product path.
            ProductType::UnitTestBundle => {
                let product = &host.target.product;
                settings.insert(
                    "BUNDLE_LOADER".to_string(),
                    SettingValue::from("$(TEST_HOST)"),
                );
                settings.insert(
                    "TEST_HOST".to_string(),
                    SettingValue::from(format!(
                        "$(BUILD_DIR)/{}/{}/{}",
                        host.target.package_bin_dir,
                        product.basename(),
                        product.name,
                    )),
                );
                settings.insert(
                    "TARGET_BUILD_DIR".to_string(),
                    SettingValue::from(format!(
                        "$(BUILD_DIR)/{}$(TARGET_BUILD_SUBPATH)",
                        host.target.package_bin_dir,
                    )),
                );
            }
            // UI tests launch the host instead of loading it, so the
            // reference is by disambiguated name.
            ProductType::UiTestBundle => {
                settings.insert(
                    "TEST_TARGET_NAME".to_string(),
                    SettingValue::from(host.name.clone()),
                );
            }
            _ => {}
        }
    }

    settings
}

fn resolved_test_host<'a>(
    target: &Target,
    targets: &'a BTreeMap<TargetId, DisambiguatedTarget>,
    redirects: &BTreeMap<TargetId, TargetId>,
) -> Option<&'a DisambiguatedTarget> {
    let host = target.test_host.as_ref()?;
    let survivor = redirects.get(host)?;
    targets.get(survivor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disambiguate::disambiguate_targets;
    use crate::merge::merge_targets;
    use crate::phases::link_manifest;
    use crate::ProjectOptions;
    use armature_test_fixtures as fixtures;
    use pretty_assertions::assert_eq;

    struct Assembled {
        global: BTreeMap<String, SettingValue>,
        targets: BTreeMap<TargetId, DisambiguatedTarget>,
        redirects: BTreeMap<TargetId, TargetId>,
        options: ProjectOptions,
    }

    impl Assembled {
        fn settings(&self, id: &str) -> BTreeMap<String, SettingValue> {
            let resolver = PathResolver::new(&self.options);
            let disambiguated = &self.targets[&TargetId::from(id)];
            let manifest = link_manifest(&disambiguated.target, &disambiguated.name);
            assemble_settings(
                &disambiguated.target,
                &self.global,
                &self.targets,
                &self.redirects,
                manifest.as_ref(),
                &resolver,
            )
        }
    }

    fn options() -> ProjectOptions {
        ProjectOptions {
            generated_root: "/tmp/armature/execroot/out".to_string(),
            external_root: "/tmp/armature/external".to_string(),
            internal_dir_name: "armature".to_string(),
            workspace_output_path: "p.xcodeproj".to_string(),
            conventions: Default::default(),
        }
    }

    fn assembled() -> Assembled {
        let project = fixtures::sample_project();
        let outcome = merge_targets(&project);
        Assembled {
            global: project.build_settings,
            targets: disambiguate_targets(outcome.targets),
            redirects: outcome.redirects,
            options: options(),
        }
    }

    #[test]
    fn layers_later_win() {
        let assembled = assembled();
        let settings = assembled.settings("A 2");

        // Global setting flows through.
        assert_eq!(
            settings["ONLY_ACTIVE_ARCH"],
            SettingValue::Bool(true)
        );
        // Declared target setting survives.
        assert_eq!(settings["T"], SettingValue::from("43"));
        // Computed settings are present.
        assert_eq!(
            settings["PACKAGE_BIN_DIR"],
            SettingValue::from("out/a1b2c/bin/A 2")
        );
        assert_eq!(settings["TARGET_NAME"], SettingValue::from("A"));
        assert_eq!(settings["SDKROOT"], SettingValue::from("macosx"));
    }

    #[test]
    fn swift_include_paths_from_swiftmodules() {
        let assembled = assembled();
        let settings = assembled.settings("A 2");

        assert_eq!(
            settings["SWIFT_INCLUDE_PATHS"],
            SettingValue::from("$(BUILD_DIR)/out/x")
        );
    }

    #[test]
    fn module_map_flags_resolve_by_kind() {
        let assembled = assembled();

        let b1 = assembled.settings("B 1");
        assert_eq!(
            b1["OTHER_SWIFT_FLAGS"],
            SettingValue::from("-Xcc -fmodule-map-file=$(PROJECT_DIR)/a/module.modulemap")
        );

        let c1 = assembled.settings("C 1");
        assert_eq!(
            c1["OTHER_SWIFT_FLAGS"],
            SettingValue::from(
                "-Xcc -fmodule-map-file=$(PROJECT_DIR)/out/a/b/module.modulemap"
            )
        );
    }

    #[test]
    fn link_manifest_flags() {
        let assembled = assembled();
        let settings = assembled.settings("A 2");

        assert_eq!(
            settings["OTHER_LDFLAGS"],
            SettingValue::from(vec![
                "-filelist".to_string(),
                "\"$(PROJECT_DIR)/p.xcodeproj/armature/targets/a1b2c/A/A.LinkFileList,$(BUILD_DIR)\""
                    .to_string(),
            ])
        );
        assert_eq!(
            settings["LD_RUNPATH_SEARCH_PATHS"],
            SettingValue::from(vec!["$(inherited)", "@executable_path/../Frameworks"])
        );
    }

    #[test]
    fn command_line_tools_add_swift_runtime_search_paths() {
        let assembled = assembled();
        let settings = assembled.settings("C 2");

        assert_eq!(
            settings["OTHER_LDFLAGS"],
            SettingValue::from(vec![
                "-L$(TOOLCHAIN_DIR)/usr/lib/swift/$(TARGET_DEVICE_PLATFORM_NAME)".to_string(),
                "-L/usr/lib/swift".to_string(),
                "-filelist".to_string(),
                "\"$(PROJECT_DIR)/p.xcodeproj/armature/targets/a1b2c/d/d.LinkFileList,$(BUILD_DIR)\""
                    .to_string(),
            ])
        );
    }

    #[test]
    fn unit_tests_point_at_the_host_product_path() {
        let assembled = assembled();
        let settings = assembled.settings("B 2");

        assert_eq!(
            settings["BUNDLE_LOADER"],
            SettingValue::from("$(TEST_HOST)")
        );
        assert_eq!(
            settings["TEST_HOST"],
            SettingValue::from("$(BUILD_DIR)/out/a1b2c/bin/A 2/A.app/A")
        );
        assert_eq!(
            settings["TARGET_BUILD_DIR"],
            SettingValue::from("$(BUILD_DIR)/out/a1b2c/bin/A 2$(TARGET_BUILD_SUBPATH)")
        );
        assert!(!settings.contains_key("TEST_TARGET_NAME"));
    }

    #[test]
    fn ui_tests_reference_the_host_by_display_name() {
        let assembled = assembled();
        let settings = assembled.settings("B 3");

        // Post-merge, "A" is unique again, so the host keeps its base
        // name.
        assert_eq!(settings["TEST_TARGET_NAME"], SettingValue::from("A"));
        assert!(!settings.contains_key("TEST_HOST"));
        assert!(!settings.contains_key("BUNDLE_LOADER"));
    }
}
