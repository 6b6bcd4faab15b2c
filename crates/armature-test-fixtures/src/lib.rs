//! Shared test fixtures for armature
//!
//! One representative project exercising every pipeline stage: a merge
//! candidate with its absorber, colliding base names, localized
//! resources, asset catalogs, generated inputs, external sources, test
//! bundles of both kinds, and a dependency resource bundle.

use std::collections::{BTreeMap, BTreeSet};

use armature_core::{
    FilePath, Label, Os, Platform, Product, ProductType, Project, SettingValue, Target, TargetId,
    TargetInputs,
};

/// A minimal target with everything defaulted; tests adjust the fields
/// they care about.
pub fn mock_target(id: &str, label: &str, product: Product) -> Target {
    Target {
        id: TargetId::from(id),
        label: Label::parse(label).expect("fixture label"),
        package_bin_dir: format!("out/a1b2c/bin/{id}"),
        platform: Platform::new(Os::MacOs, "x86_64", "11.0"),
        product,
        is_swift: false,
        build_settings: BTreeMap::new(),
        inputs: TargetInputs::default(),
        frameworks: BTreeSet::new(),
        modulemaps: BTreeSet::new(),
        swiftmodules: BTreeSet::new(),
        resource_bundles: BTreeSet::new(),
        links: Vec::new(),
        dependencies: BTreeSet::new(),
        test_host: None,
    }
}

/// A static library target, the most common shape in tests.
pub fn library_target(id: &str, label: &str, product_path: &str) -> Target {
    let name = label.rsplit(':').next().unwrap_or(id).to_string();
    mock_target(
        id,
        label,
        Product::new(ProductType::StaticLibrary, name, product_path),
    )
}

fn settings(entries: &[(&str, SettingValue)]) -> BTreeMap<String, SettingValue> {
    entries
        .iter()
        .map(|(key, value)| ((*key).to_string(), value.clone()))
        .collect()
}

fn ids(entries: &[&str]) -> BTreeSet<TargetId> {
    entries.iter().map(|id| TargetId::from(*id)).collect()
}

fn project_paths(entries: &[&str]) -> BTreeSet<FilePath> {
    entries.iter().map(|path| FilePath::project(*path)).collect()
}

fn targets() -> Vec<Target> {
    let mut a1 = mock_target(
        "A 1",
        "//lib/A:A",
        Product::new(ProductType::StaticLibrary, "a", "z/A.a"),
    );
    a1.is_swift = true;
    a1.build_settings = settings(&[
        ("PRODUCT_MODULE_NAME", SettingValue::from("A")),
        ("T", SettingValue::from("42")),
        ("Y", SettingValue::Bool(true)),
    ]);
    a1.inputs.srcs = vec![FilePath::project("x/y.swift")];
    a1.inputs.non_arc_srcs = vec![FilePath::project("b.c")];
    a1.inputs.resources = project_paths(&[
        "Assets.xcassets/Contents.json",
        "Assets.xcassets/some_image/Contents.json",
        "Assets.xcassets/some_image/some_image.png",
    ]);

    let mut a2 = mock_target(
        "A 2",
        "//app/A:A",
        Product::new(ProductType::Application, "A", "z/A.app"),
    );
    a2.build_settings = settings(&[
        ("PRODUCT_MODULE_NAME", SettingValue::from("_Stubbed_A")),
        ("T", SettingValue::from("43")),
        ("Z", SettingValue::from("0")),
    ]);
    a2.frameworks = project_paths(&["a/Fram.framework"]);
    a2.swiftmodules = [FilePath::generated("x/y.swiftmodule")].into();
    a2.resource_bundles = ["r1/R1.bundle".to_string()].into();
    a2.inputs.resources = project_paths(&[
        "es.lproj/Localized.strings",
        "es.lproj/Example.strings",
        "Base.lproj/Example.xib",
        "en.lproj/Localized.strings",
        "en.lproj/Example.strings",
    ]);
    a2.links = vec!["a/c.a".to_string(), "z/A.a".to_string()];
    a2.dependencies = ids(&["C 1", "A 1", "R 1"]);

    let mut b1 = mock_target(
        "B 1",
        "//x:b",
        Product::new(ProductType::StaticFramework, "b", "a/b.framework"),
    );
    b1.modulemaps = project_paths(&["a/module.modulemap"]);
    b1.swiftmodules = [FilePath::generated("x/y.swiftmodule")].into();
    b1.inputs.srcs = vec![FilePath::project("z.h"), FilePath::project("z.mm")];
    b1.inputs.hdrs = project_paths(&["d.h"]);
    b1.dependencies = ids(&["A 1"]);

    // "B 2" not linking "z/A.a" is what makes the "A 1" -> "A 2" merge
    // legal: the test bundle loads the host instead of linking the
    // library directly.
    let mut b2 = mock_target(
        "B 2",
        "//x/tests:B",
        Product::new(ProductType::UnitTestBundle, "B", "B.xctest"),
    );
    b2.test_host = Some(TargetId::from("A 2"));
    b2.links = vec!["a/b.framework".to_string()];
    b2.dependencies = ids(&["A 2", "B 1"]);

    let mut b3 = mock_target(
        "B 3",
        "//x/uitests:B3",
        Product::new(ProductType::UiTestBundle, "B3", "B3.xctest"),
    );
    b3.test_host = Some(TargetId::from("A 2"));
    b3.links = vec!["a/b.framework".to_string()];
    b3.dependencies = ids(&["A 2", "B 1"]);

    let mut c1 = mock_target(
        "C 1",
        "//a/b:c",
        Product::new(ProductType::StaticLibrary, "c", "a/c.a"),
    );
    c1.modulemaps = [FilePath::generated("a/b/module.modulemap")].into();
    c1.inputs.srcs = vec![FilePath::project("a/b/c.m")];
    c1.inputs.hdrs = project_paths(&["a/b/c.h"]);

    let mut c2 = mock_target(
        "C 2",
        "//a/b:d",
        Product::new(ProductType::CommandLineTool, "d", "d"),
    );
    c2.inputs.srcs = vec![FilePath::project("a/b/d.m")];
    c2.links = vec!["a/c.a".to_string()];
    c2.dependencies = ids(&["C 1"]);

    let mut e1 = mock_target(
        "E1",
        "//e1:E1",
        Product::new(ProductType::StaticLibrary, "E1", "e1/E.a"),
    );
    e1.platform = Platform::new(Os::WatchOs, "x86_64", "9.1");
    e1.is_swift = true;
    e1.inputs.srcs = vec![FilePath::external("a_repo/a.swift")];

    let mut e2 = mock_target(
        "E2",
        "//e2:E2",
        Product::new(ProductType::StaticLibrary, "E2", "e2/E.a"),
    );
    e2.platform = Platform::new(Os::TvOs, "arm64", "9.1");
    e2.is_swift = true;
    e2.inputs.srcs = vec![FilePath::external("another_repo/b.swift")];

    let mut r1 = mock_target(
        "R 1",
        "//r1:R1",
        Product::new(ProductType::Bundle, "R1", "r1/R1.bundle"),
    );
    r1.inputs.resources = project_paths(&[
        "r1/X.txt",
        "r1/Assets.xcassets/Contents.json",
        "r1/Assets.xcassets/image/Contents.json",
        "r1/Assets.xcassets/image/image.png",
    ]);
    r1.inputs
        .resources
        .insert(FilePath::project("r1/nested").folder());
    r1.inputs
        .resources
        .insert(FilePath::project("r1/dir").folder());

    vec![a1, a2, b1, b2, b3, c1, c2, e1, e2, r1]
}

/// The worked-example project: "A 1" may merge into "A 2", names
/// collide on "A", and every phase and setting shape appears at least
/// once.
pub fn sample_project() -> Project {
    let mut extra_files = project_paths(&[
        "a/a.h",
        "a/c.h",
        "a/d/a.h",
        "a/module.modulemap",
        "a/Fram.framework/Fram",
        "a/Fram.framework/Headers/Fram.h",
    ]);
    extra_files.insert(FilePath::generated("a1b2c/bin/t.c"));
    extra_files.insert(FilePath::generated("a/b/module.modulemap"));

    Project::new(
        "App",
        Label::parse("//:proj").expect("fixture label"),
        settings(&[
            ("ALWAYS_SEARCH_USER_PATHS", SettingValue::Bool(false)),
            ("COPY_PHASE_STRIP", SettingValue::Bool(false)),
            ("ONLY_ACTIVE_ARCH", SettingValue::Bool(true)),
        ]),
        targets(),
        [(TargetId::from("A 1"), ids(&["A 2"]))].into(),
        BTreeSet::new(),
        extra_files,
    )
    .expect("fixture project")
}

/// Same project, except "B 2" holds a direct link edge on "A 1"'s
/// product, which must reject the merge.
pub fn project_with_link_on_merge_source() -> Project {
    let mut project = sample_project();
    project
        .targets
        .get_mut(&TargetId::from("B 2"))
        .expect("fixture target")
        .links
        .push("z/A.a".to_string());
    project
}
