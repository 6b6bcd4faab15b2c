//! Product descriptors.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Application,
    AppExtension,
    Framework,
    StaticFramework,
    StaticLibrary,
    DynamicLibrary,
    UnitTestBundle,
    UiTestBundle,
    Bundle,
    CommandLineTool,
}

impl ProductType {
    /// Wrapper-style products that package their contents into a bundle
    /// directory. These are the products that carry resource and
    /// embed-frameworks phases.
    pub fn is_bundle(&self) -> bool {
        matches!(
            self,
            ProductType::Application
                | ProductType::AppExtension
                | ProductType::Framework
                | ProductType::StaticFramework
                | ProductType::UnitTestBundle
                | ProductType::UiTestBundle
                | ProductType::Bundle
        )
    }

    pub fn is_test_bundle(&self) -> bool {
        matches!(
            self,
            ProductType::UnitTestBundle | ProductType::UiTestBundle
        )
    }

    /// Whether the IDE requires the target to carry a compile-sources
    /// phase. Plain resource bundles are the only exception.
    pub fn needs_compile_phase(&self) -> bool {
        !matches!(self, ProductType::Bundle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub kind: ProductType,
    pub name: String,
    /// Declared output path, relative to the workspace output root.
    pub path: String,
}

impl Product {
    pub fn new(kind: ProductType, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            path: path.into(),
        }
    }

    /// File name of the product as placed in the Products group.
    pub fn basename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basename_is_final_component() {
        let product = Product::new(ProductType::Application, "A", "z/A.app");
        assert_eq!(product.basename(), "A.app");

        let tool = Product::new(ProductType::CommandLineTool, "d", "d");
        assert_eq!(tool.basename(), "d");
    }

    #[test]
    fn bundle_predicates() {
        assert!(ProductType::Application.is_bundle());
        assert!(ProductType::UnitTestBundle.is_bundle());
        assert!(!ProductType::StaticLibrary.is_bundle());
        assert!(!ProductType::CommandLineTool.is_bundle());

        assert!(ProductType::UiTestBundle.is_test_bundle());
        assert!(!ProductType::Framework.is_test_bundle());

        assert!(ProductType::StaticLibrary.needs_compile_phase());
        assert!(!ProductType::Bundle.needs_compile_phase());
    }
}
