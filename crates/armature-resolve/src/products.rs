//! Product catalog
//!
//! One product placeholder per final target, addressable by target id
//! and by output path. Insertion order is preserved and drives the
//! Products group in the output tree.

use std::collections::{BTreeMap, HashMap};

use armature_core::{Product, TargetId};
use indexmap::IndexMap;
use tracing::debug;

use crate::disambiguate::DisambiguatedTarget;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductEntry {
    pub target: TargetId,
    pub product: Product,
}

#[derive(Debug, Clone, Default)]
pub struct Products {
    by_target: IndexMap<TargetId, ProductEntry>,
    by_path: HashMap<String, TargetId>,
}

impl Products {
    pub fn insert(&mut self, target: TargetId, product: Product) {
        match self.by_path.entry(product.path.clone()) {
            std::collections::hash_map::Entry::Occupied(existing) => {
                // The first producer of a path owns the path index; later
                // ones stay addressable by target id.
                debug!(
                    path = %product.path,
                    first = %existing.get(),
                    second = %target,
                    "duplicate product output path"
                );
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(target.clone());
            }
        }
        self.by_target
            .insert(target.clone(), ProductEntry { target, product });
    }

    pub fn by_target(&self, id: &TargetId) -> Option<&ProductEntry> {
        self.by_target.get(id)
    }

    pub fn by_path(&self, path: &str) -> Option<&ProductEntry> {
        self.by_path.get(path).and_then(|id| self.by_target.get(id))
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ProductEntry> {
        self.by_target.values()
    }

    pub fn len(&self) -> usize {
        self.by_target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }
}

/// Allocate one product per final target, in sorted target-id order.
pub fn build_products(targets: &BTreeMap<TargetId, DisambiguatedTarget>) -> Products {
    let mut products = Products::default();
    for (id, disambiguated) in targets {
        products.insert(id.clone(), disambiguated.target.product.clone());
    }
    products
}

#[cfg(test)]
mod tests {
    use super::*;
    use armature_core::ProductType;
    use pretty_assertions::assert_eq;

    fn product(name: &str, path: &str) -> Product {
        Product::new(ProductType::StaticLibrary, name, path)
    }

    #[test]
    fn lookup_by_either_key() {
        let mut products = Products::default();
        products.insert(TargetId::from("A 1"), product("a", "z/A.a"));
        products.insert(TargetId::from("C 1"), product("c", "a/c.a"));

        assert_eq!(
            products.by_target(&TargetId::from("A 1")).unwrap().product.name,
            "a"
        );
        assert_eq!(
            products.by_path("a/c.a").unwrap().target,
            TargetId::from("C 1")
        );
        assert!(products.by_path("missing").is_none());
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut products = Products::default();
        products.insert(TargetId::from("Z"), product("z", "z/z.a"));
        products.insert(TargetId::from("A"), product("a", "a/a.a"));

        let order: Vec<&str> = products.iter().map(|e| e.target.as_str()).collect();
        assert_eq!(order, vec!["Z", "A"]);
    }

    #[test]
    fn duplicate_paths_keep_the_first_index_entry() {
        let mut products = Products::default();
        products.insert(TargetId::from("E1"), product("E1", "e/E.a"));
        products.insert(TargetId::from("E2"), product("E2", "e/E.a"));

        assert_eq!(
            products.by_path("e/E.a").unwrap().target,
            TargetId::from("E1")
        );
        assert_eq!(products.len(), 2);
        assert_eq!(
            products.by_target(&TargetId::from("E2")).unwrap().product.name,
            "E2"
        );
    }
}
