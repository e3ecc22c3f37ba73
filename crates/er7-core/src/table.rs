// ER7 - message-structure engine for HL7v2
//
// Copyright (c) 2026 er7 contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Component alias tables.
//!
//! A [`ComponentTable`] maps component names to 1-based positions and
//! per-version child types. Concrete segment and data-type catalogs are
//! supplied by callers as static configuration; this module only carries
//! the lookup machinery: alias forwarding, version-variant type selection,
//! and positional reverse lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

/// The kind of child a component decodes into.
///
/// Version-variant field shapes resolve to one of these tags at
/// tree-construction time; there is no runtime type inspection.
#[derive(Debug, Clone)]
pub enum TypeKind {
    /// A scalar leaf.
    Primitive,
    /// A nested composite tree described by its own table.
    Composite(Arc<ComponentTable>),
}

/// One candidate child type, applicable to a list of schema versions.
#[derive(Debug, Clone)]
pub struct TypeCandidate {
    /// Versions this candidate applies to.
    pub versions: Vec<String>,
    /// The child type used for those versions.
    pub kind: TypeKind,
}

/// Configuration for one named component of a tree.
#[derive(Debug, Clone)]
pub struct ComponentSpec {
    /// 1-based position within the tree.
    pub position: usize,
    /// Forward to another entry's position/type configuration.
    pub alias_of: Option<String>,
    /// Version-tagged type candidates, checked in order.
    pub data_types: Vec<TypeCandidate>,
    /// Fallback type when no candidate matches the node's version.
    pub default_kind: TypeKind,
    /// Whether the component may repeat (segment field tier only).
    pub repeats: bool,
}

impl ComponentSpec {
    /// A primitive component at `position`.
    pub fn at(position: usize) -> Self {
        Self {
            position,
            alias_of: None,
            data_types: Vec::new(),
            default_kind: TypeKind::Primitive,
            repeats: false,
        }
    }

    /// A composite component at `position` described by `table`.
    pub fn composite(position: usize, table: Arc<ComponentTable>) -> Self {
        Self {
            position,
            alias_of: None,
            data_types: Vec::new(),
            default_kind: TypeKind::Composite(table),
            repeats: false,
        }
    }

    /// An entry forwarding to another entry's configuration.
    pub fn alias(of: impl Into<String>) -> Self {
        Self {
            position: 0,
            alias_of: Some(of.into()),
            data_types: Vec::new(),
            default_kind: TypeKind::Primitive,
            repeats: false,
        }
    }

    /// Mark the component as repeatable.
    pub fn repeating(mut self) -> Self {
        self.repeats = true;
        self
    }

    /// Add a version-tagged type candidate.
    pub fn versioned(mut self, versions: &[&str], kind: TypeKind) -> Self {
        self.data_types.push(TypeCandidate {
            versions: versions.iter().map(|v| v.to_string()).collect(),
            kind,
        });
        self
    }
}

/// Name → component configuration for one tree shape.
///
/// Projection (`to_json`) iterates entries in declaration order, so the
/// table keeps an explicit order list alongside the name map.
#[derive(Debug, Clone, Default)]
pub struct ComponentTable {
    components: BTreeMap<String, ComponentSpec>,
    order: Vec<String>,
}

impl ComponentTable {
    /// Create an empty table (purely positional decoding).
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a component entry, keeping declaration order.
    pub fn insert(&mut self, name: impl Into<String>, spec: ComponentSpec) {
        let name = name.into();
        if !self.components.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.components.insert(name, spec);
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, spec: ComponentSpec) -> Self {
        self.insert(name, spec);
        self
    }

    /// Wrap the table for sharing across trees.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Returns true if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Component names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Look up an entry without following aliases.
    pub fn get(&self, name: &str) -> Option<&ComponentSpec> {
        self.components.get(name)
    }

    /// Resolve an entry to its terminal, non-aliased configuration.
    ///
    /// Well-formed schemas are acyclic; a hop budget guards against
    /// malformed alias chains that loop.
    pub fn resolve(&self, name: &str) -> Option<&ComponentSpec> {
        let mut current = self.components.get(name)?;
        let mut hops = 0;
        while let Some(target) = current.alias_of.as_deref() {
            hops += 1;
            if hops > self.components.len() {
                return None;
            }
            current = self.components.get(target)?;
        }
        Some(current)
    }

    /// Select the child type for `name` under `version`: the first
    /// candidate whose version list contains it, else the default.
    pub fn kind_for(&self, name: &str, version: &str) -> Option<&TypeKind> {
        let spec = self.resolve(name)?;
        for candidate in &spec.data_types {
            if candidate.versions.iter().any(|v| v == version) {
                return Some(&candidate.kind);
            }
        }
        Some(&spec.default_kind)
    }

    /// The terminal entry name occupying `position`, if any.
    pub fn name_at_position(&self, position: usize) -> Option<&str> {
        self.order.iter().map(String::as_str).find(|name| {
            let spec = &self.components[*name];
            spec.alias_of.is_none() && spec.position == position
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> ComponentTable {
        let address = ComponentTable::new()
            .with("StreetAddress", ComponentSpec::at(1))
            .with("City", ComponentSpec::at(3));
        ComponentTable::new()
            .with("FamilyName", ComponentSpec::at(1))
            .with("GivenName", ComponentSpec::at(2))
            .with("Address", ComponentSpec::composite(3, address.shared()))
            .with("Surname", ComponentSpec::alias("FamilyName"))
    }

    // ==================== Lookup tests ====================

    #[test]
    fn test_names_keep_declaration_order() {
        let t = sample_table();
        let names: Vec<&str> = t.names().collect();
        assert_eq!(names, vec!["FamilyName", "GivenName", "Address", "Surname"]);
    }

    #[test]
    fn test_resolve_plain_entry() {
        let t = sample_table();
        assert_eq!(t.resolve("GivenName").unwrap().position, 2);
    }

    #[test]
    fn test_resolve_alias_to_terminal() {
        let t = sample_table();
        assert_eq!(t.resolve("Surname").unwrap().position, 1);
    }

    #[test]
    fn test_resolve_alias_chain() {
        let t = ComponentTable::new()
            .with("A", ComponentSpec::at(5))
            .with("B", ComponentSpec::alias("A"))
            .with("C", ComponentSpec::alias("B"));
        assert_eq!(t.resolve("C").unwrap().position, 5);
    }

    #[test]
    fn test_resolve_alias_cycle_guard() {
        let t = ComponentTable::new()
            .with("A", ComponentSpec::alias("B"))
            .with("B", ComponentSpec::alias("A"));
        assert!(t.resolve("A").is_none());
    }

    #[test]
    fn test_name_at_position_skips_aliases() {
        let t = sample_table();
        // Surname forwards to FamilyName; position 1 belongs to the terminal
        assert_eq!(t.name_at_position(1), Some("FamilyName"));
        assert_eq!(t.name_at_position(3), Some("Address"));
        assert_eq!(t.name_at_position(9), None);
    }

    // ==================== Version selection tests ====================

    #[test]
    fn test_kind_for_default() {
        let t = sample_table();
        assert!(matches!(
            t.kind_for("FamilyName", "2.5.1"),
            Some(TypeKind::Primitive)
        ));
    }

    #[test]
    fn test_kind_for_versioned_candidate() {
        let wide = ComponentTable::new()
            .with("Id", ComponentSpec::at(1))
            .shared();
        let t = ComponentTable::new().with(
            "Identifier",
            ComponentSpec::at(1).versioned(&["2.7", "2.7.1"], TypeKind::Composite(wide)),
        );
        assert!(matches!(
            t.kind_for("Identifier", "2.7"),
            Some(TypeKind::Composite(_))
        ));
        assert!(matches!(
            t.kind_for("Identifier", "2.5.1"),
            Some(TypeKind::Primitive)
        ));
    }

    #[test]
    fn test_kind_for_through_alias() {
        let inner = ComponentTable::new()
            .with("X", ComponentSpec::at(1))
            .shared();
        let t = ComponentTable::new()
            .with("Real", ComponentSpec::composite(2, inner))
            .with("Alias", ComponentSpec::alias("Real"));
        assert!(matches!(
            t.kind_for("Alias", "2.5.1"),
            Some(TypeKind::Composite(_))
        ));
    }
}
