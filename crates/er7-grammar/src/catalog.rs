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

//! Versioned structure catalogs.
//!
//! A [`StructureCatalog`] maps schema versions to grammar halves. A
//! version entry may hold the data inline or forward to another version
//! that does (consecutive standard releases frequently share one
//! structure). Sequences and groups forward independently.

use crate::model::{Grammar, Group, Position};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A version entry: inline data or a forward to another version.
#[derive(Debug, Clone)]
pub enum VersionRef<T> {
    /// The data itself.
    Inline(T),
    /// Use the named version's entry instead.
    Ref(String),
}

/// The two grammar halves registered for one version.
#[derive(Debug, Clone)]
pub struct VersionSlot {
    /// Ordered position list, or a forward.
    pub sequences: VersionRef<Arc<Vec<Position>>>,
    /// Group descriptor tree, or a forward.
    pub groups: VersionRef<Arc<BTreeMap<String, Group>>>,
}

impl VersionSlot {
    /// An inline entry holding both halves.
    pub fn inline(positions: Vec<Position>, groups: BTreeMap<String, Group>) -> Self {
        Self {
            sequences: VersionRef::Inline(Arc::new(positions)),
            groups: VersionRef::Inline(Arc::new(groups)),
        }
    }

    /// An entry forwarding both halves to another version.
    pub fn same_as(version: impl Into<String>) -> Self {
        let version = version.into();
        Self {
            sequences: VersionRef::Ref(version.clone()),
            groups: VersionRef::Ref(version),
        }
    }
}

/// Per-message-kind static structure table, keyed by schema version.
#[derive(Debug, Clone, Default)]
pub struct StructureCatalog {
    versions: BTreeMap<String, VersionSlot>,
}

impl StructureCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a version entry.
    pub fn insert(&mut self, version: impl Into<String>, slot: VersionSlot) {
        self.versions.insert(version.into(), slot);
    }

    /// Builder-style insert.
    pub fn with(mut self, version: impl Into<String>, slot: VersionSlot) -> Self {
        self.insert(version, slot);
        self
    }

    /// Returns true if the catalog carries an entry for `version`.
    pub fn supports(&self, version: &str) -> bool {
        self.versions.contains_key(version)
    }

    /// Registered versions in order.
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.versions.keys().map(String::as_str)
    }

    /// Position list for `version`, following forwards to a terminal
    /// inline entry. Forward chains are bounded by the catalog size to
    /// guard malformed tables that loop.
    pub fn sequences_for(&self, version: &str) -> Option<Arc<Vec<Position>>> {
        let mut current = version;
        for _ in 0..=self.versions.len() {
            match &self.versions.get(current)?.sequences {
                VersionRef::Inline(data) => return Some(Arc::clone(data)),
                VersionRef::Ref(target) => current = target,
            }
        }
        None
    }

    /// Group tree for `version`, following forwards independently of the
    /// sequence half.
    pub fn groups_for(&self, version: &str) -> Option<Arc<BTreeMap<String, Group>>> {
        let mut current = version;
        for _ in 0..=self.versions.len() {
            match &self.versions.get(current)?.groups {
                VersionRef::Inline(data) => return Some(Arc::clone(data)),
                VersionRef::Ref(target) => current = target,
            }
        }
        None
    }

    /// Assemble the full grammar for `version`.
    pub fn grammar_for(&self, version: &str) -> Option<Grammar> {
        let sequences = self.sequences_for(version)?;
        let groups = self.groups_for(version)?;
        Some(Grammar::new(sequences, groups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restrictions::Restrictions;

    fn base_positions() -> Vec<Position> {
        vec![
            Position::segment(0, "MSH", Restrictions::required()),
            Position::segment(1, "EVN", Restrictions::required()),
        ]
    }

    // ==================== Forwarding tests ====================

    #[test]
    fn test_inline_entry() {
        let c = StructureCatalog::new()
            .with("2.5", VersionSlot::inline(base_positions(), BTreeMap::new()));
        assert!(c.supports("2.5"));
        assert_eq!(c.sequences_for("2.5").unwrap().len(), 2);
    }

    #[test]
    fn test_ref_follows_to_inline() {
        let c = StructureCatalog::new()
            .with("2.5", VersionSlot::inline(base_positions(), BTreeMap::new()))
            .with("2.5.1", VersionSlot::same_as("2.5"))
            .with("2.6", VersionSlot::same_as("2.5.1"));
        let g = c.grammar_for("2.6").unwrap();
        assert_eq!(g.len(), 2);
        // Both chain hops resolve to the same shared list
        assert!(Arc::ptr_eq(
            &c.sequences_for("2.5.1").unwrap(),
            &c.sequences_for("2.6").unwrap()
        ));
    }

    #[test]
    fn test_ref_cycle_guard() {
        let c = StructureCatalog::new()
            .with("a", VersionSlot::same_as("b"))
            .with("b", VersionSlot::same_as("a"));
        assert!(c.sequences_for("a").is_none());
        assert!(c.groups_for("a").is_none());
    }

    #[test]
    fn test_unknown_version() {
        let c = StructureCatalog::new();
        assert!(!c.supports("2.5"));
        assert!(c.grammar_for("2.5").is_none());
    }
}
