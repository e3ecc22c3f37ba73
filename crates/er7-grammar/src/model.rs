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

//! The per-version grammar model: an ordered position list plus a group
//! descriptor tree.
//!
//! Position 0 is reserved for the header segment. Position indices are
//! strictly increasing and correspond 1:1 to list offsets; [`Grammar`]
//! instances are built once per (message kind, version) and shared
//! read-only across parses.

use crate::restrictions::Restrictions;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A half-open-free inclusive span over the position list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// First position covered.
    pub start: usize,
    /// Last position covered.
    pub stop: usize,
}

impl Span {
    pub fn new(start: usize, stop: usize) -> Self {
        Self { start, stop }
    }
}

/// One entry in the ordered grammar sequence.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Declared index; equal to the entry's offset in the position list.
    pub index: usize,
    /// Segment identifier expected at this position.
    pub identifier: String,
    /// Enclosing group names, outermost first; empty when top-level.
    pub group_path: Vec<String>,
    /// Cardinality constraints on the position itself.
    pub restrictions: Restrictions,
}

impl Position {
    /// A top-level segment position.
    pub fn segment(index: usize, identifier: impl Into<String>, restrictions: Restrictions) -> Self {
        Self {
            index,
            identifier: identifier.into(),
            group_path: Vec::new(),
            restrictions,
        }
    }

    /// Place the position inside a group path, outermost name first.
    pub fn grouped(mut self, path: &[&str]) -> Self {
        self.group_path = path.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Returns true if the position sits inside a group.
    pub fn is_grouped(&self) -> bool {
        !self.group_path.is_empty()
    }
}

/// One group descriptor: cardinality, covered span, and nested subgroups.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Group {
    /// Cardinality constraints on the group as a whole.
    pub restrictions: Restrictions,
    /// Positions the group covers, inclusive.
    pub span: Span,
    /// Nested groups, keyed by name.
    pub subgroups: BTreeMap<String, Group>,
}

impl Group {
    pub fn new(restrictions: Restrictions, span: Span) -> Self {
        Self {
            restrictions,
            span,
            subgroups: BTreeMap::new(),
        }
    }

    /// Builder-style nested group insert.
    pub fn with_subgroup(mut self, name: impl Into<String>, group: Group) -> Self {
        self.subgroups.insert(name.into(), group);
        self
    }
}

/// A complete per-version grammar: the position list and the group tree.
///
/// Both halves are reference-counted so one grammar can back many
/// concurrent parses without copying.
#[derive(Debug, Clone)]
pub struct Grammar {
    positions: Arc<Vec<Position>>,
    groups: Arc<BTreeMap<String, Group>>,
}

impl Grammar {
    pub fn new(positions: Arc<Vec<Position>>, groups: Arc<BTreeMap<String, Group>>) -> Self {
        Self { positions, groups }
    }

    /// Build from owned parts.
    pub fn from_parts(positions: Vec<Position>, groups: BTreeMap<String, Group>) -> Self {
        Self::new(Arc::new(positions), Arc::new(groups))
    }

    /// Number of grammar positions, header included.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if the grammar carries no positions.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// The ordered position list.
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// The position at `index`, if within the grammar.
    pub fn position(&self, index: usize) -> Option<&Position> {
        self.positions.get(index)
    }

    /// The top-level group tree.
    pub fn groups(&self) -> &BTreeMap<String, Group> {
        &self.groups
    }

    /// Resolve a group path, outermost name first, to its innermost
    /// descriptor.
    pub fn group_info(&self, path: &[String]) -> Option<&Group> {
        let mut pointer = &*self.groups;
        let mut found = None;
        for name in path {
            let group = pointer.get(name)?;
            pointer = &group.subgroups;
            found = Some(group);
        }
        found
    }
}
