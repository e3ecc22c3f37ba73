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

//! The assembled message instance tree.
//!
//! Assembly produces a [`Message`]: an insertion-ordered tree of segment
//! and group instance nodes, the raw extension side channel, and the
//! structural error list. The tree is never mutated after assembly;
//! projection builds derived output from it.

use crate::project::{self, Projected, Projection, ProjectionMode};
use er7_core::{Delimiters, SegmentValue};
use er7_grammar::{CompiledGrammar, Grammar, Group, Restrictions, Span};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A structural mismatch found during assembly: a line whose identifier
/// matched none of the currently expected grammar positions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructuralError {
    /// Input line number, 1-based.
    pub line: usize,
    /// The identifier found on the line.
    pub found: String,
    /// Identifiers that were legal at that point.
    pub expected: Vec<String>,
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expected any of [{}], found {} at line {}",
            self.expected.join(", "),
            self.found,
            self.line
        )
    }
}

/// Occurrences of one grammar segment position.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentEntry {
    /// Segment code.
    pub identifier: String,
    /// Declared grammar index of the position.
    pub index: usize,
    /// Cardinality constraints on the position.
    pub restrictions: Restrictions,
    /// Captured occurrences in input order.
    pub occurrences: Vec<SegmentValue>,
}

impl SegmentEntry {
    pub fn new(identifier: impl Into<String>, index: usize, restrictions: Restrictions) -> Self {
        Self {
            identifier: identifier.into(),
            index,
            restrictions,
            occurrences: Vec::new(),
        }
    }
}

/// Occurrences of one group, plus its nested group nodes.
///
/// Each occurrence is its own map of segment entries; nested groups hang
/// off the group node itself, not off individual occurrences.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupInstance {
    /// Group name.
    pub name: String,
    /// Cardinality constraints on the group.
    pub restrictions: Restrictions,
    /// Positions the group covers.
    pub span: Span,
    /// Captured occurrences in input order.
    pub occurrences: Vec<InstanceMap>,
    /// Nested group nodes, keyed like the parent tree.
    pub subgroups: InstanceMap,
}

impl GroupInstance {
    pub fn new(name: impl Into<String>, restrictions: Restrictions, span: Span) -> Self {
        Self {
            name: name.into(),
            restrictions,
            span,
            occurrences: Vec::new(),
            subgroups: InstanceMap::new(),
        }
    }
}

/// One node of the instance tree.
#[derive(Debug, Clone, PartialEq)]
pub enum InstanceNode {
    Segment(SegmentEntry),
    Group(GroupInstance),
}

/// Insertion-ordered map of instance nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceMap {
    order: Vec<String>,
    entries: BTreeMap<String, InstanceNode>,
}

impl InstanceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the map holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Node stored under `key`.
    pub fn get(&self, key: &str) -> Option<&InstanceNode> {
        self.entries.get(key)
    }

    /// Key/node pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InstanceNode)> {
        self.order
            .iter()
            .map(|k| (k.as_str(), &self.entries[k]))
    }

    /// Segment entry under `key`, created with `make` on first use.
    /// Returns `None` if the key already holds a group node.
    pub(crate) fn segment_entry(
        &mut self,
        key: &str,
        make: impl FnOnce() -> SegmentEntry,
    ) -> Option<&mut SegmentEntry> {
        if !self.entries.contains_key(key) {
            self.order.push(key.to_string());
            self.entries
                .insert(key.to_string(), InstanceNode::Segment(make()));
        }
        match self.entries.get_mut(key) {
            Some(InstanceNode::Segment(entry)) => Some(entry),
            _ => None,
        }
    }

    /// Group node under `key`, created with `make` on first use.
    /// Returns `None` if the key already holds a segment node.
    pub(crate) fn group_entry(
        &mut self,
        key: &str,
        make: impl FnOnce() -> GroupInstance,
    ) -> Option<&mut GroupInstance> {
        if !self.entries.contains_key(key) {
            self.order.push(key.to_string());
            self.entries
                .insert(key.to_string(), InstanceNode::Group(make()));
        }
        match self.entries.get_mut(key) {
            Some(InstanceNode::Group(group)) => Some(group),
            _ => None,
        }
    }
}

/// A fully assembled message.
#[derive(Debug, Clone)]
pub struct Message {
    pub(crate) header: SegmentValue,
    pub(crate) version: String,
    pub(crate) message_code: String,
    pub(crate) trigger_event: String,
    pub(crate) delimiters: Delimiters,
    pub(crate) compiled: Arc<CompiledGrammar>,
    pub(crate) root: InstanceMap,
    pub(crate) extensions: Vec<String>,
    pub(crate) errors: Vec<StructuralError>,
    pub(crate) valid: bool,
}

impl Message {
    /// The decoded header segment.
    pub fn header(&self) -> &SegmentValue {
        &self.header
    }

    /// The schema version declared by the header.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Message code from the header, e.g. `ADT`.
    pub fn message_code(&self) -> &str {
        &self.message_code
    }

    /// Trigger event from the header, e.g. `A01`.
    pub fn trigger_event(&self) -> &str {
        &self.trigger_event
    }

    /// Delimiters resolved from the header.
    pub fn delimiters(&self) -> Delimiters {
        self.delimiters
    }

    /// The grammar this message was assembled against.
    pub fn grammar(&self) -> &Grammar {
        self.compiled.grammar()
    }

    /// The top-level instance tree (header excluded).
    pub fn root(&self) -> &InstanceMap {
        &self.root
    }

    /// Raw extension segment lines routed to the side channel.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Structural mismatches found during assembly.
    pub fn errors(&self) -> &[StructuralError] {
        &self.errors
    }

    /// Returns true if assembly found no structural mismatches.
    ///
    /// Cardinality conformance is checked at projection time; see
    /// [`Projection::valid`].
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Project to plain nested JSON.
    pub fn to_json(&self, mode: ProjectionMode) -> Projection<JsonValue> {
        project::to_json(self, mode)
    }

    /// Project to a typed view borrowing the segment instances.
    pub fn to_typed(&self, mode: ProjectionMode) -> Projection<Projected<'_>> {
        project::to_typed(self, mode)
    }

    /// Re-encode the captured structure as ER7 text, one segment per CR,
    /// header first. Lines dropped during assembly are not resurrected.
    pub fn encode(&self) -> String {
        let mut lines = vec![self.encode_header_line()];
        collect_lines(&self.root, &mut lines);
        lines.extend(self.extensions.iter().cloned());
        lines.join("\r")
    }

    // Field 1 of the header is the field delimiter itself; rendering
    // starts at field 2 so the delimiter is not doubled.
    fn encode_header_line(&self) -> String {
        let field = self.delimiters.field;
        let mut line = String::from(self.header.code());
        for position in 2..=self.header.max_field() {
            line.push(field);
            if let Some(text) = self.header.field_text(position) {
                line.push_str(&text);
            }
        }
        line
    }
}

/// Tree key for a group node: qualified by its span when known, so
/// groups recurring at different positions stay distinct.
pub(crate) fn group_key(name: &str, info: &Group) -> String {
    if info.span.start > 0 && info.span.stop > 0 {
        format!("{}_{}_{}", name, info.span.start, info.span.stop)
    } else {
        name.to_string()
    }
}

fn collect_lines(map: &InstanceMap, lines: &mut Vec<String>) {
    for (_, node) in map.iter() {
        match node {
            InstanceNode::Segment(entry) => {
                lines.extend(entry.occurrences.iter().map(SegmentValue::to_string));
            }
            InstanceNode::Group(group) => {
                for occurrence in &group.occurrences {
                    collect_lines(occurrence, lines);
                }
                collect_lines(&group.subgroups, lines);
            }
        }
    }
}
