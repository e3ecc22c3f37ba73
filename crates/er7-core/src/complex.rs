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

//! The composite value tree.
//!
//! A [`ComplexValue`] is a recursive container of leaves and nested trees,
//! addressed by 1-based position or by alias name. It owns the delimiter
//! and schema-version context for itself and its children. Position 0 is
//! never populated; 1-based addressing mirrors the wire format's own
//! field numbering.

use crate::delimiters::{find_delimiter, DEFAULT_COMPONENT, DEFAULT_REPETITION, DEFAULT_SUBCOMPONENT, DEFAULT_VERSION};
use crate::table::{ComponentTable, TypeKind};
use crate::value::{Node, PrimitiveValue, RawValue};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Delimiter and version context for one tree level.
#[derive(Debug, Clone)]
pub struct ComplexConfig {
    /// Schema version governing per-component type selection.
    pub version: String,
    /// Delimiter joining this node's children.
    pub delimiter: char,
    /// Delimiter handed down to children as their own tier, if any.
    pub sub_delimiter: Option<char>,
    /// Repetition tier for repeatable components (segment field level only).
    pub repetition_delimiter: Option<char>,
}

impl Default for ComplexConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            delimiter: DEFAULT_COMPONENT,
            sub_delimiter: Some(DEFAULT_SUBCOMPONENT),
            repetition_delimiter: None,
        }
    }
}

impl ComplexConfig {
    /// Component-level context for `version`.
    pub fn component(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }
}

/// A recursive composite value: ordered 1-based children reachable by
/// position or by alias name.
#[derive(Debug, Clone)]
pub struct ComplexValue {
    pub(crate) version: String,
    pub(crate) delimiter: char,
    pub(crate) sub_delimiter: Option<char>,
    pub(crate) repetition_delimiter: Option<char>,
    pub(crate) primitive_index: usize,
    pub(crate) array_start: usize,
    pub(crate) table: Arc<ComponentTable>,
    pub(crate) values: BTreeMap<usize, Node>,
}

impl PartialEq for ComplexValue {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.delimiter == other.delimiter
            && self.sub_delimiter == other.sub_delimiter
            && self.values == other.values
    }
}

impl ComplexValue {
    /// Create an empty tree with the given context and alias table.
    pub fn empty(config: ComplexConfig, table: Arc<ComponentTable>) -> Self {
        Self {
            version: config.version,
            delimiter: config.delimiter,
            sub_delimiter: config.sub_delimiter,
            repetition_delimiter: config.repetition_delimiter,
            primitive_index: 1,
            array_start: 1,
            table,
            values: BTreeMap::new(),
        }
    }

    /// Create a tree and populate it from `value`.
    pub fn new(
        value: impl Into<RawValue>,
        config: ComplexConfig,
        table: Arc<ComponentTable>,
    ) -> Self {
        let mut tree = Self::empty(config, table);
        tree.set_values(value.into());
        tree
    }

    /// The tree's schema version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Update the schema version; existing children keep their shape.
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    /// The delimiter joining this node's children.
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// The alias table describing this tree level.
    pub fn table(&self) -> &ComponentTable {
        &self.table
    }

    /// Assign a value using the decode dispatch rules: ordered sequences
    /// by position, named mappings through the alias table (unknown names
    /// ignored), scalars containing the delimiter split positionally, and
    /// other scalars assigned to the primitive index.
    pub fn set_values(&mut self, value: RawValue) {
        match value {
            RawValue::List(items) => self.set_list(items),
            RawValue::Map(map) => {
                for (name, v) in map {
                    if self.table.get(&name).is_some() {
                        self.set_component(&name, v);
                    }
                }
            }
            RawValue::Text(s) => {
                if find_delimiter(&s, self.delimiter).is_some() {
                    let parts: Vec<RawValue> =
                        s.split(self.delimiter).map(RawValue::from).collect();
                    self.set_list(parts);
                } else {
                    self.set_position(self.primitive_index, RawValue::Text(s));
                }
            }
        }
    }

    /// Assign an ordered sequence; element `i` lands at `i + array_start`.
    pub fn set_list(&mut self, items: Vec<RawValue>) {
        for (offset, v) in items.into_iter().enumerate() {
            self.set_position(offset + self.array_start, v);
        }
    }

    /// Assign a value at an explicit 1-based position. Tabled positions go
    /// through the alias table's type selection; untabled positions keep
    /// the raw value as best-effort data.
    pub fn set_position(&mut self, position: usize, value: RawValue) {
        if position == 0 {
            return;
        }
        if let Some(name) = self.table.name_at_position(position) {
            let name = name.to_string();
            self.set_component(&name, value);
        } else {
            let node = self.untabled_node(value);
            self.values.insert(position, node);
        }
    }

    /// Assign a value through a named alias entry.
    pub fn set_component(&mut self, name: &str, value: RawValue) {
        let Some(spec) = self.table.resolve(name) else {
            return;
        };
        let position = spec.position;
        if position == 0 {
            return;
        }
        let repeats = spec.repeats;
        let Some(kind) = self.table.kind_for(name, &self.version).cloned() else {
            return;
        };
        let node = if repeats && self.repetition_delimiter.is_some() {
            self.repeated_node(value, &kind)
        } else {
            self.child_node(value, &kind)
        };
        self.values.insert(position, node);
    }

    /// Child reachable through an alias entry.
    pub fn component(&self, name: &str) -> Option<&Node> {
        let spec = self.table.resolve(name)?;
        self.values.get(&spec.position)
    }

    /// Child at an explicit position.
    pub fn position(&self, position: usize) -> Option<&Node> {
        self.values.get(&position)
    }

    /// Rendered string form of the child at `position`.
    pub fn position_text(&self, position: usize) -> Option<String> {
        let rep = self.repetition_delimiter.unwrap_or(DEFAULT_REPETITION);
        self.values.get(&position).map(|n| n.encode(rep))
    }

    /// Highest populated position, or 0 when empty.
    pub fn max_position(&self) -> usize {
        self.values.keys().next_back().copied().unwrap_or(0)
    }

    /// Returns true if no position is populated.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn untabled_node(&self, value: RawValue) -> Node {
        match value {
            RawValue::Text(s) => Node::Leaf(PrimitiveValue::new(s)),
            other => Node::Tree(ComplexValue::new(
                other,
                self.child_config(),
                Arc::new(ComponentTable::new()),
            )),
        }
    }

    fn child_node(&self, value: RawValue, kind: &TypeKind) -> Node {
        match kind {
            TypeKind::Primitive => match value {
                RawValue::Text(s) => Node::Leaf(PrimitiveValue::new(s)),
                other => Node::Tree(ComplexValue::new(
                    other,
                    self.child_config(),
                    Arc::new(ComponentTable::new()),
                )),
            },
            TypeKind::Composite(table) => Node::Tree(ComplexValue::new(
                value,
                self.child_config(),
                Arc::clone(table),
            )),
        }
    }

    fn repeated_node(&self, value: RawValue, kind: &TypeKind) -> Node {
        match value {
            // Ordered sequence: each element is one repetition
            RawValue::List(items) => Node::Repeated(
                items
                    .into_iter()
                    .map(|v| self.child_node(v, kind))
                    .collect(),
            ),
            // Named mapping: a single repetition
            map @ RawValue::Map(_) => Node::Repeated(vec![self.child_node(map, kind)]),
            // Scalar: split on the repetition delimiter
            RawValue::Text(s) => {
                let rep = self.repetition_delimiter.unwrap_or(DEFAULT_REPETITION);
                Node::Repeated(
                    s.split(rep)
                        .map(|part| self.child_node(RawValue::from(part), kind))
                        .collect(),
                )
            }
        }
    }

    pub(crate) fn child_config(&self) -> ComplexConfig {
        ComplexConfig {
            version: self.version.clone(),
            delimiter: self.sub_delimiter.unwrap_or(DEFAULT_SUBCOMPONENT),
            sub_delimiter: Some(DEFAULT_SUBCOMPONENT),
            repetition_delimiter: None,
        }
    }

    /// Project to a named mapping over the alias table. Alias entries
    /// project alongside their terminals; missing children project as
    /// null. Tables with no entries fall back to the ordered-array form.
    pub fn to_json(&self) -> JsonValue {
        if self.table.is_empty() {
            return self.to_array();
        }
        let mut map = Map::with_capacity(self.table.names().count());
        for name in self.table.names() {
            let value = match self.component(name) {
                Some(node) => node_to_json(node),
                None => JsonValue::Null,
            };
            map.insert(name.to_string(), value);
        }
        JsonValue::Object(map)
    }

    /// Project to an ordered array over positions 1..=max; holes project
    /// as null.
    pub fn to_array(&self) -> JsonValue {
        let max = self.max_position();
        let mut array = Vec::with_capacity(max);
        for position in 1..=max {
            let value = match self.values.get(&position) {
                Some(node) => node_to_array(node),
                None => JsonValue::Null,
            };
            array.push(value);
        }
        JsonValue::Array(array)
    }
}

pub(crate) fn node_to_json(node: &Node) -> JsonValue {
    match node {
        Node::Leaf(p) => JsonValue::String(p.to_string()),
        Node::Tree(t) => t.to_json(),
        Node::Repeated(reps) => JsonValue::Array(reps.iter().map(node_to_json).collect()),
    }
}

pub(crate) fn node_to_array(node: &Node) -> JsonValue {
    match node {
        Node::Leaf(p) => JsonValue::String(p.to_string()),
        Node::Tree(t) => t.to_array(),
        Node::Repeated(reps) => JsonValue::Array(reps.iter().map(node_to_array).collect()),
    }
}

impl fmt::Display for ComplexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rep = self.repetition_delimiter.unwrap_or(DEFAULT_REPETITION);
        let max = self.max_position();
        for position in 1..=max {
            if position > 1 {
                write!(f, "{}", self.delimiter)?;
            }
            if let Some(node) = self.values.get(&position) {
                write!(f, "{}", node.encode(rep))?;
            }
        }
        Ok(())
    }
}
