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

//! Value types for ER7 trees: the primitive leaf, the raw decode-side
//! input shape, and the node stored at each tree position.

use crate::complex::ComplexValue;
use std::collections::BTreeMap;
use std::fmt;

/// A scalar leaf with no further decomposition.
///
/// The capability contract is minimal: constructible from a string and
/// convertible back to its string form. Per-type formatting and validation
/// rules (dates, numerics) live in the external type catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrimitiveValue(String);

impl PrimitiveValue {
    /// Create a leaf from its string form.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The leaf's string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the leaf carries no text.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PrimitiveValue {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PrimitiveValue {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The shape of a value supplied to a tree on the decode side.
///
/// Mirrors the three input forms a tree accepts: a scalar string, an
/// ordered sequence assigned by position, or a named mapping assigned
/// through the alias table.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Scalar text; split on the node's delimiter when it contains it.
    Text(String),
    /// Ordered sequence; element `i` lands at position `i + array_start`.
    List(Vec<RawValue>),
    /// Named mapping routed through the component alias table.
    Map(BTreeMap<String, RawValue>),
}

impl RawValue {
    /// Try to get the raw value as scalar text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the raw value as an ordered sequence.
    pub fn as_list(&self) -> Option<&[RawValue]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<RawValue>> for RawValue {
    fn from(l: Vec<RawValue>) -> Self {
        Self::List(l)
    }
}

impl From<BTreeMap<String, RawValue>> for RawValue {
    fn from(m: BTreeMap<String, RawValue>) -> Self {
        Self::Map(m)
    }
}

/// A child stored at one 1-based position of a tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A primitive leaf.
    Leaf(PrimitiveValue),
    /// A nested composite tree.
    Tree(ComplexValue),
    /// An ordered repetition list (segment field tier only).
    Repeated(Vec<Node>),
}

impl Node {
    /// Try to get the node as a leaf.
    pub fn as_leaf(&self) -> Option<&PrimitiveValue> {
        match self {
            Self::Leaf(p) => Some(p),
            _ => None,
        }
    }

    /// Try to get the node as a nested tree.
    pub fn as_tree(&self) -> Option<&ComplexValue> {
        match self {
            Self::Tree(t) => Some(t),
            _ => None,
        }
    }

    /// Try to get the node as a repetition list.
    pub fn as_repeated(&self) -> Option<&[Node]> {
        match self {
            Self::Repeated(r) => Some(r),
            _ => None,
        }
    }

    /// Render the node, joining repetitions with `repetition_delimiter`.
    pub(crate) fn encode(&self, repetition_delimiter: char) -> String {
        match self {
            Self::Leaf(p) => p.to_string(),
            Self::Tree(t) => t.to_string(),
            Self::Repeated(reps) => {
                let parts: Vec<String> =
                    reps.iter().map(|n| n.encode(repetition_delimiter)).collect();
                parts.join(&repetition_delimiter.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== PrimitiveValue tests ====================

    #[test]
    fn test_primitive_round_trip() {
        let p = PrimitiveValue::new("DOE");
        assert_eq!(p.as_str(), "DOE");
        assert_eq!(p.to_string(), "DOE");
    }

    #[test]
    fn test_primitive_empty() {
        assert!(PrimitiveValue::default().is_empty());
        assert!(!PrimitiveValue::new("x").is_empty());
    }

    #[test]
    fn test_primitive_from() {
        assert_eq!(PrimitiveValue::from("a"), PrimitiveValue::new("a"));
        assert_eq!(
            PrimitiveValue::from(String::from("b")),
            PrimitiveValue::new("b")
        );
    }

    // ==================== RawValue tests ====================

    #[test]
    fn test_raw_value_as_text() {
        let v = RawValue::from("PID");
        assert_eq!(v.as_text(), Some("PID"));
        assert!(v.as_list().is_none());
    }

    #[test]
    fn test_raw_value_as_list() {
        let v = RawValue::List(vec![RawValue::from("a"), RawValue::from("b")]);
        assert_eq!(v.as_list().map(<[RawValue]>::len), Some(2));
        assert!(v.as_text().is_none());
    }

    // ==================== Node tests ====================

    #[test]
    fn test_node_leaf_encode() {
        let n = Node::Leaf(PrimitiveValue::new("ADT"));
        assert_eq!(n.encode('~'), "ADT");
    }

    #[test]
    fn test_node_repeated_encode() {
        let n = Node::Repeated(vec![
            Node::Leaf(PrimitiveValue::new("A")),
            Node::Leaf(PrimitiveValue::new("B")),
        ]);
        assert_eq!(n.encode('~'), "A~B");
    }
}
