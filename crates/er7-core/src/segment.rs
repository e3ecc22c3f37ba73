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

//! The segment tier: a composite tree carrying a three-letter segment
//! code, using the field delimiter at its own level and the component
//! delimiter for its children. Fields at this tier may repeat.

use crate::complex::{ComplexConfig, ComplexValue};
use crate::delimiters::{find_delimiter, Delimiters, DEFAULT_VERSION};
use crate::table::ComponentTable;
use crate::value::{Node, RawValue};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

/// Version and delimiter context for one segment.
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    /// Schema version governing per-field type selection.
    pub version: String,
    /// The message's resolved delimiter set.
    pub delimiters: Delimiters,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            delimiters: Delimiters::default(),
        }
    }
}

impl SegmentConfig {
    /// Context for `version` with the given delimiter set.
    pub fn new(version: impl Into<String>, delimiters: Delimiters) -> Self {
        Self {
            version: version.into(),
            delimiters,
        }
    }
}

/// One decoded segment: a code plus a field-tier composite tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentValue {
    code: String,
    tree: ComplexValue,
}

impl SegmentValue {
    /// Create an empty segment with the given code, context and table.
    pub fn empty(
        code: impl Into<String>,
        config: SegmentConfig,
        table: Arc<ComponentTable>,
    ) -> Self {
        let tree_config = ComplexConfig {
            version: config.version,
            delimiter: config.delimiters.field,
            sub_delimiter: Some(config.delimiters.component),
            repetition_delimiter: Some(config.delimiters.repetition),
        };
        Self {
            code: code.into(),
            tree: ComplexValue::empty(tree_config, table),
        }
    }

    /// Create a segment and populate it from `value`.
    pub fn new(
        code: impl Into<String>,
        value: impl Into<RawValue>,
        config: SegmentConfig,
        table: Arc<ComponentTable>,
    ) -> Self {
        let mut segment = Self::empty(code, config, table);
        segment.set_values(value.into());
        segment
    }

    /// The segment code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The segment's schema version.
    pub fn version(&self) -> &str {
        self.tree.version()
    }

    /// Update the schema version.
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.tree.set_version(version);
    }

    /// The field-tier tree.
    pub fn tree(&self) -> &ComplexValue {
        &self.tree
    }

    /// Assign a value. Scalar text splits on the field delimiter, with a
    /// leading part equal to the segment code stripped so that field 1 is
    /// the first part after the code.
    pub fn set_values(&mut self, value: RawValue) {
        match value {
            RawValue::Text(s) => {
                if find_delimiter(&s, self.tree.delimiter).is_some() {
                    let mut parts: Vec<RawValue> =
                        s.split(self.tree.delimiter).map(RawValue::from).collect();
                    if parts.first().and_then(RawValue::as_text) == Some(self.code.as_str()) {
                        parts.remove(0);
                    }
                    self.tree.set_list(parts);
                } else if s != self.code {
                    self.tree.set_position(1, RawValue::Text(s));
                }
            }
            other => self.tree.set_values(other),
        }
    }

    /// Assign a value at a 1-based field position.
    pub fn set_field(&mut self, position: usize, value: impl Into<RawValue>) {
        self.tree.set_position(position, value.into());
    }

    /// Assign a value through a named field entry.
    pub fn set_component(&mut self, name: &str, value: impl Into<RawValue>) {
        self.tree.set_component(name, value.into());
    }

    /// Field at a 1-based position.
    pub fn field(&self, position: usize) -> Option<&Node> {
        self.tree.position(position)
    }

    /// Rendered string form of the field at `position`.
    pub fn field_text(&self, position: usize) -> Option<String> {
        self.tree.position_text(position)
    }

    /// Field reachable through a named entry.
    pub fn component(&self, name: &str) -> Option<&Node> {
        self.tree.component(name)
    }

    /// Highest populated field position, or 0 when empty.
    pub fn max_field(&self) -> usize {
        self.tree.max_position()
    }

    /// Project to a named mapping over the segment's field table.
    pub fn to_json(&self) -> JsonValue {
        self.tree.to_json()
    }

    /// Project to an ordered array of fields.
    pub fn to_array(&self) -> JsonValue {
        self.tree.to_array()
    }
}

impl fmt::Display for SegmentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        if !self.tree.is_empty() {
            write!(f, "{}{}", self.tree.delimiter, self.tree)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ComponentSpec;

    fn pid_table() -> Arc<ComponentTable> {
        let name = ComponentTable::new()
            .with("FamilyName", ComponentSpec::at(1))
            .with("GivenName", ComponentSpec::at(2))
            .shared();
        ComponentTable::new()
            .with("SetId", ComponentSpec::at(1))
            .with("PatientName", ComponentSpec::composite(5, name).repeating())
            .shared()
    }

    // ==================== Decode tests ====================

    #[test]
    fn test_code_prefix_stripped() {
        let s = SegmentValue::new(
            "PID",
            "PID|1|||X",
            SegmentConfig::default(),
            pid_table(),
        );
        assert_eq!(s.field_text(1).as_deref(), Some("1"));
        assert_eq!(s.field_text(4).as_deref(), Some("X"));
    }

    #[test]
    fn test_text_without_prefix_assigns_from_field_one() {
        let s = SegmentValue::new("PID", "1|||X", SegmentConfig::default(), pid_table());
        assert_eq!(s.field_text(1).as_deref(), Some("1"));
        assert_eq!(s.field_text(4).as_deref(), Some("X"));
    }

    #[test]
    fn test_bare_code_leaves_segment_empty() {
        let s = SegmentValue::new("EVN", "EVN", SegmentConfig::default(), pid_table());
        assert_eq!(s.max_field(), 0);
    }

    #[test]
    fn test_repeating_field_splits_on_repetition_delimiter() {
        let s = SegmentValue::new(
            "PID",
            "PID|1||||DOE^JOHN~ROE^JANE",
            SegmentConfig::default(),
            pid_table(),
        );
        let reps = s.component("PatientName").unwrap().as_repeated().unwrap();
        assert_eq!(reps.len(), 2);
        let first = reps[0].as_tree().unwrap();
        assert_eq!(
            first.component("FamilyName").unwrap().as_leaf().unwrap().as_str(),
            "DOE"
        );
    }

    #[test]
    fn test_custom_delimiters() {
        let delims = Delimiters {
            field: '#',
            component: '*',
            repetition: '%',
            escape: '!',
            subcomponent: '+',
        };
        let s = SegmentValue::new(
            "PID",
            "PID#1####DOE*JOHN%ROE*JANE",
            SegmentConfig::new("2.5.1", delims),
            pid_table(),
        );
        let reps = s.component("PatientName").unwrap().as_repeated().unwrap();
        assert_eq!(reps.len(), 2);
    }

    // ==================== Encode tests ====================

    #[test]
    fn test_round_trip_with_repetitions() {
        let input = "PID|1||||DOE^JOHN~ROE^JANE";
        let s = SegmentValue::new("PID", input, SegmentConfig::default(), pid_table());
        assert_eq!(s.to_string(), input);
    }

    #[test]
    fn test_empty_segment_renders_bare_code() {
        let s = SegmentValue::empty("EVN", SegmentConfig::default(), pid_table());
        assert_eq!(s.to_string(), "EVN");
    }

    #[test]
    fn test_set_component_then_encode() {
        let mut s = SegmentValue::empty("PID", SegmentConfig::default(), pid_table());
        s.set_component("SetId", "1");
        s.set_component("PatientName", "DOE^JOHN");
        assert_eq!(s.to_string(), "PID|1||||DOE^JOHN");
    }

    // ==================== Projection tests ====================

    #[test]
    fn test_to_json_repeating_field_is_array() {
        let s = SegmentValue::new(
            "PID",
            "PID|1||||DOE^JOHN~ROE^JANE",
            SegmentConfig::default(),
            pid_table(),
        );
        let json = s.to_json();
        assert_eq!(json["SetId"], "1");
        assert_eq!(json["PatientName"][0]["FamilyName"], "DOE");
        assert_eq!(json["PatientName"][1]["FamilyName"], "ROE");
    }
}
