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

//! Property-based roundtrip tests for the value codec.
//!
//! # Properties Tested
//!
//! 1. **Roundtrip Preservation**: text → tree → text is the identity for
//!    delimiter-free part content, including empty parts
//! 2. **Positional Fidelity**: part `i` of the input is reachable at
//!    position `i + 1`
//! 3. **Segment Prefixing**: a segment renders as its code joined to its
//!    encoded fields

use er7_core::{
    ComplexConfig, ComplexValue, ComponentSpec, ComponentTable, SegmentConfig, SegmentValue,
};
use proptest::prelude::*;
use std::sync::Arc;

// Part content that contains none of the default delimiters
const PART: &str = "[a-zA-Z0-9 .]{0,12}";

fn join(parts: &[String], delim: char) -> String {
    parts.join(&delim.to_string())
}

fn field_table() -> Arc<ComponentTable> {
    ComponentTable::new()
        .with("First", ComponentSpec::at(1))
        .with("Second", ComponentSpec::at(2))
        .with("Third", ComponentSpec::at(3))
        .shared()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: component-level text survives a decode/encode roundtrip
    #[test]
    fn prop_component_roundtrip(parts in prop::collection::vec(PART, 1..6)) {
        let input = join(&parts, '^');
        let tree = ComplexValue::new(
            input.as_str(),
            ComplexConfig::default(),
            field_table(),
        );
        prop_assert_eq!(tree.to_string(), input);
    }

    /// Property: part i of the input lands at position i + 1
    #[test]
    fn prop_positions_match_input_order(parts in prop::collection::vec(PART, 2..6)) {
        let input = join(&parts, '^');
        let tree = ComplexValue::new(
            input.as_str(),
            ComplexConfig::default(),
            field_table(),
        );
        for (i, part) in parts.iter().enumerate() {
            let got = tree.position_text(i + 1).unwrap_or_default();
            prop_assert_eq!(&got, part);
        }
    }

    /// Property: segment encoding is the code joined to its fields
    #[test]
    fn prop_segment_prefixes_code(
        fields in prop::collection::vec("[a-zA-Z0-9]{1,8}", 1..5),
    ) {
        let line = format!("ZZT|{}", join(&fields, '|'));
        let segment = SegmentValue::new(
            "ZZT",
            line.as_str(),
            SegmentConfig::default(),
            Arc::new(ComponentTable::new()),
        );
        prop_assert_eq!(segment.to_string(), line);
    }
}
