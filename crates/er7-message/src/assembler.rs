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

//! The structural assembler: a single forward pass over segment lines,
//! guided by the grammar's follow sets.
//!
//! State threaded through the pass: the currently expected positions
//! (initially the header's successors), the previously matched position
//! (for group-freshness decisions), and the growing instance tree.
//! Lines that match no expected position are recorded as structural
//! errors and dropped; expectation state is left unchanged so parsing
//! recovers at the next line.

use crate::definition::MessageDefinition;
use crate::header::{decode_header, split_lines};
use crate::instance::{
    group_key, GroupInstance, InstanceMap, Message, SegmentEntry, StructuralError,
};
use er7_core::{
    find_delimiter, ComponentTable, Er7Error, Er7Result, SegmentConfig, SegmentValue, HEADER_CODE,
};
use er7_grammar::{Group, Position};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Identifier prefix routed to the extension side channel instead of the
/// grammar match.
pub const EXTENSION_PREFIX: char = 'Z';

/// Parse ER7 text against a message definition.
///
/// Fatal conditions (malformed header, unsupported version, trigger-event
/// mismatch, matched segment without a registered schema) return an error;
/// structural mismatches accumulate on the returned [`Message`].
pub fn parse(definition: &MessageDefinition, text: &str) -> Er7Result<Message> {
    let lines = split_lines(text);
    let Some(first) = lines.first() else {
        return Err(Er7Error::header("message is empty", 1));
    };
    let header_table = definition
        .segments()
        .get(HEADER_CODE)
        .unwrap_or_else(|| Arc::new(ComponentTable::new()));
    let header = decode_header(first.trim(), header_table)?;

    if !definition.catalog().supports(&header.version) {
        return Err(Er7Error::version(
            format!("message version '{}' is not supported", header.version),
            1,
        ));
    }
    if header.message_code != definition.message_code()
        || header.trigger_event != definition.trigger_event()
    {
        return Err(Er7Error::trigger_event(
            format!(
                "message type {} does not match expected {}",
                header.structure_id(),
                definition.structure_id()
            ),
            1,
        ));
    }

    let compiled = definition.compiled(&header.version)?;
    let grammar = compiled.grammar();
    let follow = compiled.follow();
    let delimiters = header.delimiters;

    let mut root = InstanceMap::new();
    let mut extensions: Vec<String> = Vec::new();
    let mut errors: Vec<StructuralError> = Vec::new();
    let mut expected: Vec<usize> = follow.get(0).to_vec();
    let mut previous: Option<usize> = None;

    for (offset, raw_line) in lines.iter().enumerate().skip(1) {
        let line_number = offset + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        let identifier = match find_delimiter(line, delimiters.field) {
            Some(at) => &line[..at],
            None => line,
        };
        if identifier.starts_with(EXTENSION_PREFIX) {
            extensions.push(line.to_string());
            continue;
        }

        let matched = expected
            .iter()
            .filter_map(|&index| grammar.position(index).map(|p| (index, p)))
            .find(|(_, p)| p.identifier == identifier);
        let Some((index, position)) = matched else {
            errors.push(StructuralError {
                line: line_number,
                found: identifier.to_string(),
                expected: expected
                    .iter()
                    .filter_map(|&i| grammar.position(i))
                    .map(|p| p.identifier.clone())
                    .collect(),
            });
            continue;
        };

        let Some(table) = definition.segments().get(identifier) else {
            return Err(Er7Error::unknown_segment(
                format!("segment {} has no registered schema", identifier),
                line_number,
            ));
        };
        let segment = SegmentValue::new(
            identifier,
            line,
            SegmentConfig::new(header.version.clone(), delimiters),
            table,
        );
        place(&mut root, grammar.groups(), position, segment, previous, line_number)?;

        let mut next = follow.get(index).to_vec();
        if position.restrictions.max_occurs.is_multiple() {
            // The matched position may repeat; re-admit it with priority
            next.retain(|&i| i != index);
            next.insert(0, index);
        }
        expected = next;
        previous = Some(index);
    }

    let valid = errors.is_empty();
    Ok(Message {
        header: header.segment,
        version: header.version,
        message_code: header.message_code,
        trigger_event: header.trigger_event,
        delimiters,
        compiled,
        root,
        extensions,
        errors,
        valid,
    })
}

fn place(
    map: &mut InstanceMap,
    groups: &BTreeMap<String, Group>,
    position: &Position,
    segment: SegmentValue,
    previous: Option<usize>,
    line: usize,
) -> Er7Result<()> {
    if position.is_grouped() {
        place_in_group(map, groups, &position.group_path, position, segment, previous, line)
    } else {
        add_segment(map, position, segment);
        Ok(())
    }
}

fn place_in_group(
    map: &mut InstanceMap,
    groups: &BTreeMap<String, Group>,
    path: &[String],
    position: &Position,
    segment: SegmentValue,
    previous: Option<usize>,
    line: usize,
) -> Er7Result<()> {
    let Some(name) = path.first() else {
        add_segment(map, position, segment);
        return Ok(());
    };
    let Some(info) = groups.get(name) else {
        return Err(Er7Error::structure(
            format!("group {} is not described by the grammar", name),
            line,
        ));
    };
    let key = group_key(name, info);
    let Some(node) = map.group_entry(&key, || {
        GroupInstance::new(name.clone(), info.restrictions, info.span)
    }) else {
        return Err(Er7Error::structure(
            format!("identifier {} is used by both a segment and a group", key),
            line,
        ));
    };
    if path.len() > 1 {
        return place_in_group(
            &mut node.subgroups,
            &info.subgroups,
            &path[1..],
            position,
            segment,
            previous,
            line,
        );
    }

    // Does this segment open a new occurrence of the innermost group?
    // Ordered cases: no occurrence yet; previous match landed before the
    // group's span; the sequence wrapped back past this position; or the
    // same non-repeatable position was seen again.
    let fresh = node.occurrences.is_empty()
        || match previous {
            None => true,
            Some(prev) => {
                prev < info.span.start
                    || prev > position.index
                    || (prev == position.index && !position.restrictions.max_occurs.is_multiple())
            }
        };
    let mut occurrence = if fresh {
        InstanceMap::new()
    } else {
        node.occurrences.pop().unwrap_or_default()
    };
    add_segment(&mut occurrence, position, segment);
    node.occurrences.push(occurrence);
    Ok(())
}

fn add_segment(map: &mut InstanceMap, position: &Position, segment: SegmentValue) {
    let key = if position.index > 0 {
        format!("{}_{}", position.identifier, position.index)
    } else {
        position.identifier.clone()
    };
    if let Some(entry) = map.segment_entry(&key, || {
        SegmentEntry::new(position.identifier.clone(), position.index, position.restrictions)
    }) {
        entry.occurrences.push(segment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::SegmentRegistry;
    use crate::instance::InstanceNode;
    use er7_core::Er7ErrorKind;
    use er7_grammar::{Restrictions, Span, StructureCatalog, VersionSlot};

    const HEADER: &str = "MSH|^~\\&|SND|SF|RCV|RF|20260101||ADT^A01|M1|P|2.5";

    fn registry(codes: &[&str]) -> SegmentRegistry {
        let mut registry = SegmentRegistry::new();
        for code in codes {
            registry.insert(*code, Arc::new(ComponentTable::new()));
        }
        registry
    }

    fn flat_definition() -> MessageDefinition {
        // MSH, EVN required, PID required, NK1 optional repeating
        let catalog = StructureCatalog::new().with(
            "2.5",
            VersionSlot::inline(
                vec![
                    Position::segment(0, "MSH", Restrictions::required()),
                    Position::segment(1, "EVN", Restrictions::required()),
                    Position::segment(2, "PID", Restrictions::required()),
                    Position::segment(3, "NK1", Restrictions::optional_repeating()),
                ],
                BTreeMap::new(),
            ),
        );
        MessageDefinition::new("ADT", "A01", catalog, registry(&["MSH", "EVN", "PID", "NK1"]))
    }

    fn segment_occurrences<'a>(message: &'a Message, key: &str) -> &'a [SegmentValue] {
        match message.root().get(key) {
            Some(InstanceNode::Segment(entry)) => &entry.occurrences,
            _ => panic!("expected segment entry at {}", key),
        }
    }

    // ==================== Fatal path tests ====================

    #[test]
    fn test_empty_message_is_fatal() {
        let err = parse(&flat_definition(), "").unwrap_err();
        assert_eq!(err.kind, Er7ErrorKind::Header);
    }

    #[test]
    fn test_unsupported_version_is_fatal() {
        let text = "MSH|^~\\&|SND|SF|RCV|RF|20260101||ADT^A01|M1|P|2.2\rEVN|X\rPID|1";
        let err = parse(&flat_definition(), text).unwrap_err();
        assert_eq!(err.kind, Er7ErrorKind::Version);
    }

    #[test]
    fn test_trigger_event_mismatch_is_fatal() {
        let text = "MSH|^~\\&|SND|SF|RCV|RF|20260101||ADT^A08|M1|P|2.5\rEVN|X\rPID|1";
        let err = parse(&flat_definition(), text).unwrap_err();
        assert_eq!(err.kind, Er7ErrorKind::TriggerEvent);
    }

    #[test]
    fn test_matched_unregistered_segment_is_fatal() {
        let catalog = StructureCatalog::new().with(
            "2.5",
            VersionSlot::inline(
                vec![
                    Position::segment(0, "MSH", Restrictions::required()),
                    Position::segment(1, "EVN", Restrictions::required()),
                ],
                BTreeMap::new(),
            ),
        );
        let definition = MessageDefinition::new("ADT", "A01", catalog, registry(&["MSH"]));
        let err = parse(&definition, &format!("{}\rEVN|X", HEADER)).unwrap_err();
        assert_eq!(err.kind, Er7ErrorKind::UnknownSegment);
    }

    // ==================== Matching tests ====================

    #[test]
    fn test_minimal_path_is_valid() {
        let message = parse(&flat_definition(), &format!("{}\rEVN|A\rPID|1", HEADER)).unwrap();
        assert!(message.is_valid());
        assert!(message.errors().is_empty());
        assert_eq!(segment_occurrences(&message, "EVN_1").len(), 1);
        assert_eq!(segment_occurrences(&message, "PID_2").len(), 1);
    }

    #[test]
    fn test_repeating_segment_accumulates() {
        let text = format!("{}\rEVN|A\rPID|1\rNK1|1\rNK1|2\rNK1|3", HEADER);
        let message = parse(&flat_definition(), &text).unwrap();
        assert!(message.is_valid());
        assert_eq!(segment_occurrences(&message, "NK1_3").len(), 3);
    }

    #[test]
    fn test_unexpected_line_is_recorded_and_skipped() {
        let text = format!("{}\rEVN|A\rOBX|bogus\rPID|1", HEADER);
        let message = parse(&flat_definition(), &text).unwrap();
        assert!(!message.is_valid());
        assert_eq!(message.errors().len(), 1);
        let err = &message.errors()[0];
        assert_eq!(err.found, "OBX");
        assert_eq!(err.line, 3);
        assert_eq!(err.expected, vec!["PID"]);
        // State was untouched; PID still matched
        assert_eq!(segment_occurrences(&message, "PID_2").len(), 1);
    }

    #[test]
    fn test_extension_lines_bypass_the_grammar() {
        let text = format!("{}\rEVN|A\rZQA|custom|data\rPID|1", HEADER);
        let message = parse(&flat_definition(), &text).unwrap();
        assert!(message.is_valid());
        assert_eq!(message.extensions(), &["ZQA|custom|data"]);
    }

    #[test]
    fn test_out_of_order_required_segment_fails() {
        let text = format!("{}\rPID|1\rEVN|A", HEADER);
        let message = parse(&flat_definition(), &text).unwrap();
        // PID arrived while only EVN was legal; EVN then matched fine
        assert!(!message.is_valid());
        assert_eq!(message.errors().len(), 1);
        assert_eq!(message.errors()[0].found, "PID");
    }

    // ==================== Group placement tests ====================

    fn grouped_definition() -> MessageDefinition {
        // MSH, PID, then repeatable optional group VISIT { PV1 required,
        // PV2 optional }
        let mut groups = BTreeMap::new();
        groups.insert(
            "VISIT".to_string(),
            Group::new(Restrictions::optional_repeating(), Span::new(2, 3)),
        );
        let catalog = StructureCatalog::new().with(
            "2.5",
            VersionSlot::inline(
                vec![
                    Position::segment(0, "MSH", Restrictions::required()),
                    Position::segment(1, "PID", Restrictions::required()),
                    Position::segment(2, "PV1", Restrictions::required()).grouped(&["VISIT"]),
                    Position::segment(3, "PV2", Restrictions::optional()).grouped(&["VISIT"]),
                ],
                groups,
            ),
        );
        MessageDefinition::new("ADT", "A01", catalog, registry(&["MSH", "PID", "PV1", "PV2"]))
    }

    fn group_node<'a>(message: &'a Message, key: &str) -> &'a GroupInstance {
        match message.root().get(key) {
            Some(InstanceNode::Group(group)) => group,
            _ => panic!("expected group node at {}", key),
        }
    }

    #[test]
    fn test_group_continuation_within_one_occurrence() {
        let text = format!("{}\rPID|1\rPV1|1\rPV2|extra", HEADER);
        let message = parse(&grouped_definition(), &text).unwrap();
        let group = group_node(&message, "VISIT_2_3");
        assert_eq!(group.occurrences.len(), 1);
        assert_eq!(group.occurrences[0].len(), 2);
    }

    #[test]
    fn test_repeating_group_boundary_starts_new_occurrence() {
        // Two consecutive PV1 lines are two distinct occurrences of the
        // group, not one occurrence with two PV1 entries
        let text = format!("{}\rPID|1\rPV1|1\rPV1|2", HEADER);
        let message = parse(&grouped_definition(), &text).unwrap();
        let group = group_node(&message, "VISIT_2_3");
        assert_eq!(group.occurrences.len(), 2);
        assert_eq!(group.occurrences[0].len(), 1);
        assert_eq!(group.occurrences[1].len(), 1);
    }

    #[test]
    fn test_sequence_wrap_starts_new_occurrence() {
        // PV1 PV2 then PV1 again: previous position (3) is past the new
        // match (2), so the sequence wrapped into a fresh occurrence
        let text = format!("{}\rPID|1\rPV1|1\rPV2|a\rPV1|2", HEADER);
        let message = parse(&grouped_definition(), &text).unwrap();
        let group = group_node(&message, "VISIT_2_3");
        assert_eq!(group.occurrences.len(), 2);
    }

    #[test]
    fn test_valid_flag_reflects_structural_errors_only() {
        // Missing required PID is a cardinality matter found at projection
        // time; assembly itself stays clean when order is respected
        let text = format!("{}\rPID|1", HEADER);
        let message = parse(&grouped_definition(), &text).unwrap();
        assert!(message.is_valid());
    }
}
