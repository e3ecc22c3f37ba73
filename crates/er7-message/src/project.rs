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

//! The projector: derived views over the assembled instance tree.
//!
//! Two axes, independent per call: validation mode (validated vs raw-all)
//! and output form (plain JSON vs a typed view borrowing the segment
//! instances). Cardinality is checked here, not during assembly;
//! violations land in a parallel [`SectionReport`] without aborting.
//! The header segment is always emitted first under its own code,
//! bypassing occurrence-list handling.

use crate::instance::{group_key, InstanceMap, InstanceNode, Message};
use er7_core::SegmentValue;
use er7_grammar::{MaxOccurs, Restrictions};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// Which sections the projection emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    /// Emit only sections whose occurrence counts satisfy their
    /// restrictions; violations are reported, not emitted.
    #[default]
    Validated,
    /// Emit every captured occurrence; violations are still reported.
    RawAll,
}

/// One cardinality violation: the violated bound and the observed count.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OccursError {
    /// The bound that was violated.
    pub limit: u32,
    /// Occurrences actually captured.
    pub observed: usize,
}

/// Violations recorded for one section, plus those of its children.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SectionErrors {
    /// Minimum cardinality not met.
    pub min_occurs: Option<OccursError>,
    /// Maximum cardinality exceeded.
    pub max_occurs: Option<OccursError>,
    /// Occurrences withheld from a validated view, projected as JSON, so
    /// the rejected input stays inspectable.
    pub occurrences: Vec<JsonValue>,
    /// Violations inside the section's occurrences and subgroups.
    pub nested: SectionReport,
}

impl SectionErrors {
    /// Returns true if the section and its children are clean.
    pub fn is_empty(&self) -> bool {
        self.min_occurs.is_none()
            && self.max_occurs.is_none()
            && self.occurrences.is_empty()
            && self.nested.is_empty()
    }
}

/// Per-section violation tree, keyed by segment code or group name.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SectionReport {
    /// Sections with recorded violations.
    pub sections: BTreeMap<String, SectionErrors>,
}

impl SectionReport {
    /// Returns true if no section recorded a violation.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Violations for one section.
    pub fn get(&self, key: &str) -> Option<&SectionErrors> {
        self.sections.get(key)
    }
}

/// A projected view plus its conformance verdict.
#[derive(Debug, Clone)]
pub struct Projection<T> {
    /// The projected output.
    pub value: T,
    /// Conjunction of every cardinality check and emptiness of the
    /// assembly-time error list.
    pub valid: bool,
    /// Cardinality violations found while projecting.
    pub report: SectionReport,
}

/// The typed output form: the instance-tree shape with borrowed segment
/// values at the leaves.
#[derive(Debug, Clone, PartialEq)]
pub enum Projected<'a> {
    /// A single segment occurrence.
    Segment(&'a SegmentValue),
    /// An ordered occurrence list.
    List(Vec<Projected<'a>>),
    /// A named section map in emission order.
    Map(Vec<(String, Projected<'a>)>),
}

impl<'a> Projected<'a> {
    /// Try to get the node as a single segment.
    pub fn as_segment(&self) -> Option<&'a SegmentValue> {
        match self {
            Self::Segment(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the node as an occurrence list.
    pub fn as_list(&self) -> Option<&[Projected<'a>]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Entry of a section map.
    pub fn get(&self, key: &str) -> Option<&Projected<'a>> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

/// One output form: how leaves, lists, and maps materialize.
trait Form<'a> {
    type Out;
    fn leaf(segment: &'a SegmentValue) -> Self::Out;
    fn list(items: Vec<Self::Out>) -> Self::Out;
    fn map(entries: Vec<(String, Self::Out)>) -> Self::Out;
}

struct JsonForm;

impl<'a> Form<'a> for JsonForm {
    type Out = JsonValue;

    fn leaf(segment: &'a SegmentValue) -> JsonValue {
        segment.to_json()
    }

    fn list(items: Vec<JsonValue>) -> JsonValue {
        JsonValue::Array(items)
    }

    fn map(entries: Vec<(String, JsonValue)>) -> JsonValue {
        let mut map = Map::with_capacity(entries.len());
        for (key, value) in entries {
            map.insert(key, value);
        }
        JsonValue::Object(map)
    }
}

struct TypedForm;

impl<'a> Form<'a> for TypedForm {
    type Out = Projected<'a>;

    fn leaf(segment: &'a SegmentValue) -> Projected<'a> {
        Projected::Segment(segment)
    }

    fn list(items: Vec<Projected<'a>>) -> Projected<'a> {
        Projected::List(items)
    }

    fn map(entries: Vec<(String, Projected<'a>)>) -> Projected<'a> {
        Projected::Map(entries)
    }
}

pub(crate) fn to_json(message: &Message, mode: ProjectionMode) -> Projection<JsonValue> {
    run::<JsonForm>(message, mode)
}

pub(crate) fn to_typed(message: &Message, mode: ProjectionMode) -> Projection<Projected<'_>> {
    run::<TypedForm>(message, mode)
}

fn run<'a, F: Form<'a>>(message: &'a Message, mode: ProjectionMode) -> Projection<F::Out> {
    let mut report = SectionReport::default();
    let mut valid = true;
    let mut entries = vec![("MSH".to_string(), F::leaf(message.header()))];
    entries.extend(project_map::<F>(message.root(), mode, &mut report, &mut valid));
    report_missing(message, &mut report, &mut valid);
    Projection {
        value: F::map(entries),
        valid: valid && message.errors().is_empty(),
        report,
    }
}

/// Required top-level sections that never made it into the tree still
/// violate their minimum; the tree walk alone cannot see them.
fn report_missing(message: &Message, report: &mut SectionReport, valid: &mut bool) {
    let grammar = message.grammar();
    for position in grammar.positions().iter().skip(1) {
        if position.is_grouped() || position.restrictions.min_occurs == 0 {
            continue;
        }
        let key = format!("{}_{}", position.identifier, position.index);
        if message.root().get(&key).is_none() {
            report
                .sections
                .entry(position.identifier.clone())
                .or_default()
                .min_occurs = Some(OccursError {
                limit: position.restrictions.min_occurs,
                observed: 0,
            });
            *valid = false;
        }
    }
    for (name, group) in grammar.groups() {
        if group.restrictions.min_occurs == 0 {
            continue;
        }
        if message.root().get(&group_key(name, group)).is_none() {
            report.sections.entry(name.clone()).or_default().min_occurs = Some(OccursError {
                limit: group.restrictions.min_occurs,
                observed: 0,
            });
            *valid = false;
        }
    }
}

// Occurrence lists of the same identifier merge before finalizing, so a
// segment reachable from two grammar positions still emits one section.
enum Slot<O> {
    Pending { items: Vec<O>, multiple: bool },
    Done(O),
}

fn project_map<'a, F: Form<'a>>(
    map: &'a InstanceMap,
    mode: ProjectionMode,
    report: &mut SectionReport,
    valid: &mut bool,
) -> Vec<(String, F::Out)> {
    let mut out: Vec<(String, Slot<F::Out>)> = Vec::new();
    for (_, node) in map.iter() {
        match node {
            InstanceNode::Segment(entry) => {
                let mut errs = SectionErrors::default();
                let ok = check_occurs(entry.occurrences.len(), entry.restrictions, &mut errs);
                *valid &= ok;
                if ok || mode == ProjectionMode::RawAll {
                    let items: Vec<F::Out> = entry.occurrences.iter().map(F::leaf).collect();
                    let multiple = entry.restrictions.max_occurs.is_multiple();
                    match out.iter_mut().find(|(key, _)| key == &entry.identifier) {
                        Some((_, Slot::Pending { items: existing, .. })) => existing.extend(items),
                        Some(_) => {}
                        None => out.push((entry.identifier.clone(), Slot::Pending { items, multiple })),
                    }
                } else {
                    // Withheld from the view; relocate into the report
                    errs.occurrences = entry.occurrences.iter().map(SegmentValue::to_json).collect();
                }
                if !errs.is_empty() {
                    report.sections.insert(entry.identifier.clone(), errs);
                }
            }
            InstanceNode::Group(group) => {
                let mut errs = SectionErrors::default();
                let ok = check_occurs(group.occurrences.len(), group.restrictions, &mut errs);
                *valid &= ok;
                let mut nested = SectionReport::default();
                let occurrence_entries: Vec<Vec<(String, F::Out)>> = group
                    .occurrences
                    .iter()
                    .map(|occurrence| project_map::<F>(occurrence, mode, &mut nested, valid))
                    .collect();
                let sub_entries = if group.subgroups.is_empty() {
                    Vec::new()
                } else {
                    project_map::<F>(&group.subgroups, mode, &mut nested, valid)
                };
                if ok || mode == ProjectionMode::RawAll {
                    let shaped = shape_group::<F>(
                        occurrence_entries,
                        sub_entries,
                        group.restrictions.max_occurs,
                    );
                    out.push((group.name.clone(), Slot::Done(shaped)));
                } else {
                    errs.occurrences = group
                        .occurrences
                        .iter()
                        .map(|occurrence| {
                            let mut dropped = SectionReport::default();
                            let mut ignored = true;
                            JsonForm::map(project_map::<JsonForm>(
                                occurrence,
                                ProjectionMode::RawAll,
                                &mut dropped,
                                &mut ignored,
                            ))
                        })
                        .collect();
                }
                errs.nested = nested;
                if !errs.is_empty() {
                    report.sections.insert(group.name.clone(), errs);
                }
            }
        }
    }
    out.into_iter()
        .map(|(key, slot)| (key, finalize::<F>(slot)))
        .collect()
}

fn finalize<'a, F: Form<'a>>(slot: Slot<F::Out>) -> F::Out {
    match slot {
        Slot::Done(value) => value,
        Slot::Pending { mut items, multiple } => {
            if !multiple && items.len() == 1 {
                match items.pop() {
                    Some(single) => single,
                    None => F::list(items),
                }
            } else {
                F::list(items)
            }
        }
    }
}

/// Shape a group's output. A single occurrence of a non-repeating group
/// collapses to its bare map; subgroups merge into a collapsed occurrence
/// or sit beside an `occurrences` list when the group repeats.
fn shape_group<'a, F: Form<'a>>(
    mut occurrences: Vec<Vec<(String, F::Out)>>,
    subgroups: Vec<(String, F::Out)>,
    max_occurs: MaxOccurs,
) -> F::Out {
    let collapse = !max_occurs.is_multiple() && occurrences.len() == 1;
    if subgroups.is_empty() {
        if collapse {
            match occurrences.pop() {
                Some(single) => F::map(single),
                None => F::list(Vec::new()),
            }
        } else {
            F::list(occurrences.into_iter().map(F::map).collect())
        }
    } else if collapse || occurrences.is_empty() {
        let mut entries = occurrences.pop().unwrap_or_default();
        entries.extend(subgroups);
        F::map(entries)
    } else {
        let mut entries = vec![(
            "occurrences".to_string(),
            F::list(occurrences.into_iter().map(F::map).collect()),
        )];
        entries.extend(subgroups);
        F::map(entries)
    }
}

fn check_occurs(count: usize, restrictions: Restrictions, errs: &mut SectionErrors) -> bool {
    let mut ok = true;
    if restrictions.below_minimum(count) {
        errs.min_occurs = Some(OccursError {
            limit: restrictions.min_occurs,
            observed: count,
        });
        ok = false;
    }
    if restrictions.max_occurs.exceeded_by(count) {
        if let MaxOccurs::Bounded(limit) = restrictions.max_occurs {
            errs.max_occurs = Some(OccursError {
                limit,
                observed: count,
            });
        }
        ok = false;
    }
    ok
}
