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

//! The sequence oracle: per-position successor sets.
//!
//! For every grammar position `p`, [`FollowSets`] precomputes the set of
//! positions legal immediately after `p` with no further input consumed,
//! reachable through zero or more optional positions and skippable
//! optional groups. The table is built once per grammar and shared
//! read-only across parses.

use crate::model::Grammar;

/// Precomputed successor sets, one per grammar position.
#[derive(Debug, Clone)]
pub struct FollowSets {
    sets: Vec<Vec<usize>>,
}

impl FollowSets {
    /// Build the full table for `grammar`.
    ///
    /// The header at position 0 admits exactly position 1; every other
    /// position gets the optional-closure scan.
    pub fn build(grammar: &Grammar) -> Self {
        let sets = grammar
            .positions()
            .iter()
            .map(|p| {
                if p.index == 0 {
                    vec![1]
                } else {
                    successors(grammar, p.index, true)
                }
            })
            .collect();
        Self { sets }
    }

    /// Successor positions of `index`, in discovery order.
    pub fn get(&self, index: usize) -> &[usize] {
        self.sets.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of per-position sets.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Returns true if no sets were built.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// Successor set of one position: forward scan over optional positions,
/// then (when `expand_optional_groups`) re-admission of the enclosing
/// optional section's own start.
fn successors(grammar: &Grammar, from: usize, expand_optional_groups: bool) -> Vec<usize> {
    let mut out = Vec::new();
    scan_forward(grammar, from + 1, &mut out);

    // A position inside a group whose (outermost-first) ancestry contains
    // an optional group means the whole enclosing section may not have
    // occurred yet; its alternatives are whatever could follow the
    // position just before that group's start. The recursive scan runs
    // with expansion disabled to stay bounded.
    if expand_optional_groups {
        if let Some(current) = grammar.position(from) {
            if current.is_grouped() {
                let mut pointer = grammar.groups();
                for name in &current.group_path {
                    let Some(group) = pointer.get(name) else {
                        break;
                    };
                    if group.restrictions.nillable {
                        scan_forward(grammar, group.span.start, &mut out);
                        break;
                    }
                    pointer = &group.subgroups;
                }
            }
        }
    }
    out
}

/// Forward scan from `start`: admit every position up to and including
/// the first non-skippable required one. A required position inside a
/// nillable group does not bound the scan; the group as a whole is
/// optional, so the scan jumps past its span.
fn scan_forward(grammar: &Grammar, start: usize, out: &mut Vec<usize>) {
    let admit = |index: usize, out: &mut Vec<usize>| {
        if !out.contains(&index) {
            out.push(index);
        }
    };
    let mut counter = start;
    while counter < grammar.len() {
        let next = &grammar.positions()[counter];
        admit(counter, out);
        if !next.restrictions.nillable {
            if next.is_grouped() {
                match grammar.group_info(&next.group_path) {
                    Some(group) if group.restrictions.nillable => {
                        counter = group.span.stop;
                    }
                    _ => break,
                }
            } else {
                break;
            }
        }
        counter += 1;
    }
}
