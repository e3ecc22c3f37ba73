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

//! Grammar model and sequence oracle for ER7 message structures.
//!
//! A message kind's structure is an ordered list of grammar positions
//! (segments with cardinality, possibly nested in groups) plus a group
//! descriptor tree, registered per schema version in a
//! [`StructureCatalog`]. Compiling a grammar precomputes its
//! [`FollowSets`]: for every position, the set of positions legal next
//! without consuming input. The `er7-message` crate drives assembly off
//! that table.

mod catalog;
mod compile;
mod follow;
mod model;
mod restrictions;

pub use catalog::{StructureCatalog, VersionRef, VersionSlot};
pub use compile::{CompiledGrammar, GrammarCache};
pub use follow::FollowSets;
pub use model::{Grammar, Group, Position, Span};
pub use restrictions::{MaxOccurs, Restrictions};
