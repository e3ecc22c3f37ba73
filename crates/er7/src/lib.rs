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

//! # ER7 - message-structure engine for HL7v2
//!
//! ER7 is the flat, delimiter-encoded text form of HL7v2 clinical
//! messages. This crate decodes it into a validated, hierarchical
//! in-memory representation and re-projects that representation back
//! into text or structured output.
//!
//! ## Quick Start
//!
//! ```rust
//! use er7::{parse, MessageDefinition, Position, ProjectionMode, Restrictions,
//!     SegmentRegistry, StructureCatalog, VersionSlot, ComponentTable};
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! // Structure and segment schemas come from catalog collaborators;
//! // a tiny hand-rolled ADT_A01 stands in here.
//! let catalog = StructureCatalog::new().with(
//!     "2.5.1",
//!     VersionSlot::inline(
//!         vec![
//!             Position::segment(0, "MSH", Restrictions::required()),
//!             Position::segment(1, "EVN", Restrictions::required()),
//!             Position::segment(2, "PID", Restrictions::required()),
//!         ],
//!         BTreeMap::new(),
//!     ),
//! );
//! let registry = SegmentRegistry::new()
//!     .with("MSH", Arc::new(ComponentTable::new()))
//!     .with("EVN", Arc::new(ComponentTable::new()))
//!     .with("PID", Arc::new(ComponentTable::new()));
//! let definition = MessageDefinition::new("ADT", "A01", catalog, registry);
//!
//! let text = "MSH|^~\\&|SND|SF|RCV|RF|20260101||ADT^A01|M1|P|2.5.1\rEVN|A01\rPID|1";
//! let message = parse(&definition, text).expect("parse failed");
//! assert!(message.is_valid());
//!
//! let projection = message.to_json(ProjectionMode::Validated);
//! assert!(projection.valid);
//! ```
//!
//! ## Crates
//!
//! - `er7-core`: composite value tree, segment codec, delimiters
//! - `er7-grammar`: grammar model, structure catalog, sequence oracle
//! - `er7-message`: structural assembler and projector

// Re-export the value codec
pub use er7_core::{
    find_delimiter,
    ComplexConfig,
    ComplexValue,
    ComponentSpec,
    ComponentTable,
    Delimiters,
    // Errors
    Er7Error,
    Er7ErrorKind,
    Er7Result,
    Node,
    PrimitiveValue,
    RawValue,
    SegmentConfig,
    SegmentValue,
    TypeCandidate,
    TypeKind,
    DEFAULT_VERSION,
    HEADER_CODE,
};

// Re-export the grammar model and sequence oracle
pub use er7_grammar::{
    CompiledGrammar, FollowSets, Grammar, GrammarCache, Group, MaxOccurs, Position, Restrictions,
    Span, StructureCatalog, VersionRef, VersionSlot,
};

// Re-export assembly and projection
pub use er7_message::{
    decode_header, parse, split_lines, GroupInstance, Header, InstanceMap, InstanceNode, Message,
    MessageDefinition, OccursError, Projected, Projection, ProjectionMode, SectionErrors,
    SectionReport, SegmentEntry, SegmentRegistry, StructuralError, EXTENSION_PREFIX,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
