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

//! Structural assembly and projection for ER7 messages.
//!
//! A [`MessageDefinition`] binds a message kind to its structure catalog
//! and segment registry. [`parse`] runs the single-pass assembler over
//! the input lines, guided by the grammar's follow sets, producing a
//! [`Message`] instance tree; [`Message::to_json`] and
//! [`Message::to_typed`] project validated or raw views from it.

mod assembler;
mod definition;
mod header;
mod instance;
mod project;

pub use assembler::{parse, EXTENSION_PREFIX};
pub use definition::{MessageDefinition, SegmentRegistry};
pub use header::{decode_header, split_lines, Header};
pub use instance::{
    GroupInstance, InstanceMap, InstanceNode, Message, SegmentEntry, StructuralError,
};
pub use project::{
    OccursError, Projected, Projection, ProjectionMode, SectionErrors, SectionReport,
};
