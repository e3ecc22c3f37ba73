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

//! Composite value model for ER7-encoded HL7v2 messages.
//!
//! This crate carries the codec tier: delimiter resolution from the
//! header line, the recursive [`ComplexValue`] tree with alias-table
//! addressing, and the field-level [`SegmentValue`] wrapper.
//!
//! Values decode from delimited text (or structured input) into trees
//! and encode back losslessly; grammar sequencing and whole-message
//! assembly live in the `er7-grammar` and `er7-message` crates.

mod complex;
mod delimiters;
mod error;
mod segment;
mod table;
mod value;

pub use complex::{ComplexConfig, ComplexValue};
pub use delimiters::{
    find_delimiter, Delimiters, DEFAULT_COMPONENT, DEFAULT_ESCAPE, DEFAULT_FIELD,
    DEFAULT_REPETITION, DEFAULT_SUBCOMPONENT, DEFAULT_VERSION, HEADER_CODE,
};
pub use error::{Er7Error, Er7ErrorKind, Er7Result};
pub use segment::{SegmentConfig, SegmentValue};
pub use table::{ComponentSpec, ComponentTable, TypeCandidate, TypeKind};
pub use value::{Node, PrimitiveValue, RawValue};
