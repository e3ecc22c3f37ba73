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

//! Line splitting and header decoding.
//!
//! The header line yields the five delimiters plus the routing metadata:
//! schema version (field 12) and the message-code/trigger-event pair
//! (field 9). Field 1 of the decoded header is the field delimiter
//! character itself, so the raw split is re-aligned before assignment.

use er7_core::{
    Delimiters, Er7Error, Er7Result, RawValue, SegmentConfig, SegmentValue, ComponentTable,
    DEFAULT_VERSION, HEADER_CODE,
};
use std::sync::Arc;

/// Header field carrying the message-code/trigger-event pair.
const MESSAGE_TYPE_FIELD: usize = 9;
/// Header field carrying the schema version.
const VERSION_FIELD: usize = 12;

/// Split raw message text into segment lines.
///
/// Separator detection order: CR+LF, then CR, then LF, moving on whenever
/// a separator yields fewer than two lines. Leading and trailing blank
/// lines are stripped.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = if text.contains("\r\n") {
        text.split("\r\n").collect()
    } else {
        let by_cr: Vec<&str> = text.split('\r').collect();
        if by_cr.len() < 2 {
            text.split('\n').collect()
        } else {
            by_cr
        }
    };
    while lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    lines
}

/// The decoded header segment plus the routing metadata read from it.
#[derive(Debug, Clone)]
pub struct Header {
    /// The header segment instance.
    pub segment: SegmentValue,
    /// Delimiters resolved from the header line.
    pub delimiters: Delimiters,
    /// Declared schema version (field 12), empty when absent.
    pub version: String,
    /// Message code (first component of field 9).
    pub message_code: String,
    /// Trigger event (second component of field 9).
    pub trigger_event: String,
}

impl Header {
    /// The combined structure identifier, e.g. `ADT_A01`.
    pub fn structure_id(&self) -> String {
        format!("{}_{}", self.message_code, self.trigger_event)
    }
}

/// Decode the header line into a [`Header`].
///
/// The raw line splits into `["MSH", encoding-chars, ...]`; field 1 is
/// replaced with the field delimiter itself so field numbering matches
/// the standard (encoding characters land at field 2, message type at
/// field 9, version at field 12).
pub fn decode_header(line: &str, table: Arc<ComponentTable>) -> Er7Result<Header> {
    let delimiters = Delimiters::from_header_line(line)?;
    let body = &line[HEADER_CODE.len() + delimiters.field.len_utf8()..];
    let mut fields: Vec<String> = vec![delimiters.field.to_string()];
    fields.extend(body.split(delimiters.field).map(str::to_string));

    let field = |n: usize| fields.get(n - 1).map(String::as_str).unwrap_or("");
    let version = field(VERSION_FIELD).to_string();
    let mut type_parts = field(MESSAGE_TYPE_FIELD).split(delimiters.component);
    let message_code = type_parts.next().unwrap_or("").to_string();
    let trigger_event = type_parts.next().unwrap_or("").to_string();

    if message_code.is_empty() {
        return Err(Er7Error::header("header is missing the message type", 1));
    }

    let config = if version.is_empty() {
        SegmentConfig::new(DEFAULT_VERSION, delimiters)
    } else {
        SegmentConfig::new(version.clone(), delimiters)
    };
    let mut segment = SegmentValue::empty(HEADER_CODE, config, table);
    segment.set_values(RawValue::List(
        fields.into_iter().map(RawValue::Text).collect(),
    ));

    Ok(Header {
        segment,
        delimiters,
        version,
        message_code,
        trigger_event,
    })
}
