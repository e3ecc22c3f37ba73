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

//! The five-character delimiter set of an ER7 message.
//!
//! Delimiters are resolved once from the header line and are immutable for
//! the lifetime of one message. All subsequent field splitting uses the
//! resolved characters, not the defaults.

use crate::error::{Er7Error, Er7Result};

/// Segment code carried by the header line.
pub const HEADER_CODE: &str = "MSH";

/// Default schema version assumed when none is configured.
pub const DEFAULT_VERSION: &str = "2.5.1";

/// Default field delimiter.
pub const DEFAULT_FIELD: char = '|';
/// Default component delimiter.
pub const DEFAULT_COMPONENT: char = '^';
/// Default repetition delimiter.
pub const DEFAULT_REPETITION: char = '~';
/// Default escape character.
pub const DEFAULT_ESCAPE: char = '\\';
/// Default sub-component delimiter.
pub const DEFAULT_SUBCOMPONENT: char = '&';

/// The five encoding characters of one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Delimiters {
    /// Separates fields within a segment.
    pub field: char,
    /// Separates components within a field.
    pub component: char,
    /// Separates repetitions of one field.
    pub repetition: char,
    /// Introduces escape sequences.
    pub escape: char,
    /// Separates sub-components within a component.
    pub subcomponent: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            field: DEFAULT_FIELD,
            component: DEFAULT_COMPONENT,
            repetition: DEFAULT_REPETITION,
            escape: DEFAULT_ESCAPE,
            subcomponent: DEFAULT_SUBCOMPONENT,
        }
    }
}

impl Delimiters {
    /// Read the delimiter set from a header line.
    ///
    /// The five characters sit at fixed offsets: the four characters
    /// immediately following the header code (field, component, repetition,
    /// escape) plus one more (sub-component).
    pub fn from_header_line(line: &str) -> Er7Result<Self> {
        if !line.starts_with(HEADER_CODE) {
            return Err(Er7Error::header(
                format!("message does not start with {} segment", HEADER_CODE),
                1,
            ));
        }
        let mut chars = line[HEADER_CODE.len()..].chars();
        let mut next = |name: &str| {
            chars.next().ok_or_else(|| {
                Er7Error::header(format!("header too short: missing {} delimiter", name), 1)
            })
        };
        Ok(Self {
            field: next("field")?,
            component: next("component")?,
            repetition: next("repetition")?,
            escape: next("escape")?,
            subcomponent: next("sub-component")?,
        })
    }

    /// The delimiter block as it appears in the header (positions 2..6).
    pub fn encoding_characters(&self) -> String {
        let mut s = String::with_capacity(4);
        s.push(self.component);
        s.push(self.repetition);
        s.push(self.escape);
        s.push(self.subcomponent);
        s
    }
}

/// Byte offset of the first occurrence of `delim` in `s`, if any.
///
/// Single-byte delimiters take the memchr fast path; multi-byte characters
/// fall back to a scalar scan.
pub fn find_delimiter(s: &str, delim: char) -> Option<usize> {
    let mut buf = [0u8; 4];
    let encoded = delim.encode_utf8(&mut buf);
    if encoded.len() == 1 {
        memchr::memchr(buf[0], s.as_bytes())
    } else {
        s.find(delim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Default tests ====================

    #[test]
    fn test_default_delimiters() {
        let d = Delimiters::default();
        assert_eq!(d.field, '|');
        assert_eq!(d.component, '^');
        assert_eq!(d.repetition, '~');
        assert_eq!(d.escape, '\\');
        assert_eq!(d.subcomponent, '&');
    }

    // ==================== Header extraction tests ====================

    #[test]
    fn test_from_header_line_standard() {
        let d = Delimiters::from_header_line("MSH|^~\\&|SENDER|FAC").unwrap();
        assert_eq!(d, Delimiters::default());
    }

    #[test]
    fn test_from_header_line_custom() {
        let d = Delimiters::from_header_line("MSH#*%!+rest").unwrap();
        assert_eq!(d.field, '#');
        assert_eq!(d.component, '*');
        assert_eq!(d.repetition, '%');
        assert_eq!(d.escape, '!');
        assert_eq!(d.subcomponent, '+');
    }

    #[test]
    fn test_from_header_line_missing_code() {
        let err = Delimiters::from_header_line("PID|1").unwrap_err();
        assert_eq!(err.kind, crate::Er7ErrorKind::Header);
    }

    #[test]
    fn test_from_header_line_too_short() {
        // Three of five delimiters supplied; the first missing one is the
        // escape character
        let err = Delimiters::from_header_line("MSH|^~").unwrap_err();
        assert_eq!(err.kind, crate::Er7ErrorKind::Header);
        assert!(err.message.contains("escape"));
    }

    #[test]
    fn test_from_header_line_missing_subcomponent() {
        let err = Delimiters::from_header_line("MSH|^~\\").unwrap_err();
        assert_eq!(err.kind, crate::Er7ErrorKind::Header);
        assert!(err.message.contains("sub-component"));
    }

    #[test]
    fn test_encoding_characters() {
        assert_eq!(Delimiters::default().encoding_characters(), "^~\\&");
    }

    // ==================== find_delimiter tests ====================

    #[test]
    fn test_find_delimiter_present() {
        assert_eq!(find_delimiter("PID|1|X", '|'), Some(3));
    }

    #[test]
    fn test_find_delimiter_absent() {
        assert_eq!(find_delimiter("PID", '|'), None);
    }

    #[test]
    fn test_find_delimiter_multibyte() {
        assert_eq!(find_delimiter("ab§cd", '§'), Some(2));
    }
}
