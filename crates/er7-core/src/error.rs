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

//! Error types for ER7 decoding.

use std::fmt;
use thiserror::Error;

/// The kind of error that occurred while decoding a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Er7ErrorKind {
    /// Malformed or missing header segment.
    Header,
    /// Version declared by the header is not supported.
    Version,
    /// Header message-code/trigger-event pair does not match this structure.
    TriggerEvent,
    /// Grammar violation (wrong segment order, unexpected identifier).
    Structure,
    /// A matched grammar position has no registered segment schema.
    UnknownSegment,
}

impl fmt::Display for Er7ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => write!(f, "HeaderError"),
            Self::Version => write!(f, "VersionError"),
            Self::TriggerEvent => write!(f, "TriggerEventError"),
            Self::Structure => write!(f, "StructureError"),
            Self::UnknownSegment => write!(f, "UnknownSegmentError"),
        }
    }
}

/// An error raised while decoding an ER7 message.
///
/// Fatal conditions (unsupported version, trigger-event mismatch, unknown
/// matched segment) are returned as this type. Structural mismatches are
/// non-fatal and accumulate on the message instead.
#[derive(Debug, Clone, Error)]
#[error("{kind} at line {line}: {message}")]
pub struct Er7Error {
    /// The kind of error.
    pub kind: Er7ErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// Input line number (1-based, 0 when not tied to a line).
    pub line: usize,
}

impl Er7Error {
    /// Create a new error.
    pub fn new(kind: Er7ErrorKind, message: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
        }
    }

    // Convenience constructors for each error kind
    pub fn header(message: impl Into<String>, line: usize) -> Self {
        Self::new(Er7ErrorKind::Header, message, line)
    }

    pub fn version(message: impl Into<String>, line: usize) -> Self {
        Self::new(Er7ErrorKind::Version, message, line)
    }

    pub fn trigger_event(message: impl Into<String>, line: usize) -> Self {
        Self::new(Er7ErrorKind::TriggerEvent, message, line)
    }

    pub fn structure(message: impl Into<String>, line: usize) -> Self {
        Self::new(Er7ErrorKind::Structure, message, line)
    }

    pub fn unknown_segment(message: impl Into<String>, line: usize) -> Self {
        Self::new(Er7ErrorKind::UnknownSegment, message, line)
    }
}

/// Result type for ER7 operations.
pub type Er7Result<T> = Result<T, Er7Error>;

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Er7ErrorKind Display tests ====================

    #[test]
    fn test_error_kind_display() {
        assert_eq!(format!("{}", Er7ErrorKind::Header), "HeaderError");
        assert_eq!(format!("{}", Er7ErrorKind::Version), "VersionError");
        assert_eq!(format!("{}", Er7ErrorKind::TriggerEvent), "TriggerEventError");
        assert_eq!(format!("{}", Er7ErrorKind::Structure), "StructureError");
        assert_eq!(
            format!("{}", Er7ErrorKind::UnknownSegment),
            "UnknownSegmentError"
        );
    }

    // ==================== Er7Error tests ====================

    #[test]
    fn test_error_display() {
        let err = Er7Error::new(Er7ErrorKind::Structure, "unexpected segment", 4);
        let msg = format!("{}", err);
        assert!(msg.contains("StructureError"));
        assert!(msg.contains("line 4"));
        assert!(msg.contains("unexpected segment"));
    }

    #[test]
    fn test_error_convenience_constructors() {
        assert_eq!(Er7Error::header("x", 1).kind, Er7ErrorKind::Header);
        assert_eq!(Er7Error::version("x", 1).kind, Er7ErrorKind::Version);
        assert_eq!(
            Er7Error::trigger_event("x", 1).kind,
            Er7ErrorKind::TriggerEvent
        );
        assert_eq!(Er7Error::structure("x", 2).kind, Er7ErrorKind::Structure);
        assert_eq!(
            Er7Error::unknown_segment("x", 3).kind,
            Er7ErrorKind::UnknownSegment
        );
    }

    #[test]
    fn test_error_is_std_error() {
        fn accepts_error<E: std::error::Error>(_: E) {}
        accepts_error(Er7Error::structure("test", 1));
    }

    #[test]
    fn test_error_clone() {
        let original = Er7Error::version("unsupported", 1);
        let cloned = original.clone();
        assert_eq!(original.kind, cloned.kind);
        assert_eq!(original.message, cloned.message);
        assert_eq!(original.line, cloned.line);
    }
}
