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

//! Per-message-kind static configuration.
//!
//! A [`MessageDefinition`] binds a message-code/trigger-event pair to its
//! versioned structure catalog and its segment schema registry. Both are
//! supplied by schema collaborators; this crate only consumes them.
//! Definitions are built once at startup and shared read-only across
//! parses; the embedded grammar cache compiles each version on first use.

use er7_core::{ComponentTable, Er7Result};
use er7_grammar::{CompiledGrammar, GrammarCache, StructureCatalog};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Segment identifier → field table registry.
#[derive(Debug, Clone, Default)]
pub struct SegmentRegistry {
    segments: BTreeMap<String, Arc<ComponentTable>>,
}

impl SegmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a segment schema.
    pub fn insert(&mut self, identifier: impl Into<String>, table: Arc<ComponentTable>) {
        self.segments.insert(identifier.into(), table);
    }

    /// Builder-style insert.
    pub fn with(mut self, identifier: impl Into<String>, table: Arc<ComponentTable>) -> Self {
        self.insert(identifier, table);
        self
    }

    /// Field table for `identifier`, if registered.
    pub fn get(&self, identifier: &str) -> Option<Arc<ComponentTable>> {
        self.segments.get(identifier).map(Arc::clone)
    }

    /// Returns true if `identifier` has a registered schema.
    pub fn contains(&self, identifier: &str) -> bool {
        self.segments.contains_key(identifier)
    }
}

/// Static description of one message kind.
#[derive(Debug)]
pub struct MessageDefinition {
    message_code: String,
    trigger_event: String,
    catalog: StructureCatalog,
    segments: SegmentRegistry,
    cache: GrammarCache,
}

impl MessageDefinition {
    pub fn new(
        message_code: impl Into<String>,
        trigger_event: impl Into<String>,
        catalog: StructureCatalog,
        segments: SegmentRegistry,
    ) -> Self {
        Self {
            message_code: message_code.into(),
            trigger_event: trigger_event.into(),
            catalog,
            segments,
            cache: GrammarCache::new(),
        }
    }

    /// Message code, e.g. `ADT`.
    pub fn message_code(&self) -> &str {
        &self.message_code
    }

    /// Trigger event, e.g. `A01`.
    pub fn trigger_event(&self) -> &str {
        &self.trigger_event
    }

    /// The combined structure identifier, e.g. `ADT_A01`.
    pub fn structure_id(&self) -> String {
        format!("{}_{}", self.message_code, self.trigger_event)
    }

    /// The versioned structure catalog.
    pub fn catalog(&self) -> &StructureCatalog {
        &self.catalog
    }

    /// The segment schema registry.
    pub fn segments(&self) -> &SegmentRegistry {
        &self.segments
    }

    /// Compiled grammar for `version`, built on first use.
    pub fn compiled(&self, version: &str) -> Er7Result<Arc<CompiledGrammar>> {
        self.cache.get_or_compile(&self.catalog, version)
    }
}
