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

//! Grammar compilation and per-version caching.
//!
//! A [`CompiledGrammar`] pairs a grammar with its precomputed follow
//! sets. Compilation cost is proportional to the grammar length, so the
//! [`GrammarCache`] amortizes it to once per (message kind, version);
//! cached grammars are immutable and shared across concurrent parses.

use crate::catalog::StructureCatalog;
use crate::follow::FollowSets;
use crate::model::Grammar;
use er7_core::{Er7Error, Er7Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A grammar with its follow-set table, ready for assembly.
#[derive(Debug)]
pub struct CompiledGrammar {
    grammar: Grammar,
    follow: FollowSets,
}

impl CompiledGrammar {
    /// Compile `grammar` by building its follow sets.
    pub fn compile(grammar: Grammar) -> Self {
        let follow = FollowSets::build(&grammar);
        Self { grammar, follow }
    }

    /// The underlying grammar.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// The precomputed successor table.
    pub fn follow(&self) -> &FollowSets {
        &self.follow
    }
}

/// Per-version cache of compiled grammars for one message kind.
#[derive(Debug, Default)]
pub struct GrammarCache {
    inner: RwLock<HashMap<String, Arc<CompiledGrammar>>>,
}

impl GrammarCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the compiled grammar for `version`, compiling it from
    /// `catalog` on first use.
    pub fn get_or_compile(
        &self,
        catalog: &StructureCatalog,
        version: &str,
    ) -> Er7Result<Arc<CompiledGrammar>> {
        if let Ok(cache) = self.inner.read() {
            if let Some(compiled) = cache.get(version) {
                return Ok(Arc::clone(compiled));
            }
        }
        let grammar = catalog.grammar_for(version).ok_or_else(|| {
            Er7Error::version(format!("message version {} is not supported", version), 1)
        })?;
        let compiled = Arc::new(CompiledGrammar::compile(grammar));
        if let Ok(mut cache) = self.inner.write() {
            // A racing writer may have inserted meanwhile; keep the first
            let entry = cache
                .entry(version.to_string())
                .or_insert_with(|| Arc::clone(&compiled));
            return Ok(Arc::clone(entry));
        }
        Ok(compiled)
    }
}
