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

//! Cardinality restrictions on grammar positions and groups.

/// Upper occurrence bound of a position or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MaxOccurs {
    /// At most `n` occurrences.
    Bounded(u32),
    /// Unlimited occurrences.
    Unbounded,
}

impl MaxOccurs {
    /// Returns true if more than one occurrence is allowed.
    pub fn is_multiple(&self) -> bool {
        match self {
            Self::Bounded(n) => *n > 1,
            Self::Unbounded => true,
        }
    }

    /// Returns true if `count` occurrences exceed the bound.
    pub fn exceeded_by(&self, count: usize) -> bool {
        match self {
            Self::Bounded(n) => count > *n as usize,
            Self::Unbounded => false,
        }
    }
}

/// The required/optional/repeatable constraints on one grammar position
/// or group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Restrictions {
    /// Minimum occurrence count.
    pub min_occurs: u32,
    /// Maximum occurrence count.
    pub max_occurs: MaxOccurs,
    /// Whether the position may be skipped entirely.
    pub nillable: bool,
}

impl Restrictions {
    /// Explicit bounds.
    pub fn new(min_occurs: u32, max_occurs: MaxOccurs, nillable: bool) -> Self {
        Self {
            min_occurs,
            max_occurs,
            nillable,
        }
    }

    /// Exactly one occurrence.
    pub fn required() -> Self {
        Self::new(1, MaxOccurs::Bounded(1), false)
    }

    /// Zero or one occurrence.
    pub fn optional() -> Self {
        Self::new(0, MaxOccurs::Bounded(1), true)
    }

    /// One or more occurrences.
    pub fn required_repeating() -> Self {
        Self::new(1, MaxOccurs::Unbounded, false)
    }

    /// Zero or more occurrences.
    pub fn optional_repeating() -> Self {
        Self::new(0, MaxOccurs::Unbounded, true)
    }

    /// Returns true if `count` occurrences fall short of the minimum.
    pub fn below_minimum(&self, count: usize) -> bool {
        count < self.min_occurs as usize
    }
}

impl Default for Restrictions {
    fn default() -> Self {
        Self::required()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== MaxOccurs tests ====================

    #[test]
    fn test_max_occurs_is_multiple() {
        assert!(!MaxOccurs::Bounded(1).is_multiple());
        assert!(MaxOccurs::Bounded(3).is_multiple());
        assert!(MaxOccurs::Unbounded.is_multiple());
    }

    #[test]
    fn test_max_occurs_exceeded_by() {
        assert!(!MaxOccurs::Bounded(2).exceeded_by(2));
        assert!(MaxOccurs::Bounded(2).exceeded_by(3));
        assert!(!MaxOccurs::Unbounded.exceeded_by(1_000_000));
    }

    // ==================== Restrictions tests ====================

    #[test]
    fn test_required_bounds() {
        let r = Restrictions::required();
        assert_eq!(r.min_occurs, 1);
        assert_eq!(r.max_occurs, MaxOccurs::Bounded(1));
        assert!(!r.nillable);
    }

    #[test]
    fn test_optional_repeating_bounds() {
        let r = Restrictions::optional_repeating();
        assert_eq!(r.min_occurs, 0);
        assert_eq!(r.max_occurs, MaxOccurs::Unbounded);
        assert!(r.nillable);
    }

    #[test]
    fn test_below_minimum() {
        assert!(Restrictions::required().below_minimum(0));
        assert!(!Restrictions::required().below_minimum(1));
        assert!(!Restrictions::optional().below_minimum(0));
    }
}
