//! Units of measure and the equivalence (alias) rule.

use serde::{Deserialize, Serialize};

use stocktally_core::UnitId;

/// A unit of measure as recorded in master data.
///
/// Note that derived `PartialEq` is strict field equality; conversion lookups
/// use [`units_equivalent`] instead, which treats "same id" and "same code,
/// case-insensitively" as the same unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitOfMeasure {
    pub id: UnitId,
    /// Human code, e.g. "KG", "g", "EA".
    pub code: String,
    /// Optional grouping such as "mass" or "volume". Informational only;
    /// convertibility is decided by the edge set, never by family.
    pub family: Option<String>,
}

impl UnitOfMeasure {
    pub fn new(id: UnitId, code: impl Into<String>) -> Self {
        Self {
            id,
            code: code.into(),
            family: None,
        }
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    /// Normalized code used for alias comparison.
    pub fn code_key(&self) -> String {
        self.code.trim().to_ascii_lowercase()
    }

    /// See [`units_equivalent`].
    pub fn is_equivalent_to(&self, other: &UnitOfMeasure) -> bool {
        units_equivalent(self, other)
    }
}

/// Two-stage unit equivalence: identity match first, then normalized-code
/// match. This is an alias rule: a movement may reference a unit by id while
/// the conversion edge references it by code, and both must resolve to the
/// same node at factor 1.
pub fn units_equivalent(a: &UnitOfMeasure, b: &UnitOfMeasure) -> bool {
    if a.id == b.id {
        return true;
    }
    let key = a.code_key();
    // Blank codes never alias.
    !key.is_empty() && key == b.code_key()
}
