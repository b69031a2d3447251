//! Record types for extracted species pages

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;

/// Semantic labels of the seven metric slots, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricLabel {
    Hp,
    Attack,
    Defense,
    SpecialAttack,
    SpecialDefense,
    Speed,
    /// Derived: sum of the six components
    Total,
}

impl MetricLabel {
    /// All labels in slot order
    pub const ALL: [MetricLabel; 7] = [
        Self::Hp,
        Self::Attack,
        Self::Defense,
        Self::SpecialAttack,
        Self::SpecialDefense,
        Self::Speed,
        Self::Total,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hp => "hp",
            Self::Attack => "attack",
            Self::Defense => "defense",
            Self::SpecialAttack => "special_attack",
            Self::SpecialDefense => "special_defense",
            Self::Speed => "speed",
            Self::Total => "total",
        }
    }
}

impl fmt::Display for MetricLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Seven ordered base-stat values: six components plus their total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Metrics([u32; 7]);

impl Metrics {
    /// Number of slots, components plus total
    pub const LEN: usize = 7;

    pub fn new(values: [u32; 7]) -> Self {
        Self(values)
    }

    pub fn get(&self, label: MetricLabel) -> u32 {
        self.0[label.index()]
    }

    /// The six component values (everything but the total)
    pub fn components(&self) -> &[u32] {
        &self.0[..6]
    }

    /// The total as published on the page
    pub fn total(&self) -> u32 {
        self.0[6]
    }

    /// Sum of the six components, widened so large cells cannot overflow
    pub fn components_sum(&self) -> u64 {
        self.components().iter().map(|&v| u64::from(v)).sum()
    }

    /// True when the published total equals the sum of the components
    pub fn is_consistent(&self) -> bool {
        self.components_sum() == u64::from(self.total())
    }

    /// Returns a warning when the published total disagrees with the components
    pub fn check_sum(&self, catalog_id: u32) -> Option<DataQualityWarning> {
        (!self.is_consistent()).then(|| DataQualityWarning {
            catalog_id,
            components_sum: self.components_sum(),
            total: self.total(),
        })
    }

    pub fn values(&self) -> [u32; 7] {
        self.0
    }
}

impl Serialize for Metrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Metrics", Self::LEN)?;
        for label in MetricLabel::ALL {
            state.serialize_field(label.as_str(), &self.get(label))?;
        }
        state.end()
    }
}

/// A species page's extracted fields
///
/// Records are only built when every field extracted cleanly; there is no
/// partially-filled form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    /// National catalog number, unique within a run
    pub catalog_id: u32,

    /// Display name without the page's disambiguation suffix
    pub name: String,

    pub primary_category: String,

    /// `None` when the page lists a single category
    pub secondary_category: Option<String>,

    pub metrics: Metrics,

    /// Generation the entity was introduced in
    pub generation_tag: u32,
}

impl PageRecord {
    /// Secondary category for display, `none` when absent
    pub fn secondary_category_label(&self) -> &str {
        self.secondary_category.as_deref().unwrap_or("none")
    }

    pub fn data_quality_warning(&self) -> Option<DataQualityWarning> {
        self.metrics.check_sum(self.catalog_id)
    }
}

/// Non-fatal metric-sum mismatch on an otherwise valid record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataQualityWarning {
    pub catalog_id: u32,
    pub components_sum: u64,
    pub total: u32,
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "catalog #{}: components sum to {} but total is {}",
            self.catalog_id, self.components_sum, self.total
        )
    }
}
