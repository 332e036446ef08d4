use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lowest PMV value the classifier reports.
pub const PMV_MIN: f64 = -3.0;
/// Highest PMV value the classifier reports.
pub const PMV_MAX: f64 = 3.0;

/// Thermal sensation bucket for a PMV value.
///
/// Serialized with the exact labels stored in the `thermal_comfort` column,
/// including their mixed capitalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ThermalComfort {
    #[serde(rename = "Hot")]
    Hot,
    #[serde(rename = "Warm")]
    Warm,
    #[serde(rename = "A bit Warm")]
    ABitWarm,
    #[serde(rename = "Normal")]
    Normal,
    #[serde(rename = "A Bit Cool")]
    ABitCool,
    #[serde(rename = "Cool")]
    Cool,
    #[serde(rename = "Cold")]
    Cold,
}

impl ThermalComfort {
    /// All labels, hottest first.
    pub const ALL: [ThermalComfort; 7] = [
        ThermalComfort::Hot,
        ThermalComfort::Warm,
        ThermalComfort::ABitWarm,
        ThermalComfort::Normal,
        ThermalComfort::ABitCool,
        ThermalComfort::Cool,
        ThermalComfort::Cold,
    ];

    /// Bucket an already clamped and rounded PMV value.
    ///
    /// Upper bands are inclusive at their lower edge, the two cool bands are
    /// exclusive, so only exactly `-3.0` lands in `Cold`.
    pub fn from_pmv(pmv: f64) -> Self {
        if pmv >= 3.0 {
            Self::Hot
        } else if pmv >= 2.0 {
            Self::Warm
        } else if pmv >= 1.0 {
            Self::ABitWarm
        } else if pmv >= -1.0 {
            Self::Normal
        } else if pmv > -2.0 {
            Self::ABitCool
        } else if pmv > -3.0 {
            Self::Cool
        } else {
            Self::Cold
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hot => "Hot",
            Self::Warm => "Warm",
            Self::ABitWarm => "A bit Warm",
            Self::Normal => "Normal",
            Self::ABitCool => "A Bit Cool",
            Self::Cool => "Cool",
            Self::Cold => "Cold",
        }
    }
}

impl fmt::Display for ThermalComfort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamp a raw model output to `[PMV_MIN, PMV_MAX]`, round it to two
/// decimals and classify the rounded value.
///
/// Rounding happens before the threshold checks, so `2.996` becomes `3.0`
/// and is reported as `Hot`.
pub fn classify(raw: f64) -> (f64, ThermalComfort) {
    let pmv = round2(raw.clamp(PMV_MIN, PMV_MAX));
    (pmv, ThermalComfort::from_pmv(pmv))
}

/// Correctly rounded to two decimal places (ties to even on the exact binary
/// value), which is what float formatting with a fixed precision produces.
fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}
