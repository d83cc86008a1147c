// ── Air modes ──
//
// The service exposes nine operating modes, each with a single-letter
// code. `A` is the only "off" mode; `B`..`E` heat and `F`..`I` cool.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{EnumCount, EnumIter, IntoEnumIterator};

use crate::error::CoreError;

/// One of the nine operating modes of an Aldes heat pump.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, EnumCount,
    Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum AirMode {
    Off,
    HeatComfort,
    HeatEco,
    HeatProgA,
    HeatProgB,
    CoolComfort,
    CoolBoost,
    CoolProgC,
    CoolProgD,
}

impl AirMode {
    /// Single-letter wire code.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Off => "A",
            Self::HeatComfort => "B",
            Self::HeatEco => "C",
            Self::HeatProgA => "D",
            Self::HeatProgB => "E",
            Self::CoolComfort => "F",
            Self::CoolBoost => "G",
            Self::CoolProgC => "H",
            Self::CoolProgD => "I",
        }
    }

    /// Human-readable label.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::HeatComfort => "Heat Comfort",
            Self::HeatEco => "Heat Eco",
            Self::HeatProgA => "Heat Prog A",
            Self::HeatProgB => "Heat Prog B",
            Self::CoolComfort => "Cool Comfort",
            Self::CoolBoost => "Cool Boost",
            Self::CoolProgC => "Cool Prog C",
            Self::CoolProgD => "Cool Prog D",
        }
    }

    /// Exact code lookup. Codes are case-sensitive.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::iter().find(|mode| mode.code() == code)
    }

    /// Label lookup, ignoring case and separators (`heat-eco`, `HeatEco`).
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = normalize(name);
        Self::iter().find(|mode| normalize(mode.name()) == wanted)
    }

    pub const fn is_off(self) -> bool {
        matches!(self, Self::Off)
    }

    pub const fn hvac_state(self) -> HvacState {
        match self {
            Self::Off => HvacState::Off,
            Self::HeatComfort | Self::HeatEco | Self::HeatProgA | Self::HeatProgB => {
                HvacState::Heat
            }
            Self::CoolComfort | Self::CoolBoost | Self::CoolProgC | Self::CoolProgD => {
                HvacState::Cool
            }
        }
    }

    /// The full mode table, in code order.
    pub fn table() -> Vec<ModeInfo> {
        Self::iter().map(ModeInfo::from).collect()
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl fmt::Display for AirMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts either a code (`"B"`) or a label (`"heat comfort"`).
impl FromStr for AirMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::from_code(trimmed)
            .or_else(|| Self::from_name(trimmed))
            .ok_or_else(|| CoreError::InvalidMode {
                code: trimmed.to_owned(),
            })
    }
}

impl TryFrom<String> for AirMode {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AirMode> for String {
    fn from(mode: AirMode) -> Self {
        mode.code().to_owned()
    }
}

// ── HVAC projection ─────────────────────────────────────────────────

/// Coarse heating/cooling state derived from the air mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum HvacState {
    Off,
    Heat,
    Cool,
}

impl HvacState {
    /// Project a raw mode code. Unknown or missing codes read as off.
    pub fn from_code(code: Option<&str>) -> Self {
        code.and_then(AirMode::from_code)
            .map_or(Self::Off, AirMode::hvac_state)
    }
}

impl fmt::Display for HvacState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::Heat => "heat",
            Self::Cool => "cool",
        })
    }
}

impl FromStr for HvacState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "heat" => Ok(Self::Heat),
            "cool" => Ok(Self::Cool),
            other => Err(CoreError::ValidationFailed {
                message: format!("unknown HVAC state '{other}' (expected off, heat, cool)"),
            }),
        }
    }
}

// ── Table row ───────────────────────────────────────────────────────

/// One row of the mode table, for display and serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub hvac: HvacState,
}

impl From<AirMode> for ModeInfo {
    fn from(mode: AirMode) -> Self {
        Self {
            code: mode.code(),
            name: mode.name(),
            hvac: mode.hvac_state(),
        }
    }
}
