// ── Wire models ──
//
// The products payload is unversioned and loosely typed. Only the
// fields the sync core inspects are typed; everything else is kept
// verbatim in `extra` maps so a snapshot round-trips unchanged.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

// ── Product ─────────────────────────────────────────────────────────

/// One installation returned by `GET /aldesoc/v5/users/me/products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Modem identifier, used as the path key for write endpoints.
    #[serde(default)]
    pub modem: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Product family as reported by the service (e.g. `"TONE_AIR"`).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, rename = "isConnected", skip_serializing_if = "Option::is_none")]
    pub is_connected: Option<bool>,
    #[serde(default)]
    pub indicator: Indicator,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// Current air mode code (`"A"`..`"I"`), if reported.
    pub fn air_mode(&self) -> Option<&str> {
        self.indicator.current_air_mode.as_deref()
    }

    pub fn thermostats(&self) -> &[Thermostat] {
        &self.indicator.thermostats
    }
}

/// Live readings block of a [`Product`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    #[serde(default)]
    pub current_air_mode: Option<String>,
    #[serde(default)]
    pub current_water_mode: Option<String>,
    #[serde(default)]
    pub thermostats: Vec<Thermostat>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Thermostat ──────────────────────────────────────────────────────

/// A room thermostat attached to a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Thermostat {
    pub thermostat_id: ThermostatId,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "Type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub icon_id: Option<i64>,
    #[serde(default)]
    pub number: Option<i64>,
    #[serde(default)]
    pub temperature_set: Option<Temperature>,
    #[serde(default)]
    pub current_temperature: Option<Temperature>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Stable identifier of a physical thermostat.
///
/// The service reports it as a number but accepts (and sometimes
/// echoes) a numeric string, so both forms deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThermostatId(pub u64);

impl fmt::Display for ThermostatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ThermostatId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u64> for ThermostatId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl Serialize for ThermostatId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for ThermostatId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = ThermostatId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a thermostat id as a number or numeric string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(ThermostatId(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .map(ThermostatId)
                    .map_err(|_| E::custom(format!("negative thermostat id {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

// ── Temperature ─────────────────────────────────────────────────────

/// A temperature in tenths of a degree Celsius.
///
/// Fixed-point so that equality between fetches is exact. Whole degrees
/// serialize as JSON integers (`25`), fractional ones as decimals (`21.5`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Temperature(i32);

impl Temperature {
    pub const fn from_tenths(tenths: i32) -> Self {
        Self(tenths)
    }

    /// Whole degrees. Saturates at the representable range.
    pub const fn from_degrees(degrees: i32) -> Self {
        Self(degrees.saturating_mul(10))
    }

    /// Round a Celsius value to the nearest tenth. `None` for NaN,
    /// infinities, and values outside the representable range.
    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    pub fn from_celsius(celsius: f64) -> Option<Self> {
        let tenths = (celsius * 10.0).round();
        if tenths.is_finite() && tenths >= f64::from(i32::MIN) && tenths <= f64::from(i32::MAX) {
            Some(Self(tenths as i32))
        } else {
            None
        }
    }

    pub const fn tenths(self) -> i32 {
        self.0
    }

    pub fn celsius(self) -> f64 {
        f64::from(self.0) / 10.0
    }

    pub const fn is_whole(self) -> bool {
        self.0 % 10 == 0
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.celsius())
    }
}

impl FromStr for Temperature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches("°C").trim_end_matches('C');
        let value: f64 = trimmed
            .parse()
            .map_err(|e| format!("invalid temperature '{s}': {e}"))?;
        Self::from_celsius(value).ok_or_else(|| format!("temperature out of range: '{s}'"))
    }
}

impl Serialize for Temperature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_whole() {
            serializer.serialize_i32(self.0 / 10)
        } else {
            serializer.serialize_f64(self.celsius())
        }
    }
}

impl<'de> Deserialize<'de> for Temperature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TemperatureVisitor;

        impl Visitor<'_> for TemperatureVisitor {
            type Value = Temperature;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a temperature in degrees Celsius")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                i32::try_from(v)
                    .ok()
                    .and_then(|d| d.checked_mul(10))
                    .map(Temperature)
                    .ok_or_else(|| E::custom(format!("temperature out of range: {v}")))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                i64::try_from(v)
                    .map_err(|_| E::custom(format!("temperature out of range: {v}")))
                    .and_then(|v| self.visit_i64(v))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Temperature::from_celsius(v)
                    .ok_or_else(|| E::custom(format!("temperature out of range: {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(TemperatureVisitor)
    }
}

// ── Write payloads ──────────────────────────────────────────────────

/// Body element of `PATCH …/updateThermostats`.
///
/// The service only acts on the id and the setpoint, so only those
/// two fields are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ThermostatUpdate {
    pub thermostat_id: ThermostatId,
    pub temperature_set: Temperature,
}

impl ThermostatUpdate {
    pub fn new(thermostat_id: ThermostatId, temperature_set: Temperature) -> Self {
        Self {
            thermostat_id,
            temperature_set,
        }
    }

    /// Build from a thermostat snapshot. `None` when it carries no setpoint.
    pub fn from_thermostat(thermostat: &Thermostat) -> Option<Self> {
        thermostat
            .temperature_set
            .map(|t| Self::new(thermostat.thermostat_id, t))
    }
}

/// Body of `POST …/commands`.
#[derive(Debug, Serialize)]
pub(crate) struct ModeCommand<'a> {
    pub method: &'static str,
    pub params: [&'a str; 1],
}

impl<'a> ModeCommand<'a> {
    pub(crate) fn change_mode(code: &'a str) -> Self {
        Self {
            method: "changeMode",
            params: [code],
        }
    }
}

// ── Token endpoint ──────────────────────────────────────────────────

/// Response of `POST /oauth2/token/`.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".into()
}
