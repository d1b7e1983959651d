//! Initial session values
use serde::{Deserialize, Serialize};

use crate::regions::RegionId;

const DEFAULT_SESSION_DATA: &str = include_str!("../assets/session.json");

/// Starting values for a new session. Every number passes through the
/// validator when the session is built, so out-of-range entries are clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    #[serde(default = "default_starting_region")]
    pub starting_region: RegionId,
    #[serde(default = "default_money")]
    pub money: i64,
    #[serde(default = "default_health")]
    pub health: i64,
    #[serde(default)]
    pub player_skill: i64,
    #[serde(default)]
    pub difficulty: i64,
    #[serde(default)]
    pub momentum: i64,
    #[serde(default)]
    pub monthly_listeners: i64,
    #[serde(default)]
    pub buzz: f64,
    #[serde(default)]
    pub game_time_hours: i64,
    #[serde(default = "default_knob")]
    pub knob_value: i64,
    #[serde(default)]
    pub speed_crank_percentage: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            starting_region: default_starting_region(),
            money: default_money(),
            health: default_health(),
            player_skill: 0,
            difficulty: 0,
            momentum: 0,
            monthly_listeners: 0,
            buzz: 0.0,
            game_time_hours: 0,
            knob_value: default_knob(),
            speed_crank_percentage: 0,
        }
    }
}

impl SessionConfig {
    /// Parse a config document.
    ///
    /// # Errors
    ///
    /// Returns the deserializer error when `json` is not a config object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_SESSION_DATA).unwrap_or_default()
    }

    #[must_use]
    pub fn default_config() -> Self {
        Self::load_from_static()
    }
}

fn default_starting_region() -> RegionId {
    RegionId::from("midwest")
}

const fn default_money() -> i64 {
    100
}

const fn default_health() -> i64 {
    100
}

const fn default_knob() -> i64 {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_config_parses() {
        let config = SessionConfig::from_json(DEFAULT_SESSION_DATA).expect("bundled config");
        assert_eq!(config, SessionConfig::load_from_static());
        assert_eq!(config.starting_region.as_str(), "midwest");
        assert_eq!(config.money, 250);
        assert!((config.buzz - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config = SessionConfig::from_json(r#"{"money": 40}"#).unwrap();
        assert_eq!(config.money, 40);
        assert_eq!(config.health, 100);
        assert_eq!(config.knob_value, 50);
        assert_eq!(config.starting_region, default_starting_region());
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(SessionConfig::from_json("[1, 2]").is_err());
        assert!(SessionConfig::from_json(r#"{"money": "lots"}"#).is_err());
    }
}
