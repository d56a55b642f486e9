use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// A location fix together with the instant it was obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub coords: Coordinates,
    pub timestamp: DateTime<Utc>,
}

impl Position {
    pub fn now(coords: Coordinates) -> Self {
        Self { coords, timestamp: Utc::now() }
    }
}

/// Local wall-clock sunrise and sunset, hours 0–23 and minutes 0–59.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunTimes {
    pub sunrise_hour: u8,
    pub sunrise_minute: u8,
    pub sunset_hour: u8,
    pub sunset_minute: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    SunriseHour,
    SunriseMinute,
    SunsetHour,
    SunsetMinute,
}

impl MessageKey {
    pub fn name(&self) -> &'static str {
        match self {
            MessageKey::SunriseHour => "KEY_SUNRISE_HOUR",
            MessageKey::SunriseMinute => "KEY_SUNRISE_MINUTE",
            MessageKey::SunsetHour => "KEY_SUNSET_HOUR",
            MessageKey::SunsetMinute => "KEY_SUNSET_MINUTE",
        }
    }

    /// Numeric key registered by the watch application.
    pub fn app_key(&self) -> u32 {
        match self {
            MessageKey::SunriseHour => 0,
            MessageKey::SunriseMinute => 1,
            MessageKey::SunsetHour => 2,
            MessageKey::SunsetMinute => 3,
        }
    }

    pub const fn all() -> &'static [MessageKey] {
        &[
            MessageKey::SunriseHour,
            MessageKey::SunriseMinute,
            MessageKey::SunsetHour,
            MessageKey::SunsetMinute,
        ]
    }
}

impl std::fmt::Display for MessageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload sent to the watch. Only constructible from a complete [`SunTimes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    #[serde(rename = "KEY_SUNRISE_HOUR")]
    sunrise_hour: i32,
    #[serde(rename = "KEY_SUNRISE_MINUTE")]
    sunrise_minute: i32,
    #[serde(rename = "KEY_SUNSET_HOUR")]
    sunset_hour: i32,
    #[serde(rename = "KEY_SUNSET_MINUTE")]
    sunset_minute: i32,
}

impl OutboundMessage {
    pub fn get(&self, key: MessageKey) -> i32 {
        match key {
            MessageKey::SunriseHour => self.sunrise_hour,
            MessageKey::SunriseMinute => self.sunrise_minute,
            MessageKey::SunsetHour => self.sunset_hour,
            MessageKey::SunsetMinute => self.sunset_minute,
        }
    }

    pub fn entries(&self) -> [(MessageKey, i32); 4] {
        [
            (MessageKey::SunriseHour, self.sunrise_hour),
            (MessageKey::SunriseMinute, self.sunrise_minute),
            (MessageKey::SunsetHour, self.sunset_hour),
            (MessageKey::SunsetMinute, self.sunset_minute),
        ]
    }
}

impl From<SunTimes> for OutboundMessage {
    fn from(times: SunTimes) -> Self {
        Self {
            sunrise_hour: times.sunrise_hour.into(),
            sunrise_minute: times.sunrise_minute.into(),
            sunset_hour: times.sunset_hour.into(),
            sunset_minute: times.sunset_minute.into(),
        }
    }
}
