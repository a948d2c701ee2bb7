//! # Smart Clock Core Library
//!
//! This library hosts everything the smart clock needs apart from the binary's
//! run loop: the C interface of the native `clock_util` library, safe owned
//! wrappers around its handles, configuration, the window host and the clock
//! renderer.
//!
//! ## Layering
//!
//! ### Native boundary
//! - [`ffi`]: `#[repr(C)]` records, integer codes, callback shapes and the
//!   function table for every `clock_util` entry point
//! - [`library`]: opens `clock_util` with `libloading` and resolves the table
//!
//! ### Safe wrappers
//! - [`ntp`], [`weather`], [`alarm`]: one owned type per opaque handle. Each
//!   wrapper destroys its handle exactly once, on drop, and keeps the library
//!   loaded for as long as it lives.
//!
//! ### Host
//! - [`config`]: `clock-config.toml` loading with defaults
//! - [`window`]: window lifecycle (create, show, close, re-activate)
//! - [`renderer`]: time, date, weather and alarm formatting
//! - [`weather_cache`]: last known conditions persisted between runs
//! - [`app`]: the per-tick loop that pumps the native clients and redraws
//!
//! ## Core Types
//!
//! The types below are the owned, validated counterparts of the raw records
//! that cross the native boundary:
//! - [`TimeOfDay`]: an alarm trigger time
//! - [`Weekdays`]: the weekday bitmask an alarm applies to
//! - [`Alarm`]: a scheduled alarm as reported by the scheduler
//! - [`GeoLocation`] and [`WeatherConditions`]: weather request and answer

use serde::{Deserialize, Serialize};
use std::fmt;
use std::os::raw::c_int;
use std::str::FromStr;
use thiserror::Error;

// Module declarations
pub mod alarm;
pub mod app;
pub mod config;
pub mod error;
pub mod ffi;
pub mod library;
pub mod ntp;
pub mod renderer;
pub mod weather;
pub mod weather_cache;
pub mod window;

#[cfg(test)]
mod tests;

pub use error::ClockError;
pub use library::ClockUtil;

/// Errors produced while parsing a `HH:MM[:SS]` time value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    /// A character other than a digit or `:` was found
    #[error("invalid character in time value `{0}`")]
    InvalidCharacter(String),

    /// Wrong number of `:`-separated fields
    #[error("time value `{0}` must look like HH:MM or HH:MM:SS")]
    Malformed(String),

    /// A field is outside its range (hour 0-23, minute and second 0-59)
    #[error("time value `{0}` is out of bounds")]
    OutOfBounds(String),
}

/// An hour/minute pair used as an alarm trigger time.
///
/// Construction validates the range (hour 0-23, minute 0-59), so every value
/// of this type can be handed to the native scheduler as is.
///
/// # Example
/// ```
/// use smart_clock_lib::TimeOfDay;
///
/// let wake_up: TimeOfDay = "06:30".parse().unwrap();
/// assert_eq!(wake_up.hour(), 6);
/// assert_eq!(wake_up.minute(), 30);
/// assert!(TimeOfDay::new(24, 0).is_none());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Returns `None` when the hour or minute is out of range.
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(TimeOfDay { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Minutes elapsed since midnight.
    pub fn minutes_since_midnight(&self) -> u32 {
        u32::from(self.hour) * 60 + u32::from(self.minute)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Parses `HH:MM` or `HH:MM:SS`.
///
/// Seconds are validated but dropped: the scheduler works at minute
/// resolution.
impl FromStr for TimeOfDay {
    type Err = TimeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.chars().any(|c| !c.is_ascii_digit() && c != ':') {
            return Err(TimeParseError::InvalidCharacter(trimmed.to_string()));
        }

        let fields: Vec<&str> = trimmed.split(':').collect();
        if !(2..=3).contains(&fields.len()) || fields.iter().any(|f| f.is_empty() || f.len() > 2) {
            return Err(TimeParseError::Malformed(trimmed.to_string()));
        }

        // Every field is 1-2 ASCII digits at this point
        let numbers: Vec<u8> = fields
            .iter()
            .map(|f| f.parse::<u8>())
            .collect::<Result<_, _>>()
            .map_err(|_| TimeParseError::Malformed(trimmed.to_string()))?;

        if numbers.get(2).is_some_and(|&seconds| seconds > 59) {
            return Err(TimeParseError::OutOfBounds(trimmed.to_string()));
        }

        TimeOfDay::new(numbers[0], numbers[1])
            .ok_or_else(|| TimeParseError::OutOfBounds(trimmed.to_string()))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = TimeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(time: TimeOfDay) -> Self {
        time.to_string()
    }
}

bitflags::bitflags! {
    /// Days of the week an alarm triggers on.
    ///
    /// Bit values match the native scheduler (`Monday = 0x1` through
    /// `Sunday = 0x40`). Bits outside the seven days are retained rather than
    /// dropped so a mask read back from the library is exactly what was
    /// stored.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Weekdays: u32 {
        const MONDAY = 0x01;
        const TUESDAY = 0x02;
        const WEDNESDAY = 0x04;
        const THURSDAY = 0x08;
        const FRIDAY = 0x10;
        const SATURDAY = 0x20;
        const SUNDAY = 0x40;

        const WORKDAYS = Self::MONDAY.bits()
            | Self::TUESDAY.bits()
            | Self::WEDNESDAY.bits()
            | Self::THURSDAY.bits()
            | Self::FRIDAY.bits();
        const WEEKEND = Self::SATURDAY.bits() | Self::SUNDAY.bits();
    }
}

impl Weekdays {
    /// True when the alarm applies to `day`.
    pub fn includes(&self, day: chrono::Weekday) -> bool {
        self.contains(Weekdays::from(day))
    }

    /// Three-letter names of the included days, Monday first.
    pub fn short_names(&self) -> Vec<&'static str> {
        const DAYS: [(Weekdays, &str); 7] = [
            (Weekdays::MONDAY, "Mon"),
            (Weekdays::TUESDAY, "Tue"),
            (Weekdays::WEDNESDAY, "Wed"),
            (Weekdays::THURSDAY, "Thu"),
            (Weekdays::FRIDAY, "Fri"),
            (Weekdays::SATURDAY, "Sat"),
            (Weekdays::SUNDAY, "Sun"),
        ];
        DAYS.iter()
            .filter(|(day, _)| self.contains(*day))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl From<chrono::Weekday> for Weekdays {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekdays::MONDAY,
            chrono::Weekday::Tue => Weekdays::TUESDAY,
            chrono::Weekday::Wed => Weekdays::WEDNESDAY,
            chrono::Weekday::Thu => Weekdays::THURSDAY,
            chrono::Weekday::Fri => Weekdays::FRIDAY,
            chrono::Weekday::Sat => Weekdays::SATURDAY,
            chrono::Weekday::Sun => Weekdays::SUNDAY,
        }
    }
}

impl FromIterator<chrono::Weekday> for Weekdays {
    fn from_iter<I: IntoIterator<Item = chrono::Weekday>>(days: I) -> Self {
        days.into_iter()
            .fold(Weekdays::empty(), |mask, day| mask | Weekdays::from(day))
    }
}

/// A scheduled alarm, copied out of the native scheduler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alarm {
    /// Alarm text; also the key used to remove the alarm
    pub label: String,
    /// Trigger time of day
    pub time: TimeOfDay,
    /// Days the alarm applies to
    pub days: Weekdays,
    /// Sound file played when the alarm fires
    pub sound_file: Option<String>,
}

/// A latitude/longitude pair for a weather request.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// Temperature unit requested from the weather client.
///
/// The discriminants are the integer codes of the native interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    Kelvin = 0,
    Celsius = 1,
    Fahrenheit = 2,
}

impl TemperatureUnit {
    /// Integer code passed to `weather_client_create`.
    pub fn code(self) -> c_int {
        self as c_int
    }

    /// Suffix used when displaying a temperature.
    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Kelvin => " K",
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }
}

impl TryFrom<c_int> for TemperatureUnit {
    type Error = ClockError;

    fn try_from(code: c_int) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(TemperatureUnit::Kelvin),
            1 => Ok(TemperatureUnit::Celsius),
            2 => Ok(TemperatureUnit::Fahrenheit),
            other => Err(ClockError::UnknownCode {
                kind: "temperature unit",
                code: other,
            }),
        }
    }
}

/// Outcome code of a weather operation, as reported to the conditions callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WeatherOpResult {
    Success = 0,
    /// The service could not be reached
    CommError = 1,
    /// The service answered with something that could not be parsed
    InvalidData = 2,
    Timeout = 3,
}

impl WeatherOpResult {
    pub fn code(self) -> c_int {
        self as c_int
    }
}

impl TryFrom<c_int> for WeatherOpResult {
    type Error = ClockError;

    fn try_from(code: c_int) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(WeatherOpResult::Success),
            1 => Ok(WeatherOpResult::CommError),
            2 => Ok(WeatherOpResult::InvalidData),
            3 => Ok(WeatherOpResult::Timeout),
            other => Err(ClockError::UnknownCode {
                kind: "weather operation result",
                code: other,
            }),
        }
    }
}

impl fmt::Display for WeatherOpResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            WeatherOpResult::Success => "success",
            WeatherOpResult::CommError => "communication error",
            WeatherOpResult::InvalidData => "invalid data",
            WeatherOpResult::Timeout => "timeout",
        };
        f.write_str(text)
    }
}

/// Snapshot of observed weather conditions.
///
/// Copied out of the library's record during the callback, so it stays valid
/// after the library reuses or frees its buffer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherConditions {
    /// Current temperature
    pub temperature: f64,
    /// Forecast high
    pub high: f64,
    /// Forecast low
    pub low: f64,
    /// Free-text description, e.g. "light intensity drizzle"
    pub description: String,
    /// Unit the temperatures are expressed in
    pub unit: TemperatureUnit,
}
