//! # Clock Face Rendering
//!
//! Turns the current time, the latest weather conditions and the next alarm
//! into the lines of text shown in the clock window. Rendering is pure string
//! formatting; putting the lines on screen is the job of a
//! [`crate::window::Surface`].
//!
//! Frame layout, top to bottom:
//!
//! ```text
//! 7:05:09 PM
//! Friday, October 16 2026
//!
//! 43°F  H 50°F  L 38°F  light rain
//! Alarm 06:30 Mon Tue Wed Thu Fri  Wake up
//! <status, when there is one>
//! ```

use crate::config::DisplayConfig;
use crate::{Alarm, WeatherConditions};
use chrono::{NaiveDateTime, Timelike};

/// Formatted time and date for one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClockFace {
    /// `h:mm[:ss]` or `HH:MM[:SS]`
    pub time: String,
    /// `" AM"`/`" PM"` in 12-hour mode, empty in 24-hour mode
    pub period: &'static str,
    /// e.g. `Friday, October 16 2026`
    pub date: String,
}

impl ClockFace {
    pub fn at(now: NaiveDateTime, display: &DisplayConfig) -> Self {
        let (time, period) = if display.use_24_hour {
            let time = if display.show_seconds {
                now.format("%H:%M:%S")
            } else {
                now.format("%H:%M")
            };
            (time.to_string(), "")
        } else {
            // hour12() maps both midnight and noon to 12
            let (is_pm, hour) = now.hour12();
            let mut time = format!("{}:{:02}", hour, now.minute());
            if display.show_seconds {
                time.push_str(&format!(":{:02}", now.second()));
            }
            (time, if is_pm { " PM" } else { " AM" })
        };

        ClockFace {
            time,
            period,
            date: now.format("%A, %B %-d %Y").to_string(),
        }
    }

    /// Time with its period, e.g. `7:05:09 PM`.
    pub fn time_line(&self) -> String {
        format!("{}{}", self.time, self.period)
    }
}

/// One temperature with its unit, rounded to whole degrees.
pub fn format_temperature(value: f64, conditions: &WeatherConditions) -> String {
    format!("{:.0}{}", value, conditions.unit.symbol())
}

/// `43°F  H 50°F  L 38°F  light rain`
pub fn weather_line(conditions: &WeatherConditions) -> String {
    let mut line = format!(
        "{}  H {}  L {}",
        format_temperature(conditions.temperature, conditions),
        format_temperature(conditions.high, conditions),
        format_temperature(conditions.low, conditions),
    );
    if !conditions.description.is_empty() {
        line.push_str("  ");
        line.push_str(&conditions.description);
    }
    line
}

/// `Alarm 06:30 Mon Tue Wed Thu Fri  Wake up`
pub fn alarm_line(alarm: &Alarm) -> String {
    let days = alarm.days.short_names();
    let mut line = format!("Alarm {}", alarm.time);
    if !days.is_empty() {
        line.push(' ');
        line.push_str(&days.join(" "));
    }
    if !alarm.label.is_empty() {
        line.push_str("  ");
        line.push_str(&alarm.label);
    }
    line
}

/// Build every line of a frame.
pub fn render_frame(
    face: &ClockFace,
    weather: Option<&WeatherConditions>,
    next_alarm: Option<&Alarm>,
    status: Option<&str>,
) -> Vec<String> {
    let mut lines = vec![face.time_line(), face.date.clone(), String::new()];

    lines.push(match weather {
        Some(conditions) => weather_line(conditions),
        None => "Weather unavailable".to_string(),
    });
    lines.push(match next_alarm {
        Some(alarm) => alarm_line(alarm),
        None => "No alarms scheduled".to_string(),
    });
    if let Some(status) = status.filter(|s| !s.is_empty()) {
        lines.push(status.to_string());
    }
    lines
}

/// Render a frame to the terminal.
pub fn draw_ascii(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}
