//! # Clock Application Loop
//!
//! Ties the native services, the window host and the renderer together. The
//! binary calls [`ClockApp::tick`] on a fixed period; each tick:
//!
//! 1. pumps the pending NTP query and reacts to a finished one (drift check,
//!    optional clock correction);
//! 2. pumps the pending weather request and caches fresh conditions;
//! 3. starts new NTP/weather operations when their interval has elapsed;
//! 4. refreshes the next alarm when the minute changes;
//! 5. redraws the frame.
//!
//! Without the native library the app still runs as a plain clock.

use crate::alarm::AlarmScheduler;
use crate::config::Config;
use crate::library::ClockUtil;
use crate::ntp::{self, NtpClient, NtpResult, NtpUpdate};
use crate::renderer::{render_frame, ClockFace};
use crate::weather::{WeatherClient, WeatherUpdate};
use crate::weather_cache::{self, CacheError, CachedWeather};
use crate::window::{Surface, WindowEvent, WindowHost, WindowOptions};
use crate::{Alarm, WeatherConditions};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use log::{debug, info, warn};
use std::io;
use std::sync::Arc;
use std::time::Duration;

/// Progress of the asynchronous operation a client is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationState {
    Idle,
    InProcess,
    Error,
    Success,
}

/// The running clock.
pub struct ClockApp<S: Surface> {
    config: Config,
    host: WindowHost<S>,
    // Fields drop in declaration order: the reverse of creation order
    alarms: Option<AlarmScheduler>,
    weather: Option<WeatherClient>,
    ntp: Option<NtpClient>,
    util: Option<Arc<ClockUtil>>,

    ntp_state: OperationState,
    weather_state: OperationState,
    last_ntp_check: Option<DateTime<Utc>>,
    last_weather_request: Option<DateTime<Utc>>,
    last_alarm_minute: Option<i64>,

    conditions: Option<WeatherConditions>,
    next_alarm: Option<Alarm>,
    status: Option<String>,
}

impl<S: Surface> ClockApp<S> {
    /// A display-only clock; see [`ClockApp::attach`] for the native services.
    pub fn new(config: Config, surface: S) -> Self {
        let host = WindowHost::new(WindowOptions::from(&config.window), surface);
        let conditions = match weather_cache::load(&config.weather.cache_path, config.weather.cache_ttl()) {
            Ok(cached) => {
                debug!("Using cached weather from {}", cached.fetched_at);
                Some(cached.conditions)
            }
            Err(e @ CacheError::Json(_)) => {
                warn!("Ignoring unreadable weather cache: {}", e);
                None
            }
            Err(e) => {
                debug!("No usable weather cache: {}", e);
                None
            }
        };

        ClockApp {
            config,
            host,
            alarms: None,
            weather: None,
            ntp: None,
            util: None,
            ntp_state: OperationState::Idle,
            weather_state: OperationState::Idle,
            last_ntp_check: None,
            last_weather_request: None,
            last_alarm_minute: None,
            conditions,
            next_alarm: None,
            status: Some("Clock service unavailable".to_string()),
        }
    }

    /// Create the native clients. A client that fails to start is logged and
    /// left out; the rest of the clock keeps working.
    pub fn attach(&mut self, util: Arc<ClockUtil>) {
        self.status = None;

        if self.config.ntp.sync_on_start {
            match ntp::set_time(&util, &self.config.ntp.server, self.config.ntp.timeout()) {
                Ok(outcome) => self.status = Some(outcome.message().to_string()),
                Err(e) => warn!("Initial time sync skipped: {}", e),
            }
        }

        self.ntp = NtpClient::create(&util)
            .map_err(|e| warn!("NTP client unavailable: {}", e))
            .ok();

        if self.config.weather.is_enabled() {
            self.weather = WeatherClient::create(&util, &self.config.weather.api_key, self.config.weather.units)
                .map_err(|e| warn!("Weather client unavailable: {}", e))
                .ok();
        } else {
            info!("No weather API key configured, weather disabled");
        }

        match AlarmScheduler::create(&util) {
            Ok(mut scheduler) => {
                scheduler.load_from_config(&self.config.alarms);
                self.alarms = Some(scheduler);
            }
            Err(e) => warn!("Alarm scheduler unavailable: {}", e),
        }

        self.util = Some(util);
    }

    /// The application is ready: create and show the window.
    pub fn start(&mut self) -> io::Result<()> {
        self.host.create()?;
        self.host.handle(WindowEvent::ReadyToShow)
    }

    pub fn handle_window_event(&mut self, event: WindowEvent) -> io::Result<()> {
        self.host.handle(event)?;
        // A re-created window is shown as soon as it exists
        if event == WindowEvent::Activate && self.host.is_open() && !self.host.is_visible() {
            self.host.handle(WindowEvent::ReadyToShow)?;
        }
        Ok(())
    }

    /// Advance every service and redraw.
    pub fn tick(&mut self, now: DateTime<FixedOffset>) -> io::Result<()> {
        let utc = now.with_timezone(&Utc);
        self.pump_ntp(utc);
        self.pump_weather(utc);
        self.refresh_next_alarm(utc);

        let lines = self.frame(now.naive_local());
        self.host.draw(&lines)?;
        Ok(())
    }

    /// The lines of the frame shown at `local`.
    pub fn frame(&self, local: NaiveDateTime) -> Vec<String> {
        let face = ClockFace::at(local, &self.config.display);
        render_frame(
            &face,
            self.conditions.as_ref(),
            self.next_alarm.as_ref(),
            self.status.as_deref(),
        )
    }

    /// Close the window and release every native handle.
    pub fn shutdown(mut self) -> io::Result<()> {
        self.host.handle(WindowEvent::Closed)?;
        drop(self.alarms.take());
        drop(self.weather.take());
        drop(self.ntp.take());
        drop(self.util.take());
        info!("Clock stopped");
        Ok(())
    }

    fn pump_ntp(&mut self, now: DateTime<Utc>) {
        let Some(client) = self.ntp.as_mut() else {
            return;
        };

        if self.ntp_state == OperationState::InProcess {
            client.process();
            for update in client.poll() {
                self.ntp_state = match update.result {
                    NtpResult::Success => OperationState::Success,
                    NtpResult::Timeout | NtpResult::Failed(_) => OperationState::Error,
                };
                self.on_ntp_update(update, now);
            }
        }

        let interval = self.config.ntp.check_interval();
        if self.ntp_state != OperationState::InProcess && is_due(self.last_ntp_check, now, interval) {
            let Some(client) = self.ntp.as_mut() else {
                return;
            };
            self.last_ntp_check = Some(now);
            self.ntp_state = match client.get_time(&self.config.ntp.server, self.config.ntp.timeout()) {
                Ok(()) => OperationState::InProcess,
                Err(e) => {
                    warn!("NTP query failed to start: {}", e);
                    OperationState::Error
                }
            };
        }
    }

    fn on_ntp_update(&mut self, update: NtpUpdate, now: DateTime<Utc>) {
        let Some(drift) = update.drift_from(now) else {
            warn!("NTP query against {} failed: {:?}", self.config.ntp.server, update.result);
            return;
        };

        let drift_secs = drift.num_seconds();
        if drift_secs.abs() <= self.config.ntp.max_drift_secs {
            debug!("Clock drift {}s within tolerance", drift_secs);
            return;
        }

        warn!("Clock is off by {}s", drift_secs);
        match (&self.util, self.config.ntp.apply_correction) {
            (Some(util), true) => match ntp::set_time(util, &self.config.ntp.server, self.config.ntp.timeout()) {
                Ok(outcome) => self.status = Some(outcome.message().to_string()),
                Err(e) => warn!("Time correction skipped: {}", e),
            },
            _ => self.status = Some(format!("Clock is off by {}s", drift_secs)),
        }
    }

    fn pump_weather(&mut self, now: DateTime<Utc>) {
        let Some(client) = self.weather.as_mut() else {
            return;
        };

        if self.weather_state == OperationState::InProcess {
            client.process();
            for update in client.poll() {
                match update {
                    WeatherUpdate::Conditions(conditions) => {
                        self.weather_state = OperationState::Success;
                        let cached = CachedWeather {
                            fetched_at: now,
                            conditions: conditions.clone(),
                        };
                        if let Err(e) = weather_cache::save(&self.config.weather.cache_path, &cached) {
                            warn!("Failed to cache weather: {}", e);
                        }
                        self.conditions = Some(conditions);
                    }
                    WeatherUpdate::Failed(result) => {
                        self.weather_state = OperationState::Error;
                        warn!("Weather request failed: {}", result);
                    }
                    WeatherUpdate::Unrecognized(code) => {
                        self.weather_state = OperationState::Error;
                        warn!("Weather request ended with unknown code {}", code);
                    }
                }
            }
        }

        let interval = self.config.weather.refresh_interval();
        if self.weather_state != OperationState::InProcess && is_due(self.last_weather_request, now, interval) {
            let Some(client) = self.weather.as_mut() else {
                return;
            };
            self.last_weather_request = Some(now);
            let location = self.config.weather.location();
            self.weather_state = match client.get_by_city(location, self.config.weather.timeout()) {
                Ok(()) => OperationState::InProcess,
                Err(e) => {
                    warn!("Weather request failed to start: {}", e);
                    OperationState::Error
                }
            };
        }
    }

    fn refresh_next_alarm(&mut self, now: DateTime<Utc>) {
        let Some(scheduler) = self.alarms.as_ref() else {
            return;
        };
        let minute = now.timestamp().div_euclid(60);
        if self.last_alarm_minute == Some(minute) {
            return;
        }
        self.last_alarm_minute = Some(minute);
        self.next_alarm = scheduler.next_alarm().unwrap_or_else(|e| {
            warn!("Failed to read next alarm: {}", e);
            None
        });
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ntp_state(&self) -> OperationState {
        self.ntp_state
    }

    pub fn weather_state(&self) -> OperationState {
        self.weather_state
    }

    pub fn conditions(&self) -> Option<&WeatherConditions> {
        self.conditions.as_ref()
    }

    pub fn next_alarm(&self) -> Option<&Alarm> {
        self.next_alarm.as_ref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn window(&self) -> &WindowHost<S> {
        &self.host
    }
}

/// True when `interval` has passed since `last`, or the clock went backwards.
fn is_due(last: Option<DateTime<Utc>>, now: DateTime<Utc>, interval: Duration) -> bool {
    match last {
        None => true,
        Some(last) => (now - last).to_std().map_or(true, |elapsed| elapsed >= interval),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_is_due() {
        let interval = Duration::from_secs(50);
        assert!(is_due(None, at(100), interval));
        assert!(!is_due(Some(at(100)), at(149), interval));
        assert!(is_due(Some(at(100)), at(150), interval));
        // Clock set backwards
        assert!(is_due(Some(at(100)), at(40), interval));
    }
}
