//! # Weather Client Binding
//!
//! Owned wrapper around the native weather client. Requests are started with
//! [`WeatherClient::get_by_city`], advanced by the cooperative
//! [`WeatherClient::process`] pump and collected with [`WeatherClient::poll`].
//!
//! The library owns the conditions record it passes to the callback and may
//! reuse it as soon as the callback returns, so the callback copies it into
//! an owned [`WeatherConditions`] before queueing it.

use crate::error::{check_status, ClockError};
use crate::ffi::{self, WeatherClientObject, WeatherConditionsRecord, WeatherLocation};
use crate::library::ClockUtil;
use crate::ntp::timeout_secs;
use crate::{GeoLocation, TemperatureUnit, WeatherConditions, WeatherOpResult};
use log::debug;
use std::ffi::CString;
use std::os::raw::{c_int, c_void};
use std::ptr::NonNull;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

/// A completed weather request.
#[derive(Clone, Debug, PartialEq)]
pub enum WeatherUpdate {
    Conditions(WeatherConditions),
    Failed(WeatherOpResult),
    /// A result code outside the documented set
    Unrecognized(i32),
}

/// State shared with the callback through `user_ctx`.
struct CallbackContext {
    unit: TemperatureUnit,
    updates: Sender<WeatherUpdate>,
}

/// Owned native weather client session.
pub struct WeatherClient {
    handle: NonNull<WeatherClientObject>,
    util: Arc<ClockUtil>,
    unit: TemperatureUnit,
    // Boxed so the `user_ctx` address never moves
    context: Box<CallbackContext>,
    updates_rx: Receiver<WeatherUpdate>,
}

impl WeatherClient {
    /// Create a client for the given API key and temperature unit.
    pub fn create(util: &Arc<ClockUtil>, api_key: &str, unit: TemperatureUnit) -> Result<Self, ClockError> {
        let api_key = CString::new(api_key)?;

        // SAFETY: the key is NUL-terminated and outlives the call.
        let raw = unsafe { (util.api().weather_client_create)(api_key.as_ptr(), unit.code()) };
        let handle = NonNull::new(raw).ok_or(ClockError::NullHandle("weather_client_create"))?;

        let (tx, rx) = channel();
        Ok(WeatherClient {
            handle,
            util: Arc::clone(util),
            unit,
            context: Box::new(CallbackContext { unit, updates: tx }),
            updates_rx: rx,
        })
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    /// Start a conditions request for `location`.
    pub fn get_by_city(&mut self, location: GeoLocation, timeout: Duration) -> Result<(), ClockError> {
        let location = WeatherLocation::from(location);
        let user_ctx = &*self.context as *const CallbackContext as *mut c_void;

        // SAFETY: the handle is live, `location` outlives the call and
        // `user_ctx` stays valid until after the handle is destroyed.
        let status = unsafe {
            (self.util.api().weather_client_get_by_city)(
                self.handle.as_ptr(),
                &location,
                timeout_secs(timeout),
                Some(on_conditions as ffi::WeatherConditionsCallback),
                user_ctx,
            )
        };
        check_status("weather_client_get_by_city", status)?;

        debug!(
            "Weather request started for {:.2},{:.2}",
            location.latitude, location.longitude
        );
        Ok(())
    }

    /// Give the native client a chance to advance a pending request.
    pub fn process(&mut self) {
        // SAFETY: the handle is live for as long as `self` is.
        unsafe { (self.util.api().weather_client_process)(self.handle.as_ptr()) }
    }

    /// Drain every request completed since the last poll.
    pub fn poll(&mut self) -> Vec<WeatherUpdate> {
        self.updates_rx.try_iter().collect()
    }

    /// Destroy the native session now rather than at end of scope.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for WeatherClient {
    fn drop(&mut self) {
        // SAFETY: sole owner of a handle from weather_client_create.
        unsafe { (self.util.api().weather_client_destroy)(self.handle.as_ptr()) }
    }
}

unsafe extern "C" fn on_conditions(
    user_ctx: *mut c_void,
    result: c_int,
    conditions: *const WeatherConditionsRecord,
) {
    // SAFETY: `user_ctx` is the boxed context of a live WeatherClient.
    let Some(context) = (user_ctx as *const CallbackContext).as_ref() else {
        return;
    };

    let update = match WeatherOpResult::try_from(result) {
        Ok(WeatherOpResult::Success) => match conditions.as_ref() {
            // SAFETY: the record and its description are valid for the
            // duration of the callback.
            Some(record) => WeatherUpdate::Conditions(record.to_owned_conditions(context.unit)),
            None => WeatherUpdate::Failed(WeatherOpResult::InvalidData),
        },
        Ok(failure) => WeatherUpdate::Failed(failure),
        Err(_) => WeatherUpdate::Unrecognized(result),
    };
    let _ = context.updates.send(update);
}
