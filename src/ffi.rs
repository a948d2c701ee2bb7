//! # Native Interface Contract
//!
//! Raw declarations for the `clock_util` shared library: opaque handle types,
//! fixed-layout records, callback shapes and one function pointer type per
//! entry point. Nothing in this module is safe to call directly; the owned
//! wrappers in [`crate::ntp`], [`crate::weather`] and [`crate::alarm`] are the
//! intended callers.
//!
//! ## Record layouts
//!
//! Field order and width must match the native library exactly:
//!
//! | Record | Fields |
//! |---|---|
//! | [`WeatherLocation`] | `f64` latitude, `f64` longitude |
//! | [`WeatherConditionsRecord`] | `f64` temperature, `f64` high, `f64` low, `char*` description |
//! | [`TimeInfo`] | `u8` hour, `u8` minute |
//! | [`AlarmInfoRecord`] | [`TimeInfo`], `u32` weekday mask, `char*` text, `char*` sound file |
//!
//! ## Integer codes
//!
//! Enumerations cross the boundary as `c_int`: weather results `0..=3`,
//! temperature units `0..=2`, NTP results `0` success / `1` timeout. Every
//! other entry point returns `0` for success and any other value for failure.

use crate::{Alarm, GeoLocation, TemperatureUnit, TimeOfDay, WeatherConditions, Weekdays};
use std::ffi::CStr;
use std::marker::{PhantomData, PhantomPinned};
use std::os::raw::{c_char, c_int, c_void};

/// Seconds since the Unix epoch, as `time_t` on the 64-bit targets the
/// library ships for.
pub type TimeT = i64;

/// NTP callback result code for a successful query.
pub const NTP_RESULT_SUCCESS: c_int = 0;
/// NTP callback result code when the server did not answer in time.
pub const NTP_RESULT_TIMEOUT: c_int = 1;

macro_rules! opaque_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[repr(C)]
        pub struct $name {
            _data: [u8; 0],
            _marker: PhantomData<(*mut u8, PhantomPinned)>,
        }
    };
}

opaque_handle!(
    /// Library-internal NTP client session.
    NtpClientObject
);
opaque_handle!(
    /// Library-internal weather client session.
    WeatherClientObject
);
opaque_handle!(
    /// Library-internal alarm scheduler.
    AlarmSchedulerObject
);

/// Location record passed to `weather_client_get_by_city`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeatherLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<GeoLocation> for WeatherLocation {
    fn from(location: GeoLocation) -> Self {
        WeatherLocation {
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }
}

/// Conditions record handed to the weather callback. Owned by the library.
#[repr(C)]
#[derive(Debug)]
pub struct WeatherConditionsRecord {
    pub temperature: f64,
    pub hi_temp: f64,
    pub lo_temp: f64,
    pub description: *const c_char,
}

impl WeatherConditionsRecord {
    /// Copy the record into an owned value.
    ///
    /// # Safety
    /// `description` must be null or point to a NUL-terminated string that
    /// stays valid for the duration of this call.
    pub unsafe fn to_owned_conditions(&self, unit: TemperatureUnit) -> WeatherConditions {
        WeatherConditions {
            temperature: self.temperature,
            high: self.hi_temp,
            low: self.lo_temp,
            description: copy_c_string(self.description).unwrap_or_default(),
            unit,
        }
    }
}

/// Hour/minute record.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeInfo {
    pub hour: u8,
    pub min: u8,
}

impl From<TimeOfDay> for TimeInfo {
    fn from(time: TimeOfDay) -> Self {
        TimeInfo {
            hour: time.hour(),
            min: time.minute(),
        }
    }
}

/// Alarm descriptor returned by `alarm_scheduler_get_next_alarm`.
#[repr(C)]
#[derive(Debug)]
pub struct AlarmInfoRecord {
    pub trigger_time: TimeInfo,
    pub trigger_days: u32,
    pub alarm_text: *const c_char,
    pub sound_file: *const c_char,
}

impl AlarmInfoRecord {
    /// Copy the record into an owned [`Alarm`].
    ///
    /// Returns `None` when the library reports a trigger time outside 00:00-23:59.
    ///
    /// # Safety
    /// Both string pointers must be null or point to NUL-terminated strings
    /// that stay valid for the duration of this call.
    pub unsafe fn to_owned_alarm(&self) -> Option<Alarm> {
        let time = TimeOfDay::new(self.trigger_time.hour, self.trigger_time.min)?;
        Some(Alarm {
            label: copy_c_string(self.alarm_text).unwrap_or_default(),
            time,
            days: Weekdays::from_bits_retain(self.trigger_days),
            sound_file: copy_c_string(self.sound_file),
        })
    }
}

/// Copy a possibly-null C string. Invalid UTF-8 is replaced, not rejected.
///
/// # Safety
/// `text` must be null or point to a NUL-terminated string.
unsafe fn copy_c_string(text: *const c_char) -> Option<String> {
    if text.is_null() {
        None
    } else {
        Some(CStr::from_ptr(text).to_string_lossy().into_owned())
    }
}

/// NTP completion callback: `(user_ctx, result, server_time)`.
pub type NtpTimeCallback = unsafe extern "C" fn(*mut c_void, c_int, TimeT);

/// Weather completion callback: `(user_ctx, result, conditions)`.
pub type WeatherConditionsCallback =
    unsafe extern "C" fn(*mut c_void, c_int, *const WeatherConditionsRecord);

pub type NtpClientCreateFn = unsafe extern "C" fn() -> *mut NtpClientObject;
pub type NtpClientDestroyFn = unsafe extern "C" fn(*mut NtpClientObject);
pub type NtpClientGetTimeFn = unsafe extern "C" fn(
    *mut NtpClientObject,
    *const c_char,
    usize,
    Option<NtpTimeCallback>,
    *mut c_void,
) -> c_int;
pub type NtpClientProcessFn = unsafe extern "C" fn(*mut NtpClientObject);
pub type NtpClientSetTimeFn = unsafe extern "C" fn(*const c_char, usize) -> c_int;

pub type WeatherClientCreateFn = unsafe extern "C" fn(*const c_char, c_int) -> *mut WeatherClientObject;
pub type WeatherClientDestroyFn = unsafe extern "C" fn(*mut WeatherClientObject);
pub type WeatherClientGetByCityFn = unsafe extern "C" fn(
    *mut WeatherClientObject,
    *const WeatherLocation,
    usize,
    Option<WeatherConditionsCallback>,
    *mut c_void,
) -> c_int;
pub type WeatherClientProcessFn = unsafe extern "C" fn(*mut WeatherClientObject);

pub type AlarmSchedulerCreateFn = unsafe extern "C" fn() -> *mut AlarmSchedulerObject;
pub type AlarmSchedulerDestroyFn = unsafe extern "C" fn(*mut AlarmSchedulerObject);
pub type AlarmSchedulerAddAlarmFn = unsafe extern "C" fn(
    *mut AlarmSchedulerObject,
    *const c_char,
    *const TimeInfo,
    u32,
    *const c_char,
) -> c_int;
pub type AlarmSchedulerRemoveAlarmFn =
    unsafe extern "C" fn(*mut AlarmSchedulerObject, *const c_char) -> c_int;
pub type AlarmSchedulerGetNextAlarmFn =
    unsafe extern "C" fn(*mut AlarmSchedulerObject) -> *const AlarmInfoRecord;

/// Resolved entry points of `clock_util`, one field per exported symbol.
///
/// The pointers are only valid while the library they came from stays
/// loaded; [`crate::ClockUtil`] keeps the two together.
#[derive(Clone, Copy, Debug)]
pub struct ClockUtilApi {
    pub ntp_client_create: NtpClientCreateFn,
    pub ntp_client_destroy: NtpClientDestroyFn,
    pub ntp_client_get_time: NtpClientGetTimeFn,
    pub ntp_client_process: NtpClientProcessFn,
    pub ntp_client_set_time: NtpClientSetTimeFn,

    pub weather_client_create: WeatherClientCreateFn,
    pub weather_client_destroy: WeatherClientDestroyFn,
    pub weather_client_get_by_city: WeatherClientGetByCityFn,
    pub weather_client_process: WeatherClientProcessFn,

    pub alarm_scheduler_create: AlarmSchedulerCreateFn,
    pub alarm_scheduler_destroy: AlarmSchedulerDestroyFn,
    pub alarm_scheduler_add_alarm: AlarmSchedulerAddAlarmFn,
    pub alarm_scheduler_remove_alarm: AlarmSchedulerRemoveAlarmFn,
    pub alarm_scheduler_get_next_alarm: AlarmSchedulerGetNextAlarmFn,
}
