//! In-process stand-in for `clock_util`.
//!
//! Every entry point is a real `extern "C"` function, so the wrappers are
//! exercised through the same function-pointer table and callback trampolines
//! they use against the shared library. Handles are boxed Rust values; call
//! records and handle counters live in a thread-local, so tests running in
//! parallel do not see each other.

use crate::ffi::{
    AlarmInfoRecord, AlarmSchedulerObject, ClockUtilApi, NtpClientObject, NtpTimeCallback, TimeInfo,
    TimeT, WeatherClientObject, WeatherConditionsCallback, WeatherConditionsRecord, WeatherLocation,
};
use crate::library::ClockUtil;
use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;
use std::sync::Arc;

/// Fixed server time reported by a successful NTP query (2023-11-14T22:13:20Z).
pub(crate) const SERVER_TIME: TimeT = 1_700_000_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct HandleCounts {
    pub created: usize,
    pub destroyed: usize,
}

/// Everything the fake records, plus knobs tests can turn.
#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub ntp: HandleCounts,
    pub weather: HandleCounts,
    pub alarm: HandleCounts,

    /// Make every create call return null
    pub fail_create: bool,
    /// Result code passed to the NTP callback
    pub ntp_result: c_int,
    /// Result code passed to the weather callback
    pub weather_result: c_int,

    pub last_server: Option<String>,
    pub last_timeout: Option<usize>,
    pub last_api_key: Option<String>,
    pub last_unit: Option<c_int>,
    pub last_location: Option<WeatherLocation>,
}

thread_local! {
    static STATE: RefCell<FakeState> = RefCell::new(FakeState::default());
}

/// Run `f` against this thread's fake state.
pub(crate) fn with_state<R>(f: impl FnOnce(&mut FakeState) -> R) -> R {
    STATE.with(|state| f(&mut state.borrow_mut()))
}

/// A library value backed by the fake, with freshly reset state.
pub(crate) fn util() -> Arc<ClockUtil> {
    with_state(|state| *state = FakeState::default());
    // SAFETY: every entry in the table honours the documented contract.
    unsafe { ClockUtil::from_api(api()) }
}

pub(crate) fn api() -> ClockUtilApi {
    ClockUtilApi {
        ntp_client_create: fake_ntp_create,
        ntp_client_destroy: fake_ntp_destroy,
        ntp_client_get_time: fake_ntp_get_time,
        ntp_client_process: fake_ntp_process,
        ntp_client_set_time: fake_ntp_set_time,
        weather_client_create: fake_weather_create,
        weather_client_destroy: fake_weather_destroy,
        weather_client_get_by_city: fake_weather_get_by_city,
        weather_client_process: fake_weather_process,
        alarm_scheduler_create: fake_alarm_create,
        alarm_scheduler_destroy: fake_alarm_destroy,
        alarm_scheduler_add_alarm: fake_alarm_add,
        alarm_scheduler_remove_alarm: fake_alarm_remove,
        alarm_scheduler_get_next_alarm: fake_alarm_get_next,
    }
}

unsafe fn read_str(text: *const c_char) -> Option<String> {
    if text.is_null() {
        None
    } else {
        Some(CStr::from_ptr(text).to_string_lossy().into_owned())
    }
}

// NTP

#[derive(Default)]
struct FakeNtp {
    pending: Option<(Option<NtpTimeCallback>, *mut c_void)>,
}

unsafe extern "C" fn fake_ntp_create() -> *mut NtpClientObject {
    if with_state(|s| s.fail_create) {
        return ptr::null_mut();
    }
    with_state(|s| s.ntp.created += 1);
    Box::into_raw(Box::new(FakeNtp::default())) as *mut NtpClientObject
}

unsafe extern "C" fn fake_ntp_destroy(handle: *mut NtpClientObject) {
    if !handle.is_null() {
        drop(Box::from_raw(handle as *mut FakeNtp));
        with_state(|s| s.ntp.destroyed += 1);
    }
}

unsafe extern "C" fn fake_ntp_get_time(
    handle: *mut NtpClientObject,
    server: *const c_char,
    timeout: usize,
    callback: Option<NtpTimeCallback>,
    user_ctx: *mut c_void,
) -> c_int {
    let Some(client) = (handle as *mut FakeNtp).as_mut() else {
        return -1;
    };
    let server = read_str(server).unwrap_or_default();
    with_state(|s| {
        s.last_server = Some(server.clone());
        s.last_timeout = Some(timeout);
    });
    if server.is_empty() {
        return 2;
    }
    client.pending = Some((callback, user_ctx));
    0
}

unsafe extern "C" fn fake_ntp_process(handle: *mut NtpClientObject) {
    let Some(client) = (handle as *mut FakeNtp).as_mut() else {
        return;
    };
    if let Some((Some(callback), user_ctx)) = client.pending.take() {
        let result = with_state(|s| s.ntp_result);
        callback(user_ctx, result, SERVER_TIME);
    }
}

unsafe extern "C" fn fake_ntp_set_time(server: *const c_char, timeout: usize) -> c_int {
    let server = read_str(server).unwrap_or_default();
    let status = if server.is_empty() || server.contains("fail") { 1 } else { 0 };
    with_state(|s| {
        s.last_server = Some(server);
        s.last_timeout = Some(timeout);
    });
    status
}

// Weather

struct FakeWeather {
    description: CString,
    pending: Option<(Option<WeatherConditionsCallback>, *mut c_void)>,
}

unsafe extern "C" fn fake_weather_create(api_key: *const c_char, units: c_int) -> *mut WeatherClientObject {
    let api_key = read_str(api_key);
    with_state(|s| {
        s.last_api_key = api_key;
        s.last_unit = Some(units);
    });
    if with_state(|s| s.fail_create) {
        return ptr::null_mut();
    }
    with_state(|s| s.weather.created += 1);
    let client = FakeWeather {
        description: CString::new("light rain").unwrap(),
        pending: None,
    };
    Box::into_raw(Box::new(client)) as *mut WeatherClientObject
}

unsafe extern "C" fn fake_weather_destroy(handle: *mut WeatherClientObject) {
    if !handle.is_null() {
        drop(Box::from_raw(handle as *mut FakeWeather));
        with_state(|s| s.weather.destroyed += 1);
    }
}

unsafe extern "C" fn fake_weather_get_by_city(
    handle: *mut WeatherClientObject,
    location: *const WeatherLocation,
    timeout: usize,
    callback: Option<WeatherConditionsCallback>,
    user_ctx: *mut c_void,
) -> c_int {
    let (Some(client), Some(location)) = ((handle as *mut FakeWeather).as_mut(), location.as_ref()) else {
        return -1;
    };
    with_state(|s| {
        s.last_location = Some(*location);
        s.last_timeout = Some(timeout);
    });
    client.pending = Some((callback, user_ctx));
    0
}

unsafe extern "C" fn fake_weather_process(handle: *mut WeatherClientObject) {
    let Some(client) = (handle as *mut FakeWeather).as_mut() else {
        return;
    };
    if let Some((Some(callback), user_ctx)) = client.pending.take() {
        let result = with_state(|s| s.weather_result);
        let record = WeatherConditionsRecord {
            temperature: 43.0,
            hi_temp: 50.0,
            lo_temp: 38.0,
            description: client.description.as_ptr(),
        };
        let conditions = if result == 0 { &record as *const _ } else { ptr::null() };
        callback(user_ctx, result, conditions);
    }
}

// Alarms

struct StoredAlarm {
    text: CString,
    time: TimeInfo,
    days: u32,
    sound: Option<CString>,
}

#[derive(Default)]
struct FakeScheduler {
    alarms: Vec<StoredAlarm>,
    // Storage for the record handed out by get_next
    next: Option<AlarmInfoRecord>,
}

unsafe extern "C" fn fake_alarm_create() -> *mut AlarmSchedulerObject {
    if with_state(|s| s.fail_create) {
        return ptr::null_mut();
    }
    with_state(|s| s.alarm.created += 1);
    Box::into_raw(Box::new(FakeScheduler::default())) as *mut AlarmSchedulerObject
}

unsafe extern "C" fn fake_alarm_destroy(handle: *mut AlarmSchedulerObject) {
    if !handle.is_null() {
        drop(Box::from_raw(handle as *mut FakeScheduler));
        with_state(|s| s.alarm.destroyed += 1);
    }
}

unsafe extern "C" fn fake_alarm_add(
    handle: *mut AlarmSchedulerObject,
    alarm_text: *const c_char,
    time: *const TimeInfo,
    trigger_days: u32,
    sound_file: *const c_char,
) -> c_int {
    let (Some(scheduler), Some(time)) = ((handle as *mut FakeScheduler).as_mut(), time.as_ref()) else {
        return -1;
    };
    if alarm_text.is_null() {
        return 1;
    }
    if time.hour > 23 || time.min > 59 {
        return 2;
    }
    let text = CStr::from_ptr(alarm_text).to_owned();
    if scheduler.alarms.iter().any(|alarm| alarm.text == text) {
        return 3;
    }
    let sound = (!sound_file.is_null()).then(|| CStr::from_ptr(sound_file).to_owned());
    scheduler.alarms.push(StoredAlarm {
        text,
        time: *time,
        days: trigger_days,
        sound,
    });
    0
}

unsafe extern "C" fn fake_alarm_remove(handle: *mut AlarmSchedulerObject, alarm_text: *const c_char) -> c_int {
    let (Some(scheduler), Some(text)) = ((handle as *mut FakeScheduler).as_mut(), read_str(alarm_text)) else {
        return -1;
    };
    let before = scheduler.alarms.len();
    scheduler.alarms.retain(|alarm| alarm.text.to_string_lossy() != text);
    if scheduler.alarms.len() == before {
        1
    } else {
        0
    }
}

/// Reports the alarm with the earliest time of day.
unsafe extern "C" fn fake_alarm_get_next(handle: *mut AlarmSchedulerObject) -> *const AlarmInfoRecord {
    let Some(scheduler) = (handle as *mut FakeScheduler).as_mut() else {
        return ptr::null();
    };
    let next = scheduler
        .alarms
        .iter()
        .min_by_key(|alarm| (alarm.time.hour, alarm.time.min))
        .map(|alarm| AlarmInfoRecord {
            trigger_time: alarm.time,
            trigger_days: alarm.days,
            alarm_text: alarm.text.as_ptr(),
            sound_file: alarm.sound.as_ref().map_or(ptr::null(), |sound| sound.as_ptr()),
        });
    scheduler.next = next;
    scheduler
        .next
        .as_ref()
        .map_or(ptr::null(), |record| record as *const AlarmInfoRecord)
}
