//! # Loading `clock_util`
//!
//! Opens the native library at runtime and resolves every entry point of the
//! [`ClockUtilApi`] table by name. A missing symbol fails the whole load, so a
//! [`ClockUtil`] value always carries a complete table.

use crate::error::ClockError;
use crate::ffi::{self, ClockUtilApi};
use libloading::Library;
use log::{debug, info};
use std::path::Path;
use std::sync::Arc;

/// Default library location, relative to the working directory.
pub const DEFAULT_LIBRARY_PATH: &str = "./libclock_util.so";

/// A loaded `clock_util` library together with its resolved entry points.
///
/// Shared through `Arc`: every handle wrapper holds a clone, so the library
/// cannot be unloaded while any handle it produced is still alive.
#[derive(Debug)]
pub struct ClockUtil {
    api: ClockUtilApi,
    // Unloaded on drop; must outlive every pointer in `api`
    _library: Option<Library>,
}

/// Resolve one symbol named after the table field it fills.
macro_rules! resolve {
    ($library:expr, $name:ident, $ty:ty) => {{
        let symbol = $library
            .get::<$ty>(concat!(stringify!($name), "\0").as_bytes())
            .map_err(|source| ClockError::MissingSymbol {
                symbol: stringify!($name),
                source,
            })?;
        *symbol
    }};
}

impl ClockUtil {
    /// Open the shared library at `path` and resolve every entry point.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Arc<Self>, ClockError> {
        let path = path.as_ref();
        debug!("Loading clock_util from {}", path.display());

        // SAFETY: loading runs the library's initialisers; clock_util is
        // trusted native code shipped alongside this binary.
        let library = unsafe { Library::new(path) }.map_err(|source| ClockError::LibraryLoad {
            path: path.to_path_buf(),
            source,
        })?;

        // SAFETY: each symbol is cast to the signature declared in `ffi`,
        // which mirrors the library's C header.
        let api = unsafe {
            ClockUtilApi {
                ntp_client_create: resolve!(library, ntp_client_create, ffi::NtpClientCreateFn),
                ntp_client_destroy: resolve!(library, ntp_client_destroy, ffi::NtpClientDestroyFn),
                ntp_client_get_time: resolve!(library, ntp_client_get_time, ffi::NtpClientGetTimeFn),
                ntp_client_process: resolve!(library, ntp_client_process, ffi::NtpClientProcessFn),
                ntp_client_set_time: resolve!(library, ntp_client_set_time, ffi::NtpClientSetTimeFn),
                weather_client_create: resolve!(library, weather_client_create, ffi::WeatherClientCreateFn),
                weather_client_destroy: resolve!(library, weather_client_destroy, ffi::WeatherClientDestroyFn),
                weather_client_get_by_city: resolve!(library, weather_client_get_by_city, ffi::WeatherClientGetByCityFn),
                weather_client_process: resolve!(library, weather_client_process, ffi::WeatherClientProcessFn),
                alarm_scheduler_create: resolve!(library, alarm_scheduler_create, ffi::AlarmSchedulerCreateFn),
                alarm_scheduler_destroy: resolve!(library, alarm_scheduler_destroy, ffi::AlarmSchedulerDestroyFn),
                alarm_scheduler_add_alarm: resolve!(library, alarm_scheduler_add_alarm, ffi::AlarmSchedulerAddAlarmFn),
                alarm_scheduler_remove_alarm: resolve!(library, alarm_scheduler_remove_alarm, ffi::AlarmSchedulerRemoveAlarmFn),
                alarm_scheduler_get_next_alarm: resolve!(library, alarm_scheduler_get_next_alarm, ffi::AlarmSchedulerGetNextAlarmFn),
            }
        };

        info!("Loaded clock_util from {}", path.display());
        Ok(Arc::new(ClockUtil {
            api,
            _library: Some(library),
        }))
    }

    /// Wrap an already resolved table, e.g. a statically linked build of
    /// `clock_util`.
    ///
    /// # Safety
    /// Every pointer in `api` must implement the documented contract of its
    /// entry point and stay callable for the lifetime of the returned value.
    pub unsafe fn from_api(api: ClockUtilApi) -> Arc<Self> {
        Arc::new(ClockUtil {
            api,
            _library: None,
        })
    }

    /// The resolved entry points.
    pub fn api(&self) -> &ClockUtilApi {
        &self.api
    }
}
