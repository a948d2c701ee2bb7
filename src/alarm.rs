//! # Alarm Scheduler Binding
//!
//! Owned wrapper around the native alarm scheduler. Storing and firing alarms
//! is entirely the library's job; this type adds, removes and reads back the
//! next scheduled alarm.

use crate::config::AlarmConfig;
use crate::error::{check_status, ClockError};
use crate::ffi::{AlarmSchedulerObject, TimeInfo};
use crate::library::ClockUtil;
use crate::{Alarm, TimeOfDay, Weekdays};
use log::{debug, info, warn};
use std::ffi::CString;
use std::ptr::{self, NonNull};
use std::sync::Arc;

/// Owned native alarm scheduler.
pub struct AlarmScheduler {
    handle: NonNull<AlarmSchedulerObject>,
    util: Arc<ClockUtil>,
}

impl AlarmScheduler {
    pub fn create(util: &Arc<ClockUtil>) -> Result<Self, ClockError> {
        // SAFETY: no arguments; a null return is handled below.
        let raw = unsafe { (util.api().alarm_scheduler_create)() };
        let handle = NonNull::new(raw).ok_or(ClockError::NullHandle("alarm_scheduler_create"))?;
        Ok(AlarmScheduler {
            handle,
            util: Arc::clone(util),
        })
    }

    /// Schedule an alarm. The label doubles as the key for [`Self::remove_alarm`].
    pub fn add_alarm(
        &mut self,
        label: &str,
        time: TimeOfDay,
        days: Weekdays,
        sound_file: Option<&str>,
    ) -> Result<(), ClockError> {
        let label_c = CString::new(label)?;
        let sound_c = sound_file.map(CString::new).transpose()?;
        let trigger_time = TimeInfo::from(time);

        // SAFETY: every pointer outlives the call; the library copies what it
        // keeps.
        let status = unsafe {
            (self.util.api().alarm_scheduler_add_alarm)(
                self.handle.as_ptr(),
                label_c.as_ptr(),
                &trigger_time,
                days.bits(),
                sound_c.as_ref().map_or(ptr::null(), |sound| sound.as_ptr()),
            )
        };
        check_status("alarm_scheduler_add_alarm", status)?;

        debug!("Scheduled alarm '{label}' at {time} on {:?}", days.short_names());
        Ok(())
    }

    pub fn remove_alarm(&mut self, label: &str) -> Result<(), ClockError> {
        let label_c = CString::new(label)?;

        // SAFETY: the label outlives the call.
        let status =
            unsafe { (self.util.api().alarm_scheduler_remove_alarm)(self.handle.as_ptr(), label_c.as_ptr()) };
        check_status("alarm_scheduler_remove_alarm", status)?;

        debug!("Removed alarm '{label}'");
        Ok(())
    }

    /// The next alarm to fire, or `None` when nothing is scheduled.
    ///
    /// The library keeps ownership of the record it returns and may reuse it
    /// on the next call, so it is copied out before this returns.
    pub fn next_alarm(&self) -> Result<Option<Alarm>, ClockError> {
        // SAFETY: the handle is live for as long as `self` is.
        let record = unsafe { (self.util.api().alarm_scheduler_get_next_alarm)(self.handle.as_ptr()) };

        // SAFETY: non-null records stay valid until the next call on this
        // handle, which cannot happen while `record` is borrowed here.
        let Some(record) = (unsafe { record.as_ref() }) else {
            return Ok(None);
        };
        match unsafe { record.to_owned_alarm() } {
            Some(alarm) => Ok(Some(alarm)),
            None => Err(ClockError::MalformedRecord("alarm_scheduler_get_next_alarm")),
        }
    }

    /// Schedule every configured alarm, returning how many were accepted.
    ///
    /// Entries the library rejects are logged and skipped.
    pub fn load_from_config(&mut self, alarms: &[AlarmConfig]) -> usize {
        let mut loaded = 0;
        for alarm in alarms {
            let days: Weekdays = alarm.days.iter().copied().collect();
            match self.add_alarm(&alarm.name, alarm.time, days, alarm.sound.as_deref()) {
                Ok(()) => loaded += 1,
                Err(e) => warn!("Skipping alarm '{}': {}", alarm.name, e),
            }
        }
        info!("Loaded {loaded} of {} configured alarms", alarms.len());
        loaded
    }

    /// Destroy the native scheduler now rather than at end of scope.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for AlarmScheduler {
    fn drop(&mut self) {
        // SAFETY: sole owner of a handle from alarm_scheduler_create.
        unsafe { (self.util.api().alarm_scheduler_destroy)(self.handle.as_ptr()) }
    }
}
