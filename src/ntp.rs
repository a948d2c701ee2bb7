//! # NTP Client Binding
//!
//! Owned wrapper around the native NTP client handle plus the one-shot
//! `ntp_client_set_time` call.
//!
//! ## Cooperative pumping
//!
//! `get_time` only starts a query. The native client makes progress when
//! [`NtpClient::process`] is called, and reports completion through a C
//! callback. The callback pushes into a queue owned by the wrapper; results
//! are read back on the caller's thread with [`NtpClient::poll`]. The queue is
//! thread safe, so it does not matter which thread the library invokes the
//! callback on.

use crate::error::{check_status, ClockError};
use crate::ffi::{self, NtpClientObject, TimeT};
use crate::library::ClockUtil;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::ffi::CString;
use std::os::raw::{c_int, c_void};
use std::ptr::NonNull;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

/// Message logged when the clock was set.
pub const SET_TIME_SUCCESS_MESSAGE: &str = "time has been setup successfully";
/// Message logged when setting the clock failed.
pub const SET_TIME_FAILURE_MESSAGE: &str = "Setting time has failed";

/// Outcome of an NTP query as reported to the callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NtpResult {
    Success,
    Timeout,
    /// Any other non-zero code; meaning is defined by the library
    Failed(i32),
}

impl From<c_int> for NtpResult {
    fn from(code: c_int) -> Self {
        match code {
            ffi::NTP_RESULT_SUCCESS => NtpResult::Success,
            ffi::NTP_RESULT_TIMEOUT => NtpResult::Timeout,
            other => NtpResult::Failed(other),
        }
    }
}

/// A completed NTP query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NtpUpdate {
    pub result: NtpResult,
    /// Server time; only present on success
    pub server_time: Option<DateTime<Utc>>,
}

impl NtpUpdate {
    fn from_raw(code: c_int, server_time: TimeT) -> Self {
        let result = NtpResult::from(code);
        let server_time = match result {
            NtpResult::Success => DateTime::from_timestamp(server_time, 0),
            _ => None,
        };
        NtpUpdate {
            result,
            server_time,
        }
    }

    /// How far `local` is ahead of the server (negative when behind).
    pub fn drift_from(&self, local: DateTime<Utc>) -> Option<chrono::Duration> {
        self.server_time.map(|server| local - server)
    }
}

/// Result of `ntp_client_set_time`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetTimeOutcome {
    Success,
    Failed(i32),
}

impl SetTimeOutcome {
    pub fn from_status(status: c_int) -> Self {
        if status == 0 {
            SetTimeOutcome::Success
        } else {
            SetTimeOutcome::Failed(status)
        }
    }

    /// User-visible message for this outcome.
    pub fn message(&self) -> &'static str {
        match self {
            SetTimeOutcome::Success => SET_TIME_SUCCESS_MESSAGE,
            SetTimeOutcome::Failed(_) => SET_TIME_FAILURE_MESSAGE,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SetTimeOutcome::Success)
    }
}

/// Query `server` and set the machine clock, blocking for up to `timeout`.
///
/// The outcome is logged with the user-visible success or failure message
/// and also returned; only an unusable server name is an `Err`.
pub fn set_time(util: &ClockUtil, server: &str, timeout: Duration) -> Result<SetTimeOutcome, ClockError> {
    let server_name = CString::new(server)?;

    // SAFETY: `server_name` is NUL-terminated and outlives the call.
    let status = unsafe { (util.api().ntp_client_set_time)(server_name.as_ptr(), timeout_secs(timeout)) };

    let outcome = SetTimeOutcome::from_status(status);
    debug!("ntp_client_set_time against {server} returned status {status}");
    if outcome.is_success() {
        info!("{}", outcome.message());
    } else {
        warn!("{}", outcome.message());
    }
    Ok(outcome)
}

/// Owned native NTP client session.
///
/// Not `Clone`: the handle is destroyed exactly once, when the client is
/// dropped or closed.
pub struct NtpClient {
    handle: NonNull<NtpClientObject>,
    util: Arc<ClockUtil>,
    // Boxed so the address handed to the library as `user_ctx` never moves
    updates_tx: Box<Sender<NtpUpdate>>,
    updates_rx: Receiver<NtpUpdate>,
}

impl NtpClient {
    /// Create a native client session.
    pub fn create(util: &Arc<ClockUtil>) -> Result<Self, ClockError> {
        // SAFETY: no arguments; a null return is handled below.
        let raw = unsafe { (util.api().ntp_client_create)() };
        let handle = NonNull::new(raw).ok_or(ClockError::NullHandle("ntp_client_create"))?;

        let (tx, rx) = channel();
        Ok(NtpClient {
            handle,
            util: Arc::clone(util),
            updates_tx: Box::new(tx),
            updates_rx: rx,
        })
    }

    /// Start a time query against `server`.
    ///
    /// The server name is only borrowed for the duration of the call. The
    /// result arrives through [`NtpClient::process`] and [`NtpClient::poll`].
    pub fn get_time(&mut self, server: &str, timeout: Duration) -> Result<(), ClockError> {
        let server_name = CString::new(server)?;
        let user_ctx = &*self.updates_tx as *const Sender<NtpUpdate> as *mut c_void;

        // SAFETY: the handle is live, the server name outlives the call and
        // `user_ctx` stays valid until after the handle is destroyed.
        let status = unsafe {
            (self.util.api().ntp_client_get_time)(
                self.handle.as_ptr(),
                server_name.as_ptr(),
                timeout_secs(timeout),
                Some(on_ntp_time as ffi::NtpTimeCallback),
                user_ctx,
            )
        };
        check_status("ntp_client_get_time", status)?;

        debug!("NTP query started against {server}");
        Ok(())
    }

    /// Give the native client a chance to advance a pending query.
    pub fn process(&mut self) {
        // SAFETY: the handle is live for as long as `self` is.
        unsafe { (self.util.api().ntp_client_process)(self.handle.as_ptr()) }
    }

    /// Drain every query completed since the last poll.
    pub fn poll(&mut self) -> Vec<NtpUpdate> {
        self.updates_rx.try_iter().collect()
    }

    /// Destroy the native session now rather than at end of scope.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for NtpClient {
    fn drop(&mut self) {
        // SAFETY: the handle came from ntp_client_create and, because `self`
        // is not Clone, this is the only place it is destroyed.
        unsafe { (self.util.api().ntp_client_destroy)(self.handle.as_ptr()) }
    }
}

/// Callback handed to the library; forwards into the client's queue.
unsafe extern "C" fn on_ntp_time(user_ctx: *mut c_void, result: c_int, server_time: TimeT) {
    // SAFETY: `user_ctx` is the boxed sender of a live NtpClient.
    let Some(updates) = (user_ctx as *const Sender<NtpUpdate>).as_ref() else {
        return;
    };
    // The receiver lives in the same client, so a send only fails mid-drop
    let _ = updates.send(NtpUpdate::from_raw(result, server_time));
}

pub(crate) fn timeout_secs(timeout: Duration) -> usize {
    usize::try_from(timeout.as_secs()).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_time_messages() {
        assert_eq!(SetTimeOutcome::from_status(0).message(), "time has been setup successfully");
        assert_eq!(SetTimeOutcome::from_status(1).message(), "Setting time has failed");
        assert_eq!(SetTimeOutcome::from_status(-7), SetTimeOutcome::Failed(-7));
        assert!(SetTimeOutcome::from_status(0).is_success());
    }

    #[test]
    fn test_update_from_raw_success() {
        let update = NtpUpdate::from_raw(0, 1_700_000_000);
        assert_eq!(update.result, NtpResult::Success);
        assert_eq!(update.server_time.map(|t| t.timestamp()), Some(1_700_000_000));
    }

    #[test]
    fn test_update_from_raw_failures_carry_no_time() {
        let timeout = NtpUpdate::from_raw(1, 1_700_000_000);
        assert_eq!(timeout.result, NtpResult::Timeout);
        assert_eq!(timeout.server_time, None);

        let failed = NtpUpdate::from_raw(42, 0);
        assert_eq!(failed.result, NtpResult::Failed(42));
        assert_eq!(failed.server_time, None);
    }

    #[test]
    fn test_drift_from_local_clock() {
        let update = NtpUpdate::from_raw(0, 1_700_000_000);
        let local = DateTime::from_timestamp(1_700_000_150, 0).unwrap();
        assert_eq!(update.drift_from(local), Some(chrono::Duration::seconds(150)));
    }

    #[test]
    fn test_timeout_is_whole_seconds() {
        assert_eq!(timeout_secs(Duration::from_millis(5_900)), 5);
        assert_eq!(timeout_secs(Duration::ZERO), 0);
    }
}
