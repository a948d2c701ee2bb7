//! Errors raised at the native library boundary.

use std::ffi::NulError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or calling `clock_util`.
///
/// The native library reports failures as bare integer status codes; this
/// enum attaches the name of the failing entry point so logs stay readable.
#[derive(Error, Debug)]
pub enum ClockError {
    /// The shared library could not be opened
    #[error("failed to load {}: {source}", path.display())]
    LibraryLoad {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    /// The shared library does not export an expected entry point
    #[error("clock_util does not export `{symbol}`: {source}")]
    MissingSymbol {
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },

    /// A constructor returned a null handle
    #[error("{0} returned a null handle")]
    NullHandle(&'static str),

    /// An entry point returned a non-zero status
    #[error("{call} failed with status {status}")]
    Status { call: &'static str, status: i32 },

    /// A returned record holds values outside their documented range
    #[error("{0} returned a malformed record")]
    MalformedRecord(&'static str),

    /// A string argument cannot be passed as a C string
    #[error("string argument contains an interior NUL byte")]
    InteriorNul(#[from] NulError),

    /// An integer code outside the documented set
    #[error("unknown {kind} code {code}")]
    UnknownCode { kind: &'static str, code: i32 },
}

/// Map a native status code to `Ok(())` or [`ClockError::Status`].
pub(crate) fn check_status(call: &'static str, status: i32) -> Result<(), ClockError> {
    if status == 0 {
        Ok(())
    } else {
        Err(ClockError::Status { call, status })
    }
}
