//! # Binding Test Suite
//!
//! Drives the safe wrappers end to end against [`fake_native`], an in-process
//! C-ABI implementation of `clock_util`, so handle ownership, string passing
//! and callback delivery are checked without the shared library installed.

pub(crate) mod fake_native;

mod alarm_tests;
mod weather_tests;
