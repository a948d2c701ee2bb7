//! # Weather Cache
//!
//! Keeps the last successful weather conditions on disk so the clock has
//! something to show right after start-up, before the first request to the
//! weather service completes.
//!
//! ## Validity
//! - **Format**: JSON via `serde_json`
//! - **TTL**: configured in minutes (`weather.cache_ttl_minutes`)
//! - **Validation**: file modification time checked before loading
//!
//! Stale, missing or corrupt files are reported as errors and simply ignored
//! by the caller.

use crate::WeatherConditions;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, SystemTime};
use std::{fs, io};
use thiserror::Error;

/// Errors that can occur while reading or writing the cache file.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache IO: {0}")]
    Io(#[from] io::Error),

    #[error("cache contents: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON cannot represent NaN or infinite temperatures
    #[error("conditions hold a non-finite temperature")]
    NonFinite,

    /// The file is older than the TTL
    #[error("cache is {age_secs}s old")]
    Stale { age_secs: u64 },
}

/// Conditions as stored on disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CachedWeather {
    /// When the conditions were received
    pub fetched_at: DateTime<Utc>,
    pub conditions: WeatherConditions,
}

/// Load cached conditions if the file is younger than `ttl`.
pub fn load<P: AsRef<Path>>(path: P, ttl: Duration) -> Result<CachedWeather, CacheError> {
    let path = path.as_ref();
    let meta = fs::metadata(path)?;

    // A modification time in the future counts as fresh
    let age = SystemTime::now()
        .duration_since(meta.modified()?)
        .unwrap_or_default();
    if age > ttl {
        return Err(CacheError::Stale {
            age_secs: age.as_secs(),
        });
    }

    let data = fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}

/// Store conditions for the next start-up.
pub fn save<P: AsRef<Path>>(path: P, cached: &CachedWeather) -> Result<(), CacheError> {
    let conditions = &cached.conditions;
    if ![conditions.temperature, conditions.high, conditions.low]
        .iter()
        .all(|t| t.is_finite())
    {
        return Err(CacheError::NonFinite);
    }
    let data = serde_json::to_vec(cached)?;
    fs::write(path, data)?;
    Ok(())
}
