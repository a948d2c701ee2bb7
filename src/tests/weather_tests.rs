use super::fake_native::{self, with_state};
use crate::weather::{WeatherClient, WeatherUpdate};
use crate::{ClockError, GeoLocation, TemperatureUnit, WeatherOpResult};
use std::time::Duration;

const SEATTLE: GeoLocation = GeoLocation {
    latitude: 47.6062,
    longitude: -122.3321,
};
const TIMEOUT: Duration = Duration::from_secs(30);

/// Each unit crosses the boundary as its integer code and comes back on
/// the conditions unchanged.
#[test]
fn units_round_trip() {
    for (unit, code) in [
        (TemperatureUnit::Kelvin, 0),
        (TemperatureUnit::Celsius, 1),
        (TemperatureUnit::Fahrenheit, 2),
    ] {
        let util = fake_native::util();
        let mut client = WeatherClient::create(&util, "key", unit).unwrap();
        assert_eq!(with_state(|s| s.last_unit), Some(code));
        assert_eq!(client.unit(), unit);

        client.get_by_city(SEATTLE, TIMEOUT).unwrap();
        client.process();
        match client.poll().as_slice() {
            [WeatherUpdate::Conditions(conditions)] => assert_eq!(conditions.unit, unit),
            other => panic!("expected one conditions update, got {other:?}"),
        }
    }
}

/// The location and timeout are passed through; conditions are copied so
/// they outlive the native client.
#[test]
fn conditions_outlive_client() {
    let util = fake_native::util();
    let mut client = WeatherClient::create(&util, "abc123", TemperatureUnit::Fahrenheit).unwrap();
    assert_eq!(with_state(|s| s.last_api_key.clone()).as_deref(), Some("abc123"));

    client.get_by_city(SEATTLE, TIMEOUT).unwrap();
    let location = with_state(|s| s.last_location).unwrap();
    assert_eq!(location.latitude, SEATTLE.latitude);
    assert_eq!(location.longitude, SEATTLE.longitude);
    assert_eq!(with_state(|s| s.last_timeout), Some(30));

    client.process();
    let updates = client.poll();
    client.close();
    assert_eq!(with_state(|s| s.weather.destroyed), 1);

    let WeatherUpdate::Conditions(conditions) = &updates[0] else {
        panic!("expected conditions, got {:?}", updates[0]);
    };
    assert_eq!(conditions.description, "light rain");
    assert_eq!(conditions.temperature, 43.0);
    assert_eq!(conditions.high, 50.0);
    assert_eq!(conditions.low, 38.0);
}

/// Failure codes are reported without conditions.
#[test]
fn failure_codes_are_reported() {
    let util = fake_native::util();
    let mut client = WeatherClient::create(&util, "key", TemperatureUnit::Celsius).unwrap();

    for (code, expected) in [
        (1, WeatherUpdate::Failed(WeatherOpResult::CommError)),
        (2, WeatherUpdate::Failed(WeatherOpResult::InvalidData)),
        (3, WeatherUpdate::Failed(WeatherOpResult::Timeout)),
        (7, WeatherUpdate::Unrecognized(7)),
    ] {
        with_state(|s| s.weather_result = code);
        client.get_by_city(SEATTLE, TIMEOUT).unwrap();
        client.process();
        assert_eq!(client.poll(), vec![expected]);
    }
}

/// Keys with an interior NUL are rejected before create is called.
#[test]
fn api_key_with_nul_is_rejected() {
    let util = fake_native::util();
    let result = WeatherClient::create(&util, "abc\0def", TemperatureUnit::Kelvin);
    assert!(matches!(result, Err(ClockError::InteriorNul(_))));
    assert_eq!(with_state(|s| s.last_unit), None);
    assert_eq!(with_state(|s| s.weather.created), 0);
}

/// A null handle from create is never destroyed.
#[test]
fn null_handle_is_reported() {
    let util = fake_native::util();
    with_state(|s| s.fail_create = true);

    let result = WeatherClient::create(&util, "key", TemperatureUnit::Kelvin);
    assert!(matches!(result, Err(ClockError::NullHandle("weather_client_create"))));
    assert_eq!(with_state(|s| s.weather.destroyed), 0);
}

/// Dropping with a request still pending is safe and destroys once.
#[test]
fn drop_with_pending_request() {
    let util = fake_native::util();
    let mut client = WeatherClient::create(&util, "key", TemperatureUnit::Kelvin).unwrap();
    client.get_by_city(SEATTLE, TIMEOUT).unwrap();
    drop(client);
    assert_eq!(with_state(|s| s.weather.destroyed), 1);
}
