use super::fake_native::{self, with_state};
use crate::alarm::AlarmScheduler;
use crate::config::AlarmConfig;
use crate::{ClockError, TimeOfDay, Weekdays};
use chrono::Weekday;

fn time(hour: u8, minute: u8) -> TimeOfDay {
    TimeOfDay::new(hour, minute).unwrap()
}

/// The workday mask comes back from the scheduler bit for bit.
#[test]
fn weekday_mask_round_trips() {
    let util = fake_native::util();
    let mut scheduler = AlarmScheduler::create(&util).unwrap();

    let days = Weekdays::from_bits_retain(0b0011111);
    scheduler.add_alarm("Wake up", time(6, 30), days, None).unwrap();

    let alarm = scheduler.next_alarm().unwrap().unwrap();
    assert_eq!(alarm.days.bits(), 0b0011111);
    assert_eq!(alarm.days, Weekdays::WORKDAYS);
    assert_eq!(alarm.label, "Wake up");
    assert_eq!(alarm.time, time(6, 30));
    assert_eq!(alarm.sound_file, None);
}

/// Bits outside the seven days are not lost on the way through.
#[test]
fn unknown_weekday_bits_round_trip() {
    let util = fake_native::util();
    let mut scheduler = AlarmScheduler::create(&util).unwrap();

    scheduler
        .add_alarm("Odd", time(7, 0), Weekdays::from_bits_retain(0x81), Some("chime.wav"))
        .unwrap();

    let alarm = scheduler.next_alarm().unwrap().unwrap();
    assert_eq!(alarm.days.bits(), 0x81);
    assert_eq!(alarm.sound_file.as_deref(), Some("chime.wav"));
}

/// The earliest alarm is reported; removing it exposes the next one.
#[test]
fn next_alarm_follows_removal() {
    let util = fake_native::util();
    let mut scheduler = AlarmScheduler::create(&util).unwrap();
    assert_eq!(scheduler.next_alarm().unwrap(), None);

    scheduler.add_alarm("Late", time(9, 15), Weekdays::WEEKEND, None).unwrap();
    scheduler.add_alarm("Early", time(5, 45), Weekdays::WORKDAYS, None).unwrap();
    assert_eq!(scheduler.next_alarm().unwrap().unwrap().label, "Early");

    scheduler.remove_alarm("Early").unwrap();
    assert_eq!(scheduler.next_alarm().unwrap().unwrap().label, "Late");

    scheduler.remove_alarm("Late").unwrap();
    assert_eq!(scheduler.next_alarm().unwrap(), None);
}

/// Library rejections surface as status errors.
#[test]
fn rejected_calls_are_errors() {
    let util = fake_native::util();
    let mut scheduler = AlarmScheduler::create(&util).unwrap();

    scheduler.add_alarm("Gym", time(6, 0), Weekdays::MONDAY, None).unwrap();
    assert!(matches!(
        scheduler.add_alarm("Gym", time(7, 0), Weekdays::MONDAY, None),
        Err(ClockError::Status {
            call: "alarm_scheduler_add_alarm",
            status: 3
        })
    ));
    assert!(matches!(
        scheduler.remove_alarm("Missing"),
        Err(ClockError::Status {
            call: "alarm_scheduler_remove_alarm",
            status: 1
        })
    ));
    assert!(matches!(
        scheduler.add_alarm("Bad\0label", time(7, 0), Weekdays::MONDAY, None),
        Err(ClockError::InteriorNul(_))
    ));
}

/// Configured alarms are loaded; duplicates are skipped, not fatal.
#[test]
fn load_from_config_skips_rejected_entries() {
    let util = fake_native::util();
    let mut scheduler = AlarmScheduler::create(&util).unwrap();

    let alarms = vec![
        AlarmConfig {
            name: "Wake up".to_string(),
            time: time(6, 30),
            days: vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
            sound: Some("chime.wav".to_string()),
        },
        AlarmConfig {
            name: "Wake up".to_string(),
            time: time(8, 0),
            days: vec![Weekday::Sat],
            sound: None,
        },
        AlarmConfig {
            name: "Trash day".to_string(),
            time: time(19, 0),
            days: vec![Weekday::Wed],
            sound: None,
        },
    ];

    assert_eq!(scheduler.load_from_config(&alarms), 2);
    let next = scheduler.next_alarm().unwrap().unwrap();
    assert_eq!(next.days, Weekdays::WORKDAYS);
}

/// The scheduler handle is destroyed exactly once.
#[test]
fn scheduler_is_destroyed_once() {
    let util = fake_native::util();
    let scheduler = AlarmScheduler::create(&util).unwrap();
    scheduler.close();
    assert_eq!(with_state(|s| (s.alarm.created, s.alarm.destroyed)), (1, 1));

    with_state(|s| s.fail_create = true);
    assert!(matches!(
        AlarmScheduler::create(&util),
        Err(ClockError::NullHandle("alarm_scheduler_create"))
    ));
    assert_eq!(with_state(|s| s.alarm.destroyed), 1);
}
