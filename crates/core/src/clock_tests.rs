use super::*;

#[test]
fn fake_clock_advances_epoch_and_instant_together() {
    let clock = FakeClock::new();
    let start_instant = clock.now();
    let start_ms = clock.epoch_ms();

    clock.advance(Duration::from_secs(2));

    assert_eq!(clock.epoch_ms(), start_ms + 2000);
    assert!(clock.now() > start_instant);
}

#[test]
fn rfc3339_formats_known_epoch() {
    // 2024-01-02T03:04:05.006Z
    let ms = 1_704_165_845_006u64;
    assert_eq!(format_epoch_ms_rfc3339(ms), "2024-01-02T03:04:05.006000000Z");
}

#[test]
fn rfc3339_formats_epoch_zero() {
    assert_eq!(format_epoch_ms_rfc3339(0), "1970-01-01T00:00:00.000000000Z");
}

#[test]
fn rfc3339_round_trips_through_parse() {
    let ms = 1_704_165_845_006u64;
    let formatted = format_epoch_ms_rfc3339(ms);
    assert_eq!(parse_rfc3339_to_epoch_ms(&formatted), Some(ms));
}

#[test]
fn parse_rfc3339_rejects_garbage() {
    assert_eq!(parse_rfc3339_to_epoch_ms("not a timestamp"), None);
}

#[test]
fn system_clock_epoch_ms_is_recent() {
    let clock = SystemClock;
    let ms = clock.epoch_ms();
    assert!(ms > 1_700_000_000_000);
}
