use chrono::{NaiveDate, NaiveDateTime};
use memtrend::window::TimeWindow;
use memtrend::Error;

fn local(d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
}

#[test]
fn test_parse_range() {
    let window = TimeWindow::parse_range("2025-06-01 00:00:00", "2025-06-02 00:00:00").unwrap();
    assert_eq!(window.start(), local(1, 0));
    assert_eq!(window.end(), local(2, 0));
}

#[test]
fn test_malformed_range_date() {
    let result = TimeWindow::parse_range("2025/06/01", "2025-06-02 00:00:00");
    assert!(matches!(result, Err(Error::MalformedDate { .. })));
}

#[test]
fn test_inverted_range() {
    let result = TimeWindow::parse_range("2025-06-02 00:00:00", "2025-06-01 00:00:00");
    assert!(matches!(result, Err(Error::InvertedWindow { .. })));
    let equal = TimeWindow::parse_range("2025-06-01 00:00:00", "2025-06-01 00:00:00");
    assert!(matches!(equal, Err(Error::InvertedWindow { .. })));
}

#[test]
fn test_lookback_windows() {
    let now = local(4, 12);
    assert_eq!(TimeWindow::last_hours(now, 24).unwrap().start(), local(3, 12));
    assert_eq!(TimeWindow::last_days(now, 3).unwrap().start(), local(1, 12));
    assert!(TimeWindow::last_hours(now, 0).is_err());
}

#[test]
fn test_window_is_inclusive() {
    let window = TimeWindow::new(local(1, 0), local(2, 0)).unwrap();
    assert!(window.contains(local(1, 0)));
    assert!(window.contains(local(2, 0)));
    assert!(!window.contains(local(2, 1)));
}
