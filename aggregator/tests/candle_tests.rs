use chrono::{DateTime, TimeZone, Utc};
use memtrend::bucket::{bucket_start, Bucket};
use memtrend::candle::{Candle, CandleBuilder, Point};
use memtrend::identity::SeriesKey;

fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 4, h, m, s).unwrap()
}

#[test]
fn test_bucket_floors_to_interval() {
    assert_eq!(bucket_start(at(10, 3, 0), 15), at(10, 0, 0));
    assert_eq!(bucket_start(at(10, 14, 59), 15), at(10, 0, 0));
    assert_eq!(bucket_start(at(10, 15, 0), 15), at(10, 15, 0));
    assert_eq!(bucket_start(at(10, 59, 30), 60), at(10, 0, 0));
}

#[test]
fn test_bucket_drops_subseconds() {
    let ts = at(10, 7, 12) + chrono::Duration::milliseconds(345);
    assert_eq!(bucket_start(ts, 5), at(10, 5, 0));
}

#[test]
fn test_non_divisor_interval_restarts_each_hour() {
    assert_eq!(bucket_start(at(10, 58, 0), 7), at(10, 56, 0));
    assert_eq!(bucket_start(at(11, 2, 0), 7), at(11, 0, 0));
}

#[test]
fn test_bucket_is_monotonic() {
    let mut previous = bucket_start(at(9, 0, 0), 15);
    for minute in 0..120 {
        let ts = at(9, 0, 0) + chrono::Duration::minutes(minute);
        let current = bucket_start(ts, 15);
        assert!(current >= previous);
        previous = current;
    }
}

#[test]
fn test_bucket_groups_by_aligned_start() {
    let bucket = Bucket::containing(at(10, 7, 0), 15);
    assert_eq!(bucket.start, at(10, 0, 0));
    assert_eq!(bucket, Bucket::containing(at(10, 14, 59), 15));
    assert_ne!(bucket, Bucket::containing(at(10, 15, 0), 15));

    let mut builder = CandleBuilder::new(15);
    builder.push(SeriesKey::new(1), at(10, 7, 0), 10);
    builder.push(SeriesKey::new(1), at(10, 14, 59), 20);
    builder.push(SeriesKey::new(1), at(10, 15, 0), 30);
    assert_eq!(builder.group_count(), 2);

    let candles = &builder.finish()[&SeriesKey::new(1)];
    assert_eq!(candles[0].start, bucket.start);
    assert_eq!((candles[0].open, candles[0].close), (10, 20));
    assert_eq!(candles[1].start, at(10, 15, 0));
}

#[test]
fn test_build_reorders_points_by_time() {
    let mut points = vec![
        Point { timestamp: at(10, 14, 59), rss_kb: 300 },
        Point { timestamp: at(10, 3, 0), rss_kb: 200 },
        Point { timestamp: at(10, 7, 0), rss_kb: 500 },
    ];
    let candle = Candle::build(at(10, 0, 0), &mut points).unwrap();
    assert_eq!(candle.open, 200);
    assert_eq!(candle.high, 500);
    assert_eq!(candle.low, 200);
    assert_eq!(candle.close, 300);
    assert_eq!(candle.samples, 3);
}

#[test]
fn test_single_point_candle_is_flat() {
    let mut points = vec![Point { timestamp: at(10, 1, 0), rss_kb: 4096 }];
    let candle = Candle::build(at(10, 0, 0), &mut points).unwrap();
    assert_eq!((candle.open, candle.high, candle.low, candle.close), (4096, 4096, 4096, 4096));
}

#[test]
fn test_empty_group_builds_nothing() {
    assert!(Candle::build(at(10, 0, 0), &mut []).is_none());
}

#[test]
fn test_builder_splits_buckets_and_series() {
    let pid7 = SeriesKey::new(7);
    let pid8 = SeriesKey::new(8);
    let mut builder = CandleBuilder::new(15);
    builder.push(pid7, at(10, 15, 0), 900);
    builder.push(pid7, at(10, 3, 0), 100);
    builder.push(pid7, at(10, 7, 0), 150);
    builder.push(pid7, at(10, 14, 59), 120);
    builder.push(pid8, at(10, 5, 0), 10);
    assert_eq!(builder.group_count(), 3);

    let series = builder.finish();
    let candles = &series[&pid7];
    assert_eq!(candles.len(), 2);
    assert_eq!(candles[0].start, at(10, 0, 0));
    assert_eq!((candles[0].open, candles[0].high, candles[0].low, candles[0].close), (100, 150, 100, 120));
    assert_eq!(candles[1].start, at(10, 15, 0));
    assert_eq!(candles[1].samples, 1);
    assert_eq!(series[&pid8].len(), 1);
}

#[test]
fn test_candles_respect_ohlc_bounds() {
    let key = SeriesKey::new(1);
    let mut builder = CandleBuilder::new(5);
    let values = [700u64, 20, 950, 3, 480, 480, 10_000, 0, 64, 512, 77, 1];
    for (i, rss) in values.iter().enumerate() {
        builder.push(key, at(12, (i * 2) as u32, (i * 7 % 60) as u32), *rss);
    }
    for candle in &builder.finish()[&key] {
        assert!(candle.low <= candle.open && candle.open <= candle.high);
        assert!(candle.low <= candle.close && candle.close <= candle.high);
    }
}
