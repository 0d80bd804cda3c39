//! Daily roll-up of 3-hourly forecast samples.
//!
//! Samples are bucketed by the calendar date at the location (provider offset applied
//! before truncation), so a sample at 23:00 local lands on that local day even when it
//! is already the next day in UTC.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Timelike, Utc};
use std::collections::BTreeMap;

use crate::types::DailyForecastItem;

const NOON_SECS: i64 = 12 * 60 * 60;

/// One 3-hour step, decoupled from the wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreeHourSample {
    pub time: DateTime<Utc>,
    pub temperature: f64,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub humidity: f64,
    pub wind_speed: f64,
    pub precipitation_probability: Option<f64>,
    pub description: String,
    pub icon: String,
}

pub fn fixed_offset(offset_secs: i32) -> FixedOffset {
    FixedOffset::east_opt(offset_secs).unwrap_or_else(|| Utc.fix())
}

pub fn local_date(time: DateTime<Utc>, offset_secs: i32) -> NaiveDate {
    time.with_timezone(&fixed_offset(offset_secs)).date_naive()
}

fn distance_from_noon(time: DateTime<Utc>, offset: &FixedOffset) -> i64 {
    let secs = time.with_timezone(offset).num_seconds_from_midnight() as i64;
    (secs - NOON_SECS).abs()
}

/// Group samples into one item per local date, ascending, at most `days` items.
///
/// Partial days at either end of the window are kept.
pub fn daily_rollup(
    samples: &[ThreeHourSample],
    offset_secs: i32,
    days: usize,
) -> Vec<DailyForecastItem> {
    let offset = fixed_offset(offset_secs);

    let mut ordered: Vec<&ThreeHourSample> = samples.iter().collect();
    ordered.sort_by_key(|s| s.time);

    let mut groups: BTreeMap<NaiveDate, Vec<&ThreeHourSample>> = BTreeMap::new();
    for sample in ordered {
        let date = sample.time.with_timezone(&offset).date_naive();
        groups.entry(date).or_default().push(sample);
    }

    groups
        .into_iter()
        .take(days)
        .filter_map(|(date, group)| summarize(date, &group, &offset, offset_secs))
        .collect()
}

fn summarize(
    date: NaiveDate,
    group: &[&ThreeHourSample],
    offset: &FixedOffset,
    offset_secs: i32,
) -> Option<DailyForecastItem> {
    let first = group.first()?;
    let count = group.len() as f64;

    let min_temperature = group
        .iter()
        .map(|s| s.temp_min.unwrap_or(s.temperature))
        .fold(f64::INFINITY, f64::min);
    let max_temperature = group
        .iter()
        .map(|s| s.temp_max.unwrap_or(s.temperature))
        .fold(f64::NEG_INFINITY, f64::max);
    let humidity = group.iter().map(|s| s.humidity).sum::<f64>() / count;
    let wind_speed = group.iter().map(|s| s.wind_speed).sum::<f64>() / count;
    // worst case across the day
    let precipitation_probability = group
        .iter()
        .filter_map(|s| s.precipitation_probability)
        .reduce(f64::max);

    let mut representative = *first;
    let mut best = distance_from_noon(first.time, offset);
    for sample in group.iter().skip(1) {
        let d = distance_from_noon(sample.time, offset);
        if d < best {
            best = d;
            representative = *sample;
        }
    }

    Some(DailyForecastItem {
        date,
        min_temperature,
        max_temperature,
        humidity,
        wind_speed,
        precipitation_probability,
        sunrise: None,
        sunset: None,
        description: representative.description.clone(),
        icon: representative.icon.clone(),
        timezone_offset_seconds: offset_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(time: DateTime<Utc>, temp: f64, pop: Option<f64>, icon: &str) -> ThreeHourSample {
        ThreeHourSample {
            time,
            temperature: temp,
            temp_min: None,
            temp_max: None,
            humidity: 60.0,
            wind_speed: 4.0,
            precipitation_probability: pop,
            description: format!("desc {icon}"),
            icon: icon.to_string(),
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn single_day_min_max_and_worst_precipitation() {
        let temps = [10.0, 12.0, 15.0, 14.0, 11.0];
        let pops = [0.1, 0.3, 0.0, 0.2, 0.4];
        let samples: Vec<_> = (0..5)
            .map(|i| sample(utc(2024, 6, 1, 6 + 3 * i as u32), temps[i], Some(pops[i]), "01d"))
            .collect();

        let days = daily_rollup(&samples, 0, 7);
        assert_eq!(days.len(), 1);
        let day = &days[0];
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(day.min_temperature, 10.0);
        assert_eq!(day.max_temperature, 15.0);
        assert_eq!(day.precipitation_probability, Some(0.4));
        assert_eq!(day.humidity, 60.0);
    }

    #[test]
    fn late_local_evening_groups_into_local_day() {
        // 22:00 UTC on June 1st is 00:00 June 2nd at +02:00, and 20:00 UTC is 22:00 local.
        let samples = vec![
            sample(utc(2024, 6, 1, 20), 9.0, None, "a"),
            sample(utc(2024, 6, 1, 22), 8.0, None, "b"),
        ];
        let days = daily_rollup(&samples, 2 * 3600, 7);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
        assert_eq!(days[0].timezone_offset_seconds, 7200);
    }

    #[test]
    fn representative_is_closest_to_local_noon_first_on_tie() {
        // offset -3h: 12:00 UTC is 09:00 local, 15:00 UTC is noon local.
        let samples = vec![
            sample(utc(2024, 6, 1, 12), 10.0, None, "morning"),
            sample(utc(2024, 6, 1, 15), 11.0, None, "noon"),
            sample(utc(2024, 6, 1, 18), 12.0, None, "afternoon"),
        ];
        let days = daily_rollup(&samples, -3 * 3600, 7);
        assert_eq!(days[0].icon, "noon");

        // 10:30 and 13:30 local are equidistant from noon; the earlier wins.
        let tied = vec![
            sample(Utc.with_ymd_and_hms(2024, 6, 1, 10, 30, 0).unwrap(), 1.0, None, "early"),
            sample(Utc.with_ymd_and_hms(2024, 6, 1, 13, 30, 0).unwrap(), 1.0, None, "late"),
        ];
        assert_eq!(daily_rollup(&tied, 0, 7)[0].icon, "early");
    }

    #[test]
    fn uses_per_sample_extremes_and_keeps_thin_days() {
        let mut a = sample(utc(2024, 6, 1, 21), 10.0, None, "x");
        a.temp_min = Some(7.5);
        a.temp_max = Some(10.5);
        let b = sample(utc(2024, 6, 2, 0), 6.0, None, "y");
        let c = sample(utc(2024, 6, 2, 12), 16.0, Some(0.5), "z");

        let days = daily_rollup(&[c, b, a], 0, 7);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].min_temperature, 7.5);
        assert_eq!(days[0].max_temperature, 10.5);
        assert_eq!(days[0].precipitation_probability, None);
        assert_eq!(days[1].min_temperature, 6.0);
        assert_eq!(days[1].max_temperature, 16.0);
        assert_eq!(days[1].icon, "z");
    }

    #[test]
    fn truncates_to_requested_days() {
        let samples: Vec<_> = (0..40)
            .map(|i| sample(utc(2024, 6, 1, 0) + chrono::Duration::hours(3 * i), 10.0, None, "i"))
            .collect();
        let all = daily_rollup(&samples, 0, 7);
        assert_eq!(all.len(), 5);
        assert!(all.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(daily_rollup(&samples, 0, 3).len(), 3);
    }
}
