//! Maps provider payloads onto the stable forecast DTOs.
//!
//! 3-hourly data is expanded to hourly entries: every sample is repeated at t, t+1h and
//! t+2h, so clients always receive a 1-hour grid regardless of the upstream source.

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::service::aggregator::{self, ThreeHourSample};
use crate::types::openweather::{
    Condition, CurrentPayload, ForecastEntry, ForecastListPayload, OneCallDaily, OneCallHourly,
};
use crate::types::{CurrentConditions, DailyForecastItem, HourlyForecastItem, ProviderResponse};

pub const DEFAULT_HOURS: usize = 24;
pub const DEFAULT_DAYS: usize = 7;
pub const MAX_DAYS: usize = 7;
const STEP_HOURS: i64 = 3;

/// Which array of a onecall payload a caller needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Hourly,
    Daily,
}

/// Whether the payload carries data for `section`. An empty onecall array means the
/// forecast-list endpoint should be consulted instead.
pub fn has_section(resp: &ProviderResponse, section: Section) -> bool {
    match (resp, section) {
        (ProviderResponse::OneCall(p), Section::Hourly) => !p.hourly.is_empty(),
        (ProviderResponse::OneCall(p), Section::Daily) => !p.daily.is_empty(),
        (ProviderResponse::ForecastList(p), _) => !p.list.is_empty(),
    }
}

pub fn clamp_hours(hours: Option<usize>) -> usize {
    hours.unwrap_or(DEFAULT_HOURS).max(1)
}

pub fn clamp_days(days: Option<usize>) -> usize {
    days.unwrap_or(DEFAULT_DAYS).clamp(1, MAX_DAYS)
}

fn from_epoch(secs: i64) -> Option<DateTime<Utc>> {
    let parsed = DateTime::from_timestamp(secs, 0);
    if parsed.is_none() {
        warn!(secs, "dropping provider timestamp outside the representable range");
    }
    parsed
}

fn headline(weather: &[Condition]) -> (String, String) {
    weather
        .first()
        .map(|c| (c.description.clone(), c.icon.clone()))
        .unwrap_or_default()
}

/// Hourly items in chronological order, at most `hours` of them. Entries without a
/// condition icon are dropped.
pub fn hourly(resp: ProviderResponse, hours: usize) -> Vec<HourlyForecastItem> {
    let mut items: Vec<HourlyForecastItem> = match resp {
        ProviderResponse::OneCall(p) => {
            let offset = p.timezone_offset;
            p.hourly
                .iter()
                .filter_map(|h| onecall_hour(h, offset))
                .collect()
        }
        ProviderResponse::ForecastList(p) => {
            let offset = p.city.timezone;
            p.list
                .iter()
                .flat_map(|entry| expand_step(entry, offset))
                .collect()
        }
    };
    items.sort_by_key(|i| i.time);
    items.truncate(hours);
    items
}

fn onecall_hour(h: &OneCallHourly, offset: i32) -> Option<HourlyForecastItem> {
    let (description, icon) = headline(&h.weather);
    if icon.is_empty() {
        return None;
    }
    Some(HourlyForecastItem {
        time: from_epoch(h.dt)?,
        temperature: h.temp,
        feels_like: h.feels_like,
        humidity: h.humidity,
        wind_speed: h.wind_speed,
        precipitation_probability: h.pop,
        description,
        icon,
        timezone_offset_seconds: offset,
    })
}

fn expand_step(entry: &ForecastEntry, offset: i32) -> Vec<HourlyForecastItem> {
    let Some(start) = from_epoch(entry.dt) else {
        return Vec::new();
    };
    let (description, icon) = headline(&entry.weather);
    if icon.is_empty() {
        return Vec::new();
    }
    (0..STEP_HOURS)
        .map(|h| HourlyForecastItem {
            time: start + Duration::hours(h),
            temperature: entry.main.temp,
            feels_like: entry.main.feels_like,
            humidity: entry.main.humidity,
            wind_speed: entry.wind.speed,
            precipitation_probability: entry.pop,
            description: description.clone(),
            icon: icon.clone(),
            timezone_offset_seconds: offset,
        })
        .collect()
}

/// Daily items sorted by local date, at most `days` of them.
pub fn daily(resp: ProviderResponse, days: usize) -> Vec<DailyForecastItem> {
    match resp {
        ProviderResponse::OneCall(p) => {
            let offset = p.timezone_offset;
            let mut items: Vec<DailyForecastItem> = p
                .daily
                .iter()
                .filter_map(|d| onecall_day(d, offset))
                .collect();
            items.sort_by_key(|d| d.date);
            items.truncate(days);
            items
        }
        ProviderResponse::ForecastList(p) => rollup_forecast_list(p, days),
    }
}

fn onecall_day(d: &OneCallDaily, offset: i32) -> Option<DailyForecastItem> {
    let (description, icon) = headline(&d.weather);
    Some(DailyForecastItem {
        date: aggregator::local_date(from_epoch(d.dt)?, offset),
        min_temperature: d.temp.min,
        max_temperature: d.temp.max,
        humidity: d.humidity,
        wind_speed: d.wind_speed,
        precipitation_probability: d.pop,
        sunrise: d.sunrise.and_then(from_epoch),
        sunset: d.sunset.and_then(from_epoch),
        description,
        icon,
        timezone_offset_seconds: offset,
    })
}

fn to_sample(entry: &ForecastEntry) -> Option<ThreeHourSample> {
    let (description, icon) = headline(&entry.weather);
    Some(ThreeHourSample {
        time: from_epoch(entry.dt)?,
        temperature: entry.main.temp,
        temp_min: entry.main.temp_min,
        temp_max: entry.main.temp_max,
        humidity: entry.main.humidity,
        wind_speed: entry.wind.speed,
        precipitation_probability: entry.pop,
        description,
        icon,
    })
}

fn rollup_forecast_list(p: ForecastListPayload, days: usize) -> Vec<DailyForecastItem> {
    let offset = p.city.timezone;
    let samples: Vec<ThreeHourSample> = p.list.iter().filter_map(to_sample).collect();
    let mut items = aggregator::daily_rollup(&samples, offset, days);

    // The city block only carries today's sun times; attach them to the matching day.
    let sunrise = p.city.sunrise.and_then(from_epoch);
    let sunset = p.city.sunset.and_then(from_epoch);
    if let Some(rise) = sunrise {
        let date = aggregator::local_date(rise, offset);
        if let Some(day) = items.iter_mut().find(|d| d.date == date) {
            day.sunrise = Some(rise);
            day.sunset = sunset;
        }
    }
    items
}

pub fn current(payload: CurrentPayload) -> Option<CurrentConditions> {
    let (description, icon) = headline(&payload.weather);
    Some(CurrentConditions {
        observed_at: from_epoch(payload.dt)?,
        location_name: payload.name,
        country_code: payload.sys.country,
        temperature: payload.main.temp,
        feels_like: payload.main.feels_like,
        min_temperature: payload.main.temp_min.unwrap_or(payload.main.temp),
        max_temperature: payload.main.temp_max.unwrap_or(payload.main.temp),
        humidity: payload.main.humidity,
        wind_speed: payload.wind.speed,
        description,
        icon,
        sunrise: payload.sys.sunrise.and_then(from_epoch),
        sunset: payload.sys.sunset.and_then(from_epoch),
        timezone_offset_seconds: payload.timezone,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    const BASE: i64 = 1_717_200_000; // 2024-06-01T00:00:00Z

    fn decode(v: serde_json::Value) -> ProviderResponse {
        ProviderResponse::from_slice(v.to_string().as_bytes()).unwrap()
    }

    fn onecall_with_hours(n: i64) -> ProviderResponse {
        let hourly: Vec<_> = (0..n)
            .map(|i| {
                json!({"dt": BASE + i * 3600, "temp": 20.0, "feels_like": 19.0,
                       "humidity": 50, "wind_speed": 3.0, "pop": 0.1,
                       "weather": [{"description": "clear sky", "icon": "01d"}]})
            })
            .collect();
        decode(json!({"timezone_offset": 3600, "hourly": hourly}))
    }

    fn forecast_list(n: i64, offset: i32) -> ProviderResponse {
        let list: Vec<_> = (0..n)
            .map(|i| {
                json!({"dt": BASE + i * 3 * 3600,
                       "main": {"temp": 10.0 + i as f64, "feels_like": 9.0,
                                "temp_min": 9.0 + i as f64, "temp_max": 11.0 + i as f64,
                                "humidity": 70},
                       "wind": {"speed": 2.0},
                       "weather": [{"description": "clouds", "icon": "03d"}]})
            })
            .collect();
        decode(json!({"list": list, "city": {"timezone": offset, "name": "Lisbon"}}))
    }

    #[test]
    fn hourly_clamps_to_available_onecall_data() {
        let items = hourly(onecall_with_hours(40), 100);
        assert_eq!(items.len(), 40);
        assert!(items.windows(2).all(|w| w[0].time < w[1].time));
        assert!(items.iter().all(|i| !i.icon.is_empty()));
        assert_eq!(items[0].timezone_offset_seconds, 3600);

        assert_eq!(hourly(onecall_with_hours(40), 24).len(), 24);
    }

    #[test]
    fn three_hour_steps_expand_to_hourly_grid() {
        let items = hourly(forecast_list(2, 0), 24);
        assert_eq!(items.len(), 6);
        assert_eq!(items[1].time - items[0].time, Duration::hours(1));
        assert_eq!(items[0].temperature, items[2].temperature);
        assert_ne!(items[2].temperature, items[3].temperature);
        assert_eq!(items[0].precipitation_probability, None);

        assert_eq!(hourly(forecast_list(2, 0), 4).len(), 4);
    }

    #[test]
    fn hourly_entries_without_icon_are_dropped() {
        let resp = decode(json!({
            "timezone_offset": 0,
            "hourly": [
                {"dt": BASE, "temp": 20.0, "feels_like": 19.0, "weather": []},
                {"dt": BASE + 3600, "temp": 21.0, "feels_like": 20.0,
                 "weather": [{"description": "clear sky", "icon": ""}]},
                {"dt": BASE + 7200, "temp": 22.0, "feels_like": 21.0,
                 "weather": [{"description": "clear sky", "icon": "01d"}]}
            ]
        }));
        let items = hourly(resp, 24);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].icon, "01d");

        let list = decode(json!({"list": [
            {"dt": BASE, "main": {"temp": 5.0, "feels_like": 4.0}, "weather": []}
        ]}));
        assert!(hourly(list, 24).is_empty());
    }

    #[test]
    fn onecall_daily_uses_local_date_and_keeps_optionals() {
        let resp = decode(json!({
            "timezone_offset": -18000,
            "daily": [
                {"dt": BASE + 17 * 3600, "temp": {"min": 1.0, "max": 9.0},
                 "humidity": 40, "wind_speed": 5.0, "sunrise": BASE + 10 * 3600,
                 "weather": [{"description": "rain", "icon": "10d"}]},
                {"dt": BASE + 41 * 3600, "temp": {"min": 2.0, "max": 8.0},
                 "humidity": 45, "wind_speed": 4.0, "pop": 0.6, "weather": []}
            ]
        }));
        let days = daily(resp, 1);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(days[0].sunrise.is_some());
        assert!(days[0].sunset.is_none());
        assert_eq!(days[0].precipitation_probability, None);
    }

    #[test]
    fn forecast_list_rolls_up_by_local_day() {
        // 40 samples over 5 days at UTC+9: the window straddles 6 local dates.
        let days = daily(forecast_list(40, 9 * 3600), 7);
        assert_eq!(days.len(), 6);
        assert!(days.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(days[0].min_temperature, 9.0);
        assert!(days.iter().all(|d| d.timezone_offset_seconds == 9 * 3600));

        assert_eq!(daily(forecast_list(40, 0), 3).len(), 3);
    }

    #[test]
    fn section_probe_detects_empty_onecall() {
        let resp = decode(json!({"timezone_offset": 0, "hourly": [], "daily": []}));
        assert!(!has_section(&resp, Section::Hourly));
        assert!(has_section(&forecast_list(1, 0), Section::Daily));
    }

    #[test]
    fn hour_and_day_parameters_are_clamped() {
        assert_eq!(clamp_hours(None), 24);
        assert_eq!(clamp_hours(Some(0)), 1);
        assert_eq!(clamp_hours(Some(100)), 100);
        assert_eq!(clamp_days(Some(30)), 7);
        assert_eq!(clamp_days(Some(0)), 1);
    }
}
