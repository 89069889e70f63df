//! Time bucketing of event streams.
//!
//! Hour-of-day, season, day/week/month and month-only groupings, plus the
//! adaptive granularity rule that keeps the matches-by-day series bounded.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Timelike};
use chrono_tz::Tz;
use insights_core::models::Timestamped;
use serde::{Deserialize, Serialize};

pub const HOURS_PER_DAY: usize = 24;

/// More distinct days than this switches the daily series to weeks.
pub const WEEKLY_THRESHOLD: usize = 180;
/// More distinct days than this (but not above [`WEEKLY_THRESHOLD`]) switches
/// the daily series to months.
pub const MONTHLY_THRESHOLD: usize = 90;

// ── Hour of day ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourCount {
    /// `"<h>:00"`, e.g. `"9:00"`.
    pub hour: String,
    pub count: usize,
}

/// Raw per-hour counts in local time.
pub fn hour_histogram<E: Timestamped>(events: &[E], tz: Tz) -> [usize; HOURS_PER_DAY] {
    let mut counts = [0usize; HOURS_PER_DAY];
    for event in events {
        let hour = event.instant().with_timezone(&tz).hour() as usize;
        counts[hour] += 1;
    }
    counts
}

/// Always 24 entries, hour 0 first.
pub fn count_by_hour<E: Timestamped>(events: &[E], tz: Tz) -> Vec<HourCount> {
    hour_histogram(events, tz)
        .iter()
        .enumerate()
        .map(|(hour, &count)| HourCount {
            hour: format!("{}:00", hour),
            count,
        })
        .collect()
}

// ── Season ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    /// Meteorological season for a calendar month (1 = January).
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Fall,
            _ => Season::Winter,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }

    fn index(&self) -> usize {
        match self {
            Season::Spring => 0,
            Season::Summer => 1,
            Season::Fall => 2,
            Season::Winter => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonCount {
    pub season: Season,
    pub count: usize,
}

/// Always four entries: Spring, Summer, Fall, Winter.
pub fn count_by_season<E: Timestamped>(events: &[E], tz: Tz) -> Vec<SeasonCount> {
    let mut counts = [0usize; 4];
    for event in events {
        let month = event.instant().with_timezone(&tz).month();
        counts[Season::from_month(month).index()] += 1;
    }
    Season::ALL
        .iter()
        .map(|&season| SeasonCount {
            season,
            count: counts[season.index()],
        })
        .collect()
}

// ── Day / week / month ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    /// Pick the bucket size for a series with `distinct_days` populated days.
    pub fn for_distinct_days(distinct_days: usize) -> Self {
        if distinct_days > WEEKLY_THRESHOLD {
            Granularity::Weekly
        } else if distinct_days > MONTHLY_THRESHOLD {
            Granularity::Monthly
        } else {
            Granularity::Daily
        }
    }

    /// Map a day to the first day of its bucket.
    ///
    /// Weeks start on the Monday on or before `date`.
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Daily => date,
            Granularity::Weekly => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            Granularity::Monthly => date.with_day(1).unwrap_or(date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCount {
    /// Bucket start as `yyyy-MM-dd`.
    pub date: String,
    pub count: usize,
}

/// Count events per local calendar day.
pub fn daily_counts<E: Timestamped>(events: &[E], tz: Tz) -> BTreeMap<NaiveDate, usize> {
    aggregate_by_period(events, |event| {
        event.instant().with_timezone(&tz).date_naive()
    })
}

/// Fold a daily series into buckets of `granularity`, ascending by date.
pub fn rebucket(daily: &BTreeMap<NaiveDate, usize>, granularity: Granularity) -> Vec<DateCount> {
    let mut buckets: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for (&day, &count) in daily {
        *buckets.entry(granularity.bucket_start(day)).or_default() += count;
    }
    buckets
        .into_iter()
        .map(|(date, count)| DateCount {
            date: date.format("%Y-%m-%d").to_string(),
            count,
        })
        .collect()
}

/// Daily series re-bucketed to the granularity its size calls for.
pub fn adaptive_date_counts<E: Timestamped>(
    events: &[E],
    tz: Tz,
) -> (Granularity, Vec<DateCount>) {
    let daily = daily_counts(events, tz);
    let granularity = Granularity::for_distinct_days(daily.len());
    (granularity, rebucket(&daily, granularity))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCount {
    /// `yyyy-MM`.
    pub month: String,
    pub count: usize,
    /// First day of the month as `yyyy-MM-dd`.
    pub date: String,
}

/// Count events per local calendar month, ascending.
pub fn count_by_month<E: Timestamped>(events: &[E], tz: Tz) -> Vec<MonthCount> {
    aggregate_by_period(events, |event| {
        let local = event.instant().with_timezone(&tz).date_naive();
        Granularity::Monthly.bucket_start(local)
    })
    .into_iter()
    .map(|(first, count)| MonthCount {
        month: first.format("%Y-%m").to_string(),
        count,
        date: first.format("%Y-%m-%d").to_string(),
    })
    .collect()
}

// ── Private ───────────────────────────────────────────────────────────────────

/// Generic counting driver; `key_fn` maps an event to its ordered bucket key.
fn aggregate_by_period<E, K: Ord>(events: &[E], key_fn: impl Fn(&E) -> K) -> BTreeMap<K, usize> {
    let mut map: BTreeMap<K, usize> = BTreeMap::new();
    for event in events {
        *map.entry(key_fn(event)).or_default() += 1;
    }
    map
}

// ── Tests ─────────────────────────────────────────────────────────────────────
