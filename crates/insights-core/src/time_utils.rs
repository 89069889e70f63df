use std::borrow::Cow;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Parse an IANA timezone name, falling back to UTC with a warning.
pub fn parse_timezone(tz_name: &str) -> Tz {
    tz_name.parse::<Tz>().unwrap_or_else(|_| {
        warn!(
            "unrecognised timezone \"{}\", falling back to UTC",
            tz_name
        );
        Tz::UTC
    })
}

/// Validate that `tz_name` is a recognised IANA timezone identifier.
pub fn validate_timezone(tz_name: &str) -> bool {
    tz_name.parse::<Tz>().is_ok()
}

// ── Resolution ────────────────────────────────────────────────────────────────

/// Outcome of running the parse strategies over one raw timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Parsed(DateTime<Utc>),
    Unparsed,
}

type Strategy = fn(&str, Tz) -> Option<DateTime<Utc>>;

/// Parse strategies, tried in order. The first hit wins.
const STRATEGIES: &[Strategy] = &[parse_iso8601, parse_naive_seconds, parse_naive_millis];

/// ISO-8601 shapes carrying an offset (`Z`, `+hh`, `+hhmm`, `+hh:mm`).
const ISO_OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%#z",
    "%Y-%m-%dT%H:%M%#z",
];

/// Local ISO-8601 shapes accepted when no offset is present.
const ISO_LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

fn parse_iso8601(s: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let s = normalise_iso(s);
    let s = s.as_ref();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ISO_OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in ISO_LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return localize(naive, tz);
        }
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    localize(date.and_hms_opt(0, 0, 0)?, tz)
}

/// Rewrite basic-format ISO (`20230101T1000`) into extended form and give an
/// hour-only time (`T10`) its minutes. Anything else is returned as is.
fn normalise_iso(s: &str) -> Cow<'_, str> {
    let Some((date, rest)) = s.split_once('T') else {
        return Cow::Borrowed(s);
    };

    let date = if date.len() == 8 && date.bytes().all(|b| b.is_ascii_digit()) {
        Cow::Owned(format!("{}-{}-{}", &date[..4], &date[4..6], &date[6..]))
    } else {
        Cow::Borrowed(date)
    };

    let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let (clock, tail) = rest.split_at(digits);
    if tail.starts_with(':') {
        // Already extended; only the date may need rewriting.
        return match date {
            Cow::Borrowed(_) => Cow::Borrowed(s),
            Cow::Owned(date) => Cow::Owned(format!("{}T{}", date, rest)),
        };
    }
    let clock = match clock.len() {
        2 => Cow::Owned(format!("{}:00", clock)),
        4 => Cow::Owned(format!("{}:{}", &clock[..2], &clock[2..])),
        6 => Cow::Owned(format!("{}:{}:{}", &clock[..2], &clock[2..4], &clock[4..])),
        _ => Cow::Borrowed(clock),
    };

    if matches!((&date, &clock), (Cow::Borrowed(_), Cow::Borrowed(_))) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(format!("{}T{}{}", date, clock, tail))
}

fn parse_naive_seconds(s: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok()?;
    localize(naive, tz)
}

fn parse_naive_millis(s: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.3f").ok()?;
    localize(naive, tz)
}

/// Attach `tz` to a wall-clock time. Repeated times take the earlier
/// instant. Times skipped by a forward DST transition are read with the
/// offset in force before the gap, landing the same distance past it.
fn localize(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
            Some(dt.with_timezone(&Utc))
        }
        LocalResult::None => {
            let before = tz
                .from_local_datetime(&(naive - Duration::days(1)))
                .earliest()?;
            let offset = before.offset().fix().local_minus_utc();
            Some(Utc.from_utc_datetime(&(naive - Duration::seconds(i64::from(offset)))))
        }
    }
}

// ── TimestampResolver ─────────────────────────────────────────────────────────

/// Converts raw export timestamps into UTC instants.
///
/// Naive timestamps are read as wall-clock time in the resolver's timezone.
/// Anything unparsable resolves to the processing instant `now`, so a
/// single bad field never aborts a run.
#[derive(Debug, Clone, Copy)]
pub struct TimestampResolver {
    tz: Tz,
    now: DateTime<Utc>,
}

impl TimestampResolver {
    pub fn new(tz: Tz, now: DateTime<Utc>) -> Self {
        Self { tz, now }
    }

    /// Run the strategies without applying the fallback.
    pub fn try_resolve(&self, raw: &str) -> Resolution {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Resolution::Unparsed;
        }
        STRATEGIES
            .iter()
            .find_map(|strategy| strategy(trimmed, self.tz))
            .map_or(Resolution::Unparsed, Resolution::Parsed)
    }

    /// Resolve `raw`, substituting the processing instant when every
    /// strategy fails.
    pub fn resolve(&self, raw: &str) -> DateTime<Utc> {
        match self.try_resolve(raw) {
            Resolution::Parsed(dt) => dt,
            Resolution::Unparsed => {
                warn!("Failed to parse timestamp \"{}\", using processing time", raw);
                self.now
            }
        }
    }

    /// Resolve an optional raw timestamp; absence is treated as unparsable.
    pub fn resolve_opt(&self, raw: Option<&str>) -> DateTime<Utc> {
        self.resolve(raw.unwrap_or_default())
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Express a UTC instant in the resolver's timezone.
    pub fn to_local(&self, dt: DateTime<Utc>) -> DateTime<Tz> {
        dt.with_timezone(&self.tz)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
